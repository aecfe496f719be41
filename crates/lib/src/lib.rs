//! forge-lib: package build orchestration.
//!
//! A [`recipe::Recipe`] describes a C/C++ package built with CMake. For one
//! set of [`settings::Settings`] the library:
//! - pins ABI options ([`options::configure_options`])
//! - resolves conditional dependencies ([`requires::resolve_dependencies`])
//! - runs configure, build, test, install and post-install hooks
//!   ([`pipeline::run_build`])
//! - records the result in the local store ([`create::create_package`])

pub mod buildsys;
pub mod consts;
pub mod create;
pub mod options;
pub mod package;
pub mod pipeline;
pub mod platform;
pub mod recipe;
pub mod requires;
pub mod scm;
pub mod settings;
pub mod util;
