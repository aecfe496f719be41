//! Packages in the local store: layout, source export and manifests.

pub mod export;
pub mod layout;
pub mod manifest;

pub use export::{ExportError, ExportFilter, ExportReport, export_sources};
pub use layout::PackageLayout;
pub use manifest::{PackageIdInputs, PackageManifest};
