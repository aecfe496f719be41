//! Application-wide constants.

/// Name used for data directories and environment variable prefixes.
pub const APP_NAME: &str = "forge";

/// Length of the truncated package id hash.
pub const PACKAGE_ID_LEN: usize = 20;

/// File written into every installed package folder.
pub const PACKAGE_MANIFEST_FILE: &str = "package.json";

/// File written into the build folder by the cmake generator.
pub const CMAKE_BUILDINFO_FILE: &str = "forgebuildinfo.cmake";

/// Value of an scm field that is captured from the working copy.
pub const SCM_AUTO: &str = "auto";
