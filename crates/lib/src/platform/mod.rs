//! Host detection and well-known directories.
//!
//! [`Platform`] is the `os`/`arch` half of a settings descriptor. The host's
//! platform seeds the defaults that `-s key=value` overrides then adjust.

pub mod arch;
pub mod os;
pub mod paths;

use std::fmt;

use arch::Arch;
use os::Os;

/// An `arch-os` pair, displayed as e.g. `x86_64-linux`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// The machine forge runs on, or `None` for hosts no recipe can target.
  pub fn host() -> Option<Self> {
    Some(Self::new(Arch::current()?, Os::current()?))
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.arch, self.os)
  }
}
