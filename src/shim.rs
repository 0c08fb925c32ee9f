//! Package-manager shim detection.
//!
//! A shim is a small launcher `app.exe` next to an `app.shim` descriptor
//! whose `path = ...` line names the real executable.

use crate::fs::FileSystem;
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Extension of the descriptor that sits next to a shim executable.
pub const DESCRIPTOR_EXTENSION: &str = "shim";

/// Descriptor key holding the target executable.
const TARGET_KEY: &str = "path";

/// Outcome of looking for a shim descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shim {
    /// No descriptor next to the executable.
    None,
    /// A descriptor exists but names no usable target.
    Unresolved,
    /// A descriptor names this existing target.
    Target(PathBuf),
}

impl Shim {
    /// Returns `true` if a descriptor was found, usable or not.
    pub fn is_shim(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns the target to follow, if any.
    pub fn target(&self) -> Option<&Path> {
        match self {
            Self::Target(path) => Some(path),
            _ => None,
        }
    }
}

/// Looks for a descriptor next to `executable` and extracts its target.
///
/// Read failures and missing targets never fail the lookup; they yield
/// [`Shim::Unresolved`].
pub fn resolve(fs: &dyn FileSystem, executable: &Path) -> Shim {
    let descriptor = executable.with_extension(DESCRIPTOR_EXTENSION);
    if !fs.exists(&descriptor) {
        return Shim::None;
    }

    let lines = match fs.read_lines(&descriptor) {
        Ok(lines) => lines,
        Err(e) => {
            warn!("Cannot read shim descriptor {}: {}", descriptor.display(), e);
            return Shim::Unresolved;
        }
    };

    let Some(target) = lines.iter().find_map(|line| parse_target(line)) else {
        debug!("No target in shim descriptor {}", descriptor.display());
        return Shim::Unresolved;
    };

    let target = PathBuf::from(target);
    if !fs.exists(&target) {
        debug!("Shim target {} does not exist", target.display());
        return Shim::Unresolved;
    }

    debug!("Shim {} -> {}", executable.display(), target.display());
    Shim::Target(target)
}

/// Extracts the target from a `path = value` descriptor line.
fn parse_target(line: &str) -> Option<&str> {
    let (key, value) = line.trim().split_once('=')?;
    if !key.trim().eq_ignore_ascii_case(TARGET_KEY) {
        return None;
    }

    let value = strip_quotes(value.trim());
    (!value.trim().is_empty()).then_some(value)
}

/// Strips one matching pair of surrounding quotes.
fn strip_quotes(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|&quote| value.strip_prefix(quote)?.strip_suffix(quote))
        .unwrap_or(value)
}
