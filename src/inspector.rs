//! End-to-end architecture lookup: resolve, decode, follow one shim hop.

use crate::error::{Error, Result};
use crate::fs::{Environment, FileSystem};
use crate::pe::{self, Architecture};
use crate::{resolver, shim};
use log::{debug, warn};
use std::fmt;
use std::path::PathBuf;

/// Result of inspecting one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// The file the input resolved to.
    pub path: PathBuf,
    /// Architecture of that file.
    pub origin: Architecture,
    /// Architecture of the shim target, when the file is a working shim.
    pub shim_target: Option<Architecture>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shim_target {
            Some(target) => write!(f, "{} (shim) -> {}", self.origin, target),
            None => write!(f, "{}", self.origin),
        }
    }
}

/// Resolves `input`, decodes it and, for shims, decodes the target as well.
///
/// Failures to resolve or decode the input abort the lookup. A shim target
/// that cannot be decoded is dropped and only the shim itself is reported.
pub fn inspect(fs: &dyn FileSystem, env: &dyn Environment, input: &str) -> Result<Report> {
    let path = resolver::resolve(fs, env, input)?.ok_or_else(|| Error::NotFound {
        input: input.to_string(),
        searched_path: resolver::is_bare_file_name(input),
    })?;
    debug!("Resolved {} to {}", input, path.display());

    let origin = pe::architecture_of(fs, &path)?;

    let shim_target = match shim::resolve(fs, &path) {
        shim::Shim::Target(target) => match pe::architecture_of(fs, &target) {
            Ok(arch) => Some(arch),
            Err(e) => {
                warn!("Ignoring shim target {}: {}", target.display(), e);
                None
            }
        },
        _ => None,
    };

    Ok(Report {
        path,
        origin,
        shim_target,
    })
}
