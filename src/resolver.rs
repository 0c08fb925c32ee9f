//! Resolution of user input to an existing file.

use crate::error::Result;
use crate::fs::{Environment, FileSystem};
use log::debug;
use std::path::{is_separator, Component, Path, PathBuf};

/// Returns `true` if `input` is a bare file name that may be looked up in
/// the search path.
pub fn is_bare_file_name(input: &str) -> bool {
    let path = Path::new(input);
    let drive_relative = matches!(path.components().next(), Some(Component::Prefix(_)));

    !input.is_empty()
        && !drive_relative
        && !path.has_root()
        && !path.is_absolute()
        && !input.chars().any(is_separator)
}

/// Resolves `input` to the absolute path of an existing file.
///
/// Input that exists as given wins outright. Otherwise bare file names are
/// tried against each search-path directory in order. `Ok(None)` means
/// nothing matched; an error means a match could not be made absolute.
pub fn resolve(
    fs: &dyn FileSystem,
    env: &dyn Environment,
    input: &str,
) -> Result<Option<PathBuf>> {
    let direct = Path::new(input);
    if fs.exists(direct) {
        return Ok(Some(fs.absolute(direct)?));
    }

    if !is_bare_file_name(input) {
        return Ok(None);
    }

    let Some(search_path) = env.search_path() else {
        return Ok(None);
    };

    let found = std::env::split_paths(&search_path)
        .filter(|dir| !dir.as_os_str().to_string_lossy().trim().is_empty())
        .map(|dir| dir.join(input))
        .find(|candidate| {
            debug!("Trying {}", candidate.display());
            fs.exists(candidate)
        });

    match found {
        Some(path) => Ok(Some(fs.absolute(&path)?)),
        None => Ok(None),
    }
}
