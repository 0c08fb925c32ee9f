//! Error type shared by the decoder, the resolvers and the inspector.

use thiserror::Error;

/// Failures that abort an architecture lookup.
///
/// Soft conditions such as a missing CLR header or an unreadable shim
/// descriptor never surface here; they downgrade to a fallback result
/// instead.
#[derive(Error, Debug)]
pub enum Error {
    /// The input did not resolve to an existing file.
    ///
    /// `searched_path` records whether the search path was scanned, so the
    /// message can tell "not here" apart from "not anywhere".
    #[error("File not found: {input}{}", search_note(.searched_path))]
    NotFound {
        /// The string the lookup started from.
        input: String,
        /// Whether the search-path directories were tried.
        searched_path: bool,
    },

    /// The file exists but does not carry the MZ or PE signature.
    #[error("{0}")]
    InvalidFormat(String),

    /// Any other read or seek failure, such as a truncated header.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn search_note(searched_path: &bool) -> &'static str {
    if *searched_path {
        " (searched current directory and PATH)"
    } else {
        ""
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
