//! Centralized error handling for the datacard store.
//!
//! All failure conditions are propagated through the [`Result`] type; the
//! crate forbids panicking paths via clippy lints. Errors are `Clone` so they
//! can be stored and re-surfaced by callers that retry whole operations.
//!
//! ## Error Categories
//!
//! - **I/O** ([`DatacardError::Io`]): file-system failures. These propagate
//!   unmodified; a mid-write failure can leave a partially populated
//!   documents directory (no rollback at this layer).
//! - **Serialization** ([`DatacardError::Serialization`]): bincode
//!   encoding/decoding failures.
//! - **Format** ([`DatacardError::Format`]): structurally invalid files, such
//!   as a truncated length-prefixed stream.
//! - **Internal** ([`DatacardError::Internal`]): logic errors that should not
//!   occur in production.

use std::fmt;
use std::io;
use std::sync::Arc;

/// A specialized `Result` type for datacard operations.
pub type Result<T> = std::result::Result<T, DatacardError>;

/// The master error enum covering all failure domains in the store.
///
/// I/O errors are wrapped in `Arc` to keep the type `Clone` without copying
/// the underlying `io::Error`.
#[derive(Debug, Clone)]
pub enum DatacardError {
    /// Low-level I/O failure (missing file, permissions, disk full).
    Io(Arc<io::Error>),

    /// Serialization or deserialization failure (bincode).
    Serialization(String),

    /// A file exists but its contents do not conform to the expected layout.
    ///
    /// Typical cause: a length-prefixed stream whose declared record length
    /// runs past the end of the file.
    Format(String),

    /// Logic error in the decomposer or accessor wiring. Indicates a bug.
    Internal(String),
}

impl fmt::Display for DatacardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O Error: {e}"),
            Self::Serialization(s) => write!(f, "Serialization Error: {s}"),
            Self::Format(s) => write!(f, "Format Error: {s}"),
            Self::Internal(s) => write!(f, "Internal Logic Error: {s}"),
        }
    }
}

impl std::error::Error for DatacardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DatacardError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
