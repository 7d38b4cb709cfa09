use std::path::Path;

use crate::documents;
use crate::error::Result;
use crate::model::Documents;

/// The main entry point for saving and loading a datacard's documents.
#[derive(Debug)]
pub struct Datacard;

impl Datacard {
    /// Persists `documents` under `<path>/documents`.
    ///
    /// `None` is a silent no-op: no directory is created, nothing is
    /// written. There is no rollback — a mid-write I/O failure can leave a
    /// partially populated directory.
    pub fn save<P: AsRef<Path>>(path: P, documents: Option<&Documents>) -> Result<()> {
        let Some(documents) = documents else {
            return Ok(());
        };
        documents::write_documents(documents, path.as_ref())
    }

    /// Loads the documents stored under `<path>/documents`.
    ///
    /// Returns `Ok(None)` when the documents directory does not exist — a
    /// datacard without documents, not an error and never an empty
    /// `Documents`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Documents>> {
        documents::read_documents(path.as_ref())
    }
}
