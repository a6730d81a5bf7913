//! JSON store for extracted entries.

use std::fs;
use std::io::BufWriter;
use std::path::Path;

use crate::model::FamilyEntry;
use crate::service::ServiceError;

pub fn save_entry(entry: &FamilyEntry, path: &Path) -> Result<(), ServiceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(ServiceError::Write)?;
        }
    }
    let file = fs::File::create(path).map_err(ServiceError::Write)?;
    serde_json::to_writer_pretty(BufWriter::new(file), entry)?;
    Ok(())
}

/// Loads a persisted entry. Taxonomies are write-only in this store: they
/// are serialized by `save_entry` but always reconstituted as an empty list
/// here, whatever the document contains. Callers must not expect them to
/// survive a round trip.
pub fn load_entry(path: &Path) -> Result<FamilyEntry, ServiceError> {
    let data = fs::read_to_string(path)
        .map_err(|source| ServiceError::MissingInput { path: path.to_path_buf(), source })?;
    let mut entry: FamilyEntry = serde_json::from_str(&data)?;
    entry.taxonomies = Vec::new();
    Ok(entry)
}
