//! Document body storage on the filesystem (§6: bodies live at
//! `<collection.documents_directory>/<doc.id>.json`, not in SQLite).

use std::path::Path;

use crate::error::Result;

/// Writes `body` to `path`, creating parent directories as needed.
pub fn write_document_body(path: &Path, body: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, body)?;
    Ok(())
}

/// Reads the raw bytes of a document body.
pub fn read_document_body(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(Into::into)
}

/// Deletes a document body file. Missing files are not an error: the
/// metadata row is the source of truth for existence.
pub fn delete_document_body(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("doc_1.json");
        write_document_body(&path, b"{\"a\":1}").unwrap();
        let body = read_document_body(&path).unwrap();
        assert_eq!(body, b"{\"a\":1}");
    }

    #[test]
    fn delete_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc_missing.json");
        delete_document_body(&path).unwrap();
    }

    #[test]
    fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc_1.json");
        write_document_body(&path, b"{}").unwrap();
        delete_document_body(&path).unwrap();
        assert!(!path.exists());
    }
}
