use crate::prelude::{ArtifactError, ArtifactResult};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replaces `path` with `bytes` through a sibling temp file and a rename, so
/// readers see either the old content or the new one, never a partial write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> ArtifactResult<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir).map_err(|err| ArtifactError::from_io(dir, err))?;
    temp.write_all(bytes)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|err| ArtifactError::from_io(temp.path(), err))?;
    temp.persist(path)
        .map_err(|err| ArtifactError::from_io(path, err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn write_atomic_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn write_atomic_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("frame.summary");
        let err = write_atomic(&path, b"data").unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound(_)));
    }
}
