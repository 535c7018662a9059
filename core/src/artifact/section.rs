use crate::artifact::atomic::write_atomic;
use crate::prelude::{ArtifactError, ArtifactResult, SectionInfo};
use std::fs;
use std::path::Path;

/// Reads the section-info artifact, a JSON array of objects.
pub fn read_section_info(path: &Path) -> ArtifactResult<SectionInfo> {
    let bytes = fs::read(path).map_err(|err| ArtifactError::from_io(path, err))?;
    serde_json::from_slice(&bytes).map_err(|err| ArtifactError::decode(path, err.to_string()))
}

/// Atomically replaces the section-info artifact.
pub fn write_section_info(path: &Path, info: &SectionInfo) -> ArtifactResult<()> {
    let bytes = serde_json::to_vec_pretty(info)
        .map_err(|err| ArtifactError::decode(path, err.to_string()))?;
    write_atomic(path, &bytes)
}
