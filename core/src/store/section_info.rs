use crate::artifact::read_section_info;
use crate::plugin_dir::PluginDirectory;
use crate::prelude::{ArtifactResult, Section, SectionInfo};
use log::debug;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

pub const PLACEHOLDER_SECTION_NAME: &str = "Waiting for data...";

pub fn placeholder_section_info() -> SectionInfo {
    let mut section = Section::new();
    section.insert("name".into(), Value::String(PLACEHOLDER_SECTION_NAME.into()));
    vec![section]
}

/// Latest section info read from the producer, with last-good fallback.
pub struct SectionInfoCache {
    path: PathBuf,
    most_recent: RwLock<Arc<SectionInfo>>,
}

impl SectionInfoCache {
    pub fn new(dir: &PluginDirectory) -> Self {
        Self {
            path: dir.section_info_path(),
            most_recent: RwLock::new(Arc::new(placeholder_section_info())),
        }
    }

    pub fn refresh(&self) -> ArtifactResult<Arc<SectionInfo>> {
        let info = Arc::new(read_section_info(&self.path)?);
        *self
            .most_recent
            .write()
            .unwrap_or_else(PoisonError::into_inner) = info.clone();
        Ok(info)
    }

    pub fn most_recent(&self) -> Arc<SectionInfo> {
        self.most_recent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn fetch_section_info(&self) -> Arc<SectionInfo> {
        self.refresh().unwrap_or_else(|err| {
            debug!("serving previous section info: {}", err);
            self.most_recent()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::write_section_info;
    use serde_json::json;
    use std::fs;

    #[test]
    fn info_falls_back_to_placeholder_then_last_good() {
        let logdir = tempfile::tempdir().unwrap();
        let dir = PluginDirectory::for_logdir(logdir.path());
        dir.ensure().unwrap();
        let cache = SectionInfoCache::new(&dir);

        assert_eq!(
            serde_json::to_value(&*cache.fetch_section_info()).unwrap(),
            json!([{"name": "Waiting for data..."}])
        );

        let info: SectionInfo =
            serde_json::from_value(json!([{"name": "conv1/weights", "max": 0.9}])).unwrap();
        write_section_info(&dir.section_info_path(), &info).unwrap();
        assert_eq!(*cache.fetch_section_info(), info);

        fs::write(dir.section_info_path(), b"[{\"name\": ").unwrap();
        assert_eq!(*cache.fetch_section_info(), info);

        fs::remove_file(dir.section_info_path()).unwrap();
        assert_eq!(*cache.fetch_section_info(), info);
    }
}
