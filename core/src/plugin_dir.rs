use crate::config::Config;
use crate::prelude::{ArtifactError, ArtifactResult};
use std::fs;
use std::path::{Path, PathBuf};

pub const PLUGIN_NAME: &str = "beholder";
pub const TAG_NAME: &str = "beholder-frame";
pub const SUMMARY_FILENAME: &str = "frame.summary";
pub const SECTION_INFO_FILENAME: &str = "section-info.json";
pub const CONFIG_FILENAME: &str = "config.json";

/// Host-provided directory shared between the server and the producer.
#[derive(Debug, Clone)]
pub struct PluginDirectory {
    root: PathBuf,
}

impl PluginDirectory {
    /// Plugin directory under a log directory: `<logdir>/plugins/beholder`.
    pub fn for_logdir<P: AsRef<Path>>(logdir: P) -> Self {
        Self::new(logdir.as_ref().join("plugins").join(PLUGIN_NAME))
    }

    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join(SUMMARY_FILENAME)
    }

    pub fn section_info_path(&self) -> PathBuf {
        self.root.join(SECTION_INFO_FILENAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILENAME)
    }

    /// Creates the directory if needed.
    pub fn ensure(&self) -> ArtifactResult<()> {
        fs::create_dir_all(&self.root).map_err(|err| ArtifactError::from_io(&self.root, err))
    }

    /// Whether the producer is emitting data: both the frame and the
    /// section-info artifacts exist.
    pub fn is_active(&self) -> bool {
        self.summary_path().is_file() && self.section_info_path().is_file()
    }

    /// Reads the persisted config, as a producer does to pick up viewer changes.
    pub fn read_config(&self) -> ArtifactResult<Config> {
        let path = self.config_path();
        let bytes = fs::read(&path).map_err(|err| ArtifactError::from_io(&path, err))?;
        serde_json::from_slice(&bytes).map_err(|err| ArtifactError::decode(&path, err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_active_requires_both_artifacts() {
        let logdir = tempfile::tempdir().unwrap();
        let dir = PluginDirectory::for_logdir(logdir.path());
        dir.ensure().unwrap();
        assert!(!dir.is_active());

        fs::write(dir.summary_path(), b"frame").unwrap();
        assert!(!dir.is_active());

        fs::remove_file(dir.summary_path()).unwrap();
        fs::write(dir.section_info_path(), b"[]").unwrap();
        assert!(!dir.is_active());

        fs::write(dir.summary_path(), b"frame").unwrap();
        assert!(dir.is_active());
    }

    #[test]
    fn directory_lives_under_plugins() {
        let dir = PluginDirectory::for_logdir("/tmp/run");
        assert_eq!(dir.root(), Path::new("/tmp/run/plugins/beholder"));
        assert_eq!(dir.config_path(), Path::new("/tmp/run/plugins/beholder/config.json"));
    }

    #[test]
    fn missing_config_reads_as_not_found() {
        let logdir = tempfile::tempdir().unwrap();
        let dir = PluginDirectory::for_logdir(logdir.path());
        assert!(matches!(dir.read_config(), Err(ArtifactError::NotFound(_))));
    }
}
