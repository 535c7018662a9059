use crate::config::ConfigState;
use crate::plugin_dir::PluginDirectory;
use crate::prelude::ArtifactResult;
use crate::store::{FrameStore, SectionInfoCache};
use crate::telemetry::MetricsRecorder;

/// Everything the handlers and poll loops share, behind one `Arc`.
pub struct PluginState {
    dir: PluginDirectory,
    frames: FrameStore,
    sections: SectionInfoCache,
    config: ConfigState,
    metrics: MetricsRecorder,
}

impl PluginState {
    /// Prepares the plugin directory and loads (or seeds) the persisted config.
    pub fn open(dir: PluginDirectory) -> ArtifactResult<Self> {
        let config = ConfigState::load_or_init(&dir)?;
        Ok(Self {
            frames: FrameStore::new(&dir),
            sections: SectionInfoCache::new(&dir),
            config,
            metrics: MetricsRecorder::new(),
            dir,
        })
    }

    pub fn dir(&self) -> &PluginDirectory {
        &self.dir
    }

    pub fn frames(&self) -> &FrameStore {
        &self.frames
    }

    pub fn sections(&self) -> &SectionInfoCache {
        &self.sections
    }

    pub fn config(&self) -> &ConfigState {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub fn is_active(&self) -> bool {
        self.dir.is_active()
    }
}
