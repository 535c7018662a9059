use crate::producer::ProducerConfig;
use anyhow::Context;
use beholdercore::PluginDirectory;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Process-level settings, from YAML or the command line.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub logdir: PathBuf,
    pub bind: SocketAddr,
    pub produce: bool,
    pub producer: ProducerConfig,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            logdir: PathBuf::from("logs"),
            bind: SocketAddr::from(([127, 0, 0, 1], 6006)),
            produce: false,
            producer: ProducerConfig::default(),
        }
    }
}

impl ServerSettings {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading server settings {}", path_ref.display()))?;
        let settings: ServerSettings = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing server settings {}", path_ref.display()))?;
        Ok(settings)
    }

    pub fn from_args(logdir: PathBuf, bind: SocketAddr, produce: bool) -> Self {
        Self {
            logdir,
            bind,
            produce,
            ..Default::default()
        }
    }

    pub fn plugin_dir(&self) -> PluginDirectory {
        PluginDirectory::for_logdir(&self.logdir)
    }
}
