use crate::artifact::write_atomic;
use crate::config::value::Config;
use crate::plugin_dir::PluginDirectory;
use crate::prelude::{ArtifactError, ArtifactResult, ConfigError};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tokio::sync::watch;

/// Live plugin config, persisted on every change.
pub struct ConfigState {
    path: PathBuf,
    current: RwLock<Config>,
    fps: watch::Sender<u32>,
}

impl ConfigState {
    /// Loads the persisted config, writing the defaults when none exists yet.
    pub fn load_or_init(dir: &PluginDirectory) -> ArtifactResult<Self> {
        dir.ensure()?;
        let path = dir.config_path();

        let config = match dir.read_config() {
            Ok(config) => match config.fps() {
                Ok(_) => config,
                Err(err) => {
                    warn!("persisted config {} unusable ({}), using defaults", path.display(), err);
                    Config::default()
                }
            },
            Err(ArtifactError::NotFound(_)) => {
                let config = Config::default();
                write_config(&path, &config)?;
                info!("wrote default config to {}", path.display());
                config
            }
            Err(err) => {
                warn!("{}, using default config", err);
                Config::default()
            }
        };

        Ok(Self::with_config(path, config))
    }

    fn with_config(path: PathBuf, config: Config) -> Self {
        // `load_or_init` only admits configs with a valid frame rate.
        let fps = config.fps().unwrap_or(0);
        let (fps, _) = watch::channel(fps);
        Self {
            path,
            current: RwLock::new(config),
            fps,
        }
    }

    /// Frame rate the poll loops should currently target.
    pub fn fps(&self) -> u32 {
        *self.fps.borrow()
    }

    /// Watches the frame rate; the receiver is notified on every applied
    /// update, including ones that keep the same rate.
    pub fn subscribe_fps(&self) -> watch::Receiver<u32> {
        self.fps.subscribe()
    }

    pub fn snapshot(&self) -> Config {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the whole config with the coerced form fields and persists it.
    ///
    /// Fails without touching memory or disk when `FPS` is missing or invalid.
    pub fn apply_config_update<I, K, V>(&self, form: I) -> Result<Config, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let config = Config::from_form(form);
        let fps = config.fps()?;

        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        write_config(&self.path, &config)?;
        *guard = config.clone();
        self.fps.send_replace(fps);
        drop(guard);

        info!("config updated: FPS={} ({} keys)", fps, config.len());
        Ok(config)
    }
}

fn write_config(path: &Path, config: &Config) -> ArtifactResult<()> {
    let bytes = serde_json::to_vec_pretty(config)
        .map_err(|err| ArtifactError::decode(path, err.to_string()))?;
    write_atomic(path, &bytes)
}
