//! Core of the Beholder live-view plugin.
//!
//! Reads the frame and section-info artifacts a training process leaves in
//! the plugin directory, keeps the last good copy of each, holds the
//! viewer-adjustable config, and drives the per-connection loops that push
//! PNG frames as a multipart stream.

pub mod artifact;
pub mod config;
pub mod plugin_dir;
pub mod prelude;
pub mod state;
pub mod store;
pub mod stream;
pub mod telemetry;

pub use config::{Config, ConfigState, ConfigValue};
pub use plugin_dir::PluginDirectory;
pub use prelude::{ArtifactError, ConfigError, Frame, SectionInfo};
pub use state::PluginState;
pub use stream::{FramePoller, ShutdownSignal, ShutdownTrigger};
