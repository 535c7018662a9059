use ndarray::Array3;
use serde_json::{Map, Value};
use std::io;
use std::path::PathBuf;

/// One decoded image laid out as `(height, width, channels)`.
pub type Frame = Array3<u8>;

/// One visualized section, e.g. `{"name": "dense/kernel", "mean": 0.1}`.
pub type Section = Map<String, Value>;

/// Ordered description of every section in the current frame.
pub type SectionInfo = Vec<Section>;

/// Failure reading an artifact written by the producer.
#[derive(thiserror::Error, Debug)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("i/o failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed artifact {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },
    #[error("unsupported tensor shape {0:?}")]
    Shape(Vec<usize>),
}

impl ArtifactError {
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            ArtifactError::NotFound(path)
        } else {
            ArtifactError::Io { path, source }
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ArtifactError::Decode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for failures expected while the producer has not written anything yet.
    pub fn is_transient(&self) -> bool {
        matches!(self, ArtifactError::NotFound(_) | ArtifactError::Io { .. })
    }
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Rejected config update.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing required config key `{0}`")]
    MissingKey(&'static str),
    #[error("invalid value for config key `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("persisting config failed: {0}")]
    Persist(#[from] ArtifactError),
}

impl ConfigError {
    /// True when the caller sent a bad update, as opposed to a storage failure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ConfigError::Persist(_))
    }
}

/// Failure turning a frame into PNG bytes.
#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("unsupported channel count {0}")]
    Channels(usize),
    #[error("frame dimension {0} does not fit the encoder")]
    Dimension(usize),
    #[error("png encoder failed: {0}")]
    Png(#[from] image::ImageError),
}
