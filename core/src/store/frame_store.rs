use crate::artifact::read_frame_artifact;
use crate::plugin_dir::PluginDirectory;
use crate::prelude::{ArtifactResult, Frame};
use log::debug;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

const PLACEHOLDER_HEIGHT: usize = 96;
const PLACEHOLDER_WIDTH: usize = 128;

/// Gray diagonal stripes shown until the producer writes its first frame.
pub fn placeholder_frame() -> Frame {
    Frame::from_shape_fn((PLACEHOLDER_HEIGHT, PLACEHOLDER_WIDTH, 1), |(row, col, _)| {
        if ((row + col) / 8) % 2 == 0 {
            48
        } else {
            72
        }
    })
}

/// Latest frame read from the producer's artifact, with the last good one
/// kept as fallback.
pub struct FrameStore {
    path: PathBuf,
    most_recent: RwLock<Arc<Frame>>,
}

impl FrameStore {
    pub fn new(dir: &PluginDirectory) -> Self {
        Self {
            path: dir.summary_path(),
            most_recent: RwLock::new(Arc::new(placeholder_frame())),
        }
    }

    /// Reads the artifact and, on success, makes it the most recent frame.
    pub fn refresh(&self) -> ArtifactResult<Arc<Frame>> {
        let frame = Arc::new(read_frame_artifact(&self.path)?);
        *self
            .most_recent
            .write()
            .unwrap_or_else(PoisonError::into_inner) = frame.clone();
        Ok(frame)
    }

    pub fn most_recent(&self) -> Arc<Frame> {
        self.most_recent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fresh frame when the artifact reads cleanly, otherwise the last good one.
    pub fn fetch_current_frame(&self) -> Arc<Frame> {
        match self.refresh() {
            Ok(frame) => frame,
            Err(err) => {
                debug!("serving previous frame: {}", err);
                self.most_recent()
            }
        }
    }
}
