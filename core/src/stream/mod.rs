pub mod encode;
pub mod multipart;
pub mod poller;
pub mod shutdown;

pub use encode::encode_png;
pub use multipart::{frame_part, BOUNDARY, STREAM_CONTENT_TYPE};
pub use poller::{frame_period, frame_wait, FramePoller};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
