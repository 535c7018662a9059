pub mod frame_store;
pub mod section_info;

pub use frame_store::{placeholder_frame, FrameStore};
pub use section_info::{placeholder_section_info, SectionInfoCache};
