pub mod atomic;
pub mod section;
pub mod tensor;

pub use atomic::write_atomic;
pub use section::{read_section_info, write_section_info};
pub use tensor::{read_frame_artifact, write_frame_artifact, Sample, SampleType};
