pub mod state;
pub mod value;

pub use state::ConfigState;
pub use value::{Config, ConfigValue, FPS_KEY};
