pub mod model;
pub mod routes;

pub use routes::HttpBridge;
