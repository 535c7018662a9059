pub mod server;

pub use server::ServerSettings;
