pub mod admin_client;
pub mod host;
pub mod loader;
