pub mod cache;
pub mod clean;
pub mod config;
pub mod dataset;
pub mod error;
pub mod projection;
pub mod render;
pub mod server;
pub mod source;
pub mod version;
