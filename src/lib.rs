pub mod app;
pub mod config;
pub mod error;
pub mod session;
pub mod upload;
pub mod utils;
pub mod verify;
