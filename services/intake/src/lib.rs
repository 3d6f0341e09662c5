pub mod config;
pub mod prompt_loader;
pub mod realtime_adapter;
