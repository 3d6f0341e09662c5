mod client;

pub use client::{Client, EngineClient, ServerRx, Stats, connect_with_config};
pub use client::config::{Config, ConfigBuilder};
pub use intake_types as types;
