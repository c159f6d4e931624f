pub mod env;
mod loader;

pub use env::{
    AnthropicConfig, AppConfig, DirectoryConfig, IntegrationsConfig, ServerConfig,
    WebContentConfig,
};
pub use loader::load_config;
