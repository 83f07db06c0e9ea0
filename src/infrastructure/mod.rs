// Infrastructure layer - Configuration and logging adapters
pub mod config;
pub mod logging;
