pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{HuggingFaceImageGenerator, OpenAiDescriber, XrpcClient};
pub use config::{cli::LocalStorage, toml_config::BotConfig};
pub use self::core::{job::DailyPostJob, publisher::PostPublisher};
pub use utils::error::{BotError, Result};
