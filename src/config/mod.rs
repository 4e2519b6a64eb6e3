pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "bsky-daily")]
#[command(about = "Generate an illustrated description and post it to Bluesky")]
pub struct CliConfig {
    /// TOML configuration file; credentials fall back to the environment
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override output.text_dir
    #[arg(long)]
    pub text_dir: Option<String>,

    /// Override output.image_dir
    #[arg(long)]
    pub image_dir: Option<String>,

    /// Generate and save, but do not post
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn apply_overrides(&self, config: &mut toml_config::BotConfig) {
        if let Some(dir) = &self.text_dir {
            config.output.text_dir = dir.clone();
        }
        if let Some(dir) = &self.image_dir {
            config.output.image_dir = dir.clone();
        }
    }
}
