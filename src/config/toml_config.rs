use crate::adapters::huggingface::{DEFAULT_HF_BASE_URL, DEFAULT_HF_MODEL};
use crate::adapters::openai::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL, DEFAULT_SYSTEM_PROMPT};
use crate::adapters::xrpc::{DEFAULT_TIMEOUT, DEFAULT_XRPC_BASE_URL};
use crate::core::publisher::DEFAULT_ALT_TEXT;
use crate::utils::error::{BotError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const ENV_BSKY_USERNAME: &str = "BSKY_USERNAME";
pub const ENV_BSKY_PASSWORD: &str = "BSKY_PASSWORD";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_HUGGINGFACE_KEY: &str = "HUGGINGFACE_KEY";

const DEFAULT_PROMPT: &str = "Describe one vivid, self-contained scene suitable for a single illustration. \
Keep it under 300 characters.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub bluesky: BlueskyConfig,
    pub openai: OpenAiConfig,
    pub huggingface: HuggingFaceConfig,
    pub output: OutputConfig,
    pub post: PostConfig,
    pub http: HttpConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueskyConfig {
    pub base_url: String,
    pub identifier: String,
    pub password: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
    pub prompt: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HuggingFaceConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub text_dir: String,
    pub image_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    pub alt_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for BlueskyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlueskyConfig")
            .field("base_url", &self.base_url)
            .field("identifier", &self.identifier)
            .field("password", &REDACTED)
            .finish()
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &REDACTED)
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("prompt", &self.prompt)
            .finish()
    }
}

impl fmt::Debug for HuggingFaceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuggingFaceConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &REDACTED)
            .field("model", &self.model)
            .finish()
    }
}

impl Default for BlueskyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_XRPC_BASE_URL.to_string(),
            identifier: String::new(),
            password: String::new(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_HF_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_HF_MODEL.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            text_dir: "./output/txt".to_string(),
            image_dir: "./output/images".to_string(),
        }
    }
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            alt_text: DEFAULT_ALT_TEXT.to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl BotConfig {
    /// Load and parse a TOML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML, substituting `${VAR}` from the environment first.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: Self = toml::from_str(&processed_content).map_err(|e| BotError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })?;
        config.fill_from_env();
        Ok(config)
    }

    /// Defaults plus credentials from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.fill_from_env();
        config
    }

    /// Load `path` when given, otherwise fall back to the environment alone.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::from_env()),
        }
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BotError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    // Credentials left empty in the file come from the usual variables.
    fn fill_from_env(&mut self) {
        let fill = |slot: &mut String, var: &str| {
            if slot.trim().is_empty() {
                if let Ok(value) = std::env::var(var) {
                    *slot = value;
                }
            }
        };
        fill(&mut self.bluesky.identifier, ENV_BSKY_USERNAME);
        fill(&mut self.bluesky.password, ENV_BSKY_PASSWORD);
        fill(&mut self.openai.api_key, ENV_OPENAI_API_KEY);
        fill(&mut self.huggingface.api_key, ENV_HUGGINGFACE_KEY);
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }
}

impl Validate for BotConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("bluesky.base_url", &self.bluesky.base_url)?;
        validation::validate_url("openai.base_url", &self.openai.base_url)?;
        validation::validate_url("huggingface.base_url", &self.huggingface.base_url)?;

        validation::validate_secret("bluesky.identifier", &self.bluesky.identifier)?;
        validation::validate_secret("bluesky.password", &self.bluesky.password)?;
        validation::validate_secret("openai.api_key", &self.openai.api_key)?;
        validation::validate_secret("huggingface.api_key", &self.huggingface.api_key)?;

        validation::validate_non_empty_string("openai.model", &self.openai.model)?;
        validation::validate_non_empty_string("openai.prompt", &self.openai.prompt)?;
        validation::validate_non_empty_string("huggingface.model", &self.huggingface.model)?;

        validation::validate_path("output.text_dir", &self.output.text_dir)?;
        validation::validate_path("output.image_dir", &self.output.image_dir)?;
        validation::validate_range("http.timeout_seconds", self.http.timeout_seconds, 1, 600)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_CONFIG: &str = r#"
[bluesky]
identifier = "dailybot.bsky.social"
password = "app-pass-1234"

[openai]
api_key = "sk-test"
prompt = "Describe a lighthouse."

[huggingface]
api_key = "hf-test"
model = "stabilityai/stable-diffusion-xl-base-1.0"

[output]
text_dir = "/tmp/bot/txt"
image_dir = "/tmp/bot/images"

[post]
alt_text = "AI generated illustration"
"#;

    #[test]
    fn test_parse_full_config() {
        let config = BotConfig::from_toml_str(FULL_CONFIG).unwrap();

        assert_eq!(config.bluesky.identifier, "dailybot.bsky.social");
        assert_eq!(config.bluesky.base_url, "https://bsky.social/xrpc");
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.huggingface.model, "stabilityai/stable-diffusion-xl-base-1.0");
        assert_eq!(config.post.alt_text, "AI generated illustration");
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let config = BotConfig::from_toml_str(FULL_CONFIG).unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("app-pass-1234"));
        assert!(!debug.contains("sk-test"));
        assert!(!debug.contains("hf-test"));
        assert!(debug.contains("dailybot.bsky.social"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("BSKY_DAILY_TEST_PASSWORD", "from-env");

        let config = BotConfig::from_toml_str(
            r#"
[bluesky]
identifier = "bot"
password = "${BSKY_DAILY_TEST_PASSWORD}"
"#,
        )
        .unwrap();
        assert_eq!(config.bluesky.password, "from-env");

        std::env::remove_var("BSKY_DAILY_TEST_PASSWORD");
    }

    #[test]
    fn test_unset_variable_fails_validation() {
        let toml = FULL_CONFIG.replace("sk-test", "${BSKY_DAILY_TEST_UNSET_KEY}");
        let config = BotConfig::from_toml_str(&toml).unwrap();

        match config.validate() {
            Err(BotError::MissingConfigError { field }) => assert_eq!(field, "openai.api_key"),
            other => panic!("expected missing openai.api_key, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_url_rejected() {
        let toml = format!("{}\n[http]\ntimeout_seconds = 30\n", FULL_CONFIG)
            .replace("[bluesky]\n", "[bluesky]\nbase_url = \"not a url\"\n");
        let config = BotConfig::from_toml_str(&toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(BotError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_malformed_toml() {
        let err = BotConfig::from_toml_str("[bluesky\nidentifier = 1").unwrap_err();
        assert!(matches!(err, BotError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(FULL_CONFIG.as_bytes()).unwrap();

        let config = BotConfig::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.output.image_dir, "/tmp/bot/images");
    }
}
