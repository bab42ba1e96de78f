use crate::utils::error::{GlanceError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_required_field,
    validate_socket_addr, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const GOOGLE_VISION_API_KEY_ENV: &str = "GOOGLE_VISION_API_KEY";
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const GOOGLE_SEARCH_ENGINE_ID_ENV: &str = "GOOGLE_SEARCH_ENGINE_ID";

/// Credential string that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Empty, or an `${VAR}` reference nobody resolved.
    fn is_unset(&self) -> bool {
        let v = self.0.trim();
        v.is_empty() || (v.starts_with("${") && v.ends_with('}'))
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("\"***\"")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnalyzerProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "simulated")]
    Simulated,
}

impl FromStr for AnalyzerProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "simulated" => Ok(Self::Simulated),
            other => Err(format!(
                "unknown analyzer provider '{}', expected 'openai' or 'simulated'",
                other
            )),
        }
    }
}

impl std::fmt::Display for AnalyzerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => f.write_str("openai"),
            Self::Simulated => f.write_str("simulated"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlanceConfig {
    pub server: ServerConfig,
    pub analyzer: AnalyzerConfig,
    pub openai: OpenAiConfig,
    pub google_vision: GoogleVisionConfig,
    pub google_search: GoogleSearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub max_body_bytes: usize,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub provider: AnalyzerProvider,
    pub simulated_delay_ms: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            provider: AnalyzerProvider::OpenAi,
            simulated_delay_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<Secret>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleVisionConfig {
    pub api_key: Option<Secret>,
    pub base_url: String,
}

impl Default for GoogleVisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://vision.googleapis.com/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSearchConfig {
    pub api_key: Option<Secret>,
    pub engine_id: Option<String>,
    pub base_url: String,
    pub num_results: u8,
}

impl Default for GoogleSearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            base_url: "https://www.googleapis.com".to_string(),
            num_results: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: bool,
}

impl GlanceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GlanceError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: Self =
            toml::from_str(&processed_content).map_err(|e| GlanceError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        config.clear_unset_secrets();
        Ok(config)
    }

    /// Loads `path` when given, otherwise starts from defaults; credentials
    /// missing from the file are then taken from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env_with(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| GlanceError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn clear_unset_secrets(&mut self) {
        for key in [
            &mut self.openai.api_key,
            &mut self.google_vision.api_key,
            &mut self.google_search.api_key,
        ] {
            if key.as_ref().is_some_and(Secret::is_unset) {
                *key = None;
            }
        }
        if self
            .google_search
            .engine_id
            .as_deref()
            .is_some_and(|id| Secret::new(id).is_unset())
        {
            self.google_search.engine_id = None;
        }
    }

    /// Fills credentials the file left out. The vision key falls back to the
    /// general Google key.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |name: &str| {
            lookup(name)
                .map(Secret::new)
                .filter(|s| !s.is_unset())
        };

        if self.openai.api_key.is_none() {
            self.openai.api_key = secret(OPENAI_API_KEY_ENV);
        }
        if self.google_search.api_key.is_none() {
            self.google_search.api_key = secret(GOOGLE_API_KEY_ENV);
        }
        if self.google_vision.api_key.is_none() {
            self.google_vision.api_key =
                secret(GOOGLE_VISION_API_KEY_ENV).or_else(|| secret(GOOGLE_API_KEY_ENV));
        }
        if self.google_search.engine_id.is_none() {
            self.google_search.engine_id = lookup(GOOGLE_SEARCH_ENGINE_ID_ENV)
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty());
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        validate_socket_addr("server.bind", &self.server.bind)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.analyzer.simulated_delay_ms)
    }

    pub fn vision_enabled(&self) -> bool {
        self.google_vision.api_key.is_some()
    }

    pub fn search_enabled(&self) -> bool {
        self.google_search.api_key.is_some() && self.google_search.engine_id.is_some()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        self.bind_addr()?;
        validate_positive_number("server.max_body_bytes", self.server.max_body_bytes, 1024)?;
        validate_range(
            "server.request_timeout_secs",
            self.server.request_timeout_secs,
            1,
            600,
        )?;

        validate_url("openai.base_url", &self.openai.base_url)?;
        validate_url("google_vision.base_url", &self.google_vision.base_url)?;
        validate_url("google_search.base_url", &self.google_search.base_url)?;
        validate_range(
            "google_search.num_results",
            self.google_search.num_results,
            1,
            10,
        )?;

        if self.analyzer.provider == AnalyzerProvider::OpenAi {
            validate_required_field("openai.api_key", &self.openai.api_key)?;
            validate_non_empty_string("openai.model", &self.openai.model)?;
            validate_range("openai.max_tokens", self.openai.max_tokens, 16, 16_384)?;
        }

        if let Some(level) = &self.logging.level {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(GlanceError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.clone(),
                    reason: format!("Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }

        Ok(())
    }
}

impl Validate for GlanceConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
