//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. Environment variables
//! 2. `taxi-support.toml` in the working directory
//! 3. Defaults
//!
//! `${VAR_NAME}` inside the TOML file is replaced with the environment value.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// Default configuration file name
pub const CONFIG_FILE: &str = "taxi-support.toml";

/// LLM provider type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Messages API
    Claude,
    /// OpenAI chat completions (and compatible endpoints)
    #[default]
    OpenAi,
    /// Google Gemini through its OpenAI-compatible endpoint
    Gemini,
}

impl LlmProvider {
    /// Parse a provider name, falling back to OpenAI for unknown values
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "claude" | "anthropic" => LlmProvider::Claude,
            "gemini" | "google" => LlmProvider::Gemini,
            _ => LlmProvider::OpenAi,
        }
    }

    /// Endpoint used when no base URL is configured
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::Claude => "https://api.anthropic.com/v1",
            LlmProvider::OpenAi => "https://api.openai.com/v1",
            LlmProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    /// Model used when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Claude => "claude-3-5-haiku-latest",
            LlmProvider::OpenAi => "gpt-4o-mini",
            LlmProvider::Gemini => "gemini-1.5-flash",
        }
    }

    /// Provider-specific API key variable
    fn key_env_var(&self) -> &'static str {
        match self {
            LlmProvider::Claude => "CLAUDE_API_KEY",
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::Gemini => "GEMINI_API_KEY",
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key; empty means the bot runs without a generation service
    pub api_key: String,

    /// Model to use (provider default when unset)
    pub model: Option<String>,

    /// API provider
    pub provider: LlmProvider,

    /// Base URL (optional, for custom endpoints)
    pub base_url: Option<String>,

    /// Maximum tokens per generated answer
    pub max_tokens: u64,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: None,
            provider: LlmProvider::default(),
            base_url: None,
            max_tokens: 500,
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    /// Effective model name
    pub fn model(&self) -> &str {
        match &self.model {
            Some(model) if !model.trim().is_empty() => model.as_str(),
            _ => self.provider.default_model(),
        }
    }

    /// Effective base URL
    pub fn base_url(&self) -> &str {
        match &self.base_url {
            Some(url) if !url.trim().is_empty() => url.as_str(),
            _ => self.provider.default_base_url(),
        }
    }

    /// Whether a usable API key is present (placeholders like `your_key` don't count)
    pub fn is_configured(&self) -> bool {
        is_real_secret(&self.api_key)
    }
}

/// WhatsApp Cloud API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    /// Permanent or system-user access token
    pub access_token: Option<String>,

    /// Phone number ID of the business number
    pub phone_number_id: Option<String>,

    /// Token echoed back during webhook verification
    pub verify_token: String,

    /// App secret for `X-Hub-Signature-256` checks (optional)
    pub app_secret: Option<String>,

    /// Graph API version
    pub api_version: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            verify_token: String::new(),
            app_secret: None,
            api_version: default_api_version(),
        }
    }
}

impl WhatsAppConfig {
    /// Whether outbound messaging can be enabled
    pub fn is_configured(&self) -> bool {
        self.access_token.as_deref().is_some_and(is_real_secret)
            && self
                .phone_number_id
                .as_deref()
                .is_some_and(|id| !id.trim().is_empty())
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bearer key for `/chat` and `/history` (open when unset)
    pub key: Option<String>,

    /// Port for the HTTP server
    pub port: u16,

    /// Allowed CORS origins; permissive when unset
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            port: 8000,
            allowed_origins: None,
        }
    }
}

/// Conversation history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Path to the SQLite database file
    pub db_path: String,

    /// Number of past entries handed to the generation prompt
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            db_path: "data/taxi-support.db".to_string(),
            limit: 8,
        }
    }
}

/// Slack for float rounding when summing a policy's weights
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// FAQ knowledge base and matcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqConfig {
    /// CSV file holding the question/answer table
    pub data_path: String,

    /// Candidates scoring at or below this are discarded
    pub relevance_floor: f64,

    /// Above this the stored answer is returned verbatim
    pub confidence_threshold: f64,

    /// Minimum score for the standalone matcher used without an LLM
    pub direct_answer_floor: f64,

    /// Candidates handed to the generation prompt
    pub context_top_k: usize,

    /// Text-similarity weight when ranking for LLM context
    pub context_text_weight: f64,

    /// Keyword-overlap weight when ranking for LLM context
    pub context_keyword_weight: f64,

    /// Text-similarity weight for the standalone matcher
    pub direct_text_weight: f64,

    /// Keyword-overlap weight for the standalone matcher
    pub direct_keyword_weight: f64,
}

impl Default for FaqConfig {
    fn default() -> Self {
        Self {
            data_path: "bot-data.csv".to_string(),
            relevance_floor: 0.1,
            confidence_threshold: 0.5,
            direct_answer_floor: 0.3,
            context_top_k: 3,
            context_text_weight: 0.6,
            context_keyword_weight: 0.4,
            direct_text_weight: 0.7,
            direct_keyword_weight: 0.3,
        }
    }
}

/// Customer support contact details used in canned replies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportConfig {
    /// Support hotline quoted to customers
    pub phone: String,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            phone: "920000000".to_string(),
        }
    }
}

/// Main configuration for the taxi support bot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub whatsapp: WhatsAppConfig,
    pub api: ApiConfig,
    pub history: HistoryConfig,
    pub faq: FaqConfig,
    pub support: SupportConfig,
}

fn default_api_version() -> String {
    "v18.0".to_string()
}

/// Rejects empty values and template placeholders such as `your_token_here`
fn is_real_secret(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.to_lowercase().starts_with("your")
}

/// Reads a non-empty environment variable
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Replace `${VAR_NAME}` with environment values
    ///
    /// Unknown variables expand to an empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut cfg = Self::from_toml_str(&toml_content)?;
        cfg.apply_env_overrides();
        cfg.validate()?;

        Ok(cfg)
    }

    /// Parse TOML content (after `${VAR}` expansion) without env overrides
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded = Self::expand_env_vars(content);
        toml::from_str(&expanded).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load from `taxi-support.toml` when present, otherwise from the environment
    pub fn load() -> crate::Result<Self> {
        if Path::new(CONFIG_FILE).exists() {
            return Self::from_toml_file(CONFIG_FILE);
        }

        Self::from_env()
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the matcher cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        let faq = &self.faq;
        for (name, value) in [
            ("faq.relevance_floor", faq.relevance_floor),
            ("faq.confidence_threshold", faq.confidence_threshold),
            ("faq.direct_answer_floor", faq.direct_answer_floor),
            ("faq.context_text_weight", faq.context_text_weight),
            ("faq.context_keyword_weight", faq.context_keyword_weight),
            ("faq.direct_text_weight", faq.direct_text_weight),
            ("faq.direct_keyword_weight", faq.direct_keyword_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{} must be within [0, 1], got {}", name, value)));
            }
        }
        // Combined scores must stay within [0, 1]
        for (name, sum) in [
            ("faq.context", faq.context_text_weight + faq.context_keyword_weight),
            ("faq.direct", faq.direct_text_weight + faq.direct_keyword_weight),
        ] {
            if sum > 1.0 + WEIGHT_SUM_TOLERANCE {
                return Err(Error::Config(format!(
                    "{}_text_weight + {}_keyword_weight must not exceed 1, got {}",
                    name, name, sum
                )));
            }
        }
        if faq.confidence_threshold < faq.relevance_floor {
            return Err(Error::Config(
                "faq.confidence_threshold must not be below faq.relevance_floor".to_string(),
            ));
        }
        if faq.context_top_k == 0 {
            return Err(Error::Config("faq.context_top_k must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Override settings from environment variables
    fn apply_env_overrides(&mut self) {
        if let Some(provider) = env_var("LLM_PROVIDER") {
            self.llm.provider = LlmProvider::parse(&provider);
        }

        if let Some(api_key) = env_var("LLM_API_KEY") {
            self.llm.api_key = api_key;
        } else if let Some(api_key) = env_var(self.llm.provider.key_env_var()) {
            self.llm.api_key = api_key;
        } else if !self.llm.is_configured() {
            // Only a Gemini key around: switch provider rather than run offline
            if let Some(api_key) = env_var("GEMINI_API_KEY") {
                self.llm.provider = LlmProvider::Gemini;
                self.llm.api_key = api_key;
            }
        }

        if let Some(model) = env_var("LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(base_url) = env_var("LLM_BASE_URL") {
            self.llm.base_url = Some(base_url);
        }
        if let Some(timeout) = env_var("LLM_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.llm.timeout_secs = timeout;
        }

        // WhatsApp
        if let Some(token) = env_var("META_TOKEN") {
            self.whatsapp.access_token = Some(token);
        }
        if let Some(id) = env_var("META_PHONE_NUMBER_ID") {
            self.whatsapp.phone_number_id = Some(id);
        }
        if let Some(token) = env_var("WEBHOOK_VERIFY_TOKEN") {
            self.whatsapp.verify_token = token;
        }
        if let Some(secret) = env_var("META_APP_SECRET") {
            self.whatsapp.app_secret = Some(secret);
        }
        if let Some(version) = env_var("META_API_VERSION") {
            self.whatsapp.api_version = version;
        }

        // HTTP API
        if let Some(key) = env_var("API_KEY") {
            self.api.key = Some(key);
        }
        if let Some(port) = env_var("API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }
        if let Some(origins) = env_var("API_ALLOWED_ORIGINS") {
            self.api.allowed_origins = Some(
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }

        // History
        if let Some(path) = env_var("DB_PATH") {
            self.history.db_path = path;
        }
        if let Some(limit) = env_var("HISTORY_LIMIT").and_then(|v| v.parse().ok()) {
            self.history.limit = limit;
        }

        // FAQ
        if let Some(path) = env_var("FAQ_DATA_PATH") {
            self.faq.data_path = path;
        }

        if let Some(phone) = env_var("SUPPORT_PHONE") {
            self.support.phone = phone;
        }
    }
}
