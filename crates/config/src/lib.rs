use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "campus.toml",
    "config/campus.toml",
    "crates/config/campus.toml",
    "../campus.toml",
    "../config/campus.toml",
    "../crates/config/campus.toml",
    "backend/campus.toml",
    "backend/config/campus.toml",
    "backend/crates/config/campus.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub billing: BillingConfig,
    pub assistant: AssistantConfig,
    pub uploads: UploadsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            billing: BillingConfig::default(),
            assistant: AssistantConfig::default(),
            uploads: UploadsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://campus.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl_seconds: u64,
    #[serde(default = "AuthConfig::default_otp_ttl")]
    pub otp_ttl_seconds: u64,
    /// Returns freshly generated OTP codes in the send-otp response so
    /// clients can complete verification without an SMS channel. Disable
    /// once a real delivery provider is wired up.
    #[serde(default = "AuthConfig::default_expose_otp")]
    pub expose_otp_codes: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: Self::default_session_ttl(),
            otp_ttl_seconds: Self::default_otp_ttl(),
            expose_otp_codes: Self::default_expose_otp(),
        }
    }
}

impl AuthConfig {
    fn default_session_ttl() -> u64 {
        86_400
    }

    const fn default_otp_ttl() -> u64 {
        300
    }

    const fn default_expose_otp() -> bool {
        true
    }
}

/// Configuration for the external checkout gateway.
///
/// When `base_url` or `api_key` is absent the server falls back to the
/// in-process sandbox gateway, which approves every transaction.
///
/// ```
/// use campus_config::BillingConfig;
///
/// let billing = BillingConfig::default();
/// assert_eq!(billing.currency, "TRY");
/// assert_eq!(billing.request_timeout_seconds, 30);
/// assert!(billing.base_url.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "BillingConfig::default_currency")]
    pub currency: String,
    #[serde(default = "BillingConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl BillingConfig {
    fn default_currency() -> String {
        "TRY".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            currency: Self::default_currency(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub gemini: GeminiProviderConfig,
    #[serde(default)]
    pub openai: OpenAiProviderConfig,
    #[serde(default = "AssistantConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl AssistantConfig {
    const fn default_request_timeout() -> u64 {
        30
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            gemini: GeminiProviderConfig::default(),
            openai: OpenAiProviderConfig::default(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "GeminiProviderConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "GeminiProviderConfig::default_model")]
    pub model: String,
}

impl GeminiProviderConfig {
    fn default_base_url() -> String {
        "https://generativelanguage.googleapis.com/v1beta".to_string()
    }

    fn default_model() -> String {
        "gemini-pro".to_string()
    }
}

impl Default for GeminiProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Self::default_base_url(),
            model: Self::default_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "OpenAiProviderConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "OpenAiProviderConfig::default_model")]
    pub model: String,
}

impl OpenAiProviderConfig {
    fn default_base_url() -> String {
        "https://api.openai.com/v1".to_string()
    }

    fn default_model() -> String {
        "gpt-3.5-turbo".to_string()
    }
}

impl Default for OpenAiProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Self::default_base_url(),
            model: Self::default_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    pub dir: String,
    pub max_image_bytes: u64,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: "uploads".to_string(),
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use campus_config::load;
///
/// std::env::remove_var("CAMPUS_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let db_max = defaults.database.max_connections as i64;
    let session_ttl = defaults.auth.session_ttl_seconds;
    let session_ttl_i64 = if session_ttl > i64::MAX as u64 {
        i64::MAX
    } else {
        session_ttl as i64
    };

    let mut builder = config::Config::builder();
    builder = builder
        .set_default("http.address", defaults.http.address.clone())
        .unwrap()
        .set_default("http.port", i64::from(defaults.http.port))
        .unwrap()
        .set_default("database.url", defaults.database.url.clone())
        .unwrap()
        .set_default("database.max_connections", db_max)
        .unwrap()
        .set_default("auth.session_ttl_seconds", session_ttl_i64)
        .unwrap()
        .set_default(
            "auth.otp_ttl_seconds",
            i64::try_from(defaults.auth.otp_ttl_seconds).unwrap_or(i64::MAX),
        )
        .unwrap()
        .set_default("auth.expose_otp_codes", defaults.auth.expose_otp_codes)
        .unwrap()
        .set_default("billing.currency", defaults.billing.currency.clone())
        .unwrap()
        .set_default(
            "billing.request_timeout_seconds",
            i64::try_from(defaults.billing.request_timeout_seconds).unwrap_or(i64::MAX),
        )
        .unwrap()
        .set_default(
            "assistant.gemini.base_url",
            defaults.assistant.gemini.base_url.clone(),
        )
        .unwrap()
        .set_default(
            "assistant.gemini.model",
            defaults.assistant.gemini.model.clone(),
        )
        .unwrap()
        .set_default(
            "assistant.openai.base_url",
            defaults.assistant.openai.base_url.clone(),
        )
        .unwrap()
        .set_default(
            "assistant.openai.model",
            defaults.assistant.openai.model.clone(),
        )
        .unwrap()
        .set_default(
            "assistant.request_timeout_seconds",
            i64::try_from(defaults.assistant.request_timeout_seconds).unwrap_or(i64::MAX),
        )
        .unwrap()
        .set_default("uploads.dir", defaults.uploads.dir.clone())
        .unwrap()
        .set_default(
            "uploads.max_image_bytes",
            i64::try_from(defaults.uploads.max_image_bytes).unwrap_or(i64::MAX),
        )
        .unwrap();

    let environment_overrides = config::Environment::with_prefix("CAMPUS").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("CAMPUS_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via CAMPUS_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.session_ttl_seconds > i64::MAX as u64 {
        config.auth.session_ttl_seconds = i64::MAX as u64;
    }

    debug!(?config, "loaded backend configuration");
    Ok(config)
}
