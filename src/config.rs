use std::env;
use std::time::Duration;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// The analysis service endpoint or key is not configured.
    ///
    /// This is deliberately not a startup error: the server comes up and
    /// reports the misconfiguration per request instead of crash-looping.
    #[error("Analysis service is not configured (missing {0})")]
    AnalysisNotConfigured(&'static str),
    /// The speech-synthesis key or region is not configured.
    #[error("Speech service is not configured (missing {0})")]
    SpeechNotConfigured(&'static str),
}

/// Default analysis API version sent with every submit call.
pub const DEFAULT_API_VERSION: &str = "2024-11-30";
/// Default analysis model when no override is supplied.
pub const DEFAULT_MODEL_ID: &str = "prebuilt-read";
/// Default number of poll attempts before declaring a timeout.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 12;
/// Default wait between poll attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Runtime configuration for the billscan server.
///
/// Constructed once at startup and passed by parameter into every component;
/// there is no ambient global, so tests can inject their own values.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the document-analysis service, when configured.
    pub analysis_endpoint: Option<String>,
    /// Subscription key for the document-analysis service, when configured.
    pub analysis_key: Option<String>,
    /// API version appended to every analysis submit call.
    pub api_version: String,
    /// Analysis model identifier (e.g. `prebuilt-read`).
    pub model_id: String,
    /// Maximum number of poll attempts before declaring a timeout.
    pub poll_attempts: u32,
    /// Wait between poll attempts.
    pub poll_interval: Duration,
    /// Origins allowed to call the API from a browser.
    pub allowed_origins: Vec<String>,
    /// Whether the per-request debug trace is serialized into responses.
    pub verbose_debug: bool,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Subscription key for the speech-synthesis service, when configured.
    pub speech_key: Option<String>,
    /// Region of the speech-synthesis service, when configured.
    pub speech_region: Option<String>,
}

/// Fully resolved connection settings for the document-analysis service.
///
/// Produced by [`Config::analysis`] once the endpoint and key are known to be
/// present, so the client never deals in `Option`s.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Base URL of the analysis service.
    pub endpoint: String,
    /// Subscription key sent with every call.
    pub api_key: String,
    /// API version query parameter.
    pub api_version: String,
    /// Model identifier in the submit path.
    pub model_id: String,
    /// Maximum number of poll attempts.
    pub poll_attempts: u32,
    /// Wait between poll attempts.
    pub poll_interval: Duration,
}

/// Resolved connection settings for the speech-synthesis service.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Subscription key sent with every call.
    pub api_key: String,
    /// Service region used to form the synthesis URL.
    pub region: String,
}

impl Config {
    /// Load configuration from environment variables, performing validation
    /// along the way.
    ///
    /// Several logical fields have accumulated multiple environment-variable
    /// names across deployments; each is resolved through a fixed fallback
    /// chain where the first non-empty value wins.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            analysis_endpoint: load_env_chain(&[
                "DOCINTEL_ENDPOINT",
                "AZURE_DOCINTEL_ENDPOINT",
                "FORM_RECOGNIZER_ENDPOINT",
                "AZURE_FORMREC_ENDPOINT",
            ])
            .map(|value| value.trim_end_matches('/').to_string()),
            analysis_key: load_env_chain(&[
                "DOCINTEL_KEY",
                "AZURE_DOCINTEL_KEY",
                "FORM_RECOGNIZER_KEY",
                "AZURE_FORMREC_KEY",
            ]),
            api_version: load_env_optional("DOCINTEL_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            model_id: load_env_chain(&["DOCINTEL_MODEL_ID", "DOCINTEL_MODEL"])
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            poll_attempts: load_env_optional("DOCINTEL_POLL_ATTEMPTS")
                .map(|value| {
                    value
                        .parse::<u32>()
                        .ok()
                        .filter(|attempts| *attempts >= 1)
                        .ok_or_else(|| ConfigError::InvalidValue("DOCINTEL_POLL_ATTEMPTS".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_POLL_ATTEMPTS),
            poll_interval: load_env_optional("DOCINTEL_POLL_INTERVAL_MS")
                .map(|value| {
                    value.parse::<u64>().map(Duration::from_millis).map_err(|_| {
                        ConfigError::InvalidValue("DOCINTEL_POLL_INTERVAL_MS".into())
                    })
                })
                .transpose()?
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            allowed_origins: load_env_optional("ALLOWED_ORIGINS")
                .map(|value| {
                    value
                        .split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            verbose_debug: load_env_optional("VERBOSE_DEBUG")
                .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
            speech_key: load_env_chain(&["AZURE_SPEECH_KEY", "SPEECH_KEY"]),
            speech_region: load_env_chain(&["AZURE_SPEECH_REGION", "SPEECH_REGION"]),
        })
    }

    /// Resolve the analysis connection settings, failing when the endpoint or
    /// key is absent.
    pub fn analysis(&self) -> Result<AnalysisConfig, ConfigError> {
        let endpoint = self
            .analysis_endpoint
            .clone()
            .ok_or(ConfigError::AnalysisNotConfigured("endpoint"))?;
        let api_key = self
            .analysis_key
            .clone()
            .ok_or(ConfigError::AnalysisNotConfigured("key"))?;
        Ok(AnalysisConfig {
            endpoint,
            api_key,
            api_version: self.api_version.clone(),
            model_id: self.model_id.clone(),
            poll_attempts: self.poll_attempts,
            poll_interval: self.poll_interval,
        })
    }

    /// Resolve the speech-synthesis settings, failing when the key or region
    /// is absent.
    pub fn speech(&self) -> Result<SpeechConfig, ConfigError> {
        let api_key = self
            .speech_key
            .clone()
            .ok_or(ConfigError::SpeechNotConfigured("key"))?;
        let region = self
            .speech_region
            .clone()
            .ok_or(ConfigError::SpeechNotConfigured("region"))?;
        Ok(SpeechConfig { api_key, region })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis_endpoint: None,
            analysis_key: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            allowed_origins: Vec::new(),
            verbose_debug: false,
            server_port: None,
            speech_key: None,
            speech_region: None,
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Walk a legacy-name fallback chain; the first non-empty value wins.
fn load_env_chain(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| load_env_optional(key))
}

/// Load `.env` and build the process configuration, logging the result.
pub fn init_config() -> Config {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        has_analysis_endpoint = config.analysis_endpoint.is_some(),
        has_analysis_key = config.analysis_key.is_some(),
        api_version = %config.api_version,
        model_id = %config.model_id,
        poll_attempts = config.poll_attempts,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        allowed_origins = config.allowed_origins.len(),
        verbose_debug = config.verbose_debug,
        "Loaded configuration"
    );
    config
}
