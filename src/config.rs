// src/config.rs
//! Unified configuration: built-in defaults, then an optional TOML file,
//! then environment variables. CLI flags are applied by the command handlers.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_VAR: &str = "LINKEDIN_INSIGHTS_CONFIG";

const DEFAULT_API_BASE_URL: &str = "https://api.linkedin.com";
const DEFAULT_PROFILE_PATH: &str = "/v2/me";
const DEFAULT_LOGIN_URL: &str = "https://www.linkedin.com/login";
const DEFAULT_TEXT_MODEL: &str = "deepseek-ai/deepseek-coder-7b";
const DEFAULT_ONNX_MODEL: &str = "ai_model.onnx";
const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_LOG_FILE: &str = "/tmp/linkedin-insights.log";
const DEFAULT_KAFKA_BROKERS: &str = "localhost:9092";
const DEFAULT_KAFKA_TOPIC: &str = "ai-security-events";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub linkedin: LinkedInConfig,
    pub browser: BrowserConfig,
    pub models: ModelConfig,
    pub server: ServerConfig,
    pub kafka: KafkaConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone)]
pub struct LinkedInConfig {
    pub api_base_url: String,
    pub profile_path: String,
    pub access_token: Option<String>,
    pub timeout_seconds: u64,
}

// Hand-written so the token never reaches logs.
impl std::fmt::Debug for LinkedInConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedInConfig")
            .field("api_base_url", &self.api_base_url)
            .field("profile_path", &self.profile_path)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl LinkedInConfig {
    pub fn profile_url(&self) -> String {
        format!(
            "{}{}",
            self.api_base_url.trim_end_matches('/'),
            self.profile_path
        )
    }
}

#[derive(Clone)]
pub struct BrowserConfig {
    pub login_url: String,
    pub username_field: String,
    pub password_field: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub settle_seconds: u64,
    pub headless: bool,
}

impl std::fmt::Debug for BrowserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserConfig")
            .field("login_url", &self.login_url)
            .field("username_field", &self.username_field)
            .field("password_field", &self.password_field)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("settle_seconds", &self.settle_seconds)
            .field("headless", &self.headless)
            .finish()
    }
}

impl BrowserConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_seconds)
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub text_model: String,
    pub max_length: usize,
    pub temperature: Option<f64>,
    pub seed: u64,
    pub onnx_model_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Comma-separated `host:port` list.
    pub bootstrap_servers: String,
    pub topic: String,
    pub partition: i32,
    pub timeout_seconds: u64,
}

impl KafkaConfig {
    pub fn brokers(&self) -> Vec<String> {
        self.bootstrap_servers
            .split(',')
            .map(str::trim)
            .filter(|broker| !broker.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            linkedin: LinkedInConfig {
                api_base_url: DEFAULT_API_BASE_URL.to_string(),
                profile_path: DEFAULT_PROFILE_PATH.to_string(),
                access_token: None,
                timeout_seconds: 30,
            },
            browser: BrowserConfig {
                login_url: DEFAULT_LOGIN_URL.to_string(),
                username_field: "username".to_string(),
                password_field: "password".to_string(),
                username: None,
                password: None,
                settle_seconds: 5,
                headless: true,
            },
            models: ModelConfig {
                text_model: DEFAULT_TEXT_MODEL.to_string(),
                max_length: 100,
                temperature: None,
                seed: 299792458,
                onnx_model_path: PathBuf::from(DEFAULT_ONNX_MODEL),
            },
            server: ServerConfig {
                bind: DEFAULT_BIND.to_string(),
            },
            kafka: KafkaConfig {
                bootstrap_servers: DEFAULT_KAFKA_BROKERS.to_string(),
                topic: DEFAULT_KAFKA_TOPIC.to_string(),
                partition: 0,
                timeout_seconds: 30,
            },
            logging: LoggingConfig {
                log_file: PathBuf::from(DEFAULT_LOG_FILE),
            },
        }
    }
}

// File layout: every section and key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    linkedin: LinkedInSection,
    browser: BrowserSection,
    models: ModelSection,
    server: ServerSection,
    kafka: KafkaSection,
    logging: LoggingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LinkedInSection {
    api_base_url: Option<String>,
    profile_path: Option<String>,
    access_token: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct BrowserSection {
    login_url: Option<String>,
    username_field: Option<String>,
    password_field: Option<String>,
    username: Option<String>,
    password: Option<String>,
    settle_seconds: Option<u64>,
    headless: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ModelSection {
    text_model: Option<String>,
    max_length: Option<usize>,
    temperature: Option<f64>,
    seed: Option<u64>,
    onnx_model_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ServerSection {
    bind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct KafkaSection {
    bootstrap_servers: Option<String>,
    topic: Option<String>,
    partition: Option<i32>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LoggingSection {
    log_file: Option<PathBuf>,
}

pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from defaults, the optional file and the process environment.
    ///
    /// `path` wins over `LINKEDIN_INSIGHTS_CONFIG`; with neither, only defaults
    /// and environment are used.
    pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();
        if let Some(file_path) = Self::file_path(path) {
            let file = Self::read_file(&file_path)?;
            Self::apply_file(&mut config, file);
        }

        Self::apply_env(&mut config, |key| std::env::var(key).ok())?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// The configuration file `load` reads, if any.
    pub fn file_path(path: Option<&Path>) -> Option<PathBuf> {
        Self::resolve_file_path(path, |key| std::env::var(key).ok())
    }

    fn resolve_file_path<F>(path: Option<&Path>, lookup: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        path.map(Path::to_path_buf).or_else(|| {
            lookup(CONFIG_PATH_VAR)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        })
    }

    fn validate(config: &AppConfig) -> Result<(), ConfigError> {
        let timeouts = [
            ("linkedin.timeout_seconds", config.linkedin.timeout_seconds),
            ("kafka.timeout_seconds", config.kafka.timeout_seconds),
        ];
        for (key, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: value.to_string(),
                });
            }
        }

        if config.kafka.partition < 0 {
            return Err(ConfigError::InvalidValue {
                key: "kafka.partition",
                value: config.kafka.partition.to_string(),
            });
        }
        Ok(())
    }

    fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    fn apply_file(config: &mut AppConfig, file: ConfigFile) {
        let ConfigFile {
            linkedin,
            browser,
            models,
            server,
            kafka,
            logging,
        } = file;

        set(&mut config.linkedin.api_base_url, linkedin.api_base_url);
        set(&mut config.linkedin.profile_path, linkedin.profile_path);
        set_opt(&mut config.linkedin.access_token, linkedin.access_token);
        set(&mut config.linkedin.timeout_seconds, linkedin.timeout_seconds);

        set(&mut config.browser.login_url, browser.login_url);
        set(&mut config.browser.username_field, browser.username_field);
        set(&mut config.browser.password_field, browser.password_field);
        set_opt(&mut config.browser.username, browser.username);
        set_opt(&mut config.browser.password, browser.password);
        set(&mut config.browser.settle_seconds, browser.settle_seconds);
        set(&mut config.browser.headless, browser.headless);

        set(&mut config.models.text_model, models.text_model);
        set(&mut config.models.max_length, models.max_length);
        set_opt(&mut config.models.temperature, models.temperature);
        set(&mut config.models.seed, models.seed);
        set(&mut config.models.onnx_model_path, models.onnx_model_path);

        set(&mut config.server.bind, server.bind);

        set(&mut config.kafka.bootstrap_servers, kafka.bootstrap_servers);
        set(&mut config.kafka.topic, kafka.topic);
        set(&mut config.kafka.partition, kafka.partition);
        set(&mut config.kafka.timeout_seconds, kafka.timeout_seconds);

        set(&mut config.logging.log_file, logging.log_file);
    }

    fn apply_env<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        set_opt(&mut config.linkedin.access_token, var("LINKEDIN_ACCESS_TOKEN"));
        set(&mut config.linkedin.api_base_url, var("LINKEDIN_API_URL"));
        set_opt(&mut config.browser.username, var("LINKEDIN_USERNAME"));
        set_opt(&mut config.browser.password, var("LINKEDIN_PASSWORD"));
        set(&mut config.browser.login_url, var("LINKEDIN_LOGIN_URL"));
        set(&mut config.models.text_model, var("TEXT_GENERATION_MODEL"));
        set(
            &mut config.models.onnx_model_path,
            var("ONNX_MODEL_PATH").map(PathBuf::from),
        );
        set(&mut config.server.bind, var("ECHO_SERVER_BIND"));
        set(
            &mut config.kafka.bootstrap_servers,
            var("KAFKA_BOOTSTRAP_SERVERS"),
        );
        set(&mut config.kafka.topic, var("KAFKA_TOPIC"));
        set(
            &mut config.logging.log_file,
            var("LINKEDIN_INSIGHTS_LOG").map(PathBuf::from),
        );

        if let Some(raw) = var("LINKEDIN_TIMEOUT_SECONDS") {
            config.linkedin.timeout_seconds =
                raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "LINKEDIN_TIMEOUT_SECONDS",
                    value: raw.clone(),
                })?;
        }

        Ok(())
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn set_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}
