// src/error.rs
use thiserror::Error;

/// Failures of the authenticated profile request.
///
/// A non-200 answer from the API is not an error: it is reported through
/// [`crate::profile::FetchOutcome::Rejected`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no access token configured (set LINKEDIN_ACCESS_TOKEN or pass --token)")]
    MissingToken,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("profile response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("element #{id} not found: {reason}")]
    ElementNotFound { id: String, reason: String },

    #[error("interaction with #{id} failed: {reason}")]
    Interaction { id: String, reason: String },

    #[error("failed to read page content: {0}")]
    Content(String),

    #[error("failed to close browser session: {0}")]
    Close(String),

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid model input: {0}")]
    InvalidInput(String),

    #[error("model hub error: {0}")]
    Hub(#[from] hf_hub::api::sync::ApiError),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("onnx runtime error: {0}")]
    Onnx(#[from] ort::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model config: {0}")]
    Config(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum KafkaError {
    #[error("invalid kafka settings: {0}")]
    InvalidConfig(String),

    #[error("failed to connect to {brokers}: {source}")]
    Connect {
        brokers: String,
        #[source]
        source: rskafka::client::error::Error,
    },

    #[error("failed to produce to {topic}: {source}")]
    Produce {
        topic: String,
        #[source]
        source: rskafka::client::error::Error,
    },

    #[error("kafka publish timed out after {0} seconds")]
    Timeout(u64),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
