//! Standalone LinkedIn and local-model utilities: a REST profile fetcher, a
//! browser scraper, a question extractor, text-generation and ONNX runners,
//! a WebSocket echo server and a Kafka event publisher.

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod kafka;
pub mod models;
pub mod profile;
pub mod questions;
pub mod server;

pub use config::{AppConfig, ConfigManager};
pub use error::{ConfigError, FetchError, KafkaError, ModelError, ScrapeError};
pub use profile::{FetchOutcome, ProfileClient};
pub use questions::extract_questions;
