// src/kafka.rs
use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rskafka::client::partition::{Compression, UnknownTopicHandling};
use rskafka::client::ClientBuilder;
use rskafka::record::Record;
use tracing::info;

use crate::config::KafkaConfig;
use crate::error::KafkaError;

/// Message published by the `publish` command when none is given.
pub const DEFAULT_MESSAGE: &str = "AI policy violation detected!";

/// A keyless record carrying `message` as its value.
pub fn build_record(message: &str, timestamp: DateTime<Utc>) -> Record {
    Record {
        key: None,
        value: Some(message.as_bytes().to_vec()),
        headers: BTreeMap::new(),
        timestamp,
    }
}

fn check(config: &KafkaConfig) -> Result<Vec<String>, KafkaError> {
    let brokers = config.brokers();
    if brokers.is_empty() {
        return Err(KafkaError::InvalidConfig(
            "no bootstrap servers configured".to_string(),
        ));
    }
    if config.topic.trim().is_empty() {
        return Err(KafkaError::InvalidConfig("topic is empty".to_string()));
    }
    Ok(brokers)
}

/// Produce one message and wait for the broker acknowledgement.
/// Returns the offset the record was written at.
pub async fn publish(config: &KafkaConfig, message: &str) -> Result<i64, KafkaError> {
    let brokers = check(config)?;
    let limit = Duration::from_secs(config.timeout_seconds);

    tokio::time::timeout(limit, produce(brokers, config, message))
        .await
        .map_err(|_| KafkaError::Timeout(config.timeout_seconds))?
}

async fn produce(
    brokers: Vec<String>,
    config: &KafkaConfig,
    message: &str,
) -> Result<i64, KafkaError> {
    info!("Connecting to Kafka at {}", brokers.join(","));
    let client = ClientBuilder::new(brokers)
        .build()
        .await
        .map_err(|source| KafkaError::Connect {
            brokers: config.bootstrap_servers.clone(),
            source,
        })?;

    let produce_error = |source| KafkaError::Produce {
        topic: config.topic.clone(),
        source,
    };

    let partition = client
        .partition_client(
            config.topic.clone(),
            config.partition,
            UnknownTopicHandling::Retry,
        )
        .await
        .map_err(produce_error)?;

    let offsets = partition
        .produce(
            vec![build_record(message, Utc::now())],
            Compression::NoCompression,
        )
        .await
        .map_err(produce_error)?;

    let offset = offsets.first().copied().unwrap_or_default();
    info!(
        "Published to {}[{}] at offset {}",
        config.topic, config.partition, offset
    );
    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_record_carries_message_only() {
        let now = Utc::now();
        let record = build_record(DEFAULT_MESSAGE, now);

        assert_eq!(record.key, None);
        assert_eq!(
            record.value.as_deref(),
            Some("AI policy violation detected!".as_bytes())
        );
        assert!(record.headers.is_empty());
        assert_eq!(record.timestamp, now);
    }

    #[test]
    fn test_empty_message_still_has_value() {
        let record = build_record("", Utc::now());
        assert_eq!(record.value, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_no_brokers_rejected_before_connecting() {
        let mut config = AppConfig::default().kafka;
        config.bootstrap_servers = " , ".to_string();

        let err = publish(&config, DEFAULT_MESSAGE).await.unwrap_err();
        assert!(matches!(err, KafkaError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_empty_topic_rejected() {
        let mut config = AppConfig::default().kafka;
        config.topic = "  ".to_string();

        let err = publish(&config, DEFAULT_MESSAGE).await.unwrap_err();
        assert!(matches!(err, KafkaError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_unreachable_broker_fails() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = AppConfig::default().kafka;
        config.bootstrap_servers = addr.to_string();
        config.timeout_seconds = 2;

        let err = publish(&config, DEFAULT_MESSAGE).await.unwrap_err();
        assert!(matches!(
            err,
            KafkaError::Connect { .. } | KafkaError::Timeout(2)
        ));
    }
}
