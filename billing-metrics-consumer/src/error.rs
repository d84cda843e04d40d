use rdkafka::error::KafkaError;
use thiserror::Error;

/// Errors surfaced by the processing strategy to its driver.
///
/// These are dependency failures (the injected commit or produce capability
/// broke), propagated unchanged. Lifecycle misuse is a bug in the driver and
/// panics instead of landing here.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("failed to commit offsets: {source}")]
    Commit {
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to produce outcome: {source}")]
    Produce {
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Error, Debug)]
pub enum BillingConsumerError {
    #[error("kafka error: {0}")]
    Kafka(#[from] KafkaError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),
}
