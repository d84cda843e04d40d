//! The scheduler side of the strategy: a single task that owns the Kafka
//! consumer, alternates poll and submit on the strategy, and tears it down
//! with close/join on shutdown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::{ClientConfig, Offset, TopicPartitionList};
use tokio::time::timeout;
use tracing::{error, info};

use crate::config::Config;
use crate::error::BillingConsumerError;
use crate::metrics_consts::CONSUMER_RECV_ERRORS;
use crate::producer::{create_kafka_producer, KafkaOutcomeProducer};
use crate::strategy::{BillingTxCountStrategy, CommitOffsets, ProcessingStrategy};
use crate::types::{Partition, Position, StreamMessage};

/// Commit capability backed by the consumer's own group offsets.
///
/// Holds the same consumer the loop reads from; this component is the only
/// committer for the partitions it owns. Unforced commits go out
/// asynchronously and may be batched by librdkafka, forced ones block until
/// the group coordinator has them.
pub struct ConsumerCommitOffsets {
    consumer: Arc<StreamConsumer>,
}

impl CommitOffsets for ConsumerCommitOffsets {
    fn commit(&mut self, positions: HashMap<Partition, Position>, force: bool) -> Result<()> {
        if positions.is_empty() {
            return Ok(());
        }

        let mut list = TopicPartitionList::with_capacity(positions.len());
        for (partition, position) in &positions {
            list.add_partition_offset(
                partition.topic(),
                partition.index(),
                Offset::Offset(position.offset),
            )
            .context("building commit offset list")?;
        }

        let mode = if force {
            CommitMode::Sync
        } else {
            CommitMode::Async
        };
        self.consumer
            .commit(&list, mode)
            .context("committing offsets")?;
        Ok(())
    }
}

pub struct BillingConsumerLoop {
    consumer: Arc<StreamConsumer>,
    strategy: BillingTxCountStrategy<ConsumerCommitOffsets, KafkaOutcomeProducer>,
    recv_timeout: Duration,
    shutdown_timeout: Duration,
}

impl BillingConsumerLoop {
    pub async fn new(config: &Config) -> Result<Self, BillingConsumerError> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("group.id", &config.kafka_consumer_group)
            .set("bootstrap.servers", &config.kafka_hosts)
            .set("statistics.interval.ms", "10000")
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", &config.kafka_consumer_offset_reset);

        if config.kafka_tls {
            client_config
                .set("security.protocol", "ssl")
                .set("enable.ssl.certificate.verification", "false");
        };

        let consumer: StreamConsumer = client_config.create()?;
        consumer.subscribe(&[&config.kafka_consumer_topic])?;

        info!(
            topic = config.kafka_consumer_topic,
            group_id = config.kafka_consumer_group,
            "Kafka consumer subscribed"
        );

        let consumer = Arc::new(consumer);
        let producer = create_kafka_producer(config).await?;

        let strategy = BillingTxCountStrategy::new(
            ConsumerCommitOffsets {
                consumer: consumer.clone(),
            },
            KafkaOutcomeProducer::new(producer),
            config.outcomes_topic.clone(),
            config.transaction_metric_id,
        );

        Ok(Self {
            consumer,
            strategy,
            recv_timeout: config.recv_timeout(),
            shutdown_timeout: config.shutdown_timeout(),
        })
    }

    /// Run until the shutdown flag flips, then close and join the strategy.
    ///
    /// Mirrors the poll/submit cadence of a stream processor run loop: every
    /// iteration polls the strategy (flushing positions accumulated by the
    /// previous submit), then waits up to `recv_timeout` for the next
    /// message. A strategy error is fatal and aborts the loop.
    pub async fn run(
        mut self,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> Result<(), BillingConsumerError> {
        info!("Starting billing consumer loop");

        loop {
            if *shutdown.borrow() {
                info!("Shutdown signal received, stopping consumer loop");
                break;
            }

            self.strategy.poll()?;

            match timeout(self.recv_timeout, self.consumer.recv()).await {
                Ok(Ok(message)) => {
                    self.strategy.submit(stream_message(&message))?;
                }
                Ok(Err(e)) => {
                    error!(error = %e, "kafka recv error");
                    metrics::counter!(CONSUMER_RECV_ERRORS).increment(1);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                Err(_) => {
                    // Timeout without a message, the next iteration's poll
                    // doubles as the heartbeat.
                }
            }
        }

        self.strategy.close();
        self.strategy.join(Some(self.shutdown_timeout))?;
        info!("Final offsets committed, consumer loop stopped");
        Ok(())
    }
}

fn stream_message(message: &BorrowedMessage<'_>) -> StreamMessage {
    let timestamp = message
        .timestamp()
        .to_millis()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        // Brokers without message timestamps leave us wall clock.
        .unwrap_or_else(Utc::now);

    StreamMessage::new(
        Partition::new(message.topic(), message.partition()),
        message.offset(),
        timestamp,
        message.payload().unwrap_or_default().to_vec(),
    )
}
