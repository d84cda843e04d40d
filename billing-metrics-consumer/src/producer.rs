use std::time::Duration;

use anyhow::Result;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::metrics_consts::OUTCOME_DELIVERY_FAILURES;
use crate::strategy::ProduceOutcome;

pub async fn create_kafka_producer(config: &Config) -> Result<FutureProducer, KafkaError> {
    let mut client_config = ClientConfig::new();
    client_config
        .set("bootstrap.servers", &config.kafka_hosts)
        .set("linger.ms", config.kafka_producer_linger_ms.to_string())
        .set(
            "message.timeout.ms",
            config.kafka_message_timeout_ms.to_string(),
        )
        .set(
            "compression.codec",
            config.kafka_compression_codec.to_owned(),
        )
        .set(
            "queue.buffering.max.kbytes",
            (config.kafka_producer_queue_mib * 1024).to_string(),
        )
        .set(
            "queue.buffering.max.messages",
            config.kafka_producer_queue_messages.to_string(),
        );

    if config.kafka_tls {
        client_config
            .set("security.protocol", "ssl")
            .set("enable.ssl.certificate.verification", "false");
    };

    debug!("rdkafka producer configuration: {:?}", client_config);
    let producer: FutureProducer = client_config.create()?;

    // "Ping" the Kafka brokers by requesting metadata
    match producer
        .client()
        .fetch_metadata(None, Duration::from_secs(15))
    {
        Ok(metadata) => {
            info!(
                "Successfully connected to Kafka brokers. Found {} topics.",
                metadata.topics().len()
            );
        }
        Err(error) => {
            error!("Failed to fetch metadata from Kafka brokers: {:?}", error);
            return Err(error);
        }
    }

    Ok(producer)
}

/// Produce capability backed by a Kafka producer.
///
/// Enqueueing is synchronous and its failure propagates to the caller, which
/// is what backpressures the strategy when the producer queue is full.
/// Delivery is confirmed on a spawned task; delivery failures are logged and
/// counted but arrive too late to fail the originating submit.
pub struct KafkaOutcomeProducer {
    producer: FutureProducer,
}

impl KafkaOutcomeProducer {
    pub fn new(producer: FutureProducer) -> Self {
        Self { producer }
    }
}

impl ProduceOutcome for KafkaOutcomeProducer {
    fn produce(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        let record: FutureRecord<'_, (), [u8]> = FutureRecord::to(topic).payload(payload);

        let delivery = match self.producer.send_result(record) {
            Ok(delivery) => delivery,
            Err((error, _)) => return Err(error.into()),
        };

        tokio::spawn(async move {
            match delivery.await {
                Ok(Ok(_)) => {}
                Ok(Err((error, _))) => {
                    error!(error = %error, "Outcome delivery failed");
                    metrics::counter!(OUTCOME_DELIVERY_FAILURES).increment(1);
                }
                Err(_) => {
                    error!("Outcome delivery canceled");
                    metrics::counter!(OUTCOME_DELIVERY_FAILURES).increment(1);
                }
            }
        });

        Ok(())
    }
}
