use std::time::Duration;

use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    // Kafka configuration
    #[envconfig(default = "localhost:9092")]
    pub kafka_hosts: String,

    #[envconfig(default = "false")]
    pub kafka_tls: bool,

    #[envconfig(default = "billing-metrics-consumer")]
    pub kafka_consumer_group: String,

    #[envconfig(default = "snuba-generic-metrics")]
    pub kafka_consumer_topic: String,

    // A new billing consumer should start from the tip of the metrics
    // topic rather than replay history it never billed before.
    #[envconfig(default = "latest")]
    pub kafka_consumer_offset_reset: String,

    // Kafka producer configuration
    #[envconfig(default = "20")]
    pub kafka_producer_linger_ms: u32,

    #[envconfig(default = "400")]
    pub kafka_producer_queue_mib: u32,

    #[envconfig(default = "10000000")]
    pub kafka_producer_queue_messages: u32,

    #[envconfig(default = "20000")]
    pub kafka_message_timeout_ms: u32,

    #[envconfig(default = "none")]
    pub kafka_compression_codec: String, // none, gzip, snappy, lz4, zstd

    // Topic the outcome events are produced to
    #[envconfig(default = "outcomes")]
    pub outcomes_topic: String,

    /// Indexer id of `d:transactions/duration@millisecond`. Every
    /// transaction processed upstream contributes one sample to this
    /// distribution, which is what makes its sample count billable.
    #[envconfig(default = "9223372036854775909")]
    pub transaction_metric_id: u64,

    // HTTP server configuration
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub bind_host: String,

    #[envconfig(from = "BIND_PORT", default = "8080")]
    pub bind_port: u16,

    // Consumer loop configuration
    #[envconfig(default = "1000")]
    pub recv_timeout_ms: u64,

    #[envconfig(default = "30")]
    pub shutdown_timeout_secs: u64,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }

    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::init_from_hashmap(&Default::default()).unwrap();

        assert_eq!(config.kafka_consumer_topic, "snuba-generic-metrics");
        assert_eq!(config.kafka_consumer_group, "billing-metrics-consumer");
        assert_eq!(config.outcomes_topic, "outcomes");
        assert_eq!(config.transaction_metric_id, 9223372036854775909);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.recv_timeout(), Duration::from_millis(1000));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
    }
}
