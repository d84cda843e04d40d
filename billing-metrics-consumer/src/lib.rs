//! Billing metrics consumer.
//!
//! Consumes pre-aggregated metric buckets from the generic metrics topic,
//! counts accepted transactions from transaction duration distributions and
//! emits one billing outcome per relevant bucket, committing consumer
//! positions per partition as it goes. Everything it knows about the outside
//! world goes through two injected capabilities (commit and produce), so the
//! core strategy is testable without Kafka.

pub mod bucket;
pub mod config;
pub mod consumer;
pub mod error;
pub mod metrics_consts;
pub mod outcome;
pub mod producer;
pub mod serve;
pub mod strategy;
pub mod types;
