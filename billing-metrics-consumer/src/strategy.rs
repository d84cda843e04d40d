//! The billing strategy: counts accepted transactions from transaction
//! duration distribution buckets and emits one outcome event per relevant
//! non-empty bucket, while tracking committable positions per partition.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::bucket::{BucketValue, MetricType, MetricsBucket};
use crate::error::StrategyError;
use crate::metrics_consts::{
    BUCKETS_PROCESSED, OFFSET_COMMITS, OUTCOMES_PRODUCED, TRANSACTIONS_ACCEPTED,
};
use crate::outcome::TrackedOutcome;
use crate::types::{Partition, Position, StreamMessage};

/// Durable checkpointing of consumer positions.
///
/// `positions` maps each partition to the next offset to read. A forced
/// commit must be durable before returning; an unforced one may be batched
/// or deferred by the implementation. Implementations must tolerate the same
/// positions being committed more than once (at-least-once redelivery).
pub trait CommitOffsets {
    fn commit(&mut self, positions: HashMap<Partition, Position>, force: bool) -> Result<()>;
}

/// Delivery of one serialized outcome event to a named topic. Synchronous
/// from the strategy's point of view; failure propagates to the caller.
pub trait ProduceOutcome {
    fn produce(&mut self, topic: &str, payload: &[u8]) -> Result<()>;
}

/// Scheduler-driven message processing lifecycle.
///
/// A single driver task alternates `poll` and `submit` strictly
/// sequentially, then tears the strategy down with `close` followed by
/// exactly one `join`. Calling `poll` or `submit` on a closed strategy, or
/// `join` out of order, is a bug in the driver and panics.
pub trait ProcessingStrategy {
    /// Heartbeat between message arrivals. Flushes positions accumulated by
    /// previous `submit` calls with an unforced commit.
    fn poll(&mut self) -> Result<(), StrategyError>;

    /// Process one message and record its position as pending commit.
    fn submit(&mut self, message: StreamMessage) -> Result<(), StrategyError>;

    /// Mark the strategy closed. Idempotent; every later `poll`/`submit`
    /// panics.
    fn close(&mut self);

    /// Flush remaining positions with one forced commit. Must be called
    /// exactly once, after `close`.
    fn join(&mut self, timeout: Option<Duration>) -> Result<(), StrategyError>;
}

/// Counts accepted transactions from the transaction duration metric.
///
/// Each relevant bucket maps to exactly one outcome, so the aggregation is
/// intra-message; cross-message windowed state would slot into this struct
/// without changing the `ProcessingStrategy` contract.
pub struct BillingTxCountStrategy<C, P> {
    commit: C,
    producer: P,
    outcomes_topic: String,
    transaction_metric_id: u64,
    pending_positions: HashMap<Partition, Position>,
    closed: bool,
    joined: bool,
}

impl<C: CommitOffsets, P: ProduceOutcome> BillingTxCountStrategy<C, P> {
    pub fn new(
        commit: C,
        producer: P,
        outcomes_topic: impl Into<String>,
        transaction_metric_id: u64,
    ) -> Self {
        Self {
            commit,
            producer,
            outcomes_topic: outcomes_topic.into(),
            transaction_metric_id,
            pending_positions: HashMap::new(),
            closed: false,
            joined: false,
        }
    }

    /// Number of transaction events a bucket stands for. Zero for anything
    /// that is not a non-empty distribution of the target metric.
    fn count_processed_transactions(&self, bucket: &MetricsBucket) -> u64 {
        if bucket.metric_id != self.transaction_metric_id
            || bucket.metric_type != MetricType::Distribution
        {
            return 0;
        }
        match &bucket.value {
            BucketValue::Samples(samples) => samples.len() as u64,
            // A scalar-valued distribution is malformed, skip it.
            BucketValue::Scalar(_) => 0,
        }
    }

    fn produce_billing_outcome(&mut self, message: &StreamMessage) -> Result<(), StrategyError> {
        let bucket = match MetricsBucket::parse(message.payload()) {
            Ok(bucket) => bucket,
            Err(e) => {
                warn!(
                    topic = message.partition().topic(),
                    partition = message.partition().index(),
                    offset = message.offset(),
                    error = ?e,
                    "Skipping undecodable metrics bucket"
                );
                metrics::counter!(BUCKETS_PROCESSED, "disposition" => "malformed").increment(1);
                return Ok(());
            }
        };

        let quantity = self.count_processed_transactions(&bucket);
        if quantity == 0 {
            let disposition = if bucket.metric_id == self.transaction_metric_id
                && bucket.metric_type == MetricType::Distribution
            {
                "empty"
            } else {
                "irrelevant"
            };
            metrics::counter!(BUCKETS_PROCESSED, "disposition" => disposition).increment(1);
            return Ok(());
        }

        let Some(outcome) = TrackedOutcome::accepted_transactions(&bucket, quantity) else {
            warn!(
                org_id = bucket.org_id,
                project_id = bucket.project_id,
                timestamp = bucket.timestamp,
                "Skipping bucket with out-of-range timestamp"
            );
            metrics::counter!(BUCKETS_PROCESSED, "disposition" => "malformed").increment(1);
            return Ok(());
        };

        let payload = serde_json::to_vec(&outcome).map_err(|e| StrategyError::Produce {
            source: anyhow::Error::new(e).context("serializing outcome"),
        })?;
        self.producer
            .produce(&self.outcomes_topic, &payload)
            .map_err(|source| StrategyError::Produce { source })?;

        metrics::counter!(BUCKETS_PROCESSED, "disposition" => "outcome").increment(1);
        metrics::counter!(OUTCOMES_PRODUCED).increment(1);
        metrics::counter!(TRANSACTIONS_ACCEPTED).increment(quantity);
        Ok(())
    }

    /// Record the message's successor offset as pending commit. Positions
    /// only ever advance, a replayed lower offset never regresses them.
    fn mark_commit_ready(&mut self, message: &StreamMessage) {
        let next = message.next_position();
        match self.pending_positions.entry(message.partition().clone()) {
            Entry::Occupied(mut entry) => {
                if next.offset > entry.get().offset {
                    entry.insert(next);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(next);
            }
        }
    }

    fn commit_pending_positions(&mut self, force: bool) -> Result<(), StrategyError> {
        if self.pending_positions.is_empty() && !force {
            return Ok(());
        }
        let positions = std::mem::take(&mut self.pending_positions);
        debug!(partitions = positions.len(), force, "Committing positions");
        metrics::counter!(OFFSET_COMMITS, "forced" => if force { "true" } else { "false" })
            .increment(1);
        self.commit
            .commit(positions, force)
            .map_err(|source| StrategyError::Commit { source })
    }
}

impl<C: CommitOffsets, P: ProduceOutcome> ProcessingStrategy for BillingTxCountStrategy<C, P> {
    fn poll(&mut self) -> Result<(), StrategyError> {
        assert!(!self.closed, "poll() called on a closed strategy");
        self.commit_pending_positions(false)
    }

    fn submit(&mut self, message: StreamMessage) -> Result<(), StrategyError> {
        assert!(!self.closed, "submit() called on a closed strategy");
        self.produce_billing_outcome(&message)?;
        self.mark_commit_ready(&message);
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn join(&mut self, _timeout: Option<Duration>) -> Result<(), StrategyError> {
        assert!(self.closed, "join() called before close()");
        assert!(!self.joined, "join() called twice");
        self.joined = true;
        self.commit_pending_positions(true)
    }
}
