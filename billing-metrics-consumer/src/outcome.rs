use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::bucket::MetricsBucket;

/// Outcome discriminator: this consumer only ever records accepted events.
pub const OUTCOME_ACCEPTED: u8 = 0;

/// Data category of transaction events in the outcomes stream.
pub const CATEGORY_TRANSACTION: u8 = 2;

/// A billing/accounting record meaning "`quantity` transaction events were
/// accepted for this org/project at this time".
///
/// `key_id`, `reason` and `event_id` are part of the wire format shared with
/// other outcome producers; this consumer never sets them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedOutcome {
    pub timestamp: DateTime<Utc>,
    pub org_id: u64,
    pub project_id: u64,
    pub key_id: Option<u64>,
    pub outcome: u8,
    pub reason: Option<String>,
    pub event_id: Option<Uuid>,
    pub category: u8,
    pub quantity: u64,
}

impl TrackedOutcome {
    /// Build an accepted-transactions outcome from the bucket it was counted
    /// from. The timestamp is the bucket's window start, not wall clock.
    ///
    /// Returns `None` when the bucket timestamp is outside the representable
    /// datetime range.
    pub fn accepted_transactions(bucket: &MetricsBucket, quantity: u64) -> Option<Self> {
        let timestamp = DateTime::from_timestamp(bucket.timestamp, 0)?;
        Some(Self {
            timestamp,
            org_id: bucket.org_id,
            project_id: bucket.project_id,
            key_id: None,
            outcome: OUTCOME_ACCEPTED,
            reason: None,
            event_id: None,
            category: CATEGORY_TRANSACTION,
            quantity,
        })
    }
}
