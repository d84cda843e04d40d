// ==== Strategy metrics ====
/// Counter for every bucket message submitted, labelled by disposition
/// (outcome, empty, irrelevant, malformed)
pub const BUCKETS_PROCESSED: &str = "billing_metrics_buckets_processed_total";

/// Counter for outcome events handed to the producer
pub const OUTCOMES_PRODUCED: &str = "billing_outcomes_produced_total";

/// Counter for accepted transactions summed across produced outcomes
pub const TRANSACTIONS_ACCEPTED: &str = "billing_transactions_accepted_total";

/// Counter for offset commit requests, labelled by whether the commit was forced
pub const OFFSET_COMMITS: &str = "billing_consumer_offset_commits_total";

// ==== Producer metrics ====
/// Counter for outcome deliveries that failed after being enqueued
pub const OUTCOME_DELIVERY_FAILURES: &str = "billing_outcome_delivery_failures_total";

// ==== Consumer loop metrics ====
/// Counter for errors returned by the Kafka consumer while receiving
pub const CONSUMER_RECV_ERRORS: &str = "billing_consumer_recv_errors_total";
