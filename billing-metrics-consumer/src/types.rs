use chrono::{DateTime, Utc};

/// Identity of a single partition of a topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    topic: String,
    index: i32,
}

impl Partition {
    pub fn new(topic: impl Into<String>, index: i32) -> Self {
        Self {
            topic: topic.into(),
            index,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn index(&self) -> i32 {
        self.index
    }
}

/// A committable consumer position: the next offset to read from a
/// partition, plus the timestamp of the message that advanced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: i64,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    pub fn new(offset: i64, timestamp: DateTime<Utc>) -> Self {
        Self { offset, timestamp }
    }
}

/// A single message read from the metrics topic. Owns its payload so the
/// strategy can hold it past the lifetime of the consumer's borrow.
#[derive(Debug, Clone)]
pub struct StreamMessage {
    partition: Partition,
    offset: i64,
    timestamp: DateTime<Utc>,
    payload: Vec<u8>,
}

impl StreamMessage {
    pub fn new(
        partition: Partition,
        offset: i64,
        timestamp: DateTime<Utc>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            partition,
            offset,
            timestamp,
            payload,
        }
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The position a consumer should commit once this message has been
    /// processed: the next offset to read.
    pub fn next_position(&self) -> Position {
        Position::new(self.offset + 1, self.timestamp)
    }
}
