use serde::Deserialize;

/// Metric type discriminator as emitted by the upstream relay tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MetricType {
    #[serde(rename = "c")]
    Counter,
    #[serde(rename = "d")]
    Distribution,
    #[serde(rename = "s")]
    Set,
}

/// Bucket value: counters carry a single scalar, distributions and sets a
/// sequence of samples.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BucketValue {
    Scalar(f64),
    Samples(Vec<f64>),
}

/// One pre-aggregated metric observation window from the generic metrics
/// topic.
///
/// The payload carries more fields upstream (tags, retention); only the
/// ones this consumer reads are decoded, everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsBucket {
    pub metric_id: u64,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub org_id: u64,
    pub project_id: u64,
    /// Start of the bucket window, epoch seconds.
    pub timestamp: i64,
    pub value: BucketValue,
}

impl MetricsBucket {
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_counter_bucket() {
        let payload = json!({
            "metric_id": 123,
            "type": "c",
            "org_id": 1,
            "project_id": 2,
            "timestamp": 123,
            "value": 123.4,
        });

        let bucket = MetricsBucket::parse(&serde_json::to_vec(&payload).unwrap()).unwrap();
        assert_eq!(bucket.metric_id, 123);
        assert_eq!(bucket.metric_type, MetricType::Counter);
        assert_eq!(bucket.value, BucketValue::Scalar(123.4));
    }

    #[test]
    fn test_parse_distribution_bucket() {
        let payload = json!({
            "metric_id": 9223372036854775909u64,
            "type": "d",
            "org_id": 1,
            "project_id": 2,
            "timestamp": 123456,
            "value": [1.0, 2.0, 3.0],
        });

        let bucket = MetricsBucket::parse(&serde_json::to_vec(&payload).unwrap()).unwrap();
        // Well-known indexer ids sit above i64::MAX, they must survive decode.
        assert_eq!(bucket.metric_id, 9223372036854775909);
        assert_eq!(bucket.metric_type, MetricType::Distribution);
        assert_eq!(bucket.value, BucketValue::Samples(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_parse_set_bucket_value_is_a_sequence() {
        let payload = json!({
            "metric_id": 42,
            "type": "s",
            "org_id": 1,
            "project_id": 2,
            "timestamp": 123,
            "value": [17.0, 42.0],
        });

        let bucket = MetricsBucket::parse(&serde_json::to_vec(&payload).unwrap()).unwrap();
        assert_eq!(bucket.metric_type, MetricType::Set);
        assert_eq!(bucket.value, BucketValue::Samples(vec![17.0, 42.0]));
    }

    #[test]
    fn test_parse_rejects_unknown_metric_type() {
        let payload = json!({
            "metric_id": 42,
            "type": "g",
            "org_id": 1,
            "project_id": 2,
            "timestamp": 123,
            "value": 1.0,
        });

        assert!(MetricsBucket::parse(&serde_json::to_vec(&payload).unwrap()).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let payload = json!({
            "metric_id": 42,
            "type": "d",
            "value": [1.0],
        });

        assert!(MetricsBucket::parse(&serde_json::to_vec(&payload).unwrap()).is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(MetricsBucket::parse(b"not json").is_err());
    }
}
