//! Interfaces for the pipeline's external collaborators: the blob fetcher,
//! and the message-bus consumer/producer. The core only names these
//! contracts — concrete bus/storage technology lives in the worker binary
//! that wires a `Pipeline` up to the outside world.

use serde::{Deserialize, Serialize};

use crate::types::DetectionResult;

/// Fetches the raw bytes of an image referenced by a task's `image_url`.
/// Implementations decide what an `s3://bucket/key` URI or a bare
/// key resolves to; the core only parses the URI shape.
pub trait BlobFetcher: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get(&self, uri: &str) -> Result<Vec<u8>, Self::Error>;
}

/// Split an `s3://bucket/key` URI into its bucket and key, by splitting on
/// the first `/` after the scheme. Returns `None` for a bare key/path,
/// which callers resolve against a default bucket or the local filesystem.
pub fn parse_s3_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("s3://")?;
    let (bucket, key) = rest.split_once('/')?;
    Some((bucket, key))
}

/// Pulls the next task off the input topic. The outer loop owns consumer
/// group membership, offset commits, and retry policy — none of which the
/// core is aware of.
pub trait TaskConsumer: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    fn recv(&mut self) -> Result<Option<crate::types::Task>, Self::Error>;
}

/// Publishes one outbound result message per detection to the output topic.
pub trait ResultProducer: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    fn send(&mut self, result: &OutboundResult) -> Result<(), Self::Error>;
}

/// One outbound wire message, one per detection. Note that `ocr_text`
/// is deliberately not part of the wire shape — the original pipeline
/// computes it per detection but the outer loop only republishes
/// `detection`/`geolocation`/`address`; OCR text stays available in-process
/// via `DetectionResult` for any caller that wants it, it's just not
/// re-broadcast on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundResult {
    pub image_id: String,
    pub detection: crate::types::Detection,
    pub geolocation: Option<crate::types::Geolocation>,
    pub address: Option<String>,
    pub metadata: serde_json::Value,
    pub worker: String,
    pub processed_at: String,
}

impl OutboundResult {
    pub fn from_detection_result(
        image_id: impl Into<String>,
        result: &DetectionResult,
        metadata: serde_json::Value,
        worker: impl Into<String>,
        processed_at: impl Into<String>,
    ) -> Self {
        OutboundResult {
            image_id: image_id.into(),
            detection: result.detection.clone(),
            geolocation: result.geolocation,
            address: result.address.clone(),
            metadata,
            worker: worker.into(),
            processed_at: processed_at.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bucket_and_key() {
        assert_eq!(parse_s3_uri("s3://photos/2024/img.jpg"), Some(("photos", "2024/img.jpg")));
    }

    #[test]
    fn bare_path_has_no_bucket() {
        assert_eq!(parse_s3_uri("/tmp/img.jpg"), None);
        assert_eq!(parse_s3_uri("img.jpg"), None);
    }

    #[test]
    fn s3_uri_without_key_has_no_split() {
        assert_eq!(parse_s3_uri("s3://bucket-only"), None);
    }
}
