use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::segment::Segment;

/// Error code returned when a request's `content` is not a string.
pub const INVALID_CONTENT: &str = "invalid_content";

/// Inbound message: `{id, content}`.
///
/// `content` stays untyped so a malformed request can be answered on the wire
/// instead of failing to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRequest {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub content: Value,
}

impl WorkerRequest {
    #[must_use]
    pub fn new(id: u64, content: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            content: Value::String(content.into()),
        }
    }
}

/// Outbound message. Zero or more `Batch` messages per id, then exactly one
/// `Done`, unless an `Error` ends the request first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerResponse {
    Error {
        id: Option<u64>,
        error: String,
    },
    Batch {
        id: Option<u64>,
        segments: Vec<Segment>,
    },
    Done {
        id: Option<u64>,
        done: bool,
    },
}

impl WorkerResponse {
    #[must_use]
    pub fn done(id: Option<u64>) -> Self {
        Self::Done { id, done: true }
    }

    #[must_use]
    pub fn id(&self) -> Option<u64> {
        match self {
            Self::Error { id, .. } | Self::Batch { id, .. } | Self::Done { id, .. } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shapes_match_protocol() {
        let batch = WorkerResponse::Batch {
            id: Some(3),
            segments: vec![Segment::text("hi")],
        };
        assert_eq!(
            serde_json::to_string(&batch).unwrap(),
            r#"{"id":3,"segments":[{"type":"text","content":"hi"}]}"#
        );
        assert_eq!(
            serde_json::to_string(&WorkerResponse::done(Some(3))).unwrap(),
            r#"{"id":3,"done":true}"#
        );
        let err = WorkerResponse::Error {
            id: None,
            error: INVALID_CONTENT.into(),
        };
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"id":null,"error":"invalid_content"}"#
        );
    }

    #[test]
    fn decodes_each_response_shape() {
        let done: WorkerResponse = serde_json::from_str(r#"{"id":1,"done":true}"#).unwrap();
        assert_eq!(done, WorkerResponse::done(Some(1)));

        let err: WorkerResponse = serde_json::from_str(r#"{"id":2,"error":"boom"}"#).unwrap();
        assert_eq!(err.id(), Some(2));
        assert!(matches!(err, WorkerResponse::Error { .. }));

        let batch: WorkerResponse = serde_json::from_str(r#"{"id":4,"segments":[]}"#).unwrap();
        assert!(matches!(batch, WorkerResponse::Batch { ref segments, .. } if segments.is_empty()));
    }

    #[test]
    fn request_tolerates_missing_fields() {
        let req: WorkerRequest = serde_json::from_str(r#"{"content":"x"}"#).unwrap();
        assert_eq!(req.id, None);
        let req: WorkerRequest = serde_json::from_str(r#"{"id":9}"#).unwrap();
        assert_eq!(req.content, Value::Null);
    }
}
