use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::{debug, warn};

use crate::parser;
use crate::worker::protocol::{WorkerRequest, WorkerResponse, INVALID_CONTENT};

/// Segments buffered before a batch is flushed.
pub const DEFAULT_BATCH_SIZE: usize = 6;

/// Run one request to completion, streaming responses to `emit`.
///
/// Holds no state between calls. A string request always ends with one
/// (possibly empty) trailing batch followed by `{id, done: true}`; anything
/// else ends with a single `{id, error}`.
pub fn handle_request<F>(request: WorkerRequest, batch_size: usize, mut emit: F)
where
    F: FnMut(WorkerResponse),
{
    let id = request.id;
    let Value::String(content) = request.content else {
        debug!(?id, "rejecting non-string content");
        emit(WorkerResponse::Error {
            id,
            error: INVALID_CONTENT.into(),
        });
        return;
    };
    let batch_size = batch_size.max(1);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut batch = Vec::with_capacity(batch_size);
        let total = parser::parse_with(&content, |segment| {
            batch.push(segment);
            if batch.len() >= batch_size {
                emit(WorkerResponse::Batch {
                    id,
                    segments: std::mem::take(&mut batch),
                });
            }
        });
        emit(WorkerResponse::Batch {
            id,
            segments: batch,
        });
        total
    }));

    match outcome {
        Ok(total) => {
            debug!(?id, segments = total, "request finished");
            emit(WorkerResponse::done(id));
        }
        Err(payload) => {
            let error = panic_message(payload.as_ref());
            warn!(?id, %error, "segmentation panicked");
            emit(WorkerResponse::Error { id, error });
        }
    }
}

/// Decode one JSON line and handle it. A line that does not decode is answered
/// with an error carrying whatever id could be recovered (possibly none).
pub fn handle_line<F>(line: &str, batch_size: usize, mut emit: F)
where
    F: FnMut(WorkerResponse),
{
    match serde_json::from_str::<WorkerRequest>(line) {
        Ok(request) => handle_request(request, batch_size, emit),
        Err(e) => {
            let id = serde_json::from_str::<Value>(line)
                .ok()
                .and_then(|v| v.get("id").and_then(Value::as_u64));
            emit(WorkerResponse::Error {
                id,
                error: e.to_string(),
            });
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
