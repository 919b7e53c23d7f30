//! Background execution context for the segmentation engine.
//!
//! The worker receives `{id, content}` requests over a channel, runs the parser,
//! and streams segment batches back. It keeps no state between requests.

pub mod protocol;
pub mod runtime;

use std::io::{BufRead, Write};
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::Result;
pub use protocol::{WorkerRequest, WorkerResponse, INVALID_CONTENT};
pub use runtime::DEFAULT_BATCH_SIZE;

/// Caller-side ends of a worker's message channels.
#[derive(Debug)]
pub struct WorkerChannel {
    pub requests: mpsc::UnboundedSender<WorkerRequest>,
    pub responses: mpsc::UnboundedReceiver<WorkerResponse>,
}

/// Host-side ends of a worker's message channels.
#[derive(Debug)]
pub struct WorkerEndpoint {
    pub requests: mpsc::UnboundedReceiver<WorkerRequest>,
    pub responses: mpsc::UnboundedSender<WorkerResponse>,
}

impl WorkerChannel {
    /// Create a connected caller/host pair.
    #[must_use]
    pub fn pair() -> (WorkerChannel, WorkerEndpoint) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        (
            WorkerChannel {
                requests: request_tx,
                responses: response_rx,
            },
            WorkerEndpoint {
                requests: request_rx,
                responses: response_tx,
            },
        )
    }
}

/// Start a worker on a dedicated OS thread.
///
/// The thread handles requests one at a time and exits once every request
/// sender has been dropped.
pub fn spawn_worker(batch_size: usize) -> std::io::Result<WorkerChannel> {
    let (channel, mut endpoint) = WorkerChannel::pair();
    thread::Builder::new()
        .name("lingomark-worker".into())
        .spawn(move || {
            debug!(batch_size, "worker started");
            while let Some(request) = endpoint.requests.blocking_recv() {
                runtime::handle_request(request, batch_size, |response| {
                    // a closed receiver means the dispatcher is gone; drop the reply
                    let _ = endpoint.responses.send(response);
                });
            }
            debug!("worker stopped");
        })?;
    Ok(channel)
}

/// Serve the wire protocol over line-delimited JSON until `reader` is exhausted.
pub fn serve<R: BufRead, W: Write>(reader: R, mut writer: W, batch_size: usize) -> Result<()> {
    info!(batch_size, "serving worker protocol");
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut failure = None;
        runtime::handle_line(&line, batch_size, |response| {
            if failure.is_none() {
                if let Err(e) = write_response(&mut writer, &response) {
                    failure = Some(e);
                }
            }
        });
        if let Some(e) = failure {
            return Err(e);
        }
    }
    Ok(())
}

fn write_response<W: Write>(writer: &mut W, response: &WorkerResponse) -> Result<()> {
    serde_json::to_writer(&mut *writer, response)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
