//! Transport Module - Message bus seam
//!
//! The broker connection lives outside the core. A transport only moves
//! `Envelope`s between the outside world and a pair of channels:
//! it pushes received messages into `inbound` and drains `outbound`.

pub mod stdio;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use stdio::{LineTransport, StdioTransport};

/// One message on a topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A message source/sink driven by its own task.
///
/// The task ends when the source is exhausted and `outbound` is closed.
/// Dropping the inbound sender is how a transport signals end of input.
pub trait Transport: Send + 'static {
    fn name(&self) -> &'static str;

    fn spawn(
        self,
        inbound: mpsc::Sender<Envelope>,
        outbound: mpsc::Receiver<Envelope>,
    ) -> JoinHandle<Result<(), TransportError>>;
}
