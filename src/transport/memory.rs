//! In-process transport backed by a tokio mpsc channel.
//!
//! Lets code inside the process join channels like any socket client, and
//! gives tests a transport whose failure they can trigger by dropping the
//! receiver.

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::transport::connection::{Frame, FrameSink, FrameSource};
use crate::utils::TransportError;

#[derive(Debug)]
pub struct MemorySink {
    sender: Option<UnboundedSender<Frame>>,
}

/// Create a sink and the receiver that observes everything written to it.
/// Closing the sink ends the receiver's stream.
pub fn pair() -> (MemorySink, UnboundedReceiver<Frame>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MemorySink { sender: Some(tx) }, rx)
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        let sender = self.sender.as_ref().ok_or(TransportError::Closed)?;
        sender
            .send(frame)
            .map_err(|_| TransportError::Io("receiver dropped".to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.sender.take();
        Ok(())
    }
}

/// Inbound side fed by a test or an in-process producer.
#[derive(Debug)]
pub struct MemorySource {
    receiver: UnboundedReceiver<Result<Frame, TransportError>>,
}

pub fn source() -> (UnboundedSender<Result<Frame, TransportError>>, MemorySource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, MemorySource { receiver: rx })
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        self.receiver.recv().await
    }
}
