//! Connection abstraction
//!
//! A `Connection` wraps the sending half of one duplex endpoint. Writes go
//! through a per-connection mutex so frames to one client never interleave,
//! and `close` runs at most once no matter how many tasks race to call it.
//! The receiving half (`FrameSource`) is owned by the session loop alone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use crate::utils::TransportError;

/// One unit of data on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}

impl Frame {
    /// Wrap a raw payload without altering it: UTF-8 goes out as text,
    /// anything else as binary.
    pub fn from_payload(payload: Bytes) -> Self {
        match std::str::from_utf8(&payload) {
            Ok(text) => Frame::Text(text.to_owned()),
            Err(_) => Frame::Binary(payload),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Frame::Text(text) => text.as_bytes(),
            Frame::Binary(bytes) => bytes,
        }
    }

    /// First `limit` characters, for log lines.
    pub fn preview(&self, limit: usize) -> String {
        String::from_utf8_lossy(self.as_bytes())
            .chars()
            .take(limit)
            .collect()
    }
}

/// Outbound half of a transport.
#[async_trait]
pub trait FrameSink: Send {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Inbound half of a transport. `None` means the peer closed cleanly.
#[async_trait]
pub trait FrameSource: Send {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>>;
}

pub struct Connection {
    sink: Mutex<Box<dyn FrameSink>>,
    closed: AtomicBool,
    send_timeout: Option<Duration>,
}

impl Connection {
    pub fn new(sink: impl FrameSink + 'static, send_timeout: Option<Duration>) -> Self {
        let sink: Box<dyn FrameSink> = Box::new(sink);
        Self {
            sink: Mutex::new(sink),
            closed: AtomicBool::new(false),
            send_timeout,
        }
    }

    /// Write one frame. Concurrent callers queue on the send lock.
    pub async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let mut sink = self.sink.lock().await;
        // Closed while we waited for the lock.
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        match self.send_timeout {
            Some(limit) => tokio::time::timeout(limit, sink.send(frame))
                .await
                .map_err(|_| TransportError::Timeout(limit))?,
            None => sink.send(frame).await,
        }
    }

    /// Close the connection. Only the first call reaches the transport.
    ///
    /// Waiting for the send lock and flushing the close are bounded by the
    /// send timeout; on expiry the transport is abandoned as closed.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let close = async {
            let mut sink = self.sink.lock().await;
            sink.close().await
        };
        let result = match self.send_timeout {
            Some(limit) => tokio::time::timeout(limit, close)
                .await
                .unwrap_or(Err(TransportError::Timeout(limit))),
            None => close.await,
        };

        if let Err(e) = result {
            tracing::debug!(error = %e, "error while closing connection");
        }
    }

    /// Whether `close` has been called.

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.is_closed())
            .field("send_timeout", &self.send_timeout)
            .finish()
    }
}
