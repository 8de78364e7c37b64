//! In-memory transport for exercising sessions without a server.
//!
//! Tests build a [`TransportParts`] through [`FakeTransportBuilder`] and keep
//! the paired [`FakeTransportController`] to inject inbound events and
//! inspect outbound frames.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc};

use crate::error::{Error, Result};
use crate::transport::{Transport, TransportEvent, TransportParts, TransportReceiver};

/// Builds a fake transport wired to a controller.
#[derive(Default)]
pub struct FakeTransportBuilder {
    fail_sends: bool,
}

impl FakeTransportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `send` fail, for exercising send-error paths.
    pub fn fail_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn build(self) -> (TransportParts, FakeTransportController) {
        let (inject_tx, inject_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let parts = TransportParts {
            sender: Box::new(FakeTransportSender {
                sent: Arc::clone(&sent),
                closed: Arc::clone(&closed),
                fail_sends: self.fail_sends,
            }),
            receiver: Box::new(FakeTransportReceiver { inject_rx, event_tx }),
            event_rx,
        };
        let controller = FakeTransportController {
            inject_tx,
            sent,
            closed,
        };
        (parts, controller)
    }
}

/// Test-side handle to a fake transport.
#[derive(Clone)]
pub struct FakeTransportController {
    inject_tx: mpsc::UnboundedSender<TransportEvent>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl FakeTransportController {
    /// Delivers an event as if it arrived from the server.
    pub fn inject(&self, event: TransportEvent) {
        let _ = self.inject_tx.send(event);
    }

    pub fn inject_text(&self, frame: impl Into<String>) {
        self.inject(TransportEvent::Text(frame.into()));
    }

    pub fn inject_error(&self, message: impl Into<String>) {
        self.inject(TransportEvent::Error(message.into()));
    }

    /// Drains and returns the frames sent so far.
    pub async fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut *self.sent.lock().await)
    }

    /// Whether the session closed the write half.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct FakeTransportSender {
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
    fail_sends: bool,
}

impl Transport for FakeTransportSender {
    fn send(&mut self, frame: String) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if self.closed.load(Ordering::SeqCst) {
                return Err(Error::TransportClosed);
            }
            if self.fail_sends {
                return Err(Error::Send("injected send failure".into()));
            }
            self.sent.lock().await.push(frame);
            Ok(())
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        })
    }
}

struct FakeTransportReceiver {
    inject_rx: mpsc::UnboundedReceiver<TransportEvent>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
}

impl TransportReceiver for FakeTransportReceiver {
    fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            while let Some(event) = self.inject_rx.recv().await {
                if self.event_tx.send(event).is_err() {
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn injected_events_come_out_of_the_event_channel() {
        let (mut parts, controller) = FakeTransportBuilder::new().build();
        tokio::spawn(parts.receiver.run());

        controller.inject_text("hello");
        controller.inject(TransportEvent::Closed);

        assert_eq!(
            parts.event_rx.recv().await,
            Some(TransportEvent::Text("hello".into()))
        );
        assert_eq!(parts.event_rx.recv().await, Some(TransportEvent::Closed));
    }

    #[tokio::test]
    async fn sent_frames_are_captured_until_taken() {
        let (mut parts, controller) = FakeTransportBuilder::new().build();

        parts.sender.send("one".into()).await.unwrap();
        parts.sender.send("two".into()).await.unwrap();

        assert_eq!(controller.take_sent().await, vec!["one", "two"]);
        assert!(controller.take_sent().await.is_empty());
    }

    #[tokio::test]
    async fn fail_sends_surfaces_a_send_error() {
        let (mut parts, controller) = FakeTransportBuilder::new().fail_sends().build();

        let err = parts.sender.send("frame".into()).await.unwrap_err();
        assert!(err.is_send());
        assert!(controller.take_sent().await.is_empty());
    }

    #[tokio::test]
    async fn close_flips_the_closed_flag() {
        let (mut parts, controller) = FakeTransportBuilder::new().build();
        assert!(!controller.is_closed());

        parts.sender.close().await.unwrap();
        assert!(controller.is_closed());
    }

    #[tokio::test]
    async fn sending_after_close_reports_transport_closed() {
        let (mut parts, _controller) = FakeTransportBuilder::new().build();
        parts.sender.close().await.unwrap();

        let err = parts.sender.send("frame".into()).await.unwrap_err();
        assert!(matches!(err, Error::TransportClosed));
    }
}
