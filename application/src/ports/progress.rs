//! Progress listener port.
//!
//! The context manager notifies registered listeners synchronously, in
//! registration order, on every state change. Listeners must return
//! quickly; anything slow belongs behind a channel
//! ([`ChannelProgressListener`]).

use tokio::sync::mpsc;
use vigil_domain::ProgressEvent;

/// Receiver of progress events.
pub trait ProgressListener: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// No-op listener.
pub struct NoProgress;

impl ProgressListener for NoProgress {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Forwards events to an unbounded channel for asynchronous consumers.
///
/// Sending never blocks; events are dropped once the receiver is gone.
pub struct ChannelProgressListener {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressListener for ChannelProgressListener {
    fn on_event(&self, event: &ProgressEvent) {
        let _ = self.tx.send(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_domain::{Progress, ProgressEventKind};

    #[tokio::test]
    async fn test_channel_listener_forwards() {
        let (listener, mut rx) = ChannelProgressListener::new();
        listener.on_event(&ProgressEvent::new(
            ProgressEventKind::Plan,
            "Plan ready",
            Progress::new(0, 2),
        ));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, ProgressEventKind::Plan);
    }

    #[test]
    fn test_channel_listener_survives_closed_receiver() {
        let (listener, rx) = ChannelProgressListener::new();
        drop(rx);
        listener.on_event(&ProgressEvent::new(
            ProgressEventKind::Completed,
            "done",
            Progress::default(),
        ));
    }
}
