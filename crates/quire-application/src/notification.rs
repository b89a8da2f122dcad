//! Notification sinks.

use quire_core::notification::{Notification, NotificationKind, NotificationSink};
use tokio::sync::mpsc;

/// Writes every notification to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Error => tracing::warn!(target: "quire::notify", "{message}"),
            NotificationKind::Info | NotificationKind::Success => {
                tracing::info!(target: "quire::notify", "{message}")
            }
        }
    }
}

/// Forwards notifications over an unbounded channel.
///
/// Delivery never blocks; notifications sent after the receiver is gone are
/// logged and dropped.
#[derive(Debug, Clone)]
pub struct ChannelNotificationSink {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotificationSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelNotificationSink {
    fn notify(&self, kind: NotificationKind, message: &str) {
        let notification = Notification {
            kind,
            message: message.to_string(),
        };
        if self.sender.send(notification).is_err() {
            tracing::debug!(?kind, text = message, "Notification receiver closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_forwards_in_order() {
        let (sink, mut receiver) = ChannelNotificationSink::new();
        sink.notify(NotificationKind::Error, "Compilation failed");
        sink.notify(NotificationKind::Success, "Saved");

        assert_eq!(
            receiver.try_recv().unwrap(),
            Notification {
                kind: NotificationKind::Error,
                message: "Compilation failed".to_string(),
            }
        );
        assert_eq!(receiver.try_recv().unwrap().kind, NotificationKind::Success);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (sink, receiver) = ChannelNotificationSink::new();
        drop(receiver);
        sink.notify(NotificationKind::Info, "nobody listening");
    }
}
