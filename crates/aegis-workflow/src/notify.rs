//! Notifiers for verification events

use aegis_domain::traits::Notifier;
use aegis_domain::VerificationEvent;
use tokio::sync::mpsc;

/// Logs each event through `tracing`
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &VerificationEvent) {
        tracing::info!(
            "Verified claim {} as {} ({}): {}",
            event.claim_id,
            event.verdict,
            event.resolution_path,
            event.public_alert()
        );
    }
}

/// Forwards events to an in-process channel
///
/// Never blocks: when the channel is full or closed the event is dropped
/// with a warning.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<VerificationEvent>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end of its channel
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<VerificationEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: &VerificationEvent) {
        if let Err(e) = self.sender.try_send(event.clone()) {
            tracing::warn!("Dropped verification event for claim {}: {}", event.claim_id, e);
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: &VerificationEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_domain::{ClaimId, Verdict, VerifiedRecord};

    fn event() -> VerificationEvent {
        VerificationEvent::from(&VerifiedRecord::by_fusion(ClaimId::new(), Verdict::True, "ok"))
    }

    #[tokio::test]
    async fn test_channel_delivers() {
        let (notifier, mut rx) = ChannelNotifier::new(4);
        let sent = event();
        notifier.notify(&sent);
        assert_eq!(rx.recv().await, Some(sent));
    }

    #[test]
    fn test_full_channel_drops_without_blocking() {
        let (notifier, mut rx) = ChannelNotifier::new(1);
        notifier.notify(&event());
        notifier.notify(&event());

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (notifier, rx) = ChannelNotifier::new(1);
        drop(rx);
        notifier.notify(&event());
    }
}
