//! Notification collaborators for newly available appointments
//!
//! The scheduler calls a [`Notifier`] when a poll transitions the slot
//! sequence from empty to non-empty. Implementations are swappable so the
//! side effect stays out of the polling logic and can be stubbed in tests.

use actually_beep::beep_with_hz_and_millis;
use async_trait::async_trait;

/// Result type for notifier operations
pub type NotifyResult = Result<(), NotifyError>;

/// Errors that can occur while delivering a notification
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Audio playback failed
    #[error("audio playback failed: {0}")]
    Playback(String),
}

/// Trait for appointment-found notifiers
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Get the notifier name
    fn name(&self) -> &str;

    /// Called once per empty-to-non-empty slot transition
    async fn slots_available(&self, count: usize) -> NotifyResult;
}

/// Audible notifier playing a short tone on the default output device
pub struct BeepNotifier;

#[async_trait]
impl Notifier for BeepNotifier {
    fn name(&self) -> &str {
        "beep"
    }

    async fn slots_available(&self, count: usize) -> NotifyResult {
        tracing::debug!(count, "playing alert tone");

        // Playback blocks for the duration of the tone; keep it off the
        // async workers.
        tokio::task::spawn_blocking(|| {
            let alert_hz = 880;
            let alert_duration_ms = 700;
            beep_with_hz_and_millis(alert_hz, alert_duration_ms).map_err(|e| format!("{e:?}"))
        })
        .await
        .map_err(|e| NotifyError::Playback(e.to_string()))?
        .map_err(NotifyError::Playback)
    }
}

/// No-op notifier used in quiet mode
pub struct SilentNotifier;

#[async_trait]
impl Notifier for SilentNotifier {
    fn name(&self) -> &str {
        "silent"
    }

    async fn slots_available(&self, _count: usize) -> NotifyResult {
        Ok(())
    }
}
