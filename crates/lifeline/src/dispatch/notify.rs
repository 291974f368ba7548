use super::domain::{IncidentKind, ResponderCandidate};

/// Outbound messaging hooks (SMS, push). Deliveries are best-effort side
/// effects of dispatch; failures are logged at the orchestrator boundary and
/// never abort an SOS.
pub trait Notifier: Send + Sync {
    /// Alert the reporter's emergency contact with a trackable link.
    fn send_emergency_alert(
        &self,
        contact: &str,
        patient_name: &str,
        kind: IncidentKind,
        track_link: &str,
    ) -> Result<(), NotifyError>;

    /// Push a dispatch notice to an eligible responder.
    fn notify_responder(
        &self,
        candidate: &ResponderCandidate,
        message: &str,
    ) -> Result<(), NotifyError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
