use super::domain::{Incident, IncidentId, IncidentStatus, ResponderEntry, TimelineEntry};

/// Storage abstraction for incidents so the service module can be exercised
/// in isolation.
pub trait IncidentRepository: Send + Sync {
    fn insert(&self, incident: Incident) -> Result<Incident, RepositoryError>;
    fn fetch(&self, id: &IncidentId) -> Result<Option<Incident>, RepositoryError>;
    /// Incidents with status `active`, newest first.
    fn active(&self) -> Result<Vec<Incident>, RepositoryError>;
    fn all(&self) -> Result<Vec<Incident>, RepositoryError>;

    /// Append-if-absent acknowledgement. Implementations MUST apply the
    /// membership check, the responder append, and the timeline append as a
    /// single atomic update; a read-modify-write sequence would drop one of
    /// two concurrent acknowledgements.
    fn acknowledge(
        &self,
        id: &IncidentId,
        responder: ResponderEntry,
        timeline: TimelineEntry,
    ) -> Result<Acknowledgement, RepositoryError>;

    /// Apply a status transition, appending the timeline entry atomically.
    /// Implementations MUST verify the current status permits the transition
    /// under the same guard and return [`RepositoryError::Conflict`] when it
    /// does not.
    fn transition(
        &self,
        id: &IncidentId,
        next: IncidentStatus,
        timeline: TimelineEntry,
    ) -> Result<Incident, RepositoryError>;
}

/// Result of an acknowledgement attempt. Repeat calls from a user already on
/// the roster are reported as `AlreadyRecorded` so callers can skip
/// broadcasting.
#[derive(Debug, Clone, PartialEq)]
pub enum Acknowledgement {
    Recorded(Incident),
    AlreadyRecorded(Incident),
}

impl Acknowledgement {
    pub fn into_incident(self) -> Incident {
        match self {
            Acknowledgement::Recorded(incident) => incident,
            Acknowledgement::AlreadyRecorded(incident) => incident,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Acknowledgement::Recorded(_))
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("conflicting incident update")]
    Conflict,
    #[error("incident not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
