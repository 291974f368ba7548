//! SOS dispatch pipeline: scoring, responder lookup, eligibility filtering,
//! orchestration, real-time fan-out, and incident report rendering.

pub mod directory;
pub mod domain;
pub(crate) mod eligibility;
pub mod events;
pub mod geo;
pub mod notify;
pub mod report;
pub mod repository;
pub mod router;
pub(crate) mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use directory::{DirectoryError, UserDirectory};
pub use domain::{
    BloodDemandEntry, BloodGroup, DispatchStats, HeatPoint, Incident, IncidentId, IncidentKind,
    IncidentStatus, IncidentSubmission, IncidentView, ReporterView, ResponderCandidate,
    ResponderEntry, ResponderProgress, ResponderView, TimelineEntry, UserAccount, UserId, UserRole,
};
pub use eligibility::filter_eligible;
pub use events::{EventBroadcaster, SosEvent};
pub use geo::{GeoPoint, InvalidCoordinates};
pub use notify::{Notifier, NotifyError};
pub use report::{render_incident_report, ReportError};
pub use repository::{Acknowledgement, IncidentRepository, RepositoryError};
pub use router::{dispatch_router, AuthenticatedUser};
pub use scoring::priority_score;
pub use service::{DispatchError, DispatchService};
