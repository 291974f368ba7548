use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::DispatchConfig;

use super::directory::{DirectoryError, UserDirectory};
use super::domain::{
    BloodDemandEntry, BloodGroup, DispatchStats, HeatPoint, Incident, IncidentId, IncidentKind,
    IncidentStatus, IncidentSubmission, IncidentView, ResponderCandidate, ResponderEntry,
    ResponderProgress, ResponderView, TimelineEntry, UserId,
};
use super::eligibility::filter_eligible;
use super::events::{EventBroadcaster, SosEvent};
use super::geo::{GeoPoint, InvalidCoordinates};
use super::notify::{Notifier, NotifyError};
use super::report::{self, ReportError};
use super::repository::{IncidentRepository, RepositoryError};
use super::scoring;

/// Orchestrates the SOS pipeline: score, persist, locate, filter, notify,
/// broadcast. Storage, user lookup, and outbound messaging are injected so
/// every step can be exercised in isolation.
pub struct DispatchService<R, D, N> {
    repository: Arc<R>,
    directory: Arc<D>,
    notifier: Arc<N>,
    broadcaster: EventBroadcaster,
    config: DispatchConfig,
}

static INCIDENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_incident_id() -> IncidentId {
    let id = INCIDENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    IncidentId(format!("sos-{id:06}"))
}

impl<R, D, N> DispatchService<R, D, N>
where
    R: IncidentRepository + 'static,
    D: UserDirectory + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        repository: Arc<R>,
        directory: Arc<D>,
        notifier: Arc<N>,
        broadcaster: EventBroadcaster,
        config: DispatchConfig,
    ) -> Self {
        Self {
            repository,
            directory,
            notifier,
            broadcaster,
            config,
        }
    }

    pub fn broadcaster(&self) -> &EventBroadcaster {
        &self.broadcaster
    }

    /// Raise a new SOS for `reporter`.
    ///
    /// Persistence failures abort and propagate. Responder lookup,
    /// notifications, and the broadcast are best-effort: once the incident is
    /// durably stored the caller gets the populated incident back regardless
    /// of downstream outcomes.
    pub fn create_incident(
        &self,
        reporter: &UserId,
        submission: IncidentSubmission,
    ) -> Result<IncidentView, DispatchError> {
        let account = self
            .directory
            .fetch(reporter)?
            .ok_or_else(|| DispatchError::UnknownUser(reporter.clone()))?;

        if account.is_suspended {
            return Err(DispatchError::Suspended);
        }

        let location = GeoPoint::new(submission.latitude, submission.longitude)?;

        let priority = scoring::priority_score(
            submission.kind,
            submission.blood_group,
            account.medical_history.as_deref(),
        );

        let incident = Incident {
            id: next_incident_id(),
            reporter: account.id.clone(),
            kind: submission.kind,
            description: submission.description,
            blood_group: submission.blood_group,
            contact_number: Some(account.phone.clone()),
            location,
            status: IncidentStatus::Active,
            priority_score: priority,
            false_alarm: false,
            timeline: vec![TimelineEntry::now(
                "created",
                Some("Emergency alert raised".to_string()),
            )],
            responders: Vec::new(),
            created_at: Utc::now(),
        };

        let stored = self.repository.insert(incident)?;
        info!(incident = %stored.id, kind = stored.kind.label(), priority, "incident recorded");

        self.dispatch_responders(&stored);

        if let Some(contact) = account.emergency_contact.as_deref() {
            let link = format!(
                "{}/{}",
                self.config.track_link_base.trim_end_matches('/'),
                stored.id
            );
            if let Err(err) =
                self.notifier
                    .send_emergency_alert(contact, &account.name, stored.kind, &link)
            {
                warn!(incident = %stored.id, error = %err, "emergency contact alert failed");
            }
        }

        let view = self.populate(stored);
        let delivered = self.broadcaster.publish(SosEvent::NewSos(view.clone()));
        debug!(incident = %view.id, subscribers = delivered, "new_sos broadcast");

        Ok(view)
    }

    /// Record an acknowledgement from a hospital or donor. Idempotent per
    /// user; only a newly recorded acknowledgement is broadcast.
    pub fn respond(
        &self,
        id: &IncidentId,
        responder: &UserId,
    ) -> Result<IncidentView, DispatchError> {
        let account = self
            .directory
            .fetch(responder)?
            .ok_or_else(|| DispatchError::UnknownUser(responder.clone()))?;

        let entry = ResponderEntry {
            user: account.id.clone(),
            status: ResponderProgress::Accepted,
            recorded_at: Utc::now(),
        };
        let note = TimelineEntry::now(
            "acknowledged",
            Some(format!(
                "{} ({}) accepted the request.",
                account.name,
                account.role.label()
            )),
        );

        let acknowledgement = match self.repository.acknowledge(id, entry, note) {
            Ok(acknowledgement) => acknowledgement,
            Err(RepositoryError::NotFound) => return Err(DispatchError::NotFound),
            Err(err) => return Err(err.into()),
        };

        let is_new = acknowledgement.is_new();
        let incident = acknowledgement.into_incident();

        if is_new {
            self.broadcaster.publish(SosEvent::SosResponse {
                incident_id: incident.id.clone(),
                responder_name: account.name.clone(),
            });
            self.broadcaster.publish(SosEvent::TimelineUpdate {
                incident_id: incident.id.clone(),
                timeline: incident.timeline.clone(),
            });
        } else {
            debug!(incident = %incident.id, responder = %account.id, "repeat acknowledgement ignored");
        }

        Ok(self.populate(incident))
    }

    /// Move an incident into a terminal state. Only `active -> resolved` and
    /// `active -> cancelled` are legal.
    pub fn transition(
        &self,
        id: &IncidentId,
        next: IncidentStatus,
        detail: Option<String>,
    ) -> Result<IncidentView, DispatchError> {
        let current = match self.repository.fetch(id)? {
            Some(incident) => incident,
            None => return Err(DispatchError::NotFound),
        };

        if !current.status.can_transition_to(next) {
            return Err(DispatchError::IllegalTransition {
                from: current.status,
                to: next,
            });
        }

        let entry = TimelineEntry::now(next.label(), detail);
        let updated = match self.repository.transition(id, next, entry) {
            Ok(incident) => incident,
            Err(RepositoryError::NotFound) => return Err(DispatchError::NotFound),
            // Raced with another transition; the first writer won.
            Err(RepositoryError::Conflict) => {
                return Err(DispatchError::IllegalTransition {
                    from: current.status,
                    to: next,
                })
            }
            Err(err) => return Err(err.into()),
        };

        self.broadcaster.publish(SosEvent::TimelineUpdate {
            incident_id: updated.id.clone(),
            timeline: updated.timeline.clone(),
        });

        Ok(self.populate(updated))
    }

    /// Active incidents, newest first, joined with reporter public fields.
    pub fn active_incidents(&self) -> Result<Vec<IncidentView>, DispatchError> {
        let incidents = self.repository.active()?;
        Ok(incidents
            .into_iter()
            .map(|incident| self.populate(incident))
            .collect())
    }

    /// Ad-hoc responder lookup around a point, eligibility-filtered when a
    /// blood group is given. Defaults to the configured search radius.
    pub fn nearby_responders(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: Option<f64>,
        blood_group: Option<BloodGroup>,
    ) -> Result<Vec<ResponderCandidate>, DispatchError> {
        let origin = GeoPoint::new(latitude, longitude)?;
        let radius = radius_km.unwrap_or(self.config.search_radius_km);
        let candidates = self.directory.find_nearby(origin, radius)?;
        Ok(filter_eligible(candidates, blood_group))
    }

    /// Public heatmap feed: one point per incident, weight normalized to
    /// `[0, 1]`.
    pub fn heatmap(&self) -> Result<Vec<HeatPoint>, DispatchError> {
        let incidents = self.repository.all()?;
        Ok(incidents
            .iter()
            .map(|incident| HeatPoint {
                lat: incident.location.latitude,
                lng: incident.location.longitude,
                weight: (f64::from(incident.priority_score) / 100.0).clamp(0.0, 1.0),
            })
            .collect())
    }

    /// Aggregate counters for the operations dashboard.
    pub fn stats(&self) -> Result<DispatchStats, DispatchError> {
        let incidents = self.repository.all()?;
        if incidents.is_empty() {
            return Ok(DispatchStats::default());
        }

        let total = incidents.len();
        let resolved = incidents
            .iter()
            .filter(|incident| incident.status == IncidentStatus::Resolved)
            .count();
        let priority_sum: u64 = incidents
            .iter()
            .map(|incident| u64::from(incident.priority_score))
            .sum();

        let mut demand: BTreeMap<BloodGroup, usize> = BTreeMap::new();
        for incident in &incidents {
            if incident.kind == IncidentKind::BloodRequest {
                if let Some(group) = incident.blood_group {
                    *demand.entry(group).or_default() += 1;
                }
            }
        }

        Ok(DispatchStats {
            total_incidents: total,
            resolved_incidents: resolved,
            average_priority: priority_sum as f64 / total as f64,
            blood_demand: demand
                .into_iter()
                .map(|(blood_group, count)| BloodDemandEntry { blood_group, count })
                .collect(),
        })
    }

    /// Render the fixed-layout PDF report for an incident.
    pub fn render_report(&self, id: &IncidentId) -> Result<Vec<u8>, DispatchError> {
        let incident = match self.repository.fetch(id)? {
            Some(incident) => incident,
            None => return Err(DispatchError::NotFound),
        };
        let view = self.populate(incident);
        Ok(report::render_incident_report(&view)?)
    }

    /// Locate, filter, and notify responders. Every failure in here is
    /// non-fatal: an SOS must not fail because lookup or delivery did.
    fn dispatch_responders(&self, incident: &Incident) {
        let candidates = match self
            .directory
            .find_nearby(incident.location, self.config.dispatch_radius_km)
        {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(incident = %incident.id, error = %err, "responder lookup failed, continuing dispatch");
                return;
            }
        };

        let eligible = filter_eligible(candidates, incident.blood_group);
        info!(
            incident = %incident.id,
            eligible = eligible.len(),
            "notifying eligible responders"
        );

        let message = format!(
            "SOS {}: {} reported nearby, priority {}",
            incident.id,
            incident.kind.label(),
            incident.priority_score
        );
        for candidate in &eligible {
            if let Err(err) = self.notifier.notify_responder(candidate, &message) {
                warn!(
                    incident = %incident.id,
                    responder = %candidate.user,
                    error = %err,
                    "responder notification failed"
                );
            }
        }
    }

    /// Join the reporter's and responders' public fields onto the persisted
    /// incident. A degraded directory downgrades to an anonymous view rather
    /// than failing a call whose incident is already durable.
    fn populate(&self, incident: Incident) -> IncidentView {
        let reporter = match self.directory.fetch(&incident.reporter) {
            Ok(account) => account,
            Err(err) => {
                warn!(incident = %incident.id, error = %err, "reporter lookup failed while populating");
                None
            }
        };

        let responders = incident
            .responders
            .iter()
            .map(|entry| {
                let account = self.directory.fetch(&entry.user).ok().flatten();
                ResponderView::from_entry(entry, account.as_ref())
            })
            .collect();

        IncidentView::from_incident(incident, reporter.as_ref(), responders)
    }
}

/// Error raised by the dispatch service.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    InvalidLocation(#[from] InvalidCoordinates),
    #[error("account suspended due to repeated false alarms")]
    Suspended,
    #[error("unknown user: {0}")]
    UnknownUser(UserId),
    #[error("incident not found")]
    NotFound,
    #[error("illegal status transition from {} to {}", .from.label(), .to.label())]
    IllegalTransition {
        from: IncidentStatus,
        to: IncidentStatus,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error(transparent)]
    Report(#[from] ReportError),
}
