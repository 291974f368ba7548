use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::DispatchConfig;
use crate::dispatch::directory::{DirectoryError, UserDirectory};
use crate::dispatch::domain::{
    BloodGroup, Incident, IncidentId, IncidentKind, IncidentStatus, IncidentSubmission,
    ResponderCandidate, ResponderEntry, TimelineEntry, UserAccount, UserId, UserRole,
};
use crate::dispatch::events::EventBroadcaster;
use crate::dispatch::geo::GeoPoint;
use crate::dispatch::notify::{Notifier, NotifyError};
use crate::dispatch::repository::{
    Acknowledgement, IncidentRepository, RepositoryError,
};
use crate::dispatch::service::DispatchService;

// Central Kolkata; nearby fixtures sit within a couple of kilometers.
pub(super) const BASE_LAT: f64 = 22.5726;
pub(super) const BASE_LON: f64 = 88.3639;

#[derive(Default)]
pub(super) struct MemoryRepository {
    incidents: Mutex<HashMap<IncidentId, Incident>>,
}

impl IncidentRepository for MemoryRepository {
    fn insert(&self, incident: Incident) -> Result<Incident, RepositoryError> {
        let mut guard = self.incidents.lock().expect("repository mutex poisoned");
        if guard.contains_key(&incident.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(incident.id.clone(), incident.clone());
        Ok(incident)
    }

    fn fetch(&self, id: &IncidentId) -> Result<Option<Incident>, RepositoryError> {
        let guard = self.incidents.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn active(&self) -> Result<Vec<Incident>, RepositoryError> {
        let guard = self.incidents.lock().expect("repository mutex poisoned");
        let mut active: Vec<Incident> = guard
            .values()
            .filter(|incident| incident.status == IncidentStatus::Active)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(active)
    }

    fn all(&self) -> Result<Vec<Incident>, RepositoryError> {
        let guard = self.incidents.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn acknowledge(
        &self,
        id: &IncidentId,
        responder: ResponderEntry,
        timeline: TimelineEntry,
    ) -> Result<Acknowledgement, RepositoryError> {
        let mut guard = self.incidents.lock().expect("repository mutex poisoned");
        let incident = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;

        if incident.responder(&responder.user).is_some() {
            return Ok(Acknowledgement::AlreadyRecorded(incident.clone()));
        }

        incident.responders.push(responder);
        incident.timeline.push(timeline);
        Ok(Acknowledgement::Recorded(incident.clone()))
    }

    fn transition(
        &self,
        id: &IncidentId,
        next: IncidentStatus,
        timeline: TimelineEntry,
    ) -> Result<Incident, RepositoryError> {
        let mut guard = self.incidents.lock().expect("repository mutex poisoned");
        let incident = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;

        if !incident.status.can_transition_to(next) {
            return Err(RepositoryError::Conflict);
        }

        incident.status = next;
        incident.timeline.push(timeline);
        Ok(incident.clone())
    }
}

/// Repository that refuses every operation, for persistence-failure paths.
pub(super) struct UnavailableRepository;

impl IncidentRepository for UnavailableRepository {
    fn insert(&self, _incident: Incident) -> Result<Incident, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn fetch(&self, _id: &IncidentId) -> Result<Option<Incident>, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn active(&self) -> Result<Vec<Incident>, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn all(&self) -> Result<Vec<Incident>, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn acknowledge(
        &self,
        _id: &IncidentId,
        _responder: ResponderEntry,
        _timeline: TimelineEntry,
    ) -> Result<Acknowledgement, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn transition(
        &self,
        _id: &IncidentId,
        _next: IncidentStatus,
        _timeline: TimelineEntry,
    ) -> Result<Incident, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    users: Mutex<HashMap<UserId, UserAccount>>,
}

impl MemoryDirectory {
    pub(super) fn insert(&self, account: UserAccount) {
        let mut guard = self.users.lock().expect("directory mutex poisoned");
        guard.insert(account.id.clone(), account);
    }
}

impl UserDirectory for MemoryDirectory {
    fn fetch(&self, id: &UserId) -> Result<Option<UserAccount>, DirectoryError> {
        let guard = self.users.lock().expect("directory mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_nearby(
        &self,
        origin: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<ResponderCandidate>, DirectoryError> {
        let guard = self.users.lock().expect("directory mutex poisoned");
        let mut candidates: Vec<ResponderCandidate> = guard
            .values()
            .filter(|account| account.role.is_responder())
            .filter_map(|account| {
                let location = account.location?;
                let distance_km = origin.distance_km(&location);
                (distance_km <= radius_km).then(|| ResponderCandidate {
                    user: account.id.clone(),
                    name: account.name.clone(),
                    role: account.role,
                    location,
                    blood_group: account.blood_group,
                    phone: account.phone.clone(),
                    push_token: account.push_token.clone(),
                    distance_km,
                })
            })
            .collect();
        candidates.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .expect("distances are finite")
        });
        Ok(candidates)
    }
}

/// Directory whose proximity index is down while point lookups still work.
pub(super) struct DegradedDirectory {
    pub(super) inner: MemoryDirectory,
}

impl UserDirectory for DegradedDirectory {
    fn fetch(&self, id: &UserId) -> Result<Option<UserAccount>, DirectoryError> {
        self.inner.fetch(id)
    }

    fn find_nearby(
        &self,
        _origin: GeoPoint,
        _radius_km: f64,
    ) -> Result<Vec<ResponderCandidate>, DirectoryError> {
        Err(DirectoryError::Unavailable("geo index offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    emergency_alerts: Mutex<Vec<EmergencyAlert>>,
    responder_notices: Mutex<Vec<ResponderNotice>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct EmergencyAlert {
    pub(super) contact: String,
    pub(super) patient_name: String,
    pub(super) track_link: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct ResponderNotice {
    pub(super) user: UserId,
    pub(super) message: String,
}

impl MemoryNotifier {
    pub(super) fn emergency_alerts(&self) -> Vec<EmergencyAlert> {
        self.emergency_alerts
            .lock()
            .expect("notifier mutex poisoned")
            .clone()
    }

    pub(super) fn responder_notices(&self) -> Vec<ResponderNotice> {
        self.responder_notices
            .lock()
            .expect("notifier mutex poisoned")
            .clone()
    }
}

impl Notifier for MemoryNotifier {
    fn send_emergency_alert(
        &self,
        contact: &str,
        patient_name: &str,
        _kind: IncidentKind,
        track_link: &str,
    ) -> Result<(), NotifyError> {
        self.emergency_alerts
            .lock()
            .expect("notifier mutex poisoned")
            .push(EmergencyAlert {
                contact: contact.to_string(),
                patient_name: patient_name.to_string(),
                track_link: track_link.to_string(),
            });
        Ok(())
    }

    fn notify_responder(
        &self,
        candidate: &ResponderCandidate,
        message: &str,
    ) -> Result<(), NotifyError> {
        self.responder_notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(ResponderNotice {
                user: candidate.user.clone(),
                message: message.to_string(),
            });
        Ok(())
    }
}

pub(super) fn account(
    id: &str,
    role: UserRole,
    location: Option<GeoPoint>,
    blood_group: Option<BloodGroup>,
) -> UserAccount {
    UserAccount {
        id: UserId(id.to_string()),
        name: format!("{id} name"),
        phone: "+911112223334".to_string(),
        role,
        location,
        blood_group,
        medical_history: None,
        emergency_contact: None,
        avatar_url: None,
        push_token: None,
        is_suspended: false,
        false_alarm_count: 0,
    }
}

pub(super) fn point(latitude: f64, longitude: f64) -> GeoPoint {
    GeoPoint::new(latitude, longitude).expect("valid fixture point")
}

pub(super) fn reporter() -> UserAccount {
    let mut account = account(
        "reporter-1",
        UserRole::User,
        Some(point(BASE_LAT, BASE_LON)),
        Some(BloodGroup::ONegative),
    );
    account.name = "Asha Verma".to_string();
    account.medical_history = Some("known cardiac condition".to_string());
    account.emergency_contact = Some("+919998887776".to_string());
    account
}

pub(super) fn submission(kind: IncidentKind, blood_group: Option<BloodGroup>) -> IncidentSubmission {
    IncidentSubmission {
        kind,
        description: Some("help needed".to_string()),
        latitude: BASE_LAT,
        longitude: BASE_LON,
        blood_group,
    }
}

pub(super) type TestService = DispatchService<MemoryRepository, MemoryDirectory, MemoryNotifier>;

pub(super) struct TestHarness {
    pub(super) service: Arc<TestService>,
    pub(super) repository: Arc<MemoryRepository>,
    pub(super) directory: Arc<MemoryDirectory>,
    pub(super) notifier: Arc<MemoryNotifier>,
    pub(super) broadcaster: EventBroadcaster,
}

pub(super) fn harness() -> TestHarness {
    let repository = Arc::new(MemoryRepository::default());
    let directory = Arc::new(MemoryDirectory::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let broadcaster = EventBroadcaster::default();

    directory.insert(reporter());

    let service = Arc::new(DispatchService::new(
        repository.clone(),
        directory.clone(),
        notifier.clone(),
        broadcaster.clone(),
        DispatchConfig::default(),
    ));

    TestHarness {
        service,
        repository,
        directory,
        notifier,
        broadcaster,
    }
}
