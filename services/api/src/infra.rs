use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

use lifeline::dispatch::{
    Acknowledgement, BloodGroup, DirectoryError, GeoPoint, Incident, IncidentId, IncidentKind,
    IncidentRepository, IncidentStatus, Notifier, NotifyError, RepositoryError,
    ResponderCandidate, ResponderEntry, TimelineEntry, UserAccount, UserDirectory, UserId,
    UserRole,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryIncidentRepository {
    incidents: Mutex<HashMap<IncidentId, Incident>>,
}

impl IncidentRepository for InMemoryIncidentRepository {
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
        // Membership check and both appends run under one guard so racing
        // acknowledgements serialize instead of dropping an entry.
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

#[derive(Default)]
pub(crate) struct InMemoryUserDirectory {
    users: Mutex<HashMap<UserId, UserAccount>>,
}

impl InMemoryUserDirectory {
    pub(crate) fn insert(&self, account: UserAccount) {
        let mut guard = self.users.lock().expect("directory mutex poisoned");
        guard.insert(account.id.clone(), account);
    }
}

impl UserDirectory for InMemoryUserDirectory {
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

/// Stand-in for the SMS/push gateway: logs every delivery instead of calling
/// an external provider.
pub(crate) struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn send_emergency_alert(
        &self,
        contact: &str,
        patient_name: &str,
        kind: IncidentKind,
        track_link: &str,
    ) -> Result<(), NotifyError> {
        info!(
            contact,
            patient = patient_name,
            kind = kind.label(),
            track_link,
            "emergency contact alert"
        );
        Ok(())
    }

    fn notify_responder(
        &self,
        candidate: &ResponderCandidate,
        message: &str,
    ) -> Result<(), NotifyError> {
        info!(responder = %candidate.user, role = candidate.role.label(), message, "responder notice");
        Ok(())
    }
}

/// Seed reporters and responders around central Kolkata for demos and local
/// testing. Real deployments back `UserDirectory` with the account store.
pub(crate) fn seed_demo_directory(directory: &InMemoryUserDirectory) {
    let point = |lat: f64, lon: f64| GeoPoint::new(lat, lon).expect("seed coordinates are valid");

    directory.insert(UserAccount {
        id: UserId("user-asha".to_string()),
        name: "Asha Verma".to_string(),
        phone: "+911234567890".to_string(),
        role: UserRole::User,
        location: Some(point(22.5726, 88.3639)),
        blood_group: Some(BloodGroup::ONegative),
        medical_history: Some("known cardiac condition".to_string()),
        emergency_contact: Some("+919998887776".to_string()),
        avatar_url: None,
        push_token: None,
        is_suspended: false,
        false_alarm_count: 0,
    });
    directory.insert(UserAccount {
        id: UserId("donor-ravi".to_string()),
        name: "Ravi Sen".to_string(),
        phone: "+911234500001".to_string(),
        role: UserRole::Donor,
        location: Some(point(22.5826, 88.3639)),
        blood_group: Some(BloodGroup::ONegative),
        medical_history: None,
        emergency_contact: None,
        avatar_url: None,
        push_token: Some("fcm-ravi".to_string()),
        is_suspended: false,
        false_alarm_count: 0,
    });
    directory.insert(UserAccount {
        id: UserId("donor-meera".to_string()),
        name: "Meera Das".to_string(),
        phone: "+911234500002".to_string(),
        role: UserRole::Donor,
        location: Some(point(22.5726, 88.3739)),
        blood_group: Some(BloodGroup::APositive),
        medical_history: None,
        emergency_contact: None,
        avatar_url: None,
        push_token: Some("fcm-meera".to_string()),
        is_suspended: false,
        false_alarm_count: 0,
    });
    directory.insert(UserAccount {
        id: UserId("hospital-city".to_string()),
        name: "City General Hospital".to_string(),
        phone: "+913322001100".to_string(),
        role: UserRole::Hospital,
        location: Some(point(22.5626, 88.3639)),
        blood_group: None,
        medical_history: None,
        emergency_contact: None,
        avatar_url: None,
        push_token: Some("fcm-city-general".to_string()),
        is_suspended: false,
        false_alarm_count: 0,
    });
}
