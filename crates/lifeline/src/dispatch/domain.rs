use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geo::GeoPoint;

/// Identifier wrapper for persisted incidents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncidentId(pub String);

impl std::fmt::Display for IncidentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for directory users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category of a raised emergency. Unrecognized types deserialize as
/// `Other` so an unusual alert still goes out with the default weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    Accident,
    Surgery,
    Disaster,
    BloodRequest,
    #[serde(other)]
    Other,
}

impl IncidentKind {
    pub const fn label(self) -> &'static str {
        match self {
            IncidentKind::Accident => "accident",
            IncidentKind::Surgery => "surgery",
            IncidentKind::Disaster => "disaster",
            IncidentKind::BloodRequest => "blood_request",
            IncidentKind::Other => "other",
        }
    }
}

/// ABO/Rh blood group as captured on user profiles and blood requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub const fn label(self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }

    /// Whether a donor with this group can serve a request for `required`.
    ///
    /// One-directional simplification: exact match, or the universal donor
    /// type O-. Hospitals bypass this check entirely.
    pub fn serves(self, required: BloodGroup) -> bool {
        self == required || self == BloodGroup::ONegative
    }
}

/// Lifecycle state of an incident. `Resolved` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Active,
    Resolved,
    Cancelled,
}

impl IncidentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            IncidentStatus::Active => "active",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Cancelled => "cancelled",
        }
    }

    /// Legal transitions: `active -> resolved` and `active -> cancelled`.
    pub fn can_transition_to(self, next: IncidentStatus) -> bool {
        matches!(
            (self, next),
            (IncidentStatus::Active, IncidentStatus::Resolved)
                | (IncidentStatus::Active, IncidentStatus::Cancelled)
        )
    }
}

/// Acknowledgement progress reported by a responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponderProgress {
    Accepted,
    OnWay,
    Arrived,
}

impl ResponderProgress {
    pub const fn label(self) -> &'static str {
        match self {
            ResponderProgress::Accepted => "accepted",
            ResponderProgress::OnWay => "on_way",
            ResponderProgress::Arrived => "arrived",
        }
    }
}

/// Single entry in an incident's append-only, time-ordered event trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub details: Option<String>,
}

impl TimelineEntry {
    pub fn now(status: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: status.into(),
            timestamp: Utc::now(),
            details,
        }
    }
}

/// Recorded acknowledgement from a hospital or donor. At most one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponderEntry {
    pub user: UserId,
    pub status: ResponderProgress,
    pub recorded_at: DateTime<Utc>,
}

/// Persisted SOS record. Mutated only by timeline and responder appends plus
/// the terminal status transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub reporter: UserId,
    pub kind: IncidentKind,
    pub description: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub contact_number: Option<String>,
    pub location: GeoPoint,
    pub status: IncidentStatus,
    pub priority_score: u8,
    pub false_alarm: bool,
    pub timeline: Vec<TimelineEntry>,
    pub responders: Vec<ResponderEntry>,
    pub created_at: DateTime<Utc>,
}

impl Incident {
    pub fn responder(&self, user: &UserId) -> Option<&ResponderEntry> {
        self.responders.iter().find(|entry| &entry.user == user)
    }
}

/// Role of a directory user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Donor,
    Hospital,
    Admin,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Donor => "donor",
            UserRole::Hospital => "hospital",
            UserRole::Admin => "admin",
        }
    }

    /// Responder roles are the ones the locator considers.
    pub const fn is_responder(self) -> bool {
        matches!(self, UserRole::Donor | UserRole::Hospital)
    }
}

/// Directory record for a registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub name: String,
    pub phone: String,
    pub role: UserRole,
    pub location: Option<GeoPoint>,
    pub blood_group: Option<BloodGroup>,
    pub medical_history: Option<String>,
    pub emergency_contact: Option<String>,
    pub avatar_url: Option<String>,
    pub push_token: Option<String>,
    pub is_suspended: bool,
    pub false_alarm_count: u32,
}

/// Ephemeral projection of a nearby hospital or donor produced by the locator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponderCandidate {
    pub user: UserId,
    pub name: String,
    pub role: UserRole,
    pub location: GeoPoint,
    pub blood_group: Option<BloodGroup>,
    pub phone: String,
    pub push_token: Option<String>,
    pub distance_km: f64,
}

/// Payload accepted when a user raises an SOS.
#[derive(Debug, Clone, Deserialize)]
pub struct IncidentSubmission {
    #[serde(rename = "type")]
    pub kind: IncidentKind,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "bloodGroup", default)]
    pub blood_group: Option<BloodGroup>,
}

/// Reporter fields joined into broadcast and API payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReporterView {
    pub id: UserId,
    pub name: String,
    pub phone: String,
    pub avatar_url: Option<String>,
}

/// Responder entry joined with the responder's public identity. Name and
/// role stay `None` when the directory no longer resolves the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponderView {
    pub user: UserId,
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub status: ResponderProgress,
    pub recorded_at: DateTime<Utc>,
}

impl ResponderView {
    pub fn from_entry(entry: &ResponderEntry, account: Option<&UserAccount>) -> Self {
        Self {
            user: entry.user.clone(),
            name: account.map(|account| account.name.clone()),
            role: account.map(|account| account.role),
            status: entry.status,
            recorded_at: entry.recorded_at,
        }
    }
}

/// Incident joined with the reporter's and responders' public fields. This is
/// the DTO the orchestrator broadcasts and the HTTP surface returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentView {
    pub id: IncidentId,
    pub kind: IncidentKind,
    pub description: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub contact_number: Option<String>,
    pub location: GeoPoint,
    pub status: IncidentStatus,
    pub priority_score: u8,
    pub timeline: Vec<TimelineEntry>,
    pub responders: Vec<ResponderView>,
    pub created_at: DateTime<Utc>,
    pub reporter: Option<ReporterView>,
}

impl IncidentView {
    pub fn from_incident(
        incident: Incident,
        reporter: Option<&UserAccount>,
        responders: Vec<ResponderView>,
    ) -> Self {
        let reporter = reporter.map(|account| ReporterView {
            id: account.id.clone(),
            name: account.name.clone(),
            phone: account.phone.clone(),
            avatar_url: account.avatar_url.clone(),
        });

        Self {
            id: incident.id,
            kind: incident.kind,
            description: incident.description,
            blood_group: incident.blood_group,
            contact_number: incident.contact_number,
            location: incident.location,
            status: incident.status,
            priority_score: incident.priority_score,
            timeline: incident.timeline,
            responders,
            created_at: incident.created_at,
            reporter,
        }
    }
}

/// Single point in the public heatmap feed. Weight is the priority score
/// normalized to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
}

/// Aggregate counters for the operations dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DispatchStats {
    pub total_incidents: usize,
    pub resolved_incidents: usize,
    pub average_priority: f64,
    pub blood_demand: Vec<BloodDemandEntry>,
}

/// Count of blood-request incidents per requested group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BloodDemandEntry {
    pub blood_group: BloodGroup,
    pub count: usize,
}
