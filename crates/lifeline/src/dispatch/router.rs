use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::directory::UserDirectory;
use super::domain::{BloodGroup, IncidentId, IncidentStatus, IncidentSubmission, UserId};
use super::notify::Notifier;
use super::repository::IncidentRepository;
use super::service::{DispatchError, DispatchService};

/// Identity installed by the upstream auth collaborator. The gateway
/// terminates sessions and forwards the caller as a trusted header.
const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match value {
            Some(id) => Ok(AuthenticatedUser(UserId(id.to_string()))),
            None => Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "missing x-user-id header" })),
            )
                .into_response()),
        }
    }
}

/// Router builder exposing the SOS dispatch HTTP surface.
pub fn dispatch_router<R, D, N>(service: Arc<DispatchService<R, D, N>>) -> Router
where
    R: IncidentRepository + 'static,
    D: UserDirectory + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/api/v1/incidents", post(create_incident_handler::<R, D, N>))
        .route(
            "/api/v1/incidents/active",
            get(active_incidents_handler::<R, D, N>),
        )
        .route(
            "/api/v1/incidents/:incident_id/respond",
            put(respond_handler::<R, D, N>),
        )
        .route(
            "/api/v1/incidents/:incident_id/status",
            put(transition_handler::<R, D, N>),
        )
        .route(
            "/api/v1/incidents/:incident_id/report",
            get(report_handler::<R, D, N>),
        )
        .route("/api/v1/responders/nearby", get(nearby_handler::<R, D, N>))
        .route("/api/v1/analytics/heatmap", get(heatmap_handler::<R, D, N>))
        .route("/api/v1/analytics/stats", get(stats_handler::<R, D, N>))
        .with_state(service)
}

fn error_response(error: DispatchError) -> Response {
    let status = match &error {
        DispatchError::InvalidLocation(_) => StatusCode::BAD_REQUEST,
        DispatchError::UnknownUser(_) => StatusCode::UNAUTHORIZED,
        DispatchError::Suspended => StatusCode::FORBIDDEN,
        DispatchError::NotFound => StatusCode::NOT_FOUND,
        DispatchError::IllegalTransition { .. } => StatusCode::CONFLICT,
        DispatchError::Repository(_)
        | DispatchError::Directory(_)
        | DispatchError::Notify(_)
        | DispatchError::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

pub(crate) async fn create_incident_handler<R, D, N>(
    State(service): State<Arc<DispatchService<R, D, N>>>,
    AuthenticatedUser(reporter): AuthenticatedUser,
    Json(submission): Json<IncidentSubmission>,
) -> Response
where
    R: IncidentRepository + 'static,
    D: UserDirectory + 'static,
    N: Notifier + 'static,
{
    match service.create_incident(&reporter, submission) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn active_incidents_handler<R, D, N>(
    State(service): State<Arc<DispatchService<R, D, N>>>,
    AuthenticatedUser(_): AuthenticatedUser,
) -> Response
where
    R: IncidentRepository + 'static,
    D: UserDirectory + 'static,
    N: Notifier + 'static,
{
    match service.active_incidents() {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn respond_handler<R, D, N>(
    State(service): State<Arc<DispatchService<R, D, N>>>,
    AuthenticatedUser(responder): AuthenticatedUser,
    Path(incident_id): Path<String>,
) -> Response
where
    R: IncidentRepository + 'static,
    D: UserDirectory + 'static,
    N: Notifier + 'static,
{
    match service.respond(&IncidentId(incident_id), &responder) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionRequest {
    pub(crate) status: IncidentStatus,
    #[serde(default)]
    pub(crate) detail: Option<String>,
}

pub(crate) async fn transition_handler<R, D, N>(
    State(service): State<Arc<DispatchService<R, D, N>>>,
    AuthenticatedUser(_): AuthenticatedUser,
    Path(incident_id): Path<String>,
    Json(request): Json<TransitionRequest>,
) -> Response
where
    R: IncidentRepository + 'static,
    D: UserDirectory + 'static,
    N: Notifier + 'static,
{
    match service.transition(&IncidentId(incident_id), request.status, request.detail) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<R, D, N>(
    State(service): State<Arc<DispatchService<R, D, N>>>,
    AuthenticatedUser(_): AuthenticatedUser,
    Path(incident_id): Path<String>,
) -> Response
where
    R: IncidentRepository + 'static,
    D: UserDirectory + 'static,
    N: Notifier + 'static,
{
    let id = IncidentId(incident_id);
    match service.render_report(&id) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, mime::APPLICATION_PDF.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"Report-{}.pdf\"", id),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NearbyQuery {
    pub(crate) lat: f64,
    pub(crate) lon: f64,
    #[serde(default)]
    pub(crate) radius_km: Option<f64>,
    #[serde(default)]
    pub(crate) blood_group: Option<BloodGroup>,
}

pub(crate) async fn nearby_handler<R, D, N>(
    State(service): State<Arc<DispatchService<R, D, N>>>,
    AuthenticatedUser(_): AuthenticatedUser,
    Query(query): Query<NearbyQuery>,
) -> Response
where
    R: IncidentRepository + 'static,
    D: UserDirectory + 'static,
    N: Notifier + 'static,
{
    match service.nearby_responders(query.lat, query.lon, query.radius_km, query.blood_group) {
        Ok(candidates) => (StatusCode::OK, Json(candidates)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn heatmap_handler<R, D, N>(
    State(service): State<Arc<DispatchService<R, D, N>>>,
) -> Response
where
    R: IncidentRepository + 'static,
    D: UserDirectory + 'static,
    N: Notifier + 'static,
{
    match service.heatmap() {
        Ok(points) => (StatusCode::OK, Json(points)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stats_handler<R, D, N>(
    State(service): State<Arc<DispatchService<R, D, N>>>,
    AuthenticatedUser(_): AuthenticatedUser,
) -> Response
where
    R: IncidentRepository + 'static,
    D: UserDirectory + 'static,
    N: Notifier + 'static,
{
    match service.stats() {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}
