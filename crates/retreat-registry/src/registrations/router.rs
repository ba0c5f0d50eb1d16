use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::cache::CacheError;
use super::domain::ParticipantChange;
use super::service::{RegistrationService, RegistrationServiceError};
use super::views::ViewRequest;

/// Router builder exposing eligibility, view, accounting, and change-feed
/// endpoints.
pub fn registration_router(service: Arc<RegistrationService>) -> Router {
    Router::new()
        .route("/api/v1/pools/:pool/members", get(pool_members_handler))
        .route(
            "/api/v1/pools/:pool/participants/:participant_id",
            get(eligibility_handler),
        )
        .route("/api/v1/views/:view", post(view_handler))
        .route(
            "/api/v1/participants/:participant_id/installments",
            get(installments_handler),
        )
        .route(
            "/api/v1/participants/:participant_id/changes",
            post(change_handler),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventQuery {
    pub(crate) aid: String,
    #[serde(default)]
    pub(crate) sub_event: Option<String>,
}

pub(crate) async fn pool_members_handler(
    State(service): State<Arc<RegistrationService>>,
    Path(pool): Path<String>,
    Query(query): Query<EventQuery>,
) -> Response {
    let members = service.pool_members(&pool, &query.aid);
    let payload = json!({
        "pool": pool,
        "aid": query.aid,
        "members": members,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn eligibility_handler(
    State(service): State<Arc<RegistrationService>>,
    Path((pool, participant_id)): Path<(String, String)>,
    Query(query): Query<EventQuery>,
) -> Result<Response, RegistrationServiceError> {
    let eligible = service.is_eligible(&pool, &participant_id, &query.aid)?;
    let payload = json!({
        "pool": pool,
        "participant_id": participant_id,
        "aid": query.aid,
        "eligible": eligible,
    });
    Ok((StatusCode::OK, Json(payload)).into_response())
}

pub(crate) async fn view_handler(
    State(service): State<Arc<RegistrationService>>,
    Path(view): Path<String>,
    Json(request): Json<ViewRequest>,
) -> Result<Response, RegistrationServiceError> {
    let output = service.evaluate_view(&view, &request)?;
    Ok((StatusCode::OK, Json(output)).into_response())
}

pub(crate) async fn installments_handler(
    State(service): State<Arc<RegistrationService>>,
    Path(participant_id): Path<String>,
    Query(query): Query<EventQuery>,
) -> Result<Response, RegistrationServiceError> {
    let summary =
        service.installments(&participant_id, &query.aid, query.sub_event.as_deref())?;
    Ok((StatusCode::OK, Json(summary)).into_response())
}

pub(crate) async fn change_handler(
    State(service): State<Arc<RegistrationService>>,
    Path(participant_id): Path<String>,
    Json(changed_fields): Json<Map<String, Value>>,
) -> Result<Response, RegistrationServiceError> {
    let change = ParticipantChange {
        participant_id,
        changed_fields,
    };
    service.apply_change(&change)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Lookups that miss are `404`, merges that do not decode are `422`.
impl IntoResponse for RegistrationServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            RegistrationServiceError::UnknownParticipant(_)
            | RegistrationServiceError::UnknownEvent(_)
            | RegistrationServiceError::MissingProgram { .. }
            | RegistrationServiceError::View(_) => StatusCode::NOT_FOUND,
            RegistrationServiceError::Cache(CacheError::Decode { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            RegistrationServiceError::Cache(CacheError::Encode { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}
