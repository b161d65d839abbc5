//! # Reassignment Handlers
//!
//! Admin decisions on primary-contact reassignment requests. The acting
//! admin comes from the request body when present, otherwise from the
//! authenticated caller's `X-Admin-Id` header.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AdminActor, AdminAuth};
use crate::error::ApiError;
use crate::handlers::registrations::SuccessDto;
use crate::reassignment::ReassignmentService;
use crate::server::AppState;

/// Request payload for approving or rejecting a reassignment
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ReassignmentDecisionDto {
    /// Explicit acting admin; falls back to the authenticated caller
    pub admin_user_id: Option<Uuid>,
}

/// Response payload for a successful reassignment
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReassignmentResponseDto {
    pub success: bool,
    pub new_organization_id: Uuid,
}

fn service(state: &AppState) -> ReassignmentService {
    ReassignmentService::new(
        state.db.clone(),
        state.identity.clone(),
        state.mailer.clone(),
        state.config.workflow.clone(),
    )
}

/// Approve a pending reassignment request
#[utoipa::path(
    post,
    path = "/api/v1/reassignments/{id}/approve",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Reassignment request id")),
    request_body = ReassignmentDecisionDto,
    responses(
        (status = 200, description = "Contact replaced", body = ReassignmentResponseDto),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Request not found or not pending", body = ApiError),
        (status = 502, description = "Identity provider failure", body = ApiError)
    ),
    tag = "reassignments"
)]
pub async fn approve_reassignment(
    State(state): State<AppState>,
    _auth: AdminAuth,
    actor: AdminActor,
    Path(id): Path<Uuid>,
    Json(request): Json<ReassignmentDecisionDto>,
) -> Result<Json<ReassignmentResponseDto>, ApiError> {
    let admin_user_id = request.admin_user_id.or(actor.0);

    let outcome = service(&state).approve(id, admin_user_id).await?;

    Ok(Json(ReassignmentResponseDto {
        success: true,
        new_organization_id: outcome.new_organization_id,
    }))
}

/// Reject a pending reassignment request
#[utoipa::path(
    post,
    path = "/api/v1/reassignments/{id}/reject",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Reassignment request id")),
    request_body = ReassignmentDecisionDto,
    responses(
        (status = 200, description = "Request rejected", body = SuccessDto),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Request not found or not pending", body = ApiError)
    ),
    tag = "reassignments"
)]
pub async fn reject_reassignment(
    State(state): State<AppState>,
    _auth: AdminAuth,
    actor: AdminActor,
    Path(id): Path<Uuid>,
    Json(request): Json<ReassignmentDecisionDto>,
) -> Result<Json<SuccessDto>, ApiError> {
    let admin_user_id = request.admin_user_id.or(actor.0);

    service(&state).reject(id, admin_user_id).await?;

    Ok(Json(SuccessDto { success: true }))
}
