//! # Registration Handlers
//!
//! Public intake plus the admin review queue and approve/reject decisions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::approval::ApprovalService;
use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::models::pending_registration::{Model as RegistrationModel, PriorityLevel};
use crate::repositories::{NewRegistration, PendingRegistrationRepository};
use crate::server::AppState;

/// Request payload for a new registration
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationIntakeDto {
    #[schema(example = "cio@acme.edu")]
    pub email: String,
    #[schema(example = "Pat")]
    pub first_name: String,
    #[schema(example = "Jones")]
    pub last_name: String,
    pub phone: Option<String>,
    #[schema(example = "CIO")]
    pub title: Option<String>,
    /// Credential the registrant will sign in with once approved
    pub password: Option<String>,
    #[schema(example = "Acme College")]
    pub organization_name: String,
    pub organization_address: Option<String>,
    pub organization_city: Option<String>,
    pub organization_state: Option<String>,
    pub organization_postal_code: Option<String>,
    pub organization_website: Option<String>,
    #[schema(example = 2400)]
    pub enrollment_size: Option<i32>,
}

/// Response payload for a created registration
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationCreatedDto {
    pub id: Uuid,
}

/// A pending registration as shown in the admin review queue
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationSummaryDto {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub title: Option<String>,
    pub organization_name: String,
    pub organization_city: Option<String>,
    pub organization_state: Option<String>,
    pub enrollment_size: Option<i32>,
    pub priority_level: PriorityLevel,
    pub created_at: DateTime<FixedOffset>,
}

impl From<RegistrationModel> for RegistrationSummaryDto {
    fn from(model: RegistrationModel) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            title: model.title,
            organization_name: model.organization_name,
            organization_city: model.organization_city,
            organization_state: model.organization_state,
            enrollment_size: model.enrollment_size,
            priority_level: model.priority_level,
            created_at: model.created_at,
        }
    }
}

/// Request payload for approving a registration
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApproveRegistrationDto {
    pub admin_user_id: Uuid,
    /// Annual fee in whole dollars for the selected tier
    #[schema(example = 1500)]
    pub selected_fee_tier: Option<i32>,
}

/// Response payload for a successful approval
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApprovalResponseDto {
    pub success: bool,
    pub user_id: Uuid,
    pub organization_id: Uuid,
}

/// Request payload for rejecting a registration
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RejectRegistrationDto {
    pub admin_user_id: Uuid,
    #[schema(example = "Incomplete application")]
    pub reason: Option<String>,
}

/// Generic success acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessDto {
    pub success: bool,
}

/// Submit a membership registration
#[utoipa::path(
    post,
    path = "/api/v1/registrations",
    request_body = RegistrationIntakeDto,
    responses(
        (status = 201, description = "Registration queued for review", body = RegistrationCreatedDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Duplicate pending registration", body = ApiError)
    ),
    tag = "registrations"
)]
pub async fn create_registration(
    State(state): State<AppState>,
    Json(request): Json<RegistrationIntakeDto>,
) -> Result<(StatusCode, Json<RegistrationCreatedDto>), ApiError> {
    let repository = PendingRegistrationRepository::new(&state.db);

    let created = repository
        .insert(NewRegistration {
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            title: request.title,
            password: request.password,
            organization_name: request.organization_name,
            organization_address: request.organization_address,
            organization_city: request.organization_city,
            organization_state: request.organization_state,
            organization_postal_code: request.organization_postal_code,
            organization_website: request.organization_website,
            enrollment_size: request.enrollment_size,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationCreatedDto { id: created.id }),
    ))
}

/// List registrations awaiting review
#[utoipa::path(
    get,
    path = "/api/v1/registrations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending registrations, highest priority first", body = Vec<RegistrationSummaryDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "registrations"
)]
pub async fn list_pending_registrations(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<Json<Vec<RegistrationSummaryDto>>, ApiError> {
    let repository = PendingRegistrationRepository::new(&state.db);
    let pending = repository.list_pending().await?;

    Ok(Json(
        pending.into_iter().map(RegistrationSummaryDto::from).collect(),
    ))
}

/// Approve a pending registration
#[utoipa::path(
    post,
    path = "/api/v1/registrations/{id}/approve",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Registration id")),
    request_body = ApproveRegistrationDto,
    responses(
        (status = 200, description = "Member activated", body = ApprovalResponseDto),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Registration not found or not pending", body = ApiError),
        (status = 409, description = "Organization name conflict", body = ApiError),
        (status = 502, description = "Identity provider failure", body = ApiError)
    ),
    tag = "registrations"
)]
pub async fn approve_registration(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<ApproveRegistrationDto>,
) -> Result<Json<ApprovalResponseDto>, ApiError> {
    let service = ApprovalService::new(
        state.db.clone(),
        state.identity.clone(),
        state.mailer.clone(),
        state.config.workflow.clone(),
    );

    let outcome = service
        .approve(id, request.admin_user_id, request.selected_fee_tier)
        .await?;

    Ok(Json(ApprovalResponseDto {
        success: true,
        user_id: outcome.user_id,
        organization_id: outcome.organization_id,
    }))
}

/// Reject a pending registration
#[utoipa::path(
    post,
    path = "/api/v1/registrations/{id}/reject",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Registration id")),
    request_body = RejectRegistrationDto,
    responses(
        (status = 200, description = "Registration rejected", body = SuccessDto),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Registration not found or not pending", body = ApiError)
    ),
    tag = "registrations"
)]
pub async fn reject_registration(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRegistrationDto>,
) -> Result<Json<SuccessDto>, ApiError> {
    let service = ApprovalService::new(
        state.db.clone(),
        state.identity.clone(),
        state.mailer.clone(),
        state.config.workflow.clone(),
    );

    service
        .reject(id, request.admin_user_id, request.reason)
        .await?;

    Ok(Json(SuccessDto { success: true }))
}
