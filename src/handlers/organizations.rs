//! # Organization Handlers
//!
//! Public member directory. Only active organizations are visible and only
//! their public fields are exposed; contact details stay internal.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::prelude::Date;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::organization::{MembershipStatus, Model as OrganizationModel};
use crate::repositories::OrganizationRepository;
use crate::server::AppState;

/// Public directory entry for a member organization
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrganizationDirectoryDto {
    pub id: Uuid,
    #[schema(example = "Acme College")]
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub website: Option<String>,
    pub enrollment_size: Option<i32>,
    pub membership_start_date: Option<Date>,
}

impl From<OrganizationModel> for OrganizationDirectoryDto {
    fn from(model: OrganizationModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            city: model.city,
            state: model.state,
            website: model.website,
            enrollment_size: model.enrollment_size,
            membership_start_date: model.membership_start_date,
        }
    }
}

/// List active member organizations
#[utoipa::path(
    get,
    path = "/api/v1/organizations",
    responses(
        (status = 200, description = "Active organizations, alphabetical", body = Vec<OrganizationDirectoryDto>)
    ),
    tag = "organizations"
)]
pub async fn list_organizations(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrganizationDirectoryDto>>, ApiError> {
    let repository = OrganizationRepository::new(&state.db);
    let active = repository.list_active().await?;

    Ok(Json(
        active.into_iter().map(OrganizationDirectoryDto::from).collect(),
    ))
}

/// Get a single active member organization
#[utoipa::path(
    get,
    path = "/api/v1/organizations/{id}",
    params(("id" = Uuid, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Organization", body = OrganizationDirectoryDto),
        (status = 404, description = "Not found or not an active member", body = ApiError)
    ),
    tag = "organizations"
)]
pub async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrganizationDirectoryDto>, ApiError> {
    let repository = OrganizationRepository::new(&state.db);

    let organization = repository
        .find_by_id(id)
        .await?
        .filter(|organization| organization.membership_status == MembershipStatus::Active)
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Organization not found",
            )
        })?;

    Ok(Json(OrganizationDirectoryDto::from(organization)))
}
