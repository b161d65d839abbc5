//! # Profile Handlers
//!
//! Admin repair surface: the workflows are not atomic, so a crash between
//! identity provisioning and organization activation can leave profiles no
//! organization points at. This listing makes those visible.

use axum::{extract::State, response::Json};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::models::profile::Model as ProfileModel;
use crate::repositories::ProfileRepository;
use crate::server::AppState;

/// A profile that is no organization's primary contact
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrphanedProfileDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<FixedOffset>,
}

impl From<ProfileModel> for OrphanedProfileDto {
    fn from(model: ProfileModel) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            created_at: model.created_at,
        }
    }
}

/// List profiles no organization claims as its primary contact
#[utoipa::path(
    get,
    path = "/api/v1/profiles/orphaned",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Orphaned profiles", body = Vec<OrphanedProfileDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "profiles"
)]
pub async fn list_orphaned_profiles(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<Json<Vec<OrphanedProfileDto>>, ApiError> {
    let repository = ProfileRepository::new(&state.db);
    let orphaned = repository.list_orphaned().await?;

    Ok(Json(
        orphaned.into_iter().map(OrphanedProfileDto::from).collect(),
    ))
}
