//! # Reassignment Request Repository
//!
//! Queries and mutations for contact reassignment requests. Approval repoints
//! `organization_id` to the replacement organization in the same update that
//! records the decision, so the request never references a deleted row.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::reassignment_request::{
    Column, Entity as ReassignmentRequest, Model as RequestModel, RequestStatus,
};

/// Intake data for a new reassignment request
#[derive(Debug, Clone)]
pub struct NewReassignmentRequest {
    pub organization_id: Uuid,
    pub new_contact_email: String,
    pub new_organization_data: JsonValue,
    pub new_contact_data: Option<JsonValue>,
}

/// Repository for reassignment request database operations
pub struct ReassignmentRequestRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ReassignmentRequestRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn insert(
        &self,
        request: NewReassignmentRequest,
    ) -> Result<RequestModel, RepositoryError> {
        if request.new_contact_email.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "New contact email is required",
            ));
        }
        if !request.new_organization_data.is_object() {
            return Err(RepositoryError::validation_error(
                "New organization data must be an object",
            ));
        }

        let row = crate::models::reassignment_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(request.organization_id),
            new_contact_email: Set(request.new_contact_email),
            new_organization_data: Set(request.new_organization_data),
            new_contact_data: Set(request.new_contact_data),
            status: Set(RequestStatus::Pending),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            created_at: Set(Utc::now().into()),
        };

        row.insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_id(
        &self,
        request_id: Uuid,
    ) -> Result<Option<RequestModel>, RepositoryError> {
        ReassignmentRequest::find_by_id(request_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Get a request by ID only if it is still awaiting review
    pub async fn fetch_pending_by_id(
        &self,
        request_id: Uuid,
    ) -> Result<Option<RequestModel>, RepositoryError> {
        ReassignmentRequest::find_by_id(request_id)
            .filter(Column::Status.eq(RequestStatus::Pending))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list_pending(&self) -> Result<Vec<RequestModel>, RepositoryError> {
        ReassignmentRequest::find()
            .filter(Column::Status.eq(RequestStatus::Pending))
            .order_by_asc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Record approval and repoint the request at the replacement
    /// organization in one update.
    pub async fn mark_approved(
        &self,
        request: RequestModel,
        admin_user_id: Option<Uuid>,
        replacement_organization_id: Uuid,
    ) -> Result<RequestModel, RepositoryError> {
        let mut active = request.into_active_model();
        active.status = Set(RequestStatus::Approved);
        active.organization_id = Set(replacement_organization_id);
        active.reviewed_by = Set(admin_user_id);
        active.reviewed_at = Set(Some(Utc::now().into()));

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn mark_rejected(
        &self,
        request: RequestModel,
        admin_user_id: Option<Uuid>,
    ) -> Result<RequestModel, RepositoryError> {
        let mut active = request.into_active_model();
        active.status = Set(RequestStatus::Rejected);
        active.reviewed_by = Set(admin_user_id);
        active.reviewed_at = Set(Some(Utc::now().into()));

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Delete every other request still pointing at the given organization,
    /// clearing the way for the organization row's deletion.
    pub async fn delete_others_for_organization(
        &self,
        organization_id: Uuid,
        keep_request_id: Uuid,
    ) -> Result<u64, RepositoryError> {
        let result = ReassignmentRequest::delete_many()
            .filter(Column::OrganizationId.eq(organization_id))
            .filter(Column::Id.ne(keep_request_id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(result.rows_affected)
    }
}
