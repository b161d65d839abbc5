//! # Pending Registration Repository
//!
//! Queries and mutations for the registration intake queue. Duplicate
//! prevention happens here at insert time: a second pending application for
//! the same email or institution is rejected as a conflict instead of being
//! cleaned up later.

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::pending_registration::{
    ApprovalStatus, Column, Entity as PendingRegistration, Model as RegistrationModel,
    PriorityLevel,
};

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"))
}

/// Intake data for a new registration
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub password: Option<String>,
    pub organization_name: String,
    pub organization_address: Option<String>,
    pub organization_city: Option<String>,
    pub organization_state: Option<String>,
    pub organization_postal_code: Option<String>,
    pub organization_website: Option<String>,
    pub enrollment_size: Option<i32>,
}

/// Repository for pending registration database operations
pub struct PendingRegistrationRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PendingRegistrationRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a new pending registration, rejecting duplicates of any
    /// still-pending application with the same email or institution name.
    pub async fn insert(
        &self,
        request: NewRegistration,
    ) -> Result<RegistrationModel, RepositoryError> {
        self.validate(&request)?;

        let duplicate = PendingRegistration::find()
            .filter(Column::ApprovalStatus.eq(ApprovalStatus::Pending))
            .filter(
                Condition::any()
                    .add(Column::Email.eq(request.email.clone()))
                    .add(Column::OrganizationName.eq(request.organization_name.clone())),
            )
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if duplicate.is_some() {
            return Err(RepositoryError::Conflict(
                "A pending registration already exists for this email or institution".to_string(),
            ));
        }

        let registration = crate::models::pending_registration::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(request.email),
            first_name: Set(request.first_name),
            last_name: Set(request.last_name),
            phone: Set(request.phone),
            title: Set(request.title),
            password: Set(request.password),
            organization_name: Set(request.organization_name),
            organization_address: Set(request.organization_address),
            organization_city: Set(request.organization_city),
            organization_state: Set(request.organization_state),
            organization_postal_code: Set(request.organization_postal_code),
            organization_website: Set(request.organization_website),
            enrollment_size: Set(request.enrollment_size),
            approval_status: Set(ApprovalStatus::Pending),
            priority_level: Set(PriorityLevel::Normal),
            rejection_reason: Set(None),
            approved_by: Set(None),
            approved_at: Set(None),
            created_at: Set(Utc::now().into()),
        };

        registration
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Get a registration by ID regardless of status
    pub async fn find_by_id(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<RegistrationModel>, RepositoryError> {
        PendingRegistration::find_by_id(registration_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Get a registration by ID only if it is still awaiting review
    pub async fn fetch_pending_by_id(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<RegistrationModel>, RepositoryError> {
        PendingRegistration::find_by_id(registration_id)
            .filter(Column::ApprovalStatus.eq(ApprovalStatus::Pending))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// List registrations awaiting review, highest priority first and oldest
    /// first within a priority level.
    pub async fn list_pending(&self) -> Result<Vec<RegistrationModel>, RepositoryError> {
        let mut pending = PendingRegistration::find()
            .filter(Column::ApprovalStatus.eq(ApprovalStatus::Pending))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        pending.sort_by(|a, b| {
            b.priority_level
                .weight()
                .cmp(&a.priority_level.weight())
                .then(a.created_at.cmp(&b.created_at))
        });

        Ok(pending)
    }

    /// Record approval, stamping the reviewing admin and clearing the stored
    /// password now that the Identity Provider owns the credential.
    pub async fn mark_approved(
        &self,
        registration: RegistrationModel,
        admin_user_id: Uuid,
    ) -> Result<RegistrationModel, RepositoryError> {
        let mut active = registration.into_active_model();
        active.approval_status = Set(ApprovalStatus::Approved);
        active.approved_by = Set(Some(admin_user_id));
        active.approved_at = Set(Some(Utc::now().into()));
        active.password = Set(None);

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Record rejection with the admin's reason.
    pub async fn mark_rejected(
        &self,
        registration: RegistrationModel,
        admin_user_id: Uuid,
        reason: Option<String>,
    ) -> Result<RegistrationModel, RepositoryError> {
        let mut active = registration.into_active_model();
        active.approval_status = Set(ApprovalStatus::Rejected);
        active.approved_by = Set(Some(admin_user_id));
        active.approved_at = Set(Some(Utc::now().into()));
        active.rejection_reason = Set(reason);
        active.password = Set(None);

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    fn validate(&self, request: &NewRegistration) -> Result<(), RepositoryError> {
        if !email_regex().is_match(&request.email) {
            return Err(RepositoryError::validation_error(
                "A valid email address is required",
            ));
        }

        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "First and last name are required",
            ));
        }

        let name = request.organization_name.trim();
        if name.is_empty() {
            return Err(RepositoryError::validation_error(
                "Institution name is required",
            ));
        }
        if name.len() > 255 {
            return Err(RepositoryError::validation_error(
                "Institution name cannot exceed 255 characters",
            ));
        }

        if let Some(size) = request.enrollment_size {
            if size < 0 {
                return Err(RepositoryError::validation_error(
                    "Enrollment size cannot be negative",
                ));
            }
        }

        Ok(())
    }
}
