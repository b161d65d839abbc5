//! # Organization Repository
//!
//! Queries and mutations for member organizations and their dependent rows.
//! The `organizations.name` unique constraint is the arbiter for name
//! ownership; every insert and rename maps a unique violation to a conflict
//! the caller can act on.

use chrono::Utc;
use sea_orm::prelude::Date;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::{RepositoryError, is_unique_violation};
use crate::models::organization::{
    Column, Entity as Organization, MembershipStatus, Model as OrganizationModel,
};
use crate::models::{
    custom_software_entry, invoice, organization_invitation, organization_profile_edit_request,
};

/// Field set for creating an organization row
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub enrollment_size: Option<i32>,
    pub membership_status: MembershipStatus,
    pub membership_start_date: Option<Date>,
    pub annual_fee: Option<i32>,
    pub contact_person_id: Uuid,
}

/// Repository for organization database operations
pub struct OrganizationRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> OrganizationRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert an organization. A name collision surfaces as
    /// [`RepositoryError::Conflict`] so callers can treat it as a lost race
    /// rather than a hard database failure.
    pub async fn insert(
        &self,
        request: NewOrganization,
    ) -> Result<OrganizationModel, RepositoryError> {
        let now = Utc::now();
        let organization = crate::models::organization::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            address: Set(request.address),
            city: Set(request.city),
            state: Set(request.state),
            postal_code: Set(request.postal_code),
            website: Set(request.website),
            phone: Set(request.phone),
            enrollment_size: Set(request.enrollment_size),
            membership_status: Set(request.membership_status),
            membership_start_date: Set(request.membership_start_date),
            annual_fee: Set(request.annual_fee),
            contact_person_id: Set(request.contact_person_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        organization.insert(self.db).await.map_err(|err| {
            if is_unique_violation(&err) {
                RepositoryError::Conflict("Organization name already in use".to_string())
            } else {
                RepositoryError::Database(err)
            }
        })
    }

    pub async fn find_by_id(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<OrganizationModel>, RepositoryError> {
        Organization::find_by_id(organization_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<OrganizationModel>, RepositoryError> {
        Organization::find()
            .filter(Column::Name.eq(name))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// List organizations visible in the member directory.
    pub async fn list_active(&self) -> Result<Vec<OrganizationModel>, RepositoryError> {
        Organization::find()
            .filter(Column::MembershipStatus.eq(MembershipStatus::Active))
            .order_by_asc(Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Mark the organization active with its billing terms.
    pub async fn activate(
        &self,
        organization: OrganizationModel,
        start_date: Date,
        annual_fee: Option<i32>,
    ) -> Result<OrganizationModel, RepositoryError> {
        let mut active = organization.into_active_model();
        active.membership_status = Set(MembershipStatus::Active);
        active.membership_start_date = Set(Some(start_date));
        active.annual_fee = Set(annual_fee);
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Rename an organization. A unique violation means another row still
    /// owns the name.
    pub async fn rename(
        &self,
        organization: OrganizationModel,
        name: String,
    ) -> Result<OrganizationModel, RepositoryError> {
        let mut active = organization.into_active_model();
        active.name = Set(name);
        active.updated_at = Set(Utc::now().into());

        active.update(self.db).await.map_err(|err| {
            if is_unique_violation(&err) {
                RepositoryError::Conflict("Organization name already in use".to_string())
            } else {
                RepositoryError::Database(err)
            }
        })
    }

    /// Delete the organization row itself. Fails while dependent rows exist;
    /// callers must clear invoices, invitations, software entries, and edit
    /// requests first.
    pub async fn delete(&self, organization_id: Uuid) -> Result<(), RepositoryError> {
        Organization::delete_by_id(organization_id)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(())
    }

    pub async fn delete_invoices_for(&self, organization_id: Uuid) -> Result<u64, RepositoryError> {
        let result = invoice::Entity::delete_many()
            .filter(invoice::Column::OrganizationId.eq(organization_id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(result.rows_affected)
    }

    pub async fn delete_invitations_for(
        &self,
        organization_id: Uuid,
    ) -> Result<u64, RepositoryError> {
        let result = organization_invitation::Entity::delete_many()
            .filter(organization_invitation::Column::OrganizationId.eq(organization_id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(result.rows_affected)
    }

    pub async fn delete_software_entries_for(
        &self,
        organization_id: Uuid,
    ) -> Result<u64, RepositoryError> {
        let result = custom_software_entry::Entity::delete_many()
            .filter(custom_software_entry::Column::OrganizationId.eq(organization_id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(result.rows_affected)
    }

    pub async fn delete_edit_requests_for(
        &self,
        organization_id: Uuid,
    ) -> Result<u64, RepositoryError> {
        let result = organization_profile_edit_request::Entity::delete_many()
            .filter(organization_profile_edit_request::Column::OrganizationId.eq(organization_id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(result.rows_affected)
    }
}
