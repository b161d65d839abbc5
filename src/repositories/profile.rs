//! # Profile Repository
//!
//! Queries and mutations for contact profiles and role grants. Also exposes
//! the orphaned-profile listing used to repair profiles whose organization
//! was replaced underneath them.

use chrono::Utc;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::error::{RepositoryError, is_unique_violation};
use crate::models::organization;
use crate::models::profile::{Column, Entity as Profile, Model as ProfileModel};
use crate::models::user_role::{self, Role};

/// Field set for creating a profile row
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub title: Option<String>,
}

/// Repository for profile and role database operations
pub struct ProfileRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a profile row for an Identity Provider user. Duplicate email
    /// or user id surfaces as a conflict.
    pub async fn insert(&self, request: NewProfile) -> Result<ProfileModel, RepositoryError> {
        let now = Utc::now();
        let profile = crate::models::profile::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(request.user_id),
            email: Set(request.email),
            first_name: Set(request.first_name),
            last_name: Set(request.last_name),
            phone: Set(request.phone),
            title: Set(request.title),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        profile.insert(self.db).await.map_err(|err| {
            if is_unique_violation(&err) {
                RepositoryError::Conflict(
                    "A profile already exists for this user or email".to_string(),
                )
            } else {
                RepositoryError::Database(err)
            }
        })
    }

    pub async fn find_by_id(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<ProfileModel>, RepositoryError> {
        Profile::find_by_id(profile_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProfileModel>, RepositoryError> {
        Profile::find()
            .filter(Column::UserId.eq(user_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ProfileModel>, RepositoryError> {
        Profile::find()
            .filter(Column::Email.eq(email))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, profile_id: Uuid) -> Result<(), RepositoryError> {
        Profile::delete_by_id(profile_id)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(())
    }

    /// List profiles no organization points at as its primary contact.
    pub async fn list_orphaned(&self) -> Result<Vec<ProfileModel>, RepositoryError> {
        Profile::find()
            .filter(
                Column::Id.not_in_subquery(
                    Query::select()
                        .column(organization::Column::ContactPersonId)
                        .from(organization::Entity)
                        .to_owned(),
                ),
            )
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Grant a role to an Identity Provider user. Granting an already-held
    /// role is a no-op, not an error.
    pub async fn assign_role(&self, user_id: Uuid, role: Role) -> Result<(), RepositoryError> {
        let grant = user_role::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            role: Set(role),
            created_at: Set(Utc::now().into()),
        };

        match grant.insert(self.db).await {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Ok(()),
            Err(err) => Err(RepositoryError::Database(err)),
        }
    }

    pub async fn has_role(&self, user_id: Uuid, role: Role) -> Result<bool, RepositoryError> {
        let grant = user_role::Entity::find()
            .filter(user_role::Column::UserId.eq(user_id))
            .filter(user_role::Column::Role.eq(role))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(grant.is_some())
    }

    /// Remove every role granted to the given Identity Provider user.
    pub async fn delete_roles_for_user(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let result = user_role::Entity::delete_many()
            .filter(user_role::Column::UserId.eq(user_id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::MigratorTrait;
    use sea_orm::Database;

    use crate::models::organization::MembershipStatus;
    use crate::repositories::organization::{NewOrganization, OrganizationRepository};

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn sample_profile(email: &str) -> NewProfile {
        NewProfile {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            first_name: "Pat".to_string(),
            last_name: "Jones".to_string(),
            phone: None,
            title: Some("CIO".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = setup_db().await;
        let repo = ProfileRepository::new(&db);

        let created = repo.insert(sample_profile("cio@acme.edu")).await.unwrap();

        let by_user = repo.find_by_user_id(created.user_id).await.unwrap();
        assert_eq!(by_user.unwrap().id, created.id);

        let by_email = repo.find_by_email("cio@acme.edu").await.unwrap();
        assert_eq!(by_email.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn test_insert_duplicate_email_is_conflict() {
        let db = setup_db().await;
        let repo = ProfileRepository::new(&db);

        repo.insert(sample_profile("cio@acme.edu")).await.unwrap();
        let result = repo.insert(sample_profile("cio@acme.edu")).await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_assign_role_is_idempotent() {
        let db = setup_db().await;
        let repo = ProfileRepository::new(&db);
        let user_id = Uuid::new_v4();

        repo.assign_role(user_id, Role::Member).await.unwrap();
        repo.assign_role(user_id, Role::Member).await.unwrap();

        assert!(repo.has_role(user_id, Role::Member).await.unwrap());
        assert!(!repo.has_role(user_id, Role::Admin).await.unwrap());

        assert_eq!(repo.delete_roles_for_user(user_id).await.unwrap(), 1);
        assert!(!repo.has_role(user_id, Role::Member).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_orphaned_excludes_primary_contacts() {
        let db = setup_db().await;
        let repo = ProfileRepository::new(&db);
        let organizations = OrganizationRepository::new(&db);

        let contact = repo.insert(sample_profile("cio@acme.edu")).await.unwrap();
        let orphan = repo.insert(sample_profile("lost@acme.edu")).await.unwrap();

        organizations
            .insert(NewOrganization {
                name: "Acme College".to_string(),
                address: None,
                city: None,
                state: None,
                postal_code: None,
                website: None,
                phone: None,
                enrollment_size: None,
                membership_status: MembershipStatus::Active,
                membership_start_date: None,
                annual_fee: None,
                contact_person_id: contact.id,
            })
            .await
            .unwrap();

        let orphaned = repo.list_orphaned().await.unwrap();
        assert_eq!(orphaned.len(), 1);
        assert_eq!(orphaned[0].id, orphan.id);
    }
}
