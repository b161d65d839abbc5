//! # Approval Orchestrator
//!
//! Turns a pending registration into a live member: Identity Provider user,
//! contact profile, active organization, role grant, and welcome email. The
//! sequence is not atomic; identity/organization failures abort, while role
//! assignment and notification are best-effort and only logged.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use rand::Rng;
use rand::distributions::Alphanumeric;
use sea_orm::DatabaseConnection;
use serde_json::json;
use uuid::Uuid;

use crate::config::WorkflowConfig;
use crate::error::{RepositoryError, WorkflowError};
use crate::identity::{CreateUser, IdentityProvider};
use crate::mail::{Notification, NotificationDispatcher};
use crate::models::organization::MembershipStatus;
use crate::models::pending_registration::Model as RegistrationModel;
use crate::models::user_role::Role;
use crate::repositories::{
    NewOrganization, NewProfile, OrganizationRepository, PendingRegistrationRepository,
    ProfileRepository,
};

/// Result of a successful approval.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub user_id: Uuid,
    pub organization_id: Uuid,
}

/// Orchestrates registration approval and rejection.
pub struct ApprovalService {
    db: DatabaseConnection,
    identity: Arc<dyn IdentityProvider>,
    mailer: Arc<dyn NotificationDispatcher>,
    workflow: WorkflowConfig,
}

/// Random alphanumeric credential for identities provisioned without a
/// registrant-chosen password.
pub(crate) fn generate_password(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

impl ApprovalService {
    pub fn new(
        db: DatabaseConnection,
        identity: Arc<dyn IdentityProvider>,
        mailer: Arc<dyn NotificationDispatcher>,
        workflow: WorkflowConfig,
    ) -> Self {
        Self {
            db,
            identity,
            mailer,
            workflow,
        }
    }

    /// Approve a pending registration.
    ///
    /// Only rows still in `pending` are eligible; anything else is reported
    /// as not found so a second approval of the same id cannot run the side
    /// effects twice.
    pub async fn approve(
        &self,
        registration_id: Uuid,
        admin_user_id: Uuid,
        selected_fee_tier: Option<i32>,
    ) -> Result<ApprovalOutcome, WorkflowError> {
        let registrations = PendingRegistrationRepository::new(&self.db);
        let profiles = ProfileRepository::new(&self.db);
        let organizations = OrganizationRepository::new(&self.db);

        let registration = registrations
            .fetch_pending_by_id(registration_id)
            .await?
            .ok_or_else(|| {
                WorkflowError::NotFound(
                    "Registration not found or already processed".to_string(),
                )
            })?;

        tracing::info!(
            registration_id = %registration.id,
            organization = %registration.organization_name,
            "Approving registration"
        );

        // Identity: reuse by email, otherwise provision a fresh user with
        // the registrant's own credential.
        let user = match self.identity.find_user_by_email(&registration.email).await? {
            Some(existing) => {
                tracing::info!(user_id = %existing.id, "Reusing existing identity");
                self.identity
                    .update_user_metadata(existing.id, identity_metadata(&registration))
                    .await?
            }
            None => {
                let password = registration
                    .password
                    .clone()
                    .unwrap_or_else(|| generate_password(self.workflow.temp_password_length));
                self.identity
                    .create_user(CreateUser {
                        email: registration.email.clone(),
                        password,
                        email_confirmed: true,
                        metadata: identity_metadata(&registration),
                    })
                    .await?
            }
        };

        // Profile row is materialized here, synchronously.
        let profile = match profiles.find_by_user_id(user.id).await? {
            Some(existing) => existing,
            None => match profiles.find_by_email(&registration.email).await? {
                Some(existing) => existing,
                None => {
                    profiles
                        .insert(NewProfile {
                            user_id: user.id,
                            email: registration.email.clone(),
                            first_name: registration.first_name.clone(),
                            last_name: registration.last_name.clone(),
                            phone: registration.phone.clone(),
                            title: registration.title.clone(),
                        })
                        .await?
                }
            },
        };

        // Organization: reuse only a row this contact already owns. A
        // same-name row owned by someone else is a conflict, not a takeover.
        let organization = match organizations
            .find_by_name(&registration.organization_name)
            .await?
        {
            Some(existing) if existing.contact_person_id == profile.id => existing,
            Some(_) => {
                return Err(WorkflowError::Conflict(
                    "An organization with this name already belongs to another contact"
                        .to_string(),
                ));
            }
            None => {
                organizations
                    .insert(NewOrganization {
                        name: registration.organization_name.clone(),
                        address: registration.organization_address.clone(),
                        city: registration.organization_city.clone(),
                        state: registration.organization_state.clone(),
                        postal_code: registration.organization_postal_code.clone(),
                        website: registration.organization_website.clone(),
                        phone: registration.phone.clone(),
                        enrollment_size: registration.enrollment_size,
                        membership_status: MembershipStatus::Pending,
                        membership_start_date: None,
                        annual_fee: None,
                        contact_person_id: profile.id,
                    })
                    .await
                    .map_err(conflict_as_workflow)?
            }
        };

        let organization = organizations
            .activate(organization, Utc::now().date_naive(), selected_fee_tier)
            .await?;

        registrations
            .mark_approved(registration.clone(), admin_user_id)
            .await?;

        // Best-effort from here on.
        if let Err(err) = profiles.assign_role(user.id, Role::Member).await {
            tracing::warn!(user_id = %user.id, error = %err, "Failed to assign member role");
        }

        if let Err(err) = self
            .mailer
            .send(&Notification::WelcomeApproved {
                recipient_email: registration.email.clone(),
                first_name: registration.first_name.clone(),
                organization_name: organization.name.clone(),
            })
            .await
        {
            tracing::warn!(
                recipient = %registration.email,
                error = %err,
                "Failed to send welcome notification"
            );
        }

        counter!("registrations_approved_total").increment(1);
        tracing::info!(
            registration_id = %registration.id,
            user_id = %user.id,
            organization_id = %organization.id,
            "Registration approved"
        );

        Ok(ApprovalOutcome {
            user_id: user.id,
            organization_id: organization.id,
        })
    }

    /// Reject a pending registration with an optional reason. No identity or
    /// organization side effects.
    pub async fn reject(
        &self,
        registration_id: Uuid,
        admin_user_id: Uuid,
        reason: Option<String>,
    ) -> Result<(), WorkflowError> {
        let registrations = PendingRegistrationRepository::new(&self.db);

        let registration = registrations
            .fetch_pending_by_id(registration_id)
            .await?
            .ok_or_else(|| {
                WorkflowError::NotFound(
                    "Registration not found or already processed".to_string(),
                )
            })?;

        registrations
            .mark_rejected(registration, admin_user_id, reason)
            .await?;

        counter!("registrations_rejected_total").increment(1);
        tracing::info!(registration_id = %registration_id, "Registration rejected");
        Ok(())
    }
}

fn identity_metadata(registration: &RegistrationModel) -> serde_json::Value {
    json!({
        "first_name": registration.first_name,
        "last_name": registration.last_name,
        "title": registration.title,
        "phone": registration.phone,
        "organization_name": registration.organization_name,
    })
}

fn conflict_as_workflow(error: RepositoryError) -> WorkflowError {
    match error {
        RepositoryError::Conflict(message) => WorkflowError::Conflict(message),
        other => WorkflowError::Repository(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::MigratorTrait;
    use sea_orm::Database;
    use serde_json::json;

    use crate::identity::mock::MockIdentityProvider;
    use crate::mail::mock::MockNotificationDispatcher;
    use crate::repositories::NewRegistration;

    struct Harness {
        db: DatabaseConnection,
        identity: Arc<MockIdentityProvider>,
        mailer: Arc<MockNotificationDispatcher>,
        service: ApprovalService,
    }

    async fn harness() -> Harness {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();

        let identity = Arc::new(MockIdentityProvider::new());
        let mailer = Arc::new(MockNotificationDispatcher::new());
        let service = ApprovalService::new(
            db.clone(),
            identity.clone(),
            mailer.clone(),
            WorkflowConfig::default(),
        );

        Harness {
            db,
            identity,
            mailer,
            service,
        }
    }

    fn sample_registration(email: &str, organization: &str) -> NewRegistration {
        NewRegistration {
            email: email.to_string(),
            first_name: "Pat".to_string(),
            last_name: "Jones".to_string(),
            phone: None,
            title: Some("CIO".to_string()),
            password: Some("registrant-chosen".to_string()),
            organization_name: organization.to_string(),
            organization_address: None,
            organization_city: Some("Springfield".to_string()),
            organization_state: Some("IL".to_string()),
            organization_postal_code: None,
            organization_website: None,
            enrollment_size: Some(2400),
        }
    }

    #[tokio::test]
    async fn test_approve_happy_path_creates_identity_profile_organization() {
        let h = harness().await;
        let registrations = PendingRegistrationRepository::new(&h.db);
        let admin = Uuid::new_v4();

        let registration = registrations
            .insert(sample_registration("new@school.edu", "Acme College"))
            .await
            .unwrap();

        let outcome = h
            .service
            .approve(registration.id, admin, Some(1500))
            .await
            .unwrap();

        // Identity provisioned for the registrant
        let user = h.identity.user_by_email("new@school.edu").unwrap();
        assert_eq!(outcome.user_id, user.id);

        // Profile materialized synchronously
        let profiles = ProfileRepository::new(&h.db);
        let profile = profiles.find_by_user_id(user.id).await.unwrap().unwrap();
        assert_eq!(profile.email, "new@school.edu");

        // Organization active with today's start date and the selected fee
        let organizations = OrganizationRepository::new(&h.db);
        let organization = organizations
            .find_by_id(outcome.organization_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(organization.name, "Acme College");
        assert_eq!(organization.membership_status, MembershipStatus::Active);
        assert_eq!(
            organization.membership_start_date,
            Some(Utc::now().date_naive())
        );
        assert_eq!(organization.annual_fee, Some(1500));
        assert_eq!(organization.contact_person_id, profile.id);

        // Registration stamped, password gone, member role granted
        let updated = registrations.find_by_id(registration.id).await.unwrap().unwrap();
        assert_eq!(updated.approved_by, Some(admin));
        assert!(updated.password.is_none());
        assert!(profiles.has_role(user.id, Role::Member).await.unwrap());

        // Welcome notification sent
        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient(), "new@school.edu");
    }

    #[tokio::test]
    async fn test_reapproval_is_not_found_and_creates_nothing() {
        let h = harness().await;
        let registrations = PendingRegistrationRepository::new(&h.db);
        let admin = Uuid::new_v4();

        let registration = registrations
            .insert(sample_registration("new@school.edu", "Acme College"))
            .await
            .unwrap();

        h.service.approve(registration.id, admin, None).await.unwrap();
        let users_after_first = h.identity.user_count();

        let second = h.service.approve(registration.id, admin, None).await;
        assert!(matches!(second, Err(WorkflowError::NotFound(_))));
        assert_eq!(h.identity.user_count(), users_after_first);

        let organizations = OrganizationRepository::new(&h.db);
        assert!(
            organizations
                .find_by_name("Acme College")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_approve_reuses_existing_identity() {
        let h = harness().await;
        let registrations = PendingRegistrationRepository::new(&h.db);

        let existing = h
            .identity
            .seed_user("known@school.edu", json!({"title": "CIO"}));

        let registration = registrations
            .insert(sample_registration("known@school.edu", "Known College"))
            .await
            .unwrap();

        let outcome = h
            .service
            .approve(registration.id, Uuid::new_v4(), None)
            .await
            .unwrap();

        assert_eq!(outcome.user_id, existing);
        assert_eq!(h.identity.user_count(), 1);

        // Metadata merged rather than replaced
        let user = h.identity.user_by_email("known@school.edu").unwrap();
        assert_eq!(user.user_metadata["organization_name"], "Known College");
    }

    #[tokio::test]
    async fn test_approve_conflicts_on_foreign_organization_name() {
        let h = harness().await;
        let registrations = PendingRegistrationRepository::new(&h.db);

        let first = registrations
            .insert(sample_registration("owner@one.edu", "Shared Name"))
            .await
            .unwrap();
        h.service
            .approve(first.id, Uuid::new_v4(), None)
            .await
            .unwrap();

        // The first registration is no longer pending, so intake accepts a
        // second application for the same name; approval is where the
        // store's uniqueness answers.
        let rival = registrations
            .insert(sample_registration("rival@two.edu", "Shared Name"))
            .await
            .unwrap();

        let result = h.service.approve(rival.id, Uuid::new_v4(), None).await;
        assert!(matches!(result, Err(WorkflowError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_identity_failure_aborts_before_store_mutation() {
        let h = harness().await;
        let registrations = PendingRegistrationRepository::new(&h.db);

        let registration = registrations
            .insert(sample_registration("new@school.edu", "Acme College"))
            .await
            .unwrap();
        h.identity.arm_create_failure();

        let result = h.service.approve(registration.id, Uuid::new_v4(), None).await;
        assert!(matches!(result, Err(WorkflowError::Identity(_))));

        // Registration still pending and re-approvable
        let still_pending = registrations
            .fetch_pending_by_id(registration.id)
            .await
            .unwrap();
        assert!(still_pending.is_some());

        let organizations = OrganizationRepository::new(&h.db);
        assert!(
            organizations
                .find_by_name("Acme College")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_approval() {
        let h = harness().await;
        let registrations = PendingRegistrationRepository::new(&h.db);

        let registration = registrations
            .insert(sample_registration("new@school.edu", "Acme College"))
            .await
            .unwrap();
        h.mailer.arm_failure();

        let outcome = h
            .service
            .approve(registration.id, Uuid::new_v4(), None)
            .await
            .unwrap();

        assert!(h.identity.user_by_email("new@school.edu").is_some());
        assert!(h.mailer.sent().is_empty());

        let organizations = OrganizationRepository::new(&h.db);
        let organization = organizations
            .find_by_id(outcome.organization_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(organization.membership_status, MembershipStatus::Active);
    }

    #[tokio::test]
    async fn test_reject_stamps_reason_and_guards_reprocessing() {
        let h = harness().await;
        let registrations = PendingRegistrationRepository::new(&h.db);
        let admin = Uuid::new_v4();

        let registration = registrations
            .insert(sample_registration("new@school.edu", "Acme College"))
            .await
            .unwrap();

        h.service
            .reject(registration.id, admin, Some("incomplete application".to_string()))
            .await
            .unwrap();

        let updated = registrations.find_by_id(registration.id).await.unwrap().unwrap();
        assert_eq!(
            updated.rejection_reason.as_deref(),
            Some("incomplete application")
        );
        assert_eq!(updated.approved_by, Some(admin));

        // Neither approval nor a second rejection may touch it again
        assert!(matches!(
            h.service.approve(registration.id, admin, None).await,
            Err(WorkflowError::NotFound(_))
        ));
        assert!(matches!(
            h.service.reject(registration.id, admin, None).await,
            Err(WorkflowError::NotFound(_))
        ));
        assert_eq!(h.identity.user_count(), 0);
    }
}
