//! # Reassignment Orchestrator
//!
//! Replaces an organization's primary contact by building a fresh identity,
//! profile, and organization row, then tearing the old rows down in foreign
//! key order. The unique `organizations.name` constraint arbitrates name
//! ownership: a collision triggers a two-phase swap through a temporary name
//! that is renamed to the final name once the old row is gone.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use sea_orm::DatabaseConnection;
use serde_json::{Value as JsonValue, json};
use tokio::time::sleep;
use uuid::Uuid;

use crate::approval::generate_password;
use crate::config::WorkflowConfig;
use crate::error::{RepositoryError, WorkflowError};
use crate::identity::{CreateUser, IdentityProvider};
use crate::mail::{Notification, NotificationDispatcher};
use crate::models::organization::{MembershipStatus, Model as OrganizationModel};
use crate::models::profile::Model as ProfileModel;
use crate::repositories::{
    NewOrganization, NewProfile, OrganizationRepository, ProfileRepository,
    ReassignmentRequestRepository,
};

/// Result of a successful reassignment.
#[derive(Debug, Clone)]
pub struct ReassignmentOutcome {
    pub new_organization_id: Uuid,
}

/// Orchestrates reassignment approval and rejection.
pub struct ReassignmentService {
    db: DatabaseConnection,
    identity: Arc<dyn IdentityProvider>,
    mailer: Arc<dyn NotificationDispatcher>,
    workflow: WorkflowConfig,
}

fn temporary_name(final_name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-transfer-{}", final_name, &suffix[..8])
}

fn json_str(data: &JsonValue, key: &str) -> Option<String> {
    data.get(key)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

impl ReassignmentService {
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

    /// Approve a pending reassignment request.
    ///
    /// The request is repointed to the replacement organization before any
    /// deletion so its foreign key never dangles. Cleanup steps are
    /// individually best-effort; a failed deletion is logged and the rest
    /// still run.
    pub async fn approve(
        &self,
        request_id: Uuid,
        admin_user_id: Option<Uuid>,
    ) -> Result<ReassignmentOutcome, WorkflowError> {
        let requests = ReassignmentRequestRepository::new(&self.db);
        let profiles = ProfileRepository::new(&self.db);
        let organizations = OrganizationRepository::new(&self.db);

        let request = requests.fetch_pending_by_id(request_id).await?.ok_or_else(|| {
            WorkflowError::NotFound(
                "Reassignment request not found or already processed".to_string(),
            )
        })?;

        let old_organization = organizations
            .find_by_id(request.organization_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound("Organization not found".to_string()))?;
        let old_profile = profiles
            .find_by_id(old_organization.contact_person_id)
            .await?;

        tracing::info!(
            request_id = %request.id,
            organization_id = %old_organization.id,
            new_contact = %request.new_contact_email,
            "Approving reassignment"
        );

        let new_profile = self.resolve_new_contact(&profiles, &request.new_contact_email, request.new_contact_data.as_ref()).await?;

        // Replacement row starts from pending membership fields, never a
        // copy of the old row's status.
        let final_name = json_str(&request.new_organization_data, "name")
            .unwrap_or_else(|| old_organization.name.clone());
        let (new_organization, used_temporary_name) = self
            .insert_replacement(
                &organizations,
                &request.new_organization_data,
                &final_name,
                new_profile.id,
            )
            .await?;

        // Repoint before any deletion.
        requests
            .mark_approved(request.clone(), admin_user_id, new_organization.id)
            .await?;

        self.cleanup_old_rows(&request.id, &old_organization, old_profile.as_ref())
            .await;

        let new_organization = if used_temporary_name {
            self.rename_to_completion(&organizations, new_organization, &final_name)
                .await
        } else {
            new_organization
        };

        if let Err(err) = self
            .mailer
            .send(&Notification::ProfileUpdateApproved {
                recipient_email: request.new_contact_email.clone(),
                organization_name: new_organization.name.clone(),
            })
            .await
        {
            tracing::warn!(
                recipient = %request.new_contact_email,
                error = %err,
                "Failed to send reassignment notification"
            );
        }

        counter!("reassignments_approved_total").increment(1);
        tracing::info!(
            request_id = %request.id,
            new_organization_id = %new_organization.id,
            "Reassignment approved"
        );

        Ok(ReassignmentOutcome {
            new_organization_id: new_organization.id,
        })
    }

    /// Reject a pending reassignment request.
    pub async fn reject(
        &self,
        request_id: Uuid,
        admin_user_id: Option<Uuid>,
    ) -> Result<(), WorkflowError> {
        let requests = ReassignmentRequestRepository::new(&self.db);

        let request = requests.fetch_pending_by_id(request_id).await?.ok_or_else(|| {
            WorkflowError::NotFound(
                "Reassignment request not found or already processed".to_string(),
            )
        })?;

        requests.mark_rejected(request, admin_user_id).await?;

        counter!("reassignments_rejected_total").increment(1);
        tracing::info!(request_id = %request_id, "Reassignment rejected");
        Ok(())
    }

    /// Reuse the profile matching the new contact email, or provision the
    /// identity and profile and send the magic-link onboarding email.
    async fn resolve_new_contact(
        &self,
        profiles: &ProfileRepository<'_>,
        email: &str,
        contact_data: Option<&JsonValue>,
    ) -> Result<ProfileModel, WorkflowError> {
        if let Some(existing) = profiles.find_by_email(email).await? {
            tracing::info!(profile_id = %existing.id, "Reusing existing contact profile");
            return Ok(existing);
        }

        let empty = json!({});
        let contact = contact_data.unwrap_or(&empty);

        let user = match self.identity.find_user_by_email(email).await? {
            Some(existing) => existing,
            None => {
                self.identity
                    .create_user(CreateUser {
                        email: email.to_string(),
                        password: generate_password(self.workflow.temp_password_length),
                        email_confirmed: true,
                        metadata: contact.clone(),
                    })
                    .await?
            }
        };

        let profile = profiles
            .insert(NewProfile {
                user_id: user.id,
                email: email.to_string(),
                first_name: json_str(contact, "first_name").unwrap_or_default(),
                last_name: json_str(contact, "last_name").unwrap_or_default(),
                phone: json_str(contact, "phone"),
                title: json_str(contact, "title"),
            })
            .await?;

        // Intended onboarding path for the reassigned contact, still only
        // best-effort.
        if let Err(err) = self.identity.send_magic_link(email).await {
            tracing::warn!(email = %email, error = %err, "Failed to send magic link");
        }

        Ok(profile)
    }

    async fn insert_replacement(
        &self,
        organizations: &OrganizationRepository<'_>,
        data: &JsonValue,
        final_name: &str,
        contact_person_id: Uuid,
    ) -> Result<(OrganizationModel, bool), WorkflowError> {
        let build = |name: String| NewOrganization {
            name,
            address: json_str(data, "address"),
            city: json_str(data, "city"),
            state: json_str(data, "state"),
            postal_code: json_str(data, "postal_code"),
            website: json_str(data, "website"),
            phone: json_str(data, "phone"),
            enrollment_size: data
                .get("enrollment_size")
                .and_then(JsonValue::as_i64)
                .map(|n| n as i32),
            membership_status: MembershipStatus::Pending,
            membership_start_date: None,
            annual_fee: None,
            contact_person_id,
        };

        match organizations.insert(build(final_name.to_string())).await {
            Ok(organization) => Ok((organization, false)),
            Err(RepositoryError::Conflict(_)) => {
                // The old row still owns the name; park the new row under a
                // temporary name until the old one is deleted.
                let temporary = temporary_name(final_name);
                tracing::info!(temporary = %temporary, "Name taken, using temporary name");
                let organization = organizations.insert(build(temporary)).await?;
                Ok((organization, true))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Delete the old organization's dependents in foreign key order, then
    /// the organization itself, the old user's roles, the old identity, and
    /// the old profile. Every step is best-effort.
    async fn cleanup_old_rows(
        &self,
        request_id: &Uuid,
        old_organization: &OrganizationModel,
        old_profile: Option<&ProfileModel>,
    ) {
        let organizations = OrganizationRepository::new(&self.db);
        let profiles = ProfileRepository::new(&self.db);
        let requests = ReassignmentRequestRepository::new(&self.db);
        let organization_id = old_organization.id;

        if let Err(err) = organizations.delete_invoices_for(organization_id).await {
            tracing::warn!(organization_id = %organization_id, error = %err, "Failed to delete invoices");
        }
        if let Err(err) = organizations.delete_invitations_for(organization_id).await {
            tracing::warn!(organization_id = %organization_id, error = %err, "Failed to delete invitations");
        }
        if let Err(err) = organizations
            .delete_software_entries_for(organization_id)
            .await
        {
            tracing::warn!(organization_id = %organization_id, error = %err, "Failed to delete software entries");
        }
        if let Err(err) = organizations.delete_edit_requests_for(organization_id).await {
            tracing::warn!(organization_id = %organization_id, error = %err, "Failed to delete edit requests");
        }
        if let Err(err) = requests
            .delete_others_for_organization(organization_id, *request_id)
            .await
        {
            tracing::warn!(organization_id = %organization_id, error = %err, "Failed to delete other reassignment requests");
        }
        if let Err(err) = organizations.delete(organization_id).await {
            tracing::warn!(organization_id = %organization_id, error = %err, "Failed to delete organization");
        }

        let Some(profile) = old_profile else {
            return;
        };

        if let Err(err) = profiles.delete_roles_for_user(profile.user_id).await {
            tracing::warn!(user_id = %profile.user_id, error = %err, "Failed to delete old contact roles");
        }
        if let Err(err) = self.identity.delete_user(profile.user_id).await {
            tracing::warn!(user_id = %profile.user_id, error = %err, "Failed to delete old identity");
        }
        if let Err(err) = profiles.delete(profile.id).await {
            tracing::warn!(profile_id = %profile.id, error = %err, "Failed to delete old profile");
        }
    }

    /// Rename the replacement organization to its final name, retrying with
    /// backoff. Exhaustion leaves the temporary name in place for manual
    /// repair; the operation still succeeds.
    async fn rename_to_completion(
        &self,
        organizations: &OrganizationRepository<'_>,
        organization: OrganizationModel,
        final_name: &str,
    ) -> OrganizationModel {
        let mut backoff = Duration::from_millis(self.workflow.rename_retry_backoff_ms);

        for attempt in 1..=self.workflow.rename_retry_attempts {
            match organizations
                .rename(organization.clone(), final_name.to_string())
                .await
            {
                Ok(renamed) => return renamed,
                Err(err) => {
                    tracing::warn!(
                        organization_id = %organization.id,
                        attempt,
                        error = %err,
                        "Rename to final name failed"
                    );
                    if attempt < self.workflow.rename_retry_attempts {
                        sleep(backoff).await;
                        backoff *= 2;
                    }
                }
            }
        }

        tracing::warn!(
            organization_id = %organization.id,
            temporary_name = %organization.name,
            final_name = %final_name,
            "Rename retries exhausted, temporary name left in place"
        );
        organization
    }
}
