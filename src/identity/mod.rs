//! # Identity Provider Client
//!
//! Abstraction over the external authentication service that owns user
//! credentials and sessions. The workflows only need user provisioning,
//! metadata updates, deletion, and the magic-link onboarding email; session
//! handling stays entirely inside the provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

pub mod http;
#[cfg(test)]
pub mod mock;

pub use http::HttpIdentityProvider;

/// A user record as the Identity Provider reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: Uuid,
    pub email: String,
    /// Free-form application metadata attached to the user
    #[serde(default)]
    pub user_metadata: JsonValue,
    /// Whether the email address has been confirmed
    #[serde(default)]
    pub email_confirmed: bool,
}

/// Parameters for provisioning a new Identity Provider user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    /// Provision the user with the email already confirmed, skipping the
    /// confirmation round-trip (admin-created accounts only)
    pub email_confirmed: bool,
    pub metadata: JsonValue,
}

/// Errors returned by Identity Provider operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity provider returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
    #[error("user {0} not found")]
    UserNotFound(Uuid),
    #[error("{0}")]
    Unexpected(String),
}

/// Client interface to the external Identity Provider.
///
/// `update_user_metadata` merges rather than replaces: keys absent from the
/// patch keep their existing values.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn find_user_by_email(&self, email: &str)
    -> Result<Option<IdentityUser>, IdentityError>;

    async fn create_user(&self, request: CreateUser) -> Result<IdentityUser, IdentityError>;

    async fn update_user_metadata(
        &self,
        user_id: Uuid,
        metadata: JsonValue,
    ) -> Result<IdentityUser, IdentityError>;

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError>;

    /// Send a magic-link (password recovery) email so the user can set
    /// credentials. Used as the onboarding path for reassigned contacts.
    async fn send_magic_link(&self, email: &str) -> Result<(), IdentityError>;
}

/// Shallow-merge `patch` into `base`. Object keys from `patch` win; `base`
/// keys absent from `patch` survive. Non-object inputs are replaced.
pub fn merge_metadata(base: &JsonValue, patch: &JsonValue) -> JsonValue {
    match (base, patch) {
        (JsonValue::Object(base_map), JsonValue::Object(patch_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in patch_map {
                merged.insert(key.clone(), value.clone());
            }
            JsonValue::Object(merged)
        }
        _ => patch.clone(),
    }
}
