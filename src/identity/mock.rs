//! In-memory Identity Provider used by workflow tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::{CreateUser, IdentityError, IdentityProvider, IdentityUser, merge_metadata};

/// Fake provider keeping users in memory. Individual operations can be armed
/// to fail so tests can exercise the critical-vs-best-effort error split.
#[derive(Debug, Default)]
pub struct MockIdentityProvider {
    users: Mutex<Vec<IdentityUser>>,
    magic_links: Mutex<Vec<String>>,
    fail_create: Mutex<bool>,
    fail_magic_link: Mutex<bool>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed an existing user, returning its id.
    pub fn seed_user(&self, email: &str, metadata: JsonValue) -> Uuid {
        let id = Uuid::new_v4();
        self.users.lock().unwrap().push(IdentityUser {
            id,
            email: email.to_string(),
            user_metadata: metadata,
            email_confirmed: true,
        });
        id
    }

    pub fn arm_create_failure(&self) {
        *self.fail_create.lock().unwrap() = true;
    }

    pub fn arm_magic_link_failure(&self) {
        *self.fail_magic_link.lock().unwrap() = true;
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn user_by_email(&self, email: &str) -> Option<IdentityUser> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    pub fn magic_links_sent(&self) -> Vec<String> {
        self.magic_links.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<IdentityUser>, IdentityError> {
        Ok(self.user_by_email(email))
    }

    async fn create_user(&self, request: CreateUser) -> Result<IdentityUser, IdentityError> {
        if *self.fail_create.lock().unwrap() {
            return Err(IdentityError::Unexpected(
                "create_user armed to fail".to_string(),
            ));
        }

        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|user| user.email.eq_ignore_ascii_case(&request.email))
        {
            return Err(IdentityError::UpstreamStatus {
                status: 422,
                body: "email already registered".to_string(),
            });
        }

        let user = IdentityUser {
            id: Uuid::new_v4(),
            email: request.email,
            user_metadata: request.metadata,
            email_confirmed: request.email_confirmed,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_user_metadata(
        &self,
        user_id: Uuid,
        metadata: JsonValue,
    ) -> Result<IdentityUser, IdentityError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|user| user.id == user_id)
            .ok_or(IdentityError::UserNotFound(user_id))?;

        user.user_metadata = merge_metadata(&user.user_metadata, &metadata);
        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|user| user.id != user_id);

        if users.len() == before {
            return Err(IdentityError::UserNotFound(user_id));
        }
        Ok(())
    }

    async fn send_magic_link(&self, email: &str) -> Result<(), IdentityError> {
        if *self.fail_magic_link.lock().unwrap() {
            return Err(IdentityError::Unexpected(
                "send_magic_link armed to fail".to_string(),
            ));
        }

        self.magic_links.lock().unwrap().push(email.to_string());
        Ok(())
    }
}
