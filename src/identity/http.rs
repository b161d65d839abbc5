//! HTTP client for the Identity Provider's admin API.
//!
//! Talks to a GoTrue-style admin surface using a service-role key. All
//! requests carry the key as a bearer token; non-2xx responses are surfaced
//! as [`IdentityError::UpstreamStatus`] with a truncated body snippet.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use url::Url;
use uuid::Uuid;

use super::{CreateUser, IdentityError, IdentityProvider, IdentityUser, merge_metadata};

const BODY_SNIPPET_MAX_CHARS: usize = 200;

/// Identity Provider client backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    base_url: Url,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct UserListResponse {
    #[serde(default)]
    users: Vec<IdentityUser>,
}

impl HttpIdentityProvider {
    pub fn new(base_url: Url, service_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            service_key,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        self.base_url
            .join(path)
            .map_err(|err| IdentityError::Unexpected(format!("invalid endpoint path: {}", err)))
    }

    async fn check_status(response: Response) -> Result<Response, IdentityError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let snippet = if body.chars().count() > BODY_SNIPPET_MAX_CHARS {
            let truncated: String = body.chars().take(BODY_SNIPPET_MAX_CHARS).collect();
            format!("{}...", truncated)
        } else {
            body
        };

        Err(IdentityError::UpstreamStatus {
            status: status.as_u16(),
            body: snippet,
        })
    }

    async fn get_user(&self, user_id: Uuid) -> Result<IdentityUser, IdentityError> {
        let url = self.endpoint(&format!("admin/users/{}", user_id))?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(IdentityError::UserNotFound(user_id));
        }

        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<IdentityUser>, IdentityError> {
        let mut url = self.endpoint("admin/users")?;
        url.query_pairs_mut().append_pair("email", email);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.service_key)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let listing: UserListResponse = response.json().await?;
        Ok(listing
            .users
            .into_iter()
            .find(|user| user.email.eq_ignore_ascii_case(email)))
    }

    async fn create_user(&self, request: CreateUser) -> Result<IdentityUser, IdentityError> {
        let url = self.endpoint("admin/users")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.service_key)
            .json(&json!({
                "email": request.email,
                "password": request.password,
                "email_confirm": request.email_confirmed,
                "user_metadata": request.metadata,
            }))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        Ok(response.json().await?)
    }

    async fn update_user_metadata(
        &self,
        user_id: Uuid,
        metadata: JsonValue,
    ) -> Result<IdentityUser, IdentityError> {
        // The admin API replaces user_metadata wholesale, so merge with the
        // current value client-side to keep update semantics additive.
        let existing = self.get_user(user_id).await?;
        let merged = merge_metadata(&existing.user_metadata, &metadata);

        let url = self.endpoint(&format!("admin/users/{}", user_id))?;
        let response = self
            .client
            .put(url)
            .bearer_auth(&self.service_key)
            .json(&json!({ "user_metadata": merged }))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        Ok(response.json().await?)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        let url = self.endpoint(&format!("admin/users/{}", user_id))?;
        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(IdentityError::UserNotFound(user_id));
        }

        Self::check_status(response).await?;
        Ok(())
    }

    async fn send_magic_link(&self, email: &str) -> Result<(), IdentityError> {
        let url = self.endpoint("recover")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.service_key)
            .json(&json!({ "email": email }))
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> HttpIdentityProvider {
        let base_url = Url::parse(&server.uri()).unwrap().join("/").unwrap();
        HttpIdentityProvider::new(base_url, "service-key".to_string())
    }

    #[tokio::test]
    async fn test_find_user_by_email_match() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/admin/users"))
            .and(query_param("email", "cio@school.edu"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{
                    "id": user_id,
                    "email": "cio@school.edu",
                    "email_confirmed": true
                }]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let found = provider
            .find_user_by_email("cio@school.edu")
            .await
            .unwrap()
            .expect("user should be found");

        assert_eq!(found.id, user_id);
        assert!(found.email_confirmed);
    }

    #[tokio::test]
    async fn test_find_user_by_email_no_match() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "users": [] })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let found = provider.find_user_by_email("nobody@school.edu").await.unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_create_user_posts_payload() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/admin/users"))
            .and(body_partial_json(json!({
                "email": "new@school.edu",
                "email_confirm": true
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": user_id,
                "email": "new@school.edu",
                "email_confirmed": true
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let created = provider
            .create_user(CreateUser {
                email: "new@school.edu".to_string(),
                password: "registrant-chosen".to_string(),
                email_confirmed: true,
                metadata: json!({"organization_name": "Acme College"}),
            })
            .await
            .unwrap();

        assert_eq!(created.id, user_id);
    }

    #[tokio::test]
    async fn test_update_user_metadata_merges() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path(format!("/admin/users/{}", user_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": user_id,
                "email": "cio@school.edu",
                "user_metadata": {"first_name": "Pat", "title": "CIO"}
            })))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path(format!("/admin/users/{}", user_id)))
            .and(body_partial_json(json!({
                "user_metadata": {"first_name": "Pat", "title": "CTO"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": user_id,
                "email": "cio@school.edu",
                "user_metadata": {"first_name": "Pat", "title": "CTO"}
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let updated = provider
            .update_user_metadata(user_id, json!({"title": "CTO"}))
            .await
            .unwrap();

        assert_eq!(updated.user_metadata["first_name"], "Pat");
        assert_eq!(updated.user_metadata["title"], "CTO");
    }

    #[tokio::test]
    async fn test_delete_user_not_found() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();

        Mock::given(method("DELETE"))
            .and(path(format!("/admin/users/{}", user_id)))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let result = provider.delete_user(user_id).await;

        assert!(matches!(result, Err(IdentityError::UserNotFound(id)) if id == user_id));
    }

    #[tokio::test]
    async fn test_upstream_error_carries_status_and_snippet() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/admin/users"))
            .respond_with(ResponseTemplate::new(422).set_body_string("password too weak"))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let result = provider
            .create_user(CreateUser {
                email: "new@school.edu".to_string(),
                password: "x".to_string(),
                email_confirmed: true,
                metadata: JsonValue::Null,
            })
            .await;

        match result {
            Err(IdentityError::UpstreamStatus { status, body }) => {
                assert_eq!(status, 422);
                assert!(body.contains("password too weak"));
            }
            other => panic!("expected upstream status error, got {:?}", other),
        }
    }
}
