//! # Authentication and Authorization
//!
//! Admin bearer authentication for protected API endpoints, plus the acting
//! admin identity carried on the optional `X-Admin-Id` header.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized, unauthorized_with_trace_id, validation_error};
use crate::server::AppState;
use crate::telemetry::TraceContext;

/// The admin acting on a request, when the caller identified themselves.
///
/// Handlers that need an actor id prefer an explicit id in the request body
/// and fall back to this header-derived value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminActor(pub Option<Uuid>);

/// Marker type for authenticated admin requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminAuth;

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Authentication middleware that validates bearer tokens on admin routes.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = request.headers().clone();

    // Extract trace_id from request context for consistent error responses
    let trace_id = request
        .extensions()
        .get::<TraceContext>()
        .map(|ctx| ctx.trace_id.clone());

    let token = extract_bearer_token_with_trace_id(&headers, trace_id)?;
    validate_token(&config, token)?;

    let actor = extract_admin_actor(&headers)?;
    if let Some(admin_id) = actor.0 {
        tracing::info!(admin_id = %admin_id, "Authenticated admin request");
    }

    let mut request = request;
    request.extensions_mut().insert(actor);
    request.extensions_mut().insert(AdminAuth);

    Ok(next.run(request).await)
}

fn extract_bearer_token_with_trace_id(
    headers: &HeaderMap,
    trace_id: Option<String>,
) -> Result<&str, ApiError> {
    let trace_id_clone = trace_id.clone();

    headers
        .get(AUTHORIZATION)
        .ok_or_else(|| {
            if let Some(trace_id_val) = trace_id_clone {
                unauthorized_with_trace_id(Some("Missing Authorization header"), trace_id_val)
            } else {
                unauthorized(Some("Missing Authorization header"))
            }
        })
        .and_then(|value| {
            let trace_id_clone2 = trace_id.clone();
            value.to_str().map_err(|_| {
                if let Some(trace_id_val) = trace_id_clone2 {
                    unauthorized_with_trace_id(Some("Invalid Authorization header"), trace_id_val)
                } else {
                    unauthorized(Some("Invalid Authorization header"))
                }
            })
        })
        .and_then(|header| {
            header.strip_prefix("Bearer ").ok_or_else(|| {
                if let Some(trace_id_val) = trace_id {
                    unauthorized_with_trace_id(
                        Some("Authorization header must use Bearer scheme"),
                        trace_id_val,
                    )
                } else {
                    unauthorized(Some("Authorization header must use Bearer scheme"))
                }
            })
        })
}

fn validate_token(config: &AppConfig, token: &str) -> Result<(), ApiError> {
    let is_valid = config
        .admin_tokens
        .iter()
        .any(|configured| ConstantTimeEq::ct_eq(token.as_bytes(), configured.as_bytes()).into());

    if is_valid {
        Ok(())
    } else {
        Err(unauthorized(Some("Invalid bearer token")))
    }
}

fn extract_admin_actor(headers: &HeaderMap) -> Result<AdminActor, ApiError> {
    let Some(header_value) = headers.get("X-Admin-Id") else {
        return Ok(AdminActor(None));
    };

    let raw = header_value.to_str().map_err(|_| {
        validation_error(
            "Invalid admin header",
            serde_json::json!({ "X-Admin-Id": "Header must be valid UTF-8" }),
        )
    })?;

    raw.parse::<Uuid>()
        .map(|id| AdminActor(Some(id)))
        .map_err(|_| {
            validation_error(
                "Invalid admin ID",
                serde_json::json!({ "X-Admin-Id": "Must be a valid UUID" }),
            )
        })
}

/// OpenAPI header parameter for X-Admin-Id
#[derive(Debug, Serialize, Deserialize, IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Header)]
pub struct AdminHeader {
    /// Admin identifier (UUID) recorded as the acting reviewer when the
    /// request body does not carry one
    #[serde(rename = "X-Admin-Id")]
    #[param(rename = "X-Admin-Id", value_type = String)]
    pub admin_id: String,
}

impl<S> FromRequestParts<S> for AdminActor
where
    Arc<AppConfig>: FromRef<S>,
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminActor>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Admin authentication required")))
    }
}

impl<S> FromRequestParts<S> for AdminAuth
where
    Arc<AppConfig>: FromRef<S>,
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminAuth>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Admin authentication required")))
    }
}
