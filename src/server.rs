//! # Server Configuration
//!
//! Router assembly and startup for the Membership API. Public intake and the
//! member directory are open; review-queue and decision routes sit behind the
//! admin bearer middleware.

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth;
use crate::config::AppConfig;
use crate::handlers;
use crate::identity::IdentityProvider;
use crate::mail::NotificationDispatcher;
use crate::telemetry::{self, TraceContext};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub identity: Arc<dyn IdentityProvider>,
    pub mailer: Arc<dyn NotificationDispatcher>,
}

/// Assigns each request a correlation id, exposed to handlers through the
/// task-local trace context and echoed back in `X-Trace-Id`.
pub async fn trace_context_middleware(mut request: Request, next: Next) -> Response {
    let context = TraceContext::generate();
    let trace_id = context.trace_id.clone();

    request.extensions_mut().insert(context.clone());

    let mut response = telemetry::with_trace_context(context, next.run(request)).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert("X-Trace-Id", value);
    }

    response
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let admin = middleware::from_fn_with_state(Arc::clone(&state.config), auth::auth_middleware);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/api/v1/registrations",
            post(handlers::registrations::create_registration).merge(
                get(handlers::registrations::list_pending_registrations)
                    .route_layer(admin.clone()),
            ),
        )
        .route(
            "/api/v1/registrations/{id}/approve",
            post(handlers::registrations::approve_registration).route_layer(admin.clone()),
        )
        .route(
            "/api/v1/registrations/{id}/reject",
            post(handlers::registrations::reject_registration).route_layer(admin.clone()),
        )
        .route(
            "/api/v1/reassignments/{id}/approve",
            post(handlers::reassignments::approve_reassignment).route_layer(admin.clone()),
        )
        .route(
            "/api/v1/reassignments/{id}/reject",
            post(handlers::reassignments::reject_reassignment).route_layer(admin.clone()),
        )
        .route(
            "/api/v1/organizations",
            get(handlers::organizations::list_organizations),
        )
        .route(
            "/api/v1/organizations/{id}",
            get(handlers::organizations::get_organization),
        )
        .route(
            "/api/v1/profiles/orphaned",
            get(handlers::profiles::list_orphaned_profiles).route_layer(admin),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(trace_context_middleware))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
    identity: Arc<dyn IdentityProvider>,
    mailer: Arc<dyn NotificationDispatcher>,
) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let profile = config.profile.clone();

    let state = AppState {
        db,
        config: Arc::new(config),
        identity,
        mailer,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Static admin token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::registrations::create_registration,
        crate::handlers::registrations::list_pending_registrations,
        crate::handlers::registrations::approve_registration,
        crate::handlers::registrations::reject_registration,
        crate::handlers::reassignments::approve_reassignment,
        crate::handlers::reassignments::reject_reassignment,
        crate::handlers::organizations::list_organizations,
        crate::handlers::organizations::get_organization,
        crate::handlers::profiles::list_orphaned_profiles,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthResponse,
            crate::handlers::registrations::RegistrationIntakeDto,
            crate::handlers::registrations::RegistrationCreatedDto,
            crate::handlers::registrations::RegistrationSummaryDto,
            crate::handlers::registrations::ApproveRegistrationDto,
            crate::handlers::registrations::ApprovalResponseDto,
            crate::handlers::registrations::RejectRegistrationDto,
            crate::handlers::registrations::SuccessDto,
            crate::handlers::reassignments::ReassignmentDecisionDto,
            crate::handlers::reassignments::ReassignmentResponseDto,
            crate::handlers::organizations::OrganizationDirectoryDto,
            crate::handlers::profiles::OrphanedProfileDto,
            crate::models::pending_registration::PriorityLevel,
            crate::error::ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Membership API",
        description = "Consortium membership registration and review API",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
