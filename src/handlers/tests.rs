//! Router-level tests driving the full middleware and handler stack.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use crate::models::organization::MembershipStatus;
use crate::repositories::{
    NewOrganization, NewProfile, NewReassignmentRequest, OrganizationRepository, ProfileRepository,
    ReassignmentRequestRepository,
};
use crate::server::test_support::{TEST_ADMIN_TOKEN, TestHarness, test_harness};
use crate::server::{AppState, create_app};

async fn test_app() -> (Router, TestHarness) {
    let harness = test_harness().await;
    (create_app(harness.state.clone()), harness)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", TEST_ADMIN_TOKEN),
        )
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", TEST_ADMIN_TOKEN),
        )
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn intake_body(email: &str, organization_name: &str) -> Value {
    json!({
        "email": email,
        "first_name": "Pat",
        "last_name": "Jones",
        "title": "CIO",
        "organization_name": organization_name,
        "organization_city": "Springfield",
        "organization_state": "IL",
        "enrollment_size": 2400
    })
}

async fn seed_member(state: &AppState, email: &str, name: &str, activate: bool) -> (Uuid, Uuid) {
    let profiles = ProfileRepository::new(&state.db);
    let profile = profiles
        .insert(NewProfile {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            first_name: "Pat".to_string(),
            last_name: "Jones".to_string(),
            phone: None,
            title: Some("CIO".to_string()),
        })
        .await
        .unwrap();

    let organizations = OrganizationRepository::new(&state.db);
    let organization = organizations
        .insert(NewOrganization {
            name: name.to_string(),
            address: None,
            city: Some("Springfield".to_string()),
            state: Some("IL".to_string()),
            postal_code: None,
            website: Some("https://example.edu".to_string()),
            phone: None,
            enrollment_size: Some(2400),
            membership_status: MembershipStatus::Pending,
            membership_start_date: None,
            annual_fee: None,
            contact_person_id: profile.id,
        })
        .await
        .unwrap();

    let organization = if activate {
        organizations
            .activate(organization, Utc::now().date_naive(), Some(1500))
            .await
            .unwrap()
    } else {
        organization
    };

    (organization.id, profile.id)
}

#[tokio::test]
async fn root_returns_service_info() {
    let (app, _harness) = test_app().await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["name"], "membership-api");
}

#[tokio::test]
async fn health_reports_ok_with_live_database() {
    let (app, _harness) = test_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn responses_carry_trace_id_header() {
    let (app, _harness) = test_app().await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert!(response.headers().contains_key("X-Trace-Id"));
}

#[tokio::test]
async fn intake_creates_registration() {
    let (app, _harness) = test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/registrations",
            &intake_body("cio@acme.edu", "Acme College"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert!(body["id"].as_str().unwrap().parse::<Uuid>().is_ok());
}

#[tokio::test]
async fn intake_rejects_invalid_email() {
    let (app, _harness) = test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/registrations",
            &intake_body("not-an-email", "Acme College"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn intake_conflicts_on_duplicate_pending_email() {
    let (app, _harness) = test_app().await;

    let first = app
        .clone()
        .oneshot(post_json(
            "/api/v1/registrations",
            &intake_body("cio@acme.edu", "Acme College"),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(post_json(
            "/api/v1/registrations",
            &intake_body("cio@acme.edu", "Other College"),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn review_queue_requires_bearer_token() {
    let (app, _harness) = test_app().await;

    let response = app.oneshot(get("/api/v1/registrations")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn review_queue_lists_pending_registrations() {
    let (app, _harness) = test_app().await;

    app.clone()
        .oneshot(post_json(
            "/api/v1/registrations",
            &intake_body("cio@acme.edu", "Acme College"),
        ))
        .await
        .unwrap();

    let response = app.oneshot(admin_get("/api/v1/registrations")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let queue = body.as_array().unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["email"], "cio@acme.edu");
    // Password never leaves the intake row
    assert!(queue[0].get("password").is_none());
}

#[tokio::test]
async fn approve_activates_member_and_clears_queue() {
    let (app, harness) = test_app().await;
    let admin_id = Uuid::new_v4();

    let created = app
        .clone()
        .oneshot(post_json(
            "/api/v1/registrations",
            &intake_body("cio@acme.edu", "Acme College"),
        ))
        .await
        .unwrap();
    let registration_id = body_json(created).await["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(admin_post_json(
            &format!("/api/v1/registrations/{}/approve", registration_id),
            &json!({ "admin_user_id": admin_id, "selected_fee_tier": 1500 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let organization_id = body["organization_id"].as_str().unwrap().to_string();

    // The new member is now visible in the public directory
    let directory = app
        .clone()
        .oneshot(get(&format!("/api/v1/organizations/{}", organization_id)))
        .await
        .unwrap();
    assert_eq!(directory.status(), StatusCode::OK);
    let directory = body_json(directory).await;
    assert_eq!(directory["name"], "Acme College");

    // Queue is empty and a second decision is refused
    let queue = app
        .clone()
        .oneshot(admin_get("/api/v1/registrations"))
        .await
        .unwrap();
    assert_eq!(body_json(queue).await.as_array().unwrap().len(), 0);

    let again = app
        .oneshot(admin_post_json(
            &format!("/api/v1/registrations/{}/approve", registration_id),
            &json!({ "admin_user_id": admin_id }),
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    assert_eq!(harness.identity.user_count(), 1);
    assert_eq!(harness.mailer.sent().len(), 1);
}

#[tokio::test]
async fn reject_removes_registration_from_queue() {
    let (app, _harness) = test_app().await;

    let created = app
        .clone()
        .oneshot(post_json(
            "/api/v1/registrations",
            &intake_body("cio@acme.edu", "Acme College"),
        ))
        .await
        .unwrap();
    let registration_id = body_json(created).await["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(admin_post_json(
            &format!("/api/v1/registrations/{}/reject", registration_id),
            &json!({ "admin_user_id": Uuid::new_v4(), "reason": "Incomplete application" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let queue = app.oneshot(admin_get("/api/v1/registrations")).await.unwrap();
    assert_eq!(body_json(queue).await.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn directory_lists_only_active_organizations() {
    let (app, harness) = test_app().await;

    seed_member(&harness.state, "active@one.edu", "Active College", true).await;
    let (pending_id, _) =
        seed_member(&harness.state, "pending@two.edu", "Pending College", false).await;

    let response = app
        .clone()
        .oneshot(get("/api/v1/organizations"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["name"], "Active College");
    // Contact details stay out of the public payload
    assert!(listed[0].get("contact_person_id").is_none());

    let hidden = app
        .oneshot(get(&format!("/api/v1/organizations/{}", pending_id)))
        .await
        .unwrap();
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reassignment_approve_replaces_contact() {
    let (app, harness) = test_app().await;

    let (organization_id, old_profile_id) =
        seed_member(&harness.state, "old@acme.edu", "Acme College", true).await;
    harness.identity.seed_user("old@acme.edu", json!({}));

    let requests = ReassignmentRequestRepository::new(&harness.state.db);
    let request = requests
        .insert(NewReassignmentRequest {
            organization_id,
            new_contact_email: "new@acme.edu".to_string(),
            new_organization_data: json!({ "name": "Acme College", "city": "Springfield" }),
            new_contact_data: Some(json!({ "first_name": "Sam", "last_name": "Lee" })),
        })
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(admin_post_json(
            &format!("/api/v1/reassignments/{}/approve", request.id),
            &json!({ "admin_user_id": Uuid::new_v4() }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let new_organization_id = body["new_organization_id"]
        .as_str()
        .unwrap()
        .parse::<Uuid>()
        .unwrap();
    assert_ne!(new_organization_id, organization_id);

    let organizations = OrganizationRepository::new(&harness.state.db);
    assert!(
        organizations
            .find_by_id(organization_id)
            .await
            .unwrap()
            .is_none()
    );

    let profiles = ProfileRepository::new(&harness.state.db);
    assert!(profiles.find_by_id(old_profile_id).await.unwrap().is_none());
    assert!(
        profiles
            .find_by_email("new@acme.edu")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn reassignment_actor_falls_back_to_admin_header() {
    let (app, harness) = test_app().await;

    let (organization_id, _) =
        seed_member(&harness.state, "old@acme.edu", "Acme College", true).await;

    let requests = ReassignmentRequestRepository::new(&harness.state.db);
    let request = requests
        .insert(NewReassignmentRequest {
            organization_id,
            new_contact_email: "new@acme.edu".to_string(),
            new_organization_data: json!({ "name": "Acme College" }),
            new_contact_data: None,
        })
        .await
        .unwrap();

    let admin_id = Uuid::new_v4();
    let reject = Request::builder()
        .method("POST")
        .uri(format!("/api/v1/reassignments/{}/reject", request.id))
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", TEST_ADMIN_TOKEN),
        )
        .header("X-Admin-Id", admin_id.to_string())
        .body(Body::from(json!({}).to_string()))
        .unwrap();

    let response = app.oneshot(reject).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = requests.find_by_id(request.id).await.unwrap().unwrap();
    assert_eq!(stored.reviewed_by, Some(admin_id));
}

#[tokio::test]
async fn orphaned_profiles_listing_is_admin_only() {
    let (app, harness) = test_app().await;

    let profiles = ProfileRepository::new(&harness.state.db);
    profiles
        .insert(NewProfile {
            user_id: Uuid::new_v4(),
            email: "stranded@acme.edu".to_string(),
            first_name: "Sam".to_string(),
            last_name: "Lee".to_string(),
            phone: None,
            title: None,
        })
        .await
        .unwrap();
    seed_member(&harness.state, "owner@one.edu", "Active College", true).await;

    let denied = app
        .clone()
        .oneshot(get("/api/v1/profiles/orphaned"))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(admin_get("/api/v1/profiles/orphaned"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["email"], "stranded@acme.edu");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (app, _harness) = test_app().await;

    let response = app.oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["paths"]["/api/v1/registrations"].is_object());
    assert!(body["paths"]["/api/v1/reassignments/{id}/approve"].is_object());

    // Enums referenced by response DTOs must be registered as components
    let priority = &body["components"]["schemas"]["PriorityLevel"];
    assert!(priority.is_object());
    assert!(
        priority["enum"]
            .as_array()
            .unwrap()
            .contains(&json!("urgent"))
    );
}
