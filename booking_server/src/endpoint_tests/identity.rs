//! Tests for the identity middleware that fronts the `/api` scope: token handling,
//! principal resolution and federated provisioning, exercised through a real route.

use std::sync::Arc;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use booking_engine::{
    db_types::{FullStaff, Permission, Staff, StaffAccess},
    StaffApi,
};
use chrono::{Days, Duration, Utc};
use idp_tools::{IdpApiError, KeyResolver};
use log::info;

use super::{
    helpers::{access, api_request, full_staff, get_auth_config, issue_token, known_staff, local_verifier, ts},
    mocks::{MockAuthManager, MockProvider, MockStaffManager},
};
use crate::{
    auth::{JwtClaims, TokenScope, TokenVerifier},
    routes::MyProfileRoute,
};

#[actix_web::test]
async fn no_token_means_anonymous_and_identity_routes_reject_it() {
    let _ = env_logger::try_init().ok();
    let (status, body) = api_request(
        TestRequest::get().uri("/api/me"),
        "",
        local_verifier(),
        MockAuthManager::new(),
        configure_profile(MockStaffManager::new()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication required"}"#);
}

#[actix_web::test]
async fn an_unusable_token_is_treated_as_anonymous() {
    let _ = env_logger::try_init().ok();
    let (status, body) = api_request(
        TestRequest::get().uri("/api/me"),
        "made-up-nonsense",
        local_verifier(),
        MockAuthManager::new(),
        configure_profile(MockStaffManager::new()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication required"}"#);
}

#[actix_web::test]
async fn an_expired_token_is_treated_as_anonymous() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(JwtClaims::access("aiko@example.com"), Utc::now() - Days::new(1));
    let (status, body) = api_request(
        TestRequest::get().uri("/api/me"),
        &token,
        local_verifier(),
        MockAuthManager::new(),
        configure_profile(MockStaffManager::new()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication required"}"#);
}

#[actix_web::test]
async fn a_reset_token_never_grants_api_access() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(JwtClaims::reset("aiko@example.com"), Utc::now() + Duration::minutes(30));
    let (status, body) = api_request(
        TestRequest::get().uri("/api/me"),
        &token,
        local_verifier(),
        MockAuthManager::new(),
        configure_profile(MockStaffManager::new()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication required"}"#);
}

#[actix_web::test]
async fn a_valid_token_resolves_to_the_staff_profile() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(JwtClaims::access("aiko@example.com"), Utc::now() + Duration::minutes(30));
    let mut staff_manager = MockStaffManager::new();
    staff_manager.expect_fetch_staff_by_id().returning(|id| Ok(Some(full_staff(id, "aiko@example.com"))));
    let auth_manager = known_staff(5, access(&["manager"], &[Permission::General]));
    let (status, body) = api_request(
        TestRequest::get().uri("/api/me"),
        &token,
        local_verifier(),
        auth_manager,
        configure_profile(staff_manager),
    )
    .await;
    info!("Response body: {body}");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, STAFF_JSON);
}

#[actix_web::test]
async fn a_token_for_a_vanished_staff_member_is_anonymous() {
    let _ = env_logger::try_init().ok();
    // An email subject is never provisioned; no create_federated_staff expectation is set,
    // so the mock would panic if the middleware tried.
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_fetch_staff_by_email().returning(|_| Ok(None));
    let token = issue_token(JwtClaims::access("ghost@example.com"), Utc::now() + Duration::minutes(30));
    let (status, body) = api_request(
        TestRequest::get().uri("/api/me"),
        &token,
        local_verifier(),
        auth_manager,
        configure_profile(MockStaffManager::new()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication required"}"#);
}

#[actix_web::test]
async fn an_unknown_federated_subject_is_provisioned_on_first_sight() {
    let _ = env_logger::try_init().ok();
    let claims = JwtClaims {
        sub: "idp|7f3a".to_string(),
        scope: TokenScope::Access,
        email: Some("newhire@example.com".parse().unwrap()),
        name: Some("New Hire".to_string()),
    };
    let token = issue_token(claims, Utc::now() + Duration::minutes(30));
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_fetch_staff_by_external_id().returning(|_| Ok(None));
    auth_manager
        .expect_create_federated_staff()
        .withf(|staff| {
            staff.external_id == "idp|7f3a" &&
                staff.mail_address.as_ref().map(|e| e.as_str()) == Some("newhire@example.com")
        })
        .returning(|_| Ok(provisioned_staff()));
    auth_manager.expect_fetch_access_for_staff().returning(|_| Ok(StaffAccess::default()));
    let mut staff_manager = MockStaffManager::new();
    staff_manager
        .expect_fetch_staff_by_id()
        .returning(|_| Ok(Some(FullStaff { staff: provisioned_staff(), profile: None })));
    let (status, body) = api_request(
        TestRequest::get().uri("/api/me"),
        &token,
        local_verifier(),
        auth_manager,
        configure_profile(staff_manager),
    )
    .await;
    info!("Response body: {body}");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""external_id":"idp|7f3a""#), "was: {body}");
    assert!(body.contains(r#""store_id":null"#), "was: {body}");
    assert!(body.contains(r#""profile":null"#), "was: {body}");
}

#[actix_web::test]
async fn a_provider_outage_is_a_503_not_a_401() {
    let _ = env_logger::try_init().ok();
    let mut provider = MockProvider::new();
    provider.expect_fetch_published_keys().returning(|| {
        Err(IdpApiError::QueryError { status: 502, message: "upstream connect error".to_string() })
    });
    let verifier = TokenVerifier::new(Arc::new(KeyResolver::new(provider, get_auth_config().jwt_secret)));
    let token = issue_token(JwtClaims::access("aiko@example.com"), Utc::now() + Duration::minutes(30));
    let (status, body) = api_request(
        TestRequest::get().uri("/api/me"),
        &token,
        verifier,
        MockAuthManager::new(),
        configure_profile(MockStaffManager::new()),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, r#"{"error":"Authentication service unavailable"}"#);
}

fn configure_profile(staff_manager: MockStaffManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(StaffApi::new(staff_manager)))
            .service(MyProfileRoute::<MockStaffManager>::new());
    }
}

fn provisioned_staff() -> Staff {
    Staff {
        id: 9,
        store_id: None,
        role_id: None,
        external_id: Some("idp|7f3a".to_string()),
        created_at: ts(),
        updated_at: ts(),
    }
}

const STAFF_JSON: &str = r#"{"id":5,"store_id":1,"role_id":2,"external_id":null,"created_at":"2024-06-01T09:00:00Z","updated_at":"2024-06-01T09:00:00Z","profile":{"id":5,"staff_id":5,"name":"Aiko Tanaka","name_ruby":"タナカ アイコ","mail_address":"aiko@example.com","created_at":"2024-06-01T09:00:00Z","updated_at":"2024-06-01T09:00:00Z"}}"#;
