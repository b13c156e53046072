//! Tests for the permission and role guards that the route definitions attach to the
//! resource routes.

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use booking_engine::{db_types::Permission, StaffApi, StoreApi};
use chrono::{Duration, Utc};
use log::info;
use serde_json::json;

use super::{
    helpers::{access, api_request, issue_token, known_staff, local_verifier, store_record},
    mocks::{MockAuthManager, MockStaffManager, MockStoreManager},
};
use crate::{
    auth::JwtClaims,
    routes::{NewStoreRoute, RemoveStaffRoute, StoresRoute, UpdateStoreSettingsRoute},
};

fn token() -> String {
    issue_token(JwtClaims::access("aiko@example.com"), Utc::now() + Duration::minutes(30))
}

#[actix_web::test]
async fn guarded_routes_reject_anonymous_requests() {
    let _ = env_logger::try_init().ok();
    let (status, body) = api_request(
        TestRequest::get().uri("/api/stores"),
        "",
        local_verifier(),
        MockAuthManager::new(),
        configure_stores(MockStoreManager::new()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication required"}"#);
}

#[actix_web::test]
async fn a_granted_permission_opens_the_route() {
    let _ = env_logger::try_init().ok();
    let mut store_manager = MockStoreManager::new();
    store_manager.expect_fetch_stores().returning(|| Ok(vec![]));
    let auth_manager = known_staff(5, access(&["staff"], &[Permission::General]));
    let (status, body) = api_request(
        TestRequest::get().uri("/api/stores"),
        &token(),
        local_verifier(),
        auth_manager,
        configure_stores(store_manager),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn a_missing_permission_is_a_403() {
    let _ = env_logger::try_init().ok();
    // Creating stores needs the settings permission; this principal only holds general.
    let auth_manager = known_staff(5, access(&["staff"], &[Permission::General]));
    let (status, body) = api_request(
        TestRequest::post().uri("/api/stores").set_json(json!({"name": "Annex"})),
        &token(),
        local_verifier(),
        auth_manager,
        configure_stores(MockStoreManager::new()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient permissions"}"#);
}

#[actix_web::test]
async fn store_settings_can_only_be_changed_by_an_owner() {
    let _ = env_logger::try_init().ok();
    // Permissions don't matter here; the route is gated on the role name.
    let auth_manager = known_staff(5, access(&["manager"], &[Permission::General, Permission::Settings]));
    let (status, body) = api_request(
        TestRequest::put().uri("/api/stores/1/settings/store").set_json(json!({"name": "Renamed"})),
        &token(),
        local_verifier(),
        auth_manager,
        configure_stores(MockStoreManager::new()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient permissions"}"#);
}

#[actix_web::test]
async fn an_owner_can_change_store_settings() {
    let _ = env_logger::try_init().ok();
    let mut store_manager = MockStoreManager::new();
    store_manager.expect_update_store().returning(|id, _| Ok(store_record(id)));
    let auth_manager = known_staff(5, access(&["owner"], &[]));
    let (status, body) = api_request(
        TestRequest::put().uri("/api/stores/1/settings/store").set_json(json!({"name": "Renamed"})),
        &token(),
        local_verifier(),
        auth_manager,
        configure_stores(store_manager),
    )
    .await;
    info!("Response body: {body}");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""name":"Main Street Studio""#), "was: {body}");
}

#[actix_web::test]
async fn a_manager_can_remove_staff() {
    let _ = env_logger::try_init().ok();
    let mut staff_manager = MockStaffManager::new();
    staff_manager.expect_delete_staff().returning(|_, _| Ok(()));
    let auth_manager = known_staff(5, access(&["manager"], &[Permission::General]));
    let (status, body) = api_request(
        TestRequest::delete().uri("/api/stores/1/staffs/9"),
        &token(),
        local_verifier(),
        auth_manager,
        configure_staff(staff_manager),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"message":"Staff deleted"}"#);
}

#[actix_web::test]
async fn a_receptionist_cannot_remove_staff() {
    let _ = env_logger::try_init().ok();
    let auth_manager = known_staff(5, access(&["receptionist"], &[Permission::General]));
    let (status, body) = api_request(
        TestRequest::delete().uri("/api/stores/1/staffs/9"),
        &token(),
        local_verifier(),
        auth_manager,
        configure_staff(MockStaffManager::new()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient permissions"}"#);
}

fn configure_stores(store_manager: MockStoreManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(StoreApi::new(store_manager)))
            .service(StoresRoute::<MockStoreManager>::new())
            .service(NewStoreRoute::<MockStoreManager>::new())
            .service(UpdateStoreSettingsRoute::<MockStoreManager>::new());
    }
}

fn configure_staff(staff_manager: MockStaffManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(StaffApi::new(staff_manager)))
            .service(RemoveStaffRoute::<MockStaffManager>::new());
    }
}
