use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use booking_engine::{
    db_types::StaffCredential,
    helpers::hash_password,
    traits::AuthApiError,
    AuthApi,
};
use chrono::{Duration, Utc};
use jwt_compact::{Claims, UntrustedToken};
use log::*;
use serde_json::json;

use super::{
    helpers::{get_auth_config, issue_token, local_verifier, staff_record},
    mocks::{MockAuthManager, MockProvider},
};
use crate::{
    auth::{JwtClaims, TokenIssuer, TokenScope},
    config::ServerOptions,
    routes::{LoginRoute, LogoutRoute, PasswordResetRequestRoute, PasswordResetRoute, PasswordResetVerifyRoute},
};

//------------------------------------------------  Login  -------------------------------------------------------------

#[actix_web::test]
async fn login_with_unknown_email() {
    let _ = env_logger::try_init().ok();
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_fetch_credential_by_email().returning(|_| Ok(None));
    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"email": "ghost@example.com", "password": "whatever"}))
        .to_request();
    let (status, body) = call(req, auth_manager, true).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Invalid email or password"}"#);
}

#[actix_web::test]
async fn login_with_wrong_password() {
    let _ = env_logger::try_init().ok();
    let digest = hash_password("correct-horse").unwrap();
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_fetch_credential_by_email().returning(move |email| {
        Ok(Some(StaffCredential { staff_id: 5, mail_address: email.clone(), password_hash: digest.clone() }))
    });
    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"email": "aiko@example.com", "password": "wrong-horse"}))
        .to_request();
    let (status, body) = call(req, auth_manager, true).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // Byte-identical to the unknown-email response. Nothing leaks which check failed.
    assert_eq!(body, r#"{"error":"Invalid email or password"}"#);
}

#[actix_web::test]
async fn login_returns_a_signed_access_token() {
    let _ = env_logger::try_init().ok();
    let digest = hash_password("hunter2").unwrap();
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_fetch_credential_by_email().returning(move |email| {
        Ok(Some(StaffCredential { staff_id: 5, mail_address: email.clone(), password_hash: digest.clone() }))
    });
    auth_manager.expect_fetch_staff_by_email().returning(|_| Ok(Some(staff_record(5))));
    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"email": "aiko@example.com", "password": "hunter2"}))
        .to_request();
    let (status, body) = call(req, auth_manager, true).await;
    info!("Response body: {body}");
    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["token_type"], "bearer");
    let claims = decode_claims(response["access_token"].as_str().unwrap());
    assert_eq!(claims.custom.sub, "aiko@example.com");
    assert_eq!(claims.custom.scope, TokenScope::Access);
    let lifetime = claims.expiration.unwrap().signed_duration_since(Utc::now());
    assert!(lifetime.num_minutes() >= 29 && lifetime.num_minutes() <= 30, "Lifetime: {}", lifetime.num_minutes());
}

#[actix_web::test]
async fn login_with_a_broken_backend() {
    let _ = env_logger::try_init().ok();
    let mut auth_manager = MockAuthManager::new();
    auth_manager
        .expect_fetch_credential_by_email()
        .returning(|_| Err(AuthApiError::DatabaseError("the database is on fire".to_string())));
    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"email": "aiko@example.com", "password": "hunter2"}))
        .to_request();
    let (status, body) = call(req, auth_manager, true).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"An error occurred on the backend of the server. Database error: the database is on fire"}"#);
}

//------------------------------------------------  Logout  ------------------------------------------------------------

#[actix_web::test]
async fn logout_without_a_bearer_header() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/auth/logout").to_request();
    let (status, body) = call(req, MockAuthManager::new(), true).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid Authorization header format"}"#);
}

#[actix_web::test]
async fn logout_with_an_unusable_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/auth/logout")
        .insert_header(("Authorization", "Bearer made-up-nonsense"))
        .to_request();
    let (status, body) = call(req, MockAuthManager::new(), true).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Could not validate credentials"}"#);
}

#[actix_web::test]
async fn logout_with_a_reset_scoped_token() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(JwtClaims::reset("aiko@example.com"), Utc::now() + Duration::minutes(30));
    let req = TestRequest::post()
        .uri("/auth/logout")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let (status, body) = call(req, MockAuthManager::new(), true).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Could not validate credentials"}"#);
}

#[actix_web::test]
async fn logout_with_a_valid_token() {
    let _ = env_logger::try_init().ok();
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_fetch_staff_by_email().returning(|_| Ok(Some(staff_record(5))));
    let token = issue_token(JwtClaims::access("aiko@example.com"), Utc::now() + Duration::minutes(30));
    let req = TestRequest::post()
        .uri("/auth/logout")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let (status, body) = call(req, auth_manager, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"message":"Successfully logged out"}"#);
}

//--------------------------------------------  Password reset  --------------------------------------------------------

#[actix_web::test]
async fn reset_request_for_an_unknown_email() {
    let _ = env_logger::try_init().ok();
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_fetch_staff_by_email().returning(|_| Ok(None));
    let req = TestRequest::post()
        .uri("/auth/password/reset")
        .set_json(json!({"email": "ghost@example.com"}))
        .to_request();
    let (status, body) = call(req, auth_manager, true).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Staff not found with this email address"}"#);
}

#[actix_web::test]
async fn reset_request_returns_a_reset_scoped_token() {
    let _ = env_logger::try_init().ok();
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_fetch_staff_by_email().returning(|_| Ok(Some(staff_record(5))));
    let req = TestRequest::post()
        .uri("/auth/password/reset")
        .set_json(json!({"email": "aiko@example.com"}))
        .to_request();
    let (status, body) = call(req, auth_manager, true).await;
    info!("Response body: {body}");
    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["message"], "Password reset link sent");
    let claims = decode_claims(response["reset_token"].as_str().unwrap());
    assert_eq!(claims.custom.sub, "aiko@example.com");
    assert_eq!(claims.custom.scope, TokenScope::Reset);
    let lifetime = claims.expiration.unwrap().signed_duration_since(Utc::now());
    assert!(lifetime.num_minutes() >= 59 && lifetime.num_minutes() <= 60, "Lifetime: {}", lifetime.num_minutes());
}

#[actix_web::test]
async fn reset_request_withholds_the_token_when_not_exposed() {
    let _ = env_logger::try_init().ok();
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_fetch_staff_by_email().returning(|_| Ok(Some(staff_record(5))));
    let req = TestRequest::post()
        .uri("/auth/password/reset")
        .set_json(json!({"email": "aiko@example.com"}))
        .to_request();
    let (status, body) = call(req, auth_manager, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"message":"Password reset link sent"}"#);
}

#[actix_web::test]
async fn password_change_for_an_unknown_email() {
    let _ = env_logger::try_init().ok();
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_update_password_hash().returning(|_, _| Err(AuthApiError::EmailNotFound));
    let req = TestRequest::post()
        .uri("/auth/password/verify")
        .set_json(json!({"email": "ghost@example.com", "new_password": "fresh-horse"}))
        .to_request();
    let (status, body) = call(req, auth_manager, true).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Staff not found"}"#);
}

#[actix_web::test]
async fn password_change_stores_a_digest_not_the_password() {
    let _ = env_logger::try_init().ok();
    let mut auth_manager = MockAuthManager::new();
    auth_manager
        .expect_update_password_hash()
        .withf(|_, hash| hash.starts_with("$argon2id$"))
        .returning(|_, _| Ok(()));
    let req = TestRequest::post()
        .uri("/auth/password/verify")
        .set_json(json!({"email": "aiko@example.com", "new_password": "fresh-horse"}))
        .to_request();
    let (status, body) = call(req, auth_manager, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"message":"Password reset successful"}"#);
}

#[actix_web::test]
async fn put_password_reset_is_an_alias_for_verify() {
    let _ = env_logger::try_init().ok();
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_update_password_hash().returning(|_, _| Ok(()));
    let req = TestRequest::put()
        .uri("/auth/password/reset")
        .set_json(json!({"email": "aiko@example.com", "new_password": "fresh-horse"}))
        .to_request();
    let (status, body) = call(req, auth_manager, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"message":"Password reset successful"}"#);
}

//-------------------------------------------------  Plumbing  ---------------------------------------------------------

fn configure_app(auth_manager: MockAuthManager, expose_reset_token: bool) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let auth_api = AuthApi::new(auth_manager);
        let jwt_signer = TokenIssuer::new(&get_auth_config());
        cfg.app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(local_verifier()))
            .app_data(web::Data::new(ServerOptions { expose_reset_token }))
            .service(LoginRoute::<MockAuthManager>::new())
            .service(LogoutRoute::<MockAuthManager, MockProvider>::new())
            .service(PasswordResetRequestRoute::<MockAuthManager>::new())
            .service(PasswordResetVerifyRoute::<MockAuthManager>::new())
            .service(PasswordResetRoute::<MockAuthManager>::new());
    }
}

async fn call(
    req: actix_http::Request,
    auth_manager: MockAuthManager,
    expose_reset_token: bool,
) -> (StatusCode, String) {
    let app = App::new().configure(configure_app(auth_manager, expose_reset_token));
    let app = test::init_service(app).await;
    let (_, res) = test::call_service(&app, req).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

fn decode_claims(token: &str) -> Claims<JwtClaims> {
    let untrusted = UntrustedToken::new(token).expect("Not a structurally valid token");
    untrusted.deserialize_claims_unchecked().expect("Claims did not deserialize")
}
