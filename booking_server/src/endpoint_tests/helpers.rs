use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    http::{header, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
    HttpResponse,
};
use bms_common::Secret;
use booking_engine::{
    db_types::{FullStaff, Permission, Staff, StaffAccess, StaffProfile, Store},
    AuthApi,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use idp_tools::KeyResolver;
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
};
use log::debug;

use super::mocks::{MockAuthManager, MockProvider};
use crate::{
    auth::{JwtClaims, TokenVerifier},
    config::AuthConfig,
    middleware::IdentityMiddlewareFactory,
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("an-endpoint-test-signing-secret-of-decent-length".to_string()),
        token_lifetime: Duration::minutes(30),
    }
}

/// A verifier that trusts tokens signed with the test secret, as a local-only deployment
/// would.
pub fn local_verifier() -> TokenVerifier<MockProvider> {
    let resolver = Arc::new(KeyResolver::<MockProvider>::local_only(get_auth_config().jwt_secret));
    TokenVerifier::new(resolver)
}

pub fn issue_token(claims: JwtClaims, expiry: DateTime<Utc>) -> String {
    let config = get_auth_config();
    let key = Hs256Key::new(config.jwt_secret.reveal().as_bytes());
    let header = Header::empty().with_token_type("JWT");
    let mut claims = Claims::new(claims);
    claims.expiration = Some(expiry);
    Hs256.token(&header, &claims, &key).expect("Failed to sign token")
}

/// Sends a request through an app with the identity middleware wrapped around an `/api`
/// scope, the way the real server mounts it. Rejections raised by the middleware and the
/// access guards are rendered to responses, so every outcome comes back as a status and a
/// body.
pub async fn api_request<F>(
    req: TestRequest,
    token: &str,
    verifier: TokenVerifier<MockProvider>,
    auth_manager: MockAuthManager,
    configure: F,
) -> (StatusCode, String)
where
    F: FnOnce(&mut ServiceConfig),
{
    let mut req = req;
    if !token.is_empty() {
        req = req.insert_header((header::AUTHORIZATION, format!("Bearer {token}")));
    }
    let req = req.to_request();
    let identity = IdentityMiddlewareFactory::new(verifier, Arc::new(AuthApi::new(auth_manager)));
    let app = App::new().service(web::scope("/api").wrap(identity).configure(configure));
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
        Err(e) => {
            let res = HttpResponse::from_error(e);
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
    }
}

//------------------------------------------  Record builders  ---------------------------------------------------------

pub fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

pub fn staff_record(id: i64) -> Staff {
    Staff { id, store_id: Some(1), role_id: Some(2), external_id: None, created_at: ts(), updated_at: ts() }
}

pub fn full_staff(id: i64, email: &str) -> FullStaff {
    let profile = StaffProfile {
        id,
        staff_id: id,
        name: "Aiko Tanaka".to_string(),
        name_ruby: "タナカ アイコ".to_string(),
        mail_address: email.parse().unwrap(),
        created_at: ts(),
        updated_at: ts(),
    };
    FullStaff { staff: staff_record(id), profile: Some(profile) }
}

pub fn store_record(id: i64) -> Store {
    Store {
        id,
        name: "Main Street Studio".to_string(),
        name_ruby: "メインストリートスタジオ".to_string(),
        postal_code: "150-0001".to_string(),
        prefecture: "Tokyo".to_string(),
        street: "Jingumae 1-2-3".to_string(),
        address: "Shibuya".to_string(),
        building: String::new(),
        phone_number: "03-1234-5678".to_string(),
        created_at: ts(),
        updated_at: ts(),
    }
}

pub fn access(roles: &[&str], permissions: &[Permission]) -> StaffAccess {
    StaffAccess { roles: roles.iter().map(|r| r.to_string()).collect(), permissions: permissions.to_vec() }
}

/// An auth backend where any email subject resolves to staff `staff_id` holding the given
/// access set. Covers the lookups the identity middleware makes for a local access token.
pub fn known_staff(staff_id: i64, access: StaffAccess) -> MockAuthManager {
    let mut auth_manager = MockAuthManager::new();
    let staff = staff_record(staff_id);
    auth_manager.expect_fetch_staff_by_email().returning(move |_| Ok(Some(staff.clone())));
    auth_manager.expect_fetch_access_for_staff().returning(move |_| Ok(access.clone()));
    auth_manager
}
