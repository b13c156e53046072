//! In-memory endpoint tests. Each test drives the actix service against mocked engine
//! backends; nothing here touches a database or the network.

mod acl;
mod auth;
mod helpers;
mod identity;
mod mocks;

use actix_web::{body::MessageBody, test, test::TestRequest, App};

#[actix_web::test]
async fn health_check() {
    let app = test::init_service(App::new().service(crate::routes::health)).await;
    let req = TestRequest::get().uri("/health").to_request();
    let (_, res) = test::call_service(&app, req).await.into_parts();
    assert!(res.status().is_success());
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    assert_eq!(body, "👍️\n");
}
