use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use booking_engine::{AuthApi, CustomerApi, EventApi, RoleApi, SqliteDatabase, StaffApi, StoreApi};
use idp_tools::{IdpApi, KeyResolver};

use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    middleware::IdentityMiddlewareFactory,
    routes::{
        health,
        BookingRoute,
        BookingsRoute,
        CustomerRoute,
        CustomersRoute,
        EventRoute,
        LoginRoute,
        LogoutRoute,
        MyProfileRoute,
        NewBookingRoute,
        NewCustomerRoute,
        NewRoleRoute,
        NewStaffRoute,
        NewStoreRoute,
        PasswordResetRequestRoute,
        PasswordResetRoute,
        PasswordResetVerifyRoute,
        PermissionCatalogueRoute,
        RemoveBookingRoute,
        RemoveCustomerRoute,
        RemoveRoleRoute,
        RemoveStaffRoute,
        RoleRoute,
        RolesRoute,
        StaffListRoute,
        StaffMemberRoute,
        StoreRoute,
        StoreSettingsRoute,
        StoresRoute,
        UpdateBookingRoute,
        UpdateCustomerRoute,
        UpdateMyProfileRoute,
        UpdateRolePermissionsRoute,
        UpdateStaffRoute,
        UpdateStoreSettingsRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    Ok(srv.await?)
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    // One resolver for the whole server, so the key cache and its single-flight refresh
    // are shared across workers.
    let resolver = match config.idp.clone() {
        Some(idp_config) => {
            let provider = IdpApi::new(idp_config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
            Arc::new(KeyResolver::new(provider, config.auth.jwt_secret.clone()))
        },
        None => Arc::new(KeyResolver::local_only(config.auth.jwt_secret.clone())),
    };
    let verifier = TokenVerifier::new(resolver);
    let options = ServerOptions::from_config(&config);
    let srv = HttpServer::new(move || {
        let jwt_signer = TokenIssuer::new(&config.auth);
        let identity =
            IdentityMiddlewareFactory::new(verifier.clone(), Arc::new(AuthApi::new(db.clone())));
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("bms::access_log"))
            .app_data(web::Data::new(AuthApi::new(db.clone())))
            .app_data(web::Data::new(StoreApi::new(db.clone())))
            .app_data(web::Data::new(StaffApi::new(db.clone())))
            .app_data(web::Data::new(CustomerApi::new(db.clone())))
            .app_data(web::Data::new(EventApi::new(db.clone())))
            .app_data(web::Data::new(RoleApi::new(db.clone())))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(verifier.clone()))
            .app_data(web::Data::new(options));
        // Routes that see a resolved identity
        let api_scope = web::scope("/api")
            .wrap(identity)
            .service(MyProfileRoute::<SqliteDatabase>::new())
            .service(UpdateMyProfileRoute::<SqliteDatabase>::new())
            .service(StoresRoute::<SqliteDatabase>::new())
            .service(NewStoreRoute::<SqliteDatabase>::new())
            .service(StoreSettingsRoute::<SqliteDatabase>::new())
            .service(UpdateStoreSettingsRoute::<SqliteDatabase>::new())
            .service(StoreRoute::<SqliteDatabase>::new())
            .service(StaffListRoute::<SqliteDatabase>::new())
            .service(NewStaffRoute::<SqliteDatabase>::new())
            .service(StaffMemberRoute::<SqliteDatabase>::new())
            .service(UpdateStaffRoute::<SqliteDatabase>::new())
            .service(RemoveStaffRoute::<SqliteDatabase>::new())
            .service(CustomersRoute::<SqliteDatabase>::new())
            .service(NewCustomerRoute::<SqliteDatabase>::new())
            .service(CustomerRoute::<SqliteDatabase>::new())
            .service(UpdateCustomerRoute::<SqliteDatabase>::new())
            .service(RemoveCustomerRoute::<SqliteDatabase>::new())
            .service(BookingsRoute::<SqliteDatabase>::new())
            .service(NewBookingRoute::<SqliteDatabase>::new())
            .service(BookingRoute::<SqliteDatabase>::new())
            .service(UpdateBookingRoute::<SqliteDatabase>::new())
            .service(RemoveBookingRoute::<SqliteDatabase>::new())
            .service(EventRoute::<SqliteDatabase>::new())
            .service(RolesRoute::<SqliteDatabase>::new())
            .service(NewRoleRoute::<SqliteDatabase>::new())
            .service(RoleRoute::<SqliteDatabase>::new())
            .service(UpdateRolePermissionsRoute::<SqliteDatabase>::new())
            .service(RemoveRoleRoute::<SqliteDatabase>::new())
            .service(PermissionCatalogueRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(LogoutRoute::<SqliteDatabase, IdpApi>::new())
            .service(PasswordResetRequestRoute::<SqliteDatabase>::new())
            .service(PasswordResetVerifyRoute::<SqliteDatabase>::new())
            .service(PasswordResetRoute::<SqliteDatabase>::new())
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
