//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use booking_engine::{
    db_types::{
        CustomerUpdate,
        EventUpdate,
        NewCustomer,
        NewEvent,
        NewRole,
        NewStaff,
        NewStore,
        Permission,
        StaffUpdate,
        StoreUpdate,
    },
    traits::{
        AuthApiError,
        AuthManagement,
        CustomerManagement,
        EventManagement,
        RoleManagement,
        StaffManagement,
        StoreManagement,
    },
    AuthApi,
    CustomerApi,
    EventApi,
    RoleApi,
    StaffApi,
    StoreApi,
};
use idp_tools::KeyProvider;
use log::*;

use crate::{
    auth::{extract_bearer_token, RequestIdentity, TokenIssuer, TokenScope, TokenVerifier},
    config::ServerOptions,
    data_objects::{LoginRequest, LoginResponse, MessageResponse, PasswordChangeRequest, PasswordResetRequest, ResetTokenResponse},
    errors::{AuthError, ServerError},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where permissions [$($perms:expr),+])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::PermissionGuardFactory::new(&[$($perms),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where role $role:literal)  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::RoleGuardFactory::role($role));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where any_role [$($role:literal),+])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::RoleGuardFactory::any_of(&[$($role),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------

route!(login => Post "/auth/login" impl AuthManagement);
/// Route handler for the login endpoint
///
/// Checks the supplied email and password against the stored credential and issues an
/// access token on success. Unknown emails and wrong passwords produce byte-identical 401
/// responses so the two cases cannot be told apart from outside.
pub async fn login<B: AuthManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let LoginRequest { email, password } = body.into_inner();
    debug!("💻️ POST login for {email}");
    let staff = match api.authenticate(&email, password.reveal()).await {
        Ok(staff) => staff,
        Err(AuthApiError::DatabaseError(e)) => return Err(ServerError::BackendError(format!("Database error: {e}"))),
        Err(e) => {
            debug!("💻️ Login rejected for {email}. {e}");
            return Err(ServerError::AuthenticationError(AuthError::InvalidCredentials));
        },
    };
    let token = signer.issue_access_token(email.as_str())?;
    debug!("💻️ Issued an access token for staff #{}", staff.id);
    Ok(HttpResponse::Ok().json(LoginResponse::bearer(token)))
}

route!(logout => Post "/auth/logout" impl AuthManagement, KeyProvider);
/// Route handler for the logout endpoint
///
/// Verifies the presented token and that it belongs to a known staff member, then
/// acknowledges the logout. There is no denylist, so the token stays valid until it
/// expires; clients are expected to drop it. A request without a Bearer header is a 400.
pub async fn logout<B: AuthManagement, P: KeyProvider>(
    req: HttpRequest,
    api: web::Data<AuthApi<B>>,
    verifier: web::Data<TokenVerifier<P>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ POST logout");
    let token = extract_bearer_token(req.headers()).ok_or(ServerError::MalformedAuthorizationHeader)?;
    let claims = verifier.verify(token).await.map_err(|e| {
        debug!("💻️ Logout rejected. {}", e.detail());
        ServerError::from(e)
    })?;
    if claims.scope != TokenScope::Access {
        debug!("💻️ Logout rejected. A {} token cannot be used here", claims.scope);
        return Err(ServerError::AuthenticationError(AuthError::WrongScope));
    }
    let staff = api.resolve_principal(&claims.sub).await.map_err(|e| {
        debug!("💻️ Logout rejected for [{}]. {e}", claims.sub);
        ServerError::AuthenticationError(AuthError::PrincipalNotFound)
    })?;
    debug!("💻️ Staff #{} logged out", staff.id);
    Ok(HttpResponse::Ok().json(MessageResponse::new("Successfully logged out")))
}

route!(password_reset_request => Post "/auth/password/reset" impl AuthManagement);
/// Route handler for requesting a password reset
///
/// Issues a reset-scoped token for the given email, valid for one hour. The token is
/// included in the response body only when `BMS_EXPOSE_RESET_TOKEN` allows it; a
/// production deployment delivers it out of band instead. Reset tokens never grant API
/// access.
pub async fn password_reset_request<B: AuthManagement>(
    body: web::Json<PasswordResetRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let email = body.into_inner().email;
    debug!("💻️ POST password reset request for {email}");
    if let Err(e) = api.resolve_principal(email.as_str()).await {
        debug!("💻️ Password reset request rejected. {e}");
        return match e {
            AuthApiError::DatabaseError(e) => Err(ServerError::BackendError(format!("Database error: {e}"))),
            _ => Err(ServerError::NoRecordFound("Staff not found with this email address".to_string())),
        };
    }
    let token = signer.issue_reset_token(email.as_str())?;
    info!("🔐️ A password reset token was issued for {email}");
    let reset_token = options.expose_reset_token.then_some(token);
    Ok(HttpResponse::Ok().json(ResetTokenResponse { message: "Password reset link sent".to_string(), reset_token }))
}

route!(password_reset_verify => Post "/auth/password/verify" impl AuthManagement);
/// Route handler for completing a password reset
pub async fn password_reset_verify<B: AuthManagement>(
    body: web::Json<PasswordChangeRequest>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    change_password(body.into_inner(), api.as_ref()).await
}

route!(password_reset => Put "/auth/password/reset" impl AuthManagement);
/// Route handler for setting a new password. Same operation as the verify endpoint; both
/// entry points are kept for client compatibility.
pub async fn password_reset<B: AuthManagement>(
    body: web::Json<PasswordChangeRequest>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    change_password(body.into_inner(), api.as_ref()).await
}

async fn change_password<B: AuthManagement>(
    body: PasswordChangeRequest,
    api: &AuthApi<B>,
) -> Result<HttpResponse, ServerError> {
    let PasswordChangeRequest { email, new_password } = body;
    debug!("💻️ Password change for {email}");
    api.set_password(&email, new_password.reveal()).await?;
    info!("🔐️ The password for {email} has been reset");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Password reset successful")))
}

//----------------------------------------------   Profile  ----------------------------------------------------

route!(my_profile => Get "/me" impl StaffManagement);
/// Route handler for the me endpoint
///
/// Returns the staff record and profile belonging to the presented token. This is the one
/// API route that works for a freshly provisioned federated identity with no store or role
/// assignment yet, so clients can show who is logged in before an admin sorts them out.
pub async fn my_profile<B: StaffManagement>(
    identity: RequestIdentity,
    api: web::Data<StaffApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let staff = identity.staff().ok_or(ServerError::AuthenticationRequired)?;
    debug!("💻️ GET my profile for staff #{}", staff.id);
    let full = api
        .fetch_staff_by_id(staff.id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound("Staff not found".to_string()))?;
    Ok(HttpResponse::Ok().json(full))
}

route!(update_my_profile => Put "/me" impl StaffManagement);
/// Route handler for updating one's own profile
///
/// Role assignments in the payload are ignored; staff cannot promote themselves here.
pub async fn update_my_profile<B: StaffManagement>(
    identity: RequestIdentity,
    body: web::Json<StaffUpdate>,
    api: web::Data<StaffApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let staff = identity.staff().ok_or(ServerError::AuthenticationRequired)?;
    debug!("💻️ PUT my profile for staff #{}", staff.id);
    let updated = api.update_my_profile(staff.id, &body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}

//----------------------------------------------   Stores  ----------------------------------------------------

route!(stores => Get "/stores" impl StoreManagement where permissions [Permission::General]);
pub async fn stores<B: StoreManagement>(api: web::Data<StoreApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET stores");
    let stores = api.fetch_stores().await?;
    Ok(HttpResponse::Ok().json(stores))
}

route!(store => Get "/stores/{store_id}" impl StoreManagement where permissions [Permission::General]);
pub async fn store<B: StoreManagement>(
    path: web::Path<i64>,
    api: web::Data<StoreApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let store_id = path.into_inner();
    debug!("💻️ GET store #{store_id}");
    let store =
        api.fetch_store(store_id).await?.ok_or_else(|| ServerError::NoRecordFound("Store not found".to_string()))?;
    Ok(HttpResponse::Ok().json(store))
}

route!(new_store => Post "/stores" impl StoreManagement where permissions [Permission::Settings]);
pub async fn new_store<B: StoreManagement>(
    body: web::Json<NewStore>,
    api: web::Data<StoreApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let store = api.create_store(&body.into_inner()).await?;
    info!("💻️ Store #{} ({}) has been created", store.id, store.name);
    Ok(HttpResponse::Ok().json(store))
}

route!(store_settings => Get "/stores/{store_id}/settings/store" impl StoreManagement where permissions [Permission::Settings]);
/// Route handler for the store settings view. Same record as the store detail route, but
/// behind the settings permission so the catalogue distinguishes browsing from admin.
pub async fn store_settings<B: StoreManagement>(
    path: web::Path<i64>,
    api: web::Data<StoreApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let store_id = path.into_inner();
    debug!("💻️ GET store settings for store #{store_id}");
    let store =
        api.fetch_store(store_id).await?.ok_or_else(|| ServerError::NoRecordFound("Store not found".to_string()))?;
    Ok(HttpResponse::Ok().json(store))
}

route!(update_store_settings => Put "/stores/{store_id}/settings/store" impl StoreManagement where role "owner");
/// Route handler for changing store settings. Owners only, regardless of granted
/// permissions.
pub async fn update_store_settings<B: StoreManagement>(
    path: web::Path<i64>,
    body: web::Json<StoreUpdate>,
    api: web::Data<StoreApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let store_id = path.into_inner();
    debug!("💻️ PUT store settings for store #{store_id}");
    let store = api.update_store(store_id, &body.into_inner()).await?;
    info!("💻️ The settings of store #{store_id} have been updated");
    Ok(HttpResponse::Ok().json(store))
}

//----------------------------------------------   Staff  ----------------------------------------------------

route!(staff_list => Get "/stores/{store_id}/staffs" impl StaffManagement where permissions [Permission::General]);
pub async fn staff_list<B: StaffManagement>(
    path: web::Path<i64>,
    api: web::Data<StaffApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let store_id = path.into_inner();
    debug!("💻️ GET staff for store #{store_id}");
    let staff = api.fetch_staff_for_store(store_id).await?;
    Ok(HttpResponse::Ok().json(staff))
}

route!(staff_member => Get "/stores/{store_id}/staffs/{staff_id}" impl StaffManagement where permissions [Permission::General]);
pub async fn staff_member<B: StaffManagement>(
    path: web::Path<(i64, i64)>,
    api: web::Data<StaffApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (store_id, staff_id) = path.into_inner();
    debug!("💻️ GET staff #{staff_id} of store #{store_id}");
    let staff = api
        .fetch_staff(store_id, staff_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound("Staff not found".to_string()))?;
    Ok(HttpResponse::Ok().json(staff))
}

route!(new_staff => Post "/stores/{store_id}/staffs" impl StaffManagement where permissions [Permission::Settings]);
/// Route handler for adding staff to a store
///
/// The referenced role must belong to the same store, and the email must be unused. The
/// password is hashed before anything is written.
pub async fn new_staff<B: StaffManagement>(
    path: web::Path<i64>,
    body: web::Json<NewStaff>,
    api: web::Data<StaffApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let store_id = path.into_inner();
    debug!("💻️ POST staff for store #{store_id}");
    let staff = api.create_staff(store_id, &body.into_inner()).await?;
    info!("💻️ Staff #{} has been added to store #{store_id}", staff.staff.id);
    Ok(HttpResponse::Ok().json(staff))
}

route!(update_staff => Put "/stores/{store_id}/staffs/{staff_id}" impl StaffManagement where permissions [Permission::Settings]);
pub async fn update_staff<B: StaffManagement>(
    path: web::Path<(i64, i64)>,
    body: web::Json<StaffUpdate>,
    api: web::Data<StaffApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (store_id, staff_id) = path.into_inner();
    debug!("💻️ PUT staff #{staff_id} of store #{store_id}");
    let staff = api.update_staff(store_id, staff_id, &body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(staff))
}

route!(remove_staff => Delete "/stores/{store_id}/staffs/{staff_id}" impl StaffManagement where any_role ["owner", "manager"]);
pub async fn remove_staff<B: StaffManagement>(
    path: web::Path<(i64, i64)>,
    api: web::Data<StaffApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (store_id, staff_id) = path.into_inner();
    debug!("💻️ DELETE staff #{staff_id} of store #{store_id}");
    api.delete_staff(store_id, staff_id).await?;
    info!("💻️ Staff #{staff_id} has been removed from store #{store_id}");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Staff deleted")))
}

//----------------------------------------------   Customers  ----------------------------------------------------

route!(customers => Get "/stores/{store_id}/customers" impl CustomerManagement where permissions [Permission::General]);
pub async fn customers<B: CustomerManagement>(
    path: web::Path<i64>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let store_id = path.into_inner();
    debug!("💻️ GET customers for store #{store_id}");
    let customers = api.fetch_customers(store_id).await?;
    Ok(HttpResponse::Ok().json(customers))
}

route!(customer => Get "/stores/{store_id}/customers/{customer_id}" impl CustomerManagement where permissions [Permission::General]);
pub async fn customer<B: CustomerManagement>(
    path: web::Path<(i64, i64)>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (store_id, customer_id) = path.into_inner();
    debug!("💻️ GET customer #{customer_id} of store #{store_id}");
    let customer = api
        .fetch_customer(store_id, customer_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound("Customer not found".to_string()))?;
    Ok(HttpResponse::Ok().json(customer))
}

route!(new_customer => Post "/stores/{store_id}/customers" impl CustomerManagement where permissions [Permission::General]);
pub async fn new_customer<B: CustomerManagement>(
    path: web::Path<i64>,
    body: web::Json<NewCustomer>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let store_id = path.into_inner();
    debug!("💻️ POST customer for store #{store_id}");
    let customer = api.create_customer(store_id, &body.into_inner()).await?;
    info!("💻️ Customer #{} has been registered with store #{store_id}", customer.customer.id);
    Ok(HttpResponse::Ok().json(customer))
}

route!(update_customer => Put "/stores/{store_id}/customers/{customer_id}" impl CustomerManagement where permissions [Permission::General]);
pub async fn update_customer<B: CustomerManagement>(
    path: web::Path<(i64, i64)>,
    body: web::Json<CustomerUpdate>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (store_id, customer_id) = path.into_inner();
    debug!("💻️ PUT customer #{customer_id} of store #{store_id}");
    let customer = api.update_customer(store_id, customer_id, &body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(customer))
}

route!(remove_customer => Delete "/stores/{store_id}/customers/{customer_id}" impl CustomerManagement where permissions [Permission::General]);
pub async fn remove_customer<B: CustomerManagement>(
    path: web::Path<(i64, i64)>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (store_id, customer_id) = path.into_inner();
    debug!("💻️ DELETE customer #{customer_id} of store #{store_id}");
    api.delete_customer(store_id, customer_id).await?;
    info!("💻️ Customer #{customer_id} has been removed from store #{store_id}");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Customer deleted")))
}

//----------------------------------------------   Bookings  ----------------------------------------------------

route!(bookings => Get "/stores/{store_id}/bookings" impl EventManagement where permissions [Permission::General]);
pub async fn bookings<B: EventManagement>(
    path: web::Path<i64>,
    api: web::Data<EventApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let store_id = path.into_inner();
    debug!("💻️ GET bookings for store #{store_id}");
    let events = api.fetch_events(store_id).await?;
    Ok(HttpResponse::Ok().json(events))
}

route!(booking => Get "/stores/{store_id}/bookings/{booking_id}" impl EventManagement where permissions [Permission::General]);
pub async fn booking<B: EventManagement>(
    path: web::Path<(i64, i64)>,
    api: web::Data<EventApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (store_id, booking_id) = path.into_inner();
    debug!("💻️ GET booking #{booking_id} of store #{store_id}");
    let event = api
        .fetch_event(store_id, booking_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound("Booking not found".to_string()))?;
    Ok(HttpResponse::Ok().json(event))
}

route!(new_booking => Post "/stores/{store_id}/bookings" impl EventManagement where permissions [Permission::General]);
/// Route handler for creating a booking
///
/// The window must not end before it starts; the stored duration is derived from the
/// window, and the listed staff must belong to the store.
pub async fn new_booking<B: EventManagement>(
    path: web::Path<i64>,
    body: web::Json<NewEvent>,
    api: web::Data<EventApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let store_id = path.into_inner();
    debug!("💻️ POST booking for store #{store_id}");
    let event = api.create_event(store_id, &body.into_inner()).await?;
    info!("💻️ Booking #{} has been created in store #{store_id}", event.event.id);
    Ok(HttpResponse::Ok().json(event))
}

route!(update_booking => Put "/stores/{store_id}/bookings/{booking_id}" impl EventManagement where permissions [Permission::General]);
pub async fn update_booking<B: EventManagement>(
    path: web::Path<(i64, i64)>,
    body: web::Json<EventUpdate>,
    api: web::Data<EventApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (store_id, booking_id) = path.into_inner();
    debug!("💻️ PUT booking #{booking_id} of store #{store_id}");
    let event = api.update_event(store_id, booking_id, &body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(event))
}

route!(remove_booking => Delete "/stores/{store_id}/bookings/{booking_id}" impl EventManagement where permissions [Permission::General]);
pub async fn remove_booking<B: EventManagement>(
    path: web::Path<(i64, i64)>,
    api: web::Data<EventApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (store_id, booking_id) = path.into_inner();
    debug!("💻️ DELETE booking #{booking_id} of store #{store_id}");
    api.delete_event(store_id, booking_id).await?;
    info!("💻️ Booking #{booking_id} has been removed from store #{store_id}");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Booking deleted")))
}

route!(event => Get "/stores/{store_id}/events/{event_id}" impl EventManagement where permissions [Permission::General]);
/// Route handler for fetching a single event. Alias of the booking detail route kept for
/// calendar clients that address events directly.
pub async fn event<B: EventManagement>(
    path: web::Path<(i64, i64)>,
    api: web::Data<EventApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (store_id, event_id) = path.into_inner();
    debug!("💻️ GET event #{event_id} of store #{store_id}");
    let event = api
        .fetch_event(store_id, event_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound("Booking not found".to_string()))?;
    Ok(HttpResponse::Ok().json(event))
}

//----------------------------------------------   Roles  ----------------------------------------------------

route!(roles => Get "/stores/{store_id}/roles" impl RoleManagement where permissions [Permission::Settings]);
pub async fn roles<B: RoleManagement>(
    path: web::Path<i64>,
    api: web::Data<RoleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let store_id = path.into_inner();
    debug!("💻️ GET roles for store #{store_id}");
    let roles = api.fetch_roles(store_id).await?;
    Ok(HttpResponse::Ok().json(roles))
}

route!(role => Get "/stores/{store_id}/roles/{role_id}" impl RoleManagement where permissions [Permission::Settings]);
pub async fn role<B: RoleManagement>(
    path: web::Path<(i64, i64)>,
    api: web::Data<RoleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (store_id, role_id) = path.into_inner();
    debug!("💻️ GET role #{role_id} of store #{store_id}");
    let role =
        api.fetch_role(store_id, role_id).await?.ok_or_else(|| ServerError::NoRecordFound("Role not found".to_string()))?;
    Ok(HttpResponse::Ok().json(role))
}

route!(new_role => Post "/stores/{store_id}/roles" impl RoleManagement where permissions [Permission::Settings]);
pub async fn new_role<B: RoleManagement>(
    path: web::Path<i64>,
    body: web::Json<NewRole>,
    api: web::Data<RoleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let store_id = path.into_inner();
    debug!("💻️ POST role for store #{store_id}");
    let role = api.create_role(store_id, &body.into_inner()).await?;
    info!("💻️ Role #{} ({}) has been created in store #{store_id}", role.id, role.name);
    Ok(HttpResponse::Ok().json(role))
}

route!(update_role_permissions => Put "/stores/{store_id}/roles/{role_id}/permissions" impl RoleManagement where permissions [Permission::Settings]);
/// Route handler for replacing a role's permission grants
///
/// The payload is the complete new grant set; permissions not listed are revoked.
pub async fn update_role_permissions<B: RoleManagement>(
    path: web::Path<(i64, i64)>,
    body: web::Json<Vec<Permission>>,
    api: web::Data<RoleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (store_id, role_id) = path.into_inner();
    debug!("💻️ PUT permissions for role #{role_id} of store #{store_id}");
    let role = api.replace_role_permissions(store_id, role_id, &body.into_inner()).await?;
    info!("💻️ The permission grants of role #{role_id} have been replaced");
    Ok(HttpResponse::Ok().json(role))
}

route!(remove_role => Delete "/stores/{store_id}/roles/{role_id}" impl RoleManagement where permissions [Permission::Settings]);
pub async fn remove_role<B: RoleManagement>(
    path: web::Path<(i64, i64)>,
    api: web::Data<RoleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (store_id, role_id) = path.into_inner();
    debug!("💻️ DELETE role #{role_id} of store #{store_id}");
    api.delete_role(store_id, role_id).await?;
    info!("💻️ Role #{role_id} has been removed from store #{store_id}");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Role deleted")))
}

route!(permission_catalogue => Get "/permissions" impl RoleManagement where permissions [Permission::Settings]);
/// Route handler for the global permission catalogue. Fixed by migration; useful for
/// populating role editors.
pub async fn permission_catalogue<B: RoleManagement>(
    api: web::Data<RoleApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET permission catalogue");
    let catalogue = api.fetch_permission_catalogue().await?;
    Ok(HttpResponse::Ok().json(catalogue))
}
