//! Access guards for the booking management server.
//! These middlewares can be placed on any route or service inside the `/api` scope.
//!
//! They read the [`RequestIdentity`] that the identity middleware placed in the request
//! extensions. Anonymous requests get a 401, authenticated requests that lack the required
//! permissions or role get a 403, and everything else continues to the handler.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use booking_engine::db_types::Permission;
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::{auth::RequestIdentity, errors::ServerError};

//---------------------------------------------  Permission guard  -----------------------------------------------------

/// Requires every listed permission to be granted through the principal's role.
pub struct PermissionGuardFactory {
    required: Vec<Permission>,
}

impl PermissionGuardFactory {
    pub fn new(required: &[Permission]) -> Self {
        PermissionGuardFactory { required: required.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for PermissionGuardFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = PermissionGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(PermissionGuardService { required: self.required.clone(), service: Rc::new(service) })
    }
}

pub struct PermissionGuardService<S> {
    required: Vec<Permission>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for PermissionGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required = self.required.clone();
        Box::pin(async move {
            let identity =
                req.extensions().get::<RequestIdentity>().cloned().unwrap_or_else(RequestIdentity::anonymous);
            if identity.is_anonymous() {
                return Err(ServerError::AuthenticationRequired.into());
            }
            if !identity.grants_all(&required) {
                debug!(
                    "🔐️ Denying {}. Granted permissions {:?} do not cover {required:?}",
                    req.path(),
                    identity.permissions()
                );
                return Err(ServerError::InsufficientPermissions.into());
            }
            service.call(req).await
        })
    }
}

//------------------------------------------------  Role guard  --------------------------------------------------------

/// Requires the principal to hold one of the listed roles by name.
pub struct RoleGuardFactory {
    allowed: Vec<String>,
}

impl RoleGuardFactory {
    /// Only the named role passes.
    pub fn role(name: &str) -> Self {
        RoleGuardFactory { allowed: vec![name.to_string()] }
    }

    /// Any of the named roles passes.
    pub fn any_of(names: &[&str]) -> Self {
        RoleGuardFactory { allowed: names.iter().map(|s| s.to_string()).collect() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RoleGuardFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RoleGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RoleGuardService { allowed: self.allowed.clone(), service: Rc::new(service) })
    }
}

pub struct RoleGuardService<S> {
    allowed: Vec<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RoleGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let allowed = self.allowed.clone();
        Box::pin(async move {
            let identity =
                req.extensions().get::<RequestIdentity>().cloned().unwrap_or_else(RequestIdentity::anonymous);
            if identity.is_anonymous() {
                return Err(ServerError::AuthenticationRequired.into());
            }
            if !allowed.iter().any(|role| identity.has_role(role)) {
                debug!("🔐️ Denying {}. Held roles {:?} are not among {allowed:?}", req.path(), identity.roles());
                return Err(ServerError::InsufficientPermissions.into());
            }
            service.call(req).await
        })
    }
}
