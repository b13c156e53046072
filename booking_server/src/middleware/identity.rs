//! Identity middleware for the booking management server.
//! Wraps the `/api` scope and resolves the request's principal before any handler runs.
//!
//! The middleware never rejects a request for a bad token: requests without a usable
//! bearer token proceed as anonymous, and the access guards (or the handler) decide what
//! anonymity means for the route. The single exception is a key-resolution outage, which
//! produces a 503 immediately. Silently downgrading everyone to anonymous while the
//! identity provider is unreachable would turn every authenticated call into a confusing
//! 401.

use std::{pin::Pin, rc::Rc, sync::Arc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use booking_engine::{traits::AuthManagement, AuthApi};
use futures::{
    future::{ok, Ready},
    Future,
};
use idp_tools::KeyProvider;
use log::*;

use crate::{
    auth::{JwtClaims, RequestIdentity, TokenScope, TokenVerifier},
    errors::{AuthError, ServerError},
};

pub struct IdentityMiddlewareFactory<P: KeyProvider, B> {
    verifier: TokenVerifier<P>,
    api: Arc<AuthApi<B>>,
}

impl<P: KeyProvider, B> IdentityMiddlewareFactory<P, B> {
    pub fn new(verifier: TokenVerifier<P>, api: Arc<AuthApi<B>>) -> Self {
        Self { verifier, api }
    }
}

impl<S, Body, P, B> Transform<S, ServiceRequest> for IdentityMiddlewareFactory<P, B>
where
    S: Service<ServiceRequest, Response = ServiceResponse<Body>, Error = Error> + 'static,
    S::Future: 'static,
    Body: 'static,
    P: KeyProvider + 'static,
    B: AuthManagement + 'static,
{
    type Response = ServiceResponse<Body>;
    type Error = Error;
    type Transform = IdentityMiddlewareService<S, P, B>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(IdentityMiddlewareService {
            verifier: self.verifier.clone(),
            api: Arc::clone(&self.api),
            service: Rc::new(service),
        })
    }
}

pub struct IdentityMiddlewareService<S, P: KeyProvider, B> {
    verifier: TokenVerifier<P>,
    api: Arc<AuthApi<B>>,
    service: Rc<S>,
}

impl<S, Body, P, B> Service<ServiceRequest> for IdentityMiddlewareService<S, P, B>
where
    S: Service<ServiceRequest, Response = ServiceResponse<Body>, Error = Error> + 'static,
    S::Future: 'static,
    Body: 'static,
    P: KeyProvider + 'static,
    B: AuthManagement + 'static,
{
    type Response = ServiceResponse<Body>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = self.verifier.clone();
        let api = Arc::clone(&self.api);
        Box::pin(async move {
            let identity = match crate::auth::extract_bearer_token(req.headers()) {
                None => RequestIdentity::anonymous(),
                Some(token) => match verifier.verify(token).await {
                    Ok(claims) => resolve_claims(claims, api.as_ref()).await,
                    Err(AuthError::KeyResolution(reason)) => {
                        warn!("🔐️ Token verification is unavailable. {reason}");
                        return Err(ServerError::KeyResolution.into());
                    },
                    Err(e) => {
                        debug!("🔐️ Ignoring an unusable bearer token. {}", e.detail());
                        RequestIdentity::anonymous()
                    },
                },
            };
            req.extensions_mut().insert(identity);
            service.call(req).await
        })
    }
}

async fn resolve_claims<B: AuthManagement>(claims: JwtClaims, api: &AuthApi<B>) -> RequestIdentity {
    if claims.scope != TokenScope::Access {
        warn!("🔐️ A {} token was presented for API access. Treating the request as anonymous.", claims.scope);
        return RequestIdentity::anonymous();
    }
    let staff = match api.resolve_or_provision(&claims.sub, claims.email.as_ref(), claims.name.as_deref()).await {
        Ok(staff) => staff,
        Err(e) => {
            warn!("🔐️ Could not resolve a staff record for subject [{}]. {e}", claims.sub);
            return RequestIdentity::anonymous();
        },
    };
    match api.access_for_staff(staff.id).await {
        Ok(access) => RequestIdentity::authenticated(staff, access),
        Err(e) => {
            warn!("🔐️ Could not load the access set for staff #{}. {e}", staff.id);
            RequestIdentity::anonymous()
        },
    }
}
