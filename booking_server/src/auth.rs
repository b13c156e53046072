//! Token issuing and verification.
//!
//! Access tokens are HS256-signed JWTs. The signing secret always comes from the local
//! configuration, but verification material is resolved through [`KeyResolver`] so that
//! tokens issued by a configured identity provider are accepted with the provider's
//! published key, falling back to the local secret when the provider publishes none.

use std::{fmt, sync::Arc};

use actix_web::{dev::Payload, http::header, FromRequest, HttpMessage, HttpRequest};
use bms_common::EmailAddress;
use booking_engine::db_types::{Permission, Staff, StaffAccess};
use chrono::Duration;
use futures::future::{ready, Ready};
use idp_tools::{KeyProvider, KeyResolver};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    UntrustedToken,
    ValidationError,
};
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, errors::AuthError};

const RESET_TOKEN_LIFETIME: Duration = Duration::hours(1);

/// What an issued token is good for. Reset tokens are handed out by the password reset
/// flow and never grant API access.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    #[default]
    Access,
    Reset,
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Reset => write!(f, "reset"),
        }
    }
}

/// The custom claim set carried in tokens.
///
/// `sub` is the staff email for locally issued tokens, or an opaque external subject id
/// for tokens issued by the identity provider. Provider tokens may also carry the holder's
/// email and display name, which seed the staff profile on first sight. Scope defaults to
/// `access` because externally issued tokens do not carry the claim at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    #[serde(default)]
    pub scope: TokenScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl JwtClaims {
    pub fn access(subject: impl Into<String>) -> Self {
        Self { sub: subject.into(), scope: TokenScope::Access, email: None, name: None }
    }

    pub fn reset(subject: impl Into<String>) -> Self {
        Self { sub: subject.into(), scope: TokenScope::Reset, email: None, name: None }
    }
}

//-------------------------------------------------  TokenIssuer  ------------------------------------------------------

/// Signs tokens with the locally configured secret.
pub struct TokenIssuer {
    key: Hs256Key,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = Hs256Key::new(config.jwt_secret.reveal().as_bytes());
        Self { key, lifetime: config.token_lifetime }
    }

    /// Issue an access token for the given subject, valid for the configured lifetime.
    pub fn issue_access_token(&self, subject: &str) -> Result<String, AuthError> {
        self.issue(JwtClaims::access(subject), self.lifetime)
    }

    /// Issue a reset-scoped token for the password reset flow. Valid for one hour.
    pub fn issue_reset_token(&self, subject: &str) -> Result<String, AuthError> {
        self.issue(JwtClaims::reset(subject), RESET_TOKEN_LIFETIME)
    }

    fn issue(&self, claims: JwtClaims, lifetime: Duration) -> Result<String, AuthError> {
        let header = Header::empty().with_token_type("JWT");
        let claims = Claims::new(claims).set_duration_and_issuance(&TimeOptions::default(), lifetime);
        Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::MalformedToken(e.to_string()))
    }
}

//------------------------------------------------  TokenVerifier  -----------------------------------------------------

/// Verifies tokens against the key material the resolver currently trusts.
pub struct TokenVerifier<P: KeyProvider> {
    resolver: Arc<KeyResolver<P>>,
}

// Derived Clone would demand P: Clone, which mocked providers don't have.
impl<P: KeyProvider> Clone for TokenVerifier<P> {
    fn clone(&self) -> Self {
        Self { resolver: Arc::clone(&self.resolver) }
    }
}

impl<P: KeyProvider> TokenVerifier<P> {
    pub fn new(resolver: Arc<KeyResolver<P>>) -> Self {
        Self { resolver }
    }

    /// Check the token's structure, signature and expiry and return its claims.
    ///
    /// Every failure except [`AuthError::KeyResolution`] collapses into the same opaque
    /// message on the wire. The distinction only matters for logging.
    pub async fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let key = self.resolver.resolve().await.map_err(|e| AuthError::KeyResolution(e.to_string()))?;
        let key = Hs256Key::new(key.reveal().as_bytes());
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        let token = Hs256.validator::<JwtClaims>(&key).validate(&untrusted).map_err(map_validation_error)?;
        token.claims().validate_expiration(&TimeOptions::default()).map_err(map_validation_error)?;
        Ok(token.claims().custom.clone())
    }
}

fn map_validation_error(e: ValidationError) -> AuthError {
    match e {
        ValidationError::AlgorithmMismatch { .. } => AuthError::AlgorithmMismatch,
        ValidationError::InvalidSignature => AuthError::BadSignature("signature verification failed".to_string()),
        ValidationError::Expired => AuthError::TokenExpired,
        e => AuthError::MalformedToken(e.to_string()),
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header, if one is present and
/// well formed.
pub fn extract_bearer_token(headers: &header::HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

//-----------------------------------------------  RequestIdentity  ----------------------------------------------------

/// The resolved principal for a request, placed in request extensions by the identity
/// middleware. Anonymous requests carry an empty identity rather than being rejected;
/// the access guards and handlers decide what anonymity means for each route.
#[derive(Debug, Clone, Default)]
pub struct RequestIdentity {
    staff: Option<Staff>,
    roles: Vec<String>,
    permissions: Vec<Permission>,
}

impl RequestIdentity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(staff: Staff, access: StaffAccess) -> Self {
        Self { staff: Some(staff), roles: access.roles, permissions: access.permissions }
    }

    pub fn is_anonymous(&self) -> bool {
        self.staff.is_none()
    }

    pub fn staff(&self) -> Option<&Staff> {
        self.staff.as_ref()
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn grants_all(&self, required: &[Permission]) -> bool {
        required.iter().all(|p| self.permissions.contains(p))
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|r| self.has_role(r))
    }
}

impl FromRequest for RequestIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = req.extensions().get::<RequestIdentity>().cloned().unwrap_or_else(RequestIdentity::anonymous);
        ready(Ok(identity))
    }
}
