use serde::{Deserialize, Serialize};

/// One entry of the provider's published JWT key set, as served by
/// `GET /auth/v1/jwt/keys`. Only `publicKey` is guaranteed to be present.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtKey {
    #[serde(rename = "publicKey")]
    pub public_key: String,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default, rename = "alg")]
    pub algorithm: Option<String>,
}

impl JwtKey {
    pub fn new<S: Into<String>>(public_key: S) -> Self {
        Self { public_key: public_key.into(), kid: None, algorithm: None }
    }
}
