use std::{env, io::Write};

use bms_common::{parse_boolean_flag, Secret};
use chrono::Duration;
use idp_tools::IdpConfig;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::json;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_BMS_HOST: &str = "127.0.0.1";
const DEFAULT_BMS_PORT: u16 = 4000;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/bookings.db";
const DEFAULT_TOKEN_LIFETIME_MINUTES: i64 = 30;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Identity provider settings for verifying tokens issued elsewhere. When absent, the
    /// server runs local-only and signs and verifies with `auth.jwt_secret`.
    pub idp: Option<IdpConfig>,
    /// When true, `POST /auth/password/reset` returns the reset token in the response body.
    /// Production deployments deliver the token out of band and should disable this.
    pub expose_reset_token: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BMS_HOST.to_string(),
            port: DEFAULT_BMS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            idp: None,
            expose_reset_token: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BMS_HOST").ok().unwrap_or_else(|| DEFAULT_BMS_HOST.into());
        let port = env::var("BMS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for BMS_PORT. {e} Using the default, {DEFAULT_BMS_PORT}, instead."
                    );
                    DEFAULT_BMS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BMS_PORT);
        let database_url = env::var("BMS_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ BMS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to \
                 the default configuration."
            );
            AuthConfig::default()
        });
        let idp = IdpConfig::try_from_env();
        match &idp {
            Some(c) => info!("🪛️ Token verification keys will be fetched from the identity provider at {}", c.base_url),
            None => info!("🪛️ No identity provider is configured. Tokens will be verified with the local secret only."),
        }
        let expose_reset_token = parse_boolean_flag(env::var("BMS_EXPOSE_RESET_TOKEN").ok(), true);
        if expose_reset_token {
            warn!(
                "🚨️ Password reset tokens will be returned in API responses (BMS_EXPOSE_RESET_TOKEN). Disable this \
                 in production and deliver reset tokens out of band."
            );
        }
        Self { host, port, database_url, auth, idp, expose_reset_token }
    }
}

//-----------------------------------------------  ServerOptions  ------------------------------------------------------

/// The subset of the configuration that handlers need at request time. Kept small, and
/// free of secrets so nothing sensitive is passed around the system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub expose_reset_token: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { expose_reset_token: config.expose_reset_token }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The secret used to sign access tokens, and to verify them when no identity provider
    /// key is available.
    pub jwt_secret: Secret<String>,
    /// How long issued access tokens stay valid.
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this since every session will invalidate all issued tokens. 🚨️🚨️🚨️"
        );
        let secret: String = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT signing secret for this session was written to {}. If this is a production \
                         instance, you are doing it wrong! Set the BMS_JWT_SECRET environment variable instead. \
                         🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT signing secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT signing secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret), token_lifetime: Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("BMS_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [BMS_JWT_SECRET]")))?;
        // The algorithm is pinned. Accepting whatever the environment says would let a
        // misconfiguration silently weaken token verification.
        match env::var("BMS_JWT_ALGORITHM") {
            Ok(alg) if alg != "HS256" => {
                return Err(ServerError::ConfigurationError(format!(
                    "Unsupported value '{alg}' in BMS_JWT_ALGORITHM. Only HS256 is supported."
                )));
            },
            _ => {},
        }
        let token_lifetime = env::var("BMS_ACCESS_TOKEN_EXPIRE_MINUTES")
            .map_err(|_| {
                info!(
                    "🪛️ BMS_ACCESS_TOKEN_EXPIRE_MINUTES is not set. Using the default value of \
                     {DEFAULT_TOKEN_LIFETIME_MINUTES} minutes."
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map(Duration::minutes)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for BMS_ACCESS_TOKEN_EXPIRE_MINUTES. {e}"))
            })
            .ok()
            .unwrap_or_else(|| Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES));
        Ok(Self { jwt_secret: Secret::new(secret), token_lifetime })
    }
}
