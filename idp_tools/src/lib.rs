mod api;
mod config;
mod error;
mod key_resolver;

mod data_objects;

pub use api::IdpApi;
pub use config::{IdpConfig, DEFAULT_IDP_TIMEOUT};
pub use data_objects::JwtKey;
pub use error::IdpApiError;
pub use key_resolver::{KeyProvider, KeyResolver, KeyResolverError, KEY_CACHE_TTL};
