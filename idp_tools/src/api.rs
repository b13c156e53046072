use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{config::IdpConfig, data_objects::JwtKey, key_resolver::KeyProvider, IdpApiError};

/// REST client for the external identity provider.
///
/// The provider authenticates service calls with both an `apikey` header and a bearer
/// token carrying the same service key, so both are installed as default headers when the
/// client is built.
#[derive(Clone)]
pub struct IdpApi {
    config: IdpConfig,
    client: Arc<Client>,
}

impl IdpApi {
    pub fn new(config: IdpConfig) -> Result<Self, IdpApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let val = HeaderValue::from_str(config.service_key.reveal().as_str())
            .map_err(|e| IdpApiError::Initialization(e.to_string()))?;
        headers.insert("apikey", val);
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_key.reveal()))
            .map_err(|e| IdpApiError::Initialization(e.to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| IdpApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T, IdpApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let response =
            self.client.request(method, url).send().await.map_err(|e| IdpApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| IdpApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| IdpApiError::RestResponseError(e.to_string()))?;
            Err(IdpApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Fetch the provider's published JWT key set. A 404 means the provider publishes no
    /// keys at all (verification then falls back to the shared secret) and is reported as
    /// [`IdpApiError::NoPublishedKeys`] so callers can tell it apart from an outage.
    pub async fn fetch_jwt_keys(&self) -> Result<Vec<JwtKey>, IdpApiError> {
        debug!("🗝️ Fetching the published JWT key set");
        match self.rest_query::<Vec<JwtKey>>(Method::GET, "/auth/v1/jwt/keys").await {
            Ok(keys) => {
                info!("🗝️ The identity provider published {} JWT key(s)", keys.len());
                Ok(keys)
            },
            Err(IdpApiError::QueryError { status: 404, .. }) => Err(IdpApiError::NoPublishedKeys),
            Err(e) => Err(e),
        }
    }
}

impl KeyProvider for IdpApi {
    async fn fetch_published_keys(&self) -> Result<Vec<JwtKey>, IdpApiError> {
        self.fetch_jwt_keys().await
    }
}
