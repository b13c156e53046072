use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdpApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The identity provider does not publish a JWT key set")]
    NoPublishedKeys,
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}
