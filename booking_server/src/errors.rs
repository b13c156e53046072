use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use booking_engine::traits::{
    AuthApiError, CustomerApiError, EventApiError, RoleApiError, StaffApiError, StoreApiError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Invalid Authorization header format")]
    MalformedAuthorizationHeader,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("{0}")]
    AuthenticationError(AuthError),
    #[error("Authentication required")]
    AuthenticationRequired,
    #[error("Authentication service unavailable")]
    KeyResolution,
    #[error("Could not issue access token. {0}")]
    CouldNotIssueToken(String),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::MalformedAuthorizationHeader => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::KeyResolution => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotIssueToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

/// Token and credential failures. The `Display` impls deliberately collapse every token
/// failure into the same opaque message so that responses never reveal which check failed.
/// The precise reason is carried in the variant and logged at debug level where it occurs.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Could not validate credentials")]
    MalformedToken(String),
    #[error("Could not validate credentials")]
    BadSignature(String),
    #[error("Could not validate credentials")]
    TokenExpired,
    #[error("Could not validate credentials")]
    AlgorithmMismatch,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Could not validate credentials")]
    PrincipalNotFound,
    #[error("Could not validate credentials")]
    WrongScope,
    #[error("Could not resolve the token signing key. {0}")]
    KeyResolution(String),
}

impl AuthError {
    /// The underlying reason, for logging. Never sent to clients.
    pub fn detail(&self) -> String {
        match self {
            Self::MalformedToken(s) => format!("Malformed token. {s}"),
            Self::BadSignature(s) => format!("Bad token signature. {s}"),
            Self::TokenExpired => "Token has expired".to_string(),
            Self::AlgorithmMismatch => "Token algorithm is not HS256".to_string(),
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::PrincipalNotFound => "No staff record matches the token subject".to_string(),
            Self::WrongScope => "Token scope does not grant API access".to_string(),
            Self::KeyResolution(s) => format!("Key resolution failed. {s}"),
        }
    }
}

impl From<AuthError> for ServerError {
    fn from(e: AuthError) -> Self {
        match e {
            // A provider outage is a server-side fault, not a client one. It must never
            // come back as a 401.
            AuthError::KeyResolution(_) => Self::KeyResolution,
            other => Self::AuthenticationError(other),
        }
    }
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::EmailNotFound => Self::NoRecordFound("Staff not found".to_string()),
            AuthApiError::StaffNotFound => Self::AuthenticationError(AuthError::PrincipalNotFound),
            AuthApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            AuthApiError::DuplicateIdentity => Self::BackendError(e.to_string()),
            AuthApiError::PasswordHash(e) => Self::BackendError(format!("Password hashing error: {e}")),
        }
    }
}

impl From<StoreApiError> for ServerError {
    fn from(e: StoreApiError) -> Self {
        match e {
            StoreApiError::StoreNotFound(_) => Self::NoRecordFound("Store not found".to_string()),
            StoreApiError::EmptyUpdate => Self::InvalidRequestBody("No fields to update".to_string()),
            StoreApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<StaffApiError> for ServerError {
    fn from(e: StaffApiError) -> Self {
        match e {
            StaffApiError::StaffNotFound(_) => Self::NoRecordFound("Staff not found".to_string()),
            StaffApiError::RoleNotFound => Self::NoRecordFound("Role not found".to_string()),
            StaffApiError::DuplicateEmail => {
                Self::InvalidRequestBody("A staff member with this email already exists".to_string())
            },
            StaffApiError::ProfileMissing => Self::NoRecordFound("Staff profile not found".to_string()),
            StaffApiError::EmptyUpdate => Self::InvalidRequestBody("No fields to update".to_string()),
            StaffApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            StaffApiError::PasswordHash(e) => Self::BackendError(format!("Password hashing error: {e}")),
        }
    }
}

impl From<CustomerApiError> for ServerError {
    fn from(e: CustomerApiError) -> Self {
        match e {
            CustomerApiError::CustomerNotFound(_) => Self::NoRecordFound("Customer not found".to_string()),
            CustomerApiError::EmptyUpdate => Self::InvalidRequestBody("No fields to update".to_string()),
            CustomerApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<EventApiError> for ServerError {
    fn from(e: EventApiError) -> Self {
        match e {
            EventApiError::EventNotFound(_) => Self::NoRecordFound("Booking not found".to_string()),
            EventApiError::CustomerNotFound(_) => Self::NoRecordFound("Customer not found".to_string()),
            EventApiError::StaffNotFound(_) => Self::NoRecordFound("Staff not found".to_string()),
            EventApiError::InvalidTimeWindow(s) => Self::InvalidRequestBody(s),
            EventApiError::EmptyUpdate => Self::InvalidRequestBody("No fields to update".to_string()),
            EventApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<RoleApiError> for ServerError {
    fn from(e: RoleApiError) -> Self {
        match e {
            RoleApiError::RoleNotFound => Self::NoRecordFound("Role not found".to_string()),
            RoleApiError::StoreNotFound(_) => Self::NoRecordFound("Store not found".to_string()),
            RoleApiError::DuplicateRoleName(name) => {
                Self::InvalidRequestBody(format!("A role named '{name}' already exists in this store"))
            },
            RoleApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}
