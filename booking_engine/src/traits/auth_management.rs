use bms_common::EmailAddress;
use thiserror::Error;

use crate::db_types::{FederatedStaff, Staff, StaffAccess, StaffCredential};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("No staff account matches this email address")]
    EmailNotFound,
    #[error("No staff account matches this subject")]
    StaffNotFound,
    #[error("A staff account with this identity already exists")]
    DuplicateIdentity,
    #[error("Could not hash the password: {0}")]
    PasswordHash(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

/// Behaviour a backend must provide for credential checks, principal resolution and
/// federated provisioning. The higher-level rules (dummy verification on unknown emails,
/// provision-if-absent) live in [`crate::AuthApi`]; these methods are plain storage
/// operations.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    /// Fetch the staff record whose profile carries the given email address.
    async fn fetch_staff_by_email(&self, email: &EmailAddress) -> Result<Option<Staff>, AuthApiError>;

    /// Fetch the local login credential for the given email address. Staff provisioned
    /// from a federated identity have no local credential and yield `None`.
    async fn fetch_credential_by_email(&self, email: &EmailAddress) -> Result<Option<StaffCredential>, AuthApiError>;

    /// Fetch the staff record provisioned for the given federated subject identifier.
    async fn fetch_staff_by_external_id(&self, external_id: &str) -> Result<Option<Staff>, AuthApiError>;

    /// Create an unassigned staff record for a federated subject. Fails with
    /// [`AuthApiError::DuplicateIdentity`] if the subject already has one, so callers can
    /// treat provisioning as idempotent.
    async fn create_federated_staff(&self, staff: &FederatedStaff) -> Result<Staff, AuthApiError>;

    /// Replace the password digest for the profile with the given email address.
    /// [`AuthApiError::EmailNotFound`] if no profile matches.
    async fn update_password_hash(&self, email: &EmailAddress, hash: &str) -> Result<(), AuthApiError>;

    /// The role name(s) and granted permissions for a staff id. Unassigned staff get an
    /// empty access set, not an error.
    async fn fetch_access_for_staff(&self, staff_id: i64) -> Result<StaffAccess, AuthApiError>;
}
