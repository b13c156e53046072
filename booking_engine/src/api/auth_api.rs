//! Credential checks, principal resolution and federated provisioning.

use std::fmt::Debug;

use bms_common::EmailAddress;
use log::{debug, info};

use crate::{
    db_types::{FederatedStaff, Staff, StaffAccess},
    helpers::{hash_password, verify_password},
    traits::{AuthApiError, AuthManagement},
};

/// A syntactically valid argon2 digest that no password hashes to. Verifying against it
/// burns the same work as a real comparison, so a failed login takes the same time whether
/// or not the email exists.
const DUMMY_DIGEST: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY";

/// The `AuthApi` owns the login and identity workflows. The backend supplies plain storage
/// operations; the rules (indistinguishable failures, provision-if-absent) live here.
pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Checks `password` against the stored credential for `email` and returns the staff
    /// record on success.
    ///
    /// Unknown emails, wrong passwords and federated accounts with no local credential all
    /// fail with the same [`AuthApiError::InvalidCredentials`].
    pub async fn authenticate(&self, email: &EmailAddress, password: &str) -> Result<Staff, AuthApiError> {
        let Some(credential) = self.db.fetch_credential_by_email(email).await? else {
            let _ = verify_password(password, DUMMY_DIGEST);
            return Err(AuthApiError::InvalidCredentials);
        };
        if !verify_password(password, &credential.password_hash) {
            return Err(AuthApiError::InvalidCredentials);
        }
        self.db.fetch_staff_by_email(email).await?.ok_or(AuthApiError::InvalidCredentials)
    }

    /// Replaces the stored password digest for `email` with a fresh hash of `new_password`.
    pub async fn set_password(&self, email: &EmailAddress, new_password: &str) -> Result<(), AuthApiError> {
        let hash = hash_password(new_password).map_err(|e| AuthApiError::PasswordHash(e.to_string()))?;
        self.db.update_password_hash(email, &hash).await
    }

    /// Looks up the staff member a token subject refers to. Subjects that parse as email
    /// addresses are matched against profile emails; anything else is treated as a
    /// federated subject identifier.
    pub async fn resolve_principal(&self, subject: &str) -> Result<Staff, AuthApiError> {
        let staff = match subject.parse::<EmailAddress>() {
            Ok(email) => self.db.fetch_staff_by_email(&email).await?,
            Err(_) => self.db.fetch_staff_by_external_id(subject).await?,
        };
        staff.ok_or(AuthApiError::StaffNotFound)
    }

    /// As [`AuthApi::resolve_principal`], but an unknown federated subject is provisioned
    /// as a new staff record with no store and no role. Email subjects never provision;
    /// those tokens come from local logins and their staff must already exist.
    pub async fn resolve_or_provision(
        &self,
        subject: &str,
        email: Option<&EmailAddress>,
        name: Option<&str>,
    ) -> Result<Staff, AuthApiError> {
        if let Ok(email) = subject.parse::<EmailAddress>() {
            return self.db.fetch_staff_by_email(&email).await?.ok_or(AuthApiError::StaffNotFound);
        }
        if let Some(staff) = self.db.fetch_staff_by_external_id(subject).await? {
            return Ok(staff);
        }
        info!("🔐️ Provisioning a staff record for new federated identity [{subject}]");
        let new_staff = FederatedStaff {
            external_id: subject.to_string(),
            name: name.map(String::from),
            mail_address: email.cloned(),
        };
        match self.db.create_federated_staff(&new_staff).await {
            Ok(staff) => Ok(staff),
            Err(AuthApiError::DuplicateIdentity) => {
                // Lost a provisioning race. The record exists now, so use it.
                debug!("🔐️ Concurrent provisioning for [{subject}], re-fetching");
                self.db.fetch_staff_by_external_id(subject).await?.ok_or(AuthApiError::StaffNotFound)
            },
            Err(e) => Err(e),
        }
    }

    /// The role name(s) and granted permissions for a staff member. Staff with no role
    /// assigned get an empty access set.
    pub async fn access_for_staff(&self, staff_id: i64) -> Result<StaffAccess, AuthApiError> {
        self.db.fetch_access_for_staff(staff_id).await
    }
}
