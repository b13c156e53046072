use std::fmt::Display;
use std::str::FromStr;

use bms_common::{EmailAddress, Secret};
use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------    Permission      -----------------------------------------------------------
/// The closed set of functions a role can be granted. The catalogue is seeded by migration;
/// roles link to it through grant rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Permission {
    /// Day-to-day operations: bookings, customers, the store directory.
    General,
    /// Store configuration, staff and role administration.
    Settings,
    /// Reporting and analytics.
    Reports,
}

impl Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::General => write!(f, "general"),
            Permission::Settings => write!(f, "settings"),
            Permission::Reports => write!(f, "reports"),
        }
    }
}

impl FromStr for Permission {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(Self::General),
            "settings" => Ok(Self::Settings),
            "reports" => Ok(Self::Reports),
            s => Err(ConversionError(format!("Invalid permission: {s}"))),
        }
    }
}

//--------------------------------------    EventStatus     -----------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Active,
    Canceled,
}

impl Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Active => write!(f, "active"),
            EventStatus::Canceled => write!(f, "canceled"),
        }
    }
}

impl FromStr for EventStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "canceled" => Ok(Self::Canceled),
            s => Err(ConversionError(format!("Invalid event status: {s}"))),
        }
    }
}

impl From<String> for EventStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid event status: {value}. But this conversion cannot fail. Defaulting to Active");
            EventStatus::Active
        })
    }
}

//--------------------------------------        Sex         -----------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
            Sex::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for Sex {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "unknown" => Ok(Self::Unknown),
            s => Err(ConversionError(format!("Invalid sex: {s}"))),
        }
    }
}

//--------------------------------------       Store        -----------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub name_ruby: String,
    pub postal_code: String,
    pub prefecture: String,
    pub street: String,
    pub address: String,
    pub building: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStore {
    pub name: String,
    #[serde(default)]
    pub name_ruby: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub prefecture: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreUpdate {
    pub name: Option<String>,
    pub name_ruby: Option<String>,
    pub postal_code: Option<String>,
    pub prefecture: Option<String>,
    pub street: Option<String>,
    pub address: Option<String>,
    pub building: Option<String>,
    pub phone_number: Option<String>,
}

impl StoreUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.name_ruby.is_none() &&
            self.postal_code.is_none() &&
            self.prefecture.is_none() &&
            self.street.is_none() &&
            self.address.is_none() &&
            self.building.is_none() &&
            self.phone_number.is_none()
    }
}

//--------------------------------------       Staff        -----------------------------------------------------------
/// A staff principal. `store_id` and `role_id` are NULL for freshly provisioned federated
/// accounts until an administrator assigns them; `external_id` is NULL for accounts that
/// only ever log in with a local credential.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Staff {
    pub id: i64,
    pub store_id: Option<i64>,
    pub role_id: Option<i64>,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StaffProfile {
    pub id: i64,
    pub staff_id: i64,
    pub name: String,
    pub name_ruby: String,
    pub mail_address: EmailAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FullStaff {
    #[serde(flatten)]
    pub staff: Staff,
    pub profile: Option<StaffProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStaff {
    pub role_id: i64,
    pub name: String,
    #[serde(default)]
    pub name_ruby: String,
    pub mail_address: EmailAddress,
    pub password: Secret<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffUpdate {
    pub role_id: Option<i64>,
    pub name: Option<String>,
    pub name_ruby: Option<String>,
    pub mail_address: Option<EmailAddress>,
}

impl StaffUpdate {
    pub fn is_empty(&self) -> bool {
        self.role_id.is_none() && self.name.is_none() && self.name_ruby.is_none() && self.mail_address.is_none()
    }

    pub fn has_profile_fields(&self) -> bool {
        self.name.is_some() || self.name_ruby.is_some() || self.mail_address.is_some()
    }
}

/// Seed data for provisioning a staff account from a verified federated identity.
#[derive(Debug, Clone)]
pub struct FederatedStaff {
    pub external_id: String,
    pub name: Option<String>,
    pub mail_address: Option<EmailAddress>,
}

/// A local login credential. Never serialized; the digest stays inside the engine.
#[derive(Debug, Clone, FromRow)]
pub struct StaffCredential {
    pub staff_id: i64,
    pub mail_address: EmailAddress,
    pub password_hash: String,
}

/// The access a staff principal carries: its role name(s) and the union of the permissions
/// those roles are granted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StaffAccess {
    pub roles: Vec<String>,
    pub permissions: Vec<Permission>,
}

impl StaffAccess {
    pub fn grants_all(&self, required: &[Permission]) -> bool {
        required.iter().all(|p| self.permissions.contains(p))
    }
}

//--------------------------------------     Customer       -----------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub store_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomerProfile {
    pub id: i64,
    pub customer_id: i64,
    pub name: String,
    pub name_ruby: String,
    pub mail_address: EmailAddress,
    pub sex: Sex,
    pub phone_number: String,
    pub postal_code: String,
    pub prefecture: String,
    pub street: String,
    pub address: String,
    pub building: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FullCustomer {
    #[serde(flatten)]
    pub customer: Customer,
    pub profile: Option<CustomerProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub name_ruby: String,
    pub mail_address: EmailAddress,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub prefecture: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub building: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub name_ruby: Option<String>,
    pub mail_address: Option<EmailAddress>,
    pub sex: Option<Sex>,
    pub phone_number: Option<String>,
    pub postal_code: Option<String>,
    pub prefecture: Option<String>,
    pub street: Option<String>,
    pub address: Option<String>,
    pub building: Option<String>,
}

impl CustomerUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.name_ruby.is_none() &&
            self.mail_address.is_none() &&
            self.sex.is_none() &&
            self.phone_number.is_none() &&
            self.postal_code.is_none() &&
            self.prefecture.is_none() &&
            self.street.is_none() &&
            self.address.is_none() &&
            self.building.is_none()
    }
}

//--------------------------------------       Event        -----------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDetails {
    pub overview: String,
}

/// A booking. `duration_by_minutes` is derived from the `[from_at, to_at)` window and kept
/// in step with it on every write.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub store_id: i64,
    pub customer_id: i64,
    pub title: String,
    pub from_at: DateTime<Utc>,
    pub to_at: DateTime<Utc>,
    pub duration_by_minutes: i64,
    pub note: Option<String>,
    pub details: Option<Json<EventDetails>>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    #[serde(flatten)]
    pub event: Event,
    pub staff: Vec<FullStaff>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub customer_id: i64,
    pub title: String,
    pub from_at: DateTime<Utc>,
    pub to_at: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub details: Option<EventDetails>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub staff_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub from_at: Option<DateTime<Utc>>,
    pub to_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub status: Option<EventStatus>,
}

impl EventUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() &&
            self.from_at.is_none() &&
            self.to_at.is_none() &&
            self.note.is_none() &&
            self.status.is_none()
    }
}

//--------------------------------------       Role         -----------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleRecord {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRole {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PermissionRecord {
    pub id: i64,
    pub function: Permission,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FullRole {
    #[serde(flatten)]
    pub role: RoleRecord,
    pub permissions: Vec<PermissionRecord>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn permission_string_round_trip() {
        for p in [Permission::General, Permission::Settings, Permission::Reports] {
            assert_eq!(p.to_string().parse::<Permission>().unwrap(), p);
        }
        assert!("superuser".parse::<Permission>().is_err());
    }

    #[test]
    fn event_status_falls_back_to_active() {
        assert_eq!(EventStatus::from("canceled".to_string()), EventStatus::Canceled);
        assert_eq!(EventStatus::from("definitely-not-a-status".to_string()), EventStatus::Active);
    }

    #[test]
    fn update_payloads_know_when_they_are_empty() {
        assert!(StoreUpdate::default().is_empty());
        assert!(StaffUpdate::default().is_empty());
        let update = StaffUpdate { name: Some("Aiko".to_string()), ..Default::default() };
        assert!(!update.is_empty());
        assert!(update.has_profile_fields());
        let role_only = StaffUpdate { role_id: Some(3), ..Default::default() };
        assert!(!role_only.has_profile_fields());
    }
}
