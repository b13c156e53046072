//! # Backend interface contracts.
//!
//! This module defines the behaviour a database backend must expose to act as the storage
//! layer of the booking server. Each resource family gets its own trait with a concrete
//! error enum alongside it:
//!
//! * [`AuthManagement`]: credentials, principal resolution and federated provisioning.
//! * [`StoreManagement`]: the tenant directory and per-store settings.
//! * [`StaffManagement`]: staff records and their profiles.
//! * [`CustomerManagement`]: customers and their profiles.
//! * [`EventManagement`]: bookings, their derived duration and staff assignments.
//! * [`RoleManagement`]: store-scoped roles and their permission grants.
//!
//! The traits deal in the types from [`crate::db_types`]; the SQLite implementation lives
//! in [`crate::sqlite`].
mod auth_management;
mod customer_management;
mod event_management;
mod role_management;
mod staff_management;
mod store_management;

pub use auth_management::{AuthApiError, AuthManagement};
pub use customer_management::{CustomerApiError, CustomerManagement};
pub use event_management::{EventApiError, EventManagement};
pub use role_management::{RoleApiError, RoleManagement};
pub use staff_management::{StaffApiError, StaffManagement};
pub use store_management::{StoreApiError, StoreManagement};
