//! # Booking engine public API
//!
//! The `api` module exposes the programmatic API for the booking engine. The API is
//! modular, so that clients can pick the functionality they need, and so that the server
//! can hand each route family exactly the capabilities it is allowed to use.
//!
//! * [`auth_api`] checks credentials, resolves token subjects to staff records and
//!   provisions federated identities on first sight.
//! * [`store_api`] manages the tenant directory and per-store settings.
//! * [`staff_api`] manages staff records and their profiles.
//! * [`customer_api`] manages customers and their profiles.
//! * [`event_api`] manages bookings, their derived duration and staff assignments.
//! * [`role_api`] manages store-scoped roles and their permission grants.
//!
//! # API usage
//!
//! The pattern for all the APIs is the same. An API instance is created by supplying a
//! database backend that implements the backend traits the API requires.
//!
//! ```rust,ignore
//! use booking_engine::{SqliteDatabase, StoreApi};
//! let db = SqliteDatabase::new(5).await?;
//! // SqliteDatabase implements StoreManagement
//! let api = StoreApi::new(db);
//! let stores = api.fetch_stores().await?;
//! ```

pub mod auth_api;
pub mod customer_api;
pub mod event_api;
pub mod role_api;
pub mod staff_api;
pub mod store_api;

pub use auth_api::AuthApi;
pub use customer_api::CustomerApi;
pub use event_api::EventApi;
pub use role_api::RoleApi;
pub use staff_api::StaffApi;
pub use store_api::StoreApi;
