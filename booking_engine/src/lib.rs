//! Booking Engine
//!
//! The booking engine is the storage and domain layer of the booking management server. It is
//! provider-agnostic: the server talks to the traits in [`traits`], and a backend (currently
//! SQLite) implements them.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). You should never need to access the
//!    database directly. Instead, use the public API provided by the engine. The exception is
//!    the data types used in the database. These are defined in the [`db_types`] module and
//!    are public.
//! 2. The engine public API ([`mod@api`]). One thin wrapper per resource family (auth,
//!    stores, staff, customers, events, roles), each generic over the backend trait it
//!    needs. The domain rules that must hold regardless of backend (indistinguishable login
//!    failures, derived booking durations, role checks on assignment) live in these
//!    wrappers.
pub mod api;
pub mod db_types;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{AuthApi, CustomerApi, EventApi, RoleApi, StaffApi, StoreApi};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AuthManagement,
    CustomerManagement,
    EventManagement,
    RoleManagement,
    StaffManagement,
    StoreManagement,
};
