use thiserror::Error;

use crate::db_types::{EventRecord, EventUpdate, NewEvent};

#[derive(Debug, Clone, Error)]
pub enum EventApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Event {0} does not exist")]
    EventNotFound(i64),
    #[error("Customer {0} does not exist")]
    CustomerNotFound(i64),
    #[error("Staff member {0} does not exist")]
    StaffNotFound(i64),
    #[error("Invalid booking window: {0}")]
    InvalidTimeWindow(String),
    #[error("The update contains no fields")]
    EmptyUpdate,
}

impl From<sqlx::Error> for EventApiError {
    fn from(e: sqlx::Error) -> Self {
        EventApiError::DatabaseError(e.to_string())
    }
}

// Event records embed the assigned staff, so staff lookups surface through this API too.
impl From<super::StaffApiError> for EventApiError {
    fn from(e: super::StaffApiError) -> Self {
        EventApiError::DatabaseError(e.to_string())
    }
}

/// Storage operations for bookings.
///
/// `duration_by_minutes` is derived from the booking window on every write; backends
/// recompute it whenever `from_at` or `to_at` changes and reject windows that end before
/// they start.
#[allow(async_fn_in_trait)]
pub trait EventManagement {
    /// Insert an event and its staff assignments in one transaction. The customer and all
    /// assigned staff must belong to the given store.
    async fn insert_event(&self, store_id: i64, event: &NewEvent) -> Result<EventRecord, EventApiError>;

    async fn fetch_event(&self, store_id: i64, event_id: i64) -> Result<Option<EventRecord>, EventApiError>;

    async fn fetch_events(&self, store_id: i64) -> Result<Vec<EventRecord>, EventApiError>;

    async fn update_event(&self, store_id: i64, event_id: i64, update: &EventUpdate)
        -> Result<EventRecord, EventApiError>;

    async fn delete_event(&self, store_id: i64, event_id: i64) -> Result<(), EventApiError>;
}
