//! Unified API for bookings.

use std::fmt::Debug;

use crate::{
    db_types::{EventRecord, EventUpdate, NewEvent},
    traits::{EventApiError, EventManagement},
};

pub struct EventApi<B> {
    db: B,
}

impl<B: Debug> Debug for EventApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventApi ({:?})", self.db)
    }
}

impl<B> EventApi<B>
where B: EventManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates a booking with its staff assignments. The duration is derived from the
    /// booking window, never supplied by the caller.
    pub async fn create_event(&self, store_id: i64, event: &NewEvent) -> Result<EventRecord, EventApiError> {
        if event.to_at < event.from_at {
            return Err(EventApiError::InvalidTimeWindow(format!(
                "the booking ends ({}) before it starts ({})",
                event.to_at, event.from_at
            )));
        }
        self.db.insert_event(store_id, event).await
    }

    pub async fn fetch_event(&self, store_id: i64, event_id: i64) -> Result<Option<EventRecord>, EventApiError> {
        self.db.fetch_event(store_id, event_id).await
    }

    pub async fn fetch_events(&self, store_id: i64) -> Result<Vec<EventRecord>, EventApiError> {
        self.db.fetch_events(store_id).await
    }

    /// Applies the non-`None` fields of the update. If either end of the booking window
    /// moves, the duration is recomputed against the merged window; the backend rejects
    /// windows that end before they start.
    pub async fn update_event(
        &self,
        store_id: i64,
        event_id: i64,
        update: &EventUpdate,
    ) -> Result<EventRecord, EventApiError> {
        if update.is_empty() {
            return Err(EventApiError::EmptyUpdate);
        }
        // Pre-check the cheap case. The backend re-validates against the stored window
        // when only one bound moves.
        if let (Some(from_at), Some(to_at)) = (update.from_at, update.to_at) {
            if to_at < from_at {
                return Err(EventApiError::InvalidTimeWindow(format!(
                    "the booking ends ({to_at}) before it starts ({from_at})"
                )));
            }
        }
        self.db.update_event(store_id, event_id, update).await
    }

    pub async fn delete_event(&self, store_id: i64, event_id: i64) -> Result<(), EventApiError> {
        self.db.delete_event(store_id, event_id).await
    }
}
