use async_trait::async_trait;
use chrono::Utc;
use roster_parser::{CalendarEvent, DateRange, EventPatch, NewEvent};
use tokio::sync::RwLock;
use uuid::Uuid;

mod supabase;

pub use supabase::SupabaseStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("event {0} does not exist")]
    NotFound(String),
    #[error("event store request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("event store returned status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("event store returned no row")]
    EmptyResponse,
}

/// Persistence for calendar events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Events whose date falls in `range`, ordered by date.
    async fn list(&self, range: DateRange) -> Result<Vec<CalendarEvent>, StoreError>;

    async fn insert(&self, event: NewEvent) -> Result<CalendarEvent, StoreError>;

    async fn update(&self, id: &str, patch: EventPatch) -> Result<CalendarEvent, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Process-local store, used when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    events: RwLock<Vec<CalendarEvent>>,
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn list(&self, range: DateRange) -> Result<Vec<CalendarEvent>, StoreError> {
        let mut events = self
            .events
            .read()
            .await
            .iter()
            .filter(|event| range.contains(event.date))
            .cloned()
            .collect::<Vec<_>>();

        events.sort_by_key(|event| event.date);
        Ok(events)
    }

    async fn insert(&self, event: NewEvent) -> Result<CalendarEvent, StoreError> {
        let now = Utc::now();
        let event = CalendarEvent {
            id: Some(Uuid::new_v4().to_string()),
            created_at: Some(now),
            updated_at: Some(now),
            ..CalendarEvent::unsaved(event)
        };

        self.events.write().await.push(event.clone());
        Ok(event)
    }

    async fn update(&self, id: &str, patch: EventPatch) -> Result<CalendarEvent, StoreError> {
        let mut events = self.events.write().await;
        let event = events
            .iter_mut()
            .find(|event| event.id.as_deref() == Some(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        event.apply(patch);
        event.updated_at = Some(Utc::now());
        Ok(event.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|event| event.id.as_deref() != Some(id));

        if events.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
