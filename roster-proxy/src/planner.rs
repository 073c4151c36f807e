use std::sync::Arc;

use roster_parser::{CalendarEvent, DateRange, EventPatch, NewEvent};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{EventStore, StoreError};

/// Prefix of ids handed out to events that only live in the overlay.
const LOCAL_ID_PREFIX: &str = "local-";

/// Oldest overlay events are dropped past this many.
const OVERLAY_LIMIT: usize = 10_000;

/// Result of creating an event. `persisted` is false when only the overlay holds it.
#[derive(Debug, Clone, Serialize)]
pub struct Saved {
    pub event: CalendarEvent,
    pub persisted: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub saved: usize,
    pub local_only: usize,
    /// Rows that could not be turned into an event.
    pub skipped: usize,
    pub events: Vec<CalendarEvent>,
}

/// Calendar operations on top of an [`EventStore`].
///
/// Writes the store refuses are kept in a local-only overlay so nothing the
/// user entered disappears while the server is running.
pub struct Planner {
    store: Arc<dyn EventStore>,
    overlay: RwLock<Vec<CalendarEvent>>,
}

impl Planner {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            overlay: RwLock::default(),
        }
    }

    pub async fn list(&self, range: DateRange) -> Vec<CalendarEvent> {
        let mut events = match self.store.list(range).await {
            Ok(events) => events,
            Err(err) => {
                log::error!("Failed to load events, serving local ones only: {err}");
                Vec::new()
            }
        };

        events.extend(
            self.overlay
                .read()
                .await
                .iter()
                .filter(|event| range.contains(event.date))
                .cloned(),
        );

        events.sort_by_key(|event| event.date);
        events
    }

    pub async fn add(&self, event: NewEvent) -> Saved {
        match self.store.insert(event.clone()).await {
            Ok(event) => Saved {
                event,
                persisted: true,
            },
            Err(err) => {
                log::error!("Failed to save event on {}, keeping it locally: {err}", event.date);
                let event = CalendarEvent {
                    id: Some(format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4())),
                    ..CalendarEvent::unsaved(event)
                };

                let mut overlay = self.overlay.write().await;
                if overlay.len() >= OVERLAY_LIMIT {
                    let dropped = overlay.remove(0);
                    log::warn!("Local event overlay is full, dropping event on {}", dropped.date);
                }
                overlay.push(event.clone());
                Saved {
                    event,
                    persisted: false,
                }
            }
        }
    }

    pub async fn import(&self, events: Vec<NewEvent>) -> ImportReport {
        let mut report = ImportReport::default();

        for event in events {
            let saved = self.add(event).await;
            if saved.persisted {
                report.saved += 1;
            } else {
                report.local_only += 1;
            }
            report.events.push(saved.event);
        }

        if report.local_only > 0 {
            log::warn!(
                "{} of {} imported events are only kept locally",
                report.local_only,
                report.events.len()
            );
        }

        report
    }

    pub async fn update(&self, id: &str, patch: EventPatch) -> Result<CalendarEvent, StoreError> {
        if let Some(event) = self
            .overlay
            .write()
            .await
            .iter_mut()
            .find(|event| event.id.as_deref() == Some(id))
        {
            event.apply(patch);
            return Ok(event.clone());
        }

        self.store.update(id, patch).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        {
            let mut overlay = self.overlay.write().await;
            if let Some(index) = overlay
                .iter()
                .position(|event| event.id.as_deref() == Some(id))
            {
                overlay.remove(index);
                return Ok(());
            }
        }

        self.store.delete(id).await
    }
}
