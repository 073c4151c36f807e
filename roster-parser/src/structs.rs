use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::WorkLabel;

/// The year the calendar and the roster prompt are anchored to.
pub const CALENDAR_YEAR: i32 = 2026;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: NaiveDate,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CalendarEvent {
    /// An event that only exists in memory, without a store-assigned id.
    #[must_use]
    pub fn unsaved(event: NewEvent) -> Self {
        Self {
            id: None,
            date: event.date,
            title: event.title,
            description: event.description,
            category: event.category,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn apply(&mut self, patch: EventPatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(category) = patch.category {
            self.category = Some(category);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidEvent {
    #[error("event title must not be empty")]
    EmptyTitle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub date: NaiveDate,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl NewEvent {
    pub fn normalized(self) -> Result<Self, InvalidEvent> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(InvalidEvent::EmptyTitle);
        }

        Ok(Self {
            date: self.date,
            title,
            description: non_empty(self.description),
            category: non_empty(self.category),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl EventPatch {
    pub fn normalized(mut self) -> Result<Self, InvalidEvent> {
        if let Some(title) = self.title.take() {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(InvalidEvent::EmptyTitle);
            }
            self.title = Some(title);
        }

        Ok(self)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::year(CALENDAR_YEAR).unwrap_or(Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        })
    }
}

/// One normalized row of a roster analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub date: String,
    pub text: WorkLabel,
    pub original_color: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub off: usize,
    pub work: usize,
    pub other: usize,
    pub total: usize,
}

impl ScheduleSummary {
    #[must_use]
    pub fn of(entries: &[ScheduleEntry]) -> Self {
        entries
            .iter()
            .fold(Self::default(), |mut summary, entry| {
                match entry.text {
                    WorkLabel::Off => summary.off += 1,
                    WorkLabel::Work => summary.work += 1,
                    WorkLabel::Other => summary.other += 1,
                }
                summary.total += 1;
                summary
            })
    }
}
