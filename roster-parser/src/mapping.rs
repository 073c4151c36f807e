use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{NewEvent, WorkLabel};

/// Category given to every event imported from a roster.
pub const ROSTER_CATEGORY: &str = "근무표";

/// Comma-separated keyword lists that rename roster text to a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingRules {
    #[serde(rename = "휴무")]
    pub off: String,
    #[serde(rename = "근무")]
    pub work: String,
}

impl Default for MappingRules {
    fn default() -> Self {
        Self {
            off: "ATDO,ADO,OFF,휴,X,휴무".into(),
            work: "KE,FLIGHT,비행,근무".into(),
        }
    }
}

impl MappingRules {
    /// Maps roster text to the first label whose keywords it contains.
    /// Text matching no keyword is returned as is.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        let text = if text.trim().is_empty() {
            WorkLabel::Other.as_str()
        } else {
            text
        };
        let upper = text.trim().to_uppercase();

        let rules = [(WorkLabel::Off, &self.off), (WorkLabel::Work, &self.work)];
        for (label, keywords) in rules {
            let mut keywords = keywords
                .split(',')
                .map(|keyword| keyword.trim().to_uppercase())
                .filter(|keyword| !keyword.is_empty());

            if keywords.any(|keyword| upper.contains(&keyword)) {
                return label.to_string();
            }
        }

        text.to_string()
    }
}

/// A schedule row the user confirmed for import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntry {
    pub date: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub reasoning: Option<String>,
    /// Set when the user toggled the day in the preview.
    #[serde(default)]
    pub flip: bool,
}

impl ImportEntry {
    fn label_text(&self) -> String {
        let text = if self.text.trim().is_empty() {
            WorkLabel::Other.as_str()
        } else {
            &self.text
        };

        if !self.flip {
            return text.to_string();
        }

        WorkLabel::parse(text)
            .unwrap_or(WorkLabel::Other)
            .toggled()
            .to_string()
    }
}

/// Converts confirmed rows into events. Rows with an unparseable date are dropped.
#[must_use]
pub fn import_events(entries: &[ImportEntry], rules: Option<&MappingRules>) -> Vec<NewEvent> {
    entries
        .iter()
        .filter_map(|entry| {
            let Ok(date) = NaiveDate::parse_from_str(&entry.date, "%Y-%m-%d") else {
                log::debug!("Skipping roster row with invalid date {:?}", entry.date);
                return None;
            };

            let label = entry.label_text();

            let (title, description) = match rules {
                Some(rules) => (
                    rules.apply(&label),
                    format!("근무표에서 추출: {}", entry.text),
                ),
                None => {
                    let description = match entry.reasoning.as_deref() {
                        Some(reasoning) if !reasoning.is_empty() => {
                            format!("근무표에서 추출: {reasoning}")
                        }
                        _ => "근무표에서 추출된 일정".to_string(),
                    };
                    (label, description)
                }
            };

            Some(NewEvent {
                date,
                title,
                description: Some(description),
                category: Some(ROSTER_CATEGORY.to_string()),
            })
        })
        .collect()
}
