use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a single roster day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkLabel {
    #[serde(rename = "근무")]
    Work,
    #[serde(rename = "휴무")]
    Off,
    #[serde(rename = "기타")]
    Other,
}

impl WorkLabel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WorkLabel::Work => "근무",
            WorkLabel::Off => "휴무",
            WorkLabel::Other => "기타",
        }
    }

    /// Accepts only the two roster labels, never "기타".
    #[must_use]
    pub fn parse(s: &str) -> Option<WorkLabel> {
        match s {
            "근무" => Some(WorkLabel::Work),
            "휴무" => Some(WorkLabel::Off),
            _ => None,
        }
    }

    /// Day-cell toggle from the preview: off and work swap, anything else becomes work.
    #[must_use]
    pub fn toggled(self) -> WorkLabel {
        match self {
            WorkLabel::Work => WorkLabel::Off,
            WorkLabel::Off | WorkLabel::Other => WorkLabel::Work,
        }
    }
}

impl fmt::Display for WorkLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
