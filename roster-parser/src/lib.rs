macro_rules! regex {
    ($pattern:expr) => {{
        static REGEX: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pattern).unwrap());
        &REGEX
    }};
}

mod classify;
mod label;
mod mapping;
mod reply;
mod structs;

#[cfg(feature = "ics")]
mod ics;

pub use classify::{classify, Observation, Rgb, Rule, RULES};
pub use label::WorkLabel;
pub use mapping::{import_events, ImportEntry, MappingRules, ROSTER_CATEGORY};
pub use reply::{parse_reply, ReplyError};
pub use structs::{
    CalendarEvent, DateRange, EventPatch, InvalidEvent, NewEvent, ScheduleEntry, ScheduleSummary,
    CALENDAR_YEAR,
};

#[cfg(feature = "ics")]
pub use self::ics::{export_file_name, to_ics};
