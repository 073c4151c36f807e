use chrono::{DateTime, Days, NaiveDate, Utc};
use ics::{
    escape_text,
    parameters::Value,
    properties::{CalScale, Description, DtEnd, DtStart, Method, Summary},
    ICalendar,
};

use crate::CalendarEvent;

const PRODUCT_ID: &str = "-//Calendar App//EN";

/// Builds an all-day iCalendar feed from `events`, stamped with `stamp`.
#[must_use]
pub fn to_ics(events: &[CalendarEvent], stamp: DateTime<Utc>) -> ICalendar<'_> {
    let mut icalendar = ICalendar::new("2.0", PRODUCT_ID);
    icalendar.push(CalScale::new("GREGORIAN"));
    icalendar.push(Method::new("PUBLISH"));

    let dtstamp = stamp.format("%Y%m%dT%H%M%SZ").to_string();

    for (index, event) in events.iter().enumerate() {
        let uid = match &event.id {
            Some(id) => format!("{id}@calendar-app"),
            None => format!("{}-{index}@calendar-app", stamp.timestamp_millis()),
        };

        icalendar.add_event(event.to_ics(uid, dtstamp.clone()));
    }

    icalendar
}

impl CalendarEvent {
    #[must_use]
    pub fn to_ics(&self, uid: String, dtstamp: String) -> ics::Event<'_> {
        let end = self
            .date
            .checked_add_days(Days::new(1))
            .unwrap_or(self.date);

        let mut start = DtStart::new(basic_date(self.date));
        start.add(Value::new("DATE"));

        let mut finish = DtEnd::new(basic_date(end));
        finish.add(Value::new("DATE"));

        let mut ics_event = ics::Event::new(uid, dtstamp);

        ics_event.push(start);
        ics_event.push(finish);
        ics_event.push(Summary::new(escape_text(self.title.as_str())));

        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            ics_event.push(Description::new(escape_text(description)));
        }

        ics_event
    }
}

fn basic_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Download name for an export made on `today`.
#[must_use]
pub fn export_file_name(today: NaiveDate) -> String {
    format!("calendar-{}.ics", today.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn event(id: Option<&str>, date: NaiveDate, title: &str, description: Option<&str>) -> CalendarEvent {
        CalendarEvent {
            id: id.map(str::to_string),
            date,
            title: title.into(),
            description: description.map(str::to_string),
            category: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn writes_all_day_events() {
        let stamp = Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap();
        let events = vec![
            event(
                Some("abc"),
                NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
                "휴무",
                Some("근무표에서 추출: RGB(176,191,8)"),
            ),
            event(None, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(), "dinner; late", Some("")),
        ];

        let ics = to_ics(&events, stamp).to_string();

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.contains("PRODID:-//Calendar App//EN\r\n"));
        assert!(ics.contains("CALSCALE:GREGORIAN\r\n"));
        assert!(ics.contains("METHOD:PUBLISH\r\n"));
        assert!(ics.contains("UID:abc@calendar-app\r\n"));
        assert!(ics.contains(&format!("UID:{}-1@calendar-app\r\n", stamp.timestamp_millis())));
        assert!(ics.contains("DTSTAMP:20260115T093000Z\r\n"));
        assert!(ics.contains("DTSTART;VALUE=DATE:20261231\r\n"));
        assert!(ics.contains("DTEND;VALUE=DATE:20270101\r\n"));
        assert!(ics.contains("SUMMARY:dinner\\; late\r\n"));
        assert!(ics.contains("DESCRIPTION:근무표에서 추출: RGB(176\\,191\\,8)\r\n"));
        assert_eq!(ics.matches("DESCRIPTION:").count(), 1);
        assert!(ics.trim_end().ends_with("END:VCALENDAR"));
    }

    #[test]
    fn file_name_uses_export_day() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 4).unwrap();
        assert_eq!(export_file_name(today), "calendar-2026-07-04.ics");
    }
}
