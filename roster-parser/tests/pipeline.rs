use chrono::{NaiveDate, TimeZone, Utc};
use roster_parser::{
    import_events, parse_reply, to_ics, CalendarEvent, DateRange, ImportEntry, MappingRules,
    ScheduleSummary, WorkLabel,
};

const REPLY: &str = r#"```json
[
  {"date": "2026-01-01", "color": "연두색", "type": "휴무", "reasoning": "RGB(176,191,8): G(191)>B(8), 휴무"},
  {"date": "2026-1-2", "color": "파란색", "type": "근무", "reasoning": "RGB(0,130,235): B(235)>G(130), 근무"},
  {"date": "2026/01/03", "color": "sky blue", "type": "휴무", "reasoning": "no measurement"},
  {"date": "2026-01-04", "color": "white", "type": "unknown", "reasoning": ""},
  {"color": "blue"}
]
```"#;

#[test]
fn reply_to_calendar_export() {
    let schedule = parse_reply(REPLY).expect("reply parses");

    let labels = schedule.iter().map(|entry| entry.text).collect::<Vec<_>>();
    assert_eq!(
        labels,
        vec![
            WorkLabel::Off,
            WorkLabel::Work,
            WorkLabel::Work,
            WorkLabel::Other
        ]
    );

    let summary = ScheduleSummary::of(&schedule);
    assert_eq!((summary.off, summary.work, summary.other, summary.total), (1, 2, 1, 4));

    let entries = schedule
        .iter()
        .map(|entry| ImportEntry {
            date: entry.date.clone(),
            text: entry.text.to_string(),
            reasoning: Some(entry.reasoning.clone()),
            flip: entry.text == WorkLabel::Other,
        })
        .collect::<Vec<_>>();

    let events = import_events(&entries, None)
        .into_iter()
        .map(CalendarEvent::unsaved)
        .collect::<Vec<_>>();

    assert_eq!(events.len(), 4);
    assert_eq!(events[1].date, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
    assert_eq!(events[3].title, "근무");
    assert_eq!(events[3].description.as_deref(), Some("근무표에서 추출된 일정"));
    assert!(events.iter().all(|event| DateRange::default().contains(event.date)));

    let stamp = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
    let ics = to_ics(&events, stamp).to_string();
    assert_eq!(ics.matches("BEGIN:VEVENT").count(), 4);
    assert!(ics.contains("DTSTART;VALUE=DATE:20260103\r\n"));
}

#[test]
fn mapping_rules_rename_roster_codes() {
    let entries = ["OFF", "KE902", "ATDO", "SBY"]
        .iter()
        .enumerate()
        .map(|(day, code)| ImportEntry {
            date: format!("2026-02-{:02}", day + 1),
            text: code.to_string(),
            reasoning: None,
            flip: false,
        })
        .collect::<Vec<_>>();

    let titles = import_events(&entries, Some(&MappingRules::default()))
        .into_iter()
        .map(|event| event.title)
        .collect::<Vec<_>>();

    assert_eq!(titles, vec!["휴무", "근무", "휴무", "SBY"]);
}
