use serde_json::Value;

use crate::{classify, Observation, ScheduleEntry};

#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    #[error("model reply does not contain JSON")]
    NotJson,
    #[error("model reply contains malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("model reply is not a JSON array")]
    NotAnArray,
}

/// Turns a model's free-text reply into schedule rows, re-deriving every label.
pub fn parse_reply(content: &str) -> Result<Vec<ScheduleEntry>, ReplyError> {
    let text = strip_fences(content.trim());

    let value = match serde_json::from_str::<Value>(&text) {
        Ok(value) => value,
        Err(err) => {
            log::debug!("Reply is not plain JSON ({err}), looking for an embedded array");
            let embedded = regex!(r"\[[\s\S]*\]")
                .find(&text)
                .ok_or(ReplyError::NotJson)?;
            serde_json::from_str(embedded.as_str())?
        }
    };

    let Value::Array(items) = value else {
        return Err(ReplyError::NotAnArray);
    };

    Ok(items.iter().filter_map(schedule_entry).collect())
}

fn strip_fences(text: &str) -> String {
    if text.starts_with("```json") {
        let text = regex!(r"```json\n?").replace_all(text, "");
        regex!(r"```\n?").replace_all(&text, "").into_owned()
    } else if text.starts_with("```") {
        regex!(r"```\n?").replace_all(text, "").into_owned()
    } else {
        text.to_string()
    }
}

fn schedule_entry(item: &Value) -> Option<ScheduleEntry> {
    let date = match item.get("date")? {
        Value::String(date) if !date.is_empty() => normalize_date(date),
        Value::Null | Value::Bool(false) | Value::String(_) => return None,
        Value::Number(number) if number.as_f64() == Some(0.0) => return None,
        other => other.to_string(),
    };

    let color = text_field(item, "color");
    let reasoning = text_field(item, "reasoning");

    let text = classify(&Observation {
        color,
        declared: text_field(item, "type"),
        reasoning,
    });

    Some(ScheduleEntry {
        date,
        text,
        original_color: color.to_string(),
        reasoning: reasoning.to_string(),
    })
}

fn text_field<'a>(item: &'a Value, key: &str) -> &'a str {
    item.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Pads "2026-1-5" or "2026/01/5" to "2026-01-05"; anything else is kept verbatim.
fn normalize_date(raw: &str) -> String {
    let Some(captures) = regex!(r"([0-9]{4})[-/]([0-9]{1,2})[-/]([0-9]{1,2})").captures(raw) else {
        return raw.to_string();
    };

    format!(
        "{}-{:0>2}-{:0>2}",
        &captures[1], &captures[2], &captures[3]
    )
}
