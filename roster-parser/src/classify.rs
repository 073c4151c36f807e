use crate::WorkLabel;

const GREEN_KEYWORDS: &[&str] = &[
    "연두", "lime", "yellow-green", "light green", "chartreuse", "초록", "green", "grass",
    "emerald", "mint", "olive", "verdant", "leaf", "forest", "jade", "teal-green", "#b0bf08",
    "b0bf08",
];

const BLUE_KEYWORDS: &[&str] = &[
    "파란", "하늘", "blue", "cyan", "sky", "azure", "navy", "light blue", "steel blue",
    "royal blue", "powder blue", "cornflower", "turquoise", "aqua", "cerulean", "sapphire",
    "#0082eb", "0082eb", "#57bbe7", "57bbe7",
];

/// The free-text fields a model returns for one roster day.
#[derive(Debug, Clone, Copy, Default)]
pub struct Observation<'a> {
    pub color: &'a str,
    pub declared: &'a str,
    pub reasoning: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u64,
    pub g: u64,
    pub b: u64,
}

impl Rgb {
    /// Finds "RGB(r,g,b)" in free text, falling back to looser "rgb: r g b" spellings.
    #[must_use]
    pub fn find(text: &str) -> Option<Rgb> {
        let captures = regex!(r"(?i)RGB\(([0-9]+),\s*([0-9]+),\s*([0-9]+)\)")
            .captures(text)
            .or_else(|| {
                regex!(r"(?i)rgb[:\s]+([0-9]+)[,\s]+([0-9]+)[,\s]+([0-9]+)").captures(text)
            })?;

        Some(Rgb {
            r: channel(&captures[1]),
            g: channel(&captures[2]),
            b: channel(&captures[3]),
        })
    }

    #[must_use]
    pub fn label(self) -> Option<WorkLabel> {
        if self.b > self.g {
            Some(WorkLabel::Work)
        } else if self.g > self.b {
            Some(WorkLabel::Off)
        } else if self.b >= 150 {
            Some(WorkLabel::Work)
        } else {
            None
        }
    }
}

/// ASCII digits only; values too large for `u64` saturate.
fn channel(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}

pub type Rule = fn(&Observation<'_>) -> Option<WorkLabel>;

/// Label rules in precedence order. The first rule that answers wins.
pub const RULES: [(&str, Rule); 3] = [
    ("channel", channel_rule),
    ("keyword", keyword_rule),
    ("declared", declared_rule),
];

fn channel_rule(observation: &Observation<'_>) -> Option<WorkLabel> {
    Rgb::find(observation.reasoning)?.label()
}

fn keyword_rule(observation: &Observation<'_>) -> Option<WorkLabel> {
    let color = observation.color.to_lowercase();

    if GREEN_KEYWORDS.iter().any(|keyword| color.contains(keyword)) {
        Some(WorkLabel::Off)
    } else if BLUE_KEYWORDS.iter().any(|keyword| color.contains(keyword)) {
        Some(WorkLabel::Work)
    } else {
        None
    }
}

fn declared_rule(observation: &Observation<'_>) -> Option<WorkLabel> {
    WorkLabel::parse(observation.declared)
}

#[must_use]
pub fn classify(observation: &Observation<'_>) -> WorkLabel {
    RULES
        .iter()
        .find_map(|(name, rule)| {
            let label = rule(observation)?;
            log::trace!("{name} rule labelled day as {label}");
            Some(label)
        })
        .unwrap_or(WorkLabel::Other)
}
