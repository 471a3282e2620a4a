//! Human-facing notification text.
//!
//! Headlines arrive as one long sentence ("Flood Warning issued January 5 at
//! 3:15PM MST until January 5 at 6:00PM MST by NWS Denver CO"); the push
//! message wants just the event title and, when one can be parsed, the expiry
//! time with its weekday.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;

/// Hard ceiling imposed by the dashboard's message field.
pub const MAX_MESSAGE_CHARS: usize = 250;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Builds push messages from raw alert headlines.
pub struct NotificationFormatter {
    long_until: Regex,
    numeric_until: Regex,
    until_probe: Regex,
    issued_probe: Regex,
}

impl NotificationFormatter {
    pub fn new() -> Self {
        // "until January 5 at 3:15 PM"
        let long_until = Regex::new(
            r"(?i)\buntil\s+(?P<month>[A-Za-z]+)\s+(?P<day>\d{1,2})\s+at\s+(?P<time>\d{1,2}:\d{2}\s*[AP]M)",
        )
        .expect("invalid long-until pattern");
        // "until 3:15 PM 1/5"
        let numeric_until = Regex::new(
            r"(?i)\buntil\s+(?P<time>\d{1,2}:\d{2}\s*[AP]M)\s+(?P<month>\d{1,2})/(?P<day>\d{1,2})",
        )
        .expect("invalid numeric-until pattern");
        let until_probe = Regex::new(r"(?i) until ").expect("invalid until probe");
        let issued_probe = Regex::new(r"(?i) issued").expect("invalid issued probe");

        Self {
            long_until,
            numeric_until,
            until_probe,
            issued_probe,
        }
    }

    /// Format a headline (or event-name fallback) as a push message.
    pub fn format(&self, raw: &str) -> String {
        self.format_with_year(raw, chrono::Local::now().year())
    }

    /// Same, with the default year pinned; expiry clauses never carry one.
    pub fn format_with_year(&self, raw: &str, year: i32) -> String {
        let text = normalize(raw);
        let title = self.extract_title(&text);

        let message = if !self.until_probe.is_match(&text) {
            plain_message(&title)
        } else if let Some(until) = self.parse_until(&text, year) {
            format!(
                "⚠️  {title} issued until {} {}! Tap for details!",
                format_12h(&until),
                until.format("%A")
            )
        } else {
            plain_message(&title)
        };

        truncate_chars(message, MAX_MESSAGE_CHARS)
    }

    /// Short title: text before the first `": "`, else before ` issued`,
    /// else the whole thing.
    fn extract_title(&self, text: &str) -> String {
        if let Some(idx) = text.find(':') {
            if text[idx + 1..].starts_with(' ') {
                return text[..idx].trim().to_string();
            }
        }
        match self.issued_probe.find(text) {
            Some(found) => text[..found.start()].trim().to_string(),
            None => text.trim().to_string(),
        }
    }

    /// Parse an "until ..." clause into a concrete local date-time.
    ///
    /// An unrecognizable month or an impossible date just means no expiry in
    /// the message, never a failure.
    fn parse_until(&self, text: &str, year: i32) -> Option<NaiveDateTime> {
        if let Some(caps) = self.long_until.captures(text) {
            if let Some(month) = month_number(&caps["month"]) {
                let day: u32 = caps["day"].parse().ok()?;
                if let Some(datetime) = build_datetime(year, month, day, &caps["time"]) {
                    return Some(datetime);
                }
            }
        }
        if let Some(caps) = self.numeric_until.captures(text) {
            let month: u32 = caps["month"].parse().ok()?;
            let day: u32 = caps["day"].parse().ok()?;
            if let Some(datetime) = build_datetime(year, month, day, &caps["time"]) {
                return Some(datetime);
            }
        }
        None
    }
}

impl Default for NotificationFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse whitespace runs (including newlines) to single spaces.
fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn plain_message(title: &str) -> String {
    format!("⚠️  {title} issued. Tap for details!")
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS
        .iter()
        .position(|month| *month == lower)
        .map(|idx| idx as u32 + 1)
}

fn build_datetime(year: i32, month: u32, day: u32, time: &str) -> Option<NaiveDateTime> {
    let compact = time.replace(' ', "").to_uppercase();
    let time = NaiveTime::parse_from_str(&compact, "%I:%M%p").ok()?;
    Some(NaiveDate::from_ymd_opt(year, month, day)?.and_time(time))
}

/// "3:15 PM" style 12-hour rendering.
fn format_12h(datetime: &NaiveDateTime) -> String {
    let hour = match datetime.hour() % 12 {
        0 => 12,
        hour => hour,
    };
    let meridiem = if datetime.hour() < 12 { "AM" } else { "PM" };
    format!("{}:{:02} {}", hour, datetime.minute(), meridiem)
}

fn truncate_chars(message: String, max: usize) -> String {
    if message.chars().count() <= max {
        return message;
    }
    let cut: String = message.chars().take(max - 3).collect();
    format!("{cut}...")
}
