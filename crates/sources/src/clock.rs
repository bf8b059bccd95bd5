//! Clock producer
//!
//! Formats the current time and sleeps until the next change of the display:
//! the top of the next minute, or of the next second when the format shows
//! seconds.
//!
//! Formats are accepted in two spellings. Anything containing `%` is taken as
//! a strftime pattern. Otherwise the format is a reference layout, where the
//! reference time `Mon Jan 2 15:04:05 MST 2006` is written the way it should
//! appear (so `15:04` means "hour and minute, 24h").

use chrono::format::{Fixed, Item, Numeric, StrftimeItems};
use chrono::{Local, Timelike, Utc};
use chrono_tz::Tz;
use rg_status_core::{Message, OptionError, Producer, ProducerMetadata};
use rg_status_types::source_configs::ClockSourceConfig;
use std::time::Duration;

/// Reference-layout tokens and their strftime equivalents.
///
/// Longer tokens come first so that e.g. `January` wins over `Jan` and
/// `2006` over `2`.
const LAYOUT_TOKENS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Monday", "%A"),
    (".000000", "%.6f"),
    (".000", "%.3f"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    ("2006", "%Y"),
    ("Jan", "%b"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("_2", "%e"),
    ("01", "%m"),
    ("02", "%d"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("15", "%H"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
];

/// Tokens that only count when no lowercase letter follows, so that words
/// like `Month` or `Janet` stay literal
const WORD_TOKENS: &[&str] = &["Jan", "Mon", "MST"];

/// Translate a reference layout into a strftime pattern
pub fn layout_to_strftime(layout: &str) -> String {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;

    'outer: while !rest.is_empty() {
        for (token, spec) in LAYOUT_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                let word_continues = tail.starts_with(|c: char| c.is_ascii_lowercase());
                if word_continues && WORD_TOKENS.contains(token) {
                    continue;
                }
                out.push_str(spec);
                rest = tail;
                continue 'outer;
            }
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }

    out
}

/// Normalize a configured format to strftime
fn to_strftime(format: &str) -> String {
    if format.contains('%') {
        format.to_string()
    } else {
        layout_to_strftime(format)
    }
}

/// Check a strftime pattern and report whether it shows seconds
fn inspect_strftime(pattern: &str) -> Result<bool, String> {
    let mut seconds = false;
    for item in StrftimeItems::new(pattern) {
        match item {
            Item::Error => return Err(format!("invalid strftime pattern '{}'", pattern)),
            Item::Numeric(Numeric::Second | Numeric::Nanosecond | Numeric::Timestamp, _) => {
                seconds = true
            }
            Item::Fixed(
                Fixed::Nanosecond
                | Fixed::Nanosecond3
                | Fixed::Nanosecond6
                | Fixed::Nanosecond9,
            ) => seconds = true,
            _ => {}
        }
    }
    Ok(seconds)
}

/// Time left until the next whole second or minute
///
/// `second` and `nanos` are the current wall-clock position within the
/// minute.
fn until_next_boundary(second: u32, nanos: u32, seconds_precision: bool) -> Duration {
    // Leap seconds report nanos >= 1e9
    let nanos = nanos % 1_000_000_000;
    let into_second = Duration::from_nanos(nanos as u64);

    if seconds_precision {
        Duration::from_secs(1) - into_second
    } else {
        let second = second.min(59) as u64;
        Duration::from_secs(60 - second) - into_second
    }
}

/// Clock data source
pub struct ClockSource {
    metadata: ProducerMetadata,
    config: ClockSourceConfig,
    pattern: String,
    seconds_precision: bool,
    timezone: Option<Tz>,
}

impl ClockSource {
    /// Build a clock from its configuration, validating format and zone
    pub fn new(config: ClockSourceConfig) -> Result<Self, OptionError> {
        let pattern = to_strftime(&config.format);
        let seconds_precision = inspect_strftime(&pattern)
            .map_err(|e| OptionError::new(ClockSourceConfig::ID, "format", &config.format, e))?;

        let timezone = match &config.timezone {
            None => None,
            Some(name) => Some(name.parse::<Tz>().map_err(|e| {
                OptionError::new(ClockSourceConfig::ID, "timezone", name, e.to_string())
            })?),
        };

        Ok(Self {
            metadata: ProducerMetadata::new(
                ClockSourceConfig::ID,
                "Clock",
                "Current date and time",
            ),
            config,
            pattern,
            seconds_precision,
            timezone,
        })
    }

    /// strftime pattern actually used for formatting
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn shows_seconds(&self) -> bool {
        self.seconds_precision
    }

    fn now_text(&self) -> String {
        match self.timezone {
            Some(tz) => Utc::now().with_timezone(&tz).format(&self.pattern).to_string(),
            None => Local::now().format(&self.pattern).to_string(),
        }
    }
}

impl Producer for ClockSource {
    fn metadata(&self) -> &ProducerMetadata {
        &self.metadata
    }

    fn produce(&mut self) -> Option<Message> {
        Some(Message::with_icon(&self.config.icon, self.now_text()))
    }

    fn suspend_until_next(&mut self) {
        let now = Local::now();
        let wait = until_next_boundary(now.second(), now.nanosecond(), self.seconds_precision);
        std::thread::sleep(wait);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn config(format: &str) -> ClockSourceConfig {
        ClockSourceConfig {
            format: format.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_layout_translation() {
        assert_eq!(layout_to_strftime("15:04"), "%H:%M");
        assert_eq!(layout_to_strftime("15:04:05"), "%H:%M:%S");
        assert_eq!(layout_to_strftime("Mon 2 Jan, 15:04"), "%a %-d %b, %H:%M");
        assert_eq!(layout_to_strftime("Monday, January 02 2006"), "%A, %B %d %Y");
        assert_eq!(layout_to_strftime("3:04 PM"), "%-I:%M %p");
    }

    #[test]
    fn test_layout_words_stay_literal() {
        assert_eq!(layout_to_strftime("Month 01"), "Month %m");
        assert_eq!(layout_to_strftime("Janet Mon"), "Janet %a");
        assert_eq!(layout_to_strftime("MSTx MST"), "MSTx %Z");
    }

    #[test]
    fn test_layout_output_matches_reference() {
        let time = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap();
        let pattern = layout_to_strftime("15:04");
        assert_eq!(time.format(&pattern).to_string(), "14:05");

        let pattern = layout_to_strftime("Mon 2 Jan, 15:04");
        assert_eq!(time.format(&pattern).to_string(), "Thu 7 Mar, 14:05");
    }

    #[test]
    fn test_strftime_passthrough() {
        let clock = ClockSource::new(config("%H:%M")).unwrap();
        assert_eq!(clock.pattern(), "%H:%M");
        assert!(!clock.shows_seconds());
    }

    #[test]
    fn test_seconds_detection() {
        assert!(ClockSource::new(config("15:04:05")).unwrap().shows_seconds());
        assert!(ClockSource::new(config("%T")).unwrap().shows_seconds());
        assert!(!ClockSource::new(config("Mon 2 Jan, 15:04")).unwrap().shows_seconds());
    }

    #[test]
    fn test_invalid_strftime_rejected() {
        let err = ClockSource::new(config("%H:%Q")).err().unwrap();
        assert_eq!(err.key, "format");
    }

    #[test]
    fn test_timezone() {
        let mut cfg = config("%H:%M");
        cfg.timezone = Some("Europe/Paris".to_string());
        assert!(ClockSource::new(cfg.clone()).is_ok());

        cfg.timezone = Some("Mars/Olympus".to_string());
        assert_eq!(ClockSource::new(cfg).err().unwrap().key, "timezone");
    }

    #[test]
    fn test_produce_uses_icon() {
        let mut cfg = config("%Y");
        cfg.icon = "T".to_string();
        let mut clock = ClockSource::new(cfg).unwrap();
        let text = clock.produce().unwrap().text;
        assert!(text.starts_with("T "));
        assert_eq!(text.len(), 6);
    }

    #[test]
    fn test_until_next_boundary() {
        assert_eq!(until_next_boundary(0, 0, false), Duration::from_secs(60));
        assert_eq!(
            until_next_boundary(55, 500_000_000, false),
            Duration::from_millis(4500)
        );
        assert_eq!(
            until_next_boundary(55, 250_000_000, true),
            Duration::from_millis(750)
        );
        assert_eq!(until_next_boundary(59, 1_500_000_000, false), Duration::from_millis(500));
    }
}
