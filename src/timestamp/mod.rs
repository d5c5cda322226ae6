//! Timestamp normalization.
//!
//! Raw timestamp strings extracted from evidence arrive in whatever shape the
//! source document used: ISO 8601, syslog stamps, month-name forms, with or
//! without fractional seconds or a UTC offset. [`normalize`] parses them with
//! an ordered format table, anchors the result to UTC, and renders it in the
//! analyst's requested target zone.
//!
//! Parsing and UTC-anchoring are deliberately separated from target-zone
//! rendering: once a UTC instant has been established it is never lost to a
//! downstream display failure. A bad target zone degrades only the formatted
//! string.
//!
//! Naive timestamps are assumed to be UTC. The source text is evidence, so
//! its interpretation must not depend on the analyst machine's locale.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::format::ParseErrorKind;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use log::{debug, warn};
use serde::Serialize;

/// Placeholder for absent timestamps, shared with the report layer.
pub const UNAVAILABLE: &str = "N/A";

/// Tag for input that no format in the table recognizes.
pub const PARSE_ERROR: &str = "Error Parsing";
/// Tag for input that is structurally a date/time but semantically invalid
/// (month 13, day 99).
pub const PARSE_TYPE_ERROR: &str = "Error Tipo Parsing";
/// Tag for an internal parser fault (broken format table).
pub const PARSE_INTERNAL_ERROR: &str = "Error Interno (Parseo)";
/// Tag for a target zone the timezone database does not know.
pub const TZ_LOOKUP_ERROR: &str = "Error TZ Interno";
/// Tag for an unexpected fault while rendering the converted string.
pub const TZ_CONVERT_ERROR: &str = "Error Interno (TZ Conv.)";
/// Tag for an unexpected fault while rendering the UTC audit string.
pub const UTC_FORMAT_ERROR: &str = "Error Formato UTC";

const UTC_AUDIT_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
const TARGET_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z%z";

/// Formats carrying an explicit UTC offset.
const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y/%m/%d %H:%M:%S%.f %z",
    "%b %d %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
    "%d/%m/%Y %H:%M:%S %z",
];

/// Offset-less formats, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%b %d %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
];

/// Date-only formats, anchored to midnight UTC.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%b-%Y"];

/// Result of normalizing one raw timestamp string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedTimestamp {
    /// The UTC instant, `None` iff parsing failed or the input was empty.
    pub instant: Option<DateTime<Utc>>,
    /// Immutable audit rendering, `YYYY-MM-DD HH:MM:SS UTC`, or a tag.
    pub utc_str: String,
    /// Rendering in the requested target zone, or a display-error tag.
    pub converted_str: String,
}

impl NormalizedTimestamp {
    fn unavailable() -> Self {
        NormalizedTimestamp {
            instant: None,
            utc_str: UNAVAILABLE.to_string(),
            converted_str: UNAVAILABLE.to_string(),
        }
    }

    fn unparsed(tag: &str) -> Self {
        NormalizedTimestamp {
            instant: None,
            utc_str: UNAVAILABLE.to_string(),
            converted_str: tag.to_string(),
        }
    }
}

/// Parses `raw`, anchors it to UTC, and renders it in `target_tz`.
///
/// Empty, whitespace-only, and `"N/A"` input yields `N/A` strings with no
/// instant. An unknown `target_tz` keeps the instant and degrades only the
/// converted string to [`TZ_LOOKUP_ERROR`].
pub fn normalize(raw: &str, target_tz: &str) -> NormalizedTimestamp {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == UNAVAILABLE {
        return NormalizedTimestamp::unavailable();
    }

    let instant = match parse_to_utc(trimmed) {
        Ok(instant) => instant,
        Err(tag) => {
            warn!("Could not parse timestamp {:?}: {}", raw, tag);
            return NormalizedTimestamp::unparsed(tag);
        }
    };

    let converted_str = match resolve_target_zone(target_tz) {
        Some(tz) => render(&instant.with_timezone(&tz), TARGET_FORMAT, TZ_CONVERT_ERROR),
        None => {
            // The instant is still valid evidence; only display conversion failed.
            warn!("Unknown target timezone {:?}", target_tz);
            TZ_LOOKUP_ERROR.to_string()
        }
    };

    NormalizedTimestamp {
        utc_str: render(&instant, UTC_AUDIT_FORMAT, UTC_FORMAT_ERROR),
        converted_str,
        instant: Some(instant),
    }
}

/// Resolves a target-zone name against the IANA database.
///
/// `"UTC"` is accepted literally. Fixed-offset names use the POSIX
/// `Etc/GMT±N` table, whose sign is inverted relative to common usage:
/// `Etc/GMT+5` is the zone at UTC−5. That inversion is preserved from the
/// underlying database on purpose and locked by a regression test.
fn resolve_target_zone(name: &str) -> Option<Tz> {
    let trimmed = name.trim();
    if trimmed == "UTC" {
        return Some(chrono_tz::UTC);
    }
    Tz::from_str(trimmed).ok()
}

fn parse_to_utc(s: &str) -> Result<DateTime<Utc>, &'static str> {
    let mut worst = FailureClass::Unrecognized;

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in AWARE_FORMATS {
        match DateTime::parse_from_str(s, format) {
            Ok(dt) => {
                debug!("Timestamp {:?} carries an offset; converting to UTC", s);
                return Ok(dt.with_timezone(&Utc));
            }
            Err(e) => worst.note(e.kind()),
        }
    }

    // A trailing zone *name* is only honored for UTC aliases; anything else
    // would need a full abbreviation table and silently guessing offsets from
    // ambiguous abbreviations corrupts evidence.
    let naive_input = s
        .strip_suffix(" UTC")
        .or_else(|| s.strip_suffix(" GMT"))
        .unwrap_or(s)
        .trim_end();

    for format in NAIVE_FORMATS {
        match NaiveDateTime::parse_from_str(naive_input, format) {
            Ok(naive) => {
                debug!("Timestamp {:?} is naive; assuming UTC", s);
                return Ok(naive.and_utc());
            }
            Err(e) => worst.note(e.kind()),
        }
    }

    for format in DATE_FORMATS {
        match NaiveDate::parse_from_str(naive_input, format) {
            Ok(date) => {
                return date
                    .and_hms_opt(0, 0, 0)
                    .map(|naive| naive.and_utc())
                    .ok_or(PARSE_INTERNAL_ERROR);
            }
            Err(e) => worst.note(e.kind()),
        }
    }

    // Year-less syslog stamps ("Mar 15 10:30:00"): assume the current year.
    let with_year = format!("{} {}", Utc::now().year(), naive_input);
    match NaiveDateTime::parse_from_str(&with_year, "%Y %b %d %H:%M:%S") {
        Ok(naive) => return Ok(naive.and_utc()),
        Err(e) => worst.note(e.kind()),
    }

    Err(worst.tag())
}

/// Tracks the most informative failure across all parse attempts.
enum FailureClass {
    Unrecognized,
    OutOfRange,
    Internal,
}

impl FailureClass {
    fn note(&mut self, kind: ParseErrorKind) {
        let next = match kind {
            ParseErrorKind::OutOfRange | ParseErrorKind::Impossible => FailureClass::OutOfRange,
            ParseErrorKind::BadFormat => FailureClass::Internal,
            _ => FailureClass::Unrecognized,
        };
        if next.rank() > self.rank() {
            *self = next;
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FailureClass::Unrecognized => 0,
            FailureClass::OutOfRange => 1,
            FailureClass::Internal => 2,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            FailureClass::Unrecognized => PARSE_ERROR,
            FailureClass::OutOfRange => PARSE_TYPE_ERROR,
            FailureClass::Internal => PARSE_INTERNAL_ERROR,
        }
    }
}

fn render<T: chrono::TimeZone>(instant: &DateTime<T>, format: &str, fallback: &str) -> String
where
    T::Offset: std::fmt::Display,
{
    let mut out = String::new();
    match write!(out, "{}", instant.format(format)) {
        Ok(()) => out,
        Err(_) => fallback.to_string(),
    }
}
