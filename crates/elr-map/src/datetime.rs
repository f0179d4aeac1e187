//! HL7-style date and timestamp handling.
//!
//! Inputs arrive in whatever shape senders use; values that carry an offset
//! keep it, everything else is read as UTC. A bare date is midnight UTC.

#![deny(unsafe_code)]

use chrono::{DateTime, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

/// Output pattern for timestamps with an offset, e.g. `20210302000006-0600`.
pub const HL7_DATETIME_FORMAT: &str = "%Y%m%d%H%M%S%z";

const OFFSET_FORMATS: &[&str] = &[
    "%Y%m%d%H%M%S%.f%z",
    "%Y%m%d%H%M%S%z",
    "%Y%m%d%H%M%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y%m%d%H%M%S%.f",
    "%Y%m%d%H%M%S",
    "%Y%m%d%H%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y%m%d", "%Y-%m-%d", "%m/%d/%Y"];

/// Parses a date or timestamp. Returns `None` for anything unrecognized.
pub fn parse_date_time(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })?;
    Some(naive.and_utc().fixed_offset())
}

pub fn format_hl7(value: &DateTime<FixedOffset>) -> String {
    value.format(HL7_DATETIME_FORMAT).to_string()
}

/// Calendar units accepted by [`add_offset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetUnit {
    Seconds,
    Minutes,
    Days,
    Months,
    Years,
}

impl OffsetUnit {
    /// Accepts singular and plural unit names, case-insensitively.
    pub fn parse(unit: &str) -> Option<Self> {
        match unit.trim().to_lowercase().as_str() {
            "second" | "seconds" => Some(Self::Seconds),
            "minute" | "minutes" => Some(Self::Minutes),
            "day" | "days" => Some(Self::Days),
            "month" | "months" => Some(Self::Months),
            "year" | "years" => Some(Self::Years),
            _ => None,
        }
    }
}

/// Shifts `value` by a signed amount, keeping its offset. `None` on overflow.
pub fn add_offset(
    value: DateTime<FixedOffset>,
    unit: OffsetUnit,
    amount: i64,
) -> Option<DateTime<FixedOffset>> {
    match unit {
        OffsetUnit::Seconds => value.checked_add_signed(TimeDelta::try_seconds(amount)?),
        OffsetUnit::Minutes => value.checked_add_signed(TimeDelta::try_minutes(amount)?),
        OffsetUnit::Days => value.checked_add_signed(TimeDelta::try_days(amount)?),
        OffsetUnit::Months => add_months(value, amount),
        OffsetUnit::Years => add_months(value, amount.checked_mul(12)?),
    }
}

fn add_months(value: DateTime<FixedOffset>, amount: i64) -> Option<DateTime<FixedOffset>> {
    let months = Months::new(u32::try_from(amount.unsigned_abs()).ok()?);
    if amount >= 0 {
        value.checked_add_months(months)
    } else {
        value.checked_sub_months(months)
    }
}

/// Whole years between two instants, as `floor(days / 365)`.
pub fn whole_years_between(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> i64 {
    (to - from).num_days() / 365
}
