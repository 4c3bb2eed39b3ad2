//! UTC calendar instants and the compact `sys.ISODate` text form.
//!
//! Dates travel through JSON as a class-hinted wrapper object:
//!
//! ```text
//! {"jsonclass":["sys.ISODate", ["20240305T07:08:09"]]}
//! ```
//!
//! The compact form has second precision and no zone designator; it is
//! always UTC. Plain JSON consumers see an ordinary object, so only
//! decoders that know the wrapper (see [`crate::revive_dates`]) get a
//! [`crate::Value::Date`] back.

use crate::error::{CodecError, Result};
use std::fmt;

const SECONDS_PER_DAY: i64 = 86_400;

/// Byte positions of a fixed-width timestamp format.
struct Layout {
    len: usize,
    literals: &'static [(usize, u8)],
    /// Year, month, day, hour, minute, second.
    fields: [(usize, usize); 6],
}

const COMPACT_LAYOUT: Layout = Layout {
    len: 17,
    literals: &[(8, b'T'), (11, b':'), (14, b':')],
    fields: [(0, 4), (4, 6), (6, 8), (9, 11), (12, 14), (15, 17)],
};

const RFC3339_LAYOUT: Layout = Layout {
    len: 20,
    literals: &[
        (4, b'-'),
        (7, b'-'),
        (10, b'T'),
        (13, b':'),
        (16, b':'),
        (19, b'Z'),
    ],
    fields: [(0, 4), (5, 7), (8, 10), (11, 13), (14, 16), (17, 19)],
};

/// An instant expressed as UTC calendar fields, second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl UtcDateTime {
    /// Build from calendar fields, validating every range.
    ///
    /// Years are limited to `0..=9999` so the compact form stays four digits.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Result<Self> {
        if year > 9999 {
            return Err(CodecError::InvalidDate(format!("year {} out of range", year)));
        }
        if !(1..=12).contains(&month) {
            return Err(CodecError::InvalidDate(format!("month {} out of range", month)));
        }
        let max_day = days_in_month(year, month);
        if day == 0 || day > max_day {
            return Err(CodecError::InvalidDate(format!(
                "day {} out of range for {:04}-{:02}",
                day, year, month
            )));
        }
        if hour > 23 {
            return Err(CodecError::InvalidDate(format!("hour {} out of range", hour)));
        }
        if minute > 59 {
            return Err(CodecError::InvalidDate(format!("minute {} out of range", minute)));
        }
        if second > 59 {
            return Err(CodecError::InvalidDate(format!("second {} out of range", second)));
        }
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Build from seconds since the Unix epoch.
    pub fn from_unix_seconds(secs: i64) -> Result<Self> {
        let days = secs.div_euclid(SECONDS_PER_DAY);
        let rem = secs.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        if !(0..=9999).contains(&year) {
            return Err(CodecError::InvalidDate(format!(
                "timestamp {} is outside years 0..=9999",
                secs
            )));
        }
        Self::new(
            year as u16,
            month,
            day,
            (rem / 3600) as u8,
            (rem % 3600 / 60) as u8,
            (rem % 60) as u8,
        )
    }

    /// Seconds since the Unix epoch.
    pub fn to_unix_seconds(&self) -> i64 {
        let days = days_from_civil(self.year as i64, self.month, self.day);
        days * SECONDS_PER_DAY
            + self.hour as i64 * 3600
            + self.minute as i64 * 60
            + self.second as i64
    }

    /// Parse the compact `YYYYMMDDTHH:MM:SS` form.
    pub fn parse_compact(text: &str) -> Result<Self> {
        Self::parse_fixed(text, &COMPACT_LAYOUT, "YYYYMMDDTHH:MM:SS")
    }

    /// Parse `YYYY-MM-DDTHH:MM:SSZ`. Only the UTC designator is accepted.
    pub fn parse_rfc3339(text: &str) -> Result<Self> {
        Self::parse_fixed(text, &RFC3339_LAYOUT, "YYYY-MM-DDTHH:MM:SSZ")
    }

    fn parse_fixed(text: &str, layout: &Layout, expected: &str) -> Result<Self> {
        let b = text.as_bytes();
        let shape_ok = b.len() == layout.len
            && layout.literals.iter().all(|&(at, c)| b[at] == c)
            && layout
                .fields
                .iter()
                .all(|&(from, to)| b[from..to].iter().all(u8::is_ascii_digit));
        if !shape_ok {
            return Err(CodecError::InvalidDate(format!(
                "expected {}, got {:?}",
                expected, text
            )));
        }
        let [year, month, day, hour, minute, second] = layout.fields.map(|(from, to)| {
            b[from..to]
                .iter()
                .fold(0u16, |acc, d| acc * 10 + (d - b'0') as u16)
        });
        Self::new(
            year,
            month as u8,
            day as u8,
            hour as u8,
            minute as u8,
            second as u8,
        )
    }

    /// The compact `YYYYMMDDTHH:MM:SS` form used inside the wrapper.
    pub fn to_compact(&self) -> String {
        format!(
            "{:04}{:02}{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }

    /// RFC 3339 text with a `Z` designator.
    pub fn to_rfc3339(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }
}

impl fmt::Display for UtcDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

// Proleptic Gregorian day arithmetic over 400-year eras, day 0 = 1970-01-01.

fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

fn days_from_civil(year: i64, month: u8, day: u8) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y.rem_euclid(400);
    let m = month as i64;
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}
