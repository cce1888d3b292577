//! WordPress datetime handling.
//!
//! WXR exports carry datetimes as `YYYY-MM-DD HH:MM:SS` (GMT variants in the
//! same shape). Consumers need RFC3339 for sitemap `lastmod` and JSON-LD, and
//! every derived index sorts newest-first, so parsing and ordering live here.

use std::cmp::Ordering;

/// UTC datetime without timezone complexity.
///
/// Field order matters: the derived `Ord` compares year, month, day, hour,
/// minute, second in turn, which is chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WpDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl WpDateTime {
    /// Parse from `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS[Z]` or plain
    /// `YYYY-MM-DD`. Returns `None` for anything else, including the
    /// `0000-00-00 00:00:00` placeholders WordPress emits for never-set
    /// fields.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();

        if bytes.len() < 10 {
            return None;
        }

        let year = parse_u16(&bytes[0..4])?;
        if bytes[4] != b'-' {
            return None;
        }
        let month = parse_u8(&bytes[5..7])?;
        if bytes[7] != b'-' {
            return None;
        }
        let day = parse_u8(&bytes[8..10])?;

        let (hour, minute, second) = if bytes.len() >= 19
            && matches!(bytes[10], b' ' | b'T')
        {
            if bytes[13] != b':' || bytes[16] != b':' {
                return None;
            }
            (
                parse_u8(&bytes[11..13])?,
                parse_u8(&bytes[14..16])?,
                parse_u8(&bytes[17..19])?,
            )
        } else if bytes.len() == 10 {
            (0, 0, 0)
        } else {
            return None;
        };

        let dt = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        };
        dt.is_valid().then_some(dt)
    }

    fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
            && self.day >= 1
            && self.day <= days_in_month(self.year, self.month)
            && self.hour <= 23
            && self.minute <= 59
            && self.second <= 59
    }

    /// Render as RFC3339 with a `Z` suffix.
    pub fn to_rfc3339(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Convert a WordPress datetime string to RFC3339.
///
/// Unparsable input is passed through unchanged so a malformed source date
/// never erases itself from the output.
pub fn iso_date(s: &str) -> String {
    match WpDateTime::parse(s) {
        Some(dt) => dt.to_rfc3339(),
        None => s.to_owned(),
    }
}

/// Newest-first ordering over raw WordPress datetime strings.
///
/// Dated entries come before undated/unparsable ones; two unparsable dates
/// compare equal, so a stable sort keeps their insertion order.
pub fn newest_first(a: &str, b: &str) -> Ordering {
    match (WpDateTime::parse(a), WpDateTime::parse(b)) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn parse_u16(bytes: &[u8]) -> Option<u16> {
    let mut value: u16 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add(u16::from(b - b'0'))?;
    }
    Some(value)
}

fn parse_u8(bytes: &[u8]) -> Option<u8> {
    let mut value: u8 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add(b - b'0')?;
    }
    Some(value)
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

const fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
