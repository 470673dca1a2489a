//! # Business Day
//!
//! Which calendar day a closing belongs to.
//!
//! Timestamps are stored in UTC, but a counter's day runs midnight to
//! midnight on the wall clock. An order closed at 22:30 in São Paulo is
//! 01:30Z the next day and still counts toward tonight's revenue.
//!
//! ```text
//! closed_at 2026-10-20T01:30:00Z
//!     │
//!     ├── DayClock::Fixed(-03:00) ─► 2026-10-19 22:30 ─► day 2026-10-19
//!     └── DayClock::Fixed(+00:00) ─► 2026-10-20 01:30 ─► day 2026-10-20
//! ```

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc};

/// Maps instants to business days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayClock {
    /// The machine's local time zone.
    #[default]
    Local,
    /// A fixed UTC offset, for hosts whose zone differs from the counter's.
    Fixed(FixedOffset),
}

impl DayClock {
    /// Parses `"local"` or an offset such as `"-03:00"`, `"+0530"`, `"Z"`.
    ///
    /// ```rust
    /// use comanda_core::clock::DayClock;
    ///
    /// assert_eq!(DayClock::parse("local"), Some(DayClock::Local));
    /// let sp = DayClock::parse("-03:00").unwrap();
    /// assert_eq!(sp.utc_offset_on(chrono::NaiveDate::MIN).local_minus_utc(), -3 * 3600);
    /// assert!(DayClock::parse("-3h").is_none());
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("local") {
            return Some(DayClock::Local);
        }
        if text.eq_ignore_ascii_case("z") || text.eq_ignore_ascii_case("utc") {
            return FixedOffset::east_opt(0).map(DayClock::Fixed);
        }

        let (sign, rest) = match text.as_bytes().first()? {
            b'+' => (1, &text[1..]),
            b'-' => (-1, &text[1..]),
            _ => return None,
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let hours: i32 = digits[..2].parse().ok()?;
        let minutes: i32 = digits[2..].parse().ok()?;
        if hours > 14 || minutes > 59 {
            return None;
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).map(DayClock::Fixed)
    }

    /// Today's business day.
    pub fn today(&self) -> NaiveDate {
        self.day_of(Utc::now())
    }

    /// The business day `at` falls on.
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            DayClock::Local => at.with_timezone(&Local).date_naive(),
            DayClock::Fixed(offset) => at.with_timezone(offset).date_naive(),
        }
    }

    /// The UTC offset in force on `day`.
    ///
    /// For [`DayClock::Local`] this is the offset at local noon, so a
    /// daylight-saving switch during the night does not move the day.
    pub fn utc_offset_on(&self, day: NaiveDate) -> FixedOffset {
        match self {
            DayClock::Fixed(offset) => *offset,
            DayClock::Local => day
                .and_hms_opt(12, 0, 0)
                .and_then(|noon| Local.from_local_datetime(&noon).single())
                .map(|noon| noon.offset().fix())
                .unwrap_or_else(|| Local::now().offset().fix()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
