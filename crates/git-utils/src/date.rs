use bstr::{BStr, BString, ByteSlice, ByteVec};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};

use crate::error::UtilError;
use crate::Result;

/// A timestamp plus the timezone offset it was recorded under.
///
/// Git stores both halves independently: the timestamp is always seconds
/// since the Unix epoch (so ordering and diffing never depend on timezone),
/// but the offset is preserved for display so "git log" shows commits in
/// the author's own local time rather than the reader's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitDate {
    pub timestamp: i64,
    /// Offset from UTC, in minutes (e.g. -300 for US Eastern Standard Time).
    pub tz_offset: i32,
}

/// Output styles a [`GitDate`] can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// "2 hours ago"
    Relative,
    /// Locale-dependent local time
    Local,
    /// "2025-01-15 12:00:00 +0000"
    Iso,
    /// "2025-01-15T12:00:00+00:00"
    IsoStrict,
    /// "Wed, 15 Jan 2025 12:00:00 +0000"
    Rfc2822,
    /// "2025-01-15"
    Short,
    /// "1736942400 +0000"
    Raw,
    /// Relative for recent dates, [`DateFormat::Iso`] otherwise.
    Human,
    /// Unix timestamp only, no offset.
    Unix,
    /// "Thu Feb 13 23:31:30 2009 +0000"
    Default,
}

/// A timezone written the way git stores it: `+HHMM` or `-HHMM` packed into
/// a single signed integer, e.g. `-500` for five hours behind UTC. This
/// helper converts that packed form to and from plain minutes-from-UTC.
struct PackedOffset(i32);

impl PackedOffset {
    fn to_minutes(&self) -> i32 {
        let magnitude = self.0.unsigned_abs() as i32;
        let sign = if self.0 < 0 { -1 } else { 1 };
        sign * (magnitude / 100 * 60 + magnitude % 100)
    }

    fn from_minutes(minutes: i32) -> Self {
        let magnitude = minutes.unsigned_abs() as i32;
        let sign = if minutes < 0 { -1 } else { 1 };
        Self(sign * (magnitude / 60 * 100 + magnitude % 60))
    }
}

fn local_offset_minutes() -> i32 {
    Local::now().offset().local_minus_utc() / 60
}

impl GitDate {
    pub fn new(timestamp: i64, tz_offset_minutes: i32) -> Self {
        Self {
            timestamp,
            tz_offset: tz_offset_minutes,
        }
    }

    /// The current instant, stamped with the local timezone offset.
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            timestamp: now.timestamp(),
            tz_offset: now.offset().local_minus_utc() / 60,
        }
    }

    /// Parse a date in any format git accepts on the command line: raw
    /// `timestamp tz`, `@timestamp`, ISO 8601 (loose or strict), RFC 2822,
    /// or a bare `YYYY-MM-DD`.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(UtilError::DateParse("empty date string".into()));
        }

        if let Some(ts_str) = input.strip_prefix('@') {
            return Self::parse_raw(ts_str);
        }
        if let Ok(date) = Self::parse_raw(input) {
            return Ok(date);
        }
        if let Some(date) = parse_offset_str(input, |s| DateTime::parse_from_rfc3339(s)) {
            return Ok(date);
        }
        if let Some(date) = parse_offset_str(input, |s| DateTime::parse_from_rfc2822(s)) {
            return Ok(date);
        }
        if let Some(date) =
            parse_offset_str(input, |s| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z"))
        {
            return Ok(date);
        }
        if let Some(date) = parse_bare_date(input) {
            return Ok(date);
        }

        Err(UtilError::DateParse(format!(
            "unable to parse date: '{}'",
            input
        )))
    }

    /// Parse the on-disk form git uses in commit/tag headers: `timestamp tz`,
    /// or just `timestamp` (offset defaults to UTC).
    pub fn parse_raw(input: &str) -> Result<Self> {
        let input = input.trim();
        let (ts_part, tz_part) = match input.split_once(' ') {
            Some((a, b)) => (a, Some(b.trim())),
            None => (input, None),
        };

        let timestamp: i64 = ts_part
            .parse()
            .map_err(|_| UtilError::DateParse(format!("invalid timestamp: '{}'", ts_part)))?;

        let tz_offset = match tz_part {
            Some(tz_str) => {
                let packed: i32 = tz_str
                    .parse()
                    .map_err(|_| UtilError::DateParse(format!("invalid timezone: '{}'", tz_str)))?;
                PackedOffset(packed).to_minutes()
            }
            None => 0,
        };

        Ok(Self {
            timestamp,
            tz_offset,
        })
    }

    /// Parse the informal "approxidate" syntax used by `--since`/`--until`:
    /// `now`, `yesterday`, or `N <unit> ago`, in addition to anything
    /// [`GitDate::parse`] already accepts.
    pub fn parse_approxidate(input: &str) -> Result<Self> {
        let input = input.trim().to_lowercase();

        if let Ok(date) = Self::parse(&input) {
            return Ok(date);
        }
        if input == "now" {
            return Ok(Self::now());
        }
        if input == "yesterday" {
            return Ok(Self::seconds_ago(86400));
        }
        if let Some(rest) = input.strip_suffix(" ago") {
            if let Some(date) = parse_n_units_ago(rest) {
                return Ok(date);
            }
        }

        Err(UtilError::DateParse(format!(
            "unable to parse approxidate: '{}'",
            input
        )))
    }

    fn seconds_ago(seconds: i64) -> Self {
        Self {
            timestamp: Utc::now().timestamp() - seconds,
            tz_offset: local_offset_minutes(),
        }
    }

    pub fn format(&self, fmt: DateFormat) -> String {
        match fmt {
            DateFormat::Raw => {
                let PackedOffset(packed) = PackedOffset::from_minutes(self.tz_offset);
                format!("{} {:+05}", self.timestamp, packed)
            }
            DateFormat::Unix => self.timestamp.to_string(),
            DateFormat::Relative => self.format_relative(),
            DateFormat::Human => self.format_human(),
            DateFormat::Local => {
                let local_dt = DateTime::from_timestamp(self.timestamp, 0)
                    .unwrap_or(DateTime::UNIX_EPOCH)
                    .with_timezone(&Local);
                local_dt.format("%a %b %e %H:%M:%S %Y").to_string()
            }
            DateFormat::Default | DateFormat::Iso | DateFormat::IsoStrict | DateFormat::Rfc2822
            | DateFormat::Short => {
                let dt = self.with_stored_offset();
                let pattern = match fmt {
                    DateFormat::Default => "%a %b %e %H:%M:%S %Y %z",
                    DateFormat::Iso => "%Y-%m-%d %H:%M:%S %z",
                    DateFormat::IsoStrict => "%Y-%m-%dT%H:%M:%S%:z",
                    DateFormat::Rfc2822 => "%a, %d %b %Y %H:%M:%S %z",
                    DateFormat::Short => "%Y-%m-%d",
                    _ => unreachable!(),
                };
                dt.format(pattern).to_string()
            }
        }
    }

    fn with_stored_offset(&self) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.tz_offset * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
        DateTime::from_timestamp(self.timestamp, 0)
            .unwrap_or(DateTime::UNIX_EPOCH)
            .with_timezone(&offset)
    }

    fn format_relative(&self) -> String {
        let diff = Utc::now().timestamp() - self.timestamp;
        if diff < 0 {
            return "in the future".to_string();
        }

        const MINUTE: i64 = 60;
        const HOUR: i64 = 60 * MINUTE;
        const DAY: i64 = 24 * HOUR;
        const WEEK: i64 = 7 * DAY;
        const MONTH: i64 = 30 * DAY;
        const YEAR: i64 = 365 * DAY;

        let bucket = |count: i64, singular: &str, plural: &str| {
            if count == 1 {
                format!("1 {} ago", singular)
            } else {
                format!("{} {} ago", count, plural)
            }
        };

        match diff {
            d if d < 2 => "just now".to_string(),
            d if d < MINUTE => bucket(d, "second", "seconds"),
            d if d < HOUR => bucket((d / MINUTE).max(1), "minute", "minutes"),
            d if d < DAY => bucket((d / HOUR).max(1), "hour", "hours"),
            d if d < WEEK => bucket((d / DAY).max(1), "day", "days"),
            d if d < MONTH => bucket((d / WEEK).max(1), "week", "weeks"),
            d if d < YEAR => bucket((d / MONTH).max(1), "month", "months"),
            d if d < 2 * YEAR => "1 year ago".to_string(),
            d => {
                let years = d / YEAR;
                let months = (d % YEAR) / MONTH;
                if months > 0 {
                    format!("{} years, {} months ago", years, months)
                } else {
                    format!("{} years ago", years)
                }
            }
        }
    }

    fn format_human(&self) -> String {
        let diff = Utc::now().timestamp() - self.timestamp;
        if (0..7 * 86400).contains(&diff) {
            self.format_relative()
        } else {
            self.format(DateFormat::Iso)
        }
    }

    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.tz_offset * 60)?;
        DateTime::from_timestamp(self.timestamp, 0).map(|dt| dt.with_timezone(&offset))
    }
}

fn parse_offset_str<F, E>(input: &str, parser: F) -> Option<GitDate>
where
    F: Fn(&str) -> std::result::Result<DateTime<FixedOffset>, E>,
{
    let dt = parser(input).ok()?;
    Some(GitDate {
        timestamp: dt.timestamp(),
        tz_offset: dt.offset().local_minus_utc() / 60,
    })
}

fn parse_bare_date(input: &str) -> Option<GitDate> {
    let nd = NaiveDateTime::parse_from_str(&format!("{} 00:00:00", input), "%Y-%m-%d %H:%M:%S").ok()?;
    let offset_minutes = local_offset_minutes();
    let offset =
        FixedOffset::east_opt(offset_minutes * 60).unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
    let dt = offset.from_local_datetime(&nd).earliest()?;
    Some(GitDate {
        timestamp: dt.timestamp(),
        tz_offset: offset_minutes,
    })
}

fn parse_n_units_ago(rest: &str) -> Option<GitDate> {
    let (count_str, unit) = rest.split_once(' ')?;
    let count: i64 = count_str.parse().ok()?;
    let seconds = match unit.trim_end_matches('s') {
        "second" => count,
        "minute" => count * 60,
        "hour" => count * 3600,
        "day" => count * 86400,
        "week" => count * 7 * 86400,
        "month" => count * 30 * 86400,
        "year" => count * 365 * 86400,
        _ => return None,
    };
    Some(GitDate::seconds_ago(seconds))
}

/// An author or committer identity as stored in commit/tag headers:
/// `Name <email> timestamp tz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: BString,
    pub email: BString,
    pub date: GitDate,
}

impl Signature {
    pub fn parse(input: &BStr) -> Result<Self> {
        let input = input.as_bytes();

        let gt_pos = input
            .iter()
            .rposition(|&b| b == b'>')
            .ok_or_else(|| UtilError::DateParse("missing '>' in signature".into()))?;
        let lt_pos = input[..gt_pos]
            .iter()
            .rposition(|&b| b == b'<')
            .ok_or_else(|| UtilError::DateParse("missing '<' in signature".into()))?;

        let name = input[..lt_pos].trim();
        let email = &input[lt_pos + 1..gt_pos];
        let date_str = input[gt_pos + 1..].trim();
        let date_str = std::str::from_utf8(date_str)
            .map_err(|_| UtilError::DateParse("non-UTF-8 date in signature".into()))?;

        Ok(Self {
            name: BString::from(name),
            email: BString::from(email),
            date: GitDate::parse_raw(date_str)?,
        })
    }

    pub fn to_bytes(&self) -> BString {
        let PackedOffset(packed) = PackedOffset::from_minutes(self.date.tz_offset);
        let mut out = BString::new(Vec::new());
        out.push_str(&self.name);
        out.push_str(b" <");
        out.push_str(&self.email);
        out.push_str(b"> ");
        out.push_str(format!("{} {:+05}", self.date.timestamp, packed).as_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_raw() {
        let d = GitDate::parse_raw("1234567890 +0000").unwrap();
        assert_eq!(d.timestamp, 1234567890);
        assert_eq!(d.tz_offset, 0);
    }

    #[test]
    fn parse_raw_negative_tz() {
        let d = GitDate::parse_raw("1234567890 -0500").unwrap();
        assert_eq!(d.timestamp, 1234567890);
        assert_eq!(d.tz_offset, -300);
    }

    #[test]
    fn parse_raw_positive_tz() {
        let d = GitDate::parse_raw("1234567890 +0530").unwrap();
        assert_eq!(d.timestamp, 1234567890);
        assert_eq!(d.tz_offset, 330);
    }

    #[test]
    fn parse_raw_no_tz_defaults_utc() {
        let d = GitDate::parse_raw("1234567890").unwrap();
        assert_eq!(d.tz_offset, 0);
    }

    #[test]
    fn parse_at_timestamp() {
        let d = GitDate::parse("@1234567890").unwrap();
        assert_eq!(d.timestamp, 1234567890);
        assert_eq!(d.tz_offset, 0);
    }

    #[test]
    fn parse_iso8601() {
        let d = GitDate::parse("2025-01-15T12:00:00+00:00").unwrap();
        assert_eq!(d.timestamp, 1736942400);
        assert_eq!(d.tz_offset, 0);
    }

    #[test]
    fn parse_rfc2822() {
        let d = GitDate::parse("Wed, 15 Jan 2025 12:00:00 +0000").unwrap();
        assert_eq!(d.timestamp, 1736942400);
        assert_eq!(d.tz_offset, 0);
    }

    #[test]
    fn parse_git_iso() {
        let d = GitDate::parse("2025-01-15 12:00:00 +0000").unwrap();
        assert_eq!(d.timestamp, 1736942400);
        assert_eq!(d.tz_offset, 0);
    }

    #[test]
    fn format_raw() {
        let d = GitDate::new(1234567890, 0);
        assert_eq!(d.format(DateFormat::Raw), "1234567890 +0000");
    }

    #[test]
    fn format_raw_negative_tz() {
        let d = GitDate::new(1234567890, -300);
        assert_eq!(d.format(DateFormat::Raw), "1234567890 -0500");
    }

    #[test]
    fn format_unix() {
        let d = GitDate::new(1234567890, 0);
        assert_eq!(d.format(DateFormat::Unix), "1234567890");
    }

    #[test]
    fn format_short() {
        let d = GitDate::new(1736942400, 0);
        assert_eq!(d.format(DateFormat::Short), "2025-01-15");
    }

    #[test]
    fn format_iso() {
        let d = GitDate::new(1736942400, 0);
        assert_eq!(d.format(DateFormat::Iso), "2025-01-15 12:00:00 +0000");
    }

    #[test]
    fn format_iso_strict() {
        let d = GitDate::new(1736942400, 0);
        assert_eq!(d.format(DateFormat::IsoStrict), "2025-01-15T12:00:00+00:00");
    }

    #[test]
    fn format_rfc2822() {
        let d = GitDate::new(1736942400, 0);
        assert_eq!(
            d.format(DateFormat::Rfc2822),
            "Wed, 15 Jan 2025 12:00:00 +0000"
        );
    }

    #[test]
    fn approxidate_yesterday() {
        let d = GitDate::parse_approxidate("yesterday").unwrap();
        let now = Utc::now().timestamp();
        assert!((now - d.timestamp - 86400).unsigned_abs() < 5);
    }

    #[test]
    fn approxidate_n_days_ago() {
        let d = GitDate::parse_approxidate("3 days ago").unwrap();
        let now = Utc::now().timestamp();
        assert!((now - d.timestamp - 3 * 86400).unsigned_abs() < 5);
    }

    #[test]
    fn approxidate_n_weeks_ago() {
        let d = GitDate::parse_approxidate("2 weeks ago").unwrap();
        let now = Utc::now().timestamp();
        assert!((now - d.timestamp - 14 * 86400).unsigned_abs() < 5);
    }

    #[test]
    fn signature_parse() {
        let input = BStr::new(b"John Doe <john@example.com> 1234567890 +0000");
        let sig = Signature::parse(input).unwrap();
        assert_eq!(sig.name, BString::from("John Doe"));
        assert_eq!(sig.email, BString::from("john@example.com"));
        assert_eq!(sig.date.timestamp, 1234567890);
        assert_eq!(sig.date.tz_offset, 0);
    }

    #[test]
    fn signature_roundtrip() {
        let sig = Signature {
            name: BString::from("Jane Doe"),
            email: BString::from("jane@example.com"),
            date: GitDate::new(1234567890, -300),
        };
        let bytes = sig.to_bytes();
        assert_eq!(
            bytes,
            BString::from("Jane Doe <jane@example.com> 1234567890 -0500")
        );

        let parsed = Signature::parse(bytes.as_ref()).unwrap();
        assert_eq!(parsed.name, sig.name);
        assert_eq!(parsed.email, sig.email);
        assert_eq!(parsed.date.timestamp, sig.date.timestamp);
        assert_eq!(parsed.date.tz_offset, sig.date.tz_offset);
    }

    #[test]
    fn tz_conversion_roundtrip() {
        assert_eq!(PackedOffset(530).to_minutes(), 330);
        assert_eq!(PackedOffset::from_minutes(330).0, 530);

        assert_eq!(PackedOffset(-500).to_minutes(), -300);
        assert_eq!(PackedOffset::from_minutes(-300).0, -500);

        assert_eq!(PackedOffset(0).to_minutes(), 0);
        assert_eq!(PackedOffset::from_minutes(0).0, 0);
    }
}
