//! ISO-8601 codec: parsing and canonical re-formatting of dates, times,
//! datetimes and durations.
//!
//! The grammar is hand-written over anchored regular expressions rather than
//! delegated to a date-time parsing library, because the accepted variants are
//! wider than strict RFC 3339: basic (`YYYYMMDD`), extended (`YYYY-MM-DD`) and
//! partially-separated (`YYYY-MMDD`, `YYYYMM-DD`) dates all parse, datetimes
//! accept either `T` or a single space as the separator, and durations follow
//! the `PnW nD T nH nM nS` grammar with fractional seconds and a single
//! leading sign. `chrono` supplies only the calendar value types.

use crate::error::TemporalError;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-?(\d{2})-?(\d{2})$").expect("valid date regex"));

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):?(\d{2}):?(\d{2})(\.\d+)?(Z|[+-]\d{2}:?\d{2})?$")
        .expect("valid time regex")
});

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-)?P(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$")
        .expect("valid duration regex")
});

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;
const MICROS_PER_DAY: i64 = 24 * MICROS_PER_HOUR;
const MICROS_PER_WEEK: i64 = 7 * MICROS_PER_DAY;

/// A time of day with an optional UTC offset, as ISO-8601 time strings may or
/// may not carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoTime {
    pub time: NaiveTime,
    pub offset: Option<FixedOffset>,
}

/// A calendar date and time of day with an optional UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoDateTime {
    pub datetime: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

/// A signed elapsed-time value with microsecond resolution.
///
/// The sign applies to the whole duration, never per component; mixed-sign
/// components would make the formatting round trip ill-defined. Two durations
/// compare equal when their elapsed times are equal, regardless of which
/// component mix produced them (`P8D` == `P1W1D`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration {
    micros: i64,
}

impl Duration {
    pub const fn from_micros(micros: i64) -> Self {
        Duration { micros }
    }

    pub const fn from_seconds(seconds: i64) -> Self {
        Duration {
            micros: seconds * MICROS_PER_SECOND,
        }
    }

    pub const fn from_minutes(minutes: i64) -> Self {
        Duration {
            micros: minutes * MICROS_PER_MINUTE,
        }
    }

    pub const fn from_days(days: i64) -> Self {
        Duration {
            micros: days * MICROS_PER_DAY,
        }
    }

    pub const fn as_micros(&self) -> i64 {
        self.micros
    }

    pub fn as_seconds_f64(&self) -> f64 {
        self.micros as f64 / MICROS_PER_SECOND as f64
    }

    pub const fn is_negative(&self) -> bool {
        self.micros < 0
    }
}

impl std::fmt::Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_duration(*self))
    }
}

/// Parse an ISO-8601 date string.
///
/// Accepted variants: `YYYYMMDD`, `YYYY-MM-DD`, `YYYY-MMDD`, `YYYYMM-DD`.
///
/// # Errors
///
/// Returns [`TemporalError`] if the string matches no accepted variant or
/// names an impossible calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, TemporalError> {
    let caps = DATE_RE
        .captures(s)
        .ok_or_else(|| TemporalError::new("date", s))?;
    let year: i32 = caps[1].parse().map_err(|_| TemporalError::new("date", s))?;
    let month: u32 = caps[2].parse().map_err(|_| TemporalError::new("date", s))?;
    let day: u32 = caps[3].parse().map_err(|_| TemporalError::new("date", s))?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| TemporalError::new("date", s))
}

/// Parse an ISO-8601 time string.
///
/// Accepted variants: `HHMMSS`, `HH:MM:SS`, optionally with a fractional
/// second part and a `Z`, `±HH:MM` or `±HHMM` offset.
pub fn parse_time(s: &str) -> Result<IsoTime, TemporalError> {
    let caps = TIME_RE
        .captures(s)
        .ok_or_else(|| TemporalError::new("time", s))?;
    let hour: u32 = caps[1].parse().map_err(|_| TemporalError::new("time", s))?;
    let minute: u32 = caps[2].parse().map_err(|_| TemporalError::new("time", s))?;
    let second: u32 = caps[3].parse().map_err(|_| TemporalError::new("time", s))?;
    let nanos = match caps.get(4) {
        Some(frac) => fraction_nanos(&frac.as_str()[1..]),
        None => 0,
    };
    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
        .ok_or_else(|| TemporalError::new("time", s))?;
    let offset = match caps.get(5) {
        Some(m) => Some(parse_offset(m.as_str()).ok_or_else(|| TemporalError::new("time", s))?),
        None => None,
    };
    Ok(IsoTime { time, offset })
}

/// Parse an ISO-8601 datetime string: any accepted date variant, a `T` or a
/// single space, then any accepted time variant.
pub fn parse_datetime(s: &str) -> Result<IsoDateTime, TemporalError> {
    let (date_part, time_part) = s
        .split_once(['T', ' '])
        .ok_or_else(|| TemporalError::new("date-time", s))?;
    let date = parse_date(date_part).map_err(|_| TemporalError::new("date-time", s))?;
    let time = parse_time(time_part).map_err(|_| TemporalError::new("date-time", s))?;
    Ok(IsoDateTime {
        datetime: date.and_time(time.time),
        offset: time.offset,
    })
}

/// Parse an ISO-8601 duration string into an elapsed-time value.
///
/// The grammar is `P`, any ordered subset of `nW` and `nD`, then optionally
/// `T` and any ordered subset of `nH`, `nM` and `nS` (seconds may carry a
/// fraction). An optional leading `-` negates the whole duration. Components
/// are summed (weeks count as 7 days); a bare `P` or a `T` with no following
/// time component is invalid.
pub fn parse_duration(s: &str) -> Result<Duration, TemporalError> {
    let caps = DURATION_RE
        .captures(s)
        .ok_or_else(|| TemporalError::new("duration", s))?;
    let negative = caps.get(1).is_some();
    let weeks = caps.get(2);
    let days = caps.get(3);
    let hours = caps.get(4);
    let minutes = caps.get(5);
    let seconds = caps.get(6);

    if [weeks, days, hours, minutes, seconds].iter().all(|c| c.is_none()) {
        return Err(TemporalError::new("duration", s));
    }
    // "P1WT" matches the regex with an empty time half; reject it.
    if s.contains('T') && hours.is_none() && minutes.is_none() && seconds.is_none() {
        return Err(TemporalError::new("duration", s));
    }

    let component = |m: Option<regex::Match<'_>>, scale: i64| -> Result<i64, TemporalError> {
        match m {
            Some(m) => {
                let n: i64 = m.as_str().parse().map_err(|_| TemporalError::new("duration", s))?;
                n.checked_mul(scale).ok_or_else(|| TemporalError::new("duration", s))
            }
            None => Ok(0),
        }
    };

    // The summation must stay checked too: components that each fit in an
    // i64 can still overflow when added ("P15250284W106751991D").
    let mut micros = component(weeks, MICROS_PER_WEEK)?;
    for part in [
        component(days, MICROS_PER_DAY)?,
        component(hours, MICROS_PER_HOUR)?,
        component(minutes, MICROS_PER_MINUTE)?,
    ] {
        micros = micros
            .checked_add(part)
            .ok_or_else(|| TemporalError::new("duration", s))?;
    }
    if let Some(m) = seconds {
        let part = seconds_micros(m.as_str()).ok_or_else(|| TemporalError::new("duration", s))?;
        micros = micros
            .checked_add(part)
            .ok_or_else(|| TemporalError::new("duration", s))?;
    }
    if negative {
        micros = -micros;
    }
    Ok(Duration::from_micros(micros))
}

/// Format an elapsed-time value canonically: the fewest components in the
/// greedy order weeks, days, hours, minutes, seconds; zero components omitted;
/// `T` emitted only when a time component follows; a single leading `-` for
/// negative totals. The zero duration formats as `PT0S`.
///
/// Re-parsing the result always yields an equal elapsed time:
///
/// ```
/// use bindery::temporal::{format_duration, parse_duration};
///
/// let d = parse_duration("P1W8DT3S").unwrap();
/// assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
/// assert_eq!(format_duration(parse_duration("-PT80S").unwrap()), "-PT1M20S");
/// ```
pub fn format_duration(d: Duration) -> String {
    if d.micros == 0 {
        return "PT0S".to_string();
    }
    let mut out = String::from(if d.micros < 0 { "-P" } else { "P" });
    let mut rem = d.micros.abs();

    let weeks = rem / MICROS_PER_WEEK;
    rem %= MICROS_PER_WEEK;
    let days = rem / MICROS_PER_DAY;
    rem %= MICROS_PER_DAY;
    let hours = rem / MICROS_PER_HOUR;
    rem %= MICROS_PER_HOUR;
    let minutes = rem / MICROS_PER_MINUTE;
    rem %= MICROS_PER_MINUTE;
    let seconds = rem / MICROS_PER_SECOND;
    let micros = rem % MICROS_PER_SECOND;

    if weeks > 0 {
        out.push_str(&format!("{weeks}W"));
    }
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || micros > 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if micros > 0 {
            let frac = format!("{micros:06}");
            out.push_str(&format!("{seconds}.{}S", frac.trim_end_matches('0')));
        } else if seconds > 0 {
            out.push_str(&format!("{seconds}S"));
        }
    }
    out
}

/// Format a date canonically as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a time canonically as `HH:MM:SS`, with a trimmed fractional part
/// when sub-second precision is present and the offset when one is carried.
pub fn format_time(t: &IsoTime) -> String {
    let mut out = t.time.format("%H:%M:%S").to_string();
    let micros = t.time.nanosecond() / 1_000;
    if micros > 0 {
        let frac = format!("{micros:06}");
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    if let Some(offset) = t.offset {
        out.push_str(&offset.to_string());
    }
    out
}

/// Format a datetime canonically as `<date>T<time>`.
pub fn format_datetime(dt: &IsoDateTime) -> String {
    format!(
        "{}T{}",
        format_date(dt.datetime.date()),
        format_time(&IsoTime {
            time: dt.datetime.time(),
            offset: dt.offset,
        })
    )
}

/// Seconds component (`"3"` or `"1.234"`) to signed microseconds. Fraction
/// digits beyond microsecond resolution are truncated.
fn seconds_micros(s: &str) -> Option<i64> {
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    let whole: i64 = whole.parse().ok()?;
    let mut frac_micros: i64 = 0;
    if !frac.is_empty() {
        let digits: String = frac.chars().take(6).collect();
        let parsed: i64 = digits.parse().ok()?;
        frac_micros = parsed * 10_i64.pow(6 - digits.len() as u32);
    }
    whole
        .checked_mul(MICROS_PER_SECOND)?
        .checked_add(frac_micros)
}

/// Fractional-second digits to nanoseconds, truncated past nanosecond
/// resolution.
fn fraction_nanos(digits: &str) -> u32 {
    let digits: String = digits.chars().take(9).collect();
    let parsed: u32 = digits.parse().unwrap_or(0);
    parsed * 10_u32.pow(9 - digits.len() as u32)
}

/// `Z`, `±HH:MM` or `±HHMM` to a fixed offset.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    if s == "Z" {
        return FixedOffset::east_opt(0);
    }
    let sign = match s.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let rest = s[1..].replace(':', "");
    let hours: i32 = rest.get(0..2)?.parse().ok()?;
    let minutes: i32 = rest.get(2..4)?.parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2020, 12, 10).unwrap();
        for input in ["20201210", "2020-12-10", "2020-1210", "202012-10"] {
            assert_eq!(parse_date(input).unwrap(), expected, "input {input}");
        }
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("2020/12/10").is_err());
        assert!(parse_date("2020-13-01").is_err());
        assert!(parse_date("2020-02-30").is_err());
        assert!(parse_date("not a date").is_err());
    }

    #[test]
    fn test_parse_time_variants() {
        let plain = NaiveTime::from_hms_opt(20, 20, 10).unwrap();
        assert_eq!(parse_time("202010").unwrap().time, plain);
        assert_eq!(parse_time("20:20:10").unwrap().time, plain);

        let zulu = parse_time("20:20:10Z").unwrap();
        assert_eq!(zulu.offset, FixedOffset::east_opt(0));

        let plus_two = parse_time("20:20:10+02:00").unwrap();
        assert_eq!(plus_two.offset, FixedOffset::east_opt(2 * 3600));
        assert_eq!(parse_time("20:20:10+0200").unwrap().offset, plus_two.offset);
    }

    #[test]
    fn test_parse_time_fraction() {
        let t = parse_time("20:20:10.5").unwrap();
        assert_eq!(t.time.nanosecond(), 500_000_000);
        assert!(parse_time("25:00:00").is_err());
    }

    #[test]
    fn test_parse_datetime_variants() {
        let expected = NaiveDate::from_ymd_opt(2020, 10, 10)
            .unwrap()
            .and_hms_opt(20, 20, 10)
            .unwrap();
        for input in ["20201010T202010", "2020-10-10T20:20:10", "2020-10-10 20:20:10"] {
            let dt = parse_datetime(input).unwrap();
            assert_eq!(dt.datetime, expected, "input {input}");
            assert_eq!(dt.offset, None);
        }
        let zulu = parse_datetime("2020-10-10 20:20:10Z").unwrap();
        assert_eq!(zulu.offset, FixedOffset::east_opt(0));
    }

    #[test]
    fn test_parse_simple_durations() {
        assert_eq!(parse_duration("P1W").unwrap(), Duration::from_days(7));
        assert_eq!(parse_duration("P1D").unwrap(), Duration::from_days(1));
        assert_eq!(parse_duration("PT1H").unwrap(), Duration::from_seconds(3600));
        assert_eq!(parse_duration("PT1M").unwrap(), Duration::from_minutes(1));
        assert_eq!(parse_duration("PT1S").unwrap(), Duration::from_seconds(1));
        assert_eq!(
            parse_duration("PT1.234S").unwrap(),
            Duration::from_micros(1_234_000)
        );
    }

    #[test]
    fn test_parse_complex_durations() {
        // Weeks and days sum as elapsed time; 8 days do not overflow into a week.
        assert_eq!(
            parse_duration("P1W8DT3S").unwrap(),
            Duration::from_micros(15 * MICROS_PER_DAY + 3 * MICROS_PER_SECOND)
        );
        assert_eq!(
            parse_duration("PT5H6M7S").unwrap(),
            Duration::from_seconds(5 * 3600 + 6 * 60 + 7)
        );
        assert_eq!(
            parse_duration("P2DT3H4M").unwrap(),
            Duration::from_seconds(2 * 86_400 + 3 * 3600 + 4 * 60)
        );
    }

    #[test]
    fn test_parse_duration_rejects_empty_halves() {
        assert!(parse_duration("P").is_err());
        assert!(parse_duration("PT").is_err());
        assert!(parse_duration("P1WT").is_err());
        assert!(parse_duration("1W").is_err());
        assert!(parse_duration("P1H").is_err(), "hours require the T half");
    }

    #[test]
    fn test_parse_duration_rejects_overflowing_totals() {
        // Each component fits in an i64 on its own; their sum does not.
        for input in ["P15250284W106751991D", "PT2562047788H1M", "-P106751991DT24H"] {
            assert!(parse_duration(input).is_err(), "input {input}");
        }
        // A single component past its own bound fails too.
        assert!(parse_duration("P9999999999999999999W").is_err());
        assert!(parse_duration("PT9223372036854775807.999999S").is_err());
    }

    #[test]
    fn test_format_duration_canonical() {
        let cases = [
            (Duration::from_days(7), "P1W"),
            (Duration::from_days(11), "P1W4D"),
            (Duration::from_seconds(25 * 3600), "P1DT1H"),
            (Duration::from_minutes(12_980), "P1W2DT20M"),
            (Duration::from_minutes(13_040), "P1W2DT1H20M"),
            (Duration::from_seconds(80), "PT1M20S"),
            (Duration::from_seconds(-80), "-PT1M20S"),
            (Duration::from_seconds(60 - 80), "-PT20S"),
            (Duration::from_micros(1_234_000), "PT1.234S"),
            (Duration::from_micros(0), "PT0S"),
        ];
        for (given, expected) in cases {
            assert_eq!(format_duration(given), expected);
        }
    }

    #[test]
    fn test_duration_round_trip() {
        for input in ["P1W8DT3S", "PT1.234S", "-PT80S", "P2DT3H4M", "PT0.000001S"] {
            let parsed = parse_duration(input).unwrap();
            assert_eq!(
                parse_duration(&format_duration(parsed)).unwrap(),
                parsed,
                "input {input}"
            );
        }
    }

    #[test]
    fn test_format_date_time_canonical() {
        let d = parse_date("20201210").unwrap();
        assert_eq!(format_date(d), "2020-12-10");

        let t = parse_time("202010").unwrap();
        assert_eq!(format_time(&t), "20:20:10");
        let t = parse_time("20:20:10.5+02:00").unwrap();
        assert_eq!(format_time(&t), "20:20:10.5+02:00");

        let dt = parse_datetime("2020-10-10 20:20:10Z").unwrap();
        assert_eq!(format_datetime(&dt), "2020-10-10T20:20:10+00:00");
    }
}
