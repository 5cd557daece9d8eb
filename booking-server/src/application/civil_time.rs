use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::domain::error::DomainError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// India Standard Time, UTC+05:30.
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The single place where wall-clock strings meet absolute instants.
///
/// Every business rule about "today", "past" and rendered timestamps goes
/// through one shared instance, pinned to one civil UTC offset. Callers never
/// compare raw instants against the server clock.
#[derive(Clone)]
pub struct CivilTime {
    zone: FixedOffset,
    clock: Arc<dyn Clock>,
}

impl CivilTime {
    pub fn new(zone: FixedOffset, clock: Arc<dyn Clock>) -> Self {
        Self { zone, clock }
    }

    pub fn system(zone: FixedOffset) -> Self {
        Self::new(zone, Arc::new(SystemClock))
    }

    /// Offset label such as `+05:30`.
    pub fn offset_label(&self) -> String {
        self.zone.to_string()
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now().with_timezone(&self.zone)
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    pub fn parse_date(&self, value: &str) -> Result<NaiveDate, DomainError> {
        if !matches_shape(value, "dddd-dd-dd") {
            return Err(DomainError::invalid_format(format!(
                "date must be in YYYY-MM-DD format, got {value:?}"
            )));
        }
        NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
            DomainError::invalid_format(format!("{value:?} is not a valid calendar date"))
        })
    }

    pub fn parse_time(&self, value: &str) -> Result<NaiveTime, DomainError> {
        if !matches_shape(value, "dd:dd") {
            return Err(DomainError::invalid_format(format!(
                "time must be in HH:MM format, got {value:?}"
            )));
        }
        NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|_| {
            DomainError::invalid_format(format!("{value:?} is not a valid time of day"))
        })
    }

    pub fn parse_date_time(&self, date: &str, time: &str) -> Result<DateTime<Utc>, DomainError> {
        let date = self.parse_date(date)?;
        let time = self.parse_time(time)?;
        Ok(self.localize(date.and_time(time)))
    }

    pub fn is_past(&self, date: &str) -> Result<bool, DomainError> {
        Ok(self.parse_date(date)? < self.today())
    }

    pub fn is_today(&self, date: &str) -> Result<bool, DomainError> {
        Ok(self.parse_date(date)? == self.today())
    }

    pub fn is_time_slot_past(&self, date: &str, time: &str) -> Result<bool, DomainError> {
        Ok(self.parse_date_time(date, time)? < self.now_utc())
    }

    pub fn start_of_day(&self, date: &str) -> Result<DateTime<Utc>, DomainError> {
        let date = self.parse_date(date)?;
        Ok(self.localize(date.and_time(NaiveTime::MIN)))
    }

    /// Last representable millisecond of the civil day, inclusive.
    pub fn end_of_day(&self, date: &str) -> Result<DateTime<Utc>, DomainError> {
        let date = self.parse_date(date)?;
        let next = date
            .succ_opt()
            .ok_or_else(|| DomainError::invalid_format("date is out of range"))?;
        Ok(self.localize(next.and_time(NaiveTime::MIN)) - Duration::milliseconds(1))
    }

    pub fn format(&self, instant: DateTime<Utc>, pattern: &str) -> String {
        instant.with_timezone(&self.zone).format(pattern).to_string()
    }

    pub fn format_minutes(&self, instant: DateTime<Utc>) -> String {
        self.format(instant, DATE_TIME_FORMAT)
    }

    pub fn format_seconds(&self, instant: DateTime<Utc>) -> String {
        self.format(instant, TIMESTAMP_FORMAT)
    }

    fn localize(&self, local: NaiveDateTime) -> DateTime<Utc> {
        // a fixed offset maps every local time to exactly one instant
        (local - Duration::seconds(i64::from(self.zone.local_minus_utc()))).and_utc()
    }
}

/// `d` matches an ASCII digit, anything else must match literally.
fn matches_shape(value: &str, shape: &str) -> bool {
    value.len() == shape.len()
        && value.bytes().zip(shape.bytes()).all(|(v, s)| match s {
            b'd' => v.is_ascii_digit(),
            other => v == other,
        })
}

pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, DomainError> {
    let invalid = || DomainError::invalid_format(format!("invalid UTC offset: {value:?}"));
    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') => (1, &value[1..]),
        Some(b'-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };
    if !matches_shape(rest, "dd:dd") {
        return Err(invalid());
    }
    let hours: i32 = rest[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = rest[3..].parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Clock pinned to a chosen instant, movable from tests.
    #[derive(Debug)]
    pub struct FixedClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl FixedClock {
        pub fn at(now: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(now),
            }
        }

        pub fn set(&self, now: DateTime<Utc>) {
            *self.now.lock().unwrap() = now;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    pub fn ist() -> FixedOffset {
        FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap()
    }

    /// Civil time in IST whose clock reads the given IST wall-clock moment.
    pub fn civil_at(date: &str, time: &str) -> (CivilTime, Arc<FixedClock>) {
        let civil = CivilTime::new(ist(), Arc::new(SystemClock));
        let instant = civil.parse_date_time(date, time).unwrap();
        let clock = Arc::new(FixedClock::at(instant));
        (CivilTime::new(ist(), clock.clone()), clock)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn parse_rejects_non_canonical_shapes() {
        let (civil, _) = civil_at("2030-01-10", "12:00");
        assert!(civil.parse_date("2030-1-10").is_err());
        assert!(civil.parse_date("10-01-2030").is_err());
        assert!(civil.parse_date("2030-02-30").is_err());
        assert!(civil.parse_time("9:00").is_err());
        assert!(civil.parse_time("24:00").is_err());
        assert!(civil.parse_time("09:60").is_err());
        assert!(matches!(
            civil.parse_time("09-00"),
            Err(DomainError::InvalidFormat(_))
        ));
        assert!(civil.parse_date("2030-02-28").is_ok());
        assert!(civil.parse_time("23:59").is_ok());
    }

    #[test]
    fn date_time_is_interpreted_in_the_civil_zone() {
        let (civil, _) = civil_at("2030-01-10", "12:00");
        let instant = civil.parse_date_time("2030-01-10", "09:00").unwrap();
        assert_eq!(instant.to_rfc3339(), "2030-01-10T03:30:00+00:00");
        assert_eq!(civil.format_minutes(instant), "2030-01-10 09:00");
    }

    #[test]
    fn day_predicates_follow_civil_midnight() {
        // 2030-01-10 01:00 IST is still 2030-01-09 in UTC
        let (civil, _) = civil_at("2030-01-10", "01:00");
        assert!(civil.is_today("2030-01-10").unwrap());
        assert!(civil.is_past("2030-01-09").unwrap());
        assert!(!civil.is_past("2030-01-10").unwrap());
        assert!(!civil.is_today("2030-01-09").unwrap());
    }

    #[test]
    fn time_slot_past_uses_instant_granularity() {
        let (civil, clock) = civil_at("2024-01-01", "09:00");
        assert!(!civil.is_time_slot_past("2024-01-01", "09:00").unwrap());
        assert!(!civil.is_time_slot_past("2024-01-01", "09:01").unwrap());

        clock.set(clock.now() + Duration::seconds(1));
        assert!(civil.is_time_slot_past("2024-01-01", "09:00").unwrap());
    }

    #[test]
    fn day_bounds_cover_the_whole_civil_day() {
        let (civil, _) = civil_at("2030-01-10", "12:00");
        let start = civil.start_of_day("2030-03-05").unwrap();
        let end = civil.end_of_day("2030-03-05").unwrap();
        assert_eq!(civil.format_seconds(start), "2030-03-05 00:00:00");
        assert_eq!(civil.format_seconds(end), "2030-03-05 23:59:59");
        assert_eq!(end - start, Duration::days(1) - Duration::milliseconds(1));
    }

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_utc_offset("+05:30").unwrap(), ist());
        assert_eq!(
            parse_utc_offset("-03:00").unwrap().local_minus_utc(),
            -3 * 3600
        );
        assert!(parse_utc_offset("05:30").is_err());
        assert!(parse_utc_offset("+5:30").is_err());
        assert!(parse_utc_offset("+05:75").is_err());
    }

    #[test]
    fn offset_label_matches_zone() {
        let (civil, _) = civil_at("2030-01-10", "12:00");
        assert_eq!(civil.offset_label(), "+05:30");
    }
}
