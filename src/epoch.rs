//! Epoch timestamps and GPS time arithmetic.
//!
//! All time tags in this crate are seconds since the GPS epoch,
//! 1980-01-06T00:00:00. Calendar conversion is plain civil arithmetic
//! in the GPS time scale: no leap second is ever inserted, the
//! calendar reading *is* the GPS time reading.
use crate::error::ParsingError;

/// Seconds in a GPS week
pub const SECS_PER_WEEK: f64 = 604_800.0;

/// Days between 0000-03-01 and 1980-01-06 (GPS epoch), era-based count
const GPS_EPOCH_DAYS: i64 = 723_125;

/// `EpochFlag` validates or describes events attached to an epoch
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EpochFlag {
    /// Epoch is sane
    #[default]
    Ok,
    /// Power failure since previous epoch
    PowerFailure,
    /// Antenna is being moved at current epoch
    AntennaBeingMoved,
    /// Site has changed, receiver has moved since last epoch
    NewSiteOccupation,
    /// New header information to come after this epoch
    HeaderInformationFollows,
    /// External event, significant at this epoch
    ExternalEvent,
    /// Cycle slip records follow
    CycleSlip,
}

impl EpochFlag {
    /// True if this epoch carries observations (flags 0, 1, 6)
    pub fn is_observation(self) -> bool {
        matches!(self, Self::Ok | Self::PowerFailure | Self::CycleSlip)
    }

    /// True for the special events that carry header-style records (2..5)
    pub fn is_event(self) -> bool {
        !self.is_observation()
    }

    /// Builds an [EpochFlag] from its RINEX integer value
    pub fn from_u8(value: u8) -> Result<Self, ParsingError> {
        match value {
            0 => Ok(Self::Ok),
            1 => Ok(Self::PowerFailure),
            2 => Ok(Self::AntennaBeingMoved),
            3 => Ok(Self::NewSiteOccupation),
            4 => Ok(Self::HeaderInformationFollows),
            5 => Ok(Self::ExternalEvent),
            6 => Ok(Self::CycleSlip),
            _ => Err(ParsingError::EpochFlag),
        }
    }

    /// RINEX integer value of this flag
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::PowerFailure => 1,
            Self::AntennaBeingMoved => 2,
            Self::NewSiteOccupation => 3,
            Self::HeaderInformationFollows => 4,
            Self::ExternalEvent => 5,
            Self::CycleSlip => 6,
        }
    }
}

impl std::str::FromStr for EpochFlag {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<u8>().map_err(|_| ParsingError::EpochFlag)?;
        Self::from_u8(value)
    }
}

impl std::fmt::Display for EpochFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_u8())
    }
}

/// `EpochTime` is the receiver timestamp an epoch is published at
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EpochTime {
    /// Extended GPS week number (no rollover)
    pub week: u32,
    /// Seconds into the current week
    pub tow: f64,
    /// Receiver clock offset applied to epoch time and measurements
    pub clock_offset: f64,
    /// Epoch validation / event flag
    pub flag: EpochFlag,
}

impl EpochTime {
    /// Builds a new [EpochTime]
    pub fn new(week: u32, tow: f64, clock_offset: f64, flag: EpochFlag) -> Self {
        Self {
            week,
            tow,
            clock_offset,
            flag,
        }
    }

    /// Seconds since the GPS epoch
    pub fn time_tag(&self) -> f64 {
        time_tag(self.week, self.tow)
    }
}

/// Seconds since the GPS epoch for a (week, tow) pair
pub fn time_tag(week: u32, tow: f64) -> f64 {
    week as f64 * SECS_PER_WEEK + tow
}

/// Extended GPS week number of a time tag
pub fn gps_week(t: f64) -> u32 {
    (t / SECS_PER_WEEK).floor() as u32
}

/// Time of week of a time tag
pub fn gps_tow(t: f64) -> f64 {
    t - gps_week(t) as f64 * SECS_PER_WEEK
}

/// Era-based day count of a civil date (days since 0000-03-01)
fn days_from_civil(y: i32, m: u32, d: u32) -> i64 {
    let y = y as i64 - i64::from(m <= 2);
    let era = y.div_euclid(400);
    let yoe = (y - era * 400) as i64;
    let m = m as i64;
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + d as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe
}

/// Civil date for an era-based day count
fn civil_from_days(z: i64) -> (i32, u32, u32) {
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    ((y + i64::from(m <= 2)) as i32, m, d)
}

/// Seconds since the GPS epoch for a GPS calendar date.
/// The day may exceed the month length, as the GLONASS
/// day-of-interval fields require.
pub fn secs_from_date(y: i32, m: u32, d: u32, h: u32, min: u32, sec: f64) -> f64 {
    let days = days_from_civil(y, m, 1) + d as i64 - 1 - GPS_EPOCH_DAYS;
    days as f64 * 86_400.0 + h as f64 * 3_600.0 + min as f64 * 60.0 + sec
}

/// GPS calendar date of a time tag: (year, month, day, hour, minute, second)
pub fn date_of(t: f64) -> (i32, u32, u32, u32, u32, f64) {
    let days = (t / 86_400.0).floor() as i64;
    let mut secs = t - days as f64 * 86_400.0;
    let (y, m, d) = civil_from_days(days + GPS_EPOCH_DAYS);
    let h = (secs / 3_600.0).floor() as u32;
    secs -= h as f64 * 3_600.0;
    let min = (secs / 60.0).floor() as u32;
    secs -= min as f64 * 60.0;
    // guard against float noise pushing 59.999.. into 60
    if secs < 0.0 {
        secs = 0.0;
    }
    (y, m, d, h, min, secs)
}

/// Day of year (1..=366) of a time tag
pub fn day_of_year(t: f64) -> u32 {
    let (y, m, d, _, _, _) = date_of(t);
    (days_from_civil(y, m, d) - days_from_civil(y, 1, 1) + 1) as u32
}

/// (week, tow) pair for a GPS calendar date, two digit years accepted
/// (>= 80 maps to the 1900s, below to the 2000s)
pub fn week_tow_from_date(
    mut y: i32,
    m: u32,
    d: u32,
    h: u32,
    min: u32,
    sec: f64,
) -> (u32, f64) {
    if y < 100 {
        if y >= 80 {
            y += 1900;
        } else {
            y += 2000;
        }
    }
    let t = secs_from_date(y, m, d, h, min, sec);
    (gps_week(t), gps_tow(t))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn epoch_flags() {
        for value in 0..=6 {
            let flag = EpochFlag::from_u8(value).unwrap();
            assert_eq!(flag.to_u8(), value);
            assert_eq!(EpochFlag::from_str(&value.to_string()).unwrap(), flag);
        }
        assert!(EpochFlag::from_u8(7).is_err());
        assert!(EpochFlag::Ok.is_observation());
        assert!(EpochFlag::CycleSlip.is_observation());
        assert!(EpochFlag::HeaderInformationFollows.is_event());
    }

    #[test]
    fn gps_epoch_is_day_zero() {
        assert_eq!(date_of(0.0), (1980, 1, 6, 0, 0, 0.0));
        assert_eq!(secs_from_date(1980, 1, 6, 0, 0, 0.0), 0.0);
    }

    #[test]
    fn week_tow_round_trip() {
        let t = time_tag(1800, 43_200.0);
        assert_eq!(gps_week(t), 1800);
        assert_eq!(gps_tow(t), 43_200.0);
        // week 1800 starts sunday 2014-07-06
        assert_eq!(date_of(t), (2014, 7, 6, 12, 0, 0.0));
        assert_eq!(day_of_year(t), 187);
    }

    #[test]
    fn known_dates() {
        let t = time_tag(1880, 259_200.0);
        assert_eq!(date_of(t), (2016, 1, 20, 0, 0, 0.0));
        assert_eq!(day_of_year(t), 20);

        let t = time_tag(1782, 302_400.0);
        assert_eq!(date_of(t), (2014, 3, 5, 12, 0, 0.0));
        assert_eq!(day_of_year(t), 64);

        // GLONASS four-year interval: 1996 day 252 is 1996-09-08
        let t = secs_from_date(1996, 1, 252, 0, 0, 0.0);
        assert_eq!(date_of(t), (1996, 9, 8, 0, 0, 0.0));
    }

    #[test]
    fn two_digit_years() {
        let (week, tow) = week_tow_from_date(14, 7, 6, 12, 0, 0.0);
        assert_eq!((week, tow), (1800, 43_200.0));
        // 1995-01-01 was a sunday: an exact week boundary
        let (week, tow) = week_tow_from_date(95, 1, 1, 0, 0, 0.0);
        assert_eq!((week, tow), (782, 0.0));
    }

    #[test]
    fn fractional_seconds() {
        let t = secs_from_date(2016, 1, 20, 0, 0, 30.25);
        let (_, _, _, _, _, sec) = date_of(t);
        assert!((sec - 30.25).abs() < 1e-6);
    }
}
