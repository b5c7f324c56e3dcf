//! Standard RINEX file names, V2.10 short form and V3.02 long form.
use crate::{
    epoch::{date_of, day_of_year, gps_tow, gps_week, time_tag},
    Rinex,
};

/// V2.10 short name: `NNNNdddh mm.yyT`, with the hour encoded
/// `a` (00h) to `x` (23h).
pub(crate) fn v2_name(prefix: &str, week: u32, tow: f64, file_type: char) -> String {
    let t = time_tag(week, tow);
    let (y, _, _, hour, minute, _) = date_of(t);
    let mut designator = format!("{}----", prefix);
    designator.truncate(4);
    format!(
        "{}{:03}{}{:02}.{:02}{}",
        designator,
        day_of_year(t),
        (b'a' + hour as u8) as char,
        minute,
        y % 100,
        file_type
    )
}

/// V3.02 long name:
/// `NNNNMR{CCC}_R_{YYYY}{DOY}{HH}{MM}_{PP}{PU}_{FF}{FU}_{C}{T}.rnx`.
/// The frequency block only exists for observation files.
#[allow(clippy::too_many_arguments)]
pub(crate) fn v3_name(
    prefix: &str,
    week: u32,
    tow: f64,
    file_type: char,
    country: &str,
    marker_number: u32,
    receiver_number: u32,
    period: Option<(f64, f64)>,
    interval: Option<f64>,
    constellation: char,
) -> String {
    let t = time_tag(week, tow);
    let (y, _, _, hour, minute, _) = date_of(t);
    let mut designator = format!("{}----", prefix);
    designator.truncate(4);
    let mut country = format!("{}---", country);
    country.truncate(3);

    // file period from the first and last observation times
    let mut period_minutes = match period {
        Some((start, end)) if end > start => ((end - start) / 60.0) as u32,
        _ => 0,
    };
    let period_unit = if period_minutes >= 365 * 24 * 60 {
        period_minutes /= 365 * 24 * 60;
        'Y'
    } else if period_minutes >= 24 * 60 {
        period_minutes /= 24 * 60;
        'D'
    } else if period_minutes >= 60 {
        period_minutes /= 60;
        'H'
    } else if period_minutes > 0 {
        'M'
    } else {
        'U'
    };

    // data frequency from the observation interval
    let (frequency, frequency_unit) = match interval {
        Some(interval) if interval > 0.0 && interval < 1.0 => ((1.0 / interval) as u32, 'Z'),
        Some(interval) if interval < 60.0 => (interval as u32, 'S'),
        Some(interval) if interval < 3600.0 => ((interval / 60.0) as u32, 'M'),
        Some(interval) if interval < 86_400.0 => ((interval / 3600.0) as u32, 'H'),
        Some(interval) => ((interval / 86_400.0) as u32, 'D'),
        None => (0, 'U'),
    };

    match file_type {
        'O' | 'o' => format!(
            "{}{}{}{}_R_{:04}{:03}{:02}{:02}_{:02}{}_{:02}{}_{}O.rnx",
            designator,
            marker_number,
            receiver_number,
            country,
            y,
            day_of_year(t),
            hour,
            minute,
            period_minutes,
            period_unit,
            frequency,
            frequency_unit,
            constellation
        ),
        'N' => format!(
            "{}{}{}{}_R_{:04}{:03}{:02}{:02}_{:02}{}_{}N.rnx",
            designator,
            marker_number,
            receiver_number,
            country,
            y,
            day_of_year(t),
            hour,
            minute,
            period_minutes,
            period_unit,
            constellation
        ),
        other => format!("NOT_IMPLEMENTED_TYPE_{}.rnx", other),
    }
}

/// Observation file name for the revision being produced, from the
/// time of first observation.
pub(crate) fn obs_file_name(rinex: &Rinex, prefix: &str, country: Option<&str>) -> String {
    let header = &rinex.header;
    let first = header.time_of_first_obs.unwrap_or(0.0);
    let (week, tow) = (gps_week(first), gps_tow(first));
    match header.version {
        Some(version) if !version.is_v2() => v3_name(
            prefix,
            week,
            tow,
            'O',
            country.unwrap_or("---"),
            marker_digit(header),
            receiver_digit(header),
            header
                .time_of_first_obs
                .zip(header.time_of_last_obs),
            header.interval,
            single_system(rinex),
        ),
        _ => v2_name(prefix, week, tow, 'O'),
    }
}

/// Navigation file name, preferring the first stored ephemeris tag
/// over the time of first observation over the current epoch.
pub(crate) fn nav_file_name(
    rinex: &mut Rinex,
    prefix: &str,
    suffix: char,
    country: Option<&str>,
) -> String {
    let mut week = rinex.epoch.week;
    let mut tow = rinex.epoch.tow;
    if let Some(first) = rinex.header.time_of_first_obs {
        week = gps_week(first);
        tow = gps_tow(first);
    }
    rinex.navigation.sort();
    if let Some(first) = rinex.navigation.iter().next() {
        week = gps_week(first.time_tag);
        tow = gps_tow(first.time_tag);
    }
    let header = &rinex.header;
    match header.version {
        Some(version) if !version.is_v2() => v3_name(
            prefix,
            week,
            tow,
            'N',
            country.unwrap_or("---"),
            marker_digit(header),
            receiver_digit(header),
            header
                .time_of_first_obs
                .zip(header.time_of_last_obs),
            None,
            single_system(rinex),
        ),
        _ => v2_name(prefix, week, tow, suffix),
    }
}

fn marker_digit(header: &crate::header::Header) -> u32 {
    header
        .marker_number
        .as_deref()
        .and_then(|number| number.trim().parse::<u32>().ok())
        .unwrap_or(0)
}

fn receiver_digit(header: &crate::header::Header) -> u32 {
    header
        .receiver
        .as_ref()
        .and_then(|receiver| receiver.number.trim().parse::<u32>().ok())
        .unwrap_or(0)
}

fn single_system(rinex: &Rinex) -> char {
    if rinex.header.systems.len() == 1 {
        rinex.header.systems[0].constellation.to_char()
    } else {
        'M'
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constellation::Constellation;
    use crate::observable::Observable;
    use crate::version::{V210, V302};
    use crate::Rinex;
    use std::str::FromStr;

    #[test]
    fn v2_short_name() {
        // week 1800 starts 2014-07-06; half a day in is noon, hour m
        assert_eq!(v2_name("PNT1", 1800, 43_200.0, 'O'), "PNT1187m00.14O");
        assert_eq!(v2_name("PNT1", 1800, 0.0, 'O'), "PNT1187a00.14O");
        assert_eq!(v2_name("PNT1", 1880, 259_200.0, 'N'), "PNT1020a00.16N");
        // short prefixes are padded
        assert_eq!(v2_name("AB", 1880, 259_200.0, 'G'), "AB--020a00.16G");
    }

    #[test]
    fn v3_long_name() {
        let mut rinex = Rinex::new(Some(V302));
        rinex.header.set_system(
            Constellation::GPS,
            vec![Observable::from_str("C1C").unwrap()],
        );
        rinex
            .header
            .set_time_of_first_obs(time_tag(1880, 259_200.0));
        rinex
            .header
            .set_time_of_last_obs(time_tag(1880, 259_200.0 + 3600.0));
        rinex.header.set_interval(1.0);
        let name = rinex.obs_file_name("PNT1", Some("ESP"));
        assert_eq!(name, "PNT100ESP_R_20160200000_01H_01S_GO.rnx");
    }

    #[test]
    fn v3_mixed_no_period() {
        let mut rinex = Rinex::new(Some(V302));
        for system in [Constellation::GPS, Constellation::Glonass] {
            rinex.header.set_system(
                system,
                vec![Observable::from_str("C1C").unwrap()],
            );
        }
        rinex
            .header
            .set_time_of_first_obs(time_tag(1880, 259_200.0));
        let name = rinex.obs_file_name("PNT1", None);
        assert_eq!(name, "PNT100---_R_20160200000_00U_00U_MO.rnx");
    }

    #[test]
    fn nav_name_prefers_stored_ephemeris() {
        let mut rinex = Rinex::new(Some(V210));
        rinex.save_nav('G', 7, [[0.0; 4]; 8], time_tag(1800, 43_200.0));
        let name = rinex.nav_file_name("PNT1", 'N', None);
        assert_eq!(name, "PNT1187m00.14N");
    }
}
