//! Navigation epoch parsing, both revisions
use crate::{
    epoch::{time_tag, week_tow_from_date},
    error::ParsingError,
    header::{read_padded_line, FileType},
    navigation::formatting::orbit_shape,
    navigation::SatNav,
    EpochStatus, Rinex,
};

use std::io::BufRead;

use log::{debug, warn};

fn cols(line: &str, start: usize, len: usize) -> &str {
    let end = (start + len).min(line.len());
    if start >= end {
        ""
    } else {
        &line[start..end]
    }
}

/// Tolerates the Fortran `D` exponent marker of old navigation files
fn parse_float(field: &str) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    field.replace(['D', 'd'], "E").parse::<f64>().ok()
}

impl Rinex {
    /// Reads the record of one satellite from a navigation file,
    /// clearing then refilling the navigation store with it.
    pub fn read_nav_epoch<R: BufRead>(
        &mut self,
        reader: &mut R,
    ) -> Result<EpochStatus, ParsingError> {
        self.navigation.clear();
        let v2 = match self.header.input_version {
            Some(version) => version.is_v2(),
            None => return Ok(EpochStatus::UnsupportedVersion),
        };
        if v2 && self.header.file_type != FileType::Navigation {
            warn!("wrong revision / file type combination");
            return Ok(EpochStatus::BadEpoch);
        }
        let line = match read_padded_line(reader, 80)? {
            Some(line) => line,
            None => return Ok(EpochStatus::EndOfFile),
        };
        let prefix = cols(&line, 0, 32).to_string();
        // system and satellite identification
        let (system, prn, date_fields) = if v2 {
            let system = match self.header.system {
                Some(system) => system.to_char(),
                None => {
                    warn!("epoch [{}]: file system undefined", prefix);
                    return Ok(EpochStatus::BadEpoch);
                },
            };
            let prn = match cols(&line, 0, 2).trim().parse::<u8>() {
                Ok(prn) => prn,
                Err(_) => {
                    warn!("epoch [{}]: wrong satellite number", prefix);
                    return Ok(EpochStatus::BadEpoch);
                },
            };
            (system, prn, &line[3..])
        } else {
            let system = line.chars().next().unwrap_or(' ');
            let prn = match cols(&line, 1, 2).trim().parse::<u8>() {
                Ok(prn) => prn,
                Err(_) => {
                    warn!("epoch [{}]: wrong system or satellite", prefix);
                    return Ok(EpochStatus::BadEpoch);
                },
            };
            (system, prn, &line[4..])
        };
        // the date tokens precede the three SV clock fields, which are
        // the rightmost 3 x 19 columns of the line
        let head_len = line.trim_end().len().saturating_sub(3 * 19);
        let date_len = head_len.saturating_sub(line.len() - date_fields.len());
        let mut tokens = cols(date_fields, 0, date_len).split_ascii_whitespace();
        let mut date = [0.0f64; 6];
        let mut valid = true;
        for slot in date.iter_mut() {
            match tokens.next().and_then(|token| token.parse::<f64>().ok()) {
                Some(value) => *slot = value,
                None => {
                    valid = false;
                    break;
                },
            }
        }
        if !valid {
            warn!("epoch [{}]: wrong date-time", prefix);
            return Ok(EpochStatus::BadEpoch);
        }
        let (week, tow) = week_tow_from_date(
            date[0] as i32,
            date[1] as u32,
            date[2] as u32,
            date[3] as u32,
            date[4] as u32,
            date[5],
        );
        let tag = time_tag(week, tow);
        let mut orbit = [[0.0f64; 4]; 8];
        let mut bad_fields = false;
        // three SV clock fields on the first line
        for (nth, value) in orbit[0][1..4].iter_mut().enumerate() {
            match parse_float(cols(&line, head_len + nth * 19, 19)) {
                Some(parsed) => *value = parsed,
                None => bad_fields = true,
            }
        }
        let (n_lines, n_fields) = match orbit_shape(system) {
            Some(shape) => shape,
            None => {
                warn!("epoch [{}]: unknown system {}", prefix, system);
                return Ok(EpochStatus::BadEpoch);
            },
        };
        let start = if v2 { 3 } else { 4 };
        let mut remaining = n_fields - 3;
        for line_index in 1..n_lines {
            if remaining <= 0 {
                break;
            }
            let line = match read_padded_line(reader, 80)? {
                Some(line) => line,
                None => return Ok(EpochStatus::EndOfFile),
            };
            for field_index in 0..4 {
                if remaining <= 0 {
                    break;
                }
                match parse_float(cols(&line, start + field_index * 19, 19)) {
                    Some(value) => orbit[line_index][field_index] = value,
                    None => bad_fields = true,
                }
                remaining -= 1;
            }
        }
        if bad_fields {
            warn!("epoch [{}]: errors in broadcast orbit fields", prefix);
            return Ok(EpochStatus::BadObs);
        }
        // the navigation store was just cleared: this record also
        // defines the current epoch time
        self.epoch.week = week;
        self.epoch.tow = tow;
        self.epoch_time_tag = tag;
        self.navigation.push(SatNav {
            time_tag: tag,
            system,
            prn,
            orbit,
        });
        debug!("epoch [{}] stored", prefix);
        Ok(EpochStatus::Ok)
    }
}

#[cfg(test)]
mod test {
    use crate::constellation::Constellation;
    use crate::epoch::time_tag;
    use crate::header::FileType;
    use crate::version::{V210, V302};
    use crate::{EpochStatus, Rinex};
    use std::io::BufReader;

    fn model(v2: bool) -> Rinex {
        let mut rinex = Rinex::new(None);
        rinex.header.input_version = Some(if v2 { V210 } else { V302 });
        rinex.header.file_type = FileType::Navigation;
        rinex
    }

    #[test]
    fn v3_gps_round_trip() {
        let mut rinex = Rinex::new(Some(V302));
        let mut orbit = [[0.0; 4]; 8];
        orbit[0][1] = -1.234e-4;
        orbit[0][2] = 2.0e-11;
        orbit[1][3] = 3.14159e0;
        orbit[2][1] = 0.0123456;
        orbit[2][3] = 5153.623;
        orbit[5][2] = 1880.0;
        rinex.save_nav('G', 7, orbit, time_tag(1880, 259_200.0));
        let mut buffer = Vec::<u8>::new();
        rinex.write_nav_epoch(&mut buffer).unwrap();

        let mut back = model(false);
        let mut reader = BufReader::new(buffer.as_slice());
        assert_eq!(back.read_nav_epoch(&mut reader).unwrap(), EpochStatus::Ok);
        let entry = back.navigation.iter().next().unwrap();
        assert_eq!(entry.system, 'G');
        assert_eq!(entry.prn, 7);
        assert_eq!(entry.time_tag, time_tag(1880, 259_200.0));
        assert!((entry.orbit[0][1] + 1.234e-4).abs() < 1e-16);
        assert!((entry.orbit[2][3] - 5153.623).abs() < 1e-9);
        assert_eq!(entry.orbit[5][2], 1880.0);
        assert_eq!(
            back.read_nav_epoch(&mut reader).unwrap(),
            EpochStatus::EndOfFile
        );
    }

    #[test]
    fn v2_glonass_round_trip() {
        let mut rinex = Rinex::new(Some(V210));
        rinex.header.set_system(
            Constellation::Glonass,
            vec![crate::observable::Observable::from_str("C1C").unwrap()],
        );
        let mut sink = Vec::<u8>::new();
        rinex.write_nav_header(&mut sink).unwrap();
        let mut orbit = [[0.0; 4]; 8];
        orbit[0][1] = 5.96e-5;
        orbit[1][0] = 12_345.678;
        orbit[2][1] = -2.79e-1;
        orbit[3][2] = -9.31e-10;
        rinex.save_nav('R', 4, orbit, time_tag(1880, 259_200.0));
        let mut buffer = Vec::<u8>::new();
        rinex.write_nav_epoch(&mut buffer).unwrap();

        let mut back = model(true);
        back.header.system = Some(Constellation::Glonass);
        let mut reader = BufReader::new(buffer.as_slice());
        assert_eq!(back.read_nav_epoch(&mut reader).unwrap(), EpochStatus::Ok);
        let entry = back.navigation.iter().next().unwrap();
        assert_eq!(entry.system, 'R');
        assert_eq!(entry.prn, 4);
        assert!((entry.orbit[1][0] - 12_345.678).abs() < 1e-6);
        assert!((entry.orbit[2][1] + 2.79e-1).abs() < 1e-12);
        // only the twelve meaningful fields travel: the cell past the
        // last one comes back empty
        assert_eq!(entry.orbit[3][2], 0.0);
    }

    #[test]
    fn fortran_exponents_accepted() {
        let content = "\
 7 16  1 20  0  0  0.0-1.234000000000D-04 2.000000000000D-11 0.000000000000D+00
    0.000000000000D+00 0.000000000000D+00 0.000000000000D+00 3.141590000000D+00
    1.234560000000D-02 0.000000000000D+00 0.000000000000D+00 5.153623000000D+03
    0.000000000000D+00 0.000000000000D+00 0.000000000000D+00 0.000000000000D+00
    0.000000000000D+00 0.000000000000D+00 0.000000000000D+00 0.000000000000D+00
    0.000000000000D+00 0.000000000000D+00 1.880000000000D+03 0.000000000000D+00
    0.000000000000D+00 0.000000000000D+00 0.000000000000D+00
";
        let mut back = model(true);
        back.header.system = Some(Constellation::GPS);
        let mut reader = BufReader::new(content.as_bytes());
        assert_eq!(back.read_nav_epoch(&mut reader).unwrap(), EpochStatus::Ok);
        let entry = back.navigation.iter().next().unwrap();
        assert!((entry.orbit[0][1] + 1.234e-4).abs() < 1e-16);
        assert!((entry.orbit[2][3] - 5153.623).abs() < 1e-9);
    }

    use std::str::FromStr;
}
