//! Observation epoch parsing, both revisions
use crate::{
    epoch::{time_tag, week_tow_from_date, EpochFlag},
    error::ParsingError,
    header::read_padded_line,
    header::{Label, LineOutcome},
    observation::SatObs,
    EpochStatus, Rinex,
};

use std::io::BufRead;

use log::{debug, warn};

use num_integer::div_ceil;

fn cols(line: &str, start: usize, len: usize) -> &str {
    let end = (start + len).min(line.len());
    if start >= end {
        ""
    } else {
        &line[start..end]
    }
}

fn parse_date(
    line: &str,
    positions: [(usize, usize); 6],
) -> Option<(i32, u32, u32, u32, u32, f64)> {
    let y = cols(line, positions[0].0, positions[0].1).trim().parse::<i32>().ok()?;
    let m = cols(line, positions[1].0, positions[1].1).trim().parse::<u32>().ok()?;
    let d = cols(line, positions[2].0, positions[2].1).trim().parse::<u32>().ok()?;
    let h = cols(line, positions[3].0, positions[3].1).trim().parse::<u32>().ok()?;
    let min = cols(line, positions[4].0, positions[4].1).trim().parse::<u32>().ok()?;
    let sec = cols(line, positions[5].0, positions[5].1).trim().parse::<f64>().ok()?;
    Some((y, m, d, h, min, sec))
}

impl Rinex {
    /// Reads one epoch (or event) from an observation file, clearing
    /// then refilling the observation store. The stored epoch time and
    /// every measurement share the tag derived from the epoch date.
    pub fn read_obs_epoch<R: BufRead>(
        &mut self,
        reader: &mut R,
    ) -> Result<EpochStatus, ParsingError> {
        self.observations.clear();
        match self.header.input_version {
            Some(version) if version.is_v2() => self.read_obs_epoch_v2(reader),
            Some(_) => self.read_obs_epoch_v3(reader),
            None => Ok(EpochStatus::UnsupportedVersion),
        }
    }

    fn read_obs_epoch_v2<R: BufRead>(
        &mut self,
        reader: &mut R,
    ) -> Result<EpochStatus, ParsingError> {
        let line = match read_padded_line(reader, 80)? {
            Some(line) => line,
            None => return Ok(EpochStatus::EndOfFile),
        };
        let mut bad_epoch = false;
        let flag_digit = cols(&line, 28, 1).trim().parse::<u8>().ok();
        let n_sats = match cols(&line, 29, 3).trim().parse::<usize>() {
            Ok(count) => count,
            Err(_) => {
                bad_epoch = true;
                0
            },
        };
        self.n_sats_epoch = n_sats;
        let date = parse_date(
            &line,
            [(1, 2), (4, 2), (7, 2), (10, 2), (13, 2), (15, 11)],
        );
        let wrong_date = date.is_none();
        if let Some((y, m, d, h, min, sec)) = date {
            let (week, tow) = week_tow_from_date(y, m, d, h, min, sec);
            self.epoch.week = week;
            self.epoch.tow = tow;
            self.epoch_time_tag = time_tag(week, tow);
        }
        let flag = match flag_digit.and_then(|digit| EpochFlag::from_u8(digit).ok()) {
            Some(flag) => flag,
            None => {
                warn!("epoch [{}]: wrong flag", cols(&line, 0, 32));
                return Ok(EpochStatus::BadFlag);
            },
        };
        self.epoch.flag = flag;
        if flag.is_event() {
            return self.read_obs_epoch_event(reader, wrong_date);
        }
        if wrong_date {
            bad_epoch = true;
        }
        if n_sats > 64 {
            bad_epoch = true;
        }
        self.epoch.clock_offset = cols(&line, 68, 12).trim().parse::<f64>().unwrap_or(0.0);
        // satellite list: 12 per line, then continuations
        let mut sats = Vec::<(usize, u8)>::with_capacity(n_sats);
        let mut line = line;
        let mut read = 0;
        while read < n_sats && !bad_epoch {
            let position = 32 + (read % 12) * 3;
            let system = line.chars().nth(position).unwrap_or(' ');
            let system_index = match self.header.system_index(system) {
                Some(index) => index,
                None => {
                    warn!("epoch: unknown system {}", system);
                    bad_epoch = true;
                    break;
                },
            };
            match cols(&line, position + 1, 2).trim().parse::<u8>() {
                Ok(prn) => sats.push((system_index, prn)),
                Err(_) => {
                    warn!("epoch: wrong satellite number");
                    bad_epoch = true;
                    break;
                },
            }
            read += 1;
            if read < n_sats && read % 12 == 0 {
                line = match read_padded_line(reader, 80)? {
                    Some(next) => next,
                    None => {
                        warn!("end of file in epoch continuation line");
                        break;
                    },
                };
            }
        }
        if bad_epoch {
            // try to skip the measurement lines of the broken epoch
            for _ in 0..n_sats {
                if read_padded_line(reader, 80)?.is_none() {
                    break;
                }
            }
            return Ok(EpochStatus::BadEpoch);
        }
        // one measurement block per satellite, five observables a line
        for (system_index, prn) in sats {
            let n_obs = self.header.systems[system_index].observables.len();
            let mut index = 0;
            for _ in 0..div_ceil(n_obs, 5) {
                let line = match read_padded_line(reader, 80)? {
                    Some(line) => line,
                    None => {
                        warn!("unexpected end of file in observation record");
                        return Ok(EpochStatus::BadObs);
                    },
                };
                while index < n_obs {
                    let position = (index % 5) * 16;
                    self.store_obs_field(&line, position, system_index, prn, index);
                    index += 1;
                    if index % 5 == 0 {
                        break;
                    }
                }
            }
        }
        debug!("epoch {} stored, {} sats", self.epoch_time_tag, n_sats);
        Ok(EpochStatus::Ok)
    }

    fn read_obs_epoch_v3<R: BufRead>(
        &mut self,
        reader: &mut R,
    ) -> Result<EpochStatus, ParsingError> {
        // synchronize on the epoch marker
        let line = loop {
            match read_padded_line(reader, 60)? {
                Some(line) => {
                    if line.starts_with('>') {
                        break line;
                    }
                    warn!("start of epoch not found, line skipped");
                },
                None => return Ok(EpochStatus::EndOfFile),
            }
        };
        let flag_digit = cols(&line, 31, 1).trim().parse::<u8>().ok();
        let n_sats = match cols(&line, 32, 3).trim().parse::<usize>() {
            Ok(count) => count,
            Err(_) => {
                warn!("epoch [{}]: missing satellite count", cols(&line, 0, 35));
                return Ok(EpochStatus::BadEpoch);
            },
        };
        self.n_sats_epoch = n_sats;
        let date = parse_date(
            &line,
            [(2, 4), (7, 2), (10, 2), (13, 2), (16, 2), (18, 11)],
        );
        let wrong_date = date.is_none();
        if let Some((y, m, d, h, min, sec)) = date {
            let (week, tow) = week_tow_from_date(y, m, d, h, min, sec);
            self.epoch.week = week;
            self.epoch.tow = tow;
            self.epoch_time_tag = time_tag(week, tow);
        }
        let flag = match flag_digit.and_then(|digit| EpochFlag::from_u8(digit).ok()) {
            Some(flag) => flag,
            None => {
                warn!("epoch [{}]: wrong flag", cols(&line, 0, 35));
                return Ok(EpochStatus::BadFlag);
            },
        };
        self.epoch.flag = flag;
        if flag.is_event() {
            return self.read_obs_epoch_event(reader, wrong_date);
        }
        if wrong_date {
            warn!("epoch [{}]: wrong date", cols(&line, 0, 35));
            return Ok(EpochStatus::BadEpoch);
        }
        self.epoch.clock_offset = cols(&line, 41, 15).trim().parse::<f64>().unwrap_or(0.0);
        let mut bad_obs = false;
        for _ in 0..n_sats {
            let line = match read_padded_line(reader, 80)? {
                Some(line) => line,
                None => {
                    warn!("end of file in observation record");
                    return Ok(EpochStatus::BadObs);
                },
            };
            let system = line.chars().next().unwrap_or(' ');
            let system_index = match self.header.system_index(system) {
                Some(index) => index,
                None => {
                    warn!("observation record: unknown system {}", system);
                    bad_obs = true;
                    continue;
                },
            };
            let prn = match cols(&line, 1, 2).trim().parse::<u8>() {
                Ok(prn) => prn,
                Err(_) => {
                    warn!("observation record: wrong satellite number");
                    bad_obs = true;
                    continue;
                },
            };
            let n_obs = self.header.systems[system_index].observables.len();
            let mut line = line;
            while line.len() < 3 + 16 * n_obs {
                line.push(' ');
            }
            for index in 0..n_obs {
                self.store_obs_field(&line, 3 + index * 16, system_index, prn, index);
            }
        }
        if bad_obs {
            return Ok(EpochStatus::BadObs);
        }
        debug!("epoch {} stored, {} sats", self.epoch_time_tag, n_sats);
        Ok(EpochStatus::Ok)
    }

    /// One F14.3 + LLI + strength field; a blank value field is a
    /// missing observable, stored as zero.
    fn store_obs_field(
        &mut self,
        line: &str,
        position: usize,
        system_index: usize,
        prn: u8,
        obs_index: usize,
    ) {
        let value_field = cols(line, position, 14);
        let (value, lli, strength) = if value_field.trim().is_empty() {
            (0.0, 0, 0)
        } else {
            let value = value_field.trim().parse::<f64>().unwrap_or(0.0);
            let lli = cols(line, position + 14, 1)
                .trim()
                .parse::<u8>()
                .unwrap_or(0);
            let strength = cols(line, position + 15, 1)
                .trim()
                .parse::<u8>()
                .unwrap_or(0);
            (value, lli, strength)
        };
        self.observations.push(SatObs {
            time_tag: self.epoch_time_tag,
            system_index,
            prn,
            obs_index,
            value,
            lli,
            strength,
        });
    }

    /// Special event records are header lines; flag 3 requires a
    /// marker name, flag 5 a valid date.
    fn read_obs_epoch_event<R: BufRead>(
        &mut self,
        reader: &mut R,
        wrong_date: bool,
    ) -> Result<EpochStatus, ParsingError> {
        let mut status = EpochStatus::OkNewEpoch;
        match self.epoch.flag {
            EpochFlag::AntennaBeingMoved | EpochFlag::HeaderInformationFollows => {
                for _ in 0..self.n_sats_epoch {
                    if self.read_event_record(reader)?.is_none() {
                        status = EpochStatus::SpecialRecordError;
                    }
                }
            },
            EpochFlag::NewSiteOccupation => {
                let mut marker_received = false;
                status = EpochStatus::SiteEventMissingMarker;
                for _ in 0..self.n_sats_epoch {
                    match self.read_event_record(reader)? {
                        Some(Label::MarkerName) => {
                            marker_received = true;
                            status = EpochStatus::OkNewEpoch;
                        },
                        Some(_) => {},
                        None => status = EpochStatus::SpecialRecordError,
                    }
                }
                if !marker_received {
                    warn!("new site occupation event without a marker name");
                }
            },
            EpochFlag::ExternalEvent => {
                if wrong_date {
                    warn!("external event without a date");
                    return Ok(EpochStatus::ExternalEventMissingDate);
                }
            },
            _ => status = EpochStatus::BadFlag,
        }
        Ok(status)
    }

    fn read_event_record<R: BufRead>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<Label>, ParsingError> {
        let line = match read_padded_line(reader, 81)? {
            Some(line) => line,
            None => return Ok(None),
        };
        match self.header.parse_record(&line, reader)? {
            LineOutcome::Parsed(label) => Ok(Some(label)),
            LineOutcome::DoesNotMatch => Ok(Some(Label::Comm)),
            LineOutcome::NoLabel => Ok(None),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::constellation::Constellation;
    use crate::observable::Observable;
    use crate::version::{V210, V302};
    use crate::{EpochStatus, Rinex};
    use std::io::BufReader;
    use std::str::FromStr;

    fn model(v2: bool) -> Rinex {
        let mut rinex = Rinex::new(None);
        rinex.header.input_version = Some(if v2 { V210 } else { V302 });
        rinex.header.set_system(
            Constellation::GPS,
            ["C1C", "L1C", "D1C", "S1C"]
                .iter()
                .map(|c| Observable::from_str(c).unwrap())
                .collect(),
        );
        rinex
    }

    #[test]
    fn v3_epoch() {
        let content = "\
> 2016 01 20 00 00  0.0000000  0  2
G03  20000003.000 7 100000003.000 7      1000.000 7        42.000 7
G07  20000007.000 7 100000007.000 7      1000.000 7        42.000 7
";
        let mut rinex = model(false);
        let mut reader = BufReader::new(content.as_bytes());
        let status = rinex.read_obs_epoch(&mut reader).unwrap();
        assert_eq!(status, EpochStatus::Ok);
        assert_eq!(rinex.observations.len(), 8);
        assert_eq!(rinex.epoch.week, 1880);
        assert_eq!(rinex.epoch.tow, 259_200.0);
        let first = rinex.observations.iter().next().unwrap();
        assert_eq!(first.prn, 3);
        assert_eq!(first.value, 20_000_003.0);
        assert_eq!(first.strength, 7);
        // second read reaches the end of file
        assert_eq!(
            rinex.read_obs_epoch(&mut reader).unwrap(),
            EpochStatus::EndOfFile
        );
    }

    #[test]
    fn v3_blank_field_is_missing() {
        let content = "\
> 2016 01 20 00 00  0.0000000  0  1
G03  20000003.000 7                      1000.000 7        42.000 7
";
        let mut rinex = model(false);
        let mut reader = BufReader::new(content.as_bytes());
        assert_eq!(rinex.read_obs_epoch(&mut reader).unwrap(), EpochStatus::Ok);
        let entries: Vec<f64> = rinex.observations.iter().map(|o| o.value).collect();
        assert_eq!(entries, vec![20_000_003.0, 0.0, 1000.0, 42.0]);
    }

    #[test]
    fn v2_epoch() {
        let content = "\
 16 01 20 00 00  0.0000000  0  1G07                                 0.000000000
  20000007.000 7 100000007.000 7      1000.000 7        42.000 7
";
        let mut rinex = model(true);
        let mut reader = BufReader::new(content.as_bytes());
        let status = rinex.read_obs_epoch(&mut reader).unwrap();
        assert_eq!(status, EpochStatus::Ok);
        assert_eq!(rinex.observations.len(), 4);
        assert_eq!(rinex.epoch.week, 1880);
    }

    #[test]
    fn v2_bad_flag() {
        let content = " 16 01 20 00 00  0.0000000  9  1G07\n";
        let mut rinex = model(true);
        let mut reader = BufReader::new(content.as_bytes());
        assert_eq!(
            rinex.read_obs_epoch(&mut reader).unwrap(),
            EpochStatus::BadFlag
        );
    }

    #[test]
    fn v3_event_with_header_records() {
        let content = "\
> 2016 01 20 00 05  0.0000000  4  1
new site                                                    MARKER NAME
";
        let mut rinex = model(false);
        let mut reader = BufReader::new(content.as_bytes());
        assert_eq!(
            rinex.read_obs_epoch(&mut reader).unwrap(),
            EpochStatus::OkNewEpoch
        );
        assert_eq!(rinex.header.marker_name.as_deref(), Some("new site"));
    }

    #[test]
    fn v3_site_event_requires_marker() {
        let content = "\
> 2016 01 20 00 05  0.0000000  3  1
observer            agency                                  OBSERVER / AGENCY
";
        let mut rinex = model(false);
        let mut reader = BufReader::new(content.as_bytes());
        assert_eq!(
            rinex.read_obs_epoch(&mut reader).unwrap(),
            EpochStatus::SiteEventMissingMarker
        );
    }

    #[test]
    fn round_trip_v3() {
        let mut rinex = model(false);
        rinex.header.version = Some(V302);
        let tag = rinex.set_epoch_time(1880, 259_230.0, 0.0, crate::epoch::EpochFlag::Ok);
        for prn in [3u8, 7, 9] {
            rinex.save_obs('G', prn, "C1C", 2.1e7 + prn as f64, 0, 8, tag);
            rinex.save_obs('G', prn, "L1C", 1.1e8 + prn as f64, 0, 8, tag);
            rinex.save_obs('G', prn, "D1C", -1234.5, 0, 8, tag);
            rinex.save_obs('G', prn, "S1C", 48.0, 0, 8, tag);
        }
        let mut buffer = Vec::<u8>::new();
        rinex.write_obs_epoch(&mut buffer).unwrap();

        let mut back = model(false);
        let mut reader = BufReader::new(buffer.as_slice());
        assert_eq!(back.read_obs_epoch(&mut reader).unwrap(), EpochStatus::Ok);
        assert_eq!(back.observations.len(), 12);
        assert_eq!(back.epoch.week, 1880);
        assert_eq!(back.epoch.tow, 259_230.0);
        let values: Vec<f64> = back.observations.iter().map(|o| o.value).collect();
        assert_eq!(values[0], 21_000_003.0);
        assert_eq!(values[2], -1234.5);
        // strictly increasing (system, satellite, observable) triples
        let keys: Vec<(usize, u8, usize)> = back
            .observations
            .iter()
            .map(|o| (o.system_index, o.prn, o.obs_index))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn round_trip_v2_fifteen_sats() {
        let mut rinex = model(true);
        rinex.header.version = Some(V210);
        let mut sink = Vec::<u8>::new();
        rinex.write_obs_header(&mut sink).unwrap();
        let tag = rinex.set_epoch_time(1880, 259_200.0, 0.0, crate::epoch::EpochFlag::Ok);
        for prn in 1..=15u8 {
            rinex.save_obs('G', prn, "C1C", 2.0e7 + prn as f64, 0, 6, tag);
        }
        let mut buffer = Vec::<u8>::new();
        rinex.write_obs_epoch(&mut buffer).unwrap();

        let mut back = model(true);
        let mut reader = BufReader::new(buffer.as_slice());
        assert_eq!(back.read_obs_epoch(&mut reader).unwrap(), EpochStatus::Ok);
        // fifteen satellites recovered in order, four observables each
        assert_eq!(back.observations.len(), 60);
        let prns: Vec<u8> = {
            use itertools::Itertools;
            back.observations.iter().map(|o| o.prn).dedup().collect()
        };
        assert_eq!(prns, (1..=15).collect::<Vec<u8>>());
    }

}
