//! RINEX header parsing
use crate::{
    constellation::Constellation,
    epoch::{time_tag, week_tow_from_date},
    error::ParsingError,
    header::{
        Comment, CorrectionApplied, DeltaUtc, FileType, GlonassSlotFreq, GnssSystem, Header,
        IonoCorrection, Label, LeapSeconds, PhaseCenter, PhaseShift, PrnObsCount, Receiver,
        ScaleFactor, TimeCorrection, WavelengthFactor,
    },
    observable::Observable,
    version::Version,
};

use std::io::BufRead;
use std::str::FromStr;

use log::{debug, warn};

/// What a single header line turned out to be
#[derive(Clone, Debug, PartialEq)]
pub enum LineOutcome {
    /// A record of the given label was stored
    Parsed(Label),
    /// Columns 61-80 carry no known label
    NoLabel,
    /// The label exists but not in the revision being read
    DoesNotMatch,
}

/// Reads the next non-blank line, padded with blanks to at least
/// `min_width` columns so fixed-column slicing never goes out of range.
pub(crate) fn read_padded_line<R: BufRead>(
    reader: &mut R,
    min_width: usize,
) -> Result<Option<String>, ParsingError> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let mut trimmed = line.trim_end_matches(['\r', '\n']).to_string();
        if !trimmed.trim().is_empty() {
            while trimmed.len() < min_width {
                trimmed.push(' ');
            }
            return Ok(Some(trimmed));
        }
    }
}

fn cols(line: &str, start: usize, len: usize) -> &str {
    let end = (start + len).min(line.len());
    if start >= end {
        ""
    } else {
        &line[start..end]
    }
}

/// Tolerates the Fortran `D` exponent marker found in old files
fn parse_float(field: &str) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    field
        .replace(['D', 'd'], "E")
        .parse::<f64>()
        .ok()
}

fn parse_int(field: &str) -> Option<i64> {
    field.trim().parse::<i64>().ok()
}

impl Header {
    /// Parses a complete header section, until `END OF HEADER`.
    /// Out-of-order records are logged and kept; ten label-less lines
    /// or an early end of stream abort with [ParsingError::MissingEndOfHeader].
    pub fn parse<R: BufRead>(reader: &mut R) -> Result<Self, ParsingError> {
        let mut header = Header::new(None);
        let mut budget = 10;
        // tracks the partial ordering of header records:
        // 0 nothing read, 1 version read, 2 systems read, 3 sat total read, 4 done
        let mut order = 0;
        loop {
            let line = match read_padded_line(reader, 81)? {
                Some(line) => line,
                None => return Err(ParsingError::MissingEndOfHeader),
            };
            match header.parse_record(&line, reader)? {
                LineOutcome::NoLabel => {
                    budget -= 1;
                    warn!("no header label found in: {}", cols(&line, 0, 20));
                    if budget == 0 {
                        return Err(ParsingError::MissingEndOfHeader);
                    }
                },
                LineOutcome::DoesNotMatch => {
                    warn!(
                        "{}: cannot be used in this revision",
                        cols(&line, 60, 20).trim()
                    );
                },
                LineOutcome::Parsed(label) => {
                    order = Self::check_record_order(order, label);
                    if order == 4 {
                        return Ok(header);
                    }
                },
            }
        }
    }

    /// One step of the record ordering automaton; violations are
    /// logged, never fatal.
    fn check_record_order(order: u8, label: Label) -> u8 {
        match order {
            0 => {
                if label == Label::Version {
                    return 1;
                }
                warn!("{}: cannot be the first header record", label.text());
                order
            },
            1 => match label {
                Label::Version => {
                    warn!("{}: cannot appear twice", label.text());
                    order
                },
                Label::DcbsApplied | Label::SysScaleFactor => {
                    warn!("{}: must be preceded by the system definitions", label.text());
                    order
                },
                Label::PrnNumObs => {
                    warn!("{}: must be preceded by the satellite total", label.text());
                    order
                },
                Label::SysObsTypes | Label::TypesOfObserv => 2,
                Label::NumSatellites => 3,
                Label::EndOfHeader => 4,
                _ => order,
            },
            2 => match label {
                Label::Version => {
                    warn!("{}: cannot appear twice", label.text());
                    order
                },
                Label::PrnNumObs => {
                    warn!("{}: must be preceded by the satellite total", label.text());
                    order
                },
                Label::NumSatellites => 3,
                Label::EndOfHeader => 4,
                _ => order,
            },
            _ => match label {
                Label::Version | Label::NumSatellites | Label::SysObsTypes => {
                    warn!("{}: cannot appear twice", label.text());
                    order
                },
                Label::EndOfHeader => 4,
                _ => order,
            },
        }
    }

    /// Parses one header-style line, reading continuation lines from
    /// `reader` for the records that use them. Also serves the special
    /// event epochs, whose embedded records are header lines.
    pub(crate) fn parse_record<R: BufRead>(
        &mut self,
        line: &str,
        reader: &mut R,
    ) -> Result<LineOutcome, ParsingError> {
        let label = match Label::from_line(line) {
            Some(label) => label,
            None => return Ok(LineOutcome::NoLabel),
        };
        if label != Label::Version {
            let scoped = match self.input_version {
                Some(version) => label.spec().scope.contains(version),
                None => label.spec().scope == super::labels::Scope::Any,
            };
            if !scoped {
                return Ok(LineOutcome::DoesNotMatch);
            }
        }
        match label {
            Label::Version => self.parse_version_record(line)?,
            Label::ProgramRunBy => {
                self.program = Some(cols(line, 0, 20).trim().to_string());
                self.run_by = Some(cols(line, 20, 20).trim().to_string());
                self.date = Some(cols(line, 40, 20).trim().to_string());
            },
            Label::Comm => {
                self.comments.push(Comment {
                    after: self.last_record_set.unwrap_or(Label::Version),
                    text: cols(line, 0, 60).trim_end().to_string(),
                });
                // consecutive comments share the anchor, keeping order
                let anchor = self.last_record_set;
                self.set_label(Label::Comm);
                self.last_record_set = anchor;
                return Ok(LineOutcome::Parsed(Label::Comm));
            },
            Label::MarkerName => {
                self.marker_name = Some(cols(line, 0, 60).trim_end().to_string());
            },
            Label::MarkerNumber => {
                self.marker_number = Some(cols(line, 0, 20).trim_end().to_string());
            },
            Label::MarkerType => {
                self.marker_type = Some(cols(line, 0, 20).trim_end().to_string());
            },
            Label::ObserverAgency => {
                self.observer = Some(cols(line, 0, 20).trim().to_string());
                self.agency = Some(cols(line, 20, 40).trim().to_string());
            },
            Label::ReceiverType => {
                self.receiver = Some(Receiver {
                    number: cols(line, 0, 20).trim().to_string(),
                    model: cols(line, 20, 20).trim().to_string(),
                    version: cols(line, 40, 20).trim().to_string(),
                });
            },
            Label::AntennaType => {
                self.antenna = Some(super::Antenna {
                    number: cols(line, 0, 20).trim().to_string(),
                    model: cols(line, 20, 20).trim().to_string(),
                });
            },
            Label::ApproxPosition => match self.parse_triplet(line) {
                Some(triplet) => self.approx_position = Some(triplet),
                None => return self.reject(label),
            },
            Label::AntennaDeltaHen => match self.parse_triplet(line) {
                Some(triplet) => self.antenna_delta_hen = Some(triplet),
                None => return self.reject(label),
            },
            Label::AntennaDeltaXyz => match self.parse_triplet(line) {
                Some(triplet) => self.antenna_delta_xyz = Some(triplet),
                None => return self.reject(label),
            },
            Label::AntennaPhaseCenter => {
                let north = parse_float(cols(line, 5, 9));
                let east = parse_float(cols(line, 14, 14));
                let up = parse_float(cols(line, 28, 14));
                match (north, east, up) {
                    (Some(north), Some(east), Some(up)) => {
                        self.antenna_phase_center = Some(PhaseCenter {
                            system: line.chars().next().unwrap_or(' '),
                            code: cols(line, 2, 3).trim().to_string(),
                            north,
                            east,
                            up,
                        });
                    },
                    _ => return self.reject(label),
                }
            },
            Label::AntennaBoresight => match self.parse_triplet(line) {
                Some(triplet) => self.antenna_boresight = Some(triplet),
                None => return self.reject(label),
            },
            Label::AntennaZeroDirAzi => match parse_float(cols(line, 0, 14)) {
                Some(azimuth) => self.antenna_zerodir_azi = Some(azimuth),
                None => return self.reject(label),
            },
            Label::AntennaZeroDirXyz => match self.parse_triplet(line) {
                Some(triplet) => self.antenna_zerodir_xyz = Some(triplet),
                None => return self.reject(label),
            },
            Label::CenterOfMass => match self.parse_triplet(line) {
                Some(triplet) => self.center_of_mass = Some(triplet),
                None => return self.reject(label),
            },
            Label::WavelengthFactor => {
                let l1 = parse_int(cols(line, 0, 6));
                let l2 = parse_int(cols(line, 6, 6));
                let (l1, l2) = match (l1, l2) {
                    (Some(l1), Some(l2)) => (l1 as i32, l2 as i32),
                    _ => return self.reject(label),
                };
                let count = parse_int(cols(line, 12, 6)).unwrap_or(0) as usize;
                if count >= 7 {
                    return self.reject(label);
                }
                let mut sats = Vec::with_capacity(count);
                for nth in 0..count {
                    sats.push(cols(line, 18 + nth * 6 + 3, 3).trim().to_string());
                }
                self.wavelength_factors.push(WavelengthFactor { l1, l2, sats });
            },
            Label::TypesOfObserv => {
                let count = match parse_int(cols(line, 0, 6)) {
                    Some(count) if count > 0 => count as usize,
                    _ => return self.reject(label),
                };
                let mut names = Vec::<Observable>::with_capacity(count);
                let mut line = line.to_string();
                let mut remaining = count as i64;
                loop {
                    for token in cols(&line, 6, 54).split_ascii_whitespace() {
                        match Observable::from_v2(token) {
                            Some(observable) => names.push(observable),
                            None => {
                                warn!(
                                    "{}: {} cannot be translated to a modern code",
                                    label.text(),
                                    token
                                );
                            },
                        }
                    }
                    remaining -= 9;
                    if remaining <= 0 {
                        break;
                    }
                    match self.continuation_line(reader, label)? {
                        Some(next) => line = next,
                        None => break,
                    }
                }
                if names.len() != count {
                    warn!("{}: expected and existing code types differ", label.text());
                }
                // a mixed file announces the same list for every system
                // the revision knows
                let systems = match self.system {
                    Some(Constellation::Mixed) | None => {
                        vec![Constellation::GPS, Constellation::Glonass, Constellation::SBAS]
                    },
                    Some(system) => vec![system],
                };
                for system in systems {
                    self.systems.push(GnssSystem::new(system, names.clone()));
                }
            },
            Label::SysObsTypes => {
                let system = match Constellation::from_char(line.chars().next().unwrap_or(' ')) {
                    Ok(system) => system,
                    Err(_) => return self.reject(label),
                };
                let count = match parse_int(cols(line, 3, 3)) {
                    Some(count) if count > 0 => count as usize,
                    _ => return self.reject(label),
                };
                let mut names = Vec::<Observable>::with_capacity(count);
                let mut line = line.to_string();
                let mut remaining = count as i64;
                loop {
                    for token in cols(&line, 6, 54).split_ascii_whitespace() {
                        match Observable::from_str(token) {
                            Ok(observable) => names.push(observable),
                            Err(_) => warn!("{}: invalid code {}", label.text(), token),
                        }
                    }
                    remaining -= 13;
                    if remaining <= 0 {
                        break;
                    }
                    match self.continuation_line(reader, label)? {
                        Some(next) => line = next,
                        None => break,
                    }
                }
                if names.len() != count {
                    warn!("{}: expected and existing code types differ", label.text());
                }
                self.systems.push(GnssSystem::new(system, names));
            },
            Label::SignalStrengthUnit => {
                self.signal_strength_unit = Some(cols(line, 0, 20).trim().to_string());
            },
            Label::Interval => match parse_float(cols(line, 0, 10)) {
                Some(interval) => self.interval = Some(interval),
                None => return self.reject(label),
            },
            Label::TimeOfFirstObs => match Self::parse_time_of_obs(line) {
                Some(t) => {
                    self.time_of_first_obs = Some(t);
                    self.time_system = Some(cols(line, 48, 3).trim().to_string());
                },
                None => return self.reject(label),
            },
            Label::TimeOfLastObs => match Self::parse_time_of_obs(line) {
                Some(t) => self.time_of_last_obs = Some(t),
                None => return self.reject(label),
            },
            Label::RcvClockOffsApplied => match parse_int(cols(line, 0, 6)) {
                Some(applied) => self.rcv_clock_offs_applied = Some(applied as i32),
                None => return self.reject(label),
            },
            Label::DcbsApplied | Label::PcvsApplied => {
                let system_index = match self.system_index(line.chars().next().unwrap_or(' ')) {
                    Some(index) => index,
                    None => return self.reject(label),
                };
                let correction = CorrectionApplied {
                    system_index,
                    program: cols(line, 1, 17).trim().to_string(),
                    source: cols(line, 20, 40).trim().to_string(),
                };
                if label == Label::DcbsApplied {
                    self.dcbs_applied.push(correction);
                } else {
                    self.pcvs_applied.push(correction);
                }
            },
            Label::SysScaleFactor => {
                let system_index = match self.system_index(line.chars().next().unwrap_or(' ')) {
                    Some(index) => index,
                    None => return self.reject(label),
                };
                let factor = match parse_int(cols(line, 2, 4)) {
                    Some(factor) => factor as i32,
                    None => return self.reject(label),
                };
                let count = parse_int(cols(line, 8, 2)).unwrap_or(0) as usize;
                let mut observables = Vec::<String>::with_capacity(count);
                let mut line = line.to_string();
                let mut remaining = count as i64;
                while remaining > 0 {
                    for token in cols(&line, 10, 48).split_ascii_whitespace() {
                        observables.push(token.to_string());
                    }
                    remaining -= 12;
                    if remaining > 0 {
                        match self.continuation_line(reader, label)? {
                            Some(next) => line = next,
                            None => break,
                        }
                    }
                }
                if observables.len() != count {
                    warn!("{}: expected and existing code types differ", label.text());
                }
                self.scale_factors.push(ScaleFactor {
                    system_index,
                    factor,
                    observables,
                });
            },
            Label::PhaseShifts => {
                let system_index = match self.system_index(line.chars().next().unwrap_or(' ')) {
                    Some(index) => index,
                    None => return self.reject(label),
                };
                let code = cols(line, 2, 3).trim().to_string();
                let correction = parse_float(cols(line, 6, 8)).unwrap_or(0.0);
                let count = parse_int(cols(line, 16, 2)).unwrap_or(0) as usize;
                let mut sats = Vec::<String>::with_capacity(count);
                let mut line = line.to_string();
                let mut remaining = count as i64;
                while remaining > 0 {
                    for token in cols(&line, 18, 40).split_ascii_whitespace() {
                        sats.push(token.to_string());
                    }
                    remaining -= 10;
                    if remaining > 0 {
                        match self.continuation_line(reader, label)? {
                            Some(next) => line = next,
                            None => break,
                        }
                    }
                }
                self.phase_shifts.push(PhaseShift {
                    system_index,
                    code,
                    correction,
                    sats,
                });
            },
            Label::GlonassSlotFreq => {
                let count = parse_int(cols(line, 0, 3)).unwrap_or(0) as usize;
                let mut line = line.to_string();
                let mut read = 0;
                while read < count {
                    let base = 4 + (read % 8) * 7;
                    let slot = parse_int(cols(&line, base + 1, 2));
                    let frequency = parse_int(cols(&line, base + 4, 2));
                    match (slot, frequency) {
                        (Some(slot), Some(frequency)) => self.glonass_slots.push(GlonassSlotFreq {
                            slot: slot as u8,
                            frequency: frequency as i8,
                        }),
                        _ => warn!("{}: truncated slot entry", label.text()),
                    }
                    read += 1;
                    if read < count && read % 8 == 0 {
                        match self.continuation_line(reader, label)? {
                            Some(next) => line = next,
                            None => break,
                        }
                    }
                }
                if self.glonass_slots.len() != count {
                    warn!("{}: expected and existing slots differ", label.text());
                }
            },
            Label::LeapSecs => {
                let seconds = match parse_int(cols(line, 0, 6)) {
                    Some(seconds) => seconds as i32,
                    None => return self.reject(label),
                };
                self.leap_seconds = Some(LeapSeconds {
                    seconds,
                    delta_lsf: parse_int(cols(line, 6, 6)).unwrap_or(0) as i32,
                    week: parse_int(cols(line, 12, 6)).unwrap_or(0) as i32,
                    day: parse_int(cols(line, 18, 6)).unwrap_or(0) as i32,
                });
            },
            Label::NumSatellites => match parse_int(cols(line, 0, 6)) {
                Some(count) => self.num_satellites = Some(count as u32),
                None => return self.reject(label),
            },
            Label::PrnNumObs => {
                let mut counts = Vec::<u32>::new();
                for nth in 0..9 {
                    match parse_int(cols(line, 6 + nth * 6, 6)) {
                        Some(count) => counts.push(count as u32),
                        None => break,
                    }
                }
                let system = line.chars().nth(3).unwrap_or(' ');
                match (system != ' ', parse_int(cols(line, 4, 2))) {
                    (true, Some(prn)) => self.prn_obs.push(PrnObsCount {
                        system,
                        prn: prn as u8,
                        counts,
                    }),
                    _ => {
                        // continuation of the last satellite read
                        match self.prn_obs.last_mut() {
                            Some(last) => last.counts.extend(counts),
                            None => return self.reject(label),
                        }
                    },
                }
            },
            Label::IonAlpha | Label::IonBeta => {
                let mut values = [0.0; 4];
                for (nth, value) in values.iter_mut().enumerate() {
                    *value = parse_float(cols(line, 2 + nth * 12, 12)).unwrap_or(0.0);
                }
                if label == Label::IonAlpha {
                    self.ion_alpha = Some(values);
                } else {
                    self.ion_beta = Some(values);
                }
            },
            Label::DeltaUtc => {
                let a0 = parse_float(cols(line, 3, 19));
                let a1 = parse_float(cols(line, 22, 19));
                let ref_time = parse_int(cols(line, 41, 9));
                let ref_week = parse_int(cols(line, 50, 9));
                match (a0, a1, ref_time, ref_week) {
                    (Some(a0), Some(a1), Some(ref_time), Some(ref_week)) => {
                        self.delta_utc = Some(DeltaUtc {
                            a0,
                            a1,
                            ref_time: ref_time as i32,
                            ref_week: ref_week as i32,
                        });
                    },
                    _ => return self.reject(label),
                }
            },
            Label::IonoCorr => {
                let mut values = [0.0; 4];
                for (nth, value) in values.iter_mut().enumerate() {
                    *value = parse_float(cols(line, 5 + nth * 12, 12)).unwrap_or(0.0);
                }
                self.iono_corrections.push(IonoCorrection {
                    kind: cols(line, 0, 4).trim().to_string(),
                    values,
                });
            },
            Label::TimeSystemCorr => {
                let a0 = parse_float(cols(line, 5, 17));
                let a1 = parse_float(cols(line, 22, 16));
                let ref_time = parse_int(cols(line, 38, 7));
                let ref_week = parse_int(cols(line, 45, 5));
                let utc_id = parse_int(cols(line, 58, 2));
                match (a0, a1, ref_time, ref_week, utc_id) {
                    (Some(a0), Some(a1), Some(ref_time), Some(ref_week), Some(utc_id)) => {
                        self.time_corrections.push(TimeCorrection {
                            kind: cols(line, 0, 4).trim().to_string(),
                            a0,
                            a1,
                            ref_time: ref_time as i32,
                            ref_week: ref_week as i32,
                            sbas: cols(line, 51, 5).trim().to_string(),
                            utc_id: utc_id as i32,
                        });
                    },
                    _ => return self.reject(label),
                }
            },
            Label::EndOfHeader => {
                debug!("end of header found");
            },
        }
        self.set_label(label);
        Ok(LineOutcome::Parsed(label))
    }

    /// `RINEX VERSION / TYPE`, where V2.10 navigation files encode the
    /// system in the file-type byte.
    fn parse_version_record(&mut self, line: &str) -> Result<(), ParsingError> {
        let value = parse_float(cols(line, 0, 9)).ok_or(ParsingError::VersionFormat)?;
        let file_type = line.chars().nth(20).unwrap_or(' ');
        let system_char = line.chars().nth(40).unwrap_or(' ');
        let version = Version::from_str(&format!("{:.2}", value))?;
        if !version.is_supported() {
            warn!("revision {} is not supported", value);
            return Err(ParsingError::NonSupportedVersion);
        }
        let normalized = version.normalized();
        if version != normalized {
            warn!("file processed as revision {}", normalized);
        }
        self.input_version = Some(normalized);
        if normalized.is_v2() {
            match file_type {
                'O' => {
                    self.file_type = FileType::Observation;
                    self.system = if system_char == ' ' {
                        Some(Constellation::GPS)
                    } else {
                        Constellation::from_char(system_char).ok()
                    };
                },
                'N' => {
                    self.file_type = FileType::Navigation;
                    self.system = Some(Constellation::GPS);
                },
                'G' => {
                    self.file_type = FileType::Navigation;
                    self.system = Some(Constellation::Glonass);
                },
                'H' => {
                    self.file_type = FileType::Navigation;
                    self.system = Some(Constellation::SBAS);
                },
                'E' => {
                    self.file_type = FileType::Navigation;
                    self.system = Some(Constellation::Galileo);
                },
                _ => return Err(ParsingError::TypeParsing),
            }
        } else {
            match file_type {
                'O' => self.file_type = FileType::Observation,
                'N' => self.file_type = FileType::Navigation,
                _ => return Err(ParsingError::TypeParsing),
            }
            self.system = Constellation::from_char(system_char).ok();
        }
        debug!(
            "revision {} / {:?} / {:?}",
            normalized, self.file_type, self.system
        );
        Ok(())
    }

    fn parse_triplet(&self, line: &str) -> Option<(f64, f64, f64)> {
        let x = parse_float(cols(line, 0, 14))?;
        let y = parse_float(cols(line, 14, 14))?;
        let z = parse_float(cols(line, 28, 14))?;
        Some((x, y, z))
    }

    fn parse_time_of_obs(line: &str) -> Option<f64> {
        let year = parse_int(cols(line, 0, 6))? as i32;
        let month = parse_int(cols(line, 6, 6))? as u32;
        let day = parse_int(cols(line, 12, 6))? as u32;
        let hour = parse_int(cols(line, 18, 6))? as u32;
        let minute = parse_int(cols(line, 24, 6))? as u32;
        let second = parse_float(cols(line, 30, 13))?;
        let (week, tow) = week_tow_from_date(year, month, day, hour, minute, second);
        Some(time_tag(week, tow))
    }

    /// Reads a continuation line, which must repeat the same label
    fn continuation_line<R: BufRead>(
        &self,
        reader: &mut R,
        label: Label,
    ) -> Result<Option<String>, ParsingError> {
        let line = match read_padded_line(reader, 81)? {
            Some(line) => line,
            None => return Ok(None),
        };
        if Label::from_line(&line) != Some(label) {
            warn!(
                "{}: continuation expected, but received {}",
                label.text(),
                cols(&line, 60, 20).trim()
            );
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn reject(&mut self, label: Label) -> Result<LineOutcome, ParsingError> {
        warn!("{}: wrong format in record data", label.text());
        self.unset_label(label);
        Ok(LineOutcome::Parsed(label))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::BufReader;

    fn parse(content: &str) -> Header {
        let mut reader = BufReader::new(content.as_bytes());
        Header::parse(&mut reader).unwrap()
    }

    const V3_OBS_HEADER: &str = "\
     3.02           OBSERVATION DATA    M: Mixed            RINEX VERSION / TYPE
sirf-rnx            test                20160120 000000 UTC PGM / RUN BY / DATE
converted from a SiRF binary log                            COMMENT
PNT1                                                        MARKER NAME
                                                            MARKER NUMBER
GEODETIC                                                    MARKER TYPE
observer            agency                                  OBSERVER / AGENCY
2.4                 SiRFIV              GSD4e               REC # / TYPE / VERS
                    UNKNOWN                                 ANT # / TYPE
  4849202.3940  -360328.9929  4114913.1862                  APPROX POSITION XYZ
        0.0000        0.0000        0.0000                  ANTENNA: DELTA H/E/N
G    4 C1C L1C D1C S1C                                      SYS / # / OBS TYPES
R    2 C1C L1C                                              SYS / # / OBS TYPES
     1.000                                                  INTERVAL
  2016    01    20    00    00    0.0000000     GPS         TIME OF FIRST OBS
                                                            END OF HEADER
";

    #[test]
    fn v3_observation_header() {
        let header = parse(V3_OBS_HEADER);
        assert_eq!(header.input_version, Some(crate::version::V302));
        assert_eq!(header.file_type, FileType::Observation);
        assert_eq!(header.system, Some(Constellation::Mixed));
        assert_eq!(header.marker_name.as_deref(), Some("PNT1"));
        assert_eq!(header.marker_type.as_deref(), Some("GEODETIC"));
        assert_eq!(header.observer.as_deref(), Some("observer"));
        assert_eq!(header.agency.as_deref(), Some("agency"));
        let receiver = header.receiver.as_ref().unwrap();
        assert_eq!(receiver.number, "2.4");
        assert_eq!(receiver.model, "SiRFIV");
        assert_eq!(receiver.version, "GSD4e");
        let (x, _, _) = header.approx_position.unwrap();
        assert!((x - 4_849_202.394).abs() < 1e-4);
        assert_eq!(header.systems.len(), 2);
        assert_eq!(header.systems[0].constellation, Constellation::GPS);
        assert_eq!(header.systems[0].observables.len(), 4);
        assert_eq!(header.systems[1].observables.len(), 2);
        assert_eq!(header.interval, Some(1.0));
        let t = header.time_of_first_obs.unwrap();
        assert_eq!(crate::epoch::gps_week(t), 1880);
        assert_eq!(crate::epoch::gps_tow(t), 259_200.0);
        // the comment anchors after the record that preceded it
        assert_eq!(header.comments.len(), 1);
        assert_eq!(header.comments[0].after, Label::ProgramRunBy);
    }

    #[test]
    fn v2_observation_header() {
        let content = "\
     2.10           OBSERVATION DATA    M (MIXED)           RINEX VERSION / TYPE
     4    C1    L1    D1    S1                              # / TYPES OF OBSERV
     1     1                                                WAVELENGTH FACT L1/2
                                                            END OF HEADER
";
        let header = parse(content);
        assert_eq!(header.input_version, Some(crate::version::V210));
        // a mixed V2 file announces the list for G, R and S
        assert_eq!(header.systems.len(), 3);
        for system in &header.systems {
            let codes: Vec<&str> = system
                .observables
                .iter()
                .map(|obs| obs.code())
                .collect();
            assert_eq!(codes, vec!["C1C", "L1C", "D1C", "S1C"]);
        }
        assert_eq!(header.wavelength_factors.len(), 1);
        assert_eq!(header.wavelength_factors[0].l1, 1);
    }

    #[test]
    fn v2_nav_file_types() {
        for (type_field, system) in [
            ("N: GPS NAV DATA", Constellation::GPS),
            ("G: GLONASS NAV DAT", Constellation::Glonass),
            ("H: SBAS NAV DATA", Constellation::SBAS),
        ] {
            let content = format!(
                "{:9}{:11}{:<40}RINEX VERSION / TYPE\n{:60}END OF HEADER      \n",
                "     2.10", "", type_field, ""
            );
            let header = parse(&content);
            assert_eq!(header.file_type, FileType::Navigation);
            assert_eq!(header.system, Some(system));
        }
    }

    #[test]
    fn continuation_lines() {
        let content = "\
     3.02           OBSERVATION DATA    G: GPS              RINEX VERSION / TYPE
G   14 C1C L1C D1C S1C C2P L2P D2P S2P C5X L5X D5X S5X C7X  SYS / # / OBS TYPES
       L7X                                                  SYS / # / OBS TYPES
                                                            END OF HEADER
";
        let header = parse(content);
        assert_eq!(header.systems.len(), 1);
        assert_eq!(header.systems[0].observables.len(), 14);
        assert_eq!(header.systems[0].observables[13].code(), "L7X");
    }

    #[test]
    fn unsupported_version() {
        let content = "\
     1.00           OBSERVATION DATA    G: GPS              RINEX VERSION / TYPE
";
        let mut reader = BufReader::new(content.as_bytes());
        assert!(Header::parse(&mut reader).is_err());
    }

    #[test]
    fn missing_end_of_header() {
        let content = "\
     3.02           OBSERVATION DATA    G: GPS              RINEX VERSION / TYPE
";
        let mut reader = BufReader::new(content.as_bytes());
        assert!(matches!(
            Header::parse(&mut reader),
            Err(ParsingError::MissingEndOfHeader)
        ));
    }

    #[test]
    fn glonass_slot_record() {
        let content = "\
     3.02           OBSERVATION DATA    R: GLONASS          RINEX VERSION / TYPE
  3 R01  1 R02 -4 R08  6                                    GLONASS SLOT / FRQ #
                                                            END OF HEADER
";
        let header = parse(content);
        assert_eq!(header.glonass_slots.len(), 3);
        assert_eq!(header.glonass_slots[1].slot, 2);
        assert_eq!(header.glonass_slots[1].frequency, -4);
    }
}
