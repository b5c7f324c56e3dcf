//! RINEX header formatting
use crate::{
    constellation::Constellation,
    epoch::date_of,
    error::FormattingError,
    formatter::fmt_exponent,
    header::{labels::LABELS, FileType, Header, Label, Obligation},
    version::Version,
};

use std::io::Write;

use log::warn;

/// Pads content to 60 columns and appends the record label text
pub(crate) fn fmt_line(content: &str, label: &str) -> String {
    format!("{:<60.60}{:<20.20}", content, label)
}

impl Header {
    /// Promotes the version record and writes every observation header
    /// record with data; obligatory records without data are warned
    /// about, never fatal.
    pub(crate) fn format_obs_header<W: Write>(&mut self, w: &mut W) -> Result<(), FormattingError> {
        if self.selected_systems() == 0 {
            return Err(FormattingError::NoConstellationDefinition);
        }
        let version = self.promote_version()?;
        self.file_type = FileType::Observation;
        self.system = if self.selected_systems() > 1 {
            Some(Constellation::Mixed)
        } else {
            self.systems
                .iter()
                .find(|sys| sys.selected)
                .map(|sys| sys.constellation)
        };
        // select the observable list record the target version uses
        if version.is_v2() {
            self.v2_observables = self.v2_observable_union();
            self.set_label(Label::TypesOfObserv);
            self.unset_label(Label::SysObsTypes);
        } else {
            self.set_label(Label::SysObsTypes);
            self.unset_label(Label::TypesOfObserv);
        }
        self.set_label(Label::Version);
        self.format_records(w, version, FileType::Observation)
    }

    /// Promotes the version record and writes every navigation header
    /// record with data. In V2.10 a navigation file carries a single
    /// system: the selected one, or the only declared one.
    pub(crate) fn format_nav_header<W: Write>(&mut self, w: &mut W) -> Result<(), FormattingError> {
        let version = self.promote_version()?;
        self.file_type = FileType::Navigation;
        let v2_input = self.input_version.map(|v| v.is_v2()).unwrap_or(false);
        if version.is_v2() {
            if v2_input && self.system.is_some() {
                // the input file type already pinned the system
            } else {
                if !self.nav_filtering {
                    if self.systems.len() == 1 {
                        // assume the system holding observation data
                        self.nav_selection =
                            vec![self.systems[0].constellation.to_char().to_string()];
                        self.nav_filtering = true;
                    } else {
                        return Err(FormattingError::NoSystemSelected);
                    }
                }
                let letter = self
                    .nav_selection
                    .first()
                    .and_then(|sel| sel.chars().next())
                    .ok_or(FormattingError::NoSystemSelected)?;
                self.system = Some(
                    Constellation::from_char(letter)
                        .map_err(|_| FormattingError::NoSystemSelected)?,
                );
            }
        } else if self.input_version.is_none() {
            self.system = Some(Constellation::Mixed);
        }
        self.set_label(Label::Version);
        self.format_records(w, version, FileType::Navigation)
    }

    /// Takes the version to produce from the construction argument or
    /// the input file, and pins it to a concrete revision.
    fn promote_version(&mut self) -> Result<Version, FormattingError> {
        let version = self
            .version
            .or(self.input_version)
            .ok_or(FormattingError::UndefinedVersion)?
            .normalized();
        self.version = Some(version);
        Ok(version)
    }

    fn format_records<W: Write>(
        &self,
        w: &mut W,
        version: Version,
        role: FileType,
    ) -> Result<(), FormattingError> {
        for spec in LABELS {
            let obligation = match role {
                FileType::Observation => spec.obs,
                FileType::Navigation => spec.nav,
            };
            if obligation != Obligation::NotApplicable && spec.scope.contains(version) {
                if spec.label == Label::Comm {
                    // comments print at their anchor position
                } else if self.has_data(spec.label) {
                    self.format_record(w, spec.label, version)?;
                } else if obligation == Obligation::Obligatory {
                    warn!("{}: header record is obligatory, but has no data", spec.text);
                }
            }
            for comment in self.comments.iter().filter(|c| c.after == spec.label) {
                writeln!(w, "{}", fmt_line(&comment.text, Label::Comm.text()))?;
            }
        }
        Ok(())
    }

    /// Number of special records (header lines and comments) a
    /// flag 2..5 event would carry in the given revision.
    pub(crate) fn event_record_count(&self, version: Version, role: FileType) -> usize {
        let mut count = 0;
        for spec in LABELS {
            let obligation = match role {
                FileType::Observation => spec.obs,
                FileType::Navigation => spec.nav,
            };
            if obligation != Obligation::NotApplicable && spec.scope.contains(version) {
                if spec.label != Label::Comm && self.has_data(spec.label) {
                    count += 1;
                }
            }
            count += self.comments.iter().filter(|c| c.after == spec.label).count();
        }
        count
    }

    /// Writes the special records of a flag 2..5 event: every header
    /// record with data, comments at their anchored positions.
    pub(crate) fn format_event_records<W: Write>(
        &self,
        w: &mut W,
        version: Version,
        role: FileType,
    ) -> Result<(), FormattingError> {
        for spec in LABELS {
            let obligation = match role {
                FileType::Observation => spec.obs,
                FileType::Navigation => spec.nav,
            };
            if obligation != Obligation::NotApplicable
                && spec.scope.contains(version)
                && spec.label != Label::Comm
                && self.has_data(spec.label)
            {
                self.format_record(w, spec.label, version)?;
            }
            for comment in self.comments.iter().filter(|c| c.after == spec.label) {
                writeln!(w, "{}", fmt_line(&comment.text, Label::Comm.text()))?;
            }
        }
        Ok(())
    }

    /// The union of V2 observable names over the selected systems,
    /// in first-seen order.
    fn v2_observable_union(&self) -> Vec<String> {
        let mut union = Vec::<String>::new();
        for sys in &self.systems {
            for (index, observable) in sys.observables.iter().enumerate() {
                if self.obs_filtering && (!sys.selected || !sys.selected_observables[index]) {
                    continue;
                }
                if let Some(name) = observable.to_v2(sys.constellation) {
                    if !union.iter().any(|existing| existing == name) {
                        union.push(name.to_string());
                    }
                }
            }
        }
        union
    }

    /// Position of a V2 observable name in the derived union list
    pub(crate) fn v2_observable_index(&self, name: &str) -> Option<usize> {
        self.v2_observables.iter().position(|obs| obs == name)
    }

    /// Writes one header record at its fixed column layout
    pub(crate) fn format_record<W: Write>(
        &self,
        w: &mut W,
        label: Label,
        version: Version,
    ) -> Result<(), FormattingError> {
        let text = label.text();
        match label {
            Label::Version => {
                writeln!(w, "{}", fmt_line(&self.fmt_version_record(version), text))?;
            },
            Label::ProgramRunBy => {
                let now = hifitime::Epoch::now()
                    .unwrap_or_else(|_| hifitime::Epoch::from_gregorian_utc_at_midnight(2000, 1, 1));
                let (y, m, d, hh, mm, ss, _) = now.to_gregorian_utc();
                let content = format!(
                    "{:<20.20}{:<20.20}{:04}{:02}{:02} {:02}{:02}{:02} UTC ",
                    self.program.as_deref().unwrap_or(""),
                    self.run_by.as_deref().unwrap_or(""),
                    y,
                    m,
                    d,
                    hh,
                    mm,
                    ss,
                );
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::MarkerName => {
                writeln!(
                    w,
                    "{}",
                    fmt_line(self.marker_name.as_deref().unwrap_or(""), text)
                )?;
            },
            Label::MarkerNumber => {
                writeln!(
                    w,
                    "{}",
                    fmt_line(self.marker_number.as_deref().unwrap_or(""), text)
                )?;
            },
            Label::MarkerType => {
                let content = format!("{:<20.20}", self.marker_type.as_deref().unwrap_or(""));
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::ObserverAgency => {
                let content = format!(
                    "{:<20.20}{:<40.40}",
                    self.observer.as_deref().unwrap_or(""),
                    self.agency.as_deref().unwrap_or("")
                );
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::ReceiverType => {
                let rcvr = self.receiver.clone().unwrap_or_default();
                let content = format!(
                    "{:<20.20}{:<20.20}{:<20.20}",
                    rcvr.number, rcvr.model, rcvr.version
                );
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::AntennaType => {
                let antenna = self.antenna.clone().unwrap_or_default();
                let content = format!("{:<20.20}{:<20.20}", antenna.number, antenna.model);
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::ApproxPosition => {
                self.fmt_triplet(w, self.approx_position, text)?;
            },
            Label::AntennaDeltaHen => {
                self.fmt_triplet(w, self.antenna_delta_hen, text)?;
            },
            Label::AntennaDeltaXyz => {
                self.fmt_triplet(w, self.antenna_delta_xyz, text)?;
            },
            Label::AntennaPhaseCenter => {
                let pc = self.antenna_phase_center.clone().unwrap_or_default();
                let content = format!(
                    "{} {:<3.3}{:9.4}{:14.4}{:14.4}",
                    pc.system, pc.code, pc.north, pc.east, pc.up
                );
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::AntennaBoresight => {
                self.fmt_triplet(w, self.antenna_boresight, text)?;
            },
            Label::AntennaZeroDirAzi => {
                let content = format!("{:14.4}", self.antenna_zerodir_azi.unwrap_or(0.0));
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::AntennaZeroDirXyz => {
                self.fmt_triplet(w, self.antenna_zerodir_xyz, text)?;
            },
            Label::CenterOfMass => {
                self.fmt_triplet(w, self.center_of_mass, text)?;
            },
            Label::WavelengthFactor => {
                for factor in &self.wavelength_factors {
                    let mut content =
                        format!("{:6}{:6}{:6}", factor.l1, factor.l2, factor.sats.len());
                    for sat in factor.sats.iter().take(7) {
                        content.push_str(&format!("   {:>3.3}", sat));
                    }
                    writeln!(w, "{}", fmt_line(&content, text))?;
                }
            },
            Label::TypesOfObserv => {
                let items: Vec<String> = self
                    .v2_observables
                    .iter()
                    .map(|name| format!("    {:>2.2}", name))
                    .collect();
                let prefix = format!("{:6}", self.v2_observables.len());
                self.fmt_block(w, &prefix, "      ", &items, 9, text)?;
            },
            Label::SysObsTypes => {
                for sys in &self.systems {
                    if self.obs_filtering && !sys.selected {
                        continue;
                    }
                    let items: Vec<String> = sys
                        .observables
                        .iter()
                        .enumerate()
                        .filter(|(index, _)| {
                            !self.obs_filtering || sys.selected_observables[*index]
                        })
                        .map(|(_, obs)| format!(" {:>3}", obs))
                        .collect();
                    if items.is_empty() {
                        continue;
                    }
                    let prefix = format!("{}  {:3}", sys.constellation, items.len());
                    self.fmt_block(w, &prefix, "      ", &items, 13, text)?;
                }
            },
            Label::SignalStrengthUnit => {
                let content = format!("{:<20.20}", self.signal_strength_unit.as_deref().unwrap_or(""));
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::Interval => {
                let content = format!("{:10.3}", self.interval.unwrap_or(0.0));
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::TimeOfFirstObs => {
                let content =
                    self.fmt_time_of_obs(self.time_of_first_obs.unwrap_or(0.0));
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::TimeOfLastObs => {
                let content = self.fmt_time_of_obs(self.time_of_last_obs.unwrap_or(0.0));
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::RcvClockOffsApplied => {
                let content = format!("{:6}", self.rcv_clock_offs_applied.unwrap_or(0));
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::DcbsApplied => {
                self.fmt_corrections(w, &self.dcbs_applied, text)?;
            },
            Label::PcvsApplied => {
                self.fmt_corrections(w, &self.pcvs_applied, text)?;
            },
            Label::SysScaleFactor => {
                for scale in &self.scale_factors {
                    if self.obs_filtering && !self.systems[scale.system_index].selected {
                        continue;
                    }
                    let items: Vec<String> = scale
                        .observables
                        .iter()
                        .map(|obs| format!(" {:<3.3}", obs))
                        .collect();
                    let prefix = format!(
                        "{} {:4}  {:2}",
                        self.systems[scale.system_index].constellation,
                        scale.factor,
                        scale.observables.len()
                    );
                    self.fmt_block(w, &prefix, "          ", &items, 12, text)?;
                }
            },
            Label::PhaseShifts => {
                for shift in &self.phase_shifts {
                    if self.obs_filtering && !self.systems[shift.system_index].selected {
                        continue;
                    }
                    let items: Vec<String> =
                        shift.sats.iter().map(|sat| format!(" {:<3.3}", sat)).collect();
                    let prefix = format!(
                        "{} {:<3.3} {:8.5}  {:2}",
                        self.systems[shift.system_index].constellation,
                        shift.code,
                        shift.correction,
                        shift.sats.len()
                    );
                    self.fmt_block(w, &prefix, &" ".repeat(18), &items, 10, text)?;
                }
            },
            Label::GlonassSlotFreq => {
                let items: Vec<String> = self
                    .glonass_slots
                    .iter()
                    .map(|entry| format!(" R{:02} {:2}", entry.slot, entry.frequency))
                    .collect();
                let prefix = format!("{:3}", self.glonass_slots.len());
                self.fmt_block(w, &prefix, "   ", &items, 8, text)?;
            },
            Label::LeapSecs => {
                let leap = self.leap_seconds.unwrap_or_default();
                let content = if version.is_v2() {
                    format!("{:6}", leap.seconds)
                } else {
                    format!("{:6}{:6}{:6}{:6}", leap.seconds, leap.delta_lsf, leap.week, leap.day)
                };
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::NumSatellites => {
                let content = format!("{:6}", self.num_satellites.unwrap_or(0));
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::PrnNumObs => {
                for prn in &self.prn_obs {
                    let items: Vec<String> =
                        prn.counts.iter().map(|count| format!("{:6}", count)).collect();
                    let prefix = format!("   {}{:<2}", prn.system, prn.prn);
                    self.fmt_block(w, &prefix, "      ", &items, 9, text)?;
                }
            },
            Label::IonAlpha => {
                if let Some(values) = self.ion_alpha {
                    writeln!(w, "{}", fmt_line(&Self::fmt_ion_model(&values), text))?;
                }
            },
            Label::IonBeta => {
                if let Some(values) = self.ion_beta {
                    writeln!(w, "{}", fmt_line(&Self::fmt_ion_model(&values), text))?;
                }
            },
            Label::DeltaUtc => {
                let delta = self.delta_utc.clone().unwrap_or_default();
                let content = format!(
                    "   {}{}{:9}{:9}",
                    fmt_exponent(delta.a0, 19, 12),
                    fmt_exponent(delta.a1, 19, 12),
                    delta.ref_time,
                    delta.ref_week
                );
                writeln!(w, "{}", fmt_line(&content, text))?;
            },
            Label::IonoCorr => {
                for correction in &self.iono_corrections {
                    let mut content = format!("{:<4.4} ", correction.kind);
                    for value in correction.values {
                        content.push_str(&fmt_exponent(value, 12, 4));
                    }
                    writeln!(w, "{}", fmt_line(&content, text))?;
                }
            },
            Label::TimeSystemCorr => {
                for correction in &self.time_corrections {
                    let content = format!(
                        "{:<4.4} {:17.10}{:16.9}{:7}{:5} {:<5.5} {:2} ",
                        correction.kind,
                        correction.a0,
                        correction.a1,
                        correction.ref_time,
                        correction.ref_week,
                        correction.sbas,
                        correction.utc_id
                    );
                    writeln!(w, "{}", fmt_line(&content, text))?;
                }
            },
            Label::EndOfHeader => {
                writeln!(w, "{}", fmt_line("", text))?;
            },
            Label::Comm => {
                // handled at anchor positions
            },
        }
        Ok(())
    }

    /// Content of the `RINEX VERSION / TYPE` record, which is where
    /// V2.10 navigation files encode the system in the file type.
    fn fmt_version_record(&self, version: Version) -> String {
        let value = version.major as f64 + version.minor as f64 / 100.0;
        let system = self.system.unwrap_or(Constellation::Mixed);
        let (type_char, type_sfx, sys_char, sys_sfx): (char, &str, String, &str) =
            match self.file_type {
                FileType::Observation => (
                    'O',
                    "BSERVATION DATA",
                    system.to_char().to_string(),
                    system.description(),
                ),
                FileType::Navigation => {
                    if version.is_v2() {
                        match system {
                            Constellation::Glonass => ('G', "LONASS navigation", " ".into(), ""),
                            Constellation::SBAS => ('H', ":SBAS navigation", " ".into(), ""),
                            Constellation::Galileo => ('E', ":Galileo navigation", " ".into(), ""),
                            _ => ('N', "avigation GPS", " ".into(), ""),
                        }
                    } else {
                        (
                            'N',
                            "AVIGATION DATA",
                            system.to_char().to_string(),
                            system.description(),
                        )
                    }
                },
            };
        format!(
            "{:9.2}{:11}{}{:<19.19}{}{:<19.19}",
            value, "", type_char, type_sfx, sys_char, sys_sfx
        )
    }

    fn fmt_triplet<W: Write>(
        &self,
        w: &mut W,
        triplet: Option<(f64, f64, f64)>,
        text: &str,
    ) -> Result<(), FormattingError> {
        let (x, y, z) = triplet.unwrap_or((0.0, 0.0, 0.0));
        let content = format!("{:14.4}{:14.4}{:14.4}", x, y, z);
        writeln!(w, "{}", fmt_line(&content, text))?;
        Ok(())
    }

    fn fmt_time_of_obs(&self, t: f64) -> String {
        let (y, m, d, hh, mm, sec) = date_of(t);
        format!(
            "  {:04}    {:02}    {:02}    {:02}    {:02}  {:11.7}     {:<3.3}",
            y,
            m,
            d,
            hh,
            mm,
            sec,
            self.time_system.as_deref().unwrap_or("GPS")
        )
    }

    fn fmt_corrections<W: Write>(
        &self,
        w: &mut W,
        corrections: &[super::CorrectionApplied],
        text: &str,
    ) -> Result<(), FormattingError> {
        for correction in corrections {
            if self.obs_filtering && !self.systems[correction.system_index].selected {
                continue;
            }
            let content = format!(
                "{} {:<17.17} {:<40.40}",
                self.systems[correction.system_index].constellation,
                correction.program,
                correction.source
            );
            writeln!(w, "{}", fmt_line(&content, text))?;
        }
        Ok(())
    }

    /// Writes preformatted fixed-width items, `per_line` to a line,
    /// continuation lines carrying `cont_prefix`.
    fn fmt_block<W: Write>(
        &self,
        w: &mut W,
        first_prefix: &str,
        cont_prefix: &str,
        items: &[String],
        per_line: usize,
        text: &str,
    ) -> Result<(), FormattingError> {
        if items.is_empty() {
            return Ok(());
        }
        for (nth, chunk) in items.chunks(per_line).enumerate() {
            let mut content = if nth == 0 {
                first_prefix.to_string()
            } else {
                cont_prefix.to_string()
            };
            for item in chunk {
                content.push_str(item);
            }
            writeln!(w, "{}", fmt_line(&content, text))?;
        }
        Ok(())
    }

    fn fmt_ion_model(values: &[f64; 4]) -> String {
        let mut content = String::from("  ");
        for value in values {
            content.push_str(&fmt_exponent(*value, 12, 4));
        }
        content
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::observable::Observable;
    use crate::version::{V210, V302};
    use std::str::FromStr;

    fn obs_header() -> Header {
        let mut header = Header::new(Some(V302));
        header.set_system(
            Constellation::GPS,
            ["C1C", "L1C", "D1C", "S1C"]
                .iter()
                .map(|c| Observable::from_str(c).unwrap())
                .collect(),
        );
        header.set_marker_name("PNT1");
        header
    }

    fn to_lines(header: &mut Header, v2: bool) -> Vec<String> {
        let mut buffer = Vec::<u8>::new();
        header.version = Some(if v2 { V210 } else { V302 });
        header.format_obs_header(&mut buffer).unwrap();
        String::from_utf8(buffer)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn version_record_v3() {
        let mut header = obs_header();
        let lines = to_lines(&mut header, false);
        assert_eq!(
            lines[0],
            "     3.02           OBSERVATION DATA    G: GPS              RINEX VERSION / TYPE"
        );
        assert_eq!(lines.len() as usize, lines.iter().filter(|l| l.len() == 80).count());
    }

    #[test]
    fn version_record_v2() {
        let mut header = obs_header();
        let lines = to_lines(&mut header, true);
        assert_eq!(
            lines[0],
            "     2.10           OBSERVATION DATA    G: GPS              RINEX VERSION / TYPE"
        );
        // V2 observable union, translated
        let tobs = lines
            .iter()
            .find(|l| l.ends_with("# / TYPES OF OBSERV "))
            .unwrap();
        assert_eq!(
            tobs.as_str(),
            "     4    C1    L1    D1    S1                              # / TYPES OF OBSERV "
        );
    }

    #[test]
    fn sys_obs_types_v3() {
        let mut header = obs_header();
        let lines = to_lines(&mut header, false);
        let sys = lines
            .iter()
            .find(|l| l.ends_with("SYS / # / OBS TYPES "))
            .unwrap();
        assert_eq!(
            sys.as_str(),
            "G    4 C1C L1C D1C S1C                                      SYS / # / OBS TYPES "
        );
    }

    #[test]
    fn sys_obs_types_continuation() {
        let mut header = Header::new(Some(V302));
        let codes: Vec<Observable> = [
            "C1C", "L1C", "D1C", "S1C", "C2P", "L2P", "D2P", "S2P", "C5X", "L5X", "D5X", "S5X",
            "C7X", "L7X",
        ]
        .iter()
        .map(|c| Observable::from_str(c).unwrap())
        .collect();
        header.set_system(Constellation::GPS, codes);
        let lines = to_lines(&mut header, false);
        let sys: Vec<&String> = lines
            .iter()
            .filter(|l| l.ends_with("SYS / # / OBS TYPES "))
            .collect();
        assert_eq!(sys.len(), 2);
        assert!(sys[0].starts_with("G   14 C1C"));
        assert!(sys[1].starts_with("       C7X L7X"));
    }

    #[test]
    fn time_of_first_obs() {
        let mut header = obs_header();
        header.set_time_of_first_obs(crate::epoch::time_tag(1880, 259_200.0));
        let lines = to_lines(&mut header, false);
        let tofo = lines
            .iter()
            .find(|l| l.ends_with("TIME OF FIRST OBS   "))
            .unwrap();
        assert_eq!(
            tofo.as_str(),
            "  2016    01    20    00    00    0.0000000     GPS         TIME OF FIRST OBS   "
        );
    }

    #[test]
    fn comments_follow_their_anchor() {
        let mut header = obs_header();
        header.add_comment("converted from a SiRF binary log");
        let lines = to_lines(&mut header, false);
        let position_comment = lines
            .iter()
            .position(|l| l.ends_with("COMMENT             "))
            .unwrap();
        let position_marker = lines.iter().position(|l| l.contains("MARKER NAME")).unwrap();
        assert_eq!(position_comment, position_marker + 1);
    }

    #[test]
    fn end_of_header_terminates() {
        let mut header = obs_header();
        let lines = to_lines(&mut header, false);
        assert!(lines.last().unwrap().ends_with("END OF HEADER       "));
    }

    #[test]
    fn nav_header_v2_requires_single_system() {
        let mut header = Header::new(Some(V210));
        header.set_system(
            Constellation::GPS,
            vec![Observable::from_str("C1C").unwrap()],
        );
        header.set_system(
            Constellation::Glonass,
            vec![Observable::from_str("C1C").unwrap()],
        );
        let mut buffer = Vec::<u8>::new();
        assert!(matches!(
            header.format_nav_header(&mut buffer),
            Err(FormattingError::NoSystemSelected)
        ));
    }

    #[test]
    fn nav_header_v2_glonass_file_type() {
        let mut header = Header::new(Some(V210));
        header.set_system(
            Constellation::Glonass,
            vec![Observable::from_str("C1C").unwrap()],
        );
        let mut buffer = Vec::<u8>::new();
        header.format_nav_header(&mut buffer).unwrap();
        let content = String::from_utf8(buffer).unwrap();
        let version = content.lines().next().unwrap();
        assert_eq!(
            version,
            "     2.10           GLONASS navigation                      RINEX VERSION / TYPE"
        );
    }
}
