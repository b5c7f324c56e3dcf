//! Observation epoch formatting
use crate::{
    epoch::{date_of, EpochFlag},
    error::FormattingError,
    header::FileType,
    observation::{MAX_OBS_VALUE, MIN_OBS_VALUE},
    Rinex,
};

use std::io::Write;

use log::warn;

impl Rinex {
    /// Writes the epoch being built as observation records of the
    /// target revision, draining the store. Filtering is applied
    /// first; an epoch left empty writes nothing. Special events
    /// (flags 2..5) write the epoch line and every header record
    /// holding data.
    pub fn write_obs_epoch<W: Write>(&mut self, w: &mut W) -> Result<(), FormattingError> {
        let version = self
            .header
            .version
            .ok_or(FormattingError::UndefinedVersion)?;
        if self.epoch.flag.is_observation() {
            if !self.filter_observations() {
                return Ok(());
            }
            if version.is_v2() {
                self.translate_to_v2();
                if self.observations.is_empty() {
                    return Ok(());
                }
                self.observations.sort();
                self.write_epoch_line_v2(w)?;
                while self.write_sat_obs_values(w, 5)? {}
            } else {
                self.observations.sort();
                self.write_epoch_line_v3(w)?;
                loop {
                    let first = &self.observations.entries[0];
                    let system = self.header.systems[first.system_index].constellation;
                    write!(w, "{}{:02}", system, first.prn)?;
                    if !self.write_sat_obs_values(w, 999)? {
                        break;
                    }
                }
            }
        } else {
            // special event: the epoch line, then the header records
            // holding data
            self.n_sats_epoch = self
                .header
                .event_record_count(version, FileType::Observation);
            let date = self.fmt_epoch_date(version.is_v2());
            writeln!(w, "{}  {}{:3}", date, self.epoch.flag, self.n_sats_epoch)?;
            if self.n_sats_epoch > 0 {
                self.header
                    .format_event_records(w, version, FileType::Observation)?;
            }
        }
        Ok(())
    }

    /// Appends the end-of-file trailer: a header-information event
    /// carrying a single closing comment.
    pub fn write_obs_eof<W: Write>(&mut self, w: &mut W) -> Result<(), FormattingError> {
        self.epoch.flag = EpochFlag::HeaderInformationFollows;
        self.header.clear();
        self.header.add_comment("END OF FILE");
        self.write_obs_epoch(w)
    }

    /// Replaces V3 observable indexes by positions in the V2 union
    /// list, dropping measurements V2 cannot describe.
    fn translate_to_v2(&mut self) {
        let header = &self.header;
        self.observations.entries.retain_mut(|obs| {
            let sys = &header.systems[obs.system_index];
            let name = match sys.observables[obs.obs_index].to_v2(sys.constellation) {
                Some(name) => name,
                None => return false,
            };
            match header.v2_observable_index(name) {
                Some(index) => {
                    obs.obs_index = index;
                    true
                },
                None => false,
            }
        });
    }

    fn fmt_epoch_date(&self, v2: bool) -> String {
        let (y, m, d, hh, mm, sec) = date_of(self.epoch.time_tag());
        if v2 {
            format!(
                " {:02} {:02} {:02} {:02} {:02}{:11.7}",
                y % 100,
                m,
                d,
                hh,
                mm,
                sec
            )
        } else {
            format!("> {:04} {:02} {:02} {:02} {:02}{:11.7}", y, m, d, hh, mm, sec)
        }
    }

    /// V2.10 epoch description: date, flag, satellite count, satellite
    /// triples wrapped at 12 per line, clock offset on the line the
    /// twelfth satellite lands on.
    fn write_epoch_line_v2<W: Write>(&mut self, w: &mut W) -> Result<(), FormattingError> {
        let sats = self.epoch_sats();
        self.n_sats_epoch = sats.len();
        write!(
            w,
            "{}  {}{:3}",
            self.fmt_epoch_date(true),
            self.epoch.flag,
            self.n_sats_epoch
        )?;
        let mut printed = 0;
        let mut clock_printed = false;
        for (system_index, prn) in sats {
            if printed > 0 && printed % 12 == 0 {
                write!(w, "\n{:32}", "")?;
            }
            let system = self.header.systems[system_index].constellation;
            write!(w, "{}{:02}", system, prn)?;
            printed += 1;
            if printed == 12 {
                write!(w, "{:12.9}", self.epoch.clock_offset)?;
                clock_printed = true;
            }
        }
        while printed % 12 != 0 {
            write!(w, "   ")?;
            printed += 1;
        }
        if clock_printed {
            writeln!(w)?;
        } else {
            writeln!(w, "{:12.9}", self.epoch.clock_offset)?;
        }
        Ok(())
    }

    /// V3.02 epoch description, one line whatever the satellite count
    fn write_epoch_line_v3<W: Write>(&mut self, w: &mut W) -> Result<(), FormattingError> {
        let sats = self.epoch_sats();
        self.n_sats_epoch = sats.len();
        writeln!(
            w,
            "{}  {}{:3}{:5}{:15.12}{:3}",
            self.fmt_epoch_date(false),
            self.epoch.flag,
            self.n_sats_epoch,
            "",
            self.epoch.clock_offset,
            ""
        )?;
        Ok(())
    }

    /// The distinct satellites of the sorted store, in order
    fn epoch_sats(&self) -> Vec<(usize, u8)> {
        use itertools::Itertools;
        self.observations
            .iter()
            .map(|obs| (obs.system_index, obs.prn))
            .dedup()
            .collect()
    }

    /// Writes the observable values of the first stored satellite,
    /// `max_per_line` to a line, removing them from the store. Values
    /// the F14.3 field cannot carry are written as zero, gaps in the
    /// observable sequence as empty zero fields. Returns whether
    /// measurements remain.
    fn write_sat_obs_values<W: Write>(
        &mut self,
        w: &mut W,
        max_per_line: usize,
    ) -> Result<bool, FormattingError> {
        let entries = &mut self.observations.entries;
        if entries.is_empty() {
            return Ok(false);
        }
        let system_index = entries[0].system_index;
        let prn = entries[0].prn;
        let mut next_index = 0;
        while !entries.is_empty()
            && entries[0].system_index == system_index
            && entries[0].prn == prn
        {
            if entries[0].obs_index < next_index {
                warn!(
                    "epoch {} sat {}{:02}: observable already written, ignored",
                    entries[0].time_tag,
                    self.header.systems[system_index].constellation,
                    prn
                );
                entries.remove(0);
                continue;
            }
            if entries[0].obs_index == next_index {
                let obs = entries.remove(0);
                let mut value = obs.value;
                if !(MIN_OBS_VALUE..=MAX_OBS_VALUE).contains(&value) {
                    value = 0.0;
                }
                write!(w, "{:14.3}", value)?;
                if obs.lli == 0 {
                    write!(w, " ")?;
                } else {
                    write!(w, "{}", obs.lli)?;
                }
                if obs.strength == 0 {
                    write!(w, " ")?;
                } else {
                    write!(w, "{}", obs.strength)?;
                }
            } else {
                write!(w, "{:14.3}  ", 0.0)?;
            }
            next_index += 1;
            if next_index % max_per_line == 0 {
                writeln!(w)?;
            }
        }
        if next_index % max_per_line != 0 {
            writeln!(w)?;
        }
        Ok(!entries.is_empty())
    }
}
