//! Navigation epoch formatting
use crate::{
    epoch::date_of,
    error::FormattingError,
    formatter::fmt_exponent,
    Rinex,
};

use std::io::Write;

use log::debug;

/// Broadcast orbit lines and meaningful fields per system,
/// counting the three SV clock fields of the first line.
pub(crate) fn orbit_shape(system: char) -> Option<(usize, i32)> {
    match system {
        'G' => Some((8, 26)),
        'E' => Some((8, 25)),
        'R' | 'S' => Some((4, 12)),
        _ => None,
    }
}

impl Rinex {
    /// Writes every stored ephemeris as navigation records of the
    /// target revision and drains the store. A V2.10 file carries one
    /// system only: entries of other systems stay stored, untouched.
    pub fn write_nav_epoch<W: Write>(&mut self, w: &mut W) -> Result<(), FormattingError> {
        if self.navigation.is_empty() {
            return Ok(());
        }
        let version = self
            .header
            .version
            .ok_or(FormattingError::UndefinedVersion)?;
        let v2 = version.is_v2();
        let v2_system = self.header.system.map(|sys| sys.to_char());
        self.navigation.sort();
        let entries = std::mem::take(&mut self.navigation.entries);
        let mut kept = Vec::new();
        for mut entry in entries {
            if v2 && Some(entry.system) != v2_system {
                debug!("nav epoch ignored: {}{:02}", entry.system, entry.prn);
                kept.push(entry);
                continue;
            }
            let (n_lines, mut n_fields) = match orbit_shape(entry.system) {
                Some(shape) => shape,
                None => {
                    debug!("nav epoch ignored: unknown system {}", entry.system);
                    kept.push(entry);
                    continue;
                },
            };
            if v2 && entry.system == 'R' {
                // V2 Glonass message frame time is daily, not weekly
                entry.orbit[0][3] = entry.orbit[0][3].rem_euclid(86_400.0);
            }
            let (y, m, d, hh, mm, sec) = date_of(entry.time_tag);
            if v2 {
                write!(
                    w,
                    "{:02} {:02} {:02} {:02} {:02} {:02} {:4.1}",
                    entry.prn,
                    y % 100,
                    m,
                    d,
                    hh,
                    mm,
                    sec
                )?;
            } else {
                write!(
                    w,
                    "{}{:02} {:04} {:02} {:02} {:02} {:02} {:4.1}",
                    entry.system, entry.prn, y, m, d, hh, mm, sec
                )?;
            }
            for value in &entry.orbit[0][1..4] {
                write!(w, "{}", fmt_exponent(*value, 19, 12))?;
            }
            writeln!(w)?;
            n_fields -= 3;
            let line_start = if v2 { "   " } else { "    " };
            for line in entry.orbit.iter().take(n_lines).skip(1) {
                write!(w, "{}", line_start)?;
                for value in line {
                    if n_fields > 0 {
                        write!(w, "{}", fmt_exponent(*value, 19, 12))?;
                    } else {
                        write!(w, "{:19}", "")?;
                    }
                    n_fields -= 1;
                }
                writeln!(w)?;
                if n_fields <= 0 {
                    break;
                }
            }
        }
        self.navigation.entries = kept;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::constellation::Constellation;
    use crate::epoch::time_tag;
    use crate::observable::Observable;
    use crate::version::{V210, V302};
    use crate::Rinex;
    use std::str::FromStr;

    fn orbit() -> [[f64; 4]; 8] {
        let mut orbit = [[0.0; 4]; 8];
        orbit[0][1] = -1.234e-4; // clock bias
        orbit[0][2] = 2.0e-11;
        orbit[0][3] = 250_000.0;
        orbit[2][3] = 5153.623; // sqrt(A)
        orbit
    }

    fn write(rinex: &mut Rinex) -> Vec<String> {
        let mut buffer = Vec::<u8>::new();
        rinex.write_nav_epoch(&mut buffer).unwrap();
        String::from_utf8(buffer)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn v3_gps_record() {
        let mut rinex = Rinex::new(Some(V302));
        rinex.save_nav('G', 7, orbit(), time_tag(1880, 259_200.0));
        let lines = write(&mut rinex);
        // 26 meaningful fields: the description line then six
        // broadcast orbit lines, the last one partially blank
        assert_eq!(lines.len(), 7);
        assert_eq!(
            lines[0],
            "G07 2016 01 20 00 00  0.0-1.234000000000E-04 2.000000000000E-11 2.500000000000E+05"
        );
        assert!(lines[1].starts_with("    "));
        assert_eq!(lines[1].len(), 4 + 4 * 19);
        assert_eq!(lines[6].trim_end().len(), 4 + 3 * 19);
        assert!(rinex.navigation.is_empty());
    }

    #[test]
    fn v3_glonass_four_lines() {
        let mut rinex = Rinex::new(Some(V302));
        rinex.save_nav('R', 3, orbit(), time_tag(1880, 259_200.0));
        let lines = write(&mut rinex);
        assert_eq!(lines.len(), 4);
        // 12 fields: 3 on the first line, 4 + 4 + 1 on the rest
        assert_eq!(lines[3].trim_end().len(), 4 + 19);
    }

    #[test]
    fn v2_selects_single_system() {
        let mut rinex = Rinex::new(Some(V210));
        rinex.header.set_system(
            Constellation::GPS,
            vec![Observable::from_str("C1C").unwrap()],
        );
        let mut sink = Vec::<u8>::new();
        rinex.write_nav_header(&mut sink).unwrap();
        rinex.save_nav('G', 7, orbit(), time_tag(1880, 259_200.0));
        rinex.save_nav('R', 3, orbit(), time_tag(1880, 259_200.0));
        let lines = write(&mut rinex);
        assert!(lines[0].starts_with("07 16 01 20 00 00  0.0"));
        // the Glonass entry stays stored for a later pass
        assert_eq!(rinex.navigation.len(), 1);
        assert_eq!(rinex.navigation.iter().next().unwrap().system, 'R');
    }

    #[test]
    fn v2_glonass_tk_reduced_daily() {
        let mut rinex = Rinex::new(Some(V210));
        rinex.header.set_system(
            Constellation::Glonass,
            vec![Observable::from_str("C1C").unwrap()],
        );
        let mut sink = Vec::<u8>::new();
        rinex.write_nav_header(&mut sink).unwrap();
        rinex.save_nav('R', 3, orbit(), time_tag(1880, 259_200.0));
        let lines = write(&mut rinex);
        // 250 000 s of week reduces to 77 200 s of day
        assert!(lines[0].contains("7.720000000000E+04"));
    }
}
