//! Satellite vehicle identification
use crate::constellation::Constellation;
use crate::error::ParsingError;

/// `SV` identifies a satellite vehicle as RINEX does: one
/// constellation letter and a PRN (or slot, for Glonass) number.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SV {
    /// [Constellation] this vehicle belongs to
    pub constellation: Constellation,
    /// PRN (GPS), slot number (Glonass) or PRN-100 (SBAS)
    pub prn: u8,
}

impl SV {
    /// Builds a new [SV]
    pub fn new(constellation: Constellation, prn: u8) -> Self {
        Self { constellation, prn }
    }
}

impl std::str::FromStr for SV {
    type Err = ParsingError;
    /// Parses an `Xnn` descriptor, tolerating a blank digit (`G 7`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 2 {
            return Err(ParsingError::SVParsing);
        }
        let constellation = Constellation::from_char(
            s.chars().next().ok_or(ParsingError::SVParsing)?,
        )
        .map_err(|_| ParsingError::SVParsing)?;
        let prn = s[1..]
            .trim()
            .parse::<u8>()
            .map_err(|_| ParsingError::SVParsing)?;
        Ok(Self { constellation, prn })
    }
}

impl std::fmt::Display for SV {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{:02}", self.constellation, self.prn)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parsing() {
        for (desc, sys, prn) in [
            ("G01", Constellation::GPS, 1),
            ("G 7", Constellation::GPS, 7),
            ("R24", Constellation::Glonass, 24),
            ("S23", Constellation::SBAS, 23),
            ("E12", Constellation::Galileo, 12),
        ] {
            let sv = SV::from_str(desc).unwrap();
            assert_eq!(sv.constellation, sys);
            assert_eq!(sv.prn, prn);
        }
        assert!(SV::from_str("X01").is_err());
        assert!(SV::from_str("G").is_err());
    }

    #[test]
    fn formatting() {
        assert_eq!(SV::new(Constellation::GPS, 7).to_string(), "G07");
        assert_eq!(SV::new(Constellation::Glonass, 14).to_string(), "R14");
    }
}
