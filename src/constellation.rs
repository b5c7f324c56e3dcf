//! GNSS constellations the receiver and the RINEX standards know about.
use crate::error::ParsingError;

/// Describes the GNSS constellations a SiRF receiver may track,
/// plus the `Mixed` aggregate used in RINEX version records.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Constellation {
    /// `G`: Global Positioning System
    #[default]
    GPS,
    /// `R`: Glonass
    Glonass,
    /// `E`: Galileo
    Galileo,
    /// `S`: SBAS geostationary payload
    SBAS,
    /// `M`: mixed content, only valid as file-level aggregate
    Mixed,
}

impl Constellation {
    /// Builds a [Constellation] from its RINEX single-letter code.
    pub fn from_char(c: char) -> Result<Self, ParsingError> {
        match c {
            'G' => Ok(Self::GPS),
            'R' => Ok(Self::Glonass),
            'E' => Ok(Self::Galileo),
            'S' => Ok(Self::SBAS),
            'M' => Ok(Self::Mixed),
            _ => Err(ParsingError::ConstellationParsing),
        }
    }

    /// Returns the RINEX single-letter code
    pub fn to_char(self) -> char {
        match self {
            Self::GPS => 'G',
            Self::Glonass => 'R',
            Self::Galileo => 'E',
            Self::SBAS => 'S',
            Self::Mixed => 'M',
        }
    }

    /// Descriptive suffix printed next to the system letter
    /// in `RINEX VERSION / TYPE` records.
    pub(crate) fn description(&self) -> &'static str {
        match self {
            Self::GPS => ": GPS",
            Self::Glonass => ": GLONASS",
            Self::Galileo => ": Galileo",
            Self::SBAS => ": SBAS payload",
            Self::Mixed => ": Mixed",
        }
    }

    /// True if RINEX V2.10 can describe this system at all
    pub fn is_known_to_v2(self) -> bool {
        matches!(self, Self::GPS | Self::Glonass | Self::SBAS)
    }
}

impl std::str::FromStr for Constellation {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c = s.trim().chars().next().ok_or(ParsingError::ConstellationParsing)?;
        Self::from_char(c)
    }
}

impl std::fmt::Display for Constellation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn from_char() {
        for (c, expected) in [
            ('G', Constellation::GPS),
            ('R', Constellation::Glonass),
            ('E', Constellation::Galileo),
            ('S', Constellation::SBAS),
            ('M', Constellation::Mixed),
        ] {
            let parsed = Constellation::from_char(c).unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(parsed.to_char(), c);
        }
        assert!(Constellation::from_char('X').is_err());
    }

    #[test]
    fn from_str() {
        assert_eq!(Constellation::from_str("G").unwrap(), Constellation::GPS);
        assert_eq!(Constellation::from_str(" R ").unwrap(), Constellation::Glonass);
        assert!(Constellation::from_str("").is_err());
    }

    #[test]
    fn v2_coverage() {
        assert!(Constellation::GPS.is_known_to_v2());
        assert!(Constellation::Glonass.is_known_to_v2());
        assert!(Constellation::SBAS.is_known_to_v2());
        assert!(!Constellation::Galileo.is_known_to_v2());
    }
}
