//! RINEX revision description
use crate::error::ParsingError;

/// RINEX V2.10, the oldest revision this crate produces
pub const V210: Version = Version { major: 2, minor: 10 };

/// RINEX V3.02, the modern revision this crate produces
pub const V302: Version = Version { major: 3, minor: 2 };

/// Version describes a RINEX standard revision.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    /// Version major number
    pub major: u8,
    /// Version minor number
    pub minor: u8,
}

impl Default for Version {
    fn default() -> Self {
        V302
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

impl std::str::FromStr for Version {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('.') {
            Some((major, minor)) => Ok(Self {
                major: major
                    .trim()
                    .parse::<u8>()
                    .map_err(|_| ParsingError::VersionFormat)?,
                // "2.1" and "2.10" both denote revision 2.10
                minor: match minor.trim() {
                    "1" => 10,
                    other => other.parse::<u8>().map_err(|_| ParsingError::VersionFormat)?,
                },
            }),
            None => Ok(Self {
                major: s.parse::<u8>().map_err(|_| ParsingError::VersionFormat)?,
                minor: 0,
            }),
        }
    }
}

impl Version {
    /// Builds a new [Version]
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// True when this revision follows the V2 text layout
    pub fn is_v2(&self) -> bool {
        self.major < 3
    }

    /// Any revision in the 2.x or 3.x families is processed,
    /// as the closest of V2.10 / V3.02.
    pub fn is_supported(&self) -> bool {
        self.major == 2 || self.major == 3
    }

    /// The concrete revision content will be processed as
    pub fn normalized(&self) -> Version {
        if self.is_v2() {
            V210
        } else {
            V302
        }
    }
}
