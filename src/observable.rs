//! Observable type codes and the V2 <-> V3 name translation.
use crate::constellation::Constellation;
use crate::error::ParsingError;

/// Equivalence between RINEX V2.10 two-letter observable names
/// and V3.02 three-letter codes.
pub(crate) const V2_V3_EQUIVALENCES: &[(&str, &str)] = &[
    ("L1", "L1C"),
    ("L2", "L2P"),
    ("C1", "C1C"),
    ("P1", "C1P"),
    ("P2", "C2P"),
    ("D1", "D1C"),
    ("D2", "D2P"),
    ("S1", "S1C"),
    ("S2", "S2P"),
];

/// Kind of physical measurement an observable code describes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ObservableKind {
    /// Pseudo range, in meters
    PseudoRange,
    /// Carrier phase, in cycles
    Phase,
    /// Doppler shift, in Hz
    Doppler,
    /// Raw signal strength (C/N0)
    SignalStrength,
}

/// `Observable` is a V3.02 observable type code (`C1C`, `L1C`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Observable {
    code: String,
}

impl Observable {
    /// The V3.02 code value
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Kind of measurement, from the code's first letter
    pub fn kind(&self) -> Option<ObservableKind> {
        match self.code.chars().next() {
            Some('C') | Some('P') => Some(ObservableKind::PseudoRange),
            Some('L') => Some(ObservableKind::Phase),
            Some('D') => Some(ObservableKind::Doppler),
            Some('S') => Some(ObservableKind::SignalStrength),
            _ => None,
        }
    }

    /// The RINEX V2.10 name of this observable for the given system,
    /// or None when V2 has no equivalent (or cannot describe the system).
    pub fn to_v2(&self, system: Constellation) -> Option<&'static str> {
        if !system.is_known_to_v2() {
            return None;
        }
        V2_V3_EQUIVALENCES
            .iter()
            .find(|(_, v3)| *v3 == self.code)
            .map(|(v2, _)| *v2)
    }

    /// Builds an [Observable] from a V2.10 name, or None when
    /// the name has no V3.02 equivalent.
    pub fn from_v2(name: &str) -> Option<Self> {
        V2_V3_EQUIVALENCES
            .iter()
            .find(|(v2, _)| *v2 == name)
            .map(|(_, v3)| Self {
                code: v3.to_string(),
            })
    }
}

impl std::str::FromStr for Observable {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() < 2 || code.len() > 3 {
            return Err(ParsingError::ObservableParsing);
        }
        if !matches!(code.chars().next(), Some('C' | 'P' | 'L' | 'D' | 'S')) {
            return Err(ParsingError::ObservableParsing);
        }
        Ok(Self {
            code: code.to_string(),
        })
    }
}

impl std::fmt::Display for Observable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}
