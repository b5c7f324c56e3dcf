//! The header record table: label texts, version scopes and
//! per-role obligations, in header layout order.
use crate::version::Version;

/// Revisions a header record is defined for
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// V2.10 only
    V2,
    /// V3.02 only
    V3,
    /// All revisions
    Any,
}

impl Scope {
    /// True when the record exists in the given revision
    pub fn contains(self, version: Version) -> bool {
        match self {
            Self::Any => true,
            Self::V2 => version.is_v2(),
            Self::V3 => !version.is_v2(),
        }
    }
}

/// Whether a record must, may, or cannot appear in a file role
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Obligation {
    /// The record must be present
    Obligatory,
    /// The record may be present
    Optional,
    /// The record cannot appear in this file role
    NotApplicable,
}

/// One entry of the header record table
#[derive(Debug)]
pub struct LabelSpec {
    /// The record identification
    pub label: Label,
    /// Exact text of columns 61-80
    pub text: &'static str,
    /// Revisions the record exists in
    pub scope: Scope,
    /// Obligation in observation files
    pub obs: Obligation,
    /// Obligation in navigation files
    pub nav: Obligation,
}

/// Identifies every RINEX header record this crate knows.
/// Discriminants index [LABELS], which is kept in header layout order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Label {
    /// `RINEX VERSION / TYPE`
    Version = 0,
    /// `PGM / RUN BY / DATE`
    ProgramRunBy,
    /// `COMMENT`
    Comm,
    /// `MARKER NAME`
    MarkerName,
    /// `MARKER NUMBER`
    MarkerNumber,
    /// `MARKER TYPE`
    MarkerType,
    /// `OBSERVER / AGENCY`
    ObserverAgency,
    /// `REC # / TYPE / VERS`
    ReceiverType,
    /// `ANT # / TYPE`
    AntennaType,
    /// `APPROX POSITION XYZ`
    ApproxPosition,
    /// `ANTENNA: DELTA H/E/N`
    AntennaDeltaHen,
    /// `ANTENNA: DELTA X/Y/Z`
    AntennaDeltaXyz,
    /// `ANTENNA: PHASECENTER`
    AntennaPhaseCenter,
    /// `ANTENNA: B.SIGHT XYZ`
    AntennaBoresight,
    /// `ANTENNA: ZERODIR AZI`
    AntennaZeroDirAzi,
    /// `ANTENNA: ZERODIR XYZ`
    AntennaZeroDirXyz,
    /// `CENTER OF MASS XYZ`
    CenterOfMass,
    /// `WAVELENGTH FACT L1/2`
    WavelengthFactor,
    /// `# / TYPES OF OBSERV`
    TypesOfObserv,
    /// `SYS / # / OBS TYPES`
    SysObsTypes,
    /// `SIGNAL STRENGTH UNIT`
    SignalStrengthUnit,
    /// `INTERVAL`
    Interval,
    /// `TIME OF FIRST OBS`
    TimeOfFirstObs,
    /// `TIME OF LAST OBS`
    TimeOfLastObs,
    /// `RCV CLOCK OFFS APPL`
    RcvClockOffsApplied,
    /// `SYS / DCBS APPLIED`
    DcbsApplied,
    /// `SYS / PCVS APPLIED`
    PcvsApplied,
    /// `SYS / SCALE FACTOR`
    SysScaleFactor,
    /// `SYS / PHASE SHIFTS`
    PhaseShifts,
    /// `GLONASS SLOT / FRQ #`
    GlonassSlotFreq,
    /// `LEAP SECONDS`
    LeapSecs,
    /// `# OF SATELLITES`
    NumSatellites,
    /// `PRN / # OF OBS`
    PrnNumObs,
    /// `ION ALPHA`
    IonAlpha,
    /// `ION BETA`
    IonBeta,
    /// `DELTA-UTC: A0,A1,T,W`
    DeltaUtc,
    /// `IONOSPHERIC CORR`
    IonoCorr,
    /// `TIME SYSTEM CORR`
    TimeSystemCorr,
    /// `END OF HEADER`
    EndOfHeader,
}

use Label::*;
use Obligation::{NotApplicable, Obligatory, Optional};

/// The header record table, in layout order. Scope and obligations
/// follow the RINEX 2.10 / 3.02 definitions.
pub const LABELS: &[LabelSpec] = &[
    LabelSpec { label: Version, text: "RINEX VERSION / TYPE", scope: Scope::Any, obs: Obligatory, nav: Obligatory },
    LabelSpec { label: ProgramRunBy, text: "PGM / RUN BY / DATE", scope: Scope::Any, obs: Obligatory, nav: Obligatory },
    LabelSpec { label: Comm, text: "COMMENT", scope: Scope::Any, obs: Optional, nav: Optional },
    LabelSpec { label: MarkerName, text: "MARKER NAME", scope: Scope::Any, obs: Obligatory, nav: NotApplicable },
    LabelSpec { label: MarkerNumber, text: "MARKER NUMBER", scope: Scope::Any, obs: Optional, nav: NotApplicable },
    LabelSpec { label: MarkerType, text: "MARKER TYPE", scope: Scope::V3, obs: Obligatory, nav: NotApplicable },
    LabelSpec { label: ObserverAgency, text: "OBSERVER / AGENCY", scope: Scope::Any, obs: Obligatory, nav: NotApplicable },
    LabelSpec { label: ReceiverType, text: "REC # / TYPE / VERS", scope: Scope::Any, obs: Obligatory, nav: NotApplicable },
    LabelSpec { label: AntennaType, text: "ANT # / TYPE", scope: Scope::Any, obs: Obligatory, nav: NotApplicable },
    LabelSpec { label: ApproxPosition, text: "APPROX POSITION XYZ", scope: Scope::Any, obs: Obligatory, nav: NotApplicable },
    LabelSpec { label: AntennaDeltaHen, text: "ANTENNA: DELTA H/E/N", scope: Scope::Any, obs: Obligatory, nav: NotApplicable },
    LabelSpec { label: AntennaDeltaXyz, text: "ANTENNA: DELTA X/Y/Z", scope: Scope::V3, obs: Optional, nav: NotApplicable },
    LabelSpec { label: AntennaPhaseCenter, text: "ANTENNA: PHASECENTER", scope: Scope::V3, obs: Optional, nav: NotApplicable },
    LabelSpec { label: AntennaBoresight, text: "ANTENNA: B.SIGHT XYZ", scope: Scope::V3, obs: Optional, nav: NotApplicable },
    LabelSpec { label: AntennaZeroDirAzi, text: "ANTENNA: ZERODIR AZI", scope: Scope::V3, obs: Optional, nav: NotApplicable },
    LabelSpec { label: AntennaZeroDirXyz, text: "ANTENNA: ZERODIR XYZ", scope: Scope::V3, obs: Optional, nav: NotApplicable },
    LabelSpec { label: CenterOfMass, text: "CENTER OF MASS XYZ", scope: Scope::V3, obs: Optional, nav: NotApplicable },
    LabelSpec { label: WavelengthFactor, text: "WAVELENGTH FACT L1/2", scope: Scope::V2, obs: Obligatory, nav: NotApplicable },
    LabelSpec { label: TypesOfObserv, text: "# / TYPES OF OBSERV", scope: Scope::V2, obs: Obligatory, nav: NotApplicable },
    LabelSpec { label: SysObsTypes, text: "SYS / # / OBS TYPES", scope: Scope::V3, obs: Obligatory, nav: NotApplicable },
    LabelSpec { label: SignalStrengthUnit, text: "SIGNAL STRENGTH UNIT", scope: Scope::V3, obs: Optional, nav: NotApplicable },
    LabelSpec { label: Interval, text: "INTERVAL", scope: Scope::Any, obs: Optional, nav: NotApplicable },
    LabelSpec { label: TimeOfFirstObs, text: "TIME OF FIRST OBS", scope: Scope::Any, obs: Obligatory, nav: NotApplicable },
    LabelSpec { label: TimeOfLastObs, text: "TIME OF LAST OBS", scope: Scope::Any, obs: Optional, nav: NotApplicable },
    LabelSpec { label: RcvClockOffsApplied, text: "RCV CLOCK OFFS APPL", scope: Scope::Any, obs: Optional, nav: NotApplicable },
    LabelSpec { label: DcbsApplied, text: "SYS / DCBS APPLIED", scope: Scope::V3, obs: Optional, nav: NotApplicable },
    LabelSpec { label: PcvsApplied, text: "SYS / PCVS APPLIED", scope: Scope::V3, obs: Optional, nav: NotApplicable },
    LabelSpec { label: SysScaleFactor, text: "SYS / SCALE FACTOR", scope: Scope::V3, obs: Optional, nav: NotApplicable },
    LabelSpec { label: PhaseShifts, text: "SYS / PHASE SHIFTS", scope: Scope::V3, obs: Optional, nav: NotApplicable },
    LabelSpec { label: GlonassSlotFreq, text: "GLONASS SLOT / FRQ #", scope: Scope::V3, obs: Optional, nav: NotApplicable },
    LabelSpec { label: LeapSecs, text: "LEAP SECONDS", scope: Scope::Any, obs: Optional, nav: Optional },
    LabelSpec { label: NumSatellites, text: "# OF SATELLITES", scope: Scope::Any, obs: Optional, nav: NotApplicable },
    LabelSpec { label: PrnNumObs, text: "PRN / # OF OBS", scope: Scope::Any, obs: Optional, nav: NotApplicable },
    LabelSpec { label: IonAlpha, text: "ION ALPHA", scope: Scope::V2, obs: NotApplicable, nav: Optional },
    LabelSpec { label: IonBeta, text: "ION BETA", scope: Scope::V2, obs: NotApplicable, nav: Optional },
    LabelSpec { label: DeltaUtc, text: "DELTA-UTC: A0,A1,T,W", scope: Scope::V2, obs: NotApplicable, nav: Optional },
    LabelSpec { label: IonoCorr, text: "IONOSPHERIC CORR", scope: Scope::V3, obs: NotApplicable, nav: Optional },
    LabelSpec { label: TimeSystemCorr, text: "TIME SYSTEM CORR", scope: Scope::V3, obs: NotApplicable, nav: Optional },
    LabelSpec { label: EndOfHeader, text: "END OF HEADER", scope: Scope::Any, obs: Obligatory, nav: Obligatory },
];

impl Label {
    /// Position in [LABELS]
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// The table entry behind this label
    pub fn spec(self) -> &'static LabelSpec {
        &LABELS[self.index()]
    }

    /// Exact text written in columns 61-80
    pub fn text(self) -> &'static str {
        self.spec().text
    }

    /// Identifies the label carried in columns 61-80 of a header line.
    /// Matching is by prefix, like receivers in the field produce it.
    pub fn from_line(line: &str) -> Option<Self> {
        let text = line.get(60..)?;
        LABELS
            .iter()
            .find(|spec| text.starts_with(spec.text))
            .map(|spec| spec.label)
    }
}
