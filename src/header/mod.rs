//! RINEX file header: typed records behind a label-driven table.
use crate::constellation::Constellation;
use crate::observable::Observable;
use crate::version::Version;

mod formatting;
mod parsing;

pub mod labels;

pub use labels::{Label, Obligation, Scope};
pub use parsing::LineOutcome;

pub(crate) use parsing::read_padded_line;

/// Role of the file being produced or read
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FileType {
    /// Observation data
    #[default]
    Observation,
    /// Broadcast navigation data
    Navigation,
}

/// `REC # / TYPE / VERS` content
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Receiver {
    /// Receiver number (the firmware version, for a SiRF receiver)
    pub number: String,
    /// Receiver model
    pub model: String,
    /// Receiver version (the firmware customer, for a SiRF receiver)
    pub version: String,
}

/// `ANT # / TYPE` content
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Antenna {
    /// Antenna number
    pub number: String,
    /// Antenna model
    pub model: String,
}

/// `ANTENNA: PHASECENTER` content
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhaseCenter {
    /// System the average phase center position refers to
    pub system: char,
    /// Observable code
    pub code: String,
    /// North / X eccentricity
    pub north: f64,
    /// East / Y eccentricity
    pub east: f64,
    /// Up / Z eccentricity
    pub up: f64,
}

/// One `WAVELENGTH FACT L1/2` record
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WavelengthFactor {
    /// L1 factor
    pub l1: i32,
    /// L2 factor
    pub l2: i32,
    /// Satellites these factors apply to, empty for the default record
    pub sats: Vec<String>,
}

/// A GNSS system declared in the header, with the observables it
/// publishes and the selection state the filter engine projects on it.
#[derive(Clone, Debug, PartialEq)]
pub struct GnssSystem {
    /// The [Constellation]
    pub constellation: Constellation,
    /// Ordered observable codes valid for this system
    pub observables: Vec<Observable>,
    /// System passes the observation filter
    pub(crate) selected: bool,
    /// Per-observable filter flag, parallel to `observables`
    pub(crate) selected_observables: Vec<bool>,
    /// Explicitly selected PRNs, empty accepts all
    pub(crate) selected_sats: Vec<u8>,
}

impl GnssSystem {
    /// Builds a new system entry, everything selected
    pub fn new(constellation: Constellation, observables: Vec<Observable>) -> Self {
        let selected_observables = vec![true; observables.len()];
        Self {
            constellation,
            observables,
            selected: true,
            selected_observables,
            selected_sats: Vec::new(),
        }
    }

    /// True when the given satellite passes the PRN selection
    pub(crate) fn is_sat_selected(&self, prn: u8) -> bool {
        self.selected_sats.is_empty() || self.selected_sats.contains(&prn)
    }
}

/// `SYS / DCBS APPLIED` and `SYS / PCVS APPLIED` content
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CorrectionApplied {
    /// Index of the system in [Header::systems]
    pub system_index: usize,
    /// Program used to apply the correction
    pub program: String,
    /// Source of the correction
    pub source: String,
}

/// `SYS / SCALE FACTOR` content
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScaleFactor {
    /// Index of the system in [Header::systems]
    pub system_index: usize,
    /// Factor to divide stored observables with before use
    pub factor: i32,
    /// Observable codes involved, empty involves all
    pub observables: Vec<String>,
}

/// `SYS / PHASE SHIFTS` content
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhaseShift {
    /// Index of the system in [Header::systems]
    pub system_index: usize,
    /// Carrier phase observable code
    pub code: String,
    /// Correction applied, in cycles
    pub correction: f64,
    /// Satellites involved, empty involves all
    pub sats: Vec<String>,
}

/// One slot of the `GLONASS SLOT / FRQ #` record
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GlonassSlotFreq {
    /// Slot number
    pub slot: u8,
    /// Carrier frequency number (-7..=13)
    pub frequency: i8,
}

/// `LEAP SECONDS` content
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LeapSeconds {
    /// Current number of leap seconds
    pub seconds: i32,
    /// Future or past leap seconds (V3.02)
    pub delta_lsf: i32,
    /// Week number of the leap second event (V3.02)
    pub week: i32,
    /// Day number of the leap second event (V3.02)
    pub day: i32,
}

/// `PRN / # OF OBS` content for one satellite
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrnObsCount {
    /// System letter
    pub system: char,
    /// Satellite PRN
    pub prn: u8,
    /// Number of observations per observable type
    pub counts: Vec<u32>,
}

/// `IONOSPHERIC CORR` content (V3.02 navigation)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IonoCorrection {
    /// Correction type: GAL, GPSA, GPSB
    pub kind: String,
    /// The four polynomial terms
    pub values: [f64; 4],
}

/// `TIME SYSTEM CORR` content (V3.02 navigation)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeCorrection {
    /// Correction type: GAUT, GPUT, SBUT, GLUT, GPGA, GLGP
    pub kind: String,
    /// Constant term of the polynomial
    pub a0: f64,
    /// First order term of the polynomial
    pub a1: f64,
    /// Reference time, seconds into the reference week
    pub ref_time: i32,
    /// Reference week number
    pub ref_week: i32,
    /// EGNOS, WAAS, MSAS or Snn
    pub sbas: String,
    /// UTC identifier
    pub utc_id: i32,
}

/// `DELTA-UTC: A0,A1,T,W` content (V2.10 navigation)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeltaUtc {
    /// Constant term of the polynomial
    pub a0: f64,
    /// First order term of the polynomial
    pub a1: f64,
    /// Reference time, seconds into the reference week
    pub ref_time: i32,
    /// Reference week number
    pub ref_week: i32,
}

/// A comment, remembering the record it was authored after so the
/// writer re-inserts it at the same position.
#[derive(Clone, Debug, PartialEq)]
pub struct Comment {
    /// The record this comment follows in the header layout
    pub after: Label,
    /// Comment text, columns 1-60
    pub text: String,
}

/// Describes a RINEX file header: one typed field per label of
/// [labels::LABELS], plus the per-label "has data" state that drives
/// the writer and the special-event record emission.
#[derive(Clone, Debug, Default)]
pub struct Header {
    /// Revision to produce, None until defined or promoted
    pub version: Option<Version>,
    /// Revision of the file content was read from, when applicable
    pub input_version: Option<Version>,
    /// Role of the file being produced
    pub file_type: FileType,
    /// System letter of the version record
    pub system: Option<Constellation>,
    /// Producing program
    pub program: Option<String>,
    /// Who ran the producing program
    pub run_by: Option<String>,
    /// Production date, as read (the writer stamps its own)
    pub date: Option<String>,
    /// Comments, in authored order
    pub comments: Vec<Comment>,
    /// Marker name
    pub marker_name: Option<String>,
    /// Marker number
    pub marker_number: Option<String>,
    /// Marker type (V3.02)
    pub marker_type: Option<String>,
    /// Observer name
    pub observer: Option<String>,
    /// Agency name
    pub agency: Option<String>,
    /// Receiver identification
    pub receiver: Option<Receiver>,
    /// Antenna identification
    pub antenna: Option<Antenna>,
    /// Approximate marker position, geocentric
    pub approx_position: Option<(f64, f64, f64)>,
    /// Antenna height and horizontal eccentricities
    pub antenna_delta_hen: Option<(f64, f64, f64)>,
    /// Antenna eccentricities in body frame (V3.02)
    pub antenna_delta_xyz: Option<(f64, f64, f64)>,
    /// Average antenna phase center (V3.02)
    pub antenna_phase_center: Option<PhaseCenter>,
    /// Antenna boresight direction (V3.02)
    pub antenna_boresight: Option<(f64, f64, f64)>,
    /// Antenna zero direction azimuth (V3.02)
    pub antenna_zerodir_azi: Option<f64>,
    /// Antenna zero direction vector (V3.02)
    pub antenna_zerodir_xyz: Option<(f64, f64, f64)>,
    /// Vehicle center of mass (V3.02)
    pub center_of_mass: Option<(f64, f64, f64)>,
    /// Wavelength factors (V2.10)
    pub wavelength_factors: Vec<WavelengthFactor>,
    /// Declared systems and their observables
    pub systems: Vec<GnssSystem>,
    /// Signal strength unit (V3.02)
    pub signal_strength_unit: Option<String>,
    /// Observation interval, in seconds
    pub interval: Option<f64>,
    /// Time of first observation, seconds since the GPS epoch
    pub time_of_first_obs: Option<f64>,
    /// Time system of the observation tags
    pub time_system: Option<String>,
    /// Time of last observation, seconds since the GPS epoch
    pub time_of_last_obs: Option<f64>,
    /// Whether the receiver clock offset is applied (1) or not (0)
    pub rcv_clock_offs_applied: Option<i32>,
    /// Differential code bias corrections applied (V3.02)
    pub dcbs_applied: Vec<CorrectionApplied>,
    /// Phase center variation corrections applied (V3.02)
    pub pcvs_applied: Vec<CorrectionApplied>,
    /// Observable scale factors (V3.02)
    pub scale_factors: Vec<ScaleFactor>,
    /// Phase shift corrections (V3.02)
    pub phase_shifts: Vec<PhaseShift>,
    /// Glonass slot / carrier frequency numbers (V3.02)
    pub glonass_slots: Vec<GlonassSlotFreq>,
    /// Leap seconds
    pub leap_seconds: Option<LeapSeconds>,
    /// Number of satellites in the file
    pub num_satellites: Option<u32>,
    /// Per satellite observation counts
    pub prn_obs: Vec<PrnObsCount>,
    /// Ionosphere model, alpha terms (V2.10 navigation)
    pub ion_alpha: Option<[f64; 4]>,
    /// Ionosphere model, beta terms (V2.10 navigation)
    pub ion_beta: Option<[f64; 4]>,
    /// GPS to UTC polynomial (V2.10 navigation)
    pub delta_utc: Option<DeltaUtc>,
    /// Ionospheric corrections (V3.02 navigation)
    pub iono_corrections: Vec<IonoCorrection>,
    /// Time system corrections (V3.02 navigation)
    pub time_corrections: Vec<TimeCorrection>,
    /// Per-label "has data" state, indexed by [Label] discriminant
    has_data: Vec<bool>,
    /// Last record set or parsed, anchors following comments
    pub(crate) last_record_set: Option<Label>,
    /// V2 observable union, derived when writing a V2 observation header
    pub(crate) v2_observables: Vec<String>,
    /// Tokens selecting navigation entries, empty accepts all
    pub(crate) nav_selection: Vec<String>,
    /// Observation filtering requested
    pub(crate) obs_filtering: bool,
    /// Navigation filtering requested
    pub(crate) nav_filtering: bool,
}

impl Header {
    /// Builds an empty [Header] producing the given revision
    /// (None leaves the revision to be taken from an input file).
    pub fn new(version: Option<Version>) -> Self {
        let mut header = Self {
            version,
            has_data: vec![false; labels::LABELS.len()],
            ..Default::default()
        };
        // END OF HEADER is always printed
        header.set_label(Label::EndOfHeader);
        header
    }

    /// True when the record behind the label holds data
    pub fn has_data(&self, label: Label) -> bool {
        self.has_data
            .get(label.index())
            .copied()
            .unwrap_or(false)
    }

    pub(crate) fn set_label(&mut self, label: Label) {
        if self.has_data.len() != labels::LABELS.len() {
            self.has_data = vec![false; labels::LABELS.len()];
        }
        self.has_data[label.index()] = true;
        self.last_record_set = Some(label);
    }

    pub(crate) fn unset_label(&mut self, label: Label) {
        if let Some(flag) = self.has_data.get_mut(label.index()) {
            *flag = false;
        }
    }

    /// Iterates labels in header layout order, skipping records
    /// without data.
    pub fn labels_with_data(&self) -> impl Iterator<Item = Label> + '_ {
        labels::LABELS
            .iter()
            .map(|spec| spec.label)
            .filter(|label| self.has_data(*label))
    }

    /// Marks the header as empty (all records except `END OF HEADER`),
    /// the preamble of special-event record emission. Declared systems
    /// survive so epoch processing can continue.
    pub fn clear(&mut self) {
        self.has_data = vec![false; labels::LABELS.len()];
        self.comments.clear();
        self.wavelength_factors.clear();
        self.dcbs_applied.clear();
        self.scale_factors.clear();
        self.last_record_set = None;
        self.set_label(Label::EndOfHeader);
    }

    /// Index of a system letter in [Self::systems]
    pub fn system_index(&self, system: char) -> Option<usize> {
        self.systems
            .iter()
            .position(|sys| sys.constellation.to_char() == system)
    }

    /// Number of systems passing the current selection
    pub(crate) fn selected_systems(&self) -> usize {
        self.systems.iter().filter(|sys| sys.selected).count()
    }

    /// Declares a system and its observables
    /// (`SYS / # / OBS TYPES`, or `# / TYPES OF OBSERV` in V2.10)
    pub fn set_system(&mut self, constellation: Constellation, observables: Vec<Observable>) {
        match self.system_index(constellation.to_char()) {
            Some(index) => self.systems[index] = GnssSystem::new(constellation, observables),
            None => self.systems.push(GnssSystem::new(constellation, observables)),
        }
        self.set_label(Label::SysObsTypes);
        self.set_label(Label::TypesOfObserv);
    }

    /// Sets `PGM / RUN BY / DATE` identification
    pub fn set_program_run_by(&mut self, program: &str, run_by: &str) {
        self.program = Some(program.to_string());
        self.run_by = Some(run_by.to_string());
        self.set_label(Label::ProgramRunBy);
    }

    /// Sets `MARKER NAME`
    pub fn set_marker_name(&mut self, name: &str) {
        self.marker_name = Some(name.to_string());
        self.set_label(Label::MarkerName);
    }

    /// Sets `MARKER NUMBER`
    pub fn set_marker_number(&mut self, number: &str) {
        self.marker_number = Some(number.to_string());
        self.set_label(Label::MarkerNumber);
    }

    /// Sets `OBSERVER / AGENCY`
    pub fn set_observer_agency(&mut self, observer: &str, agency: &str) {
        self.observer = Some(observer.to_string());
        self.agency = Some(agency.to_string());
        self.set_label(Label::ObserverAgency);
    }

    /// Sets `REC # / TYPE / VERS`
    pub fn set_receiver(&mut self, receiver: Receiver) {
        self.receiver = Some(receiver);
        self.set_label(Label::ReceiverType);
    }

    /// Sets `ANT # / TYPE`
    pub fn set_antenna(&mut self, number: &str, model: &str) {
        self.antenna = Some(Antenna {
            number: number.to_string(),
            model: model.to_string(),
        });
        self.set_label(Label::AntennaType);
    }

    /// Sets `APPROX POSITION XYZ`
    pub fn set_approx_position(&mut self, x: f64, y: f64, z: f64) {
        self.approx_position = Some((x, y, z));
        self.set_label(Label::ApproxPosition);
    }

    /// Sets `ANTENNA: DELTA H/E/N`
    pub fn set_antenna_delta_hen(&mut self, h: f64, e: f64, n: f64) {
        self.antenna_delta_hen = Some((h, e, n));
        self.set_label(Label::AntennaDeltaHen);
    }

    /// Appends a `WAVELENGTH FACT L1/2` record
    pub fn add_wavelength_factor(&mut self, factor: WavelengthFactor) {
        self.wavelength_factors.push(factor);
        self.set_label(Label::WavelengthFactor);
    }

    /// Sets `INTERVAL`, in seconds
    pub fn set_interval(&mut self, interval: f64) {
        self.interval = Some(interval);
        self.set_label(Label::Interval);
    }

    /// Sets the time system annotation of `TIME OF FIRST OBS`
    pub fn set_time_system(&mut self, system: &str) {
        self.time_system = Some(system.to_string());
    }

    /// Sets `TIME OF FIRST OBS` from a time tag
    pub fn set_time_of_first_obs(&mut self, t: f64) {
        self.time_of_first_obs = Some(t);
        self.set_label(Label::TimeOfFirstObs);
    }

    /// Sets `TIME OF LAST OBS` from a time tag
    pub fn set_time_of_last_obs(&mut self, t: f64) {
        self.time_of_last_obs = Some(t);
        self.set_label(Label::TimeOfLastObs);
    }

    /// Sets `LEAP SECONDS`
    pub fn set_leap_seconds(&mut self, leap: LeapSeconds) {
        self.leap_seconds = Some(leap);
        self.set_label(Label::LeapSecs);
    }

    /// Appends a `COMMENT`, anchored after the last record set so the
    /// writer emits it at the authored position.
    pub fn add_comment(&mut self, text: &str) {
        self.comments.push(Comment {
            after: self.last_record_set.unwrap_or(Label::Version),
            text: text.to_string(),
        });
        // consecutive comments share the anchor and keep insertion order
        let anchor = self.last_record_set;
        self.set_label(Label::Comm);
        self.last_record_set = anchor;
    }
}
