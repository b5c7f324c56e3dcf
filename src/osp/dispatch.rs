//! MID routing: turns the receiver message stream into RINEX header
//! facts, observation epochs and broadcast ephemeris.
use crate::{
    epoch::EpochFlag,
    header::Receiver,
    osp::{
        ephemeris::{scale_glo_ephemeris, scale_gps_ephemeris},
        frame::FrameReader,
        subframe::{
            extract_gps_ephemeris, SubframeAssembler, FIRST_GLO_SAT, FIRST_GPS_SAT,
            FIRST_SBAS_SAT, LAST_GLO_SAT, LAST_GPS_SAT, LAST_SBAS_SAT, MAX_CHANNELS,
            MAX_GLO_SLOTS,
        },
        Error, Payload,
    },
    rtk::RtkObservation,
    Rinex,
};

use std::io::{Read, Seek, SeekFrom};

use bitflags::bitflags;

use log::{debug, info, warn};

/// The speed of light, meters per second
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// The L1 carrier frequency, Hz
pub const L1_FREQUENCY: f64 = 1_575_420_000.0;

/// Inverse of the L1 wavelength: meters to cycles, m/s to Hz
const L1_WAVELENGTH_INV: f64 = L1_FREQUENCY / SPEED_OF_LIGHT;

bitflags! {
    /// MID 28 measurement trust flags
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct SyncFlags: u8 {
        /// Acquisition is complete, the measurement is usable
        const ACQUISITION_COMPLETE = 0x01;
        /// The carrier phase is valid
        const PHASE_VALID = 0x02;
        /// The carrier frequency is valid
        const FREQUENCY_VALID = 0x10;
    }
}

/// Decoder behavior, injected at construction
#[derive(Clone, Debug)]
pub struct Settings {
    /// Receiver name recorded in `REC # / TYPE / VERS`
    pub receiver: String,
    /// Minimum satellites for a fix to be trusted
    pub min_sv_fix: u8,
    /// Correct observables with the receiver clock bias instead of
    /// folding the bias into the epoch time
    pub apply_clock_bias: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            receiver: "SiRFIV".to_string(),
            min_sv_fix: 4,
            apply_clock_bias: false,
        }
    }
}

/// One channel's measurements, waiting for the epoch to close
#[derive(Clone, Debug)]
struct ChannelObs {
    system: char,
    prn: u8,
    pseudorange: f64,
    carrier_phase: f64,
    carrier_frequency: f64,
    signal_strength: f64,
    lli: u8,
    strength_index: u8,
    time_tag: f64,
}

/// `Decoder` drives one conversion: it pulls messages from the frame
/// reader, routes them by MID, and fills [Rinex] / [RtkObservation]
/// containers. An observation epoch closes on the MID 7 that follows
/// its measurements.
pub struct Decoder<R: Read> {
    frames: FrameReader<R>,
    settings: Settings,
    assembler: SubframeAssembler,
    week: u32,
    tow: f64,
    clock_bias: f64,
    clock_drift: f64,
    buffer: Vec<ChannelObs>,
}

impl<R: Read> Decoder<R> {
    /// Decoder over an already-decapsulated message file
    pub fn new(source: R, settings: Settings) -> Self {
        Self::with_frames(FrameReader::stripped(source), settings)
    }

    /// Decoder over any frame reader (framed sources included)
    pub fn with_frames(frames: FrameReader<R>, settings: Settings) -> Self {
        Self {
            frames,
            settings,
            assembler: SubframeAssembler::new(),
            week: 0,
            tow: 0.0,
            clock_bias: 0.0,
            clock_drift: 0.0,
            buffer: Vec::new(),
        }
    }

    /// Scans for the header facts: approximate position (first MID 2),
    /// receiver identification (first MID 6), time of first
    /// observation (first valid MID 7) and observation interval (two
    /// further valid MID 7). Returns whether all four were acquired.
    pub fn acquire_header(&mut self, rinex: &mut Rinex) -> Result<bool, Error> {
        let mut position_set = false;
        let mut receiver_set = false;
        let mut first_epoch_set = false;
        let mut interval_set = false;
        info!("header data acquisition");
        while !(position_set && receiver_set && first_epoch_set && interval_set) {
            let payload = match self.next_message()? {
                Some(payload) => payload,
                None => break,
            };
            match payload.mid() {
                Some(2) => {
                    if let Some((x, y, z, _)) = self.handle_mid2(&payload) {
                        if !position_set {
                            rinex.header.set_approx_position(x, y, z);
                            position_set = true;
                        }
                    }
                },
                Some(6) => {
                    if !receiver_set {
                        receiver_set = self.handle_mid6(&payload, rinex);
                    }
                },
                Some(7) => {
                    let previous = (rinex.epoch.week, rinex.epoch.tow);
                    if let Some((week, tow)) = self.handle_mid7(&payload, rinex) {
                        if !first_epoch_set {
                            first_epoch_set = true;
                            rinex.header.set_time_of_first_obs(rinex.epoch.time_tag());
                        } else if !interval_set {
                            let interval = tow - previous.1
                                + (week as f64 - previous.0 as f64) * 604_800.0;
                            rinex.header.set_interval(interval);
                            interval_set = true;
                        }
                    }
                },
                _ => {},
            }
        }
        info!(
            "header data acquired: position={} first epoch={} interval={} receiver={}",
            position_set, first_epoch_set, interval_set, receiver_set
        );
        Ok(position_set && receiver_set && first_epoch_set && interval_set)
    }

    /// Scans the whole stream for GLONASS almanac parameters: the
    /// satellite-to-slot table and the slot carrier frequencies.
    pub fn acquire_glonass_params(&mut self) -> Result<(), Error> {
        info!("acquisition of GLONASS parameters");
        while let Some(payload) = self.next_message()? {
            if payload.mid() != Some(8) {
                continue;
            }
            if payload.len() != 43 {
                warn!("MID 8 length {} unexpected", payload.len());
            }
            let mut reader = payload.reader();
            let parsed = (|| -> Result<(), Error> {
                reader.skip(1)?;
                let channel = reader.get_u8()? as usize;
                let sv = reader.get_u8()?;
                if channel >= MAX_CHANNELS {
                    warn!("MID 8 ignored: channel not in range");
                    return Ok(());
                }
                if !(FIRST_GLO_SAT..=LAST_GLO_SAT).contains(&sv) {
                    return Ok(());
                }
                let mut words = [0u32; 10];
                for word in words.iter_mut() {
                    *word = reader.get_u32()?;
                }
                self.assembler.scan_glonass_almanac(channel, sv, &words);
                Ok(())
            })();
            if let Err(error) = parsed {
                warn!("MID 8 dropped: {}", error);
            }
        }
        self.assembler.log_glonass_tables();
        Ok(())
    }

    /// Processes messages until an observation epoch closes (a MID 7
    /// arriving over a non-empty measurement buffer), filling the
    /// epoch store of `rinex` on the way out. Ephemeris sources are
    /// selectable: the 50 bps stream (MID 8) or the receiver's
    /// decoded polls (MID 15 / MID 70). Returns false at end of
    /// stream.
    pub fn next_epoch(
        &mut self,
        rinex: &mut Rinex,
        use_mid8_gps: bool,
        use_mid8_glo: bool,
    ) -> Result<bool, Error> {
        while let Some(payload) = self.next_message()? {
            match payload.mid() {
                Some(7) => {
                    if self.handle_mid7(&payload, rinex).is_some() && !self.buffer.is_empty() {
                        debug!(
                            "epoch {} sats={}",
                            self.tow,
                            self.buffer.len()
                        );
                        self.flush_epoch(rinex);
                        return Ok(true);
                    }
                },
                Some(8) => {
                    if use_mid8_gps || use_mid8_glo {
                        self.handle_mid8(&payload, rinex, use_mid8_gps, use_mid8_glo);
                    }
                },
                Some(15) => {
                    if !use_mid8_gps {
                        self.handle_mid15(&payload, rinex);
                    }
                },
                Some(28) => {
                    self.handle_mid28(&payload);
                },
                Some(70) => {
                    if !use_mid8_glo {
                        self.handle_mid70(&payload, rinex);
                    }
                },
                _ => {},
            }
        }
        Ok(false)
    }

    /// Scans the whole stream for the RTK header facts: solution
    /// window from the MID 2 sequence, masks from MID 19.
    pub fn acquire_rtk_header(&mut self, rtk: &mut RtkObservation) -> Result<bool, Error> {
        let mut first_set = false;
        let mut masks_set = false;
        info!("RTK header data acquisition");
        while let Some(payload) = self.next_message()? {
            match payload.mid() {
                Some(2) => {
                    if let Some((x, y, z, n_sats)) = self.handle_mid2(&payload) {
                        // quality 5 (single): the stream carries
                        // nothing better
                        rtk.set_position(self.week, self.tow, x, y, z, 5, n_sats);
                        if !first_set {
                            rtk.set_start_time();
                            first_set = true;
                        }
                        rtk.set_end_time();
                    }
                },
                Some(19) => {
                    masks_set = self.handle_mid19(&payload, rtk);
                },
                _ => {},
            }
        }
        Ok(first_set && masks_set)
    }

    /// Skips messages until the next position solution (MID 2) and
    /// stores it. Returns false at end of stream.
    pub fn next_rtk_epoch(&mut self, rtk: &mut RtkObservation) -> Result<bool, Error> {
        while let Some(payload) = self.next_message()? {
            if payload.mid() == Some(2) {
                if let Some((x, y, z, n_sats)) = self.handle_mid2(&payload) {
                    rtk.set_position(self.week, self.tow, x, y, z, 5, n_sats);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// The next payload; recoverable frame damage is logged and
    /// skipped, anything terminal reads as end of stream.
    fn next_message(&mut self) -> Result<Option<Payload>, Error> {
        loop {
            match self.frames.next_payload() {
                Ok(payload) => return Ok(payload),
                Err(Error::BadChecksum { received, computed }) => {
                    warn!(
                        "frame skipped: checksum {:#06x} does not match {:#06x}",
                        received, computed
                    );
                },
                Err(Error::Io(error)) => return Err(Error::Io(error)),
                Err(error) => {
                    warn!("message stream ends: {}", error);
                    return Ok(None);
                },
            }
        }
    }

    /// MID 2: ECEF position solution. Updates the epoch time and
    /// returns the coordinates when the fix carries enough satellites.
    fn handle_mid2(&mut self, payload: &Payload) -> Option<(f64, f64, f64, u8)> {
        if payload.len() != 41 {
            warn!("MID 2 length {} unexpected", payload.len());
        }
        let mut reader = payload.reader();
        let parsed = (|| -> Result<(f64, f64, f64, u8), Error> {
            reader.skip(1)?;
            let x = reader.get_i32()? as f64;
            let y = reader.get_i32()? as f64;
            let z = reader.get_i32()? as f64;
            // velocity, mode 1, HDOP, mode 2
            reader.skip(9)?;
            let week = reader.get_u16()? as u32 + 1024;
            let tow = reader.get_u32()? as f64 / 100.0;
            let n_sats = reader.get_u8()?;
            self.week = week;
            self.tow = tow;
            Ok((x, y, z, n_sats))
        })();
        match parsed {
            Ok((x, y, z, n_sats)) => {
                if n_sats < self.settings.min_sv_fix {
                    warn!("MID 2 ignored: few satellites in solution");
                    return None;
                }
                debug!("MID 2 tow={} x={} y={} z={}", self.tow, x, y, z);
                Some((x, y, z, n_sats))
            },
            Err(error) => {
                warn!("MID 2 dropped: {}", error);
                None
            },
        }
    }

    /// MID 6: software version, one-shot receiver identification
    fn handle_mid6(&self, payload: &Payload, rinex: &mut Rinex) -> bool {
        let mut reader = payload.reader();
        let parsed = (|| -> Result<(String, String), Error> {
            reader.skip(1)?;
            let version_len = reader.get_u8()? as usize;
            let customer_len = reader.get_u8()? as usize;
            if payload.len() != 3 + version_len + customer_len {
                warn!("MID 6 version and customer lengths do not match");
            }
            let mut version = String::with_capacity(version_len);
            for _ in 0..version_len {
                version.push(reader.get_u8()? as char);
            }
            let mut customer = String::with_capacity(customer_len);
            for _ in 0..customer_len {
                customer.push(reader.get_u8()? as char);
            }
            Ok((version, customer))
        })();
        match parsed {
            Ok((version, customer)) => {
                debug!("MID 6 version={} customer={}", version, customer);
                rinex.header.set_receiver(Receiver {
                    number: version.trim().to_string(),
                    model: self.settings.receiver.clone(),
                    version: customer.trim().to_string(),
                });
                true
            },
            Err(error) => {
                warn!("MID 6 dropped: {}", error);
                false
            },
        }
    }

    /// MID 7: clock status. Updates the epoch time, bias and drift;
    /// with bias application disabled the bias folds into the time of
    /// week. Returns the raw (week, tow) pair on success.
    fn handle_mid7(&mut self, payload: &Payload, rinex: &mut Rinex) -> Option<(u32, f64)> {
        if payload.len() != 20 {
            warn!("MID 7 length {} unexpected", payload.len());
        }
        let mut reader = payload.reader();
        let parsed = (|| -> Result<(u32, f64, u8, f64, f64), Error> {
            reader.skip(1)?;
            let week = reader.get_u16()? as u32;
            let tow = reader.get_u32()? as f64 / 100.0;
            let n_sats = reader.get_u8()?;
            let drift = reader.get_u32()? as f64;
            let bias = reader.get_u32()? as f64 * 1.0e-9;
            Ok((week, tow, n_sats, drift, bias))
        })();
        match parsed {
            Ok((week, tow, n_sats, drift, bias)) => {
                if n_sats < self.settings.min_sv_fix {
                    warn!("MID 7 ignored: few satellites in solution");
                    return None;
                }
                debug!("MID 7 week={} tow={} bias={}", week, tow, bias);
                self.week = week;
                self.clock_drift = drift;
                self.clock_bias = bias;
                self.tow = tow;
                if !self.settings.apply_clock_bias {
                    self.tow += bias;
                    self.clock_bias = 0.0;
                }
                rinex.set_epoch_time(self.week, self.tow, self.clock_bias, EpochFlag::Ok);
                Some((week, tow))
            },
            Err(error) => {
                warn!("MID 7 dropped: {}", error);
                None
            },
        }
    }

    /// MID 8: ten words of 50 bps navigation data for one channel
    fn handle_mid8(
        &mut self,
        payload: &Payload,
        rinex: &mut Rinex,
        use_gps: bool,
        use_glo: bool,
    ) {
        if payload.len() != 43 {
            warn!("MID 8 length {} unexpected", payload.len());
        }
        let mut reader = payload.reader();
        let parsed = (|| -> Result<(), Error> {
            reader.skip(1)?;
            let channel = reader.get_u8()? as usize;
            if channel >= MAX_CHANNELS {
                warn!("MID 8 ignored: channel not in range");
                return Ok(());
            }
            let sv = reader.get_u8()?;
            let mut words = [0u32; 10];
            for word in words.iter_mut() {
                *word = reader.get_u32()?;
            }
            if (FIRST_GPS_SAT..=LAST_GPS_SAT).contains(&sv) {
                if use_gps {
                    match self.assembler.feed_gps(channel, sv, &words) {
                        Ok(Some(ephemeris)) => {
                            let (tag, orbit) = scale_gps_ephemeris(&ephemeris.mantissa);
                            rinex.save_nav('G', ephemeris.sv, orbit, tag);
                        },
                        Ok(None) => {},
                        Err(_) => warn!("MID 8 ignored: GPS wrong parity"),
                    }
                }
            } else if (FIRST_GLO_SAT..=LAST_GLO_SAT).contains(&sv) {
                if use_glo {
                    match self.assembler.feed_glonass(channel, sv, &words) {
                        Ok(Some(ephemeris)) => {
                            let orbit = scale_glo_ephemeris(&ephemeris.mantissa);
                            rinex.save_nav('R', ephemeris.slot, orbit, ephemeris.time_tag);
                        },
                        Ok(None) => {},
                        Err(_) => warn!("MID 8 ignored: GLONASS wrong integrity code"),
                    }
                }
            } else {
                warn!(
                    "MID 8 ignored: satellite number out of GPS, GLONASS ranges: {}",
                    sv
                );
            }
            Ok(())
        })();
        if let Err(error) = parsed {
            warn!("MID 8 dropped: {}", error);
        }
    }

    /// MID 15: the receiver's decoded GPS ephemeris, already packed
    /// in the 3 x 15 half-word layout and free of parity.
    fn handle_mid15(&mut self, payload: &Payload, rinex: &mut Rinex) {
        if payload.len() != 92 {
            warn!("MID 15 length {} unexpected", payload.len());
        }
        let mut reader = payload.reader();
        let parsed = (|| -> Result<(), Error> {
            reader.skip(1)?;
            let sv = reader.get_u8()?;
            let mut nav_words = [0u32; 45];
            for word in nav_words.iter_mut() {
                *word = reader.get_u16()? as u32;
            }
            // the poll response has no handover data
            nav_words[1] &= 0xFF00;
            nav_words[2] &= 0x0003;
            match extract_gps_ephemeris(&nav_words) {
                Some(mut ephemeris) => {
                    debug!("MID 15 ephemeris sv={}", sv);
                    // transmission time is unknown: the current epoch
                    // stands in, in the scaled-by-100 form
                    ephemeris.mantissa[7][0] = (self.tow * 100.0) as i32;
                    let (tag, orbit) = scale_gps_ephemeris(&ephemeris.mantissa);
                    rinex.save_nav('G', ephemeris.sv, orbit, tag);
                },
                None => warn!("MID 15 sv={}: wrong data", sv),
            }
            Ok(())
        })();
        if let Err(error) = parsed {
            warn!("MID 15 dropped: {}", error);
        }
    }

    /// MID 19: navigation parameters; the elevation mask travels
    /// scaled by ten.
    fn handle_mid19(&self, payload: &Payload, rtk: &mut RtkObservation) -> bool {
        if payload.len() != 65 {
            warn!("MID 19 length {} unexpected", payload.len());
        }
        let mut reader = payload.reader();
        let parsed = (|| -> Result<(f64, f64), Error> {
            reader.skip(1)?;
            // from the subID to the DOP mask
            reader.skip(19)?;
            let elevation = reader.get_i16()? as f64;
            let snr = reader.get_u8()? as f64;
            Ok((elevation, snr))
        })();
        match parsed {
            Ok((elevation, snr)) => {
                debug!("MID 19 elevation={} snr={}", elevation, snr);
                rtk.set_masks(elevation / 10.0, snr);
                true
            },
            Err(error) => {
                warn!("MID 19 dropped: {}", error);
                false
            },
        }
    }

    /// MID 28: one channel's measurements. Buffered when trusted and
    /// carrying the epoch's time tag; a diverging tag means the MID 7
    /// closing the previous epoch never arrived, so the stale buffer
    /// is discarded in favor of the new arrival.
    fn handle_mid28(&mut self, payload: &Payload) {
        if payload.len() != 56 {
            warn!("MID 28 length {} unexpected", payload.len());
        }
        let mut reader = payload.reader();
        let parsed = (|| -> Result<Option<ChannelObs>, Error> {
            reader.skip(1)?;
            let channel = reader.get_u8()?;
            reader.get_u32()?; // a time tag not used
            let sv = reader.get_u8()?;
            let (system, prn) = if (FIRST_GPS_SAT..=LAST_GPS_SAT).contains(&sv) {
                ('G', sv)
            } else if (FIRST_GLO_SAT..=LAST_GLO_SAT).contains(&sv) {
                ('R', self.assembler.glonass_slot(sv))
            } else if (FIRST_SBAS_SAT..=LAST_SBAS_SAT).contains(&sv) {
                ('S', sv - 100)
            } else {
                warn!(
                    "MID 28 satellite number out of GPS, SBAS, GLONASS ranges: {}",
                    sv
                );
                return Ok(None);
            };
            let software_time = reader.get_f64()?;
            let pseudorange = reader.get_f64()?;
            let carrier_frequency = reader.get_f32()? as f64;
            let carrier_phase = reader.get_f64()?;
            reader.get_u16()?; // time in track, not used
            let flags = SyncFlags::from_bits_truncate(reader.get_u8()?);
            // worst carrier-to-noise over the ten tracking intervals
            let mut strength = reader.get_u8()?;
            for _ in 1..10 {
                strength = strength.min(reader.get_u8()?);
            }
            reader.get_u16()?; // delta range interval, not used
            debug!(
                "MID 28 tag={} ch={} sv={} sat={}{:02} flags={:02x}",
                software_time,
                channel,
                sv,
                system,
                prn,
                flags.bits()
            );
            if !flags.contains(SyncFlags::ACQUISITION_COMPLETE) {
                debug!("MID 28 ignored: acquisition not complete");
                return Ok(None);
            }
            Ok(Some(ChannelObs {
                system,
                prn,
                pseudorange,
                carrier_phase: if flags.contains(SyncFlags::PHASE_VALID) {
                    carrier_phase
                } else {
                    0.0
                },
                carrier_frequency: if flags.contains(SyncFlags::FREQUENCY_VALID) {
                    carrier_frequency
                } else {
                    0.0
                },
                signal_strength: strength as f64,
                lli: 0,
                strength_index: (strength / 6).clamp(1, 9),
                time_tag: software_time,
            }))
        })();
        match parsed {
            Ok(Some(observation)) => {
                let same_epoch = self
                    .buffer
                    .first()
                    .map(|first| first.time_tag == observation.time_tag)
                    .unwrap_or(true);
                self.buffer.push(observation);
                if !same_epoch {
                    warn!(
                        "epoch {} ignored: MID 7 lost",
                        self.buffer[0].time_tag
                    );
                    let keep = self.buffer.len() - 1;
                    self.buffer.drain(..keep);
                }
            },
            Ok(None) => {},
            Err(error) => warn!("MID 28 dropped: {}", error),
        }
    }

    /// MID 70 (SID 12): the receiver's decoded GLONASS ephemeris
    /// block, one entry per satellite.
    fn handle_mid70(&mut self, payload: &Payload, rinex: &mut Rinex) {
        let mut reader = payload.reader();
        let parsed = (|| -> Result<(), Error> {
            reader.skip(1)?;
            if reader.get_u8()? != 12 {
                // not a broadcast ephemeris response
                return Ok(());
            }
            if reader.get_u8()? != 1 {
                // time-reference fields are not valid
                return Ok(());
            }
            reader.get_i24()?; // tau GPS
            reader.get_i32()?; // tau UTC
            reader.get_i16()?; // B1
            reader.get_i16()?; // B2
            let n4 = reader.get_u8()? as i32;
            reader.get_u8()?; // KP
            let n_svs = reader.get_u8()?;
            debug!("MID 70 SID 12 ephemeris for {} satellites", n_svs);
            for _ in 0..n_svs {
                let valid = reader.get_u8()? == 1;
                let slot = reader.get_u8()?;
                let mut bom = [[0i32; 4]; 8];
                bom[2][3] = reader.get_u8()? as i8 as i32; // frequency offset
                bom[1][3] = reader.get_u8()? as i32; // health
                let day = reader.get_u16()? as u32;
                let time = reader.get_u8()? as u32 * 900;
                let tag = crate::epoch::secs_from_date(1996 + (n4 - 1) * 4, 1, day, 0, 0, time as f64)
                    - 3.0 * 3600.0;
                bom[0][0] = tag as i32;
                reader.get_u8()?; // age of operation
                bom[1][0] = reader.get_i32()?;
                bom[2][0] = reader.get_i32()?;
                bom[3][0] = reader.get_i32()?;
                bom[1][1] = reader.get_i24()?;
                bom[2][1] = reader.get_i24()?;
                bom[3][1] = reader.get_i24()?;
                bom[1][2] = reader.get_u8()? as i8 as i32;
                bom[2][2] = reader.get_u8()? as i8 as i32;
                bom[3][2] = reader.get_u8()? as i8 as i32;
                reader.get_u8()?; // group delay
                bom[0][1] = -reader.get_i24()?;
                bom[0][3] = tag as i32;
                if valid && slot > 0 && slot as usize <= MAX_GLO_SLOTS {
                    bom[0][2] = self.assembler.carrier_frequency(slot);
                    let orbit = scale_glo_ephemeris(&bom);
                    rinex.save_nav('R', slot, orbit, tag);
                } else {
                    warn!("GLONASS ephemeris not valid for {}", slot);
                }
            }
            Ok(())
        })();
        if let Err(error) = parsed {
            warn!("MID 70 SID 12 dropped: {}", error);
        }
    }

    /// Drains the measurement buffer into the epoch store, applying
    /// the unit conversions and, when enabled, the clock corrections.
    fn flush_epoch(&mut self, rinex: &mut Rinex) {
        let apply = self.settings.apply_clock_bias;
        for obs in self.buffer.drain(..) {
            let mut pseudorange = obs.pseudorange;
            if apply && pseudorange != 0.0 {
                pseudorange -= self.clock_bias * SPEED_OF_LIGHT;
            }
            rinex.save_obs(
                obs.system,
                obs.prn,
                "C1C",
                pseudorange,
                obs.lli,
                obs.strength_index,
                obs.time_tag,
            );
            // meters to cycles
            let mut phase = obs.carrier_phase * L1_WAVELENGTH_INV;
            if apply && phase != 0.0 {
                phase -= self.clock_bias * L1_FREQUENCY;
            }
            rinex.save_obs(
                obs.system,
                obs.prn,
                "L1C",
                phase,
                obs.lli,
                obs.strength_index,
                obs.time_tag,
            );
            // meters per second to Hz
            let mut doppler = obs.carrier_frequency * L1_WAVELENGTH_INV;
            if apply && doppler != 0.0 {
                doppler -= self.clock_drift;
            }
            rinex.save_obs(
                obs.system,
                obs.prn,
                "D1C",
                doppler,
                obs.lli,
                obs.strength_index,
                obs.time_tag,
            );
            rinex.save_obs(
                obs.system,
                obs.prn,
                "S1C",
                obs.signal_strength,
                obs.lli,
                obs.strength_index,
                obs.time_tag,
            );
        }
    }
}

impl<R: Read + Seek> Decoder<R> {
    /// Rewinds the byte source, so header, almanac and epoch passes
    /// can share one decoder (and its GLONASS tables).
    pub fn rewind(&mut self) -> std::io::Result<()> {
        self.frames.source_mut().seek(SeekFrom::Start(0)).map(|_| ())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constellation::Constellation;
    use crate::observable::Observable;
    use crate::version::V302;
    use std::str::FromStr;

    fn model() -> Rinex {
        let mut rinex = Rinex::new(Some(V302));
        for system in [Constellation::GPS, Constellation::Glonass, Constellation::SBAS] {
            rinex.header.set_system(
                system,
                ["C1C", "L1C", "D1C", "S1C"]
                    .iter()
                    .map(|c| Observable::from_str(c).unwrap())
                    .collect(),
            );
        }
        rinex
    }

    fn push_u16(stream: &mut Vec<u8>, payload: &[u8]) {
        stream.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        stream.extend_from_slice(payload);
    }

    fn mid2(week: u16, tow_s: u32, n_sats: u8) -> Vec<u8> {
        let mut payload = vec![2u8];
        payload.extend_from_slice(&100i32.to_be_bytes());
        payload.extend_from_slice(&200i32.to_be_bytes());
        payload.extend_from_slice(&300i32.to_be_bytes());
        payload.extend_from_slice(&[0u8; 9]);
        payload.extend_from_slice(&week.to_be_bytes());
        payload.extend_from_slice(&(tow_s * 100).to_be_bytes());
        payload.push(n_sats);
        payload.resize(41, 0);
        payload
    }

    fn mid7(week: u16, tow_s: u32, n_sats: u8, bias_ns: u32) -> Vec<u8> {
        let mut payload = vec![7u8];
        payload.extend_from_slice(&week.to_be_bytes());
        payload.extend_from_slice(&(tow_s * 100).to_be_bytes());
        payload.push(n_sats);
        payload.extend_from_slice(&0u32.to_be_bytes()); // drift
        payload.extend_from_slice(&bias_ns.to_be_bytes());
        payload.resize(20, 0);
        payload
    }

    fn f64_receiver_bytes(value: f64) -> [u8; 8] {
        let be = value.to_be_bytes();
        [be[4], be[5], be[6], be[7], be[0], be[1], be[2], be[3]]
    }

    fn mid28(sv: u8, tag: f64, pseudorange: f64, cn0: u8, flags: u8) -> Vec<u8> {
        let mut payload = vec![28u8, 1];
        payload.extend_from_slice(&0u32.to_be_bytes());
        payload.push(sv);
        payload.extend_from_slice(&f64_receiver_bytes(tag));
        payload.extend_from_slice(&f64_receiver_bytes(pseudorange));
        payload.extend_from_slice(&0.0f32.to_be_bytes()); // carrier frequency
        payload.extend_from_slice(&f64_receiver_bytes(150_000_000.0)); // carrier phase
        payload.extend_from_slice(&0u16.to_be_bytes());
        payload.push(flags);
        payload.extend_from_slice(&[cn0; 10]);
        payload.extend_from_slice(&0u16.to_be_bytes());
        payload.resize(56, 0);
        payload
    }

    fn decoder(stream: Vec<u8>) -> Decoder<std::io::Cursor<Vec<u8>>> {
        Decoder::new(std::io::Cursor::new(stream), Settings::default())
    }

    #[test]
    fn epoch_closes_on_mid7() {
        let mut stream = Vec::new();
        push_u16(&mut stream, &mid28(7, 1000.0, 2.1e7, 42, 0x13));
        push_u16(&mut stream, &mid28(9, 1000.0, 2.2e7, 30, 0x13));
        push_u16(&mut stream, &mid7(1880, 259_200, 6, 0));
        let mut rinex = model();
        let mut decoder = decoder(stream);
        assert!(decoder.next_epoch(&mut rinex, true, true).unwrap());
        // two satellites, four observables each
        assert_eq!(rinex.observations.len(), 8);
        assert_eq!(rinex.epoch.week, 1880);
        assert_eq!(rinex.epoch.tow, 259_200.0);
        let phases: Vec<f64> = rinex
            .observations
            .iter()
            .filter(|o| o.obs_index == 1)
            .map(|o| o.value)
            .collect();
        // 150 000 000 m scale to cycles
        assert!((phases[0] - 150_000_000.0 * L1_WAVELENGTH_INV).abs() < 1e-3);
        // stream exhausted
        assert!(!decoder.next_epoch(&mut rinex, true, true).unwrap());
    }

    #[test]
    fn unexpected_tag_discards_stale_buffer() {
        let mut stream = Vec::new();
        push_u16(&mut stream, &mid28(7, 1000.0, 2.1e7, 42, 0x13));
        push_u16(&mut stream, &mid28(9, 1001.0, 2.2e7, 30, 0x13));
        push_u16(&mut stream, &mid7(1880, 259_201, 6, 0));
        let mut rinex = model();
        let mut decoder = decoder(stream);
        assert!(decoder.next_epoch(&mut rinex, true, true).unwrap());
        // only the newer measurement survived
        assert_eq!(rinex.observations.len(), 4);
        assert_eq!(rinex.observations.iter().next().unwrap().prn, 9);
    }

    #[test]
    fn untrusted_measurements_are_ignored() {
        let mut stream = Vec::new();
        // bit 0 clear: acquisition incomplete
        push_u16(&mut stream, &mid28(7, 1000.0, 2.1e7, 42, 0x12));
        // bits 1 and 4 clear: phase and frequency zeroed
        push_u16(&mut stream, &mid28(9, 1000.0, 2.2e7, 30, 0x01));
        push_u16(&mut stream, &mid7(1880, 259_200, 6, 0));
        let mut rinex = model();
        let mut decoder = decoder(stream);
        assert!(decoder.next_epoch(&mut rinex, true, true).unwrap());
        assert_eq!(rinex.observations.len(), 4);
        let by_index: Vec<f64> = rinex.observations.iter().map(|o| o.value).collect();
        assert_eq!(by_index[1], 0.0); // phase
        assert_eq!(by_index[2], 0.0); // doppler
    }

    #[test]
    fn strength_index_scale() {
        for (cn0, expected) in [(0u8, 1u8), (5, 1), (6, 1), (7, 1), (12, 2), (54, 9), (60, 9), (99, 9)] {
            let mut stream = Vec::new();
            push_u16(&mut stream, &mid28(7, 1000.0, 2.1e7, cn0, 0x01));
            push_u16(&mut stream, &mid7(1880, 259_200, 6, 0));
            let mut rinex = model();
            let mut decoder = decoder(stream);
            assert!(decoder.next_epoch(&mut rinex, true, true).unwrap());
            let first = rinex.observations.iter().next().unwrap();
            assert_eq!(first.strength, expected, "cn0 {}", cn0);
        }
    }

    #[test]
    fn sbas_satellite_mapping() {
        let mut stream = Vec::new();
        push_u16(&mut stream, &mid28(123, 1000.0, 3.9e7, 40, 0x01));
        push_u16(&mut stream, &mid7(1880, 259_200, 6, 0));
        let mut rinex = model();
        let mut decoder = decoder(stream);
        assert!(decoder.next_epoch(&mut rinex, true, true).unwrap());
        let first = rinex.observations.iter().next().unwrap();
        assert_eq!(first.prn, 23);
        assert_eq!(rinex.header.systems[first.system_index].constellation.to_char(), 'S');
    }

    #[test]
    fn bias_folds_into_the_epoch_time() {
        let mut stream = Vec::new();
        push_u16(&mut stream, &mid28(7, 1000.0, 2.1e7, 42, 0x01));
        // 250 ms of receiver clock bias
        push_u16(&mut stream, &mid7(1880, 259_200, 6, 250_000_000));
        let mut rinex = model();
        let mut decoder = decoder(stream);
        assert!(decoder.next_epoch(&mut rinex, true, true).unwrap());
        assert_eq!(rinex.epoch.tow, 259_200.25);
        assert_eq!(rinex.epoch.clock_offset, 0.0);
    }

    #[test]
    fn bias_corrects_the_pseudorange_when_applied() {
        let mut stream = Vec::new();
        push_u16(&mut stream, &mid28(7, 1000.0, 2.1e7, 42, 0x01));
        push_u16(&mut stream, &mid7(1880, 259_200, 6, 1_000_000)); // 1 ms
        let mut rinex = model();
        let settings = Settings {
            apply_clock_bias: true,
            ..Settings::default()
        };
        let mut decoder = Decoder::new(std::io::Cursor::new(stream), settings);
        assert!(decoder.next_epoch(&mut rinex, true, true).unwrap());
        assert_eq!(rinex.epoch.tow, 259_200.0);
        assert!((rinex.epoch.clock_offset - 1.0e-3).abs() < 1e-15);
        let first = rinex.observations.iter().next().unwrap();
        assert!((first.value - (2.1e7 - 1.0e-3 * SPEED_OF_LIGHT)).abs() < 1e-6);
    }

    #[test]
    fn header_acquisition() {
        let mut stream = Vec::new();
        let mut mid6 = vec![6u8, 3, 4];
        mid6.extend_from_slice(b"2.4");
        mid6.extend_from_slice(b"GSD4");
        push_u16(&mut stream, &mid6);
        push_u16(&mut stream, &mid2(856, 259_200, 6));
        push_u16(&mut stream, &mid7(1880, 259_200, 6, 0));
        push_u16(&mut stream, &mid7(1880, 259_201, 6, 0));
        let mut rinex = model();
        let mut decoder = decoder(stream);
        assert!(decoder.acquire_header(&mut rinex).unwrap());
        assert_eq!(rinex.header.approx_position, Some((100.0, 200.0, 300.0)));
        let receiver = rinex.header.receiver.as_ref().unwrap();
        assert_eq!(receiver.number, "2.4");
        assert_eq!(receiver.model, "SiRFIV");
        assert_eq!(receiver.version, "GSD4");
        assert_eq!(
            rinex.header.time_of_first_obs,
            Some(crate::epoch::time_tag(1880, 259_200.0))
        );
        assert_eq!(rinex.header.interval, Some(1.0));
    }

    #[test]
    fn insufficient_satellites_are_refused() {
        let mut stream = Vec::new();
        push_u16(&mut stream, &mid28(7, 1000.0, 2.1e7, 42, 0x01));
        push_u16(&mut stream, &mid7(1880, 259_200, 2, 0)); // 2 < 4
        let mut rinex = model();
        let mut decoder = decoder(stream);
        // the epoch never closes
        assert!(!decoder.next_epoch(&mut rinex, true, true).unwrap());
        assert!(rinex.observations.is_empty());
    }

    #[test]
    fn rtk_pipeline() {
        let mut stream = Vec::new();
        push_u16(&mut stream, &mid2(856, 259_200, 6));
        let mut mid19 = vec![19u8];
        mid19.extend_from_slice(&[0u8; 19]);
        mid19.extend_from_slice(&155i16.to_be_bytes()); // 15.5 degrees
        mid19.push(28);
        mid19.resize(65, 0);
        push_u16(&mut stream, &mid19);
        push_u16(&mut stream, &mid2(856, 259_260, 6));
        let mut rtk = RtkObservation::new("sirf-rnx", "capture.osp");
        let mut header_pass = decoder(stream.clone());
        assert!(header_pass.acquire_rtk_header(&mut rtk).unwrap());
        let mut buffer = Vec::<u8>::new();
        rtk.write_header(&mut buffer).unwrap();
        let content = String::from_utf8(buffer).unwrap();
        assert!(content.contains("% elev mask\t: 15.5"));
        // the epoch pass replays solutions one at a time
        let mut epoch_pass = decoder(stream);
        assert!(epoch_pass.next_rtk_epoch(&mut rtk).unwrap());
        assert!(epoch_pass.next_rtk_epoch(&mut rtk).unwrap());
        assert!(!epoch_pass.next_rtk_epoch(&mut rtk).unwrap());
    }

    #[test]
    fn mid2_updates_the_epoch_clock() {
        let mut stream = Vec::new();
        push_u16(&mut stream, &mid2(856, 259_200, 6));
        let mut decoder = decoder(stream);
        let mut rtk = RtkObservation::new("p", "f");
        assert!(decoder.next_rtk_epoch(&mut rtk).unwrap());
        // week extended by the receiver rollover offset
        assert_eq!(decoder.week, 856 + 1024);
        assert_eq!(decoder.tow, 259_200.0);
    }
}
