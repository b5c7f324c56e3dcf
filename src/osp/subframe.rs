//! 50 bps navigation message reassembly: GPS subframes and GLONASS
//! strings accumulate per receiver channel until an ephemeris set
//! completes.
use crate::epoch::{gps_tow, secs_from_date};
use crate::osp::bits::{extract_bits, widen_signed_magnitude, widen_twos_complement};
use crate::osp::Error;

use log::{debug, info, warn};

/// Channels the receiver tracks
pub const MAX_CHANNELS: usize = 32;
/// Subframes or strings carrying ephemeris (almanac excluded)
pub const MAX_SUBFRAMES: usize = 5;
/// Slots in the GLONASS constellation
pub const MAX_GLO_SLOTS: usize = 24;
/// First receiver satellite number assigned to GLONASS
pub const FIRST_GLO_SAT: u8 = 70;
/// Last receiver satellite number assigned to GLONASS
pub const LAST_GLO_SAT: u8 = 83;
/// GLONASS satellites the receiver can number
pub const MAX_GLO_SATS: usize = 14;
/// First receiver satellite number assigned to GPS
pub const FIRST_GPS_SAT: u8 = 1;
/// Last receiver satellite number assigned to GPS
pub const LAST_GPS_SAT: u8 = 32;
/// First receiver satellite number assigned to SBAS
pub const FIRST_SBAS_SAT: u8 = 101;
/// Last receiver satellite number assigned to SBAS
pub const LAST_SBAS_SAT: u8 = 200;

/// Which bits of a `D29 D30 d1..d30` word feed each parity bit
const PARITY_MASKS: [u32; 6] = [
    0xBB1F_3480,
    0x5D8F_9A40,
    0xAEC7_CD00,
    0x5763_E680,
    0x6BB1_F340,
    0x8B7A_89C0,
];

/// Verifies the six parity bits of a subframe word laid out as
/// `D29 D30 d1 .. d30`. A set D30 complements the payload bits
/// before the check.
pub fn check_gps_parity(word: u32) -> bool {
    let checked = if word & 0x4000_0000 != 0 {
        (word & 0xC000_0000) | (!word & 0x3FFF_FFFF)
    } else {
        word
    };
    let mut parity = 0u32;
    for (nth, mask) in PARITY_MASKS.iter().enumerate() {
        parity |= ((mask & checked).count_ones() % 2) << (5 - nth);
    }
    parity == (word & 0x3F)
}

/// A complete GPS ephemeris, still in mantissa form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GpsEphemeris {
    /// Satellite PRN
    pub sv: u8,
    /// Broadcast orbit mantissas
    pub mantissa: [[i32; 4]; 8],
}

/// A complete GLONASS ephemeris, still in mantissa form
#[derive(Clone, Debug, PartialEq)]
pub struct GloEphemeris {
    /// Slot number
    pub slot: u8,
    /// Ephemeris reference instant, seconds since the GPS epoch
    pub time_tag: f64,
    /// Broadcast orbit mantissas
    pub mantissa: [[i32; 4]; 8],
}

/// One stored subframe or string; a zero satellite means empty
#[derive(Copy, Clone, Debug, Default)]
struct Slot {
    sv: u8,
    words: [u32; 10],
}

/// The GLONASS satellite-to-slot table entry for one receiver
/// satellite number
#[derive(Copy, Clone, Debug, Default)]
struct GloSlot {
    channel: u8,
    slot: u8,
}

/// Accumulates 50 bps subframes / strings per channel, detects
/// ephemeris completion, and maintains the GLONASS slot and carrier
/// frequency tables.
pub struct SubframeAssembler {
    subframes: [[Slot; MAX_SUBFRAMES]; MAX_CHANNELS],
    glo_slots: [GloSlot; MAX_GLO_SATS],
    carrier_freq: [i32; MAX_GLO_SLOTS],
    /// Per channel: the almanac slot number waiting for its paired
    /// string, and the string number expected to carry it
    almanac_pairs: [(u8, u8); MAX_CHANNELS],
}

impl Default for SubframeAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl SubframeAssembler {
    /// Builds an empty assembler
    pub fn new() -> Self {
        Self {
            subframes: [[Slot::default(); MAX_SUBFRAMES]; MAX_CHANNELS],
            glo_slots: [GloSlot::default(); MAX_GLO_SATS],
            carrier_freq: [0; MAX_GLO_SLOTS],
            almanac_pairs: [(0, 0); MAX_CHANNELS],
        }
    }

    /// Feeds the ten words of a GPS subframe. Returns a complete
    /// ephemeris set once subframes 1..3 agree on satellite and issue
    /// of data, [Error::BadParity] when any word fails its check.
    pub fn feed_gps(
        &mut self,
        channel: usize,
        sv: u8,
        words: &[u32; 10],
    ) -> Result<Option<GpsEphemeris>, Error> {
        if channel >= MAX_CHANNELS {
            warn!("subframe ignored: channel {} not in range", channel);
            return Ok(None);
        }
        for word in words {
            if !check_gps_parity(*word) {
                return Err(Error::BadParity);
            }
        }
        // strip parity, keeping the 24 payload bits; a set D30
        // complements them (an undocumented receiver feature)
        let mut data = [0u32; 10];
        for (nth, word) in words.iter().enumerate() {
            data[nth] = if word & 0x4000_0000 == 0 {
                (word >> 6) & 0xFF_FFFF
            } else {
                !(word >> 6) & 0xFF_FFFF
            };
        }
        let subframe_id = (data[1] >> 2) & 0x07;
        let page_id = (data[2] >> 16) & 0x3F;
        debug!(
            "subframe ch={} sv={} id={} page={}",
            channel, sv, subframe_id, page_id
        );
        // ephemeris lives in subframes 1..3; page 18 of subframe 4
        // carries the ionosphere model
        if !(1..=3).contains(&subframe_id) && !(subframe_id == 4 && page_id == 56) {
            return Ok(None);
        }
        let slot = &mut self.subframes[channel][subframe_id as usize - 1];
        slot.sv = sv;
        slot.words = data;
        if !self.all_gps_received(channel) {
            return Ok(None);
        }
        // repackage the 3 x 10 payload words into the 3 x 15
        // half-word layout of the ephemeris poll response
        let mut nav_words = [0u32; 45];
        for subframe in 0..3 {
            let words = &self.subframes[channel][subframe].words;
            for pair in 0..5 {
                let base = subframe * 15 + pair * 3;
                nav_words[base] = (words[pair * 2] >> 8) & 0xFFFF;
                nav_words[base + 1] =
                    ((words[pair * 2] & 0xFF) << 8) | ((words[pair * 2 + 1] >> 16) & 0xFF);
                nav_words[base + 2] = words[pair * 2 + 1] & 0xFFFF;
            }
            // the telemetry word carries nothing the ephemeris needs
            nav_words[subframe * 15] = sv as u32;
            nav_words[subframe * 15 + 1] &= 0xFF;
        }
        let ephemeris = extract_gps_ephemeris(&nav_words);
        for slot in self.subframes[channel].iter_mut() {
            slot.sv = 0;
        }
        Ok(ephemeris)
    }

    fn all_gps_received(&self, channel: usize) -> bool {
        let slots = &self.subframes[channel];
        if slots[0].sv == 0 || slots[0].sv != slots[1].sv || slots[0].sv != slots[2].sv {
            return false;
        }
        // the IODC low byte must equal both IODEs
        let iodc_lsb = (slots[0].words[7] >> 16) & 0xFF;
        iodc_lsb == (slots[1].words[2] >> 16) & 0xFF
            && iodc_lsb == (slots[2].words[9] >> 16) & 0xFF
    }

    /// Feeds the ten receiver words of a GLONASS string. Returns a
    /// complete ephemeris set once strings 1..5 are present for one
    /// satellite.
    pub fn feed_glonass(
        &mut self,
        channel: usize,
        sv: u8,
        words: &[u32; 10],
    ) -> Result<Option<GloEphemeris>, Error> {
        if channel >= MAX_CHANNELS {
            warn!("string ignored: channel {} not in range", channel);
            return Ok(None);
        }
        let (string, number) = pack_glonass_string(words);
        if !check_glo_hamming(&string) {
            return Err(Error::BadParity);
        }
        if !(1..=MAX_SUBFRAMES as u32).contains(&number) {
            debug!("string {} ignored (almanac or frame filler)", number);
            return Ok(None);
        }
        if number == 4 && (FIRST_GLO_SAT..=LAST_GLO_SAT).contains(&sv) {
            // the slot number keeps the satellite table current
            let slot = extract_bits(&string, 10, 5) as u8;
            if slot as usize <= MAX_GLO_SLOTS {
                let index = (sv - FIRST_GLO_SAT) as usize;
                if self.glo_slots[index].slot != slot {
                    debug!(
                        "sv={} slot={} updated to {}",
                        sv, self.glo_slots[index].slot, slot
                    );
                    self.glo_slots[index] = GloSlot {
                        channel: channel as u8,
                        slot,
                    };
                }
            } else {
                warn!("string 4 with slot number {} out of range", slot);
            }
        }
        let slot = &mut self.subframes[channel][number as usize - 1];
        slot.sv = sv;
        slot.words = [0; 10];
        slot.words[..3].copy_from_slice(&string);
        if self.subframes[channel].iter().any(|slot| slot.sv == 0) {
            return Ok(None);
        }
        let ephemeris = self.extract_glo_ephemeris(channel);
        for slot in self.subframes[channel].iter_mut() {
            slot.sv = 0;
        }
        Ok(ephemeris)
    }

    /// Almanac scan: strings 4 seed the satellite-to-slot table,
    /// strings 6/8/10/12/14 stage a slot number, the following odd
    /// string carries its carrier frequency number.
    pub fn scan_glonass_almanac(&mut self, channel: usize, sv: u8, words: &[u32; 10]) {
        if channel >= MAX_CHANNELS {
            return;
        }
        let (string, number) = pack_glonass_string(words);
        match number {
            4 => {
                if (FIRST_GLO_SAT..=LAST_GLO_SAT).contains(&sv) {
                    let slot = extract_bits(&string, 10, 5) as u8;
                    let index = (sv - FIRST_GLO_SAT) as usize;
                    if self.glo_slots[index].slot == 0 {
                        self.glo_slots[index] = GloSlot {
                            channel: channel as u8,
                            slot,
                        };
                    }
                }
            },
            6 | 8 | 10 | 12 | 14 => {
                let slot = extract_bits(&string, 72, 5) as u8;
                if slot > 0 && slot as usize <= MAX_GLO_SLOTS {
                    self.almanac_pairs[channel] = (slot, number as u8 + 1);
                } else {
                    warn!("almanac string {} with bad slot number {}", number, slot);
                }
            },
            7 | 9 | 11 | 13 | 15 => {
                let (slot, expected) = self.almanac_pairs[channel];
                if expected as u32 == number {
                    let mut frequency = extract_bits(&string, 9, 5) as i32;
                    if frequency >= 25 {
                        frequency -= 32;
                    }
                    self.carrier_freq[slot as usize - 1] = frequency;
                }
            },
            _ => {},
        }
    }

    /// The GLONASS slot a receiver satellite number maps to, falling
    /// back to the receiver number while no string 4 has been seen.
    pub fn glonass_slot(&self, sv: u8) -> u8 {
        if (FIRST_GLO_SAT..=LAST_GLO_SAT).contains(&sv) {
            let entry = self.glo_slots[(sv - FIRST_GLO_SAT) as usize];
            if entry.slot > 0 {
                return entry.slot;
            }
        }
        sv
    }

    /// Carrier frequency number of a slot, from the almanac table
    pub fn carrier_frequency(&self, slot: u8) -> i32 {
        if slot as usize > MAX_GLO_SLOTS || slot == 0 {
            return 0;
        }
        self.carrier_freq[slot as usize - 1]
    }

    /// Logs the tables the almanac scan produced
    pub fn log_glonass_tables(&self) {
        for (nth, entry) in self.glo_slots.iter().enumerate() {
            info!(
                "sv={} slot={} channel={}",
                nth as u8 + FIRST_GLO_SAT,
                entry.slot,
                entry.channel
            );
        }
        for (nth, frequency) in self.carrier_freq.iter().enumerate() {
            info!("slot={} frequency={}", nth + 1, frequency);
        }
    }

    /// Pulls the ephemeris mantissas of strings 1..5 at the bit
    /// positions the GLONASS interface document assigns them.
    fn extract_glo_ephemeris(&self, channel: usize) -> Option<GloEphemeris> {
        let strings = &self.subframes[channel];
        // slot number (n): string 4 bits 15..11
        let slot = extract_bits(&strings[3].words, 10, 5);
        if slot == 0 || slot as usize > MAX_GLO_SLOTS {
            warn!("ephemeris ignored: slot number {} out of range", slot);
            return None;
        }
        // four-year interval number N4: string 5 bits 36..32
        let n4 = extract_bits(&strings[4].words, 31, 5) as i32;
        // day number NT: string 4 bits 26..16
        let nt = extract_bits(&strings[3].words, 15, 11);
        // time interval index tb: string 2 bits 76..70, 15 min units
        let tb = extract_bits(&strings[1].words, 69, 7) * 15 * 60;
        // the reference instant is GLONASS (UTC+3h) civil time
        let time_tag =
            secs_from_date(1996 + (n4 - 1) * 4, 1, nt, 0, 0, tb as f64) - 3.0 * 3600.0;
        let mut bom = [[0i32; 4]; 8];
        bom[0][0] = time_tag as i32;
        // clock bias TauN: string 4 bits 80..59 (sign-magnitude)
        bom[0][1] = -widen_signed_magnitude(extract_bits(&strings[3].words, 58, 22), 22);
        // relative frequency bias GammaN: string 3 bits 79..69
        bom[0][2] = widen_signed_magnitude(extract_bits(&strings[2].words, 68, 11), 11);
        // message frame time, seconds from the UTC week start
        // (monday 00:00, while the GPS week starts sunday)
        bom[0][3] = (gps_tow(time_tag) as i32 + 518_400) % 604_800;
        for (row, string) in [(1usize, 0usize), (2, 1), (3, 2)] {
            // position: bits 35..9, velocity: bits 64..41,
            // acceleration: bits 40..36 (all sign-magnitude)
            bom[row][0] = widen_signed_magnitude(extract_bits(&strings[string].words, 8, 27), 27);
            bom[row][1] = widen_signed_magnitude(extract_bits(&strings[string].words, 40, 24), 24);
            bom[row][2] = widen_signed_magnitude(extract_bits(&strings[string].words, 35, 5), 5);
        }
        // health Bn: string 2 bits 80..78
        bom[1][3] = extract_bits(&strings[1].words, 77, 3) as i32;
        // frequency number from the almanac table
        bom[2][3] = self.carrier_freq[slot as usize - 1];
        // age of operation E: string 2 bits 53..49
        bom[3][3] = extract_bits(&strings[1].words, 48, 5) as i32;
        Some(GloEphemeris {
            slot: slot as u8,
            time_tag,
            mantissa: bom,
        })
    }
}

/// Packs the ten receiver words of a MID 8 GLONASS message into the
/// 85-bit string (bit 1 of the string is bit 0 of word 0) and returns
/// it with the string number from bits 84..81.
pub fn pack_glonass_string(words: &[u32; 10]) -> ([u32; 3], u32) {
    let string = [
        ((words[2] & 0x003F_FFFF) << 10) | ((words[3] & 0x01FF_8000) >> 15),
        ((words[0] & 0x0000_000F) << 28)
            | ((words[1] & 0x01FF_FFFF) << 3)
            | ((words[2] & 0x01C0_0000) >> 22),
        (words[0] & 0x00FF_FFF0) >> 4,
    ];
    let number = extract_bits(&string, 80, 4);
    (string, number)
}

/// GLONASS string integrity. The full per-bit index sets of the
/// interface document are not wired in yet: with the `glo-hamming`
/// feature the aggregate (whole-string) parity is enforced, without
/// it every string is accepted, like the receivers' own output path.
#[cfg(feature = "glo-hamming")]
fn check_glo_hamming(string: &[u32; 3]) -> bool {
    let ones: u32 = string[0].count_ones() + string[1].count_ones()
        + (string[2] & 0x000F_FFFF).count_ones();
    ones % 2 == 0
}

#[cfg(not(feature = "glo-hamming"))]
fn check_glo_hamming(_string: &[u32; 3]) -> bool {
    true
}

/// Extracts the satellite number and ephemeris mantissas from the
/// 3 x 15 half-word navigation message layout (the ephemeris poll
/// response). Returns None when the three subframes disagree on
/// satellite or issue of data.
pub fn extract_gps_ephemeris(nav_words: &[u32; 45]) -> Option<GpsEphemeris> {
    let sv = nav_words[0] & 0xFF;
    if sv != nav_words[15] & 0xFF || sv != nav_words[30] & 0xFF {
        info!("different satellites in the channel data");
        return None;
    }
    let iodc_lsb = nav_words[10] & 0xFF;
    let iode1 = (nav_words[15 + 3] >> 8) & 0xFF;
    let iode2 = nav_words[30 + 13] & 0xFF;
    if iode1 != iode2 || iode1 != iodc_lsb {
        warn!(
            "different issues of data: sv {} iodc {} iode {} {}",
            sv, iodc_lsb, iode1, iode2
        );
        return None;
    }
    let w = |index: usize| nav_words[index];
    let tc = widen_twos_complement;
    let mut bom = [[0i32; 4]; 8];
    // SV clock: T0c, Af0, Af1, Af2
    bom[0][0] = w(11) as i32;
    bom[0][1] = tc(((w(13) & 0x00FF) << 14) | ((w(14) >> 2) & 0x3FFF), 22);
    bom[0][2] = tc(((w(12) & 0x00FF) << 8) | ((w(13) >> 8) & 0x00FF), 16);
    bom[0][3] = tc((w(12) >> 8) & 0x00FF, 8);
    // orbit 1: IODE, Crs, Delta n, M0
    bom[1][0] = iode1 as i32;
    bom[1][1] = tc(((w(18) & 0x00FF) << 8) | ((w(19) >> 8) & 0x00FF), 16);
    bom[1][2] = tc(((w(19) & 0x00FF) << 8) | ((w(20) >> 8) & 0x00FF), 16);
    bom[1][3] = tc(
        ((w(20) & 0x00FF) << 24) | ((w(21) & 0xFFFF) << 8) | ((w(22) >> 8) & 0x00FF),
        32,
    );
    // orbit 2: Cuc, e, Cus, sqrt(A)
    bom[2][0] = tc(((w(22) & 0x00FF) << 8) | ((w(23) >> 8) & 0x00FF), 16);
    bom[2][1] =
        (((w(23) & 0x00FF) << 24) | ((w(24) & 0xFFFF) << 8) | ((w(25) >> 8) & 0x00FF)) as i32;
    bom[2][2] = tc(((w(25) & 0x00FF) << 8) | ((w(26) >> 8) & 0x00FF), 16);
    bom[2][3] =
        (((w(26) & 0x00FF) << 24) | ((w(27) & 0xFFFF) << 8) | ((w(28) >> 8) & 0x00FF)) as i32;
    // orbit 3: Toe, Cic, Omega0, Cis
    bom[3][0] = (((w(28) & 0x00FF) << 8) | ((w(29) >> 8) & 0x00FF)) as i32;
    bom[3][1] = tc(w(33), 16);
    bom[3][2] = tc(((w(34) & 0xFFFF) << 16) | (w(35) & 0xFFFF), 32);
    bom[3][3] = tc(w(36), 16);
    // orbit 4: i0, Crc, omega, Omega dot
    bom[4][0] = tc(((w(37) & 0xFFFF) << 16) | (w(38) & 0xFFFF), 32);
    bom[4][1] = tc(w(39), 16);
    bom[4][2] = tc(((w(40) & 0xFFFF) << 16) | (w(41) & 0xFFFF), 32);
    bom[4][3] = tc(((w(42) & 0xFFFF) << 8) | ((w(43) >> 8) & 0x00FF), 24);
    // orbit 5: IDOT, codes on L2, GPS week, L2P flag
    bom[5][0] = tc((w(44) >> 2) & 0x3FFF, 14);
    bom[5][1] = ((w(3) >> 4) & 0x0003) as i32;
    bom[5][2] = (((w(3) >> 6) & 0x03FF) + 1024) as i32;
    bom[5][3] = ((w(4) >> 7) & 0x0001) as i32;
    // orbit 6: SV accuracy, SV health, TGD, IODC
    bom[6][0] = (w(3) & 0x000F) as i32;
    bom[6][1] = ((w(4) >> 10) & 0x003F) as i32;
    bom[6][2] = tc((w(10) >> 8) & 0x00FF, 8);
    bom[6][3] = (iodc_lsb | (w(4) & 0x0300)) as i32;
    // orbit 7: transmission time (17 MSB of the HOW Zcount, in
    // 1.5 s units, to seconds scaled by 100), fit flag
    bom[7][0] = ((((w(1) & 0x00FF) << 9) | ((w(2) >> 7) & 0x01FF)) * 600) as i32;
    bom[7][1] = ((w(29) >> 7) & 0x0001) as i32;
    bom[7][2] = 0;
    bom[7][3] = iode2 as i32;
    Some(GpsEphemeris {
        sv: sv as u8,
        mantissa: bom,
    })
}
