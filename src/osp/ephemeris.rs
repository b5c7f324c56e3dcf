//! ICD scale factors turning ephemeris mantissas into the physical
//! parameters of the RINEX broadcast orbit matrix.
use crate::epoch::time_tag;

use std::f64::consts::PI;

const P2_4: f64 = 16.0;
const P2_M5: f64 = 1.0 / (1u64 << 5) as f64;
const P2_M11: f64 = 1.0 / (1u64 << 11) as f64;
const P2_M19: f64 = 1.0 / (1u64 << 19) as f64;
const P2_M20: f64 = 1.0 / (1u64 << 20) as f64;
const P2_M29: f64 = 1.0 / (1u64 << 29) as f64;
const P2_M30: f64 = 1.0 / (1u64 << 30) as f64;
const P2_M31: f64 = 1.0 / (1u64 << 31) as f64;
const P2_M33: f64 = 1.0 / (1u64 << 33) as f64;
const P2_M40: f64 = 1.0 / (1u64 << 40) as f64;
const P2_M43: f64 = 1.0 / (1u64 << 43) as f64;
const P2_M55: f64 = 1.0 / (1u64 << 55) as f64;

/// GPS broadcast orbit scale factors, one per matrix cell.
/// Semicircle quantities carry the extra factor of pi.
pub const GPS_SCALE: [[f64; 4]; 8] = [
    // T0c, Af0, Af1, Af2
    [P2_4, P2_M31, P2_M43, P2_M55],
    // IODE, Crs, Delta n, M0
    [1.0, P2_M5, P2_M43 * PI, P2_M31 * PI],
    // Cuc, e, Cus, sqrt(A)
    [P2_M29, P2_M33, P2_M29, P2_M19],
    // Toe, Cic, Omega0, Cis
    [P2_4, P2_M29, P2_M31 * PI, P2_M29],
    // i0, Crc, omega, Omega dot
    [P2_M31 * PI, P2_M5, P2_M31 * PI, P2_M43 * PI],
    // IDOT, codes on L2, GPS week, L2P flag
    [P2_M43 * PI, 1.0, 1.0, 1.0],
    // SV accuracy (index), SV health, TGD, IODC
    [1.0, 1.0, P2_M31, 1.0],
    // transmission time (scaled by 100), fit interval, spares
    [0.01, 1.0, 0.0, 0.0],
];

/// User range accuracy, meters per URA index
pub const GPS_URA: [f64; 16] = [
    2.0, 2.8, 4.0, 5.7, 8.0, 11.3, 16.0, 32.0, 64.0, 128.0, 256.0, 512.0, 1024.0, 2048.0,
    4096.0, 6144.0,
];

/// Glonass broadcast orbit scale factors for the four meaningful rows
pub const GLO_SCALE: [[f64; 4]; 4] = [
    // T0c, -TauN, +GammaN, message frame time
    [1.0, P2_M30, P2_M40, 1.0],
    // X, Vx, Ax, health
    [P2_M11, P2_M20, P2_M30, 1.0],
    // Y, Vy, Ay, frequency number
    [P2_M11, P2_M20, P2_M30, 1.0],
    // Z, Vz, Az, age of operation
    [P2_M11, P2_M20, P2_M30, 1.0],
];

/// Curve fit interval in hours, from the fit flag and the IODC.
/// Specific IODC cases take precedence over the open ranges.
pub fn fit_interval(fit_flag: i32, iodc: i32) -> f64 {
    if fit_flag == 0 {
        4.0
    } else if (240..=247).contains(&iodc) {
        8.0
    } else if (248..=255).contains(&iodc) || iodc == 496 {
        14.0
    } else if (497..=503).contains(&iodc) || (1021..=1023).contains(&iodc) {
        26.0
    } else {
        6.0
    }
}

/// Applies the GPS scale factors to a mantissa matrix. Returns the
/// ephemeris time tag (from the GPS week and T0c) and the scaled
/// broadcast orbit matrix.
pub fn scale_gps_ephemeris(mantissa: &[[i32; 4]; 8]) -> (f64, [[f64; 4]; 8]) {
    let week = mantissa[5][2] as u32;
    let tag = time_tag(week, mantissa[0][0] as f64 * GPS_SCALE[0][0]);
    let iodc = mantissa[6][3];
    let mut orbit = [[0.0f64; 4]; 8];
    for row in 0..8 {
        for col in 0..4 {
            orbit[row][col] = match (row, col) {
                (7, 1) => fit_interval(mantissa[7][1], iodc),
                (6, 0) => GPS_URA[(mantissa[6][0] as usize).min(15)],
                // e and sqrt(A) mantissas are unsigned 32 bit
                (2, 1) | (2, 3) => mantissa[row][col] as u32 as f64 * GPS_SCALE[row][col],
                _ => mantissa[row][col] as f64 * GPS_SCALE[row][col],
            };
        }
    }
    (tag, orbit)
}

/// Applies the Glonass scale factors to a mantissa matrix. The four
/// meaningful rows are scaled, the rest stay zero.
pub fn scale_glo_ephemeris(mantissa: &[[i32; 4]; 8]) -> [[f64; 4]; 8] {
    let mut orbit = [[0.0f64; 4]; 8];
    for row in 0..4 {
        for col in 0..4 {
            orbit[row][col] = mantissa[row][col] as f64 * GLO_SCALE[row][col];
        }
    }
    orbit
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fit_intervals() {
        assert_eq!(fit_interval(0, 200), 4.0);
        assert_eq!(fit_interval(1, 240), 8.0);
        assert_eq!(fit_interval(1, 247), 8.0);
        assert_eq!(fit_interval(1, 250), 14.0);
        // 496 resolves to 14 hours, not to the range starting at 497
        assert_eq!(fit_interval(1, 496), 14.0);
        assert_eq!(fit_interval(1, 497), 26.0);
        assert_eq!(fit_interval(1, 1022), 26.0);
        assert_eq!(fit_interval(1, 200), 6.0);
    }

    #[test]
    fn ura_lookup() {
        let mut mantissa = [[0i32; 4]; 8];
        mantissa[6][0] = 0;
        assert_eq!(scale_gps_ephemeris(&mantissa).1[6][0], 2.0);
        mantissa[6][0] = 3;
        assert_eq!(scale_gps_ephemeris(&mantissa).1[6][0], 5.7);
        mantissa[6][0] = 6;
        assert_eq!(scale_gps_ephemeris(&mantissa).1[6][0], 16.0);
        mantissa[6][0] = 15;
        assert_eq!(scale_gps_ephemeris(&mantissa).1[6][0], 6144.0);
    }

    #[test]
    fn unsigned_reinterpretation() {
        let mut mantissa = [[0i32; 4]; 8];
        // a sqrt(A) mantissa with the top bit set stays positive
        mantissa[2][3] = 0xA0000000u32 as i32;
        let (_, orbit) = scale_gps_ephemeris(&mantissa);
        assert!((orbit[2][3] - 0xA0000000u32 as f64 * P2_M19).abs() < 1e-6);
        assert!(orbit[2][3] > 0.0);
        // while M0 is signed
        mantissa[1][3] = -0x40000000;
        let (_, orbit) = scale_gps_ephemeris(&mantissa);
        assert!((orbit[1][3] + 0.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn time_tag_from_week_and_toc() {
        let mut mantissa = [[0i32; 4]; 8];
        mantissa[5][2] = 1880;
        mantissa[0][0] = 259_200 / 16; // T0c counts 16 second units
        let (tag, _) = scale_gps_ephemeris(&mantissa);
        assert_eq!(tag, crate::epoch::time_tag(1880, 259_200.0));
    }

    #[test]
    fn glonass_scaling() {
        let mut mantissa = [[0i32; 4]; 8];
        mantissa[1][0] = 25_690_818; // X position in 2^-11 km units
        mantissa[0][1] = -137; // clock bias in 2^-30 s units
        mantissa[2][3] = -4; // frequency number, unscaled
        let orbit = scale_glo_ephemeris(&mantissa);
        assert!((orbit[1][0] - 25_690_818.0 * P2_M11).abs() < 1e-9);
        assert!((orbit[0][1] + 137.0 * P2_M30).abs() < 1e-15);
        assert_eq!(orbit[2][3], -4.0);
        // rows past the glonass records stay zero
        assert_eq!(orbit[5][2], 0.0);
    }
}
