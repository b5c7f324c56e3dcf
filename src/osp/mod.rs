//! The receiver side: SiRF "One Socket Protocol" frame extraction,
//! payload decoding, 50 bps navigation-message reassembly and the
//! message dispatcher building RINEX epochs.
use thiserror::Error;

pub mod bits;
pub mod dispatch;
pub mod ephemeris;
pub mod frame;
pub mod payload;
pub mod subframe;

pub use dispatch::{Decoder, Settings};
pub use frame::FrameReader;
pub use payload::{Payload, PayloadReader};

/// The largest payload a frame may carry, per the protocol definition
pub const MAX_PAYLOAD: usize = 2048;

/// Errors of the binary decoding pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// A typed read ran past the end of the payload
    #[error("unexpected end of payload reading {0}")]
    Truncated(&'static str),
    /// A frame declared a length the protocol does not allow
    #[error("payload length {0} out of bounds")]
    BadLength(u16),
    /// The payload checksum does not match its content
    #[error("checksum mismatch: received {received:#06x}, computed {computed:#06x}")]
    BadChecksum {
        /// Checksum carried by the frame
        received: u16,
        /// Checksum computed over the payload
        computed: u16,
    },
    /// The start sequence was not found within the patience budget
    #[error("start of frame not found")]
    SyncLost,
    /// A navigation subframe failed its parity check
    #[error("subframe parity check failed")]
    BadParity,
    /// A position or clock message carried fewer satellites than the
    /// configured minimum
    #[error("fix with insufficient satellites ({0})")]
    InsufficientSats(u8),
    /// The byte source failed
    #[error("i/o error")]
    Io(#[from] std::io::Error),
}
