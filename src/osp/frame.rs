//! Frame extraction from a byte source, stripped or fully framed.
use crate::osp::{Error, Payload, MAX_PAYLOAD};

use std::io::Read;

use log::{debug, warn};

/// First byte of the frame start sequence
pub const START1: u8 = 0xA0;
/// Second byte of the frame start sequence
pub const START2: u8 = 0xA2;
/// First byte of the frame end sequence
pub const END1: u8 = 0xB0;
/// Second byte of the frame end sequence
pub const END2: u8 = 0xB3;

/// How the byte source packages messages
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Framing {
    /// `{length}{payload}` records, start / checksum / end stripped
    Stripped,
    /// Full `A0 A2 {length} {payload} {checksum} B0 B3` frames, with
    /// a patience budget for the start-sequence search
    Framed { patience: usize },
}

enum SyncOutcome {
    Found,
    Eof,
    Exhausted,
}

/// Pulls one message payload at a time from a byte source.
pub struct FrameReader<R: Read> {
    source: R,
    framing: Framing,
}

impl<R: Read> FrameReader<R> {
    /// Reader for already-decapsulated files
    pub fn stripped(source: R) -> Self {
        Self {
            source,
            framing: Framing::Stripped,
        }
    }

    /// Reader for raw frames (live links or raw captures). `patience`
    /// bounds the bytes tolerated while hunting the start sequence.
    pub fn framed(source: R, patience: usize) -> Self {
        Self {
            source,
            framing: Framing::Framed { patience },
        }
    }

    /// The underlying byte source
    pub fn source_mut(&mut self) -> &mut R {
        &mut self.source
    }

    /// The next payload, or None when the source is exhausted.
    pub fn next_payload(&mut self) -> Result<Option<Payload>, Error> {
        match self.framing {
            Framing::Stripped => self.next_stripped(),
            Framing::Framed { patience } => self.next_framed(patience),
        }
    }

    fn next_stripped(&mut self) -> Result<Option<Payload>, Error> {
        let high = match self.read_byte()? {
            Some(byte) => byte,
            None => return Ok(None),
        };
        let low = match self.read_byte()? {
            Some(byte) => byte,
            None => return Err(Error::Truncated("payload length")),
        };
        let length = u16::from_be_bytes([high, low]);
        if length == 0 || length as usize > MAX_PAYLOAD {
            return Err(Error::BadLength(length));
        }
        let mut data = vec![0u8; length as usize];
        self.source
            .read_exact(&mut data)
            .map_err(|_| Error::Truncated("payload"))?;
        Ok(Some(Payload::new(data)))
    }

    fn next_framed(&mut self, patience: usize) -> Result<Option<Payload>, Error> {
        match self.synchronize(patience)? {
            SyncOutcome::Found => {},
            SyncOutcome::Eof => return Ok(None),
            SyncOutcome::Exhausted => return Err(Error::SyncLost),
        }
        let high = match self.read_byte()? {
            Some(byte) => byte,
            None => return Err(Error::Truncated("payload length")),
        };
        let low = match self.read_byte()? {
            Some(byte) => byte,
            None => return Err(Error::Truncated("payload length")),
        };
        let length = u16::from_be_bytes([high, low]);
        if length == 0 || length as usize > MAX_PAYLOAD {
            return Err(Error::BadLength(length));
        }
        let mut data = vec![0u8; length as usize + 2];
        self.source
            .read_exact(&mut data)
            .map_err(|_| Error::Truncated("payload"))?;
        let received =
            u16::from_be_bytes([data[length as usize], data[length as usize + 1]]);
        data.truncate(length as usize);
        let computed = checksum(&data);
        if received != computed {
            warn!("frame dropped: checksum mismatch");
            return Err(Error::BadChecksum { received, computed });
        }
        Ok(Some(Payload::new(data)))
    }

    /// Skips bytes until the start sequence, spending the patience
    /// budget on every byte that is not part of it. The two waiting
    /// states are distinct: a byte consumed by one is never
    /// re-examined by the other.
    fn synchronize(&mut self, mut patience: usize) -> Result<SyncOutcome, Error> {
        let mut waiting_second = false;
        loop {
            let byte = match self.read_byte()? {
                Some(byte) => byte,
                None => return Ok(SyncOutcome::Eof),
            };
            if waiting_second {
                match byte {
                    START2 => return Ok(SyncOutcome::Found),
                    START1 => {},
                    _ => {
                        waiting_second = false;
                        patience = match patience.checked_sub(1) {
                            Some(left) => left,
                            None => break,
                        };
                    },
                }
            } else {
                match byte {
                    START1 => waiting_second = true,
                    START2 => {},
                    _ => {
                        patience = match patience.checked_sub(1) {
                            Some(left) => left,
                            None => break,
                        };
                    },
                }
            }
        }
        debug!("start sequence not found, patience exhausted");
        Ok(SyncOutcome::Exhausted)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, Error> {
        let mut byte = [0u8; 1];
        loop {
            match self.source.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(error) if error.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(Error::Io(error)),
            }
        }
    }
}

/// Sum of the payload bytes, modulo 0x8000
pub fn checksum(payload: &[u8]) -> u16 {
    payload
        .iter()
        .fold(0u16, |sum, byte| (sum + *byte as u16) & 0x7FFF)
}

/// Encapsulates a payload into a full frame, the encoder the tests
/// and the command senders share.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 8);
    frame.extend_from_slice(&[START1, START2]);
    frame.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&checksum(payload).to_be_bytes());
    frame.extend_from_slice(&[END1, END2]);
    frame
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stripped_round_trip() {
        let stream = [0x00u8, 0x04, 0x02, 0x00, 0x00, 0x01, 0x00, 0x02, 0x07, 0x10];
        let mut reader = FrameReader::stripped(stream.as_slice());
        let payload = reader.next_payload().unwrap().unwrap();
        assert_eq!(payload.mid(), Some(2));
        assert_eq!(payload.bytes(), &[0x02, 0x00, 0x00, 0x01]);
        let payload = reader.next_payload().unwrap().unwrap();
        assert_eq!(payload.bytes(), &[0x07, 0x10]);
        assert!(reader.next_payload().unwrap().is_none());
    }

    #[test]
    fn stripped_bad_length() {
        let mut reader = FrameReader::stripped([0x00u8, 0x00].as_slice());
        assert!(matches!(
            reader.next_payload(),
            Err(Error::BadLength(0))
        ));
        let mut reader = FrameReader::stripped([0xFFu8, 0xFF, 0x00].as_slice());
        assert!(matches!(
            reader.next_payload(),
            Err(Error::BadLength(0xFFFF))
        ));
    }

    #[test]
    fn stripped_truncation() {
        let mut reader = FrameReader::stripped([0x00u8, 0x04, 0x02, 0x00].as_slice());
        assert!(matches!(reader.next_payload(), Err(Error::Truncated(_))));
    }

    #[test]
    fn framed_round_trip() {
        // MID 2 with payload bytes 02 00 00 01, checksum 0x0003
        let frame = encode_frame(&[0x02, 0x00, 0x00, 0x01]);
        assert_eq!(
            frame,
            vec![0xA0, 0xA2, 0x00, 0x04, 0x02, 0x00, 0x00, 0x01, 0x00, 0x03, 0xB0, 0xB3]
        );
        let mut reader = FrameReader::framed(frame.as_slice(), 16);
        let payload = reader.next_payload().unwrap().unwrap();
        assert_eq!(payload.mid(), Some(2));
        let mut cursor = payload.reader();
        cursor.skip(1).unwrap();
        assert_eq!(cursor.get_u32().unwrap(), 1);
        // the end sequence is skipped hunting the next start
        assert!(reader.next_payload().unwrap().is_none());
    }

    #[test]
    fn framed_resynchronizes_after_noise() {
        let mut stream = vec![0x17, 0xA0, 0x55, 0x42];
        stream.extend(encode_frame(&[0x07, 0x01]));
        let mut reader = FrameReader::framed(stream.as_slice(), 16);
        let payload = reader.next_payload().unwrap().unwrap();
        assert_eq!(payload.bytes(), &[0x07, 0x01]);
    }

    #[test]
    fn framed_bad_checksum() {
        let mut frame = encode_frame(&[0x02, 0x00, 0x00, 0x01]);
        frame[9] = 0x07; // corrupt the checksum low byte
        // append a good frame to prove the reader recovers
        frame.extend(encode_frame(&[0x07, 0x01]));
        let mut reader = FrameReader::framed(frame.as_slice(), 64);
        assert!(matches!(
            reader.next_payload(),
            Err(Error::BadChecksum {
                received: 0x0007,
                computed: 0x0003
            })
        ));
        let payload = reader.next_payload().unwrap().unwrap();
        assert_eq!(payload.bytes(), &[0x07, 0x01]);
    }

    #[test]
    fn framed_corrupted_payload_is_never_ok() {
        for bit in 0..32 {
            let mut frame = encode_frame(&[0x02, 0x00, 0x00, 0x01]);
            frame[4 + bit / 8] ^= 1 << (bit % 8);
            let mut reader = FrameReader::framed(frame.as_slice(), 16);
            // a flipped payload bit must never verify
            assert!(reader.next_payload().is_err());
        }
    }

    #[test]
    fn sync_lost_on_garbage() {
        let stream = vec![0x11u8; 64];
        let mut reader = FrameReader::framed(stream.as_slice(), 8);
        assert!(matches!(reader.next_payload(), Err(Error::SyncLost)));
    }

    #[test]
    fn checksum_wraps_at_0x8000() {
        let payload = vec![0xFFu8; 129];
        // 129 * 255 = 32895 = 0x807F, wrapped to 0x007F
        assert_eq!(checksum(&payload), 0x007F);
    }
}
