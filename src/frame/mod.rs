use byteorder::{BigEndian, ByteOrder};
use log::debug;

use crate::carrier::{Carrier, CarrierReader};
use crate::config;
use crate::error::{Result, StegoError};
use crate::integrity::{self, Sha256Digest};
use crate::level::Level;
use crate::payload::Payload;

/// The fixed three-byte frame prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePrefix {
    pub encoding: u8,
    pub level: u8,
    pub filename_len: u8,
}

impl FramePrefix {
    pub fn parse(bytes: [u8; config::PREFIX_SIZE]) -> Self {
        Self {
            encoding: bytes[0],
            level: bytes[1],
            filename_len: bytes[2],
        }
    }

    /// Structural check for a prefix read at `read_level`.
    pub fn is_valid_at(&self, read_level: Level) -> bool {
        self.encoding == config::FRAME_ENCODING
            && self.level == read_level.as_u8()
            && self.filename_len > 0
    }
}

/// Serialize a payload into a frame at `level`:
/// encoding | level | filename length | filename | sha256 | data length (BE) | data
pub fn pack(payload: &Payload, level: Level, carrier: &Carrier) -> Result<Vec<u8>> {
    let packed_size = payload.packed_size();
    let available = carrier.capacity_bytes(Level::L2);
    if packed_size > available {
        return Err(StegoError::PayloadTooLarge {
            required: packed_size,
            available,
        });
    }

    let filename = payload.filename().as_bytes();
    let mut frame = Vec::with_capacity(packed_size);
    frame.push(config::FRAME_ENCODING);
    frame.push(level.as_u8());
    frame.push(filename.len() as u8);
    frame.extend_from_slice(filename);
    frame.extend_from_slice(payload.digest());

    let mut data_len = [0u8; config::DATA_LENGTH_SIZE];
    BigEndian::write_u32(&mut data_len, payload.data().len() as u32);
    frame.extend_from_slice(&data_len);
    frame.extend_from_slice(payload.data());

    debug_assert_eq!(frame.len(), packed_size);
    Ok(frame)
}

/// Read a complete frame from the start of the reader's level and verify it.
pub fn unpack(reader: &mut CarrierReader<'_>) -> Result<Payload> {
    let level = reader.level();
    reader.reset();

    let prefix = FramePrefix::parse(reader.read_array::<{ config::PREFIX_SIZE }>()?);
    if !prefix.is_valid_at(level) {
        return Err(StegoError::NoPayloadFound);
    }

    let filename = String::from_utf8(reader.read_bytes(usize::from(prefix.filename_len))?)?;
    let digest: Sha256Digest = reader.read_array::<{ config::DIGEST_SIZE }>()?;
    let data_len = BigEndian::read_u32(&reader.read_array::<{ config::DATA_LENGTH_SIZE }>()?);
    debug!(
        "frame at {}: {:?}, {} data bytes, digest {}",
        level,
        filename,
        data_len,
        integrity::hex(&digest)
    );

    let data = reader.read_bytes(data_len as usize)?;
    Payload::from_decoded_fields(filename, data, digest, level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Padding, StegoConfig};

    fn blank(width: usize, height: usize) -> Carrier {
        Carrier::from_raw(width, height, 3, vec![0x80; width * height * 3]).unwrap()
    }

    #[test]
    fn test_pack_layout() {
        let carrier = blank(100, 100);
        let payload = Payload::from_source(b"0123456789".to_vec(), "a.txt").unwrap();
        let frame = pack(&payload, Level::L1, &carrier).unwrap();

        assert_eq!(frame.len(), 54);
        assert_eq!(&frame[..3], &[0u8, 1, 5]);
        assert_eq!(&frame[3..8], b"a.txt");
        assert_eq!(&frame[8..40], payload.digest());
        assert_eq!(&frame[40..44], &[0u8, 0, 0, 10]);
        assert_eq!(&frame[44..], b"0123456789");
    }

    #[test]
    fn test_pack_rejects_oversized() {
        let carrier = blank(10, 10);
        // 300 subchannels -> 150 bytes at L2
        let data = vec![0u8; 150 - config::FRAME_OVERHEAD - 1];
        let payload = Payload::from_source(data, "ab").unwrap();
        assert!(matches!(
            pack(&payload, Level::L2, &carrier),
            Err(StegoError::PayloadTooLarge {
                required: 151,
                available: 150
            })
        ));
    }

    #[test]
    fn test_pack_unpack_through_carrier() {
        let mut carrier = blank(64, 64);
        let payload = Payload::from_source((0..200u8).collect(), "bytes.bin").unwrap();
        let frame = pack(&payload, Level::L0, &carrier).unwrap();
        carrier
            .write_bytes(&frame, Level::L0, Padding::Preserve)
            .unwrap();

        let cfg = StegoConfig::default();
        let mut reader = carrier.reader(Level::L0, &cfg);
        let decoded = unpack(&mut reader).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_unpack_detects_corrupt_data() {
        let mut carrier = blank(64, 64);
        let payload = Payload::from_source(b"integrity matters".to_vec(), "f.txt").unwrap();
        let mut frame = pack(&payload, Level::L1, &carrier).unwrap();
        let last = frame.len() - 1;
        frame[last] ^= 0x01;
        carrier
            .write_bytes(&frame, Level::L1, Padding::Preserve)
            .unwrap();

        let cfg = StegoConfig::default();
        let mut reader = carrier.reader(Level::L1, &cfg);
        assert!(matches!(
            unpack(&mut reader),
            Err(StegoError::IntegrityFailure { level: Level::L1 })
        ));
    }

    #[test]
    fn test_unpack_rejects_level_mismatch() {
        let mut carrier = blank(64, 64);
        let payload = Payload::from_source(b"x".to_vec(), "x").unwrap();
        // Frame claims L2 but is written with L0 bit packing.
        let frame = pack(&payload, Level::L2, &carrier).unwrap();
        carrier
            .write_bytes(&frame, Level::L0, Padding::Preserve)
            .unwrap();

        let cfg = StegoConfig::default();
        let mut reader = carrier.reader(Level::L0, &cfg);
        assert!(matches!(unpack(&mut reader), Err(StegoError::NoPayloadFound)));
    }

    #[test]
    fn test_prefix_validation() {
        assert!(FramePrefix::parse([0, 0, 1]).is_valid_at(Level::L0));
        assert!(FramePrefix::parse([0, 2, 255]).is_valid_at(Level::L2));
        assert!(!FramePrefix::parse([0, 0, 0]).is_valid_at(Level::L0));
        assert!(!FramePrefix::parse([1, 0, 5]).is_valid_at(Level::L0));
        assert!(!FramePrefix::parse([0, 1, 5]).is_valid_at(Level::L0));
    }
}
