pub mod decode;
pub mod encode;

use log::{info, warn};

use crate::carrier::Carrier;
use crate::config::StegoConfig;
use crate::detect;
use crate::error::{Result, StegoError};
use crate::frame;
use crate::level::{self, Level};
use crate::payload::Payload;

/// Embed `payload` into `carrier` at the lowest level that fits.
///
/// The frame is written to a copy and read back before `carrier` is touched,
/// so on any error the carrier is left unchanged.
pub fn embed(carrier: &mut Carrier, payload: &Payload, cfg: &StegoConfig) -> Result<Level> {
    if !cfg.filename_check.accepts(payload.filename()) {
        return Err(StegoError::UnsupportedFilename(payload.filename().to_string()));
    }

    let level = level::choose_level(payload.packed_size(), carrier)?;
    let frame_bytes = frame::pack(payload, level, carrier)?;
    info!(
        "embedding {:?} ({} frame bytes) at {}",
        payload.filename(),
        frame_bytes.len(),
        level
    );

    let mut staged = carrier.clone();
    staged.write_bytes(&frame_bytes, level, cfg.padding)?;
    verify_readback(&staged, level, cfg)?;

    *carrier = staged;
    Ok(level)
}

// The high bits of an L2 frame can form a lower-level header whose length
// field stays in range. Extraction would stop there with a digest mismatch.
fn verify_readback(carrier: &Carrier, level: Level, cfg: &StegoConfig) -> Result<()> {
    match extract(carrier, cfg) {
        Ok((found, _)) if found == level => Ok(()),
        Ok((found, _)) => Err(StegoError::ShadowedFrame {
            level,
            shadowed_by: found,
        }),
        Err(StegoError::IntegrityFailure { level: found }) if found != level => {
            Err(StegoError::ShadowedFrame {
                level,
                shadowed_by: found,
            })
        }
        Err(e) => Err(e),
    }
}

/// Detect and decode the payload stored in `carrier`.
///
/// Levels are tried from L0 up. A header whose length field points past the
/// end of the carrier is taken for a chance match and the next level is
/// tried. A digest mismatch is returned as [`StegoError::IntegrityFailure`],
/// never skipped over.
pub fn extract(carrier: &Carrier, cfg: &StegoConfig) -> Result<(Level, Payload)> {
    for level in Level::ALL {
        let Some(detection) = detect::detect_at(carrier, level, cfg) else {
            continue;
        };
        info!("found {:?} encoded at {}", detection.filename, level);

        let mut reader = carrier.reader(level, cfg);
        match frame::unpack(&mut reader) {
            Ok(payload) => return Ok((level, payload)),
            Err(e @ StegoError::OutOfRange { .. }) => {
                warn!("ignoring header at {}: {}", level, e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(StegoError::NoPayloadFound)
}

/// Frame size limits of a carrier, per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityReport {
    pub width: usize,
    pub height: usize,
    pub pixels: usize,
    /// Largest frame at L0, L1, L2.
    pub capacities: [usize; 3],
}

impl CapacityReport {
    pub fn for_carrier(carrier: &Carrier) -> Self {
        Self {
            width: carrier.width(),
            height: carrier.height(),
            pixels: carrier.pixels(),
            capacities: Level::ALL.map(|level| carrier.capacity_bytes(level)),
        }
    }

    /// Inclusive range of frame sizes that select `level`. `None` when the
    /// level is never selected because a lower one already covers it.
    pub fn range(&self, level: Level) -> Option<(usize, usize)> {
        let idx = level as usize;
        let low = if idx == 0 { 0 } else { self.capacities[idx - 1] + 1 };
        let high = self.capacities[idx];
        (low <= high).then_some((low, high))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::config::{FilenameCheck, Padding, FRAME_OVERHEAD};
    use crate::level::address::{cursor_of, locate};

    fn noise(width: usize, height: usize, seed: u64) -> Carrier {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut samples = vec![0u8; width * height * 3];
        rng.fill(samples.as_mut_slice());
        Carrier::from_raw(width, height, 3, samples).unwrap()
    }

    fn gray(width: usize, height: usize) -> Carrier {
        Carrier::from_raw(width, height, 3, vec![0x80; width * height * 3]).unwrap()
    }

    /// Flip bit `bit` of the subchannel at `cursor`.
    fn flip_subchannel(carrier: &Carrier, cursor: usize, bit: u32) -> Carrier {
        let mut samples = carrier.samples().to_vec();
        let address = locate(cursor, carrier.width());
        let idx = cursor_of(address, carrier.width());
        samples[idx] ^= 1 << bit;
        Carrier::from_raw(carrier.width(), carrier.height(), 3, samples).unwrap()
    }

    #[test]
    fn test_example_small_file_uses_l0() {
        let mut carrier = gray(100, 100);
        let data = b"0123456789".to_vec();
        let payload = Payload::from_source(data.clone(), "a.txt").unwrap();

        let level = embed(&mut carrier, &payload, &StegoConfig::default()).unwrap();
        assert_eq!(level, Level::L0);

        let (found, decoded) = extract(&carrier, &StegoConfig::default()).unwrap();
        assert_eq!(found, Level::L0);
        assert_eq!(decoded.filename(), "a.txt");
        assert_eq!(decoded.data(), data.as_slice());
    }

    #[test]
    fn test_level_boundaries_round_trip() {
        // 100x100: capacities 3750 / 7500 / 15000, "a.txt" costs 44 bytes
        let overhead = FRAME_OVERHEAD + 5;
        let cases = [
            (3750 - overhead, Level::L0),
            (3750 - overhead + 1, Level::L1),
            (7500 - overhead, Level::L1),
            (7500 - overhead + 1, Level::L2),
            (15000 - overhead, Level::L2),
        ];

        for (len, expected) in cases {
            let mut carrier = noise(100, 100, len as u64);
            let data: Vec<u8> = (0..len).map(|i| (i * 31 % 251) as u8).collect();
            let payload = Payload::from_source(data.clone(), "a.txt").unwrap();

            let level = embed(&mut carrier, &payload, &StegoConfig::default()).unwrap();
            assert_eq!(level, expected, "data length {}", len);

            let (found, decoded) = extract(&carrier, &StegoConfig::default()).unwrap();
            assert_eq!(found, expected);
            assert_eq!(decoded.data(), data.as_slice());
        }
    }

    #[test]
    fn test_one_byte_over_capacity_fails() {
        let original = gray(100, 100);
        let mut carrier = original.clone();
        let payload = Payload::from_source(vec![0u8; 15000 - 44 + 1], "a.txt").unwrap();
        assert!(matches!(
            embed(&mut carrier, &payload, &StegoConfig::default()),
            Err(StegoError::PayloadTooLarge {
                required: 15001,
                available: 15000
            })
        ));
        assert_eq!(carrier, original);
    }

    #[test]
    fn test_single_bit_flip_in_data_is_detected() {
        let mut carrier = noise(60, 60, 9);
        let payload = Payload::from_source(vec![0xC3; 300], "data.bin").unwrap();
        let level = embed(&mut carrier, &payload, &StegoConfig::default()).unwrap();
        assert_eq!(level, Level::L0);

        // Data starts after the 47-byte header; L0 uses 8 subchannels per byte.
        let header = FRAME_OVERHEAD + "data.bin".len();
        for byte in [header, header + 150, header + 299] {
            let corrupted = flip_subchannel(&carrier, byte * 8 + 3, 0);
            assert!(matches!(
                extract(&corrupted, &StegoConfig::default()),
                Err(StegoError::IntegrityFailure { level: Level::L0 })
            ));
        }

        // Digest bytes are covered too.
        let corrupted = flip_subchannel(&carrier, (3 + "data.bin".len()) * 8, 0);
        assert!(matches!(
            extract(&corrupted, &StegoConfig::default()),
            Err(StegoError::IntegrityFailure { .. })
        ));
    }

    #[test]
    fn test_high_bit_flip_in_data_is_detected_at_l1_and_l2() {
        // 20x20: capacities 150 / 300 / 600, "d.bin" costs 44 bytes
        let header = FRAME_OVERHEAD + "d.bin".len();
        let cases = [(200, Level::L1, 1), (400, Level::L2, 3)];

        for (len, expected, top_bit) in cases {
            let mut carrier = gray(20, 20);
            let payload = Payload::from_source(vec![0x3C; len], "d.bin").unwrap();
            let level = embed(&mut carrier, &payload, &StegoConfig::default()).unwrap();
            assert_eq!(level, expected);

            let per_byte = level.params().subchannels_per_byte;
            for byte in [header, header + len / 2, header + len - 1] {
                let corrupted = flip_subchannel(&carrier, byte * per_byte + 1, top_bit);
                match extract(&corrupted, &StegoConfig::default()) {
                    Err(StegoError::IntegrityFailure { level }) => assert_eq!(level, expected),
                    other => panic!("byte {} at {}: {:?}", byte, expected, other),
                }
            }
        }
    }

    // Bits 4 and 0 of the L2 frame bytes 0, 2, 14, "bdfhjlnbaabbax" spell an
    // L0 header [0, 0, 1, 'A'].
    const L0_LOOKALIKE_NAME: &str = "bdfhjlnbaabbax";

    #[test]
    fn test_l2_frame_behind_l0_lookalike_with_wild_length_round_trips() {
        // 0xFF data makes the lookalike's length field 0xFFFFFFFF.
        let mut carrier = gray(20, 20);
        let payload = Payload::from_source(vec![0xFF; 300], L0_LOOKALIKE_NAME).unwrap();
        let level = embed(&mut carrier, &payload, &StegoConfig::default()).unwrap();
        assert_eq!(level, Level::L2);

        let lookalike = detect::detect(&carrier, &StegoConfig::default()).unwrap();
        assert_eq!(lookalike.level, Level::L0);
        assert_eq!(lookalike.filename, "A");

        let (found, decoded) = extract(&carrier, &StegoConfig::default()).unwrap();
        assert_eq!(found, Level::L2);
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_l2_frame_behind_l0_lookalike_with_valid_length_is_rejected() {
        // Zero data makes the lookalike's length field 0, so it unpacks to an
        // empty file whose digest cannot match.
        let original = gray(20, 20);
        let mut carrier = original.clone();
        let payload = Payload::from_source(vec![0u8; 300], L0_LOOKALIKE_NAME).unwrap();
        let result = embed(&mut carrier, &payload, &StegoConfig::default());
        assert!(
            matches!(
                result,
                Err(StegoError::ShadowedFrame {
                    level: Level::L2,
                    shadowed_by: Level::L0
                })
            ),
            "{:?}",
            result
        );
        assert_eq!(carrier, original);
    }

    #[test]
    fn test_padding_noise_outside_frame_is_harmless() {
        let cfg = StegoConfig {
            padding: Padding::RandomNoise,
            ..Default::default()
        };
        let mut carrier = gray(50, 50);
        let payload = Payload::from_source(b"hidden in the noise".to_vec(), "n.txt").unwrap();
        let level = embed(&mut carrier, &payload, &cfg).unwrap();

        let used = payload.packed_size() * level.params().subchannels_per_byte;
        let mut tampered = carrier.clone();
        for cursor in [used, used + 1, carrier.subchannels() - 1] {
            tampered = flip_subchannel(&tampered, cursor, 0);
        }

        let (_, decoded) = extract(&tampered, &cfg).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_no_payload_in_clean_image() {
        let carrier = gray(40, 40);
        assert!(matches!(
            extract(&carrier, &StegoConfig::default()),
            Err(StegoError::NoPayloadFound)
        ));
    }

    #[test]
    fn test_parallel_decode_matches_sequential() {
        let mut carrier = noise(200, 150, 77);
        let data: Vec<u8> = (0..20_000u32).map(|i| (i % 253) as u8).collect();
        let payload = Payload::from_source(data, "big.bin").unwrap();
        embed(&mut carrier, &payload, &StegoConfig::default()).unwrap();

        let sequential = StegoConfig {
            parallel_threshold: usize::MAX,
            ..Default::default()
        };
        let parallel = StegoConfig {
            parallel_threshold: 16,
            workers: Some(6),
            ..Default::default()
        };

        let (_, a) = extract(&carrier, &sequential).unwrap();
        let (_, b) = extract(&carrier, &parallel).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, payload);
    }

    #[test]
    fn test_whitelist_rejects_unembeddable_filename() {
        let mut carrier = gray(40, 40);
        let payload = Payload::from_source(b"x".to_vec(), "bell\u{7}").unwrap();
        assert!(matches!(
            embed(&mut carrier, &payload, &StegoConfig::default()),
            Err(StegoError::UnsupportedFilename(_))
        ));

        let lenient = StegoConfig {
            filename_check: FilenameCheck::Utf8Only,
            ..Default::default()
        };
        embed(&mut carrier, &payload, &lenient).unwrap();
        let (_, decoded) = extract(&carrier, &lenient).unwrap();
        assert_eq!(decoded.filename(), "bell\u{7}");
    }

    #[test]
    fn test_capacity_report_ranges() {
        let report = CapacityReport::for_carrier(&gray(100, 100));
        assert_eq!(report.pixels, 10_000);
        assert_eq!(report.range(Level::L0), Some((0, 3750)));
        assert_eq!(report.range(Level::L1), Some((3751, 7500)));
        assert_eq!(report.range(Level::L2), Some((7501, 15000)));

        // 1x1: capacities 0 / 0 / 1, L1 is never selected
        let report = CapacityReport::for_carrier(&gray(1, 1));
        assert_eq!(report.range(Level::L1), None);
        assert_eq!(report.range(Level::L2), Some((1, 1)));
    }
}
