use log::debug;

use crate::carrier::{Carrier, CarrierReader};
use crate::config::{self, StegoConfig};
use crate::error::Result;
use crate::frame::FramePrefix;
use crate::level::Level;

/// A frame header that passed every structural check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub level: Level,
    pub filename: String,
}

/// Check L0, L1, L2 in order and return the first level with a well-formed
/// frame header, or `None` when no level matches.
///
/// Natural images and the high bits of an L2 frame can both look like an L0
/// header by chance, so a hit here is not proof that the frame unpacks.
pub fn detect(carrier: &Carrier, cfg: &StegoConfig) -> Option<Detection> {
    Level::ALL
        .into_iter()
        .find_map(|level| detect_at(carrier, level, cfg))
}

/// Check a single level for a well-formed frame header.
pub fn detect_at(carrier: &Carrier, level: Level, cfg: &StegoConfig) -> Option<Detection> {
    let mut reader = carrier.reader(level, cfg);
    match read_header(&mut reader, cfg) {
        Ok(Some(filename)) => {
            debug!("frame header found at {}: {:?}", level, filename);
            Some(Detection { level, filename })
        }
        Ok(None) => None,
        Err(e) => {
            debug!("header read at {} stopped: {}", level, e);
            None
        }
    }
}

fn read_header(reader: &mut CarrierReader<'_>, cfg: &StegoConfig) -> Result<Option<String>> {
    let level = reader.level();
    reader.reset();

    let prefix = FramePrefix::parse(reader.read_array::<{ config::PREFIX_SIZE }>()?);
    if !prefix.is_valid_at(level) {
        debug!("no frame prefix at {}: {:?}", level, prefix);
        return Ok(None);
    }

    let raw = reader.read_bytes(usize::from(prefix.filename_len))?;
    let filename = match String::from_utf8(raw) {
        Ok(filename) => filename,
        Err(_) => {
            debug!("filename at {} is not UTF-8", level);
            return Ok(None);
        }
    };

    if !cfg.filename_check.accepts(&filename) {
        debug!("filename at {} rejected: {:?}", level, filename);
        return Ok(None);
    }

    Ok(Some(filename))
}
