use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::carrier::Carrier;
use crate::config::StegoConfig;
use crate::error::StegoError;
use crate::integrity;
use crate::level::Level;

/// Outcome of a successful [`decode_file`].
#[derive(Debug, Clone)]
pub struct DecodeReport {
    pub level: Level,
    pub filename: String,
    pub path: PathBuf,
    pub size: usize,
}

/// Full decode pipeline: loaded carrier -> detect -> unpack -> verify -> save.
///
/// Returns `Ok(None)` when the carrier holds no detectable payload. Any
/// other failure, including a digest mismatch, is an error.
pub fn decode_file(
    carrier: &Carrier,
    output_dir: &Path,
    cfg: &StegoConfig,
) -> Result<Option<DecodeReport>> {
    let (level, payload) = match super::extract(carrier, cfg) {
        Ok(found) => found,
        Err(StegoError::NoPayloadFound) => {
            info!("no payload detected");
            return Ok(None);
        }
        Err(e) => return Err(e).context("failed to decode payload"),
    };
    info!("payload verified, sha256 {}", integrity::hex(payload.digest()));

    let path = payload
        .save_to(output_dir)
        .with_context(|| format!("failed to save payload into {}", output_dir.display()))?;

    info!("decode complete! output: {}", path.display());
    Ok(Some(DecodeReport {
        level,
        filename: payload.filename().to_string(),
        path,
        size: payload.data().len(),
    }))
}
