use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::carrier::Carrier;
use crate::config::StegoConfig;
use crate::level::Level;
use crate::payload::Payload;

/// Outcome of a successful [`encode_file`].
#[derive(Debug, Clone)]
pub struct EncodeReport {
    pub level: Level,
    pub packed_size: usize,
    /// Path actually written, always with a `.png` extension.
    pub output: PathBuf,
}

/// Full encode pipeline: loaded carrier + payload file -> PNG with embedded frame.
///
/// The output file is only created once embedding has succeeded.
pub fn encode_file(
    mut carrier: Carrier,
    payload_path: &Path,
    output_path: &Path,
    cfg: &StegoConfig,
) -> Result<EncodeReport> {
    info!("loading payload: {}", payload_path.display());
    let payload = Payload::from_file(payload_path)
        .with_context(|| format!("failed to load payload {}", payload_path.display()))?;

    let level = super::embed(&mut carrier, &payload, cfg).with_context(|| {
        format!(
            "cannot embed {} into a {}x{} carrier",
            payload.filename(),
            carrier.width(),
            carrier.height()
        )
    })?;

    let output = carrier
        .save(output_path)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    info!("encode complete! output: {}", output.display());
    Ok(EncodeReport {
        level,
        packed_size: payload.packed_size(),
        output,
    })
}
