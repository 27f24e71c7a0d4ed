use std::fs;
use std::path::{Path, PathBuf};

use crate::config;
use crate::error::{Result, StegoError};
use crate::integrity::{self, Sha256Digest};
use crate::level::Level;

/// A named file to hide, or one recovered from a carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    filename: String,
    data: Vec<u8>,
    digest: Sha256Digest,
}

impl Payload {
    /// Build a payload for embedding. Directory components of `filename`
    /// are stripped; the remaining basename must be 1-255 bytes.
    pub fn from_source(data: Vec<u8>, filename: &str) -> Result<Self> {
        let filename = basename(filename)?;
        if data.len() > config::MAX_DATA_LEN {
            return Err(StegoError::PayloadTooLarge {
                required: config::frame_size(filename.len(), data.len()),
                available: config::frame_size(filename.len(), config::MAX_DATA_LEN),
            });
        }

        let digest = integrity::sha256(&data);
        Ok(Self {
            filename,
            data,
            digest,
        })
    }

    /// Rebuild a payload from fields read out of a frame. The data must hash
    /// to `digest`, otherwise the frame is reported corrupt.
    pub fn from_decoded_fields(
        filename: String,
        data: Vec<u8>,
        digest: Sha256Digest,
        level: Level,
    ) -> Result<Self> {
        if integrity::sha256(&data) != digest {
            return Err(StegoError::IntegrityFailure { level });
        }

        Ok(Self {
            filename,
            data,
            digest,
        })
    }

    /// Load a file from disk, named after its basename.
    pub fn from_file(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or(StegoError::EmptyFilename)?;
        let data = fs::read(path)?;
        Self::from_source(data, &name)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn digest(&self) -> &Sha256Digest {
        &self.digest
    }

    /// Size of the frame this payload serializes to.
    pub fn packed_size(&self) -> usize {
        config::frame_size(self.filename.len(), self.data.len())
    }

    /// Write the data to `dir/<filename>`. Only the basename of the stored
    /// filename is used, so the file always lands inside `dir`.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(basename(&self.filename)?);
        fs::write(&path, &self.data)?;
        Ok(path)
    }
}

fn basename(filename: &str) -> Result<String> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        return Err(StegoError::EmptyFilename);
    }
    if name.len() > config::MAX_FILENAME_LEN {
        return Err(StegoError::FilenameTooLong { len: name.len() });
    }
    Ok(name.to_string())
}
