// Frame layout
pub const FRAME_ENCODING: u8 = 0;
pub const PREFIX_SIZE: usize = 3; // encoding + level + filename length
pub const DIGEST_SIZE: usize = 32; // SHA-256
pub const DATA_LENGTH_SIZE: usize = 4; // big-endian u32
pub const FRAME_OVERHEAD: usize = PREFIX_SIZE + DIGEST_SIZE + DATA_LENGTH_SIZE;
pub const MAX_FILENAME_LEN: usize = 255;

// Carrier parameters
pub const COLOR_CHANNELS: usize = 3;
pub const MAX_DATA_LEN: usize = u32::MAX as usize;

// Reads longer than this many bytes are split across the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1000;

/// Compute the full frame size for a filename and data length.
pub fn frame_size(filename_len: usize, data_len: usize) -> usize {
    FRAME_OVERHEAD + filename_len + data_len
}

/// What happens to carrier subchannels that hold no frame bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    /// Leave them exactly as they were in the source image.
    #[default]
    Preserve,
    /// Overwrite their low bits with uniform noise so the frame end is not
    /// visible in the bit planes.
    RandomNoise,
}

/// How strictly an embedded filename is validated during detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilenameCheck {
    /// Any valid UTF-8 is accepted.
    Utf8Only,
    /// Valid UTF-8 restricted to alphanumerics, space and ASCII punctuation
    /// other than path separators.
    #[default]
    Whitelist,
}

impl FilenameCheck {
    pub fn accepts(self, filename: &str) -> bool {
        match self {
            FilenameCheck::Utf8Only => true,
            FilenameCheck::Whitelist => filename.chars().all(is_filename_char),
        }
    }
}

fn is_filename_char(c: char) -> bool {
    c.is_alphanumeric() || c == ' ' || (c.is_ascii_punctuation() && c != '/' && c != '\\')
}

/// Runtime configuration for an embed/extract operation.
#[derive(Debug, Clone)]
pub struct StegoConfig {
    pub padding: Padding,
    pub filename_check: FilenameCheck,
    pub parallel_threshold: usize,
    /// Worker count for parallel reads; `None` uses the rayon pool size.
    pub workers: Option<usize>,
}

impl StegoConfig {
    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(rayon::current_num_threads)
            .max(1)
    }
}

impl Default for StegoConfig {
    fn default() -> Self {
        Self {
            padding: Padding::default(),
            filename_check: FilenameCheck::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            workers: None,
        }
    }
}
