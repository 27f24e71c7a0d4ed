use thiserror::Error;

use crate::level::Level;

#[derive(Error, Debug)]
pub enum StegoError {
    #[error("carrier has {channels} channel(s), at least 3 color channels are required")]
    UnsupportedCarrier { channels: usize },
    #[error("frame of {required} bytes exceeds carrier capacity of {available} bytes")]
    PayloadTooLarge { required: usize, available: usize },
    #[error("filename is {len} bytes long, the limit is 255")]
    FilenameTooLong { len: usize },
    #[error("filename is empty")]
    EmptyFilename,
    #[error("filename {0:?} contains characters the detector would reject")]
    UnsupportedFilename(String),
    #[error("embedded filename is not valid UTF-8")]
    InvalidFilename(#[from] std::string::FromUtf8Error),
    #[error("no payload found")]
    NoPayloadFound,
    #[error("payload integrity check failed at {level}, carrier might be corrupted")]
    IntegrityFailure { level: Level },
    #[error("frame written at {level} reads back as a different frame at {shadowed_by}")]
    ShadowedFrame { level: Level, shadowed_by: Level },
    #[error("invalid level: {0}")]
    InvalidLevel(u8),
    #[error("pixel buffer holds {actual} samples, dimensions require {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },
    #[error("access up to subchannel {requested} is out of range, carrier has {available}")]
    OutOfRange { requested: usize, available: usize },
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StegoError>;
