pub mod carrier;
mod chunker;
pub mod config;
pub mod detect;
pub mod error;
pub mod frame;
mod integrity;
pub mod level;
pub mod payload;
pub mod pipeline;

pub use carrier::Carrier;
pub use config::{FilenameCheck, Padding, StegoConfig};
pub use error::StegoError;
pub use level::Level;
pub use payload::Payload;
pub use pipeline::decode::decode_file;
pub use pipeline::encode::encode_file;
pub use pipeline::{embed, extract, CapacityReport};
