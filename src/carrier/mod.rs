use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use log::{debug, info};
use rand::Rng;
use rayon::prelude::*;

use crate::chunker;
use crate::config::{Padding, StegoConfig, COLOR_CHANNELS};
use crate::error::{Result, StegoError};
use crate::level::address::locate;
use crate::level::Level;

/// An 8-bit pixel buffer of `height` rows, `width` columns and `channels`
/// interleaved samples per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carrier {
    width: usize,
    height: usize,
    channels: usize,
    samples: Vec<u8>,
}

impl Carrier {
    /// Wrap a raw interleaved sample buffer.
    pub fn from_raw(
        width: usize,
        height: usize,
        channels: usize,
        samples: Vec<u8>,
    ) -> Result<Self> {
        if channels < COLOR_CHANNELS {
            return Err(StegoError::UnsupportedCarrier { channels });
        }
        let expected = width * height * channels;
        if samples.len() != expected {
            return Err(StegoError::BufferSizeMismatch {
                expected,
                actual: samples.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// Decode an image file into a carrier.
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)?;
        Self::from_image(image)
    }

    /// Convert a decoded image into 8-bit RGB, or RGBA when it has alpha.
    pub fn from_image(image: DynamicImage) -> Result<Self> {
        let color = image.color();
        let channels = usize::from(color.channel_count());
        if channels < COLOR_CHANNELS {
            return Err(StegoError::UnsupportedCarrier { channels });
        }

        let (width, height) = (image.width() as usize, image.height() as usize);
        if color.has_alpha() {
            Self::from_raw(width, height, 4, image.into_rgba8().into_raw())
        } else {
            Self::from_raw(width, height, 3, image.into_rgb8().into_raw())
        }
    }

    pub fn to_image(&self) -> Result<DynamicImage> {
        let (width, height) = (self.width as u32, self.height as u32);
        let samples = self.samples.clone();
        let image = match self.channels {
            3 => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(width, height, samples).map(DynamicImage::ImageRgba8),
            _ => None,
        };
        image.ok_or(StegoError::UnsupportedCarrier {
            channels: self.channels,
        })
    }

    /// Write the carrier as PNG. Any other extension on `path` is replaced
    /// with `.png`; the path actually written is returned.
    pub fn save(&self, path: &Path) -> Result<PathBuf> {
        let path = with_png_extension(path);
        self.to_image()?.save_with_format(&path, ImageFormat::Png)?;
        info!("carrier written to {}", path.display());
        Ok(path)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn pixels(&self) -> usize {
        self.width * self.height
    }

    /// Number of addressable color subchannels (alpha excluded).
    pub fn subchannels(&self) -> usize {
        self.pixels() * COLOR_CHANNELS
    }

    /// Bytes a frame may occupy at `level`.
    pub fn capacity_bytes(&self, level: Level) -> usize {
        self.subchannels() * level.params().bits_per_subchannel as usize / 8
    }

    /// Sample buffer index of the subchannel at `cursor`.
    fn sample_index(&self, cursor: usize) -> usize {
        let address = locate(cursor, self.width);
        (address.row * self.width + address.col) * self.channels + address.channel
    }

    /// Fail unless bytes `[start, start + count)` map inside the buffer.
    fn check_span(&self, start: usize, count: usize, level: Level) -> Result<()> {
        let per_byte = level.params().subchannels_per_byte;
        let available = self.subchannels();
        let end = start
            .checked_add(count)
            .and_then(|end| end.checked_mul(per_byte))
            .ok_or(StegoError::OutOfRange {
                requested: usize::MAX,
                available,
            })?;
        if end > available {
            return Err(StegoError::OutOfRange {
                requested: end,
                available,
            });
        }
        Ok(())
    }

    /// Decode `count` frame bytes starting at frame byte `start`. Pure: the
    /// result depends only on the sample buffer and the arguments.
    pub fn read_range(&self, start: usize, count: usize, level: Level) -> Result<Vec<u8>> {
        self.check_span(start, count, level)?;

        let params = level.params();
        let per_byte = params.subchannels_per_byte;
        let bytes = (start..start + count)
            .map(|byte| {
                let first = byte * per_byte;
                let samples = (first..first + per_byte)
                    .map(|cursor| self.samples[self.sample_index(cursor)]);
                params.decode_byte(samples)
            })
            .collect();

        Ok(bytes)
    }

    /// Open a sequential reader at cursor 0.
    pub fn reader(&self, level: Level, cfg: &StegoConfig) -> CarrierReader<'_> {
        CarrierReader {
            carrier: self,
            level,
            position: 0,
            parallel_threshold: cfg.parallel_threshold,
            workers: cfg.worker_count(),
        }
    }

    /// Write a whole frame from cursor 0.
    pub fn write_bytes(&mut self, bytes: &[u8], level: Level, padding: Padding) -> Result<()> {
        self.write_bytes_with_rng(bytes, level, padding, &mut rand::thread_rng())
    }

    /// [`Carrier::write_bytes`] with an explicit noise source. Nothing is
    /// modified if the frame does not fit.
    pub fn write_bytes_with_rng<R: Rng + ?Sized>(
        &mut self,
        bytes: &[u8],
        level: Level,
        padding: Padding,
        rng: &mut R,
    ) -> Result<()> {
        let available = self.capacity_bytes(level);
        if bytes.len() > available {
            return Err(StegoError::PayloadTooLarge {
                required: bytes.len(),
                available,
            });
        }

        let params = level.params();
        let used = bytes.len() * params.subchannels_per_byte;

        if padding == Padding::RandomNoise {
            for cursor in used..self.subchannels() {
                let idx = self.sample_index(cursor);
                self.samples[idx] = params.embed(self.samples[idx], rng.gen::<u8>());
            }
            debug!("noise written to {} padding subchannels", self.subchannels() - used);
        }

        for (i, &byte) in bytes.iter().enumerate() {
            let first = i * params.subchannels_per_byte;
            for (j, chunk) in params.encode_byte(byte).enumerate() {
                let idx = self.sample_index(first + j);
                self.samples[idx] = params.embed(self.samples[idx], chunk);
            }
        }

        debug!("{} bytes written at {} across {} subchannels", bytes.len(), level, used);
        Ok(())
    }
}

/// Sequential reader over a carrier at a fixed level. Holds its own cursor;
/// the carrier itself is never mutated by reads.
pub struct CarrierReader<'a> {
    carrier: &'a Carrier,
    level: Level,
    position: usize,
    parallel_threshold: usize,
    workers: usize,
}

impl CarrierReader<'_> {
    pub fn level(&self) -> Level {
        self.level
    }

    /// Current cursor, in frame bytes.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Read `count` bytes at the cursor and advance it. Reads longer than the
    /// parallel threshold are split across the rayon pool.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let bytes = if count > self.parallel_threshold && self.workers > 1 {
            self.read_parallel(count)?
        } else {
            self.carrier.read_range(self.position, count, self.level)?
        };
        self.position += count;
        Ok(bytes)
    }

    /// Read exactly `N` bytes at the cursor.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&bytes);
        Ok(out)
    }

    fn read_parallel(&self, count: usize) -> Result<Vec<u8>> {
        self.carrier.check_span(self.position, count, self.level)?;

        let ranges = chunker::plan_ranges(self.position, count, self.workers);
        debug!(
            "reading {} bytes at {} in {} parallel ranges",
            count,
            self.level,
            ranges.len()
        );

        let parts: Vec<Vec<u8>> = ranges
            .par_iter()
            .map(|range| self.carrier.read_range(range.start, range.len(), self.level))
            .collect::<Result<_>>()?;

        Ok(parts.concat())
    }
}

/// Force a `.png` extension, replacing any other one.
pub fn with_png_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => path.to_path_buf(),
        _ => path.with_extension("png"),
    }
}
