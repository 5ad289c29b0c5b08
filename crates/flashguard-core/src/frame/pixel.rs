//! Raw RGBA frames captured at the analysis resolution

use crate::error::AnalysisError;

/// Bytes per RGBA sample
pub const CHANNELS: usize = 4;

/// An immutable grid of 8-bit RGBA samples in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct PixelFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelFrame {
    /// Wrap an RGBA buffer
    ///
    /// # Errors
    /// `DimensionMismatch` when `data` is not exactly `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, AnalysisError> {
        let expected = width as usize * height as usize * CHANNELS;
        AnalysisError::check_len(expected, data.len())?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a frame where every pixel has the same RGBA value
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(pixel_count * CHANNELS)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// Frame width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels in the frame
    pub fn pixel_count(&self) -> usize {
        self.data.len() / CHANNELS
    }

    /// Raw RGBA bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterate over RGBA samples in row-major order
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(CHANNELS)
    }
}
