use crate::error::{Result, TintcamError};
use image::GrayImage;

/// Number of bytes per BGR pixel
pub const BGR_BYTES_PER_PIXEL: usize = 3;

/// A single captured video frame in BGR24 layout (B,G,R byte order, the
/// capture device's native convention).
///
/// The render loop owns a frame exclusively for one iteration; frames are
/// never retained across iterations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Create a black frame of the given dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * BGR_BYTES_PER_PIXEL],
        }
    }

    /// Create a frame from raw BGR24 bytes, validating the buffer size
    pub fn from_bgr_data(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * BGR_BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(TintcamError::frame(format!(
                "BGR buffer size mismatch: expected {} bytes for {}x{}, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw BGR24 pixel bytes, row-major
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The (b, g, r) channel values at a pixel coordinate
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let idx = (y as usize * self.width as usize + x as usize) * BGR_BYTES_PER_PIXEL;
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, bgr: (u8, u8, u8)) {
        let idx = (y as usize * self.width as usize + x as usize) * BGR_BYTES_PER_PIXEL;
        self.data[idx] = bgr.0;
        self.data[idx + 1] = bgr.1;
        self.data[idx + 2] = bgr.2;
    }

    /// Convert to an 8-bit grayscale image using BT.601 luma weights,
    /// matching the capture pipeline's BGR-to-gray conversion.
    pub fn to_gray(&self) -> GrayImage {
        let mut gray = Vec::with_capacity(self.width as usize * self.height as usize);
        for px in self.data.chunks_exact(BGR_BYTES_PER_PIXEL) {
            let (b, g, r) = (px[0] as u32, px[1] as u32, px[2] as u32);
            let luma = (299 * r + 587 * g + 114 * b + 500) / 1000;
            gray.push(luma as u8);
        }
        // Buffer length is width*height by construction
        GrayImage::from_raw(self.width, self.height, gray)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }
}

/// Axis-aligned rectangle around a detected face, in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}
