//! Frame data types.
//!
//! A frame is a packed 8-bit, 3-channel image plus zero or more regions of
//! interest, each optionally carrying a binary mask.

use crate::error::{Error, Result};

/// Channel order of a frame's pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorFormat {
    #[default]
    Rgb,
    Bgr,
}

/// Binary pixel mask. Any non-zero byte marks the pixel as set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationMask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl SegmentationMask {
    /// Creates an all-zero mask.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Sets every pixel of the rectangle, clipped to the mask bounds.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for row in y.min(y_end)..y_end {
            let start = (row * self.width + x.min(x_end)) as usize;
            let end = (row * self.width + x_end) as usize;
            self.data[start..end].fill(1);
        }
    }

    /// Checks that `data` holds exactly one byte per pixel.
    pub fn validate(&self) -> Result<()> {
        let expected = self.width as usize * self.height as usize;
        if self.data.len() != expected {
            return Err(Error::InvalidFrame(format!(
                "expected {} mask bytes for {}x{}, got {}",
                expected,
                self.width,
                self.height,
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Whether the pixel is part of the mask. Positions past the end of
    /// `data` read as unset.
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        let i = y as usize * self.width as usize + x as usize;
        self.data.get(i).is_some_and(|&b| b != 0)
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&b| b != 0).count()
    }
}

/// An annotated sub-area of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOfInterest {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Class labels attached to the region.
    pub classes: Vec<String>,
    pub mask: Option<SegmentationMask>,
}

impl RegionOfInterest {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            classes: Vec::new(),
            mask: None,
        }
    }

    pub fn with_mask(mut self, mask: SegmentationMask) -> Self {
        self.mask = Some(mask);
        self
    }
}

/// One unit of a video stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub color_format: ColorFormat,
    /// Row-major pixel data, 3 bytes per pixel.
    pub pixels: Vec<u8>,
    pub rois: Vec<RegionOfInterest>,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    /// Creates a frame filled with a single color.
    pub fn solid(width: u32, height: u32, color: [u8; 3], color_format: ColorFormat) -> Self {
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * Self::CHANNELS)
            .collect();
        Self {
            width,
            height,
            color_format,
            pixels,
            rois: Vec::new(),
        }
    }

    /// Checks that the pixel buffer matches the declared dimensions.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidFrame(format!(
                "zero-sized frame {}x{}",
                self.width, self.height
            )));
        }
        let expected = self.width as usize * self.height as usize * Self::CHANNELS;
        if self.pixels.len() != expected {
            return Err(Error::InvalidFrame(format!(
                "expected {} bytes for {}x{}, got {}",
                expected,
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        Ok(())
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * Self::CHANNELS
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = self.offset(x, y);
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        let i = self.offset(x, y);
        self.pixels[i..i + Self::CHANNELS].copy_from_slice(&color);
    }

    /// Fills a rectangle given in signed coordinates, clipped to the frame.
    ///
    /// Parts of the rectangle outside the frame are ignored, so a box moving
    /// past an edge is drawn partially.
    pub fn fill_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: [u8; 3]) {
        let x0 = x.clamp(0, self.width as i64) as u32;
        let y0 = y.clamp(0, self.height as i64) as u32;
        let x1 = (x + w).clamp(0, self.width as i64) as u32;
        let y1 = (y + h).clamp(0, self.height as i64) as u32;
        for row in y0..y1 {
            for col in x0..x1 {
                self.set_pixel(col, row, color);
            }
        }
    }

    /// Paints every pixel set in `mask` with `color`.
    ///
    /// The mask is applied in frame coordinates; pixels outside either
    /// buffer are skipped.
    pub fn apply_mask_color(&mut self, mask: &SegmentationMask, color: [u8; 3]) {
        let w = mask.width.min(self.width);
        let h = mask.height.min(self.height);
        for y in 0..h {
            for x in 0..w {
                if mask.is_set(x, y) {
                    self.set_pixel(x, y, color);
                }
            }
        }
    }

    /// Returns the pixels in RGB order, converting from BGR when needed.
    pub fn to_rgb(&self) -> Vec<u8> {
        match self.color_format {
            ColorFormat::Rgb => self.pixels.clone(),
            ColorFormat::Bgr => self
                .pixels
                .chunks_exact(Self::CHANNELS)
                .flat_map(|p| [p[2], p[1], p[0]])
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_frame() {
        let frame = Frame::solid(4, 2, [255, 0, 0], ColorFormat::Rgb);
        assert_eq!(frame.pixels.len(), 24);
        assert_eq!(frame.pixel(3, 1), [255, 0, 0]);
        assert!(frame.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_buffer() {
        let mut frame = Frame::solid(4, 2, [0, 0, 0], ColorFormat::Rgb);
        frame.pixels.truncate(10);
        assert!(matches!(frame.validate(), Err(Error::InvalidFrame(_))));

        let empty = Frame::solid(0, 2, [0, 0, 0], ColorFormat::Rgb);
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut frame = Frame::solid(10, 10, [0, 0, 0], ColorFormat::Rgb);
        frame.fill_rect(8, -2, 5, 4, [9, 9, 9]);

        assert_eq!(frame.pixel(8, 0), [9, 9, 9]);
        assert_eq!(frame.pixel(9, 1), [9, 9, 9]);
        assert_eq!(frame.pixel(9, 2), [0, 0, 0]);
        assert_eq!(frame.pixel(7, 0), [0, 0, 0]);
    }

    #[test]
    fn test_mask_fill_and_apply() {
        let mut mask = SegmentationMask::empty(6, 6);
        mask.fill_rect(1, 2, 3, 2);
        assert_eq!(mask.count(), 6);
        assert!(mask.is_set(1, 2));
        assert!(!mask.is_set(4, 2));

        let mut frame = Frame::solid(6, 6, [0, 0, 0], ColorFormat::Rgb);
        frame.apply_mask_color(&mask, [100, 100, 100]);
        assert_eq!(frame.pixel(3, 3), [100, 100, 100]);
        assert_eq!(frame.pixel(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_mask_with_short_data() {
        let mask = SegmentationMask {
            width: 400,
            height: 300,
            data: vec![1; 10],
        };
        assert!(matches!(mask.validate(), Err(Error::InvalidFrame(_))));
        assert!(mask.is_set(9, 0));
        assert!(!mask.is_set(10, 0));
        assert!(!mask.is_set(399, 299));
        assert!(SegmentationMask::empty(4, 4).validate().is_ok());
    }

    #[test]
    fn test_bgr_to_rgb() {
        let frame = Frame::solid(1, 1, [1, 2, 3], ColorFormat::Bgr);
        assert_eq!(frame.to_rgb(), vec![3, 2, 1]);
    }
}
