// Core value types shared across the crate.

use ndarray::Array3;

use crate::color;

/// A color triple in the channel order of the canvas mode.
/// Values are floats so shades can mix outside 0-255 before clamping.
pub type Color = (f64, f64, f64);

/// How the three channels of the pixel buffer are to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Rgb,
    Hsv,
    Lab,
}

/// The finalized raster a render hands across the image boundary.
/// `data` is (height, width, 3) float channels tagged by `mode`; conversion
/// to displayable bytes happens on the way out, never in place.
pub struct PixelBuffer {
    pub width: usize,
    pub height: usize,
    pub mode: ColorMode,
    pub data: Array3<f64>,
}

impl PixelBuffer {
    /// Channel triple at pixel (x, y).
    pub fn pixel(&self, x: usize, y: usize) -> Color {
        (
            self.data[[y, x, 0]],
            self.data[[y, x, 1]],
            self.data[[y, x, 2]],
        )
    }

    /// Flatten to 8-bit RGB rows, applying the mode conversion per pixel.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width * self.height * 3);
        for y in 0..self.height {
            for x in 0..self.width {
                let [r, g, b] = color::to_rgb8(self.pixel(x, y), self.mode);
                out.push(r);
                out.push(g);
                out.push(b);
            }
        }
        out
    }

    /// Pack each pixel as 0x00RRGGBB for minifb.
    pub fn to_argb(&self) -> Vec<u32> {
        self.to_rgb8()
            .chunks_exact(3)
            .map(|px| ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argb_packing_matches_channel_order() {
        let data = Array3::from_shape_fn((1, 1, 3), |(_, _, c)| match c {
            0 => 255.0,
            1 => 128.0,
            _ => 0.0,
        });
        let buffer = PixelBuffer {
            width: 1,
            height: 1,
            mode: ColorMode::Rgb,
            data,
        };
        assert_eq!(buffer.to_argb(), vec![0x00FF8000]);
    }

    #[test]
    fn rgb8_rows_are_row_major() {
        let data = Array3::from_shape_fn((2, 1, 3), |(y, _, _)| y as f64 * 10.0);
        let buffer = PixelBuffer {
            width: 1,
            height: 2,
            mode: ColorMode::Rgb,
            data,
        };
        assert_eq!(buffer.to_rgb8(), vec![0, 0, 0, 10, 10, 10]);
    }
}
