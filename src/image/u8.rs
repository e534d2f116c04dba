use super::io::GrayImageU8;
use crate::error::{RegistrationError, Result};
use crate::types::PixelCoordinate;

/// Borrowed 8-bit grayscale view, row-major with an explicit stride.
#[derive(Clone, Copy, Debug)]
pub struct ImageU8<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize, // bytes between rows
    pub data: &'a [u8],
}

impl<'a> ImageU8<'a> {
    /// Tightly packed view over `data` (`stride == w`).
    pub fn new(w: usize, h: usize, data: &'a [u8]) -> Self {
        debug_assert!(data.len() >= w * h, "buffer shorter than {w}x{h}");
        Self {
            w,
            h,
            stride: w,
            data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    /// Checks that the `(2·radius+1)²` square centred on `(cx, cy)` lies
    /// fully inside the image.
    pub fn check_window(&self, cx: i64, cy: i64, radius: usize) -> Result<()> {
        let r = radius as i64;
        let inside = cx - r >= 0
            && cy - r >= 0
            && cx + r < self.w as i64
            && cy + r < self.h as i64;
        if inside {
            Ok(())
        } else {
            Err(RegistrationError::OutOfBounds {
                x: cx,
                y: cy,
                radius,
                width: self.w,
                height: self.h,
            })
        }
    }

    /// Sub-view of the square window around `center`; no copy.
    pub fn window(&self, center: PixelCoordinate, radius: usize) -> Result<ImageU8<'a>> {
        self.check_window(center.x() as i64, center.y() as i64, radius)?;
        let x0 = center.x() - radius;
        let y0 = center.y() - radius;
        let side = 2 * radius + 1;
        let start = y0 * self.stride + x0;
        let end = (y0 + side - 1) * self.stride + x0 + side;
        Ok(ImageU8 {
            w: side,
            h: side,
            stride: self.stride,
            data: &self.data[start..end],
        })
    }

    /// Copies the square window around `center` into an owned buffer.
    ///
    /// A radius of 10 gives a 21×21 crop.
    pub fn crop_square(&self, center: PixelCoordinate, radius: usize) -> Result<GrayImageU8> {
        let view = self.window(center, radius)?;
        let mut data = Vec::with_capacity(view.w * view.h);
        for y in 0..view.h {
            let start = y * view.stride;
            data.extend_from_slice(&view.data[start..start + view.w]);
        }
        Ok(GrayImageU8::new(view.w, view.h, data))
    }

    /// Like [`crop_square`](Self::crop_square), but pixels outside the image
    /// take the value `fill` instead of failing.
    pub fn crop_square_padded(&self, center: PixelCoordinate, radius: usize, fill: u8) -> GrayImageU8 {
        let side = 2 * radius + 1;
        let mut out = GrayImageU8::filled(side, side, fill);
        let x0 = center.x() as i64 - radius as i64;
        let y0 = center.y() as i64 - radius as i64;
        for dy in 0..side {
            let sy = y0 + dy as i64;
            if sy < 0 || sy >= self.h as i64 {
                continue;
            }
            for dx in 0..side {
                let sx = x0 + dx as i64;
                if sx >= 0 && sx < self.w as i64 {
                    out.set(dx, dy, self.get(sx as usize, sy as usize));
                }
            }
        }
        out
    }
}

impl<'a> crate::image::traits::ImageView for ImageU8<'a> {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[u8]> {
        (self.stride == self.w).then_some(&self.data[..self.w * self.h])
    }
}
