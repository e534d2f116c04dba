//! Threshold binarisation shared by reference masks and candidate windows.
//!
//! A cell becomes [`BLACK`] when the source value is strictly below the
//! threshold and [`WHITE`] otherwise. Masks and search windows must go
//! through the same function, otherwise matching scores drift silently.
use super::traits::ImageView;
use super::u8::ImageU8;
use crate::error::Result;
use crate::types::PixelCoordinate;

pub const BLACK: u8 = 0;
pub const WHITE: u8 = 255;

/// Default grayscale threshold on the 0..=255 scale.
pub const DEFAULT_THRESHOLD: u8 = 200;

#[inline]
pub fn binarize_value(value: u8, threshold: u8) -> u8 {
    if value < threshold {
        BLACK
    } else {
        WHITE
    }
}

/// Owned binary image whose cells are either [`BLACK`] or [`WHITE`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryPatch {
    w: usize,
    h: usize,
    cells: Vec<u8>,
}

impl BinaryPatch {
    /// Binarises every pixel of `view`.
    pub fn from_view<V: ImageView<Pixel = u8>>(view: &V, threshold: u8) -> Self {
        let (w, h) = (view.width(), view.height());
        let mut cells = Vec::with_capacity(w * h);
        for y in 0..h {
            cells.extend(view.row(y).iter().map(|&v| binarize_value(v, threshold)));
        }
        Self { w, h, cells }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[y * self.w + x]
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn black_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == BLACK).count()
    }

    /// Number of cells at which `self` and the `other.w × other.h` block of
    /// `self` starting at `(x0, y0)` disagree.
    ///
    /// Used to score a mask against a sub-window of a larger binarised
    /// search region without copying the window.
    pub fn mismatches_at(&self, x0: usize, y0: usize, other: &BinaryPatch) -> u32 {
        let mut count = 0u32;
        for y in 0..other.h {
            let start = (y0 + y) * self.w + x0;
            let ours = &self.cells[start..start + other.w];
            let theirs = &other.cells[y * other.w..(y + 1) * other.w];
            count += ours
                .iter()
                .zip(theirs)
                .filter(|(a, b)| a != b)
                .count() as u32;
        }
        count
    }
}

impl ImageView for BinaryPatch {
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
        self.w
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        &self.cells[y * self.w..(y + 1) * self.w]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[u8]> {
        Some(&self.cells)
    }
}

/// Binarises the `(2·radius+1)²` square around `center`.
pub fn binarize_window(
    image: &ImageU8<'_>,
    center: PixelCoordinate,
    radius: usize,
    threshold: u8,
) -> Result<BinaryPatch> {
    let window = image.window(center, radius)?;
    Ok(BinaryPatch::from_view(&window, threshold))
}

/// Frobenius norm of the difference of two binary patches that disagree in
/// `mismatches` cells.
#[inline]
pub fn frobenius_distance(mismatches: u32) -> f64 {
    (WHITE - BLACK) as f64 * (mismatches as f64).sqrt()
}
