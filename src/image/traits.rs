//! Read-only image access shared by grayscale views, owned buffers and
//! binary patches.

/// Row-major single-channel image.
pub trait ImageView {
    type Pixel: Copy;

    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn stride(&self) -> usize;

    fn row(&self, y: usize) -> &[Self::Pixel];

    fn rows(&self) -> Rows<'_, Self>
    where
        Self: Sized,
    {
        Rows { image: self, y: 0 }
    }

    fn as_slice(&self) -> Option<&[Self::Pixel]> {
        None
    }
}

/// Statistics over 8-bit views used by the box classifiers.
pub trait GrayStats: ImageView<Pixel = u8> + Sized {
    /// Share of pixels strictly darker than `threshold`, in `[0, 1]`.
    fn fraction_below(&self, threshold: u8) -> f32 {
        let total = self.width() * self.height();
        if total == 0 {
            return 0.0;
        }
        let dark: usize = self
            .rows()
            .map(|row| row.iter().filter(|&&v| v < threshold).count())
            .sum();
        dark as f32 / total as f32
    }
}

impl<T: ImageView<Pixel = u8> + Sized> GrayStats for T {}

pub struct Rows<'a, I: ?Sized + ImageView> {
    image: &'a I,
    y: usize,
}

impl<'a, I: ImageView> Iterator for Rows<'a, I> {
    type Item = &'a [I::Pixel];

    fn next(&mut self) -> Option<Self::Item> {
        if self.y >= self.image.height() {
            return None;
        }
        let y = self.y;
        self.y += 1;
        Some(self.image.row(y))
    }
}
