//! Annotated RGB copies of a sheet for visual inspection.
//!
//! Matched landmarks are drawn as a small dot with a bounding square; filled
//! boxes as a square only. Shapes are clipped at the image border.
use super::ImageU8;
use crate::types::PixelCoordinate;
use image::{Rgb, RgbImage};

const RED: Rgb<u8> = Rgb([255, 0, 0]);
/// Stroke width of every square outline.
pub const BOX_LINE_WIDTH: usize = 2;
/// Radius of the dot drawn on a labelled point, excluding the point itself.
pub const DOT_RADIUS: usize = 1;
/// Half-size of the square drawn around a matched landmark.
pub const POINT_LABEL_RADIUS: usize = 20;
/// Half-size of the square drawn around a filled box.
pub const BOX_LABEL_RADIUS: usize = 30;

pub fn to_rgb(gray: &ImageU8<'_>) -> RgbImage {
    let mut out = RgbImage::new(gray.w as u32, gray.h as u32);
    for y in 0..gray.h {
        for x in 0..gray.w {
            let v = gray.get(x, y);
            out.put_pixel(x as u32, y as u32, Rgb([v, v, v]));
        }
    }
    out
}

/// Draws a dot and a square of half-size `radius` around every point.
pub fn label_points(image: &mut RgbImage, points: &[PixelCoordinate], radius: usize) {
    for p in points {
        let (cx, cy) = (p.x() as i64, p.y() as i64);
        let d = DOT_RADIUS as i64;
        fill_rect(image, cx - d, cy - d, cx + d, cy + d);
        outline_square(image, cx, cy, radius as i64);
    }
}

/// Draws a square of half-size `radius` around every centre.
pub fn label_areas(image: &mut RgbImage, centers: &[PixelCoordinate], radius: usize) {
    for c in centers {
        outline_square(image, c.x() as i64, c.y() as i64, radius as i64);
    }
}

fn outline_square(image: &mut RgbImage, cx: i64, cy: i64, r: i64) {
    let (x0, y0, x1, y1) = (cx - r, cy - r, cx + r, cy + r);
    // The stroke grows inwards from the outer edge.
    let lw = BOX_LINE_WIDTH as i64 - 1;
    fill_rect(image, x0, y0, x1, y0 + lw);
    fill_rect(image, x0, y1 - lw, x1, y1);
    fill_rect(image, x0, y0, x0 + lw, y1);
    fill_rect(image, x1 - lw, y0, x1, y1);
}

/// Fills the inclusive rectangle `[x0, x1] × [y0, y1]`, clipped to the image.
fn fill_rect(image: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64) {
    let w = image.width() as i64;
    let h = image.height() as i64;
    let (x0, y0) = (x0.max(0), y0.max(0));
    let (x1, y1) = (x1.min(w - 1), y1.min(h - 1));
    for y in y0..=y1 {
        for x in x0..=x1 {
            image.put_pixel(x as u32, y as u32, RED);
        }
    }
}
