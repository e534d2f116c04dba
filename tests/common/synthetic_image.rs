use sheet_registration::image::GrayImageU8;
use sheet_registration::reference::LayoutSpec;
use sheet_registration::{AffineTransform, PixelCoordinate};

pub const PAPER: u8 = 245;
pub const INK: u8 = 15;
/// Half-size of a checkbox outline.
pub const BOX_RADIUS: usize = 12;

/// Synthetic questionnaire: four corner landmarks and a small checkbox grid.
pub struct SyntheticSheet {
    pub width: usize,
    pub height: usize,
    pub landmarks: Vec<PixelCoordinate>,
    pub fields: Vec<Vec<PixelCoordinate>>,
}

impl SyntheticSheet {
    pub fn standard() -> Self {
        let (width, height) = (640, 880);
        let landmarks = vec![
            PixelCoordinate::new(70, 70),
            PixelCoordinate::new(570, 70),
            PixelCoordinate::new(70, 810),
            PixelCoordinate::new(570, 810),
        ];
        let fields = (0..6)
            .map(|q| {
                (0..4)
                    .map(|o| PixelCoordinate::new(180 + 70 * o, 200 + 70 * q))
                    .collect()
            })
            .collect();
        Self {
            width,
            height,
            landmarks,
            fields,
        }
    }

    pub fn layout_spec(&self) -> LayoutSpec {
        LayoutSpec {
            landmarks: self.landmarks.clone(),
            fields: self.fields.clone(),
        }
    }

    /// Renders the sheet with the listed `(question, option)` boxes filled.
    pub fn render(&self, filled: &[(usize, usize)]) -> GrayImageU8 {
        let mut img = GrayImageU8::filled(self.width, self.height, PAPER);
        for &lm in &self.landmarks {
            draw_landmark(&mut img, lm.x(), lm.y());
        }
        for (q, row) in self.fields.iter().enumerate() {
            for (o, &c) in row.iter().enumerate() {
                draw_box(&mut img, c.x(), c.y(), filled.contains(&(q, o)));
            }
        }
        img
    }
}

fn fill(img: &mut GrayImageU8, x0: usize, y0: usize, x1: usize, y1: usize, value: u8) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            img.set(x, y, value);
        }
    }
}

/// Solid block with an off-centre hole and a tab; no symmetry axis.
fn draw_landmark(img: &mut GrayImageU8, cx: usize, cy: usize) {
    fill(img, cx - 8, cy - 8, cx + 8, cy + 8, INK);
    fill(img, cx - 3, cy - 5, cx + 1, cy - 1, PAPER);
    fill(img, cx + 9, cy + 4, cx + 12, cy + 8, INK);
}

fn draw_box(img: &mut GrayImageU8, cx: usize, cy: usize, filled: bool) {
    let r = BOX_RADIUS;
    if filled {
        fill(img, cx - r, cy - r, cx + r, cy + r, INK);
        return;
    }
    fill(img, cx - r, cy - r, cx + r, cy - r + 1, INK);
    fill(img, cx - r, cy + r - 1, cx + r, cy + r, INK);
    fill(img, cx - r, cy - r, cx - r + 1, cy + r, INK);
    fill(img, cx + r - 1, cy - r, cx + r, cy + r, INK);
}

/// Renders `transform(src)` by inverse nearest-neighbour mapping; pixels
/// that map outside `src` become paper.
pub fn warp_affine(
    src: &GrayImageU8,
    transform: &AffineTransform,
    width: usize,
    height: usize,
) -> GrayImageU8 {
    let inv = transform
        .matrix
        .try_inverse()
        .expect("warp transform must be invertible");
    let view = src.as_view();
    let mut out = GrayImageU8::filled(width, height, PAPER);
    for y in 0..height {
        for x in 0..width {
            let q = nalgebra::Vector2::new(x as f64, y as f64) - transform.translation;
            let p = inv * q;
            let (sx, sy) = (p[0].round(), p[1].round());
            if sx >= 0.0 && sy >= 0.0 && (sx as usize) < src.width() && (sy as usize) < src.height() {
                out.set(x, y, view.get(sx as usize, sy as usize));
            }
        }
    }
    out
}

/// Rotation by `degrees` about `(cx, cy)` followed by a shift.
pub fn rotation_about(degrees: f64, cx: f64, cy: f64, shift: [f64; 2]) -> AffineTransform {
    let (s, c) = degrees.to_radians().sin_cos();
    let matrix = nalgebra::Matrix2::new(c, -s, s, c);
    let center = nalgebra::Vector2::new(cx, cy);
    let translation = center - matrix * center + nalgebra::Vector2::new(shift[0], shift[1]);
    AffineTransform::new(matrix, translation)
}
