use crate::affine::AffineTransform;
use crate::error::{RegistrationError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer pixel position with non-negative components.
///
/// `x` runs horizontally and `y` vertically; buffers are indexed `[y][x]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelCoordinate {
    x: usize,
    y: usize,
}

impl PixelCoordinate {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Builds a coordinate from signed components, rejecting negative values.
    pub fn try_new(x: i64, y: i64) -> Result<Self> {
        if x < 0 || y < 0 {
            return Err(RegistrationError::NegativeCoordinate { x, y });
        }
        Ok(Self {
            x: x as usize,
            y: y as usize,
        })
    }

    #[inline]
    pub fn x(&self) -> usize {
        self.x
    }

    #[inline]
    pub fn y(&self) -> usize {
        self.y
    }

    /// Shifts the coordinate by a signed offset.
    pub fn offset(&self, dx: i64, dy: i64) -> Result<Self> {
        Self::try_new(self.x as i64 + dx, self.y as i64 + dy)
    }

    /// Applies `A·p + b` and snaps each component to the nearest integer.
    ///
    /// Halfway values round to even, so `2.5 -> 2` and `3.5 -> 4`.
    pub fn transform(&self, transform: &AffineTransform) -> Result<Self> {
        let mapped = transform.apply([self.x as f64, self.y as f64]);
        if !mapped.iter().all(|v| v.is_finite()) {
            return Err(RegistrationError::NonFiniteCoordinate {
                x: mapped[0],
                y: mapped[1],
            });
        }
        let x = mapped[0].round_ties_even();
        let y = mapped[1].round_ties_even();
        Self::try_new(x as i64, y as i64)
    }

    #[inline]
    pub fn to_f64(&self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }
}

impl fmt::Display for PixelCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One landmark correspondence: reference-layout position and the position
/// found on the target sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MatchedPair {
    pub reference: PixelCoordinate,
    pub target: PixelCoordinate,
}

impl MatchedPair {
    pub fn new(reference: PixelCoordinate, target: PixelCoordinate) -> Self {
        Self { reference, target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix2, Vector2};

    #[test]
    fn try_new_rejects_negative_components() {
        assert!(PixelCoordinate::try_new(3, 4).is_ok());
        assert_eq!(
            PixelCoordinate::try_new(-1, 4),
            Err(RegistrationError::NegativeCoordinate { x: -1, y: 4 })
        );
        assert!(PixelCoordinate::new(2, 2).offset(-3, 0).is_err());
    }

    #[test]
    fn transform_rounds_half_to_even() {
        let t = AffineTransform::new(Matrix2::identity(), Vector2::new(0.5, 1.5));
        let p = PixelCoordinate::new(2, 2).transform(&t).unwrap();
        assert_eq!(p, PixelCoordinate::new(2, 4));
    }

    #[test]
    fn negative_mapping_is_an_error() {
        let t = AffineTransform::new(Matrix2::identity(), Vector2::new(-10.0, 0.0));
        assert!(PixelCoordinate::new(3, 3).transform(&t).is_err());
    }

    #[test]
    fn non_finite_mapping_is_an_error() {
        let t = AffineTransform::new(Matrix2::new(f64::NAN, 0.0, 0.0, 1.0), Vector2::new(0.0, 2.0));
        assert!(matches!(
            PixelCoordinate::new(3, 3).transform(&t),
            Err(RegistrationError::NonFiniteCoordinate { y, .. }) if y == 5.0
        ));
        let t = AffineTransform::new(Matrix2::identity(), Vector2::new(f64::INFINITY, 0.0));
        assert!(PixelCoordinate::new(3, 3).transform(&t).is_err());
    }

    #[test]
    fn negative_coordinates_fail_to_deserialize() {
        let ok: PixelCoordinate = serde_json::from_str(r#"{"x": 4, "y": 9}"#).unwrap();
        assert_eq!(ok, PixelCoordinate::new(4, 9));
        assert!(serde_json::from_str::<PixelCoordinate>(r#"{"x": -4, "y": 9}"#).is_err());
    }
}
