//! Exhaustive windowed template search for a single landmark.
//!
//! # Algorithm
//! For every offset `(dx, dy)` with `|dx|, |dy| <= S` the candidate centre is
//! `nominal + (dx, dy)`. Its `(2r+1)²` neighbourhood is binarised with the
//! mask's threshold and compared cell by cell with the mask; the score is the
//! Frobenius norm of the difference. Offsets are visited row-major (`dy`
//! outer, `dx` inner) and a candidate replaces the current best only when it
//! scores strictly lower, so ties resolve to the earliest offset in scan
//! order.
//!
//! Binarisation is per pixel, so the whole `(2(S+r)+1)²` search region is
//! binarised once and every candidate window is read from it. The scores are
//! identical to binarising each window separately.
use crate::error::Result;
use crate::image::binary::{binarize_window, frobenius_distance};
use crate::image::ImageU8;
use crate::reference::ReferenceMask;
use crate::types::PixelCoordinate;
use log::debug;
use serde::{Deserialize, Serialize};

/// Default half-size of the search grid; `(2·25+1)² = 2601` candidates.
pub const DEFAULT_SEARCH_RADIUS: usize = 25;

/// Best candidate found for one landmark.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkMatch {
    /// Matched position in target space.
    pub coordinate: PixelCoordinate,
    /// Winning offset relative to the nominal (reference) position.
    pub offset: (i64, i64),
    /// Cells of the binarised window disagreeing with the mask.
    pub mismatches: u32,
    /// Frobenius norm of `window - mask`.
    pub distance: f64,
}

/// Windowed template matcher; stateless apart from its search radius.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkMatcher {
    pub search_radius: usize,
}

impl Default for LandmarkMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_RADIUS)
    }
}

impl LandmarkMatcher {
    pub fn new(search_radius: usize) -> Self {
        Self { search_radius }
    }

    /// Finds the target position whose neighbourhood best matches `mask`,
    /// searching around the mask's reference coordinate.
    ///
    /// Fails with `OutOfBounds` when any candidate window would leave the
    /// target image.
    pub fn locate(&self, target: &ImageU8<'_>, mask: &ReferenceMask) -> Result<LandmarkMatch> {
        self.locate_around(target, mask, mask.landmark())
    }

    /// Like [`locate`](Self::locate) with an explicit search centre.
    pub fn locate_around(
        &self,
        target: &ImageU8<'_>,
        mask: &ReferenceMask,
        nominal: PixelCoordinate,
    ) -> Result<LandmarkMatch> {
        let s = self.search_radius;
        let r = mask.radius();
        // The union of all candidate windows is one square of radius S + r.
        let region = binarize_window(target, nominal, s + r, mask.threshold())?;
        let template = mask.patch();

        let mut best = (u32::MAX, s, s);
        'scan: for oy in 0..=2 * s {
            for ox in 0..=2 * s {
                let score = region.mismatches_at(ox, oy, template);
                if score < best.0 {
                    best = (score, ox, oy);
                    if score == 0 {
                        // Nothing can beat an exact match under strict `<`.
                        break 'scan;
                    }
                }
            }
        }
        let (score, ox, oy) = best;
        let found = self.finish(nominal, score, ox, oy);
        debug!(
            "LandmarkMatcher::locate nominal={} -> {} offset=({}, {}) mismatches={}",
            nominal, found.coordinate, found.offset.0, found.offset.1, score
        );
        Ok(found)
    }

    fn finish(&self, nominal: PixelCoordinate, score: u32, ox: usize, oy: usize) -> LandmarkMatch {
        let dx = ox as i64 - self.search_radius as i64;
        let dy = oy as i64 - self.search_radius as i64;
        // Bounds were validated for the whole region, so the shift stays
        // non-negative.
        let coordinate = PixelCoordinate::new(
            (nominal.x() as i64 + dx) as usize,
            (nominal.y() as i64 + dy) as usize,
        );
        LandmarkMatch {
            coordinate,
            offset: (dx, dy),
            mismatches: score,
            distance: frobenius_distance(score),
        }
    }
}
