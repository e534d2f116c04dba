//! Per-document registration against the shared reference layout.
//!
//! Overview
//! - Every landmark of the layout is searched independently on the target
//!   sheet. With the `parallel` feature the searches run on the rayon pool;
//!   results land in a vector indexed like the layout's landmarks.
//! - Failed landmarks are either dropped or abort the document, depending on
//!   [`LandmarkFailurePolicy`].
//! - The surviving pairs feed a single affine fit. The fit is the only
//!   synchronisation point. If it fails after landmarks were dropped, the
//!   error is [`RegistrationError::LandmarksDropped`] listing each one.
//! - The resulting [`DistortionModel`] is immutable and maps any reference
//!   coordinate (typically a field centre) onto the document.
use crate::affine::{AffineFitter, AffineTransform, FitOptions};
use crate::diagnostics::{elapsed_ms, LandmarkReport, RegistrationReport};
use crate::error::{RegistrationError, Result};
use crate::image::ImageU8;
use crate::matcher::{LandmarkMatch, LandmarkMatcher, DEFAULT_SEARCH_RADIUS};
use crate::reference::{ReferenceLayout, ReferenceMask};
use crate::types::{MatchedPair, PixelCoordinate};
use log::{debug, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// What to do when a landmark cannot be searched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkFailurePolicy {
    /// Drop the landmark and fit the rest (needs at least three survivors).
    #[default]
    Exclude,
    /// Fail the whole document on the first failing landmark.
    Abort,
}

/// Knobs for one document registration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationParams {
    /// Half-size of the per-landmark search grid in pixels.
    pub search_radius: usize,
    pub fit: FitOptions,
    pub on_landmark_failure: LandmarkFailurePolicy,
}

impl Default for RegistrationParams {
    fn default() -> Self {
        Self {
            search_radius: DEFAULT_SEARCH_RADIUS,
            fit: FitOptions::default(),
            on_landmark_failure: LandmarkFailurePolicy::Exclude,
        }
    }
}

/// Fitted reference→target transform for one document.
#[derive(Clone, Debug)]
pub struct DistortionModel {
    transform: AffineTransform,
    pairs: Vec<MatchedPair>,
    landmark_indices: Vec<usize>,
    report: RegistrationReport,
}

impl DistortionModel {
    /// Matches every landmark of `layout` on `target` and fits the transform.
    pub fn register(
        target: &ImageU8<'_>,
        layout: &ReferenceLayout,
        params: &RegistrationParams,
    ) -> Result<Self> {
        let t0 = Instant::now();
        let mut report = RegistrationReport {
            image_width: target.w,
            image_height: target.h,
            ..Default::default()
        };

        let matcher = LandmarkMatcher::new(params.search_radius);
        let t_match = Instant::now();
        let results = match_landmarks(&matcher, target, layout.landmarks());
        report.timings.record_since("match", t_match);

        let mut pairs = Vec::with_capacity(results.len());
        let mut landmark_indices = Vec::with_capacity(results.len());
        let mut dropped = Vec::new();
        for (index, (mask, result)) in layout.landmarks().iter().zip(results).enumerate() {
            let reference = mask.landmark();
            match result {
                Ok(found) => {
                    pairs.push(MatchedPair::new(reference, found.coordinate));
                    landmark_indices.push(index);
                    report.landmarks.push(LandmarkReport {
                        index,
                        reference,
                        found: Some(found),
                        error: None,
                    });
                }
                Err(err) => {
                    if params.on_landmark_failure == LandmarkFailurePolicy::Abort {
                        return Err(err.for_landmark(index));
                    }
                    warn!("DistortionModel::register dropping landmark {index} at {reference}: {err}");
                    report.landmarks.push(LandmarkReport {
                        index,
                        reference,
                        found: None,
                        error: Some(err.to_string()),
                    });
                    dropped.push((index, err));
                }
            }
        }

        let t_fit = Instant::now();
        let transform = AffineFitter::new(params.fit)
            .fit(&pairs)
            .map_err(|err| with_dropped(err, dropped))?;
        report.timings.record_since("fit", t_fit);
        report.residual_rms_px = transform.residual_rms(&pairs);
        report.timings.total_ms = elapsed_ms(t0);

        debug!(
            "DistortionModel::register {}x{} matched={}/{} rms={:.3}px A=[{:.5} {:.5}; {:.5} {:.5}] b=[{:.3} {:.3}] in {:.2} ms",
            target.w,
            target.h,
            pairs.len(),
            layout.landmarks().len(),
            report.residual_rms_px,
            transform.matrix[(0, 0)],
            transform.matrix[(0, 1)],
            transform.matrix[(1, 0)],
            transform.matrix[(1, 1)],
            transform.translation[0],
            transform.translation[1],
            report.timings.total_ms
        );

        Ok(Self {
            transform,
            pairs,
            landmark_indices,
            report,
        })
    }

    /// Builds a model from correspondences that are already known; landmark
    /// indices follow the order of `pairs`.
    pub fn from_pairs(pairs: Vec<MatchedPair>, fit: &FitOptions) -> Result<Self> {
        let t0 = Instant::now();
        let transform = AffineFitter::new(*fit).fit(&pairs)?;
        let mut report = RegistrationReport {
            residual_rms_px: transform.residual_rms(&pairs),
            landmarks: pairs
                .iter()
                .enumerate()
                .map(|(index, pair)| LandmarkReport {
                    index,
                    reference: pair.reference,
                    found: Some(LandmarkMatch {
                        coordinate: pair.target,
                        offset: (
                            pair.target.x() as i64 - pair.reference.x() as i64,
                            pair.target.y() as i64 - pair.reference.y() as i64,
                        ),
                        mismatches: 0,
                        distance: 0.0,
                    }),
                    error: None,
                })
                .collect(),
            ..Default::default()
        };
        report.timings.record_since("fit", t0);
        report.timings.total_ms = elapsed_ms(t0);
        let landmark_indices = (0..pairs.len()).collect();
        Ok(Self {
            transform,
            pairs,
            landmark_indices,
            report,
        })
    }

    /// Target-space positions of the matched landmarks, in layout order.
    pub fn matched_points(&self) -> Vec<PixelCoordinate> {
        self.pairs.iter().map(|p| p.target).collect()
    }

    /// Maps a reference coordinate onto this document, rounded to the
    /// nearest pixel.
    pub fn map(&self, reference: PixelCoordinate) -> Result<PixelCoordinate> {
        reference.transform(&self.transform)
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn pairs(&self) -> &[MatchedPair] {
        &self.pairs
    }

    /// `landmark_indices()[i]` is the layout landmark that produced `pairs()[i]`.
    pub fn landmark_indices(&self) -> &[usize] {
        &self.landmark_indices
    }

    pub fn report(&self) -> &RegistrationReport {
        &self.report
    }
}

/// Attaches the dropped landmarks to a fit failure so callers can see which
/// landmarks were lost and why.
fn with_dropped(err: RegistrationError, dropped: Vec<(usize, RegistrationError)>) -> RegistrationError {
    if dropped.is_empty() {
        return err;
    }
    RegistrationError::LandmarksDropped {
        source: Box::new(err),
        dropped,
    }
}

fn match_landmarks(
    matcher: &LandmarkMatcher,
    target: &ImageU8<'_>,
    masks: &[ReferenceMask],
) -> Vec<Result<LandmarkMatch>> {
    #[cfg(feature = "parallel")]
    {
        masks
            .par_iter()
            .map(|mask| matcher.locate(target, mask))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        masks
            .iter()
            .map(|mask| matcher.locate(target, mask))
            .collect()
    }
}
