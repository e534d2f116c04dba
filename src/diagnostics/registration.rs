use crate::diagnostics::TimingBreakdown;
use crate::matcher::LandmarkMatch;
use crate::types::PixelCoordinate;
use serde::Serialize;

/// Outcome of the search for one landmark.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkReport {
    pub index: usize,
    pub reference: PixelCoordinate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<LandmarkMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LandmarkReport {
    pub fn is_matched(&self) -> bool {
        self.found.is_some()
    }
}

/// Per-document trace produced alongside a [`DistortionModel`](crate::DistortionModel).
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReport {
    pub image_width: usize,
    pub image_height: usize,
    pub landmarks: Vec<LandmarkReport>,
    /// RMS distance between mapped reference landmarks and their matches.
    pub residual_rms_px: f64,
    pub timings: TimingBreakdown,
}

impl RegistrationReport {
    pub fn matched_count(&self) -> usize {
        self.landmarks.iter().filter(|l| l.is_matched()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.landmarks.len() - self.matched_count()
    }
}
