//! Landmark matching and affine registration of scanned questionnaire sheets.
//!
//! A [`ReferenceLayout`] is built once from the master sheet: one binarised
//! mask per landmark and the grid of field centres. Every scanned document is
//! then registered independently. Each landmark is found by exhaustive
//! windowed template search, and an affine transform is fitted to the
//! matches by linear least squares. The resulting [`DistortionModel`] maps
//! reference coordinates, typically field centres, onto the document.

// Core registration pipeline
pub mod affine;
pub mod distortion;
pub mod error;
pub mod image;
pub mod matcher;
pub mod reference;
pub mod types;

// Downstream of registration
pub mod fields;
pub mod stats;

// Tooling
pub mod config;
pub mod diagnostics;

// --- High-level re-exports -------------------------------------------------

pub use crate::affine::{AffineFitter, AffineTransform, FitMethod, FitOptions};
pub use crate::distortion::{DistortionModel, LandmarkFailurePolicy, RegistrationParams};
pub use crate::error::{RegistrationError, Result};
pub use crate::matcher::{LandmarkMatch, LandmarkMatcher};
pub use crate::reference::{LayoutSpec, MaskOptions, ReferenceLayout, ReferenceMask};
pub use crate::types::{MatchedPair, PixelCoordinate};

pub use crate::diagnostics::{LandmarkReport, RegistrationReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use sheet_registration::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let reference = vec![255u8; 800 * 1100];
/// let scan = reference.clone();
/// let reference = ImageU8::new(800, 1100, &reference);
/// let scan = ImageU8::new(800, 1100, &scan);
///
/// let spec = LayoutSpec {
///     landmarks: vec![
///         PixelCoordinate::new(80, 80),
///         PixelCoordinate::new(720, 80),
///         PixelCoordinate::new(80, 1020),
///     ],
///     fields: vec![vec![PixelCoordinate::new(400, 300)]],
/// };
/// let layout = ReferenceLayout::build(&reference, &spec, &MaskOptions::default())?;
/// let model = DistortionModel::register(&scan, &layout, &RegistrationParams::default())?;
/// println!("field 0/0 at {}", model.map(layout.field_center(0, 0)?)?);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::ImageU8;
    pub use crate::{
        DistortionModel, LayoutSpec, MaskOptions, PixelCoordinate, ReferenceLayout,
        RegistrationParams,
    };
}
