//! Reference layout: landmark masks and the grid of field centres.
//!
//! The layout is built once from the master sheet and then shared read-only
//! by every document registration. Landmark identity is the position in
//! [`ReferenceLayout::landmarks`]; nothing is keyed by coordinate value.
use crate::error::{RegistrationError, Result, MIN_LANDMARKS};
use crate::image::binary::{binarize_window, BinaryPatch, DEFAULT_THRESHOLD};
use crate::image::io::read_json_file;
use crate::image::ImageU8;
use crate::types::PixelCoordinate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options controlling mask precomputation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskOptions {
    /// Half-size of a mask excluding the centre; edge length is `2r+1`.
    pub mark_radius: usize,
    /// Binarisation threshold applied to masks and search windows alike.
    pub threshold: u8,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            mark_radius: 20,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Binarised neighbourhood of one landmark on the reference sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceMask {
    landmark: PixelCoordinate,
    radius: usize,
    threshold: u8,
    patch: BinaryPatch,
}

impl ReferenceMask {
    /// Crops and binarises the window around `landmark` on the reference.
    pub fn from_image(
        reference: &ImageU8<'_>,
        landmark: PixelCoordinate,
        options: &MaskOptions,
    ) -> Result<Self> {
        let patch = binarize_window(reference, landmark, options.mark_radius, options.threshold)?;
        Ok(Self {
            landmark,
            radius: options.mark_radius,
            threshold: options.threshold,
            patch,
        })
    }

    /// Position of the landmark in reference-layout space.
    pub fn landmark(&self) -> PixelCoordinate {
        self.landmark
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Edge length of the square patch.
    pub fn size(&self) -> usize {
        2 * self.radius + 1
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn patch(&self) -> &BinaryPatch {
        &self.patch
    }
}

/// Reference-space field centres indexed `[question][option]`, zero-based.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldGrid {
    questions: usize,
    options: usize,
    centers: Vec<PixelCoordinate>,
}

impl FieldGrid {
    /// Validates that the rows form a non-empty rectangle.
    pub fn from_rows(rows: Vec<Vec<PixelCoordinate>>) -> Result<Self> {
        let questions = rows.len();
        let options = rows.first().map_or(0, Vec::len);
        if questions == 0 || options == 0 {
            return Err(RegistrationError::InvalidLayout(
                "field grid is empty".to_string(),
            ));
        }
        if let Some((q, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != options) {
            return Err(RegistrationError::InvalidLayout(format!(
                "question {q} has {} options, expected {options}",
                row.len()
            )));
        }
        Ok(Self {
            questions,
            options,
            centers: rows.into_iter().flatten().collect(),
        })
    }

    pub fn questions(&self) -> usize {
        self.questions
    }

    pub fn options(&self) -> usize {
        self.options
    }

    pub fn center(&self, question: usize, option: usize) -> Result<PixelCoordinate> {
        if question >= self.questions || option >= self.options {
            return Err(RegistrationError::FieldIndex {
                question,
                option,
                questions: self.questions,
                options: self.options,
            });
        }
        Ok(self.centers[question * self.options + option])
    }

    /// Iterates `(question, option, centre)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, PixelCoordinate)> + '_ {
        self.centers
            .iter()
            .enumerate()
            .map(move |(i, &c)| (i / self.options, i % self.options, c))
    }
}

/// On-disk description of a layout, in reference pixel coordinates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub landmarks: Vec<PixelCoordinate>,
    /// `fields[question][option]`
    pub fields: Vec<Vec<PixelCoordinate>>,
}

impl LayoutSpec {
    pub fn load(path: &Path) -> std::result::Result<Self, String> {
        read_json_file(path)
    }
}

/// Landmark masks plus field grid, built once and shared read-only.
#[derive(Clone, Debug)]
pub struct ReferenceLayout {
    landmarks: Vec<ReferenceMask>,
    fields: FieldGrid,
}

impl ReferenceLayout {
    /// Precomputes one mask per landmark from the grayscale reference sheet.
    pub fn build(
        reference: &ImageU8<'_>,
        spec: &LayoutSpec,
        options: &MaskOptions,
    ) -> Result<Self> {
        if spec.landmarks.len() < MIN_LANDMARKS {
            return Err(RegistrationError::InsufficientLandmarks {
                found: spec.landmarks.len(),
                required: MIN_LANDMARKS,
            });
        }
        let landmarks = spec
            .landmarks
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                ReferenceMask::from_image(reference, p, options).map_err(|e| e.for_landmark(i))
            })
            .collect::<Result<Vec<_>>>()?;
        let fields = FieldGrid::from_rows(spec.fields.clone())?;
        debug!(
            "ReferenceLayout::build {} landmarks (mask {}x{}), {}x{} fields",
            landmarks.len(),
            2 * options.mark_radius + 1,
            2 * options.mark_radius + 1,
            fields.questions(),
            fields.options()
        );
        Ok(Self {
            landmarks,
            fields,
        })
    }

    pub fn landmarks(&self) -> &[ReferenceMask] {
        &self.landmarks
    }

    pub fn fields(&self) -> &FieldGrid {
        &self.fields
    }

    pub fn field_center(&self, question: usize, option: usize) -> Result<PixelCoordinate> {
        self.fields.center(question, option)
    }
}
