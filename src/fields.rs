//! Field localisation and box classification downstream of registration.
//!
//! Each reference field centre is mapped through the document's
//! [`DistortionModel`], a square patch is cropped around it and resized, and
//! the patch goes to a [`BoxClassifier`]. The registration core never calls
//! the classifier itself.
use crate::distortion::DistortionModel;
use crate::error::Result;
use crate::image::{GrayImageU8, GrayStats, ImageU8};
use crate::reference::ReferenceLayout;
use crate::types::PixelCoordinate;
use serde::{Deserialize, Serialize};

/// Decides whether a cropped checkbox patch is filled in.
pub trait BoxClassifier: Sync {
    fn is_filled(&self, patch: ImageU8<'_>) -> bool;
}

impl<F> BoxClassifier for F
where
    F: Fn(ImageU8<'_>) -> bool + Sync,
{
    fn is_filled(&self, patch: ImageU8<'_>) -> bool {
        self(patch)
    }
}

/// Baseline classifier: a box counts as filled when enough of its patch is
/// darker than `dark_threshold`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DarknessClassifier {
    pub dark_threshold: u8,
    /// Fraction of dark pixels above which the box is filled.
    pub min_dark_fraction: f32,
}

impl Default for DarknessClassifier {
    fn default() -> Self {
        Self {
            dark_threshold: 128,
            min_dark_fraction: 0.12,
        }
    }
}

impl BoxClassifier for DarknessClassifier {
    fn is_filled(&self, patch: ImageU8<'_>) -> bool {
        patch.fraction_below(self.dark_threshold) > self.min_dark_fraction
    }
}

/// How field patches are cut out of a registered document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOptions {
    /// Half-size of the crop around a mapped field centre.
    pub crop_radius: usize,
    /// Edge length the crop is resampled to before classification.
    pub patch_size: Option<usize>,
    /// Value of crop pixels that fall outside the scan.
    pub border_fill: u8,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            crop_radius: 30,
            patch_size: Some(40),
            border_fill: 255,
        }
    }
}

/// A field patch with its grid position and document-space centre.
#[derive(Clone, Debug)]
pub struct FieldPatch {
    pub question: usize,
    pub option: usize,
    pub center: PixelCoordinate,
    pub patch: GrayImageU8,
}

/// Maps every reference field centre into document space.
pub fn locate_fields(
    model: &DistortionModel,
    layout: &ReferenceLayout,
) -> Result<Vec<(usize, usize, PixelCoordinate)>> {
    layout
        .fields()
        .iter()
        .map(|(q, o, c)| Ok((q, o, model.map(c)?)))
        .collect()
}

/// Crops (and optionally resizes) the patch of every field. Crops reaching
/// past the scan border are padded with `border_fill`.
pub fn extract_field_patches(
    target: &ImageU8<'_>,
    model: &DistortionModel,
    layout: &ReferenceLayout,
    options: &FieldOptions,
) -> Result<Vec<FieldPatch>> {
    locate_fields(model, layout)?
        .into_iter()
        .map(|(question, option, center)| {
            let crop = target.crop_square_padded(center, options.crop_radius, options.border_fill);
            let patch = match options.patch_size {
                Some(size) => crop.resize(size, size),
                None => crop,
            };
            Ok(FieldPatch {
                question,
                option,
                center,
                patch,
            })
        })
        .collect()
}

/// Filled/empty state of every field of one sheet, zero-based indices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetAnswers {
    questions: usize,
    options: usize,
    filled: Vec<bool>,
}

impl SheetAnswers {
    pub fn empty(questions: usize, options: usize) -> Self {
        Self {
            questions,
            options,
            filled: vec![false; questions * options],
        }
    }

    pub fn questions(&self) -> usize {
        self.questions
    }

    pub fn options(&self) -> usize {
        self.options
    }

    /// Out-of-range indices read as not filled.
    pub fn is_filled(&self, question: usize, option: usize) -> bool {
        question < self.questions
            && option < self.options
            && self.filled[question * self.options + option]
    }

    pub fn mark_filled(&mut self, question: usize, option: usize) {
        if question < self.questions && option < self.options {
            self.filled[question * self.options + option] = true;
        }
    }

    /// Options marked for `question`.
    pub fn selected(&self, question: usize) -> Vec<usize> {
        (0..self.options)
            .filter(|&o| self.is_filled(question, o))
            .collect()
    }

    pub fn filled_count(&self) -> usize {
        self.filled.iter().filter(|&&f| f).count()
    }
}

/// Result of classifying every field of a registered document.
#[derive(Clone, Debug)]
pub struct ClassifiedSheet {
    pub answers: SheetAnswers,
    /// Document-space centres of the fields classified as filled.
    pub filled_centers: Vec<PixelCoordinate>,
}

/// Crops and classifies every field of the layout.
pub fn classify_fields<C: BoxClassifier + ?Sized>(
    target: &ImageU8<'_>,
    model: &DistortionModel,
    layout: &ReferenceLayout,
    options: &FieldOptions,
    classifier: &C,
) -> Result<ClassifiedSheet> {
    let grid = layout.fields();
    let mut answers = SheetAnswers::empty(grid.questions(), grid.options());
    let mut filled_centers = Vec::new();
    for field in extract_field_patches(target, model, layout, options)? {
        if classifier.is_filled(field.patch.as_view()) {
            answers.mark_filled(field.question, field.option);
            filled_centers.push(field.center);
        }
    }
    Ok(ClassifiedSheet {
        answers,
        filled_centers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn darkness_classifier_thresholds_the_dark_fraction() {
        let clf = DarknessClassifier::default();
        let mut patch = GrayImageU8::filled(10, 10, 240);
        assert!(!clf.is_filled(patch.as_view()));
        for i in 0..10 {
            patch.set(i, i, 20);
            patch.set(9 - i, i, 20);
        }
        // 20 dark pixels out of 100.
        assert!(clf.is_filled(patch.as_view()));
    }

    #[test]
    fn closures_are_classifiers() {
        let always = |_: ImageU8<'_>| true;
        let patch = GrayImageU8::filled(3, 3, 0);
        assert!(always.is_filled(patch.as_view()));
    }

    #[test]
    fn fields_near_the_border_get_padded_patches() {
        use crate::affine::FitOptions;
        use crate::reference::{LayoutSpec, MaskOptions};
        use crate::types::MatchedPair;

        let reference = GrayImageU8::filled(60, 60, 250);
        let spec = LayoutSpec {
            landmarks: vec![
                PixelCoordinate::new(10, 10),
                PixelCoordinate::new(50, 10),
                PixelCoordinate::new(10, 50),
            ],
            fields: vec![vec![PixelCoordinate::new(57, 30), PixelCoordinate::new(30, 30)]],
        };
        let masks = MaskOptions {
            mark_radius: 2,
            threshold: 200,
        };
        let layout = ReferenceLayout::build(&reference.as_view(), &spec, &masks).unwrap();
        let pairs = spec
            .landmarks
            .iter()
            .map(|&p| MatchedPair::new(p, p))
            .collect();
        let model = DistortionModel::from_pairs(pairs, &FitOptions::default()).unwrap();

        let mut scan = GrayImageU8::filled(60, 60, 250);
        for y in 24..=36 {
            for x in 52..60 {
                scan.set(x, y, 10);
            }
        }
        let options = FieldOptions {
            crop_radius: 6,
            patch_size: None,
            border_fill: 255,
        };
        let patches = extract_field_patches(&scan.as_view(), &model, &layout, &options).unwrap();
        assert_eq!(patches.len(), 2);
        let edge = patches[0].patch.as_view();
        assert_eq!((edge.w, edge.h), (13, 13));
        assert_eq!(edge.get(12, 6), 255);
        assert_eq!(edge.get(2, 6), 10);

        let sheet =
            classify_fields(&scan.as_view(), &model, &layout, &options, &DarknessClassifier::default())
                .unwrap();
        assert!(sheet.answers.is_filled(0, 0));
        assert!(!sheet.answers.is_filled(0, 1));
    }

    #[test]
    fn sheet_answers_track_selections() {
        let mut answers = SheetAnswers::empty(3, 4);
        answers.mark_filled(1, 2);
        answers.mark_filled(1, 0);
        answers.mark_filled(7, 0);
        assert!(answers.is_filled(1, 2));
        assert!(!answers.is_filled(0, 2));
        assert!(!answers.is_filled(9, 9));
        assert_eq!(answers.selected(1), vec![0, 2]);
        assert_eq!(answers.filled_count(), 2);
    }
}
