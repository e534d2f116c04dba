//! Least-squares affine fit between reference and target coordinates.
//!
//! Unknowns are `(a11, a12, a21, a22, b1, b2)` with
//! `target.x ≈ a11·x + a12·y + b1` and `target.y ≈ a21·x + a22·y + b2`.
//! The design system has `2N` rows in block-diagonal layout: rows `0..N`
//! hold `[x, y, 0, 0, 1, 0]`, rows `N..2N` hold `[0, 0, x, y, 0, 1]`.
//!
//! Reference coordinates are centred and scaled before the system is built.
//! Two solvers are available. The SVD path works on the design matrix
//! directly and is the default; the normal-equation path squares the
//! condition number and therefore sees near-collinear layouts less clearly.
use crate::error::{RegistrationError, Result, MIN_LANDMARKS};
use crate::types::MatchedPair;
use log::debug;
use nalgebra::{DMatrix, DVector, Matrix2, Vector2};
use serde::{Deserialize, Serialize};

const PARAMS: usize = 6;

/// `target = A·reference + b`
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AffineTransform {
    pub matrix: Matrix2<f64>,
    pub translation: Vector2<f64>,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub fn new(matrix: Matrix2<f64>, translation: Vector2<f64>) -> Self {
        Self {
            matrix,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Matrix2::identity(), Vector2::zeros())
    }

    /// Assembles the transform from `(a11, a12, a21, a22, b1, b2)`.
    pub fn from_params(p: &[f64; PARAMS]) -> Self {
        Self::new(
            Matrix2::new(p[0], p[1], p[2], p[3]),
            Vector2::new(p[4], p[5]),
        )
    }

    pub fn params(&self) -> [f64; PARAMS] {
        let m = &self.matrix;
        [
            m[(0, 0)],
            m[(0, 1)],
            m[(1, 0)],
            m[(1, 1)],
            self.translation[0],
            self.translation[1],
        ]
    }

    #[inline]
    pub fn apply(&self, p: [f64; 2]) -> [f64; 2] {
        let v = self.matrix * Vector2::new(p[0], p[1]) + self.translation;
        [v[0], v[1]]
    }

    /// Root-mean-square distance between mapped references and targets.
    pub fn residual_rms(&self, pairs: &[MatchedPair]) -> f64 {
        if pairs.is_empty() {
            return 0.0;
        }
        let sum: f64 = pairs
            .iter()
            .map(|pair| {
                let m = self.apply(pair.reference.to_f64());
                let t = pair.target.to_f64();
                (m[0] - t[0]).powi(2) + (m[1] - t[1]).powi(2)
            })
            .sum();
        (sum / pairs.len() as f64).sqrt()
    }
}

/// Least-squares solver used by [`AffineFitter`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMethod {
    /// Thin SVD of the design matrix.
    #[default]
    Svd,
    /// Cholesky solve of `AᵗA x = Aᵗb`.
    NormalEquations,
}

/// Options for the affine fit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    pub method: FitMethod,
    /// Largest accepted `σmax/σmin` of the normalised design matrix. The
    /// normal-equation path checks `λmax/λmin` of `AᵗA` against its square.
    pub condition_limit: f64,
    /// Smallest accepted RMS spread of the reference landmarks across their
    /// principal axis, in pixels. Pixel coordinates carry ±0.5 px of
    /// quantisation, so thinner sets leave the cross-axis terms unresolved.
    pub min_spread_px: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            method: FitMethod::Svd,
            condition_limit: 1e6,
            min_spread_px: 10.0,
        }
    }
}

/// Fits one global affine transform to landmark correspondences.
#[derive(Clone, Copy, Debug, Default)]
pub struct AffineFitter {
    options: FitOptions,
}

impl AffineFitter {
    pub fn new(options: FitOptions) -> Self {
        Self { options }
    }

    pub fn fit(&self, pairs: &[MatchedPair]) -> Result<AffineTransform> {
        let src: Vec<[f64; 2]> = pairs.iter().map(|p| p.reference.to_f64()).collect();
        let dst: Vec<[f64; 2]> = pairs.iter().map(|p| p.target.to_f64()).collect();
        self.fit_points(&src, &dst)
    }

    /// Fits `dst ≈ A·src + b` over real-valued correspondences.
    pub fn fit_points(&self, src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<AffineTransform> {
        if src.len() != dst.len() {
            return Err(RegistrationError::CorrespondenceMismatch {
                sources: src.len(),
                targets: dst.len(),
            });
        }
        let n = src.len();
        if n < MIN_LANDMARKS {
            return Err(RegistrationError::InsufficientLandmarks {
                found: n,
                required: MIN_LANDMARKS,
            });
        }
        let norm = Normalization::from_points(src, self.options.min_spread_px)?;
        let normalized: Vec<[f64; 2]> = src.iter().map(|&p| norm.apply(p)).collect();
        let (design, rhs) = design_system(&normalized, dst);
        let params = match self.options.method {
            FitMethod::Svd => solve_svd(design, &rhs, self.options.condition_limit)?,
            FitMethod::NormalEquations => {
                solve_normal_equations(&design, &rhs, self.options.condition_limit.powi(2))?
            }
        };
        let mut p = [0.0; PARAMS];
        p.copy_from_slice(params.as_slice());
        if p.iter().any(|v| !v.is_finite()) {
            return Err(RegistrationError::DegenerateFit {
                condition: f64::INFINITY,
            });
        }
        Ok(norm.denormalize(&AffineTransform::from_params(&p)))
    }
}

/// Similarity that centres the reference points and scales their mean
/// distance from the centroid to √2. Keeps the design matrix well scaled for
/// sheets thousands of pixels wide; collinearity is unaffected.
struct Normalization {
    centroid: Vector2<f64>,
    scale: f64,
}

impl Normalization {
    fn from_points(points: &[[f64; 2]], min_spread: f64) -> Result<Self> {
        let n = points.len() as f64;
        let centroid = points
            .iter()
            .fold(Vector2::zeros(), |acc, p| acc + Vector2::new(p[0], p[1]))
            / n;
        let mean_dist = points
            .iter()
            .map(|p| (Vector2::new(p[0], p[1]) - centroid).norm())
            .sum::<f64>()
            / n;
        if !(mean_dist > f64::EPSILON) {
            // All points coincide.
            return Err(RegistrationError::DegenerateFit {
                condition: f64::INFINITY,
            });
        }
        // Principal spreads of the centred point cloud.
        let cov = points.iter().fold(Matrix2::zeros(), |acc, p| {
            let d = Vector2::new(p[0], p[1]) - centroid;
            acc + d * d.transpose()
        }) / n;
        let eigen = cov.symmetric_eigenvalues();
        let minor = eigen.min().max(0.0).sqrt();
        let major = eigen.max().max(0.0).sqrt();
        if !(minor >= min_spread) {
            let condition = if minor > 0.0 { major / minor } else { f64::INFINITY };
            debug!("AffineFitter landmark spread {minor:.3}px below {min_spread}px");
            return Err(RegistrationError::DegenerateFit { condition });
        }
        Ok(Self {
            centroid,
            scale: std::f64::consts::SQRT_2 / mean_dist,
        })
    }

    fn apply(&self, p: [f64; 2]) -> [f64; 2] {
        [
            (p[0] - self.centroid[0]) * self.scale,
            (p[1] - self.centroid[1]) * self.scale,
        ]
    }

    /// Turns a fit in normalised coordinates into one in reference pixels.
    fn denormalize(&self, fitted: &AffineTransform) -> AffineTransform {
        let matrix = fitted.matrix * self.scale;
        let translation = fitted.translation - matrix * self.centroid;
        AffineTransform::new(matrix, translation)
    }
}

fn design_system(src: &[[f64; 2]], dst: &[[f64; 2]]) -> (DMatrix<f64>, DVector<f64>) {
    let n = src.len();
    let mut design = DMatrix::<f64>::zeros(2 * n, PARAMS);
    let mut rhs = DVector::<f64>::zeros(2 * n);
    for (i, (s, d)) in src.iter().zip(dst).enumerate() {
        design[(i, 0)] = s[0];
        design[(i, 1)] = s[1];
        design[(i, 4)] = 1.0;
        rhs[i] = d[0];

        design[(n + i, 2)] = s[0];
        design[(n + i, 3)] = s[1];
        design[(n + i, 5)] = 1.0;
        rhs[n + i] = d[1];
    }
    (design, rhs)
}

fn solve_svd(design: DMatrix<f64>, rhs: &DVector<f64>, limit: f64) -> Result<DVector<f64>> {
    let svd = design
        .try_svd(true, true, f64::EPSILON, 0)
        .ok_or(RegistrationError::DegenerateFit {
            condition: f64::INFINITY,
        })?;
    let sv = &svd.singular_values;
    let s_max = sv.max();
    let s_min = sv.min();
    let condition = if s_min > 0.0 { s_max / s_min } else { f64::INFINITY };
    debug!("AffineFitter SVD singular values {:?} condition={condition:.3e}", sv.as_slice());
    if !(condition <= limit) {
        return Err(RegistrationError::DegenerateFit { condition });
    }
    svd.solve(rhs, 0.0)
        .map_err(|_| RegistrationError::DegenerateFit { condition })
}

fn solve_normal_equations(
    design: &DMatrix<f64>,
    rhs: &DVector<f64>,
    limit: f64,
) -> Result<DVector<f64>> {
    let ata = design.transpose() * design;
    let atb = design.transpose() * rhs;
    let eigen = ata.clone().symmetric_eigenvalues();
    let l_max = eigen.max();
    let l_min = eigen.min();
    let condition = if l_min > 0.0 { l_max / l_min } else { f64::INFINITY };
    debug!("AffineFitter normal equations condition={condition:.3e}");
    if !(condition <= limit) {
        return Err(RegistrationError::DegenerateFit { condition });
    }
    let chol = ata
        .cholesky()
        .ok_or(RegistrationError::DegenerateFit { condition })?;
    Ok(chol.solve(&atb))
}
