//! Error kinds reported by the registration core.
//!
//! Every variant is local to one landmark or one document; callers decide
//! whether to skip the document, abort the batch or retry with other options.
use thiserror::Error;

/// Minimum number of matched landmarks needed to determine an affine map.
pub const MIN_LANDMARKS: usize = 3;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum RegistrationError {
    /// A search or mask window reaches past the image borders.
    #[error(
        "window of radius {radius} around ({x}, {y}) exceeds the {width}x{height} image"
    )]
    OutOfBounds {
        x: i64,
        y: i64,
        radius: usize,
        width: usize,
        height: usize,
    },

    /// Fewer matched pairs than an affine fit needs.
    #[error("only {found} landmark pairs available, at least {required} required")]
    InsufficientLandmarks { found: usize, required: usize },

    /// The landmark configuration is collinear or numerically close to it.
    #[error("degenerate landmark configuration (condition estimate {condition:.3e})")]
    DegenerateFit { condition: f64 },

    /// A failure attributed to one landmark of the layout.
    #[error("landmark {index}: {source}")]
    Landmark {
        index: usize,
        #[source]
        source: Box<RegistrationError>,
    },

    /// Dropped landmarks left too few, or too poorly spread, pairs to fit.
    #[error("{source} (dropped landmarks: {})", describe_dropped(.dropped))]
    LandmarksDropped {
        #[source]
        source: Box<RegistrationError>,
        /// Layout index and cause of every landmark that failed.
        dropped: Vec<(usize, RegistrationError)>,
    },

    /// Source and target correspondence lists differ in length.
    #[error("{sources} source points but {targets} target points")]
    CorrespondenceMismatch { sources: usize, targets: usize },

    /// A mapped coordinate is NaN or infinite.
    #[error("coordinate ({x}, {y}) is not finite")]
    NonFiniteCoordinate { x: f64, y: f64 },

    /// A coordinate computation produced a negative component.
    #[error("coordinate ({x}, {y}) has a negative component")]
    NegativeCoordinate { x: i64, y: i64 },

    /// The reference layout description is unusable.
    #[error("invalid reference layout: {0}")]
    InvalidLayout(String),

    /// A question/option index outside the field grid.
    #[error("field (question {question}, option {option}) is outside the {questions}x{options} grid")]
    FieldIndex {
        question: usize,
        option: usize,
        questions: usize,
        options: usize,
    },
}

impl RegistrationError {
    /// Attaches the landmark index to an error raised while handling it.
    pub fn for_landmark(self, index: usize) -> Self {
        RegistrationError::Landmark {
            index,
            source: Box::new(self),
        }
    }

    /// The underlying condition with landmark and drop context peeled off.
    pub fn root_cause(&self) -> &RegistrationError {
        match self {
            RegistrationError::Landmark { source, .. }
            | RegistrationError::LandmarksDropped { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn describe_dropped(dropped: &[(usize, RegistrationError)]) -> String {
    dropped
        .iter()
        .map(|(index, err)| format!("#{index}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, RegistrationError>;
