//! Diagnostics data model attached to every registration.
//!
//! `RegistrationReport` is carried by the distortion model and records each
//! landmark's outcome, the fit residual and stage timings. It serialises to
//! camelCase JSON for the batch report.

pub mod registration;
pub mod timing;

pub use registration::{LandmarkReport, RegistrationReport};
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
