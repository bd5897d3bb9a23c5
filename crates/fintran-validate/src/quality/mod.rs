//! Data-quality validators.
//!
//! Findings are reported as warnings and never fail the result on their own.
//! Only structural problems, such as a missing column, produce errors.

mod duplicates;
mod missing;
mod outliers;

pub use duplicates::{DuplicateDetectionConfig, DuplicateDetectionValidator, DuplicateMode};
pub use missing::{MissingValueDetectionConfig, MissingValueDetectionValidator};
pub use outliers::{OutlierDetectionConfig, OutlierDetectionValidator, OutlierMethod};

/// Row findings itemized before the rest are summarized.
const MAX_LISTED: usize = 10;
