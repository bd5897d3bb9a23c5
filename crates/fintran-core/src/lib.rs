//! Conversion orchestration: read, check, transform, check, write.

pub mod pipeline;

pub use pipeline::{ConversionPipeline, execute_pipeline};
