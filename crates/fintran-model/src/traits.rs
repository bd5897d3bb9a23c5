//! Collaborator contracts for the conversion pipeline.

use std::path::Path;

use polars::prelude::DataFrame;

use crate::error::Result;
use crate::frame::IrFrame;

/// Format-specific options forwarded verbatim to readers and writers.
pub type FormatOptions = serde_json::Map<String, serde_json::Value>;

/// Produces an IR dataset from a location.
///
/// Malformed input is reported as [`crate::FintranError::Reader`].
pub trait Reader {
    fn read(&self, path: &Path, options: &FormatOptions) -> Result<DataFrame>;
}

/// Persists an IR dataset to a location.
///
/// Failures are reported as [`crate::FintranError::Writer`].
pub trait Writer {
    fn write(&self, df: &DataFrame, path: &Path, options: &FormatOptions) -> Result<()>;
}

/// A deterministic dataset-to-dataset step.
///
/// Implementations must not hand back their input: the returned frame has to
/// be a new instance (see [`IrFrame::derive`]), which the orchestrator checks.
pub trait Transform {
    fn transform(&self, frame: &IrFrame) -> Result<IrFrame>;

    /// Short type name used in error context.
    fn type_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Passthrough;

    impl Transform for Passthrough {
        fn transform(&self, frame: &IrFrame) -> Result<IrFrame> {
            Ok(frame.derive(frame.data.clone()))
        }
    }

    #[test]
    fn type_name_is_unqualified() {
        assert_eq!(Passthrough.type_name(), "Passthrough");
        assert_eq!(short_type_name("a::b::Wrap<c::D>"), "Wrap");
    }
}
