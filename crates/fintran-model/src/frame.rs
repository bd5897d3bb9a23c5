//! Dataset wrapper passed between pipeline steps.
//!
//! [`IrFrame`] pairs the Polars data with an identity token and a typed
//! side-table of validation reports. Every derived frame gets a fresh
//! identity, so the orchestrator can tell a new dataset from a handed-back
//! input.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use polars::prelude::DataFrame;

use crate::report::ValidationReport;

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one dataset instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

impl FrameId {
    fn next() -> Self {
        Self(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Out-of-band metadata carried alongside the data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameMeta {
    /// Validation reports in attachment order, keyed by the attaching transform's key.
    pub reports: BTreeMap<String, Vec<ValidationReport>>,
}

/// An IR dataset plus identity and metadata.
///
/// `Clone` keeps the identity: a clone is the same dataset as far as the
/// immutability check is concerned.
#[derive(Debug, Clone)]
pub struct IrFrame {
    id: FrameId,
    pub data: DataFrame,
    pub meta: FrameMeta,
}

impl IrFrame {
    pub fn new(data: DataFrame) -> Self {
        Self {
            id: FrameId::next(),
            data,
            meta: FrameMeta::default(),
        }
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    /// A new frame over `data` that inherits this frame's metadata.
    pub fn derive(&self, data: DataFrame) -> Self {
        Self {
            id: FrameId::next(),
            data,
            meta: self.meta.clone(),
        }
    }

    /// A new frame with `report` appended under `key`.
    pub fn with_report(&self, key: &str, report: ValidationReport) -> Self {
        let mut next = self.derive(self.data.clone());
        next.meta
            .reports
            .entry(key.to_string())
            .or_default()
            .push(report);
        next
    }

    /// Reports attached under `key`, oldest first.
    pub fn reports(&self, key: &str) -> &[ValidationReport] {
        self.meta
            .reports
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn height(&self) -> usize {
        self.data.height()
    }

    pub fn into_data(self) -> DataFrame {
        self.data
    }
}

impl From<DataFrame> for IrFrame {
    fn from(data: DataFrame) -> Self {
        Self::new(data)
    }
}
