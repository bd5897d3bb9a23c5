//! Aggregation of validator results into a single report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::ValidationResult;

/// Restricts which results [`ValidationReport::format`] prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityFilter {
    Errors,
    Warnings,
}

/// Results of one validation run plus the counts derived from them.
///
/// The counts are always recomputed from `results`, and deserialization
/// rejects a payload whose stored counts disagree with its results.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    results: Vec<ValidationResult>,
    timestamp: DateTime<Utc>,
    total: usize,
    passed: usize,
    failed: usize,
    warnings_count: usize,
}

impl ValidationReport {
    /// Builds a report stamped with the current time.
    pub fn from_results(results: Vec<ValidationResult>) -> Self {
        Self::with_timestamp(results, Utc::now())
    }

    pub fn with_timestamp(results: Vec<ValidationResult>, timestamp: DateTime<Utc>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.is_valid()).count();
        let warnings_count = results.iter().map(|r| r.warnings().len()).sum();
        Self {
            results,
            timestamp,
            total,
            passed,
            failed: total - passed,
            warnings_count,
        }
    }

    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn warnings_count(&self) -> usize {
        self.warnings_count
    }

    pub fn is_valid(&self) -> bool {
        self.failed == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "Validation Summary: {}/{} passed, {} failed, {} warnings",
            self.passed, self.total, self.failed, self.warnings_count
        )
    }

    /// Multi-line report: header, summary, then each (filtered) result.
    pub fn format(&self, filter: Option<SeverityFilter>) -> String {
        let mut lines = vec![
            format!(
                "Validation Report ({})",
                self.timestamp.format("%Y-%m-%d %H:%M:%S")
            ),
            "=".repeat(60),
            self.summary(),
            String::new(),
        ];
        let shown = self.results.iter().filter(|r| match filter {
            Some(SeverityFilter::Errors) => r.has_errors(),
            Some(SeverityFilter::Warnings) => r.has_warnings(),
            None => true,
        });
        for result in shown {
            lines.push(result.format());
            lines.push(String::new());
        }
        lines.join("\n")
    }

    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Serialize, Deserialize)]
struct SummaryPayload {
    #[serde(alias = "total_validators")]
    total: usize,
    passed: usize,
    failed: usize,
    warnings_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_valid: Option<bool>,
}

/// Wire layout. Older documents keep the counts at the top level instead of
/// under `summary`.
#[derive(Serialize, Deserialize)]
struct ReportPayload {
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<SummaryPayload>,
    #[serde(default, alias = "total", skip_serializing)]
    total_validators: Option<usize>,
    #[serde(default, skip_serializing)]
    passed: Option<usize>,
    #[serde(default, skip_serializing)]
    failed: Option<usize>,
    #[serde(default, skip_serializing)]
    warnings_count: Option<usize>,
    results: Vec<ValidationResult>,
}

impl ReportPayload {
    fn counts(&self) -> Option<(usize, usize, usize, usize)> {
        if let Some(summary) = &self.summary {
            return Some((
                summary.total,
                summary.passed,
                summary.failed,
                summary.warnings_count,
            ));
        }
        Some((
            self.total_validators?,
            self.passed?,
            self.failed?,
            self.warnings_count?,
        ))
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ReportPayload {
            timestamp: self.timestamp,
            summary: Some(SummaryPayload {
                total: self.total,
                passed: self.passed,
                failed: self.failed,
                warnings_count: self.warnings_count,
                is_valid: Some(self.is_valid()),
            }),
            total_validators: None,
            passed: None,
            failed: None,
            warnings_count: None,
            results: self.results.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValidationReport {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let payload = ReportPayload::deserialize(deserializer)?;
        let Some(stored) = payload.counts() else {
            return Err(serde::de::Error::missing_field("summary"));
        };
        let report = Self::with_timestamp(payload.results, payload.timestamp);
        let derived = (report.total, report.passed, report.failed, report.warnings_count);
        if stored != derived {
            return Err(serde::de::Error::custom(format!(
                "report summary {stored:?} does not match its results {derived:?}"
            )));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    fn sample() -> ValidationReport {
        ValidationReport::with_timestamp(
            vec![
                ValidationResult::pass("positive_amounts"),
                ValidationResult::fail(
                    "currency_consistency",
                    "Group (account=A1) has multiple currencies: EUR, USD (2 distinct currencies)",
                ),
                ValidationResult::new(
                    "missing_values",
                    vec![],
                    vec!["Field 'reference' has 1 missing values (50.0% of 2 rows)".into()],
                ),
            ],
            fixed_time(),
        )
    }

    #[test]
    fn counts_are_derived() {
        let report = sample();
        assert_eq!(report.total(), 3);
        assert_eq!(report.passed(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.warnings_count(), 1);
        assert!(!report.is_valid());
        assert_eq!(
            report.summary(),
            "Validation Summary: 2/3 passed, 1 failed, 1 warnings"
        );
    }

    #[test]
    fn empty_report_is_valid() {
        let report = ValidationReport::from_results(Vec::new());
        assert!(report.is_valid());
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn format_with_error_filter() {
        insta::assert_snapshot!(sample().format(Some(SeverityFilter::Errors)), @r"
        Validation Report (2024-05-01 12:30:00)
        ============================================================
        Validation Summary: 2/3 passed, 1 failed, 1 warnings

        [currency_consistency] Validation failed
        Errors:
          - Group (account=A1) has multiple currencies: EUR, USD (2 distinct currencies)
        ");
    }

    #[test]
    fn serialized_layout() {
        let value = sample().to_value().unwrap();
        assert_eq!(value["summary"]["total"], 3);
        assert_eq!(value["summary"]["is_valid"], false);
        assert_eq!(value["timestamp"], "2024-05-01T12:30:00Z");
        assert_eq!(value["results"][1]["validator_name"], "currency_consistency");
        assert!(value.get("total").is_none());
    }

    #[test]
    fn json_round_trip() {
        let report = sample();
        let json = report.to_json().unwrap();
        assert_eq!(ValidationReport::from_json(&json).unwrap(), report);
    }

    #[test]
    fn float_metadata_round_trips_exactly() {
        let result = ValidationResult::pass("detect_outliers")
            .with_metadata("mean", 1429.5714285714287)
            .with_metadata("std", 1.0 / 3.0);
        let missing = ValidationResult::pass("detect_missing")
            .with_metadata("percentage", 15.384615384615385);
        let report = ValidationReport::with_timestamp(vec![result, missing], fixed_time());
        let back = ValidationReport::from_json(&report.to_json().unwrap()).unwrap();
        assert_eq!(back.results()[0].metadata()["mean"], 1429.5714285714287);
        assert_eq!(back.results()[1].metadata()["percentage"], 15.384615384615385);
        assert_eq!(back, report);
    }

    #[test]
    fn accepts_flat_legacy_layout() {
        let json = r#"{
            "timestamp": "2024-05-01T12:30:00Z",
            "total_validators": 1, "passed": 1, "failed": 0, "warnings_count": 0,
            "results": [{"validator_name": "a", "is_valid": true, "errors": [], "warnings": []}]
        }"#;
        let report = ValidationReport::from_json(json).unwrap();
        assert_eq!(report.total(), 1);
        assert!(report.is_valid());
    }

    #[test]
    fn rejects_inconsistent_counts() {
        let mut value = sample().to_value().unwrap();
        value["summary"]["passed"] = 3.into();
        let err = ValidationReport::from_value(value).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }
}
