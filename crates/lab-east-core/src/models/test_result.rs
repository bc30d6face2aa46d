//! Lab test result models.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::stored;

/// Status of a single measurement relative to its reference range.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementStatus {
    #[default]
    Normal,
    High,
    Low,
}

impl MeasurementStatus {
    /// Derive the status of `value` against an optional `[min, max]` range.
    ///
    /// Values that do not parse as numbers are always normal.
    pub fn derive(value: &str, min: Option<f64>, max: Option<f64>) -> Self {
        let Some(numeric) = parse_leading_number(value) else {
            return MeasurementStatus::Normal;
        };

        match (min, max) {
            (Some(lo), _) if numeric < lo => MeasurementStatus::Low,
            (_, Some(hi)) if numeric > hi => MeasurementStatus::High,
            _ => MeasurementStatus::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementStatus::Normal => "normal",
            MeasurementStatus::High => "high",
            MeasurementStatus::Low => "low",
        }
    }
}

/// Parse the leading numeric part of a value like `"14.2 g/dL"`.
fn parse_leading_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    let number: f64 = trimmed[..end].parse().ok()?;
    number.is_finite().then_some(number)
}

/// A single measured parameter within a test.
///
/// Stored measurements are read leniently (see [`StoredMeasurement`]) and
/// their status is always re-derived on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", from = "StoredMeasurement")]
pub struct Measurement {
    /// Measured value as entered (may include units)
    pub value: String,
    /// Lower bound of the reference range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_range: Option<f64>,
    /// Upper bound of the reference range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_range: Option<f64>,
    /// Derived status
    #[serde(default)]
    pub status: MeasurementStatus,
}

impl Measurement {
    /// Create a measurement, deriving its status from the range.
    pub fn new(value: impl Into<String>, min_range: Option<f64>, max_range: Option<f64>) -> Self {
        let value = value.into();
        let status = MeasurementStatus::derive(&value, min_range, max_range);
        Self {
            value,
            min_range,
            max_range,
            status,
        }
    }

    /// Recompute the status from the current value and range.
    pub fn rederive_status(&mut self) {
        self.status = MeasurementStatus::derive(&self.value, self.min_range, self.max_range);
    }

    /// Human-readable reference range (`"3.5 - 5"`, `"> 3.5"`, `"< 5"`, `"N/A"`).
    pub fn reference_range(&self) -> String {
        match (self.min_range, self.max_range) {
            (Some(lo), Some(hi)) => format!("{} - {}", lo, hi),
            (Some(lo), None) => format!("> {}", lo),
            (None, Some(hi)) => format!("< {}", hi),
            (None, None) => "N/A".to_string(),
        }
    }
}

/// Shapes a measurement may take in the store.
///
/// Older records hold a bare value (`"wbc": "7.5 x10^9/L"`); lab submissions
/// hold an object whose ranges may be text and whose status may be
/// `"abnormal"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredMeasurement {
    Bare(#[serde(deserialize_with = "stored::text")] String),
    Record(MeasurementRecord),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeasurementRecord {
    #[serde(deserialize_with = "stored::text")]
    value: String,
    #[serde(default, deserialize_with = "stored::optional_number")]
    min_range: Option<f64>,
    #[serde(default, deserialize_with = "stored::optional_number")]
    max_range: Option<f64>,
}

impl From<StoredMeasurement> for Measurement {
    fn from(stored: StoredMeasurement) -> Self {
        match stored {
            StoredMeasurement::Bare(value) => Measurement::new(value, None, None),
            StoredMeasurement::Record(r) => Measurement::new(r.value, r.min_range, r.max_range),
        }
    }
}

/// Lifecycle status of a recorded test.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[default]
    Completed,
}

/// Reference to a file attached to a test result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    /// Original file name
    pub name: String,
    /// MIME type
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Display size (e.g., "256 KB")
    #[serde(rename = "size")]
    pub size_label: String,
    /// Exact size in bytes (0 for legacy entries)
    #[serde(default)]
    pub size_bytes: u64,
    /// Hex SHA-256 of the content, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Payload: a data URL, or a legacy blob/remote URL
    pub url: String,
    /// Set on report copies whose payload could not be carried over
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub needs_fallback: bool,
}

impl FileRef {
    /// Whether the payload is an inline data URL.
    pub fn is_data_url(&self) -> bool {
        self.url.starts_with("data:")
    }

    /// Whether the payload is a session-scoped blob URL.
    pub fn is_blob_url(&self) -> bool {
        self.url.starts_with("blob:")
    }

    /// Whether the file is an image.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// A recorded lab test for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Sequential identifier within the patient (`TR-NNN`)
    pub id: String,
    /// Test name (e.g., "Complete Blood Count")
    pub test_name: String,
    /// When the test was recorded (RFC 3339)
    pub test_date: String,
    /// Submission timestamp (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<String>,
    #[serde(default)]
    pub status: TestStatus,
    /// Measured parameters by name, in entry order
    #[serde(default)]
    pub results: IndexMap<String, Measurement>,
    #[serde(default)]
    pub comments: String,
    /// Lab staff member who recorded the test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by_staff: Option<String>,
    /// Attached files
    #[serde(default)]
    pub files: Vec<FileRef>,
}

impl TestResult {
    /// Create a completed test result from submission data.
    ///
    /// Measurement statuses are re-derived from their ranges and report-only
    /// file flags are cleared.
    pub fn new(id: String, data: NewTestResult) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        let results = data
            .results
            .into_iter()
            .map(|(name, mut measurement)| {
                measurement.rederive_status();
                (name.trim().to_string(), measurement)
            })
            .collect();

        Self {
            id,
            test_name: data.test_name.trim().to_string(),
            test_date: now.clone(),
            time_stamp: Some(now),
            status: TestStatus::Completed,
            results,
            comments: data.comments,
            added_by_staff: data.added_by_staff,
            files: data
                .files
                .into_iter()
                .map(|file| FileRef {
                    needs_fallback: false,
                    ..file
                })
                .collect(),
        }
    }

    /// Number of measurements outside their reference range.
    pub fn abnormal_count(&self) -> usize {
        self.results
            .values()
            .filter(|m| m.status != MeasurementStatus::Normal)
            .count()
    }
}

/// Submission data for a new test result.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NewTestResult {
    pub test_name: String,
    pub results: IndexMap<String, Measurement>,
    pub comments: String,
    pub added_by_staff: Option<String>,
    pub files: Vec<FileRef>,
}

impl NewTestResult {
    /// Start a submission for the named test.
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            ..Default::default()
        }
    }

    /// Add a measured parameter.
    pub fn with_measurement(mut self, name: impl Into<String>, measurement: Measurement) -> Self {
        self.results.insert(name.into(), measurement);
        self
    }

    /// Describe why the submission is incomplete, if it is.
    pub fn validation_problem(&self) -> Option<String> {
        if self.test_name.trim().is_empty() {
            return Some("Test name is required".into());
        }
        if self.results.is_empty() {
            return Some("At least one test result is required".into());
        }
        if self
            .results
            .iter()
            .any(|(name, m)| name.trim().is_empty() || m.value.trim().is_empty())
        {
            return Some("Both parameter name and value are required".into());
        }
        None
    }
}
