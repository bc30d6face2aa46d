//! Comprehensive patient report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{FileRef, Patient, TestResult, REPORT_ID_PREFIX};

/// Stand-in image for attachments whose blob URL did not survive the session.
pub const IMAGE_PLACEHOLDER_URL: &str = "data:image/svg+xml;base64,PHN2ZyB4bWxucz0iaHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmciIHdpZHRoPSIyNCIgaGVpZ2h0PSIyNCIgdmlld0JveD0iMCAwIDI0IDI0IiBmaWxsPSJub25lIiBzdHJva2U9ImN1cnJlbnRDb2xvciIgc3Ryb2tlLXdpZHRoPSIyIiBzdHJva2UtbGluZWNhcD0icm91bmQiIHN0cm9rZS1saW5lam9pbj0icm91bmQiPjxyZWN0IHg9IjMiIHk9IjMiIHdpZHRoPSIxOCIgaGVpZ2h0PSIxOCIgcng9IjIiIHJ5PSIyIj48L3JlY3Q+PGNpcmNsZSBjeD0iOC41IiBjeT0iOC41IiByPSIxLjUiPjwvY2lyY2xlPjxwb2x5bGluZSBwb2ludHM9IjIxIDEzLjg1IDE2IDEwLjUgOCAxNyI+PC9wb2x5bGluZT48L3N2Zz4=";

const UNKNOWN_STAFF: &str = "Unknown";
const REPORT_TYPE: &str = "Comprehensive";
const GENERATED_BY: &str = "LAB-east System";

/// Full report for one patient, with every test normalized for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientReport {
    /// `RPT-<millis>`
    pub report_id: String,
    /// Generation timestamp (RFC 3339)
    pub generated_date: String,
    /// Deep copy of the patient with normalized tests
    pub patient_info: Patient,
    pub summary: String,
    pub test_count: usize,
    pub report_type: String,
    /// Whether any test carries attachments
    pub includes_files: bool,
    pub generated_by: String,
}

impl PatientReport {
    /// Build a report from a patient record at `generated_at`.
    pub fn from_patient(patient: &Patient, generated_at: DateTime<Utc>) -> Self {
        let mut patient_info = patient.clone();
        for test in &mut patient_info.test_results {
            normalize_test(test);
        }

        let includes_files = patient_info
            .test_results
            .iter()
            .any(|t| !t.files.is_empty());

        Self {
            report_id: format!("{}{}", REPORT_ID_PREFIX, generated_at.timestamp_millis()),
            generated_date: generated_at.to_rfc3339(),
            summary: format!(
                "Comprehensive Report for {} ({})",
                patient_info.name, patient_info.id
            ),
            test_count: patient_info.test_results.len(),
            patient_info,
            report_type: REPORT_TYPE.to_string(),
            includes_files,
            generated_by: GENERATED_BY.to_string(),
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Printable plain-text rendering.
    pub fn to_text(&self) -> String {
        let p = &self.patient_info;
        let mut out = String::new();

        out.push_str(&format!("LAB-east Medical Laboratory\n{}\n", self.summary));
        out.push_str(&format!(
            "Report ID: {}\nGenerated: {}\n\n",
            self.report_id, self.generated_date
        ));

        out.push_str("Patient Information\n");
        out.push_str(&format!("  Patient ID: {}\n", p.id));
        out.push_str(&format!("  Name: {}\n", p.name));
        out.push_str(&format!("  Age: {}\n", p.age));
        out.push_str(&format!("  Gender: {}\n", p.gender));
        out.push_str(&format!("  Blood Group: {}\n", p.blood_group));
        out.push_str(&format!("  Contact: {}\n", p.contact));
        for (label, value) in [
            ("Email", &p.email),
            ("Address", &p.address),
            ("Medical History", &p.medical_history),
            ("Allergies", &p.allergies),
            ("Referred Tests", &p.referred_tests),
        ] {
            if let Some(value) = value {
                out.push_str(&format!("  {}: {}\n", label, value));
            }
        }
        out.push_str(&format!("  Registered: {}\n", p.date_registered));

        out.push_str(&format!("\nTest Results ({})\n", self.test_count));
        if p.test_results.is_empty() {
            out.push_str("  No test results recorded.\n");
        }
        for test in &p.test_results {
            out.push_str(&format!(
                "\n  [{}] {} ({})\n",
                test.id, test.test_name, test.test_date
            ));
            out.push_str(&format!(
                "  Recorded by: {}\n",
                test.added_by_staff.as_deref().unwrap_or(UNKNOWN_STAFF)
            ));
            for (name, m) in &test.results {
                out.push_str(&format!(
                    "    {}: {} (ref: {}) [{}]\n",
                    name,
                    m.value,
                    m.reference_range(),
                    m.status.as_str()
                ));
            }
            if !test.comments.is_empty() {
                out.push_str(&format!("  Comments: {}\n", test.comments));
            }
            for file in &test.files {
                out.push_str(&format!("  Attachment: {} ({}, {})\n", file.name, file.mime_type, file.size_label));
            }
        }

        out
    }

    /// One CSV row per measurement.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        // Header
        csv.push_str("patient_id,patient_name,test_id,test_name,test_date,parameter,value,reference_range,status,added_by_staff\n");

        for test in &self.patient_info.test_results {
            for (name, m) in &test.results {
                csv.push_str(&format!(
                    "{},{},{},{},{},{},{},{},{},{}\n",
                    escape_csv(&self.patient_info.id),
                    escape_csv(&self.patient_info.name),
                    escape_csv(&test.id),
                    escape_csv(&test.test_name),
                    escape_csv(&test.test_date),
                    escape_csv(name),
                    escape_csv(&m.value),
                    escape_csv(&m.reference_range()),
                    m.status.as_str(),
                    escape_csv(test.added_by_staff.as_deref().unwrap_or(UNKNOWN_STAFF)),
                ));
            }
        }

        csv
    }
}

/// Fill display defaults and replace attachments that cannot be shown.
fn normalize_test(test: &mut TestResult) {
    if test.added_by_staff.as_deref().map_or(true, |s| s.trim().is_empty()) {
        test.added_by_staff = Some(UNKNOWN_STAFF.to_string());
    }
    if test.time_stamp.is_none() {
        test.time_stamp = Some(test.test_date.clone());
    }
    for file in &mut test.files {
        normalize_file(file);
    }
}

fn normalize_file(file: &mut FileRef) {
    if !file.is_blob_url() {
        return;
    }
    if file.is_image() {
        file.url = IMAGE_PLACEHOLDER_URL.to_string();
    }
    file.needs_fallback = true;
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Measurement, NewPatient, NewTestResult};
    use chrono::TimeZone;

    fn make_file(name: &str, mime_type: &str, url: &str) -> FileRef {
        FileRef {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size_label: "12 KB".to_string(),
            size_bytes: 12_288,
            sha256: None,
            url: url.to_string(),
            needs_fallback: false,
        }
    }

    fn make_patient() -> Patient {
        let mut patient = Patient::new(
            "PAT-007".to_string(),
            NewPatient::new("Jane Smith", 32, "Female", "A-", "555-987-6543"),
        );

        let mut data = NewTestResult::new("Lipid Panel")
            .with_measurement("ldl", Measurement::new("162", None, Some(130.0)))
            .with_measurement("hdl", Measurement::new("55", Some(40.0), None));
        data.comments = "Fasting, 12h".to_string();
        data.files = vec![
            make_file("xray.png", "image/png", "blob:http://localhost/1"),
            make_file("notes.pdf", "application/pdf", "blob:http://localhost/2"),
            make_file("cbc.pdf", "application/pdf", "data:application/pdf;base64,AA=="),
        ];
        let mut test = TestResult::new("TR-001".to_string(), data);
        test.time_stamp = None;
        patient.test_results.push(test);
        patient
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_report_from_patient() {
        let patient = make_patient();
        let report = PatientReport::from_patient(&patient, generated_at());

        assert_eq!(report.report_id, "RPT-1705312800000");
        assert_eq!(report.summary, "Comprehensive Report for Jane Smith (PAT-007)");
        assert_eq!(report.test_count, 1);
        assert_eq!(report.report_type, "Comprehensive");
        assert_eq!(report.generated_by, "LAB-east System");
        assert!(report.includes_files);
    }

    #[test]
    fn test_report_normalizes_tests() {
        let patient = make_patient();
        let report = PatientReport::from_patient(&patient, generated_at());
        let test = &report.patient_info.test_results[0];

        assert_eq!(test.added_by_staff.as_deref(), Some("Unknown"));
        assert_eq!(test.time_stamp.as_deref(), Some(test.test_date.as_str()));

        // Blob image replaced, blob document flagged, data URL untouched
        assert_eq!(test.files[0].url, IMAGE_PLACEHOLDER_URL);
        assert!(test.files[0].needs_fallback);
        assert_eq!(test.files[1].url, "blob:http://localhost/2");
        assert!(test.files[1].needs_fallback);
        assert!(!test.files[2].needs_fallback);

        // The source record is not modified
        assert!(patient.test_results[0].added_by_staff.is_none());
        assert!(!patient.test_results[0].files[0].needs_fallback);
    }

    #[test]
    fn test_report_without_tests() {
        let patient = Patient::new(
            "PAT-001".to_string(),
            NewPatient::new("John Doe", 45, "Male", "O+", "555-123-4567"),
        );
        let report = PatientReport::from_patient(&patient, generated_at());

        assert_eq!(report.test_count, 0);
        assert!(!report.includes_files);
        assert!(report.to_text().contains("No test results recorded."));
    }

    #[test]
    fn test_report_json() {
        let report = PatientReport::from_patient(&make_patient(), generated_at());
        let json = report.to_json().unwrap();

        assert!(json.contains("\"reportId\": \"RPT-1705312800000\""));
        assert!(json.contains("\"patientInfo\""));
        assert!(json.contains("\"needsFallback\": true"));
    }

    #[test]
    fn test_report_text() {
        let report = PatientReport::from_patient(&make_patient(), generated_at());
        let text = report.to_text();

        assert!(text.contains("Patient ID: PAT-007"));
        assert!(text.contains("[TR-001] Lipid Panel"));
        assert!(text.contains("ldl: 162 (ref: < 130) [high]"));
        assert!(text.contains("Comments: Fasting, 12h"));
        assert!(text.contains("Attachment: xray.png"));
    }

    #[test]
    fn test_report_csv() {
        let report = PatientReport::from_patient(&make_patient(), generated_at());
        let csv = report.to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3); // Header + 2 measurements
        assert!(lines[0].starts_with("patient_id,"));
        // Rows follow entry order
        assert!(lines[1].contains(",ldl,162,< 130,high,"));
        assert!(lines[2].contains(",hdl,55,> 40,normal,"));
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("Smith, Jane"), "\"Smith, Jane\"");
        assert_eq!(escape_csv("5\" cuff"), "\"5\"\" cuff\"");
    }
}
