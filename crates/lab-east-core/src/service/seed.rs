//! Demo patients for a fresh store.

use indexmap::IndexMap;

use crate::models::{FileRef, Measurement, Patient, TestResult, TestStatus};

fn text(value: &str) -> Option<String> {
    Some(value.to_string())
}

pub(super) fn demo_patients() -> Vec<Patient> {
    vec![
        Patient {
            id: "PAT-001".into(),
            name: "John Doe".into(),
            age: 45,
            gender: "Male".into(),
            blood_group: "O+".into(),
            contact: "555-123-4567".into(),
            emergency_contact: text("555-987-6543"),
            email: text("john.doe@example.com"),
            address: text("123 Main St, Anytown"),
            occupation: text("Software Engineer"),
            health_insurance: text("MediCare #12345678"),
            medical_history: text("Hypertension, Appendectomy (2018)"),
            allergies: text("Penicillin"),
            referred_tests: None,
            added_by_staff: None,
            date_registered: "2023-10-15".into(),
            test_results: Vec::new(),
        },
        Patient {
            id: "PAT-002".into(),
            name: "Jane Smith".into(),
            age: 32,
            gender: "Female".into(),
            blood_group: "A-".into(),
            contact: "555-987-6543".into(),
            emergency_contact: text("555-123-4567"),
            email: text("jane.smith@example.com"),
            address: text("456 Oak Ave, Somewhere City"),
            occupation: text("Teacher"),
            health_insurance: text("BlueCross #87654321"),
            medical_history: text("Asthma"),
            allergies: text("Nuts, Shellfish"),
            referred_tests: None,
            added_by_staff: None,
            date_registered: "2023-11-02".into(),
            test_results: vec![demo_blood_count()],
        },
    ]
}

fn demo_blood_count() -> TestResult {
    let results: IndexMap<String, Measurement> = [
        ("wbc", "7.5 x10^9/L"),
        ("rbc", "4.8 x10^12/L"),
        ("hemoglobin", "14.2 g/dL"),
        ("hematocrit", "42%"),
        ("platelets", "250 x10^9/L"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), Measurement::new(value, None, None)))
    .collect();

    TestResult {
        id: "TR-001".into(),
        test_name: "Complete Blood Count".into(),
        test_date: "2023-11-05".into(),
        time_stamp: None,
        status: TestStatus::Completed,
        results,
        comments: "Results within normal range".into(),
        added_by_staff: None,
        files: vec![FileRef {
            name: "cbc_report.pdf".into(),
            mime_type: "application/pdf".into(),
            size_label: "256 KB".into(),
            size_bytes: 0,
            sha256: None,
            url: "https://example.com/reports/cbc_report.pdf".into(),
            needs_fallback: false,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_patients() {
        let patients = demo_patients();
        assert_eq!(patients.len(), 2);
        assert_eq!(patients[0].name, "John Doe");
        assert!(patients[0].test_results.is_empty());

        let jane = &patients[1];
        assert_eq!(jane.blood_group, "A-");
        assert_eq!(jane.next_test_sequence(), Some(2));
        assert_eq!(jane.test_results[0].abnormal_count(), 0);
    }
}
