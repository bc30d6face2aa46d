//! Lab session cache of submitted tests.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{PatientService, ServiceResult};
use crate::models::{NewTestResult, TestResult};
use crate::store::{keys, StorageBackend};

/// A test result as submitted during the current lab session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedTest {
    #[serde(flatten)]
    pub test: TestResult,
    pub patient_id: String,
    /// Submission time (RFC 3339)
    pub submitted_at: String,
}

impl<B: StorageBackend> PatientService<B> {
    /// Record a test and remember it in the session cache.
    pub fn submit_test_result(
        &mut self,
        patient_id: &str,
        data: NewTestResult,
    ) -> ServiceResult<SubmittedTest> {
        let test = self.add_test_result(patient_id, data)?;
        Ok(self.record_submission(patient_id, test))
    }

    /// Prepend a recorded test to the session cache.
    pub fn record_submission(&mut self, patient_id: &str, test: TestResult) -> SubmittedTest {
        let entry = SubmittedTest {
            test,
            patient_id: patient_id.to_string(),
            submitted_at: Utc::now().to_rfc3339(),
        };

        let mut cached = self.submitted_tests();
        cached.insert(0, entry.clone());
        self.store.set(keys::SUBMITTED_TESTS, &cached);
        entry
    }

    /// Tests submitted this session, newest first.
    pub fn submitted_tests(&self) -> Vec<SubmittedTest> {
        self.store.get(keys::SUBMITTED_TESTS).unwrap_or_default()
    }

    /// Forget the session cache.
    pub fn clear_submissions(&mut self) -> bool {
        self.store.remove(keys::SUBMITTED_TESTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::models::{Measurement, NewPatient};
    use crate::store::{LocalStore, MemoryBackend};

    fn glucose() -> NewTestResult {
        NewTestResult::new("Fasting Glucose")
            .with_measurement("glucose", Measurement::new("92", Some(70.0), Some(99.0)))
    }

    #[test]
    fn test_submissions_newest_first() {
        let mut service =
            PatientService::open(LocalStore::new(MemoryBackend::new()), ServiceConfig::default());
        let patient = service
            .add_patient(NewPatient::new("Ada", 36, "Female", "AB+", "555-0111"))
            .unwrap();

        let first = service.submit_test_result(&patient.id, glucose()).unwrap();
        let second = service.submit_test_result(&patient.id, glucose()).unwrap();

        let cached = service.submitted_tests();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].test.id, second.test.id);
        assert_eq!(cached[1].test.id, first.test.id);
        assert_eq!(cached[0].patient_id, patient.id);

        assert!(service.clear_submissions());
        assert!(service.submitted_tests().is_empty());
    }

    #[test]
    fn test_failed_submission_is_not_cached() {
        let mut service =
            PatientService::open(LocalStore::new(MemoryBackend::new()), ServiceConfig::default());
        assert!(service.submit_test_result("PAT-001", glucose()).is_err());
        assert!(service.submitted_tests().is_empty());
    }

    #[test]
    fn test_submitted_test_wire_format() {
        let test = TestResult::new("TR-001".into(), glucose());
        let entry = SubmittedTest {
            test,
            patient_id: "PAT-001".into(),
            submitted_at: "2024-01-01T00:00:00+00:00".into(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], "TR-001");
        assert_eq!(json["testName"], "Fasting Glucose");
        assert_eq!(json["patientId"], "PAT-001");
        assert!(json.get("test").is_none());
    }
}
