//! Test result operations.

use super::files::attach_file;
use super::referral::match_referred_test;
use super::{PatientService, ServiceError, ServiceResult};
use crate::config::Operation;
use crate::models::{test_result_id, NewTestResult, TestResult};
use crate::store::{keys, StorageBackend};

impl<B: StorageBackend> PatientService<B> {
    /// Append a test result to a patient's record.
    ///
    /// Tests outside the patient's referred tests are accepted with a warning.
    pub fn add_test_result(
        &mut self,
        patient_id: &str,
        mut data: NewTestResult,
    ) -> ServiceResult<TestResult> {
        self.pause(Operation::AddTestResult);

        let index = self
            .index_of(patient_id)
            .ok_or_else(|| ServiceError::NotFound(patient_id.to_string()))?;

        if let Some(problem) = data.validation_problem() {
            return Err(ServiceError::Validation(problem));
        }

        let referral = match_referred_test(&data.test_name, &self.patients[index].referred_test_list());
        if !referral.is_allowed() {
            tracing::warn!(
                patient_id,
                test_name = %data.test_name,
                "Recording test outside the patient's referred tests"
            );
        }

        data.files = data.files.into_iter().map(attach_file).collect();
        let patient = &mut self.patients[index];
        let sequence = patient.next_test_sequence().ok_or_else(|| {
            ServiceError::Validation(format!("Test result IDs exhausted for {patient_id}"))
        })?;
        let test = TestResult::new(test_result_id(sequence), data);
        patient.test_results.push(test.clone());
        let tests = patient.test_results.clone();

        self.persist();
        self.store.set(&keys::patient_tests(patient_id), &tests);

        tracing::info!(patient_id, test_id = %test.id, "Recorded test result");
        Ok(test)
    }

    /// Test results recorded for a patient, oldest first.
    ///
    /// Falls back to the per-patient cache when the patient is missing from
    /// the collection (e.g. dropped during hydration).
    pub fn get_test_results(&self, patient_id: &str) -> ServiceResult<Vec<TestResult>> {
        if let Some(patient) = self.find(patient_id) {
            return Ok(patient.test_results.clone());
        }

        self.store
            .get::<Vec<TestResult>>(&keys::patient_tests(patient_id))
            .ok_or_else(|| ServiceError::NotFound(patient_id.to_string()))
    }
}
