//! Runtime configuration.
//!
//! Resolved once at startup and passed into the services. Nothing here reads
//! process-wide environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Operations that carry a simulated round-trip delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListPatients,
    GetPatient,
    AddPatient,
    UpdatePatient,
    DeletePatient,
    AddTestResult,
    ListPatientIds,
    VerifyPatientId,
    UploadFile,
    GenerateReport,
    Login,
    VerifyToken,
}

/// Simulated latency per operation, in milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LatencyProfile {
    pub list_patients_ms: u64,
    pub get_patient_ms: u64,
    pub add_patient_ms: u64,
    pub update_patient_ms: u64,
    pub delete_patient_ms: u64,
    pub add_test_result_ms: u64,
    pub list_patient_ids_ms: u64,
    pub verify_patient_id_ms: u64,
    pub upload_file_ms: u64,
    pub generate_report_ms: u64,
    pub login_ms: u64,
    pub verify_token_ms: u64,
}

impl LatencyProfile {
    /// No delays (the default).
    pub fn none() -> Self {
        Self::default()
    }

    /// Delays matching the mock backend of the browser build.
    pub fn browser() -> Self {
        Self {
            list_patients_ms: 500,
            get_patient_ms: 300,
            add_patient_ms: 600,
            update_patient_ms: 400,
            delete_patient_ms: 500,
            add_test_result_ms: 400,
            list_patient_ids_ms: 200,
            verify_patient_id_ms: 200,
            upload_file_ms: 800,
            generate_report_ms: 1000,
            login_ms: 500,
            verify_token_ms: 300,
        }
    }

    /// Delay configured for `op`.
    pub fn delay(&self, op: Operation) -> Duration {
        let ms = match op {
            Operation::ListPatients => self.list_patients_ms,
            Operation::GetPatient => self.get_patient_ms,
            Operation::AddPatient => self.add_patient_ms,
            Operation::UpdatePatient => self.update_patient_ms,
            Operation::DeletePatient => self.delete_patient_ms,
            Operation::AddTestResult => self.add_test_result_ms,
            Operation::ListPatientIds => self.list_patient_ids_ms,
            Operation::VerifyPatientId => self.verify_patient_id_ms,
            Operation::UploadFile => self.upload_file_ms,
            Operation::GenerateReport => self.generate_report_ms,
            Operation::Login => self.login_ms,
            Operation::VerifyToken => self.verify_token_ms,
        };
        Duration::from_millis(ms)
    }

    /// Block the calling thread for the configured delay.
    pub fn pause(&self, op: Operation) {
        let delay = self.delay(op);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Seed the two demo patients when the store holds none
    pub seed_demo_data: bool,
    /// Simulated latency
    pub latency: LatencyProfile,
}

impl ServiceConfig {
    /// Browser-build behavior: demo data and simulated delays.
    pub fn simulated() -> Self {
        Self {
            seed_demo_data: true,
            latency: LatencyProfile::browser(),
        }
    }

    /// Parse configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
