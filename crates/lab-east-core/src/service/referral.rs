//! Patient ID verification and referred-test matching.
//!
//! Lab staff verify a patient ID before recording results. The patient's
//! referred-tests directive is a soft gate: a test name is allowed when it
//! contains, or is contained by, one of the referred entries
//! (case-insensitive). When several entries match, the one closest to the
//! test name by Jaro-Winkler similarity wins; ties keep directive order.

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use super::{PatientService, ServiceError, ServiceResult};
use crate::config::Operation;
use crate::store::StorageBackend;

/// Result of verifying a patient ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientVerification {
    /// The ID that was checked (trimmed)
    pub id: String,
    pub exists: bool,
    /// Referred tests of the patient; empty means unrestricted
    pub referred_tests: Vec<String>,
}

/// Outcome of matching a test name against referred tests.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferralMatch {
    /// The patient has no referral directive
    Unrestricted,
    /// The test matched a referred entry
    Matched { entry: String, similarity: f64 },
    /// The patient has referred tests and none matched
    NotReferred,
}

impl ReferralMatch {
    /// Whether the test may be recorded without a warning.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, ReferralMatch::NotReferred)
    }
}

/// Match `test_name` against the referred entries.
pub fn match_referred_test(test_name: &str, referred: &[String]) -> ReferralMatch {
    if referred.is_empty() {
        return ReferralMatch::Unrestricted;
    }

    let name = test_name.trim().to_lowercase();
    if name.is_empty() {
        return ReferralMatch::NotReferred;
    }

    let mut best: Option<(&String, f64)> = None;
    for entry in referred {
        let candidate = entry.trim().to_lowercase();
        if candidate.is_empty() || !(candidate.contains(&name) || name.contains(&candidate)) {
            continue;
        }
        let similarity = jaro_winkler(&name, &candidate);
        if best.map_or(true, |(_, score)| similarity > score) {
            best = Some((entry, similarity));
        }
    }

    match best {
        Some((entry, similarity)) => ReferralMatch::Matched {
            entry: entry.clone(),
            similarity,
        },
        None => ReferralMatch::NotReferred,
    }
}

impl<B: StorageBackend> PatientService<B> {
    /// Check whether a patient ID exists.
    ///
    /// An unknown ID is not an error; a blank one is.
    pub fn verify_patient_id(&self, patient_id: &str) -> ServiceResult<PatientVerification> {
        self.pause(Operation::VerifyPatientId);

        let id = patient_id.trim();
        if id.is_empty() {
            return Err(ServiceError::Validation(
                "Please enter a valid patient ID".into(),
            ));
        }

        let verification = match self.find(id) {
            Some(patient) => PatientVerification {
                id: patient.id.clone(),
                exists: true,
                referred_tests: patient.referred_test_list(),
            },
            None => PatientVerification {
                id: id.to_string(),
                exists: false,
                referred_tests: Vec::new(),
            },
        };
        Ok(verification)
    }

    /// Match a test name against a patient's referred tests.
    pub fn check_referred_test(
        &self,
        patient_id: &str,
        test_name: &str,
    ) -> ServiceResult<ReferralMatch> {
        let patient = self
            .find(patient_id)
            .ok_or_else(|| ServiceError::NotFound(patient_id.to_string()))?;
        Ok(match_referred_test(test_name, &patient.referred_test_list()))
    }
}
