//! Patient models.

use serde::{Deserialize, Serialize};

use super::ids::{parse_sequence_id, TEST_RESULT_ID_PREFIX};
use super::stored;
use super::test_result::TestResult;

/// A registered patient and their lab history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Sequential identifier (`PAT-NNN`)
    pub id: String,
    /// Full name
    pub name: String,
    /// Age in years
    #[serde(deserialize_with = "stored::age")]
    pub age: u32,
    /// Gender as entered at registration
    pub gender: String,
    /// Blood group (e.g., "O+", "A-")
    pub blood_group: String,
    /// Primary phone number
    pub contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_insurance: Option<String>,
    /// Free-text medical history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    /// Free-text allergies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    /// Directive limiting which lab tests should be performed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_tests: Option<String>,
    /// Staff member who registered the patient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by_staff: Option<String>,
    /// Registration date (`YYYY-MM-DD`)
    pub date_registered: String,
    /// Test results, in the order they were recorded
    #[serde(default)]
    pub test_results: Vec<TestResult>,
}

impl Patient {
    /// Create a patient from registration data, registered today.
    pub fn new(id: String, data: NewPatient) -> Self {
        Self {
            id,
            name: data.name.trim().to_string(),
            age: data.age.unwrap_or_default(),
            gender: data.gender,
            blood_group: data.blood_group,
            contact: data.contact,
            emergency_contact: data.emergency_contact,
            email: data.email,
            address: data.address,
            occupation: data.occupation,
            health_insurance: data.health_insurance,
            medical_history: data.medical_history,
            allergies: data.allergies,
            referred_tests: data.referred_tests,
            added_by_staff: data.added_by_staff,
            date_registered: chrono::Utc::now().format("%Y-%m-%d").to_string(),
            test_results: Vec::new(),
        }
    }

    /// Next free `TR` sequence number for this patient, or `None` once the
    /// sequence is exhausted.
    ///
    /// Legacy results with non-sequential IDs are ignored.
    pub fn next_test_sequence(&self) -> Option<u32> {
        self.test_results
            .iter()
            .filter_map(|t| parse_sequence_id(TEST_RESULT_ID_PREFIX, &t.id))
            .max()
            .unwrap_or(0)
            .checked_add(1)
    }

    /// Split the referred-tests directive into individual entries.
    ///
    /// Entries are separated by commas, semicolons, or newlines.
    pub fn referred_test_list(&self) -> Vec<String> {
        self.referred_tests
            .as_deref()
            .map(split_referred_tests)
            .unwrap_or_default()
    }
}

/// Split a free-text referral directive into trimmed, non-empty entries.
pub fn split_referred_tests(directive: &str) -> Vec<String> {
    directive
        .split(&[',', ';', '\n'][..])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Registration data for a new patient.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPatient {
    pub name: String,
    pub age: Option<u32>,
    pub gender: String,
    pub blood_group: String,
    pub contact: String,
    pub emergency_contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub occupation: Option<String>,
    pub health_insurance: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub referred_tests: Option<String>,
    pub added_by_staff: Option<String>,
}

impl NewPatient {
    /// Create registration data with the required fields filled in.
    pub fn new(
        name: impl Into<String>,
        age: u32,
        gender: impl Into<String>,
        blood_group: impl Into<String>,
        contact: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            age: Some(age),
            gender: gender.into(),
            blood_group: blood_group.into(),
            contact: contact.into(),
            ..Default::default()
        }
    }

    /// Names of required fields that are missing or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.age.is_none() {
            missing.push("age");
        }
        if self.gender.trim().is_empty() {
            missing.push("gender");
        }
        if self.blood_group.trim().is_empty() {
            missing.push("bloodGroup");
        }
        if self.contact.trim().is_empty() {
            missing.push("contact");
        }
        missing
    }
}

/// Partial update of a patient's registration data.
///
/// `None` leaves a field unchanged. The ID and test results are never
/// touched by an update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub blood_group: Option<String>,
    pub contact: Option<String>,
    pub emergency_contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub occupation: Option<String>,
    pub health_insurance: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub referred_tests: Option<String>,
}

impl PatientUpdate {
    /// Required fields that this update would blank out.
    pub fn blanked_fields(&self) -> Vec<&'static str> {
        let checks = [
            ("name", &self.name),
            ("gender", &self.gender),
            ("bloodGroup", &self.blood_group),
            ("contact", &self.contact),
        ];
        checks
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_some_and(|v| v.trim().is_empty()))
            .map(|(field, _)| field)
            .collect()
    }

    /// Apply the update to a patient in place.
    pub fn apply(self, patient: &mut Patient) {
        if let Some(name) = self.name {
            patient.name = name.trim().to_string();
        }
        if let Some(age) = self.age {
            patient.age = age;
        }
        if let Some(gender) = self.gender {
            patient.gender = gender;
        }
        if let Some(blood_group) = self.blood_group {
            patient.blood_group = blood_group;
        }
        if let Some(contact) = self.contact {
            patient.contact = contact;
        }
        if self.emergency_contact.is_some() {
            patient.emergency_contact = self.emergency_contact;
        }
        if self.email.is_some() {
            patient.email = self.email;
        }
        if self.address.is_some() {
            patient.address = self.address;
        }
        if self.occupation.is_some() {
            patient.occupation = self.occupation;
        }
        if self.health_insurance.is_some() {
            patient.health_insurance = self.health_insurance;
        }
        if self.medical_history.is_some() {
            patient.medical_history = self.medical_history;
        }
        if self.allergies.is_some() {
            patient.allergies = self.allergies;
        }
        if self.referred_tests.is_some() {
            patient.referred_tests = self.referred_tests;
        }
    }
}
