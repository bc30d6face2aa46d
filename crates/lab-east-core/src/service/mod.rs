//! Patient data service.
//!
//! [`PatientService`] is the single source of truth for patient records
//! during a session. It is built once at startup around a [`LocalStore`],
//! hydrates its in-memory collection from the store, and writes the full
//! collection back after every mutation (last write wins).

mod files;
mod referral;
mod reports;
mod seed;
mod submissions;
mod test_results;

pub use files::*;
pub use referral::*;
pub use submissions::*;

use std::collections::HashSet;

use thiserror::Error;

use crate::config::{Operation, ServiceConfig};
use crate::models::{
    parse_sequence_id, patient_id, NewPatient, Patient, PatientUpdate, PATIENT_ID_PREFIX,
};
use crate::store::{keys, LocalStore, StorageBackend};

/// Service errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// In-memory patient collection mirrored into a [`LocalStore`].
#[derive(Debug)]
pub struct PatientService<B> {
    store: LocalStore<B>,
    patients: Vec<Patient>,
    /// Highest patient sequence ever assigned, so deleted IDs are not reused
    sequence_high_water: u32,
    config: ServiceConfig,
}

impl<B: StorageBackend> PatientService<B> {
    /// Build the service and hydrate it from `store`.
    ///
    /// With `seed_demo_data` set, an empty store is seeded with demo patients.
    pub fn open(store: LocalStore<B>, config: ServiceConfig) -> Self {
        let mut service = Self {
            store,
            patients: Vec::new(),
            sequence_high_water: 0,
            config,
        };
        service.reload();

        if service.patients.is_empty() && service.config.seed_demo_data {
            tracing::info!("No patients found in local store, seeding demo data");
            service.patients = seed::demo_patients();
            service.bump_sequence(service.highest_patient_sequence());
            service.persist();
        }

        service
    }

    /// Re-read the patient collection from the store.
    ///
    /// Records are read one at a time; unreadable records and records with
    /// malformed or duplicate IDs are dropped. IDs of dropped records still
    /// count towards the sequence. Returns the number of patients loaded.
    pub fn reload(&mut self) -> usize {
        let stored: Vec<serde_json::Value> = self.store.get(keys::PATIENTS).unwrap_or_default();
        let stored_high_water = stored
            .iter()
            .filter_map(|record| record.get("id")?.as_str())
            .filter_map(|id| parse_sequence_id(PATIENT_ID_PREFIX, id))
            .max()
            .unwrap_or(0);

        self.patients = validate_collection(stored);
        let persisted_high_water: u32 = self.store.get(keys::PATIENT_SEQUENCE).unwrap_or(0);
        self.sequence_high_water = persisted_high_water.max(stored_high_water);

        tracing::debug!(count = self.patients.len(), "Loaded patients from local store");
        self.patients.len()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &LocalStore<B> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut LocalStore<B> {
        &mut self.store
    }

    /// All current patients.
    pub fn list_patients(&self) -> Vec<Patient> {
        self.pause(Operation::ListPatients);
        self.patients.clone()
    }

    /// IDs of all current patients.
    pub fn list_patient_ids(&self) -> Vec<String> {
        self.pause(Operation::ListPatientIds);
        self.patients.iter().map(|p| p.id.clone()).collect()
    }

    /// Patients whose name or ID contains `query`, case-insensitively.
    pub fn search_patients(&self, query: &str) -> Vec<Patient> {
        let needle = query.trim().to_lowercase();
        self.patients
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle) || p.id.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, patient_id: &str) -> ServiceResult<Patient> {
        self.pause(Operation::GetPatient);
        self.find(patient_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(patient_id.to_string()))
    }

    /// Register a new patient under the next sequential ID.
    pub fn add_patient(&mut self, data: NewPatient) -> ServiceResult<Patient> {
        self.pause(Operation::AddPatient);

        let missing = data.missing_fields();
        if !missing.is_empty() {
            return Err(ServiceError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let sequence = self
            .sequence_high_water
            .max(self.highest_patient_sequence())
            .checked_add(1)
            .ok_or_else(|| ServiceError::Validation("Patient IDs exhausted".into()))?;
        let patient = Patient::new(patient_id(sequence), data);
        self.patients.push(patient.clone());
        self.bump_sequence(sequence);
        self.persist();

        tracing::info!(patient_id = %patient.id, "Registered patient");
        Ok(patient)
    }

    /// Apply a partial update. The ID and test results never change.
    pub fn update_patient(
        &mut self,
        patient_id: &str,
        update: PatientUpdate,
    ) -> ServiceResult<Patient> {
        self.pause(Operation::UpdatePatient);

        let index = self
            .index_of(patient_id)
            .ok_or_else(|| ServiceError::NotFound(patient_id.to_string()))?;

        let blanked = update.blanked_fields();
        if !blanked.is_empty() {
            return Err(ServiceError::Validation(format!(
                "Required fields cannot be blank: {}",
                blanked.join(", ")
            )));
        }

        update.apply(&mut self.patients[index]);
        let updated = self.patients[index].clone();
        self.persist();

        tracing::info!(patient_id, "Updated patient");
        Ok(updated)
    }

    /// Delete a patient and their cached test results.
    pub fn delete_patient(&mut self, patient_id: &str) -> ServiceResult<()> {
        self.pause(Operation::DeletePatient);

        let before = self.patients.len();
        self.patients.retain(|p| p.id != patient_id);
        if self.patients.len() == before {
            return Err(ServiceError::NotFound(patient_id.to_string()));
        }

        self.persist();
        self.store.remove(&keys::patient_tests(patient_id));

        tracing::info!(patient_id, "Deleted patient");
        Ok(())
    }

    /// Remember the patient open on the admin dashboard. `None` clears it.
    pub fn select_patient(&mut self, patient_id: Option<&str>) -> ServiceResult<()> {
        match patient_id {
            Some(id) => {
                if self.find(id).is_none() {
                    return Err(ServiceError::NotFound(id.to_string()));
                }
                self.store.set(keys::SELECTED_PATIENT, id);
            }
            None => {
                self.store.remove(keys::SELECTED_PATIENT);
            }
        }
        Ok(())
    }

    /// The remembered patient, if it still exists.
    pub fn selected_patient(&self) -> Option<Patient> {
        let id: String = self.store.get(keys::SELECTED_PATIENT)?;
        self.find(&id).cloned()
    }

    /// Remove every patient and cached test list from memory and the store.
    ///
    /// The ID sequence is kept, so cleared IDs are not reissued.
    pub fn clear_records(&mut self) -> bool {
        self.patients.clear();
        let cleared = self.store.clear_all();
        tracing::info!(cleared, "Cleared patient records");
        cleared
    }

    fn pause(&self, op: Operation) {
        self.config.latency.pause(op);
    }

    fn find(&self, patient_id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == patient_id)
    }

    fn index_of(&self, patient_id: &str) -> Option<usize> {
        self.patients.iter().position(|p| p.id == patient_id)
    }

    fn highest_patient_sequence(&self) -> u32 {
        self.patients
            .iter()
            .filter_map(|p| parse_sequence_id(PATIENT_ID_PREFIX, &p.id))
            .max()
            .unwrap_or(0)
    }

    fn bump_sequence(&mut self, sequence: u32) {
        if sequence > self.sequence_high_water {
            self.sequence_high_water = sequence;
        }
        self.store
            .set(keys::PATIENT_SEQUENCE, &self.sequence_high_water);
    }

    /// Write the full collection. Failures are logged by the store.
    fn persist(&mut self) -> bool {
        self.store.set(keys::PATIENTS, &self.patients)
    }
}

/// Keep the readable records whose IDs are well-formed and unique.
fn validate_collection(stored: Vec<serde_json::Value>) -> Vec<Patient> {
    let mut seen = HashSet::new();
    stored
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<Patient>(record) {
            Ok(patient) => Some(patient),
            Err(e) => {
                tracing::warn!(index, error = %e, "Dropping unreadable stored patient");
                None
            }
        })
        .filter(|patient| {
            if parse_sequence_id(PATIENT_ID_PREFIX, &patient.id).is_none() {
                tracing::warn!(patient_id = %patient.id, "Dropping stored patient with malformed ID");
                return false;
            }
            if !seen.insert(patient.id.clone()) {
                tracing::warn!(patient_id = %patient.id, "Dropping stored patient with duplicate ID");
                return false;
            }
            true
        })
        .collect()
}
