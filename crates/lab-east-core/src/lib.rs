//! LAB-east Core Library
//!
//! Local-first patient records and lab results for a small clinic laboratory.
//!
//! # Architecture
//!
//! ```text
//!   Admin dashboard                      Lab dashboard
//!   (register, edit, report)             (verify ID, record tests)
//!          │                                    │
//!          └──────────────┬─────────────────────┘
//!                         │  role-gated Session
//!                         ▼
//!                 ┌───────────────────┐
//!                 │  PatientService   │  in-memory collection,
//!                 │                   │  sequential PAT / TR ids
//!                 └─────────┬─────────┘
//!                           │ full write-back after every mutation
//!                           ▼
//!                 ┌───────────────────┐
//!                 │    LocalStore     │  JSON values under fixed keys,
//!                 │  (SQLite/memory)  │  failures logged and swallowed
//!                 └───────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (Patient, TestResult, Measurement, User)
//! - [`store`]: Key-value local store and its backends
//! - [`service`]: Patient data service
//! - [`auth`]: Mock login and session state
//! - [`export`]: Comprehensive patient reports
//! - [`config`]: Service configuration and simulated latency

pub mod auth;
pub mod config;
pub mod export;
pub mod logging;
pub mod models;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use auth::{AuthService, Route, RouteDecision, Session};
pub use config::{LatencyProfile, ServiceConfig};
pub use export::PatientReport;
pub use models::{
    FileRef, Measurement, MeasurementStatus, NewPatient, NewTestResult, Patient, PatientUpdate,
    Role, TestResult, User,
};
pub use service::{PatientService, ServiceError};
pub use store::{LocalStore, MemoryBackend, SqliteBackend, StorageBackend};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use service::FileUpload;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum LabEastError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<ServiceError> for LabEastError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(id) => LabEastError::NotFound(id),
            ServiceError::Validation(msg) => LabEastError::InvalidInput(msg),
        }
    }
}

impl From<auth::AuthError> for LabEastError {
    fn from(e: auth::AuthError) -> Self {
        LabEastError::Unauthorized(e.to_string())
    }
}

impl From<store::StoreError> for LabEastError {
    fn from(e: store::StoreError) -> Self {
        LabEastError::StorageError(e.to_string())
    }
}

impl From<serde_json::Error> for LabEastError {
    fn from(e: serde_json::Error) -> Self {
        LabEastError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for LabEastError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        LabEastError::StorageError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a records database at the given path.
#[uniffi::export]
pub fn open_records(
    path: String,
    config: FfiServiceConfig,
) -> Result<Arc<LabEastCore>, LabEastError> {
    let backend = SqliteBackend::open(&path)?;
    Ok(Arc::new(LabEastCore::new(backend, config.into())))
}

/// Create an in-memory records database (for testing).
#[uniffi::export]
pub fn open_records_in_memory(config: FfiServiceConfig) -> Result<Arc<LabEastCore>, LabEastError> {
    let backend = SqliteBackend::open_in_memory()?;
    Ok(Arc::new(LabEastCore::new(backend, config.into())))
}

// =========================================================================
// Main API Object
// =========================================================================

struct CoreState {
    service: PatientService<SqliteBackend>,
    auth: AuthService,
    session: Session,
}

impl CoreState {
    fn require_role(&self, roles: &[Role]) -> Result<User, LabEastError> {
        Ok(self.session.require_role(roles)?.clone())
    }
}

const ANY_STAFF: &[Role] = &[Role::Admin, Role::LabAdmin];

/// Thread-safe records wrapper for FFI.
///
/// Every call is gated on the role of the signed-in user.
#[derive(uniffi::Object)]
pub struct LabEastCore {
    state: Arc<Mutex<CoreState>>,
}

impl LabEastCore {
    fn new(backend: SqliteBackend, config: ServiceConfig) -> Self {
        let auth = AuthService::new(config.latency.clone());
        let mut service = PatientService::open(LocalStore::new(backend), config);
        let session = Session::restore(service.store_mut());
        Self {
            state: Arc::new(Mutex::new(CoreState {
                service,
                auth,
                session,
            })),
        }
    }
}

#[uniffi::export]
impl LabEastCore {
    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Sign in and persist the session.
    pub fn login(&self, username: String, password: String) -> Result<FfiUser, LabEastError> {
        let mut guard = self.state.lock()?;
        let state = &mut *guard;
        let response = state.auth.login(&username, &password)?;
        let user = response.user.clone();
        state.session.sign_in(response, state.service.store_mut());
        Ok(user.into())
    }

    /// Sign out and clear user-scoped data.
    pub fn logout(&self) -> Result<(), LabEastError> {
        let mut guard = self.state.lock()?;
        let state = &mut *guard;
        state.session.sign_out(state.service.store_mut());
        Ok(())
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Result<Option<FfiUser>, LabEastError> {
        let state = self.state.lock()?;
        Ok(state.session.user().cloned().map(|u| u.into()))
    }

    /// Decide whether the session may open `path`.
    pub fn route(&self, path: String) -> Result<FfiRouteDecision, LabEastError> {
        let state = self.state.lock()?;
        Ok(state.session.route(Route::from_path(&path)).into())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// All patients (admin).
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, LabEastError> {
        let state = self.state.lock()?;
        state.require_role(&[Role::Admin])?;
        Ok(state
            .service
            .list_patients()
            .into_iter()
            .map(|p| p.into())
            .collect())
    }

    /// Search patients by name or ID (admin).
    pub fn search_patients(&self, query: String) -> Result<Vec<FfiPatient>, LabEastError> {
        let state = self.state.lock()?;
        state.require_role(&[Role::Admin])?;
        Ok(state
            .service
            .search_patients(&query)
            .into_iter()
            .map(|p| p.into())
            .collect())
    }

    /// IDs of all patients.
    pub fn list_patient_ids(&self) -> Result<Vec<String>, LabEastError> {
        let state = self.state.lock()?;
        state.require_role(ANY_STAFF)?;
        Ok(state.service.list_patient_ids())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, patient_id: String) -> Result<FfiPatient, LabEastError> {
        let state = self.state.lock()?;
        state.require_role(ANY_STAFF)?;
        Ok(state.service.get_patient(&patient_id)?.into())
    }

    /// Register a patient (admin). Defaults `added_by_staff` to the signed-in user.
    pub fn add_patient(&self, patient: FfiNewPatient) -> Result<FfiPatient, LabEastError> {
        let mut state = self.state.lock()?;
        let user = state.require_role(&[Role::Admin])?;
        let mut data: NewPatient = patient.into();
        if data.added_by_staff.as_deref().map_or(true, |s| s.trim().is_empty()) {
            data.added_by_staff = Some(user.username);
        }
        Ok(state.service.add_patient(data)?.into())
    }

    /// Apply a partial update (admin).
    pub fn update_patient(
        &self,
        patient_id: String,
        update: FfiPatientUpdate,
    ) -> Result<FfiPatient, LabEastError> {
        let mut state = self.state.lock()?;
        state.require_role(&[Role::Admin])?;
        Ok(state.service.update_patient(&patient_id, update.into())?.into())
    }

    /// Delete a patient (admin).
    pub fn delete_patient(&self, patient_id: String) -> Result<(), LabEastError> {
        let mut state = self.state.lock()?;
        state.require_role(&[Role::Admin])?;
        state.service.delete_patient(&patient_id)?;
        Ok(())
    }

    /// Remember the patient open on the admin dashboard.
    pub fn select_patient(&self, patient_id: Option<String>) -> Result<(), LabEastError> {
        let mut state = self.state.lock()?;
        state.require_role(&[Role::Admin])?;
        state.service.select_patient(patient_id.as_deref())?;
        Ok(())
    }

    /// The remembered patient, if any.
    pub fn selected_patient(&self) -> Result<Option<FfiPatient>, LabEastError> {
        let state = self.state.lock()?;
        state.require_role(&[Role::Admin])?;
        Ok(state.service.selected_patient().map(|p| p.into()))
    }

    /// Remove all patient records and sign out (admin).
    ///
    /// Report backups and the patient ID sequence are kept.
    pub fn clear_records(&self) -> Result<bool, LabEastError> {
        let mut guard = self.state.lock()?;
        let state = &mut *guard;
        state.require_role(&[Role::Admin])?;
        let cleared = state.service.clear_records();
        state.session.sign_out(state.service.store_mut());
        Ok(cleared)
    }

    // =========================================================================
    // Lab Operations
    // =========================================================================

    /// Check whether a patient ID exists (lab admin).
    pub fn verify_patient_id(
        &self,
        patient_id: String,
    ) -> Result<FfiPatientVerification, LabEastError> {
        let state = self.state.lock()?;
        state.require_role(&[Role::LabAdmin])?;
        let verification = state.service.verify_patient_id(&patient_id)?;
        Ok(FfiPatientVerification {
            id: verification.id,
            exists: verification.exists,
            referred_tests: verification.referred_tests,
        })
    }

    /// Encode a file for attachment (lab admin).
    pub fn upload_file(
        &self,
        name: String,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<FfiFileRef, LabEastError> {
        let state = self.state.lock()?;
        state.require_role(&[Role::LabAdmin])?;
        let upload = FileUpload {
            name,
            mime_type,
            bytes,
        };
        Ok(state.service.upload_file(upload).into())
    }

    /// Record a test result and add it to the session's submissions (lab admin).
    pub fn add_test_result(
        &self,
        patient_id: String,
        test: FfiNewTestResult,
    ) -> Result<FfiTestResult, LabEastError> {
        let mut state = self.state.lock()?;
        let user = state.require_role(&[Role::LabAdmin])?;
        let mut data: NewTestResult = test.into();
        data.added_by_staff = Some(user.username);
        let submitted = state.service.submit_test_result(&patient_id, data)?;
        Ok(submitted.test.into())
    }

    /// Test results of a patient, oldest first.
    pub fn get_test_results(&self, patient_id: String) -> Result<Vec<FfiTestResult>, LabEastError> {
        let state = self.state.lock()?;
        state.require_role(ANY_STAFF)?;
        let tests = state.service.get_test_results(&patient_id)?;
        Ok(tests.into_iter().map(|t| t.into()).collect())
    }

    /// Tests submitted this session, newest first (lab admin).
    pub fn submitted_tests(&self) -> Result<Vec<FfiSubmittedTest>, LabEastError> {
        let state = self.state.lock()?;
        state.require_role(&[Role::LabAdmin])?;
        Ok(state
            .service
            .submitted_tests()
            .into_iter()
            .map(|s| FfiSubmittedTest {
                patient_id: s.patient_id,
                submitted_at: s.submitted_at,
                test: s.test.into(),
            })
            .collect())
    }

    // =========================================================================
    // Report Operations
    // =========================================================================

    /// Comprehensive report as JSON (admin).
    pub fn generate_report_json(&self, patient_id: String) -> Result<String, LabEastError> {
        let mut state = self.state.lock()?;
        state.require_role(&[Role::Admin])?;
        let report = state.service.generate_report(&patient_id)?;
        Ok(report.to_json()?)
    }

    /// Comprehensive report as printable text (admin).
    pub fn generate_report_text(&self, patient_id: String) -> Result<String, LabEastError> {
        let mut state = self.state.lock()?;
        state.require_role(&[Role::Admin])?;
        let report = state.service.generate_report(&patient_id)?;
        Ok(report.to_text())
    }

    /// Measurements of a patient as CSV (admin).
    pub fn generate_report_csv(&self, patient_id: String) -> Result<String, LabEastError> {
        let mut state = self.state.lock()?;
        state.require_role(&[Role::Admin])?;
        let report = state.service.generate_report(&patient_id)?;
        Ok(report.to_csv())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe service configuration.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiServiceConfig {
    pub seed_demo_data: bool,
    /// Use the browser build's simulated delays
    pub simulate_latency: bool,
}

impl From<FfiServiceConfig> for ServiceConfig {
    fn from(config: FfiServiceConfig) -> Self {
        ServiceConfig {
            seed_demo_data: config.seed_demo_data,
            latency: if config.simulate_latency {
                LatencyProfile::browser()
            } else {
                LatencyProfile::none()
            },
        }
    }
}

/// FFI-safe role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiRole {
    Admin,
    LabAdmin,
}

impl From<Role> for FfiRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => FfiRole::Admin,
            Role::LabAdmin => FfiRole::LabAdmin,
        }
    }
}

/// FFI-safe user.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUser {
    pub id: u32,
    pub username: String,
    pub name: String,
    pub role: FfiRole,
    /// Dashboard path to open after login
    pub home_path: String,
}

impl From<User> for FfiUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            home_path: user.role.home_route().path().to_string(),
            username: user.username,
            name: user.name,
            role: user.role.into(),
        }
    }
}

/// FFI-safe route decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiRouteDecision {
    Allow,
    RedirectToLogin,
    AccessDenied,
}

impl From<RouteDecision> for FfiRouteDecision {
    fn from(decision: RouteDecision) -> Self {
        match decision {
            RouteDecision::Allow => FfiRouteDecision::Allow,
            RouteDecision::RedirectToLogin => FfiRouteDecision::RedirectToLogin,
            RouteDecision::AccessDenied => FfiRouteDecision::AccessDenied,
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub age: u32,
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
    pub date_registered: String,
    pub test_results: Vec<FfiTestResult>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            age: patient.age,
            gender: patient.gender,
            blood_group: patient.blood_group,
            contact: patient.contact,
            emergency_contact: patient.emergency_contact,
            email: patient.email,
            address: patient.address,
            occupation: patient.occupation,
            health_insurance: patient.health_insurance,
            medical_history: patient.medical_history,
            allergies: patient.allergies,
            referred_tests: patient.referred_tests,
            added_by_staff: patient.added_by_staff,
            date_registered: patient.date_registered,
            test_results: patient.test_results.into_iter().map(|t| t.into()).collect(),
        }
    }
}

/// FFI-safe registration data.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiNewPatient {
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

impl From<FfiNewPatient> for NewPatient {
    fn from(p: FfiNewPatient) -> Self {
        NewPatient {
            name: p.name,
            age: p.age,
            gender: p.gender,
            blood_group: p.blood_group,
            contact: p.contact,
            emergency_contact: p.emergency_contact,
            email: p.email,
            address: p.address,
            occupation: p.occupation,
            health_insurance: p.health_insurance,
            medical_history: p.medical_history,
            allergies: p.allergies,
            referred_tests: p.referred_tests,
            added_by_staff: p.added_by_staff,
        }
    }
}

/// FFI-safe partial update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiPatientUpdate {
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

impl From<FfiPatientUpdate> for PatientUpdate {
    fn from(u: FfiPatientUpdate) -> Self {
        PatientUpdate {
            name: u.name,
            age: u.age,
            gender: u.gender,
            blood_group: u.blood_group,
            contact: u.contact,
            emergency_contact: u.emergency_contact,
            email: u.email,
            address: u.address,
            occupation: u.occupation,
            health_insurance: u.health_insurance,
            medical_history: u.medical_history,
            allergies: u.allergies,
            referred_tests: u.referred_tests,
        }
    }
}

/// FFI-safe measurement.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMeasurement {
    pub name: String,
    pub value: String,
    pub min_range: Option<f64>,
    pub max_range: Option<f64>,
    /// "normal", "high" or "low"
    pub status: String,
    pub reference_range: String,
}

/// FFI-safe measurement input; the status is derived.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMeasurementInput {
    pub name: String,
    pub value: String,
    pub min_range: Option<f64>,
    pub max_range: Option<f64>,
}

/// FFI-safe file reference.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFileRef {
    pub name: String,
    pub mime_type: String,
    pub size_label: String,
    pub size_bytes: u64,
    pub sha256: Option<String>,
    pub url: String,
    pub needs_fallback: bool,
}

impl From<FileRef> for FfiFileRef {
    fn from(file: FileRef) -> Self {
        Self {
            name: file.name,
            mime_type: file.mime_type,
            size_label: file.size_label,
            size_bytes: file.size_bytes,
            sha256: file.sha256,
            url: file.url,
            needs_fallback: file.needs_fallback,
        }
    }
}

impl From<FfiFileRef> for FileRef {
    fn from(file: FfiFileRef) -> Self {
        FileRef {
            name: file.name,
            mime_type: file.mime_type,
            size_label: file.size_label,
            size_bytes: file.size_bytes,
            sha256: file.sha256,
            url: file.url,
            needs_fallback: file.needs_fallback,
        }
    }
}

/// FFI-safe test result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTestResult {
    pub id: String,
    pub test_name: String,
    pub test_date: String,
    pub time_stamp: Option<String>,
    pub results: Vec<FfiMeasurement>,
    pub abnormal_count: u32,
    pub comments: String,
    pub added_by_staff: Option<String>,
    pub files: Vec<FfiFileRef>,
}

impl From<TestResult> for FfiTestResult {
    fn from(test: TestResult) -> Self {
        let abnormal_count = test.abnormal_count() as u32;
        Self {
            id: test.id,
            test_name: test.test_name,
            test_date: test.test_date,
            time_stamp: test.time_stamp,
            results: test
                .results
                .into_iter()
                .map(|(name, m)| FfiMeasurement {
                    name,
                    status: m.status.as_str().to_string(),
                    reference_range: m.reference_range(),
                    value: m.value,
                    min_range: m.min_range,
                    max_range: m.max_range,
                })
                .collect(),
            abnormal_count,
            comments: test.comments,
            added_by_staff: test.added_by_staff,
            files: test.files.into_iter().map(|f| f.into()).collect(),
        }
    }
}

/// FFI-safe test submission.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewTestResult {
    pub test_name: String,
    pub results: Vec<FfiMeasurementInput>,
    pub comments: String,
    pub files: Vec<FfiFileRef>,
}

impl From<FfiNewTestResult> for NewTestResult {
    fn from(test: FfiNewTestResult) -> Self {
        let results: IndexMap<String, Measurement> = test
            .results
            .into_iter()
            .map(|m| (m.name, Measurement::new(m.value, m.min_range, m.max_range)))
            .collect();
        NewTestResult {
            test_name: test.test_name,
            results,
            comments: test.comments,
            added_by_staff: None,
            files: test.files.into_iter().map(|f| f.into()).collect(),
        }
    }
}

/// FFI-safe patient ID check.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientVerification {
    pub id: String,
    pub exists: bool,
    pub referred_tests: Vec<String>,
}

/// FFI-safe submitted test.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSubmittedTest {
    pub patient_id: String,
    pub submitted_at: String,
    pub test: FfiTestResult,
}
