//! Report generation.

use chrono::Utc;

use super::{PatientService, ServiceError, ServiceResult};
use crate::config::Operation;
use crate::export::PatientReport;
use crate::store::{keys, StorageBackend};

impl<B: StorageBackend> PatientService<B> {
    /// Build a comprehensive report for a patient and keep a backup copy.
    ///
    /// The backup is best-effort; a failed write still returns the report.
    pub fn generate_report(&mut self, patient_id: &str) -> ServiceResult<PatientReport> {
        self.pause(Operation::GenerateReport);

        let patient = self
            .find(patient_id)
            .ok_or_else(|| ServiceError::NotFound(patient_id.to_string()))?;

        let now = Utc::now();
        let report = PatientReport::from_patient(patient, now);

        let backup_key = keys::report_backup(patient_id, now.timestamp_millis());
        if self.store.set(&backup_key, &report) {
            tracing::info!(patient_id, key = %backup_key, "Stored report backup");
        }

        Ok(report)
    }

    /// Keys of stored report backups for a patient, oldest first.
    pub fn report_backups(&self, patient_id: &str) -> Vec<String> {
        let prefix = format!("{}{}_", keys::REPORT_PREFIX, patient_id);
        self.store.keys_with_prefix(&prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::store::{LocalStore, MemoryBackend};

    fn seeded_service() -> PatientService<MemoryBackend> {
        let config = ServiceConfig {
            seed_demo_data: true,
            ..Default::default()
        };
        PatientService::open(LocalStore::new(MemoryBackend::new()), config)
    }

    #[test]
    fn test_generate_report_stores_backup() {
        let mut service = seeded_service();
        let report = service.generate_report("PAT-002").unwrap();

        assert_eq!(report.test_count, 1);
        assert!(report.includes_files);

        let backups = service.report_backups("PAT-002");
        assert_eq!(backups.len(), 1);
        let stored: PatientReport = service.store().get(&backups[0]).unwrap();
        assert_eq!(stored, report);

        assert!(service.report_backups("PAT-001").is_empty());
    }

    #[test]
    fn test_generate_report_missing_patient() {
        let mut service = seeded_service();
        assert!(matches!(
            service.generate_report("PAT-404"),
            Err(ServiceError::NotFound(_))
        ));
        assert!(service.report_backups("PAT-404").is_empty());
    }

    #[test]
    fn test_failed_backup_still_returns_report() {
        let mut service = seeded_service();
        let usage = service.store().backend().usage_bytes();
        service.store_mut().backend_mut().set_quota(Some(usage));

        let report = service.generate_report("PAT-001").unwrap();
        assert_eq!(report.patient_info.name, "John Doe");
        assert!(service.report_backups("PAT-001").is_empty());
    }
}
