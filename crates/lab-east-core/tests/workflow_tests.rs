//! Dashboard workflow tests through the FFI object.

use lab_east_core::{
    open_records, open_records_in_memory, FfiMeasurementInput, FfiNewPatient, FfiNewTestResult,
    FfiPatientUpdate, FfiRole, FfiRouteDecision, FfiServiceConfig, LabEastError,
};

fn demo_config() -> FfiServiceConfig {
    FfiServiceConfig {
        seed_demo_data: true,
        simulate_latency: false,
    }
}

fn glucose(value: &str) -> FfiNewTestResult {
    FfiNewTestResult {
        test_name: "Fasting Glucose".to_string(),
        results: vec![FfiMeasurementInput {
            name: "glucose".to_string(),
            value: value.to_string(),
            min_range: Some(70.0),
            max_range: Some(99.0),
        }],
        comments: String::new(),
        files: Vec::new(),
    }
}

#[test]
fn test_admin_registers_and_lab_records() {
    let core = open_records_in_memory(demo_config()).unwrap();

    // Admin registers a patient with a referral
    let admin = core.login("admin".into(), "admin123".into()).unwrap();
    assert_eq!(admin.role, FfiRole::Admin);
    assert_eq!(admin.home_path, "/admin-dashboard");

    let patient = core
        .add_patient(FfiNewPatient {
            name: "Grace Hopper".into(),
            age: Some(79),
            gender: "Female".into(),
            blood_group: "B+".into(),
            contact: "555-0199".into(),
            referred_tests: Some("Fasting Glucose, Lipid Panel".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(patient.id, "PAT-003");
    assert_eq!(patient.added_by_staff.as_deref(), Some("admin"));
    core.logout().unwrap();

    // Lab admin verifies the ID and records a result
    core.login("labadmin".into(), "lab123".into()).unwrap();
    let verification = core.verify_patient_id(patient.id.clone()).unwrap();
    assert!(verification.exists);
    assert_eq!(verification.referred_tests, vec!["Fasting Glucose", "Lipid Panel"]);

    let file = core
        .upload_file("meter.txt".into(), Some("text/plain".into()), b"128 mg/dL".to_vec())
        .unwrap();
    let mut submission = glucose("128");
    submission.files.push(file);

    let test = core.add_test_result(patient.id.clone(), submission).unwrap();
    assert_eq!(test.id, "TR-001");
    assert_eq!(test.abnormal_count, 1);
    assert_eq!(test.results[0].status, "high");
    assert_eq!(test.results[0].reference_range, "70 - 99");
    assert_eq!(test.added_by_staff.as_deref(), Some("labadmin"));

    let submitted = core.submitted_tests().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].patient_id, patient.id);
    core.logout().unwrap();

    // Admin sees the result and exports a report
    core.login("admin".into(), "admin123".into()).unwrap();
    let stored = core.get_patient(patient.id.clone()).unwrap();
    assert_eq!(stored.test_results.len(), 1);

    let json = core.generate_report_json(patient.id.clone()).unwrap();
    assert!(json.contains("Comprehensive Report for Grace Hopper (PAT-003)"));
    let text = core.generate_report_text(patient.id.clone()).unwrap();
    assert!(text.contains("glucose: 128 (ref: 70 - 99) [high]"));
}

#[test]
fn test_roles_are_enforced() {
    let core = open_records_in_memory(demo_config()).unwrap();

    assert!(matches!(
        core.list_patients(),
        Err(LabEastError::Unauthorized(_))
    ));
    assert_eq!(
        core.route("/lab-dashboard".into()).unwrap(),
        FfiRouteDecision::RedirectToLogin
    );

    core.login("labadmin".into(), "lab123".into()).unwrap();
    assert_eq!(
        core.route("/admin-dashboard".into()).unwrap(),
        FfiRouteDecision::AccessDenied
    );
    assert!(matches!(
        core.delete_patient("PAT-001".into()),
        Err(LabEastError::Unauthorized(_))
    ));
    assert!(matches!(
        core.generate_report_json("PAT-001".into()),
        Err(LabEastError::Unauthorized(_))
    ));
    assert_eq!(core.list_patient_ids().unwrap(), vec!["PAT-001", "PAT-002"]);

    assert!(matches!(
        core.login("labadmin".into(), "wrong".into()),
        Err(LabEastError::Unauthorized(_))
    ));
}

#[test]
fn test_errors_map_to_ffi_variants() {
    let core = open_records_in_memory(demo_config()).unwrap();
    core.login("admin".into(), "admin123".into()).unwrap();

    assert!(matches!(
        core.get_patient("PAT-404".into()),
        Err(LabEastError::NotFound(id)) if id == "PAT-404"
    ));
    assert!(matches!(
        core.update_patient(
            "PAT-001".into(),
            FfiPatientUpdate {
                contact: Some(String::new()),
                ..Default::default()
            }
        ),
        Err(LabEastError::InvalidInput(_))
    ));
    assert!(matches!(
        core.add_patient(FfiNewPatient::default()),
        Err(LabEastError::InvalidInput(_))
    ));
}

#[test]
fn test_submitted_file_flags_are_recomputed() {
    let core = open_records_in_memory(demo_config()).unwrap();
    core.login("labadmin".into(), "lab123".into()).unwrap();

    let mut file = core
        .upload_file("meter.txt".into(), Some("text/plain".into()), b"128 mg/dL".to_vec())
        .unwrap();
    let digest = file.sha256.clone();
    file.sha256 = Some("forged".into());
    file.needs_fallback = true;

    let mut submission = glucose("128");
    submission.files.push(file);
    let test = core.add_test_result("PAT-001".into(), submission).unwrap();

    assert_eq!(test.files[0].sha256, digest);
    assert!(!test.files[0].needs_fallback);
}

#[test]
fn test_clear_records_signs_out() {
    let core = open_records_in_memory(demo_config()).unwrap();
    core.login("labadmin".into(), "lab123".into()).unwrap();
    assert!(matches!(
        core.clear_records(),
        Err(LabEastError::Unauthorized(_))
    ));
    core.logout().unwrap();

    core.login("admin".into(), "admin123".into()).unwrap();
    assert!(core.clear_records().unwrap());
    assert!(core.current_user().unwrap().is_none());

    core.login("admin".into(), "admin123".into()).unwrap();
    assert!(core.list_patients().unwrap().is_empty());
    let next = core
        .add_patient(FfiNewPatient {
            name: "Grace Hopper".into(),
            age: Some(79),
            gender: "Female".into(),
            blood_group: "B+".into(),
            contact: "555-0199".into(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(next.id, "PAT-003");
}

#[test]
fn test_session_and_records_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lab-east.db").to_string_lossy().to_string();

    {
        let core = open_records(path.clone(), demo_config()).unwrap();
        core.login("labadmin".into(), "lab123".into()).unwrap();
        core.add_test_result("PAT-001".into(), glucose("90")).unwrap();
    }

    let core = open_records(path, demo_config()).unwrap();
    let user = core.current_user().unwrap().unwrap();
    assert_eq!(user.username, "labadmin");
    assert_eq!(core.submitted_tests().unwrap().len(), 1);

    core.logout().unwrap();
    assert!(core.current_user().unwrap().is_none());

    core.login("admin".into(), "admin123".into()).unwrap();
    assert_eq!(core.list_patients().unwrap().len(), 2);
    let john = core.get_patient("PAT-001".into()).unwrap();
    assert_eq!(john.test_results[0].test_name, "Fasting Glucose");
}
