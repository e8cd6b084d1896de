use std::fs;

use triage_core::{
    partition_queues, PatientRepository, PatientStatus, TriageConfig, TriageLevel, TriageService,
    VitalSigns,
};
use triage_json::{
    collection_to_string, parse_collection_str, parse_vitals_str, JsonFileRepository,
};

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn fixture() -> String {
    fs::read_to_string(fixture_path("er_board.json")).expect("Không đọc được dữ liệu mẫu")
}

fn names(patients: &[triage_core::Patient]) -> Vec<&str> {
    patients.iter().map(|p| p.full_name.as_str()).collect()
}

#[test]
fn board_fixture_partitions_into_queues() {
    let patients = parse_collection_str(&fixture()).expect("fixture hợp lệ");
    assert_eq!(patients.len(), 4);

    let queues = partition_queues(&patients);
    assert_eq!(names(&queues.unscheduled), ["Nguyen Thi Lan"]);
    assert_eq!(names(&queues.scheduled), ["Tran Van Binh", "Le Minh Chau"]);
    assert_eq!(queues.summary().requires_immediate, 1);

    let chau = &queues.scheduled[1];
    let analysis = chau.ai_analysis.as_ref().expect("có phân tích AI");
    assert_eq!(analysis.recommended_actions.len(), 2);
    assert!(!analysis.is_acknowledged());
}

#[test]
fn board_fixture_survives_a_write_and_reload() {
    let patients = parse_collection_str(&fixture()).unwrap();
    let serialized = collection_to_string(&patients).unwrap();
    let reloaded = parse_collection_str(&serialized).unwrap();
    assert_eq!(patients, reloaded);

    let binh = reloaded
        .iter()
        .find(|p| p.full_name == "Tran Van Binh")
        .unwrap();
    assert_eq!(binh.vital_signs.as_ref().unwrap().temperature, Some(37.1));
}

#[test]
fn service_over_file_store_persists_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.json");
    fs::write(&path, fixture()).unwrap();

    let store = JsonFileRepository::open(&path).unwrap();
    let service = TriageService::new(store, TriageConfig::default());

    let lan = service
        .dashboard(Some("lan"))
        .unwrap()
        .unscheduled
        .remove(0);

    let vitals: VitalSigns = parse_vitals_str(
        r#"{ "heartRate": "58", "bloodPressureSys": "98", "temperature": "97.0", "temperatureUnit": "F", "o2Saturation": "96" }"#,
    )
    .unwrap();
    let scored = service.record_vitals(lan.id, vitals).unwrap();
    // HR cảnh báo (+1), HA cảnh báo (+1), 36.1 °C bình thường, SpO2 bình thường.
    assert_eq!(scored.triage_level, TriageLevel::SemiUrgent);

    let reopened = JsonFileRepository::open(&path).unwrap();
    let stored = reopened.find_by_id(lan.id).unwrap().unwrap();
    assert_eq!(stored.triage_level, TriageLevel::SemiUrgent);
    assert_eq!(stored.status, PatientStatus::Triaged);
    assert!(stored.triage_at.is_some());

    let queues = TriageService::new(reopened, TriageConfig::default())
        .dashboard(None)
        .unwrap();
    assert!(queues.unscheduled.is_empty());
    assert_eq!(queues.scheduled.len(), 3);
}

#[test]
fn opening_a_missing_file_creates_an_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("new.json");
    let store = JsonFileRepository::open(&path).unwrap();
    assert!(store.load().unwrap().is_empty());

    let id = uuid::Uuid::new_v4();
    assert!(!store.delete(id).unwrap());
}
