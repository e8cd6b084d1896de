use triage_core::{
    compute_triage, evaluate_vitals, partition_queues, InMemoryPatientRepository, NewPatient,
    PatientStatus, TriageConfig, TriageLevel, TriageService, VitalSigns,
};

fn vitals(hr: Option<f64>, sys: Option<f64>, temp: Option<f64>, o2: Option<f64>) -> VitalSigns {
    VitalSigns {
        heart_rate: hr,
        blood_pressure_sys: sys,
        temperature: temp,
        o2_saturation: o2,
        ..VitalSigns::default()
    }
}

#[test]
fn tachycardia_with_mild_hypotension_and_hypoxia_is_urgent() {
    let v = vitals(Some(130.0), Some(95.0), Some(37.0), Some(92.0));
    assert_eq!(compute_triage(Some(&v), 3, false), TriageLevel::Urgent);
}

#[test]
fn severe_hypoxia_with_pain_scores_five() {
    let v = vitals(None, None, None, Some(85.0));
    let breakdown = triage_core::score_breakdown(&v, 9).expect("có chỉ số");
    assert_eq!(breakdown.total(), 5);
    assert_eq!(compute_triage(Some(&v), 9, false), TriageLevel::Urgent);
}

#[test]
fn emergency_flag_overrides_normal_vitals() {
    let v = vitals(Some(75.0), Some(118.0), Some(36.8), Some(99.0));
    assert_eq!(compute_triage(Some(&v), 0, true), TriageLevel::Critical);
}

#[test]
fn evaluation_has_no_hidden_state() {
    let v = vitals(Some(45.0), None, Some(39.0), None);
    let first = evaluate_vitals(&v);
    let second = evaluate_vitals(&v);
    assert_eq!(first, second);
    assert!(first.blood_pressure_sys.is_none());
}

#[test]
fn patient_flows_from_unscheduled_to_scheduled_to_discharge() {
    let service = TriageService::new(InMemoryPatientRepository::new(), TriageConfig::default());
    let patient = service
        .register(NewPatient {
            full_name: "Nguyen Thi Mai".to_string(),
            symptoms: "shortness of breath".to_string(),
            pain_level: 3,
            ..NewPatient::default()
        })
        .expect("đăng ký thành công");
    assert_eq!(patient.triage_level, TriageLevel::Pending);

    let queues = service.dashboard(None).unwrap();
    assert_eq!(queues.unscheduled.len(), 1);
    assert!(queues.scheduled.is_empty());

    let urgent = vitals(Some(130.0), Some(95.0), Some(37.0), Some(92.0));
    let scored = service.record_vitals(patient.id, urgent.clone()).unwrap();
    assert_eq!(scored.triage_level, TriageLevel::Urgent);
    assert_eq!(scored.status, PatientStatus::Triaged);
    assert_eq!(scored.priority, 2);
    let triage_at = scored.triage_at.expect("triageAt được đặt");

    let queues = service.dashboard(None).unwrap();
    assert!(queues.unscheduled.is_empty());
    assert_eq!(queues.scheduled.len(), 1);

    let rescored = service.record_vitals(patient.id, urgent).unwrap();
    assert_eq!(rescored.triage_at, Some(triage_at));

    service
        .transition_status(patient.id, PatientStatus::InProgress)
        .unwrap();
    let done = service
        .transition_status(patient.id, PatientStatus::Completed)
        .unwrap();
    assert!(done.discharged_at.is_some());
    assert!(service.dashboard(None).unwrap().is_empty());

    let all = service
        .repository()
        .snapshot()
        .unwrap();
    assert!(partition_queues(&all).is_empty());
}
