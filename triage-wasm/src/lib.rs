//! Bridge WASM <-> JavaScript cho bảng điều khiển phân loại.

use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use triage_core::{
    display_flags as core_display_flags, evaluate_vitals as core_evaluate_vitals, partition_queues,
    score_breakdown, InMemoryPatientRepository, ManualOrderReset, QueueSummary, Queues,
    ScoreBreakdown, TriageConfig, TriageLevel, TriageService,
};
use triage_json::DocumentError;
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsTriageConfig {
    #[serde(default)]
    auto_score_vitals: Option<bool>,
    #[serde(default)]
    manual_order_reset: Option<ManualOrderReset>,
}

impl From<JsTriageConfig> for TriageConfig {
    fn from(cfg: JsTriageConfig) -> Self {
        let mut base = TriageConfig::default();
        if let Some(auto) = cfg.auto_score_vitals {
            base.auto_score_vitals = auto;
        }
        if let Some(reset) = cfg.manual_order_reset {
            base.manual_order_reset = reset;
        }
        base
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsTriageInput {
    #[serde(default)]
    vital_signs: Option<serde_json::Value>,
    #[serde(default)]
    pain_level: u8,
    #[serde(default)]
    is_emergency: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsTriageResult {
    triage_level: TriageLevel,
    priority: u8,
    requires_immediate: bool,
    breakdown: Option<ScoreBreakdown>,
}

#[derive(Serialize)]
struct JsDashboard {
    queues: Queues,
    summary: QueueSummary,
}

fn set_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{context}: {err}"))
}

fn read_vitals(input: JsValue) -> Result<triage_core::VitalSigns, JsValue> {
    let raw = from_value::<serde_json::Value>(input)
        .map_err(|err| js_error("Không đọc được chỉ số sống", err))?;
    triage_json::parse_vitals_value(raw).map_err(|err| format_document_error(err))
}

/// Phân loại từng chỉ số (normal / warning / critical).
#[wasm_bindgen]
pub fn evaluate_vitals(vitals: JsValue) -> Result<JsValue, JsValue> {
    set_panic_hook();
    let vitals = read_vitals(vitals)?;
    to_value(&core_evaluate_vitals(&vitals)).map_err(|err| js_error("Không serialize kết quả", err))
}

/// Cờ bất thường cho form nhập chỉ số.
#[wasm_bindgen]
pub fn display_flags(vitals: JsValue) -> Result<JsValue, JsValue> {
    set_panic_hook();
    let vitals = read_vitals(vitals)?;
    to_value(&core_display_flags(&vitals)).map_err(|err| js_error("Không serialize kết quả", err))
}

/// Tính mức phân loại từ `{ vitalSigns, painLevel, isEmergency }`.
#[wasm_bindgen]
pub fn compute_triage(input: JsValue) -> Result<JsValue, JsValue> {
    set_panic_hook();
    let input: JsTriageInput =
        from_value(input).map_err(|err| js_error("Không đọc được dữ liệu phân loại", err))?;
    if input.pain_level > 10 {
        return Err(JsValue::from_str("painLevel phải trong khoảng 0..=10"));
    }
    let vitals = input
        .vital_signs
        .filter(|value| !value.is_null())
        .map(triage_json::parse_vitals_value)
        .transpose()
        .map_err(format_document_error)?;

    let level = triage_core::compute_triage(vitals.as_ref(), input.pain_level, input.is_emergency);
    let result = JsTriageResult {
        triage_level: level,
        priority: level.default_priority(),
        requires_immediate: level == TriageLevel::Critical,
        breakdown: vitals
            .as_ref()
            .and_then(|v| score_breakdown(v, input.pain_level)),
    };
    to_value(&result).map_err(|err| js_error("Không serialize kết quả", err))
}

/// Chia danh sách bệnh nhân thành hai hàng đợi, có thể lọc theo từ khoá.
#[wasm_bindgen]
pub fn partition(patients: JsValue, search: Option<String>) -> Result<JsValue, JsValue> {
    set_panic_hook();
    let raw = from_value::<serde_json::Value>(patients)
        .map_err(|err| js_error("Không đọc được danh sách bệnh nhân", err))?;
    let patients = triage_json::parse_collection_value(raw).map_err(format_document_error)?;

    let mut queues = partition_queues(&patients);
    if let Some(query) = search.as_deref() {
        queues = queues.filter(query);
    }
    let dashboard = JsDashboard {
        summary: queues.summary(),
        queues,
    };
    to_value(&dashboard).map_err(|err| js_error("Không serialize hàng đợi", err))
}

/// Ghi chỉ số mới vào một hồ sơ và trả về hồ sơ đã chấm điểm lại.
#[wasm_bindgen]
pub fn record_vitals(
    patient: JsValue,
    vitals: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    set_panic_hook();
    let raw = from_value::<serde_json::Value>(patient)
        .map_err(|err| js_error("Không đọc được hồ sơ", err))?;
    let patient = triage_json::parse_patient_value(raw).map_err(format_document_error)?;
    let vitals = read_vitals(vitals)?;

    let cfg = match config {
        Some(js_cfg) => {
            let cfg: JsTriageConfig =
                from_value(js_cfg).map_err(|err| js_error("Không đọc được config", err))?;
            TriageConfig::from(cfg)
        }
        None => TriageConfig::default(),
    };

    let id = patient.id;
    let service = TriageService::new(InMemoryPatientRepository::with_patients([patient]), cfg);
    let updated = service
        .record_vitals(id, vitals)
        .map_err(|err| js_error("Triage error", err))?;
    to_value(&updated).map_err(|err| js_error("Không serialize hồ sơ", err))
}

fn format_document_error(err: DocumentError) -> JsValue {
    js_error("Document error", err)
}
