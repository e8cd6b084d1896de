//! JSON document codec for patient records and intake payloads, plus a
//! file-backed `PatientRepository`.

use std::collections::HashSet;
use std::path::PathBuf;

use serde_json::{Map, Value};
use triage_core::vitals::fahrenheit_to_celsius;
use triage_core::{NewPatient, Patient, TriageError, ValidationError, VitalSigns};

mod store;

pub use store::JsonFileRepository;

const VITAL_FIELDS: [&str; 5] = [
    "heartRate",
    "bloodPressureSys",
    "bloodPressureDia",
    "temperature",
    "o2Saturation",
];

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unexpected document shape: {0}")]
    Shape(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<DocumentError> for TriageError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Validation(inner) => TriageError::Validation(inner),
            other => TriageError::Repository(other.to_string()),
        }
    }
}

/// Parse a single stored patient document.
pub fn parse_patient_str(document: &str) -> Result<Patient, DocumentError> {
    let value: Value = serde_json::from_str(document)?;
    parse_patient_value(value)
}

/// Parse a stored patient document and check its invariants.
pub fn parse_patient_value(value: Value) -> Result<Patient, DocumentError> {
    let patient: Patient = serde_json::from_value(value)?;
    patient.validate()?;
    Ok(patient)
}

/// Parse a collection: either a bare array or `{ "patients": [...] }`.
pub fn parse_collection_str(document: &str) -> Result<Vec<Patient>, DocumentError> {
    let value: Value = serde_json::from_str(document)?;
    parse_collection_value(value)
}

pub fn parse_collection_value(value: Value) -> Result<Vec<Patient>, DocumentError> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut obj) => match obj.remove("patients") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(DocumentError::Shape(
                    "expected an array or an object with a `patients` array".to_string(),
                ))
            }
        },
        _ => {
            return Err(DocumentError::Shape(
                "expected an array of patient documents".to_string(),
            ))
        }
    };

    let mut seen = HashSet::new();
    let mut patients = Vec::with_capacity(entries.len());
    for entry in entries {
        let patient = parse_patient_value(entry)?;
        if !seen.insert(patient.id) {
            return Err(DocumentError::Shape(format!(
                "duplicate patient id {}",
                patient.id
            )));
        }
        patients.push(patient);
    }
    Ok(patients)
}

pub fn patient_to_string(patient: &Patient) -> Result<String, DocumentError> {
    Ok(serde_json::to_string_pretty(patient)?)
}

pub fn collection_to_string(patients: &[Patient]) -> Result<String, DocumentError> {
    Ok(serde_json::to_string_pretty(patients)?)
}

/// Parse a registration form payload. Numeric fields may arrive as strings and
/// `vitalSigns.temperatureUnit` may be `"F"`; temperatures are stored in Celsius.
pub fn parse_intake_str(payload: &str) -> Result<NewPatient, DocumentError> {
    let value: Value = serde_json::from_str(payload)?;
    parse_intake_value(value)
}

pub fn parse_intake_value(mut value: Value) -> Result<NewPatient, DocumentError> {
    let obj = value
        .as_object_mut()
        .ok_or_else(|| DocumentError::Shape("intake payload must be an object".to_string()))?;

    coerce_integer(obj, "painLevel")?;
    let mut converted = false;
    if let Some(vitals) = obj.get_mut("vitalSigns") {
        if !vitals.is_null() {
            converted = normalize_vitals(vitals)?;
        }
    }

    let mut intake: NewPatient = serde_json::from_value(value)?;
    intake.validate()?;
    if converted {
        if let Some(vitals) = intake.vital_signs.as_mut() {
            round_temperature(vitals);
        }
    }
    Ok(intake)
}

/// Parse a vitals entry form payload.
pub fn parse_vitals_str(payload: &str) -> Result<VitalSigns, DocumentError> {
    let value: Value = serde_json::from_str(payload)?;
    parse_vitals_value(value)
}

pub fn parse_vitals_value(mut value: Value) -> Result<VitalSigns, DocumentError> {
    let converted = normalize_vitals(&mut value)?;
    let mut vitals: VitalSigns = serde_json::from_value(value)?;
    vitals.validate()?;
    if converted {
        round_temperature(&mut vitals);
    }
    Ok(vitals)
}

/// Returns `true` when the temperature was converted from Fahrenheit. The
/// converted value keeps full precision until range validation has run.
fn normalize_vitals(value: &mut Value) -> Result<bool, DocumentError> {
    let obj = value
        .as_object_mut()
        .ok_or_else(|| DocumentError::Shape("vitalSigns must be an object".to_string()))?;

    for field in VITAL_FIELDS {
        coerce_number(obj, field)?;
    }

    let unit = obj.remove("temperatureUnit");
    match unit.as_ref().and_then(Value::as_str).map(str::trim) {
        None => Ok(false),
        Some(unit) if unit.eq_ignore_ascii_case("c") || unit.eq_ignore_ascii_case("celsius") => {
            Ok(false)
        }
        Some(unit) if unit.eq_ignore_ascii_case("f") || unit.eq_ignore_ascii_case("fahrenheit") => {
            let Some(fahrenheit) = obj.get("temperature").and_then(Value::as_f64) else {
                return Ok(false);
            };
            let celsius = fahrenheit_to_celsius(fahrenheit);
            obj.insert("temperature".to_string(), number(celsius, "temperature")?);
            Ok(true)
        }
        Some(other) => Err(DocumentError::Shape(format!(
            "unknown temperatureUnit `{other}`"
        ))),
    }
}

fn round_temperature(vitals: &mut VitalSigns) {
    if let Some(celsius) = vitals.temperature.as_mut() {
        *celsius = (*celsius * 10.0).round() / 10.0;
    }
}

fn number(value: f64, field: &str) -> Result<Value, DocumentError> {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| DocumentError::Shape(format!("`{field}` is not a finite number")))
}

/// Form inputs send numbers as strings; blank strings mean "not measured".
fn coerce_number(obj: &mut Map<String, Value>, field: &str) -> Result<(), DocumentError> {
    let Some(Value::String(text)) = obj.get(field) else {
        return Ok(());
    };
    let trimmed = text.trim();
    let replacement = if trimmed.is_empty() {
        Value::Null
    } else {
        let parsed: f64 = trimmed
            .parse()
            .map_err(|_| DocumentError::Shape(format!("`{field}` is not a number: {text}")))?;
        number(parsed, field)?
    };
    obj.insert(field.to_string(), replacement);
    Ok(())
}

fn coerce_integer(obj: &mut Map<String, Value>, field: &str) -> Result<(), DocumentError> {
    let Some(Value::String(text)) = obj.get(field) else {
        return Ok(());
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        obj.remove(field);
        return Ok(());
    }
    let parsed: u64 = trimmed
        .parse()
        .map_err(|_| DocumentError::Shape(format!("`{field}` is not an integer: {text}")))?;
    obj.insert(field.to_string(), Value::from(parsed));
    Ok(())
}
