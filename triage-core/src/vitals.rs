//! Chỉ số sống: kiểm tra khoảng hợp lệ, phân loại theo ngưỡng chấm điểm
//! và cờ bất thường hiển thị cho điều dưỡng.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Một lần đo chỉ số sống. Nhiệt độ luôn lưu theo độ C.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    pub heart_rate: Option<f64>,
    pub blood_pressure_sys: Option<f64>,
    pub blood_pressure_dia: Option<f64>,
    pub temperature: Option<f64>,
    pub o2_saturation: Option<f64>,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl VitalSigns {
    /// Có ít nhất một chỉ số được đo.
    pub fn has_any(&self) -> bool {
        self.heart_rate.is_some()
            || self.blood_pressure_sys.is_some()
            || self.blood_pressure_dia.is_some()
            || self.temperature.is_some()
            || self.o2_saturation.is_some()
    }

    /// Từ chối giá trị ngoài khoảng cho phép, không kẹp giá trị.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let checks = [
            ("heartRate", self.heart_rate, 0.0, 300.0),
            ("bloodPressureSys", self.blood_pressure_sys, 0.0, 300.0),
            ("bloodPressureDia", self.blood_pressure_dia, 0.0, 200.0),
            ("temperature", self.temperature, 30.0, 45.0),
            ("o2Saturation", self.o2_saturation, 0.0, 100.0),
        ];
        for (field, value, min, max) in checks {
            if let Some(value) = value {
                ValidationError::check_range(field, value, min, max)?;
            }
        }
        Ok(())
    }

    /// Nhiệt độ quy đổi sang độ F, chỉ dùng cho hiển thị.
    pub fn temperature_fahrenheit(&self) -> Option<f64> {
        self.temperature.map(celsius_to_fahrenheit)
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Mức phân loại của một chỉ số.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VitalClassification {
    Normal,
    Warning,
    Critical,
}

/// Kết quả phân loại cho từng chỉ số có trọng số. `None` nghĩa là không đo.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VitalsEvaluation {
    pub heart_rate: Option<VitalClassification>,
    pub blood_pressure_sys: Option<VitalClassification>,
    pub temperature: Option<VitalClassification>,
    pub o2_saturation: Option<VitalClassification>,
}

impl VitalsEvaluation {
    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_none()
            && self.blood_pressure_sys.is_none()
            && self.temperature.is_none()
            && self.o2_saturation.is_none()
    }

    /// Mức nặng nhất trong các chỉ số đã đo.
    pub fn worst(&self) -> Option<VitalClassification> {
        [
            self.heart_rate,
            self.blood_pressure_sys,
            self.temperature,
            self.o2_saturation,
        ]
        .into_iter()
        .flatten()
        .max()
    }
}

/// Ngưỡng hai phía: `critical` ngoài (lo, hi), `warning` ngoài (lo, hi).
struct Band {
    critical: (f64, f64),
    warning: (f64, f64),
}

const HEART_RATE: Band = Band {
    critical: (50.0, 120.0),
    warning: (60.0, 100.0),
};

const BLOOD_PRESSURE_SYS: Band = Band {
    critical: (90.0, 180.0),
    warning: (100.0, 140.0),
};

const TEMPERATURE_C: Band = Band {
    critical: (35.0, 40.0),
    warning: (36.0, 38.0),
};

const O2_CRITICAL_BELOW: f64 = 90.0;
const O2_WARNING_BELOW: f64 = 95.0;

impl Band {
    fn classify(&self, value: f64) -> VitalClassification {
        if value < self.critical.0 || value > self.critical.1 {
            VitalClassification::Critical
        } else if value < self.warning.0 || value > self.warning.1 {
            VitalClassification::Warning
        } else {
            VitalClassification::Normal
        }
    }
}

fn classify_o2(value: f64) -> VitalClassification {
    if value < O2_CRITICAL_BELOW {
        VitalClassification::Critical
    } else if value < O2_WARNING_BELOW {
        VitalClassification::Warning
    } else {
        VitalClassification::Normal
    }
}

/// Phân loại từng chỉ số theo ngưỡng chấm điểm cố định. Hàm thuần.
pub fn evaluate_vitals(vitals: &VitalSigns) -> VitalsEvaluation {
    VitalsEvaluation {
        heart_rate: vitals.heart_rate.map(|v| HEART_RATE.classify(v)),
        blood_pressure_sys: vitals.blood_pressure_sys.map(|v| BLOOD_PRESSURE_SYS.classify(v)),
        temperature: vitals.temperature.map(|v| TEMPERATURE_C.classify(v)),
        o2_saturation: vitals.o2_saturation.map(classify_o2),
    }
}

/// Cờ bất thường hiển thị khi nhập chỉ số. Ngưỡng khác với ngưỡng chấm điểm.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFlags {
    pub heart_rate: bool,
    pub blood_pressure_sys: bool,
    pub blood_pressure_dia: bool,
    pub temperature: bool,
    pub o2_saturation: bool,
}

impl DisplayFlags {
    pub fn any(&self) -> bool {
        self.heart_rate
            || self.blood_pressure_sys
            || self.blood_pressure_dia
            || self.temperature
            || self.o2_saturation
    }
}

fn outside(value: Option<f64>, lo: f64, hi: f64) -> bool {
    value.map_or(false, |v| v < lo || v > hi)
}

/// Đánh dấu giá trị bất thường cho giao diện nhập liệu (nhiệt độ so theo độ F).
pub fn display_flags(vitals: &VitalSigns) -> DisplayFlags {
    DisplayFlags {
        heart_rate: outside(vitals.heart_rate, 60.0, 100.0),
        blood_pressure_sys: outside(vitals.blood_pressure_sys, 90.0, 140.0),
        blood_pressure_dia: outside(vitals.blood_pressure_dia, 60.0, 90.0),
        temperature: outside(vitals.temperature_fahrenheit(), 97.0, 99.5),
        o2_saturation: vitals.o2_saturation.map_or(false, |v| v < 95.0),
    }
}
