//! Chấm điểm phân loại: gộp phân loại chỉ số sống, mức đau và cờ cấp cứu
//! thành một `TriageLevel`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vitals::{evaluate_vitals, VitalClassification, VitalSigns, VitalsEvaluation};

/// Mức phân loại, sắp xếp theo độ khẩn: `Critical` nhỏ nhất.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TriageLevel {
    Critical,
    Urgent,
    #[serde(rename = "Semi-Urgent")]
    SemiUrgent,
    #[serde(rename = "Non-Urgent")]
    NonUrgent,
    Pending,
}

impl Default for TriageLevel {
    fn default() -> Self {
        TriageLevel::Pending
    }
}

impl TriageLevel {
    pub const ALL: [TriageLevel; 5] = [
        TriageLevel::Critical,
        TriageLevel::Urgent,
        TriageLevel::SemiUrgent,
        TriageLevel::NonUrgent,
        TriageLevel::Pending,
    ];

    /// Độ ưu tiên mặc định (1 = khẩn nhất).
    pub fn default_priority(self) -> u8 {
        match self {
            TriageLevel::Critical => 1,
            TriageLevel::Urgent => 2,
            TriageLevel::SemiUrgent => 3,
            TriageLevel::NonUrgent => 4,
            TriageLevel::Pending => 5,
        }
    }

    pub fn is_pending(self) -> bool {
        self == TriageLevel::Pending
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TriageLevel::Critical => "Critical",
            TriageLevel::Urgent => "Urgent",
            TriageLevel::SemiUrgent => "Semi-Urgent",
            TriageLevel::NonUrgent => "Non-Urgent",
            TriageLevel::Pending => "Pending",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        TriageLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value.trim()))
    }

    fn from_score(score: u8) -> Self {
        match score {
            s if s >= 6 => TriageLevel::Critical,
            s if s >= 4 => TriageLevel::Urgent,
            s if s >= 2 => TriageLevel::SemiUrgent,
            _ => TriageLevel::NonUrgent,
        }
    }
}

impl fmt::Display for TriageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nguồn gốc của kết quả phân loại đang áp dụng.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TriageSource {
    Vitals,
    Manual,
    Ai,
}

impl fmt::Display for TriageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TriageSource::Vitals => "vitals",
            TriageSource::Manual => "manual",
            TriageSource::Ai => "ai",
        })
    }
}

/// Điểm thành phần, phục vụ hiển thị và ghi log.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub heart_rate: u8,
    pub blood_pressure_sys: u8,
    pub temperature: u8,
    pub o2_saturation: u8,
    pub pain: u8,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u8 {
        self.heart_rate + self.blood_pressure_sys + self.temperature + self.o2_saturation + self.pain
    }
}

fn two_sided_points(classification: Option<VitalClassification>) -> u8 {
    match classification {
        Some(VitalClassification::Critical) => 2,
        Some(VitalClassification::Warning) => 1,
        _ => 0,
    }
}

fn o2_points(classification: Option<VitalClassification>) -> u8 {
    match classification {
        Some(VitalClassification::Critical) => 3,
        Some(VitalClassification::Warning) => 1,
        _ => 0,
    }
}

fn pain_points(pain_level: u8) -> u8 {
    match pain_level {
        p if p >= 8 => 2,
        p if p >= 5 => 1,
        _ => 0,
    }
}

/// Điểm từng thành phần từ kết quả phân loại chỉ số và mức đau.
pub fn breakdown_from_evaluation(evaluation: &VitalsEvaluation, pain_level: u8) -> ScoreBreakdown {
    ScoreBreakdown {
        heart_rate: two_sided_points(evaluation.heart_rate),
        blood_pressure_sys: two_sided_points(evaluation.blood_pressure_sys),
        temperature: two_sided_points(evaluation.temperature),
        o2_saturation: o2_points(evaluation.o2_saturation),
        pain: pain_points(pain_level),
    }
}

/// Bảng điểm cho một lần đo. `None` khi không có chỉ số nào.
pub fn score_breakdown(vitals: &VitalSigns, pain_level: u8) -> Option<ScoreBreakdown> {
    if !vitals.has_any() {
        return None;
    }
    Some(breakdown_from_evaluation(&evaluate_vitals(vitals), pain_level))
}

/// Tính mức phân loại. Không bao giờ lỗi: thiếu dữ liệu cho `Pending`.
pub fn compute_triage(vitals: Option<&VitalSigns>, pain_level: u8, is_emergency: bool) -> TriageLevel {
    if is_emergency {
        return TriageLevel::Critical;
    }

    let Some(breakdown) = vitals.and_then(|v| score_breakdown(v, pain_level)) else {
        return TriageLevel::Pending;
    };

    let level = TriageLevel::from_score(breakdown.total());
    tracing::debug!(score = breakdown.total(), %level, "computed triage score");
    level
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

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
    fn emergency_short_circuits_regardless_of_vitals() {
        let normal = vitals(Some(80.0), Some(120.0), Some(37.0), Some(98.0));
        assert_eq!(compute_triage(Some(&normal), 0, true), TriageLevel::Critical);
        assert_eq!(compute_triage(None, 0, true), TriageLevel::Critical);
        assert_eq!(
            compute_triage(Some(&VitalSigns::default()), 0, true),
            TriageLevel::Critical
        );
    }

    #[test]
    fn no_signal_is_pending_not_non_urgent() {
        assert_eq!(compute_triage(None, 0, false), TriageLevel::Pending);
        assert_eq!(
            compute_triage(Some(&VitalSigns::default()), 0, false),
            TriageLevel::Pending
        );
        // Đau đơn độc không đủ để đánh giá.
        assert_eq!(
            compute_triage(Some(&VitalSigns::default()), 10, false),
            TriageLevel::Pending
        );
    }

    #[test]
    fn all_normal_is_non_urgent() {
        let normal = vitals(Some(80.0), Some(120.0), Some(37.0), Some(98.0));
        assert_eq!(compute_triage(Some(&normal), 0, false), TriageLevel::NonUrgent);
    }

    #[test]
    fn mixed_vitals_score_urgent() {
        let v = vitals(Some(130.0), Some(95.0), Some(37.0), Some(92.0));
        let breakdown = score_breakdown(&v, 3).unwrap();
        assert_eq!(breakdown.heart_rate, 2);
        assert_eq!(breakdown.blood_pressure_sys, 1);
        assert_eq!(breakdown.temperature, 0);
        assert_eq!(breakdown.o2_saturation, 1);
        assert_eq!(breakdown.pain, 0);
        assert_eq!(breakdown.total(), 4);
        assert_eq!(compute_triage(Some(&v), 3, false), TriageLevel::Urgent);
    }

    #[test]
    fn low_oxygen_with_severe_pain_lands_in_urgent_band() {
        let v = vitals(None, None, None, Some(85.0));
        assert_eq!(score_breakdown(&v, 9).unwrap().total(), 5);
        assert_eq!(compute_triage(Some(&v), 9, false), TriageLevel::Urgent);
    }

    #[test_case(0 => TriageLevel::NonUrgent)]
    #[test_case(1 => TriageLevel::NonUrgent)]
    #[test_case(2 => TriageLevel::SemiUrgent)]
    #[test_case(3 => TriageLevel::SemiUrgent)]
    #[test_case(4 => TriageLevel::Urgent)]
    #[test_case(5 => TriageLevel::Urgent)]
    #[test_case(6 => TriageLevel::Critical)]
    #[test_case(11 => TriageLevel::Critical)]
    fn score_bands(score: u8) -> TriageLevel {
        TriageLevel::from_score(score)
    }

    #[test_case(4 => 0)]
    #[test_case(5 => 1)]
    #[test_case(7 => 1)]
    #[test_case(8 => 2)]
    #[test_case(10 => 2)]
    fn pain_contribution(pain: u8) -> u8 {
        pain_points(pain)
    }

    #[test]
    fn raising_one_vital_never_lowers_the_score() {
        let severities = [
            None,
            Some(VitalClassification::Normal),
            Some(VitalClassification::Warning),
            Some(VitalClassification::Critical),
        ];
        for hr in severities {
            for sys in severities {
                for temp in severities {
                    for o2 in severities {
                        let base = VitalsEvaluation {
                            heart_rate: hr,
                            blood_pressure_sys: sys,
                            temperature: temp,
                            o2_saturation: o2,
                        };
                        let base_total = breakdown_from_evaluation(&base, 0).total();
                        let raised = [
                            VitalsEvaluation { heart_rate: Some(VitalClassification::Critical), ..base },
                            VitalsEvaluation { blood_pressure_sys: Some(VitalClassification::Critical), ..base },
                            VitalsEvaluation { temperature: Some(VitalClassification::Critical), ..base },
                            VitalsEvaluation { o2_saturation: Some(VitalClassification::Critical), ..base },
                        ];
                        for evaluation in raised {
                            assert!(breakdown_from_evaluation(&evaluation, 0).total() >= base_total);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn levels_order_by_urgency() {
        let mut levels = vec![
            TriageLevel::Pending,
            TriageLevel::NonUrgent,
            TriageLevel::Critical,
            TriageLevel::SemiUrgent,
            TriageLevel::Urgent,
        ];
        levels.sort();
        assert_eq!(levels, TriageLevel::ALL.to_vec());
    }

    #[test]
    fn level_wire_names() {
        assert_eq!(
            serde_json::to_string(&TriageLevel::SemiUrgent).unwrap(),
            "\"Semi-Urgent\""
        );
        assert_eq!(TriageLevel::parse("non-urgent"), Some(TriageLevel::NonUrgent));
        assert_eq!(TriageLevel::parse("soon"), None);
        assert_eq!(TriageLevel::Critical.default_priority(), 1);
        assert_eq!(TriageLevel::Pending.default_priority(), 5);
    }
}
