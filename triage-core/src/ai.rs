//! Chấm điểm hỗ trợ bởi AI: năng lực bên ngoài, chỉ được ghi nhận vào hồ sơ
//! sau khi điều dưỡng xác nhận.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ScoringError, ValidationError};
use crate::patient::Patient;
use crate::scoring::TriageLevel;

/// Kết quả trả về từ bộ chấm điểm bên ngoài.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TriageAssessment {
    pub score: u8,
    pub triage_level: TriageLevel,
    pub reasoning: String,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
}

impl TriageAssessment {
    /// Kiểm tra phản hồi trước khi lưu vào hồ sơ.
    pub fn check(&self) -> Result<(), ScoringError> {
        if self.score > 100 {
            return Err(ScoringError::InvalidResponse(format!(
                "score {} vượt quá 100",
                self.score
            )));
        }
        if self.triage_level.is_pending() {
            return Err(ScoringError::InvalidResponse(
                "mức phân loại Pending không phải kết quả đánh giá".to_string(),
            ));
        }
        Ok(())
    }
}

/// Phân tích AI lưu trên hồ sơ. `acknowledged_at = None` nghĩa là chưa áp dụng.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub score: u8,
    pub triage_level: TriageLevel,
    pub reasoning: String,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl AiAnalysis {
    pub fn from_assessment(assessment: TriageAssessment, analyzed_at: DateTime<Utc>) -> Self {
        Self {
            score: assessment.score,
            triage_level: assessment.triage_level,
            reasoning: assessment.reasoning,
            recommended_actions: assessment.recommended_actions,
            analyzed_at,
            acknowledged_at: None,
        }
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged_at.is_some()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_range("aiAnalysis.score", f64::from(self.score), 0.0, 100.0)
    }
}

/// Năng lực chấm điểm bên ngoài (dịch vụ AI). Có thể thất bại hoặc quá thời gian.
#[cfg_attr(test, mockall::automock)]
pub trait ExternalScorer {
    fn score(&self, patient: &Patient) -> Result<TriageAssessment, ScoringError>;
}
