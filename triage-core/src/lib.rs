//! Logic lõi phân loại cấp cứu: chấm điểm chỉ số sống, vòng đời hồ sơ bệnh nhân
//! và chia hàng đợi của bảng điều khiển.

use serde::{Deserialize, Serialize};

pub mod ai;
pub mod error;
pub mod patient;
pub mod queue;
pub mod repository;
pub mod scoring;
pub mod service;
pub mod vitals;

pub use ai::{AiAnalysis, ExternalScorer, TriageAssessment};
pub use error::{ScoringError, TriageError, ValidationError};
pub use patient::{Assessment, Gender, NewPatient, Patient, PatientId, PatientStatus};
pub use queue::{partition_queues, queue_membership, QueueKind, QueueSummary, Queues};
pub use repository::{InMemoryPatientRepository, PatientQuery, PatientRepository};
pub use scoring::{compute_triage, score_breakdown, ScoreBreakdown, TriageLevel, TriageSource};
pub use service::TriageService;
pub use vitals::{
    display_flags, evaluate_vitals, DisplayFlags, VitalClassification, VitalSigns,
    VitalsEvaluation,
};

/// Khi nào thứ hạng kéo-thả thủ công bị huỷ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ManualOrderReset {
    /// Huỷ khi trạng thái bệnh nhân thay đổi.
    OnStatusChange,
    /// Huỷ khi chấm điểm lại từ chỉ số làm đổi mức phân loại.
    OnRescore,
    Never,
}

impl Default for ManualOrderReset {
    fn default() -> Self {
        ManualOrderReset::OnStatusChange
    }
}

/// Cấu hình hành vi của dịch vụ phân loại. Ngưỡng chấm điểm là cố định.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TriageConfig {
    /// Tự chấm điểm khi đăng ký và khi có chỉ số sống mới. Cờ cấp cứu lúc
    /// đăng ký vẫn được xét khi tắt.
    pub auto_score_vitals: bool,
    pub manual_order_reset: ManualOrderReset,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            auto_score_vitals: true,
            manual_order_reset: ManualOrderReset::default(),
        }
    }
}
