//! Hồ sơ bệnh nhân và vòng đời trạng thái.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::AiAnalysis;
use crate::error::{TriageError, ValidationError};
use crate::scoring::{compute_triage, TriageLevel, TriageSource};
use crate::vitals::VitalSigns;

pub type PatientId = Uuid;

/// Trạng thái tiếp nhận của bệnh nhân.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PatientStatus {
    Waiting,
    Triaged,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Discharged,
    Transferred,
    Cancelled,
}

impl Default for PatientStatus {
    fn default() -> Self {
        PatientStatus::Waiting
    }
}

impl PatientStatus {
    pub const ALL: [PatientStatus; 7] = [
        PatientStatus::Waiting,
        PatientStatus::Triaged,
        PatientStatus::InProgress,
        PatientStatus::Completed,
        PatientStatus::Discharged,
        PatientStatus::Transferred,
        PatientStatus::Cancelled,
    ];

    /// Trạng thái còn nằm trong hàng đợi của bảng điều khiển.
    pub fn is_active_queue(self) -> bool {
        matches!(self, PatientStatus::Waiting | PatientStatus::Triaged)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PatientStatus::Completed
                | PatientStatus::Discharged
                | PatientStatus::Transferred
                | PatientStatus::Cancelled
        )
    }

    /// Các chuyển trạng thái hợp lệ do thao tác bên ngoài kích hoạt.
    pub fn can_transition_to(self, next: PatientStatus) -> bool {
        use PatientStatus::*;
        match (self, next) {
            (Waiting, Triaged) => true,
            (Waiting | Triaged, InProgress) => true,
            (InProgress, Completed | Discharged) => true,
            (Waiting | Triaged | InProgress, Transferred | Cancelled) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PatientStatus::Waiting => "Waiting",
            PatientStatus::Triaged => "Triaged",
            PatientStatus::InProgress => "In Progress",
            PatientStatus::Completed => "Completed",
            PatientStatus::Discharged => "Discharged",
            PatientStatus::Transferred => "Transferred",
            PatientStatus::Cancelled => "Cancelled",
        }
    }

    /// Chấp nhận cả dạng "In Progress", "in-progress", "in_progress".
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect();
        PatientStatus::ALL.into_iter().find(|status| {
            status
                .as_str()
                .replace(' ', "")
                .eq_ignore_ascii_case(&normalized)
        })
    }
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Trạng thái đánh giá, quyết định hàng đợi của bệnh nhân.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    Unassessed,
    Assessed(TriageLevel),
}

impl From<TriageLevel> for Assessment {
    fn from(level: TriageLevel) -> Self {
        match level {
            TriageLevel::Pending => Assessment::Unassessed,
            other => Assessment::Assessed(other),
        }
    }
}

/// Dữ liệu tiếp nhận khi đăng ký bệnh nhân mới.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub contact_number: Option<String>,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub pain_level: u8,
    pub chronic_conditions: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub current_medications: Option<String>,
    pub vital_signs: Option<VitalSigns>,
    #[serde(default)]
    pub is_emergency: bool,
}

impl NewPatient {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.full_name.trim().is_empty() {
            return Err(ValidationError::MissingField("fullName"));
        }
        validate_pain_level(self.pain_level)?;
        if let Some(vitals) = &self.vital_signs {
            vitals.validate()?;
        }
        Ok(())
    }
}

/// Hồ sơ bệnh nhân (gốc tổng hợp).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub contact_number: Option<String>,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub pain_level: u8,
    pub chronic_conditions: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub current_medications: Option<String>,
    pub vital_signs: Option<VitalSigns>,
    #[serde(default)]
    pub triage_level: TriageLevel,
    #[serde(default)]
    pub status: PatientStatus,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub is_emergency: bool,
    #[serde(default)]
    pub requires_immediate: bool,
    #[serde(default)]
    pub is_pinned: bool,
    pub manual_order: Option<u32>,
    pub ai_analysis: Option<AiAnalysis>,
    pub triage_source: Option<TriageSource>,
    pub registered_at: DateTime<Utc>,
    pub triage_at: Option<DateTime<Utc>>,
    pub discharged_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_priority() -> u8 {
    TriageLevel::Pending.default_priority()
}

fn validate_pain_level(pain_level: u8) -> Result<(), ValidationError> {
    ValidationError::check_range("painLevel", f64::from(pain_level), 0.0, 10.0)
}

fn validate_priority(priority: u8) -> Result<(), ValidationError> {
    ValidationError::check_range("priority", f64::from(priority), 1.0, 5.0)
}

impl Patient {
    /// Tạo hồ sơ từ dữ liệu tiếp nhận. Tự chấm điểm nếu có chỉ số hoặc cờ cấp cứu.
    pub fn register(intake: NewPatient, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let mut patient = Self::admit(intake, now)?;
        patient.rescore(now)?;
        Ok(patient)
    }

    /// Tạo hồ sơ `Pending` ở trạng thái Waiting, không chấm điểm.
    pub fn admit(intake: NewPatient, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        intake.validate()?;

        let mut vital_signs = intake.vital_signs;
        if let Some(vitals) = vital_signs.as_mut() {
            vitals.recorded_at.get_or_insert(now);
        }

        Ok(Patient {
            id: Uuid::new_v4(),
            full_name: intake.full_name.trim().to_string(),
            date_of_birth: intake.date_of_birth,
            gender: intake.gender,
            contact_number: intake.contact_number,
            symptoms: intake.symptoms,
            pain_level: intake.pain_level,
            chronic_conditions: intake.chronic_conditions,
            medical_history: intake.medical_history,
            allergies: intake.allergies,
            current_medications: intake.current_medications,
            vital_signs,
            triage_level: TriageLevel::Pending,
            status: PatientStatus::Waiting,
            priority: default_priority(),
            is_emergency: intake.is_emergency,
            requires_immediate: false,
            is_pinned: false,
            manual_order: None,
            ai_analysis: None,
            triage_source: None,
            registered_at: now,
            triage_at: None,
            discharged_at: None,
            updated_at: Some(now),
        })
    }

    /// Kiểm tra toàn bộ ràng buộc của hồ sơ (dùng khi đọc tài liệu đã lưu).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.full_name.trim().is_empty() {
            return Err(ValidationError::MissingField("fullName"));
        }
        validate_pain_level(self.pain_level)?;
        validate_priority(self.priority)?;
        if let Some(vitals) = &self.vital_signs {
            vitals.validate()?;
        }
        if let Some(analysis) = &self.ai_analysis {
            analysis.validate()?;
        }
        if self.requires_immediate != (self.triage_level == TriageLevel::Critical) {
            return Err(ValidationError::Invalid {
                field: "requiresImmediate",
                reason: format!("không khớp với mức {}", self.triage_level),
            });
        }
        Ok(())
    }

    pub fn assessment(&self) -> Assessment {
        Assessment::from(self.triage_level)
    }

    /// Mức phân loại tính từ dữ liệu hiện tại của hồ sơ.
    pub fn computed_level(&self) -> TriageLevel {
        compute_triage(self.vital_signs.as_ref(), self.pain_level, self.is_emergency)
    }

    /// Áp dụng kết quả phân loại. `priority = None` dùng độ ưu tiên mặc định của mức.
    pub fn apply_triage_result(
        &mut self,
        level: TriageLevel,
        priority: Option<u8>,
        source: TriageSource,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        if level.is_pending() {
            return Err(ValidationError::PendingNotAssignable);
        }
        if self.status.is_terminal() {
            return Err(ValidationError::Invalid {
                field: "triageLevel",
                reason: format!("hồ sơ đã đóng ở trạng thái {}", self.status),
            });
        }
        let priority = priority.unwrap_or_else(|| level.default_priority());
        validate_priority(priority)?;

        let previous = self.triage_level;
        self.triage_level = level;
        self.priority = priority;
        self.requires_immediate = level == TriageLevel::Critical;
        self.triage_source = Some(source);
        if self.triage_at.is_none() {
            self.triage_at = Some(now);
        }
        if self.status == PatientStatus::Waiting {
            self.status = PatientStatus::Triaged;
        }
        self.updated_at = Some(now);

        tracing::info!(
            patient_id = %self.id,
            from = %previous,
            to = %level,
            priority,
            %source,
            "triage result applied"
        );
        Ok(())
    }

    /// Lưu chỉ số mới mà không chấm điểm lại.
    pub fn store_vitals(
        &mut self,
        mut vitals: VitalSigns,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        vitals.validate()?;
        vitals.recorded_at.get_or_insert(now);
        self.vital_signs = Some(vitals);
        self.updated_at = Some(now);
        Ok(())
    }

    /// Ghi nhận chỉ số mới và chấm điểm lại, trả về mức tính được (có thể là `Pending`).
    pub fn record_vitals(
        &mut self,
        vitals: VitalSigns,
        now: DateTime<Utc>,
    ) -> Result<TriageLevel, ValidationError> {
        self.store_vitals(vitals, now)?;
        self.rescore(now)
    }

    /// Chấm điểm lại từ dữ liệu hiện có. Kết quả `Pending` hoặc hồ sơ đã đóng
    /// thì mức phân loại giữ nguyên.
    pub fn rescore(&mut self, now: DateTime<Utc>) -> Result<TriageLevel, ValidationError> {
        let level = self.computed_level();
        if !level.is_pending() && !self.status.is_terminal() {
            self.apply_triage_result(level, None, TriageSource::Vitals, now)?;
        }
        Ok(level)
    }

    pub fn set_pain_level(&mut self, pain_level: u8) -> Result<(), ValidationError> {
        validate_pain_level(pain_level)?;
        self.pain_level = pain_level;
        Ok(())
    }

    /// Chuyển trạng thái; từ chối chuyển không hợp lệ mà không thay đổi hồ sơ.
    pub fn transition_status(
        &mut self,
        next: PatientStatus,
        now: DateTime<Utc>,
    ) -> Result<(), TriageError> {
        // Triaged chỉ đạt được khi đã có mức phân loại.
        let unassessed_triage = next == PatientStatus::Triaged && self.triage_level.is_pending();
        if !self.status.can_transition_to(next) || unassessed_triage {
            return Err(TriageError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }

        let previous = self.status;
        self.status = next;
        if matches!(next, PatientStatus::Completed | PatientStatus::Discharged) {
            self.discharged_at = Some(now);
        }
        self.updated_at = Some(now);

        tracing::info!(patient_id = %self.id, from = %previous, to = %next, "status changed");
        Ok(())
    }

    /// Chuỗi tìm kiếm khớp tên hoặc triệu chứng, không phân biệt hoa thường.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.full_name.to_lowercase().contains(&needle)
            || self.symptoms.to_lowercase().contains(&needle)
    }
}
