//! Dịch vụ phân loại: mỗi thao tác là một lần đọc-sửa-ghi một hồ sơ qua kho
//! lưu trữ được truyền vào.

use chrono::Utc;

use crate::ai::{AiAnalysis, ExternalScorer};
use crate::error::{TriageError, ValidationError};
use crate::patient::{NewPatient, Patient, PatientId, PatientStatus};
use crate::queue::{partition_queues, Queues};
use crate::repository::{PatientQuery, PatientRepository};
use crate::scoring::{TriageLevel, TriageSource};
use crate::vitals::VitalSigns;
use crate::{ManualOrderReset, TriageConfig};

pub struct TriageService<R> {
    repository: R,
    config: TriageConfig,
}

impl<R: PatientRepository> TriageService<R> {
    pub fn new(repository: R, config: TriageConfig) -> Self {
        Self { repository, config }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    /// Đăng ký hồ sơ mới. Khi tắt tự chấm điểm, chỉ cờ cấp cứu được xét ngay.
    pub fn register(&self, intake: NewPatient) -> Result<Patient, TriageError> {
        let now = Utc::now();
        let mut patient = Patient::admit(intake, now)?;
        if self.config.auto_score_vitals || patient.is_emergency {
            patient.rescore(now)?;
        }
        self.repository.save(&patient)?;
        tracing::info!(
            patient_id = %patient.id,
            level = %patient.triage_level,
            "patient registered"
        );
        Ok(patient)
    }

    pub fn get(&self, id: PatientId) -> Result<Patient, TriageError> {
        self.repository
            .find_by_id(id)?
            .ok_or(TriageError::NotFound(id))
    }

    /// Ghi nhận chỉ số sống và chấm điểm lại nếu cấu hình cho phép.
    pub fn record_vitals(&self, id: PatientId, vitals: VitalSigns) -> Result<Patient, TriageError> {
        let mut patient = self.get(id)?;
        let now = Utc::now();
        let before = (patient.status, patient.triage_level);

        if self.config.auto_score_vitals {
            patient.record_vitals(vitals, now)?;
            if self.config.manual_order_reset == ManualOrderReset::OnRescore
                && patient.triage_level != before.1
            {
                patient.manual_order = None;
            }
        } else {
            patient.store_vitals(vitals, now)?;
        }
        self.reset_on_status_change(&mut patient, before.0);

        self.repository.save(&patient)?;
        Ok(patient)
    }

    /// Điều dưỡng chỉnh mức phân loại, có thể ghi đè độ ưu tiên.
    pub fn update_triage(
        &self,
        id: PatientId,
        level: TriageLevel,
        priority: Option<u8>,
    ) -> Result<Patient, TriageError> {
        let mut patient = self.get(id)?;
        let previous = patient.status;
        patient.apply_triage_result(level, priority, TriageSource::Manual, Utc::now())?;
        self.reset_on_status_change(&mut patient, previous);
        self.repository.save(&patient)?;
        Ok(patient)
    }

    pub fn transition_status(
        &self,
        id: PatientId,
        next: PatientStatus,
    ) -> Result<Patient, TriageError> {
        let mut patient = self.get(id)?;
        let previous = patient.status;
        patient.transition_status(next, Utc::now())?;
        self.reset_on_status_change(&mut patient, previous);
        self.repository.save(&patient)?;
        Ok(patient)
    }

    pub fn set_pinned(&self, id: PatientId, pinned: bool) -> Result<Patient, TriageError> {
        let mut patient = self.get(id)?;
        patient.is_pinned = pinned;
        patient.updated_at = Some(Utc::now());
        self.repository.save(&patient)?;
        tracing::info!(patient_id = %id, pinned, "pin updated");
        Ok(patient)
    }

    /// Lưu thứ hạng kéo-thả; `None` trả về thứ tự mặc định.
    pub fn set_manual_order(
        &self,
        id: PatientId,
        rank: Option<u32>,
    ) -> Result<Patient, TriageError> {
        let mut patient = self.get(id)?;
        patient.manual_order = rank;
        patient.updated_at = Some(Utc::now());
        self.repository.save(&patient)?;
        Ok(patient)
    }

    /// Xoá cứng hồ sơ.
    pub fn delete_patient(&self, id: PatientId) -> Result<(), TriageError> {
        if !self.repository.delete(id)? {
            return Err(TriageError::NotFound(id));
        }
        tracing::info!(patient_id = %id, "patient deleted");
        Ok(())
    }

    /// Hai hàng đợi hiện tại, có thể lọc theo tên hoặc triệu chứng.
    pub fn dashboard(&self, search: Option<&str>) -> Result<Queues, TriageError> {
        let query = match search {
            Some(search) => PatientQuery::active().with_search(search),
            None => PatientQuery::active(),
        };
        let patients = self.repository.query(&query)?;
        Ok(partition_queues(&patients))
    }

    /// Gọi bộ chấm điểm AI và lưu kết quả chờ xác nhận. Khi thất bại, hồ sơ giữ nguyên.
    pub fn request_ai_assessment<S>(&self, id: PatientId, scorer: &S) -> Result<AiAnalysis, TriageError>
    where
        S: ExternalScorer + ?Sized,
    {
        let mut patient = self.get(id)?;

        let assessment = scorer
            .score(&patient)
            .and_then(|assessment| assessment.check().map(|_| assessment))
            .map_err(|err| {
                tracing::warn!(patient_id = %id, error = %err, "AI scoring failed; triage left unchanged");
                err
            })?;

        let analysis = AiAnalysis::from_assessment(assessment, Utc::now());
        patient.ai_analysis = Some(analysis.clone());
        self.repository.save(&patient)?;

        tracing::info!(
            patient_id = %id,
            suggested = %analysis.triage_level,
            score = analysis.score,
            "AI assessment awaiting acknowledgment"
        );
        Ok(analysis)
    }

    /// Điều dưỡng xác nhận đề xuất AI; chỉ lúc này mức phân loại mới được ghi.
    pub fn acknowledge_ai_assessment(&self, id: PatientId) -> Result<Patient, TriageError> {
        let mut patient = self.get(id)?;
        let now = Utc::now();

        let level = match &patient.ai_analysis {
            Some(analysis) if !analysis.is_acknowledged() => analysis.triage_level,
            Some(_) => {
                return Err(ValidationError::Invalid {
                    field: "aiAnalysis",
                    reason: "đề xuất đã được xác nhận".to_string(),
                }
                .into())
            }
            None => return Err(ValidationError::MissingField("aiAnalysis").into()),
        };

        let previous = patient.status;
        patient.apply_triage_result(level, None, TriageSource::Ai, now)?;
        self.reset_on_status_change(&mut patient, previous);
        if let Some(analysis) = patient.ai_analysis.as_mut() {
            analysis.acknowledged_at = Some(now);
        }
        self.repository.save(&patient)?;
        Ok(patient)
    }

    /// Bỏ đề xuất AI chưa xác nhận.
    pub fn dismiss_ai_assessment(&self, id: PatientId) -> Result<Patient, TriageError> {
        let mut patient = self.get(id)?;
        if patient
            .ai_analysis
            .as_ref()
            .map_or(false, |analysis| !analysis.is_acknowledged())
        {
            patient.ai_analysis = None;
            patient.updated_at = Some(Utc::now());
            self.repository.save(&patient)?;
        }
        Ok(patient)
    }

    fn reset_on_status_change(&self, patient: &mut Patient, previous: PatientStatus) {
        if self.config.manual_order_reset == ManualOrderReset::OnStatusChange
            && patient.status != previous
        {
            patient.manual_order = None;
        }
    }
}
