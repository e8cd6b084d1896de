//! Giao diện lưu trữ hồ sơ bệnh nhân và bản cài đặt trong bộ nhớ.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::TriageError;
use crate::patient::{Patient, PatientId, PatientStatus};

/// Điều kiện truy vấn hồ sơ.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientQuery {
    /// `None` lấy mọi trạng thái.
    pub statuses: Option<Vec<PatientStatus>>,
    pub search: Option<String>,
}

impl PatientQuery {
    /// Bệnh nhân còn trong hàng đợi (Waiting, Triaged).
    pub fn active() -> Self {
        Self {
            statuses: Some(vec![PatientStatus::Waiting, PatientStatus::Triaged]),
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn matches(&self, patient: &Patient) -> bool {
        let status_ok = self
            .statuses
            .as_ref()
            .map_or(true, |statuses| statuses.contains(&patient.status));
        let search_ok = self
            .search
            .as_deref()
            .map_or(true, |search| patient.matches_query(search));
        status_ok && search_ok
    }
}

/// Kho hồ sơ. Mỗi `save` ghi đè toàn bộ tài liệu (ghi sau thắng).
#[cfg_attr(test, mockall::automock)]
pub trait PatientRepository {
    fn find_by_id(&self, id: PatientId) -> Result<Option<Patient>, TriageError>;
    fn save(&self, patient: &Patient) -> Result<(), TriageError>;
    fn query(&self, query: &PatientQuery) -> Result<Vec<Patient>, TriageError>;
    /// Xoá cứng. Trả về `false` nếu không tồn tại.
    fn delete(&self, id: PatientId) -> Result<bool, TriageError>;
}

/// Kho trong bộ nhớ; mỗi thao tác trên một tài liệu là nguyên tử.
#[derive(Debug, Default)]
pub struct InMemoryPatientRepository {
    patients: RwLock<HashMap<PatientId, Patient>>,
}

fn poisoned<T>(_: T) -> TriageError {
    TriageError::Repository("khoá kho lưu trữ bị hỏng".to_string())
}

impl InMemoryPatientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patients(patients: impl IntoIterator<Item = Patient>) -> Self {
        Self {
            patients: RwLock::new(patients.into_iter().map(|p| (p.id, p)).collect()),
        }
    }

    /// Toàn bộ hồ sơ, sắp theo thời điểm đăng ký.
    pub fn snapshot(&self) -> Result<Vec<Patient>, TriageError> {
        let mut patients: Vec<Patient> =
            self.patients.read().map_err(poisoned)?.values().cloned().collect();
        patients.sort_by(|a, b| a.registered_at.cmp(&b.registered_at).then(a.id.cmp(&b.id)));
        Ok(patients)
    }
}

impl PatientRepository for InMemoryPatientRepository {
    fn find_by_id(&self, id: PatientId) -> Result<Option<Patient>, TriageError> {
        Ok(self.patients.read().map_err(poisoned)?.get(&id).cloned())
    }

    fn save(&self, patient: &Patient) -> Result<(), TriageError> {
        self.patients
            .write()
            .map_err(poisoned)?
            .insert(patient.id, patient.clone());
        Ok(())
    }

    fn query(&self, query: &PatientQuery) -> Result<Vec<Patient>, TriageError> {
        Ok(self
            .snapshot()?
            .into_iter()
            .filter(|patient| query.matches(patient))
            .collect())
    }

    fn delete(&self, id: PatientId) -> Result<bool, TriageError> {
        Ok(self.patients.write().map_err(poisoned)?.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::tests::{at, intake};

    #[test]
    fn save_overwrites_whole_document() {
        let repo = InMemoryPatientRepository::new();
        let mut patient = Patient::register(intake("Mai"), at(0)).unwrap();
        repo.save(&patient).unwrap();

        patient.symptoms = "headache".to_string();
        repo.save(&patient).unwrap();

        let stored = repo.find_by_id(patient.id).unwrap().unwrap();
        assert_eq!(stored.symptoms, "headache");
        assert_eq!(repo.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn query_filters_by_status_and_search() {
        let waiting = Patient::register(intake("Lan"), at(0)).unwrap();
        let mut done = Patient::register(intake("Hoa"), at(1)).unwrap();
        done.transition_status(PatientStatus::InProgress, at(2)).unwrap();
        let repo = InMemoryPatientRepository::with_patients([waiting.clone(), done.clone()]);

        let active = repo.query(&PatientQuery::active()).unwrap();
        assert_eq!(active, vec![waiting]);

        let all = repo.query(&PatientQuery::default().with_search("hoa")).unwrap();
        assert_eq!(all, vec![done]);
    }

    #[test]
    fn delete_reports_missing_ids() {
        let patient = Patient::register(intake("Cuc"), at(0)).unwrap();
        let repo = InMemoryPatientRepository::with_patients([patient.clone()]);
        assert!(repo.delete(patient.id).unwrap());
        assert!(!repo.delete(patient.id).unwrap());
        assert_eq!(repo.find_by_id(patient.id).unwrap(), None);
    }
}
