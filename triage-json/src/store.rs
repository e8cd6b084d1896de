use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use triage_core::{Patient, PatientId, PatientQuery, PatientRepository, TriageError};

use crate::{collection_to_string, parse_collection_str, DocumentError};

/// `PatientRepository` backed by a single JSON array file.
///
/// Every operation re-reads the file, so external edits are picked up; writes
/// go through a temporary file and a rename so readers never see a partial
/// document.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileRepository {
    /// Open the store, creating an empty collection if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let path = path.into();
        if !path.exists() {
            write_atomically(&path, "[]")?;
            tracing::info!(path = %path.display(), "created empty patient store");
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<Patient>, DocumentError> {
        let data = fs::read_to_string(&self.path).map_err(|source| DocumentError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_collection_str(&data)
    }

    fn store(&self, patients: &[Patient]) -> Result<(), DocumentError> {
        write_atomically(&self.path, &collection_to_string(patients)?)
    }

    fn modify<T>(
        &self,
        change: impl FnOnce(&mut Vec<Patient>) -> T,
    ) -> Result<T, TriageError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| TriageError::Repository("patient store lock poisoned".to_string()))?;
        let mut patients = self.load()?;
        let outcome = change(&mut patients);
        self.store(&patients)?;
        Ok(outcome)
    }
}

fn write_atomically(path: &Path, contents: &str) -> Result<(), DocumentError> {
    let tmp = path.with_extension("json.tmp");
    let io_err = |source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp, contents).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}

impl PatientRepository for JsonFileRepository {
    fn find_by_id(&self, id: PatientId) -> Result<Option<Patient>, TriageError> {
        Ok(self.load()?.into_iter().find(|patient| patient.id == id))
    }

    fn save(&self, patient: &Patient) -> Result<(), TriageError> {
        self.modify(|patients| {
            match patients.iter_mut().find(|existing| existing.id == patient.id) {
                Some(existing) => *existing = patient.clone(),
                None => patients.push(patient.clone()),
            }
        })
    }

    fn query(&self, query: &PatientQuery) -> Result<Vec<Patient>, TriageError> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|patient| query.matches(patient))
            .collect())
    }

    fn delete(&self, id: PatientId) -> Result<bool, TriageError> {
        self.modify(|patients| {
            let before = patients.len();
            patients.retain(|patient| patient.id != id);
            patients.len() != before
        })
    }
}
