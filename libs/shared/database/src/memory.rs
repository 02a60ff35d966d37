use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use shared_models::{NewPatient, Patient, PatientChanges, PatientFilter, PatientId};

use crate::store::{PatientStore, StoreError};

/// Process-local store. Ids sort by creation time, so listing the map in key
/// order yields insertion order.
#[derive(Default)]
pub struct InMemoryPatientStore {
    documents: RwLock<BTreeMap<PatientId, Patient>>,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn insert(&self, patient: NewPatient) -> Result<Patient, StoreError> {
        let mut documents = self.documents.write().await;

        let mut id = PatientId::generate();
        while documents.contains_key(&id) {
            id = PatientId::generate();
        }

        let patient = Patient::from_new(id, patient, Utc::now());
        documents.insert(id, patient.clone());
        debug!("Stored patient {}", id);

        Ok(patient)
    }

    async fn find(&self, id: &PatientId) -> Result<Option<Patient>, StoreError> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn update(&self, id: &PatientId, changes: PatientChanges) -> Result<Option<Patient>, StoreError> {
        let mut documents = self.documents.write().await;

        Ok(documents.get_mut(id).map(|patient| {
            patient.apply(changes, Utc::now());
            debug!("Updated patient {}", id);
            patient.clone()
        }))
    }

    async fn delete(&self, id: &PatientId) -> Result<bool, StoreError> {
        let removed = self.documents.write().await.remove(id).is_some();
        debug!("Delete patient {} -> removed={}", id, removed);
        Ok(removed)
    }

    async fn list(&self, filter: &PatientFilter) -> Result<Vec<Patient>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .values()
            .filter(|patient| filter.matches(patient))
            .cloned()
            .collect())
    }
}
