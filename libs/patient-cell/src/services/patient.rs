use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info};

use shared_config::{AppConfig, StoreBackend};
use shared_database::{InMemoryPatientStore, PatientStore, SupabasePatientStore};
use shared_models::validation::{validate_create, validate_patient, validate_update};
use shared_models::{Patient, PatientId};

use crate::models::{PatientError, PatientListQuery};

pub struct PatientService {
    store: Arc<dyn PatientStore>,
}

impl PatientService {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self { store }
    }

    /// Builds the service over the backend selected in config.
    pub fn from_config(config: &AppConfig) -> Self {
        let store: Arc<dyn PatientStore> = match config.store_backend {
            StoreBackend::Memory => Arc::new(InMemoryPatientStore::new()),
            StoreBackend::Supabase => Arc::new(SupabasePatientStore::new(config)),
        };
        Self::new(store)
    }

    pub async fn create_patient(&self, body: &Map<String, Value>) -> Result<Patient, PatientError> {
        let new_patient = validate_create(body)?;
        debug!("Creating patient: {} {}", new_patient.first_name, new_patient.last_name);

        let patient = self.store.insert(new_patient).await?;
        info!("Patient created with ID: {}", patient.id);

        Ok(patient)
    }

    pub async fn get_patient(&self, id: &PatientId) -> Result<Patient, PatientError> {
        debug!("Fetching patient: {}", id);
        self.store.find(id).await?.ok_or(PatientError::NotFound)
    }

    /// Applies a partial update. The merged document is re-validated as a
    /// whole before anything is written.
    pub async fn update_patient(&self, id: &PatientId, body: &Map<String, Value>) -> Result<Patient, PatientError> {
        let changes = validate_update(body)?;
        debug!("Updating patient: {}", id);

        let mut merged = self.store.find(id).await?.ok_or(PatientError::NotFound)?;
        merged.apply(changes.clone(), Utc::now());
        validate_patient(&merged)?;

        let updated = self
            .store
            .update(id, changes)
            .await?
            .ok_or(PatientError::NotFound)?;
        info!("Patient updated: {}", id);

        Ok(updated)
    }

    pub async fn delete_patient(&self, id: &PatientId) -> Result<(), PatientError> {
        debug!("Deleting patient: {}", id);

        if !self.store.delete(id).await? {
            return Err(PatientError::NotFound);
        }
        info!("Patient deleted: {}", id);

        Ok(())
    }

    pub async fn list_patients(&self, query: PatientListQuery) -> Result<Vec<Patient>, PatientError> {
        let filter = query.into_filter()?;
        debug!("Listing patients with filter: {:?}", filter);

        Ok(self.store.list(&filter).await?)
    }
}
