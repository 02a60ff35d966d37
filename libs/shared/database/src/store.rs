use async_trait::async_trait;
use thiserror::Error;

use shared_models::{NewPatient, Patient, PatientChanges, PatientFilter, PatientId};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Persistence for patient documents.
///
/// Implementations assign the id and both timestamps on insert and refresh
/// `updated_at` on every update. Lookups by a well-formed id that matches no
/// document return `None` / `false` rather than an error.
#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn insert(&self, patient: NewPatient) -> Result<Patient, StoreError>;

    async fn find(&self, id: &PatientId) -> Result<Option<Patient>, StoreError>;

    async fn update(&self, id: &PatientId, changes: PatientChanges) -> Result<Option<Patient>, StoreError>;

    /// Removes the document permanently. Returns `false` if nothing was deleted.
    async fn delete(&self, id: &PatientId) -> Result<bool, StoreError>;

    async fn list(&self, filter: &PatientFilter) -> Result<Vec<Patient>, StoreError>;
}
