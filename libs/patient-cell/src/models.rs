use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::{PatientFilter, PatientStatus, ValidationErrors};

/// Longest accepted `city` / `state` list filter value.
pub const MAX_FILTER_LEN: usize = 500;

/// Query string accepted by `GET /patients`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientListQuery {
    pub status: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl PatientListQuery {
    /// Turns raw query values into an exact-match filter. A key that is
    /// present with an empty value is rejected rather than ignored.
    pub fn into_filter(self) -> Result<PatientFilter, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let status = match self.status {
            Some(raw) if raw.is_empty() => {
                errors.push("status", "status is not allowed to be empty");
                None
            }
            Some(raw) => match raw.parse::<PatientStatus>() {
                Ok(status) => Some(status),
                Err(_) => {
                    let allowed: Vec<&str> = PatientStatus::ALL.iter().map(|s| s.as_str()).collect();
                    errors.push("status", format!("status must be one of {}", allowed.join(", ")));
                    None
                }
            },
            None => None,
        };

        let mut bounded = |key: &str, value: Option<String>| {
            let value = value?;
            if value.is_empty() {
                errors.push(key, format!("{} is not allowed to be empty", key));
                return None;
            }
            if value.chars().count() > MAX_FILTER_LEN {
                errors.push(key, format!("{} must be at most {} characters", key, MAX_FILTER_LEN));
                return None;
            }
            Some(value)
        };
        let city = bounded("city", self.city);
        let state = bounded("state", self.state);

        if errors.is_empty() {
            Ok(PatientFilter { status, city, state })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
            PatientError::Validation(errors) => AppError::Validation(errors),
            PatientError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}
