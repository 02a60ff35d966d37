pub mod error;
pub mod patient;
pub mod response;
pub mod validation;

pub use error::AppError;
pub use patient::{
    InvalidPatientId, NewPatient, Patient, PatientChanges, PatientFilter, PatientId, PatientStatus,
};
pub use response::ApiResponse;
pub use validation::{Field, FieldError, ValidationErrors};
