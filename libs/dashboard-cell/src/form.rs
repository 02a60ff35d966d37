//! Declarative add/edit form.
//!
//! `FORM_FIELDS` describes how each field is rendered; the rules themselves
//! come from the shared validation table so the form rejects exactly what the
//! API would.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use shared_models::patient::format_dob;
use shared_models::validation::{check_field, normalize};
use shared_models::{Field, FieldError, Patient, PatientStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    /// Entered and submitted as DD-MM-YYYY.
    Date,
    Select(&'static [PatientStatus]),
}

#[derive(Debug)]
pub struct FieldDescriptor {
    pub field: Field,
    pub placeholder: &'static str,
    pub input: InputKind,
}

impl FieldDescriptor {
    pub fn label(&self) -> &'static str {
        self.field.label()
    }

    pub fn required(&self) -> bool {
        self.field.rule().required
    }
}

pub static FORM_FIELDS: [FieldDescriptor; 9] = [
    FieldDescriptor {
        field: Field::FirstName,
        placeholder: "Enter first name",
        input: InputKind::Text,
    },
    FieldDescriptor {
        field: Field::MiddleName,
        placeholder: "Enter middle name",
        input: InputKind::Text,
    },
    FieldDescriptor {
        field: Field::LastName,
        placeholder: "Enter last name",
        input: InputKind::Text,
    },
    FieldDescriptor {
        field: Field::Dob,
        placeholder: "Select date of birth",
        input: InputKind::Date,
    },
    FieldDescriptor {
        field: Field::Status,
        placeholder: "Select status",
        input: InputKind::Select(&PatientStatus::ALL),
    },
    FieldDescriptor {
        field: Field::Street,
        placeholder: "Enter street address, apartment, or suite number",
        input: InputKind::Text,
    },
    FieldDescriptor {
        field: Field::City,
        placeholder: "Enter city name",
        input: InputKind::Text,
    },
    FieldDescriptor {
        field: Field::State,
        placeholder: "Enter state or province (e.g. NY, ON)",
        input: InputKind::Text,
    },
    FieldDescriptor {
        field: Field::PostalCode,
        placeholder: "Enter postal code",
        input: InputKind::Text,
    },
];

/// Values and per-field errors of one open form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientForm {
    values: BTreeMap<Field, String>,
    errors: BTreeMap<Field, String>,
}

impl PatientForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form pre-filled for editing `patient`.
    pub fn from_patient(patient: &Patient) -> Self {
        let values = [
            (Field::FirstName, patient.first_name.clone()),
            (Field::MiddleName, patient.middle_name.clone()),
            (Field::LastName, patient.last_name.clone()),
            (Field::Dob, format_dob(&patient.dob)),
            (Field::Status, patient.status.as_str().to_string()),
            (Field::Street, patient.street.clone()),
            (Field::City, patient.city.clone()),
            (Field::State, patient.state.clone()),
            (Field::PostalCode, patient.postal_code.clone()),
        ];

        Self {
            values: values.into_iter().collect(),
            errors: BTreeMap::new(),
        }
    }

    pub fn value(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Records an edit. Any error shown for the field is cleared.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
        self.errors.remove(&field);
    }

    /// Checks one field as the user leaves it. Returns whether it is valid.
    pub fn blur(&mut self, field: Field) -> bool {
        match check_field(field, self.value(field)) {
            Ok(()) => {
                self.errors.remove(&field);
                true
            }
            Err(message) => {
                self.errors.insert(field, message);
                false
            }
        }
    }

    /// Checks every field; the form may be submitted only when this is true.
    pub fn validate(&mut self) -> bool {
        self.errors.clear();
        for descriptor in &FORM_FIELDS {
            self.blur(descriptor.field);
        }
        self.errors.is_empty()
    }

    /// Shows errors reported by the server against the matching fields.
    pub fn apply_server_errors(&mut self, errors: &[FieldError]) {
        for error in errors {
            if let Some(field) = Field::from_key(&error.field) {
                self.errors.insert(field, error.message.clone());
            }
        }
    }

    /// JSON body for create or update: every field, normalized as the server stores it.
    pub fn body(&self) -> Value {
        let body: Map<String, Value> = FORM_FIELDS
            .iter()
            .map(|descriptor| {
                let field = descriptor.field;
                (field.key().to_string(), Value::String(normalize(field, self.value(field)).to_string()))
            })
            .collect();
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_utils::test_utils::PatientFixtures;

    fn filled() -> PatientForm {
        let mut form = PatientForm::new();
        form.set(Field::FirstName, "Jane");
        form.set(Field::LastName, "Doe");
        form.set(Field::Dob, "01-02-1990");
        form.set(Field::Status, "Active");
        form.set(Field::Street, "100 Main Street");
        form.set(Field::City, "Springfield");
        form.set(Field::State, "IL");
        form.set(Field::PostalCode, "62701");
        form
    }

    #[test]
    fn test_descriptors_cover_every_field_in_order() {
        let fields: Vec<Field> = FORM_FIELDS.iter().map(|d| d.field).collect();
        assert_eq!(fields, Field::ALL.to_vec());
        assert_eq!(FORM_FIELDS[4].input, InputKind::Select(&PatientStatus::ALL));
        assert!(!FORM_FIELDS[1].required());
        assert_eq!(FORM_FIELDS[7].label(), "State/Province");
    }

    #[test]
    fn test_empty_form_reports_required_fields() {
        let mut form = PatientForm::new();

        assert!(!form.validate());
        assert_eq!(form.error(Field::FirstName), Some("First Name is required"));
        assert_eq!(form.error(Field::MiddleName), None);
        assert_eq!(form.error(Field::Dob), Some("Date of Birth is required"));
    }

    #[test]
    fn test_blur_validates_one_field_and_edit_clears_it() {
        let mut form = PatientForm::new();
        form.set(Field::FirstName, "J");

        assert!(!form.blur(Field::FirstName));
        assert_eq!(form.error(Field::FirstName), Some("First name must be at least 2 characters"));
        assert_eq!(form.error(Field::LastName), None);

        form.set(Field::FirstName, "Jo");
        assert_eq!(form.error(Field::FirstName), None);
        assert!(form.blur(Field::FirstName));
    }

    #[test]
    fn test_filled_form_validates_and_builds_trimmed_body() {
        let mut form = filled();
        form.set(Field::City, "  Springfield ");

        assert!(form.validate());
        let body = form.body();
        assert_eq!(body["city"], "Springfield");
        assert_eq!(body["middleName"], "");
        assert_eq!(body["dob"], "01-02-1990");
        assert_eq!(body.as_object().unwrap().len(), 9);
    }

    #[test]
    fn test_padded_status_fails_on_the_form_too() {
        let mut form = filled();
        form.set(Field::Status, " Active");

        assert!(!form.blur(Field::Status));
        assert!(!form.validate());
        assert_eq!(form.body()["status"], " Active");
    }

    #[test]
    fn test_from_patient_round_trips_to_same_body() {
        let jane = PatientFixtures::jane();
        let mut form = PatientForm::from_patient(&jane);

        assert!(form.validate());
        let body = form.body();
        let expected = PatientFixtures::jane_body();
        for key in ["firstName", "lastName", "dob", "status", "street", "city", "state", "postalCode"] {
            assert_eq!(body[key], expected[key], "field {}", key);
        }
    }

    #[test]
    fn test_server_errors_land_on_fields() {
        let mut form = filled();
        form.apply_server_errors(&[
            FieldError {
                field: "state".to_string(),
                message: "State/Province must be 2 letters".to_string(),
            },
            FieldError {
                field: "body".to_string(),
                message: "ignored".to_string(),
            },
        ]);

        assert_eq!(form.error(Field::State), Some("State/Province must be 2 letters"));
        assert!(form.has_errors());
        assert_eq!(form.body()["state"], json!("IL"));
    }
}
