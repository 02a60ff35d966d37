//! Field rules for patient records.
//!
//! The same table backs the server's request validation and the dashboard
//! form, so the two cannot drift apart. Free-text fields are checked and
//! stored trimmed; coded fields (date, status, state, postal code) must match
//! exactly as sent. Every failure is a user-facing message scoped to one field.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::patient::{format_dob, parse_dob, NewPatient, Patient, PatientChanges, PatientStatus};

static CITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z .'-]+$").expect("city pattern compiles"));
static STATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]{2}$").expect("state pattern compiles"));
static US_ZIP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("zip pattern compiles"));
static CA_POSTAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]\d[A-Za-z] \d[A-Za-z]\d$").expect("postal pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FirstName,
    MiddleName,
    LastName,
    Dob,
    Status,
    Street,
    City,
    State,
    PostalCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Date,
    Status,
    CityName,
    StateCode,
    PostalCode,
}

impl Format {
    /// Whether surrounding whitespace is dropped before checking and storing.
    pub fn trims(self) -> bool {
        matches!(self, Format::Text | Format::CityName)
    }
}

#[derive(Debug)]
pub struct FieldRule {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
    /// Minimum trimmed length and the message shown when it is not met.
    pub min_len: Option<(usize, &'static str)>,
    pub max_len: Option<usize>,
    pub format: Format,
}

static RULES: [FieldRule; 9] = [
    FieldRule {
        key: "firstName",
        label: "First Name",
        required: true,
        min_len: Some((2, "First name must be at least 2 characters")),
        max_len: Some(50),
        format: Format::Text,
    },
    FieldRule {
        key: "middleName",
        label: "Middle Name",
        required: false,
        min_len: None,
        max_len: Some(50),
        format: Format::Text,
    },
    FieldRule {
        key: "lastName",
        label: "Last Name",
        required: true,
        min_len: Some((2, "Last name must be at least 2 characters")),
        max_len: Some(50),
        format: Format::Text,
    },
    FieldRule {
        key: "dob",
        label: "Date of Birth",
        required: true,
        min_len: None,
        max_len: None,
        format: Format::Date,
    },
    FieldRule {
        key: "status",
        label: "Patient Status",
        required: true,
        min_len: None,
        max_len: None,
        format: Format::Status,
    },
    FieldRule {
        key: "street",
        label: "Street Address",
        required: true,
        min_len: Some((5, "Street address must be at least 5 characters")),
        max_len: Some(100),
        format: Format::Text,
    },
    FieldRule {
        key: "city",
        label: "City",
        required: true,
        min_len: Some((2, "City must be at least 2 characters")),
        max_len: Some(50),
        format: Format::CityName,
    },
    FieldRule {
        key: "state",
        label: "State/Province",
        required: true,
        min_len: None,
        max_len: None,
        format: Format::StateCode,
    },
    FieldRule {
        key: "postalCode",
        label: "Postal Code",
        required: true,
        min_len: None,
        max_len: Some(10),
        format: Format::PostalCode,
    },
];

impl Field {
    pub const ALL: [Field; 9] = [
        Field::FirstName,
        Field::MiddleName,
        Field::LastName,
        Field::Dob,
        Field::Status,
        Field::Street,
        Field::City,
        Field::State,
        Field::PostalCode,
    ];

    pub fn rule(self) -> &'static FieldRule {
        &RULES[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.rule().key
    }

    pub fn label(self) -> &'static str {
        self.rule().label
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The value that is checked and stored for `raw`.
pub fn normalize(field: Field, raw: &str) -> &str {
    if field.rule().format.trims() {
        raw.trim()
    } else {
        raw
    }
}

/// Checks one raw value against its field rule.
pub fn check_field(field: Field, raw: &str) -> Result<(), String> {
    let rule = field.rule();
    let value = normalize(field, raw);

    if value.is_empty() {
        return if rule.required {
            Err(format!("{} is required", rule.label))
        } else {
            Ok(())
        };
    }

    if let Some(max) = rule.max_len {
        if value.chars().count() > max {
            return Err(format!("{} must be at most {} characters", rule.label, max));
        }
    }

    // City reports a bad character before a short value.
    if rule.format == Format::CityName && !CITY_PATTERN.is_match(value) {
        return Err("City must contain only letters, spaces, periods, apostrophes or hyphens".to_string());
    }

    if let Some((min, message)) = rule.min_len {
        if value.chars().count() < min {
            return Err(message.to_string());
        }
    }

    match rule.format {
        Format::Text | Format::CityName => Ok(()),
        Format::Date => parse_dob(value)
            .map(|_| ())
            .ok_or_else(|| "Date of birth must be a valid date in DD-MM-YYYY format".to_string()),
        Format::Status => value.parse::<PatientStatus>().map(|_| ()).map_err(|_| {
            let allowed: Vec<&str> = PatientStatus::ALL.iter().map(|s| s.as_str()).collect();
            format!("{} must be one of {}", rule.label, allowed.join(", "))
        }),
        Format::StateCode => {
            if value.chars().count() != 2 {
                Err("State/Province must be 2 characters (abbreviation or any 2 letters)".to_string())
            } else if !STATE_PATTERN.is_match(value) {
                Err("State/Province must be 2 letters".to_string())
            } else {
                Ok(())
            }
        }
        Format::PostalCode => {
            if US_ZIP_PATTERN.is_match(value) || CA_POSTAL_PATTERN.is_match(value) {
                Ok(())
            } else {
                Err("Postal code must be a valid US ZIP (12345 or 12345-6789) or Canadian postal code (A1A 1A1)".to_string())
            }
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every violation found in one request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}", join_errors(.errors))]
#[serde(transparent)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

// ==============================================================================
// REQUEST BODIES
// ==============================================================================

/// Trimmed values that passed their field rule.
struct Checked(BTreeMap<Field, String>);

impl Checked {
    fn text(&mut self, field: Field) -> Option<String> {
        self.0.remove(&field)
    }

    fn date(&self) -> Option<NaiveDate> {
        self.0.get(&Field::Dob).and_then(|raw| parse_dob(raw))
    }

    fn status(&self) -> Option<PatientStatus> {
        self.0.get(&Field::Status).and_then(|raw| raw.parse().ok())
    }
}

fn check_body(body: &Map<String, Value>, require_all: bool) -> Result<Checked, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let mut checked = BTreeMap::new();

    for key in body.keys() {
        if Field::from_key(key).is_none() {
            errors.push(key.as_str(), format!("\"{}\" is not allowed", key));
        }
    }

    for field in Field::ALL {
        match body.get(field.key()) {
            None => {
                if require_all && field.rule().required {
                    errors.push(field.key(), format!("{} is required", field.label()));
                }
            }
            Some(Value::String(raw)) => match check_field(field, raw) {
                Ok(()) => {
                    checked.insert(field, normalize(field, raw).to_string());
                }
                Err(message) => errors.push(field.key(), message),
            },
            Some(_) => errors.push(field.key(), format!("{} must be a string", field.label())),
        }
    }

    errors.into_result()?;
    Ok(Checked(checked))
}

/// Validates a full create body. All violations are reported at once.
pub fn validate_create(body: &Map<String, Value>) -> Result<NewPatient, ValidationErrors> {
    let mut checked = check_body(body, true)?;

    let Some(dob) = checked.date() else {
        return Err(ValidationErrors::single(Field::Dob.key(), "Date of Birth is required"));
    };
    let status = checked.status().unwrap_or_default();

    Ok(NewPatient {
        first_name: checked.text(Field::FirstName).unwrap_or_default(),
        middle_name: checked.text(Field::MiddleName).unwrap_or_default(),
        last_name: checked.text(Field::LastName).unwrap_or_default(),
        dob,
        status,
        street: checked.text(Field::Street).unwrap_or_default(),
        city: checked.text(Field::City).unwrap_or_default(),
        state: checked.text(Field::State).unwrap_or_default(),
        postal_code: checked.text(Field::PostalCode).unwrap_or_default(),
    })
}

/// Validates a partial update body. At least one field must be supplied and
/// every supplied field is held to the same rule as on create.
pub fn validate_update(body: &Map<String, Value>) -> Result<PatientChanges, ValidationErrors> {
    if body.is_empty() {
        return Err(ValidationErrors::single("body", "At least one field must be provided"));
    }

    let mut checked = check_body(body, false)?;

    let changes = PatientChanges {
        dob: checked.date(),
        status: checked.status(),
        first_name: checked.text(Field::FirstName),
        middle_name: checked.text(Field::MiddleName),
        last_name: checked.text(Field::LastName),
        street: checked.text(Field::Street),
        city: checked.text(Field::City),
        state: checked.text(Field::State),
        postal_code: checked.text(Field::PostalCode),
    };
    Ok(changes)
}

/// Re-checks a complete document, e.g. after merging a partial update.
pub fn validate_patient(patient: &Patient) -> Result<(), ValidationErrors> {
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

    let mut errors = ValidationErrors::default();
    for (field, value) in values {
        if let Err(message) = check_field(field, &value) {
            errors.push(field.key(), message);
        }
    }
    errors.into_result()
}
