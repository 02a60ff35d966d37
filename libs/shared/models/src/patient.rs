use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Wire format for dates of birth (`DD-MM-YYYY`).
pub const DOB_FORMAT: &str = "%d-%m-%Y";

/// Parses a date of birth in the exact `DD-MM-YYYY` shape. Single-digit days
/// or months and impossible dates such as `31-02-2000` are rejected.
pub fn parse_dob(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[2] != b'-' || bytes[5] != b'-' {
        return None;
    }
    let digits_only = bytes
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 2 && *i != 5)
        .all(|(_, b)| b.is_ascii_digit());
    if !digits_only {
        return None;
    }
    NaiveDate::parse_from_str(value, DOB_FORMAT).ok()
}

pub fn format_dob(date: &NaiveDate) -> String {
    date.format(DOB_FORMAT).to_string()
}

pub mod dob_format {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_dob(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_dob(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid date of birth '{}', expected DD-MM-YYYY", raw)))
    }
}

// ==============================================================================
// IDENTIFIER
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid patient id '{0}': expected a 24 character hex string")]
pub struct InvalidPatientId(pub String);

/// 12-byte document identifier rendered as 24 hex characters.
///
/// Layout: 4-byte big-endian unix seconds, 5 bytes fixed per process, then a
/// 3-byte counter starting at zero. Ids minted by one process sort in creation
/// order as long as fewer than 2^24 are minted in the process's lifetime; past
/// that the counter wraps and ordering only holds across distinct seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatientId([u8; 12]);

static PROCESS_UNIQUE: LazyLock<[u8; 5]> = LazyLock::new(|| rand::random());
static ID_COUNTER: AtomicU32 = AtomicU32::new(0);

const COUNTER_MASK: u32 = 0x00ff_ffff;

impl PatientId {
    pub fn generate() -> Self {
        let seconds = Utc::now().timestamp() as u32;
        let count = ID_COUNTER.fetch_add(1, Ordering::SeqCst) & COUNTER_MASK;
        Self::from_parts(seconds, *PROCESS_UNIQUE, count)
    }

    fn from_parts(seconds: u32, process: [u8; 5], count: u32) -> Self {
        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&process);
        bytes[9..].copy_from_slice(&(count & COUNTER_MASK).to_be_bytes()[1..]);
        Self(bytes)
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidPatientId> {
        if raw.len() != 24 {
            return Err(InvalidPatientId(raw.to_string()));
        }

        let mut bytes = [0u8; 12];
        hex::decode_to_slice(raw, &mut bytes).map_err(|_| InvalidPatientId(raw.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for PatientId {
    type Err = InvalidPatientId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PatientId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PatientId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}

// ==============================================================================
// STATUS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PatientStatus {
    #[default]
    Inquiry,
    Onboarding,
    Active,
    Churned,
}

impl PatientStatus {
    pub const ALL: [PatientStatus; 4] = [
        PatientStatus::Inquiry,
        PatientStatus::Onboarding,
        PatientStatus::Active,
        PatientStatus::Churned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatientStatus::Inquiry => "Inquiry",
            PatientStatus::Onboarding => "Onboarding",
            PatientStatus::Active => "Active",
            PatientStatus::Churned => "Churned",
        }
    }
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatientStatus {
    type Err = String;

    // Case-sensitive on purpose: "active" is not a status.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown patient status: {}", s))
    }
}

// ==============================================================================
// DOCUMENTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub last_name: String,
    #[serde(with = "dob_format")]
    pub dob: NaiveDate,
    pub status: PatientStatus,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn from_new(id: PatientId, new: NewPatient, now: DateTime<Utc>) -> Self {
        Self {
            id,
            first_name: new.first_name,
            middle_name: new.middle_name,
            last_name: new.last_name,
            dob: new.dob,
            status: new.status,
            street: new.street,
            city: new.city,
            state: new.state,
            postal_code: new.postal_code,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full name with empty parts skipped, e.g. "Jane Doe" or "Jane Q Doe".
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Merges a partial update onto this document and bumps `updated_at`.
    pub fn apply(&mut self, changes: PatientChanges, now: DateTime<Utc>) {
        if let Some(first_name) = changes.first_name {
            self.first_name = first_name;
        }
        if let Some(middle_name) = changes.middle_name {
            self.middle_name = middle_name;
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = last_name;
        }
        if let Some(dob) = changes.dob {
            self.dob = dob;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(street) = changes.street {
            self.street = street;
        }
        if let Some(city) = changes.city {
            self.city = city;
        }
        if let Some(state) = changes.state {
            self.state = state;
        }
        if let Some(postal_code) = changes.postal_code {
            self.postal_code = postal_code;
        }
        self.updated_at = now;
    }
}

/// A validated patient that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub status: PatientStatus,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// A validated partial update. `None` means "keep the stored value".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientChanges {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub status: Option<PatientStatus>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

impl PatientChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Exact-match list filter; set keys are ANDed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientFilter {
    pub status: Option<PatientStatus>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl PatientFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.city.is_none() && self.state.is_none()
    }

    pub fn matches(&self, patient: &Patient) -> bool {
        self.status.is_none_or(|status| patient.status == status)
            && self.city.as_deref().is_none_or(|city| patient.city == city)
            && self.state.as_deref().is_none_or(|state| patient.state == state)
    }
}
