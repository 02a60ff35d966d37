use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};

use shared_config::{AppConfig, StoreBackend};
use shared_models::{Patient, PatientId, PatientStatus};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            port: 0,
            store_backend: StoreBackend::Supabase,
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_key: String::new(),
            cors_allow_origin: None,
        }
    }
}

pub struct PatientFixtures;

impl PatientFixtures {
    /// Create body for the canonical "Jane Doe" record.
    pub fn jane_body() -> Value {
        json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "dob": "01-02-1990",
            "status": "Active",
            "street": "100 Main Street",
            "city": "Springfield",
            "state": "IL",
            "postalCode": "62701"
        })
    }

    pub fn body_with(first_name: &str, status: PatientStatus, city: &str, state: &str) -> Value {
        let mut body = Self::jane_body();
        body["firstName"] = json!(first_name);
        body["status"] = json!(status.as_str());
        body["city"] = json!(city);
        body["state"] = json!(state);
        body
    }

    pub fn patient(first_name: &str, status: PatientStatus, city: &str, state: &str) -> Patient {
        let now = Utc::now();
        Patient {
            id: PatientId::generate(),
            first_name: first_name.to_string(),
            middle_name: String::new(),
            last_name: "Doe".to_string(),
            dob: NaiveDate::from_ymd_opt(1990, 2, 1).unwrap_or_default(),
            status,
            street: "100 Main Street".to_string(),
            city: city.to_string(),
            state: state.to_string(),
            postal_code: "62701".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn jane() -> Patient {
        Self::patient("Jane", PatientStatus::Active, "Springfield", "IL")
    }

    /// The `patients` table row PostgREST would return for `patient`.
    pub fn row_json(patient: &Patient) -> Value {
        json!({
            "id": patient.id.to_string(),
            "first_name": patient.first_name,
            "middle_name": patient.middle_name,
            "last_name": patient.last_name,
            "date_of_birth": patient.dob.format("%Y-%m-%d").to_string(),
            "status": patient.status.as_str(),
            "street": patient.street,
            "city": patient.city,
            "state": patient.state,
            "postal_code": patient.postal_code,
            "created_at": patient.created_at.to_rfc3339(),
            "updated_at": patient.updated_at.to_rfc3339()
        })
    }

    /// Success envelope wrapping `data`, as the API returns it.
    pub fn envelope(data: Value) -> Value {
        json!({ "success": true, "data": data })
    }

    pub fn failure(message: &str) -> Value {
        json!({ "success": false, "message": message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();

        assert_eq!(config.supabase_url, "http://localhost:54321");
        assert_eq!(config.supabase_anon_key, "test-anon-key");
        assert!(config.is_supabase_configured());
    }

    #[test]
    fn test_fixture_body_matches_patient_wire_shape() {
        let jane = PatientFixtures::jane();
        let wire = serde_json::to_value(&jane).unwrap();
        let body = PatientFixtures::jane_body();

        for key in ["firstName", "lastName", "dob", "status", "street", "city", "state", "postalCode"] {
            assert_eq!(wire[key], body[key], "mismatch on {}", key);
        }
    }
}
