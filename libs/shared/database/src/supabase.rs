use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use async_trait::async_trait;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::{NewPatient, Patient, PatientChanges, PatientFilter, PatientId, PatientStatus};

use crate::store::{PatientStore, StoreError};

const PATIENTS_PATH: &str = "/rest/v1/patients";

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    token: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            token: config.supabase_token().to_string(),
        }
    }

    fn get_headers(&self, return_representation: bool) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();

        let apikey = HeaderValue::from_str(&self.anon_key)
            .map_err(|e| StoreError::Backend(format!("Invalid Supabase key: {}", e)))?;
        headers.insert("apikey", apikey);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !self.token.is_empty() {
            let bearer = HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|e| StoreError::Backend(format!("Invalid Supabase token: {}", e)))?;
            headers.insert(AUTHORIZATION, bearer);
        }

        if return_representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        return_representation: bool,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.get_headers(return_representation)?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("PostgREST error ({}): {}", status, error_text);
            return Err(StoreError::Backend(format!("PostgREST error ({}): {}", status, error_text)));
        }

        Ok(response.json::<T>().await?)
    }
}

/// Row shape of the `patients` table: snake_case columns and ISO dates.
#[derive(Debug, Serialize, Deserialize)]
struct PatientRow {
    id: PatientId,
    first_name: String,
    #[serde(default)]
    middle_name: Option<String>,
    last_name: String,
    date_of_birth: NaiveDate,
    status: PatientStatus,
    street: String,
    city: String,
    state: String,
    postal_code: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Patient> for PatientRow {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            first_name: patient.first_name,
            middle_name: Some(patient.middle_name),
            last_name: patient.last_name,
            date_of_birth: patient.dob,
            status: patient.status,
            street: patient.street,
            city: patient.city,
            state: patient.state,
            postal_code: patient.postal_code,
            created_at: patient.created_at,
            updated_at: patient.updated_at,
        }
    }
}

impl From<PatientRow> for Patient {
    fn from(row: PatientRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            middle_name: row.middle_name.unwrap_or_default(),
            last_name: row.last_name,
            dob: row.date_of_birth,
            status: row.status,
            street: row.street,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn changes_to_columns(changes: PatientChanges) -> Map<String, Value> {
    let mut columns = Map::new();

    if let Some(first_name) = changes.first_name {
        columns.insert("first_name".to_string(), json!(first_name));
    }
    if let Some(middle_name) = changes.middle_name {
        columns.insert("middle_name".to_string(), json!(middle_name));
    }
    if let Some(last_name) = changes.last_name {
        columns.insert("last_name".to_string(), json!(last_name));
    }
    if let Some(dob) = changes.dob {
        columns.insert("date_of_birth".to_string(), json!(dob));
    }
    if let Some(status) = changes.status {
        columns.insert("status".to_string(), json!(status));
    }
    if let Some(street) = changes.street {
        columns.insert("street".to_string(), json!(street));
    }
    if let Some(city) = changes.city {
        columns.insert("city".to_string(), json!(city));
    }
    if let Some(state) = changes.state {
        columns.insert("state".to_string(), json!(state));
    }
    if let Some(postal_code) = changes.postal_code {
        columns.insert("postal_code".to_string(), json!(postal_code));
    }

    columns.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
    columns
}

fn by_id(id: &PatientId) -> String {
    format!("{}?id=eq.{}", PATIENTS_PATH, id)
}

fn first_row(rows: Vec<PatientRow>) -> Option<Patient> {
    rows.into_iter().next().map(Patient::from)
}

/// Patient store backed by a Supabase (PostgREST) `patients` table.
pub struct SupabasePatientStore {
    supabase: SupabaseClient,
}

impl SupabasePatientStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl PatientStore for SupabasePatientStore {
    async fn insert(&self, patient: NewPatient) -> Result<Patient, StoreError> {
        let patient = Patient::from_new(PatientId::generate(), patient, Utc::now());
        debug!("Creating patient {}", patient.id);

        let row = serde_json::to_value(PatientRow::from(patient))?;
        let result: Vec<PatientRow> = self
            .supabase
            .request(Method::POST, PATIENTS_PATH, Some(row), true)
            .await?;

        first_row(result).ok_or_else(|| StoreError::Backend("Failed to create patient record".to_string()))
    }

    async fn find(&self, id: &PatientId) -> Result<Option<Patient>, StoreError> {
        debug!("Fetching patient {}", id);
        let result: Vec<PatientRow> = self.supabase.request(Method::GET, &by_id(id), None, false).await?;
        Ok(first_row(result))
    }

    async fn update(&self, id: &PatientId, changes: PatientChanges) -> Result<Option<Patient>, StoreError> {
        debug!("Updating patient {}", id);
        let columns = Value::Object(changes_to_columns(changes));
        let result: Vec<PatientRow> = self
            .supabase
            .request(Method::PATCH, &by_id(id), Some(columns), true)
            .await?;
        Ok(first_row(result))
    }

    async fn delete(&self, id: &PatientId) -> Result<bool, StoreError> {
        debug!("Deleting patient {}", id);
        let result: Vec<PatientRow> = self.supabase.request(Method::DELETE, &by_id(id), None, true).await?;
        Ok(!result.is_empty())
    }

    async fn list(&self, filter: &PatientFilter) -> Result<Vec<Patient>, StoreError> {
        debug!("Listing patients with filter: {:?}", filter);

        let mut query_parts = vec!["select=*".to_string(), "order=id.asc".to_string()];
        if let Some(status) = filter.status {
            query_parts.push(format!("status=eq.{}", status));
        }
        if let Some(city) = &filter.city {
            query_parts.push(format!("city=eq.{}", urlencoding::encode(city)));
        }
        if let Some(state) = &filter.state {
            query_parts.push(format!("state=eq.{}", urlencoding::encode(state)));
        }

        let path = format!("{}?{}", PATIENTS_PATH, query_parts.join("&"));
        let result: Vec<PatientRow> = self.supabase.request(Method::GET, &path, None, false).await?;

        Ok(result.into_iter().map(Patient::from).collect())
    }
}
