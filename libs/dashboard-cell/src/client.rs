use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use shared_models::{ApiResponse, FieldError, Patient, PatientId};

const LOAD_FALLBACK: &str = "Failed to load patients. Please try again.";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server responded with {status}")]
    Server {
        status: u16,
        message: Option<String>,
        errors: Vec<FieldError>,
    },

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Banner text for a failed list load.
    pub fn load_message(&self) -> String {
        match self {
            ClientError::Server { status: 404, .. } => {
                "Patients endpoint not found. Please check the server.".to_string()
            }
            ClientError::Server { status: 500, .. } => "Server error. Please try again later.".to_string(),
            ClientError::Server { message: Some(message), .. } => message.clone(),
            ClientError::Network(_) => "Network error. Please check your connection.".to_string(),
            _ => LOAD_FALLBACK.to_string(),
        }
    }

    /// Banner text for a failed mutation: the server's message, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Server { message: Some(message), .. } => message.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ClientError::Server { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// HTTP client for the `/patients` resource.
#[derive(Clone)]
pub struct PatientApiClient {
    client: Client,
    base_url: String,
}

impl PatientApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<ApiResponse<T>, ClientError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(server_error(status, &bytes));
        }

        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>, ClientError> {
        let response = self.send(Method::GET, "/patients", None).await?;
        require_data(response)
    }

    pub async fn get_patient(&self, id: &PatientId) -> Result<Patient, ClientError> {
        let response = self.send(Method::GET, &format!("/patients/{}", id), None).await?;
        require_data(response)
    }

    pub async fn create_patient(&self, body: Value) -> Result<Patient, ClientError> {
        let response = self.send(Method::POST, "/patients", Some(body)).await?;
        require_data(response)
    }

    pub async fn update_patient(&self, id: &PatientId, body: Value) -> Result<Patient, ClientError> {
        let response = self
            .send(Method::PUT, &format!("/patients/{}", id), Some(body))
            .await?;
        require_data(response)
    }

    /// Returns the server's confirmation message.
    pub async fn delete_patient(&self, id: &PatientId) -> Result<String, ClientError> {
        let response: ApiResponse<Value> = self
            .send(Method::DELETE, &format!("/patients/{}", id), None)
            .await?;
        Ok(response.message.unwrap_or_default())
    }
}

fn require_data<T>(response: ApiResponse<T>) -> Result<T, ClientError> {
    response
        .data
        .ok_or_else(|| ClientError::Decode("response carried no data".to_string()))
}

fn server_error(status: StatusCode, bytes: &[u8]) -> ClientError {
    let envelope = serde_json::from_slice::<ApiResponse<Value>>(bytes).ok();
    warn!("Patient API responded with {}", status);

    let (message, errors) = match envelope {
        Some(envelope) => (envelope.message, envelope.errors.unwrap_or_default()),
        None => (None, Vec::new()),
    };

    ClientError::Server {
        status: status.as_u16(),
        message,
        errors,
    }
}
