use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{Map, Value};

use shared_models::error::AppError;
use shared_models::{ApiResponse, Patient};
use shared_utils::extractor::{ApiJson, ApiQuery, PatientIdPath};

use crate::models::PatientListQuery;
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn create_patient(
    State(service): State<Arc<PatientService>>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> Result<(StatusCode, Json<ApiResponse<Patient>>), AppError> {
    let patient = service.create_patient(&body).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(patient))))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(service): State<Arc<PatientService>>,
    ApiQuery(query): ApiQuery<PatientListQuery>,
) -> Result<Json<ApiResponse<Vec<Patient>>>, AppError> {
    let patients = service.list_patients(query).await?;

    Ok(Json(ApiResponse::ok(patients)))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(service): State<Arc<PatientService>>,
    PatientIdPath(id): PatientIdPath,
) -> Result<Json<ApiResponse<Patient>>, AppError> {
    let patient = service.get_patient(&id).await?;

    Ok(Json(ApiResponse::ok(patient)))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(service): State<Arc<PatientService>>,
    PatientIdPath(id): PatientIdPath,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> Result<Json<ApiResponse<Patient>>, AppError> {
    let patient = service.update_patient(&id, &body).await?;

    Ok(Json(ApiResponse::ok(patient)))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(service): State<Arc<PatientService>>,
    PatientIdPath(id): PatientIdPath,
) -> Result<Json<ApiResponse<()>>, AppError> {
    service.delete_patient(&id).await?;

    Ok(Json(ApiResponse::message("Patient deleted successfully")))
}
