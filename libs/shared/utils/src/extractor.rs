use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};
use tracing::debug;

use shared_models::error::AppError;
use shared_models::PatientId;

/// `Json<T>` whose rejection is rendered as the API's failure envelope.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!("Rejected request body: {}", rejection.body_text());
                Err(AppError::InvalidRequest {
                    message: "Invalid request body".to_string(),
                    detail: rejection.body_text(),
                })
            }
        }
    }
}

/// `Query<T>` whose rejection is rendered as the API's failure envelope.
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::InvalidRequest {
                message: "Invalid query parameters".to_string(),
                detail: rejection.body_text(),
            }),
        }
    }
}

/// The `{id}` path segment, parsed as a patient identifier. A segment that is
/// not 24 hex characters is rejected before any store lookup happens.
pub struct PatientIdPath(pub PatientId);

impl<S> FromRequestParts<S> for PatientIdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: PathRejection| AppError::InvalidRequest {
                message: "Invalid path".to_string(),
                detail: rejection.body_text(),
            })?;

        Ok(Self(PatientId::parse(&raw)?))
    }
}
