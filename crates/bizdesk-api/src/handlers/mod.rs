//! HTTP handlers, one module per area

pub mod auth;
pub mod calendar;
pub mod contacts;
pub mod health;
pub mod notifications;
pub mod payroll;
pub mod products;
pub mod projects;
pub mod pto;
pub mod staff;
pub mod tax_documents;

use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::error::ApiError;
use crate::response::ApiResponse;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
pub type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

pub(crate) fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

pub(crate) fn created<T: Serialize>(data: T) -> Created<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}
