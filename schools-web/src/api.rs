use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::Json;
use serde::Serialize;
use tracing::{debug, info};

use schools_core::{parse_coordinate, parse_new_school, rank_by_proximity, RankedSchool, School};

use crate::error::ApiError;
use crate::extract::{fields_to_value, Payload};
use crate::state::AppState;

/// Success envelope shared by all data endpoints.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn ok(message: String, data: T) -> Self {
        Self {
            success: true,
            message,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub message: String,
    pub database: String,
    pub database_type: String,
    pub timestamp: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = if state.database_connected() {
        "connected"
    } else {
        "disconnected"
    };
    Json(HealthResponse {
        success: true,
        status: "ok".to_string(),
        message: "Server is running".to_string(),
        database: database.to_string(),
        database_type: state.configured_backend().label().to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct Endpoint {
    pub path: &'static str,
    pub method: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub success: bool,
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<Endpoint>,
}

pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        success: true,
        message: "School Management API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            Endpoint {
                path: "/addSchool",
                method: "POST",
                description: "Add a new school with name, address, latitude, and longitude",
            },
            Endpoint {
                path: "/listSchools",
                method: "GET",
                description: "List schools sorted by proximity to a user's location",
            },
            Endpoint {
                path: "/health",
                method: "GET",
                description: "Check the health status of the API",
            },
        ],
    })
}

// --- Schools ---

pub async fn add_school(
    State(state): State<Arc<AppState>>,
    Payload(payload): Payload,
) -> Result<(StatusCode, Json<ApiResponse<School>>), ApiError> {
    let school = parse_new_school(&payload)
        .map_err(|failure| ApiError::invalid("Validation failed", failure))?;

    let school = state
        .store()
        .insert(school)
        .await
        .map_err(|e| ApiError::storage("Failed to add school", e))?;
    info!(id = school.id, backend = %state.store().backend(), "school added");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            state.message("School added successfully"),
            school,
        )),
    ))
}

pub async fn list_schools(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<Vec<RankedSchool>>>, ApiError> {
    let target = parse_coordinate(&fields_to_value(params))
        .map_err(|failure| ApiError::invalid("Invalid coordinates", failure))?;

    let schools = state
        .store()
        .fetch_all()
        .await
        .map_err(|e| ApiError::storage("Failed to fetch schools", e))?;
    let ranked = rank_by_proximity(target, &schools);
    debug!(
        latitude = target.latitude,
        longitude = target.longitude,
        count = ranked.len(),
        "ranked schools"
    );

    Ok(Json(ApiResponse::ok(
        state.message("Schools retrieved successfully"),
        ranked,
    )))
}

// --- Fallback ---

pub async fn not_found(uri: Uri) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "success": false,
            "message": format!("Route not found: {}", uri),
            "error": "Not Found",
        })),
    )
}
