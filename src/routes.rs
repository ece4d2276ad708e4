// HTTP handlers for the gateway's public endpoints

use crate::error::GatewayError;
use crate::gateway::GatewayService;
use crate::upstream::QueryParams;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub type AppState = Arc<GatewayService>;

#[derive(Debug, Deserialize)]
pub struct AirportParams {
    keyword: Option<String>,
}

// Route-level failure: a fixed message per endpoint plus the gateway error
#[derive(Debug)]
pub struct ApiFailure {
    message: &'static str,
    error: GatewayError,
}

impl ApiFailure {
    pub fn new(message: &'static str, error: GatewayError) -> Self {
        Self { message, error }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        // Every failure kind shares one status; callers tell them apart by body
        let body = json!({
            "error": self.message,
            "details": self.error.detail,
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Flight Search API is running",
        "endpoints": {
            "flights": "/api/flights",
            "airports": "/api/airports",
        }
    }))
}

pub async fn flights_handler(
    State(gateway): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Value>, ApiFailure> {
    info!(?params, "Flight search request");

    gateway
        .search_flights(params)
        .await
        .map(Json)
        .map_err(|e| ApiFailure::new("Failed to fetch flights", e))
}

pub async fn airports_handler(
    State(gateway): State<AppState>,
    Query(params): Query<AirportParams>,
) -> Result<Json<Value>, ApiFailure> {
    gateway
        .search_airports(params.keyword.as_deref())
        .await
        .map(Json)
        .map_err(|e| ApiFailure::new("Failed to search airports", e))
}
