//! HTTP route handlers for the design JSON API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

use super::error::DesignError;
use super::facade;
use super::form::{self, FormState};
use super::models::{BreakwaterType, DesignRequest, DesignResult};
use super::schema::{FieldKind, Section};

/// Create the design router with all endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/fields/:breakwater_type", get(fields))
        .route("/assemble", post(assemble))
        .route("/execute", post(execute))
}

/// Body of the assemble and execute endpoints.
#[derive(Debug, Deserialize)]
pub struct DesignPayload {
    /// Breakwater type slug, e.g. `rock_rubble_mound`
    pub breakwater_type: String,
    /// Field values keyed by field name; `null` leaves a field unset
    #[serde(default)]
    pub values: FormState,
}

/// One visible field as exposed to API clients.
#[derive(Debug, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    pub section: Section,
    pub required: bool,
    pub kind: FieldKind,
}

#[derive(Debug, Serialize)]
pub struct FieldsResponse {
    pub breakwater_type: BreakwaterType,
    pub fields: Vec<FieldDescriptor>,
}

/// Error body shared by all design endpoints.
#[derive(Debug, Serialize)]
pub struct DesignErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

type ApiError = (StatusCode, Json<DesignErrorResponse>);

/// Health check for the design API.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "breakwater-design",
        "version": env!("CARGO_PKG_VERSION"),
        "engineering_service": state.config.engineering_service_url,
    }))
}

/// List the fields shown for a breakwater type.
async fn fields(Path(breakwater_type): Path<String>) -> Result<Json<FieldsResponse>, ApiError> {
    let breakwater_type = parse_type(&breakwater_type)?;

    let fields = form::visible_fields(breakwater_type)
        .into_iter()
        .map(|spec| FieldDescriptor {
            name: spec.name,
            label: spec.label,
            unit: spec.unit,
            section: spec.section,
            required: spec.is_required(breakwater_type),
            kind: spec.kind,
        })
        .collect();

    Ok(Json(FieldsResponse {
        breakwater_type,
        fields,
    }))
}

/// Validate the values and return the request that would be designed.
async fn assemble(
    State(state): State<AppState>,
    Json(payload): Json<DesignPayload>,
) -> Result<Json<DesignRequest>, ApiError> {
    let breakwater_type = parse_type(&payload.breakwater_type)?;

    let request = facade::assemble_within(
        state.engineering.as_ref(),
        breakwater_type,
        &payload.values,
        state.config.design_timeout,
    )
    .await
    .map_err(design_error_to_response)?;

    Ok(Json(request))
}

/// Run the complete design and return plot and reports.
async fn execute(
    State(state): State<AppState>,
    Json(payload): Json<DesignPayload>,
) -> Result<Json<DesignResult>, ApiError> {
    let breakwater_type = parse_type(&payload.breakwater_type)?;

    let (_, result) = facade::design(
        state.engineering.as_ref(),
        breakwater_type,
        &payload.values,
        state.config.design_timeout,
    )
    .await
    .map_err(design_error_to_response)?;

    Ok(Json(result))
}

fn parse_type(raw: &str) -> Result<BreakwaterType, ApiError> {
    raw.parse()
        .map_err(|e| design_error_to_response(DesignError::Configuration(e)))
}

/// HTTP status for a failed design action.
pub(crate) fn error_status(error: &DesignError) -> StatusCode {
    match error {
        DesignError::Configuration(_) => StatusCode::BAD_REQUEST,
        DesignError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DesignError::Execution(_) | DesignError::Presentation(_) => StatusCode::BAD_GATEWAY,
        DesignError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        DesignError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert DesignError to HTTP error response
fn design_error_to_response(error: DesignError) -> ApiError {
    let status = error_status(&error);

    let details = match &error {
        DesignError::Validation(errors) => {
            let errors: Vec<serde_json::Value> = errors
                .iter()
                .map(|e| serde_json::json!({ "field": e.field(), "message": e.to_string() }))
                .collect();
            Some(serde_json::json!({ "errors": errors }))
        }
        _ => None,
    };

    (
        status,
        Json(DesignErrorResponse {
            error_type: error.error_type().to_string(),
            message: error.to_string(),
            details,
        }),
    )
}
