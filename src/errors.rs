use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

/// Standard error payload returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Unprocessable Entity",
    "message": "Margin below category minimum on 1 line(s)",
    "details": [{"line_id": "550e8400-e29b-41d4-a716-446655440000", "computed": "4.00", "required": "10.00"}],
    "timestamp": "2025-11-03T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Unprocessable Entity")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Structured error details (margin violations, stale lines, field errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// A line whose computed margin violates the category floor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MarginViolation {
    /// Line id, absent when the line has not been persisted yet (previews)
    pub line_id: Option<Uuid>,
    /// Absent for the document-level margin check
    pub product_id: Option<Uuid>,
    /// Computed margin percentage for the line or document
    pub computed: Decimal,
    /// Minimum margin percentage resolved from the category tree
    pub required: Decimal,
}

/// Why a quotation line no longer matches its live price source.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StaleReason {
    /// Warehouse stock fell below the quoted quantity
    InsufficientStock { available: i32, requested: i32 },
    /// Supplier purchase price drifted beyond the configured tolerance
    PriceDrift { snapshot: Decimal, current: Decimal },
    /// The supplier offer backing the line is no longer active
    OfferMissing,
}

/// Per-line detail attached to a `StaleAvailability` error.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StaleLine {
    pub line_id: Uuid,
    pub product_id: Uuid,
    #[serde(flatten)]
    pub reason: StaleReason,
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No price source available for product {product_id}")]
    NoPriceSource { product_id: Uuid },

    #[error("Margin below category minimum on {} line(s)", .violations.len())]
    MarginBelowMinimum { violations: Vec<MarginViolation> },

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Stale availability on {} line(s)", .details.len())]
    StaleAvailability { details: Vec<StaleLine> },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Concurrent modification of quotation {0}")]
    ConcurrencyConflict(Uuid),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Single margin violation convenience constructor.
    pub fn margin_below_minimum(
        line_id: Option<Uuid>,
        product_id: Option<Uuid>,
        computed: Decimal,
        required: Decimal,
    ) -> Self {
        ServiceError::MarginBelowMinimum {
            violations: vec![MarginViolation {
                line_id,
                product_id,
                computed,
                required,
            }],
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            Self::NoPriceSource { .. }
            | Self::MarginBelowMinimum { .. }
            | Self::StaleAvailability { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ConcurrencyConflict(_) => StatusCode::CONFLICT,
            Self::DatabaseError(_)
            | Self::ConfigurationError(_)
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            Self::ConfigurationError(_) => "Configuration error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Structured payload for errors that carry per-line information.
    pub fn response_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::MarginBelowMinimum { violations } => serde_json::to_value(violations).ok(),
            Self::StaleAvailability { details } => serde_json::to_value(details).ok(),
            Self::NoPriceSource { product_id } => Some(json!({ "product_id": product_id })),
            _ => None,
        }
    }

    /// Whether the caller may retry the exact same request.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Data-integrity problems are surfaced to operators, not only callers.
        if matches!(self, Self::ConfigurationError(_)) {
            tracing::error!(error = %self, "configuration error while serving request");
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.response_details(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, http::StatusCode};
    use rust_decimal_macros::dec;

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InvalidStatus("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::NoPriceSource {
                product_id: Uuid::new_v4()
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::MarginBelowMinimum { violations: vec![] }.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::StaleAvailability { details: vec![] }.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::ConcurrencyConflict(Uuid::new_v4()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::ConfigurationError("cycle".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::InternalError("stack trace".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::ConfigurationError("category cycle at 42".into()).response_message(),
            "Configuration error"
        );
        assert_eq!(
            ServiceError::NotFound("Quotation not found".into()).response_message(),
            "Not found: Quotation not found"
        );
    }

    #[test]
    fn margin_violation_details_are_structured() {
        let product_id = Uuid::new_v4();
        let err =
            ServiceError::margin_below_minimum(None, Some(product_id), dec!(4.00), dec!(10.00));

        let details = err.response_details().expect("details expected");
        let violations = details.as_array().expect("array of violations");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0]["product_id"], json!(product_id));
        assert_eq!(violations[0]["required"], json!("10.00"));
    }

    #[test]
    fn only_concurrency_conflicts_are_retriable() {
        assert!(ServiceError::ConcurrencyConflict(Uuid::new_v4()).is_retriable());
        assert!(!ServiceError::ValidationError("x".into()).is_retriable());
        assert!(!ServiceError::StaleAvailability { details: vec![] }.is_retriable());
    }

    #[tokio::test]
    async fn error_response_serializes_stale_reason() {
        let line_id = Uuid::new_v4();
        let product_id = Uuid::new_v4();
        let err = ServiceError::StaleAvailability {
            details: vec![StaleLine {
                line_id,
                product_id,
                reason: StaleReason::InsufficientStock {
                    available: 2,
                    requested: 5,
                },
            }],
        };

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        let details = payload.details.expect("details expected");
        assert_eq!(details[0]["reason"], "insufficient_stock");
        assert_eq!(details[0]["requested"], 5);
    }
}
