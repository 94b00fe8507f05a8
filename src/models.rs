use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::exceptions::CadasterError;

// --- Inbound ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub cadastral_number: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl QueryRequest {
    /// Boundary validation, run before the query reaches the handler.
    pub fn validate(&self) -> Result<(), CadasterError> {
        if self.cadastral_number.trim().is_empty() {
            return Err(CadasterError::Validation(
                "cadastral_number must not be empty".to_string(),
            ));
        }
        if !self.latitude.is_finite() {
            return Err(CadasterError::Validation(
                "latitude must be a finite number".to_string(),
            ));
        }
        if !self.longitude.is_finite() {
            return Err(CadasterError::Validation(
                "longitude must be a finite number".to_string(),
            ));
        }
        Ok(())
    }
}

// --- Persistence ---

/// Candidate row. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryRecord {
    pub cadastral_number: String,
    pub latitude: f64,
    pub longitude: f64,
    pub server_response: bool,
}

impl NewHistoryRecord {
    pub fn from_query(query: &QueryRequest, server_response: bool) -> Self {
        Self {
            cadastral_number: query.cadastral_number.clone(),
            latitude: query.latitude,
            longitude: query.longitude,
            server_response,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub cadastral_number: String,
    pub latitude: f64,
    pub longitude: f64,
    pub server_response: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// --- Outbound ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeVerdict {
    pub message: String,
    pub cadastral_number: String,
    pub server_response: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pong {
    pub ping: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictReply {
    pub result: bool,
}
