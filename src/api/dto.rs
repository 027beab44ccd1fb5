//! Data Transfer Objects
//!
//! Request and response types for the API endpoints that are not already
//! page types from `backoffice`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backoffice::LeadFilter;
use crate::gallery::RejectedPhoto;
use crate::records::{Car, Lead, SortDirection};

// ============================================
// AUTH DTOs
// ============================================

/// Operator credentials
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub access_key: String,
}

/// Issued session. Send the token as `Authorization: Bearer <token>`.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    /// Always "bearer"
    pub token_type: &'static str,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub email: String,
    pub expires_at: DateTime<Utc>,
    /// False when the server runs without the route guard
    pub guard_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ============================================
// CAR / PHOTO DTOs
// ============================================

/// A single car, as saved
#[derive(Debug, Serialize)]
pub struct CarResponse {
    pub car: Car,
}

/// Result of a photo batch upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Full gallery after the upload, to be saved with the car form
    pub photos: Vec<String>,
    /// URLs added by this batch
    pub uploaded: Vec<String>,
    /// Files skipped for type or size
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedPhoto>,
    /// Success count, or the first rejection when nothing was uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Remove `photos[index]` from the gallery and the bucket
#[derive(Debug, Deserialize)]
pub struct RemovePhotoRequest {
    /// Current gallery, in display order
    pub photos: Vec<String>,
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct PhotosResponse {
    pub photos: Vec<String>,
    pub notice: &'static str,
}

// ============================================
// LEAD DTOs
// ============================================

/// `GET /api/v1/leads` query string
#[derive(Debug, Default, Deserialize)]
pub struct LeadsQuery {
    /// Substring of the client name, any case
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub car: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// `asc` or `desc` by creation date (default `desc`)
    #[serde(default)]
    pub order: Option<SortDirection>,
}

impl LeadsQuery {
    pub fn filter(&self) -> LeadFilter {
        LeadFilter {
            name: self.name.clone(),
            car: self.car.clone(),
            phone: self.phone.clone(),
        }
    }

    pub fn direction(&self) -> SortDirection {
        self.order.unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct FinancingRequest {
    /// `pendente`, `aprovado` or `recusado`
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct LeadResponse {
    pub lead: Lead,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

// ============================================
// HEALTH DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy", "degraded" or "unhealthy"
    pub status: String,
    pub record_store: String,
    pub object_store: String,
    /// "configured" or "not_configured"
    pub agent_webhook: String,
    pub realtime_connections: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
