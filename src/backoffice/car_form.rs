//! Car form: validate, upsert, then notify the sales agent

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::{store_failure, PageError};
use crate::notices;
use crate::records::{Car, CarRecord, CarStatus, RecordStore};
use crate::sync::{SyncAction, SyncNotifier, SyncPayload};

pub const MIN_YEAR: i32 = 1900;
pub const NAME_MAX_CHARS: usize = 100;
pub const BRAND_MAX_CHARS: usize = 50;

/// Raw form input, as typed by the operator
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CarDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub vehicle_type: String,
    #[serde(default)]
    pub transmission: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub interior_photos: Vec<String>,
}

fn default_status() -> String {
    CarStatus::Available.as_str().to_string()
}

impl Default for CarDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            brand: String::new(),
            vehicle_type: String::new(),
            transmission: String::new(),
            year: None,
            price: None,
            status: default_status(),
            photos: Vec::new(),
            interior_photos: Vec::new(),
        }
    }
}

impl From<&Car> for CarDraft {
    fn from(car: &Car) -> Self {
        Self {
            name: car.name.clone(),
            brand: car.brand.clone(),
            vehicle_type: car.vehicle_type.clone(),
            transmission: car.transmission.clone(),
            year: Some(car.year),
            price: Some(car.price),
            status: car.status.as_str().to_string(),
            photos: car.photos.clone(),
            interior_photos: car.interior_photos.clone(),
        }
    }
}

/// First failing rule of the car form. The message is shown verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("Nome é obrigatório")]
    NameRequired,
    #[error("Nome deve ter no máximo 100 caracteres")]
    NameTooLong,
    #[error("Marca é obrigatória")]
    BrandRequired,
    #[error("Marca deve ter no máximo 50 caracteres")]
    BrandTooLong,
    #[error("Tipo é obrigatório")]
    TypeRequired,
    #[error("Câmbio é obrigatório")]
    TransmissionRequired,
    #[error("Ano é obrigatório")]
    YearRequired,
    #[error("Ano deve estar entre 1900 e {max}")]
    YearOutOfRange { max: i32 },
    #[error("Preço é obrigatório")]
    PriceRequired,
    #[error("Preço deve ser positivo")]
    PriceNotPositive,
    #[error("Status inválido: {0}")]
    InvalidStatus(String),
    #[error("Máximo de {max} fotos permitidas")]
    TooManyPhotos { max: usize },
}

/// Trim and validate a draft. Rules run in form order; the first failure wins.
pub fn validate(draft: &CarDraft, max_photos: usize, current_year: i32) -> Result<CarRecord, FormError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(FormError::NameRequired);
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(FormError::NameTooLong);
    }

    let brand = draft.brand.trim();
    if brand.is_empty() {
        return Err(FormError::BrandRequired);
    }
    if brand.chars().count() > BRAND_MAX_CHARS {
        return Err(FormError::BrandTooLong);
    }

    let vehicle_type = draft.vehicle_type.trim();
    if vehicle_type.is_empty() {
        return Err(FormError::TypeRequired);
    }

    let transmission = draft.transmission.trim();
    if transmission.is_empty() {
        return Err(FormError::TransmissionRequired);
    }

    let max_year = current_year + 1;
    let year = draft.year.ok_or(FormError::YearRequired)?;
    if !(MIN_YEAR..=max_year).contains(&year) {
        return Err(FormError::YearOutOfRange { max: max_year });
    }

    let price = draft.price.ok_or(FormError::PriceRequired)?;
    if !price.is_finite() || price <= 0.0 {
        return Err(FormError::PriceNotPositive);
    }

    let status: CarStatus = draft
        .status
        .parse()
        .map_err(|_| FormError::InvalidStatus(draft.status.clone()))?;

    if draft.photos.len() > max_photos || draft.interior_photos.len() > max_photos {
        return Err(FormError::TooManyPhotos { max: max_photos });
    }

    Ok(CarRecord {
        name: name.to_string(),
        brand: brand.to_string(),
        vehicle_type: vehicle_type.to_string(),
        transmission: transmission.to_string(),
        year,
        price,
        status,
        photos: draft.photos.clone(),
        interior_photos: draft.interior_photos.clone(),
    })
}

/// Outcome of the best-effort agent notification
#[derive(Debug, Clone, Serialize)]
pub struct SyncNotice {
    pub synced: bool,
    pub notice: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SyncNotice {
    fn synced() -> Self {
        Self {
            synced: true,
            notice: notices::AGENT_SYNCED,
            detail: None,
        }
    }

    fn failed(detail: impl Into<String>) -> Self {
        Self {
            synced: false,
            notice: notices::AGENT_SYNC_FAILED,
            detail: Some(detail.into()),
        }
    }
}

/// A saved car plus the notices to show
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub car: Car,
    pub created: bool,
    pub notice: &'static str,
    pub sync: SyncNotice,
}

/// Create/edit workflow for one car
#[derive(Clone)]
pub struct CarForm {
    records: Arc<RecordStore>,
    notifier: Arc<dyn SyncNotifier>,
    max_photos: usize,
}

impl CarForm {
    pub fn new(records: Arc<RecordStore>, notifier: Arc<dyn SyncNotifier>, max_photos: usize) -> Self {
        Self {
            records,
            notifier,
            max_photos,
        }
    }

    /// Load a car for editing
    pub fn load(&self, id: i64) -> Result<Car, PageError> {
        self.records
            .get_car(id)
            .map_err(store_failure(notices::CAR_LOAD_FAILED))?
            .ok_or(PageError::NotFound { table: "carros", id })
    }

    /// Validate and save, then notify the agent.
    ///
    /// Validation failures return before anything is written or sent. A
    /// failed notification is reported in the outcome; the save stands.
    pub async fn submit(&self, draft: CarDraft, editing: Option<i64>) -> Result<SubmitOutcome, PageError> {
        let record = validate(&draft, self.max_photos, Utc::now().year())?;

        let (car, action) = match editing {
            Some(id) => {
                let car = self
                    .records
                    .update_car(id, &record)
                    .map_err(store_failure(notices::CAR_UPDATE_FAILED))?;
                (car, SyncAction::Updated)
            }
            None => {
                let car = self
                    .records
                    .insert_car(&record)
                    .map_err(store_failure(notices::CAR_CREATE_FAILED))?;
                (car, SyncAction::Created)
            }
        };

        tracing::info!(car_id = car.id, action = ?action, "Car saved");

        let sync = self.notify(&car, action).await;
        let created = action == SyncAction::Created;

        Ok(SubmitOutcome {
            notice: if created {
                notices::CAR_CREATED
            } else {
                notices::CAR_UPDATED
            },
            car,
            created,
            sync,
        })
    }

    async fn notify(&self, car: &Car, action: SyncAction) -> SyncNotice {
        let payload = SyncPayload::stock_update(action, car);

        match self.notifier.notify(&payload).await {
            Ok(reply) if reply.success => SyncNotice::synced(),
            Ok(reply) => {
                let reason = reply.reason().unwrap_or(notices::AGENT_SYNC_FAILED).to_string();
                tracing::warn!(car_id = car.id, reason = %reason, "Agent sync refused");
                SyncNotice::failed(reason)
            }
            Err(e) => {
                tracing::warn!(car_id = car.id, error = %e, "Agent sync failed");
                SyncNotice::failed(e.to_string())
            }
        }
    }
}
