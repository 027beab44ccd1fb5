//! Row types for the `carros` and `leads` tables
//!
//! Column names and enum values follow the dealership's existing schema
//! (Portuguese). Rust field names are English; serde keeps the API in English
//! while accepting either spelling for the status enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Inventory status of a car
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CarStatus {
    #[serde(rename = "disponível", alias = "available", alias = "disponivel")]
    Available,
    #[serde(rename = "vendido", alias = "sold")]
    Sold,
    #[serde(rename = "revisão", alias = "in_review", alias = "revisao")]
    InReview,
}

impl CarStatus {
    pub fn all() -> &'static [CarStatus] {
        &[CarStatus::Available, CarStatus::Sold, CarStatus::InReview]
    }

    /// Value stored in the `status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Available => "disponível",
            CarStatus::Sold => "vendido",
            CarStatus::InReview => "revisão",
        }
    }
}

impl std::fmt::Display for CarStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disponível" | "disponivel" | "available" => Ok(CarStatus::Available),
            "vendido" | "sold" => Ok(CarStatus::Sold),
            "revisão" | "revisao" | "in_review" | "in-review" => Ok(CarStatus::InReview),
            other => Err(format!("Invalid car status: {}", other)),
        }
    }
}

/// Financing status of a lead
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum FinancingStatus {
    #[default]
    #[serde(rename = "pendente", alias = "pending")]
    Pending,
    #[serde(rename = "aprovado", alias = "approved")]
    Approved,
    #[serde(rename = "reprovado", alias = "rejected")]
    Rejected,
}

impl FinancingStatus {
    pub fn all() -> &'static [FinancingStatus] {
        &[
            FinancingStatus::Pending,
            FinancingStatus::Approved,
            FinancingStatus::Rejected,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FinancingStatus::Pending => "pendente",
            FinancingStatus::Approved => "aprovado",
            FinancingStatus::Rejected => "reprovado",
        }
    }
}

impl std::fmt::Display for FinancingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FinancingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pendente" | "pending" => Ok(FinancingStatus::Pending),
            "aprovado" | "approved" => Ok(FinancingStatus::Approved),
            "reprovado" | "rejected" => Ok(FinancingStatus::Rejected),
            other => Err(format!("Invalid financing status: {}", other)),
        }
    }
}

/// A vehicle in the inventory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Car {
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub vehicle_type: String,
    pub transmission: String,
    pub year: i32,
    pub price: f64,
    pub status: CarStatus,
    /// External photo URLs, in display order
    pub photos: Vec<String>,
    /// Interior photo URLs, in display order
    pub interior_photos: Vec<String>,
    pub visits: i64,
    pub inquiries: i64,
    pub updated_at: DateTime<Utc>,
}

/// Validated car fields written by the car form
#[derive(Debug, Clone, PartialEq)]
pub struct CarRecord {
    pub name: String,
    pub brand: String,
    pub vehicle_type: String,
    pub transmission: String,
    pub year: i32,
    pub price: f64,
    pub status: CarStatus,
    pub photos: Vec<String>,
    pub interior_photos: Vec<String>,
}

/// An inbound sales lead
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    pub id: i64,
    pub name: Option<String>,
    pub car_of_interest: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub summary: Option<String>,
    pub financing_status: FinancingStatus,
    pub created_at: DateTime<Utc>,
}

/// Lead as delivered by the external capture channel
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLead {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub car_of_interest: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub financing_status: FinancingStatus,
}

/// Tables that emit change notifications
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Table {
    #[serde(rename = "carros")]
    Cars,
    #[serde(rename = "leads")]
    Leads,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Cars => "carros",
            Table::Leads => "leads",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "carros" | "cars" => Ok(Table::Cars),
            "leads" => Ok(Table::Leads),
            other => Err(format!("Unknown table: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "asc")]
    Ascending,
    #[default]
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarSortColumn {
    UpdatedAt,
    Visits,
}

impl CarSortColumn {
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            CarSortColumn::UpdatedAt => "atualizado_em",
            CarSortColumn::Visits => "visitas",
        }
    }
}

/// Ordering and limit for car listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarOrder {
    pub column: CarSortColumn,
    pub direction: SortDirection,
    pub limit: Option<usize>,
}

impl CarOrder {
    /// Most recently updated first (cars list page)
    pub fn recently_updated() -> Self {
        Self {
            column: CarSortColumn::UpdatedAt,
            direction: SortDirection::Descending,
            limit: None,
        }
    }

    /// Highest visit count first
    pub fn most_visited(limit: usize) -> Self {
        Self {
            column: CarSortColumn::Visits,
            direction: SortDirection::Descending,
            limit: Some(limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_car_status_parse() {
        assert_eq!("disponível".parse::<CarStatus>(), Ok(CarStatus::Available));
        assert_eq!("SOLD".parse::<CarStatus>(), Ok(CarStatus::Sold));
        assert_eq!("revisao".parse::<CarStatus>(), Ok(CarStatus::InReview));
        assert!("leased".parse::<CarStatus>().is_err());
    }

    #[test]
    fn test_car_status_serde() {
        let json = serde_json::to_string(&CarStatus::InReview).unwrap();
        assert_eq!(json, "\"revisão\"");

        let status: CarStatus = serde_json::from_str("\"available\"").unwrap();
        assert_eq!(status, CarStatus::Available);
    }

    #[test]
    fn test_financing_status_default() {
        assert_eq!(FinancingStatus::default(), FinancingStatus::Pending);
        assert_eq!(
            "approved".parse::<FinancingStatus>(),
            Ok(FinancingStatus::Approved)
        );
        let status: FinancingStatus = serde_json::from_str("\"reprovado\"").unwrap();
        assert_eq!(status, FinancingStatus::Rejected);
    }

    #[test]
    fn test_sort_direction_aliases() {
        let dir: SortDirection = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(dir, SortDirection::Ascending);
        assert_eq!(SortDirection::default().sql(), "DESC");
    }
}
