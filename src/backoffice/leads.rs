//! Leads list and lead detail pages

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{store_failure, PageError};
use crate::notices;
use crate::records::{FinancingStatus, Lead, RecordStore, SortDirection};

/// In-memory lead filters. Only non-empty filters apply; a lead without
/// the field fails a non-empty filter on it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LeadFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub car: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl LeadFilter {
    pub fn matches(&self, lead: &Lead) -> bool {
        contains(&lead.name, &self.name)
            && contains(&lead.car_of_interest, &self.car)
            && contains(&lead.phone, &self.phone)
    }
}

fn contains(field: &Option<String>, filter: &Option<String>) -> bool {
    let Some(term) = filter.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        return true;
    };

    field
        .as_deref()
        .map(|value| value.to_lowercase().contains(&term.to_lowercase()))
        .unwrap_or(false)
}

pub fn filter_leads(leads: &[Lead], filter: &LeadFilter) -> Vec<Lead> {
    leads.iter().filter(|lead| filter.matches(lead)).cloned().collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadsView {
    /// Leads passing the filter, in the requested order
    pub leads: Vec<Lead>,
    /// Leads before filtering
    pub total: usize,
}

#[derive(Clone)]
pub struct LeadsPage {
    records: Arc<RecordStore>,
}

impl LeadsPage {
    pub fn new(records: Arc<RecordStore>) -> Self {
        Self { records }
    }

    /// Newest first unless `direction` says otherwise
    pub fn list(&self, filter: &LeadFilter, direction: SortDirection) -> Result<LeadsView, PageError> {
        let leads = self
            .records
            .list_leads(direction)
            .map_err(store_failure(notices::LEADS_LOAD_FAILED))?;

        Ok(LeadsView {
            total: leads.len(),
            leads: filter_leads(&leads, filter),
        })
    }

    /// One lead, or `NotFound`
    pub fn detail(&self, id: i64) -> Result<Lead, PageError> {
        self.records
            .get_lead(id)
            .map_err(store_failure(notices::LEADS_LOAD_FAILED))?
            .ok_or(PageError::NotFound { table: "leads", id })
    }

    /// Update the financing status and return the reloaded lead
    pub fn update_financing(&self, id: i64, status: FinancingStatus) -> Result<Lead, PageError> {
        let lead = self
            .records
            .update_lead_financing(id, status)
            .map_err(store_failure(notices::FINANCING_UPDATE_FAILED))?;

        tracing::info!(lead_id = id, status = %status, "Financing status updated");
        Ok(lead)
    }
}
