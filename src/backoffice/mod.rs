//! Back-office pages
//!
//! Page-level workflows used by the operator:
//!
//! - **car_form**: create/edit a car, then notify the sales agent
//! - **cars**: inventory list with in-memory filters, delete, mark sold
//! - **leads**: lead list, lead detail, financing status
//! - **dashboard**: stock metrics, visits chart, live lead metrics
//!
//! Pages read and write through [`RecordStore`](crate::records::RecordStore)
//! and surface failures as [`PageError`], which carries the notice the
//! operator sees.

pub mod car_form;
pub mod cars;
pub mod dashboard;
pub mod leads;

pub use car_form::{CarDraft, CarForm, FormError, SubmitOutcome, SyncNotice};
pub use cars::{brands, filter_cars, CarFilter, CarsPage, CarsView};
pub use dashboard::{
    ChartDataset, DashboardPage, DashboardSummary, LeadMetrics, LeadMetricsWatcher, VisitsChart,
};
pub use leads::{filter_leads, LeadFilter, LeadsPage, LeadsView};

use thiserror::Error;

use crate::notices;
use crate::records::StoreError;

#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Invalid(#[from] FormError),

    #[error("{table} record {id} not found")]
    NotFound { table: &'static str, id: i64 },

    #[error("Record store error: {source}")]
    Store {
        notice: &'static str,
        #[source]
        source: StoreError,
    },
}

impl PageError {
    /// Notice shown to the operator
    pub fn notice(&self) -> String {
        match self {
            PageError::Invalid(e) => e.to_string(),
            PageError::NotFound { table, .. } if *table == "leads" => {
                notices::LEAD_NOT_FOUND.to_string()
            }
            PageError::NotFound { .. } => notices::CAR_NOT_FOUND.to_string(),
            PageError::Store { notice, .. } => notice.to_string(),
        }
    }
}

/// Map a store failure to a page error, keeping not-found distinct
pub(crate) fn store_failure(notice: &'static str) -> impl FnOnce(StoreError) -> PageError {
    move |source| match source {
        StoreError::NotFound { table, id } => PageError::NotFound { table, id },
        source => PageError::Store { notice, source },
    }
}
