//! Dashboard page: stock metrics, visits chart and live lead metrics

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{store_failure, PageError};
use crate::notices;
use crate::records::{Car, CarOrder, CarStatus, ChangeListener, FinancingStatus, RecordStore, Table};

/// Bar colours, one per chart position
pub const CHART_PALETTE: [&str; 5] = [
    "hsl(195 100% 50%)",
    "hsl(180 100% 60%)",
    "hsl(195 80% 55%)",
    "hsl(180 80% 65%)",
    "hsl(195 60% 60%)",
];

pub const CHART_SIZE: usize = 5;
pub const VISITS_LABEL: &str = "Visitas";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<i64>,
    pub color: Vec<String>,
}

/// Top cars by visits, chart-ready
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitsChart {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

impl VisitsChart {
    pub fn from_cars(cars: &[Car]) -> Self {
        Self {
            labels: cars.iter().map(|c| c.name.clone()).collect(),
            datasets: vec![ChartDataset {
                label: VISITS_LABEL.to_string(),
                data: cars.iter().map(|c| c.visits).collect(),
                color: (0..cars.len())
                    .map(|i| CHART_PALETTE[i % CHART_PALETTE.len()].to_string())
                    .collect(),
            }],
        }
    }
}

/// Lead counts by financing status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LeadMetrics {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

impl LeadMetrics {
    pub fn load(records: &RecordStore) -> Result<Self, PageError> {
        let count = |status| {
            records
                .count_leads(status)
                .map_err(store_failure(notices::DASHBOARD_LOAD_FAILED))
        };

        Ok(Self {
            total: count(None)?,
            pending: count(Some(FinancingStatus::Pending))?,
            approved: count(Some(FinancingStatus::Approved))?,
            rejected: count(Some(FinancingStatus::Rejected))?,
        })
    }
}

/// Keeps [`LeadMetrics`] current by reloading on every `leads` change.
///
/// Stops listening when dropped.
pub struct LeadMetricsWatcher {
    metrics: Arc<RwLock<LeadMetrics>>,
    listener: ChangeListener,
}

impl LeadMetricsWatcher {
    /// Start listening, then load the initial counts
    pub async fn start(records: Arc<RecordStore>) -> Result<Self, PageError> {
        let metrics = Arc::new(RwLock::new(LeadMetrics::default()));

        let listener = {
            let source = Arc::clone(&records);
            let metrics = Arc::clone(&metrics);
            ChangeListener::register(records.changes(), Table::Leads, move |event| {
                let source = Arc::clone(&source);
                let metrics = Arc::clone(&metrics);
                async move {
                    match LeadMetrics::load(&source) {
                        Ok(fresh) => {
                            *metrics.write().await = fresh;
                            tracing::debug!(lead_id = event.id, kind = ?event.kind, "Lead metrics reloaded");
                        }
                        Err(e) => tracing::warn!(error = %e, "Could not reload lead metrics"),
                    }
                }
            })
        };

        let initial = LeadMetrics::load(&records)?;
        *metrics.write().await = initial;
        tracing::info!(total = initial.total, pending = initial.pending, "Lead metrics watcher started");

        Ok(Self { metrics, listener })
    }

    /// Latest counts
    pub async fn current(&self) -> LeadMetrics {
        *self.metrics.read().await
    }

    pub fn table(&self) -> Table {
        self.listener.table()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    /// Cars with status `disponivel`
    pub available_cars: u64,
    /// Sum of inquiries over all cars
    pub total_inquiries: i64,
    /// Most visited car, or "N/A" when there are none
    pub top_car: String,
    pub chart: VisitsChart,
    pub leads: LeadMetrics,
}

#[derive(Clone)]
pub struct DashboardPage {
    records: Arc<RecordStore>,
    lead_metrics: Arc<LeadMetricsWatcher>,
}

impl DashboardPage {
    pub fn new(records: Arc<RecordStore>, lead_metrics: Arc<LeadMetricsWatcher>) -> Self {
        Self {
            records,
            lead_metrics,
        }
    }

    pub async fn load(&self) -> Result<DashboardSummary, PageError> {
        let failed = || store_failure(notices::DASHBOARD_LOAD_FAILED);

        let available_cars = self
            .records
            .count_cars(Some(CarStatus::Available))
            .map_err(failed())?;
        let total_inquiries = self.records.total_inquiries().map_err(failed())?;
        let top = self
            .records
            .list_cars(CarOrder::most_visited(CHART_SIZE))
            .map_err(failed())?;

        Ok(DashboardSummary {
            available_cars,
            total_inquiries,
            top_car: top
                .first()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| notices::NO_TOP_CAR.to_string()),
            chart: VisitsChart::from_cars(&top),
            leads: self.lead_metrics.current().await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::store::tests::{sample_lead, sample_record};
    use std::time::Duration;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    async fn dashboard(records: &Arc<RecordStore>) -> DashboardPage {
        let watcher = LeadMetricsWatcher::start(Arc::clone(records)).await.unwrap();
        DashboardPage::new(Arc::clone(records), Arc::new(watcher))
    }

    #[tokio::test]
    async fn test_empty_dashboard() {
        let records = Arc::new(RecordStore::open_in_memory().unwrap());
        let summary = dashboard(&records).await.load().await.unwrap();

        assert_eq!(summary.available_cars, 0);
        assert_eq!(summary.total_inquiries, 0);
        assert_eq!(summary.top_car, "N/A");
        assert!(summary.chart.labels.is_empty());
        assert_eq!(summary.leads, LeadMetrics::default());
    }

    #[tokio::test]
    async fn test_metrics_and_chart() {
        let records = Arc::new(RecordStore::open_in_memory().unwrap());
        let engagement = [(12, 3), (40, 5), (7, 0), (25, 2), (3, 1), (18, 4)];
        for (i, (visits, inquiries)) in engagement.iter().enumerate() {
            let mut record = sample_record(&format!("Car {}", i), "Fiat");
            if i == 2 {
                record.status = CarStatus::Sold;
            }
            let car = records.insert_car(&record).unwrap();
            records.set_engagement(car.id, *visits, *inquiries).unwrap();
        }

        let summary = dashboard(&records).await.load().await.unwrap();

        assert_eq!(summary.available_cars, 5);
        assert_eq!(summary.total_inquiries, 15);
        assert_eq!(summary.top_car, "Car 1");
        assert_eq!(
            summary.chart.labels,
            vec!["Car 1", "Car 3", "Car 5", "Car 0", "Car 2"]
        );
        let dataset = &summary.chart.datasets[0];
        assert_eq!(dataset.label, "Visitas");
        assert_eq!(dataset.data, vec![40, 25, 18, 12, 7]);
        assert_eq!(dataset.color[0], "hsl(195 100% 50%)");
        assert_eq!(dataset.color[4], "hsl(195 60% 60%)");
    }

    #[tokio::test]
    async fn test_lead_metrics_follow_changes() {
        let records = Arc::new(RecordStore::open_in_memory().unwrap());
        records.insert_lead(&sample_lead("Ana", "Onix", "1")).unwrap();

        let watcher = LeadMetricsWatcher::start(Arc::clone(&records)).await.unwrap();
        assert_eq!(watcher.current().await.total, 1);

        let lead = records.insert_lead(&sample_lead("Bia", "Argo", "2")).unwrap();
        records
            .update_lead_financing(lead.id, FinancingStatus::Approved)
            .unwrap();
        settle().await;

        let metrics = watcher.current().await;
        assert_eq!(
            metrics,
            LeadMetrics {
                total: 2,
                pending: 1,
                approved: 1,
                rejected: 0
            }
        );
    }

    #[tokio::test]
    async fn test_watcher_stops_on_drop() {
        let records = Arc::new(RecordStore::open_in_memory().unwrap());
        let watcher = LeadMetricsWatcher::start(Arc::clone(&records)).await.unwrap();
        assert_eq!(watcher.table(), Table::Leads);
        let metrics = Arc::clone(&watcher.metrics);

        drop(watcher);
        settle().await;
        records.insert_lead(&sample_lead("Caio", "Kwid", "3")).unwrap();
        settle().await;

        assert_eq!(metrics.read().await.total, 0);
    }
}
