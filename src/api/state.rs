//! Application State
//!
//! Shared state accessible by all API handlers, wrapped in `Arc`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::ApiResult;
use crate::auth::SessionStore;
use crate::backoffice::{CarForm, CarsPage, DashboardPage, LeadMetricsWatcher, LeadsPage};
use crate::config::Config;
use crate::gallery::{PhotoGallery, PhotoLimits};
use crate::realtime::{ConnectionHub, HubConfig, RealtimeBridge};
use crate::records::RecordStore;
use crate::storage::{LocalBucket, ObjectStore};
use crate::sync::{SyncFunctionClient, SyncNotifier, WebhookForwarder};

/// Shared application state for all handlers
pub struct AppState {
    pub config: Arc<Config>,
    pub records: Arc<RecordStore>,
    /// Photo bucket, also served under the public object path
    pub bucket: Arc<LocalBucket>,
    pub gallery: PhotoGallery,
    pub car_form: CarForm,
    pub cars: CarsPage,
    pub leads: LeadsPage,
    pub dashboard: DashboardPage,
    /// Sync Function backend
    pub forwarder: WebhookForwarder,
    pub sessions: Arc<SessionStore>,
    pub ws_hub: ConnectionHub,
    /// Relays record changes to `ws_hub` while the state lives
    pub realtime: RealtimeBridge,
    pub start_time: Instant,
}

impl AppState {
    /// Open the record store and bucket under the configured data directory
    pub async fn open(config: Config) -> ApiResult<Self> {
        let data_dir = config.storage.data_path();
        let records = Arc::new(RecordStore::open(&data_dir)?);
        let bucket = Arc::new(LocalBucket::open(
            &data_dir,
            config.photos.bucket.clone(),
            config.api.public_url.clone(),
        )?);

        Self::assemble(config, records, bucket).await
    }

    /// Wire pages, sync and realtime around an opened store and bucket.
    /// Starts background listeners, so it needs a tokio runtime.
    pub async fn assemble(
        config: Config,
        records: Arc<RecordStore>,
        bucket: Arc<LocalBucket>,
    ) -> ApiResult<Self> {
        let forwarder = WebhookForwarder::from_config(&config.sync)?;

        let notifier: Arc<dyn SyncNotifier> = match config.sync.function_url.as_deref() {
            Some(url) => {
                tracing::info!(function_url = %url, "Agent sync via remote Sync Function");
                Arc::new(SyncFunctionClient::new(
                    url,
                    Duration::from_millis(config.sync.timeout_ms),
                )?)
            }
            None => {
                if !forwarder.is_configured() {
                    tracing::warn!("WEBHOOK_AGENT_URL not set; agent sync will report failures");
                }
                Arc::new(forwarder.clone())
            }
        };

        let store: Arc<dyn ObjectStore> = bucket.clone();
        let gallery = PhotoGallery::new(store, PhotoLimits::from(&config.photos));

        let lead_metrics = Arc::new(LeadMetricsWatcher::start(Arc::clone(&records)).await?);
        let ws_hub = ConnectionHub::new(HubConfig::default());
        let realtime = RealtimeBridge::start(records.changes(), ws_hub.clone());

        Ok(Self {
            car_form: CarForm::new(Arc::clone(&records), notifier, config.photos.max_photos),
            cars: CarsPage::new(Arc::clone(&records)),
            leads: LeadsPage::new(Arc::clone(&records)),
            dashboard: DashboardPage::new(Arc::clone(&records), lead_metrics),
            sessions: Arc::new(SessionStore::new(&config.auth)),
            config: Arc::new(config),
            records,
            bucket,
            gallery,
            forwarder,
            ws_hub,
            realtime,
            start_time: Instant::now(),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub async fn ws_connection_count(&self) -> usize {
        self.ws_hub.connection_count().await
    }
}
