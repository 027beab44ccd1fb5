//! # Showroom
//!
//! Back-office service for a car dealership: vehicle inventory with photo
//! galleries, lead tracking with financing status, and a metrics dashboard.
//! Stock changes are pushed to an external sales agent through a webhook.
//!
//! ## Modules
//!
//! - [`records`]: SQLite record store (`carros`, `leads`) and its change feed
//! - [`storage`]: object store for car photos, served under public URLs
//! - [`gallery`]: batch photo upload and removal with per-file validation
//! - [`backoffice`]: car form, cars list, leads list, dashboard
//! - [`sync`]: Sync Function forwarding stock updates to the agent webhook
//! - [`auth`]: operator sessions and the route guard
//! - [`realtime`]: websocket relay of record changes
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use showroom::records::{CarOrder, RecordStore};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RecordStore::open(std::path::Path::new("./showroom_data"))?;
//!
//!     for car in store.list_cars(CarOrder::recently_updated())? {
//!         println!("{} {} - {}", car.brand, car.name, car.status);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod backoffice;
pub mod config;
pub mod gallery;
pub mod notices;
pub mod realtime;
pub mod records;
pub mod storage;
pub mod sync;

// Re-export top-level types for convenience
pub use records::{
    Car, CarOrder, CarRecord, CarStatus, ChangeEvent, ChangeFeed, ChangeKind, ChangeListener,
    FinancingStatus, Lead, NewLead, RecordStore, SortDirection, StoreError, Table,
};

pub use storage::{LocalBucket, ObjectStore, StorageError, StorageResult};

pub use gallery::{GalleryError, IncomingPhoto, PhotoGallery, PhotoLimits, UploadOutcome};

pub use backoffice::{
    CarDraft, CarFilter, CarForm, CarsPage, DashboardPage, DashboardSummary, LeadFilter,
    LeadsPage, PageError,
};

pub use sync::{SyncError, SyncNotifier, SyncPayload, SyncReply, WebhookForwarder};

pub use auth::{AuthError, RequireSession, Session, SessionStore};

pub use realtime::{ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage, WsEvent};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};
