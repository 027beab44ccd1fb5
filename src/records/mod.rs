//! Record Store
//!
//! Relational storage for the dealership's two tables:
//!
//! - **carros**: vehicle inventory (edited by the back-office)
//! - **leads**: inbound sales leads (written by the capture channel, only
//!   the financing status is edited here)
//!
//! Writes publish [`ChangeEvent`]s so that dashboards and websocket clients
//! can reload when a table changes.

pub mod changes;
pub mod error;
pub mod store;
pub mod types;

pub use changes::{ChangeEvent, ChangeFeed, ChangeKind, ChangeListener};
pub use error::{StoreError, StoreResult};
pub use store::RecordStore;
pub use types::{
    Car, CarOrder, CarRecord, CarSortColumn, CarStatus, FinancingStatus, Lead, NewLead,
    SortDirection, Table,
};
