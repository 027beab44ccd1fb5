//! API Routes
//!
//! Route handlers organized by page.

pub mod auth;
pub mod cars;
pub mod dashboard;
pub mod functions;
pub mod health;
pub mod leads;
pub mod photos;
