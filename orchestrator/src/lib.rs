//! Provost Orchestrator Library
//!
//! Core modules for the provost deployment orchestration and result
//! reconciliation service.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod executor;
pub mod filesys;
pub mod ledger;
pub mod logs;
pub mod models;
pub mod reconcile;
pub mod server;
pub mod storage;
pub mod utils;
pub mod workers;
