//! Order ledger module

pub mod snapshot;
pub mod store;
