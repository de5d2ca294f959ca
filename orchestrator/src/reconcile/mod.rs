//! Reconciliation module

pub mod manager;
