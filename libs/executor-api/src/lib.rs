//! Wire models for the provisioning executor protocols.
//!
//! One module per executor protocol family. The structs here mirror the
//! executors' JSON contracts exactly; nothing in this crate carries
//! orchestrator semantics.

pub mod models;
