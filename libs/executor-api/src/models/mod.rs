//! Executor protocol models

pub mod opentofu;
pub mod terraform;
