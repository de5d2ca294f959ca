//! Executor backend clients

pub mod api;
pub mod http;
pub mod retry;
pub mod terraform;
pub mod tofu;
