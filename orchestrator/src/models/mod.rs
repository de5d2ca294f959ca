//! Domain models

pub mod backend;
pub mod deployment;
pub mod order;
pub mod result;
pub mod task;
pub mod webhook;
