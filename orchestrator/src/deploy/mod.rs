//! Deployment module

pub mod applier;
pub mod backend;
pub mod deployer;
pub mod dispatch;
pub mod registry;
