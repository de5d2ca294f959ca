//! Execution backend kinds

use serde::{Deserialize, Serialize};

/// Kind of execution backend a task is dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Terraform executor service
    Terraform,

    /// OpenTofu executor service
    OpenTofu,
}

impl BackendKind {
    /// All known backend kinds
    pub const ALL: [BackendKind; 2] = [BackendKind::Terraform, BackendKind::OpenTofu];

    /// Stable slug used in URLs and configuration keys
    pub fn slug(&self) -> &'static str {
        match self {
            BackendKind::Terraform => "terraform",
            BackendKind::OpenTofu => "opentofu",
        }
    }

    /// Parse a slug back into a kind
    pub fn from_slug(slug: &str) -> Option<BackendKind> {
        match slug {
            "terraform" => Some(BackendKind::Terraform),
            "opentofu" => Some(BackendKind::OpenTofu),
            _ => None,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}
