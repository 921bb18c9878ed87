//! Pushing the rendered page to its public host.
//!
//! Publishing is best-effort: the document store is the source of truth and
//! the page is a projection of it. Publishers never return errors; they
//! report a [`PublishOutcome`] and log failures themselves.

pub mod github;

pub use github::{GitHubConfig, GitHubPublisher};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Remote path of the published page.
pub const PAGE_PATH: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum PublishOutcome {
    /// An existing file was overwritten.
    Updated { commit: String },
    /// The file did not exist and was created.
    Created { commit: String },
    /// Publishing is not configured.
    Skipped { reason: String },
    Failed { reason: String },
}

impl PublishOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Updated { .. } | Self::Created { .. })
    }
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, path: &str, content: &str) -> PublishOutcome;
}

/// Used when the GitHub settings are incomplete.
#[derive(Debug, Default)]
pub struct DisabledPublisher;

#[async_trait]
impl Publisher for DisabledPublisher {
    async fn publish(&self, path: &str, content: &str) -> PublishOutcome {
        tracing::debug!(path, bytes = content.len(), "publishing disabled, skipping");
        PublishOutcome::Skipped {
            reason: "publishing is not configured".to_string(),
        }
    }
}
