//! Release check.
//!
//! Fetching the published version is left to a [`ReleaseFeed`]
//! implementation; the store only compares and warns.

use crate::messages::{Language, Message};
use async_trait::async_trait;
use std::error::Error;
use std::fmt;
use tracing::{debug, warn};

/// The running crate version.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error type returned by release feeds.
pub type FeedError = Box<dyn Error + Send + Sync>;

/// Source of the latest published version.
#[async_trait]
pub trait ReleaseFeed: Send + Sync + fmt::Debug {
    /// Returns the latest published version string.
    async fn latest_version(&self) -> Result<String, FeedError>;
}

/// A feed that always reports the same version.
#[derive(Debug, Clone)]
pub struct PinnedRelease(pub String);

#[async_trait]
impl ReleaseFeed for PinnedRelease {
    async fn latest_version(&self) -> Result<String, FeedError> {
        Ok(self.0.clone())
    }
}

/// Compares `current` against the feed.
///
/// Returns the localized warning when the feed reports a different
/// version, after logging it. Feed failures are logged at debug level and
/// yield `None`.
pub async fn check_release(
    feed: &dyn ReleaseFeed,
    current: &str,
    language: Language,
) -> Option<String> {
    let latest = match feed.latest_version().await {
        Ok(latest) => latest,
        Err(err) => {
            debug!(error = %err, "release check failed");
            return None;
        }
    };

    if latest.trim() == current {
        return None;
    }

    let text = Message::OldVersion {
        current,
        latest: latest.trim(),
    }
    .render(language);
    warn!("{text}");
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct BrokenFeed;

    #[async_trait]
    impl ReleaseFeed for BrokenFeed {
        async fn latest_version(&self) -> Result<String, FeedError> {
            Err("registry unreachable".into())
        }
    }

    #[tokio::test]
    async fn same_version_is_quiet() {
        let feed = PinnedRelease(CURRENT_VERSION.to_string());
        assert_eq!(check_release(&feed, CURRENT_VERSION, Language::En).await, None);
    }

    #[tokio::test]
    async fn different_version_warns() {
        let feed = PinnedRelease("99.0.0".to_string());
        let text = check_release(&feed, "0.1.0", Language::Tr).await.unwrap();
        assert!(text.contains("99.0.0"));
    }

    #[tokio::test]
    async fn feed_failure_is_ignored() {
        assert_eq!(check_release(&BrokenFeed, "0.1.0", Language::En).await, None);
    }
}
