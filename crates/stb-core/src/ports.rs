//! Hexagonal ports.
//!
//! Spotify, HTTP and Telegram live behind these traits; the router only ever
//! sees `Arc<dyn ...>` so tests can swap in doubles.

use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, Track},
    policy::FailurePolicy,
    Result,
};

/// Track lookup against a music catalog.
#[async_trait]
pub trait MusicCatalog: Send + Sync {
    /// Search failures are reported to the user as "nothing found".
    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Swallow
    }

    /// First track matching a free-text query.
    async fn search_track(&self, query: &str) -> Result<Option<Track>>;

    async fn get_track(&self, track_id: &str) -> Result<Option<Track>>;

    /// External URL the track is downloaded from.
    async fn download_url(&self, track_id: &str) -> Result<Option<String>> {
        Ok(self
            .get_track(track_id)
            .await?
            .and_then(|t| t.external_url))
    }
}

/// Streams a remote resource to a local file.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Propagate
    }

    async fn fetch(&self, url: &str, destination: &Path) -> Result<()>;
}

/// Converts a local audio file to FLAC in place.
#[async_trait]
pub trait AudioEncoder: Send + Sync {
    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Propagate
    }

    async fn encode_flac(&self, path: &Path) -> Result<()>;
}

/// Outbound side of the chat transport.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Send failures are logged; callers never learn about them.
    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Swallow
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    async fn send_file(
        &self,
        chat_id: ChatId,
        local_path: &Path,
        display_name: &str,
    ) -> Result<()>;
}
