use std::path::Path;

use async_trait::async_trait;

use crate::{ports::AudioEncoder, Result};

/// Encoder used when no FLAC encoder is configured. Leaves the file untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEncoder;

#[async_trait]
impl AudioEncoder for NoopEncoder {
    async fn encode_flac(&self, path: &Path) -> Result<()> {
        tracing::debug!(path = %path.display(), "no FLAC encoder configured; file left as downloaded");
        Ok(())
    }
}
