use async_trait::async_trait;
use chime_core::{Artifact, OwnerId};

use crate::error::Result;

/// Source of reminder audio.
///
/// The returned [`Artifact`] names the format actually written so playback
/// never has to guess it from the file contents.
#[async_trait]
pub trait ArtifactProvider: Send + Sync {
    /// Speak `text` into the owner's artifact file, replacing any previous one.
    async fn synthesize(&self, text: &str, owner: OwnerId) -> Result<Artifact>;
}
