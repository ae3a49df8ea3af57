//! Patches for several revisions of the same title

use crate::apply::apply;
use crate::artifact::PatchArtifact;
use crate::{Error, Result, md5_digest};

/// A collection of patches that all produce the same kind of target,
/// each from a different source revision
///
/// The patch to use is picked by the checksum of the supplied image, so a
/// revision the set does not know is rejected up front.
#[derive(Debug, Clone, Default)]
pub struct PatchSet {
    artifacts: Vec<PatchArtifact>,
}

impl PatchSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a patch to the set
    pub fn add(&mut self, artifact: PatchArtifact) {
        self.artifacts.push(artifact);
    }

    /// Number of patches in the set
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether the set holds no patches
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Patches in insertion order
    pub fn artifacts(&self) -> &[PatchArtifact] {
        &self.artifacts
    }

    /// Pick the patch built against `source`
    pub fn select(&self, source: &[u8]) -> Result<&PatchArtifact> {
        let actual = md5_digest(source);
        self.artifacts
            .iter()
            .find(|a| a.source_len() == source.len() && a.source_md5() == actual)
            .ok_or_else(|| {
                let known: Vec<String> = self
                    .artifacts
                    .iter()
                    .map(|a| hex::encode(a.source_md5()))
                    .collect();
                Error::SourceMismatch {
                    expected: if known.is_empty() {
                        "<no patches loaded>".to_string()
                    } else {
                        known.join(" or ")
                    },
                    actual: hex::encode(actual),
                }
            })
    }

    /// Select the matching patch and apply it
    pub fn apply(&self, source: &[u8]) -> Result<Vec<u8>> {
        let artifact = self.select(source)?;
        log::info!(
            "Selected patch for source {}",
            hex::encode(artifact.source_md5())
        );
        apply(artifact, source)
    }
}

impl FromIterator<PatchArtifact> for PatchSet {
    fn from_iter<I: IntoIterator<Item = PatchArtifact>>(iter: I) -> Self {
        Self {
            artifacts: iter.into_iter().collect(),
        }
    }
}
