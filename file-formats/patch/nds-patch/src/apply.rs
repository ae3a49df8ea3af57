//! Patch application

use crate::artifact::PatchArtifact;
use crate::{Error, Result};

/// Apply `artifact` to `source`, producing the target image
///
/// The source is verified before anything is produced, the output is built
/// in a fresh buffer and the result is checked against the recorded target
/// checksum. `source` is never modified.
pub fn apply(artifact: &PatchArtifact, source: &[u8]) -> Result<Vec<u8>> {
    artifact.verify_source(source)?;

    let delta = artifact.delta()?;
    let extra = artifact.extra()?;
    let target_len = artifact.target_len();

    log::debug!(
        "Applying patch: {} -> {} bytes ({} triples, {} delta, {} extra)",
        source.len(),
        target_len,
        artifact.control_len(),
        delta.len(),
        extra.len()
    );

    let mut out = Vec::with_capacity(target_len);
    let mut old_pos: i64 = 0;
    let mut delta_pos = 0usize;
    let mut extra_pos = 0usize;

    for (index, control) in artifact.controls().iter().enumerate() {
        let add = control.add as usize;
        let insert = control.insert as usize;

        if out.len() + add > target_len {
            return Err(Error::TruncatedPatch {
                expected: target_len,
                actual: out.len() + add,
            });
        }
        let added = delta.get(delta_pos..delta_pos + add).ok_or_else(|| {
            Error::malformed(format!(
                "control {} reads past the diff block ({} + {} > {})",
                index,
                delta_pos,
                add,
                delta.len()
            ))
        })?;
        for (i, &d) in added.iter().enumerate() {
            let old = old_pos + i as i64;
            let base = usize::try_from(old)
                .ok()
                .and_then(|o| source.get(o))
                .copied()
                .unwrap_or(0);
            out.push(d.wrapping_add(base));
        }
        delta_pos += add;
        old_pos += add as i64;

        if out.len() + insert > target_len {
            return Err(Error::TruncatedPatch {
                expected: target_len,
                actual: out.len() + insert,
            });
        }
        let inserted = extra.get(extra_pos..extra_pos + insert).ok_or_else(|| {
            Error::malformed(format!(
                "control {} reads past the extra block ({} + {} > {})",
                index,
                extra_pos,
                insert,
                extra.len()
            ))
        })?;
        out.extend_from_slice(inserted);
        extra_pos += insert;

        old_pos += control.seek;
    }

    if out.len() != target_len {
        return Err(Error::TruncatedPatch {
            expected: target_len,
            actual: out.len(),
        });
    }

    artifact.verify_target(&out)?;
    log::debug!("Patch applied: {} bytes", out.len());
    Ok(out)
}
