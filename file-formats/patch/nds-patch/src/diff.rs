//! Patch generation
//!
//! The scan walks the target looking up each position in the suffix array
//! of the source. Approximate matches are extended forward from the previous
//! match and backward from the next one; the extended region becomes the
//! "add" part of a control triple (stored as a bytewise delta, which is
//! mostly zeros when the images are similar), and whatever lies between
//! becomes literal "insert" bytes.

use crate::artifact::{Control, PatchArtifact, PatchHeader};
use crate::codec::BlockCodec;
use crate::suffix::suffix_array;
use crate::{Error, Result, md5_digest};
use std::cmp::Ordering;

/// Length of the common prefix of `a` and `b`
fn match_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Find the source offset sharing the longest prefix with `target`
fn search(sa: &[u32], source: &[u8], target: &[u8]) -> (usize, usize) {
    if sa.is_empty() || target.is_empty() {
        return (0, 0);
    }

    // A suffix that is a proper prefix of `target` sorts below it, so runs
    // of a repeated byte converge on their longest suffix
    let mut lo = 0;
    let mut hi = sa.len() - 1;
    while hi - lo >= 2 {
        let mid = lo + (hi - lo) / 2;
        if source[sa[mid] as usize..].cmp(target) == Ordering::Less {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let lo_pos = sa[lo] as usize;
    let hi_pos = sa[hi] as usize;
    let lo_len = match_len(&source[lo_pos..], target);
    let hi_len = match_len(&source[hi_pos..], target);
    if lo_len >= hi_len {
        (lo_pos, lo_len)
    } else {
        (hi_pos, hi_len)
    }
}

/// Compute a patch transforming `source` into `target`
///
/// The result is compact for similar images but not minimal.
pub fn diff(source: &[u8], target: &[u8]) -> Result<PatchArtifact> {
    let source_len =
        u32::try_from(source.len()).map_err(|_| Error::InputTooLarge(source.len()))?;
    let target_len =
        u32::try_from(target.len()).map_err(|_| Error::InputTooLarge(target.len()))?;

    log::info!(
        "Sorting {} source bytes for a {} byte target",
        source.len(),
        target.len()
    );
    let sa = suffix_array(source);

    let old = source;
    let new = target;
    let old_size = old.len() as i64;
    let new_size = new.len() as i64;
    let at = |buf: &[u8], i: i64| buf[i as usize];

    let mut controls = Vec::new();
    let mut delta = Vec::with_capacity(new.len());
    let mut extra = Vec::new();

    let mut scan: i64 = 0;
    let mut len: i64 = 0;
    let mut pos: i64 = 0;
    let mut last_scan: i64 = 0;
    let mut last_pos: i64 = 0;
    let mut last_offset: i64 = 0;

    while scan < new_size {
        let mut old_score: i64 = 0;
        scan += len;
        let mut scsc = scan;

        while scan < new_size {
            let (found_pos, found_len) = search(&sa, old, &new[scan as usize..]);
            pos = found_pos as i64;
            len = found_len as i64;

            while scsc < scan + len {
                if scsc + last_offset < old_size
                    && at(old, scsc + last_offset) == at(new, scsc)
                {
                    old_score += 1;
                }
                scsc += 1;
            }

            if (len == old_score && len != 0) || len > old_score + 8 {
                break;
            }
            if scan + last_offset < old_size && at(old, scan + last_offset) == at(new, scan) {
                old_score -= 1;
            }
            scan += 1;
        }

        if len == old_score && scan != new_size {
            continue;
        }

        // Extend forward from the previous match
        let mut len_f: i64 = 0;
        {
            let (mut s, mut best) = (0i64, 0i64);
            let mut i = 0;
            while last_scan + i < scan && last_pos + i < old_size {
                if at(old, last_pos + i) == at(new, last_scan + i) {
                    s += 1;
                }
                i += 1;
                if s * 2 - i > best * 2 - len_f {
                    best = s;
                    len_f = i;
                }
            }
        }

        // Extend backward from the current match
        let mut len_b: i64 = 0;
        if scan < new_size {
            let (mut s, mut best) = (0i64, 0i64);
            let mut i = 1;
            while scan >= last_scan + i && pos >= i {
                if at(old, pos - i) == at(new, scan - i) {
                    s += 1;
                }
                if s * 2 - i > best * 2 - len_b {
                    best = s;
                    len_b = i;
                }
                i += 1;
            }
        }

        // Split any overlap where it scores best
        if last_scan + len_f > scan - len_b {
            let overlap = (last_scan + len_f) - (scan - len_b);
            let (mut s, mut best, mut len_s) = (0i64, 0i64, 0i64);
            for i in 0..overlap {
                let front = len_f - overlap + i;
                if at(new, last_scan + front) == at(old, last_pos + front) {
                    s += 1;
                }
                if at(new, scan - len_b + i) == at(old, pos - len_b + i) {
                    s -= 1;
                }
                if s > best {
                    best = s;
                    len_s = i + 1;
                }
            }
            len_f += len_s - overlap;
            len_b -= len_s;
        }

        for i in 0..len_f {
            delta.push(at(new, last_scan + i).wrapping_sub(at(old, last_pos + i)));
        }
        let insert = (scan - len_b) - (last_scan + len_f);
        for i in 0..insert {
            extra.push(at(new, last_scan + len_f + i));
        }

        let seek = (pos - len_b) - (last_pos + len_f);
        controls.push(Control::new(len_f as u32, insert as u32, seek)?);

        last_scan = scan - len_b;
        last_pos = pos - len_b;
        last_offset = pos - scan;
    }

    let header = PatchHeader {
        version: PatchHeader::VERSION,
        codec: BlockCodec::default(),
        source_len,
        target_len,
        source_md5: md5_digest(source),
        target_md5: md5_digest(target),
    };

    let artifact = PatchArtifact::from_parts(header, controls, &delta, &extra)?;
    log::info!(
        "Patch built: {} control triples, {} bytes",
        artifact.control_len(),
        artifact.encoded_len()
    );
    Ok(artifact)
}
