//! Hash-chain match finder for the greedy encoders

/// Both variants address at most 4096 bytes back
pub(crate) const WINDOW_SIZE: usize = 4096;

/// Shortest back-reference either variant can express
pub(crate) const MIN_MATCH: usize = 3;

const HASH_BITS: u32 = 15;
const HASH_SIZE: usize = 1 << HASH_BITS;
const CHAIN_LIMIT: usize = 512;
const NONE: u32 = u32::MAX;

/// A back-reference candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Match {
    pub(crate) length: usize,
    pub(crate) distance: usize,
}

/// Chains of earlier positions sharing the same 3-byte prefix
///
/// `prev` is a ring over the window, so a chain never reaches further back
/// than a back-reference can.
#[derive(Debug)]
pub(crate) struct MatchFinder<'a> {
    data: &'a [u8],
    head: Vec<u32>,
    prev: Vec<u32>,
    max_match: usize,
}

impl<'a> MatchFinder<'a> {
    pub(crate) fn new(data: &'a [u8], max_match: usize) -> Self {
        Self {
            data,
            head: vec![NONE; HASH_SIZE],
            prev: vec![NONE; WINDOW_SIZE],
            max_match,
        }
    }

    fn hash(&self, pos: usize) -> usize {
        let key = u32::from(self.data[pos]) << 16
            | u32::from(self.data[pos + 1]) << 8
            | u32::from(self.data[pos + 2]);
        (key.wrapping_mul(0x9E37_79B1) >> (32 - HASH_BITS)) as usize
    }

    /// Record `pos` as a future match source
    pub(crate) fn insert(&mut self, pos: usize) {
        if pos + MIN_MATCH > self.data.len() {
            return;
        }
        let h = self.hash(pos);
        self.prev[pos % WINDOW_SIZE] = self.head[h];
        self.head[h] = pos as u32;
    }

    /// Longest match for the bytes at `pos`; the nearest wins ties
    pub(crate) fn find(&self, pos: usize) -> Option<Match> {
        if pos + MIN_MATCH > self.data.len() {
            return None;
        }

        let limit = self.max_match.min(self.data.len() - pos);
        let mut best = Match {
            length: 0,
            distance: 0,
        };
        let mut candidate = self.head[self.hash(pos)];

        for _ in 0..CHAIN_LIMIT {
            if candidate == NONE {
                break;
            }
            let cand = candidate as usize;
            if cand >= pos || pos - cand > WINDOW_SIZE {
                break;
            }

            let length = self.data[cand..]
                .iter()
                .zip(&self.data[pos..pos + limit])
                .take_while(|(a, b)| a == b)
                .count();
            if length > best.length {
                best = Match {
                    length,
                    distance: pos - cand,
                };
                if length == limit {
                    break;
                }
            }

            let next = self.prev[cand % WINDOW_SIZE];
            if next == NONE || next >= candidate {
                break;
            }
            candidate = next;
        }

        (best.length >= MIN_MATCH).then_some(best)
    }
}
