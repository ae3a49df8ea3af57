//! Suffix sorting by prefix doubling
//!
//! Suffixes are first bucketed by their leading two bytes, then every group
//! of suffixes that still compare equal is re-sorted by the rank of the
//! suffix `h` bytes further on, doubling `h` each round. Groups of one are
//! final and never touched again.

/// Number of distinct two-byte keys, plus the end-of-input marker
const BUCKETS: usize = 257 * 256 + 1;

fn initial_key(data: &[u8], i: usize) -> usize {
    let second = data.get(i + 1).map_or(0, |&b| usize::from(b) + 1);
    1 + usize::from(data[i]) * 257 + second
}

/// Sort the suffixes of `data`, returning their start offsets in order
///
/// `data` must be shorter than `u32::MAX` bytes.
pub fn suffix_array(data: &[u8]) -> Vec<u32> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }

    // Counting sort on the first two bytes
    let mut counts = vec![0u32; BUCKETS + 1];
    for i in 0..n {
        counts[initial_key(data, i)] += 1;
    }
    let mut starts = vec![0u32; BUCKETS + 1];
    let mut total = 0;
    for (start, &count) in starts.iter_mut().zip(&counts) {
        *start = total;
        total += count;
    }

    let mut sa = vec![0u32; n];
    let mut rank = vec![0u32; n];
    let mut fill = starts.clone();
    for i in 0..n {
        let key = initial_key(data, i);
        sa[fill[key] as usize] = i as u32;
        fill[key] += 1;
        rank[i] = starts[key] + 1;
    }

    let mut unsorted: Vec<(usize, usize)> = counts
        .iter()
        .zip(&starts)
        .filter(|&(&count, _)| count > 1)
        .map(|(&count, &start)| (start as usize, (start + count) as usize))
        .collect();
    drop(counts);
    drop(starts);

    let mut next_rank = rank.clone();
    let mut h = 2;
    while !unsorted.is_empty() {
        let mut still_unsorted = Vec::new();

        for &(start, end) in &unsorted {
            let key = |s: u32| rank.get(s as usize + h).copied().unwrap_or(0);
            sa[start..end].sort_unstable_by_key(|&s| key(s));

            let mut head = start;
            while head < end {
                let head_key = key(sa[head]);
                let mut tail = head + 1;
                while tail < end && key(sa[tail]) == head_key {
                    tail += 1;
                }
                for &s in &sa[head..tail] {
                    next_rank[s as usize] = head as u32 + 1;
                }
                if tail - head > 1 {
                    still_unsorted.push((head, tail));
                }
                head = tail;
            }
        }

        rank.copy_from_slice(&next_rank);
        unsorted = still_unsorted;
        h *= 2;
    }

    sa
}
