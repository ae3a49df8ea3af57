//! Token stream implementations

pub(super) mod lz10;
pub(super) mod lz11;
mod matcher;
mod window;

use matcher::MatchFinder;

/// Run the greedy encoder over `data`, appending flag groups to `out`
///
/// `emit` writes one back-reference of `(length, distance)`.
fn encode_tokens<F>(data: &[u8], out: &mut Vec<u8>, max_match: usize, mut emit: F)
where
    F: FnMut(&mut Vec<u8>, usize, usize),
{
    let mut finder = MatchFinder::new(data, max_match);
    let mut pos = 0;
    let mut flag_pos = 0;
    let mut bit = 8;

    while pos < data.len() {
        if bit == 8 {
            flag_pos = out.len();
            out.push(0);
            bit = 0;
        }

        if let Some(found) = finder.find(pos) {
            out[flag_pos] |= 0x80 >> bit;
            emit(out, found.length, found.distance);
            for p in pos..pos + found.length {
                finder.insert(p);
            }
            pos += found.length;
        } else {
            out.push(data[pos]);
            finder.insert(pos);
            pos += 1;
        }

        bit += 1;
    }
}
