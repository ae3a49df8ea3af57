//! LZ10 token stream: 2-byte back-references, lengths 3..=18

use super::encode_tokens;
use super::window::DecodeWindow;
use crate::Result;

/// Longest LZ10 back-reference
pub(crate) const MAX_MATCH: usize = 18;

pub(crate) fn decode(body: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut window = DecodeWindow::new(body, expected);

    while !window.is_complete() {
        let flags = window.next_byte()?;
        for bit in 0..8 {
            if window.is_complete() {
                break;
            }
            if flags & (0x80 >> bit) == 0 {
                window.literal()?;
                continue;
            }

            let b0 = window.next_byte()? as usize;
            let b1 = window.next_byte()? as usize;
            let length = (b0 >> 4) + 3;
            let distance = ((b0 & 0x0F) << 8 | b1) + 1;
            window.copy(distance, length)?;
        }
    }

    window.finish()
}

pub(crate) fn encode(data: &[u8], out: &mut Vec<u8>) {
    encode_tokens(data, out, MAX_MATCH, |out, length, distance| {
        let disp = distance - 1;
        out.push((((length - 3) << 4) | (disp >> 8)) as u8);
        out.push((disp & 0xFF) as u8);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_literals_and_reference() {
        // flags 0b0100_0000: literal, then a 3-byte copy at distance 1
        let body = [0x40, b'z', 0x00, 0x00];
        assert_eq!(decode(&body, 4).unwrap(), b"zzzz");
    }

    #[test]
    fn test_encode_run_uses_references() {
        let data = vec![0xABu8; 64];
        let mut out = Vec::new();
        encode(&data, &mut out);
        assert!(out.len() < 16);
        assert_eq!(decode(&out, data.len()).unwrap(), data);
    }
}
