//! LZ11 token stream: variable-width back-references up to 0x10110 bytes

use super::encode_tokens;
use super::window::DecodeWindow;
use crate::Result;

/// Longest LZ11 back-reference
pub(crate) const MAX_MATCH: usize = 0x1_0110;

const SHORT_MAX: usize = 0x10;
const MEDIUM_BIAS: usize = 0x11;
const MEDIUM_MAX: usize = 0x110;
const LONG_BIAS: usize = 0x111;

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
            let (length, distance) = match b0 >> 4 {
                0 => {
                    let b1 = window.next_byte()? as usize;
                    let b2 = window.next_byte()? as usize;
                    let length = ((b0 & 0x0F) << 4 | b1 >> 4) + MEDIUM_BIAS;
                    (length, ((b1 & 0x0F) << 8 | b2) + 1)
                }
                1 => {
                    let b1 = window.next_byte()? as usize;
                    let b2 = window.next_byte()? as usize;
                    let b3 = window.next_byte()? as usize;
                    let length = ((b0 & 0x0F) << 12 | b1 << 4 | b2 >> 4) + LONG_BIAS;
                    (length, ((b2 & 0x0F) << 8 | b3) + 1)
                }
                indicator => {
                    let b1 = window.next_byte()? as usize;
                    (indicator + 1, ((b0 & 0x0F) << 8 | b1) + 1)
                }
            };
            window.copy(distance, length)?;
        }
    }

    window.finish()
}

pub(crate) fn encode(data: &[u8], out: &mut Vec<u8>) {
    encode_tokens(data, out, MAX_MATCH, |out, length, distance| {
        let disp = distance - 1;
        if length <= SHORT_MAX {
            out.push((((length - 1) << 4) | (disp >> 8)) as u8);
            out.push((disp & 0xFF) as u8);
        } else if length <= MEDIUM_MAX {
            let len = length - MEDIUM_BIAS;
            out.push((len >> 4) as u8);
            out.push((((len & 0x0F) << 4) | (disp >> 8)) as u8);
            out.push((disp & 0xFF) as u8);
        } else {
            let len = length - LONG_BIAS;
            out.push((0x10 | (len >> 12)) as u8);
            out.push(((len >> 4) & 0xFF) as u8);
            out.push((((len & 0x0F) << 4) | (disp >> 8)) as u8);
            out.push((disp & 0xFF) as u8);
        }
    });
}
