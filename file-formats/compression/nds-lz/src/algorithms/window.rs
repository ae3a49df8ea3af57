//! Bounded output window shared by the decoders

use crate::{Error, Result};

/// Preallocation ceiling; larger outputs grow on demand
const MAX_PREALLOCATION: usize = 16 * 1024 * 1024;

/// Trailing bytes tolerated after the declared length (word alignment)
const MAX_TRAILING_PADDING: usize = 3;

/// Decoder state: the token input cursor and the output produced so far
#[derive(Debug)]
pub(crate) struct DecodeWindow<'a> {
    input: &'a [u8],
    pos: usize,
    output: Vec<u8>,
    expected: usize,
}

impl<'a> DecodeWindow<'a> {
    pub(crate) fn new(input: &'a [u8], expected: usize) -> Self {
        Self {
            input,
            pos: 0,
            output: Vec::with_capacity(expected.min(MAX_PREALLOCATION)),
            expected,
        }
    }

    /// Whether the declared length has been produced
    pub(crate) fn is_complete(&self) -> bool {
        self.output.len() >= self.expected
    }

    pub(crate) fn next_byte(&mut self) -> Result<u8> {
        let byte = self.input.get(self.pos).copied().ok_or_else(|| {
            Error::corrupt(format!(
                "input exhausted after {} of {} bytes",
                self.output.len(),
                self.expected
            ))
        })?;
        self.pos += 1;
        Ok(byte)
    }

    pub(crate) fn literal(&mut self) -> Result<()> {
        let byte = self.next_byte()?;
        self.output.push(byte);
        Ok(())
    }

    /// Copy `length` bytes starting `distance` bytes back, one byte at a time
    pub(crate) fn copy(&mut self, distance: usize, length: usize) -> Result<()> {
        let produced = self.output.len();
        if distance > produced {
            return Err(Error::corrupt(format!(
                "back-reference distance {} exceeds {} bytes produced",
                distance, produced
            )));
        }
        if produced + length > self.expected {
            return Err(Error::corrupt(format!(
                "back-reference of {} bytes at {} overruns declared length {}",
                length, produced, self.expected
            )));
        }

        let start = produced - distance;
        for i in 0..length {
            let byte = self.output[start + i];
            self.output.push(byte);
        }
        Ok(())
    }

    /// Check the trailing input and hand back the output
    pub(crate) fn finish(self) -> Result<Vec<u8>> {
        let trailing = self.input.len() - self.pos;
        if trailing > MAX_TRAILING_PADDING {
            return Err(Error::corrupt(format!(
                "{} unused bytes after declared length {}",
                trailing, self.expected
            )));
        }
        Ok(self.output)
    }
}
