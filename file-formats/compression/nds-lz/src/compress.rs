//! Block compression

use super::algorithms::{lz10, lz11};
use crate::header::BlockHeader;
use crate::methods::CompressionMethod;
use crate::{Error, Result};

/// Compress `data` into an LZ10 block
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    compress_with(data, CompressionMethod::Lz10)
}

/// Compress `data` into a block of the given method
///
/// The output is padded with zeros to a multiple of 4 bytes.
pub fn compress_with(data: &[u8], method: CompressionMethod) -> Result<Vec<u8>> {
    if u32::try_from(data.len()).is_err() {
        return Err(Error::PayloadTooLarge(data.len()));
    }

    let header = BlockHeader::new(method, data.len());
    let mut out = Vec::with_capacity(header.header_len + data.len() + data.len() / 8 + 4);
    header.write(&mut out)?;

    match method {
        CompressionMethod::Lz10 => lz10::encode(data, &mut out),
        CompressionMethod::Lz11 => lz11::encode(data, &mut out),
    }

    while out.len() % 4 != 0 {
        out.push(0);
    }

    log::debug!(
        "Compressed {} bytes to {} bytes with {}",
        data.len(),
        out.len(),
        method
    );

    Ok(out)
}
