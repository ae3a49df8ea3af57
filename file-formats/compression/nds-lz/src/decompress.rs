//! Block decompression

use super::algorithms::{lz10, lz11};
use crate::header::BlockHeader;
use crate::methods::CompressionMethod;
use crate::Result;

/// Decompress a block, dispatching on its header tag
///
/// Fails with [`Error::CorruptData`](crate::Error::CorruptData) when the token
/// stream cannot produce exactly the declared length, and with
/// [`Error::UnsupportedFormat`](crate::Error::UnsupportedFormat) on an unknown tag.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let header = BlockHeader::parse(data)?;
    let body = &data[header.header_len..];

    log::debug!(
        "Decompressing {} block: {} bytes in, {} bytes declared",
        header.method,
        data.len(),
        header.decompressed_len
    );

    match header.method {
        CompressionMethod::Lz10 => lz10::decode(body, header.decompressed_len),
        CompressionMethod::Lz11 => lz11::decode(body, header.decompressed_len),
    }
}

/// Guess whether `data` starts with a compressed block header
///
/// Only the header is inspected; a positive answer does not guarantee the
/// token stream decodes.
pub fn detect(data: &[u8]) -> Option<CompressionMethod> {
    BlockHeader::parse(data)
        .ok()
        .filter(|header| header.decompressed_len > 0)
        .map(|header| header.method)
}
