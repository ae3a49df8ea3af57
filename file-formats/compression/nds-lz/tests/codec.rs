//! Codec integration tests

use nds_lz::{BlockHeader, CompressionMethod, Error, compress, compress_with, decompress, detect};
use pretty_assertions::assert_eq;

fn sample_text(len: usize) -> Vec<u8> {
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    pattern.iter().copied().cycle().take(len).collect()
}

fn noise(len: usize) -> Vec<u8> {
    let mut seed = 0x1234_5678u32;
    (0..len)
        .map(|_| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 16) as u8
        })
        .collect()
}

#[test]
fn test_round_trip_both_methods() {
    let inputs = [
        Vec::new(),
        vec![0x42],
        sample_text(1000),
        noise(5000),
        vec![0u8; 70_000],
    ];
    for method in [CompressionMethod::Lz10, CompressionMethod::Lz11] {
        for input in &inputs {
            let block = compress_with(input, method).unwrap();
            assert_eq!(detect(&block).is_some(), !input.is_empty());
            assert_eq!(&decompress(&block).unwrap(), input);
        }
    }
}

#[test]
fn test_repetitive_input_shrinks() {
    let data = sample_text(8192);
    let lz10 = compress(&data).unwrap();
    let lz11 = compress_with(&data, CompressionMethod::Lz11).unwrap();
    assert!(lz10.len() < data.len() / 4);
    assert!(lz11.len() <= lz10.len());
}

#[test]
fn test_compression_is_deterministic() {
    let data = noise(3000);
    assert_eq!(compress(&data).unwrap(), compress(&data).unwrap());
}

#[test]
fn test_large_payload_uses_extended_header() {
    let data = vec![0xEEu8; BlockHeader::MAX_INLINE_LEN + 1];
    let block = compress(&data).unwrap();
    let header = BlockHeader::parse(&block).unwrap();
    assert_eq!(header.header_len, BlockHeader::EXTENDED_SIZE);
    assert_eq!(header.decompressed_len, data.len());
    assert_eq!(decompress(&block).unwrap().len(), data.len());
}

#[test]
fn test_declared_ten_emits_eight() {
    let mut block = vec![0x10, 0x0A, 0x00, 0x00, 0x00];
    block.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
    let err = decompress(&block).unwrap_err();
    assert!(matches!(err, Error::CorruptData(_)), "got {err:?}");
}

#[test]
fn test_reference_before_start_of_output() {
    // First unit is a back-reference with nothing produced yet
    let block = [0x10, 0x03, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00];
    assert!(matches!(decompress(&block), Err(Error::CorruptData(_))));
}

#[test]
fn test_reference_overruns_declared_length() {
    // Literal then an 18-byte copy while only 4 bytes are declared
    let block = [0x10, 0x04, 0x00, 0x00, 0x40, b'a', 0xF0, 0x00];
    assert!(matches!(decompress(&block), Err(Error::CorruptData(_))));
}

#[test]
fn test_excess_trailing_data_rejected() {
    let mut block = compress(b"payload").unwrap();
    block.extend_from_slice(&[0; 8]);
    assert!(matches!(decompress(&block), Err(Error::CorruptData(_))));
}

#[test]
fn test_truncated_blocks_never_panic() {
    let block = compress(&sample_text(600)).unwrap();
    for cut in 0..block.len() - 4 {
        assert!(decompress(&block[..cut]).is_err(), "cut at {cut}");
    }
}
