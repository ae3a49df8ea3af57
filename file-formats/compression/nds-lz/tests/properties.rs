//! Property tests for the codec

use nds_lz::{CompressionMethod, compress_with, decompress};
use proptest::prelude::*;

fn method() -> impl Strategy<Value = CompressionMethod> {
    prop_oneof![Just(CompressionMethod::Lz10), Just(CompressionMethod::Lz11)]
}

/// Inputs built from a small alphabet so back-references are common
fn repetitive_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(vec![0u8, 1, 2, 0xFF]), 0..4096)
}

proptest! {
    #[test]
    fn round_trip_arbitrary(data in prop::collection::vec(any::<u8>(), 0..2048), method in method()) {
        let block = compress_with(&data, method).unwrap();
        prop_assert_eq!(decompress(&block).unwrap(), data);
    }

    #[test]
    fn round_trip_repetitive(data in repetitive_bytes(), method in method()) {
        let block = compress_with(&data, method).unwrap();
        prop_assert_eq!(decompress(&block).unwrap(), data);
    }

    #[test]
    fn output_never_exceeds_declared_length(mut block in prop::collection::vec(any::<u8>(), 4..256)) {
        block[0] = 0x10 | (block[0] & 1);
        let declared = usize::from(block[1]) | usize::from(block[2]) << 8 | usize::from(block[3]) << 16;
        if let Ok(out) = decompress(&block) {
            prop_assert!(declared == 0 || out.len() == declared);
        }
    }
}
