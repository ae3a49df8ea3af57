//! Compression method definitions and tags

/// Block header tags
pub mod tags {
    /// LZ10: 2-byte back-references, lengths 3..=18
    pub const LZ10: u8 = 0x10;
    /// LZ11: 2/3/4-byte back-references, lengths up to 0x10110
    pub const LZ11: u8 = 0x11;
}

/// Compression methods understood by this codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// Classic LZ77 variant used by the BIOS decompressors
    Lz10,
    /// Extended-length variant used by later titles
    Lz11,
}

impl CompressionMethod {
    /// Determine the method from a block header tag
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            tags::LZ10 => Some(CompressionMethod::Lz10),
            tags::LZ11 => Some(CompressionMethod::Lz11),
            _ => None,
        }
    }

    /// Get the block header tag for this method
    pub fn tag(self) -> u8 {
        match self {
            CompressionMethod::Lz10 => tags::LZ10,
            CompressionMethod::Lz11 => tags::LZ11,
        }
    }

    /// Short lowercase name, as used on the command line
    pub fn name(self) -> &'static str {
        match self {
            CompressionMethod::Lz10 => "lz10",
            CompressionMethod::Lz11 => "lz11",
        }
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_tag() {
        assert_eq!(
            CompressionMethod::from_tag(tags::LZ10),
            Some(CompressionMethod::Lz10)
        );
        assert_eq!(
            CompressionMethod::from_tag(tags::LZ11),
            Some(CompressionMethod::Lz11)
        );
        assert_eq!(CompressionMethod::from_tag(0x40), None);
        assert_eq!(CompressionMethod::from_tag(0x00), None);
    }

    #[test]
    fn test_tag_round_trip() {
        for method in [CompressionMethod::Lz10, CompressionMethod::Lz11] {
            assert_eq!(CompressionMethod::from_tag(method.tag()), Some(method));
        }
        assert_eq!(CompressionMethod::Lz11.to_string(), "lz11");
    }
}
