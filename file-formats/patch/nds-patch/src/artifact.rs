//! Patch artifact envelope
//!
//! All fields are little-endian:
//!
//! | offset | size | field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 4    | magic `NDPT`                            |
//! | 4      | 2    | format version                          |
//! | 6      | 2    | block codec (0 stored, 1 bzip2)         |
//! | 8      | 4    | source length                           |
//! | 12     | 4    | target length                           |
//! | 16     | 16   | source MD5                              |
//! | 32     | 16   | target MD5                              |
//! | 48     | 4    | number of control triples               |
//! | 52     | 4    | encoded control block length            |
//! | 56     | 4    | encoded diff block length               |
//! | 60     | 4    | encoded extra block length              |
//! | 64     | ...  | control, diff and extra blocks          |
//!
//! Decoded, the control block holds 12 bytes per triple, the diff block the
//! sum of all `add` lengths and the extra block the sum of all `insert`
//! lengths.

use crate::codec::BlockCodec;
use crate::{Error, Result, md5_digest};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Magic signature of a patch artifact
pub const PATCH_SIGNATURE: [u8; 4] = *b"NDPT";

/// Sign bit of a stored seek
const SEEK_NEGATIVE: u32 = 0x8000_0000;

/// Fixed envelope fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchHeader {
    /// Format version
    pub version: u16,
    /// Codec of the control, diff and extra blocks
    pub codec: BlockCodec,
    /// Length of the image the patch applies to
    pub source_len: u32,
    /// Length of the image the patch produces
    pub target_len: u32,
    /// MD5 of the image the patch applies to
    pub source_md5: [u8; 16],
    /// MD5 of the image the patch produces
    pub target_md5: [u8; 16],
}

impl PatchHeader {
    /// Current format version
    pub const VERSION: u16 = 1;

    /// Envelope size before the blocks
    pub const SIZE: usize = 64;
}

/// One control triple
///
/// Replay adds `add` delta bytes to the source at the cursor, appends
/// `insert` literal bytes, then moves the source cursor by `seek`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    /// Bytes produced as source plus delta
    pub add: u32,
    /// Bytes copied verbatim from the extra block
    pub insert: u32,
    /// Signed move of the source cursor
    pub seek: i64,
}

impl Control {
    /// Size of a serialized triple
    pub const SIZE: usize = 12;

    /// Create a triple; the seek magnitude must fit in 31 bits
    pub fn new(add: u32, insert: u32, seek: i64) -> Result<Self> {
        if seek.unsigned_abs() >= u64::from(SEEK_NEGATIVE) {
            return Err(Error::InputTooLarge(seek.unsigned_abs() as usize));
        }
        Ok(Self { add, insert, seek })
    }

    fn encode_seek(seek: i64) -> u32 {
        let magnitude = seek.unsigned_abs() as u32;
        if seek < 0 {
            magnitude | SEEK_NEGATIVE
        } else {
            magnitude
        }
    }

    fn decode_seek(raw: u32) -> i64 {
        let magnitude = i64::from(raw & !SEEK_NEGATIVE);
        if raw & SEEK_NEGATIVE != 0 {
            -magnitude
        } else {
            magnitude
        }
    }
}

/// A complete patch: envelope, control triples and the encoded blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchArtifact {
    header: PatchHeader,
    controls: Vec<Control>,
    control_block: Vec<u8>,
    diff_block: Vec<u8>,
    extra_block: Vec<u8>,
}

impl PatchArtifact {
    /// Assemble an artifact, encoding the triples and the raw delta and
    /// extra bytes with the header's codec
    pub(crate) fn from_parts(
        header: PatchHeader,
        controls: Vec<Control>,
        delta: &[u8],
        extra: &[u8],
    ) -> Result<Self> {
        let mut raw = Vec::with_capacity(controls.len() * Control::SIZE);
        for control in &controls {
            raw.extend_from_slice(&control.add.to_le_bytes());
            raw.extend_from_slice(&control.insert.to_le_bytes());
            raw.extend_from_slice(&Control::encode_seek(control.seek).to_le_bytes());
        }

        let codec = header.codec;
        Ok(Self {
            control_block: codec.compress(&raw)?,
            diff_block: codec.compress(delta)?,
            extra_block: codec.compress(extra)?,
            header,
            controls,
        })
    }

    /// Parse an artifact from its serialized form
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < PatchHeader::SIZE {
            return Err(Error::malformed(format!(
                "artifact too small: {} bytes, need at least {}",
                data.len(),
                PatchHeader::SIZE
            )));
        }

        let mut reader = Cursor::new(data);
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != PATCH_SIGNATURE {
            return Err(Error::malformed(format!(
                "invalid signature {:02X?}",
                magic
            )));
        }

        let version = reader.read_u16::<LittleEndian>()?;
        if version != PatchHeader::VERSION {
            return Err(Error::UnsupportedVersion(version));
        }
        let codec_id = reader.read_u16::<LittleEndian>()?;
        let codec = BlockCodec::from_id(codec_id)
            .ok_or_else(|| Error::malformed(format!("unknown block codec {}", codec_id)))?;

        let source_len = reader.read_u32::<LittleEndian>()?;
        let target_len = reader.read_u32::<LittleEndian>()?;
        let mut source_md5 = [0u8; 16];
        reader.read_exact(&mut source_md5)?;
        let mut target_md5 = [0u8; 16];
        reader.read_exact(&mut target_md5)?;

        let control_count = reader.read_u32::<LittleEndian>()? as usize;
        let control_size = reader.read_u32::<LittleEndian>()? as usize;
        let diff_size = reader.read_u32::<LittleEndian>()? as usize;
        let extra_size = reader.read_u32::<LittleEndian>()? as usize;

        // Every triple but the last advances the target by at least one byte
        if control_count > target_len as usize + 1 {
            return Err(Error::malformed(format!(
                "{} control triples for a {} byte target",
                control_count, target_len
            )));
        }
        let declared = PatchHeader::SIZE + control_size + diff_size + extra_size;
        if declared != data.len() {
            return Err(Error::malformed(format!(
                "blocks declare {} bytes, artifact has {}",
                declared,
                data.len()
            )));
        }

        log::debug!(
            "Patch header: source={} bytes ({}), target={} bytes ({}), {} blocks",
            source_len,
            hex::encode(source_md5),
            target_len,
            hex::encode(target_md5),
            codec
        );

        let blocks = &data[PatchHeader::SIZE..];
        let (control_block, blocks) = blocks.split_at(control_size);
        let (diff_block, extra_block) = blocks.split_at(diff_size);

        let raw = codec.decompress(control_block, control_count * Control::SIZE, "control")?;
        let controls = raw
            .chunks_exact(Control::SIZE)
            .map(|triple| Control {
                add: LittleEndian::read_u32(&triple[0..4]),
                insert: LittleEndian::read_u32(&triple[4..8]),
                seek: Control::decode_seek(LittleEndian::read_u32(&triple[8..12])),
            })
            .collect();

        Ok(Self {
            header: PatchHeader {
                version,
                codec,
                source_len,
                target_len,
                source_md5,
                target_md5,
            },
            controls,
            control_block: control_block.to_vec(),
            diff_block: diff_block.to_vec(),
            extra_block: extra_block.to_vec(),
        })
    }

    /// Serialize the artifact
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());

        out.extend_from_slice(&PATCH_SIGNATURE);
        out.extend_from_slice(&self.header.version.to_le_bytes());
        out.extend_from_slice(&self.header.codec.id().to_le_bytes());
        out.extend_from_slice(&self.header.source_len.to_le_bytes());
        out.extend_from_slice(&self.header.target_len.to_le_bytes());
        out.extend_from_slice(&self.header.source_md5);
        out.extend_from_slice(&self.header.target_md5);
        out.extend_from_slice(&(self.controls.len() as u32).to_le_bytes());
        out.extend_from_slice(&(self.control_block.len() as u32).to_le_bytes());
        out.extend_from_slice(&(self.diff_block.len() as u32).to_le_bytes());
        out.extend_from_slice(&(self.extra_block.len() as u32).to_le_bytes());

        out.extend_from_slice(&self.control_block);
        out.extend_from_slice(&self.diff_block);
        out.extend_from_slice(&self.extra_block);
        out
    }

    /// Read and parse an artifact file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    /// Write the serialized artifact to `path`
    ///
    /// The bytes go to a temporary file beside `path` that replaces it only
    /// once fully written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(dir)?;
        temp_file.write_all(&self.to_bytes())?;
        temp_file.flush()?;
        temp_file.persist(path).map_err(|e| Error::Io(e.error))?;
        log::debug!("Saved patch to {}", path.display());
        Ok(())
    }

    /// Check that `source` is the image this patch was built against
    pub fn verify_source(&self, source: &[u8]) -> Result<()> {
        let actual = md5_digest(source);
        if source.len() != self.header.source_len as usize || actual != self.header.source_md5 {
            log::debug!(
                "Source rejected: {} bytes, expected {}",
                source.len(),
                self.header.source_len
            );
            return Err(Error::SourceMismatch {
                expected: hex::encode(self.header.source_md5),
                actual: hex::encode(actual),
            });
        }
        Ok(())
    }

    /// Check that `target` is the image this patch produces
    pub fn verify_target(&self, target: &[u8]) -> Result<()> {
        let actual = md5_digest(target);
        if actual != self.header.target_md5 {
            return Err(Error::TargetMismatch {
                expected: hex::encode(self.header.target_md5),
                actual: hex::encode(actual),
            });
        }
        Ok(())
    }

    /// Envelope fields
    pub fn header(&self) -> &PatchHeader {
        &self.header
    }

    /// MD5 of the image the patch applies to
    pub fn source_md5(&self) -> [u8; 16] {
        self.header.source_md5
    }

    /// MD5 of the image the patch produces
    pub fn target_md5(&self) -> [u8; 16] {
        self.header.target_md5
    }

    /// Length of the image the patch applies to
    pub fn source_len(&self) -> usize {
        self.header.source_len as usize
    }

    /// Length of the image the patch produces
    pub fn target_len(&self) -> usize {
        self.header.target_len as usize
    }

    /// Number of control triples
    pub fn control_len(&self) -> usize {
        self.controls.len()
    }

    /// Control triples in replay order
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Size of the serialized artifact
    pub fn encoded_len(&self) -> usize {
        PatchHeader::SIZE + self.control_block.len() + self.diff_block.len() + self.extra_block.len()
    }

    /// Total of `field` over all triples, as a decoded block length
    fn block_len(&self, field: fn(&Control) -> u32, name: &str) -> Result<usize> {
        let total: u64 = self.controls.iter().map(|c| u64::from(field(c))).sum();
        usize::try_from(total)
            .map_err(|_| Error::malformed(format!("{} block of {} bytes", name, total)))
    }

    /// Decode the delta block
    pub(crate) fn delta(&self) -> Result<Vec<u8>> {
        let len = self.block_len(|c| c.add, "diff")?;
        self.header.codec.decompress(&self.diff_block, len, "diff")
    }

    /// Decode the extra block
    pub(crate) fn extra(&self) -> Result<Vec<u8>> {
        let len = self.block_len(|c| c.insert, "extra")?;
        self.header.codec.decompress(&self.extra_block, len, "extra")
    }
}
