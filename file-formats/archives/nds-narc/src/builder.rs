//! NARC archive writer

use crate::fnt::FileNameTable;
use crate::narc::{BYTE_ORDER_MARK, CHUNK_HEADER_SIZE, HEADER_SIZE, Narc, VERSION, signatures};
use crate::{Error, Result};

/// Fill byte for chunk and entry alignment
const PADDING: u8 = 0xFF;

#[derive(Debug, Clone)]
struct PendingEntry {
    name: Option<String>,
    data: Vec<u8>,
}

/// Builder for creating NARC archives
///
/// Entries keep the order they were added in. Either every entry carries a
/// name or none does.
#[derive(Debug, Clone, Default)]
pub struct NarcBuilder {
    entries: Vec<PendingEntry>,
}

impl NarcBuilder {
    /// Create a new archive builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the entries and names of an existing archive
    pub fn from_narc(narc: &Narc<'_>) -> Self {
        let entries = narc
            .entries()
            .enumerate()
            .map(|(index, data)| PendingEntry {
                name: narc.name(index).map(str::to_string),
                data: data.to_vec(),
            })
            .collect();
        Self { entries }
    }

    /// Append an unnamed entry
    pub fn add_entry<D: Into<Vec<u8>>>(mut self, data: D) -> Self {
        self.entries.push(PendingEntry {
            name: None,
            data: data.into(),
        });
        self
    }

    /// Append a named entry; `/` separates directory names
    pub fn add_named_entry<D: Into<Vec<u8>>>(mut self, name: &str, data: D) -> Self {
        self.entries.push(PendingEntry {
            name: Some(name.to_string()),
            data: data.into(),
        });
        self
    }

    /// Replace the payload of entry `index`, keeping its name
    pub fn replace_entry<D: Into<Vec<u8>>>(mut self, index: usize, data: D) -> Result<Self> {
        let count = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, count })?;
        entry.data = data.into();
        Ok(self)
    }

    /// Number of entries added so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries have been added
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the archive
    pub fn build(self) -> Result<Vec<u8>> {
        let count = self.entries.len();
        let count16 = u16::try_from(count)
            .map_err(|_| Error::TooLarge(format!("{} entries exceed 65535", count)))?;

        let mut fnt = self.name_table()?.to_bytes();
        pad_to_word(&mut fnt);

        let mut image = Vec::new();
        let mut ranges = Vec::with_capacity(count);
        for entry in &self.entries {
            let start = image.len();
            image.extend_from_slice(&entry.data);
            ranges.push((start, image.len()));
            pad_to_word(&mut image);
        }

        let btaf_size = CHUNK_HEADER_SIZE + 4 + 8 * count;
        let btnf_size = CHUNK_HEADER_SIZE + fnt.len();
        let gmif_size = CHUNK_HEADER_SIZE + image.len();
        let total = HEADER_SIZE + btaf_size + btnf_size + gmif_size;
        let total32 = u32::try_from(total)
            .map_err(|_| Error::TooLarge(format!("archive of {} bytes", total)))?;

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&signatures::NARC);
        out.extend_from_slice(&BYTE_ORDER_MARK.to_le_bytes());
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&total32.to_le_bytes());
        out.extend_from_slice(&(HEADER_SIZE as u16).to_le_bytes());
        out.extend_from_slice(&3u16.to_le_bytes());

        out.extend_from_slice(&signatures::BTAF);
        out.extend_from_slice(&(btaf_size as u32).to_le_bytes());
        out.extend_from_slice(&count16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        for (start, end) in ranges {
            out.extend_from_slice(&(start as u32).to_le_bytes());
            out.extend_from_slice(&(end as u32).to_le_bytes());
        }

        out.extend_from_slice(&signatures::BTNF);
        out.extend_from_slice(&(btnf_size as u32).to_le_bytes());
        out.extend_from_slice(&fnt);

        out.extend_from_slice(&signatures::GMIF);
        out.extend_from_slice(&(gmif_size as u32).to_le_bytes());
        out.extend_from_slice(&image);

        log::debug!("Built NARC: {} entries, {} bytes", count, out.len());
        Ok(out)
    }

    fn name_table(&self) -> Result<FileNameTable> {
        let names: Vec<&str> = self
            .entries
            .iter()
            .filter_map(|entry| entry.name.as_deref())
            .collect();

        if names.is_empty() {
            Ok(FileNameTable::default())
        } else if names.len() == self.entries.len() {
            FileNameTable::build(&names, 0)
        } else {
            Err(Error::invalid_name(format!(
                "{} of {} entries are named; name all entries or none",
                names.len(),
                self.entries.len()
            )))
        }
    }
}

fn pad_to_word(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(PADDING);
    }
}

/// Build an archive from `(name, payload)` pairs in order
pub fn build<I, N, D>(entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (Option<N>, D)>,
    N: AsRef<str>,
    D: Into<Vec<u8>>,
{
    entries
        .into_iter()
        .fold(NarcBuilder::new(), |builder, (name, data)| match name {
            Some(name) => builder.add_named_entry(name.as_ref(), data),
            None => builder.add_entry(data),
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_archive_layout() {
        let data = NarcBuilder::new().build().unwrap();
        assert_eq!(
            data,
            vec![
                b'N', b'A', b'R', b'C', 0xFE, 0xFF, 0x00, 0x01, 52, 0, 0, 0, 16, 0, 3, 0, //
                b'B', b'T', b'A', b'F', 12, 0, 0, 0, 0, 0, 0, 0, //
                b'B', b'T', b'N', b'F', 16, 0, 0, 0, 4, 0, 0, 0, 0, 0, 1, 0, //
                b'G', b'M', b'I', b'F', 8, 0, 0, 0,
            ]
        );
    }

    #[test]
    fn test_entries_are_word_aligned() {
        let data = NarcBuilder::new()
            .add_entry(vec![1])
            .add_entry(vec![2, 2, 2, 2, 2])
            .build()
            .unwrap();
        let narc = Narc::open(&data).unwrap();
        let first = narc.entry_range(0).unwrap();
        let second = narc.entry_range(1).unwrap();
        assert_eq!(second.start - first.start, 4);
        assert_eq!(data[first.end], PADDING);
    }

    #[test]
    fn test_mixed_names_rejected() {
        let err = NarcBuilder::new()
            .add_named_entry("a", vec![1])
            .add_entry(vec![2])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));
    }

    #[test]
    fn test_replace_entry() {
        let builder = NarcBuilder::new()
            .add_named_entry("a", vec![1])
            .add_named_entry("b", vec![2]);
        let data = builder.replace_entry(1, vec![7, 7]).unwrap().build().unwrap();
        let narc = Narc::open(&data).unwrap();
        assert_eq!(narc.entry_by_name("b").unwrap(), &[7, 7]);

        assert!(NarcBuilder::new().replace_entry(0, vec![1]).is_err());
    }

    #[test]
    fn test_from_narc_preserves_names() {
        let data = build([(Some("x/one"), vec![1u8]), (Some("x/two"), vec![2u8])]).unwrap();
        let narc = Narc::open(&data).unwrap();
        let rebuilt = NarcBuilder::from_narc(&narc).build().unwrap();
        assert_eq!(rebuilt, data);
    }
}
