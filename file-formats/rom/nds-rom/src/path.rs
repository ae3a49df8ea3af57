//! Asset paths and nested container resolution
//!
//! An asset path such as `poketool/personal/pl_personal.narc/25` names a
//! file of the cartridge filesystem followed by zero or more entries of
//! nested NARC archives. Each archive segment is matched against entry names
//! first and falls back to a decimal index. An archive stored LZ-compressed
//! is decoded and descended, but everything below it is read-only since its
//! bytes no longer map onto the image.

use crate::fs::RomFs;
use crate::{Error, Result};
use nds_narc::{Narc, is_narc};
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// A `/`-separated path into the cartridge filesystem and nested archives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct AssetPath {
    segments: Vec<String>,
}

impl AssetPath {
    /// Parse a path, ignoring one leading `/`
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        if trimmed.is_empty() {
            return Err(Error::InvalidPath("empty path".to_string()));
        }

        let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(Error::InvalidPath(format!("empty segment in '{}'", path)));
        }
        Ok(Self { segments })
    }

    /// Path segments in order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn join(segments: &[String]) -> String {
        segments.join("/")
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::join(&self.segments))
    }
}

impl FromStr for AssetPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AssetPath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<AssetPath> for String {
    fn from(path: AssetPath) -> Self {
        path.to_string()
    }
}

/// Bytes of a resolved path
///
/// `span` is the absolute range in the image, or `None` when the entry was
/// reached through a compressed layer.
#[derive(Debug, Clone)]
pub struct ResolvedEntry<'a> {
    data: Cow<'a, [u8]>,
    span: Option<Range<usize>>,
}

impl ResolvedEntry<'_> {
    /// Entry contents
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Entry length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the entry is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Absolute range in the image, if the entry can be written in place
    pub fn span(&self) -> Option<Range<usize>> {
        self.span.clone()
    }

    /// Whether the entry was decoded from a compressed layer
    pub fn is_compressed(&self) -> bool {
        self.span.is_none()
    }
}

/// An archive opened at a resolved path
#[derive(Debug, Clone)]
pub struct LocatedContainer<'a> {
    narc: Narc<'a>,
    origin: Option<usize>,
}

impl<'a> LocatedContainer<'a> {
    /// The opened archive
    pub fn narc(&self) -> &Narc<'a> {
        &self.narc
    }

    /// Absolute offset of the archive in the image, unless it was decoded
    pub fn offset(&self) -> Option<usize> {
        self.origin
    }

    /// Absolute range of entry `index` in the image, unless the archive was decoded
    pub fn entry_span(&self, index: usize) -> Result<Option<Range<usize>>> {
        let range = self.narc.entry_range(index)?;
        Ok(self
            .origin
            .map(|origin| origin + range.start..origin + range.end))
    }

    /// Release the archive handle
    pub fn into_narc(self) -> Narc<'a> {
        self.narc
    }
}

/// Open `data` as an archive, decoding one compression layer if needed
fn open_container<'a>(
    data: Cow<'a, [u8]>,
    origin: Option<usize>,
    path: &str,
) -> Result<LocatedContainer<'a>> {
    if is_narc(&data) {
        let narc = match data {
            Cow::Borrowed(slice) => Narc::open(slice)?,
            Cow::Owned(bytes) => Narc::from_owned(bytes)?,
        };
        return Ok(LocatedContainer { narc, origin });
    }

    // A raw file may start with a codec tag by chance
    if nds_lz::detect(&data).is_some() {
        let decoded = nds_lz::decompress(&data).map_err(|e| {
            log::debug!("{} is not an LZ block: {}", path, e);
            Error::NotAContainer(path.to_string())
        })?;
        if is_narc(&decoded) {
            log::debug!(
                "Descending into compressed archive {} ({} -> {} bytes)",
                path,
                data.len(),
                decoded.len()
            );
            return Ok(LocatedContainer {
                narc: Narc::from_owned(decoded)?,
                origin: None,
            });
        }
    }

    Err(Error::NotAContainer(path.to_string()))
}

/// Walk `path` through the filesystem and nested archives
pub(crate) fn resolve<'a>(
    image: &'a [u8],
    fs: &RomFs<'a>,
    path: &AssetPath,
) -> Result<ResolvedEntry<'a>> {
    let segments = path.segments();

    // The filesystem part ends at the first prefix naming a file
    let (id, consumed) = (1..=segments.len())
        .find_map(|k| {
            fs.file_id(&AssetPath::join(&segments[..k]))
                .map(|id| (id, k))
        })
        .ok_or_else(|| Error::PathNotFound(path.to_string()))?;

    let range = fs.file_range(id)?;
    let mut data = Cow::Borrowed(&image[range.clone()]);
    let mut span = Some(range);
    let mut rest = &segments[consumed..];

    while !rest.is_empty() {
        let walked = AssetPath::join(&segments[..segments.len() - rest.len()]);
        let origin = span.as_ref().map(|range| range.start);
        let container = open_container(data, origin, &walked)?;
        let narc = container.narc();

        let named = (1..=rest.len()).find_map(|k| {
            narc.index_of(&AssetPath::join(&rest[..k]))
                .map(|index| (index, k))
        });
        let (index, taken) = match named {
            Some(found) => found,
            None => match rest[0].parse::<usize>() {
                Ok(index) if index < narc.len() => (index, 1),
                _ => {
                    return Err(Error::PathNotFound(format!(
                        "{} (no entry '{}' in {})",
                        path, rest[0], walked
                    )));
                }
            },
        };

        let entry = narc.entry_range(index)?;
        match container.origin {
            Some(origin) => {
                let absolute = origin + entry.start..origin + entry.end;
                data = Cow::Borrowed(&image[absolute.clone()]);
                span = Some(absolute);
            }
            None => {
                data = Cow::Owned(narc.as_bytes()[entry].to_vec());
                span = None;
            }
        }
        rest = &rest[taken..];
    }

    Ok(ResolvedEntry { data, span })
}

/// Resolve `path` and open the result as an archive
pub(crate) fn locate<'a>(
    image: &'a [u8],
    fs: &RomFs<'a>,
    path: &AssetPath,
) -> Result<LocatedContainer<'a>> {
    let resolved = resolve(image, fs, path)?;
    let origin = resolved.span.as_ref().map(|range| range.start);
    open_container(resolved.data, origin, &path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_segments() {
        let path = AssetPath::parse("/a/b.narc/12").unwrap();
        assert_eq!(path.segments(), &["a", "b.narc", "12"]);
        assert_eq!(path.to_string(), "a/b.narc/12");
        assert_eq!("x".parse::<AssetPath>().unwrap().segments(), &["x"]);
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(AssetPath::parse("").is_err());
        assert!(AssetPath::parse("/").is_err());
        assert!(matches!(
            AssetPath::parse("a//b"),
            Err(Error::InvalidPath(_))
        ));
        assert!(AssetPath::parse("a/").is_err());
    }
}
