//! # nds_patch - whole-image binary patches
//!
//! Builds and applies bsdiff-style patches between two cartridge images. A
//! patch records the length and MD5 of both images, so applying it to any
//! image other than its baseline fails before a single byte is produced.
//!
//! ## Patch format
//!
//! A patch is a sequence of control triples `(add, insert, seek)` plus two
//! data blocks: the delta between matching regions and the literal bytes
//! with no counterpart in the source. All three are bzip2-compressed. See
//! [`artifact`] for the envelope layout.
//!
//! ## Examples
//!
//! ```
//! use nds_patch::{apply, diff};
//!
//! # fn main() -> Result<(), nds_patch::Error> {
//! let source = b"original cartridge image".to_vec();
//! let target = b"modified cartridge image".to_vec();
//!
//! let artifact = diff(&source, &target)?;
//! assert_eq!(apply(&artifact, &source)?, target);
//!
//! // Any other image is rejected
//! assert!(apply(&artifact, b"some other cartridge img").is_err());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

mod apply;
pub mod artifact;
mod codec;
mod diff;
pub mod error;
mod set;
mod suffix;

pub use apply::apply;
pub use artifact::{Control, PatchArtifact, PatchHeader};
pub use codec::BlockCodec;
pub use diff::diff;
pub use error::{Error, Result};
pub use set::PatchSet;
pub use suffix::suffix_array;

/// MD5 digest of `data`
pub fn md5_digest(data: &[u8]) -> [u8; 16] {
    use md5::{Digest, Md5};

    let mut hasher = Md5::new();
    hasher.update(data);
    hasher.finalize().into()
}
