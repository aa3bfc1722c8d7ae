//! Block-hashed Etag computation.
//!
//! A file is cut into 4 MiB blocks. A file of at most one block is tagged
//! `0x16 ++ sha1(content)`; anything longer is tagged
//! `0x96 ++ sha1(sha1(block_0) ++ sha1(block_1) ++ ...)`. The 21-byte result is
//! URL-safe Base64 encoded. Block size, prefix bytes and the empty-file
//! constant are fixed by the storage protocol.

use std::fmt;
use std::io::{ErrorKind, Read};

use log::debug;

use crate::backends::EtagError;
use crate::digest::{BlockHasher, Sha1Hasher, DIGEST_LEN};
use crate::encoding::urlsafe_encode;

/// Upload block size: 4 MiB.
pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Etag of a zero-length file. Returned as-is, nothing is read or hashed.
pub const EMPTY_ETAG: &str = "Fto5o-5ea0sNMlW_75VgGJCv2AcJ";

pub const SINGLE_BLOCK_PREFIX: u8 = 0x16;
pub const MULTI_BLOCK_PREFIX: u8 = 0x96;

/// Encoded Etag text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Etag(String);

impl Etag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether this tag carries the multi-block prefix.
    pub fn is_multi_block(&self) -> bool {
        // 0x96 encodes to a leading 'l', 0x16 to 'F'.
        self.0.starts_with('l')
    }
}

impl fmt::Display for Etag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Etag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Etag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Etag {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Number of blocks covering `len` bytes, `ceil(len / BLOCK_SIZE)`.
pub fn block_count(len: u64) -> u64 {
    len.div_ceil(BLOCK_SIZE as u64)
}

/// Compute the Etag of the next `len` bytes of `reader` with SHA-1.
pub fn compute_etag<R: Read + ?Sized>(reader: &mut R, len: u64) -> Result<Etag, EtagError> {
    compute_etag_with(&Sha1Hasher, reader, len)
}

/// Same as [`compute_etag`] with an explicit SHA-1 primitive.
///
/// Exactly `len` bytes are consumed, in order. If the reader fails or runs
/// out early the whole computation fails; no partial tag is ever produced.
pub fn compute_etag_with<H, R>(hasher: &H, reader: &mut R, len: u64) -> Result<Etag, EtagError>
where
    H: BlockHasher + ?Sized,
    R: Read + ?Sized,
{
    if len == 0 {
        return Ok(Etag(EMPTY_ETAG.to_string()));
    }

    let blocks = block_count(len);
    let mut buf = vec![0u8; len.min(BLOCK_SIZE as u64) as usize];
    let mut combined = Vec::with_capacity(1 + DIGEST_LEN);

    if blocks <= 1 {
        read_block(reader, &mut buf, 0)?;
        combined.push(SINGLE_BLOCK_PREFIX);
        combined.extend_from_slice(&hasher.sha1(&buf)?);
    } else {
        let mut digests = Vec::with_capacity(blocks as usize * DIGEST_LEN);
        let mut remaining = len;
        for block in 0..blocks {
            let size = remaining.min(BLOCK_SIZE as u64) as usize;
            let chunk = &mut buf[..size];
            read_block(reader, chunk, block)?;
            digests.extend_from_slice(&hasher.sha1(chunk)?);
            remaining -= size as u64;
            debug!("block {}/{}: {} bytes", block + 1, blocks, size);
        }
        combined.push(MULTI_BLOCK_PREFIX);
        combined.extend_from_slice(&hasher.sha1(&digests)?);
    }

    Ok(Etag(urlsafe_encode(&combined)))
}

/// Fill `buf` completely or fail with `ShortRead`.
fn read_block<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8], block: u64) -> Result<(), EtagError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(EtagError::ShortRead {
                    block,
                    expected: buf.len(),
                    actual: filled,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(EtagError::Io(e)),
        }
    }
    Ok(())
}
