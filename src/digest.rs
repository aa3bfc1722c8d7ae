use sha1::{Digest, Sha1};

use crate::backends::EtagError;

/// Length in bytes of one SHA-1 digest.
pub const DIGEST_LEN: usize = 20;

pub type BlockDigest = [u8; DIGEST_LEN];

/// The SHA-1 primitive used for both block digests and the final digest.
pub trait BlockHasher {
    fn sha1(&self, data: &[u8]) -> Result<BlockDigest, EtagError>;
}

/// RustCrypto SHA-1.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha1Hasher;

impl BlockHasher for Sha1Hasher {
    fn sha1(&self, data: &[u8]) -> Result<BlockDigest, EtagError> {
        Ok(Sha1::digest(data).into())
    }
}
