pub mod local;

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Failure of an Etag computation or of the backend feeding it.
#[derive(Debug)]
pub enum EtagError {
    /// Opening or reading the source failed.
    Io(std::io::Error),
    /// The source ran dry before the declared length was consumed.
    ShortRead {
        block: u64,
        expected: usize,
        actual: usize,
    },
    /// The SHA-1 primitive itself failed.
    Digest(String),
    NotFound(String),
    Other(String),
}

impl EtagError {
    pub fn is_read_failure(&self) -> bool {
        matches!(
            self,
            EtagError::Io(_) | EtagError::ShortRead { .. } | EtagError::NotFound(_)
        )
    }

    pub fn is_digest_failure(&self) -> bool {
        matches!(self, EtagError::Digest(_))
    }
}

impl From<std::io::Error> for EtagError {
    fn from(e: std::io::Error) -> Self {
        EtagError::Io(e)
    }
}

impl fmt::Display for EtagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtagError::Io(e) => write!(f, "read failed: {}", e),
            EtagError::ShortRead {
                block,
                expected,
                actual,
            } => write!(
                f,
                "short read in block {}: expected {} bytes, got {}",
                block, expected, actual
            ),
            EtagError::Digest(msg) => write!(f, "sha1 failed: {}", msg),
            EtagError::NotFound(path) => write!(f, "not found: {}", path),
            EtagError::Other(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for EtagError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EtagError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// A byte source the Etag core can consume: a sequential reader plus the
/// exact number of bytes it is expected to yield.
pub trait SourceBackend: Send + Sync {
    fn open(&self, path: &Path) -> Result<(Box<dyn Read + Send>, u64), EtagError>;
}

pub use local::LocalBackend;

/// Given a protocol-prefixed path, returns (backend, normalized_path).
/// Example: "file:///tmp/foo" -> (LocalBackend, "/tmp/foo")
pub fn backend_and_path(url: &str) -> Result<(Arc<dyn SourceBackend>, &Path), EtagError> {
    if let Some(idx) = url.find("://") {
        let (proto, rest) = url.split_at(idx);
        let path = &rest[3..];
        match proto {
            "file" => Ok((Arc::new(LocalBackend::new()), Path::new(path))),
            _ => Err(EtagError::Other(format!("Unsupported protocol: {}", proto))),
        }
    } else {
        // Default to local file if no protocol specified
        Ok((Arc::new(LocalBackend::new()), Path::new(url)))
    }
}
