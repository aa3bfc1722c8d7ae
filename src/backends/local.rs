use std::fs;
use std::io::{ErrorKind, Read};
use std::path::Path;

use super::{EtagError, SourceBackend};

/// Local filesystem backend implementation
pub struct LocalBackend;

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }
}

/// The reported length is taken from the opened handle's metadata, not a
/// separate `stat` of the path.
impl SourceBackend for LocalBackend {
    fn open(&self, path: &Path) -> Result<(Box<dyn Read + Send>, u64), EtagError> {
        let file = fs::File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => EtagError::NotFound(path.display().to_string()),
            _ => EtagError::Io(e),
        })?;
        let metadata = file.metadata()?;
        if metadata.is_dir() {
            return Err(EtagError::Other(format!("{} is a directory", path.display())));
        }
        Ok((Box::new(file), metadata.len()))
    }
}
