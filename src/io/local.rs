use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Unbuffered local export file. The parsers add their own `BufReader`.
pub struct LocalFileReader {
    file: File,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open '{}'", path.display()))?;
        let size = file.metadata()?.len();
        tracing::debug!(path = %path.display(), size, "Opened export file");
        Ok(Self { file })
    }
}

impl Read for LocalFileReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.file.read(buf)
    }
}
