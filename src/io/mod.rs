mod local;

pub use local::LocalFileReader;

use std::io::Read;

use anyhow::Result;

/// Path that stands for standard input
pub const STDIN_PATH: &str = "-";

/// Open an export for reading: a local file, or stdin for [`STDIN_PATH`].
pub fn open_input(path: &str) -> Result<Box<dyn Read + Send>> {
    if path == STDIN_PATH {
        Ok(Box::new(std::io::stdin()))
    } else {
        Ok(Box::new(LocalFileReader::new(std::path::Path::new(path))?))
    }
}
