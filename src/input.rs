//! Input text seam.
//!
//! The pipeline reads source text through the [`TextReader`] trait so rich
//! format readers (docx, pdf, csv) can live outside the core. The default
//! implementation handles the plain text/log files the CLI accepts.

use std::path::Path;

use anyhow::{Context, Result};
use log::warn;

/// Supplies the source text for one run.
pub trait TextReader: Send + Sync {
    /// Reads the full text content of `path`.
    fn read_text(&self, path: &Path) -> Result<String>;
}

/// Reads plain-text evidence files (txt, log).
///
/// Forensic exports frequently carry stray non-UTF-8 bytes; those are
/// decoded lossily rather than failing the run.
pub struct PlainTextReader;

impl TextReader for PlainTextReader {
    fn read_text(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!("{} is not valid UTF-8; decoding lossily", path.display());
                let bytes = e.into_bytes();
                String::from_utf8_lossy(&bytes).into_owned()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_utf8_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "connection from 8.8.8.8 at 10:30").unwrap();
        let text = PlainTextReader.read_text(file.path()).unwrap();
        assert_eq!(text, "connection from 8.8.8.8 at 10:30");
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ip: 8.8.8.8 \xff\xfe end").unwrap();
        let text = PlainTextReader.read_text(file.path()).unwrap();
        assert!(text.starts_with("ip: 8.8.8.8 "));
        assert!(text.ends_with(" end"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = PlainTextReader.read_text(Path::new("/nonexistent/evidence.txt"));
        assert!(result.is_err());
    }
}
