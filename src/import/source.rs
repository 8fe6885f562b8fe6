//! Byte sources a decoder reads from.
//!
//! Every read pass opens a fresh stream, so the row-count pre-scan and the
//! decode pass never share a position. File sources beginning with the gzip
//! magic are decompressed transparently.

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Something that can be opened for reading, possibly many times.
pub trait ByteSource {
    /// Open a new stream positioned at the start of the data.
    fn open(&self) -> io::Result<Box<dyn Read + '_>>;

    /// Name used in logs, placeholders and column comments.
    fn label(&self) -> String;
}

/// A file on disk, optionally gzip-compressed.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let compressed = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
        if compressed {
            tracing::debug!("{}: gzip compressed", self.path.display());
            Ok(Box::new(MultiGzDecoder::new(reader)))
        } else {
            Ok(Box::new(reader))
        }
    }

    fn label(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory bytes.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    bytes: Vec<u8>,
    label: String,
}

impl MemorySource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            label: "memory".to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl ByteSource for MemorySource {
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.bytes.as_slice()))
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

/// Read and discard up to `count` bytes; returns how many were skipped.
pub(crate) fn skip_bytes(reader: &mut dyn Read, count: u64) -> io::Result<u64> {
    io::copy(&mut reader.take(count), &mut io::sink())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn read_all(source: &dyn ByteSource) -> Vec<u8> {
        let mut out = Vec::new();
        source.open().unwrap().read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_plain_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"1,2\n3,4\n").unwrap();
        let source = FileSource::new(file.path());
        assert_eq!(read_all(&source), b"1,2\n3,4\n");
        // A second pass starts from the beginning again
        assert_eq!(read_all(&source), b"1,2\n3,4\n");
    }

    #[test]
    fn test_gzip_file_is_decompressed() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[1, 2, 3, 4]).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&compressed).unwrap();
        assert_eq!(read_all(&FileSource::new(file.path())), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_missing_file_fails_to_open() {
        let source = FileSource::new("/nonexistent/labflow/data.bin");
        assert!(source.open().is_err());
    }

    #[test]
    fn test_skip_bytes_stops_at_end() {
        let source = MemorySource::new(vec![0u8; 4]);
        let mut reader = source.open().unwrap();
        assert_eq!(skip_bytes(&mut reader, 10).unwrap(), 4);
    }
}
