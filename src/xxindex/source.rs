//! Byte sources the indexer and the extractor read from.
//!
//! A [`ByteSource`] hands out fresh readers over the same bytes, one per
//! operation, so concurrent extractions never share a handle. Sources that
//! support seeking say so through [`ByteSource::open_seekable`]; the rest are
//! positioned by reading and discarding from the start.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, trace};

use super::codec::compression::{check_gzip_magic, gzip_reader};
use super::types::error::{Result, XxIndexError};

/// A reader that can also seek.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Capability to read the same byte sequence any number of times.
pub trait ByteSource: fmt::Debug + Send + Sync {
    /// Short description used in log and error messages.
    fn name(&self) -> String;

    /// Opens a new reader positioned at offset zero.
    fn open(&self) -> Result<Box<dyn Read + Send>>;

    /// Opens a new seekable reader, or `None` if the source cannot seek.
    fn open_seekable(&self) -> Result<Option<Box<dyn ReadSeek>>> {
        Ok(None)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        (**self).open()
    }

    fn open_seekable(&self) -> Result<Option<Box<dyn ReadSeek>>> {
        (**self).open_seekable()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Arc<S> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        (**self).open()
    }

    fn open_seekable(&self) -> Result<Option<Box<dyn ReadSeek>>> {
        (**self).open_seekable()
    }
}

/// An uncompressed file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(BufReader::new(File::open(&self.path)?)))
    }

    fn open_seekable(&self) -> Result<Option<Box<dyn ReadSeek>>> {
        Ok(Some(Box::new(File::open(&self.path)?)))
    }
}

/// A gzip-compressed file, read through a decompressing stream.
///
/// Offsets refer to the decompressed bytes. The source cannot seek.
#[derive(Debug, Clone)]
pub struct GzFileSource {
    path: PathBuf,
}

impl GzFileSource {
    /// Creates the source after checking that the file is gzip compressed.
    ///
    /// # Errors
    /// `Io` if the file cannot be opened, `SourceFormatMismatch` if it does
    /// not start with the gzip magic number.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        check_gzip_magic(File::open(path)?, &path.display().to_string())?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for GzFileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        let file = BufReader::new(File::open(&self.path)?);
        Ok(Box::new(gzip_reader(file)))
    }
}

/// Bytes held in memory.
#[derive(Clone)]
pub struct MemorySource {
    data: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySource")
            .field("len", &self.data.len())
            .finish()
    }
}

impl ByteSource for MemorySource {
    fn name(&self) -> String {
        format!("<{} bytes in memory>", self.data.len())
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(Arc::clone(&self.data))))
    }

    fn open_seekable(&self) -> Result<Option<Box<dyn ReadSeek>>> {
        Ok(Some(Box::new(Cursor::new(Arc::clone(&self.data)))))
    }
}

/// Picks the source for a path: gzip when the file name ends in `.gz`, plain otherwise.
pub fn source_for_path(path: impl AsRef<Path>) -> Result<Box<dyn ByteSource>> {
    let path = path.as_ref();
    let compressed = path
        .file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.ends_with(".gz"));
    if compressed {
        debug!("Reading {} as gzip", path.display());
        Ok(Box::new(GzFileSource::new(path)?))
    } else {
        Ok(Box::new(FileSource::new(path)))
    }
}

/// Opens `source` positioned at `offset`.
///
/// Seekable sources seek directly. Others are read from the start and the
/// first `offset` bytes are discarded, which costs O(offset).
///
/// # Errors
/// `PositionUnreachable` if a non-seekable source ends before `offset`.
pub fn open_at<S: ByteSource + ?Sized>(source: &S, offset: u64) -> Result<Box<dyn Read + Send>> {
    if let Some(mut reader) = source.open_seekable()? {
        reader.seek(SeekFrom::Start(offset))?;
        return Ok(Box::new(reader));
    }

    trace!("Skipping {} bytes of {}", offset, source.name());
    let mut reader = source.open()?;
    let skipped = io::copy(&mut reader.by_ref().take(offset), &mut io::sink())?;
    if skipped < offset {
        return Err(XxIndexError::PositionUnreachable {
            requested: offset,
            reached: skipped,
        });
    }
    Ok(reader)
}
