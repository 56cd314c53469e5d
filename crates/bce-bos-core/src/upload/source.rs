//! Upload payloads.

use std::fmt;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt};

use crate::error::{UploadError, ValidationError};

/// A sized, random-access payload held somewhere other than a local file.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use bce_bos_core::upload::BlobSource;
/// use bytes::Bytes;
///
/// struct Memory(Bytes);
///
/// #[async_trait]
/// impl BlobSource for Memory {
///     fn len(&self) -> u64 {
///         self.0.len() as u64
///     }
///
///     async fn read_range(&self, start: u64, len: u64) -> std::io::Result<Bytes> {
///         let start = start as usize;
///         Ok(self.0.slice(start..start + len as usize))
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let blob = Memory(Bytes::from_static(b"hello world"));
/// assert_eq!(blob.read_range(6, 5).await.unwrap(), Bytes::from_static(b"world"));
/// # });
/// ```
#[async_trait]
pub trait BlobSource: Send + Sync {
    /// Total size in bytes.
    fn len(&self) -> u64;

    /// Whether the blob has no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read `len` bytes starting at `start`.
    async fn read_range(&self, start: u64, len: u64) -> std::io::Result<Bytes>;
}

/// What to upload.
pub enum DataSource {
    /// A local file, read part by part.
    File(PathBuf),
    /// An in-memory buffer.
    Bytes(Bytes),
    /// A reader that can only be consumed once, front to back.
    ///
    /// Streams are always uploaded in a single request, so the whole stream is
    /// read into memory before it is sent. When `content_length` is given, the
    /// number of bytes read must match it.
    Stream {
        /// The reader.
        reader: Box<dyn AsyncRead + Send + Unpin>,
        /// Declared size, if known.
        content_length: Option<u64>,
    },
    /// A random-access blob.
    Blob(Arc<dyn BlobSource>),
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream { content_length, .. } => f
                .debug_struct("Stream")
                .field("content_length", content_length)
                .finish_non_exhaustive(),
            Self::Blob(blob) => f.debug_tuple("Blob").field(&blob.len()).finish(),
        }
    }
}

impl From<Bytes> for DataSource {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for DataSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<PathBuf> for DataSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

/// A payload whose size is known and whose byte ranges can be read
/// independently, possibly from several tasks at once.
#[derive(Clone)]
pub(crate) enum RangeSource {
    File(Arc<PathBuf>),
    Bytes(Bytes),
    Blob(Arc<dyn BlobSource>),
}

impl RangeSource {
    /// Read exactly `len` bytes at `start`.
    pub(crate) async fn read(&self, start: u64, len: u64) -> Result<Bytes, UploadError> {
        let bytes = match self {
            Self::File(path) => {
                let mut file = tokio::fs::File::open(path.as_path()).await?;
                file.seek(SeekFrom::Start(start)).await?;
                let mut buf = Vec::with_capacity(usize::try_from(len).unwrap_or(0));
                file.take(len).read_to_end(&mut buf).await?;
                Bytes::from(buf)
            }
            Self::Bytes(bytes) => {
                let begin = usize::try_from(start).map_or(bytes.len(), |s| s.min(bytes.len()));
                let end = usize::try_from(len)
                    .map_or(bytes.len(), |l| begin.saturating_add(l).min(bytes.len()));
                bytes.slice(begin..end)
            }
            Self::Blob(blob) => blob.read_range(start, len).await?,
        };

        let actual = bytes.len() as u64;
        if actual != len {
            return Err(ValidationError::SizeMismatch {
                declared: len,
                actual,
            }
            .into());
        }
        Ok(bytes)
    }
}

/// A payload after its kind and size have been determined.
pub(crate) enum Inspected {
    /// Known size, random access.
    Sized { source: RangeSource, size: u64 },
    /// Single-pass reader; always uploaded directly.
    Stream {
        reader: Box<dyn AsyncRead + Send + Unpin>,
        content_length: Option<u64>,
    },
}

impl DataSource {
    /// Determine the payload size. Files are measured via their metadata.
    pub(crate) async fn inspect(self) -> Result<Inspected, UploadError> {
        Ok(match self {
            Self::File(path) => {
                let size = tokio::fs::metadata(&path).await?.len();
                Inspected::Sized {
                    source: RangeSource::File(Arc::new(path)),
                    size,
                }
            }
            Self::Bytes(bytes) => Inspected::Sized {
                size: bytes.len() as u64,
                source: RangeSource::Bytes(bytes),
            },
            Self::Blob(blob) => Inspected::Sized {
                size: blob.len(),
                source: RangeSource::Blob(blob),
            },
            Self::Stream {
                reader,
                content_length,
            } => Inspected::Stream {
                reader,
                content_length,
            },
        })
    }
}

/// Drain a stream into memory, checking the declared length if there is one.
pub(crate) async fn read_stream(
    mut reader: Box<dyn AsyncRead + Send + Unpin>,
    content_length: Option<u64>,
) -> Result<Bytes, UploadError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;

    let actual = buf.len() as u64;
    if let Some(declared) = content_length {
        if declared != actual {
            return Err(ValidationError::SizeMismatch { declared, actual }.into());
        }
    }
    Ok(Bytes::from(buf))
}
