use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use futures::{Stream, stream};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::StorageError;
use crate::range::ResolvedRange;

// Max bytes per read from disk while streaming a chunk
const READ_BUFFER_SIZE: usize = 64 * 1024;

// File served from a fixed, server-configured location
#[derive(Debug, Clone)]
pub struct MediaResource {
    path: PathBuf,
    content_type: String,
}

impl MediaResource {
    pub fn new(path: impl Into<PathBuf>, content_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_type: content_type.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    // Read fresh for every request
    pub async fn total_size(&self) -> Result<u64, StorageError> {
        tokio::fs::metadata(&self.path)
            .await
            .map(|meta| meta.len())
            .map_err(|source| StorageError::Metadata {
                path: self.path.clone(),
                source,
            })
    }

    // Single-pass stream over [start, end]. Open and seek fail before any
    // header is sent; later read errors or a shrunken file end the stream with
    // an error. The handle lives in the stream and closes when it is dropped.
    pub async fn open_chunk_stream(
        &self,
        range: ResolvedRange,
    ) -> Result<impl Stream<Item = Result<Bytes, StorageError>> + Send + 'static, StorageError> {
        let mut file = File::open(&self.path)
            .await
            .map_err(|source| StorageError::Open {
                path: self.path.clone(),
                source,
            })?;
        file.seek(SeekFrom::Start(range.start))
            .await
            .map_err(|source| StorageError::Read {
                path: self.path.clone(),
                source,
            })?;

        let reader = ChunkReader {
            file: Some(file),
            path: self.path.clone(),
            expected: range.content_length,
            read: 0,
        };

        Ok(stream::unfold(reader, |mut reader| async move {
            let item = reader.next_block().await?;
            Some((item, reader))
        }))
    }
}

// State threaded through the unfold stream
struct ChunkReader {
    file: Option<File>,
    path: PathBuf,
    expected: u64,
    read: u64,
}

impl ChunkReader {
    async fn next_block(&mut self) -> Option<Result<Bytes, StorageError>> {
        let file = self.file.as_mut()?;

        let left = self.expected - self.read;
        if left == 0 {
            self.file = None;
            return None;
        }

        let want = left.min(READ_BUFFER_SIZE as u64) as usize;
        let mut buf = BytesMut::zeroed(want);
        match file.read(&mut buf).await {
            Ok(0) => {
                self.file = None;
                Some(Err(StorageError::Truncated {
                    path: self.path.clone(),
                    expected: self.expected,
                    read: self.read,
                }))
            }
            Ok(n) => {
                buf.truncate(n);
                self.read += n as u64;
                Some(Ok(buf.freeze()))
            }
            Err(source) => {
                self.file = None;
                Some(Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                }))
            }
        }
    }
}
