//! The value↔bytes codec underneath every datacard file.
//!
//! Two shapes of file exist in a datacard:
//!
//! - **Whole-object files**: one bincode payload per file. Used for every
//!   entity record, the section map and the flattened meter sequence.
//! - **Length-prefixed streams**: a sequence of `[u32 LE length][payload]`
//!   records. Used exclusively for spatial records, which may be too large to
//!   buffer as a single value; [`StreamWriter`] appends records through a
//!   buffered writer so peak memory stays bounded by one record.
//!
//! Readers never hold open file handles: a file is loaded once into a
//! [`FileBytes`] buffer (a memory map for non-empty files) and all decoding
//! happens against that in-memory slice.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DatacardError, Result};

/// Encodes a single value into a whole-object file, truncating any existing
/// content.
pub fn encode_to_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let bytes = bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| DatacardError::Serialization(e.to_string()))?;
    let mut file = File::create(path)?;
    file.write_all(&bytes)?;
    Ok(())
}

/// Decodes a whole-object file into a value.
pub fn decode_from_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    decode_value(&bytes)
}

/// Decodes a single bincode payload from an in-memory slice.
pub fn decode_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| DatacardError::Serialization(e.to_string()))
}

/// An append-only writer for length-prefixed record streams.
///
/// Records are written as `[u32 LE length][bincode payload]`. The stream has
/// no trailer; end-of-file terminates it.
#[derive(Debug)]
pub struct StreamWriter {
    writer: BufWriter<File>,
}

impl StreamWriter {
    /// Creates (or truncates) the stream file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Appends one record to the stream.
    pub fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let payload = bincode::serde::encode_to_vec(record, bincode::config::standard())
            .map_err(|e| DatacardError::Serialization(e.to_string()))?;
        let len = u32::try_from(payload.len()).map_err(|_| {
            DatacardError::Format(format!("record of {} bytes exceeds u32 prefix", payload.len()))
        })?;
        self.writer.write_all(&len.to_le_bytes())?;
        self.writer.write_all(&payload)?;
        Ok(())
    }

    /// Drains an entire iterator into the stream, then flushes.
    pub fn write_all_records<T, I>(&mut self, records: I) -> Result<()>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        for record in records {
            self.write_record(&record)?;
        }
        self.finish()
    }

    /// Flushes buffered bytes to disk.
    pub fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// An immutable, shareable byte buffer backing deferred decoders.
///
/// Non-empty files are memory-mapped; empty files fall back to an owned empty
/// slice because mapping a zero-length file fails on several platforms. The
/// buffer is loaded once at read time — accessors decode from it on every
/// call without touching the file system again.
#[derive(Debug, Clone)]
pub enum FileBytes {
    /// A memory-mapped, read-only view of the file.
    Mapped(Arc<Mmap>),
    /// Owned bytes (used for empty files).
    Owned(Arc<[u8]>),
}

impl FileBytes {
    /// Loads `path` into a shareable read buffer.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(Self::Owned(Arc::from(Vec::new())));
        }
        // Safety: the datacard layer assumes no concurrent writer to the same
        // directory (see the concurrency model); the map is never written.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self::Mapped(Arc::new(mmap)))
    }

    /// The underlying bytes.
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Mapped(m) => m,
            Self::Owned(b) => b,
        }
    }
}

/// A decoding iterator over a length-prefixed record stream.
///
/// Borrows the buffer; yields `Err` once on a truncated prefix or payload and
/// then terminates.
#[derive(Debug)]
pub struct StreamDecoder<'a, T> {
    bytes: &'a [u8],
    pos: usize,
    failed: bool,
    _marker: PhantomData<T>,
}

impl<'a, T: DeserializeOwned> StreamDecoder<'a, T> {
    /// Starts decoding from the beginning of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            failed: false,
            _marker: PhantomData,
        }
    }
}

impl<'a, T: DeserializeOwned> Iterator for StreamDecoder<'a, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }
        if self.pos + 4 > self.bytes.len() {
            self.failed = true;
            return Some(Err(DatacardError::Format(
                "truncated length prefix in record stream".into(),
            )));
        }
        let mut prefix = [0u8; 4];
        prefix.copy_from_slice(&self.bytes[self.pos..self.pos + 4]);
        let len = u32::from_le_bytes(prefix) as usize;
        let start = self.pos + 4;
        let end = start + len;
        if end > self.bytes.len() {
            self.failed = true;
            return Some(Err(DatacardError::Format(format!(
                "record stream truncated: {len} byte payload past end of file"
            ))));
        }
        self.pos = end;
        Some(decode_value(&self.bytes[start..end]))
    }
}

/// Decodes an entire length-prefixed stream into a `Vec`.
pub fn decode_stream<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    StreamDecoder::new(bytes).collect()
}
