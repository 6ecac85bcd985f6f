//! Sequential little-endian byte stream used by every savegame codec.
//!
//! Reads never seek. A short read surfaces as [`SaveError::Truncated`] naming
//! the field that was being read, so callers can report exactly where a
//! container ended early.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::save::{SaveError, SaveResult};

/// Reading half of the byte stream.
pub struct BinaryReader<R> {
    inner: R,
    position: u64,
}

impl BinaryReader<BufReader<File>> {
    /// Opens a file for reading.
    pub fn open(path: impl AsRef<Path>) -> SaveResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SaveError::StreamOpen {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> BinaryReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_array<const N: usize>(&mut self, what: &'static str) -> SaveResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf).map_err(|e| SaveError::from_read(e, what))?;
        self.position += N as u64;
        Ok(buf)
    }

    pub fn read_u8(&mut self, what: &'static str) -> SaveResult<u8> {
        let [byte] = self.read_array::<1>(what)?;
        Ok(byte)
    }

    pub fn read_u16(&mut self, what: &'static str) -> SaveResult<u16> {
        Ok(u16::from_le_bytes(self.read_array(what)?))
    }

    pub fn read_u32(&mut self, what: &'static str) -> SaveResult<u32> {
        Ok(u32::from_le_bytes(self.read_array(what)?))
    }

    /// Reads exactly `len` bytes.
    ///
    /// The buffer grows with the data actually present, so a corrupt length
    /// prefix ends in `Truncated` instead of a huge allocation.
    pub fn read_bytes(&mut self, len: usize, what: &'static str) -> SaveResult<Vec<u8>> {
        let mut buf = Vec::new();
        (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut buf)
            .map_err(|e| SaveError::from_read(e, what))?;
        self.position += buf.len() as u64;

        if buf.len() < len {
            return Err(SaveError::truncated(what));
        }
        Ok(buf)
    }

    /// Reads a `u32` length-prefixed UTF-8 string.
    pub fn read_string(&mut self, what: &'static str) -> SaveResult<String> {
        let len = self.read_u32(what)? as usize;
        let bytes = self.read_bytes(len, what)?;
        String::from_utf8(bytes)
            .map_err(|e| SaveError::Malformed(format!("{} is not valid UTF-8: {}", what, e)))
    }
}

/// Writing half of the byte stream.
pub struct BinaryWriter<W> {
    inner: W,
    position: u64,
}

impl BinaryWriter<BufWriter<File>> {
    /// Creates (or truncates) a file for writing.
    pub fn create(path: impl AsRef<Path>) -> SaveResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| SaveError::StreamOpen {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }

    /// Flushes buffered data and fsyncs the underlying file.
    pub fn sync(self) -> SaveResult<()> {
        let file = self.inner.into_inner().map_err(|e| SaveError::Io(e.into_error()))?;
        file.sync_all()?;
        Ok(())
    }
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> SaveResult<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> SaveResult<()> {
        self.write_bytes(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> SaveResult<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> SaveResult<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Writes `len` as a `u32` count prefix.
    pub fn write_len(&mut self, len: usize, what: &str) -> SaveResult<()> {
        let len = u32::try_from(len)
            .map_err(|_| SaveError::Malformed(format!("{} too long: {} entries", what, len)))?;
        self.write_u32(len)
    }

    /// Writes a `u32` length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> SaveResult<()> {
        self.write_len(value.len(), "string")?;
        self.write_bytes(value.as_bytes())
    }

    pub fn flush(&mut self) -> SaveResult<()> {
        self.inner.flush()?;
        Ok(())
    }
}
