//! # Primitive codec
//!
//! All-or-nothing reads and writes of plain-old-data. No document knowledge lives here.
//!
//! Values are moved as raw native bytes, which the file format defines as little endian.

use az::SaturatingAs;
use std::io::{ErrorKind as IOErrorKind, Read, Result as IOResult, Write};

#[cfg(not(target_endian = "little"))]
compile_error!("the file format is little endian and values are stored as native bytes");

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("unexpected end of data")]
    ShortRead,
    #[error("could not write all data")]
    ShortWrite,
    #[error("not enough memory for {} bytes", .0)]
    OutOfMemory(usize),
    #[error(transparent)]
    IO(std::io::Error),
}
impl From<std::io::Error> for CodecError {
    fn from(value: std::io::Error) -> Self {
        match value.kind() {
            IOErrorKind::UnexpectedEof => Self::ShortRead,
            IOErrorKind::WriteZero => Self::ShortWrite,
            _ => Self::IO(value),
        }
    }
}

/// Reads at most `len` bytes from the inner stream, and knows how many are left.
///
/// Knowing the remaining length lets count-prefixed arrays be rejected before anything is allocated.
pub struct Reader<R> {
    stream: R,
    cursor: u64,
    len: u64,
}
impl<R> Reader<R> {
    /// Create a reader over the next `len` bytes of `stream`.
    ///
    /// No check is performed that the stream is actually long enough!
    pub fn new(stream: R, len: u64) -> Self {
        Self {
            stream,
            cursor: 0,
            len,
        }
    }
    /// How many bytes remain
    pub fn remaining(&self) -> u64 {
        // Cursor is never advanced past len.
        self.len.saturating_sub(self.cursor)
    }
    /// Bytes consumed so far.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }
    pub fn into_inner(self) -> R {
        self.stream
    }
}
impl<R: Read> Read for Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> IOResult<usize> {
        let len = buf.len().min(self.remaining().saturating_as());
        let buf = &mut buf[..len];
        // Short circuit if we can't read any more data
        if buf.is_empty() {
            return Ok(0);
        }
        let num_read = self.stream.read(buf)?;
        // A misbehaving inner reader may claim more than it was given
        let new_cursor = self
            .cursor
            .checked_add(num_read as u64)
            .filter(|new| *new <= self.len)
            .ok_or_else(|| std::io::Error::other("inner reader overflowed cursor"))?;
        self.cursor = new_cursor;

        Ok(num_read)
    }
}
impl<R: Read> Reader<R> {
    /// Fill `buf` entirely.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
        self.read_exact(buf)?;
        Ok(())
    }
    /// Read exactly one `T`.
    pub fn read_pod<T: bytemuck::Pod>(&mut self) -> Result<T, CodecError> {
        let mut value = T::zeroed();
        self.read_bytes(bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }
    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        self.read_pod()
    }
    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        self.read_pod()
    }
    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        self.read_pod()
    }
    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        self.read_pod()
    }
    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        self.read_pod()
    }
    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        self.read_pod()
    }
    /// Read `len` bytes over the start of `into`, leaving the rest of it untouched.
    ///
    /// Used for self-sized records, where an older writer stored a shorter struct.
    /// `len` larger than `T` is a programming error and reads nothing.
    pub fn read_prefix<T: bytemuck::Pod>(&mut self, into: &mut T, len: usize) -> Result<(), CodecError> {
        let bytes = bytemuck::bytes_of_mut(into);
        let Some(prefix) = bytes.get_mut(..len) else {
            debug_assert!(false, "prefix read longer than target");
            return Err(CodecError::ShortRead);
        };
        self.read_bytes(prefix)
    }
    /// Read `count` consecutive `T`s.
    ///
    /// Fails without allocating if the stream can't possibly hold that many.
    pub fn read_vec<T: bytemuck::Pod>(&mut self, count: usize) -> Result<Vec<T>, CodecError> {
        let bytes = count
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(CodecError::ShortRead)?;
        if bytes as u64 > self.remaining() {
            return Err(CodecError::ShortRead);
        }
        let mut vec = Vec::<T>::new();
        vec.try_reserve_exact(count)
            .map_err(|_| CodecError::OutOfMemory(bytes))?;
        vec.resize(count, T::zeroed());
        self.read_bytes(bytemuck::cast_slice_mut(&mut vec))?;
        Ok(vec)
    }
    /// Read and throw away `len` bytes.
    pub fn skip(&mut self, len: u64) -> Result<(), CodecError> {
        let skipped = std::io::copy(&mut self.by_ref().take(len), &mut std::io::sink())?;
        if skipped == len {
            Ok(())
        } else {
            Err(CodecError::ShortRead)
        }
    }
}

/// Open a file for bounded reading, or `None` if it doesn't exist.
pub fn open_if_exists(
    path: &std::path::Path,
) -> Result<Option<Reader<std::io::BufReader<std::fs::File>>>, CodecError> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == IOErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let len = file.metadata()?.len();
    Ok(Some(Reader::new(std::io::BufReader::new(file), len)))
}

/// Write-side counterpart of [`Reader`], tallying every byte that made it to the inner stream.
pub struct Writer<W> {
    stream: W,
    bytes_written: u64,
}
impl<W: Write> Writer<W> {
    pub fn new(stream: W) -> Self {
        Self {
            stream,
            bytes_written: 0,
        }
    }
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
    pub fn into_inner(self) -> W {
        self.stream
    }
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.stream.write_all(bytes)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }
    pub fn write_pod<T: bytemuck::NoUninit>(&mut self, value: &T) -> Result<(), CodecError> {
        self.write_bytes(bytemuck::bytes_of(value))
    }
    pub fn write_slice<T: bytemuck::NoUninit>(&mut self, values: &[T]) -> Result<(), CodecError> {
        self.write_bytes(bytemuck::cast_slice(values))
    }
    pub fn flush(&mut self) -> Result<(), CodecError> {
        self.stream.flush()?;
        Ok(())
    }
}
