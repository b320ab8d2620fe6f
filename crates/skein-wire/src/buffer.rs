//! Byte-oriented streaming buffers.
//!
//! [`ReadBuffer`] wraps an immutable byte slice and hands out bounded views;
//! [`WriteBuffer`] is a growable byte container. Neither decodes multi-byte
//! integers - that is the codec's job.

use crate::error::ProtocolError;

/// Default initial capacity for [`WriteBuffer`].
pub const DEFAULT_CAPACITY: usize = 4096;

/// A bounded reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ReadBuffer<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ReadBuffer<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Bytes left to read.
    #[inline]
    pub fn available(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// A view of the next `n` bytes, advancing the offset.
    pub fn read(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if n > self.available() {
            return Err(ProtocolError::EndOfInput {
                expected: n,
                got: self.available(),
            });
        }
        let chunk = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(chunk)
    }

    /// An owned copy of the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<Vec<u8>, ProtocolError> {
        self.read(n).map(|chunk| chunk.to_vec())
    }

    /// Discard the next `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<(), ProtocolError> {
        self.read(n).map(|_| ())
    }
}

/// A growable byte container for serialization output.
///
/// Capacity grows by doubling; when doubling is not enough for a write, it
/// grows by exactly the shortfall instead.
#[derive(Debug)]
pub struct WriteBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `chunk`, growing if needed.
    pub fn write(&mut self, chunk: &[u8]) {
        let needed = self.bytes.len() + chunk.len();
        if needed > self.capacity {
            let doubled = self.capacity * 2;
            self.capacity = if doubled >= needed { doubled } else { needed };
            self.bytes.reserve_exact(self.capacity - self.bytes.len());
        }
        self.bytes.extend_from_slice(chunk);
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Current capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The completed byte image.
    pub fn value(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the buffer, yielding the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Drop all written bytes, keeping the capacity.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_read_buffer() {
        let mut buff = ReadBuffer::new(b"");
        assert_eq!(buff.take(0).unwrap(), b"");
        assert_eq!(
            buff.take(1),
            Err(ProtocolError::EndOfInput {
                expected: 1,
                got: 0
            })
        );
    }

    #[test]
    fn simple_read() {
        let mut buff = ReadBuffer::new(b"abcd");
        assert_eq!(buff.take(1).unwrap(), b"a");
        assert_eq!(buff.take(2).unwrap(), b"bc");
        // A failed read consumes nothing.
        assert_eq!(
            buff.take(2),
            Err(ProtocolError::EndOfInput {
                expected: 2,
                got: 1
            })
        );
        assert_eq!(buff.take(1).unwrap(), b"d");
    }

    #[test]
    fn skip_advances() {
        let mut buff = ReadBuffer::new(b"abcd");
        buff.skip(3).unwrap();
        assert_eq!(buff.available(), 1);
        assert_eq!(buff.read(1).unwrap(), b"d");
    }

    #[test]
    fn empty_write_buffer() {
        let buff = WriteBuffer::with_capacity(10);
        assert_eq!(buff.len(), 0);
        assert_eq!(buff.capacity(), 10);
        assert_eq!(buff.value(), b"");
    }

    #[test]
    fn simple_write() {
        let mut buff = WriteBuffer::with_capacity(10);
        buff.write(b"hello ");
        buff.write(b"world");
        assert_eq!(buff.value(), b"hello world");
        assert_eq!(buff.len(), 11);
    }

    #[test]
    fn write_clear() {
        let mut buff = WriteBuffer::with_capacity(10);
        buff.write(b"foo");
        buff.clear();
        assert_eq!(buff.value(), b"");
        assert_eq!(buff.capacity(), 10);
        assert_eq!(buff.len(), 0);
    }

    #[test]
    fn growth_doubles() {
        let mut buff = WriteBuffer::with_capacity(4);
        buff.write(b"abcd");
        buff.write(b"e");
        assert_eq!(buff.capacity(), 8);
        assert_eq!(buff.value(), b"abcde");
    }

    #[test]
    fn growth_falls_back_to_shortfall() {
        let mut buff = WriteBuffer::with_capacity(4);
        // Doubling to 8 would not fit 4 + 100 bytes; grow to exactly 104.
        buff.write(b"abcd");
        buff.write(&[0u8; 100]);
        assert_eq!(buff.capacity(), 104);
        assert_eq!(buff.len(), 104);
    }
}
