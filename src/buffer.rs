use crate::error::Result;
use crate::protocol::primitive::*;
use crate::sink::ByteSink;

/// Growable byte accumulator for one outbound packet payload.
///
/// Every append reserves first with `Vec::try_reserve`, so running out of memory surfaces as
/// `Error::AllocationFailure` instead of aborting the process. Packet headers are not part of
/// the buffer: framing belongs to the transport behind the `ByteSink`.
#[derive(Debug, Default)]
pub struct PacketBuffer {
    buf: Vec<u8>,
}

impl PacketBuffer {
    /// Create an empty buffer that does not allocate until written to
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Create a buffer with `prealloc` bytes of capacity
    pub fn with_capacity(prealloc: usize) -> Self {
        Self {
            buf: Vec::with_capacity(prealloc),
        }
    }

    #[inline]
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.buf.try_reserve(additional)?;
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Current length, to be passed to `truncate` later
    #[inline]
    pub fn mark(&self) -> usize {
        self.buf.len()
    }

    /// Drop everything appended after `mark`
    #[inline]
    pub fn truncate(&mut self, mark: usize) {
        self.buf.truncate(mark);
    }

    /// Drop the contents but keep the capacity
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Reset to `len` zero bytes.
    ///
    /// Does not allocate when `len` bytes were reserved before.
    pub fn reset_zeroed(&mut self, len: usize) -> Result<()> {
        self.buf.clear();
        self.reserve(len)?;
        self.buf.resize(len, 0);
        Ok(())
    }

    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        self.reserve(data.len())?;
        write_bytes_fix(&mut self.buf, data);
        Ok(())
    }

    pub fn append_int_1(&mut self, value: u8) -> Result<()> {
        self.reserve(1)?;
        write_int_1(&mut self.buf, value);
        Ok(())
    }

    pub fn append_int_2(&mut self, value: u16) -> Result<()> {
        self.reserve(2)?;
        write_int_2(&mut self.buf, value);
        Ok(())
    }

    pub fn append_int_3(&mut self, value: u32) -> Result<()> {
        self.reserve(3)?;
        write_int_3(&mut self.buf, value);
        Ok(())
    }

    pub fn append_int_4(&mut self, value: u32) -> Result<()> {
        self.reserve(4)?;
        write_int_4(&mut self.buf, value);
        Ok(())
    }

    pub fn append_int_8(&mut self, value: u64) -> Result<()> {
        self.reserve(8)?;
        write_int_8(&mut self.buf, value);
        Ok(())
    }

    pub fn append_int_lenenc(&mut self, value: u64) -> Result<()> {
        self.reserve(lenenc_int_size(value))?;
        write_int_lenenc(&mut self.buf, value);
        Ok(())
    }

    pub fn append_bytes_lenenc(&mut self, data: &[u8]) -> Result<()> {
        self.reserve(lenenc_int_size(data.len() as u64) + data.len())?;
        write_bytes_lenenc(&mut self.buf, data);
        Ok(())
    }

    /// Hand the packet to the sink and clear the buffer.
    ///
    /// On failure the packet stays in the buffer; the caller decides whether to drop it.
    pub fn flush_to<S: ByteSink>(&mut self, sink: &mut S) -> Result<()> {
        sink.write_packet(&self.buf)?;
        self.buf.clear();
        Ok(())
    }
}
