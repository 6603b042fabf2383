use crate::buffer::PacketBuffer;
use crate::error::Error;
use crate::sink::{ByteSink, PacketCollector};

#[test]
fn test_packet_buffer_new() {
    let buffer = PacketBuffer::new();
    assert!(buffer.is_empty());
    assert_eq!(buffer.capacity(), 0);
}

#[test]
fn test_packet_buffer_with_capacity() {
    let buffer = PacketBuffer::with_capacity(16384);
    assert!(buffer.is_empty());
    assert!(buffer.capacity() >= 16384);
}

#[test]
fn test_append_integers() {
    let mut buffer = PacketBuffer::new();
    buffer.append_int_1(0x01).unwrap();
    buffer.append_int_2(0x0302).unwrap();
    buffer.append_int_4(0x07060504).unwrap();
    buffer.append_int_8(0x0f0e0d0c0b0a0908).unwrap();
    assert_eq!(
        buffer.as_slice(),
        &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]
    );
}

#[test]
fn test_append_lenenc() {
    let mut buffer = PacketBuffer::new();
    buffer.append_int_lenenc(300).unwrap();
    buffer.append_bytes_lenenc(b"hi").unwrap();
    assert_eq!(buffer.as_slice(), &[0xFC, 0x2C, 0x01, 0x02, b'h', b'i']);
}

#[test]
fn test_mark_and_truncate() {
    let mut buffer = PacketBuffer::new();
    buffer.append(b"keep").unwrap();
    let mark = buffer.mark();
    buffer.append(b"drop").unwrap();
    buffer.truncate(mark);
    assert_eq!(buffer.as_slice(), b"keep");
}

#[test]
fn test_reset_zeroed_reuses_capacity() {
    let mut buffer = PacketBuffer::with_capacity(64);
    buffer.append(b"previous row").unwrap();
    let capacity = buffer.capacity();
    buffer.reset_zeroed(3).unwrap();
    assert_eq!(buffer.as_slice(), &[0, 0, 0]);
    assert_eq!(buffer.capacity(), capacity);
}

#[test]
fn test_reserve_failure() {
    let mut buffer = PacketBuffer::new();
    let err = buffer.reserve(usize::MAX).unwrap_err();
    assert!(matches!(err, Error::AllocationFailure(_)));
}

#[test]
fn test_flush_to_clears() {
    let mut sink = PacketCollector::new();
    let mut buffer = PacketBuffer::new();
    buffer.append(b"packet").unwrap();
    buffer.flush_to(&mut sink).unwrap();
    assert!(buffer.is_empty());
    assert_eq!(sink.packets(), &[b"packet".to_vec()]);
}

struct BrokenSink;

impl ByteSink for BrokenSink {
    fn write_packet(&mut self, _payload: &[u8]) -> std::io::Result<()> {
        Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
    }
}

#[test]
fn test_flush_to_failure_keeps_packet() {
    let mut buffer = PacketBuffer::new();
    buffer.append(b"packet").unwrap();
    let err = buffer.flush_to(&mut BrokenSink).unwrap_err();
    assert!(matches!(err, Error::TransportFailure(_)));
    assert_eq!(buffer.as_slice(), b"packet");
}
