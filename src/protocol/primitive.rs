use zerocopy::FromBytes;
use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE, U64 as U64LE};

/// Largest value a length-encoded integer stores in its first byte
const LENENC_1_BYTE_MAX: u64 = 250;

/// Number of bytes `write_int_lenenc` emits for `value`
#[inline]
pub fn lenenc_int_size(value: u64) -> usize {
    if value <= LENENC_1_BYTE_MAX {
        1
    } else if value < (1 << 16) {
        3
    } else if value < (1 << 24) {
        4
    } else {
        9
    }
}

/// Write 1-byte integer
pub fn write_int_1(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

/// Write 2-byte little-endian integer
pub fn write_int_2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Write 3-byte little-endian integer
pub fn write_int_3(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes()[..3]);
}

/// Write 4-byte little-endian integer
pub fn write_int_4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Write 8-byte little-endian integer
pub fn write_int_8(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Write length-encoded integer
pub fn write_int_lenenc(out: &mut Vec<u8>, value: u64) {
    if value <= LENENC_1_BYTE_MAX {
        out.push(value as u8);
    } else if value < (1 << 16) {
        out.push(0xfc);
        write_int_2(out, value as u16);
    } else if value < (1 << 24) {
        out.push(0xfd);
        write_int_3(out, value as u32);
    } else {
        out.push(0xfe);
        write_int_8(out, value);
    }
}

/// Write fixed-length bytes
pub fn write_bytes_fix(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(data);
}

/// Write length-encoded bytes
pub fn write_bytes_lenenc(out: &mut Vec<u8>, data: &[u8]) {
    write_int_lenenc(out, data.len() as u64);
    out.extend_from_slice(data);
}

// ============================================================================
// Read side, used to inspect encoded packets
// ============================================================================

/// Read 1-byte integer
pub fn read_int_1(data: &[u8]) -> Option<(u8, &[u8])> {
    let (&first, rest) = data.split_first()?;
    Some((first, rest))
}

/// Read 2-byte little-endian integer
pub fn read_int_2(data: &[u8]) -> Option<(u16, &[u8])> {
    let (value, rest) = U16LE::read_from_prefix(data).ok()?;
    Some((value.get(), rest))
}

/// Read 3-byte little-endian integer
pub fn read_int_3(data: &[u8]) -> Option<(u32, &[u8])> {
    let (bytes, rest) = data.split_first_chunk::<3>()?;
    Some((u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]), rest))
}

/// Read 4-byte little-endian integer
pub fn read_int_4(data: &[u8]) -> Option<(u32, &[u8])> {
    let (value, rest) = U32LE::read_from_prefix(data).ok()?;
    Some((value.get(), rest))
}

/// Read 8-byte little-endian integer
pub fn read_int_8(data: &[u8]) -> Option<(u64, &[u8])> {
    let (value, rest) = U64LE::read_from_prefix(data).ok()?;
    Some((value.get(), rest))
}

/// Read length-encoded integer
pub fn read_int_lenenc(data: &[u8]) -> Option<(u64, &[u8])> {
    let (&first, rest) = data.split_first()?;
    match first {
        0xFC => {
            let (val, rest) = read_int_2(rest)?;
            Some((val as u64, rest))
        }
        0xFD => {
            let (val, rest) = read_int_3(rest)?;
            Some((val as u64, rest))
        }
        0xFE => read_int_8(rest),
        val => Some((val as u64, rest)),
    }
}

/// Read fixed-length string
pub fn read_string_fix(data: &[u8], len: usize) -> Option<(&[u8], &[u8])> {
    if data.len() < len {
        return None;
    }
    Some(data.split_at(len))
}

/// Read length-encoded string
pub fn read_string_lenenc(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let (len, rest) = read_int_lenenc(data)?;
    read_string_fix(rest, usize::try_from(len).ok()?)
}
