//! Sequential little-endian reader over a borrowed byte slice

use byteorder::{ByteOrder, LittleEndian};

use super::text::decode_euc_kr;
use crate::traits::{ParseError, ParseResult};

/// Read position over an immutable byte slice
///
/// Every read advances the position by exactly the width it consumed and
/// fails with [`ParseError::TruncatedInput`] instead of yielding a default
/// when too few bytes remain. A failed read leaves the position unchanged,
/// including a length-prefixed string whose prefix was read but whose text
/// is truncated or not valid EUC-KR.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the input
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Total input length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left after the current position
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Move to an absolute offset; the end of input itself is a valid target
    pub fn seek(&mut self, offset: u64) -> ParseResult<()> {
        match usize::try_from(offset) {
            Ok(target) if target <= self.data.len() => {
                self.pos = target;
                Ok(())
            }
            _ => Err(ParseError::TruncatedInput {
                offset,
                requested: 0,
                available: 0,
            }),
        }
    }

    /// Run `f`, then restore the position held before the call
    ///
    /// The position is restored whether or not `f` succeeds.
    pub fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let saved = self.pos;
        let result = f(self);
        self.pos = saved;
        result
    }

    /// Run `f`, restoring the position held before the call if it fails
    fn atomic<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let saved = self.pos;
        let result = f(self);
        if result.is_err() {
            self.pos = saved;
        }
        result
    }

    /// Read exactly `n` raw bytes
    pub fn read_bytes(&mut self, n: usize) -> ParseResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(ParseError::TruncatedInput {
                offset: self.position(),
                requested: n,
                available: self.remaining(),
            });
        }

        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> ParseResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i8(&mut self) -> ParseResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> ParseResult<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_i16(&mut self) -> ParseResult<i16> {
        Ok(LittleEndian::read_i16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> ParseResult<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32(&mut self) -> ParseResult<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_f32(&mut self) -> ParseResult<f32> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }

    pub fn read_f64(&mut self) -> ParseResult<f64> {
        Ok(LittleEndian::read_f64(self.read_bytes(8)?))
    }

    /// One-byte flag, any non-zero value is true
    pub fn read_bool(&mut self) -> ParseResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Four-byte flag, any non-zero value is true
    pub fn read_bool32(&mut self) -> ParseResult<bool> {
        Ok(self.read_i32()? != 0)
    }

    /// Two-byte flag, any non-zero value is true
    pub fn read_bool16(&mut self) -> ParseResult<bool> {
        Ok(self.read_u16()? != 0)
    }

    /// Read an unsigned 16-bit element count
    pub fn read_count_u16(&mut self) -> ParseResult<usize> {
        Ok(usize::from(self.read_u16()?))
    }

    /// Read an unsigned 32-bit element count
    pub fn read_count_u32(&mut self, what: &str) -> ParseResult<usize> {
        self.atomic(|c| {
            let count = c.read_u32()?;
            usize::try_from(count).map_err(|_| ParseError::invalid(format!("{what} count {count} does not fit")))
        })
    }

    /// Read a signed 16-bit element count; negative counts are rejected
    pub fn read_count_i16(&mut self, what: &str) -> ParseResult<usize> {
        self.atomic(|c| {
            let count = c.read_i16()?;
            usize::try_from(count)
                .map_err(|_| ParseError::invalid(format!("negative {what} count: {count}")))
        })
    }

    /// Read a signed 32-bit element count; negative counts are rejected
    pub fn read_count_i32(&mut self, what: &str) -> ParseResult<usize> {
        self.atomic(|c| {
            let count = c.read_i32()?;
            usize::try_from(count)
                .map_err(|_| ParseError::invalid(format!("negative {what} count: {count}")))
        })
    }

    /// Read `count` elements with `read`
    ///
    /// Preallocation is capped so the reserved memory never exceeds the
    /// remaining input in bytes; a corrupt count fails on truncation before
    /// it can reserve more.
    pub fn read_array<T>(
        &mut self,
        count: usize,
        mut read: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut items = Vec::with_capacity(Self::capacity_for::<T>(count, self.remaining()));
        for _ in 0..count {
            items.push(read(self)?);
        }
        Ok(items)
    }

    /// Elements to reserve for `count` items of `T` with `remaining` bytes left
    pub(crate) fn capacity_for<T>(count: usize, remaining: usize) -> usize {
        count.min(remaining / std::mem::size_of::<T>().max(1))
    }

    /// Read `n` bytes of EUC-KR text
    ///
    /// One trailing NUL inside the counted bytes is dropped; length-prefixed
    /// names are often stored with their terminator included.
    pub fn read_text(&mut self, n: usize) -> ParseResult<String> {
        if n == 0 {
            return Ok(String::new());
        }

        self.atomic(|c| {
            let offset = c.position();
            let bytes = c.read_bytes(n)?;
            let bytes = match bytes.split_last() {
                Some((0, text)) => text,
                _ => bytes,
            };
            decode_euc_kr(bytes).ok_or(ParseError::TextDecode { offset, length: n })
        })
    }

    /// Text with a one-byte length prefix
    pub fn read_string_u8(&mut self) -> ParseResult<String> {
        self.atomic(|c| {
            let length = c.read_u8()?;
            c.read_text(usize::from(length))
        })
    }

    /// Text with a two-byte length prefix
    pub fn read_string_u16(&mut self) -> ParseResult<String> {
        self.atomic(|c| {
            let length = c.read_u16()?;
            c.read_text(usize::from(length))
        })
    }

    /// Text with a one- or two-byte length prefix
    ///
    /// Lengths below 0x80 take one byte. Otherwise the low seven bits of the
    /// first byte and all of the second byte form `(second << 7) | low`.
    pub fn read_string_varbyte(&mut self) -> ParseResult<String> {
        self.atomic(|c| {
            let first = c.read_u8()?;
            if first & 0x80 == 0 {
                return c.read_text(usize::from(first));
            }

            let second = c.read_u8()?;
            let length = (usize::from(second) << 7) | usize::from(first & 0x7F);
            c.read_text(length)
        })
    }

    /// NUL-terminated text; the terminator is consumed but not returned
    ///
    /// The scan is bounded by the end of input.
    pub fn read_cstring(&mut self) -> ParseResult<String> {
        let rest = &self.data[self.pos..];
        let Some(length) = rest.iter().position(|&b| b == 0) else {
            return Err(ParseError::TruncatedInput {
                offset: self.position(),
                requested: rest.len() + 1,
                available: rest.len(),
            });
        };

        self.atomic(|c| {
            let offset = c.position();
            let bytes = c.read_bytes(length + 1)?;
            decode_euc_kr(&bytes[..length]).ok_or(ParseError::TextDecode { offset, length })
        })
    }

    /// Exactly `n` bytes of text, with trailing NUL padding removed
    pub fn read_fixed_string(&mut self, n: usize) -> ParseResult<String> {
        self.atomic(|c| {
            let offset = c.position();
            let bytes = c.read_bytes(n)?;
            let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
            decode_euc_kr(&bytes[..end]).ok_or(ParseError::TextDecode { offset, length: n })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_little_endian() {
        let data = [
            0x01, // u8
            0x34, 0x12, // u16
            0xFE, 0xFF, // i16 = -2
            0x78, 0x56, 0x34, 0x12, // u32
            0x00, 0x00, 0x80, 0x3F, // f32 = 1.0
        ];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_u8().unwrap(), 1);
        assert_eq!(cursor.read_u16().unwrap(), 0x1234);
        assert_eq!(cursor.read_i16().unwrap(), -2);
        assert_eq!(cursor.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(cursor.read_f32().unwrap(), 1.0);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_truncated_read_reports_offset_and_leaves_position() {
        let data = [0u8; 3];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_u8().unwrap();

        let err = cursor.read_u32().unwrap_err();
        assert!(matches!(
            err,
            ParseError::TruncatedInput { offset: 1, requested: 4, available: 2 }
        ));
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_empty_length_prefixed_string_reads_nothing_more() {
        let data = [0x00, 0xAA];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_string_u8().unwrap(), "");
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_length_prefixed_strings() {
        let data = [3, b'a', b'b', b'c', 2, 0, b'h', b'i'];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_string_u8().unwrap(), "abc");
        assert_eq!(cursor.read_string_u16().unwrap(), "hi");
    }

    #[test]
    fn test_varbyte_string_two_byte_length() {
        // length 200 = (1 << 7) | 72
        let mut data = vec![0x80 | 72, 1];
        data.extend(std::iter::repeat(b'x').take(200));
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_string_varbyte().unwrap().len(), 200);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_cstring() {
        let data = b"root\0b1\0";
        let mut cursor = ByteCursor::new(data);

        assert_eq!(cursor.read_cstring().unwrap(), "root");
        assert_eq!(cursor.read_cstring().unwrap(), "b1");
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_unterminated_cstring_is_truncated() {
        let mut cursor = ByteCursor::new(b"abc");
        assert!(matches!(
            cursor.read_cstring(),
            Err(ParseError::TruncatedInput { offset: 0, requested: 4, available: 3 })
        ));
    }

    #[test]
    fn test_fixed_string_trims_padding() {
        let mut cursor = ByteCursor::new(b"STB1ZMD\0\0");
        assert_eq!(cursor.read_fixed_string(4).unwrap(), "STB1");
        assert_eq!(cursor.read_fixed_string(5).unwrap(), "ZMD");
    }

    #[test]
    fn test_invalid_text_is_an_error() {
        let data = [2, 0xFF, 0xFF];
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            cursor.read_string_u8(),
            Err(ParseError::TextDecode { offset: 1, length: 2 })
        ));
    }

    #[test]
    fn test_failed_text_leaves_position() {
        let mut cursor = ByteCursor::new(&[0xFF, 0xFF, 0x00]);
        assert!(matches!(cursor.read_cstring(), Err(ParseError::TextDecode { .. })));
        assert_eq!(cursor.position(), 0);

        let data = [2, 0xFF, 0xFF];
        let mut cursor = ByteCursor::new(&data);
        assert!(cursor.read_string_u8().is_err());
        assert_eq!(cursor.position(), 0);

        // Prefix promises more bytes than remain
        let data = [0x85, 0x01, b'a'];
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            cursor.read_string_varbyte(),
            Err(ParseError::TruncatedInput { offset: 2, .. })
        ));
        assert_eq!(cursor.position(), 0);

        let mut cursor = ByteCursor::new(&[b'O', b'K', 0xFF, 0xFF]);
        assert!(cursor.read_fixed_string(4).is_err());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_length_prefixed_text_drops_one_terminator() {
        let data = [5, b'r', b'o', b'o', b't', 0, 3, b'a', 0, 0];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_string_u8().unwrap(), "root");
        assert_eq!(cursor.read_string_u8().unwrap(), "a\0");
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_array_capacity_bounded_by_input_bytes() {
        assert_eq!(ByteCursor::capacity_for::<u8>(1_000, 10), 10);
        assert_eq!(ByteCursor::capacity_for::<[u8; 64]>(1_000, 640), 10);
        assert_eq!(ByteCursor::capacity_for::<[u8; 64]>(3, 640), 3);
        assert_eq!(ByteCursor::capacity_for::<()>(7, 0), 0);
    }

    #[test]
    fn test_scoped_restores_position() {
        let data = [1, 2, 3, 4];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_u8().unwrap();

        let value = cursor
            .scoped(|c| {
                c.seek(3)?;
                c.read_u8()
            })
            .unwrap();
        assert_eq!(value, 4);
        assert_eq!(cursor.position(), 1);

        assert!(cursor.scoped(|c| c.seek(99)).is_err());
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let data = (-1i16).to_le_bytes();
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            cursor.read_count_i16("vertex"),
            Err(ParseError::InvalidStructure(_))
        ));
    }
}
