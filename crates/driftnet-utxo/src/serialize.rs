//! Byte-level readers for the snapshot stream.
//!
//! All multi-byte integers in the snapshot are little-endian except the
//! VARINT dialect, which is read most-significant group first.

use std::io::{self, Read};

/// Read exactly `N` bytes.
pub(crate) fn read_array<const N: usize, R: Read>(reader: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

pub(crate) fn read_u64_le<R: Read>(reader: &mut R) -> io::Result<u64> {
    Ok(u64::from_le_bytes(read_array(reader)?))
}

/// Discard exactly `n` bytes from the stream.
pub(crate) fn skip<R: Read>(reader: &mut R, n: u64) -> io::Result<()> {
    let copied = io::copy(&mut reader.take(n), &mut io::sink())?;
    if copied < n {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}

/// Read one Bitcoin Core VARINT.
///
/// Each byte contributes 7 bits, most-significant group first; a set
/// continuation bit also adds 1 after the shift, so multi-byte encodings
/// have no redundant forms.
///
/// <https://github.com/bitcoin/bitcoin/blob/0903ce8dbc25d3823b03d52f6e6bff74d19e801e/src/serialize.h#L370>
pub(crate) fn read_varint<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut n: u64 = 0;
    loop {
        let [byte] = read_array::<1, _>(reader)?;
        n = (n << 7) | u64::from(byte & 0x7f);
        if byte & 0x80 != 0 {
            n += 1;
        } else {
            return Ok(n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn varint(bytes: &[u8]) -> u64 {
        read_varint(&mut Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn varint_vectors() {
        assert_eq!(varint(&[0x00]), 0);
        assert_eq!(varint(&[0x01]), 1);
        assert_eq!(varint(&[0x7f]), 127);
        assert_eq!(varint(&[0x80, 0x00]), 128);
        assert_eq!(varint(&[0x80, 0x7f]), 255);
        assert_eq!(varint(&[0x81, 0x00]), 256);
        assert_eq!(varint(&[0x80, 0x80, 0x00]), 16512);
    }

    #[test]
    fn varint_eof() {
        assert!(read_varint(&mut Cursor::new(&[0x80u8])).is_err());
    }

    #[test]
    fn skip_past_end_is_an_error() {
        let mut cursor = Cursor::new(&[0u8; 4]);
        assert!(skip(&mut cursor, 8).is_err());
    }
}
