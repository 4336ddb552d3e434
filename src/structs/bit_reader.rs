use std::io::{Read, Result};

use crate::consts::BITS_IN_BYTE;

/// Decomposes a byte stream into bits, least significant bit of each byte
/// first. Refills one byte at a time; a buffered upstream reader already
/// handles small reads efficiently so nothing fancier is needed here.
pub struct LsbBitReader<R> {
    upstream_reader: R,
    current: u8,
    bits_left: u32,
}

impl<R: Read> LsbBitReader<R> {
    pub fn new(reader: R) -> Self {
        LsbBitReader {
            upstream_reader: reader,
            current: 0,
            bits_left: 0,
        }
    }

    /// the next bit of the stream, or `None` once the bytes run out
    #[inline(always)]
    pub fn next_bit(&mut self) -> Result<Option<u8>> {
        if self.bits_left == 0 {
            let mut v = [0u8; 1];
            if self.upstream_reader.read(&mut v)? == 0 {
                return Ok(None);
            }

            self.current = v[0];
            self.bits_left = BITS_IN_BYTE;
        }

        let bit = self.current & 1;
        self.current >>= 1;
        self.bits_left -= 1;

        return Ok(Some(bit));
    }
}

#[test]
fn bytes_unpack_low_bit_first() {
    let data: &[u8] = &[0xb2, 0x01];
    let mut reader = LsbBitReader::new(data);

    let mut bits = Vec::new();
    while let Some(bit) = reader.next_bit().unwrap() {
        bits.push(bit);
    }

    assert_eq!(
        bits,
        vec![0, 1, 0, 0, 1, 1, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0],
        "0xb2 then 0x01, each least significant bit first"
    );
}

#[test]
fn empty_stream_yields_no_bits() {
    let data: &[u8] = &[];
    let mut reader = LsbBitReader::new(data);
    assert!(reader.next_bit().unwrap().is_none());
    assert!(reader.next_bit().unwrap().is_none());
}
