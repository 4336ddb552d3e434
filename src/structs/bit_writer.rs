use byteorder::WriteBytesExt;

use std::io::{Result, Write};

use crate::consts::BITS_IN_BYTE;

/// Gathers bits LSB-first into an 8-bit shift register and writes each full
/// byte through to the sink. `flush` pads a trailing partial byte with
/// zeros so the stream length is deterministic regardless of where the
/// last bit fell.
pub struct LsbBitWriter<W> {
    sink: W,
    accumulator: u8,
    bit_count: u32,
}

impl<W: Write> LsbBitWriter<W> {
    pub fn new(sink: W) -> Self {
        LsbBitWriter {
            sink,
            accumulator: 0,
            bit_count: 0,
        }
    }

    #[inline(always)]
    pub fn put(&mut self, bit: u8) -> Result<()> {
        debug_assert!(bit <= 1);

        self.accumulator |= bit << self.bit_count;
        self.bit_count += 1;

        if self.bit_count == BITS_IN_BYTE {
            self.sink.write_u8(self.accumulator)?;
            self.accumulator = 0;
            self.bit_count = 0;
        }

        return Ok(());
    }

    pub fn flush(&mut self) -> Result<()> {
        if self.bit_count != 0 {
            self.sink.write_u8(self.accumulator)?;
            self.accumulator = 0;
            self.bit_count = 0;
        }

        self.sink.flush()
    }
}

#[test]
fn bits_fill_bytes_low_end_first() {
    let mut output = Vec::new();
    let mut writer = LsbBitWriter::new(&mut output);

    // 0xb2 = 0b10110010, fed least significant bit first
    for i in 0..8 {
        writer.put((0xb2u8 >> i) & 1).unwrap();
    }
    writer.flush().unwrap();

    assert_eq!(output, vec![0xb2]);
}

#[test]
fn partial_byte_is_zero_padded_on_flush() {
    let mut output = Vec::new();
    let mut writer = LsbBitWriter::new(&mut output);

    writer.put(1).unwrap();
    writer.put(1).unwrap();
    writer.put(0).unwrap();
    writer.put(1).unwrap();
    writer.flush().unwrap();

    assert_eq!(output, vec![0b0000_1011]);
}

#[test]
fn flush_with_empty_accumulator_writes_nothing() {
    let mut output = Vec::new();
    let mut writer = LsbBitWriter::new(&mut output);

    for i in 0..16u8 {
        writer.put(i & 1).unwrap();
    }
    writer.flush().unwrap();
    writer.flush().unwrap();

    assert_eq!(output.len(), 2);
}
