use std::io::{Result, Write};

use crate::consts::{CODER_BITS, MS_BIT, MS_MASK};
use crate::metrics::ModelMetrics;
use crate::options::DmcOptions;
use crate::structs::bit_writer::LsbBitWriter;
use crate::structs::coder_bounds::CoderBounds;
use crate::structs::markov_model::MarkovModel;

/// Drives source bits through the model and the interval, emitting encoded
/// bits whenever the bounds settle on a shared prefix. The model mutations
/// happen in a fixed order per bit (pin bounds, normalize, clone, count and
/// advance); the decoder replays exactly the same order, which is what
/// keeps the two graphs bit-for-bit identical.
pub struct DmcEncoder<W> {
    model: MarkovModel,
    bounds: CoderBounds,
    bit_writer: LsbBitWriter<W>,
}

impl<W: Write> DmcEncoder<W> {
    pub fn new(sink: W, options: &DmcOptions) -> Self {
        DmcEncoder {
            model: MarkovModel::new(options),
            bounds: CoderBounds::new(),
            bit_writer: LsbBitWriter::new(sink),
        }
    }

    #[inline(always)]
    pub fn encode_bit(&mut self, bit: u8) -> Result<()> {
        let mp = self.bounds.split_point(self.model.current_node());
        self.encode_with_split(bit, mp)
    }

    fn encode_with_split(&mut self, bit: u8, mp: u32) -> Result<()> {
        if bit == 1 {
            self.bounds.pin_one(mp);
        } else {
            self.bounds.pin_zero(mp);
        }

        while self.bounds.top_bits_agree() {
            let out = self.bounds.shift_out();
            self.bit_writer.put(out)?;
        }

        self.model.clone_successor(bit);
        self.model.record_transition(bit);

        return Ok(());
    }

    /// Terminates the stream so the decoder can settle every real bit.
    /// Seven dummy bits are encoded first, each chosen so normalization
    /// makes progress (the dummy lands on whichever side of the split
    /// shares its top bit with `lower`); they guarantee the last real bit
    /// ends up inside a fully emitted byte. The split point is then spilled
    /// from the top down to its most significant bit, and the accumulator
    /// is flushed.
    pub fn finish(&mut self) -> Result<()> {
        for _ in 0..7 {
            let mp = self.bounds.split_point(self.model.current_node());
            if (self.bounds.lower() & MS_BIT) == (mp & MS_BIT) {
                self.encode_with_split(0, mp)?;
            } else {
                self.encode_with_split(1, mp)?;
            }
        }

        let mut mp = self.bounds.split_point(self.model.current_node());
        while mp != MS_BIT {
            self.bit_writer.put((mp >> (CODER_BITS - 1)) as u8)?;
            mp = (mp << 1) & MS_MASK;
        }

        self.bit_writer.flush()
    }

    pub fn metrics(&self) -> ModelMetrics {
        self.model.metrics()
    }
}

#[cfg(test)]
use crate::options::ModelKind;

#[test]
fn empty_stream_still_terminates_on_byte_boundary() {
    let mut encoded = Vec::new();
    let mut encoder = DmcEncoder::new(&mut encoded, &DmcOptions::default());
    encoder.finish().unwrap();

    let metrics = encoder.metrics();
    assert_eq!(metrics.cloning_count, 0);
    assert_eq!(metrics.state_count, 2048);

    drop(encoder);
    assert!(!encoded.is_empty(), "terminator alone must produce output");
    assert!(encoded.len() <= 8, "terminator should stay small");
}

#[test]
fn identical_runs_produce_identical_output() {
    let data = b"abracadabra abracadabra";

    let mut first = Vec::new();
    let mut second = Vec::new();

    for output in [&mut first, &mut second] {
        let mut encoder = DmcEncoder::new(output, &DmcOptions::default());
        for byte in data.iter() {
            for i in 0..8 {
                encoder.encode_bit((byte >> i) & 1).unwrap();
            }
        }
        encoder.finish().unwrap();
    }

    assert_eq!(first, second);
}

#[test]
fn byte_model_starts_with_255_states() {
    let mut encoded = Vec::new();
    let options = DmcOptions {
        model_kind: ModelKind::Byte,
        ..DmcOptions::default()
    };
    let mut encoder = DmcEncoder::new(&mut encoded, &options);
    encoder.finish().unwrap();

    assert_eq!(encoder.metrics().state_count, 255);
}
