use std::io::{Result, Write};

use crate::consts::CODER_BITS;
use crate::metrics::ModelMetrics;
use crate::options::DmcOptions;
use crate::structs::bit_writer::LsbBitWriter;
use crate::structs::coder_bounds::CoderBounds;
use crate::structs::markov_model::MarkovModel;

/// Encoded bits that have arrived but do not yet pin the interval to one
/// side of the split point. At most 31 bits are ever pending, so the queue
/// packs into a u32: pushes shift in at the low end, pops drop the high
/// (oldest) bit.
struct AmbiguityQueue {
    bits: u32,
    len: u32,
}

impl AmbiguityQueue {
    fn new() -> Self {
        AmbiguityQueue { bits: 0, len: 0 }
    }

    #[inline(always)]
    fn push_back(&mut self, bit: u8) {
        debug_assert!(self.len < CODER_BITS, "queue would exceed coder width");
        self.bits = (self.bits << 1) | u32::from(bit);
        self.len += 1;
    }

    #[inline(always)]
    fn pop_front(&mut self) {
        debug_assert!(self.len > 0, "normalization popped an empty queue");
        self.len -= 1;
        self.bits &= (1 << self.len) - 1;
    }

    /// smallest 31-bit value whose leading bits match the queue
    #[inline(always)]
    fn min_value(&self) -> u32 {
        self.bits << (CODER_BITS - self.len)
    }

    /// largest 31-bit value whose leading bits match the queue
    #[inline(always)]
    fn max_value(&self) -> u32 {
        self.min_value() | ((1 << (CODER_BITS - self.len)) - 1)
    }
}

/// The mirror of the encoder: encoded bits are buffered until the values
/// they could still denote lie entirely on one side of the split point,
/// at which moment the source bit is known and the model evolves exactly
/// as it did on the encoding side. One incoming bit can settle many source
/// bits when the model is confident, and several incoming bits may settle
/// none.
///
/// The decoder has no idea where the real payload ends; the terminator
/// bits the encoder appends decode as ordinary (spurious) bits, so the
/// output can run past the original stream. Callers that need the exact
/// original length must track it out of band.
pub struct DmcDecoder<W> {
    model: MarkovModel,
    bounds: CoderBounds,
    pending: AmbiguityQueue,
    bit_writer: LsbBitWriter<W>,
}

impl<W: Write> DmcDecoder<W> {
    pub fn new(sink: W, options: &DmcOptions) -> Self {
        DmcDecoder {
            model: MarkovModel::new(options),
            bounds: CoderBounds::new(),
            pending: AmbiguityQueue::new(),
            bit_writer: LsbBitWriter::new(sink),
        }
    }

    /// feeds one encoded bit and drains every source bit it settles
    pub fn decode_bit(&mut self, encoded_bit: u8) -> Result<()> {
        self.pending.push_back(encoded_bit);

        loop {
            let mp = self.bounds.split_point(self.model.current_node());

            let decided = if self.pending.min_value() >= mp {
                self.bounds.pin_one(mp);
                1
            } else if self.pending.max_value() < mp {
                self.bounds.pin_zero(mp);
                0
            } else {
                // still ambiguous, wait for more encoded bits
                return Ok(());
            };

            // every settled prefix bit has been consumed from the queue
            while self.bounds.top_bits_agree() {
                self.bounds.shift_out();
                self.pending.pop_front();
            }

            self.model.clone_successor(decided);
            self.model.record_transition(decided);

            self.bit_writer.put(decided)?;
        }
    }

    /// flushes any partial output byte once the encoded stream is done
    pub fn finish(&mut self) -> Result<()> {
        self.bit_writer.flush()
    }

    pub fn metrics(&self) -> ModelMetrics {
        self.model.metrics()
    }
}

#[test]
fn ambiguity_queue_bounds_track_the_prefix() {
    let mut queue = AmbiguityQueue::new();

    // empty queue spans the whole interval
    assert_eq!(queue.min_value(), 0);
    assert_eq!(queue.max_value(), (1 << CODER_BITS) - 1);

    queue.push_back(1);
    assert_eq!(queue.min_value(), 1 << (CODER_BITS - 1));
    assert_eq!(queue.max_value(), (1 << CODER_BITS) - 1);

    queue.push_back(0);
    assert_eq!(queue.min_value(), 1 << (CODER_BITS - 1));
    assert_eq!(
        queue.max_value(),
        (1 << (CODER_BITS - 1)) | ((1 << (CODER_BITS - 2)) - 1)
    );

    // popping the front drops the oldest bit, the 0 remains
    queue.pop_front();
    assert_eq!(queue.min_value(), 0);
    assert_eq!(queue.max_value(), (1 << (CODER_BITS - 1)) - 1);
}

#[test]
fn queue_holds_a_full_coder_width() {
    let mut queue = AmbiguityQueue::new();
    for i in 0..CODER_BITS {
        queue.push_back((i & 1) as u8);
    }

    assert_eq!(queue.min_value(), queue.max_value());

    for _ in 0..CODER_BITS {
        queue.pop_front();
    }
    assert_eq!(queue.min_value(), 0);
    assert_eq!(queue.max_value(), (1 << CODER_BITS) - 1);
}
