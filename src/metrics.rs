/// counters drained out of a coder once its stream is finished. The decoder
/// matches the encoder's counters through the last real source bit; past
/// that point the terminator bits decode as spurious extra bits and can push
/// the decoder's totals ahead, so its end-of-run numbers may exceed the
/// encoder's but can never trail them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelMetrics {
    /// how many times a busy successor state was split in two
    pub cloning_count: u64,

    /// number of states in the graph, initial topology included
    pub state_count: u64,
}
