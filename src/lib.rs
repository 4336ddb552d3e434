//! Dynamic Markov Compression: a bit-level arithmetic coder whose
//! probabilities come from a Markov graph that adapts both its counts and
//! its topology as data flows through. Encoding and decoding evolve the
//! same graph in lockstep, so there is no header, no table and no framing
//! in the output, just the raw encoded bits.

mod consts;
mod dmc_error;
mod helpers;
mod metrics;
mod options;
mod structs;

pub use crate::dmc_error::{DmcError, ExitCode};
pub use crate::metrics::ModelMetrics;
pub use crate::options::{DmcOptions, ModelKind};
pub use crate::structs::dmc_decoder::DmcDecoder;
pub use crate::structs::dmc_encoder::DmcEncoder;

use anyhow::{Context, Result};

use std::io::{Read, Write};

use crate::helpers::here;
use crate::structs::bit_reader::LsbBitReader;

/// Compresses everything `reader` has to offer into `writer`, bit by bit,
/// and returns the model counters at the end of the run.
pub fn encode_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: W,
    options: &DmcOptions,
) -> Result<ModelMetrics> {
    let mut encoder = DmcEncoder::new(writer, options);
    let mut bit_reader = LsbBitReader::new(reader);

    while let Some(bit) = bit_reader.next_bit().context(here!())? {
        encoder.encode_bit(bit).context(here!())?;
    }

    encoder.finish().context(here!())?;

    return Ok(encoder.metrics());
}

/// Reverses `encode_stream`. The options must match the ones the stream
/// was encoded with; nothing in the stream itself can check that. Because
/// the terminator decodes as ordinary bits, the output may run up to a few
/// spurious bytes past the original data.
pub fn decode_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: W,
    options: &DmcOptions,
) -> Result<ModelMetrics> {
    let mut decoder = DmcDecoder::new(writer, options);
    let mut bit_reader = LsbBitReader::new(reader);

    while let Some(bit) = bit_reader.next_bit().context(here!())? {
        decoder.decode_bit(bit).context(here!())?;
    }

    decoder.finish().context(here!())?;

    return Ok(decoder.metrics());
}
