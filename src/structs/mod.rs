pub mod bit_reader;
pub mod bit_writer;
pub mod coder_bounds;
pub mod dmc_decoder;
pub mod dmc_encoder;
pub mod markov_model;
pub mod markov_state;
