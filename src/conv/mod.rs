//! Rate-1/4, constraint-length-5 convolutional channel code: encoder and
//! soft-input Viterbi decoder.

pub mod encoder;
pub mod tables;
pub mod viterbi;

pub use encoder::ConvEncoder;
pub use viterbi::Viterbi;
