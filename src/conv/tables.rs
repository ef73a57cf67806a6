//! Rate-1/4, K=5 convolutional code parameters.
//!
//! The four generator polynomials below are the actual rate-1/4
//! constraint-length-5 generators (`POLY45A..D` in the reference source),
//! not the constraint-length-8 generators a casual read of octal-looking
//! constants elsewhere might suggest — those collide when reduced to 5
//! bits and cannot form an independent rate-1/4 code.

/// Code rate: gross bits emitted per net input bit.
pub const CHC_RATE: usize = 4;
/// Constraint length.
pub const CHC_K: usize = 5;
/// Trellis states: `2^(CHC_K-1)`.
pub const NUM_NODES: usize = 1 << (CHC_K - 1);
/// Traceback depth, in trellis steps.
pub const BLOCK: usize = 5;
/// Path history length in bits: `BLOCK * CHC_K`.
pub const PATH_LEN: usize = BLOCK * CHC_K;

pub const POLY_A: u16 = 0x15;
pub const POLY_B: u16 = 0x17;
pub const POLY_C: u16 = 0x1B;
pub const POLY_D: u16 = 0x1F;

/// The four generators in output order.
pub const POLYNOMIALS: [u16; CHC_RATE] = [POLY_A, POLY_B, POLY_C, POLY_D];
