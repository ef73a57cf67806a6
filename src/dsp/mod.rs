//! Low-level fixed-point DSP building blocks: sine lookup and IIR
//! filtering, shared by the Baudot modem and the CTM tone codec.

pub mod iir;
pub mod sine;
