//! # ctm-gateway: CTM adaptation gateway
//!
//! A 3GPP Cellular Text Telephone Modem (CTM) adaptation gateway: it sits
//! between a legacy PSTN Baudot (45.45/50 baud FSK) telephony leg and a
//! cellular voice channel, converting Baudot tones into robust CTM bursts
//! (1-of-4 tone modulation with rate-1/4 convolutional coding and diagonal
//! interleaving) and back, while negotiating with the far end and staying
//! transparent to plain voice calls.
//!
//! ## Architecture
//!
//! - [`fifo`]: bounded, drop-free queues shared by every stateful component
//! - [`dsp`]: fixed-point sine lookup and IIR filtering primitives
//! - [`conv`]: the rate-1/4 K=5 convolutional encoder and soft-input Viterbi decoder
//! - [`interleave`]: the diagonal (chain) interleaver/deinterleaver, m-sequences and scrambling
//! - [`ctm`]: the CTM tone modem, preamble/resync correlator, and burst transmitter/receiver glue
//! - [`baudot`]: the Baudot/ITA2 tone modem and character-set translation
//! - [`controller`]: the adaptation control plane tying both legs together
//! - [`types`]: shared value types crossing module boundaries
//! - [`config`] / [`error`]: session configuration and reportable error conditions
//!
//! ## Quick start
//!
//! ```
//! use ctm_gateway::config::GatewayConfig;
//! use ctm_gateway::controller::{EofFlags, GatewayController};
//!
//! let config = GatewayConfig::new().with_negotiation(false);
//! let mut gateway = GatewayController::new(config).unwrap();
//!
//! gateway.queue_text("HELLO");
//! let silence = [0i16; 160];
//! let frame = gateway.process_audio_frame(&silence, &silence).unwrap();
//! assert_eq!(frame.ctm_out.len(), 160);
//! assert!(!gateway.is_terminated(EofFlags::default()));
//! ```

pub mod baudot;
pub mod config;
pub mod controller;
pub mod conv;
pub mod ctm;
pub mod dsp;
pub mod error;
pub mod fifo;
pub mod interleave;
pub mod types;

pub use config::GatewayConfig;
pub use controller::GatewayController;
pub use error::{GatewayError, Result};

/// Library version, from the crate's `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
