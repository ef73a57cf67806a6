//! Error handling for the CTM gateway.
//!
//! Mirrors the codec-core convention: a single `thiserror`-derived enum for
//! conditions that are actually reported to a caller. Programming errors
//! (FIFO overflow/underrun, invalid polynomial lookup, out-of-range phase,
//! negative mute index) are not represented here — they panic at the call
//! site, since they indicate a bug rather than a runtime condition.

use thiserror::Error;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Reportable error conditions for the CTM gateway: negotiation failure,
/// surfaced I/O conditions and configuration errors. Programming errors and
/// transient signal errors are not represented by this type.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Mutually exclusive or missing configuration at `init`.
    #[error("invalid gateway configuration: {details}")]
    InvalidConfig { details: String },

    /// No CTM acknowledgement after the configured number of enquiry
    /// bursts within the enquiry timeout. Not fatal — the controller falls
    /// back to audio bypass; this variant exists so the fallback can be
    /// logged/observed.
    #[error("CTM negotiation failed after {attempts} enquiries")]
    NegotiationTimedOut { attempts: u32 },

    /// Surfaced I/O condition from a collaborator stream.
    #[error("I/O condition on {stream}: {reason}")]
    IoCondition { stream: &'static str, reason: String },
}

impl GatewayError {
    pub fn invalid_config(details: impl Into<String>) -> Self {
        Self::InvalidConfig {
            details: details.into(),
        }
    }

    pub fn io_condition(stream: &'static str, reason: impl Into<String>) -> Self {
        Self::IoCondition {
            stream,
            reason: reason.into(),
        }
    }
}
