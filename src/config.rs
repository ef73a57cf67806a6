//! Session configuration — the gateway's control surface.

use crate::error::{GatewayError, Result};

/// Nominal DSP frame size in samples (20 ms at 8 kHz). Setting this to 1
/// yields sample-by-sample operation.
pub const DEFAULT_LENGTH_TONE_VEC: usize = 160;

/// Configuration for one gateway session (one call, one direction pair).
///
/// Construction never fails; call [`GatewayConfig::validate`] once the
/// collaborator handles are known to catch configuration errors (mutually
/// exclusive modes, missing filename) before any session state is
/// allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GatewayConfig {
    /// When `false`, skip the enquiry/acknowledgement exchange and assume
    /// the far end is CTM-capable from the first burst.
    pub negotiation_enabled: bool,
    /// Exit as soon as the text/Baudot input side is exhausted and the
    /// in-flight transmit path drains, rather than waiting for both
    /// directions to hit EOF.
    pub shutdown_on_eof: bool,
    /// Hard sample budget; `None` means run until both streams EOF and all
    /// queues drain.
    pub num_samples_to_process: Option<u64>,
    /// Byte-swap 16-bit PCM words at the I/O boundary, for loading
    /// big-endian reference vectors on a little-endian host.
    pub compat_byte_swap: bool,
    /// DSP frame size in samples. 1 enables sample-by-sample mode.
    pub length_tone_vec: usize,
    /// Samples per Baudot bit: 176 at 45.45 baud, 160 at 50 baud.
    pub baudot_bit_duration: usize,
    /// Whether the controller may copy audio straight across a leg when
    /// no character is in flight on it (voice pass-through). When
    /// `false`, an idle leg emits silence instead.
    pub bypass_enabled: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            negotiation_enabled: true,
            shutdown_on_eof: false,
            num_samples_to_process: None,
            compat_byte_swap: false,
            length_tone_vec: DEFAULT_LENGTH_TONE_VEC,
            baudot_bit_duration: BAUDOT_BIT_DURATION_45_45_BAUD,
            bypass_enabled: true,
        }
    }
}

/// Samples per bit at 45.45 baud (the US TTY convention), 8 kHz sampling.
pub const BAUDOT_BIT_DURATION_45_45_BAUD: usize = 176;
/// Samples per bit at 50 baud, 8 kHz sampling.
pub const BAUDOT_BIT_DURATION_50_BAUD: usize = 160;

impl GatewayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_negotiation(mut self, enabled: bool) -> Self {
        self.negotiation_enabled = enabled;
        self
    }

    pub fn with_shutdown_on_eof(mut self, enabled: bool) -> Self {
        self.shutdown_on_eof = enabled;
        self
    }

    pub fn with_num_samples(mut self, n: u64) -> Self {
        self.num_samples_to_process = Some(n);
        self
    }

    pub fn with_length_tone_vec(mut self, n: usize) -> Self {
        self.length_tone_vec = n;
        self
    }

    pub fn with_baudot_bit_duration(mut self, n: usize) -> Self {
        self.baudot_bit_duration = n;
        self
    }

    pub fn with_bypass_enabled(mut self, enabled: bool) -> Self {
        self.bypass_enabled = enabled;
        self
    }

    /// Validates the configuration. `init` must call this and retain no
    /// state on failure.
    pub fn validate(&self) -> Result<()> {
        if self.length_tone_vec == 0 {
            return Err(GatewayError::invalid_config(
                "length_tone_vec must be >= 1",
            ));
        }
        if self.baudot_bit_duration == 0 {
            return Err(GatewayError::invalid_config(
                "baudot_bit_duration must be >= 1",
            ));
        }
        if let Some(0) = self.num_samples_to_process {
            return Err(GatewayError::invalid_config(
                "num_samples_to_process must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

/// Byte-swaps each 16-bit PCM sample in place.
///
/// Endianness adaptation is explicitly a collaborator concern (spec §1):
/// the DSP core never calls this itself. It exists so an I/O boundary
/// that honors [`GatewayConfig::compat_byte_swap`] has a single place to
/// apply the swap when loading/writing reference vectors distributed in
/// the opposite endianness from the host.
pub fn byte_swap_samples(samples: &mut [i16]) {
    for s in samples.iter_mut() {
        *s = s.swap_bytes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_swap_is_its_own_inverse() {
        let mut samples = [0x1234i16, -1, 0, 0x7FFFu16 as i16];
        let original = samples;
        byte_swap_samples(&mut samples);
        assert_ne!(samples[0], original[0]);
        byte_swap_samples(&mut samples);
        assert_eq!(samples, original);
    }

    #[test]
    fn default_config_validates() {
        assert!(GatewayConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_length_tone_vec_rejected() {
        let cfg = GatewayConfig::new().with_length_tone_vec(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_num_samples_rejected() {
        let cfg = GatewayConfig::new().with_num_samples(0);
        assert!(cfg.validate().is_err());
    }
}
