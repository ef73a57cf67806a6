//! Rate-1/4, K=5 non-systematic convolutional encoder.

use super::tables::{CHC_K, CHC_RATE, POLYNOMIALS};

/// Streaming convolutional encoder. One net bit in, [`CHC_RATE`] gross
/// bits out.
#[derive(Debug, Clone)]
pub struct ConvEncoder {
    impulse_response: [u8; CHC_RATE * CHC_K],
    temp: [u8; CHC_RATE * CHC_K],
}

impl ConvEncoder {
    pub fn new() -> Self {
        let mut impulse_response = [0u8; CHC_RATE * CHC_K];
        let mut cnt = 0;
        for i in (1..=CHC_K).rev() {
            for poly in POLYNOMIALS {
                impulse_response[cnt] = ((poly >> (i - 1)) & 0x1) as u8;
                cnt += 1;
            }
        }
        Self {
            impulse_response,
            temp: [0u8; CHC_RATE * CHC_K],
        }
    }

    /// Clears the shift register without recomputing the impulse response.
    pub fn reset(&mut self) {
        self.temp.iter_mut().for_each(|v| *v = 0);
    }

    /// Encodes one net bit (any nonzero value counts as 1), appending
    /// [`CHC_RATE`] gross bits to `out`.
    pub fn encode_bit(&mut self, net_bit: bool, out: &mut Vec<u8>) {
        let input = u8::from(net_bit);
        for i in 0..CHC_RATE * CHC_K {
            self.temp[i] = (self.temp[i] + input * self.impulse_response[i]) % 2;
        }
        out.extend_from_slice(&self.temp[..CHC_RATE]);

        self.temp.copy_within(CHC_RATE.., 0);
        for v in &mut self.temp[CHC_RATE * CHC_K - CHC_RATE..] {
            *v = 0;
        }
    }

    /// Encodes a run of net bits.
    pub fn encode(&mut self, net_bits: &[bool]) -> Vec<u8> {
        let mut out = Vec::with_capacity(net_bits.len() * CHC_RATE);
        for &bit in net_bits {
            self.encode_bit(bit, &mut out);
        }
        out
    }

    /// Flushes the encoder back to the all-zero state by feeding `K-1`
    /// zero bits, returning the trailing gross bits produced.
    pub fn flush(&mut self) -> Vec<u8> {
        let mut out = Vec::with_capacity((CHC_K - 1) * CHC_RATE);
        for _ in 0..CHC_K - 1 {
            self.encode_bit(false, &mut out);
        }
        out
    }
}

impl Default for ConvEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_input_stays_all_zero() {
        let mut enc = ConvEncoder::new();
        let out = enc.encode(&[false; 10]);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn rate_is_four_to_one() {
        let mut enc = ConvEncoder::new();
        let out = enc.encode(&[true, false, true, true, false]);
        assert_eq!(out.len(), 5 * CHC_RATE);
    }

    #[test]
    fn reset_clears_shift_register() {
        let mut enc = ConvEncoder::new();
        enc.encode(&[true, true, true]);
        enc.reset();
        let out = enc.encode(&[false]);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn single_one_bit_matches_impulse_response_prefix() {
        let mut enc = ConvEncoder::new();
        let expected = enc.impulse_response[..CHC_RATE].to_vec();
        let mut out = Vec::new();
        enc.encode_bit(true, &mut out);
        assert_eq!(out, expected);
    }
}
