//! 1-of-4 tone modulator for the CTM burst format: each pair of adjacent
//! channel bits selects one of four tones (400/600/800/1000 Hz), held for
//! one [`SYMB_LEN`]-sample symbol. A guard-bit pair produces silence.

use super::defines::NCYCLES;
use crate::dsp::sine::sin_fip2047;
use crate::fifo::Fifo;
use crate::types::{SYMB_LEN, GUARD_BIT_SYMBOL};

fn build_waveforms() -> [[i16; 4]; SYMB_LEN] {
    let mut waveforms = [[0i16; 4]; SYMB_LEN];
    for (cnt, row) in waveforms.iter_mut().enumerate() {
        for (tone, &ncycles) in NCYCLES.iter().enumerate() {
            let phase = ((160 / SYMB_LEN) * cnt * ncycles) % 160;
            row[tone] = 8 * sin_fip2047(phase as i16);
        }
    }
    waveforms
}

/// Streaming 1-of-4 tone modulator.
#[derive(Clone)]
pub struct CtmModulator {
    waveforms: [[i16; 4]; SYMB_LEN],
    cnt_modulated_samples: usize,
    actual_bits: [i16; 2],
    tx_bits: Fifo<i16>,
}

impl CtmModulator {
    /// `tx_bits_capacity` should comfortably exceed the number of bits
    /// produced per processing frame (`2 * length_tone_vec / SYMB_LEN`).
    pub fn new(tx_bits_capacity: usize) -> Self {
        Self {
            waveforms: build_waveforms(),
            cnt_modulated_samples: SYMB_LEN,
            actual_bits: [GUARD_BIT_SYMBOL; 2],
            tx_bits: Fifo::new(tx_bits_capacity),
        }
    }

    pub fn reset(&mut self) {
        self.cnt_modulated_samples = SYMB_LEN;
        self.actual_bits = [GUARD_BIT_SYMBOL; 2];
        self.tx_bits.reset();
    }

    /// Gross bits still queued for modulation, not counting the one
    /// currently in flight. Mirrors the reference transmitter's
    /// `ptrNumBitsStillToModulate` output.
    pub fn bits_pending(&self) -> usize {
        self.tx_bits.len()
    }

    /// Queues `bits_in` (gross-bit wire values, see [`crate::types::GrossBit::to_wire`])
    /// and generates `num_samples` tone samples into `out`.
    pub fn modulate(&mut self, bits_in: &[i16], num_samples: usize, out: &mut Vec<i16>) {
        if !bits_in.is_empty() {
            self.tx_bits.push(bits_in);
        }

        for _ in 0..num_samples {
            if self.cnt_modulated_samples == SYMB_LEN {
                self.actual_bits = [GUARD_BIT_SYMBOL; 2];
                self.cnt_modulated_samples = 0;

                if self.tx_bits.len() >= 2 {
                    let popped = self.tx_bits.pop(2);
                    self.actual_bits[0] = popped[0];
                    self.actual_bits[1] = popped[1];
                } else if self.tx_bits.len() == 1 {
                    self.actual_bits[0] = self.tx_bits.pop_one();
                }
            }

            let both_guard = self.actual_bits[0].unsigned_abs() == GUARD_BIT_SYMBOL as u16
                && self.actual_bits[1].unsigned_abs() == GUARD_BIT_SYMBOL as u16;

            let sample = if both_guard {
                0
            } else {
                let tone = match (self.actual_bits[0] <= 0, self.actual_bits[1] <= 0) {
                    (true, true) => 0,
                    (true, false) => 1,
                    (false, true) => 2,
                    (false, false) => 3,
                };
                self.waveforms[self.cnt_modulated_samples][tone]
            };
            out.push(sample);
            self.cnt_modulated_samples += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_modulator_emits_silence() {
        let mut m = CtmModulator::new(16);
        let mut out = Vec::new();
        m.modulate(&[], SYMB_LEN * 3, &mut out);
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn two_real_bits_produce_a_nonsilent_symbol() {
        let mut m = CtmModulator::new(16);
        let mut out = Vec::new();
        m.modulate(&[1, -1], SYMB_LEN, &mut out);
        assert!(out.iter().any(|&s| s != 0));
    }

    #[test]
    fn reset_returns_to_idle_guard_state() {
        let mut m = CtmModulator::new(16);
        let mut out = Vec::new();
        m.modulate(&[1, 1], SYMB_LEN, &mut out);
        m.reset();
        assert_eq!(m.actual_bits, [GUARD_BIT_SYMBOL; 2]);
        assert_eq!(m.cnt_modulated_samples, SYMB_LEN);
    }
}
