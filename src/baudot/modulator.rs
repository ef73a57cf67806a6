//! Baudot tone modulator: phase-continuous FSK synthesis with automatic
//! SHIFT-symbol insertion and a trailing-mark flush.

use crate::fifo::Fifo;
use crate::types::{TtyCode, BAUDOT_SHIFT_FIGURES, BAUDOT_SHIFT_LETTERS};

const BAUDOT_NUM_INFO_BITS: u8 = 5;
const NUM_STOP_BITS_TX: u8 = 2;

/// Full-period, 40-step sine table used only by the tone modulator: coarser
/// than [`crate::dsp::sine`]'s 160-step tables, since the modulator's phase
/// counter advances by 7 or 9 units per sample and wraps at 40.
const BAUDOT_SINE_TABLE: [i16; 40] = [
    0, 5126, 10126, 14876, 19260, 23170, 26509, 29196, 31163, 32364, 32767, 32364, 31163, 29196,
    26509, 23170, 19260, 14876, 10126, 5126, 0, -5126, -10126, -14876, -19260, -23170, -26509,
    -29196, -31163, -32364, -32767, -32364, -31163, -29196, -26509, -23170, -19260, -14876,
    -10126, -5126,
];

/// Number of characters after which a SHIFT symbol is re-sent even if the
/// shift context hasn't changed, so a receiver that joins mid-stream
/// resynchronizes within a bounded number of characters.
const SHIFT_REFRESH_INTERVAL: u32 = 72;

/// Phase-continuous FSK modulator for one direction of Baudot audio.
/// `bit_duration` is the sample count per bit (176 for 45.45 baud, 160 for
/// 50 baud).
#[derive(Debug, Clone)]
pub struct BaudotModulator {
    bit_duration: i16,
    bits: Fifo<i16>,
    phase_value: i16,
    cnt_sample: i16,
    tx_bit_actual: i16,
    tx_bit_available: bool,
    in_figure_mode: bool,
    cnt_chars_since_last_shift: u32,
    tail_bits_generated: bool,
}

impl BaudotModulator {
    pub fn new(bit_duration: i16) -> Self {
        Self {
            bit_duration,
            bits: Fifo::new(2 * (1 + BAUDOT_NUM_INFO_BITS as usize + NUM_STOP_BITS_TX as usize)),
            phase_value: 0,
            cnt_sample: 0,
            tx_bit_actual: 0,
            tx_bit_available: false,
            in_figure_mode: false,
            // Forces an initial SHIFT symbol before the very first character.
            cnt_chars_since_last_shift: SHIFT_REFRESH_INTERVAL,
            tail_bits_generated: true,
        }
    }

    pub fn reset(&mut self) {
        self.bits.reset();
        self.phase_value = 0;
        self.cnt_sample = 0;
        self.tx_bit_available = false;
        self.in_figure_mode = false;
        self.cnt_chars_since_last_shift = SHIFT_REFRESH_INTERVAL;
        self.tail_bits_generated = true;
    }

    fn push_framed_code(&mut self, pattern5: u8) {
        let mut framed = Vec::with_capacity(1 + BAUDOT_NUM_INFO_BITS as usize + NUM_STOP_BITS_TX as usize);
        framed.push(0); // start bit
        for cnt in 0..BAUDOT_NUM_INFO_BITS {
            framed.push(i16::from((pattern5 >> cnt) & 1));
        }
        for _ in 0..NUM_STOP_BITS_TX {
            framed.push(1); // stop bit
        }
        self.bits.push(&framed);
    }

    /// Queues one character for transmission, inserting a LETTERS/FIGURES
    /// shift symbol first if the character's shift context doesn't match
    /// the modulator's current mode, or if too many characters have
    /// elapsed since the last shift symbol was sent.
    pub fn queue(&mut self, code: TtyCode) {
        let pattern5 = code.pattern5();
        let wants_figures = code.in_figures();

        if wants_figures && (!self.in_figure_mode || self.cnt_chars_since_last_shift >= SHIFT_REFRESH_INTERVAL) {
            self.push_framed_code(BAUDOT_SHIFT_FIGURES);
            self.cnt_chars_since_last_shift = 0;
            self.in_figure_mode = true;
        }
        if !wants_figures && (self.in_figure_mode || self.cnt_chars_since_last_shift >= SHIFT_REFRESH_INTERVAL) {
            self.push_framed_code(BAUDOT_SHIFT_LETTERS);
            self.cnt_chars_since_last_shift = 0;
            self.in_figure_mode = false;
        }

        self.push_framed_code(pattern5);
        self.cnt_chars_since_last_shift += 1;
        self.tail_bits_generated = false;
    }

    /// Generates `length` output samples, pulling queued bits as needed.
    /// Returns the number of bits still waiting to be fully modulated
    /// (including the one currently in flight), mirroring the reference
    /// modulator's `ptrNumBitsStillToModulate` output.
    pub fn generate(&mut self, length: usize, out: &mut Vec<i16>) -> i16 {
        if self.bits.len() <= 1 && !self.tail_bits_generated {
            self.bits.push(&[1; 8]);
            self.tail_bits_generated = true;
        }

        for _ in 0..length {
            if self.cnt_sample == 0 {
                if !self.bits.is_empty() {
                    self.tx_bit_actual = self.bits.pop_one();
                    self.tx_bit_available = true;
                } else {
                    self.tx_bit_available = false;
                }
            }

            if self.tx_bit_available {
                self.phase_value += 9 - 2 * self.tx_bit_actual;
                if self.phase_value >= 40 {
                    self.phase_value -= 40;
                }
                out.push(BAUDOT_SINE_TABLE[self.phase_value as usize] >> 1);

                self.cnt_sample += 1;
                if self.cnt_sample >= self.bit_duration {
                    self.cnt_sample = 0;
                }
            } else {
                self.phase_value = 0;
                out.push(0);
            }
        }

        let mut remaining = self.bits.len() as i16;
        if self.cnt_sample > 0 {
            remaining += 1;
        }
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_modulator_emits_silence() {
        let mut m = BaudotModulator::new(176);
        let mut out = Vec::new();
        let remaining = m.generate(2000, &mut out);
        assert_eq!(out.len(), 2000);
        assert_eq!(remaining, 0);
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn queued_character_produces_nonzero_tones() {
        let mut m = BaudotModulator::new(176);
        m.queue(TtyCode::new(BAUDOT_NUM_INFO_BITS, false));
        let mut out = Vec::new();
        m.generate(176 * 9, &mut out);
        assert!(out.iter().any(|&s| s != 0));
    }

    #[test]
    fn reset_forces_a_fresh_shift_symbol() {
        let mut m = BaudotModulator::new(176);
        m.queue(TtyCode::new(1, false));
        let mut out = Vec::new();
        m.generate(176 * 9, &mut out);
        m.reset();
        assert_eq!(m.cnt_chars_since_last_shift, SHIFT_REFRESH_INTERVAL);
    }
}
