//! Baudot tone demodulator: IIR bandpass/envelope detection followed by a
//! start-bit/stop-bit framing state machine.
//!
//! The detector tracks the normalized difference between the signal power
//! in the 1400 Hz and 1800 Hz bands (`diff`). `diff > 0` means the 1400 Hz
//! ("mark"/'1') tone dominates, `diff < 0` means 1800 Hz ("space"/'0')
//! dominates; the magnitude of `diff` is a reliability score used to reject
//! noisy samples outright.

use crate::dsp::iir::{bandpass_1400_coeffs, bandpass_1800_coeffs, lowpass_coeffs, IirFilter};
use crate::fifo::Fifo;
use crate::types::{TtyCode, BAUDOT_SHIFT_FIGURES, BAUDOT_SHIFT_LETTERS};

const BAUDOT_NUM_INFO_BITS: u8 = 5;
const OFFSET_NORMALISATION: i64 = 60;
const THRESHOLD_DIFF: i64 = 2300;
const THRESHOLD_STARTBIT: i64 = 8;
const DURATION_STARTDETECT: u32 = 70;

/// Demodulator for one direction of Baudot audio. `bit_duration` is the
/// sample count per bit: 176 for 45.45 baud, 160 for 50 baud.
#[derive(Debug, Clone)]
pub struct BaudotDemodulator {
    bit_duration: usize,
    bp1400: IirFilter,
    bp1800: IirFilter,
    bp_envelope: IirFilter,
    lp0: IirFilter,
    lp1: IirFilter,
    lp2: IirFilter,
    buffer_diff: Vec<i64>,
    cnt_samples_for_start_bit: u32,
    cnt_samples_for_next_bit: usize,
    start_bit_detected: bool,
    cnt_bits_actual_char: u8,
    in_figure_mode: bool,
    pattern5: u8,
}

impl BaudotDemodulator {
    pub fn new(bit_duration: usize) -> Self {
        let (a_lp, b_lp) = lowpass_coeffs();
        let (a_bp1400, b_bp1400) = bandpass_1400_coeffs();
        let (a_bp1800, b_bp1800) = bandpass_1800_coeffs();
        Self {
            bit_duration,
            bp1400: IirFilter::new(a_bp1400, b_bp1400),
            bp1800: IirFilter::new(a_bp1800, b_bp1800),
            bp_envelope: IirFilter::new(a_lp.clone(), b_lp.clone()),
            lp0: IirFilter::new(a_lp.clone(), b_lp.clone()),
            lp1: IirFilter::new(a_lp.clone(), b_lp.clone()),
            lp2: IirFilter::new(a_lp, b_lp),
            buffer_diff: vec![0; bit_duration + 1],
            cnt_samples_for_start_bit: 0,
            cnt_samples_for_next_bit: 0,
            start_bit_detected: false,
            cnt_bits_actual_char: 0,
            in_figure_mode: false,
            pattern5: 0,
        }
    }

    pub fn reset(&mut self) {
        self.cnt_samples_for_start_bit = 0;
        self.cnt_samples_for_next_bit = 0;
        self.start_bit_detected = false;
        self.cnt_bits_actual_char = 0;
        self.in_figure_mode = false;
    }

    /// Current LETTERS/FIGURES shift context, kept in sync with the
    /// companion modulator by the controller.
    pub fn in_figure_mode(&self) -> bool {
        self.in_figure_mode
    }

    /// Info bits of the character currently being framed (0 if idle or
    /// still waiting on a start bit).
    pub fn cnt_bits_actual_char(&self) -> u8 {
        self.cnt_bits_actual_char
    }

    /// The 5-bit pattern accumulated so far for the character in
    /// progress.
    pub fn pattern5(&self) -> u8 {
        self.pattern5
    }

    /// Feeds a block of audio samples, pushing every completed [`TtyCode`]
    /// onto `out` as it's framed.
    pub fn process(&mut self, tone_vec: &[i16], out: &mut Fifo<TtyCode>) {
        for &sample in tone_vec {
            self.process_sample(sample, out);
        }
    }

    fn process_sample(&mut self, sample: i16, out: &mut Fifo<TtyCode>) {
        let half = sample >> 1;
        let bp1400_out = self.bp1400.step(half) as i64;
        let bp1800_out = self.bp1800.step(half) as i64;
        let bp_env_out = self.bp_envelope.step(half.unsigned_abs() as i16) as i64;

        let lp0 = self.lp0.step(bp_env_out.unsigned_abs() as i16) as i64;
        let lp1 = self.lp1.step(bp1400_out.unsigned_abs() as i16) as i64;
        let lp2 = self.lp2.step(bp1800_out.unsigned_abs() as i16) as i64;

        let diff: i64 = ((lp1 - lp2) << 14) / (lp0 + OFFSET_NORMALISATION);

        for cnt in (1..=self.bit_duration).rev() {
            self.buffer_diff[cnt] = self.buffer_diff[cnt - 1];
        }
        self.buffer_diff[0] = diff;

        if !self.start_bit_detected {
            let scaled_past = self.buffer_diff[self.bit_duration].min(-328);
            if diff < THRESHOLD_STARTBIT * scaled_past {
                self.cnt_samples_for_start_bit += 1;
            } else {
                self.cnt_samples_for_start_bit = 0;
            }

            if self.cnt_samples_for_start_bit >= DURATION_STARTDETECT && diff.abs() > THRESHOLD_DIFF {
                self.start_bit_detected = true;
                self.cnt_bits_actual_char = 0;
                self.cnt_samples_for_next_bit = 0;
                self.pattern5 = 0;
            }
        } else {
            self.cnt_samples_for_next_bit += 1;
            if self.cnt_samples_for_next_bit >= self.bit_duration {
                if diff.abs() <= THRESHOLD_DIFF {
                    self.start_bit_detected = false;
                    self.cnt_bits_actual_char = 0;
                } else if self.cnt_bits_actual_char < BAUDOT_NUM_INFO_BITS {
                    if diff > 0 {
                        self.pattern5 |= 1 << self.cnt_bits_actual_char;
                    }
                    self.cnt_bits_actual_char += 1;
                    self.cnt_samples_for_next_bit = 0;
                } else {
                    if diff < 0 {
                        // Stop bit wasn't mark tone: forget this character.
                    } else if self.pattern5 == BAUDOT_SHIFT_FIGURES {
                        self.in_figure_mode = true;
                    } else if self.pattern5 == BAUDOT_SHIFT_LETTERS {
                        self.in_figure_mode = false;
                    } else {
                        out.push_one(TtyCode::new(self.pattern5, self.in_figure_mode));
                    }
                    self.start_bit_detected = false;
                    self.cnt_bits_actual_char = 0;
                }
            }
        }
    }
}
