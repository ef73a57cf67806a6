//! 1-of-4 tone demodulator for the CTM burst format: a bank of four
//! reference-waveform cross-correlators plus a wideband energy
//! correlator, low-pass smoothed and searched for the lag with the
//! sharpest separation between tones. That lag's correlations are turned
//! into a soft-valued bit pair, and the lag's drift from the symbol
//! center yields a ±1 sample-clock correction for the caller to apply.

use super::defines::NCYCLES;
use crate::dsp::sine::sin_fip;
use crate::types::{GrossBit, SYMB_LEN};

const ALPHA: i64 = 32113; // 32768*0.98
const ONE_MINUS_ALPHA: i64 = 655; // 32768*0.02
const ALPHA2: i64 = 32440; // 32768*0.99

/// `floor(0.5 + 32767*sinc((cnt-SYMB_LEN/2+1)/SYMB_LEN))` for `SYMB_LEN==40`,
/// used as a normalized lowpass impulse response on the rectified
/// correlations.
const SINC_WINDOW: [i32; SYMB_LEN] = [
    1717, 3581, 5571, 7663, 9834, 12054, 14297, 16533, 18730, 20860, 22893, 24799, 26552, 28127,
    29501, 30653, 31568, 32231, 32632, 32767, 32632, 32231, 31568, 30653, 29501, 28127, 26552,
    24799, 22893, 20860, 18730, 16533, 14297, 12054, 9834, 7663, 5571, 3581, 1717, 0,
];

fn build_waveforms() -> [[i16; SYMB_LEN]; 4] {
    let mut waveform = [[0i16; SYMB_LEN]; 4];
    for (tone, &ncycles) in NCYCLES.iter().enumerate() {
        for cnt in 0..SYMB_LEN {
            let phase = ((160 / SYMB_LEN) * cnt * ncycles) % 160;
            waveform[tone][cnt] = sin_fip(phase as i16) / SYMB_LEN as i16;
        }
    }
    waveform
}

fn build_lowpass() -> [i16; SYMB_LEN] {
    let sum: i64 = SINC_WINDOW.iter().map(|&v| v as i64).sum();
    let mut lowpass = [0i16; SYMB_LEN];
    for cnt in 0..SYMB_LEN {
        lowpass[cnt] = ((SINC_WINDOW[cnt] as i64 * 32767) / sum) as i16;
    }
    lowpass
}

/// Streaming 1-of-4 tone demodulator.
#[derive(Clone)]
pub struct CtmDemodulator {
    waveform: [[i16; SYMB_LEN]; 4],
    lowpass: [i16; SYMB_LEN],
    diff_smooth: [i16; SYMB_LEN],
    xcorr: [[i16; 2 * SYMB_LEN]; 4],
    xcorr_wb: [i16; 2 * SYMB_LEN],
    buffer_tone_rx: [i16; 3 * SYMB_LEN],
}

impl CtmDemodulator {
    pub fn new() -> Self {
        Self {
            waveform: build_waveforms(),
            lowpass: build_lowpass(),
            diff_smooth: [0; SYMB_LEN],
            xcorr: [[0; 2 * SYMB_LEN]; 4],
            xcorr_wb: [0; 2 * SYMB_LEN],
            buffer_tone_rx: [0; 3 * SYMB_LEN],
        }
    }

    pub fn reset(&mut self) {
        self.diff_smooth = [0; SYMB_LEN];
        self.xcorr = [[0; 2 * SYMB_LEN]; 4];
        self.xcorr_wb = [0; 2 * SYMB_LEN];
        self.buffer_tone_rx = [0; 3 * SYMB_LEN];
    }

    /// Demodulates one frame of `in_samples` (length `SYMB_LEN-1`,
    /// `SYMB_LEN`, or `SYMB_LEN+1`) into a pair of gross bits and a
    /// sampling-clock correction for the caller to apply to the next
    /// frame's length (`-1`, `0` or `+1`).
    ///
    /// # Panics
    /// Panics if `in_samples.len()` isn't one of the three accepted sizes.
    pub fn process(&mut self, in_samples: &[i16]) -> (GrossBit, GrossBit, i32) {
        let num_in = in_samples.len();
        if num_in + 1 == SYMB_LEN {
            self.diff_smooth.rotate_right(1);
        } else if num_in == SYMB_LEN + 1 {
            self.diff_smooth.rotate_left(1);
        } else if num_in != SYMB_LEN {
            panic!("CtmDemodulator::process: invalid frame length {num_in}");
        }

        let keep = 3 * SYMB_LEN - num_in;
        self.buffer_tone_rx.copy_within(num_in.., 0);
        self.buffer_tone_rx[keep..].copy_from_slice(in_samples);

        for lag in 0..SYMB_LEN - 1 {
            for t in 0..4 {
                self.xcorr[t][lag] = self.xcorr[t][lag + num_in];
            }
            self.xcorr_wb[lag] = self.xcorr_wb[lag + num_in];
        }

        for lag in SYMB_LEN - 1..2 * SYMB_LEN {
            let mut sum = [0i64; 4];
            let mut sumw = 0i64;
            for cnt in 0..SYMB_LEN {
                let sample = self.buffer_tone_rx[lag + cnt] as i64;
                for t in 0..4 {
                    sum[t] += sample * self.waveform[t][cnt] as i64;
                }
                sumw += sample.unsigned_abs() as i64;
            }
            for t in 0..4 {
                self.xcorr[t][lag] = (sum[t] >> 15) as i16;
            }
            self.xcorr_wb[lag] = (sumw / SYMB_LEN as i64) as i16;
        }

        let xcorr_abs: [[i16; 2 * SYMB_LEN]; 4] = {
            let mut abs = [[0i16; 2 * SYMB_LEN]; 4];
            for t in 0..4 {
                for lag in 0..2 * SYMB_LEN {
                    abs[t][lag] = self.xcorr[t][lag].unsigned_abs() as i16;
                }
            }
            abs
        };
        let xcorr_abs_wb: [i16; 2 * SYMB_LEN] = {
            let mut abs = [0i16; 2 * SYMB_LEN];
            for lag in 0..2 * SYMB_LEN {
                abs[lag] = self.xcorr_wb[lag].unsigned_abs() as i16;
            }
            abs
        };

        let mut xcorr_lp = [[0i16; SYMB_LEN]; 4];
        let mut xcorr_lp_wb = [0i16; SYMB_LEN];
        for lag in 0..SYMB_LEN {
            let mut sum = [0i64; 4];
            let mut sumw = 0i64;
            for cnt in 0..SYMB_LEN {
                let idx = SYMB_LEN + lag - cnt;
                let lp = self.lowpass[cnt] as i64;
                for t in 0..4 {
                    sum[t] += xcorr_abs[t][idx] as i64 * lp;
                }
                sumw += xcorr_abs_wb[idx] as i64 * lp;
            }
            for t in 0..4 {
                xcorr_lp[t][lag] = (sum[t] >> 15) as i16;
            }
            xcorr_lp_wb[lag] = (sumw >> 15) as i16;
        }

        let mut diff = [0i16; SYMB_LEN];
        let mut max_diff: i32 = 0;
        for lag in 0..SYMB_LEN {
            let v: [i64; 4] = std::array::from_fn(|t| xcorr_lp[t][lag] as i64);
            let sum: i64 = (v[0] - v[1]).abs()
                + (v[0] - v[2]).abs()
                + (v[0] - v[3]).abs()
                + (v[1] - v[2]).abs()
                + (v[1] - v[3]).abs()
                + (v[2] - v[3]).abs();
            diff[lag] = (sum / 6) as i16;
            if diff[lag] as i32 > max_diff {
                max_diff = diff[lag] as i32;
            }
        }

        let gain: u32 = if max_diff < 2048 {
            4
        } else if max_diff < 4096 {
            3
        } else if max_diff < 8192 {
            2
        } else if max_diff < 16384 {
            1
        } else {
            0
        };

        for lag in 0..SYMB_LEN {
            self.diff_smooth[lag] = if max_diff > 4 {
                let scaled = (diff[lag] as i64) << gain;
                ((ALPHA * self.diff_smooth[lag] as i64 + ONE_MINUS_ALPHA * scaled) >> 15) as i16
            } else {
                ((ALPHA2 * self.diff_smooth[lag] as i64) >> 15) as i16
            };
        }

        let mut index_max = 0usize;
        let mut max_diff_smooth: i16 = 0;
        for lag in 0..SYMB_LEN {
            if self.diff_smooth[lag] > max_diff_smooth {
                max_diff_smooth = self.diff_smooth[lag];
                index_max = lag;
            }
        }

        let xcorr0 = xcorr_lp[0][index_max] as i64;
        let xcorr1 = xcorr_lp[1][index_max] as i64;
        let xcorr2 = xcorr_lp[2][index_max] as i64;
        let xcorr3 = xcorr_lp[3][index_max] as i64;
        let xcorrw = xcorr_lp_wb[index_max] as i64;

        let (mut bit0, mut bit1, soft_value): (i32, i32, i64) = if xcorr0 >= xcorr1 && xcorr0 >= xcorr2 && xcorr0 >= xcorr3 {
            let soft = xcorr0 - (xcorr1 + xcorr2 + xcorr3) / 3;
            (-soft as i32, -soft as i32, soft)
        } else if xcorr1 >= xcorr0 && xcorr1 >= xcorr2 && xcorr1 >= xcorr3 {
            let soft = xcorr1 - (xcorr0 + xcorr2 + xcorr3) / 3;
            (-soft as i32, soft as i32, soft)
        } else if xcorr2 >= xcorr0 && xcorr2 >= xcorr1 && xcorr2 >= xcorr3 {
            let soft = xcorr2 - (xcorr0 + xcorr1 + xcorr3) / 3;
            (soft as i32, -soft as i32, soft)
        } else {
            let soft = xcorr3 - (xcorr0 + xcorr1 + xcorr2) / 3;
            (soft as i32, soft as i32, soft)
        };

        if 7 * soft_value > xcorrw + 10 {
            bit0 |= 1;
            bit1 |= 1;
        } else {
            bit0 &= !1;
            bit1 &= !1;
        }

        let mut sampling_correction = 0i32;
        if max_diff > 40 {
            if index_max < SYMB_LEN / 2 {
                sampling_correction = -1;
            }
            if index_max > SYMB_LEN / 2 {
                sampling_correction = 1;
            }
        }

        (
            GrossBit::from_wire(bit0 as i16),
            GrossBit::from_wire(bit1 as i16),
            sampling_correction,
        )
    }
}

impl Default for CtmDemodulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctm::modulator::CtmModulator;

    #[test]
    fn silence_frames_process_without_panicking() {
        let mut demod = CtmDemodulator::new();
        for _ in 0..20 {
            let (b0, b1, corr) = demod.process(&[0i16; SYMB_LEN]);
            assert!(b0.hard_bit().is_some() || b0.is_guard());
            let _ = (b1, corr);
        }
    }

    #[test]
    fn accepts_off_by_one_frame_lengths() {
        let mut demod = CtmDemodulator::new();
        demod.process(&[0i16; SYMB_LEN - 1]);
        demod.process(&[0i16; SYMB_LEN + 1]);
        demod.process(&[0i16; SYMB_LEN]);
    }

    #[test]
    #[should_panic(expected = "invalid frame length")]
    fn rejects_other_frame_lengths() {
        let mut demod = CtmDemodulator::new();
        demod.process(&[0i16; SYMB_LEN + 5]);
    }

    #[test]
    fn a_strong_tone_is_detected_after_several_frames() {
        let mut modulator = CtmModulator::new(16);
        let mut demod = CtmDemodulator::new();

        let mut tones = Vec::new();
        for _ in 0..6 {
            modulator.modulate(&[1, -1], SYMB_LEN, &mut tones);
        }

        let mut last = (GrossBit::Guard, GrossBit::Guard, 0i32);
        for frame in tones.chunks_exact(SYMB_LEN) {
            last = demod.process(frame);
        }
        assert!(last.0.hard_bit().is_some());
    }
}
