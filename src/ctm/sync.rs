//! Preamble/resync detection for the deinterleaver: a shift-register
//! correlator against both the interleaver's m-sequence preamble and a
//! shorter resynchronization sequence repeated between bursts, plus the
//! "early muting" decision that blocks the audio bypass path before a
//! burst is confirmed (so a chain of cascaded gateways only has its first
//! device react to a given burst).

use crate::interleave::mseq::{m_sequence, next_mseq_length};
use crate::interleave::scramble::generate_scrambling_sequence;

use super::defines::{
    MAX_IDLE_SYMB, RESYNC_REL_THRESHOLD, RESYNC_SEQ_LENGTH, THRESHOLD_RELIABILITY_FOR_XCORR,
    WAIT_SYNC_REL_THRESHOLD_0, WAIT_SYNC_REL_THRESHOLD_1, WAIT_SYNC_REL_THRESHOLD_2,
};

/// Generates the `RESYNC_SEQ_LENGTH`-long resynchronization sequence sent
/// between bursts, independent of any particular receiver state.
pub fn generate_resync_sequence() -> Vec<i16> {
    let seq_length = next_mseq_length(RESYNC_SEQ_LENGTH);
    m_sequence(seq_length)[..RESYNC_SEQ_LENGTH]
        .iter()
        .map(|&v| i16::from(v))
        .collect()
}

/// One call's worth of synchronization results.
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    /// Whether synchronization was (re-)established during this call.
    pub sync_found_now: bool,
    /// Bits restored to the deinterleaver's input stream, in order.
    pub out_bits: Vec<i16>,
    /// Position within `out_bits` where the resync sequence was detected,
    /// if any.
    pub resync_detected: Option<usize>,
    /// Samples the caller should wait before resuming normal processing
    /// (non-zero only right after a resync detection).
    pub wait_interval: i16,
    /// Whether the audio bypass path should be muted this call.
    pub early_muting_required: bool,
}

/// Shift-register correlator that waits for the diagonal interleaver's
/// preamble or resync sequence to appear in the (still-interleaved)
/// received bit-stream.
#[derive(Debug, Clone)]
pub struct WaitForSync {
    num_sync_bits: usize,
    sync_index_vec: Vec<usize>,
    m_sequence: Vec<i16>,
    m_sequence_resync: Vec<i16>,
    resync_index_vec: Vec<usize>,
    length_shift_reg: usize,
    offset: usize,
    shift_reg: Vec<i16>,
    xcorr1_shiftreg: Vec<i32>,
    xcorr2_shiftreg: Vec<i32>,
    sync_found: bool,
    already_ctm_received: bool,
    cnt_symbols_since_end_of_burst: u32,
}

impl WaitForSync {
    pub fn new(b: usize, d: usize, num_sync_lines2: usize) -> Self {
        let num_dummy_bits = b * (b - 1) * d / 2;
        let num_add_bits = num_sync_lines2 * b;
        let num_sync_bits = num_dummy_bits + num_add_bits;

        let mut sync_index_vec = vec![0usize; num_sync_bits];
        for (cnt, slot) in sync_index_vec.iter_mut().enumerate().take(num_add_bits) {
            *slot = cnt;
        }
        let mut cnt = num_add_bits;
        for i in 0..b - 1 {
            for j in 0..d {
                for k in i + 1..b {
                    sync_index_vec[cnt] = num_add_bits + d * b * i + b * j + k;
                    cnt += 1;
                }
            }
        }
        let maxindex = sync_index_vec[num_sync_bits - 1];

        let seq_length = next_mseq_length(num_sync_bits);
        let m_seq: Vec<i16> = m_sequence(seq_length)[..num_sync_bits]
            .iter()
            .map(|&v| i16::from(v))
            .collect();

        let scramble = generate_scrambling_sequence(b);
        let resync_seq_length = next_mseq_length(RESYNC_SEQ_LENGTH);
        let m_seq_resync: Vec<i16> = m_sequence(resync_seq_length)[..RESYNC_SEQ_LENGTH]
            .iter()
            .enumerate()
            .map(|(cnt, &v)| i16::from(v) * i16::from(scramble[cnt % b]))
            .collect();

        let mut resync_index_vec = vec![0usize; RESYNC_SEQ_LENGTH];
        let mut length_shift_reg = 0usize;
        for cnt_diag in 0..1 + (RESYNC_SEQ_LENGTH - 1) / b {
            for cnt_row in 0..b {
                let cnt_resync_bits = cnt_diag * b + cnt_row;
                if cnt_resync_bits < RESYNC_SEQ_LENGTH {
                    let index = cnt_diag * b + cnt_row * (d * b + 1);
                    resync_index_vec[cnt_resync_bits] = index;
                    length_shift_reg = length_shift_reg.max(index + 1);
                }
            }
        }

        let offset = length_shift_reg - maxindex - 1;
        let sync_index_vec: Vec<usize> = sync_index_vec.into_iter().map(|v| v + offset).collect();

        Self {
            num_sync_bits,
            sync_index_vec,
            m_sequence: m_seq,
            m_sequence_resync: m_seq_resync,
            resync_index_vec,
            length_shift_reg,
            offset,
            shift_reg: vec![0; length_shift_reg],
            xcorr1_shiftreg: vec![0; length_shift_reg],
            xcorr2_shiftreg: vec![0; length_shift_reg],
            sync_found: false,
            already_ctm_received: false,
            cnt_symbols_since_end_of_burst: u32::MAX,
        }
    }

    pub fn reinit(&mut self) {
        self.sync_found = false;
        self.cnt_symbols_since_end_of_burst = 0;
    }

    /// Whether the correlator currently believes it is aligned to a CTM
    /// burst (used by the adaptation controller to detect the rising edge
    /// of a fresh preamble sync, distinct from any particular character
    /// having been decoded yet).
    pub fn in_sync(&self) -> bool {
        self.sync_found
    }

    fn shift_in(reg: &mut [i32], new_value: i32) {
        reg.copy_within(1.., 0);
        let last = reg.len() - 1;
        reg[last] = new_value;
    }

    /// Feeds `in_bits` through the correlator, returning the accumulated
    /// detection result for the whole block.
    pub fn process(&mut self, in_bits: &[i16], num_received_idle_symbols: u32) -> SyncResult {
        let mut result = SyncResult {
            resync_detected: None,
            ..Default::default()
        };

        for &bit in in_bits {
            self.shift_reg.copy_within(1.., 0);
            let last = self.shift_reg.len() - 1;
            self.shift_reg[last] = bit;

            Self::shift_in(&mut self.xcorr1_shiftreg, 0);
            for cnt in 0..self.num_sync_bits {
                let actual_sample = i32::from(self.m_sequence[cnt]) * i32::from(bit);
                let sample_is_tone =
                    actual_sample & 1 != 0 || self.cnt_symbols_since_end_of_burst < 600;
                let index = self.length_shift_reg - 1 - self.sync_index_vec[cnt];
                if sample_is_tone && actual_sample.abs() > THRESHOLD_RELIABILITY_FOR_XCORR {
                    self.xcorr1_shiftreg[index] += if actual_sample > 0 { 2 } else { -2 };
                } else {
                    self.xcorr1_shiftreg[index] -= 1;
                }
            }
            let xcorr = self.xcorr1_shiftreg[0] >> 1;

            Self::shift_in(&mut self.xcorr2_shiftreg, 0);
            for cnt in 0..RESYNC_SEQ_LENGTH {
                let actual_sample = i32::from(self.m_sequence_resync[cnt]) * i32::from(bit);
                let sample_is_tone =
                    actual_sample & 1 != 0 || self.cnt_symbols_since_end_of_burst < 600;
                let index = self.length_shift_reg - 1 - self.resync_index_vec[cnt];
                if sample_is_tone {
                    self.xcorr2_shiftreg[index] += if actual_sample > 0 { 2 } else { -2 };
                } else {
                    self.xcorr2_shiftreg[index] -= 1;
                }
            }
            let xcorr_resync = self.xcorr2_shiftreg[0] >> 1;

            let actual_threshold = if self.sync_found && num_received_idle_symbols < MAX_IDLE_SYMB - 1 {
                WAIT_SYNC_REL_THRESHOLD_2
            } else if self.already_ctm_received {
                WAIT_SYNC_REL_THRESHOLD_1
            } else {
                WAIT_SYNC_REL_THRESHOLD_0
            };

            let max_xcorr1 = self.xcorr1_shiftreg.iter().copied().max().unwrap_or(0).max(0) >> 1;
            let max_xcorr2 = self.xcorr2_shiftreg.iter().copied().max().unwrap_or(0).max(0) >> 1;
            result.early_muting_required = (i64::from(max_xcorr2) << 15)
                > i64::from(RESYNC_REL_THRESHOLD) * RESYNC_SEQ_LENGTH as i64
                || (i64::from(max_xcorr1) << 15) > i64::from(actual_threshold) * self.num_sync_bits as i64;

            let resync_here = (i64::from(xcorr_resync) << 15)
                > i64::from(RESYNC_REL_THRESHOLD) * RESYNC_SEQ_LENGTH as i64;
            if resync_here {
                result.resync_detected = Some(result.out_bits.len());
            }

            if result.resync_detected.is_some() && !self.sync_found {
                result.sync_found_now = true;
                self.already_ctm_received = true;
                self.sync_found = true;
                self.cnt_symbols_since_end_of_burst = 0;
                result.wait_interval = RESYNC_SEQ_LENGTH as i16;
                result.out_bits.extend_from_slice(&self.shift_reg);
            } else if (i64::from(xcorr) << 15) > i64::from(actual_threshold) * self.num_sync_bits as i64 {
                result.sync_found_now = true;
                self.already_ctm_received = true;
                self.sync_found = true;
                self.cnt_symbols_since_end_of_burst = 0;
                result.wait_interval = 0;
                result.out_bits.extend_from_slice(&self.shift_reg[self.offset..]);
            } else if self.sync_found {
                result.out_bits.push(bit);
            } else if self.cnt_symbols_since_end_of_burst < u32::MAX {
                self.cnt_symbols_since_end_of_burst += 1;
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_builds_consistent_geometry() {
        let sync = WaitForSync::new(8, 2, 0);
        assert_eq!(sync.num_sync_bits, 8 * 7 * 2 / 2);
        assert_eq!(sync.m_sequence.len(), sync.num_sync_bits);
        assert_eq!(sync.m_sequence_resync.len(), RESYNC_SEQ_LENGTH);
        assert!(sync.length_shift_reg > 0);
    }

    #[test]
    fn silence_never_triggers_sync() {
        let mut sync = WaitForSync::new(8, 2, 0);
        let result = sync.process(&vec![-1i16; 500], 0);
        assert!(!result.sync_found_now);
        assert!(!sync.sync_found);
    }

    #[test]
    fn resync_sequence_is_bipolar() {
        let seq = generate_resync_sequence();
        assert_eq!(seq.len(), RESYNC_SEQ_LENGTH);
        assert!(seq.iter().all(|&v| v == 1 || v == -1));
    }

    #[test]
    fn reinit_clears_sync_state() {
        let mut sync = WaitForSync::new(8, 2, 0);
        sync.sync_found = true;
        sync.reinit();
        assert!(!sync.sync_found);
        assert_eq!(sync.cnt_symbols_since_end_of_burst, 0);
    }
}
