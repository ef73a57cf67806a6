//! Global constants for the CTM burst format: tone cycle counts,
//! interleaver geometry, timing thresholds and protocol timeouts.

use crate::types::SYMB_LEN;

/// Number of periods, per [`SYMB_LEN`]-sample symbol, of each of the four
/// 1-of-4 tones (with an 8 kHz sample rate and 200 Hz phase-counter
/// granularity, these correspond to 400, 600, 800 and 1000 Hz).
pub const NCYCLES: [usize; 4] = [2, 3, 4, 5];

/// Number of raw channel bits consumed/produced per call when processing a
/// `LENGTH_TONE_VEC`-sample frame.
pub fn length_tx_bits(length_tone_vec: usize) -> usize {
    (2 * length_tone_vec / SYMB_LEN).max(2)
}

pub const BITS_PER_SYMB: usize = 8;

pub const INTLV_B: usize = 8;
pub const INTLV_D: usize = 2;
pub const DEMOD_SYNC_LINES: usize = 1;
pub const DEINTLV_SYNC_LINES: usize = 0;

pub const THRESHOLD_RELIABILITY_FOR_SUPPRESSING_OUTPUT: i32 = 100;
pub const THRESHOLD_RELIABILITY_FOR_XCORR: i32 = 200;
pub const THRESHOLD_RELIABILITY_FOR_GOING_OFFLINE: i32 = 100;
pub const MAX_NUM_UNRELIABLE_GROSS_BITS: u32 = 400;

pub const NUM_BITS_GUARD_INTERVAL: usize = 6;

pub const WAIT_SYNC_REL_THRESHOLD_0: i32 = 20316;
pub const WAIT_SYNC_REL_THRESHOLD_1: i32 = 17039;
pub const WAIT_SYNC_REL_THRESHOLD_2: i32 = 23265;
pub const RESYNC_REL_THRESHOLD: i32 = 26542;

pub const NUM_ENQUIRY_BURSTS: u32 = 3;
pub const MAX_IDLE_SYMB: u32 = 5;

pub const NUM_MUTE_ROWS: usize = 4;
pub const RESYNC_SEQ_LENGTH: usize = 32;

pub const NUM_BITS_BETWEEN_RESYNC: usize = 352;

/// Negotiation timeout, in frames of `LENGTH_TONE_VEC` samples.
pub fn enquiry_timeout(length_tone_vec: usize) -> usize {
    if length_tone_vec == 160 {
        20
    } else {
        19 * 160
    }
}
