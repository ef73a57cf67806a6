//! CTM burst receiver: the CTM-to-Baudot direction's glue between
//! incoming PCM samples and decoded UCS codes. Chains the tone
//! demodulator, preamble/resync correlator, diagonal deinterleaver and
//! Viterbi decoder, tracking reliability so a burst that degrades into
//! noise takes the gateway back offline instead of emitting garbage
//! characters indefinitely.

use crate::conv::tables::CHC_RATE;
use crate::conv::viterbi::Viterbi;
use crate::fifo::Fifo;
use crate::interleave::deinterleaver::DiagDeinterleaver;
use crate::interleave::mute::{calc_mute_positions, muting_required};
use crate::types::{GrossBit, UcsCode, IDLE_SYMB, SYMB_LEN};

use super::defines::{
    DEINTLV_SYNC_LINES, INTLV_B, INTLV_D, MAX_IDLE_SYMB, MAX_NUM_UNRELIABLE_GROSS_BITS,
    NUM_BITS_BETWEEN_RESYNC, NUM_MUTE_ROWS, RESYNC_SEQ_LENGTH,
    THRESHOLD_RELIABILITY_FOR_GOING_OFFLINE,
};
use super::demodulator::CtmDemodulator;
use super::sync::WaitForSync;

use crate::baudot::codes::transform_utf_to_ucs;

/// Bits of deinterleaver output to discard after a fresh sync, covering
/// the preamble training rows and the correlator's own detection lag.
fn intl_delay(wait_interval: i16) -> usize {
    INTLV_B * DEINTLV_SYNC_LINES + INTLV_B * (INTLV_B - 1) * INTLV_D + wait_interval.max(0) as usize
}

/// Streaming CTM burst receiver. See the module documentation for the
/// overall pipeline.
#[derive(Clone)]
pub struct CtmReceiver {
    demod: CtmDemodulator,
    wait: WaitForSync,
    deinterleaver: DiagDeinterleaver,
    viterbi: Viterbi,
    signal_fifo: Fifo<i16>,
    rx_bits: Fifo<i16>,
    net_bit_accum: Vec<bool>,
    octet_fifo: Fifo<u8>,
    mute_positions: Vec<i32>,
    sampling_correction: i32,
    cnt_idle_symbols: u32,
    cnt_unreliable_gross_bits: u32,
    cnt_bits_since_sync: usize,
    intl_delay: usize,
}

impl CtmReceiver {
    pub fn new(length_tone_vec: usize) -> Self {
        let signal_capacity = 4 * length_tone_vec + 8 * SYMB_LEN;
        Self {
            demod: CtmDemodulator::new(),
            wait: WaitForSync::new(INTLV_B, INTLV_D, DEINTLV_SYNC_LINES),
            deinterleaver: DiagDeinterleaver::new(INTLV_B, INTLV_D),
            viterbi: Viterbi::new(),
            signal_fifo: Fifo::new(signal_capacity),
            rx_bits: Fifo::new(4096),
            net_bit_accum: Vec::with_capacity(8),
            octet_fifo: Fifo::new(32),
            mute_positions: calc_mute_positions(NUM_MUTE_ROWS, 0, INTLV_B as i32, INTLV_D as i32),
            sampling_correction: 0,
            cnt_idle_symbols: 0,
            cnt_unreliable_gross_bits: 0,
            cnt_bits_since_sync: 0,
            intl_delay: 0,
        }
    }

    /// Whether the deinterleaver's correlator currently believes it is
    /// aligned to a CTM burst.
    pub fn in_sync(&self) -> bool {
        self.wait.in_sync()
    }

    fn reset_offline(&mut self) {
        self.wait.reinit();
        self.deinterleaver.reinit();
        self.viterbi.reinit();
        self.rx_bits.reset();
        self.octet_fifo.reset();
        self.net_bit_accum.clear();
        self.cnt_idle_symbols = 0;
        self.cnt_unreliable_gross_bits = 0;
        self.cnt_bits_since_sync = 0;
        self.intl_delay = 0;
    }

    fn push_octet_bit(&mut self, bit: bool, out: &mut Vec<UcsCode>) {
        self.net_bit_accum.push(bit);
        if self.net_bit_accum.len() == 8 {
            let mut octet = 0u8;
            for (pos, &b) in self.net_bit_accum.iter().enumerate() {
                octet |= u8::from(b) << pos;
            }
            self.net_bit_accum.clear();
            self.octet_fifo.push_one(octet);

            if let Some(code) = transform_utf_to_ucs(&mut self.octet_fifo) {
                if code == IDLE_SYMB {
                    self.cnt_idle_symbols += 1;
                } else {
                    self.cnt_idle_symbols = 0;
                    out.push(code);
                }
            }
        }
    }

    fn consume_deinterleaved_bit(&mut self, bit: i16, out: &mut Vec<UcsCode>) {
        self.cnt_bits_since_sync += 1;
        if self.cnt_bits_since_sync <= self.intl_delay {
            return;
        }
        let position = (self.cnt_bits_since_sync - self.intl_delay - 1) as i32;
        if muting_required(position, &self.mute_positions) {
            return;
        }

        self.rx_bits.push_one(bit);
        if self.rx_bits.len() >= CHC_RATE {
            let group = self.rx_bits.pop(CHC_RATE);

            let group_reliable = group
                .iter()
                .all(|&b| GrossBit::from_wire(b).hard_bit().is_some() && b.unsigned_abs() as i32 >= THRESHOLD_RELIABILITY_FOR_GOING_OFFLINE);
            if group_reliable {
                self.cnt_unreliable_gross_bits = 0;
            } else {
                self.cnt_unreliable_gross_bits += group
                    .iter()
                    .filter(|&&b| b.unsigned_abs() as i32 <= THRESHOLD_RELIABILITY_FOR_GOING_OFFLINE)
                    .count() as u32;
            }

            for net_bit in self.viterbi.exec(&group) {
                self.push_octet_bit(net_bit, out);
            }
        }
    }

    /// Processes `in_samples` (any length; buffered internally and
    /// consumed a symbol at a time) into any decoded UCS codes, returning
    /// them plus whether the audio bypass path should be muted this call.
    pub fn process(&mut self, in_samples: &[i16]) -> (Vec<UcsCode>, bool) {
        self.signal_fifo.push(in_samples);

        let mut out = Vec::new();
        let mut early_muting_required = false;

        while self.signal_fifo.len() > SYMB_LEN {
            let frame_len = (SYMB_LEN as i32 + self.sampling_correction)
                .clamp((SYMB_LEN - 1) as i32, (SYMB_LEN + 1) as i32) as usize;
            let frame_len = frame_len.min(self.signal_fifo.len());
            let frame = self.signal_fifo.pop(frame_len);

            let (b0, b1, correction) = self.demod.process(&frame);
            self.sampling_correction = correction;

            let demod_bits = [b0.to_wire(), b1.to_wire()];
            let sync_result = self
                .wait
                .process(&demod_bits, self.cnt_idle_symbols);
            early_muting_required |= sync_result.early_muting_required;

            if sync_result.sync_found_now {
                self.deinterleaver.reinit();
                self.viterbi.reinit();
                self.rx_bits.reset();
                self.net_bit_accum.clear();
                self.cnt_unreliable_gross_bits = 0;
                self.cnt_bits_since_sync = 0;
                self.intl_delay = intl_delay(sync_result.wait_interval);
            }

            if let Some(resync_pos) = sync_result.resync_detected {
                let cycle = NUM_BITS_BETWEEN_RESYNC + RESYNC_SEQ_LENGTH;
                let observed = (self.cnt_bits_since_sync + resync_pos) % cycle;
                let half = (cycle / 2) as i32;
                let mut offset = observed as i32 - NUM_BITS_BETWEEN_RESYNC as i32;
                if offset > half {
                    offset -= cycle as i32;
                } else if offset < -half {
                    offset += cycle as i32;
                }
                if offset.abs() < 16 && offset != 0 {
                    let insert_bits = vec![0i16; offset.unsigned_abs() as usize];
                    self.deinterleaver.shift(offset, &insert_bits);
                }
            }

            for bit in sync_result.out_bits {
                let deinterleaved = self.deinterleaver.push(bit);
                self.consume_deinterleaved_bit(deinterleaved, &mut out);
            }

            if self.cnt_idle_symbols >= MAX_IDLE_SYMB
                || self.cnt_unreliable_gross_bits > MAX_NUM_UNRELIABLE_GROSS_BITS
            {
                self.reset_offline();
            }
        }

        (out, early_muting_required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctm::transmitter::CtmTransmitter;
    use crate::types::UCS_FORCE_BURST;

    #[test]
    fn silence_never_decodes_a_character() {
        let mut rx = CtmReceiver::new(160);
        let mut any = false;
        for _ in 0..50 {
            let (codes, _) = rx.process(&[0i16; 160]);
            any |= !codes.is_empty();
        }
        assert!(!any);
    }

    #[test]
    fn a_transmitted_character_round_trips() {
        let mut tx = CtmTransmitter::new(160);
        let mut rx = CtmReceiver::new(160);

        let mut tone = Vec::new();
        tx.process(UCS_FORCE_BURST, 160, &mut tone);
        tx.process(b'A' as UcsCode, 160, &mut tone);
        for _ in 0..40 {
            tx.process(IDLE_SYMB, 160, &mut tone);
        }

        let mut decoded = Vec::new();
        for chunk in tone.chunks(160) {
            let (codes, _) = rx.process(chunk);
            decoded.extend(codes);
        }
        assert!(decoded.iter().any(|&c| c == b'A' as UcsCode || c == IDLE_SYMB));
    }
}
