//! Adaptation control plane (spec §4.10): the one component that mixes
//! the Baudot and CTM directions. Drives an enquiry/acknowledgement
//! handshake to discover whether the far end is CTM-capable, mutes the
//! Baudot leg's input whenever the Baudot modulator is actively driving
//! the local handset (so its own echo doesn't loop back into the CTM
//! path), and bypasses raw audio on an idle leg so a plain voice call
//! passes through untouched.
//!
//! Every other component in this crate is a unidirectional stream
//! transformer; this one is driven one frame at a time and is the only
//! place session state from both legs is visible simultaneously.

use tracing::{debug, info, warn};

use crate::baudot::codes::{char_to_tty_code, char_to_ucs_code, tty_code_to_char, ucs_code_to_char};
use crate::baudot::{BaudotDemodulator, BaudotModulator};
use crate::config::GatewayConfig;
use crate::ctm::defines::{enquiry_timeout, NUM_ENQUIRY_BURSTS};
use crate::ctm::{CtmReceiver, CtmTransmitter};
use crate::error::Result;
use crate::fifo::Fifo;
use crate::types::{TtyCode, UcsCode, ENQU_SYMB, IDLE_SYMB, UCS_FORCE_BURST};

/// Frames a leg's bypass<->active transition must hold before a *new*
/// character may be popped off its output queue (10 frames == 200 ms at
/// the nominal 20 ms frame size), so a borderline character stream
/// doesn't chatter the audio path.
const MIN_FRAMES_BETWEEN_BYPASS_TRANSITIONS: u32 = 10;

/// Frames within which a received [`ENQU_SYMB`] is treated as a repeat of
/// the previous one rather than a fresh probe.
const ENQUIRY_DEBOUNCE_FRAMES: u32 = 25;

/// Samples the Baudot-in echo mute holds open past the modulator's last
/// active bit, so the local handset's own trailing echo of a just-finished
/// burst (including a SHIFT-symbol-only burst, which drives no visible
/// characters) doesn't loop back into the demodulator.
const BAUDOT_MUTE_HANGOVER_SAMPLES: u32 = 320;

/// Depth of the queues carrying decoded/pending characters between the
/// controller and the two modem directions. Generous relative to CTM's
/// ~12.5 char/s and Baudot's ~6 char/s: neither leg can get far enough
/// ahead of the other to overflow these in a real call.
const CHAR_QUEUE_CAPACITY: usize = 64;
const CONTROL_QUEUE_CAPACITY: usize = 4;
const TTY_SCRATCH_CAPACITY: usize = 16;

/// End-of-stream flags for the two legs, surfaced by the collaborator I/O
/// layer per spec §7's "I/O condition" row. These gate termination; they
/// are not errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EofFlags {
    pub baudot_eof: bool,
    pub ctm_eof: bool,
}

/// One frame's worth of controller output.
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    /// Audio to play to the local Baudot/PSTN handset. Empty in text I/O
    /// mode (see [`GatewayController::process_text_frame`]).
    pub baudot_out: Vec<i16>,
    /// Audio to send out on the CTM/cellular leg.
    pub ctm_out: Vec<i16>,
    /// Plain-text octets recovered from the CTM side this frame.
    pub user_text_out: Vec<u8>,
}

/// Tracks one leg's active/bypass history for the churn-avoidance rule:
/// a fresh character may only be pulled off the output queue once the
/// leg has held its current state for [`MIN_FRAMES_BETWEEN_BYPASS_TRANSITIONS`]
/// frames.
#[derive(Debug, Clone, Copy)]
struct LegHistory {
    active_last_frame: bool,
    frames_since_transition: u32,
}

impl LegHistory {
    fn new() -> Self {
        Self {
            active_last_frame: false,
            frames_since_transition: MIN_FRAMES_BETWEEN_BYPASS_TRANSITIONS,
        }
    }

    fn may_pop_new_char(&self) -> bool {
        self.frames_since_transition >= MIN_FRAMES_BETWEEN_BYPASS_TRANSITIONS
    }

    fn record(&mut self, active_now: bool) {
        if active_now == self.active_last_frame {
            self.frames_since_transition = self.frames_since_transition.saturating_add(1);
        } else {
            self.frames_since_transition = 0;
        }
        self.active_last_frame = active_now;
    }
}

/// Bidirectional CTM<->Baudot adaptation session.
#[derive(Clone)]
pub struct GatewayController {
    config: GatewayConfig,

    baudot_demod: BaudotDemodulator,
    baudot_mod: BaudotModulator,
    ctm_tx: CtmTransmitter,
    ctm_rx: CtmReceiver,

    baudot_tty_scratch: Fifo<TtyCode>,
    baudot_out_queue: Fifo<TtyCode>,
    pending_ucs: Fifo<UcsCode>,
    ctm_control_queue: Fifo<UcsCode>,

    baudot_mod_bits_pending: i16,
    baudot_mute_hangover_remaining: u32,
    baudot_leg: LegHistory,

    was_in_sync: bool,
    ctm_from_far_end_detected: bool,
    ctm_character_transmitted: bool,
    negotiation_failed: bool,
    cnt_transmitted_enquiries: u32,
    frames_since_burst_init: u32,
    frames_since_last_enquiry_received: u32,

    samples_processed: u64,
}

impl GatewayController {
    /// Allocates a new session. Per spec §7's "Configuration error" row,
    /// an invalid configuration fails here and no state is retained.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        config.validate()?;

        let negotiation_enabled = config.negotiation_enabled;
        Ok(Self {
            baudot_demod: BaudotDemodulator::new(config.baudot_bit_duration),
            baudot_mod: BaudotModulator::new(config.baudot_bit_duration as i16),
            ctm_tx: CtmTransmitter::new(config.length_tone_vec),
            ctm_rx: CtmReceiver::new(config.length_tone_vec),

            baudot_tty_scratch: Fifo::new(TTY_SCRATCH_CAPACITY),
            baudot_out_queue: Fifo::new(CHAR_QUEUE_CAPACITY),
            pending_ucs: Fifo::new(CHAR_QUEUE_CAPACITY),
            ctm_control_queue: Fifo::new(CONTROL_QUEUE_CAPACITY),

            baudot_mod_bits_pending: 0,
            baudot_mute_hangover_remaining: 0,
            baudot_leg: LegHistory::new(),

            was_in_sync: false,
            // set_negotiation(off) assumes a CTM-capable far end from the
            // first burst, so the handshake's probe path never fires.
            ctm_from_far_end_detected: !negotiation_enabled,
            ctm_character_transmitted: false,
            negotiation_failed: false,
            cnt_transmitted_enquiries: 0,
            frames_since_burst_init: 0,
            frames_since_last_enquiry_received: ENQUIRY_DEBOUNCE_FRAMES,

            samples_processed: 0,

            config,
        })
    }

    /// Whether the far end has shown a CTM preamble (negotiation
    /// succeeded, or negotiation was disabled).
    pub fn ctm_confirmed(&self) -> bool {
        self.ctm_from_far_end_detected
    }

    /// Whether the enquiry handshake exhausted its attempts without a
    /// response (the session has permanently fallen back to bypass).
    pub fn negotiation_failed(&self) -> bool {
        self.negotiation_failed
    }

    /// Queues text typed on the Baudot side for transmission over CTM,
    /// for a session running in text I/O mode (no Baudot tones at all).
    /// Characters outside the gateway's supported Row 00 subset are
    /// silently mapped to [`IDLE_SYMB`] by [`char_to_ucs_code`] and so
    /// never reach the far end as themselves.
    pub fn queue_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.queue_outgoing_ucs(char_to_ucs_code(ch));
        }
    }

    fn queue_outgoing_ucs(&mut self, ucs: UcsCode) {
        if self.pending_ucs.free() == 0 {
            warn!("outgoing CTM character queue full, dropping character");
            return;
        }
        self.pending_ucs.push_one(ucs);
    }

    fn schedule_acknowledgement(&mut self) {
        if self.ctm_control_queue.free() > 0 {
            self.ctm_control_queue.push_one(UCS_FORCE_BURST);
        }
    }

    /// Runs the enquiry/acknowledgement handshake for one frame: reacts
    /// to a received [`ENQU_SYMB`] or a fresh preamble sync, and decides
    /// whether to probe the far end (or give up and fall back to
    /// bypass). May append to `ctm_control_queue`.
    fn run_handshake(&mut self, ucs_from_ctm: &[UcsCode]) {
        self.frames_since_last_enquiry_received =
            self.frames_since_last_enquiry_received.saturating_add(1);
        for &code in ucs_from_ctm {
            if code == ENQU_SYMB && self.frames_since_last_enquiry_received >= ENQUIRY_DEBOUNCE_FRAMES
            {
                debug!("received CTM enquiry, scheduling acknowledgement");
                self.schedule_acknowledgement();
                self.frames_since_last_enquiry_received = 0;
            }
        }

        let now_in_sync = self.ctm_rx.in_sync();
        if now_in_sync && !self.was_in_sync {
            if !self.ctm_from_far_end_detected {
                info!(">>> CTM from far-end detected! <<<");
            }
            self.ctm_from_far_end_detected = true;
            if !self.ctm_character_transmitted {
                // Their burst arrived before we ever sent one: it was
                // itself an enquiry (or a bare burst start). Acknowledge.
                self.schedule_acknowledgement();
            }
        }
        self.was_in_sync = now_in_sync;

        self.frames_since_burst_init = self.frames_since_burst_init.saturating_add(1);

        let probing_worthwhile = !self.ctm_from_far_end_detected
            && !self.negotiation_failed
            && self.cnt_transmitted_enquiries < NUM_ENQUIRY_BURSTS;

        if probing_worthwhile
            && !self.pending_ucs.is_empty()
            && self.ctm_control_queue.is_empty()
            && !self.ctm_tx.burst_active()
        {
            debug!(
                attempt = self.cnt_transmitted_enquiries + 1,
                "sending CTM enquiry burst"
            );
            self.ctm_control_queue.push_one(ENQU_SYMB);
            self.cnt_transmitted_enquiries += 1;
            self.frames_since_burst_init = 0;
        } else if probing_worthwhile
            && self.cnt_transmitted_enquiries >= NUM_ENQUIRY_BURSTS
            && self.frames_since_burst_init > enquiry_timeout(self.config.length_tone_vec) as u32
        {
            warn!(
                attempts = self.cnt_transmitted_enquiries,
                "CTM negotiation failed, falling back to audio bypass"
            );
            self.negotiation_failed = true;
        }
    }

    fn decide_ctm_input(&mut self) -> UcsCode {
        let code = if !self.ctm_control_queue.is_empty() {
            self.ctm_control_queue.pop_one()
        } else if !self.pending_ucs.is_empty() {
            self.pending_ucs.pop_one()
        } else {
            IDLE_SYMB
        };
        if code != IDLE_SYMB {
            self.ctm_character_transmitted = true;
        }
        code
    }

    fn run_ctm_leg(&mut self, frame_len: usize, baudot_in_for_bypass: &[i16]) -> Vec<i16> {
        let ucs_code = self.decide_ctm_input();
        let mut out = Vec::with_capacity(frame_len);
        let bits_pending = self.ctm_tx.process(ucs_code, frame_len, &mut out);
        if self.ctm_tx.burst_active() || bits_pending > 0 {
            out
        } else if self.config.bypass_enabled {
            clamp_to_len(baudot_in_for_bypass, frame_len)
        } else {
            vec![0i16; frame_len]
        }
    }

    fn run_baudot_leg(
        &mut self,
        frame_len: usize,
        ctm_in: &[i16],
        early_muting_required: bool,
    ) -> Vec<i16> {
        let may_pop = self.baudot_leg.may_pop_new_char();
        let wants_active = self.baudot_mod_bits_pending > 0
            || early_muting_required
            || (!self.baudot_out_queue.is_empty() && may_pop);

        if wants_active {
            if self.baudot_mod_bits_pending == 0 && !self.baudot_out_queue.is_empty() {
                let code = self.baudot_out_queue.pop_one();
                self.baudot_mod.queue(code);
            }
            let mut out = Vec::with_capacity(frame_len);
            self.baudot_mod_bits_pending = self.baudot_mod.generate(frame_len, &mut out);
            self.baudot_leg.record(true);
            out
        } else {
            self.baudot_leg.record(false);
            if self.config.bypass_enabled {
                clamp_to_len(ctm_in, frame_len)
            } else {
                vec![0i16; frame_len]
            }
        }
    }

    /// Processes one frame in audio I/O mode: `baudot_in` is PSTN-leg
    /// audio (demodulated for TTY characters and otherwise eligible for
    /// bypass), `ctm_in` is cellular-leg audio.
    pub fn process_audio_frame(&mut self, baudot_in: &[i16], ctm_in: &[i16]) -> Result<FrameOutput> {
        let frame_len = self.config.length_tone_vec.max(1).max(ctm_in.len());

        // Echo-mute: the local handset's own echo of what the Baudot
        // modulator is currently playing to it must not loop back into
        // either the Baudot demodulator or the CTM-out bypass path. The
        // hangover keeps the mute open for a further
        // BAUDOT_MUTE_HANGOVER_SAMPLES past the modulator's last active
        // bit so a SHIFT-symbol-only burst (no visible character, but
        // still audible tones) and the handset's own decay tail don't
        // slip back in unmuted.
        if self.baudot_mod_bits_pending > 0 || self.baudot_demod.cnt_bits_actual_char() > 0 {
            self.baudot_mute_hangover_remaining = BAUDOT_MUTE_HANGOVER_SAMPLES;
        }
        let muting_active = self.baudot_mute_hangover_remaining > 0;
        let muted_baudot_in: Vec<i16> = if muting_active {
            vec![0i16; baudot_in.len()]
        } else {
            baudot_in.to_vec()
        };
        self.baudot_mute_hangover_remaining = self
            .baudot_mute_hangover_remaining
            .saturating_sub(baudot_in.len() as u32);

        self.baudot_demod.process(&muted_baudot_in, &mut self.baudot_tty_scratch);
        let received_len = self.baudot_tty_scratch.len();
        for code in self.baudot_tty_scratch.pop(received_len) {
            let ch = tty_code_to_char(code);
            if ch != '\0' {
                self.queue_outgoing_ucs(char_to_ucs_code(ch));
            }
        }

        let (ucs_from_ctm, early_muting_required) = self.ctm_rx.process(ctm_in);
        self.run_handshake(&ucs_from_ctm);

        let mut user_text_out = Vec::new();
        for code in &ucs_from_ctm {
            let code = *code;
            if code == IDLE_SYMB || code == ENQU_SYMB || code == UCS_FORCE_BURST {
                continue;
            }
            let ch = ucs_code_to_char(code);
            if ch == '\0' {
                continue;
            }
            user_text_out.push(ch as u8);
            if let Some(tty) = char_to_tty_code(ch) {
                if self.baudot_out_queue.free() > 0 {
                    self.baudot_out_queue.push_one(tty);
                } else {
                    warn!("Baudot output queue full, dropping character");
                }
            }
        }

        let baudot_out = self.run_baudot_leg(frame_len, ctm_in, early_muting_required);
        let ctm_out = self.run_ctm_leg(frame_len, &muted_baudot_in);

        self.samples_processed += frame_len as u64;
        Ok(FrameOutput {
            baudot_out,
            ctm_out,
            user_text_out,
        })
    }

    /// Processes one frame in text I/O mode: `text_in` is characters
    /// typed on the Baudot side (queued exactly as
    /// [`GatewayController::queue_text`] would), `ctm_in` is cellular-leg
    /// audio. There is no Baudot audio leg to bypass, so `baudot_out` is
    /// always empty in the returned [`FrameOutput`].
    pub fn process_text_frame(&mut self, text_in: &str, ctm_in: &[i16]) -> Result<FrameOutput> {
        self.queue_text(text_in);

        let frame_len = self.config.length_tone_vec.max(1).max(ctm_in.len());
        let (ucs_from_ctm, _early_muting_required) = self.ctm_rx.process(ctm_in);
        self.run_handshake(&ucs_from_ctm);

        let mut user_text_out = Vec::new();
        for code in ucs_from_ctm {
            if code == IDLE_SYMB || code == ENQU_SYMB || code == UCS_FORCE_BURST {
                continue;
            }
            let ch = ucs_code_to_char(code);
            if ch != '\0' {
                user_text_out.push(ch as u8);
            }
        }

        let ucs_code = self.decide_ctm_input();
        let mut ctm_out = Vec::with_capacity(frame_len);
        self.ctm_tx.process(ucs_code, frame_len, &mut ctm_out);

        self.samples_processed += frame_len as u64;
        Ok(FrameOutput {
            baudot_out: Vec::new(),
            ctm_out,
            user_text_out,
        })
    }

    /// Termination policy per spec §4.10: a configured sample budget
    /// reached, or both legs at EOF (or just the Baudot leg, under
    /// `shutdown_on_eof`) with every in-flight path drained.
    pub fn is_terminated(&self, eof: EofFlags) -> bool {
        if let Some(limit) = self.config.num_samples_to_process {
            if self.samples_processed >= limit {
                return true;
            }
        }

        let ctm_tx_idle = !self.ctm_tx.burst_active() && self.ctm_tx.bits_pending() == 0;
        let baudot_mod_idle = self.baudot_mod_bits_pending == 0 && self.baudot_out_queue.is_empty();
        let queues_drained = self.pending_ucs.is_empty() && self.ctm_control_queue.is_empty();

        if self.config.shutdown_on_eof {
            eof.baudot_eof && ctm_tx_idle && queues_drained
        } else {
            eof.baudot_eof && eof.ctm_eof && ctm_tx_idle && baudot_mod_idle && queues_drained
        }
    }
}

fn clamp_to_len(samples: &[i16], len: usize) -> Vec<i16> {
    let mut out = samples.to_vec();
    out.resize(len, 0);
    out
}
