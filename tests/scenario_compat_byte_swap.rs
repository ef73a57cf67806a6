//! Scenario (spec §8 #6): `compat_byte_swap` is an I/O-boundary concern
//! (spec §1, §6) applied by the collaborator, never by the core itself.
//! Loading a big-endian reference vector on a little-endian host, with
//! the collaborator's compat swap applied at the boundary, must produce
//! bit-for-bit the same core behavior as loading a native vector without
//! any swap: the core only ever sees logical `i16` sample values.

use ctm_gateway::config::{byte_swap_samples, GatewayConfig};
use ctm_gateway::controller::GatewayController;

const FRAME_LEN: usize = 160;

fn run_gateway(frames: &[Vec<i16>]) -> Vec<Vec<i16>> {
    let config = GatewayConfig::new().with_negotiation(false).with_length_tone_vec(FRAME_LEN);
    let mut gateway = GatewayController::new(config).unwrap();
    frames
        .iter()
        .map(|frame| gateway.process_audio_frame(frame, frame).unwrap().ctm_out)
        .collect()
}

#[test]
fn byte_swap_is_its_own_inverse() {
    let mut samples: Vec<i16> = vec![0x1234, -1, 0, i16::MIN, i16::MAX, 7];
    let original = samples.clone();
    byte_swap_samples(&mut samples);
    assert_ne!(samples, original, "a real swap should change multi-byte values");
    byte_swap_samples(&mut samples);
    assert_eq!(samples, original);
}

#[test]
fn compat_loaded_vector_matches_native_run_bit_exact() {
    let native_frames: Vec<Vec<i16>> = (0..20)
        .map(|f| (0..FRAME_LEN).map(|i| (((f * 37 + i) % 2000) as i32 - 1000) as i16).collect())
        .collect();

    // The "distributed big-endian reference vector" a file loader would
    // hand the I/O layer on a little-endian host: each native sample's
    // bytes swapped once, as if read raw off disk.
    let distributed_frames: Vec<Vec<i16>> = native_frames
        .iter()
        .map(|frame| {
            let mut swapped = frame.clone();
            byte_swap_samples(&mut swapped);
            swapped
        })
        .collect();

    // The collaborator's compat loader swaps back to native order before
    // handing samples to the core, so the core ingests the same logical
    // values either way.
    let compat_loaded_frames: Vec<Vec<i16>> = distributed_frames
        .iter()
        .map(|frame| {
            let mut restored = frame.clone();
            byte_swap_samples(&mut restored);
            restored
        })
        .collect();
    assert_eq!(compat_loaded_frames, native_frames);

    let native_out = run_gateway(&native_frames);
    let compat_out = run_gateway(&compat_loaded_frames);
    assert_eq!(native_out, compat_out);
}
