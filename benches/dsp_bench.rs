//! Criterion benchmarks for the two hottest per-sample paths in the
//! pipeline: the CTM tone demodulator's correlation bank (called once per
//! ~40-sample symbol) and the Baudot IIR filter bank (called once per
//! sample). Both run at audio rate in a real call, so their per-call cost
//! bounds how much headroom the host loop has for everything else.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ctm_gateway::baudot::BaudotDemodulator;
use ctm_gateway::ctm::demodulator::CtmDemodulator;
use ctm_gateway::fifo::Fifo;
use ctm_gateway::types::{TtyCode, SYMB_LEN};

fn synthetic_tone_frame(ncycles: usize) -> Vec<i16> {
    (0..SYMB_LEN)
        .map(|n| {
            let phase = (n * ncycles * 360 / SYMB_LEN) as f64;
            (16000.0 * (phase.to_radians()).sin()) as i16
        })
        .collect()
}

fn bench_ctm_demodulator(c: &mut Criterion) {
    let frame = synthetic_tone_frame(3);
    let mut demod = CtmDemodulator::new();

    c.bench_function("ctm_demodulator_process_one_symbol", |b| {
        b.iter(|| {
            let (bit0, bit1, correction) = demod.process(black_box(&frame));
            black_box((bit0, bit1, correction));
        });
    });
}

fn bench_baudot_demodulator(c: &mut Criterion) {
    let samples: Vec<i16> = (0..1600)
        .map(|n| {
            let phase = (n as f64) * 1400.0 * 360.0 / 8000.0;
            (16000.0 * phase.to_radians().sin()) as i16
        })
        .collect();
    let mut demod = BaudotDemodulator::new(176);
    let mut out: Fifo<TtyCode> = Fifo::new(16);

    c.bench_function("baudot_demodulator_process_1600_samples", |b| {
        b.iter(|| {
            out.reset();
            demod.process(black_box(&samples), &mut out);
        });
    });
}

criterion_group!(benches, bench_ctm_demodulator, bench_baudot_demodulator);
criterion_main!(benches);
