//! Baudot/ITA2 TTY modem: character-set translation plus the tone
//! modulator/demodulator pair that carries it over PSTN audio.

pub mod codes;
pub mod demod;
pub mod modulator;

pub use demod::BaudotDemodulator;
pub use modulator::BaudotModulator;
