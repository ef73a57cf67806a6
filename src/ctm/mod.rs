//! The CTM (Cellular Text Telephone Modem) burst format: 1-of-4 tone
//! modulation/demodulation, preamble/resync detection, and the
//! transmitter/receiver pipelines that tie it to the channel coder.

pub mod defines;
pub mod demodulator;
pub mod modulator;
pub mod receiver;
pub mod sync;
pub mod transmitter;

pub use demodulator::CtmDemodulator;
pub use modulator::CtmModulator;
pub use receiver::CtmReceiver;
pub use sync::WaitForSync;
pub use transmitter::CtmTransmitter;
