//! Simulated ArcDVI FPGA and a table of synthetic legacy screen modes.
//!
//! Runs the real probe engine on the host: the register file answers the
//! sync and PLL handshakes the way the bridge FPGA does, and the mode table
//! encodes legacy VIDC timings into the shadow registers.

pub mod delay;
pub mod error;
pub mod fpga;
pub mod modes;

pub use delay::StdDelay;
pub use error::SimError;
pub use fpga::SimFpga;
pub use modes::LegacyMode;
