//! Platform-agnostic core of the ArcDVI bridge: watches the legacy VIDC
//! timing through the FPGA shadow registers and programs a matching DVI
//! output timing and pixel clock.

#![cfg_attr(not(test), no_std)]

pub mod bridge;
pub mod decoder;
pub mod diag;
pub mod engine;
pub mod pll;
pub mod presets;
pub mod regs;
pub mod sync;
pub mod timing;

pub use bridge::Bridge;
pub use engine::{Classification, ProbeEngine, ProbeOutcome, ProbeState};
pub use presets::Preset;
pub use timing::{ModeKey, MultiplierClass, OutputMode, TimingDescriptor};
