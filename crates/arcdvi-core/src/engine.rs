//! Mode probe and output synthesis.
//!
//! Each probe waits for input flyback, decodes the input timing, and when
//! it differs from the last programmed mode, picks an output strategy:
//!
//! 1. hires mono: run the output clock at x4 and widen the line to match
//! 2. passthrough: already VGA-sized, output it as-is
//! 3. doubling: line-double (and pixel-double if narrow) into a taller mode
//!
//! Reprogramming makes the display lose sync for a second or two, so an
//! unchanged mode never touches the output registers.

use arcdvi_hal::RegisterBus;
use embedded_hal::delay::DelayNs;

use crate::diag::{InputSnapshot, TimingSnapshot};
use crate::presets::Preset;
use crate::regs;
use crate::timing::{ModeKey, MultiplierClass, OutputMode, TimingDescriptor};
use crate::{decoder, pll, sync};

/// Minimum resolution that is output without doubling.
pub const PASSTHROUGH_MIN_XRES: u32 = 640;
pub const PASSTHROUGH_MIN_YRES: u32 = 480;

/// Input pixel rate that marks a hires mono mode.
pub const HIRES_PIXEL_RATE_MHZ: u32 = 24;
/// Raw bpp class (4bpp) the hires mono modes are driven at.
pub const HIRES_BPP_CLASS: u8 = 2;
/// Hires horizontal scale, matching the x4 output clock.
pub const HIRES_SCALE: u32 = 4;
/// Empirical output cursor offset for hires modes.
pub const HIRES_CURSOR_OFFSET: u32 = 0x12c;

/// Output pixel rates tried for line doubling, in order, with the PLL
/// multiplier producing each from the 24MHz reference.
pub const DOUBLING_CANDIDATES: [(u32, MultiplierClass); 3] = [
    (24, MultiplierClass::X1),
    (36, MultiplierClass::X1_5),
    (48, MultiplierClass::X2),
];

/// Horizontal blanking must be at least xres / this.
pub const MIN_H_BLANKING_DIVISOR: u32 = 32;
/// Synthesised porches: front = total / 20, sync = total / 40, back = rest.
pub const SYNTH_FRONT_PORCH_DIVISOR: u32 = 20;
pub const SYNTH_SYNC_WIDTH_DIVISOR: u32 = 40;

/// Which output strategy a timing gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    HighRes,
    Passthrough,
    /// Line doubling; `horizontal` also doubles pixels.
    Doubling { horizontal: bool },
}

/// Result of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Input matches the last programmed mode; nothing written.
    Unchanged,
    Reprogrammed {
        classification: Classification,
        mode: OutputMode,
    },
}

/// What the output hardware was last programmed with.
///
/// Starts out invalid so the first probe always programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeState {
    /// Key of the observed input the outputs were derived from.
    mode: Option<ModeKey>,
    /// Class currently loaded into the PLL.
    multiplier: Option<MultiplierClass>,
}

impl ProbeState {
    pub const fn invalid() -> Self {
        Self {
            mode: None,
            multiplier: None,
        }
    }

    pub fn mode(&self) -> Option<ModeKey> {
        self.mode
    }

    pub fn multiplier(&self) -> Option<MultiplierClass> {
        self.multiplier
    }

    pub fn matches(&self, key: &ModeKey) -> bool {
        self.mode.as_ref() == Some(key)
    }
}

/// The hires mono heuristic: very tall, 24MHz, 4bpp.
///
/// Tuned against mode 23 and its relatives.
pub fn is_hires(t: &TimingDescriptor) -> bool {
    t.pixel_rate_mhz == HIRES_PIXEL_RATE_MHZ
        && t.bpp_class == HIRES_BPP_CLASS
        && t.xres < t.yres / 2
}

pub fn classify(t: &TimingDescriptor) -> Classification {
    if is_hires(t) {
        Classification::HighRes
    } else if t.yres >= PASSTHROUGH_MIN_YRES {
        // Too tall to line-double; narrow ones are output as-is as well.
        Classification::Passthrough
    } else {
        Classification::Doubling {
            horizontal: t.xres < PASSTHROUGH_MIN_XRES,
        }
    }
}

/// Line length at `candidate_mhz` covering half the input line period.
pub fn doubled_line_width(total_width: u32, observed_mhz: u32, candidate_mhz: u32) -> u32 {
    if observed_mhz == 0 {
        return 0;
    }
    let width = u64::from(total_width) * u64::from(candidate_mhz) / u64::from(observed_mhz) / 2;
    u32::try_from(width).unwrap_or(u32::MAX)
}

/// Compute the output configuration for an observed timing.
pub fn synthesize(observed: &TimingDescriptor, classification: Classification) -> OutputMode {
    match classification {
        Classification::HighRes => synthesize_hires(observed),
        Classification::Passthrough => OutputMode::passthrough(observed),
        Classification::Doubling { horizontal } => synthesize_doubled(observed, horizontal),
    }
}

fn synthesize_hires(observed: &TimingDescriptor) -> OutputMode {
    log::info!("Guessed hires mono mode");
    let mut timing = *observed;
    timing.xres = timing.xres.wrapping_mul(HIRES_SCALE);
    timing.h_front_porch = timing.h_front_porch.wrapping_mul(HIRES_SCALE);
    timing.h_sync_width = timing.h_sync_width.wrapping_mul(HIRES_SCALE);
    timing.h_back_porch = timing.h_back_porch.wrapping_mul(HIRES_SCALE);
    timing.pixel_rate_mhz = timing.pixel_rate_mhz.wrapping_mul(HIRES_SCALE);
    timing.bpp_class = 0;

    OutputMode {
        words_per_line_m1: timing.words_per_line_m1(),
        timing,
        cursor_offset: HIRES_CURSOR_OFFSET,
        hires: true,
        double_x: false,
        double_y: false,
        multiplier: MultiplierClass::X4,
    }
}

fn synthesize_doubled(observed: &TimingDescriptor, horizontal: bool) -> OutputMode {
    let passthrough = OutputMode::passthrough(observed);
    if observed.yres >= PASSTHROUGH_MIN_YRES {
        log::warn!(
            "Narrow {}x{} mode can't be line-doubled, outputting as-is",
            observed.xres,
            observed.yres
        );
        return passthrough;
    }

    let xres = if horizontal {
        observed.xres * 2
    } else {
        observed.xres
    };
    let min_width = xres.saturating_add(xres / MIN_H_BLANKING_DIVISOR);
    let total_width = observed.total_width();

    // The line is emitted twice per input line period, so it must take half
    // as long at the new clock.
    let found = DOUBLING_CANDIDATES.iter().find_map(|&(pclk, multiplier)| {
        let new_width = doubled_line_width(total_width, observed.pixel_rate_mhz, pclk);
        log::debug!(
            "pclk {}MHz: hcr {}, new width {}, xres {}, min width {}",
            pclk,
            total_width,
            new_width,
            xres,
            min_width
        );
        (new_width >= min_width).then_some((pclk, multiplier, new_width))
    });

    let Some((pclk, multiplier, new_width)) = found else {
        log::warn!(
            "Giving up, can't line-double this mode ({} MHz, width {}, min {})",
            observed.pixel_rate_mhz,
            total_width,
            min_width
        );
        return passthrough;
    };

    let mut timing = *observed;
    timing.xres = xres;
    timing.pixel_rate_mhz = pclk;
    timing.yres *= 2;
    timing.v_front_porch = timing.v_front_porch.wrapping_mul(2);
    timing.v_sync_width = timing.v_sync_width.wrapping_mul(2);
    timing.v_back_porch = timing.v_back_porch.wrapping_mul(2);

    timing.h_front_porch = new_width / SYNTH_FRONT_PORCH_DIVISOR;
    timing.h_sync_width = new_width / SYNTH_SYNC_WIDTH_DIVISOR;
    let used = xres
        .saturating_add(timing.h_front_porch)
        .saturating_add(timing.h_sync_width);
    timing.h_back_porch = new_width.checked_sub(used).unwrap_or_else(|| {
        log::warn!(
            "Synthesised porches overrun width {} by {}, back porch clamped",
            new_width,
            used - new_width
        );
        0
    });

    log::info!(
        "{}-doubled: new width {}, fp {}, xsw {}, bp {}",
        if horizontal { "XY" } else { "Y" },
        new_width,
        timing.h_front_porch,
        timing.h_sync_width,
        timing.h_back_porch
    );

    OutputMode {
        timing,
        double_x: horizontal,
        double_y: true,
        multiplier,
        ..passthrough
    }
}

/// Owns the register bus and the probe state, and performs every output
/// reprogramming.
pub struct ProbeEngine<B: RegisterBus, D: DelayNs> {
    bus: B,
    delay: D,
    state: ProbeState,
    autoprobe: bool,
}

impl<B: RegisterBus, D: DelayNs> ProbeEngine<B, D> {
    /// Create an engine with invalid probe state and autoprobe on.
    pub fn new(bus: B, delay: D) -> Self {
        Self {
            bus,
            delay,
            state: ProbeState::invalid(),
            autoprobe: true,
        }
    }

    /// Bring the output PLL up on its power-on configuration (x1).
    pub fn init(&mut self) {
        if let Err(e) = pll::bring_up(&mut self.bus, &mut self.delay) {
            log::warn!("PLL bring-up: {:?}", e);
        }
        self.state.multiplier = Some(MultiplierClass::X1);
    }

    pub fn state(&self) -> &ProbeState {
        &self.state
    }

    pub fn autoprobe(&self) -> bool {
        self.autoprobe
    }

    pub fn set_autoprobe(&mut self, on: bool) {
        self.autoprobe = on;
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give back the bus and delay.
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    /// Decode the input timing and reprogram the output if it changed.
    ///
    /// `force` discards the probe state first, so everything (PLL included)
    /// is reprogrammed. Never fails; problems are logged and degrade to a
    /// simpler output mode.
    pub fn probe(&mut self, force: bool) -> ProbeOutcome {
        if force {
            self.state = ProbeState::invalid();
        }

        if sync::wait_flyback(&mut self.bus).is_err() {
            log::warn!("No input flyback seen, probing anyway");
        }

        log::debug!(
            "CR = {:08x}, ID = {:08x}",
            self.bus.read32(regs::ctrl(regs::CTRL_REG)),
            self.bus.read32(regs::ctrl(regs::CTRL_ID))
        );

        let observed = decoder::decode(&mut self.bus);
        let key = observed.mode_key();
        if self.state.matches(&key) {
            log::debug!("Config changed, but equals existing mode {}", observed);
            return ProbeOutcome::Unchanged;
        }
        log::info!("New mode {}", observed);

        let classification = classify(&observed);
        let mode = synthesize(&observed, classification);
        self.apply(&mode);
        self.state.mode = Some(key);

        ProbeOutcome::Reprogrammed {
            classification,
            mode,
        }
    }

    /// Program a preset directly, bypassing the probe.
    pub fn set_mode(&mut self, preset: Preset) {
        log::info!("Setting preset {:?}", preset);
        self.apply(&preset.output_mode());
        self.state.mode = None;
    }

    /// Program a preset by legacy mode number. Unknown numbers are logged
    /// and program nothing.
    pub fn set_mode_number(&mut self, mode: u8) -> bool {
        match Preset::from_mode_number(mode) {
            Some(preset) => {
                self.set_mode(preset);
                true
            }
            None => {
                log::warn!("Unknown mode {}", mode);
                false
            }
        }
    }

    /// Run the output sync handshake on its own.
    pub fn sync(&mut self) -> Result<u32, sync::SyncError> {
        sync::sync(&mut self.bus)
    }

    /// Snapshot and log the programmed output timing.
    pub fn dump_timing(&mut self) -> TimingSnapshot {
        let snap = TimingSnapshot::read(&mut self.bus);
        log::info!("{}", snap);
        snap
    }

    /// Snapshot and log the input shadow registers.
    pub fn dump_input(&mut self) -> InputSnapshot {
        let snap = InputSnapshot::read(&mut self.bus);
        log::info!("{}", snap);
        snap
    }

    pub fn set_x_timing(&mut self, xres: u32, fp: u32, sw: u32, bp: u32, wpl_m1: u32) {
        self.write_vo(regs::VIDO_REG_RES_X, xres);
        self.write_vo(regs::VIDO_REG_HS_FP, fp);
        self.write_vo(regs::VIDO_REG_HS_WIDTH, sw);
        self.write_vo(regs::VIDO_REG_HS_BP, bp);
        self.write_vo(regs::VIDO_REG_WPLM1, wpl_m1);
        self.state.mode = None;
    }

    pub fn set_y_timing(&mut self, yres: u32, fp: u32, sw: u32, bp: u32) {
        self.write_vo(regs::VIDO_REG_RES_Y, yres);
        self.write_vo(regs::VIDO_REG_VS_FP, fp);
        self.write_vo(regs::VIDO_REG_VS_WIDTH, sw);
        self.write_vo(regs::VIDO_REG_VS_BP, bp);
        self.state.mode = None;
    }

    pub fn set_cursor_x(&mut self, offset: u32) {
        let ctrl = self.bus.read32(regs::vo(regs::VIDO_REG_CTRL));
        self.write_vo(
            regs::VIDO_REG_CTRL,
            (ctrl & !regs::VIDO_CTRL_CURSOR_MASK) | (offset & regs::VIDO_CTRL_CURSOR_MASK),
        );
        self.state.mode = None;
    }

    /// Service the input reconfiguration flag.
    ///
    /// The FPGA toggles the status bit when the host rewrites VIDC timing;
    /// toggling our ack re-arms detection. Probes only if autoprobe is on.
    pub fn poll_reconfig(&mut self) -> Option<ProbeOutcome> {
        let addr = regs::vo(regs::VIDO_REG_SYNC);
        let s = self.bus.read32(addr);
        let status = s & regs::VIDO_SYNC_RECONFIG != 0;
        let ack = s & regs::VIDO_SYNC_RECONFIG_ACK != 0;
        if status == ack {
            return None;
        }

        log::info!("VIDC reconfig {:08x}", s);
        self.bus.write32(addr, s ^ regs::VIDO_SYNC_RECONFIG_ACK);

        if self.autoprobe {
            Some(self.probe(false))
        } else {
            None
        }
    }

    /// Write a full output configuration and hand it to the output logic.
    fn apply(&mut self, mode: &OutputMode) {
        if self.state.multiplier != Some(mode.multiplier) {
            if let Err(e) = pll::program(&mut self.bus, &mut self.delay, mode.multiplier) {
                log::warn!("PLL reprogram: {:?}", e);
            }
            self.state.multiplier = Some(mode.multiplier);
        }

        let t = &mode.timing;
        self.write_vo(regs::VIDO_REG_RES_X, mode.res_x_word());
        self.write_vo(regs::VIDO_REG_HS_FP, t.h_front_porch);
        self.write_vo(regs::VIDO_REG_HS_WIDTH, t.h_sync_width);
        self.write_vo(regs::VIDO_REG_HS_BP, t.h_back_porch);
        self.write_vo(regs::VIDO_REG_RES_Y, mode.res_y_word());
        self.write_vo(regs::VIDO_REG_VS_FP, t.v_front_porch);
        self.write_vo(regs::VIDO_REG_VS_WIDTH, t.v_sync_width);
        self.write_vo(regs::VIDO_REG_VS_BP, t.v_back_porch);
        self.write_vo(regs::VIDO_REG_WPLM1, mode.words_per_line_m1);
        self.write_vo(regs::VIDO_REG_CTRL, mode.control_word());

        // A handshake timeout is logged inside; the display may still recover.
        let _ = sync::sync(&mut self.bus);
    }

    fn write_vo(&mut self, index: u32, value: u32) {
        self.bus.write32(regs::vo(index), value);
    }
}
