//! Output PLL reconfiguration over the board control register.
//!
//! The iCE40 PLL accepts a 26-bit configuration word shifted in MSB-first on
//! rising edges of a software-driven clock. There is no independent clock on
//! the receiving shift register, so the edge ordering and the fixed delays
//! below must not change.
//!
//! Word layout:
//!
//! ```text
//! [   25] FSE               1 (simple feedback)
//! [24:23] PLLOUT1 select    0 (GENCLK)
//! [   22] reference source  1 (fabric)
//! [   21] shift reg mode    0
//! [20:19] PLLOUT2 select    0 (GENCLK)
//! [18:17] delay mux         0
//! [16:14] FILTER_RANGE
//! [13:11] DIVQ
//! [10: 4] DIVF
//! [ 3: 0] DIVR
//! ```

use arcdvi_hal::RegisterBus;
use embedded_hal::delay::DelayNs;

use crate::regs;
use crate::timing::MultiplierClass;

/// Configuration word length in bits.
pub const PLL_CONFIG_BITS: u32 = 26;

const PLL_CFG_FIXED: u32 = (1 << 25) | (0 << 23) | (1 << 22) | (0 << 19);

const DIVR_SHIFT: u32 = 0;
const DIVR_MASK: u32 = 0xF;
const DIVF_SHIFT: u32 = 4;
const DIVF_MASK: u32 = 0x7F;
const DIVQ_SHIFT: u32 = 11;
const DIVQ_MASK: u32 = 0x7;
const FILTER_RANGE_SHIFT: u32 = 14;
const FILTER_RANGE_MASK: u32 = 0x7;

/// Logic reset is held this long before the PLL is put into reset.
pub const LOGIC_RESET_SETTLE_US: u32 = 10;
/// Each phase of a configuration bit (setup, clock high, clock low).
pub const SHIFT_PHASE_US: u32 = 100;
/// Settle time after releasing PLL reset.
pub const PLL_RELEASE_SETTLE_MS: u32 = 1;
/// Lock polling: iterations, and delay per iteration.
pub const PLL_LOCK_POLL_LIMIT: u32 = 1000;
pub const PLL_LOCK_POLL_MS: u32 = 1;

/// Divider settings for one multiplier class.
///
/// f_out = 24MHz * (DIVF + 1) / ((DIVR + 1) * 2^DIVQ)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllCoefficients {
    pub divr: u8,
    pub divf: u8,
    pub divq: u8,
    pub filter_range: u8,
}

impl PllCoefficients {
    pub const fn for_class(class: MultiplierClass) -> Self {
        let (divf, divq) = match class {
            MultiplierClass::X0_38 => (23, 6),
            MultiplierClass::X0_5 => (31, 6),
            MultiplierClass::X1 => (31, 5),
            MultiplierClass::X1_5 => (23, 4),
            MultiplierClass::X2 => (31, 4),
            MultiplierClass::X4 => (31, 3),
        };
        Self {
            divr: 0,
            divf,
            divq,
            filter_range: 2,
        }
    }
}

/// A complete 26-bit PLL configuration word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllConfigWord(u32);

impl PllConfigWord {
    pub const fn from_coefficients(c: PllCoefficients) -> Self {
        Self(
            PLL_CFG_FIXED
                | ((c.divr as u32 & DIVR_MASK) << DIVR_SHIFT)
                | ((c.divf as u32 & DIVF_MASK) << DIVF_SHIFT)
                | ((c.divq as u32 & DIVQ_MASK) << DIVQ_SHIFT)
                | ((c.filter_range as u32 & FILTER_RANGE_MASK) << FILTER_RANGE_SHIFT),
        )
    }

    pub const fn for_class(class: MultiplierClass) -> Self {
        Self::from_coefficients(PllCoefficients::for_class(class))
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw & ((1 << PLL_CONFIG_BITS) - 1))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn coefficients(self) -> PllCoefficients {
        PllCoefficients {
            divr: ((self.0 >> DIVR_SHIFT) & DIVR_MASK) as u8,
            divf: ((self.0 >> DIVF_SHIFT) & DIVF_MASK) as u8,
            divq: ((self.0 >> DIVQ_SHIFT) & DIVQ_MASK) as u8,
            filter_range: ((self.0 >> FILTER_RANGE_SHIFT) & FILTER_RANGE_MASK) as u8,
        }
    }

    /// Bits in transmission order (MSB first).
    pub fn bits(self) -> impl Iterator<Item = bool> {
        (0..PLL_CONFIG_BITS)
            .rev()
            .map(move |bit| self.0 & (1 << bit) != 0)
    }
}

/// PLL programming failures. All are non-fatal; the sequence always runs
/// to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PllError {
    /// The lock bit never rose. Carries the last control register value.
    LockTimeout { ctrl: u32 },
}

/// Resolve a requested multiplier in tenths, falling back to x1.
pub fn resolve_tenths(tenths: u32) -> MultiplierClass {
    MultiplierClass::from_tenths(tenths).unwrap_or_else(|| {
        log::warn!("Pclk multiplication factor {} not supported, using x1", tenths);
        MultiplierClass::X1
    })
}

fn write_ctrl<B: RegisterBus>(bus: &mut B, value: u32) {
    bus.write32(regs::ctrl(regs::CTRL_REG), value);
}

fn wait_lock<B: RegisterBus, D: DelayNs>(bus: &mut B, delay: &mut D) -> Result<(), PllError> {
    let mut ctrl = 0;
    for _ in 0..PLL_LOCK_POLL_LIMIT {
        ctrl = bus.read32(regs::ctrl(regs::CTRL_REG));
        if ctrl & regs::CR_PLL_LOCK != 0 {
            return Ok(());
        }
        delay.delay_ms(PLL_LOCK_POLL_MS);
    }
    log::warn!("PLL lock timeout (CR {:08x})", ctrl);
    Err(PllError::LockTimeout { ctrl })
}

/// Cold bring-up with whatever configuration the bitstream loaded.
pub fn bring_up<B: RegisterBus, D: DelayNs>(bus: &mut B, delay: &mut D) -> Result<(), PllError> {
    write_ctrl(bus, regs::CR_RESET);
    delay.delay_ms(PLL_RELEASE_SETTLE_MS);
    write_ctrl(bus, regs::CR_RESET | regs::CR_PLL_NRESET);
    delay.delay_ms(PLL_RELEASE_SETTLE_MS);
    let locked = wait_lock(bus, delay);
    write_ctrl(bus, regs::CR_PLL_NRESET);
    locked
}

/// Reprogram the PLL for `class`.
///
/// 1. hold video logic in reset while the old clock still runs
/// 2. assert PLL reset
/// 3. shift in the new configuration word
/// 4. release PLL reset
/// 5. wait (bounded) for lock
/// 6. release video logic reset
///
/// Steps 4-6 run even if lock is never seen.
pub fn program<B: RegisterBus, D: DelayNs>(
    bus: &mut B,
    delay: &mut D,
    class: MultiplierClass,
) -> Result<(), PllError> {
    let word = PllConfigWord::for_class(class);
    log::info!(
        "Setting PLL config {:08x} (mult factor {}): real pclk {} MHz",
        word.raw(),
        class,
        class.output_clock_mhz()
    );

    write_ctrl(bus, regs::CR_RESET | regs::CR_PLL_NRESET);
    delay.delay_us(LOGIC_RESET_SETTLE_US);
    write_ctrl(bus, regs::CR_RESET);

    for bit in word.bits() {
        let x = if bit {
            regs::CR_RESET | regs::CR_PLL_DATA
        } else {
            regs::CR_RESET
        };
        write_ctrl(bus, x);
        delay.delay_us(SHIFT_PHASE_US);
        write_ctrl(bus, x | regs::CR_PLL_CLK);
        delay.delay_us(SHIFT_PHASE_US);
        write_ctrl(bus, x);
        delay.delay_us(SHIFT_PHASE_US);
    }

    write_ctrl(bus, regs::CR_RESET | regs::CR_PLL_NRESET);
    delay.delay_ms(PLL_RELEASE_SETTLE_MS);
    let locked = wait_lock(bus, delay);
    write_ctrl(bus, regs::CR_PLL_NRESET);
    locked
}

/// Reprogram the PLL from a multiplier in tenths. Unsupported values are
/// logged and programmed as x1. Returns the class actually programmed.
pub fn program_tenths<B: RegisterBus, D: DelayNs>(
    bus: &mut B,
    delay: &mut D,
    tenths: u32,
) -> (MultiplierClass, Result<(), PllError>) {
    let class = resolve_tenths(tenths);
    (class, program(bus, delay, class))
}
