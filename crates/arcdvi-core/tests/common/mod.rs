//! Mock FPGA register file shared by the integration tests.
//!
//! Behaves like the bridge FPGA where the engine depends on it: the sync ack
//! mirrors the request, the flyback bit alternates on every SYNC read, the
//! PLL reports lock once out of reset, and rising PLL clock edges shift the
//! data line into a capture register.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use arcdvi_core::regs;
use arcdvi_hal::RegisterBus;
use embedded_hal::delay::DelayNs;

/// Captured register write: (address, data).
pub type WriteRecord = (u32, u32);

pub struct FpgaState {
    pub regs: HashMap<u32, u32>,
    pub writes: Vec<WriteRecord>,
    pub ack_follows_request: bool,
    pub pll_locks: bool,
    pub flyback_toggles: bool,
    sync_reads: u64,
    last_ctrl: u32,
    pub pll_shift: u64,
    pub pll_bits: u32,
}

impl Default for FpgaState {
    fn default() -> Self {
        Self {
            regs: HashMap::new(),
            writes: Vec::new(),
            ack_follows_request: true,
            pll_locks: true,
            flyback_toggles: true,
            sync_reads: 0,
            last_ctrl: 0,
            pll_shift: 0,
            pll_bits: 0,
        }
    }
}

#[derive(Clone, Default)]
pub struct MockFpga {
    pub state: Rc<RefCell<FpgaState>>,
}

impl MockFpga {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, addr: u32, value: u32) {
        self.state.borrow_mut().regs.insert(addr, value);
    }

    pub fn get(&self, addr: u32) -> u32 {
        self.state.borrow().regs.get(&addr).copied().unwrap_or(0)
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state.borrow().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.borrow_mut().writes.clear();
    }

    pub fn writes_to(&self, addr: u32) -> Vec<u32> {
        self.state
            .borrow()
            .writes
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, d)| *d)
            .collect()
    }

    /// Writes to the output timing registers, SYNC excluded.
    pub fn timing_writes(&self) -> Vec<WriteRecord> {
        let sync = regs::vo(regs::VIDO_REG_SYNC);
        self.state
            .borrow()
            .writes
            .iter()
            .copied()
            .filter(|(a, _)| (regs::VO_BASE..regs::CTRL_BASE).contains(a) && *a != sync)
            .collect()
    }

    pub fn last_vo(&self, index: u32) -> Option<u32> {
        self.writes_to(regs::vo(index)).last().copied()
    }

    /// Reset the PLL capture register.
    pub fn clear_pll_capture(&self) {
        let mut s = self.state.borrow_mut();
        s.pll_shift = 0;
        s.pll_bits = 0;
    }

    pub fn pll_capture(&self) -> (u64, u32) {
        let s = self.state.borrow();
        (s.pll_shift, s.pll_bits)
    }

    pub fn set_ack_follows_request(&self, on: bool) {
        self.state.borrow_mut().ack_follows_request = on;
    }

    pub fn set_pll_locks(&self, on: bool) {
        self.state.borrow_mut().pll_locks = on;
    }

    pub fn set_flyback_toggles(&self, on: bool) {
        self.state.borrow_mut().flyback_toggles = on;
    }

    /// Load the VIDC shadow registers for a timing given in decoded units.
    pub fn load_input(&self, input: &InputTiming) {
        let offset = arcdvi_core::decoder::hdsr_offset(input.bpp_field);
        let field = |v: u32| v << regs::TIMING_FIELD_SHIFT;
        self.set(regs::vidc(regs::VIDC_H_CYC), field((input.hcr - 2) / 2));
        self.set(regs::vidc(regs::VIDC_H_SYNC), field((input.hsw - 2) / 2));
        self.set(regs::vidc(regs::VIDC_H_DISP_START), field((input.hdsr - offset) / 2));
        self.set(
            regs::vidc(regs::VIDC_H_DISP_END),
            field(input.hder.map_or(0, |hder| (hder - offset) / 2)),
        );
        self.set(regs::vidc(regs::VIDC_V_CYC), field(input.vcr - 1));
        self.set(regs::vidc(regs::VIDC_V_SYNC), field(input.vsw - 1));
        self.set(regs::vidc(regs::VIDC_V_DISP_START), field(input.vdsr - 1));
        self.set(regs::vidc(regs::VIDC_V_DISP_END), field(input.vder - 1));
        self.set(
            regs::vidc(regs::VIDC_CONTROL),
            input.rate_field | (input.bpp_field << regs::VIDC_CR_BPP_SHIFT),
        );
        self.set(
            regs::vidc(regs::VIDC_SPECIAL),
            if input.extended {
                regs::VIDC_SPECIAL_EXT_PALETTE
            } else {
                0
            },
        );
    }
}

impl RegisterBus for MockFpga {
    fn read32(&mut self, addr: u32) -> u32 {
        let mut s = self.state.borrow_mut();
        let mut value = s.regs.get(&addr).copied().unwrap_or(0);

        if addr == regs::vo(regs::VIDO_REG_SYNC) {
            if s.flyback_toggles {
                if s.sync_reads % 2 == 0 {
                    value |= regs::VIDO_SYNC_FLYBACK;
                } else {
                    value &= !regs::VIDO_SYNC_FLYBACK;
                }
            }
            s.sync_reads += 1;
            if s.ack_follows_request {
                value &= !regs::VIDO_SYNC_ACK;
                if value & regs::VIDO_SYNC_REQ != 0 {
                    value |= regs::VIDO_SYNC_ACK;
                }
            }
        } else if addr == regs::ctrl(regs::CTRL_REG) {
            value &= !regs::CR_PLL_LOCK;
            if s.pll_locks && value & regs::CR_PLL_NRESET != 0 {
                value |= regs::CR_PLL_LOCK;
            }
        }
        value
    }

    fn write32(&mut self, addr: u32, data: u32) {
        let mut s = self.state.borrow_mut();
        s.writes.push((addr, data));

        if addr == regs::ctrl(regs::CTRL_REG) {
            let rising = data & regs::CR_PLL_CLK != 0 && s.last_ctrl & regs::CR_PLL_CLK == 0;
            if rising {
                let bit = u64::from(data & regs::CR_PLL_DATA != 0);
                s.pll_shift = (s.pll_shift << 1) | bit;
                s.pll_bits += 1;
            }
            s.last_ctrl = data;
        }
        s.regs.insert(addr, data);
    }
}

/// Delay that only accumulates the requested time.
#[derive(Clone, Default)]
pub struct MockDelay {
    pub total_ns: Rc<Cell<u64>>,
}

impl MockDelay {
    pub fn total_us(&self) -> u64 {
        self.total_ns.get() / 1_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + u64::from(ns));
    }
}

/// An input timing in decoded pixel/line units. `hder: None` programs a
/// zero HDER field.
#[derive(Debug, Clone, Copy)]
pub struct InputTiming {
    pub rate_field: u32,
    pub bpp_field: u32,
    pub extended: bool,
    pub hcr: u32,
    pub hsw: u32,
    pub hdsr: u32,
    pub hder: Option<u32>,
    pub vcr: u32,
    pub vsw: u32,
    pub vdsr: u32,
    pub vder: u32,
}

/// 640x256, 4bpp, 8MHz, 896 pixel clocks per line.
pub fn mode_640x256_8mhz() -> InputTiming {
    InputTiming {
        rate_field: 0,
        bpp_field: 2,
        extended: false,
        hcr: 896,
        hsw: 72,
        hdsr: 147,
        hder: Some(787),
        vcr: 312,
        vsw: 3,
        vdsr: 19,
        vder: 275,
    }
}

/// 640x256, 8bpp, 24MHz, only 800 pixel clocks per line.
pub fn mode_640x256_24mhz() -> InputTiming {
    InputTiming {
        rate_field: 3,
        bpp_field: 3,
        extended: false,
        hcr: 800,
        hsw: 40,
        hdsr: 121,
        hder: Some(761),
        vcr: 312,
        vsw: 3,
        vdsr: 19,
        vder: 275,
    }
}

/// 800x600, 8bpp, 24MHz.
pub fn mode_800x600() -> InputTiming {
    InputTiming {
        rate_field: 3,
        bpp_field: 3,
        extended: false,
        hcr: 1056,
        hsw: 128,
        hdsr: 215,
        hder: Some(1015),
        vcr: 628,
        vsw: 4,
        vdsr: 27,
        vder: 627,
    }
}

/// 288x896, 4bpp, 24MHz: mode 23 as the VIDC sees it.
pub fn mode_hires_288x896() -> InputTiming {
    InputTiming {
        rate_field: 3,
        bpp_field: 2,
        extended: false,
        hcr: 398,
        hsw: 10,
        hdsr: 47,
        hder: Some(335),
        vcr: 950,
        vsw: 3,
        vdsr: 47,
        vder: 943,
    }
}

/// 320x256, 8bpp, 8MHz, 512 pixel clocks per line.
pub fn mode_320x256_8mhz() -> InputTiming {
    InputTiming {
        rate_field: 0,
        bpp_field: 3,
        extended: false,
        hcr: 512,
        hsw: 36,
        hdsr: 75,
        hder: Some(395),
        vcr: 312,
        vsw: 3,
        vdsr: 19,
        vder: 275,
    }
}
