//! Register-level model of the bridge FPGA.
//!
//! Only the behaviour the MCU firmware depends on is modelled: the shadow
//! registers hold whatever the legacy host last wrote, the output registers
//! are plain storage, and the SYNC and board control registers run their
//! handshakes.

use arcdvi_core::pll::{PllConfigWord, PLL_CONFIG_BITS};
use arcdvi_core::regs;
use arcdvi_hal::RegisterBus;

/// Words in the modelled address space (three 256-word regions).
pub const REG_SPACE_WORDS: usize = 0x300;

/// Value returned by the board ID register.
pub const SIM_BOARD_ID: u32 = 0xad51_0001;

/// SYNC bits the MCU may write; the rest belong to the hardware.
const SYNC_HOST_BITS: u32 = regs::VIDO_SYNC_REQ | regs::VIDO_SYNC_RECONFIG_ACK;

pub struct SimFpga {
    regs: Vec<u32>,
    ack_enabled: bool,
    lock_enabled: bool,
    in_flyback: bool,
    last_ctrl: u32,
    pll_shift: u32,
    pll_bits: u32,
    pll_loaded: Option<PllConfigWord>,
    sync_requests: u32,
}

impl Default for SimFpga {
    fn default() -> Self {
        Self::new()
    }
}

impl SimFpga {
    pub fn new() -> Self {
        Self {
            regs: vec![0; REG_SPACE_WORDS],
            ack_enabled: true,
            lock_enabled: true,
            in_flyback: false,
            last_ctrl: 0,
            pll_shift: 0,
            pll_bits: 0,
            pll_loaded: None,
            sync_requests: 0,
        }
    }

    /// Inject faults: a sync ack that never follows, a PLL that never locks.
    pub fn with_faults(mut self, no_ack: bool, no_lock: bool) -> Self {
        self.ack_enabled = !no_ack;
        self.lock_enabled = !no_lock;
        self
    }

    /// Apply a burst of legacy host writes to the VIDC shadow registers, as
    /// `(byte address, value)` pairs, and raise the reconfiguration event.
    pub fn host_write(&mut self, writes: &[(u32, u32)]) {
        for &(byte_addr, value) in writes {
            self.store(regs::vidc(byte_addr), value);
        }
        let sync = regs::vo(regs::VIDO_REG_SYNC);
        let toggled = self.load(sync) ^ regs::VIDO_SYNC_RECONFIG;
        self.store(sync, toggled);
        log::debug!("Host wrote {} VIDC registers", writes.len());
    }

    /// The configuration word latched by the last PLL release, if any.
    pub fn pll_word(&self) -> Option<PllConfigWord> {
        self.pll_loaded
    }

    /// Sync requests (REQ toggles) seen so far.
    pub fn sync_requests(&self) -> u32 {
        self.sync_requests
    }

    fn load(&self, addr: u32) -> u32 {
        self.regs.get(addr as usize).copied().unwrap_or(0)
    }

    fn store(&mut self, addr: u32, value: u32) {
        match self.regs.get_mut(addr as usize) {
            Some(slot) => *slot = value,
            None => log::warn!("Write to unmapped address {:03x}", addr),
        }
    }

    fn read_sync(&mut self) -> u32 {
        // Alternate in and out of flyback so waits always see both edges.
        self.in_flyback = !self.in_flyback;
        let mut value = self.load(regs::vo(regs::VIDO_REG_SYNC)) & !regs::VIDO_SYNC_FLYBACK;
        if self.in_flyback {
            value |= regs::VIDO_SYNC_FLYBACK;
        }
        value
    }

    fn write_sync(&mut self, data: u32) {
        let addr = regs::vo(regs::VIDO_REG_SYNC);
        let old = self.load(addr);
        let mut value = (old & !SYNC_HOST_BITS) | (data & SYNC_HOST_BITS);
        if (old ^ value) & regs::VIDO_SYNC_REQ != 0 {
            self.sync_requests += 1;
            if self.ack_enabled {
                value &= !regs::VIDO_SYNC_ACK;
                if value & regs::VIDO_SYNC_REQ != 0 {
                    value |= regs::VIDO_SYNC_ACK;
                }
            }
        }
        self.store(addr, value);
    }

    fn read_ctrl(&self) -> u32 {
        let value = self.load(regs::ctrl(regs::CTRL_REG)) & !regs::CR_PLL_LOCK;
        if self.lock_enabled && value & regs::CR_PLL_NRESET != 0 {
            value | regs::CR_PLL_LOCK
        } else {
            value
        }
    }

    fn write_ctrl(&mut self, data: u32) {
        let prev = self.last_ctrl;
        let rose = |bit: u32| data & bit != 0 && prev & bit == 0;

        if rose(regs::CR_PLL_CLK) && data & regs::CR_PLL_NRESET == 0 {
            let bit = u32::from(data & regs::CR_PLL_DATA != 0);
            self.pll_shift = (self.pll_shift << 1) | bit;
            self.pll_bits += 1;
        }
        if rose(regs::CR_PLL_NRESET) {
            if self.pll_bits >= PLL_CONFIG_BITS {
                let word = PllConfigWord::from_raw(self.pll_shift);
                log::debug!("PLL latched {:08x}", word.raw());
                self.pll_loaded = Some(word);
            }
            self.pll_shift = 0;
            self.pll_bits = 0;
        }

        self.last_ctrl = data;
        self.store(regs::ctrl(regs::CTRL_REG), data & !regs::CR_PLL_LOCK);
    }
}

impl RegisterBus for SimFpga {
    fn read32(&mut self, addr: u32) -> u32 {
        if addr == regs::vo(regs::VIDO_REG_SYNC) {
            self.read_sync()
        } else if addr == regs::ctrl(regs::CTRL_REG) {
            self.read_ctrl()
        } else if addr == regs::ctrl(regs::CTRL_ID) {
            SIM_BOARD_ID
        } else {
            self.load(addr)
        }
    }

    fn write32(&mut self, addr: u32, data: u32) {
        if addr == regs::vo(regs::VIDO_REG_SYNC) {
            self.write_sync(data);
        } else if addr == regs::ctrl(regs::CTRL_REG) {
            self.write_ctrl(data);
        } else if addr < regs::VO_BASE {
            log::trace!("Ignoring MCU write to VIDC shadow {:03x}", addr);
        } else {
            self.store(addr, data);
        }
    }
}
