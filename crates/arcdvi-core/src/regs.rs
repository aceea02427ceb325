//! FPGA register addresses and bit-field constants.
//!
//! The register file is word addressed. Input shadow registers mirror the
//! legacy VIDC write stream, output registers drive the DVI timing generator,
//! and the board control block carries the PLL programming lines.

// --- Regions ---

/// Input shadow region (VIDC register mirror).
pub const VIDC_BASE: u32 = 0x000;
/// Output timing region.
pub const VO_BASE: u32 = 0x100;
/// Board control region.
pub const CTRL_BASE: u32 = 0x200;

/// Shadow word address for a VIDC register byte address.
pub const fn vidc(byte_addr: u32) -> u32 {
    VIDC_BASE + (byte_addr & 0xFC) / 4
}

/// Output timing register address.
pub const fn vo(index: u32) -> u32 {
    VO_BASE + index
}

/// Board control register address.
pub const fn ctrl(index: u32) -> u32 {
    CTRL_BASE + index
}

// --- VIDC shadow registers (byte addresses as seen by the legacy host) ---

pub const VIDC_PAL_0: u32 = 0x00;
pub const VIDC_BORDERCOL: u32 = 0x40;
pub const VIDC_CURSORPAL1: u32 = 0x44;
pub const VIDC_CURSORPAL2: u32 = 0x48;
pub const VIDC_CURSORPAL3: u32 = 0x4C;
/// Bridge-specific: bit 0 enables the extended palette / 16bpp pixel path.
pub const VIDC_SPECIAL: u32 = 0x50;
pub const VIDC_SPECIAL_DATA: u32 = 0x54;
pub const VIDC_STEREO0: u32 = 0x60;

pub const VIDC_H_CYC: u32 = 0x80;
pub const VIDC_H_SYNC: u32 = 0x84;
pub const VIDC_H_BORDER_START: u32 = 0x88;
pub const VIDC_H_DISP_START: u32 = 0x8C;
pub const VIDC_H_DISP_END: u32 = 0x90;
pub const VIDC_H_BORDER_END: u32 = 0x94;
pub const VIDC_H_CURSOR_START: u32 = 0x98;
pub const VIDC_H_INTERLACE: u32 = 0x9C;

pub const VIDC_V_CYC: u32 = 0xA0;
pub const VIDC_V_SYNC: u32 = 0xA4;
pub const VIDC_V_BORDER_START: u32 = 0xA8;
pub const VIDC_V_DISP_START: u32 = 0xAC;
pub const VIDC_V_DISP_END: u32 = 0xB0;
pub const VIDC_V_BORDER_END: u32 = 0xB4;
pub const VIDC_V_CURSOR_START: u32 = 0xB8;
pub const VIDC_V_CURSOR_END: u32 = 0xBC;

pub const VIDC_SOUND_FREQ: u32 = 0xC0;
pub const VIDC_CONTROL: u32 = 0xE0;

/// Bridge-maintained DMA counters (per frame).
pub const V_DMAC_VIDEO: u32 = 0xF0;
pub const V_DMAC_CURSOR: u32 = 0xF4;

/// Timing fields occupy bits [23:14] of a shadow word.
pub const TIMING_FIELD_SHIFT: u32 = 14;
pub const TIMING_FIELD_MASK: u32 = 0x3FF;

/// Extract the 10-bit timing field from a shadow word.
pub const fn timing_field(raw: u32) -> u32 {
    (raw >> TIMING_FIELD_SHIFT) & TIMING_FIELD_MASK
}

// --- VIDC control register fields ---

pub const VIDC_CR_PIXEL_RATE_MASK: u32 = 0x3;
pub const VIDC_CR_BPP_SHIFT: u32 = 2;
pub const VIDC_CR_BPP_MASK: u32 = 0x3;
pub const VIDC_CR_DMA_SHIFT: u32 = 4;
pub const VIDC_CR_INTERLACE: u32 = 1 << 6;
pub const VIDC_CR_COMPOSITE_SYNC: u32 = 1 << 7;
pub const VIDC_CR_TM3: u32 = 1 << 8;
pub const VIDC_CR_TEST_MODE_SHIFT: u32 = 14;

/// Extended palette / 16bpp enable in `VIDC_SPECIAL`.
pub const VIDC_SPECIAL_EXT_PALETTE: u32 = 1 << 0;

// --- Output timing registers (word index within VO region) ---

pub const VIDO_REG_RES_X: u32 = 0;
pub const VIDO_REG_HS_FP: u32 = 1;
pub const VIDO_REG_HS_WIDTH: u32 = 2;
pub const VIDO_REG_HS_BP: u32 = 3;
pub const VIDO_REG_RES_Y: u32 = 4;
pub const VIDO_REG_VS_FP: u32 = 5;
pub const VIDO_REG_VS_WIDTH: u32 = 6;
pub const VIDO_REG_VS_BP: u32 = 7;
pub const VIDO_REG_WPLM1: u32 = 8;
pub const VIDO_REG_CTRL: u32 = 9;
pub const VIDO_REG_SYNC: u32 = 10;

/// RES_X / RES_Y: pixel or line doubling enable.
pub const VIDO_RES_DOUBLE: u32 = 1 << 31;

/// CTRL: cursor / display X offset (bits [10:0]).
pub const VIDO_CTRL_CURSOR_MASK: u32 = 0x7FF;
/// CTRL: extended palette enable.
pub const VIDO_CTRL_EXT_PALETTE: u32 = 1 << 27;
/// CTRL: bpp class (bits [30:28]).
pub const VIDO_CTRL_BPP_SHIFT: u32 = 28;
pub const VIDO_CTRL_BPP_MASK: u32 = 0x7;
/// CTRL: hires mono output path.
pub const VIDO_CTRL_HIRES: u32 = 1 << 31;

/// SYNC: output sync request (written, toggled).
pub const VIDO_SYNC_REQ: u32 = 1 << 0;
/// SYNC: output sync acknowledge (mirrors REQ once adopted).
pub const VIDO_SYNC_ACK: u32 = 1 << 1;
/// SYNC: input reconfiguration acknowledge (written, toggled).
pub const VIDO_SYNC_RECONFIG_ACK: u32 = 1 << 2;
/// SYNC: input reconfiguration status (toggles on each VIDC timing write burst).
pub const VIDO_SYNC_RECONFIG: u32 = 1 << 3;
/// SYNC: input vertical flyback in progress.
pub const VIDO_SYNC_FLYBACK: u32 = 1 << 4;

// --- Board control registers ---

pub const CTRL_ID: u32 = 0;
pub const CTRL_REG: u32 = 1;

/// Video logic reset.
pub const CR_RESET: u32 = 1 << 0;
/// PLL out of reset (active high).
pub const CR_PLL_NRESET: u32 = 1 << 1;
/// PLL configuration shift clock.
pub const CR_PLL_CLK: u32 = 1 << 2;
/// PLL configuration shift data.
pub const CR_PLL_DATA: u32 = 1 << 3;
/// PLL locked (read-only).
pub const CR_PLL_LOCK: u32 = 1 << 4;
/// Bypass the PLL, output clock = reference clock.
pub const CR_PLL_BYPASS: u32 = 1 << 5;
/// Indicator LED.
pub const CR_LED: u32 = 1 << 6;
