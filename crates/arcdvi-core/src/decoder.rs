//! Decodes the VIDC shadow registers into a [`TimingDescriptor`].
//!
//! VIDC encodes horizontal cycle and sync lengths in units of two pixels
//! (`reg * 2 + 2`), horizontal display start/end relative to a per-depth
//! pipeline delay (`reg * 2 + offset`), and all vertical values as
//! `reg + 1` lines.

use arcdvi_hal::RegisterBus;

use crate::regs::{self, timing_field};
use crate::timing::{TimingDescriptor, BPP_CLASS_16, PIXEL_RATES_MHZ};

/// Horizontal display start/end alignment per bpp field (1, 2, 4, 8bpp).
pub const HDSR_OFFSETS: [u32; 4] = [19, 11, 7, 5];

/// Substitute display width when HDER reads back as zero.
///
/// Seen when RISC iX programs its high resolution modes. An approximation
/// for that one OS, not a general correction.
pub const HDER_ERRATUM_WIDTH: u32 = 288;

pub fn hdsr_offset(bpp_field: u32) -> u32 {
    HDSR_OFFSETS[(bpp_field & regs::VIDC_CR_BPP_MASK) as usize]
}

/// Raw timing fields as held in the shadow registers.
///
/// Timing values are the 10-bit fields from bits [23:14]; `control` and
/// `special` are whole register words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShadowTiming {
    pub control: u32,
    pub special: u32,
    pub h_cycle: u32,
    pub h_sync: u32,
    pub h_disp_start: u32,
    pub h_disp_end: u32,
    pub v_cycle: u32,
    pub v_sync: u32,
    pub v_disp_start: u32,
    pub v_disp_end: u32,
}

impl ShadowTiming {
    /// Snapshot the timing-relevant shadow registers.
    pub fn read<B: RegisterBus>(bus: &mut B) -> Self {
        let mut field = |reg| timing_field(bus.read32(regs::vidc(reg)));
        let h_cycle = field(regs::VIDC_H_CYC);
        let h_sync = field(regs::VIDC_H_SYNC);
        let h_disp_start = field(regs::VIDC_H_DISP_START);
        let h_disp_end = field(regs::VIDC_H_DISP_END);
        let v_cycle = field(regs::VIDC_V_CYC);
        let v_sync = field(regs::VIDC_V_SYNC);
        let v_disp_start = field(regs::VIDC_V_DISP_START);
        let v_disp_end = field(regs::VIDC_V_DISP_END);

        Self {
            control: bus.read32(regs::vidc(regs::VIDC_CONTROL)),
            special: bus.read32(regs::vidc(regs::VIDC_SPECIAL)),
            h_cycle,
            h_sync,
            h_disp_start,
            h_disp_end,
            v_cycle,
            v_sync,
            v_disp_start,
            v_disp_end,
        }
    }

    pub fn bpp_field(&self) -> u32 {
        (self.control >> regs::VIDC_CR_BPP_SHIFT) & regs::VIDC_CR_BPP_MASK
    }

    pub fn extended_palette(&self) -> bool {
        self.special & regs::VIDC_SPECIAL_EXT_PALETTE != 0
    }

    /// True when HDER is zero and the display width will be substituted.
    pub fn hder_erratum(&self) -> bool {
        self.h_disp_end == 0
    }

    /// Convert to a semantic timing. Never fails: garbage in gives a
    /// well-formed descriptor with garbage values.
    pub fn decode(&self) -> TimingDescriptor {
        let bpp_field = self.bpp_field();
        let offset = hdsr_offset(bpp_field);
        let mut pixel_rate_mhz =
            PIXEL_RATES_MHZ[(self.control & regs::VIDC_CR_PIXEL_RATE_MASK) as usize];

        let hcr = self.h_cycle * 2 + 2;
        let hsw = self.h_sync * 2 + 2;
        let hdsr = self.h_disp_start * 2 + offset;
        let hder = if self.hder_erratum() {
            log::warn!(
                "HDER is 0, substituting display start + {}",
                HDER_ERRATUM_WIDTH
            );
            hdsr + HDER_ERRATUM_WIDTH
        } else {
            self.h_disp_end * 2 + offset
        };
        let vcr = self.v_cycle + 1;
        let vsw = self.v_sync + 1;
        let vdsr = self.v_disp_start + 1;
        let vder = self.v_disp_end + 1;

        let mut xres = hder.wrapping_sub(hdsr);
        let mut h_front_porch = hcr.wrapping_sub(hder);
        let mut h_sync_width = hsw;
        let mut h_back_porch = hdsr.wrapping_sub(hsw);
        let mut bpp_class = bpp_field as u8;

        // 16bpp: the VIDC emits two half-depth pixels per output pixel.
        let extended_palette = self.extended_palette();
        if extended_palette {
            bpp_class = BPP_CLASS_16;
            xres /= 2;
            h_front_porch /= 2;
            h_sync_width /= 2;
            h_back_porch /= 2;
            pixel_rate_mhz /= 2;
        }

        TimingDescriptor {
            xres,
            yres: vder.wrapping_sub(vdsr),
            bpp_class,
            pixel_rate_mhz,
            h_front_porch,
            h_sync_width,
            h_back_porch,
            v_front_porch: vcr.wrapping_sub(vder),
            v_sync_width: vsw,
            v_back_porch: vdsr.wrapping_sub(vsw),
            extended_palette,
        }
    }
}

/// Read and decode the current input timing.
pub fn decode<B: RegisterBus>(bus: &mut B) -> TimingDescriptor {
    ShadowTiming::read(bus).decode()
}
