//! Synthetic legacy screen modes and their VIDC register encoding.
//!
//! Timings are given in the units the decoder produces (pixel clocks and
//! lines, display start/end measured from the start of sync) and encoded
//! back into the 10-bit register fields the legacy host would write.

use arcdvi_core::decoder::hdsr_offset;
use arcdvi_core::regs;

use crate::error::SimError;

/// One legacy screen mode, as programmed into the VIDC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyMode {
    pub number: u8,
    pub name: &'static str,
    /// VIDC control pixel rate field (8/12/16/24MHz).
    pub rate_field: u32,
    /// VIDC control bpp field (1/2/4/8bpp).
    pub bpp_field: u32,
    pub hcr: u32,
    pub hsw: u32,
    pub hdsr: u32,
    pub hder: u32,
    pub vcr: u32,
    pub vsw: u32,
    pub vdsr: u32,
    pub vder: u32,
}

/// 640x256 at 16MHz, 64us lines.
const fn mode_640x256(number: u8, bpp_field: u32) -> LegacyMode {
    LegacyMode {
        number,
        name: "640x256",
        rate_field: 2,
        bpp_field,
        hcr: 1024,
        hsw: 72,
        hdsr: 155,
        hder: 795,
        vcr: 312,
        vsw: 3,
        vdsr: 19,
        vder: 275,
    }
}

/// 320x256 at 8MHz.
const fn mode_320x256(number: u8, bpp_field: u32) -> LegacyMode {
    LegacyMode {
        number,
        name: "320x256",
        rate_field: 0,
        bpp_field,
        hcr: 512,
        hsw: 36,
        hdsr: 79,
        hder: 399,
        vcr: 312,
        vsw: 3,
        vdsr: 19,
        vder: 275,
    }
}

/// 640x512 multisync at 24MHz.
const fn mode_640x512(number: u8, bpp_field: u32) -> LegacyMode {
    LegacyMode {
        number,
        name: "640x512",
        rate_field: 3,
        bpp_field,
        hcr: 896,
        hsw: 56,
        hdsr: 169,
        hder: 809,
        vcr: 534,
        vsw: 3,
        vdsr: 21,
        vder: 533,
    }
}

/// 640x480 VGA-like at 24MHz.
const fn mode_640x480(number: u8, bpp_field: u32) -> LegacyMode {
    LegacyMode {
        number,
        name: "640x480",
        rate_field: 3,
        bpp_field,
        hcr: 800,
        hsw: 96,
        hdsr: 145,
        hder: 785,
        vcr: 525,
        vsw: 2,
        vdsr: 35,
        vder: 515,
    }
}

/// The simulated mode table, keyed by legacy mode number.
pub const LEGACY_MODES: [LegacyMode; 17] = [
    mode_640x256(0, 0),
    mode_320x256(1, 1),
    mode_320x256(4, 0),
    mode_640x256(8, 1),
    mode_320x256(9, 2),
    mode_640x256(12, 2),
    mode_320x256(13, 3),
    mode_640x256(15, 3),
    mode_640x512(18, 0),
    mode_640x512(19, 1),
    mode_640x512(20, 2),
    mode_640x512(21, 3),
    // 1152x896 mono: four output pixels per 4bpp VIDC pixel.
    LegacyMode {
        number: 23,
        name: "1152x896 mono",
        rate_field: 3,
        bpp_field: 2,
        hcr: 398,
        hsw: 10,
        hdsr: 47,
        hder: 335,
        vcr: 950,
        vsw: 3,
        vdsr: 47,
        vder: 943,
    },
    mode_640x480(25, 0),
    mode_640x480(26, 1),
    mode_640x480(27, 2),
    mode_640x480(28, 3),
];

pub fn find(number: u8) -> Result<&'static LegacyMode, SimError> {
    LEGACY_MODES
        .iter()
        .find(|m| m.number == number)
        .ok_or(SimError::UnknownMode(number))
}

impl LegacyMode {
    /// Encode into `(VIDC byte address, value)` writes.
    ///
    /// `hicolour` drives the same VIDC timing through the extended palette
    /// path, which only exists for 8bpp modes.
    pub fn encode(&self, hicolour: bool) -> Result<Vec<(u32, u32)>, SimError> {
        if hicolour && self.bpp_field != 3 {
            return Err(SimError::HicolourDepth(self.number));
        }

        let offset = hdsr_offset(self.bpp_field);
        let horizontal = |register, value: u32| self.field(register, value, 2, 2);
        let display = |register, value: u32| self.field(register, value, offset, 2);
        let vertical = |register, value: u32| self.field(register, value, 1, 1);

        let h_disp_start = display("HDSR", self.hdsr)?;
        let h_disp_end = display("HDER", self.hder)?;
        let v_disp_start = vertical("VDSR", self.vdsr)?;
        let v_disp_end = vertical("VDER", self.vder)?;

        let control = (self.rate_field & regs::VIDC_CR_PIXEL_RATE_MASK)
            | ((self.bpp_field & regs::VIDC_CR_BPP_MASK) << regs::VIDC_CR_BPP_SHIFT);
        let special = if hicolour {
            regs::VIDC_SPECIAL_EXT_PALETTE
        } else {
            0
        };

        Ok(vec![
            (regs::VIDC_H_CYC, horizontal("HCR", self.hcr)?),
            (regs::VIDC_H_SYNC, horizontal("HSWR", self.hsw)?),
            (regs::VIDC_H_BORDER_START, h_disp_start),
            (regs::VIDC_H_DISP_START, h_disp_start),
            (regs::VIDC_H_DISP_END, h_disp_end),
            (regs::VIDC_H_BORDER_END, h_disp_end),
            (regs::VIDC_V_CYC, vertical("VCR", self.vcr)?),
            (regs::VIDC_V_SYNC, vertical("VSWR", self.vsw)?),
            (regs::VIDC_V_BORDER_START, v_disp_start),
            (regs::VIDC_V_DISP_START, v_disp_start),
            (regs::VIDC_V_DISP_END, v_disp_end),
            (regs::VIDC_V_BORDER_END, v_disp_end),
            (regs::VIDC_CONTROL, control),
            (regs::VIDC_SPECIAL, special),
        ])
    }

    /// Invert `raw * scale + bias` into a shadow word.
    fn field(
        &self,
        register: &'static str,
        value: u32,
        bias: u32,
        scale: u32,
    ) -> Result<u32, SimError> {
        let unencodable = || SimError::Unencodable {
            mode: self.number,
            register,
            value,
        };
        let biased = value.checked_sub(bias).ok_or_else(unencodable)?;
        if biased % scale != 0 || biased / scale > regs::TIMING_FIELD_MASK {
            return Err(unencodable());
        }
        Ok((biased / scale) << regs::TIMING_FIELD_SHIFT)
    }
}
