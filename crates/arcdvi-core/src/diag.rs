//! Read-only register snapshots for diagnostics.

use core::fmt;

use arcdvi_hal::RegisterBus;

use crate::regs::{self, timing_field};

/// The output timing registers as currently programmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingSnapshot {
    pub res_x: u32,
    pub hs_fp: u32,
    pub hs_width: u32,
    pub hs_bp: u32,
    pub wplm1: u32,
    pub res_y: u32,
    pub vs_fp: u32,
    pub vs_width: u32,
    pub vs_bp: u32,
    pub ctrl: u32,
}

impl TimingSnapshot {
    pub fn read<B: RegisterBus>(bus: &mut B) -> Self {
        let mut vo = |index| bus.read32(regs::vo(index));
        Self {
            res_x: vo(regs::VIDO_REG_RES_X),
            hs_fp: vo(regs::VIDO_REG_HS_FP),
            hs_width: vo(regs::VIDO_REG_HS_WIDTH),
            hs_bp: vo(regs::VIDO_REG_HS_BP),
            wplm1: vo(regs::VIDO_REG_WPLM1),
            res_y: vo(regs::VIDO_REG_RES_Y),
            vs_fp: vo(regs::VIDO_REG_VS_FP),
            vs_width: vo(regs::VIDO_REG_VS_WIDTH),
            vs_bp: vo(regs::VIDO_REG_VS_BP),
            ctrl: vo(regs::VIDO_REG_CTRL),
        }
    }

    pub fn cursor_offset(&self) -> u32 {
        self.ctrl & regs::VIDO_CTRL_CURSOR_MASK
    }

    pub fn bits_per_pixel(&self) -> u32 {
        1 << ((self.ctrl >> regs::VIDO_CTRL_BPP_SHIFT) & regs::VIDO_CTRL_BPP_MASK)
    }

    pub fn hires(&self) -> bool {
        self.ctrl & regs::VIDO_CTRL_HIRES != 0
    }
}

impl fmt::Display for TimingSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Video timing regs:")?;
        writeln!(
            f,
            " X width 0x{:x}, front porch 0x{:x}, width 0x{:x}, back porch 0x{:x}, \
             DMA words per line-1 0x{:x}",
            self.res_x, self.hs_fp, self.hs_width, self.hs_bp, self.wplm1
        )?;
        writeln!(
            f,
            " Y height 0x{:x}, front porch 0x{:x}, width 0x{:x}, back porch 0x{:x}",
            self.res_y, self.vs_fp, self.vs_width, self.vs_bp
        )?;
        write!(
            f,
            " Cursor X offset 0x{:x}, BPP {}, hires {}",
            self.cursor_offset(),
            self.bits_per_pixel(),
            u8::from(self.hires())
        )
    }
}

/// Start/end pair of a 10-bit VIDC timing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

/// The whole input shadow region, decoded field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputSnapshot {
    pub palette: [u32; 16],
    pub border_colour: u32,
    pub h_border: Span,
    pub v_border: Span,
    pub cursor_palette: [u32; 3],
    /// Horizontal cursor start, bits [23:13].
    pub h_cursor_start: u32,
    /// Sub-pixel cursor start extension, bits [12:11].
    pub h_cursor_ext: u32,
    pub v_cursor: Span,
    pub h_cycle: u32,
    pub h_sync: u32,
    pub h_display: Span,
    pub h_interlace: u32,
    pub v_cycle: u32,
    pub v_sync: u32,
    pub v_display: Span,
    pub control: u32,
    pub sound_freq: u32,
    pub stereo: [u32; 8],
    pub video_dmas: u32,
    pub cursor_dmas: u32,
    pub special: u32,
    pub special_data: u32,
}

impl InputSnapshot {
    pub fn read<B: RegisterBus>(bus: &mut B) -> Self {
        let mut reg = |byte_addr| bus.read32(regs::vidc(byte_addr));
        let mut snap = Self::default();

        for (i, entry) in snap.palette.iter_mut().enumerate() {
            *entry = reg(regs::VIDC_PAL_0 + 4 * i as u32);
        }
        snap.border_colour = reg(regs::VIDC_BORDERCOL);
        snap.h_border = Span {
            start: timing_field(reg(regs::VIDC_H_BORDER_START)),
            end: timing_field(reg(regs::VIDC_H_BORDER_END)),
        };
        snap.v_border = Span {
            start: timing_field(reg(regs::VIDC_V_BORDER_START)),
            end: timing_field(reg(regs::VIDC_V_BORDER_END)),
        };
        snap.cursor_palette = [
            reg(regs::VIDC_CURSORPAL1),
            reg(regs::VIDC_CURSORPAL2),
            reg(regs::VIDC_CURSORPAL3),
        ];
        let h_cursor = reg(regs::VIDC_H_CURSOR_START);
        snap.h_cursor_start = (h_cursor >> 13) & 0x7FF;
        snap.h_cursor_ext = (h_cursor >> 11) & 0x3;
        snap.v_cursor = Span {
            start: timing_field(reg(regs::VIDC_V_CURSOR_START)),
            end: timing_field(reg(regs::VIDC_V_CURSOR_END)),
        };
        snap.h_cycle = timing_field(reg(regs::VIDC_H_CYC));
        snap.h_sync = timing_field(reg(regs::VIDC_H_SYNC));
        snap.h_display = Span {
            start: timing_field(reg(regs::VIDC_H_DISP_START)),
            end: timing_field(reg(regs::VIDC_H_DISP_END)),
        };
        snap.h_interlace = timing_field(reg(regs::VIDC_H_INTERLACE));
        snap.v_cycle = timing_field(reg(regs::VIDC_V_CYC));
        snap.v_sync = timing_field(reg(regs::VIDC_V_SYNC));
        snap.v_display = Span {
            start: timing_field(reg(regs::VIDC_V_DISP_START)),
            end: timing_field(reg(regs::VIDC_V_DISP_END)),
        };
        snap.control = reg(regs::VIDC_CONTROL);
        snap.sound_freq = reg(regs::VIDC_SOUND_FREQ) & 0xFF;
        for (i, entry) in snap.stereo.iter_mut().enumerate() {
            *entry = reg(regs::VIDC_STEREO0 + 4 * i as u32) & 0xF;
        }
        snap.video_dmas = reg(regs::V_DMAC_VIDEO);
        snap.cursor_dmas = reg(regs::V_DMAC_CURSOR);
        snap.special = reg(regs::VIDC_SPECIAL);
        snap.special_data = reg(regs::VIDC_SPECIAL_DATA);
        snap
    }

    fn test_mode_name(&self) -> &'static str {
        const MODES: [&str; 4] = ["Normal", "TM0", "TM1", "TM2"];
        MODES[((self.control >> regs::VIDC_CR_TEST_MODE_SHIFT) & 3) as usize]
    }
}

impl fmt::Display for InputSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Palette:\t\t")?;
        for entry in &self.palette {
            write!(f, "{:03x} ", entry)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Border:\t\t\tColour {:03x}, Hs {}, He {}, Vs {}, Ve {}",
            self.border_colour,
            self.h_border.start,
            self.h_border.end,
            self.v_border.start,
            self.v_border.end
        )?;
        writeln!(
            f,
            "Pointer:\t\tColours {:03x}/{:03x}/{:03x}, Hs {} (ext {}), Vs {}, Ve {}",
            self.cursor_palette[0],
            self.cursor_palette[1],
            self.cursor_palette[2],
            self.h_cursor_start,
            self.h_cursor_ext,
            self.v_cursor.start,
            self.v_cursor.end
        )?;
        writeln!(
            f,
            "Display Horizontal:\tCycle {}, Sync {}, Dst {}, Dend {}, Ilace {}",
            self.h_cycle, self.h_sync, self.h_display.start, self.h_display.end, self.h_interlace
        )?;
        writeln!(
            f,
            "Display Vertical:\tCycle {}, Sync {}, Dst {}, Dend {}",
            self.v_cycle, self.v_sync, self.v_display.start, self.v_display.end
        )?;
        let ctrl = self.control;
        writeln!(
            f,
            "Display control:\t{}{}, {}Sync, Interlace {}, DMARq {:1x}, BPP {}, PixClk {}",
            self.test_mode_name(),
            if ctrl & regs::VIDC_CR_TM3 != 0 { ", TM3" } else { "" },
            if ctrl & regs::VIDC_CR_COMPOSITE_SYNC != 0 { "Composite" } else { "V" },
            if ctrl & regs::VIDC_CR_INTERLACE != 0 { "on" } else { "off" },
            (ctrl >> regs::VIDC_CR_DMA_SHIFT) & 3,
            1 << ((ctrl >> regs::VIDC_CR_BPP_SHIFT) & regs::VIDC_CR_BPP_MASK),
            ctrl & regs::VIDC_CR_PIXEL_RATE_MASK
        )?;
        write!(f, "Sound:\t\t\tFreq {}, stereo", self.sound_freq)?;
        for s in &self.stereo {
            write!(f, " {:1x}", s)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Video DMAs/frame:\t{}\nCursor DMAs/frame:\t{}",
            self.video_dmas, self.cursor_dmas
        )?;
        write!(f, "Special:\t\t{:08x} d {:08x}", self.special, self.special_data)
    }
}
