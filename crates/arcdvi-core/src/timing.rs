//! Video timing value types shared by the decoder, the probe engine and the
//! presets.

use core::fmt;

use crate::regs;

/// Input pixel clock rates selected by the VIDC control register, in MHz.
pub const PIXEL_RATES_MHZ: [u32; 4] = [8, 12, 16, 24];

/// Reference clock feeding the output PLL, in MHz.
pub const OUTPUT_BASE_CLOCK_MHZ: u32 = 24;

/// Synthetic bpp class for the 16bpp extended-palette path.
pub const BPP_CLASS_16: u8 = 4;

/// The output cursor offset trails the input display start by this many pixels.
pub const CURSOR_OFFSET_BIAS: u32 = 6;

/// Pixels carried by one 32-bit DMA word at the given bpp class, 0 for
/// classes deeper than 32bpp.
pub const fn pixels_per_word(bpp_class: u8) -> u32 {
    match 32u32.checked_shr(bpp_class as u32) {
        Some(pixels) => pixels,
        None => 0,
    }
}

/// A semantic description of one video timing.
///
/// Totals are derived from the resolution and porches, never stored. Used
/// both for the observed input timing and for the target output timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingDescriptor {
    pub xres: u32,
    pub yres: u32,
    /// 0..=3 for 1/2/4/8bpp, [`BPP_CLASS_16`] for the synthetic 16bpp mode.
    pub bpp_class: u8,
    pub pixel_rate_mhz: u32,
    pub h_front_porch: u32,
    pub h_sync_width: u32,
    pub h_back_porch: u32,
    pub v_front_porch: u32,
    pub v_sync_width: u32,
    pub v_back_porch: u32,
    pub extended_palette: bool,
}

impl TimingDescriptor {
    /// Line length in pixel clocks, including blanking.
    pub fn total_width(&self) -> u32 {
        self.xres
            .wrapping_add(self.h_front_porch)
            .wrapping_add(self.h_sync_width)
            .wrapping_add(self.h_back_porch)
    }

    /// Frame length in lines, including blanking.
    pub fn total_height(&self) -> u32 {
        self.yres
            .wrapping_add(self.v_front_porch)
            .wrapping_add(self.v_sync_width)
            .wrapping_add(self.v_back_porch)
    }

    /// Pixel clocks from the start of sync to the first displayed pixel.
    pub fn display_start(&self) -> u32 {
        self.h_sync_width.wrapping_add(self.h_back_porch)
    }

    pub fn bits_per_pixel(&self) -> u32 {
        1 << (self.bpp_class & 0x7)
    }

    /// DMA words per raster line, minus one.
    pub fn words_per_line_m1(&self) -> u32 {
        self.xres
            .checked_div(pixels_per_word(self.bpp_class))
            .unwrap_or(0)
            .saturating_sub(1)
    }

    /// Approximate frame rate, 0 for degenerate timings.
    pub fn frame_rate_hz(&self) -> u32 {
        let area = u64::from(self.total_width()) * u64::from(self.total_height());
        if area == 0 {
            return 0;
        }
        (u64::from(self.pixel_rate_mhz) * 1_000_000 / area) as u32
    }

    /// The fields that identify a mode for change detection.
    pub fn mode_key(&self) -> ModeKey {
        ModeKey {
            xres: self.xres,
            yres: self.yres,
            h_front_porch: self.h_front_porch,
            h_sync_width: self.h_sync_width,
            h_back_porch: self.h_back_porch,
            v_front_porch: self.v_front_porch,
            v_sync_width: self.v_sync_width,
            v_back_porch: self.v_back_porch,
            words_per_line_m1: self.words_per_line_m1(),
            extended_palette: self.extended_palette,
        }
    }
}

impl fmt::Display for TimingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}, {}bpp: hfp {}, hsw {}, hbp {} ({} total); \
             vfp {}, vsw {}, vbp {} ({} total, frame {}Hz pclk {}MHz)",
            self.xres,
            self.yres,
            self.bits_per_pixel(),
            self.h_front_porch,
            self.h_sync_width,
            self.h_back_porch,
            self.total_width(),
            self.v_front_porch,
            self.v_sync_width,
            self.v_back_porch,
            self.total_height(),
            self.frame_rate_hz(),
            self.pixel_rate_mhz,
        )
    }
}

/// Resolution, porches, words-per-line and palette mode of an observed timing.
///
/// Two observations with equal keys need no output reprogramming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeKey {
    pub xres: u32,
    pub yres: u32,
    pub h_front_porch: u32,
    pub h_sync_width: u32,
    pub h_back_porch: u32,
    pub v_front_porch: u32,
    pub v_sync_width: u32,
    pub v_back_porch: u32,
    pub words_per_line_m1: u32,
    pub extended_palette: bool,
}

/// Output pixel clock multiplier relative to [`OUTPUT_BASE_CLOCK_MHZ`].
///
/// Discriminants are the multiplier in tenths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MultiplierClass {
    /// x0.375, nominally "0.38".
    X0_38 = 4,
    X0_5 = 5,
    X1 = 10,
    X1_5 = 15,
    X2 = 20,
    X4 = 40,
}

impl MultiplierClass {
    pub const ALL: [MultiplierClass; 6] = [
        MultiplierClass::X0_38,
        MultiplierClass::X0_5,
        MultiplierClass::X1,
        MultiplierClass::X1_5,
        MultiplierClass::X2,
        MultiplierClass::X4,
    ];

    /// Look up a class by its value in tenths. Only the six supported values map.
    pub fn from_tenths(tenths: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.tenths() == tenths)
    }

    pub fn tenths(self) -> u32 {
        self as u32
    }

    /// Resulting output pixel clock, truncated to whole MHz.
    pub fn output_clock_mhz(self) -> u32 {
        OUTPUT_BASE_CLOCK_MHZ * self.tenths() / 10
    }
}

impl fmt::Display for MultiplierClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.tenths();
        write!(f, "x{}.{}", t / 10, t % 10)
    }
}

/// A complete output configuration: the target timing plus the DMA and
/// control-path settings that go with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputMode {
    pub timing: TimingDescriptor,
    pub words_per_line_m1: u32,
    /// Cursor / display X offset, CTRL[10:0].
    pub cursor_offset: u32,
    pub hires: bool,
    pub double_x: bool,
    pub double_y: bool,
    pub multiplier: MultiplierClass,
}

impl OutputMode {
    /// Output the observed timing unchanged at the base clock.
    pub fn passthrough(observed: &TimingDescriptor) -> Self {
        Self {
            timing: *observed,
            words_per_line_m1: observed.words_per_line_m1(),
            cursor_offset: observed.display_start().saturating_sub(CURSOR_OFFSET_BIAS),
            hires: false,
            double_x: false,
            double_y: false,
            multiplier: MultiplierClass::X1,
        }
    }

    pub fn res_x_word(&self) -> u32 {
        self.timing.xres | if self.double_x { regs::VIDO_RES_DOUBLE } else { 0 }
    }

    pub fn res_y_word(&self) -> u32 {
        self.timing.yres | if self.double_y { regs::VIDO_RES_DOUBLE } else { 0 }
    }

    /// Compose the output CTRL register value.
    pub fn control_word(&self) -> u32 {
        let mut word = self.cursor_offset & regs::VIDO_CTRL_CURSOR_MASK;
        word |= (u32::from(self.timing.bpp_class) & regs::VIDO_CTRL_BPP_MASK)
            << regs::VIDO_CTRL_BPP_SHIFT;
        if self.timing.extended_palette {
            word |= regs::VIDO_CTRL_EXT_PALETTE;
        }
        if self.hires {
            word |= regs::VIDO_CTRL_HIRES;
        }
        word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vga() -> TimingDescriptor {
        TimingDescriptor {
            xres: 640,
            yres: 480,
            bpp_class: 3,
            pixel_rate_mhz: 24,
            h_front_porch: 34,
            h_sync_width: 96,
            h_back_porch: 30,
            v_front_porch: 11,
            v_sync_width: 1,
            v_back_porch: 33,
            extended_palette: false,
        }
    }

    #[test]
    fn totals_are_derived() {
        let t = vga();
        assert_eq!(t.total_width(), 800);
        assert_eq!(t.total_height(), 525);
        assert_eq!(t.frame_rate_hz(), 57);
    }

    #[test]
    fn words_per_line_follows_depth() {
        let mut t = vga();
        assert_eq!(t.words_per_line_m1(), 159);
        t.bpp_class = 0;
        assert_eq!(t.words_per_line_m1(), 19);
        t.bpp_class = BPP_CLASS_16;
        assert_eq!(t.words_per_line_m1(), 319);
        t.xres = 0;
        assert_eq!(t.words_per_line_m1(), 0);
    }

    #[test]
    fn out_of_range_depth_has_no_words() {
        let mut t = vga();
        for bpp_class in [6, 7, 31, 32, 0xff] {
            t.bpp_class = bpp_class;
            assert_eq!(t.words_per_line_m1(), 0, "bpp class {bpp_class}");
        }
        assert_eq!(pixels_per_word(5), 1);
        assert_eq!(pixels_per_word(6), 0);
    }

    #[test]
    fn multiplier_rejects_unlisted_tenths() {
        assert_eq!(MultiplierClass::from_tenths(15), Some(MultiplierClass::X1_5));
        assert_eq!(MultiplierClass::from_tenths(4), Some(MultiplierClass::X0_38));
        assert_eq!(MultiplierClass::from_tenths(7), None);
        assert_eq!(MultiplierClass::from_tenths(0), None);
    }

    #[test]
    fn control_word_packs_fields() {
        let mut mode = OutputMode::passthrough(&vga());
        assert_eq!(mode.cursor_offset, 120);
        assert_eq!(mode.control_word(), 120 | (3 << 28));
        mode.hires = true;
        mode.timing.extended_palette = true;
        assert_eq!(mode.control_word(), 120 | (3 << 28) | (1 << 27) | (1 << 31));
    }
}
