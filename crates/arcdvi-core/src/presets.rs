//! Fixed output modes for manual bring-up and testing.
//!
//! These bypass probing entirely. Geometry is hand-tuned against a few
//! legacy screen modes and is only approximately right for some of them.

use crate::engine::HIRES_CURSOR_OFFSET;
use crate::timing::{
    pixels_per_word, MultiplierClass, OutputMode, TimingDescriptor, BPP_CLASS_16,
};

/// Colour depth of a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Bpp1,
    Bpp2,
    Bpp4,
    Bpp8,
    /// Extended palette path.
    Bpp16,
}

impl Depth {
    /// Palette depths in legacy mode order (1, 2, 4, 8bpp).
    const PALETTE: [Depth; 4] = [Depth::Bpp1, Depth::Bpp2, Depth::Bpp4, Depth::Bpp8];

    pub const fn bpp_class(self) -> u8 {
        match self {
            Depth::Bpp1 => 0,
            Depth::Bpp2 => 1,
            Depth::Bpp4 => 2,
            Depth::Bpp8 => 3,
            Depth::Bpp16 => BPP_CLASS_16,
        }
    }

    /// The n-th palette depth of a run of consecutive mode numbers.
    fn nth_palette(n: u8) -> Option<Self> {
        Self::PALETTE.get(usize::from(n)).copied()
    }
}

/// Named preset output modes, grouped by the legacy mode numbers they mimic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// 1152x896 mono hires (mode 23), on the x4 clock.
    Hires1152x896,
    /// 640x480 (modes 25..28), near-exact match at 24MHz.
    Vga640x480 { depth: Depth },
    /// 640x512 (modes 18..21) at 24MHz.
    Mode640x512 { depth: Depth },
    /// 640x256 line doubled to 640x512 (modes 0, 8, 12, 15).
    LineDoubled640x256 { depth: Depth },
    /// 320x256 pixel and line doubled to 640x512 (modes 4, 1, 9, 13; 0xcc is
    /// the 16bpp variant).
    PixelDoubled320x256 { depth: Depth },
}

/// Cursor offsets per preset family, derived from each mode's HDSR.
const VGA_CURSOR_OFFSET: u32 = 137;
const MODE_512_CURSOR_OFFSET: u32 = 0x52 * 2 + 5 - 6;
const LINE_DOUBLED_CURSOR_OFFSET: u32 = 0x6d * 2 + 5 - 6;
const PIXEL_DOUBLED_CURSOR_OFFSET: u32 = 0x68;

/// 16bpp variant of the pixel-doubled preset.
pub const HICOLOUR_MODE_NUMBER: u8 = 0xcc;

impl Preset {
    /// Look up a preset by legacy mode number.
    pub fn from_mode_number(mode: u8) -> Option<Self> {
        let preset = match mode {
            23 => Preset::Hires1152x896,
            25..=28 => Preset::Vga640x480 {
                depth: Depth::nth_palette(mode - 25)?,
            },
            18..=21 => Preset::Mode640x512 {
                depth: Depth::nth_palette(mode - 18)?,
            },
            0 => Preset::LineDoubled640x256 { depth: Depth::Bpp1 },
            8 => Preset::LineDoubled640x256 { depth: Depth::Bpp2 },
            12 => Preset::LineDoubled640x256 { depth: Depth::Bpp4 },
            15 => Preset::LineDoubled640x256 { depth: Depth::Bpp8 },
            4 => Preset::PixelDoubled320x256 { depth: Depth::Bpp1 },
            1 => Preset::PixelDoubled320x256 { depth: Depth::Bpp2 },
            9 => Preset::PixelDoubled320x256 { depth: Depth::Bpp4 },
            13 => Preset::PixelDoubled320x256 { depth: Depth::Bpp8 },
            HICOLOUR_MODE_NUMBER => Preset::PixelDoubled320x256 {
                depth: Depth::Bpp16,
            },
            _ => return None,
        };
        Some(preset)
    }

    /// The output configuration this preset programs.
    pub fn output_mode(&self) -> OutputMode {
        match *self {
            Preset::Hires1152x896 => OutputMode {
                timing: geometry(1152, (40, 20, 1274), 896, (4, 3, 950), 0, 96),
                words_per_line_m1: 36 - 1,
                cursor_offset: HIRES_CURSOR_OFFSET,
                hires: true,
                double_x: false,
                double_y: false,
                multiplier: MultiplierClass::X4,
            },
            Preset::Vga640x480 { depth } => OutputMode {
                timing: geometry(640, (34, 96, 800), 480, (11, 1, 525), depth.bpp_class(), 24),
                words_per_line_m1: words_m1(640, depth),
                cursor_offset: VGA_CURSOR_OFFSET,
                hires: false,
                double_x: false,
                double_y: false,
                multiplier: MultiplierClass::X1,
            },
            Preset::Mode640x512 { depth } => OutputMode {
                timing: geometry(640, (87, 56, 896), 512, (1, 3, 534), depth.bpp_class(), 24),
                words_per_line_m1: words_m1(640, depth),
                cursor_offset: MODE_512_CURSOR_OFFSET,
                hires: false,
                double_x: false,
                double_y: false,
                multiplier: MultiplierClass::X1,
            },
            // Half the input line period, with the 24MHz clock standing in
            // for the input's 16MHz: 768 wide, 2x312 lines tall.
            Preset::LineDoubled640x256 { depth } => OutputMode {
                timing: geometry(640, (40, 20, 768), 512, (40, 5, 624), depth.bpp_class(), 24),
                words_per_line_m1: words_m1(640, depth),
                cursor_offset: LINE_DOUBLED_CURSOR_OFFSET,
                hires: false,
                double_x: false,
                double_y: true,
                multiplier: MultiplierClass::X1,
            },
            Preset::PixelDoubled320x256 { depth } => OutputMode {
                timing: geometry(640, (40, 20, 768), 512, (40, 5, 624), depth.bpp_class(), 24),
                words_per_line_m1: words_m1(320, depth),
                cursor_offset: PIXEL_DOUBLED_CURSOR_OFFSET,
                hires: false,
                double_x: true,
                double_y: true,
                multiplier: MultiplierClass::X1,
            },
        }
    }
}

fn words_m1(xres: u32, depth: Depth) -> u32 {
    xres.checked_div(pixels_per_word(depth.bpp_class()))
        .unwrap_or(0)
        .saturating_sub(1)
}

/// Build a timing from resolution, (front porch, sync width, total) per axis.
fn geometry(
    xres: u32,
    (hfp, hsw, htotal): (u32, u32, u32),
    yres: u32,
    (vfp, vsw, vtotal): (u32, u32, u32),
    bpp_class: u8,
    pixel_rate_mhz: u32,
) -> TimingDescriptor {
    TimingDescriptor {
        xres,
        yres,
        bpp_class,
        pixel_rate_mhz,
        h_front_porch: hfp,
        h_sync_width: hsw,
        h_back_porch: htotal - xres - hfp - hsw,
        v_front_porch: vfp,
        v_sync_width: vsw,
        v_back_porch: vtotal - yres - vfp - vsw,
        extended_palette: bpp_class == BPP_CLASS_16,
    }
}
