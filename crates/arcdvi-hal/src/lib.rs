#![no_std]

/// Word-wide access to the FPGA register file.
///
/// The FPGA exposes three regions (input shadow, output timing, board
/// control) in one 32-bit word address space. Accesses are synchronous and
/// uncached: every read returns live hardware state.
pub trait RegisterBus {
    /// Read a 32-bit register.
    fn read32(&mut self, addr: u32) -> u32;

    /// Write a 32-bit register.
    fn write32(&mut self, addr: u32, data: u32);
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    fn read32(&mut self, addr: u32) -> u32 {
        (**self).read32(addr)
    }

    fn write32(&mut self, addr: u32, data: u32) {
        (**self).write32(addr, data)
    }
}

/// Abstracts the operator command channel across platforms.
pub trait CommandSource {
    /// Initialize the command channel.
    fn init(&mut self);

    /// Poll for a command. Non-blocking.
    fn poll(&mut self) -> Option<Command>;
}

/// Platform-agnostic operator commands.
///
/// Uses a raw `u8` legacy mode number rather than the preset type from
/// arcdvi-core to avoid a circular dependency (core depends on hal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Probe the input timing now. `force` reprograms even if unchanged.
    Probe { force: bool },
    /// Program a fixed preset, selected by legacy mode number.
    SetMode(u8),
    /// Log the currently programmed output timing registers.
    DumpTiming,
    /// Log the input shadow registers.
    DumpInput,
    /// Manually program horizontal output timing.
    SetXTiming {
        xres: u32,
        front_porch: u32,
        sync_width: u32,
        back_porch: u32,
        words_per_line_m1: u32,
    },
    /// Manually program vertical output timing.
    SetYTiming {
        yres: u32,
        front_porch: u32,
        sync_width: u32,
        back_porch: u32,
    },
    /// Set the cursor/display X offset.
    SetCursorX(u32),
    /// Run the output sync handshake.
    Sync,
    /// Toggle automatic probing on input reconfiguration.
    ToggleAutoprobe,
}
