//! Single-key operator commands over the debug UART.

use arcdvi_core::presets::HICOLOUR_MODE_NUMBER;
use arcdvi_hal::{Command, CommandSource};
use rp235x_hal as hal;

type UartPins = (
    hal::gpio::Pin<hal::gpio::bank0::Gpio24, hal::gpio::FunctionUart, hal::gpio::PullDown>,
    hal::gpio::Pin<hal::gpio::bank0::Gpio25, hal::gpio::FunctionUart, hal::gpio::PullDown>,
);

pub type Uart = hal::uart::UartPeripheral<hal::uart::Enabled, hal::pac::UART1, UartPins>;

/// Map a key to a command.
fn map_key(key: u8) -> Option<Command> {
    let cmd = match key {
        b'p' => Command::Probe { force: false },
        b'P' => Command::Probe { force: true },
        b'a' => Command::ToggleAutoprobe,
        b't' => Command::DumpTiming,
        b'i' => Command::DumpInput,
        b's' => Command::Sync,
        // Presets: VGA, 640x512, line doubled, pixel doubled, hicolour, hires.
        b'1' => Command::SetMode(28),
        b'2' => Command::SetMode(21),
        b'3' => Command::SetMode(15),
        b'4' => Command::SetMode(13),
        b'5' => Command::SetMode(HICOLOUR_MODE_NUMBER),
        b'6' => Command::SetMode(23),
        _ => return None,
    };
    Some(cmd)
}

/// Commands read from UART1 without blocking.
pub struct UartCommands {
    uart: Uart,
}

impl UartCommands {
    pub fn new(uart: Uart) -> Self {
        Self { uart }
    }
}

impl CommandSource for UartCommands {
    fn init(&mut self) {
        self.uart
            .write_full_blocking(b"ArcDVI: p/P probe, a autoprobe, t/i dump, s sync, 1-6 presets\r\n");
    }

    fn poll(&mut self) -> Option<Command> {
        if !self.uart.uart_is_readable() {
            return None;
        }
        let mut key = [0u8; 1];
        match self.uart.read_raw(&mut key) {
            Ok(n) if n > 0 => {
                let cmd = map_key(key[0]);
                if cmd.is_none() {
                    defmt::debug!("Unmapped key {=u8:x}", key[0]);
                }
                cmd
            }
            _ => None,
        }
    }
}
