//! SPI register transport to the bridge FPGA.
//!
//! Every access is one 7-byte frame with CS held low:
//!
//! ```text
//! [W|0000|a9|a8] [a7..a0] [turnaround] [d31..d24] [d23..d16] [d15..d8] [d7..d0]
//! ```
//!
//! W is 1 for writes. On reads the FPGA drives the data bytes.

use arcdvi_hal::RegisterBus;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus as _;
use rp235x_hal as hal;

const FRAME_LEN: usize = 7;
const CMD_WRITE: u8 = 0x80;
const ADDR_HI_MASK: u32 = 0x3;

/// Pin type aliases for the FPGA interface.
type SpiPins = (
    hal::gpio::Pin<hal::gpio::bank0::Gpio3, hal::gpio::FunctionSpi, hal::gpio::PullDown>,
    hal::gpio::Pin<hal::gpio::bank0::Gpio4, hal::gpio::FunctionSpi, hal::gpio::PullDown>,
    hal::gpio::Pin<hal::gpio::bank0::Gpio6, hal::gpio::FunctionSpi, hal::gpio::PullDown>,
);

pub type SpiBus = hal::spi::Spi<hal::spi::Enabled, hal::pac::SPI0, SpiPins, 8>;
pub type CsPin =
    hal::gpio::Pin<hal::gpio::bank0::Gpio5, hal::gpio::FunctionSioOutput, hal::gpio::PullDown>;

/// Register access to the FPGA over SPI0.
pub struct FpgaBus {
    spi: SpiBus,
    cs: CsPin,
}

impl FpgaBus {
    pub fn new(spi: SpiBus, cs: CsPin) -> Self {
        Self { spi, cs }
    }

    fn header(write: bool, addr: u32) -> [u8; 2] {
        let cmd = if write { CMD_WRITE } else { 0 };
        [cmd | ((addr >> 8) & ADDR_HI_MASK) as u8, addr as u8]
    }
}

impl RegisterBus for FpgaBus {
    fn read32(&mut self, addr: u32) -> u32 {
        let [cmd, lo] = Self::header(false, addr);
        let tx: [u8; FRAME_LEN] = [cmd, lo, 0, 0, 0, 0, 0];
        let mut rx = [0u8; FRAME_LEN];

        let _ = self.cs.set_low();
        if self.spi.transfer(&mut rx, &tx).is_err() {
            defmt::warn!("SPI read of {=u32:x} failed", addr);
        }
        let _ = self.cs.set_high();

        u32::from_be_bytes([rx[3], rx[4], rx[5], rx[6]])
    }

    fn write32(&mut self, addr: u32, data: u32) {
        let [cmd, lo] = Self::header(true, addr);
        let [d3, d2, d1, d0] = data.to_be_bytes();
        let buf: [u8; FRAME_LEN] = [cmd, lo, 0, d3, d2, d1, d0];

        let _ = self.cs.set_low();
        if self.spi.write(&buf).is_err() {
            defmt::warn!("SPI write of {=u32:x} failed", addr);
        }
        let _ = self.cs.set_high();
    }
}
