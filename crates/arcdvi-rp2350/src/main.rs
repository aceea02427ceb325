//! RP2350 firmware for the ArcDVI bridge MCU.
//!
//! Releases the FPGA from reset, brings up the output PLL, then loops
//! forever servicing UART commands and input reconfiguration events. The
//! first probe waits for one of those.

#![no_std]
#![no_main]

mod input;
mod logger;
mod transport;

use defmt_rtt as _;
use panic_probe as _;
use rp235x_hal as hal;

use embedded_hal::digital::OutputPin;
use fugit::RateExtU32;
use hal::clocks::Clock;
use hal::sio::Sio;

use arcdvi_core::{Bridge, ProbeEngine};
use arcdvi_hal::CommandSource;

use input::UartCommands;
use transport::FpgaBus;

/// Boot ROM image definition for Cortex-M33 secure mode.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: hal::block::ImageDef = hal::block::ImageDef::secure_exe();

/// External crystal frequency.
const XTAL_FREQ_HZ: u32 = 12_000_000;

/// MCU to FPGA register bus clock.
const FPGA_SPI_HZ: u32 = 10_000_000;

/// Debug UART baud rate.
const UART_BAUD: u32 = 115_200;

/// FPGA nRESET is held low this long before release.
const FPGA_RESET_MS: u32 = 1;

#[hal::entry]
fn main() -> ! {
    logger::init(log::LevelFilter::Info);
    defmt::info!("arcdvi-rp2350 starting");

    let mut pac = hal::pac::Peripherals::take().unwrap();
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);

    let clocks = hal::clocks::init_clocks_and_plls(
        XTAL_FREQ_HZ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .unwrap();

    let mut timer = hal::Timer::new_timer0(pac.TIMER0, &mut pac.RESETS, &clocks);
    let sio = Sio::new(pac.SIO);
    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    // --- FPGA reset ---
    let mut fpga_nreset = pins.gpio0.into_push_pull_output();
    fpga_nreset.set_low().unwrap();
    embedded_hal::delay::DelayNs::delay_ms(&mut timer, FPGA_RESET_MS);
    fpga_nreset.set_high().unwrap();

    // --- SPI0 register bus ---
    let spi_tx = pins.gpio3.into_function::<hal::gpio::FunctionSpi>();
    let spi_rx = pins.gpio4.into_function::<hal::gpio::FunctionSpi>();
    let spi_sclk = pins.gpio6.into_function::<hal::gpio::FunctionSpi>();

    let spi_bus = hal::spi::Spi::<_, _, _, 8>::new(pac.SPI0, (spi_tx, spi_rx, spi_sclk));
    let spi_bus = spi_bus.init(
        &mut pac.RESETS,
        clocks.peripheral_clock.freq(),
        FPGA_SPI_HZ.Hz(),
        embedded_hal::spi::MODE_0,
    );

    // Manual CS pin (GPIO5).
    let mut spi_cs = pins.gpio5.into_push_pull_output();
    spi_cs.set_high().unwrap();

    // --- UART1 operator console ---
    let uart_pins = (
        pins.gpio24.into_function::<hal::gpio::FunctionUart>(),
        pins.gpio25.into_function::<hal::gpio::FunctionUart>(),
    );
    let uart = hal::uart::UartPeripheral::new(pac.UART1, uart_pins, &mut pac.RESETS)
        .enable(
            hal::uart::UartConfig::new(
                UART_BAUD.Hz(),
                hal::uart::DataBits::Eight,
                None,
                hal::uart::StopBits::One,
            ),
            clocks.peripheral_clock.freq(),
        )
        .unwrap();

    let mut commands = UartCommands::new(uart);
    commands.init();

    // --- Bridge ---
    let mut engine = ProbeEngine::new(FpgaBus::new(spi_bus, spi_cs), timer);
    engine.init();
    let mut bridge = Bridge::new(engine);

    defmt::info!("Entering main loop");
    loop {
        bridge.service(commands.poll());
    }
}

/// Program metadata for `picotool info`.
#[link_section = ".bi_entries"]
#[used]
pub static PICOTOOL_ENTRIES: [hal::binary_info::EntryAddr; 5] = [
    hal::binary_info::rp_cargo_bin_name!(),
    hal::binary_info::rp_cargo_version!(),
    hal::binary_info::rp_program_description!(c"ArcDVI bridge MCU"),
    hal::binary_info::rp_cargo_homepage_url!(),
    hal::binary_info::rp_program_build_attribute!(),
];
