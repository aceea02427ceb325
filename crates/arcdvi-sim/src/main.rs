use std::process;

use arcdvi_core::engine::{classify, synthesize};
use arcdvi_core::{decoder, Bridge, Preset, ProbeEngine, ProbeOutcome};
use arcdvi_hal::Command;
use arcdvi_sim::{modes, SimError, SimFpga, StdDelay};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "arcdvi-sim")]
#[command(about = "Run the ArcDVI probe engine against a simulated bridge FPGA", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// The FPGA never acknowledges sync requests
    #[arg(long, global = true)]
    no_ack: bool,

    /// The output PLL never reports lock
    #[arg(long, global = true)]
    no_lock: bool,

    /// Suppress log output (only show results and errors)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a legacy mode, probe it and show the programmed output
    Probe {
        #[command(flatten)]
        source: Source,

        /// Reprogram even if the mode is unchanged
        #[arg(short, long)]
        force: bool,
    },
    /// Program a fixed preset output mode
    Preset {
        /// Legacy mode number (decimal, or 0x-prefixed hex)
        #[arg(value_parser = parse_mode_number)]
        mode: u8,
    },
    /// List the simulated legacy modes and how each would be output
    Modes,
    /// Load a legacy mode and show the input shadow registers
    Dump {
        #[command(flatten)]
        source: Source,
    },
}

#[derive(Args)]
struct Source {
    /// Legacy mode number to load
    #[arg(short, long, default_value_t = 12)]
    mode: u8,

    /// Drive the mode through the extended palette (16bpp) path
    #[arg(long)]
    hicolour: bool,
}

fn parse_mode_number(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("{}: {}", s, e))
}

type SimBridge = Bridge<SimFpga, StdDelay>;

fn make_bridge(cli: &Cli) -> SimBridge {
    let fpga = SimFpga::new().with_faults(cli.no_ack, cli.no_lock);
    let mut engine = ProbeEngine::new(fpga, StdDelay);
    engine.init();
    Bridge::new(engine)
}

fn load(bridge: &mut SimBridge, source: &Source) -> Result<(), SimError> {
    let mode = modes::find(source.mode)?;
    let writes = mode.encode(source.hicolour)?;
    bridge.engine_mut().bus_mut().host_write(&writes);
    Ok(())
}

fn run_probe(bridge: &mut SimBridge, source: &Source, force: bool) -> Result<(), SimError> {
    load(bridge, source)?;

    let engine = bridge.engine_mut();
    let outcome = if force {
        Some(engine.probe(true))
    } else {
        engine.poll_reconfig()
    };
    match outcome {
        Some(ProbeOutcome::Reprogrammed {
            classification,
            mode,
        }) => println!(
            "{:?}: {} ({}, {} MHz)",
            classification,
            mode.timing,
            mode.multiplier,
            mode.multiplier.output_clock_mhz()
        ),
        Some(ProbeOutcome::Unchanged) => println!("Mode unchanged"),
        None => println!("No reconfiguration event"),
    }

    println!("{}", engine.dump_timing());
    if let Some(word) = engine.bus_mut().pll_word() {
        println!("PLL word {:08x}", word.raw());
    }
    Ok(())
}

fn run_preset(bridge: &mut SimBridge, number: u8) -> Result<(), SimError> {
    let preset = Preset::from_mode_number(number).ok_or(SimError::UnknownPreset(number))?;
    bridge.execute(Command::SetMode(number));

    let mode = preset.output_mode();
    println!("{:?}: {} ({})", preset, mode.timing, mode.multiplier);
    println!("{}", bridge.engine_mut().dump_timing());
    Ok(())
}

fn run_modes() -> Result<(), SimError> {
    for legacy in &modes::LEGACY_MODES {
        let mut fpga = SimFpga::new();
        fpga.host_write(&legacy.encode(false)?);
        let observed = decoder::decode(&mut fpga);
        let classification = classify(&observed);
        let output = synthesize(&observed, classification);
        println!(
            "{:3} {:14} {}x{} {}bpp {}MHz -> {:?} {}x{} {}",
            legacy.number,
            legacy.name,
            observed.xres,
            observed.yres,
            observed.bits_per_pixel(),
            observed.pixel_rate_mhz,
            classification,
            output.timing.xres,
            output.timing.yres,
            output.multiplier
        );
    }
    Ok(())
}

fn run_dump(bridge: &mut SimBridge, source: &Source) -> Result<(), SimError> {
    load(bridge, source)?;
    println!("{}", bridge.engine_mut().dump_input());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let mut bridge = make_bridge(&cli);
    let result = match &cli.command {
        Commands::Probe { source, force } => run_probe(&mut bridge, source, *force),
        Commands::Preset { mode } => run_preset(&mut bridge, *mode),
        Commands::Modes => run_modes(),
        Commands::Dump { source } => run_dump(&mut bridge, source),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
