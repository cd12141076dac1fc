//! Command-line host for the zeal Z80 core.
//!
//! Runs either a raw binary image (until HALT or a cycle budget) or a CP/M
//! `.COM` program such as ZEXDOC/ZEXALL with console output on stdout.

mod cpm;
mod error;
mod logger;
mod profile;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::LevelFilter;
use zeal_core::prelude::*;

use crate::error::RunnerError;
use crate::profile::Profile;

/// T-states handed to the engine per call in raw mode.
const RAW_SLICE: u64 = 1_000_000;

#[derive(Debug, Parser)]
#[command(name = "zeal", version, about = "Run Z80 programs")]
struct Args {
    /// Binary image to load
    image: PathBuf,

    /// Treat the image as a CP/M .COM program
    #[arg(long)]
    cpm: bool,

    /// Load address for raw images
    #[arg(long, value_parser = parse_u16)]
    load: Option<u16>,

    /// Initial PC (defaults to the load address)
    #[arg(long, value_parser = parse_u16)]
    entry: Option<u16>,

    /// Initial SP
    #[arg(long, value_parser = parse_u16)]
    stack: Option<u16>,

    /// Stop after this many T-states
    #[arg(long)]
    max_cycles: Option<u64>,

    /// TOML machine profile
    #[arg(long)]
    profile: Option<PathBuf>,

    /// error, warn, info, debug or trace
    #[arg(long)]
    log_level: Option<String>,

    /// Log every step at trace level
    #[arg(long)]
    trace: bool,

    /// Write the final CPU state as TOML ("-" for stdout)
    #[arg(long)]
    dump_state: Option<PathBuf>,
}

/// Accepts `0x1234`, `1234h` or decimal.
fn parse_u16(s: &str) -> Result<u16, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16)
    } else if let Some(hex) = s.strip_suffix(['h', 'H']) {
        u16::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|e| format!("'{s}': {e}"))
}

/// Command line merged over the profile.
#[derive(Debug)]
struct Settings {
    cpm: bool,
    load_address: u16,
    entry: Option<u16>,
    stack: Option<u16>,
    interrupt_mode: Option<u8>,
    interrupts: bool,
    max_cycles: u64,
    log_level: LevelFilter,
    trace: bool,
}

impl Settings {
    fn resolve(args: &Args, profile: Profile) -> Result<Self, RunnerError> {
        let level = args.log_level.clone().or(profile.log_level).unwrap_or_else(|| "warn".into());
        let log_level = level.parse().map_err(|_| RunnerError::InvalidLogLevel(level))?;
        Ok(Self {
            cpm: args.cpm || profile.cpm,
            load_address: args.load.or(profile.load_address).unwrap_or(0),
            entry: args.entry.or(profile.entry),
            stack: args.stack.or(profile.stack),
            interrupt_mode: profile.interrupt_mode,
            interrupts: profile.interrupts.unwrap_or(false),
            max_cycles: args.max_cycles.or(profile.max_cycles).unwrap_or(u64::MAX),
            log_level,
            trace: args.trace || profile.trace,
        })
    }

    fn engine_config(&self) -> EngineConfig {
        let config = EngineConfig::new().with_interrupts(self.interrupts);
        if self.trace {
            config.with_tracer(LogTracer)
        } else {
            config
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, RunnerError> {
    std::fs::read(path).map_err(|source| RunnerError::Io { path: path.to_owned(), source })
}

fn raw_image(image: &[u8], load_address: u16) -> Result<Vec<u8>, RunnerError> {
    let start = load_address as usize;
    if image.len() > 0x10000 - start {
        return Err(RunnerError::ImageTooLarge { len: image.len(), load_address });
    }
    let mut memory = vec![0u8; 0x10000];
    memory[start..start + image.len()].copy_from_slice(image);
    Ok(memory)
}

fn run_raw(engine: &Engine<Vec<u8>>, max_cycles: u64) -> Result<(), RunnerError> {
    while !engine.halted() {
        let spent = engine.cycles();
        if spent >= max_cycles {
            log::warn!("cycle limit reached at PC={:04X}", engine.state().regs.pc);
            return Ok(());
        }
        engine.run(RAW_SLICE.min(max_cycles - spent))?;
    }
    log::info!("halted at PC={:04X}", engine.state().regs.pc);
    Ok(())
}

fn dump_state(state: &Z80State, path: &Path) -> Result<(), RunnerError> {
    let text = toml::to_string(state).map_err(RunnerError::DumpState)?;
    if path == Path::new("-") {
        print!("{text}");
        Ok(())
    } else {
        std::fs::write(path, text).map_err(|source| RunnerError::Io { path: path.to_owned(), source })
    }
}

fn run(args: Args) -> Result<(), RunnerError> {
    let profile = match &args.profile {
        Some(path) => Profile::load(path)?,
        None => Profile::default(),
    };
    let settings = Settings::resolve(&args, profile)?;
    logger::init(settings.log_level);
    log::debug!("{settings:?}");

    let image = read_file(&args.image)?;
    let started = Instant::now();

    let engine = if settings.cpm {
        let trap = cpm::BdosTrap::default();
        let config = settings
            .engine_config()
            .with_hook(trap.hook())
            .with_reset_overrides(cpm::reset_overrides());
        let engine = Engine::new(cpm::memory_image(&image)?, config)?;
        let exit = cpm::run(&engine, &trap, settings.max_cycles, &mut std::io::stdout())?;
        log::info!("CP/M program finished: {exit:?}");
        engine
    } else {
        let overrides = ResetOverrides {
            pc: Some(settings.entry.unwrap_or(settings.load_address)),
            sp: settings.stack,
            interrupt_mode: settings.interrupt_mode,
            ..ResetOverrides::default()
        };
        let config = settings.engine_config().with_reset_overrides(overrides);
        let engine = Engine::new(raw_image(&image, settings.load_address)?, config)?;
        run_raw(&engine, settings.max_cycles)?;
        engine
    };

    let elapsed = started.elapsed().as_secs_f64();
    let cycles = engine.cycles();
    log::info!(
        "{cycles} T-states in {elapsed:.2}s ({:.1} MHz effective)",
        cycles as f64 / elapsed.max(f64::EPSILON) / 1e6
    );

    if let Some(path) = &args.dump_state {
        dump_state(&engine.state(), path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("zeal: {e}");
            ExitCode::FAILURE
        }
    }
}
