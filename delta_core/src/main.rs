//! # Delta Printer Core
//!
//! Runs the firmware core against the simulated HAL. Without `--config` the
//! built-in reference table (Teensy 3 delta) is used. Optional flags home
//! the towers, heat the hot end and trace a demo circle before the loop
//! runs for `--duration` simulated seconds or until Ctrl-C.

use clap::Parser;
use delta_common::hal::driver::Hal;
use delta_common::printer::homing::HomingPhase;
use delta_common::printer::motion::{CartesianMove, EnqueueResult};
use delta_core::config::{load_builtin, load_config};
use delta_core::event_loop::run_simulated;
use delta_core::Printer;
use delta_hal::SimHal;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Simulated seconds allowed for homing all towers.
const HOMING_TIMEOUT: f64 = 30.0;

/// Delta printer core, simulated run
#[derive(Parser, Debug)]
#[command(name = "delta_core")]
#[command(version)]
#[command(about = "Delta 3D printer firmware core on a simulated HAL")]
struct Args {
    /// Printer parameter table (TOML). Defaults to the built-in table.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Simulated run time in seconds after setup.
    #[arg(short, long, default_value_t = 10.0)]
    duration: f64,

    /// Home all towers before running.
    #[arg(long)]
    home: bool,

    /// Hot-end target temperature in °C.
    #[arg(long, value_name = "CELSIUS")]
    heat: Option<f64>,

    /// Trace a circle after homing (implies --home).
    #[arg(long)]
    demo: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("Delta core v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Delta core shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = match &args.config {
        Some(path) => load_config(path)?,
        None => load_builtin()?,
    };
    info!(
        source = ?loaded.source,
        machine = %loaded.printer.shared.machine_name,
        axes = loaded.printer.axes.len(),
        heaters = loaded.printer.heaters.len(),
        "Config OK"
    );

    let hal = SimHal::from_config(&loaded.printer);
    let mut printer = Printer::new(hal, loaded.printer)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    if let Some(target) = args.heat {
        let heater = printer
            .config()
            .heater_index("T")
            .ok_or("no hot-end heater named T")?;
        printer.set_heater_target(heater, target)?;
        info!(target, "Hot end heating");
    }

    if args.home || args.demo {
        home_towers(&mut printer)?;
    }

    if args.demo {
        trace_circle(&mut printer, &running)?;
    }

    let stats = run_simulated(&mut printer, args.duration, &running);
    let status = printer.query_safety_status();
    if status.is_emergency() {
        warn!(?status, "Stopped in emergency");
    }
    for (i, heater) in printer.config().heaters.iter().enumerate() {
        if let Some(state) = printer.heater_state(i) {
            info!(
                heater = %heater.name,
                temperature = ?state.temperature,
                duty = state.duty,
                stable = state.stable,
                "Heater"
            );
        }
    }
    info!(
        iterations = stats.iterations,
        timer_fires = stats.timer_fires,
        events = stats.events,
        committed = printer.planner().stats().committed,
        watchdog_kicks = printer.watchdog().kicks(),
        "Run complete"
    );
    Ok(())
}

/// Home every tower and wait for the result.
fn home_towers(printer: &mut Printer<SimHal>) -> Result<(), Box<dyn std::error::Error>> {
    let towers = printer
        .config()
        .tower_axes()
        .ok_or("homing requires a delta configuration")?;
    printer.start_homing_all()?;
    let settled = printer.run_until(HOMING_TIMEOUT, |p| {
        towers
            .iter()
            .all(|&a| !p.homing_phase(a).is_some_and(HomingPhase::is_active))
    });
    if !settled {
        return Err("homing timed out".into());
    }
    for &axis in &towers {
        if !printer.is_homed(axis) {
            let phase = printer.homing_phase(axis);
            return Err(format!("axis {axis} failed to home: {phase:?}").into());
        }
    }
    info!(position = ?printer.cartesian_position(), "Towers homed");
    Ok(())
}

/// Queue a circle below the homed position, retrying while the window is full.
fn trace_circle(
    printer: &mut Printer<SimHal>,
    running: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error>> {
    const POINTS: usize = 36;
    const RADIUS: f64 = 40.0;
    const FEED: f64 = 3000.0;

    let [_, _, top] = printer
        .cartesian_position()
        .ok_or("Cartesian position unknown after homing")?;
    let z = top - 100.0;
    let mut moves = Vec::with_capacity(POINTS + 2);
    moves.push(CartesianMove::new(RADIUS, 0.0, z, FEED));
    for i in 1..=POINTS {
        let a = core::f64::consts::TAU * i as f64 / POINTS as f64;
        moves.push(CartesianMove::new(RADIUS * a.cos(), RADIUS * a.sin(), z, FEED));
    }

    for mv in &moves {
        loop {
            if !running.load(Ordering::Relaxed) {
                return Ok(());
            }
            match printer.enqueue_cartesian(mv) {
                EnqueueResult::Accepted => break,
                EnqueueResult::Full => printer.run_for(0.01),
                EnqueueResult::Rejected(reason) => return Err(reason.into()),
            }
        }
    }
    printer.flush();
    let t0 = printer.hal().now();
    let done = printer.run_until(60.0, |p| p.is_idle());
    let elapsed = printer.time().secs(printer.hal().now() - t0);
    info!(moves = moves.len(), done, elapsed, "Demo circle traced");
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
