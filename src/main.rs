//! SLM Calibration Sweep CLI
//!
//! Runs a calibration sweep with the configured pattern family, or brings up
//! the laser controller. With no arguments a half-gray sweep runs against
//! the mock display and camera using compiled-in defaults.

use clap::{Parser, Subcommand, ValueEnum};
use slm_sweep::{
    config::{ConfigError, SweepConfig},
    device::{CapturePort, MockDisplay},
    laser::PowerUp,
    metrics::MetricsRegistry,
    output::ImageWriter,
    pattern::PatternFamily,
    sweep::{SweepController, SweepSession, SweepSettings},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// SLM calibration sweeps with paired camera capture
#[derive(Parser, Debug)]
#[command(name = "slm-sweep")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Display a pattern sequence and capture the camera response (default)
    Sweep(SweepArgs),

    /// Unlock the laser controller, enable emission and set the diode current
    Laser {
        /// Serial device, e.g. /dev/ttyUSB0 or COM3
        #[arg(short, long)]
        port: Option<String>,

        /// Diode current in mA
        #[arg(long)]
        current_ma: Option<u32>,

        /// Unlock code for the protected access level
        #[arg(long)]
        access_code: Option<u32>,
    },
}

#[derive(clap::Args, Debug, Default)]
struct SweepArgs {
    /// Pattern family to sweep
    #[arg(short, long, value_enum)]
    pattern: Option<FamilyArg>,

    /// Ramp steps (ramp, half-split)
    #[arg(long)]
    steps: Option<u32>,

    /// Checkerboard squares across and down
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    squares: Option<Vec<u32>>,

    /// Hadamard matrix order (power of two)
    #[arg(long)]
    order: Option<u32>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settle time after each display update, in milliseconds
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Display patterns without capturing
    #[arg(long)]
    no_capture: bool,

    /// Use the system camera instead of the mock
    #[cfg(feature = "camera")]
    #[arg(long)]
    camera: bool,

    /// Serve Prometheus metrics on this port while sweeping
    #[cfg(feature = "metrics")]
    #[arg(long)]
    metrics_port: Option<u16>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FamilyArg {
    Ramp,
    HalfSplit,
    Checkerboard,
    Hadamard,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("SLM Sweep v{}", slm_sweep::VERSION);

    let config = match load_config(args.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Some(Command::Laser {
            port,
            current_ma,
            access_code,
        }) => run_laser(config, port, current_ma, access_code),
        Some(Command::Sweep(sweep)) => run_sweep(config, sweep),
        None => run_sweep(config, SweepArgs::default()),
    };

    if let Err(message) = result {
        error!("{}", message);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SweepConfig, ConfigError> {
    match path {
        Some(p) => SweepConfig::from_file(p),
        None => Ok(SweepConfig::default()),
    }
}

fn apply_overrides(config: &mut SweepConfig, args: &SweepArgs) -> Result<(), String> {
    if let Some(family) = args.pattern {
        let steps = args.steps.unwrap_or(match config.pattern {
            PatternFamily::Ramp { steps } | PatternFamily::HalfSplit { steps } => steps,
            _ => 256,
        });
        config.pattern = match family {
            FamilyArg::Ramp => PatternFamily::Ramp { steps },
            FamilyArg::HalfSplit => PatternFamily::HalfSplit { steps },
            FamilyArg::Checkerboard => {
                let (squares_x, squares_y) = match args.squares.as_deref() {
                    Some([x, y]) => (*x, *y),
                    _ => (8, 8),
                };
                PatternFamily::Checkerboard {
                    squares_x,
                    squares_y,
                }
            }
            FamilyArg::Hadamard => PatternFamily::Hadamard {
                order: args.order.unwrap_or(8),
            },
        };
    } else if let Some(steps) = args.steps {
        match &mut config.pattern {
            PatternFamily::Ramp { steps: s } | PatternFamily::HalfSplit { steps: s } => *s = steps,
            other => return Err(format!("--steps does not apply to {:?}", other)),
        }
    }

    if let Some(dir) = &args.output {
        config.output.directory = dir.clone();
    }
    if let Some(ms) = args.settle_ms {
        config.timing.settle_ms = ms;
    }
    if args.no_capture {
        config.capture.enabled = false;
    }
    #[cfg(feature = "metrics")]
    if let Some(port) = args.metrics_port {
        config.output.metrics_port = port;
    }

    config.validate().map_err(|e| e.to_string())
}

fn run_sweep(mut config: SweepConfig, args: SweepArgs) -> Result<(), String> {
    apply_overrides(&mut config, &args)?;

    let registry = Arc::new(
        MetricsRegistry::new().map_err(|e| format!("Failed to create metrics registry: {}", e))?,
    );
    spawn_metrics_server(&config, &registry);

    let controller =
        SweepController::new(SweepSettings::from(&config)).with_metrics(Arc::clone(&registry));
    let mut session = SweepSession::from_family(&config.pattern, &config.output.directory);
    let mut writer = ImageWriter::new(config.output.format);

    // No SLM vendor binding is linked into this binary
    warn!("Using mock display: patterns are written to disk but not shown on hardware");
    let mut display = MockDisplay::new();
    let mut camera = None;
    if config.capture.enabled {
        camera = select_camera(&args);
        if camera.is_none() {
            warn!("No capture backend selected: running in display-only mode");
        }
    }

    info!(
        "Sweeping {:?} ({} patterns) into {}",
        config.pattern,
        session.len(),
        config.output.directory.display()
    );

    let capture: Option<&mut dyn CapturePort> = match camera.as_mut() {
        Some(camera) => Some(&mut **camera),
        None => None,
    };
    let report = controller
        .run(&mut session, &mut display, capture, &mut writer)
        .map_err(|e| format!("Sweep aborted: {}", e))?;

    if config.output.manifest {
        let path = config.output.directory.join("manifest.toml");
        match report.write_manifest(&path) {
            Ok(()) => info!("Manifest written to {}", path.display()),
            Err(e) => warn!("Manifest not written: {}", e),
        }
    }

    info!(
        "Done: {} patterns displayed, {} frames captured, {} display failures, {} captures unavailable",
        report.patterns_displayed,
        report.frames_captured,
        report.display_failures(),
        report.capture_unavailable()
    );
    Ok(())
}

/// Capture backend for this run, or `None` for a display-only sweep.
#[cfg(feature = "camera")]
fn select_camera(args: &SweepArgs) -> Option<Box<dyn CapturePort>> {
    if args.camera {
        Some(Box::new(slm_sweep::device::NokhwaCamera::new()))
    } else {
        None
    }
}

#[cfg(not(feature = "camera"))]
fn select_camera(_args: &SweepArgs) -> Option<Box<dyn CapturePort>> {
    None
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(config: &SweepConfig, registry: &Arc<MetricsRegistry>) {
    use slm_sweep::metrics::{MetricsServer, MetricsServerConfig};

    let port = config.output.metrics_port;
    if port == 0 {
        return;
    }
    let server = MetricsServer::new(MetricsServerConfig::with_port(port), Arc::clone(registry));
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!("Metrics server runtime failed to start: {}", e);
                return;
            }
        };
        if let Err(e) = runtime.block_on(server.run()) {
            warn!("Metrics server stopped: {}", e);
        }
    });
}

#[cfg(not(feature = "metrics"))]
fn spawn_metrics_server(config: &SweepConfig, _registry: &Arc<MetricsRegistry>) {
    if config.output.metrics_port != 0 {
        warn!("metrics_port is set but this build lacks the `metrics` feature");
    }
}

fn run_laser(
    mut config: SweepConfig,
    port: Option<String>,
    current_ma: Option<u32>,
    access_code: Option<u32>,
) -> Result<(), String> {
    if let Some(port) = port {
        config.laser.port = port;
    }
    if let Some(ma) = current_ma {
        config.laser.current_ma = ma;
    }
    if access_code.is_some() {
        config.laser.access_code = access_code;
    }

    let plan = PowerUp::from_config(&config.laser).map_err(|e| e.to_string())?;
    power_up(&config, &plan)
}

#[cfg(feature = "serial")]
fn power_up(config: &SweepConfig, plan: &PowerUp) -> Result<(), String> {
    let mut link = slm_sweep::laser::open_serial(&config.laser).map_err(|e| e.to_string())?;
    let exchanges = link.power_up(plan).map_err(|e| e.to_string())?;
    for exchange in &exchanges {
        println!("{:<28} -> {}", exchange.command.to_string(), exchange.reply);
    }
    info!("Laser command sequence completed");
    Ok(())
}

#[cfg(not(feature = "serial"))]
fn power_up(config: &SweepConfig, plan: &PowerUp) -> Result<(), String> {
    for command in plan.commands() {
        info!("Would send to {}: {}", config.laser.port, command);
    }
    Err("this build lacks the `serial` feature; rebuild with --features serial".into())
}
