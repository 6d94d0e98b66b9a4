//! SoundMixer - desktop host for the mixer console state engine
//!
//! Drives the engine from a simulated front panel controlled through a REPL.

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soundmixer::cli::{self, Command, HELP};
use soundmixer::drivers::{
    open_telemetry, ConsoleDisplay, ConsoleLeds, LineSink, Peripherals, SimulatedPanel,
};
use soundmixer::paths::AppPaths;
use soundmixer::storage::{EepromMedium, FileEeprom};
use soundmixer::{AppConfig, EngineSettings, MixerEngine, NUM_CHANNELS};

type Console = Peripherals<SimulatedPanel, ConsoleLeds, ConsoleDisplay, LineSink<Box<dyn std::io::Write + Send>>>;
type Engine = MixerEngine<FileEeprom, NUM_CHANNELS>;

/// SoundMixer - encoder volume mixer console
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to the application data directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// EEPROM image file, overrides storage.eeprom_path
    #[arg(long)]
    eeprom: Option<PathBuf>,

    /// Telemetry output (stdout, off, or a file path)
    #[arg(long)]
    telemetry: Option<String>,

    /// Run without the interactive prompt
    #[arg(long)]
    headless: bool,

    /// Erase the EEPROM image before boot
    #[arg(long)]
    reset_storage: bool,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    show_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    info!("Starting SoundMixer v{}...", env!("CARGO_PKG_VERSION"));

    let paths = AppPaths::detect();
    info!(
        "Data directory: {} ({} mode)",
        paths.base_dir().display(),
        if paths.is_portable { "portable" } else { "installed" }
    );
    let config_path = args.config.clone().unwrap_or_else(|| paths.config.clone());

    let mut config = if config_path.exists() {
        info!("Configuration file: {}", config_path.display());
        AppConfig::load(&config_path.to_string_lossy()).await?
    } else {
        info!("No configuration at {}, using defaults", config_path.display());
        AppConfig::default()
    };

    if let Some(eeprom) = &args.eeprom {
        config.storage.eeprom_path = Some(eeprom.clone());
    }
    match &args.telemetry {
        Some(output) => config.telemetry.output = output.clone(),
        None if !args.headless && config.telemetry.output == "stdout" => {
            warn!("Telemetry to stdout would flood the prompt; disabled (use --telemetry <file>)");
            config.telemetry.output = "off".to_string();
        }
        None => {}
    }
    config.validate()?;

    if args.show_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    let eeprom_path = match &config.storage.eeprom_path {
        Some(path) => path.clone(),
        None => {
            paths.ensure_directories()?;
            paths.eeprom.clone()
        }
    };
    let mut medium = FileEeprom::open(&eeprom_path, config.storage.capacity)
        .with_context(|| format!("Failed to open EEPROM image {}", eeprom_path.display()))?;
    info!("EEPROM image: {}", eeprom_path.display());

    if args.reset_storage {
        warn!("Erasing EEPROM image");
        medium.erase();
    }

    let settings = EngineSettings::<NUM_CHANNELS>::from_config(&config)?;
    let mut io = Peripherals {
        pins: SimulatedPanel::new(
            config.mixer.channels.iter().map(|c| c.pins).collect(),
            config.buttons.pins.clone(),
        ),
        leds: ConsoleLeds::new(NUM_CHANNELS),
        display: ConsoleDisplay::new(config.channel_names()),
        telemetry: open_telemetry(&config.telemetry.output)?,
    };

    let start = Instant::now();
    let mut engine = MixerEngine::boot(settings, medium, &mut io.pins, 0)?;
    engine.render_all(&mut io.leds);

    run_app(
        &mut engine,
        &mut io,
        start,
        Duration::from_millis(config.timing.poll_interval_ms),
        !args.headless,
        shutdown_signal(),
    )
    .await;

    match engine.persist_pending() {
        Ok(true) => info!("Pending changes persisted before exit"),
        Ok(false) => {}
        Err(e) => warn!("Unsaved changes lost on exit: {:#}", anyhow::Error::from(e)),
    }
    info!("SoundMixer shutdown complete");
    Ok(())
}

async fn run_app(
    engine: &mut Engine,
    io: &mut Console,
    start: Instant,
    poll_interval: Duration,
    interactive: bool,
    shutdown: impl std::future::Future<Output = ()>,
) {
    let (tx, mut rx) = mpsc::channel::<Command>(32);
    if interactive {
        println!("{}", "Type 'help' for commands".dimmed());
        // Detached thread: the process may exit while readline still blocks
        std::thread::spawn(move || {
            if let Err(e) = cli::run_repl(tx) {
                warn!("REPL stopped: {}", e);
            }
        });
    } else {
        drop(tx);
    }

    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    info!("Starting control loop...");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                io.pins.advance();
                engine.poll(elapsed_ms(start), io);
            }

            Some(command) = rx.recv() => {
                if !apply_command(command, engine, io, elapsed_ms(start)) {
                    break;
                }
            }

            _ = &mut shutdown => {
                break;
            }
        }
    }
}

/// Handle one REPL command; false means quit
fn apply_command(command: Command, engine: &Engine, io: &mut Console, now_ms: u64) -> bool {
    let queued = match command {
        Command::Turn {
            channel,
            direction,
            detents,
        } => io.pins.turn(channel, direction, detents),
        Command::Press { channel } => io.pins.press(channel),
        Command::Button { index } => io.pins.press_button(index),
        Command::Status => {
            print_status(engine, now_ms);
            Ok(())
        }
        Command::Help => {
            println!("{}", HELP);
            Ok(())
        }
        Command::Quit => return false,
    };

    if let Err(e) = queued {
        println!("{} {}", "✗".red(), e);
    }
    true
}

fn print_status(engine: &Engine, now_ms: u64) {
    println!("\n{}", "=== Mixer Status ===".bold().cyan());
    for (i, (name, channel)) in engine.channel_names().zip(engine.channels()).enumerate() {
        let volume = format!("{:>3}", channel.volume());
        let marker = if engine.selected_channel() == Some(i) { "▶" } else { " " };
        let state = if channel.is_muted() {
            "muted".red()
        } else {
            "live".green()
        };
        println!("  {} {} {:<10} {} {}", marker, i, name, volume.yellow(), state);
    }

    let activity = if engine.is_idle(now_ms) {
        "idle".dimmed()
    } else {
        "active".green()
    };
    println!(
        "  brightness {}  {}  {}",
        engine.brightness().to_string().yellow(),
        activity,
        if engine.pending_persist() {
            "unsaved changes".yellow()
        } else {
            "saved".normal()
        }
    );
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
