//! EmpathAI Sensor CLI
//!
//! Classify feature vectors, replay recorded input traces, or run the engine
//! live over JSON events read from stdin.

use clap::{Parser, Subcommand};
use empath_sensor::{
    classify,
    collector::{ChannelSource, InputEvent},
    config::{EngineConfig, SourceConfig},
    replay::{parse_trace, replay},
    EmotionEngine, SignalFeatures, PRIVACY_DECLARATION, VERSION,
};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "empath-sensor")]
#[command(version = VERSION)]
#[command(about = "Privacy-first behavioral emotion inference", long_about = None)]
struct Cli {
    /// Log analysis details
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a hand-built feature vector
    Classify {
        #[arg(long, default_value = "0")]
        avg_speed: f64,

        /// Standard deviation of pointer speed
        #[arg(long, default_value = "0")]
        variance: f64,

        #[arg(long, default_value = "0")]
        pointer_samples: usize,

        #[arg(long, default_value = "0")]
        keys: usize,

        /// Backspace/Delete presses among the keys
        #[arg(long, default_value = "0")]
        corrections: usize,
    },

    /// Replay a recorded JSON Lines trace on a virtual clock
    Replay {
        /// Trace file
        trace: PathBuf,

        /// Configuration file (defaults to the user config)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the engine over JSON events read from stdin
    Run {
        /// Input sources to capture (keyboard, mouse, or all)
        #[arg(long, default_value = "all")]
        sources: String,

        /// Configuration file (defaults to the user config)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the resolved configuration
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Display privacy declaration
    Privacy,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Classify {
            avg_speed,
            variance,
            pointer_samples,
            keys,
            corrections,
        } => {
            cmd_classify(avg_speed, variance, pointer_samples, keys, corrections);
        }
        Commands::Replay { trace, config } => {
            cmd_replay(&trace, config.as_deref());
        }
        Commands::Run { sources, config } => {
            cmd_run(&sources, config.as_deref());
        }
        Commands::Config { config } => {
            cmd_config(config.as_deref());
        }
        Commands::Privacy => {
            println!("{PRIVACY_DECLARATION}");
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "empath_sensor=debug"
    } else {
        "empath_sensor=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> EngineConfig {
    let result = match path {
        Some(path) => EngineConfig::from_path(path),
        None => EngineConfig::load(),
    };

    match result {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_classify(
    avg_speed: f64,
    variance: f64,
    pointer_samples: usize,
    keys: usize,
    corrections: usize,
) {
    if corrections > keys {
        eprintln!("Error: --corrections cannot exceed --keys");
        std::process::exit(1);
    }

    let features = SignalFeatures {
        avg_pointer_speed: avg_speed,
        pointer_variance: variance,
        pointer_sample_count: pointer_samples,
        key_count: keys,
        correction_count: corrections,
        error_rate: if keys == 0 {
            0.0
        } else {
            corrections as f64 / keys as f64
        },
    };

    let result = classify(&features);
    println!(
        "{} (confidence {:.2}, rule {:?})",
        result.emotion, result.confidence, result.rule
    );
}

fn cmd_replay(trace: &Path, config_path: Option<&Path>) {
    let config = load_config(config_path);

    let content = match std::fs::read_to_string(trace) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {e}", trace.display());
            std::process::exit(1);
        }
    };

    let events = match parse_trace(&content) {
        Ok(events) => events,
        Err(e) => {
            eprintln!("Error parsing {}: {e}", trace.display());
            std::process::exit(1);
        }
    };

    let engine = match EmotionEngine::builder(config).manual_clock().build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = engine.start() {
        eprintln!("Error starting engine: {e}");
        std::process::exit(1);
    }

    let emissions = match replay(&engine, &events, Instant::now()) {
        Ok(emissions) => emissions,
        Err(e) => {
            eprintln!("Error replaying {}: {e}", trace.display());
            std::process::exit(1);
        }
    };

    for emission in emissions {
        match serde_json::to_string(&emission) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Warning: could not serialize emission: {e}"),
        }
    }

    engine.stop();
    eprintln!();
    eprintln!("{}", engine.transparency_summary());
}

fn cmd_run(sources: &str, config_path: Option<&Path>) {
    let mut config = load_config(config_path);
    config.sources = SourceConfig::from_csv(sources);
    if !config.sources.any_enabled() {
        eprintln!("Error: At least one source must be enabled (keyboard or mouse)");
        std::process::exit(1);
    }

    eprintln!("EmpathAI Sensor v{VERSION}");
    eprintln!("  Keyboard: {}", enabled(config.sources.keyboard));
    eprintln!("  Mouse: {}", enabled(config.sources.mouse));
    eprintln!("  Signal window: {}ms", config.signal_window.as_millis());
    eprintln!("  Analysis interval: {}ms", config.analysis_interval.as_millis());
    eprintln!();
    eprintln!("Reading events from stdin. Press Ctrl+C to stop.");

    let source = ChannelSource::new();
    let sender = source.sender();

    let engine = match EmotionEngine::builder(config).source(source).build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    engine.subscribe(|snapshot| match serde_json::to_string(snapshot) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Warning: could not serialize snapshot: {e}"),
    });

    if let Err(e) = engine.start() {
        eprintln!("Error starting engine: {e}");
        std::process::exit(1);
    }

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    // stdin blocks, so read it on its own thread
    let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<InputEvent>(&line) {
                Ok(event) => {
                    if sender.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!("Skipping malformed event: {}", e),
            }
        }
        let _ = done_tx.send(());
    });

    while running.load(Ordering::SeqCst) {
        match done_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(()) | Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                // Give the last events one analysis cycle before stopping
                thread::sleep(engine.config().analysis_interval);
                break;
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
        }
    }

    engine.stop();
    eprintln!();
    eprintln!("{}", engine.transparency_summary());
}

fn cmd_config(config_path: Option<&Path>) {
    let config = load_config(config_path);

    println!("Configuration:");
    println!("  Config file: {:?}", EngineConfig::config_path());
    match config.to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .unwrap_or_else(|e| eprintln!("Warning: could not install Ctrl+C handler: {e}"));
}
