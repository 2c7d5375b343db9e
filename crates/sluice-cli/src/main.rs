//! Sluice driver host.
//!
//! `sluice run` binds the synchronization endpoint, waits for the
//! engine process to connect, registers the configured fields, and
//! drives the simulation until the engine reports finished.
//! `sluice generate` emits a rectangular field-configuration CSV for
//! quick setups.

use clap::{Parser, Subcommand};
use sluice::driver::{Driver, DriverConfig, DEFAULT_SOIL_LAYERS};
use sluice::grid::{parse_csv, write_csv, FieldConfig, FieldGrid, DEFAULT_RADIUS};
use sluice::session::Session;
use sluice::wire::Listener;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sluice")]
#[command(about = "Drive an external crop-growth engine over the sync protocol")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a simulation from a field-configuration CSV.
    Run {
        /// Path to the field-configuration CSV (Name,Radius,SW,X,Y,Z).
        config: PathBuf,

        /// Address to bind the synchronization endpoint on.
        #[arg(long, default_value = "0.0.0.0")]
        addr: String,

        /// Port to bind the synchronization endpoint on.
        #[arg(long, default_value = "27746")]
        port: u16,

        /// Soil layers sampled per field each step.
        #[arg(long, default_value_t = DEFAULT_SOIL_LAYERS)]
        layers: u32,

        /// Receive deadline in seconds; expiry aborts the run.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Log every protocol exchange, not just per-step summaries.
        #[arg(long)]
        verbose: bool,
    },
    /// Generate a rectangular field-configuration CSV.
    Generate {
        /// Output path.
        out: PathBuf,

        /// Grid columns (distinct X values).
        #[arg(long)]
        cols: u32,

        /// Grid rows (distinct Y values).
        #[arg(long)]
        rows: u32,

        /// Initial soil water content for every field.
        #[arg(long, default_value_t = 0.2)]
        sw: f64,

        /// Field radius.
        #[arg(long, default_value_t = DEFAULT_RADIUS)]
        radius: f64,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = match &cli.command {
        Command::Run { verbose: true, .. } => "debug",
        _ => "info",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Run {
            config,
            addr,
            port,
            layers,
            timeout_secs,
            verbose: _,
        } => run(&config, &addr, port, layers, timeout_secs),
        Command::Generate {
            out,
            cols,
            rows,
            sw,
            radius,
        } => generate(&out, cols, rows, sw, radius),
    }
}

fn run(config: &PathBuf, addr: &str, port: u16, layers: u32, timeout_secs: Option<u64>) {
    let text = match std::fs::read_to_string(config) {
        Ok(text) => text,
        Err(e) => fail("config", &format!("cannot read {}: {e}", config.display())),
    };
    let configs = match parse_csv(&text) {
        Ok(configs) => configs,
        Err(e) => fail("config", &e.to_string()),
    };
    let mut grid = match FieldGrid::from_configs(configs) {
        Ok(grid) => grid,
        Err(e) => fail("config", &e.to_string()),
    };
    let (extent_x, extent_y) = grid.extent();
    info!(fields = grid.len(), extent_x, extent_y, "configuration loaded");

    let endpoint = format!("{addr}:{port}");
    let listener = match Listener::bind(&endpoint) {
        Ok(listener) => listener,
        Err(e) => fail("transport", &e.to_string()),
    };
    info!(%endpoint, "waiting for the engine to connect");
    let channel = match listener.accept() {
        Ok(channel) => channel,
        Err(e) => fail("transport", &e.to_string()),
    };

    let mut session = match Session::establish(channel) {
        Ok(session) => session,
        Err(e) => fail("protocol", &e.to_string()),
    };
    if let Some(secs) = timeout_secs {
        if let Err(e) = session.set_recv_deadline(Some(Duration::from_secs(secs))) {
            fail("transport", &e.to_string());
        }
    }
    if let Err(e) = grid.register(&mut session) {
        fail("config", &e.to_string());
    }
    info!(fields = grid.len(), "fields registered");

    let driver = Driver::new(
        session,
        grid,
        DriverConfig {
            soil_layers: layers,
            ..DriverConfig::default()
        },
    );
    match driver.run() {
        Ok(series) => {
            let (steps, x, y, l) = series.vwc.shape();
            info!(steps, "run finished");
            info!("water-content series shape: {steps} x {x} x {y} x {l}");
        }
        Err(e) => fail("run", &e.to_string()),
    }
}

fn generate(out: &PathBuf, cols: u32, rows: u32, sw: f64, radius: f64) {
    if rows == 0 || cols == 0 {
        fail("generate", "rows and cols must both be at least 1");
    }
    let mut configs = Vec::new();
    for x in 0..cols {
        for y in 0..rows {
            configs.push(FieldConfig {
                name: format!("field-{x}-{y}"),
                x,
                y,
                z: 0.0,
                sw,
                radius,
            });
        }
    }
    let text = match write_csv(&configs) {
        Ok(text) => text,
        Err(e) => fail("generate", &e.to_string()),
    };
    if let Err(e) = std::fs::write(out, text) {
        fail("generate", &format!("cannot write {}: {e}", out.display()));
    }
    info!(fields = configs.len(), path = %out.display(), "configuration written");
}

/// Log the failure with its kind and exit non-zero.
fn fail(kind: &str, message: &str) -> ! {
    error!("{kind} error: {message}");
    std::process::exit(1);
}
