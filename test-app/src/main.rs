// jtech test application -- CLI tool for exercising a J-Tech HDMI matrix
// through the async or the blocking client, against real hardware or a
// scripted mock transport.
//
// Usage:
//   jtech-test-app --host 10.0.0.7 status 1
//   jtech-test-app --host 10.0.0.7 power 3 off
//   jtech-test-app --host 10.0.0.7 source 2 5
//   jtech-test-app --host 10.0.0.7 --blocking all 1
//   jtech-test-app --host 10.0.0.7 scan
//   jtech-test-app --mock -v status 1

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use jtech::builder::DEFAULT_PORT;
use jtech::commands;
use jtech::{BlockingJtechMatrix, BlockingMatrix, JtechBuilder, JtechMatrix, Matrix, ZoneStatus};
use jtech_test_harness::MockTransport;

/// Zones queried by `scan`.
const SCAN_ZONES: std::ops::RangeInclusive<i32> = 1..=8;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// jtech test application -- drives an HDMI matrix from the command line.
#[derive(Parser, Debug)]
#[command(name = "jtech-test-app", version, about)]
struct Cli {
    /// Matrix hostname or IP address. Required unless --mock is used.
    #[arg(long)]
    host: Option<String>,

    /// Matrix control port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Reply timeout in milliseconds.
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// Use the blocking client instead of the async one.
    #[arg(long)]
    blocking: bool,

    /// Run against a scripted mock transport instead of a real matrix.
    #[arg(long)]
    mock: bool,

    /// Enable debug logging (RUST_LOG overrides this).
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Print the power state and routing of one zone.
    Status {
        /// Zone (output) number.
        zone: i32,
    },

    /// Switch a zone on or off.
    Power {
        /// Zone (output) number.
        zone: i32,
        /// Desired power state.
        #[arg(value_enum)]
        state: PowerState,
    },

    /// Route a source to one zone.
    Source {
        /// Zone (output) number.
        zone: i32,
        /// Source (input) number, clamped to 1-8.
        source: i32,
    },

    /// Route a source to every zone.
    All {
        /// Source (input) number, clamped to 1-8.
        source: i32,
    },

    /// Print the status of zones 1 through 8.
    Scan,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum PowerState {
    On,
    Off,
}

impl PowerState {
    fn as_bool(self) -> bool {
        self == PowerState::On
    }
}

// ---------------------------------------------------------------------------
// Mock scripting
// ---------------------------------------------------------------------------

const MOCK_GREETING: &[u8] = b"Welcome to HDMI Matrix\r";

/// A mock transport scripted with plausible replies for `command`.
fn scripted_mock(command: Command) -> MockTransport {
    let mut mock = MockTransport::new();
    mock.greeting(MOCK_GREETING);

    match command {
        Command::Status { zone } => {
            mock.expect(&commands::cmd_zone_status(zone), &mock_status_reply(zone));
        }
        Command::Scan => {
            for zone in SCAN_ZONES {
                mock.expect(&commands::cmd_zone_status(zone), &mock_status_reply(zone));
            }
        }
        Command::Power { zone, state } => {
            let ack = if state.as_bool() { "Open" } else { "Closed" };
            mock.expect(
                &commands::cmd_set_zone_power(zone, state.as_bool()),
                format!("{zone:02} {ack}.\r").as_bytes(),
            );
        }
        Command::Source { zone, source } => {
            let source = commands::clamp_source(source);
            mock.expect(
                &commands::cmd_set_zone_source(zone, source),
                format!("AV:{source:02}->{zone:02}\r").as_bytes(),
            );
        }
        Command::All { source } => {
            let source = commands::clamp_source(source);
            mock.expect(
                &commands::cmd_set_all_zone_source(source),
                format!("{source:02} To All.\r").as_bytes(),
            );
        }
    }

    mock
}

/// Even zones are reported switched off, odd zones show their own input.
fn mock_status_reply(zone: i32) -> Vec<u8> {
    if zone % 2 == 0 {
        format!("AV:OFF->{zone:02}\r\nIR:OFF->{zone:02}\r").into_bytes()
    } else {
        let source = commands::clamp_source(zone);
        format!("AV: {source:02}->{zone:02}\r\nIR: {source:02}->{zone:02}\r").into_bytes()
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

fn builder(cli: &Cli) -> Result<JtechBuilder> {
    let mut builder = JtechBuilder::new()
        .port(cli.port)
        .command_timeout(Duration::from_millis(cli.timeout_ms));
    if !cli.mock {
        let host = cli
            .host
            .as_deref()
            .context("--host is required when not using --mock")?;
        builder = builder.host(host);
    }
    Ok(builder)
}

async fn create_matrix(cli: &Cli) -> Result<JtechMatrix> {
    let builder = builder(cli)?;
    if cli.mock {
        let matrix = builder
            .build_with_transport(Box::new(scripted_mock(cli.command)))
            .await
            .context("failed to build matrix with mock transport")?;
        println!("Connected (mock transport)");
        return Ok(matrix);
    }

    let matrix = builder.build().await.with_context(|| {
        format!(
            "failed to connect to {}:{}",
            cli.host.as_deref().unwrap_or_default(),
            cli.port
        )
    })?;
    println!("Connected to {}:{}", cli.host.as_deref().unwrap_or_default(), cli.port);
    Ok(matrix)
}

fn create_blocking_matrix(cli: &Cli) -> Result<BlockingJtechMatrix> {
    let builder = builder(cli)?;
    if cli.mock {
        let matrix = builder
            .build_blocking_with_transport(Box::new(scripted_mock(cli.command)))
            .context("failed to build blocking matrix with mock transport")?;
        println!("Connected (mock transport, blocking)");
        return Ok(matrix);
    }

    let matrix = builder.build_blocking().with_context(|| {
        format!(
            "failed to connect to {}:{}",
            cli.host.as_deref().unwrap_or_default(),
            cli.port
        )
    })?;
    println!(
        "Connected to {}:{} (blocking)",
        cli.host.as_deref().unwrap_or_default(),
        cli.port
    );
    Ok(matrix)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn print_status(zone: i32, status: Option<ZoneStatus>) {
    match status {
        Some(status) => {
            println!("Zone Number = {}", status.zone());
            println!("Zone Power is {}", if status.power() { "On" } else { "Off" });
            println!("AV Source = {}", format_source(status.av()));
            println!("IR Source = {}", format_source(status.ir()));
        }
        None => println!("Zone {zone}: no recognisable status reply"),
    }
}

fn format_source(source: Option<u8>) -> String {
    source.map_or_else(|| "-".to_string(), |s| s.to_string())
}

async fn run_async(matrix: &JtechMatrix, command: Command) -> Result<()> {
    match command {
        Command::Status { zone } => {
            let status = matrix.zone_status(zone).await?;
            print_status(zone, status);
        }
        Command::Scan => {
            for zone in SCAN_ZONES {
                match matrix.zone_status(zone).await? {
                    Some(status) => println!("{status}"),
                    None => println!("Zone {zone}: unknown"),
                }
            }
        }
        Command::Power { zone, state } => {
            matrix.set_zone_power(zone, state.as_bool()).await?;
            println!("Zone {zone} power {state:?}");
        }
        Command::Source { zone, source } => {
            matrix.set_zone_source(zone, source).await?;
            println!("Zone {zone} <- source {}", commands::clamp_source(source));
        }
        Command::All { source } => {
            matrix.set_all_zone_source(source).await?;
            println!("All zones <- source {}", commands::clamp_source(source));
        }
    }
    Ok(())
}

fn run_blocking(matrix: &BlockingJtechMatrix, command: Command) -> Result<()> {
    match command {
        Command::Status { zone } => {
            let status = matrix.zone_status(zone)?;
            print_status(zone, status);
        }
        Command::Scan => {
            for zone in SCAN_ZONES {
                match matrix.zone_status(zone)? {
                    Some(status) => println!("{status}"),
                    None => println!("Zone {zone}: unknown"),
                }
            }
        }
        Command::Power { zone, state } => {
            matrix.set_zone_power(zone, state.as_bool())?;
            println!("Zone {zone} power {state:?}");
        }
        Command::Source { zone, source } => {
            matrix.set_zone_source(zone, source)?;
            println!("Zone {zone} <- source {}", commands::clamp_source(source));
        }
        Command::All { source } => {
            matrix.set_all_zone_source(source)?;
            println!("All zones <- source {}", commands::clamp_source(source));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if !cli.mock && cli.host.is_none() {
        bail!("--host is required when not using --mock");
    }

    if cli.blocking {
        info!("using blocking client");
        return tokio::task::spawn_blocking(move || {
            let matrix = create_blocking_matrix(&cli)?;
            let result = run_blocking(&matrix, cli.command);
            matrix.close().ok();
            result
        })
        .await
        .context("blocking worker panicked")?;
    }

    let matrix = create_matrix(&cli).await?;
    let result = run_async(&matrix, cli.command).await;
    matrix.close().await.ok();
    result
}
