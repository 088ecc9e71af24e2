// catlink test application -- CLI tool for exercising the FT-817 style
// binary CAT engine against real hardware or a mock transport.
//
// Usage:
//   catlink-test-app ports
//   catlink-test-app --port /dev/ttyUSB0 freq get
//   catlink-test-app --port /dev/ttyUSB0 --baud 9600 freq set 14575000
//   catlink-test-app --port /dev/ttyUSB0 rx-status
//   catlink-test-app --mock tx-status
//   catlink-test-app --mock raw "00 00 00 00 E7"
//   RUST_LOG=catlink_ft817=trace catlink-test-app --port COM3 freq get

use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use catlink_core::format_freq_10hz;
use catlink_ft817::commands::{self, CommandFrame, FRAME_LEN};
use catlink_ft817::tables::{MODES, mode_name_by_id, settable_mode_by_name};
use catlink_ft817::{CatOutcome, CatSession, DEFAULT_FREQUENCY, Ft817Builder};
use catlink_test_harness::MockTransport;
use catlink_transport::available_ports;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// catlink test application -- drives an FT-817 style radio from the
/// command line.
#[derive(Parser)]
#[command(name = "catlink-test-app", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    /// Required unless --mock is used.
    #[arg(long)]
    port: Option<String>,

    /// Baud rate; must match the radio's CAT RATE menu (default 4800).
    #[arg(long)]
    baud: Option<u32>,

    /// Use a scripted mock transport instead of a real serial port.
    /// The mock answers the selected command with a canned reply.
    #[arg(long)]
    mock: bool,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List serial ports present on this machine.
    Ports,

    /// Frequency operations.
    Freq {
        #[command(subcommand)]
        action: FreqAction,
    },

    /// Read squelch and S-meter.
    RxStatus,

    /// Read PTT, high-SWR and split flags.
    TxStatus,

    /// Mode operations.
    Mode {
        #[command(subcommand)]
        action: ModeAction,
    },

    /// Key or unkey the transmitter.
    Ptt {
        #[command(subcommand)]
        action: Toggle,
    },

    /// Enable or disable split operation.
    Split {
        #[command(subcommand)]
        action: Toggle,
    },

    /// VFO operations.
    Vfo {
        #[command(subcommand)]
        action: VfoAction,
    },

    /// Lock or unlock the front panel.
    Lock {
        #[command(subcommand)]
        action: Toggle,
    },

    /// Send a raw 5-byte frame and print the reply as hex.
    Raw {
        /// Ten hex digits, spaces allowed (e.g. "00 00 00 00 E7").
        #[arg(value_parser = parse_frame)]
        frame: [u8; FRAME_LEN],
    },
}

#[derive(Subcommand)]
enum FreqAction {
    /// Read the current frequency and mode.
    Get,
    /// Set the frequency (in 10 Hz units).
    Set {
        /// Frequency in 10 Hz units (e.g. 14575000 = 145.750.00 MHz).
        #[arg(default_value_t = DEFAULT_FREQUENCY)]
        freq: u32,
    },
}

#[derive(Subcommand)]
enum ModeAction {
    /// Select an operating mode.
    Set {
        /// Mode name (LSB, USB, CW, CWR, AM, FM, DIG, PKT) or hex code (0x08).
        mode: String,
    },
    /// List known modes.
    List,
}

#[derive(Subcommand)]
enum VfoAction {
    /// Swap VFO A and VFO B.
    Toggle,
}

#[derive(Subcommand, Clone, Copy)]
enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn is_on(self) -> bool {
        matches!(self, Toggle::On)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse "00 00 00 00 E7" or "00000000E7" into frame bytes.
fn parse_frame(s: &str) -> std::result::Result<[u8; FRAME_LEN], String> {
    let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() != FRAME_LEN * 2 {
        let expected = FRAME_LEN * 2;
        return Err(format!("expected {expected} hex digits, got {}", digits.len()));
    }
    let mut frame = [0u8; FRAME_LEN];
    for (i, byte) in frame.iter_mut().enumerate() {
        let pair = digits.get(i * 2..i * 2 + 2).ok_or("frame is not ASCII hex")?;
        *byte = u8::from_str_radix(pair, 16)
            .map_err(|e| format!("invalid hex byte {pair:?}: {e}"))?;
    }
    Ok(frame)
}

/// Resolve a mode argument to a settable mode byte.
fn parse_mode(mode: &str) -> Result<u8> {
    if let Some(code) = settable_mode_by_name(mode) {
        return Ok(code);
    }
    let hex = mode
        .strip_prefix("0x")
        .or_else(|| mode.strip_prefix("0X"))
        .unwrap_or(mode);
    match u8::from_str_radix(hex, 16) {
        Ok(code) if MODES.iter().any(|m| m.code == code && m.settable) => Ok(code),
        _ => bail!("unknown or non-settable mode: {mode}"),
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Prompt the user for y/N confirmation. Returns true only if "y" or "Y" entered.
fn confirm(prompt: &str) -> bool {
    print!("{prompt}");
    io::stdout().flush().ok();
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    matches!(input.trim(), "y" | "Y")
}

/// Print the non-`Done` outcomes; returns the value for `Done`.
fn unwrap_outcome<T>(outcome: CatOutcome<T>) -> Option<T> {
    match outcome {
        CatOutcome::Done(value) => Some(value),
        CatOutcome::NoReply => {
            println!("No reply from radio (check cable, baud rate and CAT RATE menu)");
            None
        }
        CatOutcome::UnreachableFrequency(freq) => {
            println!(
                "Frequency {} is outside the receive ranges; nothing sent",
                format_freq_10hz(freq)
            );
            None
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "catlink_ft817=debug,catlink_transport=debug,info",
        _ => "catlink_ft817=trace,catlink_transport=trace,debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// ---------------------------------------------------------------------------
// Session construction
// ---------------------------------------------------------------------------

/// Load the mock with the frame(s) the selected command will send and a
/// plausible reply for each.
fn script_mock(mock: &MockTransport, command: &Command) -> Result<()> {
    match command {
        Command::Freq { action: FreqAction::Get } => mock.expect(
            commands::build_read_frequency_and_mode_frame().as_bytes(),
            &[0x14, 0x57, 0x50, 0x00, 0x08],
        ),
        Command::Freq { action: FreqAction::Set { freq } } => {
            if let Ok(frame) = commands::build_set_frequency_frame(*freq) {
                mock.expect(frame.as_bytes(), &[]);
            }
        }
        Command::RxStatus => mock.expect(
            commands::build_read_receiver_status_frame().as_bytes(),
            &[0x0B],
        ),
        Command::TxStatus => mock.expect(
            commands::build_read_transmitter_status_frame().as_bytes(),
            &[0xFF],
        ),
        Command::Mode { action: ModeAction::Set { mode } } => {
            let frame = commands::build_set_mode_frame(parse_mode(mode)?)?;
            mock.expect(frame.as_bytes(), &[]);
        }
        Command::Ptt { action } => {
            mock.expect(commands::build_ptt_frame(action.is_on()).as_bytes(), &[])
        }
        Command::Split { action } => {
            mock.expect(commands::build_split_frame(action.is_on()).as_bytes(), &[])
        }
        Command::Vfo { action: VfoAction::Toggle } => {
            mock.expect(commands::build_toggle_vfo_frame().as_bytes(), &[])
        }
        Command::Lock { action } => {
            mock.expect(commands::build_lock_frame(action.is_on()).as_bytes(), &[])
        }
        Command::Raw { frame } => {
            let frame = CommandFrame::try_from(*frame)?;
            let reply = vec![0x00; frame.reply_len()];
            mock.expect(frame.as_bytes(), &reply);
        }
        Command::Ports | Command::Mode { action: ModeAction::List } => {}
    }
    Ok(())
}

async fn create_session(cli: &Cli) -> Result<CatSession> {
    let mut builder = Ft817Builder::new();
    if let Some(baud) = cli.baud {
        builder = builder.baud_rate(baud);
    }

    if cli.mock {
        let mock = MockTransport::new();
        script_mock(&mock, &cli.command)?;
        println!("Connected (mock transport)");
        return Ok(builder.build_with_transport(Box::new(mock)));
    }

    let port = cli
        .port
        .as_deref()
        .context("--port is required when not using --mock")?;
    let session = builder
        .serial_port(port)
        .build()
        .await
        .with_context(|| format!("failed to open CAT session on {port}"))?;
    println!(
        "Connected to {port} at {} baud",
        session.baud_rate().unwrap_or_default()
    );
    Ok(session)
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

fn cmd_ports() -> Result<()> {
    let ports = available_ports().context("failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found.");
    }
    for port in ports {
        println!("  {port}");
    }
    Ok(())
}

fn cmd_mode_list() {
    println!("{:<6} {:<6} {}", "Code", "Name", "Settable");
    for m in MODES {
        let settable = if m.settable { "yes" } else { "no" };
        println!("0x{:02X}   {:<6} {settable}", m.code, m.name);
    }
}

async fn cmd_freq_get(session: &CatSession) -> Result<()> {
    if let Some(fm) = unwrap_outcome(session.get_freq_and_mode().await?) {
        println!("Frequency: {}", format_freq_10hz(fm.frequency_10hz()));
        println!("Mode:      {} ({})", fm.mode_name, fm.mode_id);
    }
    Ok(())
}

async fn cmd_freq_set(session: &CatSession, freq: u32) -> Result<()> {
    if unwrap_outcome(session.set_frequency(freq).await?).is_some() {
        println!("Frequency set to {}", format_freq_10hz(freq));
    }
    Ok(())
}

async fn cmd_rx_status(session: &CatSession) -> Result<()> {
    if let Some(status) = unwrap_outcome(session.get_receiver_status().await?) {
        let squelch = if status.squelched {
            "closed (no signal)"
        } else {
            "open"
        };
        println!("Squelch:  {squelch}");
        println!("S-meter:  {}", status.smeter_reading);
    }
    Ok(())
}

async fn cmd_tx_status(session: &CatSession) -> Result<()> {
    let Some(status) = unwrap_outcome(session.get_transmitter_status().await?) else {
        return Ok(());
    };
    if !status.ptt_active {
        println!("PTT: OFF (receiving; SWR and split flags not valid)");
        return Ok(());
    }
    println!("PTT:      ON (transmitting)");
    println!("High SWR: {}", status.high_swr);
    println!("Split:    {}", status.split_on);
    Ok(())
}

async fn cmd_mode_set(session: &CatSession, mode: &str) -> Result<()> {
    let code = parse_mode(mode)?;
    if unwrap_outcome(session.set_mode(code).await?).is_some() {
        let name = mode_name_by_id(&format!("{code:02X}"));
        println!("Mode set to {name}");
    }
    Ok(())
}

async fn cmd_ptt(session: &CatSession, on: bool, mock: bool) -> Result<()> {
    if on && !mock {
        println!("WARNING: This will key the transmitter.");
        println!("Ensure an antenna or dummy load is connected.");
        if !confirm("Continue? [y/N] ") {
            println!("Aborted.");
            return Ok(());
        }
    }
    if unwrap_outcome(session.set_ptt(on).await?).is_some() {
        println!("PTT: {}", if on { "ON" } else { "OFF" });
    }
    Ok(())
}

async fn cmd_split(session: &CatSession, on: bool) -> Result<()> {
    if unwrap_outcome(session.set_split(on).await?).is_some() {
        println!("Split: {}", if on { "ON" } else { "OFF" });
    }
    Ok(())
}

async fn cmd_vfo_toggle(session: &CatSession) -> Result<()> {
    if unwrap_outcome(session.toggle_vfo().await?).is_some() {
        println!("VFO toggled");
    }
    Ok(())
}

async fn cmd_lock(session: &CatSession, on: bool) -> Result<()> {
    if unwrap_outcome(session.set_lock(on).await?).is_some() {
        println!("Lock: {}", if on { "ON" } else { "OFF" });
    }
    Ok(())
}

async fn cmd_raw(session: &CatSession, bytes: [u8; FRAME_LEN]) -> Result<()> {
    let frame = CommandFrame::try_from(bytes).context("refusing to send frame")?;
    println!("TX: {} ({:?})", hex_bytes(frame.as_bytes()), frame.opcode());
    if let Some(reply) = unwrap_outcome(session.send_frame(frame).await?) {
        if reply.is_empty() {
            println!("RX: (no reply expected)");
        } else {
            println!("RX: {}", hex_bytes(&reply));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

/// Open a session, run `op` on it, then log the counters and close it.
async fn with_session(cli: &Cli, op: impl AsyncFnOnce(&CatSession) -> Result<()>) -> Result<()> {
    let session = create_session(cli).await?;
    let result = op(&session).await;

    let stats = session.stats().await;
    debug!(
        exchanges = stats.exchanges,
        timeouts = stats.timeouts,
        stale_bytes_dropped = stats.stale_bytes_dropped,
        "session closing"
    );
    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to close CAT session");
    }
    result
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Ports => cmd_ports(),
        Command::Mode {
            action: ModeAction::List,
        } => {
            cmd_mode_list();
            Ok(())
        }
        Command::Mode {
            action: ModeAction::Set { mode },
        } => with_session(&cli, async |s| cmd_mode_set(s, mode).await).await,
        Command::Freq {
            action: FreqAction::Get,
        } => with_session(&cli, async |s| cmd_freq_get(s).await).await,
        Command::Freq {
            action: FreqAction::Set { freq },
        } => with_session(&cli, async |s| cmd_freq_set(s, *freq).await).await,
        Command::RxStatus => with_session(&cli, async |s| cmd_rx_status(s).await).await,
        Command::TxStatus => with_session(&cli, async |s| cmd_tx_status(s).await).await,
        Command::Ptt { action } => {
            let on = action.is_on();
            with_session(&cli, async |s| cmd_ptt(s, on, cli.mock).await).await
        }
        Command::Split { action } => {
            with_session(&cli, async |s| cmd_split(s, action.is_on()).await).await
        }
        Command::Vfo {
            action: VfoAction::Toggle,
        } => with_session(&cli, async |s| cmd_vfo_toggle(s).await).await,
        Command::Lock { action } => {
            with_session(&cli, async |s| cmd_lock(s, action.is_on()).await).await
        }
        Command::Raw { frame } => with_session(&cli, async |s| cmd_raw(s, *frame).await).await,
    }
}
