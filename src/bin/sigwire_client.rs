//! sigwire Client Binary
//!
//! Sender: kirim satu pesan ke server, bit demi bit, menunggu ack
//! setelah setiap bit. Tidak ada timeout.
//!
//! Usage:
//!   cargo run --release --bin sigwire_client -- <PID> "<MESSAGE>"

use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use sigwire::channel::signal::install_ack_handler;
use sigwire::channel::SignalNotifier;
use sigwire::config::SenderConfig;
use sigwire::protocol::Pid;
use sigwire::session::Sender;
use sigwire::{telemetry, TransportResult};

/// Send a message to a sigwire server using SIGUSR1/SIGUSR2
#[derive(Parser, Debug)]
#[command(name = "sigwire_client", version)]
struct Args {
    /// PID of the receiving server
    #[arg(allow_negative_numbers = true)]
    pid: String,

    /// Message to send (must not contain a NUL byte); may start with '-'
    #[arg(allow_hyphen_values = true, value_parser = clap::value_parser!(OsString))]
    message: OsString,

    /// Sleep between ack checks, in microseconds (0 = yield)
    #[arg(long, default_value_t = 100)]
    poll_us: u64,

    /// Pause after each acknowledged bit, in microseconds
    #[arg(long, default_value_t = 100)]
    settle_us: u64,

    /// Verbose logging (debug level) on stderr
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn run(args: &Args) -> TransportResult<()> {
    // Validasi target sebelum handler dipasang atau sinyal dikirim
    let target: Pid = args.pid.parse()?;
    let config = SenderConfig::from_micros(args.poll_us, args.settle_us);

    let ack = install_ack_handler()?;
    let sender = Sender::new(SignalNotifier, target, ack, config);

    let report = sender.send_message(args.message.as_bytes())?;
    info!(
        target_pid = target.get(),
        bytes = report.bytes,
        bits = report.bits,
        acks = report.acks,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Transmission complete"
    );

    println!("Message sent successfully!");
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    telemetry::init(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
