//! sigwire Server Binary
//!
//! Receiver: pasang handler SIGUSR1/SIGUSR2, tampilkan PID, lalu cetak
//! setiap pesan yang di-decode ke stdout (satu baris per pesan).
//! SIGINT/SIGTERM menghentikan server dengan exit code 0.
//!
//! Usage:
//!   cargo run --release --bin sigwire_server [-- --verbose]

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use sigwire::channel::signal::{current_pid, install_receiver};
use sigwire::channel::{wake_pipe, SignalNotifier};
use sigwire::session::ReceiverSession;
use sigwire::{telemetry, TransportError, TransportResult};

/// Receive messages sent bit by bit over SIGUSR1/SIGUSR2
#[derive(Parser, Debug)]
#[command(name = "sigwire_server", version)]
struct Args {
    /// Verbose logging (debug level) on stderr
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn run() -> TransportResult<()> {
    let (waker, mut waiter) = wake_pipe().map_err(TransportError::Wake)?;
    let session = ReceiverSession::new(SignalNotifier).with_waker(waker);

    // Handler dipasang sebelum PID ditampilkan: client yang cepat tidak
    // boleh mengenai aksi default SIGUSR (terminate).
    let session = install_receiver(session)?;

    let pid = current_pid();
    println!("PID: {pid}");
    println!("Waiting for a message...");
    info!(pid, "Receiver ready");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let tally = session.serve(&mut waiter, &mut out)?;

    info!(
        messages = tally.messages,
        bytes = tally.bytes,
        bits = session.bits_received(),
        acks = session.acks_sent(),
        "Receiver stopped"
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    telemetry::init(args.verbose);

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
