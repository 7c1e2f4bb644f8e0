//! Signal E2E Test - binary server + client dengan sinyal POSIX asli
//!
//! Menjalankan `sigwire_server`, membaca PID dari stdout-nya, mengirim
//! pesan lewat `sigwire_client`, lalu menghentikan server dengan SIGTERM.
//!
//! Usage:
//!   cargo test --test signal_e2e_test

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

const SERVER_BIN: &str = env!("CARGO_BIN_EXE_sigwire_server");
const CLIENT_BIN: &str = env!("CARGO_BIN_EXE_sigwire_client");
const DEADLINE: Duration = Duration::from_secs(30);

struct RunningServer {
    child: Child,
    pid: i32,
    lines: Receiver<String>,
}

impl RunningServer {
    fn start() -> Self {
        let mut child = Command::new(SERVER_BIN)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn server");

        let stdout = child.stdout.take().expect("server stdout");
        let (tx, lines) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let banner = lines.recv_timeout(DEADLINE).expect("PID line");
        let pid: i32 = banner
            .strip_prefix("PID: ")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or_else(|| panic!("unexpected banner: {banner:?}"));
        let waiting = lines.recv_timeout(DEADLINE).expect("waiting line");
        assert_eq!(waiting, "Waiting for a message...");

        Self { child, pid, lines }
    }

    fn next_line(&self) -> String {
        self.lines.recv_timeout(DEADLINE).expect("server output line")
    }

    fn terminate(mut self) -> ExitStatus {
        // SAFETY: pid milik child yang masih kita pegang
        unsafe { libc::kill(self.pid, libc::SIGTERM) };
        wait_with_deadline(&mut self.child)
    }
}

fn wait_with_deadline(child: &mut Child) -> ExitStatus {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().expect("try_wait") {
            return status;
        }
        if start.elapsed() > DEADLINE {
            child.kill().ok();
            panic!("process did not exit within {DEADLINE:?}");
        }
        thread::sleep(Duration::from_millis(10));
    }
}

fn run_client(args: &[&str]) -> (ExitStatus, String, String) {
    let child = Command::new(CLIENT_BIN)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn client");
    let pid = child.id() as i32;

    // Pipe dibaca sambil client berjalan, supaya output besar tidak deadlock
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        tx.send(child.wait_with_output()).ok();
    });

    let output = match rx.recv_timeout(DEADLINE) {
        Ok(output) => output.expect("client output"),
        Err(_) => {
            // SAFETY: pid milik child yang belum di-reap
            unsafe { libc::kill(pid, libc::SIGKILL) };
            panic!("client did not exit within {DEADLINE:?}");
        }
    };
    (
        output.status,
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

#[test]
fn test_messages_cross_process_boundary() {
    let server = RunningServer::start();
    let pid = server.pid.to_string();

    let (status, stdout, _) = run_client(&[&pid, "Hello, sigwire!"]);
    assert!(status.success());
    assert_eq!(stdout.trim(), "Message sent successfully!");
    assert_eq!(server.next_line(), "Hello, sigwire!");

    // Server yang sama menerima pesan kedua tanpa sisa state
    let (status, _, _) = run_client(&[&pid, "second"]);
    assert!(status.success());
    assert_eq!(server.next_line(), "second");

    let status = server.terminate();
    assert!(status.success(), "server exit: {status:?}");
}

#[test]
fn test_empty_message_prints_empty_line() {
    let server = RunningServer::start();
    let pid = server.pid.to_string();

    let (status, _, _) = run_client(&[&pid, ""]);
    assert!(status.success());
    assert_eq!(server.next_line(), "");

    assert!(server.terminate().success());
}

#[test]
fn test_message_starting_with_dash_is_sent() {
    let server = RunningServer::start();
    let pid = server.pid.to_string();

    for message in ["-hello", "- list item"] {
        let (status, stdout, _) = run_client(&[&pid, message]);
        assert!(status.success());
        assert_eq!(stdout.trim(), "Message sent successfully!");
        assert_eq!(server.next_line(), message);
    }

    assert!(server.terminate().success());
}

#[test]
fn test_help_output_collected() {
    let (status, stdout, _) = run_client(&["--help"]);
    assert!(status.success());
    assert!(stdout.contains("Usage"), "stdout: {stdout}");
    assert!(stdout.contains("--settle-us"), "stdout: {stdout}");
}

#[test]
fn test_invalid_pid_rejected() {
    for bad in ["0", "-3", "abc"] {
        let (status, stdout, stderr) = run_client(&[bad, "hi"]);
        assert!(!status.success(), "pid {bad:?} accepted");
        assert!(stdout.is_empty());
        assert!(stderr.contains("invalid PID"), "stderr: {stderr}");
    }
}

#[test]
fn test_missing_target_fails() {
    let (status, _, stderr) = run_client(&["2147483646", "hi"]);
    assert!(!status.success());
    assert!(stderr.contains("failed to send"), "stderr: {stderr}");
}

#[test]
fn test_usage_error() {
    let (status, _, stderr) = run_client(&["123"]);
    assert!(!status.success());
    assert!(stderr.to_lowercase().contains("usage"), "stderr: {stderr}");
}
