//! wow-hook: the host-facing entry point.
//!
//! The host pipes one tool-request JSON to stdin before each tool
//! invocation and dispatches on the exit code:
//!
//! - `0`: pass through; stdout carries the (possibly mutated) request
//! - `2`: blocked (liftable by Bypass)
//! - `3`: critical block (never liftable)
//! - `4`: SuperAdmin required
//!
//! Human-readable reasons go to stderr with severity tags. Infrastructure
//! faults (unreadable config, broken home directory) warn and pass the
//! request through unchanged so a deployment problem cannot brick the
//! host.

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]

use clap::{Parser, Subcommand};
use std::io::Read as _;

use wow_core::WowHome;
use wow_privilege::{PrivilegeManager, PrivilegeMode};
use wow_router::Router;

/// wow-system: security interception for AI-assistant tool invocations.
#[derive(Parser)]
#[command(name = "wow-hook")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Intercept one tool request (default when no subcommand is given).
    Hook {
        /// Request JSON; read from stdin when omitted.
        input: Option<String>,
    },

    /// Manage Bypass privilege (tier 3).
    Bypass {
        #[command(subcommand)]
        action: PrivilegeAction,
    },

    /// Manage SuperAdmin privilege (tier 2; implies Bypass).
    Superadmin {
        #[command(subcommand)]
        action: PrivilegeAction,
    },
}

#[derive(Subcommand)]
enum PrivilegeAction {
    /// Activate the mode (interactive terminal required).
    Activate,
    /// Deactivate the mode.
    Deactivate,
    /// Report whether the mode is active.
    Status,
}

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = Cli::parse();

    let home = match WowHome::resolve() {
        Ok(home) => home,
        Err(err) => {
            eprintln!("WARN: cannot resolve WOW_HOME: {err}");
            return passthrough_stdin();
        },
    };

    let _log_guard = init_tracing(&home);

    match cli.command {
        None | Some(Commands::Hook { input: None }) => hook(&home, None),
        Some(Commands::Hook { input: Some(text) }) => hook(&home, Some(text)),
        Some(Commands::Bypass { action }) => privilege(&home, PrivilegeMode::Bypass, &action),
        Some(Commands::Superadmin { action }) => {
            privilege(&home, PrivilegeMode::SuperAdmin, &action)
        },
    }
}

/// Run one request through the pipeline and mirror the decision to the
/// process interface.
fn hook(home: &WowHome, input: Option<String>) -> i32 {
    let input = match input {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            if let Err(err) = std::io::stdin().read_to_string(&mut buffer) {
                eprintln!("WARN: cannot read stdin: {err}");
                return 0;
            }
            buffer
        },
    };

    let mut router = match Router::new(home.clone()) {
        Ok(router) => router,
        Err(err) => {
            // A broken deployment must not brick the host: warn, pass
            // through unchanged.
            eprintln!("WARN: interception unavailable ({err}); passing through");
            println!("{input}");
            return 0;
        },
    };

    let response = router.handle(&input);
    for line in response.stderr_lines() {
        eprintln!("{line}");
    }
    if let Some(stdout) = response.stdout() {
        println!("{stdout}");
    }
    response.exit_code()
}

fn privilege(home: &WowHome, mode: PrivilegeMode, action: &PrivilegeAction) -> i32 {
    if let Err(err) = home.ensure() {
        eprintln!("WARN: cannot prepare {}: {err}", home.root().display());
        return 1;
    }
    let manager = PrivilegeManager::new(mode, home);
    match action {
        PrivilegeAction::Activate => match manager.activate() {
            Ok(()) => {
                println!("{mode} activated");
                0
            },
            Err(err) => {
                eprintln!("BLOCKED: {err}");
                1
            },
        },
        PrivilegeAction::Deactivate => {
            manager.deactivate();
            println!("{mode} deactivated");
            0
        },
        PrivilegeAction::Status => {
            if manager.is_active() {
                let remaining = manager.remaining_secs().unwrap_or(0);
                println!("{mode} active ({remaining}s remaining)");
                0
            } else {
                println!("{mode} locked");
                1
            }
        },
    }
}

/// Echo stdin to stdout unchanged; the fail-open path for infrastructure
/// faults.
fn passthrough_stdin() -> i32 {
    let mut buffer = String::new();
    if std::io::stdin().read_to_string(&mut buffer).is_ok() {
        print!("{buffer}");
    }
    0
}

/// Map `WOW_LOG_LEVEL` (0..4) onto a tracing filter and append to
/// `logs/wow.log`.
fn init_tracing(home: &WowHome) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let level = match std::env::var("WOW_LOG_LEVEL").ok().as_deref() {
        Some("0") => "error",
        Some("1") => "warn",
        Some("3") => "debug",
        Some("4") => "trace",
        _ => "info",
    };

    std::fs::create_dir_all(home.log_dir()).ok()?;
    let appender = tracing_appender::rolling::never(home.log_dir(), "wow.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;
    Some(guard)
}
