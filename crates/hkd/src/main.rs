use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hkkeys::KeycodeRegistry;
use hkd::{daemon::Daemon, observe, paths, pidfile, service, tap};

/// Simple hotkey daemon for macOS.
#[derive(Debug, Parser)]
#[command(name = "hkd", version)]
struct Cli {
    /// Path to the config file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Signal the running instance to reload its config.
    #[arg(short, long)]
    reload: bool,

    /// Print keyboard events instead of dispatching them.
    #[arg(short, long)]
    observe: bool,

    /// Parse the config and print its syntax tree.
    #[arg(long)]
    dump_ast: bool,

    /// Install the launchd service.
    #[arg(long)]
    install_service: bool,

    /// Uninstall the launchd service.
    #[arg(long)]
    uninstall_service: bool,

    /// Start the launchd service, installing it if needed.
    #[arg(long)]
    start_service: bool,

    /// Stop the launchd service.
    #[arg(long)]
    stop_service: bool,

    /// Restart the launchd service.
    #[arg(long)]
    restart_service: bool,

    /// Arm the development exit chord (right Alt + keycode 8).
    #[arg(long)]
    exit_chord: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if nix::unistd::Uid::effective().is_root() || nix::unistd::Uid::current().is_root() {
        return Err("running as root is not allowed".into());
    }

    if cli.install_service {
        service::install()?;
        info!("service installed");
        return Ok(());
    }
    if cli.uninstall_service {
        service::uninstall()?;
        info!("service uninstalled");
        return Ok(());
    }
    if cli.start_service {
        service::start()?;
        info!("service started");
        return Ok(());
    }
    if cli.stop_service {
        service::stop()?;
        info!("service stopped");
        return Ok(());
    }
    if cli.restart_service {
        service::restart()?;
        info!("service restarted");
        return Ok(());
    }

    if cli.observe {
        return run_observer();
    }

    if cli.reload {
        let pid = pidfile::read()?;
        nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(pid),
            nix::sys::signal::Signal::SIGUSR1,
        )?;
        info!("reload signal sent to pid {pid}");
        return Ok(());
    }

    let config_path = cli
        .config
        .or_else(paths::config_file)
        .ok_or("config file not found")?;

    if cli.dump_ast {
        let contents = fs::read_to_string(&config_path)?;
        let program = hkparser::parse(&contents)?;
        println!("{program:#?}");
        return Ok(());
    }

    let _pid_file = pidfile::create()?;

    // Fired commands are never waited on; let the kernel reap them.
    unsafe {
        nix::sys::signal::signal(
            nix::sys::signal::Signal::SIGCHLD,
            nix::sys::signal::SigHandler::SigIgn,
        )?;
    }

    let mut daemon = Daemon::new(config_path, KeycodeRegistry::ansi())?;
    if cli.exit_chord {
        daemon.engine_mut().enable_exit_chord();
    }
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, daemon.reload_flag())?;

    info!("running key event loop");
    let mut tap = tap::system_tap()?;
    tap.run(&mut |event| {
        let decision = daemon.on_event(event);
        if daemon.exit_requested() {
            info!("exit chord pressed, shutting down");
            std::process::exit(0);
        }
        decision
    })?;

    Ok(())
}

fn run_observer() -> Result<(), Box<dyn Error>> {
    let registry = KeycodeRegistry::ansi();
    let mut tap = tap::system_tap()?;
    tap.run(&mut |event| {
        if observe::is_exit_event(event) {
            std::process::exit(1);
        }
        println!("{}\n", observe::describe(&registry, event));
        observe::decision()
    })?;
    Ok(())
}
