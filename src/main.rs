//! Entry point for the **i3manager** daemon.
//!
//! Connects to the window manager, seeds the model from its tree and
//! processes events and client commands on the main thread until the
//! window manager exits or a termination signal arrives.

use i3manager::command::Message;
use i3manager::config::Config;
use i3manager::i3::events::I3EventSource;
use i3manager::i3::wm::I3Wm;
use i3manager::ipc::listener::UnixSocketListener;
use i3manager::manager::Manager;
use i3manager::traits::{MessageSource, WindowManager};
use i3manager::{logging, notify};
use log::{error, info, warn};
use signal_hook::consts::signal::{SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use std::path::PathBuf;
use std::sync::mpsc;

const USAGE: &str = "usage: i3manager [-d|--debug] [--socket <path>] [--config <path>]";

/// Command-line options.
#[derive(Debug)]
struct Args {
    debug: bool,
    socket: PathBuf,
    config: PathBuf,
}

/// Default socket path for the command listener.
fn default_socket_path() -> PathBuf {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(runtime).join("i3-manager.socket")
}

/// `$XDG_CONFIG_HOME/i3manager/config.json`.
fn default_config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("i3manager").join("config.json")
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args {
        debug: false,
        socket: default_socket_path(),
        config: default_config_path(),
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-d" | "--debug" => parsed.debug = true,
            "--socket" => {
                parsed.socket = args.next().ok_or("--socket needs a path")?.into();
            }
            "--config" => {
                parsed.config = args.next().ok_or("--config needs a path")?.into();
            }
            "-h" | "--help" => return Err(USAGE.into()),
            other => return Err(format!("unknown argument {:?}\n{}", other, USAGE)),
        }
    }
    Ok(parsed)
}

/// Try to load the config from `path`, falling back to compiled-in
/// defaults.
fn load_config(path: &std::path::Path) -> Config {
    match Config::load(path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            std::process::exit(2);
        }
    };
    logging::init(args.debug);
    run_daemon(args);
}

fn run_daemon(args: Args) {
    let config = load_config(&args.config);

    let notifier = notify::connect();
    logging::forward_warnings(notify::spawn_forwarder(notifier.clone()));

    let wm = match I3Wm::connect() {
        Ok(wm) => wm,
        Err(e) => {
            error!("failed to connect to the window manager: {}", e);
            std::process::exit(1);
        }
    };
    let events = match I3EventSource::subscribe(wm.socket()) {
        Ok(events) => events,
        Err(e) => {
            error!("failed to subscribe to window manager events: {}", e);
            std::process::exit(1);
        }
    };
    let listener = match UnixSocketListener::bind(&args.socket) {
        Ok(l) => l,
        Err(e) => {
            error!("failed to bind {}: {}", args.socket.display(), e);
            std::process::exit(1);
        }
    };
    let listener_handle = listener.handle();

    let tree = match wm.get_tree() {
        Ok(tree) => tree,
        Err(e) => {
            error!("failed to fetch the layout tree: {}", e);
            std::process::exit(1);
        }
    };

    let mut manager = Manager::new(wm, notifier, config);
    // Stop taking commands before in-flight tasks are drained.
    manager.on_shutdown(move || listener_handle.close());
    manager.bootstrap(&tree);

    spawn_event_source(events, manager.sender());
    spawn_command_listener(listener, manager.sender());
    spawn_signal_handler(manager.sender());

    manager.run();
    info!("exiting");
}

//  Helpers

/// Window-manager events.  The manager shuts down when the stream ends.
fn spawn_event_source(mut events: I3EventSource, tx: mpsc::Sender<Message>) {
    std::thread::spawn(move || {
        match events.run(tx.clone()) {
            Ok(()) => info!("window manager event stream ended"),
            Err(e) => error!("window manager event stream failed: {}", e),
        }
        let _ = tx.send(Message::Shutdown);
    });
}

fn spawn_command_listener(mut listener: UnixSocketListener, tx: mpsc::Sender<Message>) {
    std::thread::spawn(move || {
        if let Err(e) = listener.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}

/// The first termination signal shuts down gracefully, a second one exits
/// immediately.
fn spawn_signal_handler(tx: mpsc::Sender<Message>) {
    let mut signals = match Signals::new([SIGINT, SIGTERM, SIGQUIT]) {
        Ok(s) => s,
        Err(e) => {
            warn!("cannot install signal handlers: {}", e);
            return;
        }
    };
    std::thread::spawn(move || {
        let mut received = false;
        for sig in signals.forever() {
            if received {
                info!("signal {} again, exiting now", sig);
                std::process::exit(1);
            }
            received = true;
            info!("signal {}, shutting down", sig);
            let _ = tx.send(Message::Shutdown);
        }
    });
}
