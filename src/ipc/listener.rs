//! Unix-socket [`MessageSource`] implementation.
//!
//! Binds a Unix stream socket and accepts any number of connections, each
//! read on its own thread.  Every line received is parsed as a
//! [`Command`]; nothing is ever written back.
//!
//! # Wire format
//!
//! ```text
//! last-window
//! output-workspace 3
//! ```
//!
//! Unknown commands are logged and dropped.

use crate::command::{Command, Message};
use crate::traits::MessageSource;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

/// A [`MessageSource`] that listens on a Unix stream socket for
/// line-oriented commands.
pub struct UnixSocketListener {
    path: PathBuf,
    listener: UnixListener,
    closed: Arc<AtomicBool>,
}

/// Closes a running [`UnixSocketListener`] from another thread.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    path: PathBuf,
    closed: Arc<AtomicBool>,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl UnixSocketListener {
    /// Bind the socket at `path`, replacing a stale socket file.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self, ListenerError> {
        let path = path.as_ref().to_path_buf();
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path)?;
        info!("listening on {}", path.display());
        Ok(Self {
            path,
            listener,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn handle(&self) -> ListenerHandle {
        ListenerHandle {
            path: self.path.clone(),
            closed: self.closed.clone(),
        }
    }
}

impl ListenerHandle {
    /// Stop accepting connections and remove the socket file.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // Wake the blocking accept so the loop sees the flag.
        let _ = UnixStream::connect(&self.path);
        let _ = std::fs::remove_file(&self.path);
        debug!("closed {}", self.path.display());
    }
}

/// Forward every command line read from `stream` into `sink`.
fn serve_client(stream: UnixStream, sink: mpsc::Sender<Message>) {
    debug!("client connected");
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let text = match line {
            Ok(text) => text,
            Err(e) => {
                error!("read error: {}", e);
                break;
            }
        };
        match Command::parse(&text) {
            Ok(Some(cmd)) => {
                debug!("received {}", cmd);
                if sink.send(Message::Command(cmd)).is_err() {
                    return;
                }
            }
            Ok(None) => continue,
            Err(e) => warn!("{}", e),
        }
    }
    debug!("client disconnected");
}

impl MessageSource for UnixSocketListener {
    type Error = ListenerError;

    /// Accept connections until closed through a [`ListenerHandle`].
    ///
    /// This method **blocks**.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Message>) -> Result<(), Self::Error> {
        for stream in self.listener.incoming() {
            if self.closed.load(Ordering::SeqCst) {
                break;
            }
            match stream {
                Ok(stream) => {
                    let sink = sink.clone();
                    std::thread::spawn(move || serve_client(stream, sink));
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
        info!("command listener stopped");
        Ok(())
    }
}

//  Tests
