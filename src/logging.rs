//! Logger setup.
//!
//! Records go through `env_logger` as usual.  Once
//! [`forward_warnings`] has been called, records at `warn` and above are
//! also shown as desktop notifications.

use crate::notify::{Notification, APP_NAME, FORWARDER_TARGET, ICON_ERROR, ICON_WARNING};
use log::{Level, Log, Metadata, Record};
use std::sync::{mpsc, Mutex, OnceLock};

static FORWARD: OnceLock<Mutex<mpsc::Sender<Notification>>> = OnceLock::new();

struct NotifyingLogger {
    inner: env_logger::Logger,
}

impl Log for NotifyingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.inner.matches(record) {
            return;
        }
        self.inner.log(record);
        if let Some(n) = notification_for(record) {
            if let Some(tx) = FORWARD.get() {
                if let Ok(tx) = tx.lock() {
                    let _ = tx.send(n);
                }
            }
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// The notification mirroring `record`, if it should be forwarded.
fn notification_for(record: &Record) -> Option<Notification> {
    if record.target() == FORWARDER_TARGET {
        return None;
    }
    let icon = match record.level() {
        Level::Error => ICON_ERROR,
        Level::Warn => ICON_WARNING,
        _ => return None,
    };
    Some(Notification::new(APP_NAME, record.args().to_string()).icon(icon))
}

/// Install the global logger.
///
/// The default filter is `info`, or `debug` when `debug` is set;
/// `RUST_LOG` overrides both.
pub fn init(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let inner = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .build();
    let max = inner.filter();
    if log::set_boxed_logger(Box::new(NotifyingLogger { inner })).is_ok() {
        log::set_max_level(max);
    }
}

/// Start mirroring warnings and errors into `tx`.
pub fn forward_warnings(tx: mpsc::Sender<Notification>) {
    let _ = FORWARD.set(Mutex::new(tx));
}
