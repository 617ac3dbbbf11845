//! Desktop notifications.
//!
//! [`DbusNotifier`] talks to `org.freedesktop.Notifications` on the session
//! bus (feature `notify-dbus`).  [`LogNotifier`] is the fallback when the
//! feature is off or no bus is reachable: it only logs.
//!
//! [`spawn_forwarder`] runs a notifier on its own thread behind a channel,
//! for callers that must never block on the bus (the logger).

use crate::traits::{Notifier, NotifyError};
use log::info;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{mpsc, Arc};

/// Application name shown by the notification daemon.
pub const APP_NAME: &str = "i3manager";

pub const ICON_ERROR: &str = "dialog-error";
pub const ICON_WARNING: &str = "dialog-warning";

/// Default visibility timeout (ms).
pub const DEFAULT_TIMEOUT_MS: i32 = 5000;

/// One notification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub summary: String,
    pub body: String,
    pub icon: String,
    /// Id of a previous notification to replace, `0` for a new one.
    pub replaces_id: u32,
    pub timeout_ms: i32,
}

impl Notification {
    pub fn new(summary: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            body: body.into(),
            icon: String::new(),
            replaces_id: 0,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn error(summary: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(summary, body).icon(ICON_ERROR)
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = icon.to_string();
        self
    }

    pub fn replacing(mut self, id: u32) -> Self {
        self.replaces_id = id;
        self
    }

    pub fn timeout(mut self, ms: i32) -> Self {
        self.timeout_ms = ms;
        self
    }
}

//  Log-only notifier

/// A [`Notifier`] that writes notifications to the log.
#[derive(Debug, Default)]
pub struct LogNotifier {
    next_id: AtomicU32,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, n: &Notification) -> Result<u32, NotifyError> {
        info!("{}: {}", n.summary, n.body);
        let id = if n.replaces_id != 0 {
            n.replaces_id
        } else {
            self.next_id.fetch_add(1, Ordering::Relaxed) + 1
        };
        Ok(id)
    }
}

//  D-Bus notifier

#[cfg(feature = "notify-dbus")]
pub use dbus::DbusNotifier;

#[cfg(feature = "notify-dbus")]
mod dbus {
    use super::{Notification, APP_NAME};
    use crate::traits::{Notifier, NotifyError};
    use std::collections::HashMap;
    use zbus::blocking::Connection;
    use zbus::zvariant::Value;

    const DESTINATION: &str = "org.freedesktop.Notifications";
    const PATH: &str = "/org/freedesktop/Notifications";
    const INTERFACE: &str = "org.freedesktop.Notifications";

    /// Notifier backed by the freedesktop notification service.
    pub struct DbusNotifier {
        connection: Connection,
    }

    impl DbusNotifier {
        /// Connect to the session bus.
        pub fn connect() -> Result<Self, NotifyError> {
            let connection =
                Connection::session().map_err(|e| NotifyError(format!("session bus: {}", e)))?;
            Ok(Self { connection })
        }
    }

    impl Notifier for DbusNotifier {
        fn notify(&self, n: &Notification) -> Result<u32, NotifyError> {
            let actions: Vec<&str> = Vec::new();
            let hints: HashMap<&str, Value<'_>> = HashMap::new();
            let reply = self
                .connection
                .call_method(
                    Some(DESTINATION),
                    PATH,
                    Some(INTERFACE),
                    "Notify",
                    &(
                        APP_NAME,
                        n.replaces_id,
                        n.icon.as_str(),
                        n.summary.as_str(),
                        n.body.as_str(),
                        actions,
                        hints,
                        n.timeout_ms,
                    ),
                )
                .map_err(|e| NotifyError(format!("Notify: {}", e)))?;
            reply
                .body::<u32>()
                .map_err(|e| NotifyError(format!("Notify reply: {}", e)))
        }
    }
}

/// Connect to the best available notifier.
pub fn connect() -> Arc<dyn Notifier> {
    #[cfg(feature = "notify-dbus")]
    {
        match DbusNotifier::connect() {
            Ok(n) => return Arc::new(n),
            Err(e) => info!("{}, notifications go to the log", e),
        }
    }
    Arc::new(LogNotifier::new())
}

/// Log target of the forwarder thread.  The logger must not forward
/// records carrying it, or a failing bus would feed itself.
pub const FORWARDER_TARGET: &str = "i3manager::notify::forwarder";

/// Run `notifier` on a background thread fed by the returned channel.
///
/// The thread exits when every sender is dropped.
pub fn spawn_forwarder(notifier: Arc<dyn Notifier>) -> mpsc::Sender<Notification> {
    let (tx, rx) = mpsc::channel::<Notification>();
    std::thread::spawn(move || {
        for n in rx {
            if let Err(e) = notifier.notify(&n) {
                log::error!(target: FORWARDER_TARGET, "{}", e);
            }
        }
    });
    tx
}
