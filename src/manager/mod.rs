//! The manager: owner of the model and the only code that mutates it.
//!
//! [`Manager`] is an actor.  Every input (window-manager events, client
//! commands, results of earlier work) arrives as a [`Message`] on one
//! channel and is handled to completion before the next one is looked at.
//!
//! Anything that has to wait on the window manager or the notification
//! service runs as a *task* on a worker thread.  A task never touches the
//! model: it posts a [`Resumption`] back into the inbox and the manager
//! picks up where it left off.  Between the spawn and the resumption any
//! number of other messages may be handled, so resumptions re-validate
//! what they look at.
//!
//! The handlers are split by concern:
//!
//! * [`events`] keeps the model in step with window-manager events,
//! * [`commands`] implements the client commands,
//! * [`bootstrap`] seeds the model from the initial tree.

mod bootstrap;
mod commands;
mod events;

use crate::command::{Message, Resumption};
use crate::config::Config;
use crate::model::{Model, WorkspaceId};
use crate::notify::Notification;
use crate::numbering::rename_command;
use crate::traits::{Notifier, NotifyError, WindowManager};
use crate::tree::Node;
use log::{debug, error, info, warn};
use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How long shutdown waits for in-flight tasks.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a task failed.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("window manager error: {0}")]
    WindowManager(String),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// External collaborators shared with worker tasks.
struct Backend<W> {
    wm: W,
    notifier: Arc<dyn Notifier>,
}

impl<W: WindowManager> Backend<W> {
    fn tree(&self) -> Result<Node, TaskError> {
        self.wm
            .get_tree()
            .map_err(|e| TaskError::WindowManager(e.to_string()))
    }

    fn command(&self, command: &str) -> Result<(), TaskError> {
        self.wm
            .command(command)
            .map_err(|e| TaskError::WindowManager(e.to_string()))
    }

    fn notify(&self, n: &Notification) -> Result<u32, TaskError> {
        Ok(self.notifier.notify(n)?)
    }
}

struct Task {
    name: &'static str,
    handle: JoinHandle<()>,
}

/// A rename sent to the window manager and not yet reported back.
#[derive(Debug)]
struct PendingRename {
    output: String,
    to: i32,
}

/// Tracks outputs, workspaces and focus history for one window manager.
///
/// # Typical usage
///
/// ```ignore
/// let mut manager = Manager::new(I3Wm::connect()?, notify::connect(), config);
/// let sink = manager.sender();          // hand to event/command sources
/// manager.bootstrap(&tree);
/// manager.run();                        // until Message::Shutdown
/// ```
pub struct Manager<W: WindowManager> {
    model: Model,
    config: Config,
    backend: Arc<Backend<W>>,
    tx: mpsc::Sender<Message>,
    rx: mpsc::Receiver<Message>,
    tasks: Vec<Task>,
    tree_notification: u32,
    pending: HashMap<WorkspaceId, PendingRename>,
    shutdown_hooks: Vec<Box<dyn FnOnce()>>,
}

impl<W: WindowManager> Manager<W> {
    pub fn new(wm: W, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            model: Model::new(),
            config,
            backend: Arc::new(Backend { wm, notifier }),
            tx,
            rx,
            tasks: Vec::new(),
            tree_notification: 0,
            pending: HashMap::new(),
            shutdown_hooks: Vec::new(),
        }
    }

    /// A sender into the manager's inbox.
    pub fn sender(&self) -> mpsc::Sender<Message> {
        self.tx.clone()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Run `hook` when [`Message::Shutdown`] is handled, before in-flight
    /// tasks are drained.
    pub fn on_shutdown(&mut self, hook: impl FnOnce() + 'static) {
        self.shutdown_hooks.push(Box::new(hook));
    }

    /// Handle messages until [`Message::Shutdown`], then drain tasks.
    pub fn run(mut self) {
        info!("manager running");
        while let Ok(msg) = self.rx.recv() {
            if self.handle(msg).is_break() {
                break;
            }
        }
        self.drain(DRAIN_TIMEOUT);
        info!("manager stopped");
    }

    /// Handle one message to completion.
    pub fn handle(&mut self, msg: Message) -> ControlFlow<()> {
        match msg {
            Message::Event(event) => self.on_event(event),
            Message::Command(cmd) => self.on_command(cmd),
            Message::Resume(r) => self.on_resume(r),
            Message::Shutdown => {
                info!("shutdown requested");
                for hook in self.shutdown_hooks.drain(..) {
                    hook();
                }
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn on_resume(&mut self, r: Resumption) {
        match r {
            Resumption::WindowMoved { window, tree } => self.resume_window_move(window, &tree),
            Resumption::WorkspaceTree { workspace, tree } => {
                self.resume_workspace_tree(workspace, &tree)
            }
            Resumption::TreeNotified(id) => self.tree_notification = id,
            Resumption::RenameFailed(ids) => {
                for id in ids {
                    self.pending.remove(&id);
                }
            }
        }
    }

    /// Wait up to `timeout` for in-flight tasks, still handling their
    /// resumptions.  New events and commands are dropped.
    fn drain(&mut self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        loop {
            self.tasks.retain(|t| !t.handle.is_finished());
            let idle = self.tasks.is_empty();
            // Finished tasks have already posted their resumptions.
            while let Ok(msg) = self.rx.try_recv() {
                match msg {
                    Message::Resume(r) => self.on_resume(r),
                    other => debug!("dropping {:?} during shutdown", other),
                }
            }
            if idle && self.tasks.is_empty() {
                break;
            }
            if Instant::now() >= deadline {
                let names: Vec<&str> = self.tasks.iter().map(|t| t.name).collect();
                warn!("giving up on {} task(s) at exit: {:?}", names.len(), names);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    //  Tasks

    /// Run `work` on a worker thread; its resumption, if any, is posted
    /// back to the inbox.  Failures end the task and are logged.
    fn spawn<F>(&mut self, name: &'static str, work: F)
    where
        F: FnOnce(&Backend<W>) -> Result<Option<Resumption>, TaskError> + Send + 'static,
    {
        self.tasks.retain(|t| !t.handle.is_finished());
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("task:{}", name))
            .spawn(move || match work(&backend) {
                Ok(Some(r)) => {
                    let _ = tx.send(Message::Resume(r));
                }
                Ok(None) => {}
                Err(e) => error!("{} failed: {}", name, e),
            });
        match spawned {
            Ok(handle) => self.tasks.push(Task { name, handle }),
            Err(e) => error!("cannot start {}: {}", name, e),
        }
    }

    /// Send `commands` to the window manager, in order, from one task.
    fn run_commands(&mut self, name: &'static str, commands: Vec<String>) {
        if commands.is_empty() {
            return;
        }
        self.spawn(name, move |b| {
            for c in &commands {
                b.command(c)?;
            }
            Ok(None)
        });
    }

    fn notify(&mut self, n: Notification) {
        self.spawn("notify", move |b| b.notify(&n).map(|_| None));
    }

    //  Numbering

    /// The rename command moving `id` into `output`'s band, if it is
    /// outside it and can move.
    ///
    /// Targets of renames still in flight on `output` count as taken.
    fn plan_renumber(&self, output: &str, id: WorkspaceId) -> Option<(i32, String)> {
        let ws = self.model.workspace(id)?;
        let band = self.config.band_for(output);
        if band.contains(ws.num()) {
            return None;
        }
        if self.pending.get(&id).is_some_and(|p| p.output == output) {
            debug!("workspace {} already being renumbered", ws.name());
            return None;
        }
        let mut used: HashSet<i32> = self.model.used_numbers(output, Some(id)).into_iter().collect();
        used.extend(
            self.pending
                .iter()
                .filter(|(other, p)| **other != id && p.output == output)
                .map(|(_, p)| p.to),
        );
        let to = band.renumber(ws.num(), &used);
        if to == ws.num() {
            warn!("band of {} is full, workspace {} stays as it is", output, ws.name());
            return None;
        }
        if !band.contains(to) {
            warn!(
                "band of {} is full, workspace {} spills over to {}",
                output,
                ws.name(),
                to
            );
        }
        info!("renumbering workspace {} on {} to {}", ws.name(), output, to);
        Some((to, rename_command(ws.num(), ws.name(), to)))
    }

    /// Plan a rename for `id` and mark its target as taken until the
    /// window manager reports the rename.
    fn begin_renumber(&mut self, output: &str, id: WorkspaceId) -> Option<(WorkspaceId, String)> {
        let (to, cmd) = self.plan_renumber(output, id)?;
        self.pending.insert(
            id,
            PendingRename {
                output: output.to_string(),
                to,
            },
        );
        Some((id, cmd))
    }

    /// The rename for `id` has landed (or the workspace is gone).
    fn finish_renumber(&mut self, id: WorkspaceId) {
        self.pending.remove(&id);
    }

    /// Send renames in order from one task.  Failed ones are posted back
    /// so their targets are released.
    fn spawn_renames(&mut self, renames: Vec<(WorkspaceId, String)>) {
        if renames.is_empty() {
            return;
        }
        self.spawn("renumber", move |b| {
            let mut failed = Vec::new();
            for (id, cmd) in &renames {
                if let Err(e) = b.command(cmd) {
                    error!("{:?} failed: {}", cmd, e);
                    failed.push(*id);
                }
            }
            Ok((!failed.is_empty()).then_some(Resumption::RenameFailed(failed)))
        });
    }

    /// Renumber `id` if it lies outside `output`'s band.
    ///
    /// Only the command is issued; the model changes when the window
    /// manager reports the rename.
    fn renumber_if_outside_band(&mut self, output: &str, id: WorkspaceId) {
        if let Some(rename) = self.begin_renumber(output, id) {
            self.spawn_renames(vec![rename]);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::command::Command;

    #[test]
    fn shutdown_breaks_the_loop() {
        let (mut m, _) = manager(Config::default());
        assert!(m.handle(Message::Shutdown).is_break());
        assert!(m.handle(Message::Command(Command::LastWindow)).is_continue());
    }

    #[test]
    fn run_returns_after_shutdown() {
        let (m, _) = manager(Config::default());
        let tx = m.sender();
        tx.send(Message::Command(Command::NewOutputWorkspace)).unwrap();
        tx.send(Message::Shutdown).unwrap();
        m.run();
    }

    #[test]
    fn drain_handles_pending_resumptions() {
        let (mut m, _) = manager(Config::default());
        m.spawn("probe", |_| Ok(Some(Resumption::TreeNotified(42))));
        m.drain(Duration::from_secs(2));
        assert_eq!(m.tree_notification, 42);
        assert!(m.tasks.is_empty());
    }

    #[test]
    fn failed_task_is_contained() {
        let (mut m, _) = manager(Config::default());
        m.spawn("boom", |_| Err(TaskError::WindowManager("gone".into())));
        m.settle();
        assert!(m.tasks.is_empty());
    }

    #[test]
    fn shutdown_runs_hooks_before_draining() {
        use std::cell::Cell;
        use std::rc::Rc;

        let (mut m, _) = manager(Config::default());
        let closed = Rc::new(Cell::new(false));
        let seen = closed.clone();
        m.on_shutdown(move || seen.set(true));
        m.spawn("slow", |_| {
            std::thread::sleep(Duration::from_millis(50));
            Ok(None)
        });
        assert!(m.handle(Message::Shutdown).is_break());
        assert!(closed.get());
        assert_eq!(m.tasks.len(), 1, "tasks are drained after the hooks");
        m.drain(Duration::from_secs(2));
    }

    #[test]
    fn commands_run_in_order() {
        let (mut m, _) = manager(Config::default());
        m.run_commands("test", vec!["a".into(), "b".into(), "c".into()]);
        m.settle();
        assert_eq!(m.take_commands(), vec!["a", "b", "c"]);
    }
}
