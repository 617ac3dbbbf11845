//! Client commands.
//!
//! Every command reads the model synchronously and hands whatever it has to
//! send to a worker task, so a slow window manager never holds up the inbox.

use super::Manager;
use crate::command::{parse_index, Command, Resumption};
use crate::model::WorkspaceId;
use crate::notify::Notification;
use crate::numbering::quote;
use crate::traits::WindowManager;
use crate::tree::{render, Node};
use log::{debug, warn};
use std::collections::HashSet;

impl<W: WindowManager> Manager<W> {
    pub(super) fn on_command(&mut self, cmd: Command) {
        debug!("command {}", cmd);
        match cmd {
            Command::LastWindow => self.last_window(),
            Command::WorkspaceLeft => self.step_workspace(-1),
            Command::WorkspaceRight => self.step_workspace(1),
            Command::OutputWorkspace { args } => self.output_workspace(&args),
            Command::WorkspaceTree => self.workspace_tree(),
            Command::NewOutputWorkspace => self.new_output_workspace(),
        }
    }

    fn last_window(&mut self) {
        let Some(ws) = self
            .model
            .current_workspace()
            .and_then(|id| self.model.workspace(id))
        else {
            warn!("Cannot focus last window; no current workspace found");
            return;
        };
        let Some(con) = ws.last_window() else {
            warn!("Cannot focus last window; no history");
            return;
        };
        self.run_commands("last-window", vec![format!("[con_id={}] focus", con)]);
    }

    /// The current output's workspaces and the position of the current
    /// workspace among them.
    fn current_position(&self) -> Option<(Vec<WorkspaceId>, Option<usize>)> {
        let output = self.model.current_output()?;
        let ids = self.model.output(output)?.workspaces().to_vec();
        let pos = self
            .model
            .current_workspace()
            .and_then(|cur| ids.iter().position(|&id| id == cur));
        Some((ids, pos))
    }

    fn switch_to(&mut self, name: &'static str, id: WorkspaceId) {
        let Some(ws) = self.model.workspace(id) else {
            return;
        };
        let cmd = format!("workspace {}", quote(ws.name()));
        self.run_commands(name, vec![cmd]);
    }

    /// `workspace-left` (`step == -1`) and `workspace-right` (`step == 1`).
    fn step_workspace(&mut self, step: isize) {
        let name = if step < 0 {
            "workspace-left"
        } else {
            "workspace-right"
        };
        let Some((ids, Some(pos))) = self.current_position() else {
            warn!("{}: current workspace is not on the current output", name);
            return;
        };
        let next = (pos as isize + step).rem_euclid(ids.len() as isize) as usize;
        self.switch_to(name, ids[next]);
    }

    fn output_workspace(&mut self, args: &[String]) {
        let index = match parse_index(args) {
            Ok(index) => index,
            Err(e) => {
                self.notify(Notification::error("output-workspace", e.to_string()));
                return;
            }
        };
        let Some((ids, _)) = self.current_position() else {
            warn!("output-workspace: no current output");
            return;
        };
        if ids.is_empty() {
            warn!("output-workspace: current output has no workspaces");
            return;
        }
        let current = self.model.current_workspace();
        let wanted = index.checked_add(1);
        let by_digit = ids.iter().copied().find(|&id| {
            Some(id) != current
                && self
                    .model
                    .workspace(id)
                    .is_some_and(|ws| Some(ws.num().rem_euclid(10) as usize) == wanted)
        });
        let target = by_digit.unwrap_or_else(|| ids[index.min(ids.len() - 1)]);
        self.switch_to("output-workspace", target);
    }

    fn workspace_tree(&mut self) {
        let Some(workspace) = self.model.current_workspace() else {
            warn!("workspace-tree: no current workspace");
            return;
        };
        self.spawn("workspace-tree", move |b| {
            let tree = b.tree()?;
            Ok(Some(Resumption::WorkspaceTree { workspace, tree }))
        });
    }

    /// Second half of `workspace-tree`: render the workspace's subtree and
    /// show it, replacing the previous tree notification.
    pub(super) fn resume_workspace_tree(&mut self, workspace: WorkspaceId, tree: &Node) {
        let Some(name) = self.model.workspace(workspace).map(|ws| ws.name().to_string()) else {
            warn!("workspace-tree: workspace went away");
            return;
        };
        let Some(root) = tree.find_workspace_named(&name) else {
            self.notify(Notification::error(
                "Workspace tree",
                format!("Cannot find root node for workspace {}", name),
            ));
            return;
        };
        let n = Notification::new("Workspace tree", render(root))
            .replacing(self.tree_notification)
            .timeout(self.config.tree_timeout_ms);
        self.spawn("workspace-tree", move |b| {
            let id = b.notify(&n)?;
            Ok(Some(Resumption::TreeNotified(id)))
        });
    }

    fn new_output_workspace(&mut self) {
        let Some(output) = self.model.current_output().map(str::to_string) else {
            warn!("new-output-workspace: no current output");
            return;
        };
        let used: HashSet<i32> = self.model.used_numbers(&output, None).into_iter().collect();
        let band = self.config.band_for(&output);
        let num = band.first_free(&used);
        if !band.contains(num) {
            warn!("band of {} is full, using workspace {}", output, num);
        }
        self.run_commands("new-output-workspace", vec![format!("workspace {}", num)]);
    }
}
