//! Event reconciliation.
//!
//! One handler per [`Event`] variant.  All handlers but `window-move` run
//! to completion; `window-move` fetches a fresh tree on a worker task and
//! finishes in [`Manager::resume_window_move`].

use super::Manager;
use crate::command::Resumption;
use crate::event::Event;
use crate::history::ConId;
use crate::model::WorkspaceId;
use crate::traits::WindowManager;
use crate::tree::{Node, NodeType, WindowRef};
use log::{debug, info, warn};

impl<W: WindowManager> Manager<W> {
    pub(super) fn on_event(&mut self, event: Event) {
        match event {
            Event::WorkspaceInit { current } => self.on_workspace_init(&current),
            Event::WorkspaceFocus { current, old } => {
                self.on_workspace_focus(&current, old.as_ref())
            }
            Event::WorkspaceEmpty { current } => self.on_workspace_empty(&current),
            Event::WorkspaceRename { current } => self.on_workspace_rename(&current),
            Event::WorkspaceMove { current } => self.on_workspace_move(&current),
            Event::WindowFocus { container } => self.on_window_focus(&container),
            Event::WindowClose { container } => self.on_window_close(&container),
            Event::WindowMove { container } => self.on_window_move(&container),
        }
    }

    /// The workspace a tree node stands for, created if unknown.
    ///
    /// The scratch workspace maps to the scratchpad.
    pub(super) fn workspace_for(&mut self, node: &Node) -> WorkspaceId {
        if node.is_scratch_workspace() {
            return self.model.scratchpad();
        }
        let id = self.model.get_or_create_workspace(node.num(), node.name());
        self.model.set_con_id(id, node.id);
        id
    }

    /// Like [`workspace_for`](Self::workspace_for), but also attaches a
    /// workspace no output hosts yet to the output named in the node.
    fn track_workspace(&mut self, node: &Node, output: Option<&str>) -> WorkspaceId {
        let id = self.workspace_for(node);
        if node.is_scratch_workspace() || self.model.owner_of(id).is_some() {
            return id;
        }
        match output.or(node.output.as_deref()) {
            Some(output) if !output.starts_with(crate::model::INTERNAL_PREFIX) => {
                self.model.attach(output, id)
            }
            _ => debug!("workspace {} has no output", node.name()),
        }
        id
    }

    fn on_workspace_init(&mut self, current: &Node) {
        if current.is_internal() {
            return;
        }
        let Some(output) = current.output.clone() else {
            warn!("workspace {} created without an output", current.name());
            return;
        };
        let id = self.workspace_for(current);
        self.model.attach(&output, id);
        self.renumber_if_outside_band(&output, id);
    }

    fn on_workspace_focus(&mut self, current: &Node, old: Option<&Node>) {
        let id = self.track_workspace(current, None);
        self.model.set_current(current.output.as_deref(), Some(id));

        // Windows still in the scratch workspace were hidden again; they
        // belong to the scratchpad, not to the workspace they were shown on.
        if let Some(old) = old.filter(|o| o.is_scratch_workspace()) {
            let scratch = self.model.scratchpad();
            let hidden: Vec<ConId> = old.windows().iter().map(|n| n.id).collect();
            if let Some(ws) = self.model.workspace_mut(scratch) {
                ws.clear();
                for &con in &hidden {
                    ws.on_window_focus(con);
                }
            }
            if let Some(ws) = self.model.workspace_mut(id) {
                for &con in &hidden {
                    ws.on_window_close(con);
                }
            }
        }
    }

    fn on_workspace_empty(&mut self, current: &Node) {
        let Some(id) = self.model.lookup(current.num(), current.name()) else {
            debug!("empty workspace {} was not tracked", current.name());
            return;
        };
        info!("removing workspace {}", current.name());
        self.finish_renumber(id);
        self.model.remove_workspace(id);
    }

    fn on_workspace_rename(&mut self, current: &Node) {
        let Some(fallback) = self.model.current_workspace() else {
            warn!(
                "received rename but no current workspace for {}",
                current.name()
            );
            return;
        };
        let id = self.model.lookup_con(current.id).unwrap_or(fallback);
        if let Some(ws) = self.model.workspace(id) {
            info!("renaming workspace {} to {}", ws.name(), current.name());
        }
        self.model.rename(id, current.num(), current.name());
        self.model.set_con_id(id, current.id);
        self.finish_renumber(id);
        if let Some(output) = self.model.owner_of(id).map(str::to_string) {
            self.renumber_if_outside_band(&output, id);
        }
    }

    fn on_workspace_move(&mut self, current: &Node) {
        let Some(output) = current.output.clone() else {
            warn!("workspace {} moved to no output", current.name());
            return;
        };
        let id = self.workspace_for(current);
        info!("workspace {} moved to {}", current.name(), output);
        self.model.attach(&output, id);
        self.renumber_if_outside_band(&output, id);
    }

    fn on_window_focus(&mut self, container: &Node) {
        let Some(current) = self.model.current_workspace() else {
            return;
        };
        if self.model.is_scratched(container.id) || container.is_user_floating() {
            return;
        }
        if let Some(ws) = self.model.workspace_mut(current) {
            ws.on_window_focus(container.id);
        }
    }

    fn on_window_close(&mut self, container: &Node) {
        let Some(current) = self.model.current_workspace() else {
            return;
        };
        if let Some(ws) = self.model.workspace_mut(current) {
            ws.on_window_close(container.id);
        }
    }

    fn on_window_move(&mut self, container: &Node) {
        if container.node_type == NodeType::FloatingCon {
            for child in &container.nodes {
                self.model.forget_window(child.id);
            }
            return;
        }
        let subject = if container.is_window() {
            Some(container)
        } else {
            container.nodes.first().filter(|n| n.is_window())
        };
        let Some(subject) = subject else {
            return;
        };
        let window = WindowRef::of(subject);
        self.spawn("window-move", move |b| {
            let tree = b.tree()?;
            Ok(Some(Resumption::WindowMoved { window, tree }))
        });
    }

    /// Second half of `window-move`: leave the window's history entry
    /// only in the workspace the fresh tree puts it in.
    pub(super) fn resume_window_move(&mut self, window: WindowRef, tree: &Node) {
        let Some(found) = tree.find_workspace_of(&window) else {
            warn!("no workspace found for container {}", window.con_id);
            return;
        };
        let target = self.track_workspace(found.workspace, found.output);
        if self.model.confine_window(window.con_id, target) {
            debug!(
                "container {} moved to workspace {}",
                window.con_id,
                found.workspace.name()
            );
        }
    }
}
