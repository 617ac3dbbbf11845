//! Seeding the model from the window manager's tree at startup.

use super::Manager;
use crate::model::{WorkspaceId, INTERNAL_PREFIX};
use crate::traits::WindowManager;
use crate::tree::{Node, NodeType};
use log::{debug, info};

/// Where in the tree the walk currently is.
#[derive(Debug, Clone, Copy, Default)]
struct Context<'a> {
    output: Option<&'a str>,
    workspace: Option<WorkspaceId>,
}

#[derive(Debug, Default)]
struct Walk {
    out_of_band: Vec<(String, WorkspaceId)>,
    focus_found: bool,
}

impl<W: WindowManager> Manager<W> {
    /// Register every output, workspace and window found in `tree`.
    ///
    /// Windows are recorded as focused in tree order.  The first node the
    /// window manager reports focused sets the current output and
    /// workspace.  Workspaces outside their output's band are renamed once
    /// the walk is done.
    pub fn bootstrap(&mut self, tree: &Node) {
        let mut walk = Walk::default();
        self.visit(tree, Context::default(), &mut walk);

        let renames = walk
            .out_of_band
            .into_iter()
            .filter_map(|(output, id)| self.begin_renumber(&output, id))
            .collect();
        self.spawn_renames(renames);

        info!(
            "tracking {} workspace(s), current {:?}",
            self.model.workspace_ids().count(),
            self.model
                .current_workspace()
                .and_then(|id| self.model.workspace(id))
                .map(|ws| ws.name())
        );
    }

    fn visit<'a>(&mut self, node: &'a Node, mut ctx: Context<'a>, walk: &mut Walk) {
        match node.node_type {
            NodeType::Output if node.name().starts_with(INTERNAL_PREFIX) => {
                ctx = Context::default();
            }
            NodeType::Output => {
                self.model.get_or_create_output(node.name());
                ctx = Context {
                    output: Some(node.name()),
                    workspace: None,
                };
            }
            NodeType::Workspace if node.is_scratch_workspace() => {
                ctx.workspace = Some(self.model.scratchpad());
            }
            NodeType::Workspace if node.is_internal() => {
                ctx.workspace = None;
            }
            NodeType::Workspace => {
                let id = self.workspace_for(node);
                if let Some(output) = ctx.output {
                    self.model.attach(output, id);
                    if !self.config.band_for(output).contains(node.num()) {
                        walk.out_of_band.push((output.to_string(), id));
                    }
                }
                ctx.workspace = Some(id);
                if node.focused {
                    self.take_focus(ctx, walk);
                }
            }
            NodeType::Con if node.is_window() => {
                if let Some(ws) = ctx.workspace.and_then(|id| self.model.workspace_mut(id)) {
                    ws.on_window_focus(node.id);
                }
                if node.focused {
                    self.take_focus(ctx, walk);
                }
            }
            _ => {}
        }
        for child in node.children() {
            self.visit(child, ctx, walk);
        }
    }

    fn take_focus(&mut self, ctx: Context<'_>, walk: &mut Walk) {
        let Some(id) = ctx.workspace else {
            return;
        };
        if walk.focus_found || Some(id) == self.model.scratchpad_id() {
            return;
        }
        walk.focus_found = true;
        debug!("initial focus on {:?} of {:?}", id, ctx.output);
        self.model.set_current(ctx.output, Some(id));
    }
}
