//! **i3manager**: a workspace and focus-history daemon for i3 and sway.
//!
//! The daemon keeps a model of the window manager's outputs, their
//! workspaces and, per workspace, the order in which windows were focused.
//! Each output owns a band of 100 workspace numbers; workspaces that land
//! outside their output's band are renamed into it.  Clients send short
//! commands over a Unix socket (`last-window`, `workspace-left`, …) that
//! are answered from the model.
//!
//! # Architecture
//!
//! The crate is organised around three core traits:
//!
//! * [`traits::WindowManager`]: layout tree queries and commands, so the
//!   model logic is not coupled to a specific IPC client.
//! * [`traits::Notifier`]: desktop notifications.
//! * [`traits::MessageSource`]: anything that feeds the manager's inbox
//!   (window-manager events, the command socket).
//!
//! [`manager::Manager`] owns the [`model::Model`] and is its only mutator.
//! Concrete implementations live in [`i3`] (i3 IPC), [`notify`] (D-Bus
//! notifications) and [`ipc`] (Unix-socket command listener).

pub mod command;
pub mod config;
pub mod event;
pub mod history;
pub mod i3;
pub mod ipc;
pub mod logging;
pub mod manager;
pub mod model;
pub mod notify;
pub mod numbering;
pub mod traits;
pub mod tree;
