//! i3-specific implementations.
//!
//! This module provides concrete backends for the
//! [`WindowManager`](crate::traits::WindowManager) and
//! [`MessageSource`](crate::traits::MessageSource) traits, speaking i3's
//! IPC protocol directly over its Unix socket.  Sway is protocol
//! compatible.
//!
//! Nothing outside this module should reference the wire protocol directly.

pub mod events;
pub mod ipc;
pub mod wm;
