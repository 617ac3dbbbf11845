//! Command socket.
//!
//! External tools (key-binding helpers, scripts) connect to the socket and
//! send newline-delimited commands.

pub mod listener;
