//! Per-output workspace number bands.
//!
//! Every output owns the numbers `[start, start + 100)`, where `start` comes
//! from the configuration.  A workspace whose number falls outside its
//! output's band is renamed into it; the number is picked by
//! [`Band::renumber`].
//!
//! # Scan order
//!
//! 1. The *preferred* slot `start + (num mod 100) - 1`, so workspace `23`
//!    moved onto an output starting at `101` becomes `123`.  The preferred
//!    slot is skipped when it is taken or lies outside the band.
//! 2. `start, start + 1, …` skipping numbers in use.
//!
//! The linear scan has no upper bound: a full band spills into the numbers
//! of the next output.  [`Band::contains`] lets callers detect that.

use std::collections::HashSet;

/// Width of every output's number band.
pub const BAND_WIDTH: i32 = 100;

/// The range of workspace numbers reserved for one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    start: i32,
}

impl Band {
    pub fn new(start: i32) -> Self {
        Self { start }
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn contains(&self, num: i32) -> bool {
        let (start, num) = (i64::from(self.start), i64::from(num));
        start <= num && num < start + i64::from(BAND_WIDTH)
    }

    /// `start + (num mod 100) - 1`, with a non-negative modulus.  `None`
    /// when that is not a valid `i32`.
    pub fn preferred_for(&self, num: i32) -> Option<i32> {
        self.start.checked_add(num.rem_euclid(BAND_WIDTH) - 1)
    }

    /// Pick a new number for a workspace currently numbered `num`.
    pub fn renumber(&self, num: i32, used: &HashSet<i32>) -> i32 {
        match self.preferred_for(num) {
            Some(p) if self.contains(p) && !used.contains(&p) => p,
            _ => self.first_free(used),
        }
    }

    /// The lowest number `>= start` not in `used`.
    pub fn first_free(&self, used: &HashSet<i32>) -> i32 {
        (self.start..=i32::MAX)
            .find(|n| !used.contains(n))
            .unwrap_or(self.start)
    }
}

/// The part of a workspace name after its `"<num>:"` prefix.
///
/// Returns `None` for purely numeric names (`"3"`), where a rename only
/// changes the number.
pub fn name_suffix(num: i32, name: &str) -> Option<&str> {
    if name == num.to_string() {
        return None;
    }
    let prefix = format!("{}:", num);
    Some(name.strip_prefix(prefix.as_str()).unwrap_or(name))
}

/// The name a workspace takes when renumbered to `to`.
pub fn renamed(num: i32, name: &str, to: i32) -> String {
    match name_suffix(num, name) {
        Some(suffix) => format!("{}:{}", to, suffix),
        None => to.to_string(),
    }
}

/// The window-manager command renaming workspace `(num, name)` to `to`.
pub fn rename_command(num: i32, name: &str, to: i32) -> String {
    match name_suffix(num, name) {
        Some(_) => format!(
            "rename workspace {} to {}",
            quote(name),
            quote(&renamed(num, name, to))
        ),
        None => format!("rename workspace {} to {}", num, to),
    }
}

/// Quote a workspace name for use in a window-manager command.
pub fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}
