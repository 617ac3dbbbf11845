//! Bounded per-workspace focus history.
//!
//! A [`FocusHistory`] records the container ids that received focus on a
//! workspace, most recent last.  Re-focusing a container moves it to the
//! tail instead of duplicating it, and the oldest entry is evicted once the
//! history grows past [`FocusHistory::CAPACITY`].

use std::collections::VecDeque;

/// Container id as reported by the window manager (`con_id`).
pub type ConId = i64;

/// Recency-ordered list of focused containers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusHistory {
    order: VecDeque<ConId>,
}

impl FocusHistory {
    /// Maximum number of entries kept.
    pub const CAPACITY: usize = 50;

    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `id` received focus.
    pub fn on_window_focus(&mut self, id: ConId) {
        self.on_window_close(id);
        self.order.push_back(id);
        while self.order.len() > Self::CAPACITY {
            self.order.pop_front();
        }
    }

    /// Forget `id`.  No-op when it is not in the history.
    pub fn on_window_close(&mut self, id: ConId) {
        if let Some(pos) = self.order.iter().position(|&c| c == id) {
            self.order.remove(pos);
        }
    }

    pub fn has_container(&self, id: ConId) -> bool {
        self.order.contains(&id)
    }

    /// The container focused before the current one, if there is one.
    pub fn last_window(&self) -> Option<ConId> {
        let len = self.order.len();
        if len < 2 {
            return None;
        }
        self.order.get(len - 2).copied()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = ConId> + '_ {
        self.order.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(h: &FocusHistory) -> Vec<ConId> {
        h.iter().collect()
    }

    #[test]
    fn refocus_moves_to_end() {
        let mut h = FocusHistory::new();
        h.on_window_focus(1);
        h.on_window_focus(2);
        h.on_window_focus(3);
        h.on_window_focus(1);
        assert_eq!(ids(&h), vec![2, 3, 1]);
    }

    #[test]
    fn close_removes_and_ignores_unknown() {
        let mut h = FocusHistory::new();
        h.on_window_focus(1);
        h.on_window_focus(2);
        h.on_window_close(1);
        h.on_window_close(42);
        assert_eq!(ids(&h), vec![2]);
        assert!(!h.has_container(1));
        assert!(h.has_container(2));
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut h = FocusHistory::new();
        for id in 0..(FocusHistory::CAPACITY as ConId + 10) {
            h.on_window_focus(id);
        }
        assert_eq!(h.len(), FocusHistory::CAPACITY);
        assert_eq!(h.iter().next(), Some(10));
        assert_eq!(h.iter().last(), Some(FocusHistory::CAPACITY as ConId + 9));
    }

    #[test]
    fn mixed_sequence_stays_unique_and_bounded() {
        let mut h = FocusHistory::new();
        // Deterministic pseudo-random walk over a small id space.
        let mut x: i64 = 7;
        let mut last_focused = None;
        for _ in 0..500 {
            x = (x * 31 + 11) % 97;
            let id = x % 60;
            if x % 5 == 0 {
                h.on_window_close(id);
                if last_focused == Some(id) {
                    last_focused = None;
                }
            } else {
                h.on_window_focus(id);
                last_focused = Some(id);
            }
            let all = ids(&h);
            let mut dedup = all.clone();
            dedup.sort_unstable();
            dedup.dedup();
            assert_eq!(dedup.len(), all.len());
            assert!(all.len() <= FocusHistory::CAPACITY);
            if let Some(id) = last_focused {
                assert_eq!(all.last(), Some(&id));
            }
        }
    }

    #[test]
    fn last_window_needs_two_entries() {
        let mut h = FocusHistory::new();
        assert_eq!(h.last_window(), None);
        h.on_window_focus(10);
        assert_eq!(h.last_window(), None);
        h.on_window_focus(20);
        assert_eq!(h.last_window(), Some(10));
    }
}
