//! Incremental per-app duration tally
//!
//! Tracks cumulative focus time per app for one open segment and keeps the
//! leading app up to date on every insert, so the primary app never needs a
//! rescan of the folded events.

use std::collections::HashMap;

/// Cumulative duration per app with the current leader tracked alongside.
///
/// Apps are indexed in first-seen order; ties on duration resolve to the
/// app seen first.
#[derive(Debug, Clone, Default)]
pub struct AppDurationTally {
    index: HashMap<String, usize>,
    apps: Vec<(String, f64)>,
    leader: Option<usize>,
}

impl AppDurationTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `duration_seconds` of focus time to `app_name`
    pub fn add(&mut self, app_name: &str, duration_seconds: f64) {
        let slot = match self.index.get(app_name) {
            Some(&i) => {
                self.apps[i].1 += duration_seconds;
                i
            }
            None => {
                let i = self.apps.len();
                self.index.insert(app_name.to_string(), i);
                self.apps.push((app_name.to_string(), duration_seconds));
                i
            }
        };

        self.leader = match self.leader {
            None => Some(slot),
            Some(current) if current == slot => Some(current),
            Some(current) => {
                let candidate = self.apps[slot].1;
                let best = self.apps[current].1;
                if candidate > best || (candidate == best && slot < current) {
                    Some(slot)
                } else {
                    Some(current)
                }
            }
        };
    }

    /// App with the largest cumulative duration
    pub fn leader(&self) -> Option<&str> {
        self.leader.map(|i| self.apps[i].0.as_str())
    }

    /// Cumulative duration recorded for `app_name`
    pub fn duration_of(&self, app_name: &str) -> Option<f64> {
        self.index.get(app_name).map(|&i| self.apps[i].1)
    }

    pub fn app_count(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tally_has_no_leader() {
        let tally = AppDurationTally::new();
        assert!(tally.is_empty());
        assert_eq!(tally.leader(), None);
    }

    #[test]
    fn test_leader_follows_largest_total() {
        let mut tally = AppDurationTally::new();
        tally.add("code.exe", 30.0);
        tally.add("chrome.exe", 20.0);
        assert_eq!(tally.leader(), Some("code.exe"));

        tally.add("chrome.exe", 20.0);
        assert_eq!(tally.leader(), Some("chrome.exe"));
        assert_eq!(tally.duration_of("chrome.exe"), Some(40.0));
        assert_eq!(tally.app_count(), 2);
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let mut tally = AppDurationTally::new();
        tally.add("a", 5.0);
        tally.add("b", 10.0);
        assert_eq!(tally.leader(), Some("b"));

        // a catches up to b; a was seen first so it takes the lead
        tally.add("a", 5.0);
        assert_eq!(tally.leader(), Some("a"));
    }

    #[test]
    fn test_zero_durations_keep_first_app() {
        let mut tally = AppDurationTally::new();
        tally.add("a", 0.0);
        tally.add("b", 0.0);
        tally.add("c", 0.0);
        assert_eq!(tally.leader(), Some("a"));
        assert_eq!(tally.app_count(), 3);
    }
}
