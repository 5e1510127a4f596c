//! Per-application usage statistics
//!
//! Rolls a batch of focus events up into one row per app, flags code editors,
//! and derives the coding-minute total shown on the dashboard.

use std::collections::HashMap;

use crate::types::{AppUsageStat, WindowFocusEvent};

/// Default number of apps shown in a usage breakdown
pub const DEFAULT_TOP_APPS_LIMIT: usize = 8;

/// Process names treated as code editors (lowercase, matched on base name)
const CODE_EDITORS: &[&str] = &[
    // VS Code & forks
    "code.exe",
    "code-insiders.exe",
    "cursor.exe",
    "vscodium.exe",
    "codium.exe",
    "antigravity.exe",
    // JetBrains
    "idea64.exe",
    "idea.exe",
    "goland64.exe",
    "goland.exe",
    "pycharm64.exe",
    "pycharm.exe",
    "webstorm64.exe",
    "webstorm.exe",
    "phpstorm64.exe",
    "phpstorm.exe",
    "clion64.exe",
    "clion.exe",
    "rider64.exe",
    "rider.exe",
    "datagrip64.exe",
    "datagrip.exe",
    "rubymine64.exe",
    "rubymine.exe",
    "rustrover64.exe",
    "rustrover.exe",
    "fleet.exe",
    // Microsoft
    "devenv.exe",
    // Zed
    "zed.exe",
    // Android Studio
    "studio64.exe",
    "studio.exe",
    // Others
    "sublime_text.exe",
    "notepad++.exe",
    "atom.exe",
    "vim.exe",
    "gvim.exe",
    "nvim.exe",
    "emacs.exe",
];

/// Whether `app_name` is a known code editor (case-insensitive, path-tolerant)
pub fn is_code_editor(app_name: &str) -> bool {
    let normalized = normalize_process_name(app_name);
    !normalized.is_empty() && CODE_EDITORS.contains(&normalized.as_str())
}

/// Lowercase and strip any directory prefix from a process name
fn normalize_process_name(app_name: &str) -> String {
    let lowered = app_name.trim().to_lowercase().replace('\\', "/");
    let trimmed = lowered.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}

/// One row per app, sorted by total duration (descending), then name.
pub fn compute_app_stats(events: &[WindowFocusEvent]) -> Vec<AppUsageStat> {
    let mut by_app: HashMap<&str, AppUsageStat> = HashMap::new();

    for event in events {
        let entry = by_app
            .entry(event.app_name.as_str())
            .or_insert_with(|| AppUsageStat {
                app_name: event.app_name.clone(),
                total_duration_seconds: 0.0,
                event_count: 0,
                is_code_editor: is_code_editor(&event.app_name),
            });
        entry.total_duration_seconds += event.duration_seconds;
        entry.event_count += 1;
    }

    let mut stats: Vec<AppUsageStat> = by_app.into_values().collect();
    stats.sort_by(|a, b| {
        b.total_duration_seconds
            .total_cmp(&a.total_duration_seconds)
            .then_with(|| a.app_name.cmp(&b.app_name))
    });

    log::debug!("app stats: {} apps from {} events", stats.len(), events.len());
    stats
}

/// First `limit` rows; `0` or a limit past the end keeps everything
pub fn top_app_stats(stats: &[AppUsageStat], limit: usize) -> &[AppUsageStat] {
    if limit == 0 || limit >= stats.len() {
        return stats;
    }
    &stats[..limit]
}

/// Whole minutes in `seconds`, 0 for non-positive input
pub fn seconds_to_minutes_floor(seconds: f64) -> i64 {
    if seconds <= 0.0 {
        return 0;
    }
    (seconds / 60.0).floor() as i64
}

/// Minutes spent in code editors
pub fn coding_minutes(stats: &[AppUsageStat]) -> i64 {
    stats
        .iter()
        .filter(|s| s.is_code_editor)
        .map(|s| seconds_to_minutes_floor(s.total_duration_seconds))
        .sum()
}
