//! Pure timer-list model: the localStorage record shape, the bar's display
//! computation and the finish-transition diff. No `web_sys` here so the whole
//! module runs under plain `cargo test` on the host; `bar.rs` applies the
//! results to the DOM.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Storage key holding the JSON-encoded timer list, shared with the
/// timer-management page.
pub const STORAGE_KEY: &str = "timers";

/// File name of the timer-management page; the bar is suppressed there
/// because that page renders its own authoritative timer list.
pub const TIMER_PAGE: &str = "timers.html";

// --- Timer records -----------------------------------------------------------

/// One persisted countdown, as written by the timer-management page.
///
/// `running == true` implies `end_time` is set; `running == false` implies
/// `end_time` is cleared and `remaining` holds the last frozen value (0 after
/// natural completion, `total` after a reset). This crate never creates
/// records, it only reads them and rewrites individual ones on restart/stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Configured duration in whole seconds.
    #[serde(default)]
    pub total: u64,
    /// Last-known remaining seconds; 0 signals "elapsed".
    #[serde(default)]
    pub remaining: u64,
    #[serde(default)]
    pub running: bool,
    /// True once the timer has ever been started (distinguishes "never
    /// started" from "finished").
    #[serde(default)]
    pub started: bool,
    /// Absolute deadline in ms since epoch, present only while running.
    #[serde(rename = "endTime", default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    /// Fields owned by the timer-management page that we must not drop when
    /// rewriting the whole list.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TimerRecord {
    /// Display label, defaulting to "Timer" when the name is absent or empty.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(n) if !n.is_empty() => n,
            _ => "Timer",
        }
    }

    /// Seconds left until the deadline, clamped at zero. Returns the frozen
    /// `remaining` value when no deadline is set.
    pub fn remaining_seconds(&self, now_ms: f64) -> u64 {
        match self.end_time {
            Some(end) => ((end - now_ms) / 1000.0).round().max(0.0) as u64,
            None => self.remaining,
        }
    }

    fn is_running(&self) -> bool {
        self.running && self.end_time.is_some()
    }
}

/// Decode the stored list. Any parse failure (missing key handled by the
/// caller, malformed JSON, wrong shape) yields an empty list; this is the
/// single recovery point for corrupt external state.
pub fn parse_timers(raw: &str) -> Vec<TimerRecord> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Encode the full list for a whole-list rewrite of the storage key.
pub fn encode_timers(timers: &[TimerRecord]) -> serde_json::Result<String> {
    serde_json::to_string(timers)
}

/// Records that are actively counting down, in stored (insertion) order.
pub fn running_timers(timers: &[TimerRecord]) -> Vec<&TimerRecord> {
    timers.iter().filter(|t| t.is_running()).collect()
}

// --- Display computation ------------------------------------------------------

/// `MM:SS`, growing to `HH:MM:SS` once the hour component is nonzero.
pub fn format_clock(total_seconds: u64) -> String {
    let h = total_seconds / 3600;
    let m = (total_seconds % 3600) / 60;
    let s = total_seconds % 60;
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// One bar segment: display name plus formatted remaining time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarEntry {
    pub name: String,
    pub clock: String,
}

/// Display state for the bar at instant `now_ms`: one entry per running
/// timer. Empty means the bar should be hidden.
pub fn bar_entries(timers: &[TimerRecord], now_ms: f64) -> Vec<BarEntry> {
    running_timers(timers)
        .into_iter()
        .map(|t| BarEntry {
            name: t.display_name().to_string(),
            clock: format_clock(t.remaining_seconds(now_ms)),
        })
        .collect()
}

/// True when `path` points at the timer-management page.
pub fn is_timer_page(path: &str) -> bool {
    path.rsplit('/').next() == Some(TIMER_PAGE)
}

// --- Finish detection ---------------------------------------------------------

/// The fields of a record one poll remembers for the next poll's diff.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    pub name: String,
    pub running: bool,
    pub remaining: u64,
    pub total: u64,
}

/// Shallow copy of the relevant fields for the next round's comparison.
pub fn take_snapshot(timers: &[TimerRecord]) -> Vec<TimerSnapshot> {
    timers
        .iter()
        .map(|t| TimerSnapshot {
            name: t.display_name().to_string(),
            running: t.running,
            remaining: t.remaining,
            total: t.total,
        })
        .collect()
}

/// Names of timers that finished between two successive polls. Comparison is
/// positional: a transition exists at index `i` when the previous snapshot was
/// running there and the current record is stopped with zero remaining. The
/// management page is the sole writer of that transition; we only observe it.
pub fn finished_since(prev: &[TimerSnapshot], current: &[TimerRecord]) -> Vec<String> {
    prev.iter()
        .zip(current.iter())
        .filter(|(p, c)| p.running && !c.running && c.remaining == 0)
        .map(|(_, c)| c.display_name().to_string())
        .collect()
}

// --- Restart / stop mutations -------------------------------------------------

/// Locate the finished record the armed popup refers to: first match by
/// display name that is stopped with zero remaining.
fn find_finished<'a>(timers: &'a mut [TimerRecord], name: &str) -> Option<&'a mut TimerRecord> {
    timers
        .iter_mut()
        .find(|t| t.display_name() == name && !t.running && t.remaining == 0)
}

/// Restart the finished timer `name` from its full duration. Returns false
/// (list untouched) when no matching record exists.
pub fn restart_timer(timers: &mut [TimerRecord], name: &str, now_ms: f64) -> bool {
    match find_finished(timers, name) {
        Some(t) => {
            t.remaining = t.total;
            t.running = true;
            t.started = true;
            t.end_time = Some(now_ms + t.total as f64 * 1000.0);
            true
        }
        None => false,
    }
}

/// Reset the finished timer `name` to the unstarted state. Returns false
/// (list untouched) when no matching record exists.
pub fn stop_timer(timers: &mut [TimerRecord], name: &str) -> bool {
    match find_finished(timers, name) {
        Some(t) => {
            t.remaining = t.total;
            t.running = false;
            t.started = false;
            t.end_time = None;
            true
        }
        None => false,
    }
}
