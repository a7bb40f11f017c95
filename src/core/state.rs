//! Dashboard state shared between the event loop and the renderer

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::integrations::api::{SnapshotSummary, SystemReport};
use crate::ui::theme::Theme;

const CPU_HISTORY_LEN: usize = 60;

/// Top-level application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    #[default]
    Dashboard,
    Help,
}

/// Status line contents
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RefreshStatus {
    #[default]
    Idle,
    Refreshing,
    SavingSnapshot,
    Live,
    Error(String),
}

impl fmt::Display for RefreshStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Refreshing => write!(f, "refreshing"),
            Self::SavingSnapshot => write!(f, "Saving snapshot…"),
            Self::Live => write!(f, "live"),
            Self::Error(message) => write!(f, "{message}"),
        }
    }
}

/// Notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Main application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub mode: AppMode,
    pub report: Option<SystemReport>,
    pub cpu_history: VecDeque<f32>,
    pub snapshots: Vec<SnapshotSummary>,
    pub status: RefreshStatus,
    pub auto_refresh: bool,
    pub source_label: String,
    pub theme: Theme,
    pub notifications: Vec<Notification>,
    pub terminal_size: (u16, u16),
}

impl AppState {
    pub fn new(source_label: String, theme: Theme) -> Self {
        Self {
            mode: AppMode::Dashboard,
            report: None,
            cpu_history: VecDeque::with_capacity(CPU_HISTORY_LEN),
            snapshots: Vec::new(),
            status: RefreshStatus::Idle,
            auto_refresh: false,
            source_label,
            theme,
            notifications: Vec::new(),
            terminal_size: (80, 24),
        }
    }

    /// Store a fresh report and extend the CPU history with its reading.
    pub fn apply_report(&mut self, report: SystemReport) {
        self.cpu_history.push_back(report.cpu_percent as f32);
        while self.cpu_history.len() > CPU_HISTORY_LEN {
            self.cpu_history.pop_front();
        }
        self.report = Some(report);
        // A pending snapshot save owns the status line until it finishes
        if self.status != RefreshStatus::SavingSnapshot {
            self.status = RefreshStatus::Live;
        }
    }

    pub fn add_notification(&mut self, message: String, level: NotificationLevel) {
        self.notifications.push(Notification {
            message,
            level,
            created_at: chrono::Utc::now(),
            duration_ms: 5000,
        });
    }

    pub fn remove_expired_notifications(&mut self) {
        let now = chrono::Utc::now();
        self.notifications.retain(|n| {
            let elapsed = now.signed_duration_since(n.created_at).num_milliseconds() as u64;
            elapsed < n.duration_ms
        });
    }
}

/// Thread-safe state store
pub struct StateStore {
    state: Arc<RwLock<AppState>>,
}

impl StateStore {
    pub fn new(initial: AppState) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
        }
    }

    /// Atomic state mutation
    pub fn update<F, R>(&self, mutator: F) -> R
    where
        F: FnOnce(&mut AppState) -> R,
    {
        let mut state = self.state.write();
        mutator(&mut state)
    }

    /// Read current state
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, AppState> {
        self.state.read()
    }
}

impl Clone for StateStore {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    AppState::new("test".to_string(), Theme::default())
}

#[cfg(test)]
pub(crate) fn sample_report(cpu_percent: f64) -> SystemReport {
    use crate::integrations::api::MemoryUsage;

    let memory = MemoryUsage {
        used: 4 << 30,
        total: 16 << 30,
        free: 12 << 30,
        percent: 25.0,
    };
    SystemReport {
        timestamp: 1_700_000_000,
        hostname: "atlas".to_string(),
        platform: "Linux".to_string(),
        cpu_percent,
        memory: memory.clone(),
        swap: memory,
        boot_time: None,
        disks: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cpu_history_is_bounded() {
        let mut state = test_state();
        for i in 0..75 {
            state.apply_report(sample_report(i as f64));
        }
        assert_eq!(state.cpu_history.len(), CPU_HISTORY_LEN);
        assert_eq!(state.cpu_history.front().copied(), Some(15.0));
        assert_eq!(state.cpu_history.back().copied(), Some(74.0));
        assert_eq!(state.status, RefreshStatus::Live);
    }

    #[test]
    fn expired_notifications_are_dropped() {
        let mut state = test_state();
        state.add_notification("kept".to_string(), NotificationLevel::Info);
        state.add_notification("gone".to_string(), NotificationLevel::Error);
        state.notifications[1].created_at -= chrono::Duration::seconds(10);

        state.remove_expired_notifications();
        let messages: Vec<_> = state.notifications.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["kept"]);
    }

    #[test]
    fn report_does_not_hide_pending_snapshot() {
        let mut state = test_state();
        state.status = RefreshStatus::SavingSnapshot;
        state.apply_report(sample_report(10.0));
        assert_eq!(state.status, RefreshStatus::SavingSnapshot);

        state.status = RefreshStatus::Refreshing;
        state.apply_report(sample_report(11.0));
        assert_eq!(state.status, RefreshStatus::Live);
    }

    #[test]
    fn clones_share_state() {
        let store = StateStore::new(test_state());
        let view = store.clone();

        store.update(|s| s.status = RefreshStatus::Refreshing);

        assert_eq!(view.read().status.to_string(), "refreshing");
        assert_eq!(view.read().status, RefreshStatus::Refreshing);
    }
}
