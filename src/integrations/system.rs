//! Local metrics source backed by `sysinfo`, for running without the HTTP backend.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, RefreshKind, System};

use super::api::{ApiError, MemoryUsage, SnapshotSummary, SystemReport, VolumeReading};
use super::MetricsSource;

const MAX_SNAPSHOTS: usize = 100;

/// Maintains a reusable `sysinfo::System` instance to avoid reallocation on every poll.
pub struct SystemMonitor {
    sys: System,
    disks: Disks,
}

impl SystemMonitor {
    pub fn new() -> Self {
        // Initial refresh gives CPU usage a baseline for the first real sample.
        let mut sys = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let disks = Disks::new_with_refreshed_list();

        Self { sys, disks }
    }

    /// Refresh and return a report shaped like the backend's `/api/system`.
    pub fn sample(&mut self) -> SystemReport {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();
        self.disks.refresh();
        if self.disks.list().is_empty() {
            self.disks.refresh_list();
        }

        let memory = usage(
            self.sys.used_memory(),
            self.sys.total_memory(),
            self.sys.available_memory(),
        );
        let swap = usage(
            self.sys.used_swap(),
            self.sys.total_swap(),
            self.sys.free_swap(),
        );

        let disks = self
            .disks
            .list()
            .iter()
            .filter(|disk| disk.total_space() > 0)
            .map(|disk| {
                let total = disk.total_space();
                let free = disk.available_space();
                let used = total.saturating_sub(free);
                VolumeReading {
                    device: disk.name().to_string_lossy().into_owned(),
                    mountpoint: disk.mount_point().display().to_string(),
                    filesystem_type: disk.file_system().to_string_lossy().into_owned(),
                    total_bytes: total,
                    used_bytes: used,
                    free,
                    percent: percent_of(used, total),
                    read_bytes: None,
                    write_bytes: None,
                }
            })
            .collect();

        SystemReport {
            timestamp: chrono::Utc::now().timestamp(),
            hostname: System::host_name().unwrap_or_else(|| "localhost".to_string()),
            platform: System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
            cpu_percent: self.sys.global_cpu_usage() as f64,
            memory,
            swap,
            boot_time: Some(System::boot_time() as i64),
            disks,
        }
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn percent_of(used: u64, total: u64) -> f64 {
    if total > 0 {
        (used as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

fn usage(used: u64, total: u64, free: u64) -> MemoryUsage {
    MemoryUsage {
        used,
        total,
        free,
        percent: percent_of(used, total),
    }
}

/// Samples this machine and keeps snapshots in memory, newest first.
pub struct LocalSource {
    monitor: Mutex<SystemMonitor>,
    history: Mutex<VecDeque<SnapshotSummary>>,
}

impl LocalSource {
    pub fn new() -> Self {
        Self {
            monitor: Mutex::new(SystemMonitor::new()),
            history: Mutex::new(VecDeque::new()),
        }
    }
}

impl Default for LocalSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsSource for LocalSource {
    fn label(&self) -> String {
        "local".to_string()
    }

    async fn system(&self) -> Result<SystemReport, ApiError> {
        Ok(self.monitor.lock().sample())
    }

    async fn snapshots(&self, limit: usize) -> Result<Vec<SnapshotSummary>, ApiError> {
        Ok(self.history.lock().iter().take(limit).cloned().collect())
    }

    async fn create_snapshot(&self) -> Result<u64, ApiError> {
        let report = self.monitor.lock().sample();
        let mut history = self.history.lock();
        let id = history.front().map(|s| s.id + 1).unwrap_or(1);

        history.push_front(SnapshotSummary {
            id,
            created_at: chrono::Utc::now().to_rfc3339(),
            hostname: Some(report.hostname),
            cpu_percent: report.cpu_percent,
            memory: report.memory,
        });
        history.truncate(MAX_SNAPSHOTS);

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_metrics_without_nan() {
        let mut monitor = SystemMonitor::new();
        let report = monitor.sample();

        assert!(
            report.cpu_percent.is_finite(),
            "CPU percent should always be finite"
        );
        assert!(report.memory.percent.is_finite());
        for disk in &report.disks {
            assert!(
                (0.0..=100.0).contains(&disk.percent),
                "disk percent out of range: {}",
                disk.percent
            );
        }
    }

    #[test]
    fn percent_of_empty_total_is_zero() {
        assert_eq!(percent_of(10, 0), 0.0);
        assert_eq!(percent_of(25, 100), 25.0);
    }

    #[tokio::test]
    async fn snapshots_are_listed_newest_first() {
        let source = LocalSource::new();
        let first = source.create_snapshot().await.unwrap();
        let second = source.create_snapshot().await.unwrap();
        assert_eq!(second, first + 1);

        let listed = source.snapshots(5).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second);

        let limited = source.snapshots(1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}
