//! Metrics sources feeding the dashboard

pub mod api;
pub mod system;

use anyhow::Result;
use async_trait::async_trait;

use self::api::{ApiError, SnapshotSummary, SystemReport};

/// Anything that can produce system reports and keep snapshot history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Human readable origin shown in the header
    fn label(&self) -> String;

    async fn system(&self) -> Result<SystemReport, ApiError>;

    async fn snapshots(&self, limit: usize) -> Result<Vec<SnapshotSummary>, ApiError>;

    /// Persist a snapshot of the current metrics and return its id
    async fn create_snapshot(&self) -> Result<u64, ApiError>;
}

/// Print a one-shot report to stdout
pub async fn print_status(source: &dyn MetricsSource) -> Result<()> {
    let report = source.system().await?;

    println!("\n🛰️  {} | {}", report.hostname, report.platform);
    if let Some(updated) = report.updated_at() {
        println!("   sampled {}", updated.format("%Y-%m-%d %H:%M:%S"));
    }
    println!();
    println!("  CPU   {:>5.1}%", report.cpu_percent);
    println!(
        "  MEM   {:>5.1}%  {} / {}",
        report.memory.percent,
        format_bytes(report.memory.used),
        format_bytes(report.memory.total)
    );
    println!(
        "  SWAP  {:>5.1}%  {} / {}",
        report.swap.percent,
        format_bytes(report.swap.used),
        format_bytes(report.swap.total)
    );

    println!("\n💾 Volumes:\n");
    if report.disks.is_empty() {
        println!("  No volumes found.");
    }
    for disk in &report.disks {
        println!(
            "  {:<24} {:<8} {:>5.1}%  {} / {}  ({})",
            disk.mountpoint,
            disk.filesystem_type,
            disk.percent,
            format_bytes(disk.used_bytes),
            format_bytes(disk.total_bytes),
            disk.device
        );
    }
    println!();
    Ok(())
}

/// Print the most recent snapshots to stdout
pub async fn print_snapshots(source: &dyn MetricsSource, limit: usize) -> Result<()> {
    let snapshots = source.snapshots(limit).await?;

    if snapshots.is_empty() {
        println!("No snapshots saved.");
        return Ok(());
    }

    println!("\n📸 Snapshots:\n");
    for snapshot in &snapshots {
        let when = snapshot
            .created_local()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| snapshot.created_at.clone());
        println!(
            "  #{:<5} {}  {:>5.1}% CPU  {:>5.1}% RAM",
            snapshot.id, when, snapshot.cpu_percent, snapshot.memory.percent
        );
    }
    println!();
    Ok(())
}

/// Binary-unit byte formatting used by every panel
pub fn format_bytes(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_binary_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert!(format_bytes(1536).ends_with("KiB"));
        assert!(format_bytes(3 * 1024 * 1024 * 1024).ends_with("GiB"));
    }

    #[tokio::test]
    async fn print_status_propagates_source_errors() {
        let mut source = MockMetricsSource::new();
        source
            .expect_system()
            .returning(|| Err(ApiError::Unavailable("offline".to_string())));

        let err = print_status(&source).await.unwrap_err();
        assert!(err.to_string().contains("offline"));
    }
}
