//! UI Widgets

pub mod disk_panel;
pub mod footer;
pub mod header;
pub mod help_overlay;
pub mod metrics_panel;
pub mod ring_view;
pub mod snapshot_panel;

pub use disk_panel::DiskPanel;
pub use footer::Footer;
pub use header::Header;
pub use help_overlay::HelpOverlay;
pub use metrics_panel::MetricsPanel;
pub use ring_view::RingView;
pub use snapshot_panel::SnapshotPanel;
