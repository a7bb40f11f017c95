//! Main application orchestrator

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::io::Stdout;
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::Config;
use crate::core::events::{Event, EventHandler, EventResult, KeyBindings};
use crate::core::state::{AppMode, AppState, NotificationLevel, RefreshStatus, StateStore};
use crate::integrations::MetricsSource;
use crate::refresh::{spawn_cycle, CycleOutcome, RefreshController, Transition};
use crate::ui::layout::LayoutManager;
use crate::ui::renderer::Renderer;
use crate::ui::theme::Theme;
use crate::ui::widgets::RingView;
use crate::viz::Visualization;

pub struct App<B: Backend> {
    terminal: Terminal<B>,
    state: StateStore,
    events: EventHandler,
    viz: Visualization,
    refresh: RefreshController,
    source: Arc<dyn MetricsSource>,
    config: Config,
}

impl App<CrosstermBackend<Stdout>> {
    pub fn new(config: Config, source: Arc<dyn MetricsSource>) -> Result<Self> {
        let backend = CrosstermBackend::new(std::io::stdout());
        let terminal = Terminal::new(backend)?;
        Self::with_terminal(terminal, config, source)
    }

    pub async fn run(&mut self) -> Result<()> {
        self.setup_terminal()?;

        EventHandler::spawn_sources(self.events.sender());

        let (width, height) = crossterm::terminal::size()?;
        self.sync_viewport(width, height);
        self.start()?;

        let result = self.event_loop().await;

        self.stop();
        self.restore_terminal()?;
        result
    }

    fn setup_terminal(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::cursor::Hide,
        )?;
        Ok(())
    }

    fn restore_terminal(&mut self) -> Result<()> {
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show,
        )?;
        Ok(())
    }
}

impl<B: Backend> App<B> {
    pub fn with_terminal(
        terminal: Terminal<B>,
        config: Config,
        source: Arc<dyn MetricsSource>,
    ) -> Result<Self> {
        let theme = Theme::from_name(&config.display.theme);
        let state = StateStore::new(AppState::new(source.label(), theme));
        let viz = Visualization::new(config.rings.clone())?;
        let refresh = RefreshController::new(config.refresh_interval());

        Ok(Self {
            terminal,
            state,
            events: EventHandler::new(),
            viz,
            refresh,
            source,
            config,
        })
    }

    /// Start animating and load the first data, honoring `refresh.auto_start`.
    fn start(&mut self) -> Result<()> {
        self.viz
            .start(self.config.frame_period(), self.events.sender());

        if self.config.refresh.auto_start {
            let transition = self.refresh.enable(&self.events.sender());
            self.auto_refresh_changed(transition);
        } else {
            self.trigger_refresh();
        }
        self.render()
    }

    fn stop(&mut self) {
        self.refresh.disable();
        self.viz.dispose();
        tracing::info!("dashboard stopped");
    }

    async fn event_loop(&mut self) -> Result<()> {
        loop {
            let Some(event) = self.events.next().await else {
                break;
            };

            match self.handle_event(event)? {
                EventResult::Continue => {}
                EventResult::Quit => break,
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<EventResult> {
        match event {
            Event::Key(key) => Ok(self.handle_key(key)),
            Event::Resize(w, h) => {
                self.sync_viewport(w, h);
                self.render()?;
                Ok(EventResult::Continue)
            }
            Event::Frame => {
                self.state.update(|s| s.remove_expired_notifications());
                self.viz.tick(Instant::now())?;
                self.render()?;
                Ok(EventResult::Continue)
            }
            Event::RefreshTick => {
                self.trigger_refresh();
                Ok(EventResult::Continue)
            }
            Event::CycleCompleted(result) => {
                let outcome = self.refresh.complete(result, &mut self.viz, &self.state)?;
                if outcome == CycleOutcome::Failed {
                    let message = self.state.read().status.to_string();
                    self.notify(message, NotificationLevel::Error);
                }
                Ok(EventResult::Continue)
            }
            Event::SnapshotSaved(result) => {
                match result {
                    Ok(id) => {
                        tracing::info!(id, "snapshot saved");
                        self.notify("Snapshot saved.".to_string(), NotificationLevel::Success);
                        self.state.update(|s| s.status = RefreshStatus::Refreshing);
                        self.trigger_refresh();
                    }
                    Err(err) => {
                        tracing::warn!("snapshot failed: {err}");
                        let message = format!("Snapshot failed: {err}");
                        self.state
                            .update(|s| s.status = RefreshStatus::Error(message.clone()));
                        self.notify(message, NotificationLevel::Error);
                    }
                }
                Ok(EventResult::Continue)
            }
            Event::Quit => Ok(EventResult::Quit),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> EventResult {
        if KeyBindings::quit().matches(&key) || KeyBindings::quit_alt().matches(&key) {
            return EventResult::Quit;
        }

        let mode = self.state.read().mode;
        match mode {
            AppMode::Help => {
                if KeyBindings::escape().matches(&key) || KeyBindings::help().matches(&key) {
                    self.state.update(|s| s.mode = AppMode::Dashboard);
                }
            }
            AppMode::Dashboard => {
                if KeyBindings::help().matches(&key) {
                    self.state.update(|s| s.mode = AppMode::Help);
                } else if KeyBindings::refresh().matches(&key) {
                    self.trigger_refresh();
                } else if KeyBindings::auto_refresh().matches(&key) {
                    let transition = self.refresh.toggle(&self.events.sender());
                    self.auto_refresh_changed(transition);
                } else if KeyBindings::snapshot().matches(&key) {
                    self.save_snapshot();
                }
            }
        }
        EventResult::Continue
    }

    /// Fetch fresh data in the background.
    fn trigger_refresh(&mut self) {
        let seq = self.refresh.begin_cycle();
        tracing::debug!(seq, "refresh triggered");
        self.state.update(|s| {
            if s.status != RefreshStatus::SavingSnapshot {
                s.status = RefreshStatus::Refreshing;
            }
        });
        spawn_cycle(
            Arc::clone(&self.source),
            seq,
            self.config.api.snapshot_limit,
            self.events.sender(),
        );
    }

    fn auto_refresh_changed(&mut self, transition: Transition) {
        let auto = self.refresh.is_auto();
        self.state.update(|s| s.auto_refresh = auto);

        match transition {
            Transition::Started => {
                self.notify("Auto refresh on".to_string(), NotificationLevel::Info);
                self.trigger_refresh();
            }
            Transition::Stopped => {
                self.notify("Auto refresh off".to_string(), NotificationLevel::Info);
            }
            Transition::Unchanged => {}
        }
    }

    fn save_snapshot(&mut self) {
        self.state.update(|s| s.status = RefreshStatus::SavingSnapshot);
        let source = Arc::clone(&self.source);
        let tx = self.events.sender();
        tokio::spawn(async move {
            let result = source.create_snapshot().await;
            let _ = tx.send(Event::SnapshotSaved(result));
        });
    }

    fn notify(&self, message: String, level: NotificationLevel) {
        self.state.update(|s| s.add_notification(message, level));
    }

    /// Size the scene to the ring panel for a terminal of `width` × `height` cells.
    fn sync_viewport(&mut self, width: u16, height: u16) {
        let layout = LayoutManager::compute(Rect::new(0, 0, width, height));
        let (pixels_x, pixels_y) = RingView::viewport_for(layout.ring_view);
        self.viz.resize(pixels_x, pixels_y);
        self.state.update(|s| s.terminal_size = (width, height));
    }

    fn render(&mut self) -> Result<()> {
        let state = self.state.read();
        let scene = self.viz.framebuffer();
        self.terminal
            .draw(|frame| Renderer::render(frame, &state, scene))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::sample_report;
    use crate::integrations::api::ApiError;
    use crate::integrations::MockMetricsSource;
    use crate::refresh::CycleResult;
    use crate::viz::rings::{reading, RingConfig};
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::backend::TestBackend;

    fn config() -> Config {
        Config {
            rings: RingConfig {
                tubular_segments: 32,
                radial_segments: 4,
                ..RingConfig::default()
            },
            ..Config::default()
        }
    }

    fn healthy_source(volumes: usize) -> MockMetricsSource {
        let mut source = MockMetricsSource::new();
        source.expect_label().returning(|| "mock".to_string());
        source.expect_system().returning(move || {
            let mut report = sample_report(30.0);
            report.disks = (0..volumes).map(|i| reading(10.0 + i as f64 * 20.0)).collect();
            Ok(report)
        });
        source.expect_snapshots().returning(|_| Ok(Vec::new()));
        source
    }

    fn app(source: MockMetricsSource) -> App<TestBackend> {
        let terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let mut app = App::with_terminal(terminal, config(), Arc::new(source)).unwrap();
        app.sync_viewport(120, 40);
        app
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    /// Feed the next posted event back into the app.
    async fn pump(app: &mut App<TestBackend>) -> EventResult {
        let event = app.events.next().await.unwrap();
        app.handle_event(event).unwrap()
    }

    #[tokio::test]
    async fn manual_refresh_builds_rings() {
        let mut app = app(healthy_source(3));

        app.handle_event(key('r')).unwrap();
        assert_eq!(app.state.read().status, RefreshStatus::Refreshing);
        pump(&mut app).await;

        assert_eq!(app.viz.scene().ring_mesh_count(), 9);
        assert_eq!(app.state.read().status, RefreshStatus::Live);

        app.handle_event(Event::Frame).unwrap();
        assert!(app.viz.framebuffer().covered() > 0);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_rings() {
        let mut app = app(healthy_source(2));
        app.handle_event(key('r')).unwrap();
        pump(&mut app).await;

        let failed = CycleResult {
            seq: app.refresh.begin_cycle(),
            system: Err(ApiError::Unavailable("backend offline".to_string())),
            snapshots: Ok(Vec::new()),
        };
        app.handle_event(Event::CycleCompleted(failed)).unwrap();

        assert_eq!(app.viz.scene().ring_mesh_count(), 6);
        let state = app.state.read();
        assert_eq!(state.status, RefreshStatus::Error("backend offline".to_string()));
        assert_eq!(state.notifications.len(), 1);
    }

    #[tokio::test]
    async fn auto_refresh_toggles_with_key() {
        let mut app = app(healthy_source(1));

        app.handle_event(key('a')).unwrap();
        assert!(app.refresh.is_auto());
        assert!(app.state.read().auto_refresh);
        pump(&mut app).await;
        assert_eq!(app.viz.scene().ring_mesh_count(), 3);

        app.handle_event(key('a')).unwrap();
        assert!(!app.refresh.is_auto());
        assert!(!app.state.read().auto_refresh);
    }

    #[tokio::test]
    async fn snapshot_then_refresh() {
        let mut source = healthy_source(1);
        source.expect_create_snapshot().times(1).returning(|| Ok(9));
        let mut app = app(source);

        app.handle_event(key('s')).unwrap();
        assert_eq!(app.state.read().status, RefreshStatus::SavingSnapshot);

        pump(&mut app).await; // SnapshotSaved
        assert_eq!(app.state.read().notifications[0].message, "Snapshot saved.");
        pump(&mut app).await; // CycleCompleted
        assert_eq!(app.state.read().status, RefreshStatus::Live);
    }

    #[tokio::test]
    async fn refresh_during_snapshot_keeps_saving_status() {
        let mut source = healthy_source(1);
        source.expect_create_snapshot().times(1).returning(|| Ok(3));
        let mut app = app(source);

        app.handle_event(key('s')).unwrap();
        let tick = CycleResult {
            seq: app.refresh.begin_cycle(),
            system: Ok(sample_report(50.0)),
            snapshots: Ok(Vec::new()),
        };
        app.handle_event(Event::CycleCompleted(tick)).unwrap();
        assert_eq!(app.state.read().status, RefreshStatus::SavingSnapshot);
        assert!(app.state.read().report.is_some());

        pump(&mut app).await; // SnapshotSaved
        assert_eq!(app.state.read().status, RefreshStatus::Refreshing);
        pump(&mut app).await; // CycleCompleted
        assert_eq!(app.state.read().status, RefreshStatus::Live);
    }

    #[tokio::test]
    async fn help_and_quit_keys() {
        let mut app = app(healthy_source(0));

        app.handle_event(key('?')).unwrap();
        assert_eq!(app.state.read().mode, AppMode::Help);
        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)))
            .unwrap();
        assert_eq!(app.state.read().mode, AppMode::Dashboard);

        assert_eq!(app.handle_event(key('q')).unwrap(), EventResult::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.handle_event(Event::Key(ctrl_c)).unwrap(), EventResult::Quit);
        assert_eq!(app.handle_event(Event::Quit).unwrap(), EventResult::Quit);
    }

    #[tokio::test]
    async fn resize_follows_ring_panel() {
        let mut app = app(healthy_source(0));
        app.handle_event(Event::Resize(100, 30)).unwrap();

        let layout = LayoutManager::compute(Rect::new(0, 0, 100, 30));
        let expected = RingView::viewport_for(layout.ring_view);
        let fb = app.viz.framebuffer();
        assert_eq!((fb.width(), fb.height()), expected);
        assert_eq!(app.state.read().terminal_size, (100, 30));
    }

    #[tokio::test]
    async fn stop_disposes_everything() {
        let mut app = app(healthy_source(1));
        app.start().unwrap();
        pump(&mut app).await;

        app.stop();
        assert!(!app.refresh.is_auto());
        assert!(app.viz.scene().is_disposed());
        assert_eq!(app.viz.scene().live_resources(), (0, 0));
    }
}
