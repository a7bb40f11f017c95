//! Unified event handling system

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::integrations::api::ApiError;
use crate::refresh::CycleResult;

/// Everything the event loop reacts to
#[derive(Debug)]
pub enum Event {
    // Input events
    Key(KeyEvent),
    Resize(u16, u16),

    /// Animation frame from the frame loop
    Frame,
    /// Periodic trigger from the auto-refresh timer
    RefreshTick,

    // Async completion events
    CycleCompleted(CycleResult),
    SnapshotSaved(Result<u64, ApiError>),

    /// Terminal input ended
    Quit,
}

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { rx, tx }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Start the terminal input task
    pub fn spawn_sources(event_tx: mpsc::UnboundedSender<Event>) {
        tokio::spawn(Self::terminal_events(event_tx));
    }

    async fn terminal_events(tx: mpsc::UnboundedSender<Event>) {
        use crossterm::event::{self, Event as CrosstermEvent};
        use futures::StreamExt;

        let mut reader = event::EventStream::new();
        while let Some(event_result) = reader.next().await {
            let event = match event_result {
                Ok(CrosstermEvent::Key(key)) => Event::Key(key),
                Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                Err(err) => {
                    tracing::warn!("terminal input error: {err}");
                    continue;
                }
                _ => continue,
            };
            if tx.send(event).is_err() {
                return;
            }
        }

        // Input is gone, nothing can close the dashboard any more
        tracing::info!("terminal input closed");
        let _ = tx.send(Event::Quit);
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Key binding helper
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        event.code == self.key && event.modifiers == self.modifiers
    }
}

/// Standard key bindings
pub struct KeyBindings;

impl KeyBindings {
    pub fn quit() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('q'))
    }

    pub fn quit_alt() -> KeyBinding {
        KeyBinding::ctrl(KeyCode::Char('c'))
    }

    pub fn refresh() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('r'))
    }

    pub fn auto_refresh() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('a'))
    }

    pub fn snapshot() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('s'))
    }

    pub fn help() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('?'))
    }

    pub fn escape() -> KeyBinding {
        KeyBinding::new(KeyCode::Esc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_respect_modifiers() {
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);

        assert!(KeyBindings::quit_alt().matches(&ctrl_c));
        assert!(!KeyBindings::quit_alt().matches(&plain_c));
        assert!(KeyBindings::refresh().matches(&KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE)));
    }

    #[tokio::test]
    async fn handler_delivers_sent_events() {
        let mut handler = EventHandler::new();
        handler.sender().send(Event::Frame).unwrap();
        handler.sender().send(Event::Quit).unwrap();

        assert!(matches!(handler.next().await, Some(Event::Frame)));
        assert!(matches!(handler.next().await, Some(Event::Quit)));
    }
}
