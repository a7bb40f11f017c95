//! Animation ticker and idle motion

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::core::events::Event;

const ROTATION_STEP: f32 = 0.0014;
const TILT_RATE: f32 = 0.0002;
const TILT_AMPLITUDE: f32 = 0.12;

/// Slow spin plus a gentle nod, applied to the ring group every frame
#[derive(Debug, Clone)]
pub struct IdleMotion {
    pub rotation_y: f32,
    pub tilt_x: f32,
    started: Instant,
}

impl IdleMotion {
    pub fn new(started: Instant) -> Self {
        Self {
            rotation_y: 0.0,
            tilt_x: 0.0,
            started,
        }
    }

    pub fn advance(&mut self, now: Instant) {
        let elapsed_ms = now.saturating_duration_since(self.started).as_secs_f32() * 1000.0;
        self.rotation_y += ROTATION_STEP;
        self.tilt_x = (elapsed_ms * TILT_RATE).sin() * TILT_AMPLITUDE;
    }
}

/// Background task that posts [`Event::Frame`] at a fixed period until stopped
pub struct FrameLoop {
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl FrameLoop {
    pub fn start(period: Duration, tx: mpsc::UnboundedSender<Event>) -> Self {
        let (shutdown, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = stop_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                if *stop_rx.borrow() {
                    break;
                }
                if tx.send(Event::Frame).is_err() {
                    break;
                }
            }
            tracing::debug!("frame loop stopped");
        });

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the task to exit. Safe to call more than once.
    pub fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        self.handle.take();
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_spins_and_nods() {
        let start = Instant::now();
        let mut motion = IdleMotion::new(start);

        motion.advance(start);
        assert!((motion.rotation_y - ROTATION_STEP).abs() < 1e-6);
        assert_eq!(motion.tilt_x, 0.0);

        motion.advance(start + Duration::from_millis(2500));
        assert!((motion.rotation_y - 2.0 * ROTATION_STEP).abs() < 1e-6);
        assert!((motion.tilt_x - 0.5f32.sin() * TILT_AMPLITUDE).abs() < 1e-4);
        assert!(motion.tilt_x.abs() <= TILT_AMPLITUDE);
    }

    #[tokio::test(start_paused = true)]
    async fn posts_frames_until_stopped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut frames = FrameLoop::start(Duration::from_millis(33), tx);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let mut received = 0;
        while let Ok(event) = rx.try_recv() {
            assert!(matches!(event, Event::Frame));
            received += 1;
        }
        assert!(received >= 3, "received {received}");

        frames.stop();
        frames.stop();
        assert!(!frames.is_running());

        tokio::time::sleep(Duration::from_millis(200)).await;
        // The task drops its sender on exit, closing the channel.
        while rx.try_recv().is_ok() {}
        assert!(rx.recv().await.is_none());
    }
}
