//! Event sources for the interactive frame loop.
//!
//! Two tasks feed one bounded channel: a fixed-interval tick source and the
//! crossterm `EventStream` reader. The loop exits on `Quit` or when every
//! sender is gone.

use crossterm::event::{Event as CEvent, EventStream, KeyCode, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc::{self, Sender};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, trace, warn};

pub const EVENT_CHANNEL_CAP: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Tick,
    /// Terminal resized to (columns, rows).
    Resize(u16, u16),
    Quit,
}

pub fn channel() -> (Sender<AppEvent>, mpsc::Receiver<AppEvent>) {
    mpsc::channel(EVENT_CHANNEL_CAP)
}

/// Emit `Tick` every `period`. Missed ticks are skipped, not bursted.
pub fn spawn_ticks(tx: Sender<AppEvent>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            // A full channel means the loop is behind; drop this tick.
            match tx.try_send(AppEvent::Tick) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    trace!(target: "runtime.events", "tick_dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => break,
            }
        }
        debug!(target: "runtime.events", "tick_source_stopped");
    })
}

/// Translate terminal input into `AppEvent`s.
pub fn spawn_input(tx: Sender<AppEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stream = EventStream::new();
        while let Some(next) = stream.next().await {
            let event = match next {
                Ok(ev) => ev,
                Err(e) => {
                    warn!(target: "runtime.events", error = %e, "input_stream_error");
                    break;
                }
            };
            let Some(app) = translate(&event) else {
                continue;
            };
            if tx.send(app).await.is_err() {
                break;
            }
            if app == AppEvent::Quit {
                break;
            }
        }
        debug!(target: "runtime.events", "input_source_stopped");
    })
}

fn translate(event: &CEvent) -> Option<AppEvent> {
    match event {
        CEvent::Key(key) if key.kind != KeyEventKind::Release => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(AppEvent::Quit),
            _ => None,
        },
        CEvent::Resize(cols, rows) => Some(AppEvent::Resize(*cols, *rows)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};

    #[test]
    fn quit_keys_and_resize_translate() {
        let q = CEvent::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE));
        let esc = CEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        let other = CEvent::Key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE));
        assert_eq!(translate(&q), Some(AppEvent::Quit));
        assert_eq!(translate(&esc), Some(AppEvent::Quit));
        assert_eq!(translate(&other), None);
        assert_eq!(translate(&CEvent::Resize(80, 24)), Some(AppEvent::Resize(80, 24)));
    }

    #[tokio::test]
    async fn tick_source_stops_when_receiver_closes() {
        let (tx, mut rx) = channel();
        let handle = spawn_ticks(tx, Duration::from_millis(1));
        assert_eq!(rx.recv().await, Some(AppEvent::Tick));
        drop(rx);
        tokio::time::timeout(Duration::from_millis(500), handle)
            .await
            .expect("tick task did not stop")
            .unwrap();
    }
}
