//! Timer scheduling
//!
//! The controller never sleeps. It hands each delay to a [`LatencyTimer`]
//! and reacts to the [`TimerEvent`] when it comes back.

use super::message::TimerEvent;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error};

pub trait LatencyTimer: Send {
    /// Deliver `event` after `delay`
    fn schedule(&self, event: TimerEvent, delay: Duration);
}

/// One sleeper thread per scheduled event
pub struct ThreadTimer {
    tx: Sender<TimerEvent>,
}

impl ThreadTimer {
    pub fn new(tx: Sender<TimerEvent>) -> Self {
        Self { tx }
    }
}

impl LatencyTimer for ThreadTimer {
    fn schedule(&self, event: TimerEvent, delay: Duration) {
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("parkbot-timer".into())
            .spawn(move || {
                thread::sleep(delay);
                // Receiver gone means the controller already shut down
                if tx.send(event).is_err() {
                    debug!("Timer {:?} fired after shutdown", event);
                }
            });
        if let Err(e) = spawned {
            error!("Failed to spawn timer thread for {:?}: {}", event, e);
        }
    }
}

/// Records scheduled events; tests fire them by hand
#[derive(Clone, Default)]
pub struct ManualTimer {
    pending: Arc<Mutex<Vec<(TimerEvent, Duration)>>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduled events not yet taken, oldest first
    pub fn pending(&self) -> Vec<(TimerEvent, Duration)> {
        self.pending.lock().clone()
    }

    /// Remove and return the oldest scheduled event
    pub fn take_next(&self) -> Option<TimerEvent> {
        let mut pending = self.pending.lock();
        if pending.is_empty() {
            None
        } else {
            Some(pending.remove(0).0)
        }
    }

    /// Remove and return the oldest scheduled event matching `predicate`
    pub fn take_where<F>(&self, predicate: F) -> Option<TimerEvent>
    where
        F: Fn(&TimerEvent) -> bool,
    {
        let mut pending = self.pending.lock();
        let position = pending.iter().position(|(event, _)| predicate(event))?;
        Some(pending.remove(position).0)
    }

    /// Remove and return every scheduled event
    pub fn drain(&self) -> Vec<TimerEvent> {
        self.pending.lock().drain(..).map(|(event, _)| event).collect()
    }
}

impl LatencyTimer for ManualTimer {
    fn schedule(&self, event: TimerEvent, delay: Duration) {
        self.pending.lock().push((event, delay));
    }
}
