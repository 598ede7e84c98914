//! Scheduled one-shot and repeating callbacks on the simulation clock
//!
//! Every wait in a session (countdown steps, buff expiry, zone lifetimes,
//! delayed rewards) is a timer here. Timers only advance while the session is
//! live, so pausing freezes them. Ending a run cancels all of them at once;
//! cancelling twice is a no-op.

use serde::{Deserialize, Serialize};

use super::physics::BuffKind;

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(u32);

/// What happens when a timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerEvent {
    /// One second of countdown elapsed
    CountdownStep,
    /// A timed buff ran out
    BuffExpired(BuffKind),
    /// An environmental zone reached the end of its lifetime
    ZoneExpired { zone: u32 },
    /// A danger zone's delayed reward is due
    DangerReward { zone: u32 },
}

#[derive(Debug, Clone)]
struct Scheduled {
    id: TimerId,
    due: f32,
    repeat: Option<f32>,
    event: TimerEvent,
}

/// Timer wheel keyed by simulation time
#[derive(Debug, Clone, Default)]
pub struct Timers {
    now: f32,
    next_id: u32,
    pending: Vec<Scheduled>,
}

impl Timers {
    /// Current simulation time (seconds)
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Fire `event` once after `delay` seconds
    pub fn after(&mut self, delay: f32, event: TimerEvent) -> TimerId {
        self.schedule(delay, None, event)
    }

    /// Fire `event` every `period` seconds until cancelled
    pub fn every(&mut self, period: f32, event: TimerEvent) -> TimerId {
        self.schedule(period, Some(period.max(f32::EPSILON)), event)
    }

    fn schedule(&mut self, delay: f32, repeat: Option<f32>, event: TimerEvent) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.push(Scheduled {
            id,
            due: self.now + delay.max(0.0),
            repeat,
            event,
        });
        id
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    /// Cancel every outstanding timer, returning how many were live
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|t| t.id == id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Advance the clock by `dt` and return due events in firing order
    pub fn advance(&mut self, dt: f32) -> Vec<(TimerId, TimerEvent)> {
        self.now += dt.max(0.0);
        let mut fired: Vec<(f32, TimerId, TimerEvent)> = Vec::new();

        for timer in &mut self.pending {
            while timer.due <= self.now {
                fired.push((timer.due, timer.id, timer.event));
                match timer.repeat {
                    Some(period) => timer.due += period,
                    None => break,
                }
            }
        }
        self.pending
            .retain(|t| t.repeat.is_some() || t.due > self.now);

        fired.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.0.cmp(&b.1.0))
        });
        fired.into_iter().map(|(_, id, event)| (id, event)).collect()
    }
}
