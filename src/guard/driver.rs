use super::actions::GuardActions;
use super::engine::{GuardEffect, GuardEngine};
use super::event::ScreenEvent;
use super::retry::RetryTicket;
use crate::screen::ScreenInspector;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// An effect together with the logical time it was produced at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedEffect {
    pub at: Duration,
    pub effect: GuardEffect,
}

/// Drives a [`GuardEngine`] on a logical clock.
///
/// Retry tickets wait in an ordered pending set keyed by due time; nothing
/// fires until the clock is advanced past it. Used by `replay` and by tests.
pub struct LogicalDriver {
    engine: GuardEngine,
    inspector: Arc<dyn ScreenInspector>,
    actions: Arc<dyn GuardActions>,
    now: Duration,
    seq: u64,
    pending: BTreeMap<(Duration, u64), RetryTicket>,
}

impl LogicalDriver {
    pub fn new(
        engine: GuardEngine,
        inspector: Arc<dyn ScreenInspector>,
        actions: Arc<dyn GuardActions>,
    ) -> Self {
        Self {
            engine,
            inspector,
            actions,
            now: Duration::ZERO,
            seq: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn engine(&self) -> &GuardEngine {
        &self.engine
    }

    pub fn pending_retries(&self) -> usize {
        self.pending.len()
    }

    /// Delivers an event at the current time.
    pub fn dispatch(&mut self, event: &ScreenEvent) -> Vec<TimedEffect> {
        let effects = self
            .engine
            .handle_event(event, self.inspector.as_ref(), self.now);
        self.apply(effects)
    }

    /// Fires every retry due at or before `target`, in order, then moves the
    /// clock to `target`. The clock never moves backwards.
    pub fn advance_to(&mut self, target: Duration) -> Vec<TimedEffect> {
        let mut produced = Vec::new();
        while let Some(entry) = self.pending.first_entry() {
            let (due, _) = *entry.key();
            if due > target {
                break;
            }
            let ticket = entry.remove();
            self.now = self.now.max(due);
            let effects = self
                .engine
                .handle_retry(&ticket, self.inspector.as_ref(), self.now);
            produced.extend(self.apply(effects));
        }
        self.now = self.now.max(target);
        produced
    }

    pub fn advance_by(&mut self, delta: Duration) -> Vec<TimedEffect> {
        self.advance_to(self.now + delta)
    }

    /// Fires every pending retry.
    pub fn run_until_idle(&mut self) -> Vec<TimedEffect> {
        let mut produced = Vec::new();
        while let Some((due, _)) = self.pending.last_key_value().map(|(key, _)| *key) {
            produced.extend(self.advance_to(due));
        }
        produced
    }

    fn apply(&mut self, effects: Vec<GuardEffect>) -> Vec<TimedEffect> {
        for effect in &effects {
            match effect {
                GuardEffect::GoHome { .. } => self.actions.go_home(),
                GuardEffect::Notify(notice) => self.actions.show(&notice.message, notice.duration),
                GuardEffect::ScheduleRetry(ticket) => {
                    self.seq += 1;
                    self.pending.insert((self.now + ticket.delay, self.seq), *ticket);
                }
                GuardEffect::CancelRetries { chain } => {
                    self.pending.retain(|_, ticket| ticket.chain != *chain);
                }
            }
        }
        effects
            .into_iter()
            .map(|effect| TimedEffect {
                at: self.now,
                effect,
            })
            .collect()
    }
}
