use super::actions::GuardActions;
use super::engine::{GuardEffect, GuardEngine};
use super::event::ScreenEvent;
use super::retry::RetryTicket;
use crate::diagnostics::health::{self, COMPONENT_GUARD};
use crate::screen::ScreenInspector;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

/// Runs the blocking state machine as one tokio task.
///
/// Events and retry ticks are handled one at a time on that task; a retry is
/// a deadline in the pending set, not a spawned timer, so a cancelled chain
/// can never fire.
pub struct GuardService {
    engine: GuardEngine,
    inspector: Arc<dyn ScreenInspector>,
    actions: Arc<dyn GuardActions>,
}

impl GuardService {
    pub fn new(
        engine: GuardEngine,
        inspector: Arc<dyn ScreenInspector>,
        actions: Arc<dyn GuardActions>,
    ) -> Self {
        Self {
            engine,
            inspector,
            actions,
        }
    }

    pub fn spawn(self, events: mpsc::Receiver<ScreenEvent>) -> JoinHandle<GuardEngine> {
        tokio::spawn(self.run(events))
    }

    /// Processes events until the sender side closes, then hands the engine
    /// back. Retries still pending at that point are dropped.
    pub async fn run(mut self, mut events: mpsc::Receiver<ScreenEvent>) -> GuardEngine {
        let started = Instant::now();
        let mut seq = 0_u64;
        let mut pending: BTreeMap<(Instant, u64), RetryTicket> = BTreeMap::new();
        health::mark_ok(COMPONENT_GUARD);
        tracing::info!("guard event loop started");

        loop {
            let next_due = pending.keys().next().map(|(due, _)| *due);
            let effects = tokio::select! {
                maybe_event = events.recv() => {
                    let Some(event) = maybe_event else {
                        break;
                    };
                    self.engine
                        .handle_event(&event, self.inspector.as_ref(), started.elapsed())
                }
                () = sleep_until(next_due.unwrap_or_else(Instant::now)), if next_due.is_some() => {
                    let Some((_, ticket)) = pending.pop_first() else {
                        continue;
                    };
                    self.engine
                        .handle_retry(&ticket, self.inspector.as_ref(), started.elapsed())
                }
            };

            let now = Instant::now();
            for effect in effects {
                match effect {
                    GuardEffect::GoHome { .. } => self.actions.go_home(),
                    GuardEffect::Notify(notice) => {
                        self.actions.show(&notice.message, notice.duration);
                    }
                    GuardEffect::ScheduleRetry(ticket) => {
                        seq += 1;
                        pending.insert((now + ticket.delay, seq), ticket);
                    }
                    GuardEffect::CancelRetries { chain } => {
                        pending.retain(|_, ticket| ticket.chain != chain);
                    }
                }
            }
        }

        tracing::info!(dropped_retries = pending.len(), "event source closed, guard loop stopping");
        health::mark_idle(COMPONENT_GUARD);
        self.engine
    }
}
