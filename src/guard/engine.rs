use super::event::ScreenEvent;
use super::notice::{BlockKind, CooldownGate, Notice};
use super::retry::{ChainId, ChainKind, RetryTicket, RetryTickets};
use crate::config::{Config, GuardConfig};
use crate::policy::ConditionChecker;
use crate::runtime::observability::{NoopObserver, Observer, ObserverEvent};
use crate::screen::{ClassNameVerdict, Inspection, MatchReason, MatchSource, ScreenInspector, ScreenReader};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use strum::{Display, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    Idle,
    Evaluating,
    Blocking,
    RetryPending,
}

/// Side effects requested by one transition, in the order they apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum GuardEffect {
    GoHome {
        kind: BlockKind,
        reason: MatchReason,
    },
    Notify(Notice),
    ScheduleRetry(RetryTicket),
    CancelRetries { chain: ChainId },
}

/// The blocking state machine.
///
/// Each call is one transition: it takes the current state plus an event (or
/// a retry tick) and returns the side effects to perform. Time is passed in
/// as an offset on the caller's clock, which keeps the machine independent of
/// any real timer. Cooldown and retry-chain state live here, so separate
/// engines never interfere.
pub struct GuardEngine {
    reader: ScreenReader,
    policy: Arc<ConditionChecker>,
    observer: Arc<dyn Observer>,
    retry_delays: Vec<Duration>,
    content_throttle: Duration,
    notices: CooldownGate,
    tickets: RetryTickets,
    state: GuardState,
}

impl GuardEngine {
    pub fn new(reader: ScreenReader, policy: Arc<ConditionChecker>, guard: &GuardConfig) -> Self {
        Self {
            reader,
            policy,
            observer: Arc::new(NoopObserver),
            retry_delays: guard.retry_delays(),
            content_throttle: Duration::from_millis(guard.content_throttle_ms),
            notices: CooldownGate::new(Duration::from_millis(guard.notify_cooldown_ms)),
            tickets: RetryTickets::new(),
            state: GuardState::Idle,
        }
    }

    pub fn from_config(config: &Config, policy: Arc<ConditionChecker>) -> Self {
        Self::new(
            ScreenReader::new(&config.screens, &config.guard),
            policy,
            &config.guard,
        )
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn active_chain(&self) -> Option<ChainId> {
        self.tickets.active()
    }

    pub fn last_action(&self) -> Option<Duration> {
        self.notices.last_action()
    }

    pub fn policy(&self) -> &ConditionChecker {
        &self.policy
    }

    pub fn handle_event(
        &mut self,
        event: &ScreenEvent,
        inspector: &dyn ScreenInspector,
        now: Duration,
    ) -> Vec<GuardEffect> {
        let mut effects = Vec::new();
        match event {
            ScreenEvent::Navigation {
                package,
                class_name,
            } => self.on_navigation(package, class_name.as_deref(), inspector, now, &mut effects),
            ScreenEvent::ContentChanged { package } => {
                self.on_content_changed(package, inspector, now, &mut effects);
            }
        }
        effects
    }

    /// Runs one retry tick. Tickets of a cancelled chain do nothing.
    pub fn handle_retry(
        &mut self,
        ticket: &RetryTicket,
        inspector: &dyn ScreenInspector,
        now: Duration,
    ) -> Vec<GuardEffect> {
        let mut effects = Vec::new();
        if !self.tickets.is_live(ticket) {
            tracing::trace!(chain = ticket.chain.get(), attempt = ticket.attempt_index, "stale retry tick");
            return effects;
        }

        self.state = GuardState::Evaluating;
        let attempt = ticket.attempt_index + 1;

        if ticket.kind == ChainKind::Blocked && self.policy.is_allowed() {
            tracing::debug!(chain = ticket.chain.get(), attempt, "policy now allows, dropping retries");
            self.cancel_chain("policy_allows", &mut effects);
            self.state = GuardState::Idle;
            return effects;
        }

        match self.reader.current_package(inspector) {
            Ok(Some(package)) if self.reader.classifier().is_target_package(Some(&package)) => {}
            Ok(Some(package)) => {
                tracing::debug!(chain = ticket.chain.get(), attempt, package = %package, "left target package");
                self.cancel_chain("left_target", &mut effects);
                self.state = GuardState::Idle;
                return effects;
            }
            Ok(None) => {
                tracing::debug!(chain = ticket.chain.get(), attempt, "no active tree");
                self.finish_tick(ticket);
                return effects;
            }
            Err(error) => {
                tracing::debug!(chain = ticket.chain.get(), attempt, %error, "package check failed");
                self.observer.record_event(&ObserverEvent::Error {
                    component: "guard".into(),
                    message: error.to_string(),
                });
                self.finish_tick(ticket);
                return effects;
            }
        }

        let (kind, inspection) = match ticket.kind {
            ChainKind::Blocked => (BlockKind::Locked, self.reader.inspect_blocked(inspector)),
            ChainKind::Protected => (BlockKind::Protected, self.reader.inspect_protected(inspector)),
        };
        match inspection {
            Inspection::Match(reason) => {
                let chain = ticket.chain;
                self.cancel_chain("matched", &mut effects);
                self.act(kind, reason, Some(chain), now, &mut effects);
            }
            Inspection::Inconclusive => {
                tracing::debug!(chain = ticket.chain.get(), attempt, "retry inconclusive");
                self.finish_tick(ticket);
            }
        }
        effects
    }

    fn on_navigation(
        &mut self,
        package: &str,
        class_name: Option<&str>,
        inspector: &dyn ScreenInspector,
        now: Duration,
        effects: &mut Vec<GuardEffect>,
    ) {
        self.cancel_chain("navigation", effects);
        self.state = GuardState::Idle;

        let classifier = self.reader.classifier();
        if !classifier.is_target_package(Some(package)) {
            return;
        }
        let Some(class_name) = class_name else {
            return;
        };

        self.state = GuardState::Evaluating;
        match classifier.class_name_verdict(Some(class_name)) {
            ClassNameVerdict::Blocked => {
                if self.policy.is_allowed() {
                    tracing::debug!(class_name, "blocked screen opened inside the allowed window");
                    self.state = GuardState::Idle;
                } else {
                    let reason = MatchReason::new(MatchSource::ClassName, class_name);
                    self.act(BlockKind::Locked, reason, None, now, effects);
                }
            }
            ClassNameVerdict::Protected => match self.reader.inspect_protected(inspector) {
                Inspection::Match(reason) => {
                    self.act(BlockKind::Protected, reason, None, now, effects);
                }
                Inspection::Inconclusive => self.start_chain(ChainKind::Protected, effects),
            },
            ClassNameVerdict::GenericContainer => {
                if self.policy.is_allowed() {
                    self.state = GuardState::Idle;
                    return;
                }
                match self.reader.inspect_blocked(inspector) {
                    Inspection::Match(reason) => {
                        self.act(BlockKind::Locked, reason, None, now, effects);
                    }
                    Inspection::Inconclusive => self.start_chain(ChainKind::Blocked, effects),
                }
            }
            ClassNameVerdict::Other => self.state = GuardState::Idle,
        }
    }

    fn on_content_changed(
        &mut self,
        package: &str,
        inspector: &dyn ScreenInspector,
        now: Duration,
        effects: &mut Vec<GuardEffect>,
    ) {
        if !self.reader.classifier().is_target_package(Some(package)) {
            return;
        }
        if self.notices.within(now, self.content_throttle) {
            return;
        }
        if self.policy.is_allowed() {
            return;
        }

        let resting = self.state;
        self.state = GuardState::Evaluating;
        match self.reader.inspect_blocked(inspector) {
            Inspection::Match(reason) => {
                self.cancel_chain("matched", effects);
                self.act(BlockKind::Locked, reason, None, now, effects);
            }
            Inspection::Inconclusive => {
                self.state = if self.tickets.active().is_some() {
                    GuardState::RetryPending
                } else if resting == GuardState::Blocking {
                    GuardState::Blocking
                } else {
                    GuardState::Idle
                };
            }
        }
    }

    fn act(
        &mut self,
        kind: BlockKind,
        reason: MatchReason,
        chain: Option<ChainId>,
        now: Duration,
        effects: &mut Vec<GuardEffect>,
    ) {
        tracing::info!(
            kind = %kind,
            source = %reason.source,
            matched = %reason.matched,
            chain = ?chain.map(ChainId::get),
            "redirecting away from restricted screen"
        );
        self.observer.record_event(&ObserverEvent::ScreenBlocked {
            kind: kind.into(),
            source: reason.source.into(),
            chain: chain.map(ChainId::get),
        });

        effects.push(GuardEffect::GoHome { kind, reason });
        if self.notices.record(now) {
            let notice = match kind {
                BlockKind::Locked => Notice::locked(&self.policy.config()),
                BlockKind::Protected => Notice::protected(),
            };
            effects.push(GuardEffect::Notify(notice));
        }
        self.state = GuardState::Blocking;
    }

    fn start_chain(&mut self, kind: ChainKind, effects: &mut Vec<GuardEffect>) {
        let tickets = self.tickets.start(kind, &self.retry_delays);
        let Some(first) = tickets.first() else {
            self.state = GuardState::Idle;
            return;
        };
        tracing::debug!(chain = first.chain.get(), kind = %kind, ticks = tickets.len(), "screen not rendered, scheduling retries");
        self.observer.record_event(&ObserverEvent::RetryChainStarted {
            chain: first.chain.get(),
            kind: kind.into(),
            ticks: tickets.len(),
        });
        effects.extend(tickets.into_iter().map(GuardEffect::ScheduleRetry));
        self.state = GuardState::RetryPending;
    }

    fn cancel_chain(&mut self, reason: &'static str, effects: &mut Vec<GuardEffect>) {
        if let Some(chain) = self.tickets.cancel() {
            tracing::debug!(chain = chain.get(), reason, "retry chain cancelled");
            self.observer.record_event(&ObserverEvent::RetryChainCancelled {
                chain: chain.get(),
                reason,
            });
            effects.push(GuardEffect::CancelRetries { chain });
        }
    }

    fn finish_tick(&mut self, ticket: &RetryTicket) {
        if self.tickets.fired(ticket) {
            tracing::debug!(chain = ticket.chain.get(), "retry chain exhausted");
            self.state = GuardState::Idle;
        } else {
            self.state = GuardState::RetryPending;
        }
    }
}
