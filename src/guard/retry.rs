use serde::Serialize;
use std::fmt;
use std::time::Duration;
use strum::{Display, IntoStaticStr};

/// Identifies one retry chain. Ids are never reused within an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChainId(u64);

impl ChainId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a chain's ticks re-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChainKind {
    /// Title/header inspection; policy is re-checked on each tick.
    Blocked,
    /// Companion-text confirmation on the admin screen.
    Protected,
}

/// A delayed re-check. A ticket is cancelled once its chain is no longer the
/// active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetryTicket {
    pub chain: ChainId,
    pub kind: ChainKind,
    pub attempt_index: usize,
    /// Delay from the start of the chain.
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy)]
struct ActiveChain {
    id: ChainId,
    remaining: usize,
}

/// At most one live chain; everything else is stale.
#[derive(Debug, Default)]
pub struct RetryTickets {
    last_id: u64,
    active: Option<ActiveChain>,
}

impl RetryTickets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a chain with one ticket per delay. Any active chain must have
    /// been cancelled first; it is superseded otherwise.
    pub fn start(&mut self, kind: ChainKind, delays: &[Duration]) -> Vec<RetryTicket> {
        if delays.is_empty() {
            self.active = None;
            return Vec::new();
        }
        self.last_id += 1;
        let id = ChainId(self.last_id);
        self.active = Some(ActiveChain {
            id,
            remaining: delays.len(),
        });
        delays
            .iter()
            .enumerate()
            .map(|(attempt_index, delay)| RetryTicket {
                chain: id,
                kind,
                attempt_index,
                delay: *delay,
            })
            .collect()
    }

    /// Cancels the active chain, returning its id.
    pub fn cancel(&mut self) -> Option<ChainId> {
        self.active.take().map(|chain| chain.id)
    }

    pub fn active(&self) -> Option<ChainId> {
        self.active.map(|chain| chain.id)
    }

    pub fn is_live(&self, ticket: &RetryTicket) -> bool {
        self.active.is_some_and(|chain| chain.id == ticket.chain)
    }

    /// Marks a live ticket as fired. Returns `true` when it was the chain's
    /// last outstanding ticket, which retires the chain.
    pub fn fired(&mut self, ticket: &RetryTicket) -> bool {
        let Some(chain) = self.active.as_mut().filter(|chain| chain.id == ticket.chain) else {
            return false;
        };
        chain.remaining = chain.remaining.saturating_sub(1);
        if chain.remaining == 0 {
            self.active = None;
            true
        } else {
            false
        }
    }
}
