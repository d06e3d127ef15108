//! The blocking state machine and its drivers.
//!
//! [`GuardEngine`] turns screen events and retry ticks into side effects.
//! [`LogicalDriver`] runs it on a logical clock; [`GuardService`] runs it as
//! a tokio task fed by an event channel. [`Replay`] feeds a JSON-lines
//! recording through the logical driver.

mod actions;
mod driver;
mod engine;
mod event;
mod notice;
mod replay;
mod retry;
mod service;

pub use actions::{ActionRecord, GuardActions, LogActions, RecordingActions};
pub use driver::{LogicalDriver, TimedEffect};
pub use engine::{GuardEffect, GuardEngine, GuardState};
pub use event::ScreenEvent;
pub use notice::{BlockKind, CooldownGate, NOTICE_DURATION, Notice};
pub use replay::{Replay, ReplayStep, parse_recording};
pub use retry::{ChainId, ChainKind, RetryTicket, RetryTickets};
pub use service::GuardService;
