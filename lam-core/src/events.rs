//! Named-event publish/subscribe.
//!
//! Handlers are isolated from each other: a handler that returns an error or
//! panics is reported to the error hooks and the remaining handlers still run.
use log::{debug, error};
use serde::Serialize;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::controllers::ranking::LocalRecord;
use crate::controllers::upload::UploadKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EventKind {
    AppInitialized,
    AppReady,
    SinnerSelected,
    PersonaSelected,
    TimerStart,
    TimerTick,
    TimerStop,
    TimerReset,
    RecordSubmitted,
    LocalRecordSaved,
    RankingUpdated,
    SinnerFilterChanged,
    PersonaFilterChanged,
    Error,
}

impl EventKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AppInitialized => "app:initialized",
            Self::AppReady => "app:ready",
            Self::SinnerSelected => "sinner:selected",
            Self::PersonaSelected => "persona:selected",
            Self::TimerStart => "timer:start",
            Self::TimerTick => "timer:tick",
            Self::TimerStop => "timer:stop",
            Self::TimerReset => "timer:reset",
            Self::RecordSubmitted => "record:submitted",
            Self::LocalRecordSaved => "record:local-saved",
            Self::RankingUpdated => "ranking:updated",
            Self::SinnerFilterChanged => "filter:sinner-changed",
            Self::PersonaFilterChanged => "filter:persona-changed",
            Self::Error => "error",
        }
    }
}

/// An event together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    AppInitialized,
    AppReady,
    SinnerSelected { sinner_id: u8 },
    PersonaSelected { sinner_id: u8, persona: String },
    TimerStart,
    TimerTick { seconds: u64, display: String },
    TimerStop { total_seconds: u64, display: String },
    TimerReset,
    RecordSubmitted { kind: UploadKind },
    LocalRecordSaved(LocalRecord),
    RankingUpdated { count: usize },
    SinnerFilterChanged { enabled_count: usize },
    PersonaFilterChanged { filter_count: usize },
    Error { message: String },
}

impl GameEvent {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::AppInitialized => EventKind::AppInitialized,
            Self::AppReady => EventKind::AppReady,
            Self::SinnerSelected { .. } => EventKind::SinnerSelected,
            Self::PersonaSelected { .. } => EventKind::PersonaSelected,
            Self::TimerStart => EventKind::TimerStart,
            Self::TimerTick { .. } => EventKind::TimerTick,
            Self::TimerStop { .. } => EventKind::TimerStop,
            Self::TimerReset => EventKind::TimerReset,
            Self::RecordSubmitted { .. } => EventKind::RecordSubmitted,
            Self::LocalRecordSaved(_) => EventKind::LocalRecordSaved,
            Self::RankingUpdated { .. } => EventKind::RankingUpdated,
            Self::SinnerFilterChanged { .. } => EventKind::SinnerFilterChanged,
            Self::PersonaFilterChanged { .. } => EventKind::PersonaFilterChanged,
            Self::Error { .. } => EventKind::Error,
        }
    }
}

pub type HandlerResult = anyhow::Result<()>;
type Handler = Box<dyn FnMut(&GameEvent) -> HandlerResult>;
type ErrorHook = Box<dyn FnMut(&HandlerFailure)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// What an error hook receives when a handler fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub event: &'static str,
    pub subscription: SubscriptionId,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStats {
    pub emitted: BTreeMap<&'static str, u64>,
    pub handler_failures: u64,
    pub subscriptions: usize,
}

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    handler: Handler,
}

#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    error_hooks: Vec<ErrorHook>,
    next_id: u64,
    debug: bool,
    stats: EventStats,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) -> HandlerResult + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.push(Subscription {
            id,
            kind,
            handler: Box::new(handler),
        });
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn on_error<F>(&mut self, hook: F)
    where
        F: FnMut(&HandlerFailure) + 'static,
    {
        self.error_hooks.push(Box::new(hook));
    }

    /// Deliver `event` to every handler subscribed to its kind, in subscription
    /// order. Returns how many handlers completed successfully.
    pub fn emit(&mut self, event: &GameEvent) -> usize {
        let name = event.kind().name();
        *self.stats.emitted.entry(name).or_default() += 1;
        if self.debug {
            debug!("[EventBus] emit {name}: {event:?}");
        }

        let mut delivered = 0;
        let mut failures = Vec::new();
        for sub in self
            .subscriptions
            .iter_mut()
            .filter(|s| s.kind == event.kind())
        {
            let outcome = catch_unwind(AssertUnwindSafe(|| (sub.handler)(event)));
            let message = match outcome {
                Ok(Ok(())) => {
                    delivered += 1;
                    continue;
                }
                Ok(Err(err)) => format!("{err:#}"),
                Err(panic) => panic_message(panic.as_ref()),
            };
            failures.push(HandlerFailure {
                event: name,
                subscription: sub.id,
                message,
            });
        }

        for failure in &failures {
            error!("[EventBus] handler for {} failed: {}", failure.event, failure.message);
            self.stats.handler_failures += 1;
            for hook in &mut self.error_hooks {
                hook(failure);
            }
        }
        delivered
    }

    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscriptions.iter().filter(|s| s.kind == kind).count()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    pub const fn enable_debug(&mut self) {
        self.debug = true;
    }

    pub const fn disable_debug(&mut self) {
        self.debug = false;
    }

    #[must_use]
    pub fn stats(&self) -> EventStats {
        EventStats {
            subscriptions: self.subscriptions.len(),
            ..self.stats.clone()
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}
