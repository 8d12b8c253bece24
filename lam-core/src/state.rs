//! Application state tree with change notification.
//!
//! All session state lives in one [`AppState`]. Mutations go through setters
//! that notify subscribers of the touched [`StateKey`], then the wildcard
//! subscribers. Only the local record list outlives a session.
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::controllers::ranking::LocalRecord;
use crate::record::RankingRecord;
use crate::sinners::Sinner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StateKey {
    Initialized,
    Sinner,
    Persona,
    Timer,
    SinnerFilters,
    PersonaFilters,
    LocalRecords,
    GlobalRecords,
}

impl StateKey {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Initialized => "app.isInitialized",
            Self::Sinner => "selection.sinner",
            Self::Persona => "selection.persona",
            Self::Timer => "timer",
            Self::SinnerFilters => "filters.sinners",
            Self::PersonaFilters => "filters.personas",
            Self::LocalRecords => "ranking.localRecords",
            Self::GlobalRecords => "ranking.globalRecords",
        }
    }
}

/// A persona picked in the selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonaChoice {
    /// Index of the persona within its sinner's list.
    pub index: u32,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimerState {
    pub is_running: bool,
    pub elapsed_seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filters {
    pub sinners: BTreeSet<u8>,
    /// Enabled persona indices per sinner. A sinner without an entry has all personas enabled.
    pub personas: BTreeMap<u8, BTreeSet<u32>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub is_initialized: bool,
    pub sinner: Option<Sinner>,
    pub persona: Option<PersonaChoice>,
    pub timer: TimerState,
    pub filters: Filters,
    pub local_records: Vec<LocalRecord>,
    pub global_records: Vec<RankingRecord>,
}

type Listener = Box<dyn FnMut(StateKey, &Snapshot)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateStats {
    pub mutations: u64,
    pub listeners: usize,
}

#[derive(Default)]
pub struct AppState {
    data: Snapshot,
    listeners: Vec<(ListenerId, Option<StateKey>, Listener)>,
    next_id: u64,
    mutations: u64,
}

impl AppState {
    /// Fresh state with every sinner enabled in the filters.
    #[must_use]
    pub fn new() -> Self {
        let mut state = Self::default();
        state.data.filters.sinners = crate::sinners::all_sinner_ids().into_iter().collect();
        state
    }

    #[must_use]
    pub const fn snapshot(&self) -> &Snapshot {
        &self.data
    }

    /// Listen for changes to one key.
    pub fn subscribe<F>(&mut self, key: StateKey, listener: F) -> ListenerId
    where
        F: FnMut(StateKey, &Snapshot) + 'static,
    {
        self.add_listener(Some(key), Box::new(listener))
    }

    /// Listen for every change.
    pub fn subscribe_all<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(StateKey, &Snapshot) + 'static,
    {
        self.add_listener(None, Box::new(listener))
    }

    fn add_listener(&mut self, key: Option<StateKey>, listener: Listener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, key, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _, _)| *lid != id);
        before != self.listeners.len()
    }

    fn notify(&mut self, key: StateKey) {
        self.mutations += 1;
        debug!("[AppState] {} changed", key.path());
        let data = &self.data;
        // Keyed listeners first, then wildcards.
        for (_, _, listener) in self.listeners.iter_mut().filter(|(_, k, _)| *k == Some(key)) {
            listener(key, data);
        }
        for (_, _, listener) in self.listeners.iter_mut().filter(|(_, k, _)| k.is_none()) {
            listener(key, data);
        }
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.data.is_initialized
    }

    pub fn set_initialized(&mut self, value: bool) {
        self.data.is_initialized = value;
        self.notify(StateKey::Initialized);
    }

    #[must_use]
    pub const fn sinner(&self) -> Option<&Sinner> {
        self.data.sinner.as_ref()
    }

    pub fn set_sinner(&mut self, sinner: Option<Sinner>) {
        self.data.sinner = sinner;
        self.notify(StateKey::Sinner);
    }

    #[must_use]
    pub const fn persona(&self) -> Option<&PersonaChoice> {
        self.data.persona.as_ref()
    }

    pub fn set_persona(&mut self, persona: Option<PersonaChoice>) {
        self.data.persona = persona;
        self.notify(StateKey::Persona);
    }

    #[must_use]
    pub const fn timer(&self) -> TimerState {
        self.data.timer
    }

    #[must_use]
    pub const fn elapsed_seconds(&self) -> u64 {
        self.data.timer.elapsed_seconds
    }

    pub fn set_elapsed_seconds(&mut self, seconds: u64) {
        self.data.timer.elapsed_seconds = seconds;
        self.notify(StateKey::Timer);
    }

    pub fn start_timer(&mut self) {
        self.data.timer.is_running = true;
        self.notify(StateKey::Timer);
    }

    pub fn stop_timer(&mut self) {
        self.data.timer.is_running = false;
        self.notify(StateKey::Timer);
    }

    pub fn reset_timer(&mut self) {
        self.data.timer = TimerState::default();
        self.notify(StateKey::Timer);
    }

    #[must_use]
    pub const fn sinner_filters(&self) -> &BTreeSet<u8> {
        &self.data.filters.sinners
    }

    pub fn set_sinner_filters(&mut self, ids: BTreeSet<u8>) {
        self.data.filters.sinners = ids;
        self.notify(StateKey::SinnerFilters);
    }

    #[must_use]
    pub fn is_sinner_enabled(&self, id: u8) -> bool {
        self.data.filters.sinners.contains(&id)
    }

    #[must_use]
    pub const fn persona_filters(&self) -> &BTreeMap<u8, BTreeSet<u32>> {
        &self.data.filters.personas
    }

    pub fn set_persona_filters(&mut self, filters: BTreeMap<u8, BTreeSet<u32>>) {
        self.data.filters.personas = filters;
        self.notify(StateKey::PersonaFilters);
    }

    #[must_use]
    pub fn local_records(&self) -> &[LocalRecord] {
        &self.data.local_records
    }

    pub fn set_local_records(&mut self, records: Vec<LocalRecord>) {
        self.data.local_records = records;
        self.notify(StateKey::LocalRecords);
    }

    pub fn add_local_record(&mut self, record: LocalRecord) {
        self.data.local_records.push(record);
        self.notify(StateKey::LocalRecords);
    }

    #[must_use]
    pub fn global_records(&self) -> &[RankingRecord] {
        &self.data.global_records
    }

    pub fn set_global_records(&mut self, records: Vec<RankingRecord>) {
        self.data.global_records = records;
        self.notify(StateKey::GlobalRecords);
    }

    #[must_use]
    pub fn stats(&self) -> StateStats {
        StateStats {
            mutations: self.mutations,
            listeners: self.listeners.len(),
        }
    }
}
