//! Sinner and persona filters for the random picker.
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

use crate::events::{EventBus, GameEvent};
use crate::sinners::{SINNERS, Sinner};
use crate::state::AppState;

pub struct FilterController<'a> {
    state: &'a mut AppState,
    bus: &'a mut EventBus,
}

impl<'a> FilterController<'a> {
    pub const fn new(state: &'a mut AppState, bus: &'a mut EventBus) -> Self {
        Self { state, bus }
    }

    pub fn update_sinner_filters(&mut self, ids: BTreeSet<u8>) {
        let enabled_count = ids.len();
        self.state.set_sinner_filters(ids);
        self.bus.emit(&GameEvent::SinnerFilterChanged { enabled_count });
        debug!("Sinner filter now enables {enabled_count} sinners");
    }

    pub fn update_persona_filters(&mut self, filters: BTreeMap<u8, BTreeSet<u32>>) {
        let filter_count = filters.len();
        self.state.set_persona_filters(filters);
        self.bus.emit(&GameEvent::PersonaFilterChanged { filter_count });
    }

    /// Enable or disable one persona of one sinner. `persona_count` is the
    /// sinner's total number of personas, used when the sinner had no entry
    /// yet (meaning all were enabled).
    pub fn toggle_persona(&mut self, sinner_id: u8, persona_index: u32, persona_count: u32) {
        let mut filters = self.state.persona_filters().clone();
        let enabled = filters
            .entry(sinner_id)
            .or_insert_with(|| (0..persona_count).collect());
        if !enabled.remove(&persona_index) {
            enabled.insert(persona_index);
        }
        self.update_persona_filters(filters);
    }

    pub fn enable_all_sinners(&mut self) {
        self.update_sinner_filters(SINNERS.iter().map(|s| s.id).collect());
        info!("Enabled all sinners");
    }

    pub fn invert_selection(&mut self) {
        let current = self.state.sinner_filters();
        let inverted = SINNERS
            .iter()
            .map(|s| s.id)
            .filter(|id| !current.contains(id))
            .collect();
        self.update_sinner_filters(inverted);
        info!("Inverted sinner selection");
    }

    #[must_use]
    pub fn is_sinner_enabled(&self, sinner_id: u8) -> bool {
        self.state.is_sinner_enabled(sinner_id)
    }

    /// Whether a persona may be picked. Sinners without a persona entry allow all.
    #[must_use]
    pub fn is_persona_enabled(&self, sinner_id: u8, persona_index: u32) -> bool {
        self.state
            .persona_filters()
            .get(&sinner_id)
            .is_none_or(|enabled| enabled.contains(&persona_index))
    }

    #[must_use]
    pub fn filtered_sinners(&self) -> Vec<Sinner> {
        SINNERS
            .iter()
            .filter(|s| self.state.is_sinner_enabled(s.id))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::controllers::Session;
    use crate::storage::MemoryStorage;
    use std::collections::BTreeSet;

    #[test]
    fn invert_flips_the_enabled_set() {
        let mut session = Session::new(MemoryStorage::new());
        session.filters().update_sinner_filters(BTreeSet::from([1, 2, 3]));
        session.filters().invert_selection();

        let enabled: Vec<u8> = session.filters().filtered_sinners().iter().map(|s| s.id).collect();
        assert_eq!(enabled, (4..=12).collect::<Vec<u8>>());

        session.filters().enable_all_sinners();
        assert_eq!(session.filters().filtered_sinners().len(), 12);
    }

    #[test]
    fn persona_toggle_starts_from_all_enabled() {
        let mut session = Session::new(MemoryStorage::new());
        assert!(session.filters().is_persona_enabled(5, 2));
        session.filters().toggle_persona(5, 2, 4);
        assert!(!session.filters().is_persona_enabled(5, 2));
        assert!(session.filters().is_persona_enabled(5, 3));
        session.filters().toggle_persona(5, 2, 4);
        assert!(session.filters().is_persona_enabled(5, 2));
    }
}
