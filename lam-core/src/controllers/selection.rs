//! Sinner and persona selection.
use log::{info, warn};

use crate::events::{EventBus, GameEvent};
use crate::sinners::{Sinner, sinner_by_id};
use crate::state::{AppState, PersonaChoice};

pub struct SelectionController<'a> {
    state: &'a mut AppState,
    bus: &'a mut EventBus,
}

impl<'a> SelectionController<'a> {
    pub const fn new(state: &'a mut AppState, bus: &'a mut EventBus) -> Self {
        Self { state, bus }
    }

    /// Select a sinner by id and clear the persona. Returns the selected sinner,
    /// or `None` for an unknown id (the selection is left untouched).
    pub fn select_sinner(&mut self, sinner_id: u8) -> Option<Sinner> {
        let Some(sinner) = sinner_by_id(sinner_id).copied() else {
            warn!("Ignoring selection of unknown sinner {sinner_id}");
            return None;
        };
        self.state.set_sinner(Some(sinner));
        self.state.set_persona(None);
        self.bus.emit(&GameEvent::SinnerSelected { sinner_id });
        info!("Selected sinner {} ({})", sinner.name, sinner.english_name);
        Some(sinner)
    }

    /// Select a persona of the current sinner. Refused when no sinner is selected.
    pub fn select_persona(&mut self, index: u32, name: &str) -> bool {
        let Some(sinner_id) = self.state.sinner().map(|s| s.id) else {
            warn!("Persona selected before any sinner; ignoring '{name}'");
            return false;
        };
        self.state.set_persona(Some(PersonaChoice {
            index,
            name: name.to_string(),
        }));
        self.bus.emit(&GameEvent::PersonaSelected {
            sinner_id,
            persona: name.to_string(),
        });
        info!("Selected persona {name}");
        true
    }

    pub fn clear(&mut self) {
        self.state.set_sinner(None);
        self.state.set_persona(None);
    }

    #[must_use]
    pub fn current(&self) -> (Option<Sinner>, Option<PersonaChoice>) {
        (self.state.sinner().copied(), self.state.persona().cloned())
    }
}

#[cfg(test)]
mod tests {
    use crate::controllers::Session;
    use crate::events::EventKind;
    use crate::storage::MemoryStorage;

    #[test]
    fn persona_requires_a_sinner() {
        let mut session = Session::new(MemoryStorage::new());
        assert!(!session.selection().select_persona(0, "LCB罪人"));
        assert!(session.state.persona().is_none());
    }

    #[test]
    fn selecting_a_sinner_resets_the_persona() {
        let mut session = Session::new(MemoryStorage::new());
        session.selection().select_sinner(2).unwrap();
        assert!(session.selection().select_persona(0, "LCB罪人"));
        session.selection().select_sinner(3).unwrap();

        let (sinner, persona) = session.selection().current();
        assert_eq!(sinner.map(|s| s.english_name), Some("Don Quixote"));
        assert!(persona.is_none());
        assert_eq!(
            session.bus.stats().emitted.get(EventKind::SinnerSelected.name()),
            Some(&2)
        );
    }

    #[test]
    fn unknown_sinner_is_ignored() {
        let mut session = Session::new(MemoryStorage::new());
        assert!(session.selection().select_sinner(0).is_none());
        assert!(session.state.sinner().is_none());
    }
}
