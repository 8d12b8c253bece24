//! Controllers translating UI actions into state changes and events.
//!
//! A [`Session`] owns the state tree, the event bus and the local record
//! storage. Each controller is a short-lived view borrowed from the session,
//! e.g. `session.timer().start()`.

pub mod filter;
pub mod ranking;
pub mod selection;
pub mod timer;
pub mod upload;

use log::{info, warn};

use crate::events::{EventBus, GameEvent};
use crate::state::AppState;
use crate::storage::LocalRecordStorage;

pub use filter::FilterController;
pub use ranking::{LocalRanking, LocalRecord, LocalSort, LocalStatistics};
pub use selection::SelectionController;
pub use timer::{MIN_RECORD_SECONDS, TimerController, format_hms};
pub use upload::{IssueRepository, MIN_UPLOAD_TIME, UploadController, UploadError, UploadKind};

pub struct Session<L: LocalRecordStorage> {
    pub state: AppState,
    pub bus: EventBus,
    local_storage: L,
    repository: IssueRepository,
}

impl<L: LocalRecordStorage> Session<L> {
    pub fn new(local_storage: L) -> Self {
        Self {
            state: AppState::new(),
            bus: EventBus::new(),
            local_storage,
            repository: IssueRepository::default(),
        }
    }

    #[must_use]
    pub fn with_repository(mut self, repository: IssueRepository) -> Self {
        self.repository = repository;
        self
    }

    pub const fn local_storage(&self) -> &L {
        &self.local_storage
    }

    /// Restore persisted local records and mark the session initialized.
    ///
    /// A storage failure is logged and reported on the bus; the session still
    /// starts with an empty local list.
    pub fn initialize(&mut self) {
        info!("Session initialization started");
        match self.local_storage.load_local_records() {
            Ok(records) => {
                info!("Restored {} local records", records.len());
                self.state.set_local_records(records);
            }
            Err(err) => {
                warn!("Could not restore local records: {err}");
                self.bus.emit(&GameEvent::Error {
                    message: format!("could not restore local records: {err}"),
                });
            }
        }
        self.state.set_initialized(true);
        self.bus.emit(&GameEvent::AppInitialized);
    }

    pub fn ready(&mut self) {
        self.bus.emit(&GameEvent::AppReady);
        info!("Session ready");
    }

    pub fn selection(&mut self) -> SelectionController<'_> {
        SelectionController::new(&mut self.state, &mut self.bus)
    }

    pub fn timer(&mut self) -> TimerController<'_, L> {
        TimerController::new(&mut self.state, &mut self.bus, &self.local_storage)
    }

    pub fn filters(&mut self) -> FilterController<'_> {
        FilterController::new(&mut self.state, &mut self.bus)
    }

    pub fn ranking(&mut self) -> LocalRanking<'_, L> {
        LocalRanking::new(&mut self.state, &mut self.bus, &self.local_storage)
    }

    pub fn upload(&mut self) -> UploadController<'_> {
        UploadController::new(&self.state, &mut self.bus, &self.repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::storage::MemoryStorage;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn initialize_restores_local_records() {
        let storage = MemoryStorage::new();
        storage
            .save_local_records(&[LocalRecord::new("浮士德", 2, "LCB罪人", 8000, "")])
            .unwrap();

        let mut session = Session::new(storage);
        let fired = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&fired);
        session.bus.subscribe(EventKind::AppInitialized, move |_| {
            *flag.borrow_mut() = true;
            Ok(())
        });

        session.initialize();
        assert!(session.state.is_initialized());
        assert_eq!(session.state.local_records().len(), 1);
        assert!(*fired.borrow());
    }
}
