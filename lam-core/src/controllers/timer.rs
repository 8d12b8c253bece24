//! Run timer.
//!
//! The timer is a plain counter advanced once per [`TimerController::tick`].
//! Whoever drives it decides the cadence; there is no drift correction.
use log::{info, warn};

use crate::controllers::ranking::LocalRanking;
use crate::events::{EventBus, GameEvent};
use crate::state::AppState;
use crate::storage::LocalRecordStorage;

/// Runs at least this long are saved to the local ranking when the timer stops.
pub const MIN_RECORD_SECONDS: u64 = 7200;

/// `HH:MM:SS`, hours not capped at 24.
#[must_use]
pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

pub struct TimerController<'a, L: LocalRecordStorage> {
    state: &'a mut AppState,
    bus: &'a mut EventBus,
    storage: &'a L,
}

impl<'a, L: LocalRecordStorage> TimerController<'a, L> {
    pub const fn new(state: &'a mut AppState, bus: &'a mut EventBus, storage: &'a L) -> Self {
        Self { state, bus, storage }
    }

    /// Returns `false` if the timer was already running.
    pub fn start(&mut self) -> bool {
        if self.state.timer().is_running {
            warn!("Timer is already running");
            return false;
        }
        self.state.start_timer();
        self.bus.emit(&GameEvent::TimerStart);
        info!("Timer started");
        true
    }

    /// Advance a running timer by one second. Ignored while stopped.
    pub fn tick(&mut self) -> Option<u64> {
        if !self.state.timer().is_running {
            return None;
        }
        let elapsed = self.state.elapsed_seconds() + 1;
        self.state.set_elapsed_seconds(elapsed);
        self.bus.emit(&GameEvent::TimerTick {
            seconds: elapsed,
            display: format_hms(elapsed),
        });
        Some(elapsed)
    }

    /// Stop the timer and return the elapsed seconds. Long enough runs with a
    /// complete selection are saved to the local ranking.
    pub fn stop(&mut self) -> u64 {
        self.state.stop_timer();
        let elapsed = self.state.elapsed_seconds();
        self.bus.emit(&GameEvent::TimerStop {
            total_seconds: elapsed,
            display: format_hms(elapsed),
        });
        info!("Timer stopped at {elapsed}s");

        if elapsed >= MIN_RECORD_SECONDS {
            self.save_record(elapsed);
        }
        elapsed
    }

    pub fn reset(&mut self) {
        self.state.reset_timer();
        self.bus.emit(&GameEvent::TimerReset);
        info!("Timer reset");
    }

    #[must_use]
    pub fn elapsed(&self) -> u64 {
        self.state.elapsed_seconds()
    }

    fn save_record(&mut self, elapsed: u64) {
        let (Some(sinner), Some(persona)) =
            (self.state.sinner().copied(), self.state.persona().cloned())
        else {
            warn!("Run finished without a sinner and persona selected; not saving");
            return;
        };
        LocalRanking::new(self.state, self.bus, self.storage).save(
            &sinner,
            &persona.name,
            elapsed,
            "",
            None,
            None,
        );
    }
}

/// Drive `tick` once per second until it returns `false`.
///
/// The first tick fires one second after the call.
#[cfg(feature = "async")]
pub async fn run_ticker<F>(mut tick: F)
where
    F: FnMut() -> bool,
{
    let period = std::time::Duration::from_secs(1);
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        interval.tick().await;
        if !tick() {
            break;
        }
    }
}
