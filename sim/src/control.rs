//! Pause/resume/stop gate shared with control threads.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ControlState {
    paused: bool,
    cancelled: bool,
}

/// The simulator's control gate.
///
/// The tick thread parks on the condition variable at the top of each tick
/// while paused; a control thread flips the flags. Cancellation is
/// observed at the same point, so no tick is ever left half-applied.
#[derive(Debug, Default)]
pub struct SimulatorControl {
    state: Mutex<ControlState>,
    condvar: Condvar,
}

impl SimulatorControl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pause(&self) {
        self.state.lock().paused = true;
    }

    pub fn resume(&self) {
        let mut state = self.state.lock();
        state.paused = false;
        drop(state);
        self.condvar.notify_all();
    }

    /// Request the loop to stop after the current tick boundary.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        state.cancelled = true;
        drop(state);
        self.condvar.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    /// Block while paused; returns false when cancelled.
    pub fn wait_if_paused(&self) -> bool {
        let mut state = self.state.lock();
        while state.paused && !state.cancelled {
            self.condvar.wait(&mut state);
        }
        !state.cancelled
    }
}
