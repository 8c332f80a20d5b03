use std::sync::atomic::{AtomicU8, Ordering};

const IDLE: u8 = 0;
const MINING: u8 = 1;
const CANCELLED: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningState {
    Idle,
    Mining,
    Cancelled,
}

/// Cancellation token shared between the nonce search and whoever may
/// interrupt it (e.g. the listener accepting a longer remote chain).
///
/// The search keeps going only while the state is `Mining`; any other
/// thread can flip it and the loop observes the change on its next
/// iteration.
#[derive(Debug)]
pub struct MiningStatus {
    state: AtomicU8,
}

impl MiningStatus {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
        }
    }

    /// Arm the token for a new search. Fails while another search holds it,
    /// including one that was cancelled but has not finished yet.
    pub fn try_start(&self) -> bool {
        self.state
            .compare_exchange(IDLE, MINING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Interrupt a running search. Returns `true` if one was running.
    pub fn cancel(&self) -> bool {
        self.state
            .compare_exchange(MINING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Back to idle after a search ends.
    pub fn finish(&self) {
        self.state.store(IDLE, Ordering::SeqCst);
    }

    pub fn is_mining(&self) -> bool {
        self.state.load(Ordering::SeqCst) == MINING
    }

    pub fn state(&self) -> MiningState {
        match self.state.load(Ordering::SeqCst) {
            MINING => MiningState::Mining,
            CANCELLED => MiningState::Cancelled,
            _ => MiningState::Idle,
        }
    }
}

impl Default for MiningStatus {
    fn default() -> Self {
        Self::new()
    }
}
