// Transient finder
// State machine turning threshold crossings into transient intervals,
// reproducing the legacy Old Bird detector's edge-case behavior

use crate::events::types::{Crossing, Transient};

/// Transient finder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientState {
    /// No transient in progress
    Down,

    /// Transient in progress
    Up,

    /// Transient fell before reaching the minimum length but may resume
    Holding,
}

/// Converts crossings into transients with lengths bounded by
/// `min_length` and `max_length` samples.
#[derive(Debug, Clone)]
pub struct TransientFinder {
    min_length: u64,
    max_length: u64,
    state: TransientState,
    start_index: u64,
}

impl TransientFinder {
    pub fn new(min_length: u64, max_length: u64) -> Self {
        TransientFinder {
            min_length,
            max_length,
            state: TransientState::Down,
            start_index: 0,
        }
    }

    pub fn state(&self) -> TransientState {
        self.state
    }

    /// Process crossings in order, returning completed transients
    pub fn process(&mut self, crossings: &[Crossing]) -> Vec<Transient> {
        let mut transients = Vec::new();
        for crossing in crossings {
            if let Some(transient) = self.step(*crossing) {
                transients.push(transient);
            }
        }
        transients
    }

    /// Flush with a synthetic fall at `end_index`, the index just past the
    /// last processed sample
    pub fn complete(&mut self, end_index: u64) -> Option<Transient> {
        self.step(Crossing::fall(end_index))
    }

    fn step(&mut self, crossing: Crossing) -> Option<Transient> {
        let Crossing { index, rising } = crossing;
        let min_end = self.start_index + self.min_length;
        let max_end = self.start_index + self.max_length;

        match (self.state, rising) {
            (TransientState::Down, true) => {
                self.start_index = index;
                self.state = TransientState::Up;
                None
            }

            (TransientState::Down, false) => None,

            (TransientState::Up, true) => {
                if index == max_end {
                    // The legacy detector drops back to down here instead
                    // of starting a new transient at this rise.
                    let transient = Transient::new(self.start_index, self.max_length);
                    self.state = TransientState::Down;
                    Some(transient)
                } else if index > max_end {
                    let transient = Transient::new(self.start_index, self.max_length);
                    self.start_index = index;
                    Some(transient)
                } else {
                    None
                }
            }

            (TransientState::Up, false) => {
                if index < min_end {
                    self.state = TransientState::Holding;
                    None
                } else {
                    let length = (index - self.start_index).min(self.max_length);
                    self.state = TransientState::Down;
                    Some(Transient::new(self.start_index, length))
                }
            }

            (TransientState::Holding, true) => {
                self.state = TransientState::Up;
                if index > min_end {
                    let transient = Transient::new(self.start_index, self.min_length);
                    self.start_index = index;
                    Some(transient)
                } else {
                    None
                }
            }

            (TransientState::Holding, false) => {
                if index >= min_end {
                    self.state = TransientState::Down;
                    Some(Transient::new(self.start_index, self.min_length))
                } else {
                    None
                }
            }
        }
    }
}
