//! Hold-to-confirm gesture state machine.
//!
//! # Responsibility
//! - Decide when a sustained press commits a guarded action (one check-in,
//!   or the day reset), independent of any UI timer or rendering loop.
//!
//! # Invariants
//! - `tick` advances progress by one; reaching the threshold commits exactly
//!   once and returns the machine to `Idle`.
//! - `release` while holding cancels without committing and zeroes progress.
//! - `start` while already holding is ignored (the hold is not restarted).
//! - Inputs that make no sense in the current state are ignored, never
//!   errors.

use std::collections::BTreeMap;

/// Ticks (seconds) a kiosk check-in button must be held.
pub const CHECK_IN_HOLD_TICKS: u32 = 2;
/// Ticks (seconds) the reset control must be held.
pub const RESET_HOLD_TICKS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Holding { progress: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureInput {
    /// Press / touch-down.
    Start,
    /// One elapsed second while held.
    Tick,
    /// Press / touch-up, pointer leave or cancel.
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Input had no effect in the current state.
    Ignored,
    Started,
    Progressed(u32),
    /// Threshold reached: the caller fires the guarded action now.
    Committed,
    /// Hold interrupted before the threshold.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldGesture {
    threshold: u32,
    state: GestureState,
}

impl HoldGesture {
    /// Creates an idle gesture; a zero threshold is raised to one tick.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            state: GestureState::Idle,
        }
    }

    pub fn check_in() -> Self {
        Self::new(CHECK_IN_HOLD_TICKS)
    }

    pub fn reset() -> Self {
        Self::new(RESET_HOLD_TICKS)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Current progress; zero when idle.
    pub fn progress(&self) -> u32 {
        match self.state {
            GestureState::Idle => 0,
            GestureState::Holding { progress } => progress,
        }
    }

    pub fn is_holding(&self) -> bool {
        matches!(self.state, GestureState::Holding { .. })
    }

    pub fn apply(&mut self, input: GestureInput) -> GestureOutcome {
        match input {
            GestureInput::Start => self.start(),
            GestureInput::Tick => self.tick(),
            GestureInput::Release => self.release(),
        }
    }

    pub fn start(&mut self) -> GestureOutcome {
        match self.state {
            GestureState::Idle => {
                self.state = GestureState::Holding { progress: 0 };
                GestureOutcome::Started
            }
            GestureState::Holding { .. } => GestureOutcome::Ignored,
        }
    }

    pub fn tick(&mut self) -> GestureOutcome {
        match self.state {
            GestureState::Idle => GestureOutcome::Ignored,
            GestureState::Holding { progress } => {
                let next = progress.saturating_add(1);
                if next >= self.threshold {
                    self.state = GestureState::Idle;
                    GestureOutcome::Committed
                } else {
                    self.state = GestureState::Holding { progress: next };
                    GestureOutcome::Progressed(next)
                }
            }
        }
    }

    pub fn release(&mut self) -> GestureOutcome {
        match self.state {
            GestureState::Idle => GestureOutcome::Ignored,
            GestureState::Holding { .. } => {
                self.state = GestureState::Idle;
                GestureOutcome::Cancelled
            }
        }
    }

    /// Ticks and, on commit, runs `action` exactly once.
    pub fn tick_then<R>(&mut self, action: impl FnOnce() -> R) -> Option<R> {
        match self.tick() {
            GestureOutcome::Committed => Some(action()),
            _ => None,
        }
    }
}

/// One independent `HoldGesture` per button key (e.g. per athlete on the
/// kiosk screen).
#[derive(Debug, Clone)]
pub struct GesturePad<K: Ord + Clone> {
    threshold: u32,
    gestures: BTreeMap<K, HoldGesture>,
}

impl<K: Ord + Clone> GesturePad<K> {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            gestures: BTreeMap::new(),
        }
    }

    pub fn start(&mut self, key: &K) -> GestureOutcome {
        let threshold = self.threshold;
        self.gestures
            .entry(key.clone())
            .or_insert_with(|| HoldGesture::new(threshold))
            .start()
    }

    pub fn tick(&mut self, key: &K) -> GestureOutcome {
        self.gestures
            .get_mut(key)
            .map_or(GestureOutcome::Ignored, HoldGesture::tick)
    }

    pub fn release(&mut self, key: &K) -> GestureOutcome {
        self.gestures
            .get_mut(key)
            .map_or(GestureOutcome::Ignored, HoldGesture::release)
    }

    /// Ticks every held button; returns the keys that committed, in key order.
    pub fn tick_all(&mut self) -> Vec<K> {
        self.gestures
            .iter_mut()
            .filter_map(|(key, gesture)| {
                (gesture.tick() == GestureOutcome::Committed).then(|| key.clone())
            })
            .collect()
    }

    pub fn progress(&self, key: &K) -> u32 {
        self.gestures.get(key).map_or(0, HoldGesture::progress)
    }
}
