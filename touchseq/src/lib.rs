#![cfg_attr(not(test), no_std)]

pub mod burst;
pub mod filter;
pub mod sequencer;

/// Edge-coded touch activity: the (previous, current) pair of the
/// per-tick active bit.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchEdge {
    /// Was off, still off
    Inactive,
    /// Was off, now on
    Start,
    /// Was on, now off
    Stop,
    /// Was on, still on
    Held,
}

impl TouchEdge {
    /// The current-tick active bit.
    pub fn active(self) -> bool {
        match self {
            TouchEdge::Start | TouchEdge::Held => true,
            _ => false,
        }
    }

    /// Shift in the next active bit: the current bit becomes the
    /// previous bit, `bit` becomes the current bit.
    pub fn shifted(self, bit: bool) -> Self {
        match (self.active(), bit) {
            (false, false) => TouchEdge::Inactive,
            (false, true) => TouchEdge::Start,
            (true, false) => TouchEdge::Stop,
            (true, true) => TouchEdge::Held,
        }
    }
}

/// Configuration for the baseline filter and edge detector
#[derive(Clone, Copy, Debug)]
pub struct TouchConfig {
    /// Counts of delta above baseline required to activate the touch
    pub threshold: u16,
    /// Schmitt hysteresis. While active the compare point drops to
    /// `threshold - hysteresis`; while inactive it rises to
    /// `threshold + hysteresis`. Must not exceed `threshold`.
    pub hysteresis: u16,
    /// Number of ticks after reset during which the baseline tracks the
    /// raw level exactly, while the sensor settles
    pub startup_cycles: u16,
    /// IIR shift while the touch is inactive (fast baseline tracking)
    pub base_shift: u8,
    /// IIR shift while the touch is active. Much slower, so a
    /// press-and-hold is not reabsorbed into the baseline.
    pub active_shift: u8,
}

impl TouchConfig {
    const fn default() -> Self {
        Self {
            threshold: 20,
            hysteresis: 5,
            startup_cycles: 40,
            base_shift: 6,
            active_shift: 10,
        }
    }
}

pub const DEFAULT_TOUCH_CONFIG: TouchConfig = TouchConfig::default();

/// Configuration for the light sequence controller
#[derive(Clone, Copy, Debug)]
pub struct SeqConfig {
    /// Ticks aggregated into one sequence slot
    pub divider: u8,
    /// Length of the pre-recording blink countdown, in ticks
    pub countdown: u8,
}

impl SeqConfig {
    const fn default() -> Self {
        Self {
            divider: 2,
            countdown: 30,
        }
    }
}

pub const DEFAULT_SEQ_CONFIG: SeqConfig = SeqConfig::default();
