/// Default number of capture cycles in one measurement burst
pub const DEFAULT_CAP_CYCLES: u8 = 20;

/// What the sampler should do after a capture event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BurstEvent {
    /// Toggle the drive pin and wait for the next capture
    Toggle,
    /// Burst complete; the payload is the raw level for this tick
    Done(u16),
}

/// Bookkeeping for one fixed-count capture burst.
///
/// The platform starts a burst at each tick by latching the free-running
/// counter and toggling the drive pin once, then feeds every capture
/// timestamp into [`capture`](Self::capture). The raw level is the
/// counter distance from burst start to the final capture, using
/// wrapping subtraction so counter rollover during the burst does not
/// matter.
///
/// A burst of `cycles` capture events performs one start toggle plus
/// `cycles - 1` capture toggles. Downstream thresholds are tuned to the
/// timing this exact count produces.
pub struct CapBurst {
    cycles_left: u8,
    start: u16,
}

impl CapBurst {
    /// Latch the start count for a new burst. The caller toggles the
    /// drive pin once when calling this.
    pub fn begin(now: u16, cycles: u8) -> Self {
        Self {
            cycles_left: cycles,
            start: now,
        }
    }

    /// Consume one capture timestamp.
    pub fn capture(&mut self, now: u16) -> BurstEvent {
        self.cycles_left -= 1;
        if self.cycles_left != 0 {
            BurstEvent::Toggle
        } else {
            BurstEvent::Done(now.wrapping_sub(self.start))
        }
    }
}
