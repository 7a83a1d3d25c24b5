use crate::{TouchConfig, TouchEdge, DEFAULT_TOUCH_CONFIG};

/// Adaptive baseline filter and touch edge detector.
///
/// Consumes one raw capacitance proxy per tick and produces the
/// edge-coded activity state. The baseline is a first-order IIR that
/// tracks slow drift while untouched and is nearly frozen while the
/// touch is held.
pub struct TouchFilter<'a> {
    /// Latest raw measurement
    pub raw_level: u16,
    /// Filtered estimate of the untouched level
    pub base_level: u16,
    /// Ticks elapsed since reset, saturating at `startup_cycles`
    pub start_cycle: u16,
    pub edge: TouchEdge,
    pub config: &'a TouchConfig,
}

impl<'a> TouchFilter<'a> {
    pub fn new(config: Option<&'a TouchConfig>) -> Self {
        let config = config.unwrap_or(&DEFAULT_TOUCH_CONFIG);
        Self {
            raw_level: 0,
            base_level: 0,
            start_cycle: 0,
            edge: TouchEdge::Inactive,
            config,
        }
    }

    pub fn active(&self) -> bool {
        self.edge.active()
    }

    /// Process the raw measurement for one tick.
    pub fn push(&mut self, raw: u16) -> TouchEdge {
        self.raw_level = raw;

        if self.start_cycle < self.config.startup_cycles {
            // Track the raw level directly on startup while things settle
            self.base_level = raw;
            self.start_cycle += 1;
        } else {
            let shift = if self.edge.active() {
                self.config.active_shift
            } else {
                self.config.base_shift
            };
            let mul = (1u32 << shift) - 1;
            self.base_level = ((self.base_level as u32 * mul + raw as u32) >> shift) as u16;
            // A sudden drop must not lag: clamp the baseline down in the
            // same tick
            if raw < self.base_level {
                self.base_level = raw;
            }
        }

        // Wrapping on purpose. If the raw level is somehow below the
        // baseline here, the huge wrapped delta reads as "far above
        // threshold".
        let delta = raw.wrapping_sub(self.base_level);
        let compare = if self.edge.active() {
            self.config.threshold - self.config.hysteresis
        } else {
            self.config.threshold + self.config.hysteresis
        };
        self.edge = self.edge.shifted(delta > compare);

        self.edge
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_startup_lock() {
        let config = &DEFAULT_TOUCH_CONFIG;
        let mut f = TouchFilter::new(Some(config));

        // Noisy, drifting input during the startup window: the baseline
        // must track it exactly and no activity may be reported.
        let noisy = [500u16, 900, 100, 65535, 0, 750, 751];
        for i in 0..config.startup_cycles as usize {
            let raw = noisy[i % noisy.len()];
            let edge = f.push(raw);
            assert_eq!(f.base_level, raw, "baseline not locked at tick {}", i);
            assert!(!edge.active(), "active during startup at tick {}", i);
        }
        assert_eq!(f.start_cycle, config.startup_cycles);
    }

    #[test]
    fn test_activate_and_hysteresis() {
        let config = &DEFAULT_TOUCH_CONFIG;
        let mut f = TouchFilter::new(Some(config));

        const REST: u16 = 100;
        for _ in 0..config.startup_cycles {
            f.push(REST);
        }

        // Just at the inactive compare point: stays off
        assert_eq!(f.push(REST + config.threshold + config.hysteresis), TouchEdge::Inactive);
        // One count above: turns on
        let edge = f.push(REST + config.threshold + config.hysteresis + 1);
        assert_eq!(edge, TouchEdge::Start);

        // Within the hysteresis band it must remain active
        assert_eq!(f.push(REST + config.threshold - config.hysteresis + 1), TouchEdge::Held);

        // At or below threshold - hysteresis: releases
        assert_eq!(f.push(REST), TouchEdge::Stop);
        assert_eq!(f.push(REST), TouchEdge::Inactive);
    }

    #[test]
    fn test_fast_attack_on_drop() {
        let config = &DEFAULT_TOUCH_CONFIG;
        let mut f = TouchFilter::new(Some(config));

        for _ in 0..config.startup_cycles {
            f.push(1000);
        }
        assert_eq!(f.base_level, 1000);

        // A drop below the baseline is taken in full within the tick
        f.push(800);
        assert_eq!(f.base_level, 800, "baseline lagged a downward step");
        assert!(!f.active());
    }

    #[test]
    fn test_held_baseline_nearly_frozen() {
        let config = &DEFAULT_TOUCH_CONFIG;
        let mut f = TouchFilter::new(Some(config));

        const REST: u16 = 1000;
        for _ in 0..config.startup_cycles {
            f.push(REST);
        }

        // Press and hold well above threshold for a long time. With the
        // slow active-shift filter the touch must still read as held
        // after hundreds of ticks.
        let pressed = REST + 100;
        f.push(pressed);
        assert!(f.active());
        for _ in 0..500 {
            f.push(pressed);
            assert!(f.active(), "hold was reabsorbed into the baseline");
        }
        assert!(f.base_level < pressed - config.threshold);

        // Release drops the raw level back; the clamp pulls the baseline
        // down with it.
        f.push(REST);
        f.push(REST);
        assert!(!f.active());
        assert_eq!(f.base_level, REST);
    }
}
