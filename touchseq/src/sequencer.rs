use crate::{SeqConfig, TouchEdge, DEFAULT_SEQ_CONFIG};

/// Touch-programmable light sequencer.
///
/// Runs once per tick off the touch edge state and produces the light
/// level. A touch start seen during playback arms a blink countdown,
/// then a fixed-duration recording pass quantizes the live touch signal
/// into `L` slots by majority vote over `divider`-tick groups. The
/// recorded pattern then plays back in a loop until reprogrammed.
///
/// Per-tick branch priority is countdown, recording, start edge,
/// playback, so a start edge can only be honored from playback and
/// cannot corrupt a session in progress.
pub struct Sequencer<'a, const L: usize> {
    /// Recorded pattern
    pub slots: [bool; L],
    /// Next slot to record; `L` means not recording
    pub write_idx: usize,
    /// Playback position, always below `L`
    pub read_idx: usize,
    /// Tick counter dividing the tick rate down to the slot rate
    pub div_cnt: u8,
    /// Active-tick count for the slot being recorded
    pub acc: u8,
    /// Ticks left in the pre-recording blink phase; 0 when inactive
    pub countdown: u8,
    /// True if any recorded slot is lit
    pub has_light: bool,
    level: bool,
    pub config: &'a SeqConfig,
}

impl<'a, const L: usize> Sequencer<'a, L> {
    pub fn new(config: Option<&'a SeqConfig>) -> Self {
        let config = config.unwrap_or(&DEFAULT_SEQ_CONFIG);
        Self {
            slots: [false; L],
            write_idx: L,
            read_idx: 0,
            div_cnt: 0,
            acc: 0,
            countdown: 0,
            has_light: false,
            level: false,
            config,
        }
    }

    /// True while a countdown or recording session is in progress.
    ///
    /// Used by the platform as a power hint: while programming, or while
    /// the pattern has any light in it, the light timer has to stay
    /// clocked; otherwise it can be stopped between ticks.
    pub fn programming(&self) -> bool {
        self.countdown > 0 || self.write_idx < L
    }

    /// Advance one tick and return the light level to output.
    pub fn step(&mut self, edge: TouchEdge) -> bool {
        if self.countdown > 0 {
            // Get-ready blink before recording starts
            self.level = self.countdown & 1 == 1;
            self.countdown -= 1;
        } else if self.write_idx < L {
            // Recording: light gives live feedback of the touch
            let active = edge.active();
            self.level = active;
            self.acc += active as u8;
            self.div_cnt += 1;
            if self.div_cnt >= self.config.divider {
                self.div_cnt = 0;
                // Majority vote over the ticks in this slot, ties dark
                let slot = self.acc > self.config.divider / 2;
                self.slots[self.write_idx] = slot;
                self.has_light |= slot;
                self.write_idx += 1;
                self.acc = 0;
            }
        } else if edge == TouchEdge::Start {
            // Arm a new session. The output level is left as-is for this
            // tick; the countdown blink takes over on the next one.
            self.countdown = self.config.countdown;
            self.write_idx = 0;
            self.read_idx = 0;
            self.div_cnt = 0;
            self.has_light = false;
        } else {
            self.level = self.slots[self.read_idx];
            self.div_cnt += 1;
            if self.div_cnt >= self.config.divider {
                self.div_cnt = 0;
                self.read_idx += 1;
                if self.read_idx >= L {
                    self.read_idx = 0;
                }
            }
        }

        self.level
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    const CFG: SeqConfig = SeqConfig {
        divider: 2,
        countdown: 4,
    };

    /// Run one full programming session on a 4-slot sequencer: start
    /// edge, countdown, then record from `active` (one bool per tick).
    fn record<const L: usize>(seq: &mut Sequencer<L>, active: &[bool]) {
        seq.step(TouchEdge::Start);
        for _ in 0..seq.config.countdown {
            assert!(seq.countdown > 0);
            seq.step(TouchEdge::Held);
        }
        for (i, &a) in active.iter().enumerate() {
            assert!(seq.write_idx < L, "recording ended early at tick {}", i);
            let edge = if a { TouchEdge::Held } else { TouchEdge::Inactive };
            let level = seq.step(edge);
            assert_eq!(level, a, "no live feedback at tick {}", i);
        }
        assert_eq!(seq.write_idx, L, "buffer not fully populated");
    }

    #[test]
    fn test_boot_is_dark_playback() {
        let mut seq: Sequencer<4> = Sequencer::new(Some(&CFG));
        for _ in 0..3 * 4 * CFG.divider as usize {
            assert!(!seq.step(TouchEdge::Inactive));
        }
        assert!(!seq.has_light);
        assert!(!seq.programming());
    }

    #[test]
    fn test_record_and_playback() {
        let mut seq: Sequencer<4> = Sequencer::new(Some(&CFG));

        // Pairs (1,1) (0,0) (1,0) (1,1): majority vote keeps the first
        // and last, the (1,0) tie rounds dark.
        let active = [true, true, false, false, true, false, true, true];
        record(&mut seq, &active);
        assert_eq!(seq.slots, [true, false, false, true]);
        assert!(seq.has_light);

        // Two full playback periods, identical and phase-aligned
        let expected = [true, true, false, false, false, false, true, true];
        for rep in 0..2 {
            for (i, &want) in expected.iter().enumerate() {
                let got = seq.step(TouchEdge::Inactive);
                assert_eq!(got, want, "playback mismatch rep {} tick {}", rep, i);
            }
        }
    }

    #[test]
    fn test_countdown_blinks_and_counts_down() {
        let mut seq: Sequencer<4> = Sequencer::new(Some(&CFG));
        seq.step(TouchEdge::Start);
        assert_eq!(seq.countdown, CFG.countdown);
        // Parity blink: 4 -> off, 3 -> on, 2 -> off, 1 -> on
        assert!(!seq.step(TouchEdge::Held));
        assert!(seq.step(TouchEdge::Held));
        assert!(!seq.step(TouchEdge::Held));
        assert!(seq.step(TouchEdge::Held));
        assert_eq!(seq.countdown, 0);
        assert!(seq.write_idx < 4, "recording did not begin after countdown");
    }

    #[test]
    fn test_start_ignored_while_busy() {
        let mut seq: Sequencer<4> = Sequencer::new(Some(&CFG));
        seq.step(TouchEdge::Start);

        // A second start mid-countdown must not rewind it
        seq.step(TouchEdge::Held);
        let left = seq.countdown;
        seq.step(TouchEdge::Start);
        assert_eq!(seq.countdown, left - 1);

        // Drain the countdown, then try to restart mid-recording
        while seq.countdown > 0 {
            seq.step(TouchEdge::Inactive);
        }
        seq.step(TouchEdge::Start);
        seq.step(TouchEdge::Start);
        assert_eq!(seq.countdown, 0, "start edge reset an active recording");
        assert_eq!(seq.write_idx, 1);
        assert_eq!(seq.slots[0], true);
    }

    #[test]
    fn test_session_length_fixed() {
        let mut seq: Sequencer<4> = Sequencer::new(Some(&CFG));
        // All-dark input still consumes exactly L * divider ticks
        record(&mut seq, &[false; 8]);
        assert_eq!(seq.slots, [false; 4]);
        assert!(!seq.has_light);
        assert!(!seq.programming());
    }

    #[test]
    fn test_reprogram_clears_has_light() {
        let mut seq: Sequencer<4> = Sequencer::new(Some(&CFG));
        record(&mut seq, &[true; 8]);
        assert!(seq.has_light);

        record(&mut seq, &[false; 8]);
        assert!(!seq.has_light);
        assert_eq!(seq.read_idx, 0);
    }
}
