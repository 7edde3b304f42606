// Reaction-time calibration run before the missions
use serde::{Deserialize, Serialize};

pub const TRIALS: usize = 5;
pub const MIN_DELAY_MS: f64 = 1000.0;
pub const MAX_DELAY_MS: f64 = 3000.0;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub trials_ms: Vec<f64>,
    pub mean_ms: f64,
    pub false_starts: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReactionPhase {
    Ready,
    Waiting,
    Go { shown_ms: f64 },
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClickOutcome {
    Ignored,
    FalseStart,
    Recorded(f64),
    Finished,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReactionTest {
    phase: ReactionPhase,
    trials_ms: Vec<f64>,
    false_starts: u32,
}

impl Default for ReactionTest {
    fn default() -> Self {
        Self { phase: ReactionPhase::Ready, trials_ms: Vec::with_capacity(TRIALS), false_starts: 0 }
    }
}

impl ReactionTest {
    pub fn phase(&self) -> ReactionPhase {
        self.phase
    }

    pub fn completed(&self) -> usize {
        self.trials_ms.len()
    }

    /// Arms the next trial; the caller schedules `show_signal` after a delay.
    pub fn arm(&mut self) -> bool {
        if matches!(self.phase, ReactionPhase::Ready) {
            self.phase = ReactionPhase::Waiting;
            true
        } else {
            false
        }
    }

    pub fn show_signal(&mut self, now_ms: f64) {
        if matches!(self.phase, ReactionPhase::Waiting) {
            self.phase = ReactionPhase::Go { shown_ms: now_ms };
        }
    }

    pub fn click(&mut self, now_ms: f64) -> ClickOutcome {
        match self.phase {
            ReactionPhase::Waiting => {
                self.false_starts += 1;
                self.phase = ReactionPhase::Ready;
                ClickOutcome::FalseStart
            }
            ReactionPhase::Go { shown_ms } => {
                let rt = (now_ms - shown_ms).max(0.0);
                self.trials_ms.push(rt);
                if self.trials_ms.len() >= TRIALS {
                    self.phase = ReactionPhase::Finished;
                    ClickOutcome::Finished
                } else {
                    self.phase = ReactionPhase::Ready;
                    ClickOutcome::Recorded(rt)
                }
            }
            ReactionPhase::Ready | ReactionPhase::Finished => ClickOutcome::Ignored,
        }
    }

    pub fn result(&self) -> CalibrationResult {
        let mean_ms = if self.trials_ms.is_empty() {
            0.0
        } else {
            self.trials_ms.iter().sum::<f64>() / self.trials_ms.len() as f64
        };
        CalibrationResult { trials_ms: self.trials_ms.clone(), mean_ms, false_starts: self.false_starts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(test: &mut ReactionTest, shown: f64, clicked: f64) -> ClickOutcome {
        assert!(test.arm());
        test.show_signal(shown);
        test.click(clicked)
    }

    #[test]
    fn five_trials_then_finished() {
        let mut t = ReactionTest::default();
        for i in 0..4 {
            assert_eq!(trial(&mut t, 0.0, 200.0 + i as f64), ClickOutcome::Recorded(200.0 + i as f64));
        }
        assert_eq!(trial(&mut t, 1000.0, 1300.0), ClickOutcome::Finished);
        let r = t.result();
        assert_eq!(r.trials_ms.len(), TRIALS);
        assert!((r.mean_ms - (200.0 + 201.0 + 202.0 + 203.0 + 300.0) / 5.0).abs() < 1e-9);
        assert_eq!(t.click(2000.0), ClickOutcome::Ignored);
    }

    #[test]
    fn early_click_is_a_false_start_and_repeats() {
        let mut t = ReactionTest::default();
        assert!(t.arm());
        assert_eq!(t.click(10.0), ClickOutcome::FalseStart);
        assert_eq!(t.phase(), ReactionPhase::Ready);
        assert_eq!(t.completed(), 0);
        assert_eq!(t.result().false_starts, 1);
    }

    #[test]
    fn stale_signal_after_false_start_is_ignored() {
        let mut t = ReactionTest::default();
        t.arm();
        t.click(10.0);
        t.show_signal(20.0);
        assert_eq!(t.phase(), ReactionPhase::Ready);
    }
}
