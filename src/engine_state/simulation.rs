//! # Fixed-Step Simulation Clock
//!
//! Decouples the simulation rate from the frame rate. Each frame feeds the time elapsed since
//! the previous frame into [`FixedStepSimulation::advance`], which answers with the number of
//! fixed steps to run and the interpolation factor left over for rendering.
//!
//! The accumulator is clamped to a quarter of a second, so a long stall drops simulated time
//! instead of running a burst of catch-up steps.

use web_time::Duration;

/// Longest stretch of real time the clock will try to catch up on.
pub const MAX_ACCUMULATED_SECONDS: f64 = 0.25;

/// Frame and step counts for one second of real time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SecondElapsed {
    pub frames: u32,
    pub steps: u32,
}

/// What the caller should do for the current frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StepPlan {
    /// Number of fixed steps to simulate now
    pub steps: u32,
    /// Fraction of a step still in the accumulator, in `[0, 1)`
    pub alpha: f64,
    /// Present on the first frame after each full second
    pub second_elapsed: Option<SecondElapsed>,
}

pub struct FixedStepSimulation {
    dt: f64,
    accumulator: f64,
    since_second: Duration,
    frames: u32,
    steps: u32,
}

impl FixedStepSimulation {
    /// Creates a clock running `steps_per_second` fixed steps per second.
    ///
    /// A rate of zero is treated as one step per second.
    pub fn new(steps_per_second: u32) -> Self {
        FixedStepSimulation {
            dt: 1.0 / f64::from(steps_per_second.max(1)),
            accumulator: 0.0,
            since_second: Duration::ZERO,
            frames: 0,
            steps: 0,
        }
    }

    /// Length of one step.
    pub fn step_duration(&self) -> Duration {
        Duration::from_secs_f64(self.dt)
    }

    /// Feeds one frame's elapsed time into the clock.
    pub fn advance(&mut self, elapsed: Duration) -> StepPlan {
        let frame_time = elapsed.as_secs_f64();
        self.accumulator = (self.accumulator + frame_time).min(MAX_ACCUMULATED_SECONDS);

        let mut steps = 0;
        while self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            steps += 1;
        }
        self.steps += steps;
        self.frames += 1;

        self.since_second += elapsed;
        let second_elapsed = if self.since_second >= Duration::from_secs(1) {
            let report = SecondElapsed {
                frames: self.frames,
                steps: self.steps,
            };
            self.since_second = Duration::ZERO;
            self.frames = 0;
            self.steps = 0;
            Some(report)
        } else {
            None
        };

        StepPlan {
            steps,
            alpha: self.accumulator / self.dt,
            second_elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_accumulate_across_frames() {
        let mut clock = FixedStepSimulation::new(20);
        let first = clock.advance(Duration::from_millis(30));
        assert_eq!(first.steps, 0);
        assert!((first.alpha - 0.6).abs() < 1e-9);

        let second = clock.advance(Duration::from_millis(30));
        assert_eq!(second.steps, 1);
        assert!((second.alpha - 0.2).abs() < 1e-9);
    }

    #[test]
    fn step_duration_follows_the_rate() {
        assert_eq!(FixedStepSimulation::new(20).step_duration(), Duration::from_millis(50));
        assert_eq!(FixedStepSimulation::new(0).step_duration(), Duration::from_secs(1));
    }

    #[test]
    fn long_stalls_are_clamped() {
        let mut clock = FixedStepSimulation::new(20);
        let plan = clock.advance(Duration::from_secs(3));
        assert_eq!(plan.steps, 5);
    }

    #[test]
    fn reports_once_per_second() {
        let mut clock = FixedStepSimulation::new(10);
        let mut reports = Vec::new();
        for _ in 0..25 {
            if let Some(report) = clock.advance(Duration::from_millis(100)).second_elapsed {
                reports.push(report);
            }
        }
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].frames, 10);
        assert!(reports[0].steps >= 9 && reports[0].steps <= 10);
    }
}
