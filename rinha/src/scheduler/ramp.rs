use rinha_core::Stage;
use std::time::Duration;

/// Worker targets of a ramping profile over time.
///
/// Each stage moves linearly from the previous stage's target (or the start
/// count) to its own. Intermediate values are rounded toward the stage's
/// starting count so the population never overshoots a target.
#[derive(Clone, Debug)]
pub(crate) struct Ramp {
    start: usize,
    stages: Vec<Stage>,
}

impl Ramp {
    pub fn new(start: usize, stages: &[Stage]) -> Self {
        Self {
            start,
            stages: stages.to_vec(),
        }
    }

    /// Desired worker count `elapsed` after the scenario started running, or
    /// `None` once every stage has elapsed.
    pub fn target_at(&self, elapsed: Duration) -> Option<usize> {
        let mut from = self.start;
        let mut remaining = elapsed;

        for stage in &self.stages {
            if remaining < stage.duration {
                return Some(interpolate(from, stage.target, remaining, stage.duration));
            }
            remaining -= stage.duration;
            from = stage.target;
        }

        None
    }
}

fn interpolate(from: usize, to: usize, elapsed: Duration, duration: Duration) -> usize {
    let progress = (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0., 1.);
    if to >= from {
        from + ((to - from) as f64 * progress).floor() as usize
    } else {
        from - ((from - to) as f64 * progress).floor() as usize
    }
}
