/// Fixed-step clock driven by variable display-frame deltas.
///
/// The physics world is always advanced by `dt`; `advance` reports how many
/// such steps fit in the time the browser handed us since the last frame.
#[derive(Debug, Clone)]
pub struct StepClock {
    dt: f32,
    max_steps: u32,
    accumulator: f32,
}

impl StepClock {
    pub fn new(dt: f32, max_steps: u32) -> Self {
        Self {
            dt,
            max_steps: max_steps.max(1),
            accumulator: 0.0,
        }
    }

    /// Feed one frame's elapsed seconds; returns the number of fixed steps to run.
    /// Backlog beyond `max_steps` is dropped so a backgrounded tab does not
    /// fast-forward the field when it comes back.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            return 0;
        }
        self.accumulator = (self.accumulator + frame_dt).min(self.dt * self.max_steps as f32);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f32 * self.dt;
        steps
    }

    /// Forget any partial step.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_frame_one_step() {
        let mut clock = StepClock::new(1.0 / 60.0, 10);
        assert_eq!(clock.advance(1.0 / 60.0), 1);
    }

    #[test]
    fn partial_frames_carry_over() {
        let mut clock = StepClock::new(1.0 / 60.0, 10);
        assert_eq!(clock.advance(0.008), 0);
        assert_eq!(clock.advance(0.010), 1);
    }

    #[test]
    fn long_pauses_are_capped() {
        let mut clock = StepClock::new(1.0 / 60.0, 4);
        assert_eq!(clock.advance(2.0), 4);
        assert!(clock.accumulator < clock.dt);
    }

    #[test]
    fn bogus_deltas_run_nothing() {
        let mut clock = StepClock::new(1.0 / 60.0, 10);
        assert_eq!(clock.advance(-1.0), 0);
        assert_eq!(clock.advance(f32::NAN), 0);
        assert_eq!(clock.accumulator, 0.0);
    }

    #[test]
    fn reset_drops_the_remainder() {
        let mut clock = StepClock::new(1.0 / 60.0, 10);
        clock.advance(0.01);
        clock.reset();
        assert_eq!(clock.advance(0.01), 0);
    }
}
