//! Learning-rate schedules.

/// Polynomial decay from `initial` to `end` over `decay_steps` steps, then
/// constant at `end`.
///
/// ```text
/// rate(step) = (initial - end) * (1 - min(step, decay_steps) / decay_steps)^power + end
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolynomialDecay {
    pub initial: f64,
    pub end: f64,
    pub decay_steps: usize,
    pub power: f64,
}

impl PolynomialDecay {
    /// Linear decay.
    pub fn linear(initial: f64, end: f64, decay_steps: usize) -> Self {
        Self {
            initial,
            end,
            decay_steps,
            power: 1.0,
        }
    }

    pub fn rate(&self, step: usize) -> f64 {
        if self.decay_steps == 0 {
            return self.end;
        }
        let progress = step.min(self.decay_steps) as f64 / self.decay_steps as f64;
        (self.initial - self.end) * (1.0 - progress).powf(self.power) + self.end
    }
}
