use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;

use crate::loadtest::error::LoadTestError;
use crate::loadtest::request::WebhookRequest;

pub type TaskFn<U> = fn(&U, &mut StdRng) -> WebhookRequest;

/// A named unit of work a virtual user can be asked to perform.
pub struct Task<U> {
    pub name: &'static str,
    pub weight: u32,
    pub run: TaskFn<U>,
}

impl<U> Task<U> {
    pub fn new(name: &'static str, run: TaskFn<U>) -> Self {
        Self { name, weight: 1, run }
    }
}

/// Behaviour of one simulated client.
///
/// The runner calls `on_start` once, then keeps picking entries of `tasks`
/// through its scheduler until the test is stopped.
pub trait VirtualUser: Send + Sized + 'static {
    fn on_start(&mut self) {}

    fn tasks() -> Vec<Task<Self>>;
}

/// Replaces the default task weights with operator supplied ones.
pub fn apply_weights<U>(tasks: &mut [Task<U>], weights: &[u32]) -> Result<(), LoadTestError> {
    if weights.is_empty() {
        return Ok(());
    }
    if weights.len() != tasks.len() {
        return Err(LoadTestError::WeightCountMismatch {
            given: weights.len(),
            expected: tasks.len(),
        });
    }
    if weights.iter().all(|weight| *weight == 0) {
        return Err(LoadTestError::AllWeightsZero);
    }
    for (task, weight) in tasks.iter_mut().zip(weights) {
        task.weight = *weight;
    }
    Ok(())
}

/// Uniformly random pause between two tasks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitTime {
    min: Duration,
    max: Duration,
}

impl WaitTime {
    /// Takes seconds; both ends must fit in a `Duration` and `min <= max`.
    pub fn between(min: f64, max: f64) -> Result<Self, LoadTestError> {
        let invalid = || LoadTestError::InvalidWaitRange { min, max };
        let min_duration = Duration::try_from_secs_f64(min).map_err(|_| invalid())?;
        let max_duration = Duration::try_from_secs_f64(max).map_err(|_| invalid())?;
        if min_duration > max_duration {
            return Err(invalid());
        }
        Ok(Self { min: min_duration, max: max_duration })
    }

    pub fn sample(&self, rng: &mut StdRng) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}
