use std::str::FromStr;

use rand::rngs::StdRng;
use rand::Rng;

/// Decides which task a virtual user runs next.
pub trait TaskScheduler: Send {
    /// `weights` holds one entry per task and at least one of them is non-zero.
    fn next_task(&mut self, weights: &[u32], rng: &mut StdRng) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    Random,
    RoundRobin,
}

impl SchedulerKind {
    pub fn build(&self) -> Box<dyn TaskScheduler> {
        match self {
            SchedulerKind::Random => Box::new(WeightedRandom),
            SchedulerKind::RoundRobin => Box::new(RoundRobin::default()),
        }
    }
}

impl FromStr for SchedulerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(SchedulerKind::Random),
            "round-robin" | "roundrobin" => Ok(SchedulerKind::RoundRobin),
            _ => Err(format!("Invalid scheduler: '{}'. Use 'random' or 'round-robin'.", s)),
        }
    }
}

/// Picks each task with probability proportional to its weight.
#[derive(Debug, Default)]
pub struct WeightedRandom;

impl TaskScheduler for WeightedRandom {
    fn next_task(&mut self, weights: &[u32], rng: &mut StdRng) -> usize {
        let total: u64 = weights.iter().map(|weight| u64::from(*weight)).sum();
        if total == 0 {
            return rng.gen_range(0..weights.len());
        }
        let mut pick = rng.gen_range(0..total);
        for (index, weight) in weights.iter().enumerate() {
            let weight = u64::from(*weight);
            if pick < weight {
                return index;
            }
            pick -= weight;
        }
        weights.len() - 1
    }
}

/// Runs task `i` `weights[i]` times in a row, then moves on to the next one.
#[derive(Debug, Default)]
pub struct RoundRobin {
    position: usize,
    runs_left: u32,
}

impl TaskScheduler for RoundRobin {
    fn next_task(&mut self, weights: &[u32], _rng: &mut StdRng) -> usize {
        if weights.iter().all(|weight| *weight == 0) {
            let index = self.position % weights.len();
            self.position = index + 1;
            return index;
        }
        while self.runs_left == 0 {
            self.position %= weights.len();
            self.runs_left = weights[self.position];
            if self.runs_left == 0 {
                self.position += 1;
            }
        }
        self.runs_left -= 1;
        let index = self.position;
        if self.runs_left == 0 {
            self.position += 1;
        }
        index
    }
}
