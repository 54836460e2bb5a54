use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::loadtest::request::{Method, Outcome, WebhookRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct RequestStats {
    pub method: Method,
    pub path: String,
    pub requests: u64,
    pub failures: u64,
    pub total_time: Duration,
    pub min_time: Duration,
    pub max_time: Duration,
    /// Responses by status code; transport errors are not in here.
    pub status_codes: BTreeMap<u16, u64>,
}

impl RequestStats {
    fn new(request: &WebhookRequest) -> Self {
        Self {
            method: request.method,
            path: request.path.clone(),
            requests: 0,
            failures: 0,
            total_time: Duration::ZERO,
            min_time: Duration::MAX,
            max_time: Duration::ZERO,
            status_codes: BTreeMap::new(),
        }
    }

    fn record(&mut self, outcome: &Outcome) {
        self.requests += 1;
        if !outcome.is_success() {
            self.failures += 1;
        }
        self.total_time += outcome.elapsed;
        self.min_time = self.min_time.min(outcome.elapsed);
        self.max_time = self.max_time.max(outcome.elapsed);
        if let Some(status) = outcome.status {
            *self.status_codes.entry(status).or_insert(0) += 1;
        }
    }

    pub fn average_time(&self) -> Duration {
        if self.requests == 0 {
            return Duration::ZERO;
        }
        self.total_time / self.requests as u32
    }
}

/// Request statistics shared by every virtual user, keyed by task name.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    entries: Arc<Mutex<BTreeMap<String, RequestStats>>>,
}

impl Stats {
    pub fn record(&self, task: &str, request: &WebhookRequest, outcome: &Outcome) {
        self.lock()
            .entry(task.to_string())
            .or_insert_with(|| RequestStats::new(request))
            .record(outcome);
    }

    pub fn report(&self) -> StatsReport {
        StatsReport { entries: self.lock().clone() }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, RequestStats>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsReport {
    pub entries: BTreeMap<String, RequestStats>,
}

impl StatsReport {
    pub fn total_requests(&self) -> u64 {
        self.entries.values().map(|entry| entry.requests).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.entries.values().map(|entry| entry.failures).sum()
    }
}

impl fmt::Display for StatsReport {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "==================== STATS ====================")?;
        writeln!(f, "Finished at {}", chrono::offset::Local::now())?;
        writeln!(f, "{:<18} {:<6} {:<24} {:>8} {:>8} {:>9} {:>9} {:>9}",
                 "Task", "Method", "Path", "Reqs", "Fails", "Avg(ms)", "Min(ms)", "Max(ms)")?;
        for (task, entry) in self.entries.iter() {
            writeln!(f, "{:<18} {:<6} {:<24} {:>8} {:>8} {:>9} {:>9} {:>9}",
                     task, entry.method.as_str(), entry.path, entry.requests, entry.failures,
                     entry.average_time().as_millis(), entry.min_time.as_millis(), entry.max_time.as_millis())?;
            for (status, count) in entry.status_codes.iter() {
                writeln!(f, " - {} = {}", status, count)?;
            }
        }
        writeln!(f, "Total: {} requests, {} failures", self.total_requests(), self.total_failures())?;
        write!(f, "")
    }
}
