use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::loadtest::scheduler::SchedulerKind;
use crate::loadtest::webhook_get::DEFAULT_WEBHOOK;
use crate::loadtest::webhook_post::DEFAULT_JSON_BODY;

/// Swarms Plaid's webhook endpoints with simulated users.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct LoadTestOptions {
    /// The base URL of the Plaid instance under test
    #[clap(long, env = "LOCUST_HOST", default_value = "http://localhost:4554")]
    pub host: String,

    /// Number of concurrent users
    #[clap(short, long, default_value = "1")]
    pub users: usize,

    /// Users started per second
    #[clap(short = 'r', long, default_value = "1")]
    pub spawn_rate: f64,

    /// Stop after this long, e.g. 30s, 5m or 1h30m. Runs until Ctrl-C if omitted.
    #[clap(short = 't', long, parse(try_from_str = parse_run_time))]
    pub run_time: Option<Duration>,

    /// Minimum pause between two tasks of a user, in seconds
    #[clap(long, default_value = "1")]
    pub min_wait: f64,

    /// Maximum pause between two tasks of a user, in seconds
    #[clap(long, default_value = "5")]
    pub max_wait: f64,

    /// How a user picks its next task: random or round-robin
    #[clap(long, default_value = "random")]
    pub scheduler: SchedulerKind,

    /// Comma separated task weights, one per task of the scenario
    #[clap(long, value_delimiter = ',')]
    pub weights: Vec<u32>,

    /// Timeout for the individual reads and writes of the socket in seconds
    #[clap(long, default_value = "30")]
    pub timeout: u64,

    #[clap(subcommand)]
    pub scenario: Scenario,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Scenario {
    /// POST a JSON body to the LOADTEST1, LOADTEST2 and LOADTEST4 webhooks
    Post {
        /// The JSON body sent with every request
        #[clap(long, env = "LOCUST_JSON_BODY", default_value = DEFAULT_JSON_BODY)]
        json_body: String,
    },
    /// GET a single webhook asking for time, random bytes or cache work
    Get {
        /// The webhook identifier, the last segment of /webhook/{id}
        #[clap(long, env = "LOCUST_WEBHOOK", default_value = DEFAULT_WEBHOOK)]
        webhook: String,
    },
}

/// Parses durations like `90s`, `5m`, `2h` or `1h30m`. A bare number is seconds.
pub fn parse_run_time(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Run time cannot be empty".to_string());
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = 0u64;
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let value: u64 = digits
            .parse()
            .map_err(|_| format!("Invalid run time: '{}'. Use formats like '30s', '5m', '1h30m'.", s))?;
        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 24 * 60 * 60,
            _ => return Err(format!("Unknown run time unit: '{}'. Use 's', 'm', 'h' or 'd'.", c)),
        };
        total = value
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| format!("Run time '{}' is too long", s))?;
        digits.clear();
    }
    if !digits.is_empty() {
        return Err(format!("Missing unit after '{}' in run time '{}'", digits, s));
    }
    Ok(Duration::from_secs(total))
}

pub fn parse_options() -> LoadTestOptions {
    Parser::parse()
}
