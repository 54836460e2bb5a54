use std::sync::Arc;
use std::time::Duration;

use futures::future;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tokio::{select, signal, time};
use ureq::Agent;

use crate::loadtest::error::LoadTestError;
use crate::loadtest::options::LoadTestOptions;
use crate::loadtest::request;
use crate::loadtest::scheduler::SchedulerKind;
use crate::loadtest::session::{apply_weights, Task, VirtualUser, WaitTime};
use crate::loadtest::stats::{Stats, StatsReport};

/// Validated settings of one load test run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub host: String,
    pub users: usize,
    pub spawn_rate: f64,
    /// Pause between two user spawns, `1 / spawn_rate` seconds.
    pub spawn_interval: Duration,
    pub run_time: Option<Duration>,
    pub wait: WaitTime,
    pub scheduler: SchedulerKind,
    pub weights: Vec<u32>,
    pub timeout: Duration,
}

impl TryFrom<&LoadTestOptions> for RunConfig {
    type Error = LoadTestError;

    fn try_from(options: &LoadTestOptions) -> Result<Self, Self::Error> {
        let host = options.host.trim_end_matches('/').to_string();
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(LoadTestError::InvalidHost(options.host.clone()));
        }
        if options.users == 0 {
            return Err(LoadTestError::NoUsers);
        }
        if !(options.spawn_rate > 0.0 && options.spawn_rate.is_finite()) {
            return Err(LoadTestError::InvalidSpawnRate(options.spawn_rate));
        }
        let spawn_interval = Duration::try_from_secs_f64(1.0 / options.spawn_rate)
            .map_err(|_| LoadTestError::InvalidSpawnRate(options.spawn_rate))?;
        Ok(Self {
            host,
            users: options.users,
            spawn_rate: options.spawn_rate,
            spawn_interval,
            run_time: options.run_time,
            wait: WaitTime::between(options.min_wait, options.max_wait)?,
            scheduler: options.scheduler,
            weights: options.weights.clone(),
            timeout: Duration::from_secs(options.timeout),
        })
    }
}

/// Spawns `config.users` users built by `make_user` and drives them until the
/// run time is over or Ctrl-C is pressed. Requests still in flight at that
/// point are abandoned.
pub async fn run<U, F>(config: RunConfig, make_user: F) -> Result<StatsReport, LoadTestError>
where
    U: VirtualUser,
    F: Fn(usize) -> U,
{
    let mut tasks = U::tasks();
    apply_weights(&mut tasks, &config.weights)?;
    let tasks = Arc::new(tasks);

    let http_agent = request::build_agent(config.timeout);
    let stats = Stats::default();
    let config = Arc::new(config);
    let spawn_interval = config.spawn_interval;

    log::info!("Spawning {} users at {} users/s against {}", config.users, config.spawn_rate, config.host);

    let stop = stop_signal(config.run_time);
    tokio::pin!(stop);

    let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(config.users);
    let mut stopped = false;
    for user_id in 0..config.users {
        let user = make_user(user_id);
        handles.push(tokio::spawn(user_loop(
            user_id,
            user,
            tasks.clone(),
            config.clone(),
            http_agent.clone(),
            stats.clone(),
        )));
        if user_id + 1 == config.users {
            break;
        }
        select! {
            _ = time::sleep(spawn_interval) => {}
            _ = &mut stop => {
                stopped = true;
                break;
            }
        }
    }
    if !stopped {
        log::info!("All {} users spawned", handles.len());
        (&mut stop).await;
    }

    log::info!("Stopping {} users", handles.len());
    for handle in handles.iter() {
        handle.abort();
    }
    for result in future::join_all(handles).await {
        if let Err(e) = result {
            if !e.is_cancelled() {
                log::error!("User task failed: {}", e);
            }
        }
    }

    Ok(stats.report())
}

async fn stop_signal(run_time: Option<Duration>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Unable to listen for Ctrl-C: {}", e);
            future::pending::<()>().await;
        }
        log::info!("Ctrl-C received");
    };
    match run_time {
        Some(run_time) => select! {
            _ = time::sleep(run_time) => log::info!("Run time of {:?} elapsed", run_time),
            _ = ctrl_c => {}
        },
        None => ctrl_c.await,
    }
}

async fn user_loop<U: VirtualUser>(
    user_id: usize,
    mut user: U,
    tasks: Arc<Vec<Task<U>>>,
    config: Arc<RunConfig>,
    http_agent: Agent,
    stats: Stats,
) {
    let mut rng = StdRng::from_entropy();
    let mut scheduler = config.scheduler.build();
    let weights: Vec<u32> = tasks.iter().map(|task| task.weight).collect();

    user.on_start();
    log::debug!("User {} started", user_id);

    loop {
        let task = &tasks[scheduler.next_task(&weights, &mut rng)];
        let webhook_request = (task.run)(&user, &mut rng);

        let agent = http_agent.clone();
        let host = config.host.clone();
        let sent = tokio::task::spawn_blocking(move || {
            let outcome = request::send(&agent, &host, &webhook_request);
            (webhook_request, outcome)
        })
        .await;

        match sent {
            Ok((webhook_request, outcome)) => {
                if let Some(error) = &outcome.error {
                    log::debug!("[user:{}] {} {} failed: {}", user_id, webhook_request.method, webhook_request.path, error);
                }
                stats.record(task.name, &webhook_request, &outcome);
            }
            Err(e) => log::error!("[user:{}] Request task for {} failed: {}", user_id, task.name, e),
        }

        time::sleep(config.wait.sample(&mut rng)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loadtest::options::Scenario;
    use crate::loadtest::webhook_get::WebhookGetUser;
    use crate::loadtest::webhook_post::WebhookPostUser;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::Mutex;
    use std::thread;

    fn options(host: &str) -> LoadTestOptions {
        LoadTestOptions {
            host: host.to_string(),
            users: 2,
            spawn_rate: 100.0,
            run_time: Some(Duration::from_millis(500)),
            min_wait: 0.0,
            max_wait: 0.01,
            scheduler: SchedulerKind::Random,
            weights: Vec::new(),
            timeout: 5,
            scenario: Scenario::Get { webhook: "AAAA".to_string() },
        }
    }

    /// Answers every request with 200 and remembers request line and body.
    fn stub_server() -> (String, Arc<Mutex<Vec<(String, String)>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let host = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorded = seen.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let recorded = recorded.clone();
                thread::spawn(move || {
                    let mut stream = stream.unwrap();
                    let mut reader = BufReader::new(stream.try_clone().unwrap());
                    loop {
                        let mut request_line = String::new();
                        if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
                            return;
                        }
                        let mut content_length = 0;
                        loop {
                            let mut header = String::new();
                            reader.read_line(&mut header).unwrap();
                            let header = header.trim_end();
                            if header.is_empty() {
                                break;
                            }
                            if let Some((name, value)) = header.split_once(':') {
                                if name.eq_ignore_ascii_case("content-length") {
                                    content_length = value.trim().parse().unwrap();
                                }
                            }
                        }
                        let mut body = vec![0; content_length];
                        reader.read_exact(&mut body).unwrap();
                        recorded
                            .lock()
                            .unwrap()
                            .push((request_line.trim_end().to_string(), String::from_utf8(body).unwrap()));
                        if stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\nDone").is_err() {
                            return;
                        }
                    }
                });
            }
        });
        (host, seen)
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert_eq!(
            RunConfig::try_from(&options("localhost:4554")).unwrap_err(),
            LoadTestError::InvalidHost("localhost:4554".to_string())
        );

        let mut no_users = options("http://localhost:4554");
        no_users.users = 0;
        assert_eq!(RunConfig::try_from(&no_users).unwrap_err(), LoadTestError::NoUsers);

        let mut inverted = options("http://localhost:4554");
        inverted.min_wait = 5.0;
        inverted.max_wait = 1.0;
        assert!(matches!(RunConfig::try_from(&inverted), Err(LoadTestError::InvalidWaitRange { .. })));

        let mut no_spawn = options("http://localhost:4554");
        no_spawn.spawn_rate = 0.0;
        assert_eq!(RunConfig::try_from(&no_spawn).unwrap_err(), LoadTestError::InvalidSpawnRate(0.0));
    }

    #[test]
    fn rejects_values_that_overflow_a_duration() {
        let mut slow_spawn = options("http://localhost:4554");
        slow_spawn.spawn_rate = 1e-30;
        assert_eq!(RunConfig::try_from(&slow_spawn).unwrap_err(), LoadTestError::InvalidSpawnRate(1e-30));

        let mut long_wait = options("http://localhost:4554");
        long_wait.max_wait = 1e20;
        assert_eq!(
            RunConfig::try_from(&long_wait).unwrap_err(),
            LoadTestError::InvalidWaitRange { min: 0.0, max: 1e20 }
        );
    }

    #[test]
    fn spawn_interval_follows_spawn_rate() {
        let mut config_options = options("http://localhost:4554");
        config_options.spawn_rate = 4.0;
        let config = RunConfig::try_from(&config_options).unwrap();
        assert_eq!(config.spawn_interval, Duration::from_millis(250));
    }

    #[test]
    fn trailing_slash_is_dropped_from_host() {
        let config = RunConfig::try_from(&options("https://plaid.example.com/")).unwrap();
        assert_eq!(config.host, "https://plaid.example.com");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn get_users_hit_only_their_webhook() {
        let (host, seen) = stub_server();
        let config = RunConfig::try_from(&options(&host)).unwrap();

        let report = run(config, |_| WebhookGetUser::new("AAAA")).await.unwrap();

        assert!(report.total_requests() > 0);
        assert_eq!(report.total_failures(), 0);
        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        for (request_line, body) in seen.iter() {
            assert!(request_line.starts_with("GET /webhook/AAAA "), "unexpected {}", request_line);
            let body: serde_json::Value = serde_json::from_str(body).unwrap();
            assert_eq!(body.as_object().unwrap().len(), 1);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn post_users_send_the_configured_body() {
        let (host, seen) = stub_server();
        let mut options = options(&host);
        options.scheduler = SchedulerKind::RoundRobin;
        let config = RunConfig::try_from(&options).unwrap();

        let report = run(config, |_| WebhookPostUser::new(r#"{"a": 1}"#)).await.unwrap();

        assert!(report.total_requests() > 0);
        let seen = seen.lock().unwrap();
        for (request_line, body) in seen.iter() {
            assert!(request_line.starts_with("POST /webhook/LOADTEST"), "unexpected {}", request_line);
            assert_eq!(serde_json::from_str::<serde_json::Value>(body).unwrap(), serde_json::json!({"a": 1}));
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn mismatched_weights_fail_before_spawning() {
        let mut options = options("http://127.0.0.1:9");
        options.weights = vec![1, 1];
        let config = RunConfig::try_from(&options).unwrap();

        let err = run(config, |_| WebhookGetUser::new("AAAA")).await.unwrap_err();
        assert_eq!(err, LoadTestError::WeightCountMismatch { given: 2, expected: 3 });
    }
}
