use rand::rngs::StdRng;
use rand::Rng;
use serde_json::json;

use crate::loadtest::request::{webhook_path, Method, WebhookRequest};
use crate::loadtest::session::{Task, VirtualUser};

pub const DEFAULT_WEBHOOK: &str = "AAAA";

pub const MIN_RANDOM_BYTES: u16 = 1;

pub const MAX_RANDOM_BYTES: u16 = 100;

/// Exercises the load test rule behind a single webhook with GET requests
/// that carry a JSON body describing the work to do.
pub struct WebhookGetUser {
    webhook: String,
}

impl WebhookGetUser {
    pub fn new(webhook: impl Into<String>) -> Self {
        Self { webhook: webhook.into() }
    }

    fn get(&self, body: serde_json::Value) -> WebhookRequest {
        WebhookRequest::new(Method::Get, webhook_path(&self.webhook), body)
    }

    fn get_time(&self, _rng: &mut StdRng) -> WebhookRequest {
        self.get(json!({"get_time": true}))
    }

    fn get_random_bytes(&self, rng: &mut StdRng) -> WebhookRequest {
        let count = rng.gen_range(MIN_RANDOM_BYTES..=MAX_RANDOM_BYTES);
        self.get(json!({"get_random_bytes": count}))
    }

    fn use_cache(&self, _rng: &mut StdRng) -> WebhookRequest {
        self.get(json!({"use_cache": true}))
    }
}

impl VirtualUser for WebhookGetUser {
    fn tasks() -> Vec<Task<Self>> {
        vec![
            Task::new("get_time", Self::get_time),
            Task::new("get_random_bytes", Self::get_random_bytes),
            Task::new("use_cache", Self::use_cache),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn random_bytes_stay_between_1_and_100() {
        let user = WebhookGetUser::new(DEFAULT_WEBHOOK);
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = Vec::new();
        for _ in 0..5000 {
            let request = user.get_random_bytes(&mut rng);
            let object = request.body.as_object().unwrap();
            assert_eq!(object.len(), 1);
            let count = object["get_random_bytes"].as_u64().unwrap();
            assert!((1..=100).contains(&count), "out of range: {}", count);
            seen.push(count);
        }
        assert!(seen.contains(&1));
        assert!(seen.contains(&100));
    }

    #[test]
    fn every_task_hits_the_configured_webhook() {
        let mut rng = StdRng::seed_from_u64(9);
        for (webhook, expected) in [(DEFAULT_WEBHOOK, "/webhook/AAAA"), ("ZZZ9", "/webhook/ZZZ9")] {
            let user = WebhookGetUser::new(webhook);
            for task in WebhookGetUser::tasks() {
                let request = (task.run)(&user, &mut rng);
                assert_eq!(request.method, Method::Get);
                assert_eq!(request.path, expected, "task {}", task.name);
            }
        }
    }

    #[test]
    fn bodies_request_the_synthetic_workloads() {
        let user = WebhookGetUser::new(DEFAULT_WEBHOOK);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(user.get_time(&mut rng).body, json!({"get_time": true}));
        assert_eq!(user.use_cache(&mut rng).body, json!({"use_cache": true}));
    }
}
