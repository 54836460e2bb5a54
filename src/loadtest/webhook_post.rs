use std::io::{self, Write};

use rand::rngs::StdRng;
use serde_json::{json, Value};

use crate::loadtest::request::{webhook_path, Method, WebhookRequest};
use crate::loadtest::session::{Task, VirtualUser};

pub const DEFAULT_JSON_BODY: &str = r#"{"key": "value"}"#;

pub const MSG_INVALID_JSON_BODY: &str = "Invalid JSON in LOCUST_JSON_BODY, falling back to default.";

/// Parses the configured body, falling back to `{"key": "value"}` on bad JSON.
/// The fallback is announced on stdout.
pub fn parse_json_body(raw: &str) -> Value {
    parse_json_body_reporting(raw, &mut io::stdout())
}

fn parse_json_body_reporting(raw: &str, out: &mut impl Write) -> Value {
    match serde_json::from_str(raw) {
        Ok(body) => body,
        Err(e) => {
            if let Err(write_error) = writeln!(out, "{}", MSG_INVALID_JSON_BODY) {
                log::error!("Unable to print the JSON body warning: {}", write_error);
            }
            log::warn!("LOCUST_JSON_BODY is not valid JSON: {}", e);
            json!({"key": "value"})
        }
    }
}

/// POSTs the same JSON body to the LOADTEST webhooks.
pub struct WebhookPostUser {
    raw_body: String,
    json_body: Value,
}

impl WebhookPostUser {
    pub fn new(raw_body: impl Into<String>) -> Self {
        Self { raw_body: raw_body.into(), json_body: Value::Null }
    }

    fn post(&self, webhook_id: &str) -> WebhookRequest {
        WebhookRequest::new(Method::Post, webhook_path(webhook_id), self.json_body.clone())
    }

    fn post_request_1(&self, _rng: &mut StdRng) -> WebhookRequest {
        self.post("LOADTEST1")
    }

    fn post_request_2(&self, _rng: &mut StdRng) -> WebhookRequest {
        self.post("LOADTEST2")
    }

    fn post_request_4(&self, _rng: &mut StdRng) -> WebhookRequest {
        self.post("LOADTEST4")
    }
}

impl VirtualUser for WebhookPostUser {
    fn on_start(&mut self) {
        self.json_body = parse_json_body(&self.raw_body);
    }

    fn tasks() -> Vec<Task<Self>> {
        vec![
            Task::new("post_request_1", Self::post_request_1),
            Task::new("post_request_2", Self::post_request_2),
            Task::new("post_request_4", Self::post_request_4),
        ]
    }
}
