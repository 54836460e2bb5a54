use std::fmt;
use std::time::{Duration, Instant};

use serde_json::Value;
use ureq::{Agent, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request a task wants sent. The body always goes out as JSON, GET included.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookRequest {
    pub method: Method,
    pub path: String,
    pub body: Value,
}

impl WebhookRequest {
    pub fn new(method: Method, path: impl Into<String>, body: Value) -> Self {
        Self { method, path: path.into(), body }
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    /// `None` when no HTTP response came back at all.
    pub status: Option<u16>,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(status) if (200..400).contains(&status))
    }
}

pub fn webhook_path(webhook_id: &str) -> String {
    format!("/webhook/{}", webhook_id)
}

pub fn join_url(host: &str, path: &str) -> String {
    format!("{}/{}", host.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// One agent shared by every user. `timeout` bounds connect, read and write.
pub fn build_agent(timeout: Duration) -> Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout_read(timeout)
        .timeout_write(timeout)
        .build()
}

/// Sends the request and waits for the whole response body.
pub fn send(agent: &Agent, host: &str, request: &WebhookRequest) -> Outcome {
    let url = join_url(host, &request.path);
    let started = Instant::now();
    let result = agent
        .request(request.method.as_str(), &url)
        .set("Content-Type", "application/json")
        .send_string(&request.body.to_string());

    let (response, error) = match result {
        Ok(response) => (Some(response), None),
        Err(Error::Status(code, response)) => {
            /* the server returned an unexpected status
            code (such as 400, 500 etc) */
            (Some(response), Some(format!("HTTP {}", code)))
        }
        Err(e) => (None, Some(e.to_string())),
    };

    let status = response.map(|response| {
        let status = response.status();
        // drain the body so the connection goes back to the pool
        if let Err(e) = response.into_string() {
            log::debug!("Unable to read the response body of {} {}: {}", request.method, request.path, e);
        }
        status
    });

    Outcome { status, elapsed: started.elapsed(), error }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("http://localhost:4554", "/webhook/A"), "http://localhost:4554/webhook/A");
        assert_eq!(join_url("http://localhost:4554/", "/webhook/A"), "http://localhost:4554/webhook/A");
        assert_eq!(join_url("http://localhost:4554", "webhook/A"), "http://localhost:4554/webhook/A");
    }

    #[test]
    fn webhook_path_prefixes_the_id() {
        assert_eq!(webhook_path("AAAA"), "/webhook/AAAA");
    }

    #[test]
    fn only_2xx_and_3xx_count_as_success() {
        let outcome = |status| Outcome { status, elapsed: Duration::ZERO, error: None };
        assert!(outcome(Some(200)).is_success());
        assert!(outcome(Some(302)).is_success());
        assert!(!outcome(Some(404)).is_success());
        assert!(!outcome(Some(500)).is_success());
        assert!(!outcome(None).is_success());
    }

    #[test]
    fn unreachable_host_is_a_transport_failure() {
        let agent = build_agent(Duration::from_secs(2));
        let request = WebhookRequest::new(Method::Post, "/webhook/LOADTEST1", serde_json::json!({"key": "value"}));
        // port 9 is discard; nothing listens there on a test box
        let outcome = send(&agent, "http://127.0.0.1:9", &request);
        assert_eq!(outcome.status, None);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn connect_to_a_silent_host_gives_up_after_the_timeout() {
        let agent = build_agent(Duration::from_secs(1));
        let request = WebhookRequest::new(Method::Get, "/webhook/AAAA", serde_json::json!({"get_time": true}));
        // non-routable address: the SYN goes nowhere, or the route is refused outright
        let outcome = send(&agent, "http://10.255.255.1:4554", &request);
        assert_eq!(outcome.status, None);
        assert!(outcome.elapsed < Duration::from_secs(10), "took {:?}", outcome.elapsed);
    }
}
