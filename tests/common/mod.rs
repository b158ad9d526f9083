//! Common test utilities for courier integration tests
//!
//! - A scripted in-process transport double for driving the pipeline
//! - CLI invocation helpers for the `courier` binary

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;

use courier::{Configuration, CourierError, InternalRequest, Response, Result, Transport};
use tempfile::TempDir;

/// One scripted answer
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(Response),
    Fail(String),
    Delayed(Duration, Response),
}

/// Transport double answering from per-URL scripts
///
/// Each URL has a queue of replies; the last one repeats once the queue is
/// down to it. Every request sent is recorded in order.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    log: Mutex<Vec<InternalRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, url: &str, reply: Reply) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn ok(self, url: &str, body: &str) -> Self {
        self.on(url, Reply::Respond(Response::new(200).with_reason_phrase("OK").with_body(body.to_string())))
    }

    pub fn redirect(self, url: &str, status: u16, location: &str) -> Self {
        self.on(url, Reply::Respond(Response::new(status).with_header("Location", location)))
    }

    pub fn fail(self, url: &str, message: &str) -> Self {
        self.on(url, Reply::Fail(message.to_string()))
    }

    pub fn delayed(self, url: &str, delay: Duration, body: &str) -> Self {
        self.on(url, Reply::Delayed(delay, Response::new(200).with_body(body.to_string())))
    }

    /// Every request sent so far, in send order
    pub fn requests(&self) -> Vec<InternalRequest> {
        self.log.lock().unwrap().clone()
    }

    /// How many times `url` was sent
    pub fn hits(&self, url: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|r| r.url() == url).count()
    }

    fn next_reply(&self, url: &str) -> Option<Reply> {
        let mut routes = self.routes.lock().unwrap();
        let queue = routes.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, request: &InternalRequest, _config: &Configuration) -> Result<Response> {
        self.log.lock().unwrap().push(request.clone());

        match self.next_reply(request.url()) {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(CourierError::transport(request.url(), "scripted", message)),
            Some(Reply::Delayed(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            None => Err(CourierError::transport(request.url(), "scripted", "no route")),
        }
    }
}

/// Output of one `courier` run
#[derive(Debug)]
pub struct CliResponse {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CliResponse {
    pub fn contains(&self, needle: &str) -> bool {
        self.stdout.contains(needle)
    }

    pub fn count(&self, needle: &str) -> usize {
        self.stdout.matches(needle).count()
    }
}

/// Run the `courier` binary with an isolated, empty configuration
pub fn courier(args: &[&str]) -> CliResponse {
    let dir = TempDir::new().expect("Failed to create temp dir");
    run(&dir.path().join("config.toml"), args)
}

/// Run the `courier` binary with `toml` as its configuration file
pub fn courier_with_config(toml: &str, args: &[&str]) -> CliResponse {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = dir.path().join("config.toml");
    std::fs::write(&config, toml).expect("Failed to write config");
    run(&config, args)
}

fn run(config: &Path, args: &[&str]) -> CliResponse {
    let output = Command::new(env!("CARGO_BIN_EXE_courier"))
        .args(["--timeout", "2", "--config"])
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("COURIER_MAX_REDIRECTS")
        .env_remove("COURIER_TIMEOUT")
        .env_remove("COURIER_CONFIG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to run courier");

    CliResponse {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
    }
}
