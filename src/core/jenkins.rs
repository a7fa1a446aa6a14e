//! Jenkins REST client: triggers jobs and watches them to completion.
//!
//! Job metadata comes from the classic JSON API; run progress comes from the
//! pipeline workflow API (`wfapi/describe`). In-flight remote faults never
//! abort a chain run — they fold into a failed trigger outcome so the report
//! records them against the alias that hit them.

use std::thread;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use reqwest::blocking::{Client, Response};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{Error, ErrorCode, Result};
use crate::executor::{JobTrigger, TriggerOutcome};
use crate::log_status;

/// Delay between successive status polls of a running build.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Attempts to fetch workflow data before giving up on a build that never
/// materializes (queued builds take a moment to show up).
const DESCRIBE_RETRIES: u32 = 20;

/// Ceiling on status polls for a single build (~2 hours at 2s apart).
const MAX_STATUS_POLLS: u32 = 3600;

fn http_error(e: reqwest::Error) -> Error {
    Error::new(
        ErrorCode::RemoteRequestFailed,
        format!("HTTP request failed: {}", e),
        json!({ "error": e.to_string() }),
    )
}

fn api_error(status: u16, body: &str) -> Error {
    Error::new(
        ErrorCode::RemoteRequestFailed,
        format!("Jenkins API error: HTTP {}", status),
        json!({ "status": status, "body": body }),
    )
}

fn poll_timeout_error(job: &str, build_number: i64) -> Error {
    Error::new(
        ErrorCode::RemoteRequestFailed,
        format!(
            "Build #{} of '{}' did not reach a terminal status within the polling window",
            build_number, job
        ),
        json!({ "job": job, "buildNumber": build_number }),
    )
}

fn parse_error(msg: impl Into<String>) -> Error {
    Error::new(ErrorCode::InternalJsonError, msg, Value::Null)
}

/// Terminal state of one remote build.
struct CompletedBuild {
    number: i64,
    status: String,
    duration_ms: Option<u64>,
}

/// Blocking client for one Jenkins controller.
pub struct JenkinsClient {
    client: Client,
    endpoint: String,
    auth_header: String,
}

impl JenkinsClient {
    /// Creates a client for `endpoint` authenticating with HTTP basic auth.
    pub fn new(endpoint: &str, username: &str, api_token: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::remote_init_failed(endpoint, e.to_string()))?;

        let credentials = BASE64_STANDARD.encode(format!("{}:{}", username, api_token));

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {}", credentials),
        })
    }

    /// Creates a client from a loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.endpoint,
            &config.auth.username,
            &config.auth.api_token,
        )
    }

    /// Next build number the controller will assign to `job`.
    pub fn next_build_number(&self, job: &str) -> Result<i64> {
        let url = format!("{}/{}/api/json", self.endpoint, job_path(job));
        let body = self.get_json(&url)?;

        body.get("nextBuildNumber")
            .and_then(Value::as_i64)
            .ok_or_else(|| parse_error(format!("No nextBuildNumber in job info for '{}'", job)))
    }

    /// Asks the controller to start a build of `job`.
    fn start_build(&self, job: &str) -> Result<()> {
        let url = format!("{}/{}/build", self.endpoint, job_path(job));
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .send()
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        Ok(())
    }

    /// Fetches the workflow description of one build, if it exists yet.
    fn describe(&self, job: &str, build_number: i64) -> Result<Value> {
        let url = format!(
            "{}/{}/{}/wfapi/describe",
            self.endpoint,
            job_path(job),
            build_number
        );
        self.get_json(&url)
    }

    /// Polls the workflow API until the build reaches a terminal status.
    ///
    /// The build number is resolved before the trigger, so the first polls can
    /// land before the build exists; those misses are retried. Once the build
    /// has been observed, a failing describe call fails the build.
    fn wait_for_completion(&self, job: &str, build_number: i64) -> Result<CompletedBuild> {
        let mut misses = 0;
        let mut seen = false;

        for _ in 0..MAX_STATUS_POLLS {
            match self.describe(job, build_number) {
                Ok(info) => {
                    seen = true;
                    let status = info
                        .get("status")
                        .and_then(Value::as_str)
                        .unwrap_or("IN_PROGRESS")
                        .to_string();

                    if is_terminal(&status) {
                        return Ok(CompletedBuild {
                            number: build_number,
                            status,
                            duration_ms: info.get("durationMillis").and_then(Value::as_u64),
                        });
                    }
                }
                Err(e) => {
                    if seen {
                        return Err(e);
                    }
                    misses += 1;
                    if misses >= DESCRIBE_RETRIES {
                        return Err(e);
                    }
                }
            }

            thread::sleep(POLL_INTERVAL);
        }

        Err(poll_timeout_error(job, build_number))
    }

    /// Runs `job` to completion: resolve the upcoming build number, start the
    /// build, then poll until the controller reports a terminal status.
    fn run_to_completion(&self, job: &str) -> Result<CompletedBuild> {
        let build_number = self.next_build_number(job)?;
        self.start_build(job)?;
        log_status!("jenkins", "Started '{}' #{}", job, build_number);
        self.wait_for_completion(job, build_number)
    }

    fn get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .send()
            .map_err(http_error)?;
        parse_json_response(response)
    }
}

impl JobTrigger for JenkinsClient {
    fn trigger(&self, job: &str) -> TriggerOutcome {
        match self.run_to_completion(job) {
            Ok(build) => trigger_outcome(build),
            Err(e) => TriggerOutcome::failure(e.to_string()),
        }
    }
}

fn trigger_outcome(build: CompletedBuild) -> TriggerOutcome {
    let mut outcome = if build.status == "SUCCESS" {
        TriggerOutcome::success()
    } else {
        TriggerOutcome::failure(format!("build finished with status {}", build.status))
    };

    outcome = outcome.with_build_number(build.number);
    if let Some(ms) = build.duration_ms {
        outcome = outcome.with_duration_ms(ms);
    }
    outcome
}

/// Maps a `folder/job` path onto the controller's URL layout.
fn job_path(job: &str) -> String {
    let segments: Vec<String> = job
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| format!("job/{}", urlencoding::encode(s)))
        .collect();
    segments.join("/")
}

/// Statuses after which the workflow API reports no further progress.
fn is_terminal(status: &str) -> bool {
    matches!(
        status,
        "SUCCESS" | "FAILED" | "ABORTED" | "UNSTABLE" | "NOT_EXECUTED"
    )
}

fn parse_json_response(response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().map_err(http_error)?;

    if !status.is_success() {
        return Err(api_error(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| parse_error(format!("Invalid JSON response: {}", e)))
}
