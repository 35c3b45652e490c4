//! Client-side Await/Watch: `awaitEvent` and `awaitDecision` consume the
//! daemon's SSE mutation stream (falling back to polling `/rpc/decision-get`
//! when the stream is unavailable) and resolve a [`Matcher`] against events.

use std::io::{BufRead, BufReader};
use std::time::{Duration, Instant};

use beads_core::issue::DecisionPoint;
use serde::Serialize;

use crate::events::MutationEvent;
use crate::matcher::Matcher;

#[derive(Debug, Clone)]
pub struct AwaitClient {
    base_url: String,
    token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AwaitResult {
    pub event: Option<MutationEvent>,
    pub timed_out: bool,
    pub canceled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionResult {
    pub decision: Option<DecisionSummary>,
    pub timed_out: bool,
    pub canceled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionSummary {
    pub selected: String,
    pub reason: String,
    pub responded_by: String,
    pub responded_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&DecisionPoint> for DecisionSummary {
    fn from(d: &DecisionPoint) -> Self {
        Self {
            selected: d.selected_option.clone(),
            reason: d.response_text.clone(),
            responded_by: d.responded_by.clone(),
            responded_at: d.responded_at,
        }
    }
}

impl AwaitClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), token: token.into() }
    }

    fn agent(&self, timeout: Duration) -> ureq::Agent {
        let config = ureq::Agent::config_builder().timeout_global(Some(timeout)).build();
        ureq::Agent::new_with_config(config)
    }

    /// Connects to `/events?since=now`, buffers parsed events, and returns
    /// the first one the matcher accepts. `Canceled` is surfaced by callers
    /// that race this against their own cancellation signal; this method
    /// itself only distinguishes success from timeout.
    pub fn await_event(&self, matcher: &Matcher, timeout: Duration) -> AwaitResult {
        let deadline = Instant::now() + timeout;
        let url = format!("{}/events", self.base_url);
        let agent = self.agent(timeout);
        let response = match agent
            .get(&url)
            .header("Authorization", &format!("Bearer {}", self.token))
            .call()
        {
            Ok(r) => r,
            Err(_) => return AwaitResult { event: None, timed_out: true, canceled: false },
        };
        let mut reader = BufReader::new(response.into_body().into_reader());

        let mut data_line = String::new();
        loop {
            if Instant::now() >= deadline {
                return AwaitResult { event: None, timed_out: true, canceled: false };
            }
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => return AwaitResult { event: None, timed_out: true, canceled: false },
                Ok(_) => {}
                Err(_) => return AwaitResult { event: None, timed_out: true, canceled: false },
            }
            let trimmed = line.trim_end();
            if let Some(payload) = trimmed.strip_prefix("data:") {
                data_line = payload.trim().to_string();
                continue;
            }
            if trimmed.is_empty() && !data_line.is_empty() {
                if let Ok(event) = serde_json::from_str::<MutationEvent>(&data_line) {
                    if matcher.is_empty() || matcher.matches(&event) {
                        return AwaitResult { event: Some(event), timed_out: false, canceled: false };
                    }
                }
                data_line.clear();
            }
        }
    }

    /// Initial state check, then SSE subscription naming `issue_id`, then a
    /// polling fallback against `/rpc/decision-get` if the stream errors.
    pub fn await_decision(&self, issue_id: &str, timeout: Duration) -> DecisionResult {
        if let Some(decision) = self.fetch_decision(issue_id) {
            if decision.is_responded() {
                return DecisionResult {
                    decision: Some(DecisionSummary::from(&decision)),
                    timed_out: false,
                    canceled: false,
                };
            }
        }

        let matcher = Matcher::new().issue(issue_id).event_type("decision_responded");
        let deadline = Instant::now() + timeout;
        let remaining = |now: Instant| deadline.saturating_duration_since(now);

        loop {
            let now = Instant::now();
            if now >= deadline {
                return DecisionResult { decision: None, timed_out: true, canceled: false };
            }
            let result = self.await_event(&matcher, remaining(now).min(Duration::from_secs(5)));
            if result.timed_out && result.event.is_none() {
                // SSE unreachable or quiet this slice; fall back to polling.
                if let Some(decision) = self.fetch_decision(issue_id) {
                    if decision.is_responded() {
                        return DecisionResult {
                            decision: Some(DecisionSummary::from(&decision)),
                            timed_out: false,
                            canceled: false,
                        };
                    }
                }
                if Instant::now() >= deadline {
                    return DecisionResult { decision: None, timed_out: true, canceled: false };
                }
                continue;
            }
            if let Some(decision) = self.fetch_decision(issue_id) {
                if decision.is_responded() {
                    return DecisionResult {
                        decision: Some(DecisionSummary::from(&decision)),
                        timed_out: false,
                        canceled: false,
                    };
                }
            }
        }
    }

    fn fetch_decision(&self, issue_id: &str) -> Option<DecisionPoint> {
        let url = format!("{}/rpc/decision-get", self.base_url);
        let mut response = ureq::post(&url).send_json(serde_json::json!({ "id": issue_id })).ok()?;
        let body: serde_json::Value = response.body_mut().read_json().ok()?;
        let data = body.get("Data")?;
        if data.is_null() {
            return None;
        }
        serde_json::from_value(data.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_summary_carries_selected_and_responder() {
        let point = DecisionPoint {
            prompt: "proceed?".to_string(),
            options: vec!["yes".to_string(), "no".to_string()],
            selected_option: "yes".to_string(),
            response_text: "looks good".to_string(),
            responded_by: "alice".to_string(),
            responded_at: Some(chrono::Utc::now()),
        };
        let summary = DecisionSummary::from(&point);
        assert_eq!(summary.selected, "yes");
        assert_eq!(summary.responded_by, "alice");
        assert!(summary.responded_at.is_some());
    }

    #[test]
    fn await_event_against_unreachable_daemon_times_out() {
        let client = AwaitClient::new("http://127.0.0.1:1", "token");
        let result = client.await_event(&Matcher::new(), Duration::from_millis(200));
        assert!(result.timed_out);
        assert!(result.event.is_none());
    }
}
