//! Acquisition metrics
//!
//! Emitted through the `metrics` facade; the host process decides whether a
//! recorder is installed. Without one these calls are no-ops.
//!
//! - `anisette_endpoint_attempts_total` (counter): label `outcome`
//!   (`success`, `transport`, `http_status`, `parse`)
//! - `anisette_fetch_failures_total` (counter): every candidate failed

/// Record the outcome of one endpoint attempt.
pub fn record_attempt(outcome: &'static str) {
    metrics::counter!("anisette_endpoint_attempts_total", "outcome" => outcome).increment(1);
}

/// Record an acquisition where no endpoint produced a credential.
pub fn record_fetch_failure() {
    metrics::counter!("anisette_fetch_failures_total").increment(1);
}
