//! Service metrics.
//!
//! Labels carry outcomes only, never endpoints or payloads.
//!
//! - `resource_dispatch_total{outcome}`: one per network attempt
//! - `resource_retry_total`: attempts beyond the first
//! - `resource_cache_total{event}`: hit, miss, store, not_modified, fallback
//! - `resource_fake_total{outcome}`: decoy requests sent
//! - `resource_load_duration_seconds{outcome}`: whole load, retries included
//! - `resource_cache_entries`: current size of the response cache

use metrics::{counter, gauge, histogram};
use std::time::Duration;

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_ERROR: &str = "error";
pub const OUTCOME_FALLBACK: &str = "fallback";

pub const CACHE_HIT: &str = "hit";
pub const CACHE_MISS: &str = "miss";
pub const CACHE_STORE: &str = "store";
pub const CACHE_NOT_MODIFIED: &str = "not_modified";
pub const CACHE_FALLBACK: &str = "fallback";

pub fn record_dispatch(outcome: &str) {
    counter!("resource_dispatch_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn record_retry() {
    counter!("resource_retry_total").increment(1);
}

pub fn record_cache_event(event: &'static str) {
    counter!("resource_cache_total", "event" => event).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("resource_cache_entries").set(entries as f64);
}

pub fn record_fake(outcome: &'static str) {
    counter!("resource_fake_total", "outcome" => outcome).increment(1);
}

pub fn record_load(outcome: &'static str, duration: Duration) {
    histogram!("resource_load_duration_seconds", "outcome" => outcome).record(duration.as_secs_f64());
}
