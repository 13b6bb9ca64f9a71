//! Secondary statistics derived from a finished run's metrics snapshot.
//!
//! Everything here is pure and total: absent snapshot paths read as 0 and
//! every division guards its denominator, so a report can always be
//! produced, including from a zero-request or fully-failed run.

use serde::Serialize;

use crate::models::config::{RunConfig, Variant};
use crate::models::metrics::MetricsSnapshot;

/// Three-valued presentation classification of a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Good,
    Warning,
    Critical,
}

impl Status {
    /// Classify `value` against two thresholds. `inverse` flips the
    /// direction for lower-is-better metrics such as latency. The good
    /// boundary is inclusive in both modes.
    pub fn classify(value: f64, good: f64, warning: f64, inverse: bool) -> Self {
        if inverse {
            if value <= good {
                Status::Good
            } else if value <= warning {
                Status::Warning
            } else {
                Status::Critical
            }
        } else if value >= good {
            Status::Good
        } else if value >= warning {
            Status::Warning
        } else {
            Status::Critical
        }
    }

    /// Palette color used by the report.
    pub fn color(self) -> &'static str {
        match self {
            Status::Good => "#4ade80",
            Status::Warning => "#fbbf24",
            Status::Critical => "#f87171",
        }
    }
}

/// Flat record of everything the report renders. Computed fresh per report;
/// the `Option` fields are populated only for the throughput variant.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub total_requests: f64,
    pub test_duration: f64,
    pub actual_rps: f64,
    pub rps_efficiency: f64,
    pub success_rate: f64,
    pub error_rate: f64,
    pub failed_requests: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_throughput: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_payloads: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful_payloads: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_payloads: Option<f64>,

    pub min_latency: f64,
    pub avg_latency: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub max_latency: f64,

    pub avg_connecting: f64,
    pub avg_tls_handshake: f64,
    pub avg_waiting: f64,
    pub avg_receiving: f64,
    pub avg_sending: f64,

    pub data_sent: f64,
    pub data_received: f64,
    pub avg_request_size: f64,
    pub avg_response_size: f64,

    pub max_vus: f64,
}

/// Derive the report metrics from a snapshot and the run configuration.
pub fn compute_derived(
    snapshot: &MetricsSnapshot,
    config: &RunConfig,
    variant: Variant,
) -> DerivedMetrics {
    let total_requests = snapshot.value("http_reqs", "count");
    let test_duration = snapshot.state.test_run_duration_ms / 1000.0;
    let actual_rps = if test_duration > 0.0 {
        total_requests / test_duration
    } else {
        0.0
    };
    let rps_efficiency = if config.target_rps > 0 {
        actual_rps / config.target_rps as f64 * 100.0
    } else {
        0.0
    };

    let success_rate = snapshot.value("successes", "rate") * 100.0;
    let error_rate = snapshot.value("errors", "rate") * 100.0;
    let dropped = snapshot.value("dropped_requests", "count");
    // An absent (or zero) dropped counter falls back to the rate estimate.
    let failed_requests = if dropped > 0.0 {
        dropped
    } else {
        (total_requests * error_rate / 100.0).round()
    };

    let data_sent = snapshot.value("data_sent", "count");
    let data_received = snapshot.value("data_received", "count");
    let avg_request_size = if total_requests > 0.0 {
        data_sent / total_requests
    } else {
        0.0
    };
    let avg_response_size = if total_requests > 0.0 {
        data_received / total_requests
    } else {
        0.0
    };

    let vus_max = snapshot.value("vus_max", "max");
    let max_vus = if vus_max > 0.0 {
        vus_max
    } else {
        snapshot.value("vus", "max")
    };

    let mut derived = DerivedMetrics {
        total_requests,
        test_duration,
        actual_rps,
        rps_efficiency,
        success_rate,
        error_rate,
        failed_requests,

        min_latency: snapshot.value("http_req_duration", "min"),
        avg_latency: snapshot.value("http_req_duration", "avg"),
        p50: snapshot.value("http_req_duration", "med"),
        p90: snapshot.value("http_req_duration", "p(90)"),
        p95: snapshot.value("http_req_duration", "p(95)"),
        p99: snapshot.value("http_req_duration", "p(99)"),
        max_latency: snapshot.value("http_req_duration", "max"),

        avg_connecting: snapshot.value("http_req_connecting", "avg"),
        avg_tls_handshake: snapshot.value("http_req_tls_handshaking", "avg"),
        avg_waiting: snapshot.value("http_req_waiting", "avg"),
        avg_receiving: snapshot.value("http_req_receiving", "avg"),
        avg_sending: snapshot.value("http_req_sending", "avg"),

        data_sent,
        data_received,
        avg_request_size,
        avg_response_size,

        max_vus,
        ..Default::default()
    };

    if variant == Variant::Throughput {
        let bulk_size = config.bulk_size as f64;
        let counted = snapshot.value("total_payloads", "count");
        let total_payloads = if counted > 0.0 {
            counted
        } else {
            total_requests * bulk_size
        };
        let failed_payloads = snapshot.value("failed_payloads", "count");
        derived.actual_throughput = Some(actual_rps * bulk_size);
        derived.total_payloads = Some(total_payloads);
        derived.failed_payloads = Some(failed_payloads);
        derived.successful_payloads = Some(total_payloads - failed_payloads);
    }

    derived
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(target_rps: u64, bulk_size: u64) -> RunConfig {
        RunConfig {
            api_url: "https://example.com/api/v1/flows/f1".into(),
            api_key: "key".into(),
            test_duration: "4m".into(),
            target_rps,
            bulk_size,
        }
    }

    #[test]
    fn healthy_qps_run() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set("http_reqs", "count", 120_000.0);
        snapshot.state.test_run_duration_ms = 240_000.0;
        snapshot.set("successes", "rate", 0.995);
        snapshot.set("http_req_duration", "p(95)", 150.0);

        let d = compute_derived(&snapshot, &config(500, 1), Variant::Qps);
        assert_eq!(d.actual_rps, 500.0);
        assert_eq!(d.rps_efficiency, 100.0);
        assert!((d.success_rate - 99.5).abs() < 1e-9);
        assert_eq!(Status::classify(d.success_rate, 99.0, 95.0, false), Status::Good);
        assert_eq!(Status::classify(d.p95, 200.0, 500.0, true), Status::Good);
    }

    #[test]
    fn empty_run_degrades_to_zero() {
        let snapshot = MetricsSnapshot::default();
        let d = compute_derived(&snapshot, &config(500, 1), Variant::Qps);
        assert_eq!(d.total_requests, 0.0);
        assert_eq!(d.actual_rps, 0.0);
        assert_eq!(d.avg_request_size, 0.0);
        assert_eq!(d.avg_response_size, 0.0);
        assert_eq!(d.failed_requests, 0.0);
        assert_eq!(
            Status::classify(d.success_rate, 99.0, 95.0, false),
            Status::Critical
        );
    }

    #[test]
    fn zero_target_rps_means_zero_efficiency() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set("http_reqs", "count", 1000.0);
        snapshot.state.test_run_duration_ms = 10_000.0;
        let d = compute_derived(&snapshot, &config(0, 1), Variant::Qps);
        assert!(d.actual_rps > 0.0);
        assert_eq!(d.rps_efficiency, 0.0);
    }

    #[test]
    fn failed_requests_prefers_dropped_counter() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set("http_reqs", "count", 1000.0);
        snapshot.set("errors", "rate", 0.10);
        snapshot.set("dropped_requests", "count", 42.0);
        let d = compute_derived(&snapshot, &config(500, 1), Variant::Qps);
        assert_eq!(d.failed_requests, 42.0);
    }

    #[test]
    fn failed_requests_falls_back_to_rate_estimate() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set("http_reqs", "count", 1001.0);
        snapshot.set("errors", "rate", 0.10);
        let d = compute_derived(&snapshot, &config(500, 1), Variant::Qps);
        assert_eq!(d.failed_requests, 100.0);
    }

    #[test]
    fn throughput_payload_identities_hold() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set("http_reqs", "count", 2400.0);
        snapshot.state.test_run_duration_ms = 240_000.0;
        snapshot.set("total_payloads", "count", 120_000.0);
        snapshot.set("failed_payloads", "count", 500.0);

        let cfg = config(100, 50);
        let d = compute_derived(&snapshot, &cfg, Variant::Throughput);
        assert_eq!(d.actual_throughput, Some(d.actual_rps * 50.0));
        assert_eq!(d.total_payloads, Some(120_000.0));
        assert_eq!(d.failed_payloads, Some(500.0));
        assert_eq!(d.successful_payloads, Some(119_500.0));
    }

    #[test]
    fn missing_payload_counter_estimates_from_bulk_size() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set("http_reqs", "count", 100.0);
        let d = compute_derived(&snapshot, &config(100, 50), Variant::Throughput);
        assert_eq!(d.total_payloads, Some(5000.0));
        assert_eq!(d.successful_payloads, Some(5000.0));
    }

    #[test]
    fn qps_variant_leaves_payload_fields_unset() {
        let snapshot = MetricsSnapshot::default();
        let d = compute_derived(&snapshot, &config(500, 1), Variant::Qps);
        assert!(d.actual_throughput.is_none());
        assert!(d.total_payloads.is_none());
    }

    #[test]
    fn vus_max_falls_back_to_vus_metric() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set("vus", "max", 37.0);
        let d = compute_derived(&snapshot, &config(500, 1), Variant::Qps);
        assert_eq!(d.max_vus, 37.0);
    }

    #[test]
    fn classifier_good_boundary_is_inclusive() {
        assert_eq!(Status::classify(99.0, 99.0, 95.0, false), Status::Good);
        assert_eq!(Status::classify(98.9, 99.0, 95.0, false), Status::Warning);
        assert_eq!(Status::classify(94.9, 99.0, 95.0, false), Status::Critical);

        assert_eq!(Status::classify(200.0, 200.0, 500.0, true), Status::Good);
        assert_eq!(Status::classify(200.1, 200.0, 500.0, true), Status::Warning);
        assert_eq!(Status::classify(500.1, 200.0, 500.0, true), Status::Critical);
    }
}
