use std::collections::BTreeMap;

use serde::Serialize;

/// Final metrics snapshot produced by the load driver and consumed (read
/// only) by the report layer. Addressing mirrors the raw results layout:
/// `metrics.<name>.values.<field>`, with any absent path reading as 0.
#[derive(Debug, Default, Serialize)]
pub struct MetricsSnapshot {
    pub metrics: BTreeMap<String, Metric>,
    pub state: RunState,
}

#[derive(Debug, Default, Serialize)]
pub struct Metric {
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Default, Serialize)]
pub struct RunState {
    #[serde(rename = "testRunDurationMs")]
    pub test_run_duration_ms: f64,
}

impl MetricsSnapshot {
    /// Lookup with default: an absent metric or field reads as 0. This is
    /// the single place the sparse-snapshot contract lives.
    pub fn value(&self, metric: &str, field: &str) -> f64 {
        self.metrics
            .get(metric)
            .and_then(|m| m.values.get(field))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, metric: &str, field: &str, value: f64) {
        self.metrics
            .entry(metric.to_string())
            .or_default()
            .values
            .insert(field.to_string(), value);
    }

    /// Insert a counter metric: a raw count plus its per-second rate over
    /// the run duration.
    pub fn set_counter(&mut self, metric: &str, count: f64, duration_secs: f64) {
        self.set(metric, "count", count);
        let rate = if duration_secs > 0.0 {
            count / duration_secs
        } else {
            0.0
        };
        self.set(metric, "rate", rate);
    }

    /// Insert a rate metric (0..1) with its pass/fail tallies.
    pub fn set_rate(&mut self, metric: &str, passes: f64, fails: f64) {
        let total = passes + fails;
        let rate = if total > 0.0 { passes / total } else { 0.0 };
        self.set(metric, "rate", rate);
        self.set(metric, "passes", passes);
        self.set(metric, "fails", fails);
    }

    /// Insert the full summary of a latency-style trend.
    pub fn set_trend(&mut self, metric: &str, trend: &Trend) {
        self.set(metric, "count", trend.len() as f64);
        self.set(metric, "avg", trend.avg());
        self.set(metric, "min", trend.min());
        self.set(metric, "max", trend.max());
        self.set(metric, "med", trend.percentile(50.0));
        self.set(metric, "p(90)", trend.percentile(90.0));
        self.set(metric, "p(95)", trend.percentile(95.0));
        self.set(metric, "p(99)", trend.percentile(99.0));
    }
}

/// Collected duration samples for one trend metric. Summarized once at the
/// end of the measurement phase; an empty trend summarizes to all zeros.
#[derive(Debug, Default)]
pub struct Trend {
    samples: Vec<f64>,
}

impl Trend {
    pub fn add(&mut self, value: f64) {
        self.samples.push(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn avg(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn min(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Percentile with linear interpolation between closest ranks. At p=50
    /// on an even-length sample this averages the two middle values, i.e.
    /// the conventional median.
    pub fn percentile(&self, p: f64) -> f64 {
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        percentile_of_sorted(&sorted, p)
    }
}

fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let weight = rank - lo as f64;
    sorted[lo] * (1.0 - weight) + sorted[hi] * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trend(values: &[f64]) -> Trend {
        let mut t = Trend::default();
        for &v in values {
            t.add(v);
        }
        t
    }

    #[test]
    fn empty_trend_summarizes_to_zero() {
        let t = Trend::default();
        assert_eq!(t.avg(), 0.0);
        assert_eq!(t.min(), 0.0);
        assert_eq!(t.max(), 0.0);
        assert_eq!(t.percentile(95.0), 0.0);
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        let t = trend(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(t.percentile(50.0), 2.5);
    }

    #[test]
    fn median_of_odd_count_is_middle_value() {
        let t = trend(&[5.0, 1.0, 3.0]);
        assert_eq!(t.percentile(50.0), 3.0);
    }

    #[test]
    fn percentiles_are_ordered() {
        let t = trend(&(1..=100).map(f64::from).collect::<Vec<_>>());
        let p90 = t.percentile(90.0);
        let p95 = t.percentile(95.0);
        let p99 = t.percentile(99.0);
        assert!(p90 <= p95 && p95 <= p99);
        assert!(p99 <= t.max());
        assert_eq!(t.min(), 1.0);
        assert_eq!(t.max(), 100.0);
    }

    #[test]
    fn absent_paths_read_as_zero() {
        let snapshot = MetricsSnapshot::default();
        assert_eq!(snapshot.value("http_reqs", "count"), 0.0);
        assert_eq!(snapshot.value("http_req_duration", "p(95)"), 0.0);
    }

    #[test]
    fn set_then_value_roundtrips() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set("http_reqs", "count", 120_000.0);
        assert_eq!(snapshot.value("http_reqs", "count"), 120_000.0);
        assert_eq!(snapshot.value("http_reqs", "rate"), 0.0);
    }

    #[test]
    fn rate_metric_handles_zero_total() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set_rate("successes", 0.0, 0.0);
        assert_eq!(snapshot.value("successes", "rate"), 0.0);
    }

    #[test]
    fn snapshot_serializes_with_nested_addressing() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set("http_req_duration", "p(95)", 150.0);
        snapshot.state.test_run_duration_ms = 240_000.0;
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["metrics"]["http_req_duration"]["values"]["p(95)"], 150.0);
        assert_eq!(json["state"]["testRunDurationMs"], 240_000.0);
    }
}
