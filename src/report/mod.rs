//! Report generation: derived metrics, status classification, HTML
//! rendering and the per-run artifacts (HTML report, raw JSON dump,
//! console confirmation line).

pub mod derived;
pub mod format;
pub mod html;

use std::io;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::models::config::{RunConfig, Variant};
use crate::models::metrics::MetricsSnapshot;
use crate::report::derived::{compute_derived, Status};
use crate::report::html::{render_report, ReportInput};

const SUCCESS_GOOD: f64 = 99.0;
const SUCCESS_WARN: f64 = 95.0;

/// Per-variant report descriptor: headline copy, latency thresholds and
/// artifact names. Both variants flow through the same renderer.
pub struct ReportDescriptor {
    pub title: &'static str,
    pub test_type: &'static str,
    pub description: &'static str,
    /// P95 latency thresholds (ms), lower is better.
    pub p95_good: f64,
    pub p95_warn: f64,
    pub show_bulk_metrics: bool,
    pub html_file: &'static str,
    pub json_file: &'static str,
}

impl ReportDescriptor {
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Qps => ReportDescriptor {
                title: "QPS Benchmark Report",
                test_type: "QPS (Requests/Second)",
                description: "Measures API responsiveness with individual payload requests",
                p95_good: 200.0,
                p95_warn: 500.0,
                show_bulk_metrics: false,
                html_file: "qps-report.html",
                json_file: "qps-results.json",
            },
            Variant::Throughput => ReportDescriptor {
                title: "Throughput Benchmark Report",
                test_type: "Throughput (Solutions/Second)",
                description: "Measures rule engine capacity with bulk payload requests",
                p95_good: 500.0,
                p95_warn: 1000.0,
                show_bulk_metrics: true,
                html_file: "throughput-report.html",
                json_file: "throughput-results.json",
            },
        }
    }
}

/// Render the full HTML report for a finished run.
pub fn generate_report(
    snapshot: &MetricsSnapshot,
    config: &RunConfig,
    variant: Variant,
    generated_at: DateTime<Local>,
) -> String {
    let descriptor = ReportDescriptor::for_variant(variant);
    let metrics = compute_derived(snapshot, config, variant);
    let success_color =
        Status::classify(metrics.success_rate, SUCCESS_GOOD, SUCCESS_WARN, false).color();
    let p95_color =
        Status::classify(metrics.p95, descriptor.p95_good, descriptor.p95_warn, true).color();

    render_report(&ReportInput {
        title: descriptor.title,
        test_type: descriptor.test_type,
        description: descriptor.description,
        config,
        metrics: &metrics,
        success_color,
        p95_color,
        show_bulk_metrics: descriptor.show_bulk_metrics,
        generated_at,
    })
}

/// One-line confirmation naming the HTML artifact.
pub fn console_summary(variant: Variant) -> String {
    let descriptor = ReportDescriptor::for_variant(variant);
    format!("\nResults saved to {}\n", descriptor.html_file)
}

/// Write the HTML report and the pretty-printed raw snapshot dump into
/// `out_dir`, returning the console confirmation line.
pub fn write_artifacts(
    snapshot: &MetricsSnapshot,
    config: &RunConfig,
    variant: Variant,
    out_dir: &Path,
) -> io::Result<String> {
    let descriptor = ReportDescriptor::for_variant(variant);
    let html = generate_report(snapshot, config, variant, Local::now());
    std::fs::write(out_dir.join(descriptor.html_file), html)?;

    let raw = serde_json::to_string_pretty(snapshot)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    std::fs::write(out_dir.join(descriptor.json_file), raw)?;

    Ok(console_summary(variant))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn config() -> RunConfig {
        RunConfig {
            api_url: "https://example.com/api/v1/flows/f1".into(),
            api_key: "key".into(),
            test_duration: "4m".into(),
            target_rps: 500,
            bulk_size: 1,
        }
    }

    #[test]
    fn descriptors_carry_variant_thresholds() {
        let qps = ReportDescriptor::for_variant(Variant::Qps);
        assert_eq!((qps.p95_good, qps.p95_warn), (200.0, 500.0));
        assert!(!qps.show_bulk_metrics);

        let tp = ReportDescriptor::for_variant(Variant::Throughput);
        assert_eq!((tp.p95_good, tp.p95_warn), (500.0, 1000.0));
        assert!(tp.show_bulk_metrics);
        assert_eq!(tp.html_file, "throughput-report.html");
    }

    #[test]
    fn console_summary_names_the_artifact() {
        assert_eq!(
            console_summary(Variant::Qps),
            "\nResults saved to qps-report.html\n"
        );
        assert_eq!(
            console_summary(Variant::Throughput),
            "\nResults saved to throughput-report.html\n"
        );
    }

    #[test]
    fn healthy_qps_report_is_marked_good() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set("http_reqs", "count", 120_000.0);
        snapshot.state.test_run_duration_ms = 240_000.0;
        snapshot.set("successes", "rate", 0.995);
        snapshot.set("http_req_duration", "p(95)", 150.0);

        let at = Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let html = generate_report(&snapshot, &config(), Variant::Qps, at);

        // 120000 reqs over 240s is 500 rps at 99.5% success, both good.
        assert!(html.contains("500.0"));
        assert!(html.contains("99.5%"));
        assert!(html.contains(r#"style="background: #4ade80""#));
        assert!(!html.contains(r#"style="background: #f87171""#));
    }

    #[test]
    fn writes_both_artifacts() {
        let dir = std::env::temp_dir().join("rulebench-report-test");
        std::fs::create_dir_all(&dir).unwrap();

        let snapshot = MetricsSnapshot::default();
        let line = write_artifacts(&snapshot, &config(), Variant::Qps, &dir).unwrap();
        assert_eq!(line, "\nResults saved to qps-report.html\n");

        let html = std::fs::read_to_string(dir.join("qps-report.html")).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        let raw = std::fs::read_to_string(dir.join("qps-results.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(parsed["state"]["testRunDurationMs"].is_number());

        std::fs::remove_dir_all(&dir).ok();
    }
}
