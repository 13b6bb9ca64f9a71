//! Standalone HTML report rendering.
//!
//! The two benchmark variants share one template parameterized by the
//! descriptor in `report::mod`; the output is a self-contained document
//! (inline CSS, Chart.js from a CDN) that opens directly in a browser.

use chrono::{DateTime, Local};

use crate::models::config::RunConfig;
use crate::report::derived::DerivedMetrics;
use crate::report::format::{format_bytes, format_count, format_duration, format_number};

/// Everything the template needs. The generation timestamp is supplied by
/// the caller so rendering stays deterministic under test.
pub struct ReportInput<'a> {
    pub title: &'a str,
    pub test_type: &'a str,
    pub description: &'a str,
    pub config: &'a RunConfig,
    pub metrics: &'a DerivedMetrics,
    pub success_color: &'a str,
    pub p95_color: &'a str,
    pub show_bulk_metrics: bool,
    pub generated_at: DateTime<Local>,
}

pub fn render_report(input: &ReportInput<'_>) -> String {
    let m = input.metrics;
    let config = input.config;
    let formatted_date = input.generated_at.format("%Y-%m-%d %H:%M:%S").to_string();

    let variant_card = if input.show_bulk_metrics {
        let throughput = m.actual_throughput.unwrap_or(0.0);
        let total_payloads = m.total_payloads.unwrap_or(0.0);
        let successful_payloads = m.successful_payloads.unwrap_or(0.0);
        format!(
            r#"<div class="card">
          <div class="card-header">
            <span class="card-title">Throughput</span>
          </div>
          <div class="card-value"><span class="highlight-pink">{throughput}</span></div>
          <div class="card-subtitle">Solutions/sec ({bulk_size}/req)</div>
        </div>

        <div class="card">
          <div class="card-header">
            <span class="card-title">Total Payloads</span>
          </div>
          <div class="card-value">{total_payloads}</div>
          <div class="card-subtitle">{successful_payloads} processed</div>
        </div>"#,
            throughput = format_number(throughput, 0),
            bulk_size = config.bulk_size,
            total_payloads = format_count(total_payloads),
            successful_payloads = format_count(successful_payloads),
        )
    } else {
        format!(
            r#"<div class="card">
          <div class="card-header">
            <span class="card-title">Peak VUs</span>
          </div>
          <div class="card-value">{max_vus}</div>
          <div class="card-subtitle">Virtual users</div>
        </div>"#,
            max_vus = format_number(m.max_vus, 0),
        )
    };

    let bulk_config_item = if input.show_bulk_metrics {
        format!(
            r#"<div class="config-item">
          <span class="config-key">Bulk Size</span>
          <span class="config-value">{} payloads</span>
        </div>"#,
            config.bulk_size
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title} - rulebench</title>
  <link rel="preconnect" href="https://fonts.googleapis.com">
  <link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>
  <link href="https://fonts.googleapis.com/css2?family=Archivo:wght@400;500;600;700&family=JetBrains+Mono:wght@400;500&display=swap" rel="stylesheet">
  <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
  <style>{style}</style>
</head>
<body>
  <div class="container">
    <header>
      <div class="header-top">
        <div class="logo">rulebench</div>
        <div class="timestamp">{formatted_date}</div>
      </div>
      <h1>{title}</h1>
      <p class="subtitle">{test_type} &middot; {description}</p>
    </header>

    <div class="section">
      <div class="section-title">Performance Overview</div>
      <div class="grid">
        <div class="card">
          <div class="card-header">
            <span class="card-title">Total Requests</span>
          </div>
          <div class="card-value">{total_requests}</div>
          <div class="card-subtitle">Over {test_duration}</div>
        </div>

        <div class="card">
          <div class="card-header">
            <span class="card-title">Success Rate</span>
            <span class="status-indicator" style="background: {success_color}"></span>
          </div>
          <div class="card-value" style="color: {success_color}">{success_rate}%</div>
          <div class="card-subtitle">{failed_requests} failed</div>
        </div>

        <div class="card">
          <div class="card-header">
            <span class="card-title">Actual RPS</span>
          </div>
          <div class="card-value"><span class="highlight">{actual_rps}</span></div>
          <div class="card-subtitle">{rps_efficiency}% of target ({target_rps})</div>
        </div>

        <div class="card">
          <div class="card-header">
            <span class="card-title">P95 Latency</span>
            <span class="status-indicator" style="background: {p95_color}"></span>
          </div>
          <div class="card-value" style="color: {p95_color}">{p95}<span style="font-size: 1rem; opacity: 0.7">ms</span></div>
          <div class="card-subtitle">P99: {p99}ms</div>
        </div>

        {variant_card}
      </div>
    </div>

    <div class="two-col">
      <div class="chart-container">
        <div class="chart-header">
          <h3 class="chart-title">Response Time Distribution</h3>
        </div>
        <div class="chart-wrapper">
          <canvas id="latencyChart"></canvas>
        </div>
      </div>

      <div class="chart-container">
        <div class="chart-header">
          <h3 class="chart-title">Request Timing Breakdown</h3>
        </div>
        <div class="chart-wrapper">
          <canvas id="timingChart"></canvas>
        </div>
      </div>
    </div>

    <div class="section">
      <div class="section-title">Detailed Metrics</div>
      <div class="two-col">
        <div class="card">
          <table class="metrics-table">
            <thead>
              <tr>
                <th>Latency Metric</th>
                <th>Value</th>
              </tr>
            </thead>
            <tbody>
              <tr><td>Minimum</td><td>{min_latency} ms</td></tr>
              <tr><td>Average</td><td>{avg_latency} ms</td></tr>
              <tr><td>Median (P50)</td><td>{p50_2} ms</td></tr>
              <tr><td>P90</td><td>{p90_2} ms</td></tr>
              <tr><td>P95</td><td>{p95_2} ms</td></tr>
              <tr><td>P99</td><td>{p99_2} ms</td></tr>
              <tr><td>Maximum</td><td>{max_latency} ms</td></tr>
            </tbody>
          </table>
        </div>

        <div class="card">
          <table class="metrics-table">
            <thead>
              <tr>
                <th>Transfer Metric</th>
                <th>Value</th>
              </tr>
            </thead>
            <tbody>
              <tr><td>Data Sent</td><td>{data_sent}</td></tr>
              <tr><td>Data Received</td><td>{data_received}</td></tr>
              <tr><td>Avg Request Size</td><td>{avg_request_size}</td></tr>
              <tr><td>Avg Response Size</td><td>{avg_response_size}</td></tr>
              <tr><td>Avg Connecting</td><td>{avg_connecting} ms</td></tr>
              <tr><td>Avg TLS Handshake</td><td>{avg_tls_handshake} ms</td></tr>
              <tr><td>Avg Waiting (TTFB)</td><td>{avg_waiting} ms</td></tr>
            </tbody>
          </table>
        </div>
      </div>
    </div>

    <div class="section">
      <div class="section-title">Test Configuration</div>
      <div class="config-grid">
        <div class="config-item">
          <span class="config-key">API URL</span>
          <span class="config-value">{api_url}</span>
        </div>
        <div class="config-item">
          <span class="config-key">Test Duration</span>
          <span class="config-value">{test_duration_config}</span>
        </div>
        <div class="config-item">
          <span class="config-key">Target RPS</span>
          <span class="config-value">{target_rps}</span>
        </div>
        {bulk_config_item}
        <div class="config-item">
          <span class="config-key">Peak Virtual Users</span>
          <span class="config-value">{max_vus}</span>
        </div>
      </div>
    </div>

    <footer>
      <p>Generated by rulebench</p>
    </footer>
  </div>

  <script>
{latency_script}
{timing_script}
  </script>
</body>
</html>"#,
        title = input.title,
        style = STYLE,
        formatted_date = formatted_date,
        test_type = input.test_type,
        description = input.description,
        total_requests = format_count(m.total_requests),
        test_duration = format_duration(m.test_duration * 1000.0),
        success_color = input.success_color,
        success_rate = format_number(m.success_rate, 1),
        failed_requests = format_count(m.failed_requests),
        actual_rps = format_number(m.actual_rps, 1),
        rps_efficiency = format_number(m.rps_efficiency, 0),
        target_rps = config.target_rps,
        p95_color = input.p95_color,
        p95 = format_number(m.p95, 0),
        p99 = format_number(m.p99, 0),
        variant_card = variant_card,
        min_latency = format_number(m.min_latency, 2),
        avg_latency = format_number(m.avg_latency, 2),
        p50_2 = format_number(m.p50, 2),
        p90_2 = format_number(m.p90, 2),
        p95_2 = format_number(m.p95, 2),
        p99_2 = format_number(m.p99, 2),
        max_latency = format_number(m.max_latency, 2),
        data_sent = format_bytes(m.data_sent),
        data_received = format_bytes(m.data_received),
        avg_request_size = format_bytes(m.avg_request_size),
        avg_response_size = format_bytes(m.avg_response_size),
        avg_connecting = format_number(m.avg_connecting, 2),
        avg_tls_handshake = format_number(m.avg_tls_handshake, 2),
        avg_waiting = format_number(m.avg_waiting, 2),
        api_url = config.api_url,
        test_duration_config = config.test_duration,
        bulk_config_item = bulk_config_item,
        max_vus = format_number(m.max_vus, 0),
        latency_script = latency_chart_script(m),
        timing_script = timing_chart_script(m),
    )
}

/// Bar chart over the latency distribution: min, p50, p90, p95, p99, max.
fn latency_chart_script(m: &DerivedMetrics) -> String {
    format!(
        r#"    Chart.defaults.font.family = "'Archivo', sans-serif";
    Chart.defaults.color = '#a1a1a1';

    const latencyCtx = document.getElementById('latencyChart').getContext('2d');
    new Chart(latencyCtx, {{
      type: 'bar',
      data: {{
        labels: ['Min', 'P50', 'P90', 'P95', 'P99', 'Max'],
        datasets: [{{
          label: 'Response Time (ms)',
          data: [{min}, {p50}, {p90}, {p95}, {p99}, {max}],
          backgroundColor: [
            'rgba(74, 222, 128, 0.7)',
            'rgba(74, 222, 128, 0.7)',
            'rgba(251, 191, 36, 0.7)',
            'rgba(251, 191, 36, 0.7)',
            'rgba(248, 113, 113, 0.7)',
            'rgba(248, 113, 113, 0.7)'
          ],
          borderColor: [
            'rgb(74, 222, 128)',
            'rgb(74, 222, 128)',
            'rgb(251, 191, 36)',
            'rgb(251, 191, 36)',
            'rgb(248, 113, 113)',
            'rgb(248, 113, 113)'
          ],
          borderWidth: 1,
          borderRadius: 2,
        }}]
      }},
      options: {{
        responsive: true,
        maintainAspectRatio: false,
        plugins: {{
          legend: {{ display: false }},
          tooltip: {{
            backgroundColor: '#1f1f1f',
            titleColor: '#fafafa',
            bodyColor: '#a1a1a1',
            borderColor: '#2a2a2a',
            borderWidth: 1,
            padding: 10,
            cornerRadius: 3,
            displayColors: false,
            callbacks: {{
              label: function(context) {{
                return context.parsed.y.toFixed(2) + ' ms';
              }}
            }}
          }}
        }},
        scales: {{
          y: {{
            beginAtZero: true,
            grid: {{ color: '#2a2a2a', drawBorder: false }},
            ticks: {{
              callback: function(value) {{ return value + ' ms'; }}
            }}
          }},
          x: {{
            grid: {{ display: false }}
          }}
        }}
      }}
    }});"#,
        min = format_number(m.min_latency, 2),
        p50 = format_number(m.p50, 2),
        p90 = format_number(m.p90, 2),
        p95 = format_number(m.p95, 2),
        p99 = format_number(m.p99, 2),
        max = format_number(m.max_latency, 2),
    )
}

/// Doughnut chart over the connection-phase averages.
fn timing_chart_script(m: &DerivedMetrics) -> String {
    format!(
        r#"    const timingCtx = document.getElementById('timingChart').getContext('2d');
    new Chart(timingCtx, {{
      type: 'doughnut',
      data: {{
        labels: ['Connecting', 'TLS Handshake', 'Sending', 'Waiting (TTFB)', 'Receiving'],
        datasets: [{{
          data: [{connecting}, {tls}, {sending}, {waiting}, {receiving}],
          backgroundColor: [
            'rgba(167, 139, 250, 0.8)',
            'rgba(34, 211, 238, 0.8)',
            'rgba(244, 114, 182, 0.8)',
            'rgba(74, 222, 128, 0.8)',
            'rgba(251, 191, 36, 0.8)'
          ],
          borderColor: '#0a0a0a',
          borderWidth: 2,
        }}]
      }},
      options: {{
        responsive: true,
        maintainAspectRatio: false,
        cutout: '60%',
        plugins: {{
          legend: {{
            position: 'right',
            labels: {{
              padding: 15,
              usePointStyle: true,
              pointStyle: 'rect'
            }}
          }},
          tooltip: {{
            backgroundColor: '#1f1f1f',
            titleColor: '#fafafa',
            bodyColor: '#a1a1a1',
            borderColor: '#2a2a2a',
            borderWidth: 1,
            padding: 10,
            cornerRadius: 3,
            callbacks: {{
              label: function(context) {{
                return context.label + ': ' + context.parsed.toFixed(2) + ' ms';
              }}
            }}
          }}
        }}
      }}
    }});"#,
        connecting = format_number(m.avg_connecting, 2),
        tls = format_number(m.avg_tls_handshake, 2),
        sending = format_number(m.avg_sending, 2),
        waiting = format_number(m.avg_waiting, 2),
        receiving = format_number(m.avg_receiving, 2),
    )
}

const STYLE: &str = r#"
    :root {
      --bg-primary: #0a0a0a;
      --bg-secondary: #141414;
      --bg-tertiary: #1f1f1f;
      --bg-hover: #2a2a2a;
      --text-primary: #fafafa;
      --text-secondary: #a1a1a1;
      --text-muted: #6b6b6b;
      --border: #2a2a2a;
      --border-light: #333;
      --accent: #a78bfa;
      --accent-cyan: #22d3ee;
      --accent-green: #4ade80;
      --accent-yellow: #fbbf24;
      --accent-red: #f87171;
      --accent-pink: #f472b6;
    }

    * {
      margin: 0;
      padding: 0;
      box-sizing: border-box;
    }

    body {
      font-family: 'Archivo', -apple-system, BlinkMacSystemFont, sans-serif;
      background: var(--bg-primary);
      color: var(--text-primary);
      line-height: 1.6;
      min-height: 100vh;
    }

    .container {
      max-width: 1280px;
      margin: 0 auto;
      padding: 2.5rem;
    }

    header {
      margin-bottom: 2.5rem;
      padding-bottom: 2rem;
      border-bottom: 1px solid var(--border);
    }

    .header-top {
      display: flex;
      align-items: center;
      justify-content: space-between;
      margin-bottom: 1.5rem;
    }

    .logo {
      font-size: 0.75rem;
      font-weight: 600;
      letter-spacing: 0.15em;
      text-transform: uppercase;
      color: var(--text-muted);
    }

    .timestamp {
      font-size: 0.8rem;
      color: var(--text-muted);
      font-family: 'JetBrains Mono', monospace;
    }

    h1 {
      font-size: 2rem;
      font-weight: 700;
      margin-bottom: 0.5rem;
      letter-spacing: -0.02em;
    }

    .subtitle {
      color: var(--text-secondary);
      font-size: 1rem;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(240px, 1fr));
      gap: 1rem;
      margin-bottom: 1.5rem;
    }

    .card {
      background: var(--bg-secondary);
      border-radius: 4px;
      padding: 1.25rem;
      border: 1px solid var(--border);
      transition: border-color 0.15s ease;
    }

    .card:hover {
      border-color: var(--border-light);
    }

    .card-header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      margin-bottom: 0.75rem;
    }

    .card-title {
      font-size: 0.7rem;
      font-weight: 600;
      text-transform: uppercase;
      letter-spacing: 0.08em;
      color: var(--text-muted);
    }

    .card-value {
      font-size: 2rem;
      font-weight: 700;
      line-height: 1.1;
      letter-spacing: -0.02em;
    }

    .card-subtitle {
      color: var(--text-muted);
      font-size: 0.8rem;
      margin-top: 0.5rem;
    }

    .status-indicator {
      width: 8px;
      height: 8px;
      border-radius: 2px;
      display: inline-block;
    }

    .section {
      margin-bottom: 1.5rem;
    }

    .section-title {
      font-size: 0.7rem;
      font-weight: 600;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--text-muted);
      margin-bottom: 1rem;
      padding-bottom: 0.5rem;
      border-bottom: 1px solid var(--border);
    }

    .chart-container {
      background: var(--bg-secondary);
      border-radius: 4px;
      padding: 1.5rem;
      border: 1px solid var(--border);
      margin-bottom: 1.5rem;
    }

    .chart-header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      margin-bottom: 1rem;
    }

    .chart-title {
      font-size: 0.9rem;
      font-weight: 600;
    }

    .chart-wrapper {
      position: relative;
      height: 280px;
    }

    .two-col {
      display: grid;
      grid-template-columns: 1fr 1fr;
      gap: 1.5rem;
    }

    @media (max-width: 768px) {
      .two-col {
        grid-template-columns: 1fr;
      }
    }

    .metrics-table {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.85rem;
    }

    .metrics-table th,
    .metrics-table td {
      padding: 0.75rem 1rem;
      text-align: left;
      border-bottom: 1px solid var(--border);
    }

    .metrics-table th {
      color: var(--text-muted);
      font-weight: 500;
      font-size: 0.7rem;
      text-transform: uppercase;
      letter-spacing: 0.08em;
    }

    .metrics-table td {
      font-family: 'JetBrains Mono', monospace;
      font-size: 0.8rem;
    }

    .metrics-table tr:last-child td {
      border-bottom: none;
    }

    .config-grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 0.75rem;
    }

    .config-item {
      display: flex;
      flex-direction: column;
      gap: 0.25rem;
      padding: 0.75rem;
      background: var(--bg-tertiary);
      border-radius: 3px;
    }

    .config-key {
      font-size: 0.7rem;
      font-weight: 500;
      text-transform: uppercase;
      letter-spacing: 0.08em;
      color: var(--text-muted);
    }

    .config-value {
      font-family: 'JetBrains Mono', monospace;
      font-size: 0.8rem;
      color: var(--accent-cyan);
      word-break: break-all;
    }

    footer {
      text-align: center;
      padding-top: 2rem;
      margin-top: 1rem;
      border-top: 1px solid var(--border);
      color: var(--text-muted);
      font-size: 0.75rem;
    }

    .highlight { color: var(--accent-cyan); }
    .highlight-pink { color: var(--accent-pink); }
    .highlight-purple { color: var(--accent); }
"#;

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::config::Variant;
    use crate::models::metrics::MetricsSnapshot;
    use crate::report::derived::{compute_derived, Status};

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn config() -> RunConfig {
        RunConfig {
            api_url: "https://example.com/api/v1/flows/f1".into(),
            api_key: "key".into(),
            test_duration: "4m".into(),
            target_rps: 100,
            bulk_size: 50,
        }
    }

    fn input_for<'a>(
        metrics: &'a DerivedMetrics,
        config: &'a RunConfig,
        show_bulk: bool,
        generated_at: DateTime<Local>,
    ) -> ReportInput<'a> {
        ReportInput {
            title: if show_bulk {
                "Throughput Benchmark Report"
            } else {
                "QPS Benchmark Report"
            },
            test_type: "Test",
            description: "desc",
            config,
            metrics,
            success_color: Status::classify(metrics.success_rate, 99.0, 95.0, false).color(),
            p95_color: Status::classify(metrics.p95, 500.0, 1000.0, true).color(),
            show_bulk_metrics: show_bulk,
            generated_at,
        }
    }

    #[test]
    fn empty_throughput_run_still_renders_a_document() {
        let cfg = config();
        let derived = compute_derived(&MetricsSnapshot::default(), &cfg, Variant::Throughput);
        let input = input_for(&derived, &cfg, true, fixed_time());
        let html = render_report(&input);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>"));
        assert!(html.contains("<title>Throughput Benchmark Report - rulebench</title>"));
        assert!(html.contains("Performance Overview"));
        assert!(html.contains("Total Payloads"));
        // Zero-request run: critical success color, all-zero chart data.
        assert!(html.contains(r#"style="color: #f87171""#));
        assert!(html.contains("data: [0.00, 0.00, 0.00, 0.00, 0.00, 0.00]"));
    }

    #[test]
    fn qps_report_shows_vu_card_instead_of_payloads() {
        let cfg = config();
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set("vus_max", "max", 200.0);
        let derived = compute_derived(&snapshot, &cfg, Variant::Qps);
        let input = input_for(&derived, &cfg, false, fixed_time());
        let html = render_report(&input);

        assert!(html.contains("Peak VUs"));
        assert!(!html.contains("Total Payloads"));
        assert!(!html.contains("Bulk Size"));
    }

    #[test]
    fn report_echoes_configuration() {
        let cfg = config();
        let derived = compute_derived(&MetricsSnapshot::default(), &cfg, Variant::Throughput);
        let input = input_for(&derived, &cfg, true, fixed_time());
        let html = render_report(&input);

        assert!(html.contains("https://example.com/api/v1/flows/f1"));
        assert!(html.contains("4m"));
        assert!(html.contains("50 payloads"));
        // The credential never leaks into the report.
        assert!(!html.contains("key</span>"));
    }

    #[test]
    fn identical_inputs_render_identical_documents() {
        let cfg = config();
        let mut snapshot = MetricsSnapshot::default();
        snapshot.set("http_reqs", "count", 1000.0);
        snapshot.state.test_run_duration_ms = 10_000.0;
        let derived = compute_derived(&snapshot, &cfg, Variant::Qps);
        let at = fixed_time();

        let a = render_report(&input_for(&derived, &cfg, false, at));
        let b = render_report(&input_for(&derived, &cfg, false, at));
        assert_eq!(a, b);
    }

    #[test]
    fn latency_table_has_all_seven_rows() {
        let cfg = config();
        let derived = compute_derived(&MetricsSnapshot::default(), &cfg, Variant::Qps);
        let html = render_report(&input_for(&derived, &cfg, false, fixed_time()));
        for row in [
            "Minimum", "Average", "Median (P50)", "P90", "P95", "P99", "Maximum",
        ] {
            assert!(html.contains(&format!("<td>{}</td>", row)), "missing {row}");
        }
        for row in [
            "Data Sent",
            "Data Received",
            "Avg Request Size",
            "Avg Response Size",
            "Avg Connecting",
            "Avg TLS Handshake",
            "Avg Waiting (TTFB)",
        ] {
            assert!(html.contains(&format!("<td>{}</td>", row)), "missing {row}");
        }
    }
}
