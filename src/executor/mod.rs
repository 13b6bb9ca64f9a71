use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Local;
use colored::*;
use hyper::Uri;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::client::{build_client, send_request, HttpsClient};
use crate::models::config::{RunConfig, Variant};
use crate::models::metrics::{MetricsSnapshot, Trend};
use crate::models::payload::{generate_bulk, Payload};

const WARM_UP: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("invalid target URL `{0}`")]
    BadUrl(String),
}

/// Raw collectors fed by the request workers during the measurement phase.
/// Finalized into a `MetricsSnapshot` once the run ends.
#[derive(Debug, Default)]
struct Collectors {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    dropped_requests: u64,
    total_payloads: u64,
    failed_payloads: u64,
    bytes_sent: u64,
    bytes_received: u64,
    duration: Trend,
    waiting: Trend,
    receiving: Trend,
    status_counts: HashMap<String, u64>,
}

/// Shared per-run state: the collectors plus in-flight worker accounting
/// (the peak doubles as the `vus_max` metric).
struct Shared {
    collectors: Mutex<Collectors>,
    in_flight: AtomicU64,
    peak_in_flight: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        Shared {
            collectors: Mutex::new(Collectors::default()),
            in_flight: AtomicU64::new(0),
            peak_in_flight: AtomicU64::new(0),
        }
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::Relaxed);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Run the full benchmark: a warm-up phase whose results are discarded,
/// then the measurement phase at the configured arrival rate. Returns the
/// finalized metrics snapshot.
pub async fn run_load_test(
    config: &RunConfig,
    variant: Variant,
) -> Result<MetricsSnapshot, DriverError> {
    let uri: Uri = config
        .api_url
        .parse()
        .map_err(|_| DriverError::BadUrl(config.api_url.clone()))?;

    let client = Arc::new(build_client());
    let config = Arc::new(config.clone());
    let uri = Arc::new(uri);

    println!(
        "{} {} {}",
        "target :".cyan().bold(),
        config.api_url.bold(),
        format!(
            "| {} rps for {} after {}s warm-up",
            config.target_rps,
            config.test_duration,
            WARM_UP.as_secs()
        )
        .dimmed()
    );

    // Warm-up: same traffic, results thrown away.
    let warmup_state = Arc::new(Shared::new());
    run_phase(
        Arc::clone(&client),
        Arc::clone(&config),
        Arc::clone(&uri),
        variant,
        WARM_UP,
        Arc::clone(&warmup_state),
        false,
    )
    .await;

    let shared = Arc::new(Shared::new());
    let measure_start = Instant::now();
    run_phase(
        Arc::clone(&client),
        Arc::clone(&config),
        Arc::clone(&uri),
        variant,
        config.measure_duration(),
        Arc::clone(&shared),
        true,
    )
    .await;
    let run_duration = measure_start.elapsed();

    let snapshot = finalize(&shared, run_duration);
    print_summary(&shared, &snapshot);
    Ok(snapshot)
}

/// Issue requests at the target arrival rate for `phase_duration`. One
/// worker task per tick; the pool is elastic, bounded only by how many
/// requests are in flight at once.
async fn run_phase(
    client: Arc<HttpsClient>,
    config: Arc<RunConfig>,
    uri: Arc<Uri>,
    variant: Variant,
    phase_duration: Duration,
    shared: Arc<Shared>,
    record: bool,
) {
    let rate = config.target_rps.max(1);
    let mut ticker = interval(Duration::from_secs_f64(1.0 / rate as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    let end = Instant::now() + phase_duration;
    let mut handles: Vec<JoinHandle<()>> = Vec::new();
    let mut iter: u64 = 0;

    while Instant::now() < end {
        ticker.tick().await;

        let client = Arc::clone(&client);
        let config = Arc::clone(&config);
        let uri = Arc::clone(&uri);
        let shared = Arc::clone(&shared);
        let vu = (iter % rate) + 1;

        handles.push(tokio::spawn(async move {
            shared.enter();
            issue_request(&client, &config, &uri, variant, vu, iter, &shared, record).await;
            shared.leave();
        }));
        iter += 1;

        // Keep the handle list from growing unbounded on long runs.
        if handles.len() >= 4096 {
            handles.retain(|h| !h.is_finished());
        }
    }

    for handle in handles {
        let _ = handle.await;
    }
}

#[allow(clippy::too_many_arguments)]
async fn issue_request(
    client: &HttpsClient,
    config: &RunConfig,
    uri: &Uri,
    variant: Variant,
    vu: u64,
    iter: u64,
    shared: &Shared,
    record: bool,
) {
    let body = match variant {
        Variant::Qps => serde_json::to_string(&Payload::generate(vu, iter)),
        Variant::Throughput => {
            serde_json::to_string(&generate_bulk(config.bulk_size, "bulk", vu, iter))
        }
    };
    let body = match body {
        Ok(b) => b,
        // A payload that fails to serialize is recorded as a dropped request.
        Err(_) => {
            if record {
                let mut c = shared.collectors.lock().unwrap();
                c.total_requests += 1;
                record_failure(&mut c, variant, config);
                *c.status_counts.entry("SERIALIZE_ERROR".to_string()).or_insert(0) += 1;
            }
            return;
        }
    };
    let bytes_sent = body.len() as u64;

    let request_start = Instant::now();
    let result = timeout(
        variant.request_timeout(),
        send_request(client, uri, &config.api_key, body),
    )
    .await;
    let elapsed = request_start.elapsed().as_secs_f64() * 1000.0;

    if !record {
        return;
    }

    let mut c = shared.collectors.lock().unwrap();
    c.total_requests += 1;
    c.bytes_sent += bytes_sent;
    c.duration.add(elapsed);

    match result {
        Ok(Ok(response)) => {
            c.bytes_received += response.body.len() as u64;
            c.waiting.add(response.waiting_ms);
            c.receiving.add(response.receiving_ms);

            let success = response.status.as_u16() == 200
                && !response.body.is_empty()
                && response_body_ok(variant, &response.body);
            let status_key = response.status.as_u16().to_string();
            if success {
                c.successful_requests += 1;
                if variant == Variant::Throughput {
                    c.total_payloads += config.bulk_size;
                }
                println!(
                    "{} {} {} {}",
                    "status :".green().bold(),
                    status_key.bold(),
                    "| duration :".blue().bold(),
                    format!("{:.0}ms", elapsed).bold()
                );
            } else {
                record_failure(&mut c, variant, config);
                eprintln!(
                    "{} {} {} {}",
                    "status :".red().bold(),
                    status_key.red().bold(),
                    "| duration :".blue().bold(),
                    format!("{:.0}ms", elapsed).bold()
                );
            }
            *c.status_counts.entry(status_key).or_insert(0) += 1;
        }
        Ok(Err(message)) => {
            record_failure(&mut c, variant, config);
            eprintln!(
                "{} {} {} {}",
                "status :".red().bold(),
                message.red().bold(),
                "| duration :".blue().bold(),
                format!("{:.0}ms", elapsed).bold()
            );
            *c.status_counts.entry("REQUEST_ERROR".to_string()).or_insert(0) += 1;
        }
        Err(_) => {
            record_failure(&mut c, variant, config);
            eprintln!(
                "{} {} {} {}",
                "status :".red().bold(),
                "Network Error (Timeout)".red().bold(),
                "| duration :".blue().bold(),
                format!("{:.0}ms", elapsed).bold()
            );
            *c.status_counts.entry("TIMEOUT".to_string()).or_insert(0) += 1;
        }
    }
}

fn record_failure(c: &mut Collectors, variant: Variant, config: &RunConfig) {
    c.failed_requests += 1;
    c.dropped_requests += 1;
    if variant == Variant::Throughput {
        c.total_payloads += config.bulk_size;
        c.failed_payloads += config.bulk_size;
    }
}

/// Bulk responses are additionally checked for an `error` field; a body
/// that is not valid JSON counts as failed.
fn response_body_ok(variant: Variant, body: &[u8]) -> bool {
    match variant {
        Variant::Qps => true,
        Variant::Throughput => match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(value) => value.get("error").is_none(),
            Err(_) => false,
        },
    }
}

/// Freeze the collectors into the immutable snapshot the report consumes.
fn finalize(shared: &Shared, run_duration: Duration) -> MetricsSnapshot {
    let c = shared.collectors.lock().unwrap();
    let duration_secs = run_duration.as_secs_f64();

    let mut snapshot = MetricsSnapshot::default();
    snapshot.state.test_run_duration_ms = duration_secs * 1000.0;

    snapshot.set_counter("http_reqs", c.total_requests as f64, duration_secs);
    snapshot.set_counter("data_sent", c.bytes_sent as f64, duration_secs);
    snapshot.set_counter("data_received", c.bytes_received as f64, duration_secs);
    snapshot.set_counter("dropped_requests", c.dropped_requests as f64, duration_secs);

    snapshot.set_rate(
        "successes",
        c.successful_requests as f64,
        c.failed_requests as f64,
    );
    snapshot.set_rate(
        "errors",
        c.failed_requests as f64,
        c.successful_requests as f64,
    );

    // Empty trends stay absent; the report reads absent paths as 0.
    if !c.duration.is_empty() {
        snapshot.set_trend("http_req_duration", &c.duration);
    }
    if !c.waiting.is_empty() {
        snapshot.set_trend("http_req_waiting", &c.waiting);
    }
    if !c.receiving.is_empty() {
        snapshot.set_trend("http_req_receiving", &c.receiving);
    }

    if c.total_payloads > 0 {
        snapshot.set_counter("total_payloads", c.total_payloads as f64, duration_secs);
        snapshot.set_counter("failed_payloads", c.failed_payloads as f64, duration_secs);
    }

    let peak = shared.peak_in_flight.load(Ordering::Relaxed);
    snapshot.set("vus_max", "max", peak as f64);

    snapshot
}

fn print_summary(shared: &Shared, snapshot: &MetricsSnapshot) {
    let c = shared.collectors.lock().unwrap();
    let timestamp = Local::now().format("%Y/%m/%d %H:%M:%S").to_string();

    println!();
    println!("{}", " ======== TEST RESULTS ======== ".bold().on_blue());
    println!("{}{}", "Timestamp                : ".blue().bold(), timestamp.bold());
    println!(
        "{}{}",
        "Total requests           : ".green().bold(),
        c.total_requests.to_string().bold()
    );
    println!(
        "{}{}",
        "Successful requests      : ".green().bold(),
        c.successful_requests.to_string().bold()
    );
    println!(
        "{}{}",
        "Failed requests          : ".red().bold(),
        c.failed_requests.to_string().bold()
    );
    println!(
        "{}{}",
        "Fastest response (ms)    : ".cyan().bold(),
        format!("{:.2}", c.duration.min()).bold()
    );
    println!(
        "{}{}",
        "Slowest response (ms)    : ".yellow().bold(),
        format!("{:.2}", c.duration.max()).bold()
    );
    println!(
        "{}{}",
        "Median response time (ms): ".magenta().bold(),
        format!("{:.2}", c.duration.percentile(50.0)).bold()
    );
    println!(
        "{}{}",
        "P95 response time (ms)   : ".magenta().bold(),
        format!("{:.2}", c.duration.percentile(95.0)).bold()
    );
    println!(
        "{}{}",
        "Requests per second (RPS): ".blue().bold(),
        format!("{:.2}", snapshot.value("http_reqs", "rate")).bold()
    );

    println!();
    println!("{}", " ======== STATUS BREAKDOWN ======== ".bold().on_blue());
    for (status, count) in &c.status_counts {
        println!("{}", format!("- {}: {}", status, count).bold());
    }
}
