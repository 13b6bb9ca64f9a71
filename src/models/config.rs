use std::env;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is required. Usage: {name}={example} rulebench <qps|throughput>")]
    Missing {
        name: &'static str,
        example: &'static str,
    },
    #[error("invalid {name} `{value}`: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Which benchmark is being run. Selects defaults, request timeout and the
/// report descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Qps,
    Throughput,
}

impl Variant {
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "qps" => Some(Variant::Qps),
            "throughput" => Some(Variant::Throughput),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Variant::Qps => "qps",
            Variant::Throughput => "throughput",
        }
    }

    fn default_target_rps(self) -> u64 {
        match self {
            Variant::Qps => 500,
            Variant::Throughput => 100,
        }
    }

    fn default_bulk_size(self) -> u64 {
        match self {
            Variant::Qps => 1,
            Variant::Throughput => 50,
        }
    }

    /// Bulk requests carry much larger bodies, so they get a longer timeout.
    pub fn request_timeout(self) -> Duration {
        match self {
            Variant::Qps => Duration::from_secs(10),
            Variant::Throughput => Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub api_url: String,
    pub api_key: String,
    /// Measurement-phase duration as configured, e.g. "4m". Echoed verbatim
    /// in reports; `measure_duration()` gives the parsed value.
    pub test_duration: String,
    pub target_rps: u64,
    pub bulk_size: u64,
}

impl RunConfig {
    /// Resolve configuration from the environment, with per-variant defaults.
    /// `API_URL` and `API_KEY` are required; everything else falls back.
    pub fn from_env(variant: Variant) -> Result<Self, ConfigError> {
        let api_url = require_var(
            "API_URL",
            "https://your-instance.com/api/v1/flows/flow_id",
        )?;
        let api_key = require_var("API_KEY", "your-api-key")?;

        Url::parse(&api_url).map_err(|e| ConfigError::Invalid {
            name: "API_URL",
            value: api_url.clone(),
            reason: e.to_string(),
        })?;

        let test_duration =
            env::var("TEST_DURATION").unwrap_or_else(|_| "4m".to_string());
        parse_duration(&test_duration).map_err(|reason| ConfigError::Invalid {
            name: "TEST_DURATION",
            value: test_duration.clone(),
            reason,
        })?;

        let target_rps = positive_var("TARGET_RPS", variant.default_target_rps());
        let bulk_size = positive_var("BULK_SIZE", variant.default_bulk_size());

        Ok(RunConfig {
            api_url,
            api_key,
            test_duration,
            target_rps,
            bulk_size,
        })
    }

    pub fn measure_duration(&self) -> Duration {
        // Validated in from_env; an unparsable string here means the config
        // was constructed by hand, where 4m is as good a fallback as any.
        parse_duration(&self.test_duration).unwrap_or(Duration::from_secs(240))
    }
}

fn require_var(
    name: &'static str,
    example: &'static str,
) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing { name, example }),
    }
}

/// Non-numeric, empty or zero values fall back to the default, matching the
/// forgiving `parseInt(x) || default` resolution the env contract promises.
fn positive_var(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(default)
}

/// Parse a duration string like "30s", "4m" or "1h".
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| "missing unit suffix (s, m or h)".to_string())?;
    let (num, unit) = s.split_at(split);
    let num: u64 = num
        .parse()
        .map_err(|_| "missing numeric value".to_string())?;
    if num == 0 {
        return Err("duration must be greater than zero".to_string());
    }
    let secs = match unit {
        "s" => num,
        "m" => num * 60,
        "h" => num * 3600,
        other => return Err(format!("unknown unit `{}`", other)),
    };
    Ok(Duration::from_secs(secs))
}
