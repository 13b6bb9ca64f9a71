//! Display formatters for report values. All of them degrade rather than
//! fail: non-finite numbers render as "N/A".

/// Fixed-point rendering with a caller-chosen decimal count.
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    format!("{:.*}", decimals, value)
}

/// Human-readable binary-unit byte count (base 1024, two decimals).
pub fn format_bytes(bytes: f64) -> String {
    if bytes == 0.0 {
        return "0 B".to_string();
    }
    if !bytes.is_finite() || bytes < 0.0 {
        return "N/A".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let exp = (bytes.ln() / 1024f64.ln()).floor() as i32;
    let exp = exp.clamp(0, UNITS.len() as i32 - 1);
    format!(
        "{} {}",
        format_number(bytes / 1024f64.powi(exp), 2),
        UNITS[exp as usize]
    )
}

/// Scale-adaptive duration: milliseconds below one second, seconds below a
/// minute, minutes beyond.
pub fn format_duration(ms: f64) -> String {
    if ms < 1000.0 {
        format!("{} ms", format_number(ms, 2))
    } else if ms < 60_000.0 {
        format!("{} s", format_number(ms / 1000.0, 2))
    } else {
        format!("{} min", format_number(ms / 60_000.0, 2))
    }
}

/// Integer rendering with comma thousands separators, for headline counts.
pub fn format_count(value: f64) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    let n = value.round() as i64;
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
