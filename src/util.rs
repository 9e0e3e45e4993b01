// Helpers for duration strings used by config and the health endpoint.

use anyhow::Result;
use std::time::Duration;

/// Parse a duration such as `500ms`, `10s`, `2m`, `1h` or `1m30s`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("empty duration"));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(anyhow::anyhow!("invalid duration: {}", s));
        }
        let value: u64 = rest[..digits].parse()?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let part = match unit {
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "h" => value.checked_mul(3600).map(Duration::from_secs),
            "" => return Err(anyhow::anyhow!("missing unit in duration: {}", s)),
            other => return Err(anyhow::anyhow!("unknown unit '{}' in duration: {}", other, s)),
        };
        total = part
            .and_then(|p| total.checked_add(p))
            .ok_or_else(|| anyhow::anyhow!("duration out of range: {}", s))?;
    }
    Ok(total)
}

/// Render a duration as `1h2m3s`, dropping leading zero components.
pub fn format_uptime(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h{}m{}s", h, m, s)
    } else if m > 0 {
        format!("{}m{}s", m, s)
    } else {
        format!("{}s", s)
    }
}
