use std::path::Path;
use tracing::warn;

/// Parse a labeled kB value out of a meminfo line ("MemTotal: 16384 kB")
fn parse_kb_field(line: &str) -> Option<u64> {
    line.split_whitespace().nth(1)?.parse().ok()
}

/// Compute RAM usage percentage from a meminfo listing.
///
/// Prefers `MemAvailable` when the kernel exposes it, otherwise falls back
/// to deriving usage from `MemFree`. Returns `None` when `MemTotal` is
/// missing or zero.
pub fn parse_meminfo(contents: &str) -> Option<f32> {
    let mut total = 0u64;
    let mut free = 0u64;
    let mut available: Option<u64> = None;

    for line in contents.lines() {
        if line.starts_with("MemTotal:") {
            total = parse_kb_field(line)?;
        } else if line.starts_with("MemFree:") {
            free = parse_kb_field(line)?;
        } else if line.starts_with("MemAvailable:") {
            available = parse_kb_field(line);
        }
    }

    if total == 0 {
        return None;
    }

    let unused = available.unwrap_or(free).min(total);
    Some(((total - unused) as f64 / total as f64 * 100.0) as f32)
}

/// Read RAM usage from a meminfo-format file. Returns `None` when the file
/// is unreadable or malformed so the caller can hold its last good value.
pub fn ram_usage_percent<P: AsRef<Path>>(meminfo_path: P) -> Option<f32> {
    let path = meminfo_path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_meminfo(&contents),
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            None
        }
    }
}
