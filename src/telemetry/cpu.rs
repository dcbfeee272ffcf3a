use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Cumulative CPU tick counters read from the aggregate `cpu` line of
/// /proc/stat. Counters are monotonically non-decreasing since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTicks {
    pub total: u64,
    pub idle: u64,
}

/// Parse the aggregate CPU line ("cpu  user nice system idle iowait irq
/// softirq steal ...") into tick counters. Returns `None` on malformed input.
pub fn parse_cpu_line(line: &str) -> Option<CpuTicks> {
    let mut fields = line.split_whitespace();
    if fields.next()? != "cpu" {
        return None;
    }

    let values: Vec<u64> = fields.take(8).map(str::parse).collect::<Result<_, _>>().ok()?;
    if values.len() < 8 {
        return None;
    }

    Some(CpuTicks {
        total: values.iter().sum(),
        idle: values[3],
    })
}

/// Usage percentage between two consecutive tick samples, clamped to
/// [0, 100]. Returns `None` when the total delta is zero or the counters
/// went backwards (wraparound), in which case the caller should hold its
/// previous value instead of dividing by zero.
pub fn usage_between(prev: CpuTicks, current: CpuTicks) -> Option<f32> {
    let total_delta = current.total.checked_sub(prev.total)?;
    if total_delta == 0 {
        return None;
    }
    let idle_delta = current.idle.saturating_sub(prev.idle).min(total_delta);

    let usage = 100.0 * (1.0 - idle_delta as f64 / total_delta as f64);
    Some(usage.clamp(0.0, 100.0) as f32)
}

/// Delta-based CPU usage sampler.
///
/// Owns the previous tick sample and the last computed percentage so there
/// is no process-wide mutable state. The first sample only seeds the
/// accumulator; the reported value stays at 0 until a second sample exists.
#[derive(Debug)]
pub struct CpuSampler {
    stat_path: PathBuf,
    prev: Option<CpuTicks>,
    last_usage: f32,
}

impl CpuSampler {
    pub fn new<P: AsRef<Path>>(stat_path: P) -> Self {
        Self {
            stat_path: stat_path.as_ref().to_path_buf(),
            prev: None,
            last_usage: 0.0,
        }
    }

    /// Read a fresh tick sample and return the usage percentage derived from
    /// the delta against the previous sample. Any failure (unreadable file,
    /// malformed line, zero delta) keeps and returns the last known value.
    pub fn sample(&mut self) -> f32 {
        let contents = match std::fs::read_to_string(&self.stat_path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Could not read {}: {}", self.stat_path.display(), e);
                return self.last_usage;
            }
        };

        let ticks = match contents.lines().next().and_then(parse_cpu_line) {
            Some(ticks) => ticks,
            None => {
                warn!("Malformed cpu line in {}", self.stat_path.display());
                return self.last_usage;
            }
        };

        if let Some(prev) = self.prev {
            if let Some(usage) = usage_between(prev, ticks) {
                self.last_usage = usage;
            } else {
                debug!("Zero or negative tick delta, holding previous CPU usage");
            }
        }
        self.prev = Some(ticks);

        self.last_usage
    }

    /// Last computed usage without taking a new sample
    pub fn last_usage(&self) -> f32 {
        self.last_usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_cpu_line() {
        let ticks = parse_cpu_line("cpu  10 20 30 40 5 3 1 1").unwrap();
        assert_eq!(ticks.total, 110);
        assert_eq!(ticks.idle, 40);
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(parse_cpu_line("cpu0 10 20 30 40 5 3 1 1").is_none());
        assert!(parse_cpu_line("cpu 10 20 30").is_none());
        assert!(parse_cpu_line("cpu 10 20 30 forty 5 3 1 1").is_none());
        assert!(parse_cpu_line("").is_none());
    }

    #[test]
    fn test_usage_formula() {
        let prev = CpuTicks {
            total: 100,
            idle: 50,
        };
        let current = CpuTicks {
            total: 200,
            idle: 100,
        };

        // 100 * (1 - (100-50)/(200-100)) = 50.0
        assert_eq!(usage_between(prev, current), Some(50.0));
    }

    #[test]
    fn test_usage_zero_delta_is_none() {
        let sample = CpuTicks {
            total: 100,
            idle: 50,
        };
        assert_eq!(usage_between(sample, sample), None);
    }

    #[test]
    fn test_usage_counter_wraparound_is_none() {
        let prev = CpuTicks {
            total: 200,
            idle: 100,
        };
        let current = CpuTicks {
            total: 100,
            idle: 50,
        };
        assert_eq!(usage_between(prev, current), None);
    }

    #[test]
    fn test_usage_is_clamped() {
        // Idle delta larger than total delta must not go negative
        let prev = CpuTicks { total: 100, idle: 0 };
        let current = CpuTicks {
            total: 200,
            idle: 500,
        };
        assert_eq!(usage_between(prev, current), Some(0.0));
    }

    #[test]
    fn test_sampler_first_call_returns_zero() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cpu  10 0 10 70 5 3 1 1").unwrap();

        let mut sampler = CpuSampler::new(file.path());
        assert_eq!(sampler.sample(), 0.0);
    }

    #[test]
    fn test_sampler_delta_across_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stat");

        std::fs::write(&path, "cpu  50 0 0 50 0 0 0 0\n").unwrap();
        let mut sampler = CpuSampler::new(&path);
        sampler.sample();

        std::fs::write(&path, "cpu  100 0 0 100 0 0 0 0\n").unwrap();
        assert_eq!(sampler.sample(), 50.0);
    }

    #[test]
    fn test_sampler_holds_value_when_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stat");

        std::fs::write(&path, "cpu  50 0 0 50 0 0 0 0\n").unwrap();
        let mut sampler = CpuSampler::new(&path);
        sampler.sample();
        std::fs::write(&path, "cpu  100 0 0 100 0 0 0 0\n").unwrap();
        let usage = sampler.sample();
        assert_eq!(usage, 50.0);

        std::fs::remove_file(&path).unwrap();
        assert_eq!(sampler.sample(), usage);
    }
}
