pub mod cpu;
pub mod memory;

pub use cpu::{parse_cpu_line, usage_between, CpuSampler, CpuTicks};
pub use memory::{parse_meminfo, ram_usage_percent};

use crate::config::TelemetryConfig;
use std::path::PathBuf;

/// Point-in-time CPU and RAM usage percentages.
///
/// Holds its previous values when a refresh is skipped or fails.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub cpu_percent: f32,
    pub ram_percent: f32,
}

/// Owns the metric sources and the last good snapshot.
///
/// CPU is refreshed on the loop's throttled cadence; RAM is cheap enough to
/// refresh every frame.
#[derive(Debug)]
pub struct TelemetrySampler {
    cpu: CpuSampler,
    meminfo_path: PathBuf,
    snapshot: MetricsSnapshot,
}

impl TelemetrySampler {
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            cpu: CpuSampler::new(&config.stat_path),
            meminfo_path: PathBuf::from(&config.meminfo_path),
            snapshot: MetricsSnapshot::default(),
        }
    }

    /// Take a fresh CPU tick sample and update the snapshot
    pub fn refresh_cpu(&mut self) {
        self.snapshot.cpu_percent = self.cpu.sample();
    }

    /// Re-read RAM usage, keeping the previous value on failure
    pub fn refresh_ram(&mut self) {
        if let Some(ram) = ram_usage_percent(&self.meminfo_path) {
            self.snapshot.ram_percent = ram;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelemetryConfig;

    fn config_with_paths(stat: &std::path::Path, meminfo: &std::path::Path) -> TelemetryConfig {
        TelemetryConfig {
            stat_path: stat.to_string_lossy().into_owned(),
            meminfo_path: meminfo.to_string_lossy().into_owned(),
            ..TelemetryConfig::default()
        }
    }

    #[test]
    fn test_snapshot_tracks_refreshes() {
        let dir = tempfile::tempdir().unwrap();
        let stat = dir.path().join("stat");
        let meminfo = dir.path().join("meminfo");

        std::fs::write(&stat, "cpu  50 0 0 50 0 0 0 0\n").unwrap();
        std::fs::write(&meminfo, "MemTotal: 1000 kB\nMemAvailable: 250 kB\n").unwrap();

        let mut sampler = TelemetrySampler::new(&config_with_paths(&stat, &meminfo));
        sampler.refresh_cpu();
        sampler.refresh_ram();
        assert_eq!(sampler.snapshot().ram_percent, 75.0);

        std::fs::write(&stat, "cpu  100 0 0 100 0 0 0 0\n").unwrap();
        sampler.refresh_cpu();
        assert_eq!(sampler.snapshot().cpu_percent, 50.0);
    }

    #[test]
    fn test_failed_ram_refresh_holds_value() {
        let dir = tempfile::tempdir().unwrap();
        let stat = dir.path().join("stat");
        let meminfo = dir.path().join("meminfo");

        std::fs::write(&meminfo, "MemTotal: 1000 kB\nMemFree: 400 kB\n").unwrap();

        let mut sampler = TelemetrySampler::new(&config_with_paths(&stat, &meminfo));
        sampler.refresh_ram();
        assert_eq!(sampler.snapshot().ram_percent, 60.0);

        std::fs::remove_file(&meminfo).unwrap();
        sampler.refresh_ram();
        assert_eq!(sampler.snapshot().ram_percent, 60.0);
    }
}
