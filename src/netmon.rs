use crate::config::MonitorConfig;
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Connectivity state published by the monitor. `Unknown` until the first
/// probe completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Unknown,
    Connected,
    Disconnected,
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkStatus::Unknown => write!(f, "Unknown"),
            NetworkStatus::Connected => write!(f, "Connected"),
            NetworkStatus::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// A single bounded best-effort attempt to reach a remote host
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self) -> bool;
}

/// Probes connectivity by spawning a single `ping` with a bounded timeout
pub struct PingProbe {
    host: String,
    timeout: Duration,
}

impl PingProbe {
    pub fn new<S: Into<String>>(host: S, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ReachabilityProbe for PingProbe {
    async fn probe(&self) -> bool {
        let timeout_secs = self.timeout.as_secs().max(1);
        let mut command = tokio::process::Command::new("ping");
        command
            .arg("-c")
            .arg("1")
            .arg("-W")
            .arg(timeout_secs.to_string())
            .arg(&self.host)
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // An extra second of slack over ping's own deadline before the
        // child is abandoned as a failure.
        match tokio::time::timeout(self.timeout + Duration::from_secs(1), command.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                warn!("Failed to spawn reachability probe: {}", e);
                false
            }
            Err(_) => {
                debug!("Reachability probe to {} timed out", self.host);
                false
            }
        }
    }
}

/// Background task that periodically probes connectivity and publishes the
/// result through a single-slot watch channel.
///
/// The probe runs outside any shared state; only the final status value is
/// handed off, so the render loop can never observe a torn write and is
/// never blocked by a slow probe.
pub struct NetworkMonitor {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
    rx: watch::Receiver<NetworkStatus>,
}

impl NetworkMonitor {
    /// Spawn the monitor task on the current tokio runtime
    pub fn start(probe: Arc<dyn ReachabilityProbe>, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(NetworkStatus::Unknown);
        let token = CancellationToken::new();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            info!("Network monitor started (interval {:?})", interval);
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        debug!("Network monitor cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        let reachable = probe.probe().await;
                        let status = if reachable {
                            NetworkStatus::Connected
                        } else {
                            NetworkStatus::Disconnected
                        };
                        if *tx.borrow() != status {
                            info!("Network status changed to {}", status);
                        }
                        let _ = tx.send(status);
                    }
                }
            }
            info!("Network monitor stopped");
        });

        Self {
            token,
            handle: Some(handle),
            rx,
        }
    }

    /// Spawn a monitor configured with a ping probe
    pub fn from_config(config: &MonitorConfig) -> Self {
        let probe = Arc::new(PingProbe::new(
            config.probe_host.clone(),
            Duration::from_secs(config.timeout_seconds),
        ));
        Self::start(probe, Duration::from_secs(config.interval_seconds))
    }

    /// Last published status
    pub fn status(&self) -> NetworkStatus {
        *self.rx.borrow()
    }

    /// Receiver handle for the render loop
    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.rx.clone()
    }

    /// Cancel the monitor task and wait for it with a bounded join
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            match tokio::time::timeout(Duration::from_secs(3), handle).await {
                Ok(Ok(())) => debug!("Network monitor task joined"),
                Ok(Err(e)) => warn!("Network monitor task panicked: {}", e),
                Err(_) => warn!("Network monitor task did not stop within timeout"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(bool);

    #[async_trait]
    impl ReachabilityProbe for FixedProbe {
        async fn probe(&self) -> bool {
            self.0
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_probe_publishes_connected() {
        let monitor = NetworkMonitor::start(Arc::new(FixedProbe(true)), Duration::from_secs(5));
        let mut rx = monitor.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), NetworkStatus::Connected);

        monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_probe_publishes_disconnected() {
        let monitor = NetworkMonitor::start(Arc::new(FixedProbe(false)), Duration::from_secs(5));
        let mut rx = monitor.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), NetworkStatus::Disconnected);

        monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_is_unknown_before_first_probe() {
        struct NeverProbe;

        #[async_trait]
        impl ReachabilityProbe for NeverProbe {
            async fn probe(&self) -> bool {
                std::future::pending().await
            }
        }

        let monitor = NetworkMonitor::start(Arc::new(NeverProbe), Duration::from_secs(3600));
        assert_eq!(monitor.status(), NetworkStatus::Unknown);

        monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_joins_the_task() {
        let monitor = NetworkMonitor::start(Arc::new(FixedProbe(true)), Duration::from_secs(5));
        let token = monitor.token.clone();

        monitor.stop().await;
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(NetworkStatus::Unknown.to_string(), "Unknown");
        assert_eq!(NetworkStatus::Connected.to_string(), "Connected");
        assert_eq!(NetworkStatus::Disconnected.to_string(), "Disconnected");
    }
}
