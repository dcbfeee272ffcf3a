use crate::camera::FrameSource;
use crate::config::TintcamConfig;
use crate::detector::FaceDetector;
use crate::display::{DisplaySink, KeyPoll};
use crate::error::Result;
use crate::filter::apply_red_tint;
use crate::netmon::{NetworkMonitor, NetworkStatus};
use crate::overlay::{draw_face_boxes, OverlayRenderer};
use crate::telemetry::TelemetrySampler;
use chrono::Local;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

#[cfg(feature = "opencv")]
use crate::camera::OpenCvCamera;
#[cfg(feature = "opencv")]
use crate::detector::HaarFaceDetector;
#[cfg(feature = "opencv")]
use crate::display::OpenCvWindow;
#[cfg(not(feature = "opencv"))]
use crate::error::TintcamError;

/// Counters reported by a finished render loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames: u64,
    pub detect_runs: u64,
    pub faces_seen: u64,
}

/// The capture/detect/render loop and everything it owns: telemetry
/// sampler state, the overlay renderer and the loop cadence parameters.
pub struct TintcamApp {
    config: TintcamConfig,
    telemetry: TelemetrySampler,
    overlay: OverlayRenderer,
}

impl TintcamApp {
    pub fn new(config: TintcamConfig) -> Self {
        let telemetry = TelemetrySampler::new(&config.telemetry);
        let overlay = OverlayRenderer::from_config(&config.overlay);
        Self {
            config,
            telemetry,
            overlay,
        }
    }

    /// Run the demo end to end: start the network monitor, open the
    /// capture device, cascade and window, drive the render loop on a
    /// blocking thread, then stop the monitor with a bounded join.
    pub async fn run(mut self) -> Result<LoopStats> {
        let monitor = NetworkMonitor::from_config(&self.config.monitor);
        let net = monitor.subscribe();

        let result = self.run_capture(net).await;
        monitor.stop().await;

        result
    }

    #[cfg(feature = "opencv")]
    async fn run_capture(&mut self, net: watch::Receiver<NetworkStatus>) -> Result<LoopStats> {
        let mut detector = HaarFaceDetector::load(&self.config.detector)?;
        let mut camera = OpenCvCamera::open(&self.config.camera)?;
        let mut window = OpenCvWindow::open(&self.config.display)?;

        tokio::task::block_in_place(|| {
            self.run_loop(&mut camera, &mut detector, &mut window, net)
        })
    }

    #[cfg(not(feature = "opencv"))]
    async fn run_capture(&mut self, _net: watch::Receiver<NetworkStatus>) -> Result<LoopStats> {
        Err(TintcamError::camera(
            "tintcam was built without the opencv feature; no capture backend available",
        ))
    }

    /// Drive the steady-state cycle until the stream ends or the user
    /// quits, then release the source and display exactly once.
    pub fn run_loop(
        &mut self,
        source: &mut dyn FrameSource,
        detector: &mut dyn FaceDetector,
        sink: &mut dyn DisplaySink,
        net: watch::Receiver<NetworkStatus>,
    ) -> Result<LoopStats> {
        let result = self.drive(source, detector, sink, net);

        // Release resources on success and error paths alike
        let source_closed = source.close();
        let sink_closed = sink.close();

        let stats = result?;
        source_closed?;
        sink_closed?;

        info!(
            frames = stats.frames,
            detect_runs = stats.detect_runs,
            faces_seen = stats.faces_seen,
            "Render loop finished"
        );
        Ok(stats)
    }

    fn drive(
        &mut self,
        source: &mut dyn FrameSource,
        detector: &mut dyn FaceDetector,
        sink: &mut dyn DisplaySink,
        net: watch::Receiver<NetworkStatus>,
    ) -> Result<LoopStats> {
        // Cadences are validated non-zero at startup; guard anyway so an
        // unvalidated config cannot divide by zero.
        let frame_skip = self.config.detector.frame_skip.max(1);
        let cpu_refresh_frames =
            (frame_skip * self.config.telemetry.cpu_refresh_multiplier).max(1);
        let frame_delay = Duration::from_millis(self.config.display.frame_delay_ms);

        let mut stats = LoopStats::default();
        let mut frame_count: u64 = 0;

        loop {
            let mut frame = match source.next_frame()? {
                Some(frame) => frame,
                None => {
                    info!("Capture stream ended, terminating loop");
                    break;
                }
            };

            // Detection runs every Nth frame; skipped frames draw no boxes
            // at all rather than reusing stale results.
            if frame_count % frame_skip == 0 {
                stats.detect_runs += 1;
                let gray = frame.to_gray();
                match detector.detect(&gray) {
                    Ok(regions) => {
                        stats.faces_seen += regions.len() as u64;
                        draw_face_boxes(&mut frame, &regions)?;
                    }
                    Err(e) => warn!("Face detection failed on frame {}: {}", frame_count, e),
                }
            }

            apply_red_tint(&mut frame);

            if frame_count % cpu_refresh_frames == 0 {
                self.telemetry.refresh_cpu();
            }
            self.telemetry.refresh_ram();

            let metrics = self.telemetry.snapshot();
            let status = *net.borrow();
            let lines = [
                format!("CPU: {:.2}%", metrics.cpu_percent),
                format!("RAM: {:.2}%", metrics.ram_percent),
                format!("Network: {}", status),
                Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            ];
            self.overlay.draw_status_lines(&mut frame, &lines)?;

            stats.frames += 1;
            if sink.present(&frame)? == KeyPoll::Quit {
                info!("Quit key pressed, terminating loop");
                break;
            }

            frame_count += 1;
            if !frame_delay.is_zero() {
                std::thread::sleep(frame_delay);
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FaceRegion;
    use crate::mock::{MockDetector, MockFrameSource, NullDisplay};

    fn test_config() -> TintcamConfig {
        let mut config = TintcamConfig::default();
        // No sleeping, no real /proc reads, no font
        config.display.frame_delay_ms = 0;
        config.telemetry.stat_path = "/nonexistent/stat".to_string();
        config.telemetry.meminfo_path = "/nonexistent/meminfo".to_string();
        config.overlay.font_path = "/nonexistent/font.ttf".to_string();
        config
    }

    fn status_channel(status: NetworkStatus) -> watch::Receiver<NetworkStatus> {
        // The receiver keeps serving the last value after the sender drops
        let (_tx, rx) = watch::channel(status);
        rx
    }

    #[test]
    fn test_loop_ends_when_stream_is_exhausted() {
        let mut app = TintcamApp::new(test_config());
        let mut source = MockFrameSource::numbered(4, 8, 8);
        let mut detector = MockDetector::new(vec![]);
        let mut sink = NullDisplay::new();

        let stats = app
            .run_loop(
                &mut source,
                &mut detector,
                &mut sink,
                status_channel(NetworkStatus::Unknown),
            )
            .unwrap();

        assert_eq!(stats.frames, 4);
        assert_eq!(sink.presented, 4);
        assert_eq!(source.close_count, 1);
        assert_eq!(sink.close_count, 1);
    }

    #[test]
    fn test_empty_stream_terminates_immediately() {
        let mut app = TintcamApp::new(test_config());
        let mut source = MockFrameSource::new(vec![]);
        let mut detector = MockDetector::new(vec![]);
        let mut sink = NullDisplay::new();

        let stats = app
            .run_loop(
                &mut source,
                &mut detector,
                &mut sink,
                status_channel(NetworkStatus::Unknown),
            )
            .unwrap();

        assert_eq!(stats.frames, 0);
        assert_eq!(stats.detect_runs, 0);
        assert_eq!(source.close_count, 1);
    }

    #[test]
    fn test_detection_cadence_with_frame_skip_three() {
        let mut app = TintcamApp::new(test_config());
        let mut source = MockFrameSource::numbered(8, 8, 8);
        let mut detector = MockDetector::new(vec![]);
        let mut sink = NullDisplay::new();

        let stats = app
            .run_loop(
                &mut source,
                &mut detector,
                &mut sink,
                status_channel(NetworkStatus::Connected),
            )
            .unwrap();

        // Frames 0, 3 and 6 out of 0..=7
        assert_eq!(stats.detect_runs, 3);
        assert_eq!(detector.seen_brightness, vec![0, 3, 6]);
    }

    #[test]
    fn test_no_stale_boxes_on_skipped_frames() {
        let mut app = TintcamApp::new(test_config());
        let mut source = MockFrameSource::numbered(2, 16, 16);
        let mut detector = MockDetector::new(vec![FaceRegion::new(4, 4, 8, 8)]);
        let mut sink = NullDisplay::recording();

        app.run_loop(
            &mut source,
            &mut detector,
            &mut sink,
            status_channel(NetworkStatus::Unknown),
        )
        .unwrap();

        assert_eq!(sink.recorded.len(), 2);
        // Frame 0 was a detection frame: white box corner, tinted afterwards
        assert_eq!(sink.recorded[0].pixel(4, 4), (127, 127, 255));
        // Frame 1 skipped detection: the same pixel carries only the tinted
        // background, no redrawn box
        assert_eq!(sink.recorded[1].pixel(4, 4), (0, 0, 1));
    }

    #[test]
    fn test_quit_key_ends_loop_and_releases_resources() {
        let mut app = TintcamApp::new(test_config());
        let mut source = MockFrameSource::numbered(10, 8, 8);
        let mut detector = MockDetector::new(vec![]);
        let mut sink = NullDisplay::quit_after(2);

        let stats = app
            .run_loop(
                &mut source,
                &mut detector,
                &mut sink,
                status_channel(NetworkStatus::Disconnected),
            )
            .unwrap();

        assert_eq!(stats.frames, 2);
        assert_eq!(source.close_count, 1);
        assert_eq!(sink.close_count, 1);
    }

    #[test]
    fn test_detector_error_does_not_abort_the_loop() {
        struct FailingDetector;

        impl FaceDetector for FailingDetector {
            fn detect(
                &mut self,
                _gray: &image::GrayImage,
            ) -> crate::error::Result<Vec<FaceRegion>> {
                Err(crate::error::TintcamError::detector("synthetic failure"))
            }
        }

        let mut app = TintcamApp::new(test_config());
        let mut source = MockFrameSource::numbered(4, 8, 8);
        let mut detector = FailingDetector;
        let mut sink = NullDisplay::new();

        let stats = app
            .run_loop(
                &mut source,
                &mut detector,
                &mut sink,
                status_channel(NetworkStatus::Unknown),
            )
            .unwrap();

        assert_eq!(stats.frames, 4);
        assert_eq!(stats.faces_seen, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_without_backend_stops_monitor() {
        // With the opencv feature the cascade path is absent, without it
        // there is no backend at all; either way startup must fail fast
        // and still join the monitor task.
        let mut config = test_config();
        config.detector.cascade_path = "/nonexistent/cascade.xml".to_string();
        config.monitor.interval_seconds = 3600;

        let app = TintcamApp::new(config);
        assert!(app.run().await.is_err());
    }
}
