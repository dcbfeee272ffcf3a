pub mod app;
pub mod camera;
pub mod config;
pub mod detector;
pub mod display;
pub mod error;
pub mod filter;
pub mod frame;
pub mod mock;
pub mod netmon;
pub mod overlay;
pub mod telemetry;

pub use app::{LoopStats, TintcamApp};
pub use camera::FrameSource;
pub use config::TintcamConfig;
pub use detector::FaceDetector;
pub use display::{DisplaySink, KeyPoll};
pub use error::{Result, TintcamError};
pub use filter::apply_red_tint;
pub use frame::{FaceRegion, Frame};
pub use netmon::{NetworkMonitor, NetworkStatus, PingProbe, ReachabilityProbe};
pub use overlay::{draw_face_boxes, OverlayRenderer};
pub use telemetry::{CpuSampler, CpuTicks, MetricsSnapshot, TelemetrySampler};

#[cfg(feature = "opencv")]
pub use camera::OpenCvCamera;
#[cfg(feature = "opencv")]
pub use detector::HaarFaceDetector;
#[cfg(feature = "opencv")]
pub use display::OpenCvWindow;
