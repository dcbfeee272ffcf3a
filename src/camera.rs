use crate::error::Result;
use crate::frame::Frame;

#[cfg(feature = "opencv")]
use crate::config::CameraConfig;
#[cfg(feature = "opencv")]
use crate::error::TintcamError;
#[cfg(feature = "opencv")]
use crate::frame::BGR_BYTES_PER_PIXEL;
#[cfg(feature = "opencv")]
use opencv::{core::Mat, prelude::*, videoio};
#[cfg(feature = "opencv")]
use tracing::{debug, info};

/// Sequential source of BGR frames. `Ok(None)` signals end of stream
/// (device exhausted or disconnected) and terminates the render loop.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the underlying device. Idempotent.
    fn close(&mut self) -> Result<()>;
}

/// Default system camera via OpenCV's VideoCapture
#[cfg(feature = "opencv")]
pub struct OpenCvCamera {
    capture: videoio::VideoCapture,
    released: bool,
}

#[cfg(feature = "opencv")]
impl OpenCvCamera {
    /// Open the configured capture device. Failure here is fatal at startup.
    pub fn open(config: &CameraConfig) -> Result<Self> {
        let capture = videoio::VideoCapture::new(config.index, videoio::CAP_ANY)
            .map_err(|e| TintcamError::camera(format!("failed to create capture: {}", e)))?;

        let opened = capture
            .is_opened()
            .map_err(|e| TintcamError::camera(format!("failed to query capture: {}", e)))?;
        if !opened {
            return Err(TintcamError::camera(format!(
                "could not open video device {}",
                config.index
            )));
        }

        info!("Opened video capture device {}", config.index);
        Ok(Self {
            capture,
            released: false,
        })
    }

    fn mat_to_frame(mat: Mat) -> Result<Frame> {
        let (rows, cols) = (mat.rows(), mat.cols());
        if rows <= 0 || cols <= 0 {
            return Err(TintcamError::camera("capture produced an empty matrix"));
        }

        let mat = if mat.is_continuous() {
            mat
        } else {
            mat.try_clone()
                .map_err(|e| TintcamError::camera(format!("failed to clone matrix: {}", e)))?
        };

        let bytes = mat
            .data_bytes()
            .map_err(|e| TintcamError::camera(format!("failed to read frame bytes: {}", e)))?;

        let expected = rows as usize * cols as usize * BGR_BYTES_PER_PIXEL;
        if bytes.len() != expected {
            return Err(TintcamError::camera(format!(
                "unexpected frame layout: {} bytes for {}x{}",
                bytes.len(),
                cols,
                rows
            )));
        }

        Frame::from_bgr_data(cols as u32, rows as u32, bytes.to_vec())
    }
}

#[cfg(feature = "opencv")]
impl FrameSource for OpenCvCamera {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut mat = Mat::default();
        let grabbed = self
            .capture
            .read(&mut mat)
            .map_err(|e| TintcamError::camera(format!("failed to read frame: {}", e)))?;

        if !grabbed || mat.rows() <= 0 {
            debug!("Capture stream ended");
            return Ok(None);
        }

        Self::mat_to_frame(mat).map(Some)
    }

    fn close(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.capture
            .release()
            .map_err(|e| TintcamError::camera(format!("failed to release capture: {}", e)))?;
        self.released = true;
        info!("Video capture device released");
        Ok(())
    }
}

#[cfg(feature = "opencv")]
impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.capture.release();
        }
    }
}
