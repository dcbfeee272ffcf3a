use crate::error::Result;
use crate::frame::Frame;

#[cfg(feature = "opencv")]
use crate::config::DisplayConfig;
#[cfg(feature = "opencv")]
use crate::error::TintcamError;
#[cfg(feature = "opencv")]
use opencv::{
    core::{Mat, Scalar, CV_8UC3},
    highgui,
    prelude::*,
};
#[cfg(feature = "opencv")]
use tracing::info;

/// Result of the bounded keypress poll performed after each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPoll {
    None,
    Quit,
}

/// Titled window that shows frames and polls for the quit key
pub trait DisplaySink {
    fn present(&mut self, frame: &Frame) -> Result<KeyPoll>;

    /// Close display resources. Idempotent.
    fn close(&mut self) -> Result<()>;
}

/// OpenCV highgui window. Keeps a reusable matrix sized to the incoming
/// frames so presenting does not allocate per iteration.
#[cfg(feature = "opencv")]
pub struct OpenCvWindow {
    title: String,
    key_poll_ms: i32,
    buffer: Option<Mat>,
    closed: bool,
}

#[cfg(feature = "opencv")]
impl OpenCvWindow {
    pub fn open(config: &DisplayConfig) -> Result<Self> {
        highgui::named_window(&config.window_title, highgui::WINDOW_AUTOSIZE)
            .map_err(|e| TintcamError::display(format!("failed to create window: {}", e)))?;

        info!("Opened display window '{}'", config.window_title);
        Ok(Self {
            title: config.window_title.clone(),
            key_poll_ms: config.key_poll_ms.min(i32::MAX as u64) as i32,
            buffer: None,
            closed: false,
        })
    }

    fn buffer_for(&mut self, frame: &Frame) -> Result<&mut Mat> {
        let (rows, cols) = (frame.height() as i32, frame.width() as i32);

        let needs_realloc = match &self.buffer {
            Some(mat) => mat.rows() != rows || mat.cols() != cols,
            None => true,
        };
        if needs_realloc {
            let mat = Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::all(0.0))
                .map_err(|e| {
                    TintcamError::display(format!("failed to allocate display buffer: {}", e))
                })?;
            self.buffer = Some(mat);
        }

        // Buffer was just ensured above
        self.buffer
            .as_mut()
            .ok_or_else(|| TintcamError::display("display buffer missing"))
    }
}

#[cfg(feature = "opencv")]
impl DisplaySink for OpenCvWindow {
    fn present(&mut self, frame: &Frame) -> Result<KeyPoll> {
        let title = self.title.clone();
        let key_poll_ms = self.key_poll_ms;

        let mat = self.buffer_for(frame)?;
        mat.data_bytes_mut()
            .map_err(|e| TintcamError::display(format!("failed to map display buffer: {}", e)))?
            .copy_from_slice(frame.data());

        highgui::imshow(&title, mat)
            .map_err(|e| TintcamError::display(format!("failed to show frame: {}", e)))?;

        let key = highgui::wait_key(key_poll_ms)
            .map_err(|e| TintcamError::display(format!("failed to poll keypress: {}", e)))?;

        if key == 'q' as i32 {
            Ok(KeyPoll::Quit)
        } else {
            Ok(KeyPoll::None)
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        highgui::destroy_all_windows()
            .map_err(|e| TintcamError::display(format!("failed to close windows: {}", e)))?;
        self.closed = true;
        info!("Display window closed");
        Ok(())
    }
}
