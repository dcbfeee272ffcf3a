use crate::error::Result;
use crate::frame::FaceRegion;
use image::GrayImage;

#[cfg(feature = "opencv")]
use crate::config::DetectorConfig;
#[cfg(feature = "opencv")]
use crate::error::TintcamError;
#[cfg(feature = "opencv")]
use opencv::{
    core::{Mat, Rect as CvRect, Scalar, Size, Vector, CV_8UC1},
    objdetect::CascadeClassifier,
    prelude::*,
};
#[cfg(feature = "opencv")]
use tracing::info;

/// Face detection seam. Implementations may be stateful, hence `&mut self`.
pub trait FaceDetector {
    /// Detect faces in a grayscale image, returning zero or more regions
    fn detect(&mut self, gray: &GrayImage) -> Result<Vec<FaceRegion>>;
}

/// Pretrained Haar cascade classifier backed by OpenCV
#[cfg(feature = "opencv")]
pub struct HaarFaceDetector {
    classifier: CascadeClassifier,
    scale_factor: f64,
    min_neighbors: i32,
    min_size: i32,
}

#[cfg(feature = "opencv")]
impl HaarFaceDetector {
    /// Load the cascade model. Failure here is fatal at startup.
    pub fn load(config: &DetectorConfig) -> Result<Self> {
        if !std::path::Path::new(&config.cascade_path).exists() {
            return Err(TintcamError::detector(format!(
                "cascade model not found: {}",
                config.cascade_path
            )));
        }

        let classifier = CascadeClassifier::new(&config.cascade_path).map_err(|e| {
            TintcamError::detector(format!(
                "failed to load cascade '{}': {}",
                config.cascade_path, e
            ))
        })?;

        info!("Loaded Haar cascade from {}", config.cascade_path);
        Ok(Self {
            classifier,
            scale_factor: config.scale_factor,
            min_neighbors: config.min_neighbors,
            min_size: config.min_size,
        })
    }

    fn gray_to_mat(gray: &GrayImage) -> Result<Mat> {
        let (width, height) = (gray.width() as i32, gray.height() as i32);
        let mut mat =
            Mat::new_rows_cols_with_default(height, width, CV_8UC1, Scalar::all(0.0))
                .map_err(|e| TintcamError::detector(format!("failed to allocate matrix: {}", e)))?;

        let bytes = mat
            .data_bytes_mut()
            .map_err(|e| TintcamError::detector(format!("failed to map matrix: {}", e)))?;
        bytes.copy_from_slice(gray.as_raw());

        Ok(mat)
    }
}

#[cfg(feature = "opencv")]
impl FaceDetector for HaarFaceDetector {
    fn detect(&mut self, gray: &GrayImage) -> Result<Vec<FaceRegion>> {
        let mat = Self::gray_to_mat(gray)?;

        let mut faces = Vector::<CvRect>::new();
        self.classifier
            .detect_multi_scale(
                &mat,
                &mut faces,
                self.scale_factor,
                self.min_neighbors,
                0,
                Size::new(self.min_size, self.min_size),
                Size::new(0, 0),
            )
            .map_err(|e| TintcamError::detector(format!("detection failed: {}", e)))?;

        Ok(faces
            .iter()
            .map(|r| FaceRegion::new(r.x, r.y, r.width.max(0) as u32, r.height.max(0) as u32))
            .collect())
    }
}
