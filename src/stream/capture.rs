//! Persisting auto-captured frames.

use crate::detect::Detection;
use crate::error::{Error, Result};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::info;

/// Destination for auto-captured frames.
pub trait CaptureSink {
    /// Persist one captured frame together with its detection.
    fn capture(&mut self, frame: &DynamicImage, detection: &Detection) -> Result<()>;
}

/// Writes captures to a directory as a JPEG plus a JSON sidecar with the
/// detection that triggered it.
pub struct FileCaptureSink {
    dir: PathBuf,
}

impl FileCaptureSink {
    /// Create a sink writing into `dir`, creating it if needed.
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn capture_path(&self) -> PathBuf {
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%3f");
        self.dir.join(format!("capture-{stamp}.jpg"))
    }
}

impl CaptureSink for FileCaptureSink {
    fn capture(&mut self, frame: &DynamicImage, detection: &Detection) -> Result<()> {
        let image_path = self.capture_path();

        frame
            .to_rgb8()
            .save_with_format(&image_path, image::ImageFormat::Jpeg)
            .map_err(|e| Error::CaptureWrite {
                path: image_path.clone(),
                source: Box::new(e),
            })?;

        let sidecar_path = image_path.with_extension("json");
        let json = serde_json::to_string_pretty(detection).map_err(|source| Error::ResultWrite {
            path: sidecar_path.clone(),
            source,
        })?;
        std::fs::write(&sidecar_path, json)?;

        info!(
            "captured {} ({:.0}%) to {}",
            detection.species,
            detection.confidence * 100.0,
            image_path.display()
        );
        Ok(())
    }
}
