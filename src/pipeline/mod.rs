//! Batch analysis pipeline: input collection and per-image processing.

use crate::config::Config;
use crate::constants::RESULTS_EXTENSION;
use crate::detect::BirdDetector;
use crate::error::{Error, Result};
use crate::image::{ImageSource, fetch_image};
use crate::output::{JsonResultFile, JsonSettings, write_results};
use crate::stream::is_image_file;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of processing one input source.
#[derive(Debug)]
pub enum ProcessResult {
    /// Results written to the given path.
    Written {
        /// Path of the JSON result file.
        output: PathBuf,
        /// Number of detections recorded.
        detections: usize,
    },
    /// Output already existed and `--force` was not given.
    SkippedExisting,
}

/// Expand raw CLI inputs into concrete image sources.
///
/// Directories are scanned one level deep for supported image files;
/// non-image files inside them are ignored. Fails when nothing usable
/// remains.
pub fn collect_input_sources(inputs: &[String]) -> Result<Vec<ImageSource>> {
    let mut sources = Vec::new();

    for raw in inputs {
        match ImageSource::parse(raw) {
            ImageSource::Url(url) => sources.push(ImageSource::Url(url)),
            ImageSource::Path(path) if path.is_dir() => {
                let mut files: Vec<PathBuf> = std::fs::read_dir(&path)?
                    .filter_map(std::result::Result::ok)
                    .map(|e| e.path())
                    .filter(|p| is_image_file(p))
                    .collect();
                files.sort();
                debug!("found {} image(s) in {}", files.len(), path.display());
                sources.extend(files.into_iter().map(ImageSource::Path));
            }
            ImageSource::Path(path) if is_image_file(&path) => {
                sources.push(ImageSource::Path(path));
            }
            ImageSource::Path(path) => {
                debug!("ignoring non-image input {}", path.display());
            }
        }
    }

    if sources.is_empty() {
        return Err(Error::NoValidImageFiles);
    }
    Ok(sources)
}

/// Path of the JSON result file for a source.
///
/// Defaults to sitting next to a local input file; URLs and explicit
/// `--output-dir` runs land in `output_dir` (falling back to the current
/// directory for URLs).
pub fn output_path_for(source: &ImageSource, output_dir: Option<&Path>) -> PathBuf {
    let file_name = format!("{}{RESULTS_EXTENSION}", source.file_stem());

    match (source, output_dir) {
        (_, Some(dir)) => dir.join(file_name),
        (ImageSource::Path(path), None) => path
            .parent()
            .map_or_else(|| PathBuf::from(&file_name), |p| p.join(&file_name)),
        (ImageSource::Url(_), None) => PathBuf::from(file_name),
    }
}

/// Analyze one source and write its JSON result file.
pub async fn process_source(
    detector: &BirdDetector,
    source: &ImageSource,
    config: &Config,
    output_dir: Option<&Path>,
    force: bool,
) -> Result<ProcessResult> {
    let output = output_path_for(source, output_dir);
    if output.exists() && !force {
        debug!("skipping {}: output exists", source.display_name());
        return Ok(ProcessResult::SkippedExisting);
    }

    let image = fetch_image(source).await?;
    let detections = detector.detect(&image)?;

    let results = JsonResultFile::new(
        &source.display_name(),
        JsonSettings {
            min_confidence: config.detection.confidence_threshold,
            iou_threshold: config.detection.iou_threshold,
            enhance: config.detection.enhance,
        },
        detections,
    );

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    write_results(&results, &output, config.output.pretty)?;

    info!(
        "{}: {} detection(s) -> {}",
        source.display_name(),
        results.summary.total_detections,
        output.display()
    );

    Ok(ProcessResult::Written {
        output,
        detections: results.summary.total_detections,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn touch_png(dir: &Path, name: &str) {
        image::DynamicImage::ImageRgb8(image::RgbImage::new(4, 4))
            .save_with_format(dir.join(name), image::ImageFormat::Png)
            .unwrap();
    }

    #[test]
    fn test_collect_expands_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch_png(dir.path(), "a.png");
        touch_png(dir.path(), "b.png");
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let sources =
            collect_input_sources(&[dir.path().to_string_lossy().to_string()]).unwrap();
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn test_collect_keeps_urls() {
        let sources =
            collect_input_sources(&["https://example.com/bird.jpg".to_string()]).unwrap();
        assert_eq!(
            sources,
            vec![ImageSource::Url("https://example.com/bird.jpg".to_string())]
        );
    }

    #[test]
    fn test_collect_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let err =
            collect_input_sources(&[dir.path().to_string_lossy().to_string()]).unwrap_err();
        assert!(matches!(err, Error::NoValidImageFiles));
    }

    #[test]
    fn test_output_path_next_to_input() {
        let source = ImageSource::Path(PathBuf::from("photos/bird.jpg"));
        assert_eq!(
            output_path_for(&source, None),
            PathBuf::from("photos/bird.avistar.json")
        );
    }

    #[test]
    fn test_output_path_honors_output_dir() {
        let source = ImageSource::Url("https://example.com/robin.jpg".to_string());
        assert_eq!(
            output_path_for(&source, Some(Path::new("out"))),
            PathBuf::from("out/robin.avistar.json")
        );
        assert_eq!(
            output_path_for(&source, None),
            PathBuf::from("robin.avistar.json")
        );
    }
}
