//! Loading images from local paths or HTTP(S) URLs.

use crate::error::{Error, Result};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where an input image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Local filesystem path.
    Path(PathBuf),
    /// Remote HTTP or HTTPS URL.
    Url(String),
}

impl ImageSource {
    /// Classify a raw CLI argument as a path or URL.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Url(raw.to_string())
        } else {
            Self::Path(PathBuf::from(raw))
        }
    }

    /// Short human-readable name for logs and error messages.
    pub fn display_name(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
        }
    }

    /// Stem used when deriving output file names. URLs fall back to the last
    /// path segment, or "download" when the URL has none.
    pub fn file_stem(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_stem()
                .map_or_else(|| "image".to_string(), |s| s.to_string_lossy().to_string()),
            Self::Url(url) => url
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .map_or_else(|| "download".to_string(), |s| {
                    s.split('.').next().unwrap_or(s).to_string()
                }),
        }
    }
}

/// Fetch and decode an image from either source kind.
pub async fn fetch_image(source: &ImageSource) -> Result<DynamicImage> {
    match source {
        ImageSource::Path(path) => load_from_path(path),
        ImageSource::Url(url) => {
            let bytes = download(url).await?;
            load_image_bytes(&bytes, url)
        }
    }
}

/// Decode raw image bytes, attaching the source name to decode failures.
pub fn load_image_bytes(bytes: &[u8], source_name: &str) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|source| Error::ImageDecode {
        source_name: source_name.to_string(),
        source,
    })
}

fn load_from_path(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path)?;
    load_image_bytes(&bytes, &path.display().to_string())
}

async fn download(url: &str) -> Result<Vec<u8>> {
    debug!("Downloading image from {url}");

    let response = reqwest::get(url).await.map_err(|e| Error::ImageFetch {
        url: url.to_string(),
        source: Box::new(e),
    })?;

    let response = response.error_for_status().map_err(|e| Error::ImageFetch {
        url: url.to_string(),
        source: Box::new(e),
    })?;

    let bytes = response.bytes().await.map_err(|e| Error::ImageFetch {
        url: url.to_string(),
        source: Box::new(e),
    })?;

    Ok(bytes.to_vec())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_sources() {
        assert_eq!(
            ImageSource::parse("https://example.com/a.jpg"),
            ImageSource::Url("https://example.com/a.jpg".to_string())
        );
        assert_eq!(
            ImageSource::parse("http://example.com/a.jpg"),
            ImageSource::Url("http://example.com/a.jpg".to_string())
        );
    }

    #[test]
    fn test_parse_path_sources() {
        assert_eq!(
            ImageSource::parse("photos/bird.png"),
            ImageSource::Path(PathBuf::from("photos/bird.png"))
        );
        // A scheme-less host string is still treated as a path.
        assert_eq!(
            ImageSource::parse("example.com/a.jpg"),
            ImageSource::Path(PathBuf::from("example.com/a.jpg"))
        );
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(ImageSource::parse("photos/bird.png").file_stem(), "bird");
        assert_eq!(
            ImageSource::parse("https://example.com/shots/robin.jpg").file_stem(),
            "robin"
        );
        assert_eq!(
            ImageSource::parse("https://example.com/").file_stem(),
            "download"
        );
    }

    #[test]
    fn test_load_image_bytes_rejects_garbage() {
        let err = load_image_bytes(b"not an image", "garbage.jpg").unwrap_err();
        assert!(err.to_string().contains("garbage.jpg"));
    }

    #[test]
    fn test_load_image_bytes_decodes_png() {
        let mut bytes = Vec::new();
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]));
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();

        let decoded = load_image_bytes(&bytes, "tiny.png").unwrap();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 4);
    }
}
