//! Frame sources for the streaming controller.

use crate::constants::IMAGE_EXTENSIONS;
use crate::error::Result;
use crate::image::load_image_bytes;
use image::DynamicImage;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A source of frames for the streaming controller.
pub trait FrameSource {
    /// The next frame, or `None` when nothing is available right now.
    fn next_frame(&mut self) -> Result<Option<DynamicImage>>;

    /// Whether `None` means "wait for more" rather than "stream ended".
    fn is_live(&self) -> bool {
        false
    }
}

/// Streams image files from a directory in sorted order.
///
/// In watch mode the directory is rescanned on every exhausted poll, so
/// files dropped in while the stream runs are picked up; each file is
/// yielded at most once. Undecodable files are skipped with a warning.
pub struct DirectoryFrameSource {
    dir: PathBuf,
    watch: bool,
    seen: HashSet<PathBuf>,
    pending: Vec<PathBuf>,
}

impl DirectoryFrameSource {
    /// Source that drains the directory's current contents, then ends.
    pub fn new(dir: &Path) -> Self {
        Self::with_watch(dir, false)
    }

    /// Source that keeps polling the directory for new files.
    pub fn watching(dir: &Path) -> Self {
        Self::with_watch(dir, true)
    }

    fn with_watch(dir: &Path, watch: bool) -> Self {
        Self {
            dir: dir.to_path_buf(),
            watch,
            seen: HashSet::new(),
            pending: Vec::new(),
        }
    }

    fn rescan(&mut self) -> Result<()> {
        let mut fresh: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(std::result::Result::ok)
            .map(|e| e.path())
            .filter(|p| is_image_file(p) && !self.seen.contains(p))
            .collect();
        fresh.sort();
        // Popped from the back, so store newest-first.
        fresh.reverse();
        self.pending = fresh;
        Ok(())
    }
}

impl FrameSource for DirectoryFrameSource {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        loop {
            if self.pending.is_empty() {
                self.rescan()?;
                if self.pending.is_empty() {
                    return Ok(None);
                }
            }

            while let Some(path) = self.pending.pop() {
                self.seen.insert(path.clone());
                let bytes = std::fs::read(&path)?;
                match load_image_bytes(&bytes, &path.display().to_string()) {
                    Ok(frame) => return Ok(Some(frame)),
                    Err(e) => warn!("skipping frame: {e}"),
                }
            }
        }
    }

    fn is_live(&self) -> bool {
        self.watch
    }
}

/// Whether a path looks like a supported image file.
pub fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                let lower = ext.to_lowercase();
                IMAGE_EXTENSIONS.contains(&lower.as_str())
            })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        image::DynamicImage::ImageRgb8(image::RgbImage::new(4, 4))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn test_drains_directory_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "b.png");
        write_png(dir.path(), "a.png");
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = DirectoryFrameSource::new(dir.path());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
        assert!(!source.is_live());
    }

    #[test]
    fn test_watch_mode_picks_up_new_files() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "first.png");

        let mut source = DirectoryFrameSource::watching(dir.path());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.is_live());

        write_png(dir.path(), "second.png");
        assert!(source.next_frame().unwrap().is_some());
        // Already-seen files are not yielded again.
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_skips_undecodable_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();
        write_png(dir.path(), "ok.png");

        let mut source = DirectoryFrameSource::new(dir.path());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }
}
