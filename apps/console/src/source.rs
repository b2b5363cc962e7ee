//! Document source over decks pre-rasterized into `slide_N.png` directories.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::imageops::FilterType;

use pipeline::{ConversionError, DocumentSource};
use shared::media::SlideImage;

pub struct RasterDirectorySource {
    root: PathBuf,
}

impl RasterDirectorySource {
    /// `root` anchors relative deck paths, typically the project file's
    /// directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }

    fn slide_file(&self, path: &str, index: usize) -> PathBuf {
        self.resolve(path).join(format!("slide_{index}.png"))
    }

    fn slide_files(&self, path: &str) -> Result<Vec<PathBuf>, ConversionError> {
        let dir = self.resolve(path);
        let entries = fs::read_dir(&dir).map_err(|_| ConversionError::SourceUnavailable {
            path: path.to_string(),
        })?;
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("slide_") && n.ends_with(".png"))
            })
            .collect();
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl DocumentSource for RasterDirectorySource {
    async fn fingerprint(&self, path: &str) -> Result<u64, ConversionError> {
        let files = self.slide_files(path)?;
        let mut hasher = DefaultHasher::new();
        for file in &files {
            file.hash(&mut hasher);
            let meta = fs::metadata(file).map_err(|err| ConversionError::Fingerprint {
                path: path.to_string(),
                reason: err.to_string(),
            })?;
            meta.len().hash(&mut hasher);
            if let Ok(modified) = meta.modified() {
                modified.hash(&mut hasher);
            }
        }
        Ok(hasher.finish())
    }

    async fn slide_count(&self, path: &str) -> Result<usize, ConversionError> {
        Ok(self.slide_files(path)?.len())
    }

    async fn render_slide(
        &self,
        path: &str,
        index: usize,
        width: u32,
        height: u32,
    ) -> Result<SlideImage, ConversionError> {
        let file = self.slide_file(path, index);
        let decoded = image::open(&file).map_err(|err| ConversionError::RenderFailed {
            path: path.to_string(),
            index,
            reason: err.to_string(),
        })?;
        let resized = decoded
            .resize(width, height, FilterType::Triangle)
            .to_rgba8();
        let (w, h) = resized.dimensions();
        Ok(SlideImage::from_rgba(w, h, resized.into_raw()))
    }
}
