//! Turning image paths from the project file into [Photo]s.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{CpFindError, Result};
use crate::photo::Photo;

/// Decodes an image path into a normalized, channel-first [Photo].
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, path: &str) -> Result<Photo>;
}

/// Decodes image files from disk with the `image` crate.
///
/// Relative paths are resolved against `base_dir`, normally the directory
/// holding the project file. Color images become three channels, grayscale
/// images one; alpha is discarded.
#[derive(Debug, Clone)]
pub struct FileDecoder {
    base_dir: PathBuf,
}

impl FileDecoder {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        FileDecoder {
            base_dir: base_dir.into(),
        }
    }

    /// Uses the directory containing `project_path` as the base directory.
    pub fn for_project(project_path: &Path) -> Self {
        let base_dir = project_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::new(base_dir)
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl ImageDecoder for FileDecoder {
    fn decode(&self, path: &str) -> Result<Photo> {
        let full_path = self.resolve(path);
        let img = image::open(&full_path).map_err(|source| CpFindError::ImageDecode {
            path: full_path.clone(),
            source,
        })?;
        photo_from_image(&img)
    }
}

/// Converts a decoded image into a [Photo] with samples in `[0, 1]`.
pub fn photo_from_image(img: &DynamicImage) -> Result<Photo> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let plane_len = width * height;

    if img.color().has_color() {
        let rgb = img.to_rgb8();
        let mut data = vec![0.0f32; 3 * plane_len];
        for (i, pixel) in rgb.pixels().enumerate() {
            for channel in 0..3 {
                data[channel * plane_len + i] = pixel.0[channel] as f32 / 255.0;
            }
        }
        Photo::new(3, width, height, data)
    } else {
        let luma = img.to_luma8();
        let data = luma.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        Photo::new(1, width, height, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn decodes_rgb_channel_first() {
        let dir = TempDir::new().unwrap();
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, Rgb([255, 0, 51]));
        img.save(dir.path().join("rgb.png")).unwrap();

        let photo = FileDecoder::new(dir.path()).decode("rgb.png").unwrap();
        assert_eq!((photo.channels, photo.width, photo.height), (3, 3, 2));
        assert_eq!(photo.get(0, 2, 1), 1.0);
        assert_eq!(photo.get(1, 2, 1), 0.0);
        assert!((photo.get(2, 2, 1) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn decodes_grayscale_as_single_channel() {
        let dir = TempDir::new().unwrap();
        let mut img = GrayImage::new(2, 2);
        img.put_pixel(1, 0, Luma([255]));
        img.save(dir.path().join("gray.png")).unwrap();

        let decoder = FileDecoder::for_project(&dir.path().join("project.pto"));
        let photo = decoder.decode("gray.png").unwrap();
        assert_eq!(photo.channels, 1);
        assert_eq!(photo.get(0, 1, 0), 1.0);
    }

    #[test]
    fn absolute_paths_bypass_base_dir() {
        let decoder = FileDecoder::new("/projects");
        assert_eq!(decoder.resolve("a.jpg"), PathBuf::from("/projects/a.jpg"));
        assert_eq!(decoder.resolve("/data/b.jpg"), PathBuf::from("/data/b.jpg"));
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let result = FileDecoder::new(dir.path()).decode("nope.png");
        assert!(matches!(result, Err(CpFindError::ImageDecode { .. })));
    }
}
