//! Artifact encoding.

use crate::pattern::PixelBuffer;
use image::{GrayImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Lossless 8-bit grayscale encodings for pattern and capture files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    /// Uncompressed bitmap with an 8-bit palette.
    #[default]
    Bmp,
    /// Deflate-compressed PNG.
    Png,
}

impl ArtifactFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Bmp => "bmp",
            Self::Png => "png",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            Self::Bmp => ImageFormat::Bmp,
            Self::Png => ImageFormat::Png,
        }
    }
}

/// Errors raised while persisting an artifact.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// Encoding or writing the file failed.
    #[error("failed to encode {path}: {source}")]
    Encode {
        /// Artifact path.
        path: PathBuf,
        /// Encoder error.
        #[source]
        source: image::ImageError,
    },
    /// The writer refused the artifact.
    #[error("{path}: {reason}")]
    Rejected {
        /// Artifact path.
        path: PathBuf,
        /// Why the writer refused it.
        reason: String,
    },
}

/// Persists pixel buffers.
pub trait ArtifactWriter {
    /// Makes `dir` ready to receive artifacts.
    fn prepare(&mut self, dir: &Path) -> Result<(), WriteError>;

    /// Encodes `buffer` to `path`.
    fn write(&mut self, path: &Path, buffer: &PixelBuffer) -> Result<(), WriteError>;

    /// Encoding used, which determines file extensions.
    fn format(&self) -> ArtifactFormat;
}

/// Writes artifacts to disk with the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct ImageWriter {
    format: ArtifactFormat,
}

impl ImageWriter {
    /// Writer producing `format` files.
    pub fn new(format: ArtifactFormat) -> Self {
        Self { format }
    }
}

impl ArtifactWriter for ImageWriter {
    fn prepare(&mut self, dir: &Path) -> Result<(), WriteError> {
        std::fs::create_dir_all(dir).map_err(|source| WriteError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
    }

    fn write(&mut self, path: &Path, buffer: &PixelBuffer) -> Result<(), WriteError> {
        let img = GrayImage::from_raw(buffer.width(), buffer.height(), buffer.pixels().to_vec())
            .ok_or_else(|| WriteError::Rejected {
                path: path.to_path_buf(),
                reason: "pixel data does not match dimensions".into(),
            })?;
        img.save_with_format(path, self.format.image_format())
            .map_err(|source| WriteError::Encode {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::trace!(path = %path.display(), "Artifact written");
        Ok(())
    }

    fn format(&self) -> ArtifactFormat {
        self.format
    }
}

/// Keeps artifacts in memory, keyed by path.
///
/// Paths listed with [`MemoryWriter::rejecting`] fail, and `reject_all`
/// simulates a full or read-only disk.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    files: BTreeMap<PathBuf, PixelBuffer>,
    rejected: Vec<PathBuf>,
    reject_all: bool,
    attempts: usize,
}

impl MemoryWriter {
    /// An empty writer that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every write whose file name contains one of `fragments`.
    pub fn rejecting(fragments: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            rejected: fragments.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Fails every write.
    pub fn read_only() -> Self {
        Self {
            reject_all: true,
            ..Self::default()
        }
    }

    /// Stored artifacts keyed by full path.
    pub fn files(&self) -> &BTreeMap<PathBuf, PixelBuffer> {
        &self.files
    }

    /// File names (without directories) in sorted order.
    pub fn file_names(&self) -> Vec<String> {
        self.files
            .keys()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    /// Total `write` calls, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl ArtifactWriter for MemoryWriter {
    fn prepare(&mut self, _dir: &Path) -> Result<(), WriteError> {
        Ok(())
    }

    fn write(&mut self, path: &Path, buffer: &PixelBuffer) -> Result<(), WriteError> {
        self.attempts += 1;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let rejected = self
            .rejected
            .iter()
            .any(|frag| name.contains(frag.to_string_lossy().as_ref()));
        if self.reject_all || rejected {
            return Err(WriteError::Rejected {
                path: path.to_path_buf(),
                reason: "write rejected".into(),
            });
        }
        self.files.insert(path.to_path_buf(), buffer.clone());
        Ok(())
    }

    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Bmp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Resolution;

    #[test]
    fn test_bmp_round_trip_preserves_gray_levels() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let mut writer = ImageWriter::new(ArtifactFormat::Bmp);
        writer.prepare(&out).unwrap();

        let buf = PixelBuffer::from_fn(Resolution::new(7, 3), |x, y| (x * 30 + y) as u8);
        let path = out.join("pattern.bmp");
        writer.write(&path, &buf).unwrap();

        let decoded = image::open(&path).unwrap().into_luma8();
        assert_eq!(decoded.dimensions(), (7, 3));
        assert_eq!(decoded.as_raw(), buf.pixels());
    }

    #[test]
    fn test_png_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ImageWriter::new(ArtifactFormat::Png);
        let buf = PixelBuffer::filled(Resolution::new(4, 4), 200);
        let path = dir.path().join(format!("a.{}", writer.format().extension()));
        writer.write(&path, &buf).unwrap();
        assert!(image::open(&path).unwrap().into_luma8().iter().all(|&p| p == 200));
    }

    #[test]
    fn test_memory_writer_rejections() {
        let buf = PixelBuffer::filled(Resolution::new(1, 1), 0);
        let mut writer = MemoryWriter::rejecting(["capture"]);
        assert!(writer.write(Path::new("out/pattern_0000.bmp"), &buf).is_ok());
        assert!(writer.write(Path::new("out/capture_0000.bmp"), &buf).is_err());
        assert_eq!(writer.file_names(), vec!["pattern_0000.bmp".to_string()]);
        assert_eq!(writer.attempts(), 2);
    }
}
