//! Persistence of verified image bytes to the dataset layout.
//!
//! Writes follow a two-phase protocol: bytes land at a provisional
//! extension-less path, the true type is sniffed from the written bytes, and
//! the file is then renamed to carry the resolved extension. The extension is
//! never trusted from the URL or the manifest. The provisional file is
//! removed on every failure path, so a file is never left on disk without a
//! resolvable type.
//!
//! Output layout:
//!
//! ```text
//! <root>/images/<name>/<name>_<image_id>.<ext>
//! <root>/faces/<name>/<name>_<image_id>_<face_id>.<ext>   (crop only)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::manifest::ManifestRecord;
use crate::sniff::ContentSniffer;

/// Errors that can occur while persisting an image.
#[derive(Debug, Error)]
pub enum PersistError {
    /// File system error (directory creation, write, rename).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// No available sniffing method could resolve the file type.
    #[error("cannot determine file type for {url}")]
    UnknownFileType {
        /// URL the bytes came from, for traceability.
        url: String,
    },

    /// The bounding box does not describe a non-empty rectangle.
    #[error("invalid crop region {x1},{y1},{x2},{y2} for {path}")]
    InvalidCropRegion {
        /// The saved full image the crop was attempted on.
        path: PathBuf,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
    },

    /// The saved image could not be decoded, cropped, or re-encoded.
    ///
    /// The full image remains on disk; only the face crop is missing.
    #[error("crop failed for {path}: {source}")]
    Crop {
        /// The saved full image that failed to crop.
        path: PathBuf,
        /// The underlying image error.
        #[source]
        source: image::ImageError,
    },
}

impl PersistError {
    /// Creates an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Paths of the artifacts written for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedArtifact {
    /// Full-size image path, always present on success.
    pub image_path: PathBuf,
    /// Face-crop path, present when a crop was requested and succeeded.
    pub face_path: Option<PathBuf>,
}

/// Writes verified bytes into the dataset tree.
#[derive(Debug, Clone)]
pub struct ImagePersister {
    root: PathBuf,
    sniffer: ContentSniffer,
}

impl ImagePersister {
    /// Creates a persister rooted at the dataset directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, sniffer: ContentSniffer) -> Self {
        Self {
            root: root.into(),
            sniffer,
        }
    }

    /// Persists the full image and, when requested, the face crop.
    ///
    /// Re-persisting the same record with identical bytes is idempotent: the
    /// artifact is rewritten at the same final path and no provisional files
    /// accumulate.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] on IO failure, when the file type cannot be
    /// resolved (the provisional file is removed first), or when the face
    /// crop fails. A crop failure does not roll back the already-saved full
    /// image.
    pub fn persist(
        &self,
        record: &ManifestRecord,
        bytes: &[u8],
        crop_face: bool,
    ) -> Result<PersistedArtifact, PersistError> {
        let image_dir = self.root.join("images").join(record.sanitized_name());
        fs::create_dir_all(&image_dir).map_err(|e| PersistError::io(&image_dir, e))?;

        let provisional = ProvisionalFile::write(image_dir.join(record.image_stem()), bytes)?;

        let Some(sniffed) = self.sniffer.sniff(bytes) else {
            // Guard drop removes the extension-less file.
            return Err(PersistError::UnknownFileType {
                url: record.url.clone(),
            });
        };

        let image_path = provisional.promote(sniffed.extension)?;
        debug!(path = %image_path.display(), "saved full image");

        let face_path = if crop_face {
            Some(self.crop_face(record, &image_path, sniffed.extension)?)
        } else {
            None
        };

        Ok(PersistedArtifact {
            image_path,
            face_path,
        })
    }

    /// Crops the manifest's bounding box out of the saved full image.
    fn crop_face(
        &self,
        record: &ManifestRecord,
        image_path: &Path,
        extension: &str,
    ) -> Result<PathBuf, PersistError> {
        let bbox = record.bbox;
        let (Some(width), Some(height)) = (bbox.width(), bbox.height()) else {
            return Err(PersistError::InvalidCropRegion {
                path: image_path.to_path_buf(),
                x1: bbox.x1,
                y1: bbox.y1,
                x2: bbox.x2,
                y2: bbox.y2,
            });
        };

        let full = image::open(image_path).map_err(|e| PersistError::Crop {
            path: image_path.to_path_buf(),
            source: e,
        })?;
        let face = full.crop_imm(bbox.x1, bbox.y1, width, height);

        let face_dir = self.root.join("faces").join(record.sanitized_name());
        fs::create_dir_all(&face_dir).map_err(|e| PersistError::io(&face_dir, e))?;

        let face_path = face_dir.join(format!("{}.{extension}", record.face_stem()));
        face.save(&face_path).map_err(|e| PersistError::Crop {
            path: image_path.to_path_buf(),
            source: e,
        })?;
        debug!(path = %face_path.display(), "saved face crop");

        Ok(face_path)
    }
}

/// Extension-less provisional file, removed on drop unless promoted.
struct ProvisionalFile {
    path: PathBuf,
    promoted: bool,
}

impl ProvisionalFile {
    /// Writes `bytes` to the provisional path.
    fn write(path: PathBuf, bytes: &[u8]) -> Result<Self, PersistError> {
        fs::write(&path, bytes).map_err(|e| PersistError::io(&path, e))?;
        Ok(Self {
            path,
            promoted: false,
        })
    }

    /// Renames the file to carry the resolved extension, disarming cleanup.
    fn promote(mut self, extension: &str) -> Result<PathBuf, PersistError> {
        let mut final_path = self.path.clone().into_os_string();
        final_path.push(".");
        final_path.push(extension);
        let final_path = PathBuf::from(final_path);

        fs::rename(&self.path, &final_path).map_err(|e| PersistError::io(&final_path, e))?;
        self.promoted = true;
        Ok(final_path)
    }
}

impl Drop for ProvisionalFile {
    fn drop(&mut self) {
        if !self.promoted {
            let _ = fs::remove_file(&self.path);
        }
    }
}
