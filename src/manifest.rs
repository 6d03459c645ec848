//! Manifest parsing for the FaceScrub data file.
//!
//! The manifest is a UTF-8 tab-separated file with a header line followed by
//! one record per line:
//!
//! ```text
//! name\timage_id\tface_id\turl\tx1,y1,x2,y2\tsha256hex
//! ```
//!
//! The header line is skipped by the batch driver and never reaches
//! [`parse_line`].

use thiserror::Error;

/// Number of tab-separated fields in a well-formed manifest line.
const FIELD_COUNT: usize = 6;

/// Errors raised while parsing a single manifest line.
#[derive(Debug, Clone, Error)]
pub enum ManifestError {
    /// The line does not split into exactly six tab-separated fields.
    #[error("malformed record: expected {FIELD_COUNT} tab-separated fields, found {found}")]
    FieldCount {
        /// Number of fields actually present.
        found: usize,
    },

    /// A numeric id field does not parse as an integer.
    #[error("malformed record: {field} '{value}' is not an integer")]
    InvalidId {
        /// Which field failed (`image_id` or `face_id`).
        field: &'static str,
        /// The offending field text.
        value: String,
    },

    /// The bounding-box field is not four comma-separated integers.
    #[error("malformed record: bounding box '{value}' is not four comma-separated integers")]
    InvalidBoundingBox {
        /// The offending field text.
        value: String,
    },
}

/// Rectangular face region in pixel coordinates.
///
/// The parser only guarantees that four integers were present; ordering
/// (`x1 < x2`, `y1 < y2`) is checked downstream at crop time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingBox {
    /// Width of the box, or `None` when the corners are inverted or collapsed.
    #[must_use]
    pub fn width(&self) -> Option<u32> {
        (self.x2 > self.x1).then(|| self.x2 - self.x1)
    }

    /// Height of the box, or `None` when the corners are inverted or collapsed.
    #[must_use]
    pub fn height(&self) -> Option<u32> {
        (self.y2 > self.y1).then(|| self.y2 - self.y1)
    }
}

/// One parsed manifest line. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    /// Display name of the person, as written in the manifest.
    pub name: String,
    /// Per-person image number.
    pub image_id: u64,
    /// Face number within the image.
    pub face_id: u64,
    /// Source URL of the full image.
    pub url: String,
    /// Face region within the full image.
    pub bbox: BoundingBox,
    /// Expected SHA-256 of the image bytes, lowercase hex.
    pub sha256: String,
}

impl ManifestRecord {
    /// Display name made safe for path use: spaces become underscores.
    #[must_use]
    pub fn sanitized_name(&self) -> String {
        self.name.replace(' ', "_")
    }

    /// File stem of the full-image artifact: `<name>_<image_id>`.
    #[must_use]
    pub fn image_stem(&self) -> String {
        format!("{}_{}", self.sanitized_name(), self.image_id)
    }

    /// File stem of the face-crop artifact: `<name>_<image_id>_<face_id>`.
    #[must_use]
    pub fn face_stem(&self) -> String {
        format!("{}_{}_{}", self.sanitized_name(), self.image_id, self.face_id)
    }
}

/// Parses one manifest data line into a [`ManifestRecord`].
///
/// # Errors
///
/// Returns [`ManifestError`] when the line does not have exactly six
/// tab-separated fields, when either id is not an integer, or when the
/// bounding box is not four comma-separated integers.
pub fn parse_line(line: &str) -> Result<ManifestRecord, ManifestError> {
    let parts: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    if parts.len() != FIELD_COUNT {
        return Err(ManifestError::FieldCount { found: parts.len() });
    }

    let image_id: u64 = parts[1].parse().map_err(|_| ManifestError::InvalidId {
        field: "image_id",
        value: parts[1].to_string(),
    })?;
    let face_id: u64 = parts[2].parse().map_err(|_| ManifestError::InvalidId {
        field: "face_id",
        value: parts[2].to_string(),
    })?;
    let bbox = parse_bbox(parts[4])?;

    Ok(ManifestRecord {
        name: parts[0].to_string(),
        image_id,
        face_id,
        url: parts[3].to_string(),
        bbox,
        sha256: parts[5].trim().to_ascii_lowercase(),
    })
}

/// Parses the `x1,y1,x2,y2` bounding-box field.
fn parse_bbox(field: &str) -> Result<BoundingBox, ManifestError> {
    let invalid = || ManifestError::InvalidBoundingBox {
        value: field.to_string(),
    };

    let coords: Vec<u32> = field
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|_| invalid())?;

    match coords.as_slice() {
        &[x1, y1, x2, y2] => Ok(BoundingBox { x1, y1, x2, y2 }),
        _ => Err(invalid()),
    }
}
