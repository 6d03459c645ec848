//! Content sniffing: deriving an image's true type from its bytes.
//!
//! Downloaded bytes are never trusted to match the URL's extension or the
//! server's `Content-Type` header. The sniffer inspects the payload itself
//! and reports a file extension and MIME type, or nothing when the bytes are
//! not a recognizable image.
//!
//! Two capabilities exist, chosen once at startup:
//! - [`ContentSniffer::Signature`] — lightweight magic-byte inspection,
//!   always available.
//! - [`ContentSniffer::Deep`] — signature inspection first, then the `image`
//!   crate's format guesser for anything the signature table misses.

/// Resolved file type of a sniffed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SniffedType {
    /// Canonical file extension, without the leading dot.
    pub extension: &'static str,
    /// MIME type, always in the `image/` family.
    pub mime: &'static str,
}

/// Content-sniffing capability. Selection is a startup configuration
/// decision, not a per-call one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentSniffer {
    /// Magic-byte signature table only.
    Signature,
    /// Signature table first, falling back to decoder-level format guessing.
    #[default]
    Deep,
}

impl ContentSniffer {
    /// Identifies the image type of `bytes`, or `None` when no available
    /// method recognizes them.
    #[must_use]
    pub fn sniff(&self, bytes: &[u8]) -> Option<SniffedType> {
        match self {
            Self::Signature => sniff_signature(bytes),
            Self::Deep => sniff_signature(bytes).or_else(|| sniff_deep(bytes)),
        }
    }

    /// MIME type of `bytes` as seen by this sniffer, for content-type
    /// validation.
    #[must_use]
    pub fn mime_type(&self, bytes: &[u8]) -> Option<&'static str> {
        self.sniff(bytes).map(|sniffed| sniffed.mime)
    }
}

const JPEG: SniffedType = SniffedType {
    extension: "jpg",
    mime: "image/jpeg",
};
const PNG: SniffedType = SniffedType {
    extension: "png",
    mime: "image/png",
};
const GIF: SniffedType = SniffedType {
    extension: "gif",
    mime: "image/gif",
};
const BMP: SniffedType = SniffedType {
    extension: "bmp",
    mime: "image/bmp",
};
const WEBP: SniffedType = SniffedType {
    extension: "webp",
    mime: "image/webp",
};
const TIFF: SniffedType = SniffedType {
    extension: "tiff",
    mime: "image/tiff",
};

/// Identifies common image formats by their leading magic bytes.
fn sniff_signature(bytes: &[u8]) -> Option<SniffedType> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(JPEG)
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some(PNG)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(GIF)
    } else if bytes.starts_with(b"BM") {
        Some(BMP)
    } else if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(b"WEBP".as_slice()) {
        Some(WEBP)
    } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        Some(TIFF)
    } else {
        None
    }
}

/// Decoder-level format guessing via the `image` crate.
///
/// The JPEG alias family (`jpe`, `jpeg`) is normalized to the canonical
/// `jpg` extension so both sniffing paths agree on artifact names.
fn sniff_deep(bytes: &[u8]) -> Option<SniffedType> {
    use image::ImageFormat;

    match image::guess_format(bytes).ok()? {
        ImageFormat::Jpeg => Some(JPEG),
        ImageFormat::Png => Some(PNG),
        ImageFormat::Gif => Some(GIF),
        ImageFormat::Bmp => Some(BMP),
        ImageFormat::WebP => Some(WEBP),
        ImageFormat::Tiff => Some(TIFF),
        _ => None,
    }
}
