//! Upload validation
//!
//! Checks declared MIME type, extension, size and actual content of uploaded
//! images and CVs, and generates the random names they are stored under.
//! The client's original file name never reaches a storage path.

use uuid::Uuid;

/// Reasons an upload is rejected. All map to 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    Missing,

    #[error("File is empty")]
    Empty,

    #[error("File too large. Maximum size: {max} bytes ({} MB)", .max / 1024 / 1024)]
    TooLarge { max: u64 },

    #[error("Only image files (jpg, png, gif, webp, svg) are allowed")]
    UnsupportedImageType,

    #[error("Only PDF files are allowed")]
    NotPdf,

    #[error("Invalid file extension")]
    InvalidExtension,

    #[error("File content does not match its type")]
    ContentMismatch,
}

/// Accepted image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
    Svg,
}

impl ImageKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            "image/gif" => Some(ImageKind::Gif),
            "image/webp" => Some(ImageKind::Webp),
            "image/svg+xml" => Some(ImageKind::Svg),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::Webp => "image/webp",
            ImageKind::Svg => "image/svg+xml",
        }
    }

    /// Extension used when the upload has none
    pub fn default_extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::Webp => "webp",
            ImageKind::Svg => "svg",
        }
    }

    pub fn accepts_extension(self, ext: &str) -> bool {
        match self {
            ImageKind::Jpeg => ext == "jpg" || ext == "jpeg",
            ImageKind::Png => ext == "png",
            ImageKind::Gif => ext == "gif",
            ImageKind::Webp => ext == "webp",
            ImageKind::Svg => ext == "svg",
        }
    }

    /// True when the bytes look like this format
    pub fn matches_content(self, bytes: &[u8]) -> bool {
        match self {
            ImageKind::Jpeg => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
            ImageKind::Png => bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]),
            ImageKind::Gif => bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a"),
            ImageKind::Webp => {
                bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP"
            }
            ImageKind::Svg => is_safe_svg(bytes),
        }
    }
}

/// Substrings that make an SVG unsafe to serve
const SVG_BLOCKLIST: [&str; 9] = [
    "<script",
    "javascript:",
    "onerror",
    "onclick",
    "onload",
    "onmouseover",
    "onfocus",
    "eval(",
    "xlink:href",
];

/// UTF-8 text containing an `<svg` element and no scriptable content
pub fn is_safe_svg(bytes: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return false;
    };
    let text = text.to_lowercase();
    text.contains("<svg") && !SVG_BLOCKLIST.iter().any(|token| text.contains(token))
}

/// Image accepted for storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedImage {
    pub kind: ImageKind,
    /// Random file name, e.g. `3f2a...e1.png`
    pub filename: String,
    /// Storage key, `images/<filename>`
    pub key: String,
}

/// Strip MIME parameters and normalize case
fn normalize_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Lowercased extension of a file name, if it has one
pub fn extension_of(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// 32 hex characters from a v4 UUID plus the extension
pub fn generate_safe_filename(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4().simple(), extension)
}

fn check_size(bytes: &[u8], max_size: u64) -> Result<(), UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if bytes.len() as u64 > max_size {
        return Err(UploadError::TooLarge { max: max_size });
    }
    Ok(())
}

/// Validate an uploaded image and pick its storage name
pub fn validate_image(
    file_name: Option<&str>,
    content_type: &str,
    bytes: &[u8],
    max_size: u64,
) -> Result<ValidatedImage, UploadError> {
    let kind = ImageKind::from_mime(&normalize_mime(content_type))
        .ok_or(UploadError::UnsupportedImageType)?;
    check_size(bytes, max_size)?;

    let ext = match file_name.and_then(extension_of) {
        Some(ext) => {
            if !kind.accepts_extension(&ext) {
                return Err(UploadError::InvalidExtension);
            }
            ext
        }
        None => kind.default_extension().to_string(),
    };

    if !kind.matches_content(bytes) {
        return Err(UploadError::ContentMismatch);
    }

    let filename = generate_safe_filename(&ext);
    Ok(ValidatedImage {
        kind,
        key: format!("images/{}", filename),
        filename,
    })
}

pub const PDF_MIME: &str = "application/pdf";

/// Validate an uploaded CV and return its storage key
pub fn validate_pdf(
    file_name: Option<&str>,
    content_type: &str,
    bytes: &[u8],
    max_size: u64,
) -> Result<String, UploadError> {
    if normalize_mime(content_type) != PDF_MIME {
        return Err(UploadError::NotPdf);
    }
    check_size(bytes, max_size)?;
    if let Some(ext) = file_name.and_then(extension_of) {
        if ext != "pdf" {
            return Err(UploadError::InvalidExtension);
        }
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err(UploadError::ContentMismatch);
    }
    Ok(format!("cv/{}", generate_safe_filename("pdf")))
}

/// Name offered to browsers when the CV is downloaded.
///
/// Keeps only the last path component and drops quotes, control
/// characters and path separators. Falls back to `cv.pdf`.
pub fn sanitize_display_name(file_name: Option<&str>) -> String {
    let raw = file_name.unwrap_or("");
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '"' | '\'' | '/' | '\\' | ';'))
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').trim();
    let cleaned: String = cleaned.chars().take(200).collect();
    if cleaned.is_empty() {
        "cv.pdf".to_string()
    } else {
        cleaned
    }
}
