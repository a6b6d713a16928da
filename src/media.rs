//! MIME allow-lists for uploads forwarded to the generator.

pub const IMAGE_MIMES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Salary slips and Form 16 may arrive as images or PDFs.
pub const DOCUMENT_MIMES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

pub const AUDIO_MIMES: &[&str] = &[
    "audio/wav",
    "audio/x-wav",
    "audio/mp3",
    "audio/mpeg",
    "audio/aiff",
    "audio/aac",
    "audio/ogg",
    "audio/flac",
    "audio/webm",
];

pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";
pub const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";

/// Picks the MIME type to send upstream.
///
/// The declared content type is trimmed, lowercased and stripped of
/// parameters (`audio/webm; codecs=opus` -> `audio/webm`). Anything absent or
/// outside `allowed` falls back to `fallback`.
pub fn resolve_mime(content_type: Option<&str>, allowed: &[&str], fallback: &'static str) -> String {
    let declared = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if allowed.contains(&declared.as_str()) {
        declared
    } else {
        if !declared.is_empty() {
            tracing::debug!("Unsupported upload type '{}', using {}", declared, fallback);
        }
        fallback.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_image_kept() {
        assert_eq!(
            resolve_mime(Some("image/png"), IMAGE_MIMES, DEFAULT_IMAGE_MIME),
            "image/png"
        );
    }

    #[test]
    fn test_missing_type_falls_back() {
        assert_eq!(
            resolve_mime(None, IMAGE_MIMES, DEFAULT_IMAGE_MIME),
            "image/jpeg"
        );
        assert_eq!(
            resolve_mime(Some(""), AUDIO_MIMES, DEFAULT_AUDIO_MIME),
            "audio/mpeg"
        );
    }

    #[test]
    fn test_pdf_only_allowed_for_documents() {
        assert_eq!(
            resolve_mime(Some("application/pdf"), IMAGE_MIMES, DEFAULT_IMAGE_MIME),
            "image/jpeg"
        );
        assert_eq!(
            resolve_mime(Some("application/pdf"), DOCUMENT_MIMES, DEFAULT_IMAGE_MIME),
            "application/pdf"
        );
    }

    #[test]
    fn test_normalizes_case_and_parameters() {
        assert_eq!(
            resolve_mime(Some(" Image/WEBP "), IMAGE_MIMES, DEFAULT_IMAGE_MIME),
            "image/webp"
        );
        assert_eq!(
            resolve_mime(Some("audio/webm; codecs=opus"), AUDIO_MIMES, DEFAULT_AUDIO_MIME),
            "audio/webm"
        );
    }
}
