//! Uploaded-document types and media-type resolution.
//!
//! Resolution order: declared content type first, then the file extension,
//! then the payload's magic bytes. Sniffing before the heavy stage means a
//! mislabelled upload produces a meaningful [`crate::error::ExtractError`]
//! instead of a parser crash deep inside pdf-extract or tesseract.

use std::time::{Duration, Instant};

/// The resolved media type of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// `application/pdf`, parsed via the embedded text layer.
    Pdf,
    /// `image/*` (PNG/JPEG), recognised via OCR.
    Image,
    /// Anything else. Rejected with `UnsupportedMediaType`.
    Unknown,
}

impl MediaType {
    /// Resolve from a declared content type, falling back to the file name's
    /// extension and finally to the payload's magic bytes.
    pub fn resolve(declared: Option<&str>, original_name: &str, bytes: &[u8]) -> Self {
        if let Some(ct) = declared {
            match Self::from_content_type(ct) {
                MediaType::Unknown => {}
                known => return known,
            }
        }

        let guessed = mime_guess::from_path(original_name).first_raw();
        if let Some(ct) = guessed {
            match Self::from_content_type(ct) {
                MediaType::Unknown => {}
                known => return known,
            }
        }

        Self::sniff(bytes)
    }

    /// Classify a MIME content-type string.
    pub fn from_content_type(content_type: &str) -> Self {
        let ct = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();
        match ct.as_str() {
            "application/pdf" => MediaType::Pdf,
            _ if ct.starts_with("image/") => MediaType::Image,
            _ => MediaType::Unknown,
        }
    }

    /// Classify from magic bytes: `%PDF` for PDF, PNG/JPEG signatures for images.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(b"%PDF") {
            return MediaType::Pdf;
        }
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) || bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return MediaType::Image;
        }
        MediaType::Unknown
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Pdf => write!(f, "application/pdf"),
            MediaType::Image => write!(f, "image/*"),
            MediaType::Unknown => write!(f, "unknown"),
        }
    }
}

/// One uploaded document. Created at request receipt, owned exclusively by a
/// single in-flight request, dropped when the request completes.
#[derive(Debug)]
pub struct UploadedDocument {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
    pub original_name: String,
    /// Content type as declared by the uploader, kept for error messages.
    pub declared_type: Option<String>,
}

impl UploadedDocument {
    /// Build a document from raw upload parts, resolving the media type.
    pub fn new(bytes: Vec<u8>, declared_type: Option<&str>, original_name: impl Into<String>) -> Self {
        let original_name = original_name.into();
        let media_type = MediaType::resolve(declared_type, &original_name, &bytes);
        Self {
            bytes,
            media_type,
            original_name,
            declared_type: declared_type.map(str::to_string),
        }
    }

    /// What the caller actually sent, for rejection messages: the declared
    /// content type if there was one, else the type guessed from the file
    /// name, else the file name itself.
    pub fn type_label(&self) -> String {
        if let Some(ct) = &self.declared_type {
            return ct.clone();
        }
        match mime_guess::from_path(&self.original_name).first_raw() {
            Some(guessed) => guessed.to_string(),
            None => self.original_name.clone(),
        }
    }
}

/// One pipeline invocation: a document plus its end-to-end deadline.
/// Never shared across requests.
#[derive(Debug)]
pub struct ExtractionRequest {
    pub document: UploadedDocument,
    pub deadline: Instant,
}

impl ExtractionRequest {
    /// Wrap a document with a deadline `budget` from now.
    pub fn new(document: UploadedDocument, budget: Duration) -> Self {
        Self {
            document,
            deadline: Instant::now() + budget,
        }
    }

    /// Wall-clock budget remaining before the deadline, zero if elapsed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_type_wins() {
        assert_eq!(
            MediaType::resolve(Some("application/pdf"), "scan.jpg", b"garbage"),
            MediaType::Pdf
        );
        assert_eq!(
            MediaType::resolve(Some("image/jpeg; charset=binary"), "x.bin", &[]),
            MediaType::Image
        );
    }

    #[test]
    fn extension_fallback() {
        assert_eq!(
            MediaType::resolve(None, "licence.pdf", b""),
            MediaType::Pdf
        );
        assert_eq!(
            MediaType::resolve(Some("application/octet-stream"), "licence.png", b""),
            MediaType::Image
        );
    }

    #[test]
    fn magic_byte_fallback() {
        assert_eq!(
            MediaType::resolve(None, "blob", b"%PDF-1.7 rest"),
            MediaType::Pdf
        );
        assert_eq!(
            MediaType::resolve(None, "blob", &[0xFF, 0xD8, 0xFF, 0xE0]),
            MediaType::Image
        );
        assert_eq!(
            MediaType::resolve(None, "blob", &[0x89, b'P', b'N', b'G', 0x0D]),
            MediaType::Image
        );
    }

    #[test]
    fn unknown_when_nothing_matches() {
        assert_eq!(
            MediaType::resolve(Some("text/csv"), "data.csv", b"a,b,c"),
            MediaType::Unknown
        );
    }

    #[test]
    fn type_label_prefers_declared_over_guess() {
        let declared = UploadedDocument::new(vec![1], Some("text/csv"), "data.bin");
        assert_eq!(declared.type_label(), "text/csv");

        let guessed = UploadedDocument::new(vec![1], None, "notes.txt");
        assert_eq!(guessed.type_label(), "text/plain");

        let bare = UploadedDocument::new(vec![1], None, "blob");
        assert_eq!(bare.type_label(), "blob");
    }

    #[test]
    fn request_remaining_counts_down() {
        let doc = UploadedDocument::new(vec![1], None, "blob");
        let req = ExtractionRequest::new(doc, Duration::from_secs(60));
        assert!(req.remaining() <= Duration::from_secs(60));
        assert!(req.remaining() > Duration::from_secs(59));
    }
}
