//! File attachments.
//!
//! Uploads are encoded as base64 data URLs so they survive a reload of the
//! store. Nothing is sent anywhere.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

use super::PatientService;
use crate::config::Operation;
use crate::models::FileRef;
use crate::store::StorageBackend;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A file selected for attachment to a test result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    /// MIME type reported by the caller, if any
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

impl<B: StorageBackend> PatientService<B> {
    /// Turn an upload into a persistable file reference.
    pub fn upload_file(&self, upload: FileUpload) -> FileRef {
        self.pause(Operation::UploadFile);
        let file = encode_file(upload);
        tracing::debug!(name = %file.name, size = file.size_bytes, "Encoded file upload");
        file
    }
}

/// Encode an upload as a data URL file reference.
///
/// The MIME type is taken from the caller, then sniffed from the content,
/// then defaults to `application/octet-stream`.
pub fn encode_file(upload: FileUpload) -> FileRef {
    let mime_type = upload
        .mime_type
        .filter(|m| !m.trim().is_empty())
        .or_else(|| infer::get(&upload.bytes).map(|kind| kind.mime_type().to_string()))
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

    let sha256 = hex::encode(Sha256::digest(&upload.bytes));
    let size_bytes = upload.bytes.len() as u64;
    let url = format!("data:{};base64,{}", mime_type, STANDARD.encode(&upload.bytes));

    FileRef {
        name: upload.name,
        mime_type,
        size_label: size_label(size_bytes),
        size_bytes,
        sha256: Some(sha256),
        url,
        needs_fallback: false,
    }
}

/// Prepare a submitted file reference for storage.
///
/// The digest and byte size of an inline payload are recomputed from the
/// payload itself. Other payloads carry no digest.
pub(crate) fn attach_file(mut file: FileRef) -> FileRef {
    match decode_data_url(&file.url) {
        Some((_, bytes)) => {
            file.sha256 = Some(hex::encode(Sha256::digest(&bytes)));
            file.size_bytes = bytes.len() as u64;
        }
        None => file.sha256 = None,
    }
    file.needs_fallback = false;
    file
}

/// Decode a base64 data URL into its MIME type and bytes.
fn decode_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload).ok()?;
    Some((mime_type.to_string(), bytes))
}

/// Size in whole kilobytes, rounded (`"256 KB"`).
fn size_label(size_bytes: u64) -> String {
    format!("{} KB", (size_bytes as f64 / 1024.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_encode_uses_caller_mime_type() {
        let file = encode_file(FileUpload::new("notes.txt", b"hello".to_vec()).with_mime_type("text/plain"));

        assert_eq!(file.mime_type, "text/plain");
        assert_eq!(file.url, "data:text/plain;base64,aGVsbG8=");
        assert_eq!(file.size_bytes, 5);
        assert_eq!(file.size_label, "0 KB");
        assert_eq!(
            file.sha256.as_deref(),
            Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
        );
        assert!(file.is_data_url());
    }

    #[test]
    fn test_encode_sniffs_mime_type() {
        let mut bytes = PNG_HEADER.to_vec();
        bytes.extend(std::iter::repeat(0u8).take(2048));

        let file = encode_file(FileUpload::new("scan.png", bytes));
        assert_eq!(file.mime_type, "image/png");
        assert!(file.is_image());
        assert_eq!(file.size_label, "2 KB");

        let unknown = encode_file(FileUpload::new("blob.bin", vec![1, 2, 3]));
        assert_eq!(unknown.mime_type, DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_decode_data_url() {
        let file = encode_file(FileUpload::new("a.txt", b"lab".to_vec()).with_mime_type("text/plain"));
        let (mime, bytes) = decode_data_url(&file.url).unwrap();
        assert_eq!(mime, "text/plain");
        assert_eq!(bytes, b"lab");

        assert!(decode_data_url("blob:http://localhost/123").is_none());
        assert!(decode_data_url("data:text/plain,raw").is_none());
    }

    #[test]
    fn test_attach_file_recomputes_digest() {
        let encoded = encode_file(FileUpload::new("a.txt", b"lab".to_vec()).with_mime_type("text/plain"));
        let tampered = FileRef {
            sha256: Some("00".repeat(32)),
            size_bytes: 99,
            needs_fallback: true,
            ..encoded.clone()
        };
        assert_eq!(attach_file(tampered), encoded);

        let remote = FileRef {
            url: "https://example.com/reports/cbc_report.pdf".into(),
            sha256: Some("00".repeat(32)),
            ..encoded
        };
        let attached = attach_file(remote);
        assert!(attached.sha256.is_none());
        assert!(!attached.needs_fallback);
    }
}
