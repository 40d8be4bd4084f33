//! `multipart/form-data` encoding for a single uploaded file.
//!
//! The boundary is derived from the payload digest, so identical media always
//! encodes to identical bytes.

use thiserror::Error;

use crate::capabilities::http::ContentType;
use crate::media::MediaHandle;

const BOUNDARY_PREFIX: &str = "----AgriAssist";
const BOUNDARY_HASH_CHARS: usize = 24;
const CRLF: &[u8] = b"\r\n";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MultipartError {
    #[error("invalid form field name: {0:?}")]
    InvalidFieldName(String),

    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),

    #[error("invalid content type: {0:?}")]
    InvalidContentType(String),

    #[error("file payload is empty")]
    EmptyPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> ContentType {
        ContentType::Multipart {
            boundary: self.boundary.clone(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_parts(self) -> (ContentType, Vec<u8>) {
        let content_type = self.content_type();
        (content_type, self.bytes)
    }
}

/// Encodes the handle's bytes as the single file part `field`.
pub fn encode_media(
    field: &str,
    filename: &str,
    media: &MediaHandle,
) -> Result<MultipartBody, MultipartError> {
    encode_file(field, filename, media.mime_type(), media.data())
}

pub fn encode_file(
    field: &str,
    filename: &str,
    mime_type: &str,
    data: &[u8],
) -> Result<MultipartBody, MultipartError> {
    if !is_header_token(field) {
        return Err(MultipartError::InvalidFieldName(field.to_string()));
    }
    if !is_header_token(filename) {
        return Err(MultipartError::InvalidFileName(filename.to_string()));
    }
    if !is_header_token(mime_type) || !mime_type.contains('/') {
        return Err(MultipartError::InvalidContentType(mime_type.to_string()));
    }
    if data.is_empty() {
        return Err(MultipartError::EmptyPayload);
    }

    let boundary = derive_boundary(data);

    let head = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {mime_type}\r\n\r\n"
    );
    let tail = format!("--{boundary}--\r\n");

    let mut bytes = Vec::with_capacity(head.len() + data.len() + CRLF.len() + tail.len());
    bytes.extend_from_slice(head.as_bytes());
    bytes.extend_from_slice(data);
    bytes.extend_from_slice(CRLF);
    bytes.extend_from_slice(tail.as_bytes());

    Ok(MultipartBody { boundary, bytes })
}

fn derive_boundary(data: &[u8]) -> String {
    let mut counter: u64 = 0;
    loop {
        let mut hasher = blake3::Hasher::new();
        hasher.update(data);
        if counter > 0 {
            hasher.update(&counter.to_le_bytes());
        }
        let digest = hasher.finalize().to_hex();
        let boundary = format!("{BOUNDARY_PREFIX}{}", &digest[..BOUNDARY_HASH_CHARS]);

        if !contains(data, boundary.as_bytes()) {
            return boundary;
        }
        counter += 1;
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn is_header_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_graphic() || c == ' ')
        && !value.contains(['"', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encodes_single_file_part() {
        let body = encode_file("file", "plant-image.jpg", "image/jpeg", b"JPEGDATA").unwrap();
        let boundary = body.boundary().to_string();
        let expected = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"plant-image.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nJPEGDATA\r\n--{boundary}--\r\n"
        );
        assert_eq!(body.bytes(), expected.as_bytes());
        assert!(boundary.starts_with(BOUNDARY_PREFIX));
        assert_eq!(
            body.content_type().header_value(),
            format!("multipart/form-data; boundary={boundary}")
        );
    }

    #[test]
    fn test_same_payload_same_bytes() {
        let a = encode_file("file", "pest-image.jpg", "image/jpeg", b"abc").unwrap();
        let b = encode_file("file", "pest-image.jpg", "image/jpeg", b"abc").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert_eq!(
            encode_file("", "a.jpg", "image/jpeg", b"x"),
            Err(MultipartError::InvalidFieldName(String::new()))
        );
        assert!(matches!(
            encode_file("file", "a\".jpg", "image/jpeg", b"x"),
            Err(MultipartError::InvalidFileName(_))
        ));
        assert!(matches!(
            encode_file("file", "a.jpg\r\nX-Evil: 1", "image/jpeg", b"x"),
            Err(MultipartError::InvalidFileName(_))
        ));
        assert!(matches!(
            encode_file("file", "a.jpg", "jpeg", b"x"),
            Err(MultipartError::InvalidContentType(_))
        ));
        assert_eq!(
            encode_file("file", "a.jpg", "image/jpeg", b""),
            Err(MultipartError::EmptyPayload)
        );
    }

    #[test]
    fn test_boundary_rederived_on_collision() {
        let first = derive_boundary(b"seed");
        let mut payload = b"seed".to_vec();
        payload.extend_from_slice(first.as_bytes());

        let boundary = derive_boundary(&payload);
        assert!(!contains(&payload, boundary.as_bytes()));
    }

    proptest! {
        #[test]
        fn boundary_never_inside_payload(data in proptest::collection::vec(any::<u8>(), 1..2048)) {
            let body = encode_file("file", "leaf.jpg", "image/jpeg", &data).unwrap();
            prop_assert!(!contains(&data, body.boundary().as_bytes()));
            let closing = format!("--{}--\r\n", body.boundary());
            prop_assert!(body.bytes().ends_with(closing.as_bytes()));
        }
    }
}
