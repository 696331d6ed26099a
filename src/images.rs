use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;

use crate::error::StoreError;

/// Per-image ceiling enforced at the boundary; the stores never re-validate.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// An image as submitted by a client: base64 payload plus its MIME type.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUpload {
    pub content_type: String,
    pub data_b64: String,
}

fn is_allowed_type(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&content_type)
}

/// Validate one upload and produce the opaque reference stored on a listing.
/// The core consumes these references without ever inspecting raw bytes again.
pub fn encode_reference(upload: &ImageUpload) -> Result<String, StoreError> {
    if !is_allowed_type(&upload.content_type) {
        return Err(StoreError::Validation(format!(
            "unsupported image format; accepted: {}",
            ALLOWED_IMAGE_TYPES.join(", ")
        )));
    }

    let bytes = BASE64
        .decode(upload.data_b64.as_bytes())
        .map_err(|_| StoreError::Validation("image payload is not valid base64".into()))?;

    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(StoreError::Validation(format!(
            "image exceeds the maximum size of {} MB",
            MAX_IMAGE_BYTES / 1024 / 1024
        )));
    }

    Ok(format!(
        "data:{};base64,{}",
        upload.content_type,
        BASE64.encode(&bytes)
    ))
}

/// Validate a batch, preserving order. Fails on the first bad upload.
pub fn encode_all(uploads: &[ImageUpload]) -> Result<Vec<String>, StoreError> {
    uploads.iter().map(encode_reference).collect()
}

#[cfg(test)]
mod image_tests {
    use super::*;

    fn upload(content_type: &str, bytes: &[u8]) -> ImageUpload {
        ImageUpload {
            content_type: content_type.into(),
            data_b64: BASE64.encode(bytes),
        }
    }

    #[test]
    fn accepted_mime_types() {
        for ct in ["image/jpeg", "image/jpg", "image/png", "image/webp"] {
            assert!(encode_reference(&upload(ct, b"fake")).is_ok(), "{ct}");
        }
        for ct in ["image/heic", "application/pdf", "text/plain"] {
            assert!(encode_reference(&upload(ct, b"fake")).is_err(), "{ct}");
        }
    }

    #[test]
    fn oversized_image_is_rejected() {
        let big = vec![0u8; MAX_IMAGE_BYTES + 1];
        let err = encode_reference(&upload("image/png", &big)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let exact = vec![0u8; MAX_IMAGE_BYTES];
        assert!(encode_reference(&upload("image/png", &exact)).is_ok());
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let bad = ImageUpload {
            content_type: "image/png".into(),
            data_b64: "!!not base64!!".into(),
        };
        assert!(matches!(
            encode_reference(&bad).unwrap_err(),
            StoreError::Validation(_)
        ));
    }

    #[test]
    fn reference_is_a_data_uri() {
        let reference = encode_reference(&upload("image/webp", b"imagebytes")).unwrap();
        assert!(reference.starts_with("data:image/webp;base64,"));
    }

    #[test]
    fn batch_preserves_order() {
        let refs = encode_all(&[upload("image/png", b"a"), upload("image/jpeg", b"b")]).unwrap();
        assert_eq!(refs.len(), 2);
        assert!(refs[0].starts_with("data:image/png"));
        assert!(refs[1].starts_with("data:image/jpeg"));
    }
}
