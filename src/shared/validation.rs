use base64::prelude::*;
use lazy_static::lazy_static;
use regex::Regex;

use crate::shared::constants::MAX_PHOTO_BYTES;

lazy_static! {
    /// Prefix of an inline image data URL
    /// - Valid: "data:image/png;base64,", "data:image/jpeg;base64,"
    /// - Invalid: "data:text/plain;base64,", "data:image/png,"
    pub static ref IMAGE_DATA_URL_REGEX: Regex =
        Regex::new(r"^data:image/(png|jpe?g|gif|webp);base64,").unwrap();
}

/// Check that a photo payload is an already-encoded image.
///
/// Accepts either a base64 image data URL or bare base64. The payload is
/// stored as-is; only its encoding and size are checked here.
pub fn validate_photo_payload(payload: &str) -> Result<(), String> {
    if payload.is_empty() {
        return Err("photo payload must not be empty".to_string());
    }

    if payload.len() > MAX_PHOTO_BYTES {
        return Err(format!(
            "photo payload exceeds {} bytes",
            MAX_PHOTO_BYTES
        ));
    }

    let encoded = match IMAGE_DATA_URL_REGEX.find(payload) {
        Some(prefix) => &payload[prefix.end()..],
        None if payload.starts_with("data:") => {
            return Err("photo data URL must be a base64-encoded image".to_string());
        }
        None => payload,
    };

    if encoded.is_empty() {
        return Err("photo payload must not be empty".to_string());
    }

    BASE64_STANDARD
        .decode(encoded)
        .map(|_| ())
        .map_err(|_| "photo payload is not valid base64".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_data_url_regex() {
        assert!(IMAGE_DATA_URL_REGEX.is_match("data:image/png;base64,AAAA"));
        assert!(IMAGE_DATA_URL_REGEX.is_match("data:image/jpg;base64,AAAA"));
        assert!(IMAGE_DATA_URL_REGEX.is_match("data:image/jpeg;base64,AAAA"));
        assert!(IMAGE_DATA_URL_REGEX.is_match("data:image/webp;base64,AAAA"));
        assert!(!IMAGE_DATA_URL_REGEX.is_match("data:text/plain;base64,AAAA"));
        assert!(!IMAGE_DATA_URL_REGEX.is_match("data:image/png,AAAA"));
    }

    #[test]
    fn test_validate_photo_payload() {
        assert!(validate_photo_payload("data:image/png;base64,aGVsbG8=").is_ok());
        assert!(validate_photo_payload("aGVsbG8=").is_ok());

        assert!(validate_photo_payload("").is_err());
        assert!(validate_photo_payload("data:image/png;base64,").is_err());
        assert!(validate_photo_payload("data:text/html;base64,aGVsbG8=").is_err());
        assert!(validate_photo_payload("not base64 at all!").is_err());
    }

    #[test]
    fn test_validate_photo_payload_rejects_oversized() {
        let oversized = "A".repeat(MAX_PHOTO_BYTES + 4);
        let err = validate_photo_payload(&oversized).unwrap_err();
        assert!(err.contains("exceeds"));
    }
}
