use base64::Engine;
use rand::{distr::Alphanumeric, Rng};
use std::fs;
use std::path::Path;

use crate::error::{AppError, AppResult};

const DATA_URL_PREFIX: &str = "data:image/";
const BASE64_MARKER: &str = ";base64,";

/// An image decoded from a `data:image/<ext>;base64,<payload>` data URL.
#[derive(Debug)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: String,
}

pub fn is_data_url(input: &str) -> bool {
    input.starts_with(DATA_URL_PREFIX)
}

pub fn parse_data_url(input: &str) -> AppResult<DecodedImage> {
    let rest = input
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| AppError::Validation("Image must be a data:image URL".to_string()))?;

    let (subtype, payload) = rest
        .split_once(BASE64_MARKER)
        .ok_or_else(|| AppError::Validation("Image data URL must be base64-encoded".to_string()))?;

    if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation(format!(
            "Unsupported image type: {}",
            subtype
        )));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| AppError::Validation(format!("Invalid base64 image payload: {}", e)))?;

    if bytes.is_empty() {
        return Err(AppError::Validation("Image payload is empty".to_string()));
    }

    Ok(DecodedImage {
        bytes,
        extension: subtype.to_string(),
    })
}

/// Writes a decoded image under `<media_root>/<subdir>` with a synthesized
/// filename and returns the path relative to the media root.
pub fn store_image(media_root: &str, subdir: &str, image: &DecodedImage) -> AppResult<String> {
    let dir = Path::new(media_root).join(subdir);
    fs::create_dir_all(&dir)
        .map_err(|e| AppError::Internal(format!("Failed to create media directory: {}", e)))?;

    let stem: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    let filename = format!("{}.{}", stem, image.extension);

    fs::write(dir.join(&filename), &image.bytes)
        .map_err(|e| AppError::Internal(format!("Failed to store image: {}", e)))?;

    Ok(format!("{}/{}", subdir, filename))
}

/// Accepts either an inline data URL (decoded and stored) or a path to an
/// already-stored resource (passed through unchanged).
pub fn resolve_image(media_root: &str, subdir: &str, input: &str) -> AppResult<String> {
    if is_data_url(input) {
        let decoded = parse_data_url(input)?;
        store_image(media_root, subdir, &decoded)
    } else if input.is_empty() {
        Err(AppError::Validation("Image is required".to_string()))
    } else {
        Ok(input.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A 1x1 transparent PNG.
    const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn parses_png_data_url() {
        let url = format!("data:image/png;base64,{}", PNG_B64);
        let image = parse_data_url(&url).unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(&image.bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn rejects_non_image_and_bad_base64() {
        assert!(parse_data_url("data:text/plain;base64,aGk=").is_err());
        assert!(parse_data_url("data:image/png;base64,!!!").is_err());
        assert!(parse_data_url("plain-path.png").is_err());
    }

    #[test]
    fn stores_image_under_media_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_str().unwrap();
        let url = format!("data:image/png;base64,{}", PNG_B64);
        let decoded = parse_data_url(&url).unwrap();

        let path = store_image(root, "recipes/images", &decoded).unwrap();
        assert!(path.starts_with("recipes/images/"));
        assert!(path.ends_with(".png"));
        assert!(tmp.path().join(&path).exists());
    }

    #[test]
    fn resolve_passes_existing_paths_through() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_str().unwrap();
        let path = resolve_image(root, "recipes/images", "recipes/images/a.png").unwrap();
        assert_eq!(path, "recipes/images/a.png");
        assert!(resolve_image(root, "recipes/images", "").is_err());
    }
}
