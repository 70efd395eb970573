use reqwest::Client;
use tracing::debug;

/// Thumbnail edge length in pixels for the result table.
pub const THUMBNAIL_SIZE: u32 = 40;

#[derive(Debug, Clone)]
pub struct AvatarPixels {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Appends GitHub's `s=<size>` hint to an avatar URL.
pub fn sized_url(url: &str, size: u32) -> String {
    if url.contains('?') {
        format!("{url}&s={size}")
    } else {
        format!("{url}?s={size}")
    }
}

/// Downloads avatar image bytes and decodes them into raw RGBA pixels.
pub async fn download_avatar_pixels(client: &Client, url: &str, size: u32) -> Option<AvatarPixels> {
    let sized_url = sized_url(url, size);

    let bytes = match client.get(&sized_url).send().await {
        Ok(response) => response.bytes().await.ok()?,
        Err(e) => {
            debug!(error = %e, url = %sized_url, "Avatar download failed");
            return None;
        }
    };

    decode_thumbnail(&bytes, size)
}

/// GitHub may ignore the size hint for cached avatars, so the image is always resized.
pub fn decode_thumbnail(bytes: &[u8], size: u32) -> Option<AvatarPixels> {
    let image = image::load_from_memory(bytes).ok()?;
    let rgba = image.thumbnail_exact(size, size).to_rgba8();
    let (width, height) = rgba.dimensions();

    Some(AvatarPixels {
        rgba: rgba.into_raw(),
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn test_sized_url() {
        assert_eq!(
            sized_url("https://avatars.githubusercontent.com/u/1?v=4", 40),
            "https://avatars.githubusercontent.com/u/1?v=4&s=40"
        );
        assert_eq!(
            sized_url("https://avatars.githubusercontent.com/u/1", 40),
            "https://avatars.githubusercontent.com/u/1?s=40"
        );
    }

    #[test]
    fn test_decode_thumbnail_resizes() {
        let source = RgbaImage::from_pixel(120, 120, Rgba([200, 10, 10, 255]));
        let mut png = Cursor::new(Vec::new());
        source.write_to(&mut png, ImageFormat::Png).unwrap();

        let pixels = decode_thumbnail(png.get_ref(), THUMBNAIL_SIZE).unwrap();

        assert_eq!((pixels.width, pixels.height), (40, 40));
        assert_eq!(pixels.rgba.len(), 40 * 40 * 4);
    }

    #[test]
    fn test_decode_thumbnail_rejects_garbage() {
        assert!(decode_thumbnail(b"not an image", THUMBNAIL_SIZE).is_none());
    }
}
