use crate::shading::Color;
use anyhow::{Context, Result};
use std::path::Path;

/// What a sprite needs to know about its decoded texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    /// Mean color of the non-transparent pixels.
    pub tint: Color,
}

/// Load state of a sprite texture. Preloading resolves it before the sprite
/// enters the scene, so live sprites are never `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SpriteTexture {
    #[default]
    Loading,
    Ready(TextureInfo),
    Failed,
}

impl SpriteTexture {
    pub fn preload(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match from_path(path) {
            Ok(info) => Self::Ready(info),
            Err(e) => {
                log::error!("failed to load texture {}: {:#}", path.display(), e);
                Self::Failed
            }
        }
    }

    pub fn info(&self) -> Option<&TextureInfo> {
        match self {
            Self::Ready(info) => Some(info),
            _ => None,
        }
    }
}

pub fn from_path(path: &Path) -> Result<TextureInfo> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    from_bytes(&bytes)
}

pub fn from_bytes(bytes: &[u8]) -> Result<TextureInfo> {
    let img = image::load_from_memory(bytes).context("decoding texture")?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for pixel in rgba.pixels().filter(|p| p.0[3] > 0) {
        for (total, channel) in sum.iter_mut().zip(pixel.0) {
            *total += u64::from(channel);
        }
        count += 1;
    }
    let tint = if count == 0 {
        Color::WHITE
    } else {
        Color::rgb(
            (sum[0] / count) as u8,
            (sum[1] / count) as u8,
            (sum[2] / count) as u8,
        )
    };

    Ok(TextureInfo { width, height, tint })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    #[test]
    fn test_decodes_size_and_tint() {
        let mut img = RgbaImage::from_pixel(4, 2, Rgba([0, 200, 0, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 0]));
        let info = from_bytes(&png(&img)).unwrap();
        assert_eq!((info.width, info.height), (4, 2));
        assert_eq!(info.tint, Color::rgb(0, 200, 0));
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(from_bytes(b"not an image").is_err());
    }

    #[test]
    fn test_missing_file_fails_preload() {
        let texture = SpriteTexture::preload("/nonexistent/grass.png");
        assert_eq!(texture, SpriteTexture::Failed);
        assert!(texture.info().is_none());
    }
}
