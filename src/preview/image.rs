//! The raster a successful preview produces.

use std::path::Path;

/// An RGBA8 raster image (row-major, 4 bytes per pixel, no padding).
///
/// This is the whole of a successful render: the presentation layer displays it and drops
/// it. Two renders of the same math source compare equal.
#[derive(Clone, PartialEq, Eq)]
pub struct PreviewImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl std::fmt::Debug for PreviewImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl PreviewImage {
    /// Wrap raw RGBA8 pixels. Returns `None` if the buffer length does not match.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize * 4).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub(crate) fn from_parts(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Decode any image the `image` crate understands into RGBA8.
    pub fn from_dynamic(img: image::DynamicImage) -> Self {
        let rgba = img.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_parts(width, height, rgba.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.pixels.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// True when every pixel has the same value (nothing was drawn).
    pub fn is_uniform(&self) -> bool {
        match self.pixels.get(..4) {
            Some(first) => self.pixels.chunks_exact(4).all(|px| px == first),
            None => true,
        }
    }

    /// Crop to the pixels that differ from `background`, keeping `padding` pixels around
    /// them. An image with no such pixels is returned unchanged.
    pub fn trimmed(&self, background: [u8; 4], padding: u32) -> Self {
        let mut min = (u32::MAX, u32::MAX);
        let mut max = (0u32, 0u32);
        let mut found = false;

        for (i, px) in self.pixels.chunks_exact(4).enumerate() {
            if px == background {
                continue;
            }
            let x = (i % self.width as usize) as u32;
            let y = (i / self.width as usize) as u32;
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
            found = true;
        }

        if !found {
            return self.clone();
        }

        let x0 = min.0.saturating_sub(padding);
        let y0 = min.1.saturating_sub(padding);
        let x1 = (max.0 + 1 + padding).min(self.width);
        let y1 = (max.1 + 1 + padding).min(self.height);

        let width = x1 - x0;
        let height = y1 - y0;
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in y0..y1 {
            let start = (y as usize * self.width as usize + x0 as usize) * 4;
            pixels.extend_from_slice(&self.pixels[start..start + width as usize * 4]);
        }

        Self::from_parts(width, height, pixels)
    }

    fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Encode as PNG bytes.
    pub fn to_png_bytes(&self) -> image::ImageResult<Vec<u8>> {
        let mut out = std::io::Cursor::new(Vec::new());
        let img = self.to_rgba_image().ok_or_else(size_mismatch)?;
        img.write_to(&mut out, image::ImageFormat::Png)?;
        Ok(out.into_inner())
    }

    /// Write as a PNG file.
    pub fn write_png(&self, path: &Path) -> image::ImageResult<()> {
        let img = self.to_rgba_image().ok_or_else(size_mismatch)?;
        img.save_with_format(path, image::ImageFormat::Png)
    }
}

fn size_mismatch() -> image::ImageError {
    image::ImageError::Parameter(image::error::ParameterError::from_kind(
        image::error::ParameterErrorKind::DimensionMismatch,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    fn image_with_dot(width: u32, height: u32, dot: (u32, u32)) -> PreviewImage {
        let mut pixels: Vec<u8> = WHITE
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        let idx = (dot.1 as usize * width as usize + dot.0 as usize) * 4;
        pixels[idx..idx + 4].copy_from_slice(&BLACK);
        PreviewImage::from_rgba8(width, height, pixels).unwrap()
    }

    #[test]
    fn from_rgba8_rejects_wrong_length() {
        assert!(PreviewImage::from_rgba8(2, 2, vec![0; 15]).is_none());
        assert!(PreviewImage::from_rgba8(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn trimmed_keeps_padding_around_content() {
        let img = image_with_dot(20, 10, (8, 4));
        let trimmed = img.trimmed(WHITE, 2);
        assert_eq!((trimmed.width(), trimmed.height()), (5, 5));
        assert_eq!(trimmed.pixel(2, 2), Some(BLACK));
    }

    #[test]
    fn trimmed_clamps_at_edges() {
        let img = image_with_dot(10, 10, (0, 9));
        let trimmed = img.trimmed(WHITE, 3);
        assert_eq!((trimmed.width(), trimmed.height()), (4, 4));
        assert_eq!(trimmed.pixel(0, 3), Some(BLACK));
    }

    #[test]
    fn blank_image_is_not_trimmed() {
        let img = PreviewImage::from_rgba8(3, 3, WHITE.repeat(9)).unwrap();
        assert!(img.is_uniform());
        assert_eq!(img.trimmed(WHITE, 1), img);
    }

    #[test]
    fn png_round_trips_through_image_crate() {
        let img = image_with_dot(6, 4, (1, 1));
        let bytes = img.to_png_bytes().unwrap();
        let decoded = PreviewImage::from_dynamic(image::load_from_memory(&bytes).unwrap());
        assert_eq!(decoded, img);
    }
}
