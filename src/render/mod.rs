//! Rendering seams for the titlebar
//!
//! Two collaborators sit behind traits: a [`Renderer`] that composites
//! textures and rectangles onto the screen, and a [`raster::Rasterizer`] that
//! turns text and button shapes into pixel buffers on the CPU.

pub mod cache;
pub mod canvas;
pub mod gl;
pub mod raster;
pub mod software;
pub mod text;

use anyhow::{Result, bail};

use crate::geometry::Rect;

/// Straight-alpha RGBA color with components in 0.0-1.0
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Decode a `0xAARRGGBB` config value.
    pub fn from_argb(argb: u32) -> Self {
        let channel = |shift: u32| ((argb >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0), channel(24))
    }

    pub fn with_alpha_mul(self, alpha: f32) -> Self {
        Self { a: self.a * alpha, ..self }
    }

    /// Dark enough that a light glyph reads better on top of it.
    pub fn is_dark(&self) -> bool {
        self.r + self.g + self.b < 1.0
    }

    pub fn premultiplied(&self) -> [f32; 4] {
        [self.r * self.a, self.g * self.a, self.b * self.a, self.a]
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
        .unwrap_or(tiny_skia::Color::TRANSPARENT)
    }
}

/// Byte order of a premultiplied 32-bit pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    /// Native-endian ARGB32 on little-endian machines
    Bgra8,
}

/// CPU-side image ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Fully transparent buffer
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn from_raw(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            bail!(
                "Pixel data for {}x{} buffer has {} bytes, expected {}",
                width,
                height,
                data.len(),
                expected
            );
        }
        Ok(Self { width, height, format, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Pixel at (x, y) in RGBA order, whatever the storage format.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.data[at..at + 4]);
        if self.format == PixelFormat::Bgra8 {
            px.swap(0, 2);
        }
        Some(px)
    }

    /// Convert to `format`, swapping red and blue if needed.
    pub fn into_format(mut self, format: PixelFormat) -> Self {
        if self.format != format {
            for px in bytemuck::cast_slice_mut::<u8, [u8; 4]>(&mut self.data) {
                px.swap(0, 2);
            }
            self.format = format;
        }
        self
    }
}

/// Opaque handle to a texture owned by a [`Renderer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Compositing backend the bar draws through.
///
/// Rectangles are in device pixels relative to the current output.
pub trait Renderer {
    /// Upload a pixel buffer as a nearest-filtered 2D texture.
    fn upload_texture(&mut self, pixels: &PixelBuffer) -> Result<TextureId>;

    fn destroy_texture(&mut self, texture: TextureId);

    /// Stretch `texture` over `target`, multiplying its alpha by `alpha`.
    fn render_texture(&mut self, texture: TextureId, target: &Rect, alpha: f32);

    /// Fill `rect`, rounding its corners by `radius` when positive.
    fn render_rect(&mut self, rect: &Rect, color: Color, radius: f32);

    /// Restrict drawing to `rect`, or lift the restriction with `None`.
    fn scissor(&mut self, rect: Option<&Rect>);

    /// Write a rounded `shape` into the stencil; later draws skip it.
    fn push_stencil_exclusion(&mut self, shape: &Rect, radius: f32);

    fn clear_stencil(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_argb() {
        let color = Color::from_argb(0x80ff0000);
        assert_eq!(color.r, 1.0);
        assert_eq!(color.g, 0.0);
        assert!((color.a - 128.0 / 255.0).abs() < 1e-6);
        assert!(Color::from_argb(0xff202020).is_dark());
        assert!(!Color::from_argb(0xffeeeeee).is_dark());
    }

    #[test]
    fn test_pixel_buffer_swaps_red_and_blue() {
        let buffer = PixelBuffer::from_raw(1, 1, PixelFormat::Rgba8, vec![10, 20, 30, 255]).unwrap();
        let bgra = buffer.into_format(PixelFormat::Bgra8);
        assert_eq!(bgra.data(), &[30, 20, 10, 255]);
        assert_eq!(bgra.pixel(0, 0), Some([10, 20, 30, 255]));
        assert_eq!(bgra.pixel(1, 0), None);
    }

    #[test]
    fn test_pixel_buffer_rejects_short_data() {
        assert!(PixelBuffer::from_raw(2, 2, PixelFormat::Rgba8, vec![0; 15]).is_err());
    }
}
