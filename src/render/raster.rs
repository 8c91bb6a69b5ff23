//! Titlebar rasterization
//!
//! Produces the three kinds of CPU images the bar caches as textures: the
//! title text, the row of button circles, and one icon glyph per button.

use anyhow::Result;

use super::canvas::Canvas;
use super::text::{TextEngine, ellipsize};
use super::{Color, PixelBuffer, PixelFormat};
use crate::geometry::Rect;

/// Title text rendered over the whole bar buffer
#[derive(Debug, Clone, PartialEq)]
pub struct TitleRequest<'a> {
    pub text: &'a str,
    pub width: u32,
    pub height: u32,
    pub font_px: f32,
    pub color: Color,
    /// Space kept free on the left (border + text padding)
    pub left_padding: f32,
    /// Space kept free on the right (button row + border + text padding)
    pub right_padding: f32,
    /// Border width; the text is centred on the bar minus this
    pub border: f32,
}

/// One button background, in buffer coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonCircle {
    pub slot: Rect,
    pub color: Color,
}

/// Square icon glyph
#[derive(Debug, Clone, PartialEq)]
pub struct IconRequest<'a> {
    pub glyph: &'a str,
    pub size: u32,
    pub font_px: f32,
    pub color: Color,
}

/// Turns bar content into pixel buffers of exactly the requested size.
pub trait Rasterizer {
    fn title(&mut self, request: &TitleRequest<'_>) -> Result<PixelBuffer>;

    fn buttons(&mut self, width: u32, height: u32, circles: &[ButtonCircle]) -> Result<PixelBuffer>;

    fn icon(&mut self, request: &IconRequest<'_>) -> Result<PixelBuffer>;
}

/// CPU rasterizer drawing through a [`TextEngine`]
pub struct SoftwareRasterizer<E> {
    engine: E,
}

impl<E: TextEngine> SoftwareRasterizer<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: TextEngine> Rasterizer for SoftwareRasterizer<E> {
    fn title(&mut self, request: &TitleRequest<'_>) -> Result<PixelBuffer> {
        let mut canvas = Canvas::new(request.width, request.height)?;
        canvas.clear();

        let max_width = request.width as f32 - request.left_padding - request.right_padding;
        let text = ellipsize(&mut self.engine, request.text, request.font_px, max_width);
        if !text.is_empty() {
            let extents = self.engine.measure(&text, request.font_px);
            let x = ((request.width as f32 - request.border) / 2.0 - extents.width / 2.0).round();
            let y = (request.height as f32 / 2.0 - extents.height / 2.0).round();
            self.engine
                .draw(&mut canvas, &text, request.font_px, x, y, request.color);
        }

        canvas.into_pixels(PixelFormat::Rgba8)
    }

    fn buttons(&mut self, width: u32, height: u32, circles: &[ButtonCircle]) -> Result<PixelBuffer> {
        let mut canvas = Canvas::new(width, height)?;
        canvas.clear();

        for circle in circles {
            let radius = (circle.slot.width as f32 / 2.0).ceil();
            let cx = circle.slot.x as f32 + circle.slot.width as f32 / 2.0;
            let cy = circle.slot.y as f32 + circle.slot.height as f32 / 2.0;
            canvas.fill_circle(cx, cy, radius, circle.color);
        }

        canvas.into_pixels(PixelFormat::Rgba8)
    }

    fn icon(&mut self, request: &IconRequest<'_>) -> Result<PixelBuffer> {
        let mut canvas = Canvas::new(request.size, request.size)?;
        canvas.clear();

        let extents = self.engine.measure(request.glyph, request.font_px);
        let x = (request.size as f32 / 2.0 - extents.width / 2.0).round();
        let y = (request.size as f32 / 2.0 - extents.height / 2.0).round();
        self.engine
            .draw(&mut canvas, request.glyph, request.font_px, x, y, request.color);

        canvas.into_pixels(PixelFormat::Rgba8)
    }
}
