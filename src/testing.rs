//! Test doubles shared by the unit tests

use std::collections::BTreeSet;

use anyhow::{Result, bail};

use crate::geometry::Rect;
use crate::render::canvas::Canvas;
use crate::render::raster::{ButtonCircle, IconRequest, Rasterizer, TitleRequest};
use crate::render::text::{TextEngine, TextExtents};
use crate::render::{Color, PixelBuffer, PixelFormat, Renderer, TextureId};

/// One recorded [`Renderer`] call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload(TextureId, u32, u32),
    Destroy(TextureId),
    Texture(TextureId, Rect, f32),
    Rect(Rect, Color, f32),
    Scissor(Option<Rect>),
    StencilExclusion(Rect, f32),
    ClearStencil,
}

/// Renderer that only logs what it is asked to do
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<Call>,
    pub live: BTreeSet<TextureId>,
    next_texture: u32,
}

impl RecordingRenderer {
    pub fn uploads(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::Upload(..)))
            .count()
    }
}

impl Renderer for RecordingRenderer {
    fn upload_texture(&mut self, pixels: &PixelBuffer) -> Result<TextureId> {
        self.next_texture += 1;
        let texture = TextureId(self.next_texture);
        self.live.insert(texture);
        self.calls
            .push(Call::Upload(texture, pixels.width(), pixels.height()));
        Ok(texture)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.live.remove(&texture);
        self.calls.push(Call::Destroy(texture));
    }

    fn render_texture(&mut self, texture: TextureId, target: &Rect, alpha: f32) {
        self.calls.push(Call::Texture(texture, *target, alpha));
    }

    fn render_rect(&mut self, rect: &Rect, color: Color, radius: f32) {
        self.calls.push(Call::Rect(*rect, color, radius));
    }

    fn scissor(&mut self, rect: Option<&Rect>) {
        self.calls.push(Call::Scissor(rect.copied()));
    }

    fn push_stencil_exclusion(&mut self, shape: &Rect, radius: f32) {
        self.calls.push(Call::StencilExclusion(*shape, radius));
    }

    fn clear_stencil(&mut self) {
        self.calls.push(Call::ClearStencil);
    }
}

/// Rasterizer that hands back blank buffers and counts requests
#[derive(Debug, Default)]
pub struct CountingRasterizer {
    pub titles: Vec<String>,
    pub buttons: usize,
    pub icons: usize,
    pub last_circles: Vec<ButtonCircle>,
    pub fail_titles: bool,
}

impl Rasterizer for CountingRasterizer {
    fn title(&mut self, request: &TitleRequest<'_>) -> Result<PixelBuffer> {
        if self.fail_titles {
            bail!("title rasterization disabled");
        }
        self.titles.push(request.text.to_string());
        Ok(PixelBuffer::new(request.width, request.height, PixelFormat::Rgba8))
    }

    fn buttons(&mut self, width: u32, height: u32, circles: &[ButtonCircle]) -> Result<PixelBuffer> {
        self.buttons += 1;
        self.last_circles = circles.to_vec();
        Ok(PixelBuffer::new(width, height, PixelFormat::Rgba8))
    }

    fn icon(&mut self, request: &IconRequest<'_>) -> Result<PixelBuffer> {
        self.icons += 1;
        Ok(PixelBuffer::new(request.size, request.size, PixelFormat::Rgba8))
    }
}

/// Monospace engine drawing each glyph as a solid `advance` x `px` block
#[derive(Debug)]
pub struct FixedAdvanceEngine {
    advance: f32,
    pub last_drawn: Option<String>,
}

impl FixedAdvanceEngine {
    pub fn new(advance: f32) -> Self {
        Self { advance, last_drawn: None }
    }
}

impl TextEngine for FixedAdvanceEngine {
    fn measure(&mut self, text: &str, px: f32) -> TextExtents {
        TextExtents {
            width: text.chars().count() as f32 * self.advance,
            height: px,
        }
    }

    fn draw(&mut self, canvas: &mut Canvas, text: &str, px: f32, x: f32, y: f32, color: Color) {
        let width = (text.chars().count() as f32 * self.advance) as usize;
        let height = px as usize;
        let coverage = vec![255u8; width * height];
        canvas.blend_coverage(x as i32, y as i32, width, height, &coverage, color);
        self.last_drawn = Some(text.to_string());
    }
}
