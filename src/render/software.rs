//! CPU compositing backend
//!
//! Implements [`Renderer`] on top of a tiny-skia pixmap. Scissor and stencil
//! state are folded into one coverage mask applied to every draw. Used by the
//! preview tool, and handy anywhere a GL context is not available.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tiny_skia::{
    FillRule, FilterQuality, IntSize, Mask, Paint, Pixmap, PixmapPaint, Transform,
};
use tracing::warn;

use super::canvas::rounded_rect_path;
use super::{Color, PixelBuffer, PixelFormat, Renderer, TextureId};
use crate::geometry::Rect;

pub struct SoftwareRenderer {
    target: Pixmap,
    textures: HashMap<TextureId, Pixmap>,
    next_texture: u32,
    scissor: Option<Rect>,
    /// Coverage of pixels still drawable after stencil exclusions
    stencil: Option<Mask>,
}

impl SoftwareRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let target = Pixmap::new(width, height)
            .with_context(|| format!("Failed to allocate {}x{} render target", width, height))?;
        Ok(Self {
            target,
            textures: HashMap::new(),
            next_texture: 0,
            scissor: None,
            stencil: None,
        })
    }

    pub fn target(&self) -> &Pixmap {
        &self.target
    }

    /// Premultiplied RGBA pixel of the render target.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let px = self.target.pixel(x, y)?;
        Some([px.red(), px.green(), px.blue(), px.alpha()])
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn clear(&mut self, color: Color) {
        self.target.fill(color.to_skia());
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.target
            .save_png(path)
            .with_context(|| format!("Failed to write PNG to {:?}", path))
    }

    /// Mask combining scissor and stencil, or `None` when both are off.
    fn clip_mask(&self) -> Option<Mask> {
        if self.scissor.is_none() && self.stencil.is_none() {
            return None;
        }

        let mut mask = Mask::new(self.target.width(), self.target.height())?;
        match self.scissor.as_ref() {
            Some(scissor) => {
                if let Some(path) = rounded_rect_path(scissor, 0.0) {
                    mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
                }
            }
            None => mask.data_mut().fill(255),
        }

        if let Some(stencil) = self.stencil.as_ref() {
            for (clip, allowed) in mask.data_mut().iter_mut().zip(stencil.data()) {
                *clip = ((*clip as u16 * *allowed as u16) / 255) as u8;
            }
        }

        Some(mask)
    }
}

impl Renderer for SoftwareRenderer {
    fn upload_texture(&mut self, pixels: &PixelBuffer) -> Result<TextureId> {
        let rgba = pixels.clone().into_format(PixelFormat::Rgba8);
        let size = IntSize::from_wh(rgba.width(), rgba.height())
            .with_context(|| format!("Invalid texture size {}x{}", rgba.width(), rgba.height()))?;
        let pixmap = Pixmap::from_vec(rgba.into_data(), size).context("Failed to wrap texture pixels")?;

        self.next_texture += 1;
        let texture = TextureId(self.next_texture);
        self.textures.insert(texture, pixmap);
        Ok(texture)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_none() {
            warn!("Destroying unknown texture {:?}", texture);
        }
    }

    fn render_texture(&mut self, texture: TextureId, target: &Rect, alpha: f32) {
        let Some(pixmap) = self.textures.get(&texture) else {
            warn!("render_texture called with unknown texture {:?}", texture);
            return;
        };
        if target.is_empty() {
            return;
        }

        let sx = target.width as f32 / pixmap.width() as f32;
        let sy = target.height as f32 / pixmap.height() as f32;
        let transform = Transform::from_row(sx, 0.0, 0.0, sy, target.x as f32, target.y as f32);
        let paint = PixmapPaint {
            opacity: alpha.clamp(0.0, 1.0),
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        let mask = self.clip_mask();
        self.target
            .draw_pixmap(0, 0, pixmap.as_ref(), &paint, transform, mask.as_ref());
    }

    fn render_rect(&mut self, rect: &Rect, color: Color, radius: f32) {
        let Some(path) = rounded_rect_path(rect, radius) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.anti_alias = radius > 0.0;
        let mask = self.clip_mask();
        self.target
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), mask.as_ref());
    }

    fn scissor(&mut self, rect: Option<&Rect>) {
        self.scissor = rect.copied();
    }

    fn push_stencil_exclusion(&mut self, shape: &Rect, radius: f32) {
        let Some(mut mask) = Mask::new(self.target.width(), self.target.height()) else {
            return;
        };
        if let Some(path) = rounded_rect_path(shape, radius) {
            mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
        }
        for value in mask.data_mut() {
            *value = 255 - *value;
        }
        self.stencil = Some(mask);
    }

    fn clear_stencil(&mut self) {
        self.stencil = None;
    }
}
