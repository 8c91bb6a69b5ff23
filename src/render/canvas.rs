//! Off-screen drawing surface
//!
//! A premultiplied RGBA pixmap the rasterizer draws text and button circles
//! into before the result is uploaded as a texture.

use anyhow::{Context, Result};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Transform};

use super::{Color, PixelBuffer, PixelFormat};
use crate::geometry::Rect;

/// Cubic bezier handle length for a quarter circle
const KAPPA: f32 = 0.552_284_8;

pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .with_context(|| format!("Failed to allocate {}x{} canvas", width, height))?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    /// Anti-aliased filled circle.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        let Some(path) = PathBuilder::from_circle(cx, cy, radius) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.anti_alias = true;
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    /// Source-over blend a coverage bitmap (one byte per pixel) tinted with
    /// `color`, its top-left corner at (x, y). Parts outside the canvas are
    /// dropped.
    pub fn blend_coverage(
        &mut self,
        x: i32,
        y: i32,
        width: usize,
        height: usize,
        coverage: &[u8],
        color: Color,
    ) {
        let canvas_w = self.pixmap.width() as i32;
        let canvas_h = self.pixmap.height() as i32;
        let [r, g, b, a] = color.premultiplied();
        let data = self.pixmap.data_mut();

        for row in 0..height {
            let py = y + row as i32;
            if py < 0 || py >= canvas_h {
                continue;
            }
            for col in 0..width {
                let px = x + col as i32;
                if px < 0 || px >= canvas_w {
                    continue;
                }
                let cov = coverage[row * width + col] as f32 / 255.0;
                if cov == 0.0 {
                    continue;
                }

                let at = (py as usize * canvas_w as usize + px as usize) * 4;
                let dst = &mut data[at..at + 4];
                let inv = 1.0 - a * cov;
                for (channel, src) in dst.iter_mut().zip([r, g, b, a]) {
                    let out = src * cov * 255.0 + *channel as f32 * inv;
                    *channel = out.round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }

    /// Read the pixels back in `format`.
    pub fn into_pixels(self, format: PixelFormat) -> Result<PixelBuffer> {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let pixels = PixelBuffer::from_raw(width, height, PixelFormat::Rgba8, self.pixmap.take())?;
        Ok(pixels.into_format(format))
    }
}

/// Path for `rect` with corners rounded by `radius`, clamped to half the
/// shorter side. A radius of zero gives a plain rectangle.
pub(crate) fn rounded_rect_path(rect: &Rect, radius: f32) -> Option<Path> {
    let (x, y) = (rect.x as f32, rect.y as f32);
    let (w, h) = (rect.width as f32, rect.height as f32);
    let r = radius.min(w / 2.0).min(h / 2.0);

    if r <= 0.0 {
        return Some(PathBuilder::from_rect(tiny_skia::Rect::from_xywh(x, y, w, h)?));
    }

    let k = KAPPA * r;
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.cubic_to(x + w - r + k, y, x + w, y + r - k, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.cubic_to(x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.cubic_to(x + r - k, y + h, x, y + h - r + k, x, y + h - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}
