//! Text shaping and font lookup
//!
//! The rasterizer measures and draws strings through [`TextEngine`]. The
//! stock engine uses fontdue with a single font file resolved from a family
//! name by scanning the usual font directories.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use fontdue::{Font, FontSettings};
use tracing::debug;
use walkdir::WalkDir;

use super::Color;
use super::canvas::Canvas;

pub const ELLIPSIS: char = '…';

/// Pixel size of a laid-out string
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtents {
    pub width: f32,
    pub height: f32,
}

pub trait TextEngine {
    /// Size `text` occupies at `px` pixels.
    fn measure(&mut self, text: &str, px: f32) -> TextExtents;

    /// Draw `text` left-to-right with its layout box's top-left at (x, y).
    fn draw(&mut self, canvas: &mut Canvas, text: &str, px: f32, x: f32, y: f32, color: Color);
}

/// Shorten `text` from the end until it fits `max_width`, marking the cut
/// with an ellipsis. Returns an empty string when not even the ellipsis fits.
pub fn ellipsize<'a, E: TextEngine + ?Sized>(
    engine: &mut E,
    text: &'a str,
    px: f32,
    max_width: f32,
) -> Cow<'a, str> {
    if engine.measure(text, px).width <= max_width {
        return Cow::Borrowed(text);
    }

    for (end, _) in text.char_indices().rev() {
        let candidate = format!("{}{}", text[..end].trim_end(), ELLIPSIS);
        if engine.measure(&candidate, px).width <= max_width {
            return Cow::Owned(candidate);
        }
    }

    Cow::Owned(String::new())
}

/// [`TextEngine`] backed by one fontdue font
pub struct FontdueEngine {
    font: Font,
}

impl FontdueEngine {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| anyhow!("Failed to parse font: {}", e))?;
        Ok(Self { font })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read font {:?}", path))?;
        debug!("Loaded font from {:?}", path);
        Self::from_bytes(bytes).with_context(|| format!("Invalid font file {:?}", path))
    }

    /// Resolve `family` against the system font directories.
    pub fn for_family(family: &str) -> Result<Self> {
        let path = find_font(family).with_context(|| format!("No font found for family {:?}", family))?;
        Self::from_path(&path)
    }

    fn line_height(&self, px: f32) -> (f32, f32) {
        match self.font.horizontal_line_metrics(px) {
            Some(metrics) => (metrics.ascent, metrics.ascent - metrics.descent),
            None => (px, px),
        }
    }

    fn kern(&self, previous: Option<char>, ch: char, px: f32) -> f32 {
        previous
            .and_then(|prev| self.font.horizontal_kern(prev, ch, px))
            .unwrap_or(0.0)
    }
}

impl TextEngine for FontdueEngine {
    fn measure(&mut self, text: &str, px: f32) -> TextExtents {
        let mut width = 0.0;
        let mut previous = None;
        for ch in text.chars() {
            width += self.kern(previous, ch, px) + self.font.metrics(ch, px).advance_width;
            previous = Some(ch);
        }
        let (_, height) = self.line_height(px);
        TextExtents { width, height }
    }

    fn draw(&mut self, canvas: &mut Canvas, text: &str, px: f32, x: f32, y: f32, color: Color) {
        let (ascent, _) = self.line_height(px);
        let baseline = y + ascent;
        let mut pen = x;
        let mut previous = None;

        for ch in text.chars() {
            pen += self.kern(previous, ch, px);
            let (metrics, coverage) = self.font.rasterize(ch, px);
            let gx = (pen + metrics.xmin as f32).round() as i32;
            let gy = (baseline - metrics.height as f32 - metrics.ymin as f32).round() as i32;
            canvas.blend_coverage(gx, gy, metrics.width, metrics.height, &coverage, color);
            pen += metrics.advance_width;
            previous = Some(ch);
        }
    }
}

/// Directories searched for font files, most general first.
pub fn font_dirs() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
    ];
    if let Some(data) = dirs::data_dir() {
        paths.push(data.join("fonts"));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".fonts"));
    }
    paths
}

/// Find a font file for `family` in the system font directories.
pub fn find_font(family: &str) -> Option<PathBuf> {
    find_font_in(&font_dirs(), family)
}

/// Find a font file for `family` under `dirs`.
///
/// File stems are compared after dropping case and punctuation. An exact
/// stem (or `<family>regular`) beats a longer variant such as a bold or
/// condensed cut of the same family.
pub fn find_font_in(dirs: &[PathBuf], family: &str) -> Option<PathBuf> {
    let candidates = family_candidates(family);
    let mut best: Option<(usize, PathBuf)> = None;

    for dir in dirs {
        for entry in WalkDir::new(dir).follow_links(true).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            let is_font = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf"));
            if !is_font {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(normalize) else {
                continue;
            };

            for (rank, candidate) in candidates.iter().enumerate() {
                if !stem.starts_with(candidate.as_str()) {
                    continue;
                }
                let rest = &stem[candidate.len()..];
                let score = rank * 2 + usize::from(!(rest.is_empty() || rest == "regular"));
                if best.as_ref().is_none_or(|(current, _)| score < *current) {
                    best = Some((score, path.to_path_buf()));
                }
                break;
            }
        }
    }

    best.map(|(_, path)| path)
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Concrete families tried for `family`, generic names expanded.
fn family_candidates(family: &str) -> Vec<String> {
    let generic: &[&str] = match normalize(family).as_str() {
        "sans" | "sansserif" => &["dejavusans", "notosans", "liberationsans", "cantarell"],
        "serif" => &["dejavuserif", "notoserif", "liberationserif"],
        "mono" | "monospace" => &["dejavusansmono", "notosansmono", "liberationmono"],
        _ => &[],
    };
    if generic.is_empty() {
        vec![normalize(family)]
    } else {
        generic.iter().map(|s| s.to_string()).collect()
    }
}
