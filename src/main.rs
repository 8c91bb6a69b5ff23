//! Area Bars preview
//!
//! Renders the titlebar of a single fake window with the CPU backends and
//! writes the result to a PNG, for checking a config without restarting
//! the compositor.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use area_bars::geometry::{Rect, Vec2};
use area_bars::host::{MonitorInfo, WindowId};
use area_bars::render::raster::SoftwareRasterizer;
use area_bars::render::software::SoftwareRenderer;
use area_bars::render::text::FontdueEngine;
use area_bars::render::{Color, Renderer};
use area_bars::{BarManager, BarsConfig, CallbackRegistry, Frame, MemoryHost, WindowSnapshot};

const WINDOW_BACKGROUND: u32 = 0xff2e3440;

struct Options {
    title: String,
    width: u32,
    height: u32,
    scale: f64,
    output: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            title: "Area".to_string(),
            width: 640,
            height: 120,
            scale: 1.0,
            output: PathBuf::from("bar.png"),
        }
    }
}

impl Options {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value = || args.next().with_context(|| format!("Missing value for {}", arg));
            match arg.as_str() {
                "--title" => options.title = value()?,
                "--width" => options.width = value()?.parse().context("Invalid --width")?,
                "--height" => options.height = value()?.parse().context("Invalid --height")?,
                "--scale" => options.scale = value()?.parse().context("Invalid --scale")?,
                "--output" | "-o" => options.output = PathBuf::from(value()?),
                other => bail!("Unknown argument: {}", other),
            }
        }

        if options.scale <= 0.0 {
            bail!("--scale must be positive");
        }
        Ok(options)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "area_bars=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = Options::parse(std::env::args().skip(1))?;
    let config = BarsConfig::load()?;

    let engine = match &config.font_path {
        Some(path) => FontdueEngine::from_path(path)?,
        None => FontdueEngine::for_family(&config.text_font)?,
    };
    let mut rasterizer = SoftwareRasterizer::new(engine);

    // window sits below its bar and inside its border
    let border = config.border_size.max(0);
    let bar_height = config.bar_height.max(0);
    let window_id = WindowId(1);
    let mut host = MemoryHost::new();
    host.add_window(
        window_id,
        WindowSnapshot::new(
            Vec2::new(border as f64, (bar_height + border) as f64),
            Vec2::new(options.width as f64, options.height as f64),
            options.title.as_str(),
        ),
    );

    let canvas_width = options.width + 2 * border as u32;
    let canvas_height = options.height + (bar_height + 2 * border) as u32;
    let scaled = |value: u32| (value as f64 * options.scale).round() as u32;
    let mut renderer = SoftwareRenderer::new(scaled(canvas_width), scaled(canvas_height))?;

    let content = Rect::new(
        (border as f64 * options.scale).round() as i32,
        ((bar_height + border) as f64 * options.scale).round() as i32,
        scaled(options.width) as i32,
        scaled(options.height) as i32,
    );
    renderer.render_rect(&content, Color::from_argb(WINDOW_BACKGROUND), 0.0);

    let mut manager = BarManager::new(config, Rc::new(CallbackRegistry::new()));
    manager.window_opened(&mut host, window_id);

    let mut frame = Frame {
        renderer: &mut renderer,
        rasterizer: &mut rasterizer,
        monitor: MonitorInfo {
            scale: options.scale,
            ..MonitorInfo::default()
        },
        alpha: 1.0,
        offset: Vec2::ZERO,
    };
    manager.draw(&mut host, &mut frame);

    renderer.save_png(&options.output)?;
    info!("Wrote {:?}", options.output);

    manager.clear(&mut host, &mut renderer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_defaults() {
        let options = Options::parse(Vec::new()).unwrap();
        assert_eq!(options.title, "Area");
        assert_eq!(options.output, PathBuf::from("bar.png"));
    }

    #[test]
    fn test_parse_flags() {
        let options = Options::parse(args(&["--title", "Files", "--width", "300", "--scale", "2", "-o", "x.png"])).unwrap();
        assert_eq!(options.title, "Files");
        assert_eq!(options.width, 300);
        assert_eq!(options.scale, 2.0);
        assert_eq!(options.output, PathBuf::from("x.png"));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Options::parse(args(&["--width"])).is_err());
        assert!(Options::parse(args(&["--width", "wide"])).is_err());
        assert!(Options::parse(args(&["--scale", "0"])).is_err());
        assert!(Options::parse(args(&["--verbose"])).is_err());
    }
}
