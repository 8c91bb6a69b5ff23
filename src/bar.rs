//! Titlebar decoration
//!
//! One [`Bar`] per decorated window. The bar caches the window geometry it
//! last saw, turns pointer events into window moves and button commands,
//! and draws itself from three kinds of cached textures (title, button
//! circles, icons) that are only re-rasterized when their inputs change.

use std::rc::Rc;

use bitflags::bitflags;
use tracing::{debug, info, trace, warn};

use crate::buttons::ButtonRegistry;
use crate::config::BarsConfig;
use crate::events::{EventBus, EventKind, Subscription};
use crate::geometry::{self, BarLayout, Extents, Rect, Vec2, scale_box};
use crate::host::{ButtonState, Host, HostAction, MonitorInfo, PointerButtonEvent, WindowId, WindowSnapshot};
use crate::interaction::{Effect, PointerState, PressTarget, Propagation};
use crate::render::cache::TextureSlot;
use crate::render::raster::{ButtonCircle, IconRequest, Rasterizer, TitleRequest};
use crate::render::{Color, Renderer};

/// Icon glyph size relative to the button diameter
pub const ICON_SCALE: f64 = 0.62;

bitflags! {
    /// Inputs that changed since the last successful draw
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirtyFlags: u8 {
        const SIZE_CHANGED  = 1 << 0;
        const BUTTONS_DIRTY = 1 << 1;
        const TITLE_DIRTY   = 1 << 2;
    }
}

/// Collaborators for drawing one frame on one monitor
pub struct Frame<'a> {
    pub renderer: &'a mut dyn Renderer,
    pub rasterizer: &'a mut dyn Rasterizer,
    pub monitor: MonitorInfo,
    /// Opacity multiplier, 0.0-1.0
    pub alpha: f32,
    /// Render offset (workspace scroll animation)
    pub offset: Vec2,
}

/// Device-pixel size of the bar buffers at one monitor scale
#[derive(Debug, Clone, Copy, PartialEq)]
struct SurfaceKey {
    scale: f64,
    width: u32,
    height: u32,
}

#[derive(Debug, Clone, PartialEq)]
struct TitleKey {
    title: String,
    surface: SurfaceKey,
}

/// Per-frame numbers shared by the draw stages, in device pixels
struct FrameMetrics {
    /// Bar box relative to the monitor, scaled
    texture_box: Rect,
    buffer_width: u32,
    buffer_height: u32,
    surface: SurfaceKey,
    /// Button slots relative to `texture_box`
    slots: Vec<Rect>,
    scale: f64,
    border: i32,
}

pub struct Bar {
    window: WindowId,
    last_position: Vec2,
    last_size: Vec2,
    extents: Extents,
    last_height: i32,
    dirty: DirtyFlags,
    pointer: PointerState,
    buttons: ButtonRegistry,
    title_texture: TextureSlot<TitleKey>,
    buttons_texture: TextureSlot<SurfaceKey>,
    icon_textures: Vec<TextureSlot<f64>>,
    _subscriptions: [Subscription; 2],
}

impl Bar {
    /// Decorate `window`. Returns `None` if the host does not know it.
    pub fn new(
        window: WindowId,
        host: &mut dyn Host,
        bus: Rc<dyn EventBus>,
        config: &BarsConfig,
        buttons: ButtonRegistry,
    ) -> Option<Self> {
        let snapshot = host.window(window)?;
        host.schedule_monitor_recalc(snapshot.monitor.id);

        let subscriptions = [
            Subscription::new(bus.clone(), EventKind::MouseButton, window),
            Subscription::new(bus, EventKind::MouseMove, window),
        ];

        info!("Created titlebar for {:?} ({:?})", window, snapshot.title);

        Some(Self {
            window,
            last_position: snapshot.position,
            last_size: snapshot.size,
            extents: draw_extents(config.bar_height),
            last_height: 0,
            dirty: DirtyFlags::BUTTONS_DIRTY,
            pointer: PointerState::new(),
            icon_textures: empty_slots(buttons.len()),
            buttons,
            title_texture: TextureSlot::new(),
            buttons_texture: TextureSlot::new(),
            _subscriptions: subscriptions,
        })
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Extents covered while drawing (bar plus one pixel of seam).
    pub fn extents(&self) -> Extents {
        self.extents
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn last_height(&self) -> i32 {
        self.last_height
    }

    pub fn last_position(&self) -> Vec2 {
        self.last_position
    }

    pub fn last_size(&self) -> Vec2 {
        self.last_size
    }

    pub fn on_mouse_button(
        &mut self,
        host: &mut dyn Host,
        config: &BarsConfig,
        event: PointerButtonEvent,
    ) -> Propagation {
        let reaction = match event.state {
            ButtonState::Pressed => {
                if host.focused_window() != Some(self.window) {
                    return Propagation::Pass;
                }
                let Some(window) = host.window(self.window) else {
                    return Propagation::Pass;
                };
                let target = self.press_target(&window, config, host.cursor_position());
                self.pointer.press(target)
            }
            // releases are never focus-gated so a claimed press always gets its release
            ButtonState::Released => self.pointer.release(),
        };

        if let Some(effect) = reaction.effect {
            self.apply(host, effect);
        }
        reaction.propagation
    }

    pub fn on_mouse_move(&mut self, host: &mut dyn Host) {
        if let Some(effect) = self.pointer.motion() {
            self.apply(host, effect);
        }
    }

    fn press_target(&self, window: &WindowSnapshot, config: &BarsConfig, cursor: Vec2) -> PressTarget {
        let layout = BarLayout {
            position: window.position,
            size: window.size,
            border: border_size(window, config),
            height: config.bar_height,
        };
        let local = layout.to_local(cursor);
        if !layout.hit_region().contains(local) {
            return PressTarget::Outside;
        }

        layout
            .button_slots(config.button_padding, self.buttons.diameters())
            .iter()
            .position(|slot| slot.contains(local))
            .map_or(PressTarget::Body, PressTarget::Button)
    }

    fn apply(&mut self, host: &mut dyn Host, effect: Effect) {
        match effect {
            Effect::BeginMove => {
                debug!("Dragging initiated on {:?}", self.window);
                host.dispatch(HostAction::BeginMove);
            }
            Effect::EndMove => {
                debug!("Dragging ended on {:?}", self.window);
                host.dispatch(HostAction::EndMove);
            }
            Effect::Activate(index) => match self.buttons.get(index) {
                Some(button) => {
                    debug!("Button {} pressed on {:?}: {}", index, self.window, button.command);
                    host.dispatch(HostAction::Exec(button.command.clone()));
                }
                None => warn!("Button {} is not in the registry", index),
            },
        }
    }

    /// Pick up the window's new position and size.
    pub fn update_window(&mut self, host: &mut dyn Host) {
        let Some(window) = host.window(self.window) else {
            return;
        };

        self.damage_entire(host);

        let offset = if window.pinned { Vec2::ZERO } else { window.workspace_offset };
        if window.size != self.last_size {
            self.dirty.insert(DirtyFlags::SIZE_CHANGED);
        }
        self.last_position = window.position + offset;
        self.last_size = window.size;

        self.damage_entire(host);
    }

    pub fn damage_entire(&self, host: &mut dyn Host) {
        host.damage_box(geometry::damage_box(self.last_position, self.last_size, &self.extents));
    }

    /// Swap in a new button registry. Icons are tied to registry slots, so
    /// they are dropped and rendered again on the next draw.
    pub fn set_buttons(&mut self, buttons: ButtonRegistry, renderer: &mut dyn Renderer) {
        for slot in &mut self.icon_textures {
            slot.release(renderer);
        }
        self.icon_textures = empty_slots(buttons.len());
        self.buttons = buttons;
        self.dirty.insert(DirtyFlags::BUTTONS_DIRTY);
    }

    /// Render the title again on the next draw, e.g. after the text style
    /// changed.
    pub fn invalidate_title(&mut self) {
        self.dirty.insert(DirtyFlags::TITLE_DIRTY);
    }

    pub fn draw(&mut self, host: &mut dyn Host, config: &BarsConfig, frame: &mut Frame<'_>) {
        let Some(window) = host.window(self.window) else {
            return;
        };
        if !window.is_visible() {
            return;
        }

        let height = config.bar_height;
        if height < 1 {
            self.last_height = height;
            return;
        }

        // a new height resizes every buffer
        if self.last_height != height {
            self.dirty.insert(DirtyFlags::SIZE_CHANGED);
        }

        let scale = frame.monitor.scale;
        let border = border_size(&window, config);
        let rounding = rounding(&window, config);
        self.extents = draw_extents(height);

        let layout = BarLayout {
            position: self.last_position - frame.monitor.position + frame.offset,
            size: self.last_size,
            border,
            height,
        };

        // extended downwards to fill behind the window's rounded top corners
        let mut fill_box = layout.bar_box();
        fill_box.height += rounding * 3;
        let fill_box = scale_box(&fill_box, scale);

        let buffer_width = (layout.width() as f64 * scale).max(0.0) as u32;
        let buffer_height = (height as f64 * scale) as u32;
        let padding = config.button_padding as f64 * scale;
        let metrics = FrameMetrics {
            texture_box: Rect::new(fill_box.x, fill_box.y, buffer_width as i32, buffer_height as i32),
            buffer_width,
            buffer_height,
            surface: SurfaceKey {
                scale,
                width: buffer_width,
                height: buffer_height,
            },
            slots: geometry::button_slots(
                buffer_width as f64,
                buffer_height as f64,
                padding,
                self.buttons.diameters().map(|d| d * scale),
            ),
            scale,
            border,
        };

        frame.renderer.scissor(Some(&fill_box));

        if rounding > 0 {
            let position = layout.position.floor();
            let window_box = Rect::new(
                position.x as i32,
                position.y as i32,
                self.last_size.x as i32,
                self.last_size.y as i32,
            );
            frame.renderer.push_stencil_exclusion(
                &scale_box(&window_box, scale),
                ((rounding + border) as f64 * scale) as f32,
            );
        }

        let color = Color::from_argb(config.bar_color).with_alpha_mul(frame.alpha);
        frame.renderer.render_rect(&fill_box, color, (rounding as f64 * scale) as f32);

        let title_ok = self.refresh_title(&window.title, config, &metrics, frame);
        if let Some(texture) = self.title_texture.texture() {
            frame.renderer.render_texture(texture, &metrics.texture_box, frame.alpha);
        }

        if rounding > 0 {
            frame.renderer.clear_stencil();
        }

        let buttons_ok = self.refresh_buttons(&metrics, frame);
        if let Some(texture) = self.buttons_texture.texture() {
            frame.renderer.render_texture(texture, &metrics.texture_box, frame.alpha);
        }

        frame.renderer.scissor(None);

        // icons may overhang the bar, so they are drawn unclipped
        self.draw_icons(&metrics, frame);

        if title_ok && buttons_ok {
            self.dirty.remove(DirtyFlags::SIZE_CHANGED);
        }

        if self.last_height != height {
            host.recalculate_window(self.window);
            self.last_height = height;
        }
    }

    fn refresh_title(
        &mut self,
        title: &str,
        config: &BarsConfig,
        metrics: &FrameMetrics,
        frame: &mut Frame<'_>,
    ) -> bool {
        let key = TitleKey {
            title: title.to_string(),
            surface: metrics.surface,
        };
        let stale = self
            .dirty
            .intersects(DirtyFlags::SIZE_CHANGED | DirtyFlags::TITLE_DIRTY);
        if !stale && self.title_texture.is_fresh(&key) {
            return true;
        }

        let scale = metrics.scale;
        let padding = config.button_padding as f64;
        let border = metrics.border as f64;
        let text_padding = config.text_padding as f64;
        let button_row = self.buttons.total_size() + (self.buttons.len() + 1) as f64 * padding;
        let request = TitleRequest {
            text: title,
            width: metrics.buffer_width,
            height: metrics.buffer_height,
            font_px: (config.text_size as f64 * scale) as f32,
            color: Color::from_argb(config.text_color),
            left_padding: ((border + text_padding) * scale) as f32,
            right_padding: ((button_row + border + text_padding) * scale) as f32,
            border: (border * scale) as f32,
        };

        trace!("Rendering title {:?} for {:?}", title, self.window);
        let uploaded = frame
            .rasterizer
            .title(&request)
            .and_then(|pixels| frame.renderer.upload_texture(&pixels));
        match uploaded {
            Ok(texture) => {
                self.title_texture.replace(frame.renderer, texture, key);
                self.dirty.remove(DirtyFlags::TITLE_DIRTY);
                true
            }
            Err(e) => {
                warn!("Failed to render title for {:?}: {:#}", self.window, e);
                false
            }
        }
    }

    fn refresh_buttons(&mut self, metrics: &FrameMetrics, frame: &mut Frame<'_>) -> bool {
        let stale = self
            .dirty
            .intersects(DirtyFlags::SIZE_CHANGED | DirtyFlags::BUTTONS_DIRTY);
        if !stale && self.buttons_texture.is_fresh(&metrics.surface) {
            return true;
        }

        let circles: Vec<ButtonCircle> = self
            .buttons
            .iter()
            .zip(&metrics.slots)
            .map(|(button, slot)| ButtonCircle {
                slot: *slot,
                color: button.color,
            })
            .collect();

        trace!("Rendering {} buttons for {:?}", circles.len(), self.window);
        let uploaded = frame
            .rasterizer
            .buttons(metrics.buffer_width, metrics.buffer_height, &circles)
            .and_then(|pixels| frame.renderer.upload_texture(&pixels));
        match uploaded {
            Ok(texture) => {
                self.buttons_texture.replace(frame.renderer, texture, metrics.surface);
                self.dirty.remove(DirtyFlags::BUTTONS_DIRTY);
                true
            }
            Err(e) => {
                warn!("Failed to render buttons for {:?}: {:#}", self.window, e);
                false
            }
        }
    }

    fn draw_icons(&mut self, metrics: &FrameMetrics, frame: &mut Frame<'_>) {
        let scale = metrics.scale;
        let entries = self.buttons.iter().zip(&metrics.slots).zip(&mut self.icon_textures);

        for (index, ((button, slot), cache)) in entries.enumerate() {
            if button.icon.is_empty() || slot.is_empty() {
                continue;
            }

            if !cache.is_fresh(&scale) {
                let request = IconRequest {
                    glyph: &button.icon,
                    size: slot.width as u32,
                    font_px: (button.size * ICON_SCALE * scale) as f32,
                    color: if button.color.is_dark() { Color::WHITE } else { Color::BLACK },
                };
                trace!("Rendering icon {:?} for button {}", button.icon, index);
                let uploaded = frame
                    .rasterizer
                    .icon(&request)
                    .and_then(|pixels| frame.renderer.upload_texture(&pixels));
                match uploaded {
                    Ok(texture) => cache.replace(frame.renderer, texture, scale),
                    Err(e) => warn!("Failed to render icon for button {}: {:#}", index, e),
                }
            }

            if let Some(texture) = cache.texture() {
                let target = slot.translate(metrics.texture_box.x, metrics.texture_box.y);
                frame.renderer.render_texture(texture, &target, frame.alpha);
            }
        }
    }

    /// Tear the bar down: repaint the area it covered and free its textures.
    /// Callbacks are unregistered when the subscriptions drop.
    pub fn destroy(mut self, host: &mut dyn Host, renderer: &mut dyn Renderer) {
        self.damage_entire(host);
        self.release_textures(renderer);
        info!("Destroyed titlebar for {:?}", self.window);
    }

    fn release_textures(&mut self, renderer: &mut dyn Renderer) {
        self.title_texture.release(renderer);
        self.buttons_texture.release(renderer);
        for slot in &mut self.icon_textures {
            slot.release(renderer);
        }
    }

    fn holds_textures(&self) -> bool {
        !self.title_texture.is_empty()
            || !self.buttons_texture.is_empty()
            || self.icon_textures.iter().any(|slot| !slot.is_empty())
    }
}

impl Drop for Bar {
    fn drop(&mut self) {
        if self.holds_textures() {
            warn!("Titlebar for {:?} dropped without releasing its textures", self.window);
        }
    }
}

impl std::fmt::Debug for Bar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bar")
            .field("window", &self.window)
            .field("last_position", &self.last_position)
            .field("last_size", &self.last_size)
            .field("dirty", &self.dirty)
            .field("pointer", &self.pointer)
            .finish_non_exhaustive()
    }
}

fn empty_slots(count: usize) -> Vec<TextureSlot<f64>> {
    (0..count).map(|_| TextureSlot::new()).collect()
}

fn draw_extents(bar_height: i32) -> Extents {
    Extents {
        top: if bar_height < 1 { 0 } else { bar_height + 1 },
        ..Extents::default()
    }
}

fn border_size(window: &WindowSnapshot, config: &BarsConfig) -> i32 {
    window.border_size.unwrap_or(config.border_size).max(0)
}

fn rounding(window: &WindowSnapshot, config: &BarsConfig) -> i32 {
    if !window.rounding_enabled {
        return 0;
    }
    window.rounding_override.unwrap_or(config.rounding).max(0)
}
