//! Bar manager
//!
//! Owns every live [`Bar`] together with the config and the shared button
//! registry, and fans host callbacks out to the bars subscribed to them.

use std::rc::Rc;

use tracing::{debug, info};

use crate::bar::{Bar, Frame};
use crate::buttons::ButtonRegistry;
use crate::config::BarsConfig;
use crate::events::{EventBus, EventKind};
use crate::geometry::{self, Extents};
use crate::host::{Host, PointerButtonEvent, WindowId};
use crate::interaction::Propagation;
use crate::render::Renderer;

pub struct BarManager {
    config: BarsConfig,
    buttons: ButtonRegistry,
    bus: Rc<dyn EventBus>,
    bars: Vec<Bar>,
}

impl BarManager {
    pub fn new(config: BarsConfig, bus: Rc<dyn EventBus>) -> Self {
        let buttons = ButtonRegistry::from_config(&config.buttons);
        info!("Titlebars enabled with {} buttons", buttons.len());
        Self {
            config,
            buttons,
            bus,
            bars: Vec::new(),
        }
    }

    pub fn config(&self) -> &BarsConfig {
        &self.config
    }

    pub fn buttons(&self) -> &ButtonRegistry {
        &self.buttons
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bar(&self, window: WindowId) -> Option<&Bar> {
        self.bars.iter().find(|bar| bar.window() == window)
    }

    pub fn bar_mut(&mut self, window: WindowId) -> Option<&mut Bar> {
        self.bars.iter_mut().find(|bar| bar.window() == window)
    }

    /// Decorate a newly mapped window. Returns false if it already has a bar
    /// or the host does not know it.
    pub fn window_opened(&mut self, host: &mut dyn Host, window: WindowId) -> bool {
        if self.bar(window).is_some() {
            return false;
        }
        match Bar::new(window, host, self.bus.clone(), &self.config, self.buttons.clone()) {
            Some(bar) => {
                self.bars.push(bar);
                true
            }
            None => false,
        }
    }

    pub fn window_closed(&mut self, host: &mut dyn Host, renderer: &mut dyn Renderer, window: WindowId) -> bool {
        let Some(index) = self.bars.iter().position(|bar| bar.window() == window) else {
            return false;
        };
        self.bars.remove(index).destroy(host, renderer);
        true
    }

    pub fn window_updated(&mut self, host: &mut dyn Host, window: WindowId) {
        if let Some(bar) = self.bar_mut(window) {
            bar.update_window(host);
        }
    }

    /// Deliver a pointer button event. Cancelled if any bar claims it.
    pub fn mouse_button(&mut self, host: &mut dyn Host, event: PointerButtonEvent) -> Propagation {
        let mut propagation = Propagation::Pass;
        for owner in self.bus.subscribers(EventKind::MouseButton) {
            if let Some(bar) = self.bars.iter_mut().find(|bar| bar.window() == owner) {
                propagation = propagation.merge(bar.on_mouse_button(host, &self.config, event));
            }
        }
        propagation
    }

    pub fn mouse_move(&mut self, host: &mut dyn Host) {
        for owner in self.bus.subscribers(EventKind::MouseMove) {
            if let Some(bar) = self.bars.iter_mut().find(|bar| bar.window() == owner) {
                bar.on_mouse_move(host);
            }
        }
    }

    /// Draw every bar on the frame's monitor.
    pub fn draw(&mut self, host: &mut dyn Host, frame: &mut Frame<'_>) {
        for bar in &mut self.bars {
            let on_monitor = host
                .window(bar.window())
                .is_some_and(|window| window.monitor.id == frame.monitor.id);
            if on_monitor {
                bar.draw(host, &self.config, frame);
            }
        }
    }

    /// Space reserved above `window`, if it is decorated.
    pub fn reserved_area(&self, window: WindowId) -> Option<Extents> {
        self.bar(window)
            .map(|_| geometry::reserved_area(self.config.bar_height))
    }

    /// Swap in a reloaded config.
    pub fn apply_config(&mut self, host: &mut dyn Host, renderer: &mut dyn Renderer, config: BarsConfig) {
        let height_changed = config.bar_height != self.config.bar_height;
        let buttons_changed = config.buttons != self.config.buttons;
        self.config = config;

        if buttons_changed {
            self.buttons = ButtonRegistry::from_config(&self.config.buttons);
            debug!("Button registry rebuilt with {} buttons", self.buttons.len());
        }

        for bar in &mut self.bars {
            // text style, colors and sizes all feed the textures, so always re-render
            bar.set_buttons(self.buttons.clone(), renderer);
            bar.invalidate_title();
            bar.damage_entire(host);
            if height_changed {
                host.recalculate_window(bar.window());
            }
        }

        info!("Applied titlebar config to {} bars", self.bars.len());
    }

    /// Destroy every bar, e.g. on shutdown.
    pub fn clear(&mut self, host: &mut dyn Host, renderer: &mut dyn Renderer) {
        for bar in self.bars.drain(..) {
            bar.destroy(host, renderer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CallbackRegistry;
    use crate::geometry::Vec2;
    use crate::host::{HostAction, MemoryHost, MonitorId, MonitorInfo, WindowSnapshot};
    use crate::testing::{CountingRasterizer, RecordingRenderer};

    fn setup() -> (MemoryHost, Rc<CallbackRegistry>, BarManager) {
        let mut host = MemoryHost::new();
        host.add_window(
            WindowId(1),
            WindowSnapshot::new(Vec2::new(100.0, 100.0), Vec2::new(800.0, 600.0), "one"),
        );
        host.add_window(
            WindowId(2),
            WindowSnapshot::new(Vec2::new(100.0, 900.0), Vec2::new(400.0, 300.0), "two"),
        );
        let bus = Rc::new(CallbackRegistry::new());
        let manager = BarManager::new(BarsConfig::default(), bus.clone());
        (host, bus, manager)
    }

    fn draw_all(manager: &mut BarManager, host: &mut MemoryHost, renderer: &mut RecordingRenderer) -> CountingRasterizer {
        let mut rasterizer = CountingRasterizer::default();
        let mut frame = Frame {
            renderer,
            rasterizer: &mut rasterizer,
            monitor: MonitorInfo::default(),
            alpha: 1.0,
            offset: Vec2::ZERO,
        };
        manager.draw(host, &mut frame);
        rasterizer
    }

    #[test]
    fn test_open_and_close() {
        let (mut host, bus, mut manager) = setup();
        let mut renderer = RecordingRenderer::default();

        assert!(manager.window_opened(&mut host, WindowId(1)));
        assert!(!manager.window_opened(&mut host, WindowId(1)));
        assert!(!manager.window_opened(&mut host, WindowId(5)));
        assert_eq!(manager.len(), 1);
        assert_eq!(bus.len(), 2);

        assert!(manager.window_closed(&mut host, &mut renderer, WindowId(1)));
        assert!(!manager.window_closed(&mut host, &mut renderer, WindowId(1)));
        assert!(manager.is_empty());
        assert!(bus.is_empty());
    }

    #[test]
    fn test_bars_share_one_registry() {
        let (mut host, _bus, mut manager) = setup();
        manager.window_opened(&mut host, WindowId(1));
        manager.window_opened(&mut host, WindowId(2));

        let registry = manager.buttons().clone();
        assert!(registry.ptr_eq(manager.buttons()));
        assert_eq!(manager.reserved_area(WindowId(1)), Some(Extents { top: 30, ..Extents::default() }));
        assert_eq!(manager.reserved_area(WindowId(3)), None);

        let mut renderer = RecordingRenderer::default();
        manager.clear(&mut host, &mut renderer);
    }

    #[test]
    fn test_press_routed_to_focused_bar_only() {
        let (mut host, _bus, mut manager) = setup();
        manager.window_opened(&mut host, WindowId(1));
        manager.window_opened(&mut host, WindowId(2));
        host.focused = Some(WindowId(1));

        host.cursor = Vec2::new(300.0, 80.0);
        assert_eq!(manager.mouse_button(&mut host, PointerButtonEvent::pressed(272)), Propagation::Cancel);
        host.cursor = Vec2::new(305.0, 82.0);
        manager.mouse_move(&mut host);
        assert_eq!(manager.mouse_button(&mut host, PointerButtonEvent::released(272)), Propagation::Cancel);

        assert_eq!(host.actions, vec![HostAction::BeginMove, HostAction::EndMove]);

        // a press on the content of a window passes through
        host.cursor = Vec2::new(300.0, 300.0);
        assert_eq!(manager.mouse_button(&mut host, PointerButtonEvent::pressed(272)), Propagation::Pass);

        let mut renderer = RecordingRenderer::default();
        manager.clear(&mut host, &mut renderer);
    }

    #[test]
    fn test_draw_all_bars() {
        let (mut host, _bus, mut manager) = setup();
        manager.window_opened(&mut host, WindowId(1));
        manager.window_opened(&mut host, WindowId(2));
        let mut renderer = RecordingRenderer::default();

        let rasterizer = draw_all(&mut manager, &mut host, &mut renderer);
        assert_eq!(rasterizer.titles, vec!["one".to_string(), "two".to_string()]);
        assert_eq!(host.recalculated, vec![WindowId(1), WindowId(2)]);

        manager.clear(&mut host, &mut renderer);
        assert!(renderer.live.is_empty());
    }

    #[test]
    fn test_apply_config_rebuilds_buttons() {
        let (mut host, _bus, mut manager) = setup();
        manager.window_opened(&mut host, WindowId(1));
        let mut renderer = RecordingRenderer::default();
        draw_all(&mut manager, &mut host, &mut renderer);

        let mut config = BarsConfig::default();
        config.bar_height = 24;
        config.buttons.truncate(1);
        let old = manager.buttons().clone();
        manager.apply_config(&mut host, &mut renderer, config);

        assert!(!old.ptr_eq(manager.buttons()));
        assert_eq!(manager.buttons().len(), 1);
        assert_eq!(host.recalculated.last(), Some(&WindowId(1)));

        let rasterizer = draw_all(&mut manager, &mut host, &mut renderer);
        assert_eq!(rasterizer.buttons, 1);
        assert_eq!(rasterizer.titles.len(), 1);
        assert_eq!(rasterizer.icons, 1);
        assert_eq!(manager.bar(WindowId(1)).map(|bar| bar.last_height()), Some(24));

        manager.clear(&mut host, &mut renderer);
        assert!(renderer.live.is_empty());
    }

    #[test]
    fn test_apply_config_restyles_title() {
        let (mut host, _bus, mut manager) = setup();
        manager.window_opened(&mut host, WindowId(1));
        let mut renderer = RecordingRenderer::default();
        draw_all(&mut manager, &mut host, &mut renderer);

        let config = BarsConfig {
            text_color: 0xffff0000,
            text_size: 20,
            ..BarsConfig::default()
        };
        manager.apply_config(&mut host, &mut renderer, config);

        let rasterizer = draw_all(&mut manager, &mut host, &mut renderer);
        assert_eq!(rasterizer.titles, vec!["one".to_string()]);
        assert_eq!(manager.buttons().len(), 2);

        // settled again once drawn
        let rasterizer = draw_all(&mut manager, &mut host, &mut renderer);
        assert!(rasterizer.titles.is_empty());

        manager.clear(&mut host, &mut renderer);
        assert!(renderer.live.is_empty());
    }

    #[test]
    fn test_draw_skips_other_monitors() {
        let (mut host, _bus, mut manager) = setup();
        host.window_mut(WindowId(2)).unwrap().monitor.id = MonitorId(1);
        manager.window_opened(&mut host, WindowId(1));
        manager.window_opened(&mut host, WindowId(2));
        let mut renderer = RecordingRenderer::default();

        let rasterizer = draw_all(&mut manager, &mut host, &mut renderer);
        assert_eq!(rasterizer.titles, vec!["one".to_string()]);

        manager.clear(&mut host, &mut renderer);
    }
}
