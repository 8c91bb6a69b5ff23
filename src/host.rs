//! Host compositor interface
//!
//! Everything the bars need from the window manager: window and monitor
//! queries, the pointer position, dispatchers for moving windows and running
//! commands, damage and layout requests. [`MemoryHost`] is a plain in-memory
//! implementation used by the preview tool and the tests.

use std::collections::BTreeMap;

use crate::geometry::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MonitorId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorInfo {
    pub id: MonitorId,
    pub position: Vec2,
    pub scale: f64,
}

impl Default for MonitorInfo {
    fn default() -> Self {
        Self {
            id: MonitorId::default(),
            position: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

/// Live state of a managed window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    pub position: Vec2,
    pub size: Vec2,
    pub title: String,
    /// Pinned windows ignore workspace scroll offsets
    pub pinned: bool,
    pub mapped: bool,
    /// False when a rule turned decorations off for this window
    pub decorate: bool,
    /// Per-window border override
    pub border_size: Option<i32>,
    pub rounding_enabled: bool,
    /// Per-window rounding override
    pub rounding_override: Option<i32>,
    /// Render offset of the window's workspace (scroll animation)
    pub workspace_offset: Vec2,
    pub monitor: MonitorInfo,
}

impl WindowSnapshot {
    pub fn new(position: Vec2, size: Vec2, title: impl Into<String>) -> Self {
        Self {
            position,
            size,
            title: title.into(),
            pinned: false,
            mapped: true,
            decorate: true,
            border_size: None,
            rounding_enabled: true,
            rounding_override: None,
            workspace_offset: Vec2::ZERO,
            monitor: MonitorInfo::default(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.mapped && self.decorate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerButtonEvent {
    /// Raw device button code
    pub button: u32,
    pub state: ButtonState,
}

impl PointerButtonEvent {
    pub fn pressed(button: u32) -> Self {
        Self { button, state: ButtonState::Pressed }
    }

    pub fn released(button: u32) -> Self {
        Self { button, state: ButtonState::Released }
    }
}

/// Requests sent through the host's dispatcher table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    BeginMove,
    EndMove,
    Exec(String),
}

pub trait Host {
    fn window(&self, id: WindowId) -> Option<WindowSnapshot>;

    fn focused_window(&self) -> Option<WindowId>;

    /// Pointer position in global logical coordinates.
    fn cursor_position(&self) -> Vec2;

    fn dispatch(&mut self, action: HostAction);

    /// Mark a region for repaint.
    fn damage_box(&mut self, rect: Rect);

    /// Reflow a window after its reserved decoration space changed.
    fn recalculate_window(&mut self, id: WindowId);

    fn schedule_monitor_recalc(&mut self, monitor: MonitorId);
}

/// [`Host`] backed by plain collections; records every request it receives
#[derive(Debug, Default)]
pub struct MemoryHost {
    pub windows: BTreeMap<WindowId, WindowSnapshot>,
    pub focused: Option<WindowId>,
    pub cursor: Vec2,
    pub actions: Vec<HostAction>,
    pub damage: Vec<Rect>,
    pub recalculated: Vec<WindowId>,
    pub monitor_recalcs: Vec<MonitorId>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a window and give it focus.
    pub fn add_window(&mut self, id: WindowId, window: WindowSnapshot) {
        self.windows.insert(id, window);
        self.focused = Some(id);
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut WindowSnapshot> {
        self.windows.get_mut(&id)
    }

    pub fn remove_window(&mut self, id: WindowId) -> Option<WindowSnapshot> {
        if self.focused == Some(id) {
            self.focused = None;
        }
        self.windows.remove(&id)
    }

    pub fn count_actions(&self, action: &HostAction) -> usize {
        self.actions.iter().filter(|a| *a == action).count()
    }

    pub fn exec_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, HostAction::Exec(_)))
            .count()
    }
}

impl Host for MemoryHost {
    fn window(&self, id: WindowId) -> Option<WindowSnapshot> {
        self.windows.get(&id).cloned()
    }

    fn focused_window(&self) -> Option<WindowId> {
        self.focused
    }

    fn cursor_position(&self) -> Vec2 {
        self.cursor
    }

    fn dispatch(&mut self, action: HostAction) {
        self.actions.push(action);
    }

    fn damage_box(&mut self, rect: Rect) {
        self.damage.push(rect);
    }

    fn recalculate_window(&mut self, id: WindowId) {
        self.recalculated.push(id);
    }

    fn schedule_monitor_recalc(&mut self, monitor: MonitorId) {
        self.monitor_recalcs.push(monitor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_host_focus_follows_windows() {
        let mut host = MemoryHost::new();
        host.add_window(WindowId(1), WindowSnapshot::new(Vec2::ZERO, Vec2::new(10.0, 10.0), "a"));
        host.add_window(WindowId(2), WindowSnapshot::new(Vec2::ZERO, Vec2::new(10.0, 10.0), "b"));
        assert_eq!(host.focused_window(), Some(WindowId(2)));

        host.remove_window(WindowId(2));
        assert_eq!(host.focused_window(), None);
        assert!(host.window(WindowId(1)).is_some());
    }

    #[test]
    fn test_hidden_windows_are_not_visible() {
        let mut window = WindowSnapshot::new(Vec2::ZERO, Vec2::new(10.0, 10.0), "a");
        assert!(window.is_visible());
        window.decorate = false;
        assert!(!window.is_visible());
    }
}
