//! Button registry
//!
//! The ordered button list shared by every bar. Built once from the config
//! and never mutated; bars keep a cheap clone of the same allocation.

use std::rc::Rc;

use crate::config::ButtonConfig;
use crate::render::Color;

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonDescriptor {
    pub size: f64,
    pub color: Color,
    /// Empty for no icon
    pub icon: String,
    pub command: String,
}

impl From<&ButtonConfig> for ButtonDescriptor {
    fn from(config: &ButtonConfig) -> Self {
        Self {
            size: config.size as f64,
            color: Color::from_argb(config.color),
            icon: config.icon.clone(),
            command: config.command.clone(),
        }
    }
}

/// Immutable, reference-counted list of buttons in layout order
#[derive(Debug, Clone, Default)]
pub struct ButtonRegistry(Rc<[ButtonDescriptor]>);

impl ButtonRegistry {
    pub fn new(buttons: Vec<ButtonDescriptor>) -> Self {
        Self(buttons.into())
    }

    pub fn from_config(buttons: &[ButtonConfig]) -> Self {
        Self(buttons.iter().map(ButtonDescriptor::from).collect())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ButtonDescriptor> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ButtonDescriptor> {
        self.0.get(index)
    }

    pub fn diameters(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|button| button.size)
    }

    pub fn total_size(&self) -> f64 {
        self.diameters().sum()
    }

    /// Same underlying table, not just equal contents.
    pub fn ptr_eq(&self, other: &ButtonRegistry) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(size: u32, icon: &str) -> ButtonConfig {
        ButtonConfig {
            size,
            color: 0xff000000,
            icon: icon.to_string(),
            command: format!("echo {}", size),
        }
    }

    #[test]
    fn test_registry_keeps_config_order() {
        let registry = ButtonRegistry::from_config(&[button(12, "x"), button(16, "")]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.diameters().collect::<Vec<_>>(), vec![12.0, 16.0]);
        assert_eq!(registry.total_size(), 28.0);
        assert_eq!(registry.get(1).map(|b| b.command.as_str()), Some("echo 16"));
        assert!(registry.get(2).is_none());
    }

    #[test]
    fn test_clones_share_storage() {
        let registry = ButtonRegistry::from_config(&[button(12, "x")]);
        let shared = registry.clone();
        assert!(registry.ptr_eq(&shared));

        let rebuilt = ButtonRegistry::from_config(&[button(12, "x")]);
        assert!(!registry.ptr_eq(&rebuilt));
    }
}
