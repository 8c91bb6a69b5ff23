//! Cached texture slots
//!
//! A slot holds at most one texture together with the key it was rendered
//! for. Replacing a texture stores the new handle before the old one is
//! destroyed, so a slot is never empty between two renders.

use tracing::trace;

use super::{Renderer, TextureId};

#[derive(Debug)]
pub struct TextureSlot<K> {
    entry: Option<(TextureId, K)>,
}

impl<K> Default for TextureSlot<K> {
    fn default() -> Self {
        Self { entry: None }
    }
}

impl<K: PartialEq> TextureSlot<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.entry.as_ref().map(|(texture, _)| *texture)
    }

    pub fn key(&self) -> Option<&K> {
        self.entry.as_ref().map(|(_, key)| key)
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    /// Holds a texture rendered for exactly `key`.
    pub fn is_fresh(&self, key: &K) -> bool {
        self.key() == Some(key)
    }

    pub fn replace(&mut self, renderer: &mut dyn Renderer, texture: TextureId, key: K) {
        if let Some((old, _)) = self.entry.replace((texture, key)) {
            trace!("Replacing texture {:?} with {:?}", old, texture);
            renderer.destroy_texture(old);
        }
    }

    pub fn release(&mut self, renderer: &mut dyn Renderer) {
        if let Some((texture, _)) = self.entry.take() {
            renderer.destroy_texture(texture);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, RecordingRenderer};

    #[test]
    fn test_replace_stores_new_before_freeing_old() {
        let mut renderer = RecordingRenderer::default();
        let mut slot = TextureSlot::new();

        slot.replace(&mut renderer, TextureId(1), 1.0);
        assert!(renderer.calls.is_empty());
        assert!(slot.is_fresh(&1.0));
        assert!(!slot.is_fresh(&2.0));

        slot.replace(&mut renderer, TextureId(2), 2.0);
        assert_eq!(slot.texture(), Some(TextureId(2)));
        assert_eq!(renderer.calls, vec![Call::Destroy(TextureId(1))]);
    }

    #[test]
    fn test_release_empties_slot_once() {
        let mut renderer = RecordingRenderer::default();
        let mut slot = TextureSlot::new();
        slot.replace(&mut renderer, TextureId(7), ());

        slot.release(&mut renderer);
        slot.release(&mut renderer);

        assert!(slot.is_empty());
        assert_eq!(renderer.calls, vec![Call::Destroy(TextureId(7))]);
    }
}
