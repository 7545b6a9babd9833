//! Z-ordered overlays: the layer registry and the ESC-close stack.
//!
//! The registry is rebuilt from the committed tree every frame and
//! answers hit-testing and backdrop queries in z order. Open order for
//! ESC-close semantics is tracked separately by [`LayerStackState`],
//! since close order follows opening, not z.

use crate::geometry::Rect;
use crate::props::Backdrop;

/// One registered overlay layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub id: String,
    pub z_index: i32,
    pub rect: Rect,
    pub backdrop: Backdrop,
    pub modal: bool,
    pub close_on_escape: bool,
}

/// Result of a layer hit test.
#[derive(Debug, Default)]
pub struct LayerHit<'a> {
    pub layer: Option<&'a Layer>,
    pub blocked: bool,
    pub blocking_layer: Option<&'a Layer>,
}

/// Layers sorted by `(z_index asc, insertion asc)`; insertion order is
/// the stable tiebreaker and re-registration moves a layer to the tail
/// of its z bucket.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    layers: Vec<(Layer, u64)>,
    next_insertion: u64,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn register(&mut self, layer: Layer) {
        self.layers.retain(|(l, _)| l.id != layer.id);
        let insertion = self.next_insertion;
        self.next_insertion += 1;
        self.layers.push((layer, insertion));
        self.layers.sort_by_key(|(l, ins)| (l.z_index, *ins));
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().map(|(l, _)| l).find(|l| l.id == id)
    }

    /// Layers in ascending paint order.
    pub fn in_paint_order(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().map(|(l, _)| l)
    }

    /// Hit test top-down. The first containing layer wins; a modal above
    /// the hit (or above everything, when nothing contains the point)
    /// blocks input to whatever sits below it.
    pub fn hit_test_layers(&self, x: i32, y: i32) -> LayerHit<'_> {
        let hit_idx = self
            .layers
            .iter()
            .rposition(|(l, _)| l.rect.contains(x, y));
        let modal_idx = self.layers.iter().rposition(|(l, _)| l.modal);
        match (hit_idx, modal_idx) {
            (Some(h), Some(m)) if m > h => LayerHit {
                layer: None,
                blocked: true,
                blocking_layer: Some(&self.layers[m].0),
            },
            (Some(h), _) => LayerHit {
                layer: Some(&self.layers[h].0),
                blocked: false,
                blocking_layer: None,
            },
            (None, Some(m)) => LayerHit {
                layer: None,
                blocked: true,
                blocking_layer: Some(&self.layers[m].0),
            },
            (None, None) => LayerHit::default(),
        }
    }

    /// The highest modal layer, if any.
    pub fn topmost_modal(&self) -> Option<&Layer> {
        self.layers.iter().rev().map(|(l, _)| l).find(|l| l.modal)
    }

    /// Non-`None` backdrop layers in ascending z order.
    pub fn backdrops(&self) -> Vec<&Layer> {
        self.layers
            .iter()
            .map(|(l, _)| l)
            .filter(|l| l.backdrop != Backdrop::None)
            .collect()
    }
}

/// Open-order stack for ESC-close semantics, separate from z order.
#[derive(Debug, Default)]
pub struct LayerStackState {
    stack: Vec<(String, bool)>,
}

impl LayerStackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes (or re-pushes, moving to top) an open layer.
    pub fn push_layer(&mut self, id: impl Into<String>, close_on_escape: bool) {
        let id = id.into();
        self.stack.retain(|(x, _)| *x != id);
        self.stack.push((id, close_on_escape));
    }

    /// Removes a layer, returning whether it was present.
    pub fn pop_layer(&mut self, id: &str) -> bool {
        let before = self.stack.len();
        self.stack.retain(|(x, _)| x != id);
        self.stack.len() != before
    }

    /// Closes the topmost `close_on_escape` layer, skipping inert ones.
    /// Returns the closed layer's id.
    pub fn close_topmost_layer(&mut self) -> Option<String> {
        let at = self.stack.iter().rposition(|(_, closable)| *closable)?;
        Some(self.stack.remove(at).0)
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn top(&self) -> Option<&str> {
        self.stack.last().map(|(id, _)| id.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.stack.iter().any(|(x, _)| x == id)
    }

    /// Ids in open order, bottom first.
    pub fn ids(&self) -> Vec<String> {
        self.stack.iter().map(|(id, _)| id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(id: &str, z: i32, rect: Rect) -> Layer {
        Layer {
            id: id.into(),
            z_index: z,
            rect,
            backdrop: Backdrop::None,
            modal: false,
            close_on_escape: true,
        }
    }

    #[test]
    fn test_sorted_by_z_then_insertion() {
        let mut reg = LayerRegistry::new();
        reg.register(layer("b", 1, Rect::new(0, 0, 5, 5)));
        reg.register(layer("a", 0, Rect::new(0, 0, 5, 5)));
        reg.register(layer("c", 1, Rect::new(0, 0, 5, 5)));
        let order: Vec<_> = reg.in_paint_order().map(|l| l.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reregister_moves_to_bucket_tail() {
        let mut reg = LayerRegistry::new();
        reg.register(layer("a", 1, Rect::new(0, 0, 5, 5)));
        reg.register(layer("b", 1, Rect::new(0, 0, 5, 5)));
        reg.register(layer("a", 1, Rect::new(0, 0, 5, 5)));
        let order: Vec<_> = reg.in_paint_order().map(|l| l.id.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn test_hit_topmost_containing() {
        let mut reg = LayerRegistry::new();
        reg.register(layer("low", 0, Rect::new(0, 0, 10, 10)));
        reg.register(layer("high", 5, Rect::new(2, 2, 4, 4)));
        let hit = reg.hit_test_layers(3, 3);
        assert_eq!(hit.layer.unwrap().id, "high");
        let hit = reg.hit_test_layers(0, 0);
        assert_eq!(hit.layer.unwrap().id, "low");
    }

    #[test]
    fn test_modal_blocks_lower_layers_without_backdrop() {
        let mut reg = LayerRegistry::new();
        reg.register(layer("base", 0, Rect::new(0, 0, 20, 20)));
        let mut modal = layer("dialog", 10, Rect::new(5, 5, 4, 4));
        modal.modal = true;
        reg.register(modal);
        // Point inside base but outside the modal: blocked.
        let hit = reg.hit_test_layers(1, 1);
        assert!(hit.blocked);
        assert_eq!(hit.blocking_layer.unwrap().id, "dialog");
        // Point inside the modal itself: hit.
        let hit = reg.hit_test_layers(6, 6);
        assert!(!hit.blocked);
        assert_eq!(hit.layer.unwrap().id, "dialog");
    }

    #[test]
    fn test_backdrops_ascending() {
        let mut reg = LayerRegistry::new();
        let mut dim = layer("dim", 3, Rect::new(0, 0, 5, 5));
        dim.backdrop = Backdrop::Dim;
        let mut opaque = layer("opaque", 1, Rect::new(0, 0, 5, 5));
        opaque.backdrop = Backdrop::Opaque;
        reg.register(dim);
        reg.register(opaque);
        let ids: Vec<_> = reg.backdrops().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["opaque", "dim"]);
    }

    #[test]
    fn test_stack_close_skips_inert() {
        let mut stack = LayerStackState::new();
        stack.push_layer("closable", true);
        stack.push_layer("inert", false);
        assert_eq!(stack.close_topmost_layer().as_deref(), Some("closable"));
        assert_eq!(stack.close_topmost_layer(), None);
        assert!(!stack.is_empty()); // inert layer remains
    }

    #[test]
    fn test_repush_moves_to_top() {
        let mut stack = LayerStackState::new();
        stack.push_layer("a", true);
        stack.push_layer("b", true);
        stack.push_layer("a", true);
        assert_eq!(stack.top(), Some("a"));
        assert_eq!(stack.close_topmost_layer().as_deref(), Some("a"));
        assert_eq!(stack.close_topmost_layer().as_deref(), Some("b"));
    }
}
