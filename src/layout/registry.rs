use std::collections::BTreeMap;

use crate::ir::StageNode;

use super::{NodeRects, Rect, Size};

/// Platform services the stage needs from whatever draws it.
///
/// Boxes are reported in device pixels relative to the top-left corner of the
/// scaled canvas. `None` means "not laid out yet".
pub trait LayoutHost {
    type Handle: Clone;

    fn container_size(&self) -> Option<Size>;

    fn measure(&self, handle: &Self::Handle) -> Option<Rect>;

    /// Creates the element for `node` at its declared logical box.
    fn place_node(&mut self, node: &StageNode, declared: Rect) -> Self::Handle;

    fn remove_node(&mut self, _handle: &Self::Handle) {}

    /// Called whenever the stage scale changes.
    fn apply_scale(&mut self, _scale: f32) {}
}

/// Node id to rendered element, plus the last measured logical rectangle.
#[derive(Debug, Clone)]
pub struct NodeRegistry<K> {
    handles: BTreeMap<String, K>,
    rects: NodeRects,
}

impl<K: Clone> NodeRegistry<K> {
    pub fn new() -> Self {
        Self {
            handles: BTreeMap::new(),
            rects: NodeRects::new(),
        }
    }

    /// Associates `id` with `handle`. A repeated id silently replaces the old
    /// handle; returns true when that happened.
    pub fn register(&mut self, id: impl Into<String>, handle: K) -> bool {
        let id = id.into();
        let replaced = self.handles.insert(id.clone(), handle).is_some();
        if replaced {
            tracing::debug!(node = %id, "node re-registered, latest handle wins");
        }
        replaced
    }

    pub fn unregister(&mut self, id: &str) {
        self.handles.remove(id);
        self.rects.remove(id);
    }

    pub fn clear(&mut self) {
        self.handles.clear();
        self.rects.clear();
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.handles.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.handles.keys().map(String::as_str)
    }

    pub fn handle(&self, id: &str) -> Option<&K> {
        self.handles.get(id)
    }

    pub fn handles(&self) -> impl Iterator<Item = &K> {
        self.handles.values()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Last measured box in logical units.
    pub fn rect(&self, id: &str) -> Option<Rect> {
        self.rects.get(id).copied()
    }

    pub fn rects(&self) -> &NodeRects {
        &self.rects
    }

    pub fn snapshot(&self) -> NodeRects {
        self.rects.clone()
    }

    /// Re-measures every registered node and divides by `scale`.
    ///
    /// Returns true when any rectangle changed.
    pub fn measure<H>(&mut self, host: &H, scale: f32) -> bool
    where
        H: LayoutHost<Handle = K>,
    {
        if !(scale.is_finite() && scale > 0.0) {
            return false;
        }
        let mut next = NodeRects::new();
        for (id, handle) in &self.handles {
            let Some(raw) = host.measure(handle) else {
                continue;
            };
            let rect = raw.unscale(scale);
            let finite = [rect.x, rect.y, rect.width, rect.height]
                .iter()
                .all(|v| v.is_finite());
            if !finite || rect.x < 0.0 || rect.y < 0.0 {
                continue;
            }
            next.insert(id.clone(), rect);
        }
        let changed = next != self.rects;
        self.rects = next;
        changed
    }
}

impl<K: Clone> Default for NodeRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}
