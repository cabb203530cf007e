use std::collections::{HashMap, HashSet};

use crate::ir::StageNode;
use crate::layout::{LayoutHost, Rect, Size};

/// Host without a real rendering surface.
///
/// Nodes render exactly at their declared box times the applied scale. Tests
/// use the knobs below to simulate late layout, resizes and content growth.
#[derive(Debug, Clone)]
pub struct StaticHost {
    container: Option<Size>,
    scale: f32,
    boxes: HashMap<String, Rect>,
    withheld: HashSet<String>,
}

impl StaticHost {
    pub fn new(container: Size) -> Self {
        Self {
            container: Some(container),
            scale: 1.0,
            boxes: HashMap::new(),
            withheld: HashSet::new(),
        }
    }

    /// A host whose container has not been laid out yet.
    pub fn unmeasured() -> Self {
        Self {
            container: None,
            ..Self::new(Size::default())
        }
    }

    pub fn set_container(&mut self, container: Option<Size>) {
        self.container = container;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Keeps `id` unmeasurable until [`StaticHost::release`] is called.
    pub fn withhold(&mut self, id: impl Into<String>) {
        self.withheld.insert(id.into());
    }

    pub fn release(&mut self, id: &str) {
        self.withheld.remove(id);
    }

    /// Replaces the rendered logical box of a node, as if its content reflowed.
    pub fn relayout(&mut self, id: &str, rect: Rect) {
        if let Some(slot) = self.boxes.get_mut(id) {
            *slot = rect;
        }
    }
}

impl LayoutHost for StaticHost {
    type Handle = String;

    fn container_size(&self) -> Option<Size> {
        self.container.filter(|size| size.is_measurable())
    }

    fn measure(&self, handle: &String) -> Option<Rect> {
        if self.withheld.contains(handle) {
            return None;
        }
        self.boxes.get(handle).map(|rect| rect.scaled(self.scale))
    }

    fn place_node(&mut self, node: &StageNode, declared: Rect) -> String {
        self.boxes.insert(node.id.clone(), declared);
        node.id.clone()
    }

    fn remove_node(&mut self, handle: &String) {
        self.boxes.remove(handle);
    }

    fn apply_scale(&mut self, scale: f32) {
        self.scale = scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_scaled_boxes() {
        let mut host = StaticHost::new(Size::new(640.0, 360.0));
        let handle = host.place_node(
            &StageNode::new("user", 64.0, 240.0),
            Rect::new(64.0, 240.0, 220.0, 120.0),
        );
        host.apply_scale(0.5);
        assert_eq!(host.measure(&handle), Some(Rect::new(32.0, 120.0, 110.0, 60.0)));
        host.withhold("user");
        assert_eq!(host.measure(&handle), None);
        host.release("user");
        host.remove_node(&handle);
        assert_eq!(host.measure(&handle), None);
    }

    #[test]
    fn zero_sized_container_is_unmeasured() {
        let mut host = StaticHost::unmeasured();
        assert_eq!(host.container_size(), None);
        host.set_container(Some(Size::new(0.0, 100.0)));
        assert_eq!(host.container_size(), None);
    }
}
