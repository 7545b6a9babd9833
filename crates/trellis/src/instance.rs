//! The committed instance tree.
//!
//! Instances mirror the VNode tree but carry stable identity: a
//! process-monotonic [`InstanceId`] plus, for composite nodes, the hook
//! slot arena. Identity is determined by (parent, position, kind,
//! explicit key); commit keeps matching instances alive across frames.

use std::cell::RefCell;
use std::rc::Rc;

use crate::hooks::CompositeState;
use crate::vnode::{NodeKind, VNode};

pub type InstanceId = u64;

/// Monotonic instance id allocator. Never reuses ids within a process.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: InstanceId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> InstanceId {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// One committed node.
pub struct RuntimeInstance {
    pub id: InstanceId,
    pub kind: NodeKind,
    pub key: Option<String>,
    /// The committed VNode for this position (for composites, the
    /// composite node itself; its rendered output is the single child).
    pub node: VNode,
    pub children: Vec<RuntimeInstance>,
    pub composite: Option<Rc<RefCell<CompositeState>>>,
}

impl RuntimeInstance {
    pub fn new(id: InstanceId, node: VNode) -> Self {
        let kind = node.kind();
        let key = node.key().map(String::from);
        let composite = matches!(kind, NodeKind::Composite)
            .then(|| Rc::new(RefCell::new(CompositeState::new())));
        Self {
            id,
            kind,
            key,
            node,
            children: Vec::new(),
            composite,
        }
    }

    /// True when `vnode` occupies the same identity slot as this
    /// instance: same kind and same explicit key.
    pub fn matches(&self, vnode: &VNode) -> bool {
        self.kind == vnode.kind() && self.key.as_deref() == vnode.key()
    }

    /// The node that determines layout and rendering at this position:
    /// composites delegate to their rendered child.
    pub fn render_node(&self) -> &VNode {
        &self.node
    }

    /// Pre-order DFS visit over the instance tree.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a RuntimeInstance)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Counts instances in this subtree, including self.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(RuntimeInstance::count).sum::<usize>()
    }

    /// Whether any node in this subtree animates on ticks.
    pub fn has_animated(&self) -> bool {
        self.node.is_animated() || self.children.iter().any(RuntimeInstance::has_animated)
    }

    /// Finds an instance by widget id.
    pub fn find_by_widget_id(&self, id: &str) -> Option<&RuntimeInstance> {
        if self.node.widget_id() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_widget_id(id))
    }
}

impl std::fmt::Debug for RuntimeInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeInstance")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_is_monotonic() {
        let mut alloc = IdAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert!(b > a);
    }

    #[test]
    fn test_matches_on_kind_and_key() {
        let mut alloc = IdAllocator::new();
        let inst = RuntimeInstance::new(alloc.allocate(), VNode::text("a"));
        assert!(inst.matches(&VNode::text("b"))); // same kind, both unkeyed
        assert!(!inst.matches(&VNode::row(vec![])));
    }

    #[test]
    fn test_composite_gets_hook_state() {
        let mut alloc = IdAllocator::new();
        let node = VNode::composite(None, |_| VNode::Empty);
        let inst = RuntimeInstance::new(alloc.allocate(), node);
        assert!(inst.composite.is_some());
        let text = RuntimeInstance::new(alloc.allocate(), VNode::text("x"));
        assert!(text.composite.is_none());
    }
}
