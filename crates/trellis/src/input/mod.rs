//! Event routing: the central router, the chord manager, the input
//! editor, and the widget-local keyboard routers with their stores.

pub mod chords;
pub mod editor;
pub mod palette;
pub mod router;
pub mod table;
pub mod tree_nav;
pub mod vlist;

pub use chords::{ChordManager, ChordOutcome};
pub use editor::InputEditor;
pub use router::{RouterCx, route_engine_event};
pub use table::TableState;
pub use tree_nav::TreeState;
pub use vlist::VirtualListState;

use std::collections::HashMap;

/// Per-widget mutable state keyed by widget id. Mutated only on the
/// runtime task; caches inside invariant-check the identity of their
/// owning props so a new prop value invalidates them.
#[derive(Debug, Default)]
pub struct LocalStores {
    pub vlists: HashMap<String, VirtualListState>,
    pub tables: HashMap<String, TableState>,
    pub trees: HashMap<String, TreeState>,
    pub editors: HashMap<String, InputEditor>,
}

impl LocalStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops state for widgets no longer present in the committed tree.
    pub fn retain_ids(&mut self, alive: &dyn Fn(&str) -> bool) {
        self.vlists.retain(|id, _| alive(id));
        self.tables.retain(|id, _| alive(id));
        self.trees.retain(|id, _| alive(id));
        self.editors.retain(|id, _| alive(id));
    }
}
