//! Tree navigation: flattening, expand/collapse, and lazy loading.
//!
//! The flattened-node cache is reused while the node payload identity
//! and the expansion generation are stable. Lazy loads carry a monotonic
//! token; a later request for the same node supersedes the earlier one
//! and stale completions are discarded.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use twire::keys;

use crate::action::{Action, RouteOutcome};
use crate::props::{TreeNodeData, TreeProps};

/// One visible row of the flattened tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatNode {
    pub key: String,
    pub label: String,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
    pub loaded: bool,
    pub loading: bool,
}

#[derive(Clone, Debug, Default)]
struct FlatCache {
    nodes_ptr: usize,
    expanded_gen: u64,
    flat: Vec<FlatNode>,
}

/// Store entry for one tree widget.
#[derive(Clone, Debug, Default)]
pub struct TreeState {
    pub focused_key: Option<String>,
    pub scroll_top: i32,
    expanded: BTreeSet<String>,
    expanded_gen: u64,
    loading: BTreeMap<String, u64>,
    next_token: u64,
    cache: Option<FlatCache>,
}

impl TreeState {
    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.contains(key)
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.loading.contains_key(key)
    }

    fn set_expanded(&mut self, key: &str, on: bool) {
        let changed = if on {
            self.expanded.insert(key.to_string())
        } else {
            self.expanded.remove(key)
        };
        if changed {
            self.expanded_gen += 1;
        }
    }

    /// Begins a lazy load, superseding any in-flight load for the key.
    fn begin_load(&mut self, key: &str) -> u64 {
        self.next_token += 1;
        self.loading.insert(key.to_string(), self.next_token);
        self.next_token
    }

    /// Completes a lazy load. Returns false (and changes nothing) when
    /// the token was superseded by a newer request.
    pub fn complete_load(&mut self, key: &str, token: u64) -> bool {
        match self.loading.get(key) {
            Some(&current) if current == token => {
                self.loading.remove(key);
                self.set_expanded(key, true);
                true
            }
            _ => {
                log::debug!("stale tree load for `{key}` (token {token}) discarded");
                false
            }
        }
    }

    /// Read-only flattening for renderers: reuses the cache when valid,
    /// recomputes without storing otherwise.
    pub fn flat_rows(&self, props: &TreeProps) -> Vec<FlatNode> {
        let ptr = Arc::as_ptr(&props.nodes) as usize;
        if let Some(cache) = &self.cache {
            if cache.nodes_ptr == ptr && cache.expanded_gen == self.expanded_gen {
                return cache.flat.clone();
            }
        }
        let mut flat = Vec::new();
        for node in props.nodes.iter() {
            flatten_into(node, 0, &self.expanded, &self.loading, &mut flat);
        }
        flat
    }

    /// The flattened visible rows, cached while `(nodes identity,
    /// expansion generation)` are unchanged.
    pub fn flatten(&mut self, props: &TreeProps) -> Vec<FlatNode> {
        let ptr = Arc::as_ptr(&props.nodes) as usize;
        if let Some(cache) = &self.cache {
            if cache.nodes_ptr == ptr && cache.expanded_gen == self.expanded_gen {
                return cache.flat.clone();
            }
        }
        let mut flat = Vec::new();
        for node in props.nodes.iter() {
            flatten_into(node, 0, &self.expanded, &self.loading, &mut flat);
        }
        self.cache = Some(FlatCache {
            nodes_ptr: ptr,
            expanded_gen: self.expanded_gen,
            flat: flat.clone(),
        });
        flat
    }

    fn keep_visible(&mut self, index: usize, viewport_rows: i32) {
        let row = index as i32;
        if row < self.scroll_top {
            self.scroll_top = row;
        } else if row >= self.scroll_top + viewport_rows {
            self.scroll_top = row - viewport_rows + 1;
        }
        self.scroll_top = self.scroll_top.max(0);
    }
}

fn flatten_into(
    node: &TreeNodeData,
    depth: usize,
    expanded: &BTreeSet<String>,
    loading: &BTreeMap<String, u64>,
    out: &mut Vec<FlatNode>,
) {
    let is_expanded = expanded.contains(&node.key);
    out.push(FlatNode {
        key: node.key.clone(),
        label: node.label.clone(),
        depth,
        has_children: node.has_children || !node.children.is_empty(),
        expanded: is_expanded,
        loaded: node.loaded || !node.children.is_empty(),
        loading: loading.contains_key(&node.key),
    });
    if is_expanded {
        for child in &node.children {
            flatten_into(child, depth + 1, expanded, loading, out);
        }
    }
}

/// Routes a key-down into a focused tree.
pub fn route_tree_key(
    state: &mut TreeState,
    props: &TreeProps,
    viewport_rows: i32,
    key: u16,
) -> RouteOutcome {
    let flat = state.flatten(props);
    if flat.is_empty() {
        return RouteOutcome::none();
    }
    let at = state
        .focused_key
        .as_ref()
        .and_then(|k| flat.iter().position(|n| n.key == *k));

    match key {
        keys::UP | keys::DOWN => {
            let next = match (at, key) {
                (Some(i), keys::UP) => i.saturating_sub(1),
                (Some(i), _) => (i + 1).min(flat.len() - 1),
                (None, _) => 0,
            };
            state.focused_key = Some(flat[next].key.clone());
            state.keep_visible(next, viewport_rows);
            RouteOutcome::render()
        }
        keys::HOME => {
            state.focused_key = Some(flat[0].key.clone());
            state.keep_visible(0, viewport_rows);
            RouteOutcome::render()
        }
        keys::END => {
            let last = flat.len() - 1;
            state.focused_key = Some(flat[last].key.clone());
            state.keep_visible(last, viewport_rows);
            RouteOutcome::render()
        }
        keys::RIGHT => {
            let Some(i) = at else {
                return RouteOutcome::none();
            };
            let node = &flat[i];
            if !node.has_children || node.expanded {
                return RouteOutcome::none();
            }
            if props.lazy && !node.loaded {
                let token = state.begin_load(&node.key);
                return RouteOutcome::action(Action::TreeLoadChildren {
                    id: props.id.clone(),
                    key: node.key.clone(),
                    token,
                });
            }
            state.set_expanded(&node.key, true);
            RouteOutcome::action(Action::TreeExpanded {
                id: props.id.clone(),
                key: node.key.clone(),
            })
        }
        keys::LEFT => {
            let Some(i) = at else {
                return RouteOutcome::none();
            };
            let node = flat[i].clone();
            if node.expanded {
                state.set_expanded(&node.key, false);
                return RouteOutcome::action(Action::TreeCollapsed {
                    id: props.id.clone(),
                    key: node.key,
                });
            }
            // Collapsed leaf: move focus to the parent row.
            let parent = flat[..i].iter().rposition(|n| n.depth < node.depth);
            if let Some(p) = parent {
                state.focused_key = Some(flat[p].key.clone());
                state.keep_visible(p, viewport_rows);
                return RouteOutcome::render();
            }
            RouteOutcome::none()
        }
        keys::ENTER => {
            let Some(i) = at else {
                return RouteOutcome::none();
            };
            RouteOutcome::action(Action::TreeActivated {
                id: props.id.clone(),
                key: flat[i].key.clone(),
            })
        }
        _ => RouteOutcome::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(key: &str) -> TreeNodeData {
        TreeNodeData {
            key: key.into(),
            label: key.into(),
            ..Default::default()
        }
    }

    fn props() -> TreeProps {
        TreeProps {
            id: "tree".into(),
            nodes: Arc::new(vec![
                TreeNodeData {
                    key: "src".into(),
                    label: "src".into(),
                    children: vec![leaf("src/app.ts"), leaf("src/lib.ts")],
                    ..Default::default()
                },
                leaf("README.md"),
            ]),
            ..Default::default()
        }
    }

    #[test]
    fn test_flatten_respects_expansion() {
        let mut state = TreeState::default();
        let p = props();
        assert_eq!(state.flatten(&p).len(), 2);
        state.set_expanded("src", true);
        let flat = state.flatten(&p);
        assert_eq!(flat.len(), 4);
        assert_eq!(flat[1].key, "src/app.ts");
        assert_eq!(flat[1].depth, 1);
    }

    #[test]
    fn test_flat_cache_reused_until_invalidated() {
        let mut state = TreeState::default();
        let p = props();
        let a = state.flatten(&p);
        let b = state.flatten(&p);
        assert_eq!(a, b);
        // Expansion bumps the generation and recomputes.
        state.set_expanded("src", true);
        assert_eq!(state.flatten(&p).len(), 4);
    }

    #[test]
    fn test_arrow_navigation_and_expand() {
        let mut state = TreeState::default();
        let p = props();
        route_tree_key(&mut state, &p, 10, keys::DOWN);
        assert_eq!(state.focused_key.as_deref(), Some("src"));
        let out = route_tree_key(&mut state, &p, 10, keys::RIGHT);
        assert!(matches!(out.action, Some(Action::TreeExpanded { .. })));
        route_tree_key(&mut state, &p, 10, keys::DOWN);
        assert_eq!(state.focused_key.as_deref(), Some("src/app.ts"));
    }

    #[test]
    fn test_left_collapses_then_moves_to_parent() {
        let mut state = TreeState::default();
        let p = props();
        route_tree_key(&mut state, &p, 10, keys::DOWN); // focus src
        route_tree_key(&mut state, &p, 10, keys::RIGHT); // expand
        route_tree_key(&mut state, &p, 10, keys::DOWN); // into child
        let out = route_tree_key(&mut state, &p, 10, keys::LEFT);
        assert!(out.needs_render);
        assert_eq!(state.focused_key.as_deref(), Some("src"));
        let out = route_tree_key(&mut state, &p, 10, keys::LEFT);
        assert!(matches!(out.action, Some(Action::TreeCollapsed { .. })));
    }

    #[test]
    fn test_enter_activates() {
        let mut state = TreeState::default();
        let p = props();
        route_tree_key(&mut state, &p, 10, keys::DOWN);
        let out = route_tree_key(&mut state, &p, 10, keys::ENTER);
        assert_eq!(
            out.action,
            Some(Action::TreeActivated {
                id: "tree".into(),
                key: "src".into()
            })
        );
    }

    #[test]
    fn test_lazy_expand_requests_load_with_token() {
        let lazy = TreeProps {
            lazy: true,
            nodes: Arc::new(vec![TreeNodeData {
                key: "remote".into(),
                label: "remote".into(),
                has_children: true,
                loaded: false,
                ..Default::default()
            }]),
            id: "tree".into(),
            ..Default::default()
        };
        let mut state = TreeState::default();
        route_tree_key(&mut state, &lazy, 10, keys::DOWN);
        let out = route_tree_key(&mut state, &lazy, 10, keys::RIGHT);
        let Some(Action::TreeLoadChildren { token, .. }) = out.action else {
            panic!("expected load request");
        };
        assert!(state.is_loading("remote"));
        assert!(state.complete_load("remote", token));
        assert!(state.is_expanded("remote"));
    }

    #[test]
    fn test_stale_load_token_discarded() {
        let mut state = TreeState::default();
        let first = state.begin_load("k");
        let second = state.begin_load("k"); // supersedes
        assert!(!state.complete_load("k", first));
        assert!(!state.is_expanded("k"));
        assert!(state.complete_load("k", second));
        assert!(state.is_expanded("k"));
    }
}
