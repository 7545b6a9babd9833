//! Commit: VNode tree → instance tree.
//!
//! Identity rules (spec'd by the data model):
//!
//! 1. A child keeps its instance (and hook state) when (position, kind,
//!    key) match the previous frame; an explicit key overrides position.
//! 2. A mismatch tears the old subtree down in reverse declaration
//!    order; its retained hook cleanups are queued ahead of this cycle's
//!    new effects and run with error isolation.
//! 3. Composite renders run inside the commit with their hook cursor
//!    reset; queued effects come out in declaration order.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::{Result, RuntimeError};
use crate::hooks::{HookCx, Invalidate, PendingCleanup, PendingEffect};
use crate::instance::{IdAllocator, RuntimeInstance};
use crate::vnode::{NodeKind, VNode};

/// Mutable context threaded through one commit pass.
pub struct CommitCx<'a> {
    pub allocator: &'a mut IdAllocator,
    pub invalidate: Invalidate,
    pub pending_effects: Vec<PendingEffect>,
    pub pending_cleanups: Vec<PendingCleanup>,
}

impl<'a> CommitCx<'a> {
    pub fn new(allocator: &'a mut IdAllocator, invalidate: Invalidate) -> Self {
        Self {
            allocator,
            invalidate,
            pending_effects: Vec::new(),
            pending_cleanups: Vec::new(),
        }
    }
}

/// Commits a view tree against the previous frame's instance tree.
pub fn commit_vnode_tree(
    prev: Option<RuntimeInstance>,
    vnode: &VNode,
    cx: &mut CommitCx<'_>,
) -> Result<RuntimeInstance> {
    commit_node(prev, vnode, cx)
}

fn commit_node(
    prev: Option<RuntimeInstance>,
    vnode: &VNode,
    cx: &mut CommitCx<'_>,
) -> Result<RuntimeInstance> {
    let prev = match prev {
        Some(old) if old.matches(vnode) => Some(old),
        Some(old) => {
            teardown(old, cx);
            None
        }
        None => None,
    };

    let mut inst = match prev {
        Some(mut old) => {
            old.node = vnode.clone();
            old
        }
        None => RuntimeInstance::new(cx.allocator.allocate(), vnode.clone()),
    };

    if inst.kind == NodeKind::Composite {
        commit_composite(&mut inst, cx)?;
    } else {
        let prev_children = std::mem::take(&mut inst.children);
        inst.children = commit_children(prev_children, vnode.children(), cx)?;
    }
    Ok(inst)
}

fn commit_composite(inst: &mut RuntimeInstance, cx: &mut CommitCx<'_>) -> Result<()> {
    let VNode::Composite(props) = inst.node.clone() else {
        return Err(RuntimeError::internal("composite instance without composite node"));
    };
    let state = inst
        .composite
        .clone()
        .ok_or_else(|| RuntimeError::internal("composite instance without hook state"))?;

    let mut hook_cx = HookCx::new(&state, cx.invalidate.clone());
    let rendered = catch_unwind(AssertUnwindSafe(|| (props.render)(&mut hook_cx)));
    let rendered = match rendered {
        Ok(node) => node,
        Err(payload) => {
            let detail = panic_detail(&payload);
            log::error!("composite render threw: {detail}");
            return Err(RuntimeError::UserCode { detail });
        }
    };
    let (effects, cleanups) = hook_cx.end_render();
    cx.pending_cleanups.extend(cleanups);
    cx.pending_effects.extend(effects);

    let prev_child = inst.children.pop();
    // Any extra children are stale; a composite renders exactly one root.
    for extra in std::mem::take(&mut inst.children) {
        teardown(extra, cx);
    }
    let child = commit_node(prev_child, &rendered, cx)?;
    inst.children = vec![child];
    Ok(())
}

fn commit_children(
    prev_children: Vec<RuntimeInstance>,
    next: &[VNode],
    cx: &mut CommitCx<'_>,
) -> Result<Vec<RuntimeInstance>> {
    // Keyed previous children are claimed by key; the rest stay
    // positional. Option slots mark claimed entries.
    let mut by_key: HashMap<(NodeKind, String), usize> = HashMap::new();
    for (i, child) in prev_children.iter().enumerate() {
        if let Some(key) = &child.key {
            by_key.insert((child.kind, key.clone()), i);
        }
    }

    let mut pool: Vec<Option<RuntimeInstance>> = prev_children.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(next.len());

    for (position, vnode) in next.iter().enumerate() {
        let claimed = match vnode.key() {
            Some(key) => by_key
                .get(&(vnode.kind(), key.to_string()))
                .and_then(|&i| pool[i].take()),
            // Positional reuse only claims an unkeyed slot; a keyed
            // previous child stays in the pool for its key (or teardown).
            None => match pool.get_mut(position) {
                Some(slot) if slot.as_ref().is_some_and(|old| old.key.is_none()) => slot.take(),
                _ => None,
            },
        };
        out.push(commit_node(claimed, vnode, cx)?);
    }

    // Unclaimed previous children disappear this frame; tear down in
    // reverse declaration order.
    for old in pool.into_iter().flatten().rev() {
        teardown(old, cx);
    }
    Ok(out)
}

/// Tears down a subtree in reverse DFS order, queueing retained hook
/// cleanups. Queued order: deepest-last-child first, own slots reversed.
fn teardown(mut inst: RuntimeInstance, cx: &mut CommitCx<'_>) {
    for child in std::mem::take(&mut inst.children).into_iter().rev() {
        teardown(child, cx);
    }
    if let Some(state) = &inst.composite {
        for cleanup in state.borrow_mut().take_cleanups_reversed() {
            cx.pending_cleanups.push(PendingCleanup { run: cleanup });
        }
    }
}

fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
