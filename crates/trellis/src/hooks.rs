//! Hook state for composite nodes.
//!
//! Hook slots live in an arena on the instance's [`CompositeState`],
//! indexed by a cursor that resets at the start of every render. Slot
//! order must therefore be stable across renders of the same composite;
//! a type change in a slot is logged and the slot is replaced.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

/// A dependency value for `use_effect`/`use_memo`, compared by bit
/// equality: `NaN == NaN` and `+0 != -0` for floats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dep {
    Unit,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(u64),
    Str(Arc<str>),
}

impl Dep {
    pub fn f64(value: f64) -> Self {
        Dep::F64(value.to_bits())
    }

    pub fn str(value: impl AsRef<str>) -> Self {
        Dep::Str(Arc::from(value.as_ref()))
    }
}

impl From<i64> for Dep {
    fn from(v: i64) -> Self {
        Dep::I64(v)
    }
}

impl From<bool> for Dep {
    fn from(v: bool) -> Self {
        Dep::Bool(v)
    }
}

impl From<f64> for Dep {
    fn from(v: f64) -> Self {
        Dep::f64(v)
    }
}

/// Cleanup returned by an effect, retained until the effect re-fires or
/// the instance unmounts.
pub type Cleanup = Box<dyn FnOnce()>;

/// An effect body; runs after the commit's frame is acked.
pub type EffectFn = Box<dyn FnOnce() -> Option<Cleanup>>;

/// Shared invalidation flag set by state setters and consumed once per
/// render resolution by the scheduler.
#[derive(Clone, Default)]
pub struct Invalidate(Rc<Cell<bool>>);

impl Invalidate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.set(true);
    }

    /// Returns and clears the flag.
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }

    pub fn is_set(&self) -> bool {
        self.0.get()
    }
}

/// Setter half of `use_state`. Cloneable into effects and callbacks.
pub struct Setter<T> {
    cell: Rc<RefCell<T>>,
    invalidate: Invalidate,
    needs_render: Rc<Cell<bool>>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            invalidate: self.invalidate.clone(),
            needs_render: Rc::clone(&self.needs_render),
        }
    }
}

impl<T: PartialEq> Setter<T> {
    /// Stores a new value. Equal values neither store nor invalidate.
    pub fn set(&self, next: T) {
        let distinct = *self.cell.borrow() != next;
        if distinct {
            *self.cell.borrow_mut() = next;
            self.needs_render.set(true);
            self.invalidate.request();
        }
    }
}

impl<T: Clone> Setter<T> {
    pub fn get(&self) -> T {
        self.cell.borrow().clone()
    }
}

enum Slot {
    State(Rc<dyn Any>),
    Effect(EffectSlot),
    Memo { deps: Vec<Dep>, value: Rc<dyn Any> },
    Ref(Rc<dyn Any>),
}

struct EffectSlot {
    /// Deps from the last time the effect was queued. `None` = never
    /// queued; `Some(None)` = no dep list (fires every render).
    prev_deps: Option<Option<Vec<Dep>>>,
    /// Cleanup retained from the last completed run.
    cleanup: Option<Cleanup>,
}

/// Hook-slot arena for one composite instance.
#[derive(Default)]
pub struct CompositeState {
    slots: Vec<Slot>,
    cursor: usize,
    needs_render: Rc<Cell<bool>>,
}

impl CompositeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the hook cursor ahead of a render.
    pub fn begin_render(&mut self) {
        self.cursor = 0;
        self.needs_render.set(false);
    }

    pub fn needs_render(&self) -> bool {
        self.needs_render.get()
    }

    /// Takes every retained cleanup, in reverse declaration order, for
    /// unmount teardown.
    pub fn take_cleanups_reversed(&mut self) -> Vec<Cleanup> {
        let mut out = Vec::new();
        for slot in self.slots.iter_mut().rev() {
            if let Slot::Effect(effect) = slot {
                if let Some(cleanup) = effect.cleanup.take() {
                    out.push(cleanup);
                }
            }
        }
        out
    }

    /// Stores the cleanup returned by a completed effect run.
    pub(crate) fn store_cleanup(&mut self, slot: usize, cleanup: Option<Cleanup>) {
        if let Some(Slot::Effect(effect)) = self.slots.get_mut(slot) {
            effect.cleanup = cleanup;
        }
    }

    /// Takes the retained cleanup of one effect slot, if any.
    pub(crate) fn take_cleanup(&mut self, slot: usize) -> Option<Cleanup> {
        match self.slots.get_mut(slot) {
            Some(Slot::Effect(effect)) => effect.cleanup.take(),
            _ => None,
        }
    }
}

/// An effect queued during a render, to be run post-ack by the scheduler.
pub struct PendingEffect {
    pub state: Rc<RefCell<CompositeState>>,
    pub slot: usize,
    pub run: EffectFn,
}

/// A cleanup collected at commit time, run before the same cycle's new
/// effects.
pub struct PendingCleanup {
    pub run: Cleanup,
}

/// The hook API handed to composite render functions.
pub struct HookCx<'a> {
    state: &'a Rc<RefCell<CompositeState>>,
    invalidate: Invalidate,
    effects: Vec<PendingEffect>,
    cleanups: Vec<PendingCleanup>,
}

impl<'a> HookCx<'a> {
    pub(crate) fn new(state: &'a Rc<RefCell<CompositeState>>, invalidate: Invalidate) -> Self {
        state.borrow_mut().begin_render();
        Self {
            state,
            invalidate,
            effects: Vec::new(),
            cleanups: Vec::new(),
        }
    }

    /// Ends the render, yielding queued effects (declaration order) and
    /// cleanups of re-firing slots.
    pub(crate) fn end_render(self) -> (Vec<PendingEffect>, Vec<PendingCleanup>) {
        (self.effects, self.cleanups)
    }

    fn next_cursor(&self) -> usize {
        let mut inner = self.state.borrow_mut();
        let at = inner.cursor;
        inner.cursor += 1;
        at
    }

    /// Allocates (or revisits) a state slot.
    pub fn use_state<T, F>(&mut self, init: F) -> (T, Setter<T>)
    where
        T: Clone + PartialEq + 'static,
        F: FnOnce() -> T,
    {
        let at = self.next_cursor();
        let cell: Rc<RefCell<T>> = {
            let mut inner = self.state.borrow_mut();
            let existing = match inner.slots.get(at) {
                Some(Slot::State(any)) => any.clone().downcast::<RefCell<T>>().ok(),
                Some(_) => {
                    log::warn!("use_state: slot {at} changed hook type; replacing");
                    None
                }
                None => None,
            };
            match existing {
                Some(rc) => rc,
                None => {
                    let rc = Rc::new(RefCell::new(init()));
                    let slot = Slot::State(rc.clone() as Rc<dyn Any>);
                    if at < inner.slots.len() {
                        inner.slots[at] = slot;
                    } else {
                        inner.slots.push(slot);
                    }
                    rc
                }
            }
        };
        let value = cell.borrow().clone();
        let setter = Setter {
            cell,
            invalidate: self.invalidate.clone(),
            needs_render: self.state.borrow().needs_render.clone(),
        };
        (value, setter)
    }

    /// Registers an effect.
    ///
    /// `deps = None` fires after every render; `Some(vec![])` fires once;
    /// otherwise fires when any dep changed by bit equality. The previous
    /// invocation's retained cleanup is queued to run before the re-fire.
    pub fn use_effect<F>(&mut self, deps: Option<Vec<Dep>>, run: F)
    where
        F: FnOnce() -> Option<Cleanup> + 'static,
    {
        let at = self.next_cursor();
        let mut inner = self.state.borrow_mut();
        if at >= inner.slots.len() {
            inner.slots.push(Slot::Effect(EffectSlot {
                prev_deps: None,
                cleanup: None,
            }));
        } else if !matches!(inner.slots[at], Slot::Effect(_)) {
            log::warn!("use_effect: slot {at} changed hook type; replacing");
            inner.slots[at] = Slot::Effect(EffectSlot {
                prev_deps: None,
                cleanup: None,
            });
        }
        let Slot::Effect(effect) = &mut inner.slots[at] else {
            return;
        };
        let should_run = match (&effect.prev_deps, &deps) {
            (None, _) => true,            // never queued
            (Some(_), None) => true,      // no dep list: every render
            (Some(None), Some(_)) => true, // dep list appeared
            (Some(Some(prev)), Some(next)) => prev != next,
        };
        if !should_run {
            return;
        }
        effect.prev_deps = Some(deps);
        if let Some(cleanup) = effect.cleanup.take() {
            self.cleanups.push(PendingCleanup { run: cleanup });
        }
        drop(inner);
        self.effects.push(PendingEffect {
            state: Rc::clone(self.state),
            slot: at,
            run: Box::new(run),
        });
    }

    /// Memoizes a computed value against a dep list.
    pub fn use_memo<T, F>(&mut self, deps: Vec<Dep>, compute: F) -> Rc<T>
    where
        T: 'static,
        F: FnOnce() -> T,
    {
        let at = self.next_cursor();
        let mut inner = self.state.borrow_mut();
        if let Some(Slot::Memo { deps: prev, value }) = inner.slots.get(at) {
            if *prev == deps {
                if let Ok(hit) = value.clone().downcast::<T>() {
                    return hit;
                }
                log::warn!("use_memo: slot {at} changed value type; recomputing");
            }
        }
        let value: Rc<T> = Rc::new(compute());
        let slot = Slot::Memo {
            deps,
            value: value.clone() as Rc<dyn Any>,
        };
        if at < inner.slots.len() {
            inner.slots[at] = slot;
        } else {
            inner.slots.push(slot);
        }
        value
    }

    /// A mutable cell that survives renders without triggering them.
    pub fn use_ref<T, F>(&mut self, init: F) -> Rc<RefCell<T>>
    where
        T: 'static,
        F: FnOnce() -> T,
    {
        let at = self.next_cursor();
        let mut inner = self.state.borrow_mut();
        if let Some(Slot::Ref(any)) = inner.slots.get(at) {
            if let Ok(hit) = any.clone().downcast::<RefCell<T>>() {
                return hit;
            }
            log::warn!("use_ref: slot {at} changed value type; replacing");
        }
        let cell = Rc::new(RefCell::new(init()));
        let slot = Slot::Ref(cell.clone() as Rc<dyn Any>);
        if at < inner.slots.len() {
            inner.slots[at] = slot;
        } else {
            inner.slots.push(slot);
        }
        cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_cx<R>(
        state: &Rc<RefCell<CompositeState>>,
        invalidate: &Invalidate,
        f: impl FnOnce(&mut HookCx<'_>) -> R,
    ) -> (R, Vec<PendingEffect>, Vec<PendingCleanup>) {
        let mut cx = HookCx::new(state, invalidate.clone());
        let out = f(&mut cx);
        let (effects, cleanups) = cx.end_render();
        (out, effects, cleanups)
    }

    #[test]
    fn test_state_persists_across_renders() {
        let state = Rc::new(RefCell::new(CompositeState::new()));
        let invalidate = Invalidate::new();

        let ((v, setter), _, _) = with_cx(&state, &invalidate, |cx| cx.use_state(|| 1i32));
        assert_eq!(v, 1);
        setter.set(5);
        assert!(invalidate.take());

        let ((v, _), _, _) = with_cx(&state, &invalidate, |cx| cx.use_state(|| 1i32));
        assert_eq!(v, 5);
    }

    #[test]
    fn test_same_value_set_does_not_invalidate() {
        let state = Rc::new(RefCell::new(CompositeState::new()));
        let invalidate = Invalidate::new();
        let ((_, setter), _, _) = with_cx(&state, &invalidate, |cx| cx.use_state(|| 7i32));
        invalidate.take();
        setter.set(7);
        assert!(!invalidate.is_set());
    }

    #[test]
    fn test_effect_empty_deps_queues_once() {
        let state = Rc::new(RefCell::new(CompositeState::new()));
        let invalidate = Invalidate::new();

        let (_, effects, _) = with_cx(&state, &invalidate, |cx| {
            cx.use_effect(Some(vec![]), || None);
        });
        assert_eq!(effects.len(), 1);

        let (_, effects, _) = with_cx(&state, &invalidate, |cx| {
            cx.use_effect(Some(vec![]), || None);
        });
        assert!(effects.is_empty());
    }

    #[test]
    fn test_effect_refires_on_dep_change_with_prior_cleanup() {
        let state = Rc::new(RefCell::new(CompositeState::new()));
        let invalidate = Invalidate::new();

        let (_, effects, cleanups) = with_cx(&state, &invalidate, |cx| {
            cx.use_effect(Some(vec![Dep::I64(1)]), || Some(Box::new(|| {}) as Cleanup));
        });
        assert_eq!(effects.len(), 1);
        assert!(cleanups.is_empty());
        // Simulate the scheduler running the effect and storing its cleanup.
        for e in effects {
            let cleanup = (e.run)();
            e.state.borrow_mut().store_cleanup(e.slot, cleanup);
        }

        let (_, effects, cleanups) = with_cx(&state, &invalidate, |cx| {
            cx.use_effect(Some(vec![Dep::I64(2)]), || None);
        });
        assert_eq!(effects.len(), 1);
        assert_eq!(cleanups.len(), 1); // previous cleanup flushes before re-fire
    }

    #[test]
    fn test_dep_bit_equality_for_floats() {
        assert_eq!(Dep::f64(f64::NAN), Dep::f64(f64::NAN));
        assert_ne!(Dep::f64(0.0), Dep::f64(-0.0));
    }

    #[test]
    fn test_memo_recomputes_only_on_dep_change() {
        let state = Rc::new(RefCell::new(CompositeState::new()));
        let invalidate = Invalidate::new();
        let runs = Rc::new(Cell::new(0));

        for dep in [1i64, 1, 2] {
            let runs = runs.clone();
            with_cx(&state, &invalidate, move |cx| {
                cx.use_memo(vec![Dep::I64(dep)], move || {
                    runs.set(runs.get() + 1);
                    dep * 10
                })
            });
        }
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_unmount_cleanups_in_reverse_order() {
        let state = Rc::new(RefCell::new(CompositeState::new()));
        let invalidate = Invalidate::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let (_, effects, _) = {
            let order = order.clone();
            with_cx(&state, &invalidate, move |cx| {
                for i in 0..3 {
                    let order = order.clone();
                    cx.use_effect(Some(vec![]), move || {
                        Some(Box::new(move || order.borrow_mut().push(i)) as Cleanup)
                    });
                }
            })
        };
        for e in effects {
            let cleanup = (e.run)();
            e.state.borrow_mut().store_cleanup(e.slot, cleanup);
        }
        for cleanup in state.borrow_mut().take_cleanups_reversed() {
            cleanup();
        }
        assert_eq!(*order.borrow(), vec![2, 1, 0]);
    }
}
