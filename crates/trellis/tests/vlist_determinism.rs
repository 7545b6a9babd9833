//! Virtual list determinism: two independent replays of a seeded wheel
//! sequence produce identical scroll state, visible ranges, and
//! checkpoints.

use std::sync::Arc;

use trellis::input::vlist::{VirtualListState, route_virtual_list_wheel};
use trellis::props::VirtualListProps;

const ITEMS: usize = 100_000;
const VIEWPORT: i32 = 31;
const EVENTS: usize = 1_400;

/// Minimal xorshift so the sequence is reproducible without pulling in a
/// random-number crate.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Wheel notches in [-4, 4].
    fn wheel(&mut self) -> i32 {
        (self.next() % 9) as i32 - 4
    }
}

fn props() -> VirtualListProps {
    VirtualListProps {
        id: "big".into(),
        items: Arc::new((0..ITEMS).map(|i| format!("item {i}")).collect()),
        overscan: 4,
        item_height: 1,
        ..Default::default()
    }
}

fn run(seed: u64) -> (i32, u64, Vec<i32>) {
    let p = props();
    let mut state = VirtualListState::default();
    let mut rng = Rng(seed);
    let mut range_hash = 0xcbf2_9ce4_8422_2325u64;
    let mut checkpoints = Vec::new();
    for i in 0..EVENTS {
        let notches = rng.wheel();
        route_virtual_list_wheel(&mut state, &p, VIEWPORT, notches);
        let (start, end) = state.visible_range(&p, VIEWPORT);
        for v in [start as u64, end as u64, state.scroll_top as u64] {
            range_hash ^= v;
            range_hash = range_hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        if i % 100 == 0 {
            checkpoints.push(state.scroll_top);
        }
    }
    (state.scroll_top, range_hash, checkpoints)
}

#[test]
fn test_seeded_wheel_replay_is_identical() {
    let first = run(0x5eed);
    let second = run(0x5eed);
    assert_eq!(first, second);
}

#[test]
fn test_different_seeds_diverge() {
    // Sanity: the hash actually depends on the sequence.
    let a = run(1);
    let b = run(2);
    assert_ne!(a.1, b.1);
}

#[test]
fn test_scroll_stays_clamped_throughout() {
    let p = props();
    let mut state = VirtualListState::default();
    let mut rng = Rng(42);
    let max = ITEMS as i32 - VIEWPORT;
    for _ in 0..EVENTS {
        route_virtual_list_wheel(&mut state, &p, VIEWPORT, rng.wheel());
        assert!(state.scroll_top >= 0 && state.scroll_top <= max);
    }
}
