//! Chorded keybindings.
//!
//! A binding is a space-separated token sequence (`ctrl+k ctrl+c`,
//! `g g`). The manager buffers pending keys; the buffer resets on a
//! non-matching key, a mouse click, a focus change, or after the chord
//! timeout. Timeouts are measured with event `time_ms`, keeping replays
//! deterministic.

use twire::keys;

use crate::error::{Result, RuntimeError};

/// Default pending-buffer reset window.
pub const CHORD_TIMEOUT_MS: u64 = 500;

/// One step of a chord: modifier bits plus a key code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyChord {
    pub mods: u8,
    pub key: u16,
}

#[derive(Clone, Debug)]
struct Binding {
    sequence: Vec<KeyChord>,
    tag: String,
}

/// Result of feeding one key into the manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChordOutcome {
    /// A binding fired; the tag is published as `Action::Command`.
    Matched(String),
    /// The key extended a pending sequence; consumed, nothing fired.
    Pending,
    /// No binding wants this key.
    NoMatch,
}

#[derive(Debug, Default)]
pub struct ChordManager {
    bindings: Vec<Binding>,
    pending: Vec<KeyChord>,
    deadline_ms: Option<u64>,
    timeout_ms: u64,
}

impl ChordManager {
    pub fn new() -> Self {
        Self {
            timeout_ms: CHORD_TIMEOUT_MS,
            ..Default::default()
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Registers a binding from a sequence string.
    pub fn bind(&mut self, sequence: &str, tag: impl Into<String>) -> Result<()> {
        let parsed: Option<Vec<KeyChord>> = sequence
            .split_whitespace()
            .map(|token| keys::parse_token(token).map(|(mods, key)| KeyChord { mods, key }))
            .collect();
        let parsed = parsed
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RuntimeError::invalid_props(format!("bad chord sequence `{sequence}`")))?;
        self.bindings.push(Binding {
            sequence: parsed,
            tag: tag.into(),
        });
        Ok(())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Clears the pending buffer (mouse click, focus change, ESC).
    pub fn reset(&mut self) {
        self.pending.clear();
        self.deadline_ms = None;
    }

    /// Feeds one key-down. `now_ms` is the event timestamp.
    pub fn on_key(&mut self, key: u16, mods: u8, now_ms: u64) -> ChordOutcome {
        if let Some(deadline) = self.deadline_ms {
            if now_ms > deadline {
                self.reset();
            }
        }
        let chord = KeyChord { mods, key };
        self.pending.push(chord);
        match self.match_pending() {
            Some(MatchState::Exact(tag)) => {
                self.reset();
                ChordOutcome::Matched(tag)
            }
            Some(MatchState::Prefix) => {
                self.deadline_ms = Some(now_ms + self.timeout_ms);
                ChordOutcome::Pending
            }
            None => {
                // A non-matching key clears the buffer; retry the key as
                // the start of a fresh sequence.
                let retried = self.pending.len() > 1;
                self.reset();
                if retried {
                    return self.on_key(key, mods, now_ms);
                }
                ChordOutcome::NoMatch
            }
        }
    }

    fn match_pending(&self) -> Option<MatchState> {
        let mut prefix = false;
        for binding in &self.bindings {
            if binding.sequence.len() < self.pending.len() {
                continue;
            }
            if binding.sequence[..self.pending.len()] == self.pending[..] {
                if binding.sequence.len() == self.pending.len() {
                    return Some(MatchState::Exact(binding.tag.clone()));
                }
                prefix = true;
            }
        }
        prefix.then_some(MatchState::Prefix)
    }
}

enum MatchState {
    Exact(String),
    Prefix,
}

#[cfg(test)]
mod tests {
    use super::*;
    use twire::keys::mods;

    fn g() -> u16 {
        keys::from_char('g').unwrap()
    }

    #[test]
    fn test_single_key_binding() {
        let mut mgr = ChordManager::new();
        mgr.bind("q", "quit").unwrap();
        assert_eq!(
            mgr.on_key(keys::from_char('q').unwrap(), 0, 0),
            ChordOutcome::Matched("quit".into())
        );
    }

    #[test]
    fn test_two_step_chord_within_window() {
        let mut mgr = ChordManager::new();
        mgr.bind("g g", "top").unwrap();
        assert_eq!(mgr.on_key(g(), 0, 100), ChordOutcome::Pending);
        assert_eq!(mgr.on_key(g(), 0, 400), ChordOutcome::Matched("top".into()));
    }

    #[test]
    fn test_chord_times_out_after_500ms() {
        let mut mgr = ChordManager::new();
        mgr.bind("g g", "top").unwrap();
        assert_eq!(mgr.on_key(g(), 0, 0), ChordOutcome::Pending);
        // Past the window: the second g starts a new pending sequence.
        assert_eq!(mgr.on_key(g(), 0, 501), ChordOutcome::Pending);
    }

    #[test]
    fn test_nonmatching_key_clears_and_retries() {
        let mut mgr = ChordManager::new();
        mgr.bind("g g", "top").unwrap();
        mgr.bind("x", "cut").unwrap();
        assert_eq!(mgr.on_key(g(), 0, 0), ChordOutcome::Pending);
        // x breaks the g-sequence but matches on its own.
        assert_eq!(
            mgr.on_key(keys::from_char('x').unwrap(), 0, 10),
            ChordOutcome::Matched("cut".into())
        );
        assert_eq!(mgr.pending_len(), 0);
    }

    #[test]
    fn test_reset_clears_pending() {
        let mut mgr = ChordManager::new();
        mgr.bind("g g", "top").unwrap();
        assert_eq!(mgr.on_key(g(), 0, 0), ChordOutcome::Pending);
        mgr.reset(); // e.g. an intervening click
        assert_eq!(mgr.on_key(g(), 0, 10), ChordOutcome::Pending);
    }

    #[test]
    fn test_modified_chord() {
        let mut mgr = ChordManager::new();
        mgr.bind("ctrl+k ctrl+c", "comment").unwrap();
        let k = keys::from_char('k').unwrap();
        let c = keys::from_char('c').unwrap();
        assert_eq!(mgr.on_key(k, mods::CTRL, 0), ChordOutcome::Pending);
        assert_eq!(
            mgr.on_key(c, mods::CTRL, 100),
            ChordOutcome::Matched("comment".into())
        );
    }

    #[test]
    fn test_bad_sequence_rejected() {
        let mut mgr = ChordManager::new();
        assert!(mgr.bind("", "x").is_err());
        assert!(mgr.bind("notakey", "x").is_err());
    }
}
