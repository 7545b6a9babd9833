//! Text attribute flags and tri-state overrides.

use bitflags::bitflags;

bitflags! {
    /// Boolean text attributes carried by a resolved style.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AttrFlags: u16 {
        const BOLD          = 1 << 0;
        const DIM           = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const INVERSE       = 1 << 4;
        const STRIKETHROUGH = 1 << 5;
        const OVERLINE      = 1 << 6;
        const BLINK         = 1 << 7;
    }
}

/// All attribute bits, in encoding order.
pub(crate) const ATTR_ORDER: [AttrFlags; 8] = [
    AttrFlags::BOLD,
    AttrFlags::DIM,
    AttrFlags::ITALIC,
    AttrFlags::UNDERLINE,
    AttrFlags::INVERSE,
    AttrFlags::STRIKETHROUGH,
    AttrFlags::OVERLINE,
    AttrFlags::BLINK,
];

/// Tri-state attribute overrides: each attribute is either untouched,
/// forced off, or forced on.
///
/// `mentioned` records which attributes the override speaks about at all;
/// `values` records the forced value for the mentioned ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TriAttrs {
    mentioned: AttrFlags,
    values: AttrFlags,
}

impl TriAttrs {
    pub fn set(&mut self, attr: AttrFlags, on: bool) {
        self.mentioned |= attr;
        if on {
            self.values |= attr;
        } else {
            self.values &= !attr;
        }
    }

    pub fn with(mut self, attr: AttrFlags, on: bool) -> Self {
        self.set(attr, on);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.mentioned.is_empty()
    }

    /// Applies the override on top of `base`.
    pub fn apply(&self, base: AttrFlags) -> AttrFlags {
        (base & !self.mentioned) | (self.values & self.mentioned)
    }

    /// Packs the tri-state into 16 bits: two bits per attribute,
    /// `0b00` untouched, `0b10` forced off, `0b11` forced on.
    ///
    /// Used as the merge-cache key for color-free overrides.
    pub fn encode(&self) -> u16 {
        let mut out: u16 = 0;
        for (i, attr) in ATTR_ORDER.iter().enumerate() {
            let pair = if !self.mentioned.contains(*attr) {
                0b00
            } else if self.values.contains(*attr) {
                0b11
            } else {
                0b10
            };
            out |= pair << (i * 2);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_forces_on_and_off() {
        let mut tri = TriAttrs::default();
        tri.set(AttrFlags::BOLD, true);
        tri.set(AttrFlags::DIM, false);
        let base = AttrFlags::DIM | AttrFlags::ITALIC;
        let out = tri.apply(base);
        assert!(out.contains(AttrFlags::BOLD));
        assert!(!out.contains(AttrFlags::DIM));
        assert!(out.contains(AttrFlags::ITALIC)); // untouched
    }

    #[test]
    fn test_encode_distinguishes_tri_states() {
        let untouched = TriAttrs::default();
        let off = TriAttrs::default().with(AttrFlags::BOLD, false);
        let on = TriAttrs::default().with(AttrFlags::BOLD, true);
        assert_eq!(untouched.encode(), 0);
        assert_ne!(off.encode(), on.encode());
        assert_ne!(off.encode(), untouched.encode());
    }

    #[test]
    fn test_encode_uses_two_bits_per_attr() {
        let blink = TriAttrs::default().with(AttrFlags::BLINK, true);
        assert_eq!(blink.encode(), 0b11 << 14);
    }
}
