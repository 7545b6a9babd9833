//! ABI pins for the backend boundary.
//!
//! The runtime holds a fixed set of pins; a backend advertises its own in
//! its capability report. A mismatch is an `UNSUPPORTED` startup failure
//! with a diagnostic naming both sides, never a silent downgrade.

use std::fmt;

use crate::error::WireError;

/// Semantic version triple for the native engine ABI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// The pinned protocol versions a runtime/backend pair must agree on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbiPins {
    pub engine_abi: Version,
    pub drawlist_version: u16,
    pub event_batch_version: u16,
}

impl fmt::Display for AbiPins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "engine {} / drawlist v{} / events v{}",
            self.engine_abi, self.drawlist_version, self.event_batch_version
        )
    }
}

/// The pins this runtime build was compiled against.
pub const RUNTIME_PINS: AbiPins = AbiPins {
    engine_abi: Version::new(1, 2, 0),
    drawlist_version: 2,
    event_batch_version: 1,
};

impl AbiPins {
    /// Checks a backend's advertised pins against the runtime's.
    ///
    /// The engine ABI must match on major and minor; patch is free to
    /// drift. Wire versions must match exactly.
    pub fn check(&self, backend: &AbiPins) -> Result<(), WireError> {
        let engine_ok = self.engine_abi.major == backend.engine_abi.major
            && self.engine_abi.minor == backend.engine_abi.minor;
        if !engine_ok
            || self.drawlist_version != backend.drawlist_version
            || self.event_batch_version != backend.event_batch_version
        {
            return Err(WireError::Unsupported {
                expected: self.to_string(),
                found: backend.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_pins_pass() {
        assert!(RUNTIME_PINS.check(&RUNTIME_PINS).is_ok());
    }

    #[test]
    fn test_patch_drift_allowed() {
        let mut backend = RUNTIME_PINS;
        backend.engine_abi.patch += 3;
        assert!(RUNTIME_PINS.check(&backend).is_ok());
    }

    #[test]
    fn test_minor_mismatch_rejected_with_both_pins_named() {
        let mut backend = RUNTIME_PINS;
        backend.engine_abi.minor += 1;
        let err = RUNTIME_PINS.check(&backend).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(&RUNTIME_PINS.engine_abi.to_string()));
        assert!(msg.contains(&backend.engine_abi.to_string()));
    }

    #[test]
    fn test_drawlist_version_mismatch_rejected() {
        let mut backend = RUNTIME_PINS;
        backend.drawlist_version = 1;
        assert!(RUNTIME_PINS.check(&backend).is_err());
    }
}
