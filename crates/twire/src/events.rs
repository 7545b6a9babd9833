//! Event batch wire format: decode contract for the runtime, encode
//! helper for backends and tests.
//!
//! A batch is a header followed by contiguous events in wire order. Event
//! `time_ms` is required to be monotonically non-decreasing within a
//! batch; the decoder additionally clamps across batches so downstream
//! consumers (chord timeouts, undo coalescing) never observe time going
//! backwards.

use crate::error::WireError;

const MAGIC: u32 = 0x5445_5631; // "TEV1"
pub(crate) const VERSION: u16 = 1;

const KIND_KEY: u8 = 1;
const KIND_TEXT: u8 = 2;
const KIND_MOUSE: u8 = 3;
const KIND_RESIZE: u8 = 4;
const KIND_PASTE: u8 = 5;
const KIND_TICK: u8 = 6;
const KIND_USER: u8 = 7;
const KIND_FATAL: u8 = 8;

/// Key transition carried on a key event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
    Repeat,
}

/// Mouse event sub-kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseKind {
    Move,
    Down,
    Up,
    Drag,
    Wheel,
}

impl MouseKind {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(MouseKind::Move),
            2 => Some(MouseKind::Down),
            3 => Some(MouseKind::Up),
            4 => Some(MouseKind::Drag),
            5 => Some(MouseKind::Wheel),
            _ => None,
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            MouseKind::Move => 1,
            MouseKind::Down => 2,
            MouseKind::Up => 3,
            MouseKind::Drag => 4,
            MouseKind::Wheel => 5,
        }
    }
}

/// Fatal condition codes surfaced by a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FatalCode {
    Unsupported,
    Platform,
    Internal,
}

impl FatalCode {
    fn from_u16(v: u16) -> Self {
        match v {
            1 => FatalCode::Unsupported,
            2 => FatalCode::Platform,
            _ => FatalCode::Internal,
        }
    }

    fn to_u16(self) -> u16 {
        match self {
            FatalCode::Unsupported => 1,
            FatalCode::Platform => 2,
            FatalCode::Internal => 3,
        }
    }
}

/// Kind-specific payload of a decoded engine event.
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    Key {
        key: u16,
        mods: u8,
        action: KeyAction,
    },
    Text {
        codepoint: u32,
    },
    Mouse {
        x: i32,
        y: i32,
        kind: MouseKind,
        mods: u8,
        buttons: u8,
        wheel_x: i32,
        wheel_y: i32,
    },
    Resize {
        cols: u16,
        rows: u16,
    },
    Paste {
        text: String,
    },
    Tick {
        dt_ms: Option<u32>,
    },
    User {
        tag: u32,
        payload: Vec<u8>,
    },
    Fatal {
        code: FatalCode,
        detail: String,
    },
}

/// One decoded event with its timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineEvent {
    pub time_ms: u64,
    pub kind: EventKind,
}

/// Stateful batch decoder. Keeps the last timestamp seen so `time_ms`
/// stays non-decreasing across batches.
#[derive(Debug, Default)]
pub struct EventDecoder {
    last_time_ms: u64,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a batch, enforcing the byte budget and clamping time.
    pub fn decode_batch(
        &mut self,
        bytes: &[u8],
        max_bytes: usize,
    ) -> Result<Vec<EngineEvent>, WireError> {
        if bytes.len() > max_bytes {
            return Err(WireError::BatchTooLarge {
                size: bytes.len(),
                limit: max_bytes,
            });
        }
        let mut r = Cursor { bytes, pos: 0 };
        let magic = r.take_u32()?;
        if magic != MAGIC {
            return Err(WireError::BadMagic {
                expected: MAGIC,
                found: magic,
            });
        }
        let version = r.take_u16()?;
        if version != VERSION {
            return Err(WireError::BadVersion {
                expected: VERSION,
                found: version,
            });
        }
        let count = r.take_u16()? as usize;
        let mut events = Vec::with_capacity(count);
        for _ in 0..count {
            let kind_tag = r.take_u8()?;
            let raw_time = r.take_u64()?;
            let time_ms = raw_time.max(self.last_time_ms);
            self.last_time_ms = time_ms;
            let kind = match kind_tag {
                KIND_KEY => {
                    let key = r.take_u16()?;
                    let mods = r.take_u8()?;
                    let action = match r.take_u8()? {
                        0 => KeyAction::Down,
                        1 => KeyAction::Up,
                        2 => KeyAction::Repeat,
                        other => return Err(WireError::UnknownTag(other)),
                    };
                    EventKind::Key { key, mods, action }
                }
                KIND_TEXT => EventKind::Text {
                    codepoint: r.take_u32()?,
                },
                KIND_MOUSE => {
                    let x = r.take_i32()?;
                    let y = r.take_i32()?;
                    let kind = MouseKind::from_byte(r.take_u8()?)
                        .ok_or(WireError::Truncated(r.pos))?;
                    let mods = r.take_u8()?;
                    let buttons = r.take_u8()?;
                    let wheel_x = r.take_i32()?;
                    let wheel_y = r.take_i32()?;
                    EventKind::Mouse {
                        x,
                        y,
                        kind,
                        mods,
                        buttons,
                        wheel_x,
                        wheel_y,
                    }
                }
                KIND_RESIZE => EventKind::Resize {
                    cols: r.take_u16()?,
                    rows: r.take_u16()?,
                },
                KIND_PASTE => EventKind::Paste {
                    text: r.take_string()?,
                },
                KIND_TICK => {
                    let has_dt = r.take_u8()? != 0;
                    let dt = r.take_u32()?;
                    EventKind::Tick {
                        dt_ms: has_dt.then_some(dt),
                    }
                }
                KIND_USER => {
                    let tag = r.take_u32()?;
                    let len = r.take_u32()? as usize;
                    let payload = r.take(len)?.to_vec();
                    EventKind::User { tag, payload }
                }
                KIND_FATAL => {
                    let code = FatalCode::from_u16(r.take_u16()?);
                    let detail = r.take_string()?;
                    EventKind::Fatal { code, detail }
                }
                other => return Err(WireError::UnknownTag(other)),
            };
            events.push(EngineEvent { time_ms, kind });
        }
        Ok(events)
    }
}

/// Encode side, used by shipped backends and by test harnesses to script
/// event streams.
#[derive(Debug, Default)]
pub struct EventBatchWriter {
    events: Vec<u8>,
    count: u16,
}

impl EventBatchWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    fn event(&mut self, kind: u8, time_ms: u64) {
        self.events.push(kind);
        self.events.extend_from_slice(&time_ms.to_le_bytes());
        self.count += 1;
    }

    pub fn key(&mut self, time_ms: u64, key: u16, mods: u8, action: KeyAction) -> &mut Self {
        self.event(KIND_KEY, time_ms);
        self.events.extend_from_slice(&key.to_le_bytes());
        self.events.push(mods);
        self.events.push(match action {
            KeyAction::Down => 0,
            KeyAction::Up => 1,
            KeyAction::Repeat => 2,
        });
        self
    }

    pub fn text(&mut self, time_ms: u64, codepoint: u32) -> &mut Self {
        self.event(KIND_TEXT, time_ms);
        self.events.extend_from_slice(&codepoint.to_le_bytes());
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn mouse(
        &mut self,
        time_ms: u64,
        x: i32,
        y: i32,
        kind: MouseKind,
        mods: u8,
        buttons: u8,
        wheel_x: i32,
        wheel_y: i32,
    ) -> &mut Self {
        self.event(KIND_MOUSE, time_ms);
        self.events.extend_from_slice(&x.to_le_bytes());
        self.events.extend_from_slice(&y.to_le_bytes());
        self.events.push(kind.to_byte());
        self.events.push(mods);
        self.events.push(buttons);
        self.events.extend_from_slice(&wheel_x.to_le_bytes());
        self.events.extend_from_slice(&wheel_y.to_le_bytes());
        self
    }

    pub fn resize(&mut self, time_ms: u64, cols: u16, rows: u16) -> &mut Self {
        self.event(KIND_RESIZE, time_ms);
        self.events.extend_from_slice(&cols.to_le_bytes());
        self.events.extend_from_slice(&rows.to_le_bytes());
        self
    }

    pub fn paste(&mut self, time_ms: u64, text: &str) -> &mut Self {
        self.event(KIND_PASTE, time_ms);
        self.events
            .extend_from_slice(&(text.len() as u32).to_le_bytes());
        self.events.extend_from_slice(text.as_bytes());
        self
    }

    pub fn tick(&mut self, time_ms: u64, dt_ms: Option<u32>) -> &mut Self {
        self.event(KIND_TICK, time_ms);
        self.events.push(u8::from(dt_ms.is_some()));
        self.events
            .extend_from_slice(&dt_ms.unwrap_or(0).to_le_bytes());
        self
    }

    pub fn user(&mut self, time_ms: u64, tag: u32, payload: &[u8]) -> &mut Self {
        self.event(KIND_USER, time_ms);
        self.events.extend_from_slice(&tag.to_le_bytes());
        self.events
            .extend_from_slice(&(payload.len() as u32).to_le_bytes());
        self.events.extend_from_slice(payload);
        self
    }

    pub fn fatal(&mut self, time_ms: u64, code: FatalCode, detail: &str) -> &mut Self {
        self.event(KIND_FATAL, time_ms);
        self.events.extend_from_slice(&code.to_u16().to_le_bytes());
        self.events
            .extend_from_slice(&(detail.len() as u32).to_le_bytes());
        self.events.extend_from_slice(detail.as_bytes());
        self
    }

    /// Finalizes the batch bytes and resets the writer.
    pub fn finish(&mut self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + self.events.len());
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&self.count.to_le_bytes());
        out.append(&mut self.events);
        self.count = 0;
        out
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.pos + n > self.bytes.len() {
            return Err(WireError::Truncated(self.pos));
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn take_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    fn take_u16(&mut self) -> Result<u16, WireError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn take_u32(&mut self) -> Result<u32, WireError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn take_u64(&mut self) -> Result<u64, WireError> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_le_bytes(arr))
    }

    fn take_i32(&mut self) -> Result<i32, WireError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn take_string(&mut self) -> Result<String, WireError> {
        let len = self.take_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| WireError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;

    const MAX: usize = 4 * 1024 * 1024;

    #[test]
    fn test_roundtrip_mixed_batch() {
        let mut w = EventBatchWriter::new();
        w.key(10, keys::TAB, 0, KeyAction::Down)
            .text(11, 'a' as u32)
            .mouse(12, 4, 2, MouseKind::Down, 0, 1, 0, 0)
            .resize(13, 120, 40)
            .tick(14, Some(16));
        let bytes = w.finish();
        let mut dec = EventDecoder::new();
        let events = dec.decode_batch(&bytes, MAX).unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(
            events[0].kind,
            EventKind::Key {
                key: keys::TAB,
                mods: 0,
                action: KeyAction::Down
            }
        );
        assert_eq!(events[4].kind, EventKind::Tick { dt_ms: Some(16) });
    }

    #[test]
    fn test_time_clamped_within_batch() {
        let mut w = EventBatchWriter::new();
        w.text(100, 'a' as u32).text(50, 'b' as u32);
        let bytes = w.finish();
        let mut dec = EventDecoder::new();
        let events = dec.decode_batch(&bytes, MAX).unwrap();
        assert_eq!(events[0].time_ms, 100);
        assert_eq!(events[1].time_ms, 100); // clamped up
    }

    #[test]
    fn test_time_clamped_across_batches() {
        let mut dec = EventDecoder::new();
        let mut w = EventBatchWriter::new();
        w.text(500, 'a' as u32);
        dec.decode_batch(&w.finish(), MAX).unwrap();
        w.text(200, 'b' as u32);
        let events = dec.decode_batch(&w.finish(), MAX).unwrap();
        assert_eq!(events[0].time_ms, 500);
    }

    #[test]
    fn test_batch_budget_enforced() {
        let mut w = EventBatchWriter::new();
        w.paste(0, &"x".repeat(128));
        let bytes = w.finish();
        let mut dec = EventDecoder::new();
        assert!(matches!(
            dec.decode_batch(&bytes, 64),
            Err(WireError::BatchTooLarge { .. })
        ));
    }

    #[test]
    fn test_truncated_batch_rejected() {
        let mut w = EventBatchWriter::new();
        w.text(1, 'a' as u32);
        let mut bytes = w.finish();
        bytes.truncate(bytes.len() - 2);
        let mut dec = EventDecoder::new();
        assert!(matches!(
            dec.decode_batch(&bytes, MAX),
            Err(WireError::Truncated(_))
        ));
    }

    #[test]
    fn test_fatal_roundtrip() {
        let mut w = EventBatchWriter::new();
        w.fatal(7, FatalCode::Platform, "no tty");
        let bytes = w.finish();
        let mut dec = EventDecoder::new();
        let events = dec.decode_batch(&bytes, MAX).unwrap();
        assert_eq!(
            events[0].kind,
            EventKind::Fatal {
                code: FatalCode::Platform,
                detail: "no tty".into()
            }
        );
    }
}
