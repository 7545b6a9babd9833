//! Binary drawlist building and decoding.
//!
//! A drawlist is a little-endian byte buffer: a fixed header followed by
//! one record per drawing op. [`DrawlistBuilder`] is exclusively owned by
//! the frame that fills it and reused across frames via [`reset`]; a
//! [`build`] freezes the buffer into a byte slice and makes the builder
//! single-use until the next reset.
//!
//! [`reset`]: DrawlistBuilder::reset
//! [`build`]: DrawlistBuilder::build

use std::collections::HashMap;

use smallvec::SmallVec;
use tstyle::{AttrFlags, ResolvedStyle, Rgb, UnderlineKind};

use crate::error::{DrawlistError, WireError};

pub(crate) const MAGIC: u32 = 0x5444_4C31; // "TDL1"

const OP_CLEAR_TO: u8 = 0x01;
const OP_FILL_RECT: u8 = 0x02;
const OP_DRAW_TEXT: u8 = 0x03;
const OP_PUSH_CLIP: u8 = 0x04;
const OP_POP_CLIP: u8 = 0x05;
const OP_SET_CURSOR: u8 = 0x06;
const OP_HIDE_CURSOR: u8 = 0x07;
const OP_ADD_TEXT_RUN: u8 = 0x08;
const OP_DRAW_TEXT_RUN: u8 = 0x09;

/// Default byte budget for a single frame's drawlist.
pub const DEFAULT_MAX_BYTES: usize = 8 * 1024 * 1024;

/// Upper bound on deduplicated text-run blobs per frame.
const MAX_BLOBS: usize = 1024;

/// Cursor shape requested through the v2 cursor protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorShape {
    Block,
    Bar,
    Underline,
}

impl CursorShape {
    fn to_byte(self) -> u8 {
        match self {
            CursorShape::Block => 0,
            CursorShape::Bar => 1,
            CursorShape::Underline => 2,
        }
    }

    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(CursorShape::Block),
            1 => Some(CursorShape::Bar),
            2 => Some(CursorShape::Underline),
            _ => None,
        }
    }
}

/// One styled segment of a text-run blob.
#[derive(Clone, Debug, PartialEq)]
pub struct TextSegment {
    pub text: String,
    pub style: ResolvedStyle,
}

/// Builder over a linear op buffer.
pub struct DrawlistBuilder {
    buf: Vec<u8>,
    op_count: u32,
    clip_depth: u32,
    version: u16,
    max_bytes: usize,
    built: bool,
    error: Option<DrawlistError>,
    blob_index: HashMap<Vec<u8>, u32>,
    blob_count: u32,
}

impl DrawlistBuilder {
    pub fn new(version: u16) -> Self {
        let mut b = Self {
            buf: Vec::with_capacity(64 * 1024),
            op_count: 0,
            clip_depth: 0,
            version,
            max_bytes: DEFAULT_MAX_BYTES,
            built: false,
            error: None,
            blob_index: HashMap::new(),
            blob_count: 0,
        };
        b.write_header();
        b
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// The drawlist protocol version this builder emits.
    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn op_count(&self) -> u32 {
        self.op_count
    }

    pub fn clip_depth(&self) -> u32 {
        self.clip_depth
    }

    fn write_header(&mut self) {
        self.buf.extend_from_slice(&MAGIC.to_le_bytes());
        self.buf.extend_from_slice(&self.version.to_le_bytes());
        self.buf.extend_from_slice(&0u16.to_le_bytes());
        self.buf.extend_from_slice(&0u32.to_le_bytes()); // op count, patched in build()
    }

    fn guard(&mut self) -> bool {
        if self.built {
            self.error
                .get_or_insert(DrawlistError::Internal("op after build".into()));
            return false;
        }
        self.error.is_none()
    }

    fn op(&mut self, opcode: u8) {
        self.buf.push(opcode);
        self.op_count += 1;
    }

    fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_style(&mut self, style: &ResolvedStyle) {
        encode_style(&mut self.buf, style);
    }

    fn put_opt_style(&mut self, style: Option<&ResolvedStyle>) {
        match style {
            Some(s) => {
                self.buf.push(1);
                self.put_style(s);
            }
            None => self.buf.push(0),
        }
    }

    fn put_str(&mut self, s: &str) {
        self.put_u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub fn clear_to(&mut self, cols: u16, rows: u16, style: &ResolvedStyle) {
        if !self.guard() {
            return;
        }
        self.op(OP_CLEAR_TO);
        self.put_u16(cols);
        self.put_u16(rows);
        self.put_style(style);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, style: Option<&ResolvedStyle>) {
        if !self.guard() {
            return;
        }
        self.op(OP_FILL_RECT);
        self.put_i32(x);
        self.put_i32(y);
        self.put_i32(w);
        self.put_i32(h);
        self.put_opt_style(style);
    }

    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, style: Option<&ResolvedStyle>) {
        if !self.guard() {
            return;
        }
        self.op(OP_DRAW_TEXT);
        self.put_i32(x);
        self.put_i32(y);
        self.put_str(text);
        self.put_opt_style(style);
    }

    pub fn push_clip(&mut self, x: i32, y: i32, w: i32, h: i32) {
        if !self.guard() {
            return;
        }
        self.op(OP_PUSH_CLIP);
        self.put_i32(x);
        self.put_i32(y);
        self.put_i32(w);
        self.put_i32(h);
        self.clip_depth += 1;
    }

    /// Pops the innermost clip. Refused (and latched as an internal
    /// error) beneath depth zero.
    pub fn pop_clip(&mut self) -> bool {
        if !self.guard() {
            return false;
        }
        if self.clip_depth == 0 {
            log::warn!("drawlist: popClip beneath depth 0 refused");
            self.error = Some(DrawlistError::Internal("clip underflow".into()));
            return false;
        }
        self.op(OP_POP_CLIP);
        self.clip_depth -= 1;
        true
    }

    /// Emits the cursor op. Only valid for drawlist version >= 2; callers
    /// are expected to check capability first, so a v1 call is latched as
    /// an internal error.
    pub fn set_cursor(&mut self, x: i32, y: i32, shape: CursorShape, visible: bool, blink: bool) {
        if !self.guard() {
            return;
        }
        if self.version < 2 {
            self.error = Some(DrawlistError::Internal("setCursor requires v2".into()));
            return;
        }
        self.op(OP_SET_CURSOR);
        self.put_i32(x);
        self.put_i32(y);
        self.buf.push(shape.to_byte());
        self.buf.push(u8::from(visible));
        self.buf.push(u8::from(blink));
    }

    pub fn hide_cursor(&mut self) {
        if !self.guard() {
            return;
        }
        if self.version < 2 {
            self.error = Some(DrawlistError::Internal("hideCursor requires v2".into()));
            return;
        }
        self.op(OP_HIDE_CURSOR);
    }

    /// Registers a deduplicated text run and returns its index, or `None`
    /// when the builder declines (blob table full).
    pub fn add_text_run_blob(&mut self, segments: &[TextSegment]) -> Option<u32> {
        if !self.guard() {
            return None;
        }
        let mut payload = Vec::new();
        payload.extend_from_slice(&(segments.len() as u32).to_le_bytes());
        for seg in segments {
            payload.extend_from_slice(&(seg.text.len() as u32).to_le_bytes());
            payload.extend_from_slice(seg.text.as_bytes());
            encode_style(&mut payload, &seg.style);
        }
        if let Some(&idx) = self.blob_index.get(&payload) {
            return Some(idx);
        }
        if self.blob_index.len() >= MAX_BLOBS {
            return None;
        }
        let idx = self.blob_count;
        self.op(OP_ADD_TEXT_RUN);
        self.buf.extend_from_slice(&payload);
        self.blob_index.insert(payload, idx);
        self.blob_count += 1;
        Some(idx)
    }

    pub fn draw_text_run(&mut self, x: i32, y: i32, index: u32) {
        if !self.guard() {
            return;
        }
        self.op(OP_DRAW_TEXT_RUN);
        self.put_i32(x);
        self.put_i32(y);
        self.put_u32(index);
    }

    /// Finalizes the buffer and returns the frozen bytes.
    ///
    /// Fails with `TOO_LARGE` over the byte budget and `INTERNAL` for a
    /// latched builder error or unbalanced clips. After a successful
    /// build the builder refuses further ops until [`Self::reset`].
    pub fn build(&mut self) -> Result<&[u8], DrawlistError> {
        if let Some(err) = self.error.take() {
            self.error = Some(err.clone());
            return Err(err);
        }
        if self.clip_depth != 0 {
            return Err(DrawlistError::Internal(format!(
                "unbalanced clips: depth {} at build",
                self.clip_depth
            )));
        }
        if self.buf.len() > self.max_bytes {
            return Err(DrawlistError::TooLarge {
                size: self.buf.len(),
                limit: self.max_bytes,
            });
        }
        // Patch op count into the header.
        self.buf[8..12].copy_from_slice(&self.op_count.to_le_bytes());
        self.built = true;
        Ok(&self.buf)
    }

    /// Clears all ops and makes the builder reusable for the next frame.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.op_count = 0;
        self.clip_depth = 0;
        self.built = false;
        self.error = None;
        self.blob_index.clear();
        self.blob_count = 0;
        self.write_header();
    }
}

fn encode_style(buf: &mut Vec<u8>, style: &ResolvedStyle) {
    buf.extend_from_slice(&[style.fg.r, style.fg.g, style.fg.b]);
    buf.extend_from_slice(&[style.bg.r, style.bg.g, style.bg.b]);
    buf.extend_from_slice(&style.attrs.bits().to_le_bytes());
    buf.push(match style.underline_kind {
        None => 0,
        Some(UnderlineKind::Straight) => 1,
        Some(UnderlineKind::Double) => 2,
        Some(UnderlineKind::Curly) => 3,
        Some(UnderlineKind::Dotted) => 4,
        Some(UnderlineKind::Dashed) => 5,
    });
    match style.underline_color {
        Some(c) => {
            buf.push(1);
            buf.extend_from_slice(&[c.r, c.g, c.b]);
        }
        None => {
            buf.push(0);
            buf.extend_from_slice(&[0, 0, 0]);
        }
    }
}

/// A decoded drawing op.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    ClearTo {
        cols: u16,
        rows: u16,
        style: ResolvedStyle,
    },
    FillRect {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        style: Option<ResolvedStyle>,
    },
    DrawText {
        x: i32,
        y: i32,
        text: String,
        style: Option<ResolvedStyle>,
    },
    PushClip {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    },
    PopClip,
    SetCursor {
        x: i32,
        y: i32,
        shape: CursorShape,
        visible: bool,
        blink: bool,
    },
    HideCursor,
    AddTextRun {
        segments: Vec<TextSegment>,
    },
    DrawTextRun {
        x: i32,
        y: i32,
        index: u32,
    },
}

/// Decode side of the drawlist protocol, used by backends and tests.
pub struct DrawlistReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DrawlistReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<(Self, u16, u32), WireError> {
        let mut r = Self { bytes, pos: 0 };
        let magic = r.take_u32()?;
        if magic != MAGIC {
            return Err(WireError::BadMagic {
                expected: MAGIC,
                found: magic,
            });
        }
        let version = r.take_u16()?;
        if version == 0 || version > 2 {
            return Err(WireError::BadVersion {
                expected: 2,
                found: version,
            });
        }
        let _reserved = r.take_u16()?;
        let op_count = r.take_u32()?;
        Ok((r, version, op_count))
    }

    /// Decodes all ops in the buffer.
    pub fn decode(bytes: &'a [u8]) -> Result<Vec<DrawOp>, WireError> {
        let (mut r, _version, op_count) = Self::new(bytes)?;
        let mut ops = Vec::with_capacity(op_count as usize);
        // Balanced-clip sanity while decoding; a hostile or corrupt
        // buffer must not drive the painter's clip stack negative.
        let mut depth: SmallVec<[(); 16]> = SmallVec::new();
        while r.pos < r.bytes.len() {
            let opcode = r.take_u8()?;
            let op = match opcode {
                OP_CLEAR_TO => DrawOp::ClearTo {
                    cols: r.take_u16()?,
                    rows: r.take_u16()?,
                    style: r.take_style()?,
                },
                OP_FILL_RECT => DrawOp::FillRect {
                    x: r.take_i32()?,
                    y: r.take_i32()?,
                    w: r.take_i32()?,
                    h: r.take_i32()?,
                    style: r.take_opt_style()?,
                },
                OP_DRAW_TEXT => DrawOp::DrawText {
                    x: r.take_i32()?,
                    y: r.take_i32()?,
                    text: r.take_string()?,
                    style: r.take_opt_style()?,
                },
                OP_PUSH_CLIP => {
                    depth.push(());
                    DrawOp::PushClip {
                        x: r.take_i32()?,
                        y: r.take_i32()?,
                        w: r.take_i32()?,
                        h: r.take_i32()?,
                    }
                }
                OP_POP_CLIP => {
                    if depth.pop().is_none() {
                        return Err(WireError::Truncated(r.pos));
                    }
                    DrawOp::PopClip
                }
                OP_SET_CURSOR => {
                    let x = r.take_i32()?;
                    let y = r.take_i32()?;
                    let shape = CursorShape::from_byte(r.take_u8()?)
                        .ok_or(WireError::Truncated(r.pos))?;
                    let visible = r.take_u8()? != 0;
                    let blink = r.take_u8()? != 0;
                    DrawOp::SetCursor {
                        x,
                        y,
                        shape,
                        visible,
                        blink,
                    }
                }
                OP_HIDE_CURSOR => DrawOp::HideCursor,
                OP_ADD_TEXT_RUN => {
                    let count = r.take_u32()? as usize;
                    let mut segments = Vec::with_capacity(count.min(256));
                    for _ in 0..count {
                        let text = r.take_string()?;
                        let style = r.take_style()?;
                        segments.push(TextSegment { text, style });
                    }
                    DrawOp::AddTextRun { segments }
                }
                OP_DRAW_TEXT_RUN => DrawOp::DrawTextRun {
                    x: r.take_i32()?,
                    y: r.take_i32()?,
                    index: r.take_u32()?,
                },
                other => return Err(WireError::UnknownTag(other)),
            };
            ops.push(op);
        }
        Ok(ops)
    }

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

    fn take_i32(&mut self) -> Result<i32, WireError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn take_string(&mut self) -> Result<String, WireError> {
        let len = self.take_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| WireError::InvalidUtf8)
    }

    fn take_style(&mut self) -> Result<ResolvedStyle, WireError> {
        let b = self.take(13)?;
        let attrs = AttrFlags::from_bits_truncate(u16::from_le_bytes([b[6], b[7]]));
        let underline_kind = match b[8] {
            1 => Some(UnderlineKind::Straight),
            2 => Some(UnderlineKind::Double),
            3 => Some(UnderlineKind::Curly),
            4 => Some(UnderlineKind::Dotted),
            5 => Some(UnderlineKind::Dashed),
            _ => None,
        };
        let underline_color = if b[9] != 0 {
            Some(Rgb::new(b[10], b[11], b[12]))
        } else {
            None
        };
        Ok(ResolvedStyle {
            fg: Rgb::new(b[0], b[1], b[2]),
            bg: Rgb::new(b[3], b[4], b[5]),
            attrs,
            underline_kind,
            underline_color,
        })
    }

    fn take_opt_style(&mut self) -> Result<Option<ResolvedStyle>, WireError> {
        if self.take_u8()? != 0 {
            Ok(Some(self.take_style()?))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> ResolvedStyle {
        ResolvedStyle::new(Rgb::new(1, 2, 3), Rgb::new(4, 5, 6))
    }

    #[test]
    fn test_roundtrip_basic_ops() {
        let mut b = DrawlistBuilder::new(2);
        b.clear_to(80, 24, &style());
        b.push_clip(0, 0, 40, 10);
        b.draw_text(2, 1, "hello", Some(&style()));
        b.fill_rect(0, 0, 5, 1, None);
        assert!(b.pop_clip());
        b.set_cursor(3, 1, CursorShape::Bar, true, true);
        let bytes = b.build().unwrap().to_vec();
        let ops = DrawlistReader::decode(&bytes).unwrap();
        assert_eq!(ops.len(), 6);
        assert_eq!(
            ops[2],
            DrawOp::DrawText {
                x: 2,
                y: 1,
                text: "hello".into(),
                style: Some(style()),
            }
        );
    }

    #[test]
    fn test_identical_ops_identical_bytes() {
        let emit = |b: &mut DrawlistBuilder| {
            b.clear_to(10, 4, &style());
            b.draw_text(0, 0, "x", None);
        };
        let mut one = DrawlistBuilder::new(2);
        let mut two = DrawlistBuilder::new(2);
        emit(&mut one);
        emit(&mut two);
        assert_eq!(one.build().unwrap(), two.build().unwrap());
    }

    #[test]
    fn test_pop_below_zero_refused_and_fails_build() {
        let mut b = DrawlistBuilder::new(1);
        assert!(!b.pop_clip());
        assert!(matches!(b.build(), Err(DrawlistError::Internal(_))));
    }

    #[test]
    fn test_unbalanced_push_fails_build() {
        let mut b = DrawlistBuilder::new(1);
        b.push_clip(0, 0, 1, 1);
        assert!(matches!(b.build(), Err(DrawlistError::Internal(_))));
    }

    #[test]
    fn test_cursor_requires_v2() {
        let mut b = DrawlistBuilder::new(1);
        b.set_cursor(0, 0, CursorShape::Block, true, false);
        assert!(matches!(b.build(), Err(DrawlistError::Internal(_))));
    }

    #[test]
    fn test_too_large() {
        let mut b = DrawlistBuilder::new(1).with_max_bytes(64);
        b.draw_text(0, 0, &"a".repeat(256), None);
        assert!(matches!(b.build(), Err(DrawlistError::TooLarge { .. })));
    }

    #[test]
    fn test_build_is_single_use_until_reset() {
        let mut b = DrawlistBuilder::new(1);
        b.draw_text(0, 0, "a", None);
        assert!(b.build().is_ok());
        b.draw_text(0, 0, "b", None);
        assert!(b.build().is_err());
        b.reset();
        b.draw_text(0, 0, "c", None);
        assert!(b.build().is_ok());
        assert_eq!(b.op_count(), 1);
    }

    #[test]
    fn test_blob_dedup() {
        let mut b = DrawlistBuilder::new(2);
        let segs = vec![TextSegment {
            text: "run".into(),
            style: style(),
        }];
        let first = b.add_text_run_blob(&segs).unwrap();
        let second = b.add_text_run_blob(&segs).unwrap();
        assert_eq!(first, second);
        b.draw_text_run(0, 0, first);
        let bytes = b.build().unwrap().to_vec();
        let ops = DrawlistReader::decode(&bytes).unwrap();
        // One AddTextRun despite two registrations.
        let adds = ops
            .iter()
            .filter(|o| matches!(o, DrawOp::AddTextRun { .. }))
            .count();
        assert_eq!(adds, 1);
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let bytes = vec![0u8; 16];
        assert!(matches!(
            DrawlistReader::decode(&bytes),
            Err(WireError::BadMagic { .. })
        ));
    }
}
