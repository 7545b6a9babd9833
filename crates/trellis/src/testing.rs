//! Test utilities: an in-memory backend with scripted events and
//! controllable acks, a drawlist rasterizer, and headless rendering
//! without the event loop.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Semaphore, mpsc};
use tstyle::StyleCache;
use twire::{DrawOp, DrawlistBuilder, DrawlistReader, EventBatchWriter, RUNTIME_PINS};

use crate::backend::{RuntimeBackend, TerminalCaps};
use crate::commit::{CommitCx, commit_vnode_tree};
use crate::error::{Result, RuntimeError};
use crate::focus::FocusState;
use crate::geometry::{Rect, Size};
use crate::hooks::Invalidate;
use crate::input::LocalStores;
use crate::instance::IdAllocator;
use crate::layout::layout_tree;
use crate::render::{RenderParams, render_to_drawlist};
use crate::vnode::VNode;

/// In-memory backend: frames are recorded, events are scripted through a
/// [`TestBackendHandle`], and acks can be withheld to exercise
/// backpressure.
pub struct TestBackend {
    cols: u16,
    rows: u16,
    auto_ack: bool,
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
    acks: Arc<Semaphore>,
    batch_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    batch_tx: mpsc::UnboundedSender<Vec<u8>>,
}

/// Test-side control handle for a [`TestBackend`].
pub struct TestBackendHandle {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
    acks: Arc<Semaphore>,
    batch_tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl TestBackend {
    pub fn new(cols: u16, rows: u16) -> (Self, TestBackendHandle) {
        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        let frames = Arc::new(Mutex::new(Vec::new()));
        let acks = Arc::new(Semaphore::new(0));
        let backend = Self {
            cols,
            rows,
            auto_ack: true,
            frames: frames.clone(),
            acks: acks.clone(),
            batch_rx,
            batch_tx: batch_tx.clone(),
        };
        let handle = TestBackendHandle {
            frames,
            acks,
            batch_tx,
        };
        (backend, handle)
    }

    /// Withhold acks until the test calls [`TestBackendHandle::ack`].
    pub fn manual_ack(mut self) -> Self {
        self.auto_ack = false;
        self
    }
}

impl TestBackendHandle {
    /// Scripts one wire-encoded event batch.
    pub fn push_events(&self, build: impl FnOnce(&mut EventBatchWriter)) {
        let mut writer = EventBatchWriter::new();
        build(&mut writer);
        let _ = self.batch_tx.send(writer.finish());
    }

    /// Signals backend shutdown (the app loop exits cleanly).
    pub fn close(&self) {
        let _ = self.batch_tx.send(Vec::new());
    }

    /// Releases one withheld frame ack.
    pub fn ack(&self) {
        self.acks.add_permits(1);
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.frames.lock().ok().and_then(|f| f.last().cloned())
    }
}

#[async_trait]
impl RuntimeBackend for TestBackend {
    async fn start(&mut self) -> Result<()> {
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn dispose(&mut self) {}

    async fn request_frame(&mut self, bytes: &[u8]) -> Result<()> {
        if let Ok(mut frames) = self.frames.lock() {
            frames.push(bytes.to_vec());
        }
        if !self.auto_ack {
            let permit = self
                .acks
                .acquire()
                .await
                .map_err(|_| RuntimeError::internal("test backend acks closed"))?;
            permit.forget();
        }
        Ok(())
    }

    async fn poll_events(&mut self) -> Result<Vec<u8>> {
        // `None` (all senders dropped) doubles as shutdown.
        Ok(self.batch_rx.recv().await.unwrap_or_default())
    }

    fn post_user_event(&self, batch: Vec<u8>) {
        let _ = self.batch_tx.send(batch);
    }

    async fn caps(&self) -> Result<TerminalCaps> {
        Ok(TerminalCaps {
            pins: RUNTIME_PINS,
            cols: self.cols,
            rows: self.rows,
            max_event_bytes: 1 << 20,
            fps_cap: 60,
        })
    }
}

/// A character grid replayed from a drawlist, for assertions on frame
/// content.
pub struct Raster {
    cols: usize,
    rows: usize,
    cells: Vec<char>,
}

impl Raster {
    pub fn line(&self, y: usize) -> String {
        if y >= self.rows {
            return String::new();
        }
        self.cells[y * self.cols..(y + 1) * self.cols]
            .iter()
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    pub fn to_text(&self) -> String {
        (0..self.rows)
            .map(|y| self.line(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        (0..self.rows).any(|y| self.line(y).contains(needle))
    }
}

/// Replays drawlist bytes into a [`Raster`].
pub fn rasterize(bytes: &[u8]) -> Result<Raster> {
    let ops = DrawlistReader::decode(bytes).map_err(RuntimeError::from)?;
    let mut cols = 0usize;
    let mut rows = 0usize;
    // The clear op establishes the grid.
    for op in &ops {
        if let DrawOp::ClearTo { cols: c, rows: r, .. } = op {
            cols = *c as usize;
            rows = *r as usize;
        }
    }
    let mut cells = vec![' '; cols * rows];
    let mut clip_stack: Vec<Rect> = Vec::new();
    let full = Rect::new(0, 0, cols as i32, rows as i32);
    let mut blobs: Vec<Vec<(String, ())>> = Vec::new();

    let clip_of = |stack: &Vec<Rect>| stack.last().copied().unwrap_or(full);
    let put_text = |cells: &mut Vec<char>, clip: Rect, x: i32, y: i32, text: &str| {
        if y < 0 || y >= rows as i32 || y < clip.y || y >= clip.bottom() {
            return;
        }
        let mut cx = x;
        for ch in text.chars() {
            if cx >= clip.x && cx < clip.right() && cx >= 0 && (cx as usize) < cols {
                cells[y as usize * cols + cx as usize] = ch;
            }
            cx += 1;
        }
    };

    for op in &ops {
        match op {
            DrawOp::ClearTo { .. } => {
                for c in cells.iter_mut() {
                    *c = ' ';
                }
            }
            DrawOp::FillRect { x, y, w, h, .. } => {
                let clip = clip_of(&clip_stack);
                let rect = Rect::new(*x, *y, *w, *h).intersection(&clip).intersection(&full);
                for yy in rect.y..rect.bottom() {
                    for xx in rect.x..rect.right() {
                        cells[yy as usize * cols + xx as usize] = ' ';
                    }
                }
            }
            DrawOp::DrawText { x, y, text, .. } => {
                let clip = clip_of(&clip_stack);
                put_text(&mut cells, clip, *x, *y, text);
            }
            DrawOp::PushClip { x, y, w, h } => {
                let next = Rect::new(*x, *y, *w, *h).intersection(&clip_of(&clip_stack));
                clip_stack.push(next);
            }
            DrawOp::PopClip => {
                clip_stack.pop();
            }
            DrawOp::AddTextRun { segments } => {
                blobs.push(segments.iter().map(|s| (s.text.clone(), ())).collect());
            }
            DrawOp::DrawTextRun { x, y, index } => {
                if let Some(segments) = blobs.get(*index as usize) {
                    let run: String = segments.iter().map(|(t, ())| t.as_str()).collect();
                    let clip = clip_of(&clip_stack);
                    put_text(&mut cells, clip, *x, *y, &run);
                }
            }
            DrawOp::SetCursor { .. } | DrawOp::HideCursor => {}
        }
    }
    Ok(Raster { cols, rows, cells })
}

/// Renders a view once, headless, with default theme and empty focus.
pub fn render_view(view: &VNode, viewport: Size) -> Result<Vec<u8>> {
    let mut allocator = IdAllocator::new();
    let mut cx = CommitCx::new(&mut allocator, Invalidate::new());
    let root = commit_vnode_tree(None, view, &mut cx)?;
    let layout = layout_tree(&root, viewport)?;
    let stores = LocalStores::new();
    let focus = FocusState::default();
    let params = RenderParams {
        root: &root,
        layout: &layout,
        viewport,
        focus: &focus,
        stores: &stores,
        theme: tstyle::presets::dark(),
        tick_ms: 0,
        damage: None,
    };
    let mut builder = DrawlistBuilder::new(2);
    let mut cache = StyleCache::new();
    render_to_drawlist(&params, &mut builder, &mut cache)?;
    Ok(builder.build()?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_view_and_rasterize() {
        let view = VNode::column(vec![VNode::text("hello"), VNode::button("b", "Go")]);
        let bytes = render_view(&view, Size::new(20, 4)).unwrap();
        let raster = rasterize(&bytes).unwrap();
        assert_eq!(raster.line(0), "hello");
        assert_eq!(raster.line(1), "[ Go ]");
        assert!(raster.contains("Go"));
    }

    #[test]
    fn test_raster_respects_clips() {
        use crate::props::{ContainerProps, Overflow};
        let view = VNode::Column(ContainerProps {
            overflow: Overflow::Hidden,
            children: vec![VNode::text("wide text that overflows")],
            ..Default::default()
        });
        let bytes = render_view(&view, Size::new(8, 2)).unwrap();
        let raster = rasterize(&bytes).unwrap();
        assert_eq!(raster.line(0), "wide tex");
    }
}
