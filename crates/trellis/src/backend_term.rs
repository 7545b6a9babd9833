//! Reference terminal backend over crossterm.
//!
//! Decodes drawlists onto an in-memory cell grid and flushes it with
//! minimal attribute churn; encodes crossterm events into wire batches.
//! The real production engine lives out of process; this backend exists
//! so the runtime has one shipped implementation of the boundary trait.

use std::io::{Stdout, Write, stdout};
use std::time::Instant;

use async_trait::async_trait;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEventKind,
    KeyModifiers, MouseButton, MouseEventKind,
};
use crossterm::style::{
    Attribute, Color, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::{cursor, execute, queue, terminal};
use futures::StreamExt;
use tokio::sync::mpsc;
use tstyle::{AttrFlags, ResolvedStyle, Rgb};
use twire::events::{EventBatchWriter, KeyAction, MouseKind};
use twire::{DrawOp, DrawlistReader, RUNTIME_PINS, keys};

use crate::backend::{RuntimeBackend, TerminalCaps, TerminalProfile};
use crate::error::{Result, RuntimeError};
use crate::geometry::Rect;

const TERM_MAX_EVENT_BYTES: u32 = 1 << 20;
const TERM_FPS_CAP: u16 = 60;
/// Tick cadence emitted alongside input events.
const TICK_MS: u64 = 100;

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    ch: char,
    style: ResolvedStyle,
}

/// Crossterm-backed implementation of [`RuntimeBackend`].
pub struct TermBackend {
    out: Stdout,
    cols: u16,
    rows: u16,
    grid: Vec<Cell>,
    batch_rx: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
    batch_tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    reader: Option<tokio::task::JoinHandle<()>>,
    pending_cursor: Option<(i32, i32, bool)>,
    started: bool,
}

impl TermBackend {
    pub fn new() -> Result<Self> {
        if !crossterm::tty::IsTty::is_tty(&stdout()) {
            return Err(RuntimeError::BackendPlatform {
                detail: "stdout is not a tty".into(),
            });
        }
        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out: stdout(),
            cols,
            rows,
            grid: Vec::new(),
            batch_rx: None,
            batch_tx: None,
            reader: None,
            pending_cursor: None,
            started: false,
        })
    }

    fn apply_ops(&mut self, ops: &[DrawOp]) {
        let mut clips: Vec<Rect> = Vec::new();
        let mut cursor_cmd: Option<(i32, i32, bool)> = None;
        let mut blobs: Vec<Vec<(String, ResolvedStyle)>> = Vec::new();

        for op in ops {
            let full = Rect::new(0, 0, i32::from(self.cols), i32::from(self.rows));
            let clip = clips.last().copied().unwrap_or(full);
            match op {
                DrawOp::ClearTo { cols, rows, style } => {
                    self.cols = *cols;
                    self.rows = *rows;
                    let blank = Cell { ch: ' ', style: *style };
                    self.grid = vec![blank; usize::from(*cols) * usize::from(*rows)];
                }
                DrawOp::FillRect { x, y, w, h, style } => {
                    let rect = Rect::new(*x, *y, *w, *h).intersection(&clip).intersection(&full);
                    for yy in rect.y..rect.bottom() {
                        for xx in rect.x..rect.right() {
                            let at = yy as usize * usize::from(self.cols) + xx as usize;
                            let prior = self.grid[at].style;
                            self.grid[at] = Cell {
                                ch: ' ',
                                style: (*style).unwrap_or(prior),
                            };
                        }
                    }
                }
                DrawOp::DrawText { x, y, text, style } => {
                    self.put_text(*x, *y, text, style.as_ref(), clip, full);
                }
                DrawOp::PushClip { x, y, w, h } => {
                    clips.push(Rect::new(*x, *y, *w, *h).intersection(&clip));
                }
                DrawOp::PopClip => {
                    clips.pop();
                }
                DrawOp::SetCursor { x, y, visible, .. } => {
                    cursor_cmd = Some((*x, *y, *visible));
                }
                DrawOp::HideCursor => cursor_cmd = None,
                DrawOp::AddTextRun { segments } => {
                    blobs.push(segments.iter().map(|s| (s.text.clone(), s.style)).collect());
                }
                DrawOp::DrawTextRun { x, y, index } => {
                    let mut cx = *x;
                    if let Some(segments) = blobs.get(*index as usize).cloned() {
                        for (text, style) in segments {
                            self.put_text(cx, *y, &text, Some(&style), clip, full);
                            cx += crate::glyph::cell_width(&text);
                        }
                    }
                }
            }
        }
        self.pending_cursor = cursor_cmd;
    }

    fn put_text(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        style: Option<&ResolvedStyle>,
        clip: Rect,
        full: Rect,
    ) {
        if y < clip.y || y >= clip.bottom() || y < 0 || y >= full.bottom() {
            return;
        }
        let mut cx = x;
        for ch in text.chars() {
            if cx >= clip.x && cx < clip.right() && cx >= 0 && cx < full.right() {
                let at = y as usize * usize::from(self.cols) + cx as usize;
                let prior = self.grid[at].style;
                self.grid[at] = Cell {
                    ch,
                    style: style.copied().unwrap_or(prior),
                };
            }
            cx += 1;
        }
    }

    fn flush_grid(&mut self) -> Result<()> {
        let mut current: Option<ResolvedStyle> = None;
        queue!(self.out, cursor::MoveTo(0, 0))?;
        for y in 0..self.rows {
            queue!(self.out, cursor::MoveTo(0, y))?;
            for x in 0..self.cols {
                let cell = self.grid[usize::from(y) * usize::from(self.cols) + usize::from(x)];
                if current != Some(cell.style) {
                    queue_style(&mut self.out, &cell.style)?;
                    current = Some(cell.style);
                }
                queue!(self.out, crossterm::style::Print(cell.ch))?;
            }
        }
        match self.pending_cursor {
            Some((x, y, true)) => {
                queue!(
                    self.out,
                    cursor::MoveTo(x.max(0) as u16, y.max(0) as u16),
                    cursor::Show
                )?;
            }
            _ => queue!(self.out, cursor::Hide)?,
        }
        queue!(self.out, ResetColor)?;
        self.out.flush()?;
        Ok(())
    }
}

fn queue_style(out: &mut Stdout, style: &ResolvedStyle) -> Result<()> {
    queue!(out, SetAttribute(Attribute::Reset))?;
    if style.attrs.contains(AttrFlags::BOLD) {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if style.attrs.contains(AttrFlags::DIM) {
        queue!(out, SetAttribute(Attribute::Dim))?;
    }
    if style.attrs.contains(AttrFlags::ITALIC) {
        queue!(out, SetAttribute(Attribute::Italic))?;
    }
    if style.attrs.contains(AttrFlags::UNDERLINE) {
        queue!(out, SetAttribute(Attribute::Underlined))?;
    }
    if style.attrs.contains(AttrFlags::INVERSE) {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }
    if style.attrs.contains(AttrFlags::STRIKETHROUGH) {
        queue!(out, SetAttribute(Attribute::CrossedOut))?;
    }
    if style.attrs.contains(AttrFlags::BLINK) {
        queue!(out, SetAttribute(Attribute::SlowBlink))?;
    }
    queue!(out, SetForegroundColor(to_color(style.fg)))?;
    queue!(out, SetBackgroundColor(to_color(style.bg)))?;
    Ok(())
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

fn key_code_to_wire(code: KeyCode) -> Option<(u16, Option<u32>)> {
    match code {
        KeyCode::Backspace => Some((keys::BACKSPACE, None)),
        KeyCode::Tab => Some((keys::TAB, None)),
        KeyCode::Enter => Some((keys::ENTER, None)),
        KeyCode::Esc => Some((keys::ESCAPE, None)),
        KeyCode::Left => Some((keys::LEFT, None)),
        KeyCode::Right => Some((keys::RIGHT, None)),
        KeyCode::Up => Some((keys::UP, None)),
        KeyCode::Down => Some((keys::DOWN, None)),
        KeyCode::Home => Some((keys::HOME, None)),
        KeyCode::End => Some((keys::END, None)),
        KeyCode::PageUp => Some((keys::PAGE_UP, None)),
        KeyCode::PageDown => Some((keys::PAGE_DOWN, None)),
        KeyCode::Delete => Some((keys::DELETE, None)),
        KeyCode::Char(c) => {
            let key = keys::from_char(c).unwrap_or(c.to_ascii_uppercase() as u16);
            Some((key, Some(c as u32)))
        }
        KeyCode::F(n) => Some((keys::F1 + u16::from(n.saturating_sub(1)), None)),
        _ => None,
    }
}

fn mods_to_wire(mods: KeyModifiers) -> u8 {
    let mut out = 0;
    if mods.contains(KeyModifiers::SHIFT) {
        out |= keys::mods::SHIFT;
    }
    if mods.contains(KeyModifiers::CONTROL) {
        out |= keys::mods::CTRL;
    }
    if mods.contains(KeyModifiers::ALT) {
        out |= keys::mods::ALT;
    }
    if mods.contains(KeyModifiers::SUPER) {
        out |= keys::mods::META;
    }
    out
}

/// Reads crossterm events and emits wire batches plus periodic ticks.
async fn reader_loop(tx: mpsc::UnboundedSender<Vec<u8>>, epoch: Instant) {
    let mut stream = EventStream::new();
    let mut ticker = tokio::time::interval(std::time::Duration::from_millis(TICK_MS));
    loop {
        let mut writer = EventBatchWriter::new();
        tokio::select! {
            maybe = stream.next() => {
                let now = epoch.elapsed().as_millis() as u64;
                match maybe {
                    Some(Ok(Event::Key(key))) => {
                        if key.kind == KeyEventKind::Release {
                            continue;
                        }
                        let Some((code, text)) = key_code_to_wire(key.code) else {
                            continue;
                        };
                        let action = if key.kind == KeyEventKind::Repeat {
                            KeyAction::Repeat
                        } else {
                            KeyAction::Down
                        };
                        let mods = mods_to_wire(key.modifiers);
                        writer.key(now, code, mods, action);
                        if let Some(cp) = text {
                            if mods & (keys::mods::CTRL | keys::mods::ALT) == 0 {
                                writer.text(now, cp);
                            }
                        }
                    }
                    Some(Ok(Event::Mouse(mouse))) => {
                        let (kind, buttons, wheel_y) = match mouse.kind {
                            MouseEventKind::Moved => (MouseKind::Move, 0, 0),
                            MouseEventKind::Down(b) => (MouseKind::Down, button_bit(b), 0),
                            MouseEventKind::Up(b) => (MouseKind::Up, button_bit(b), 0),
                            MouseEventKind::Drag(b) => (MouseKind::Drag, button_bit(b), 0),
                            MouseEventKind::ScrollUp => (MouseKind::Wheel, 0, -1),
                            MouseEventKind::ScrollDown => (MouseKind::Wheel, 0, 1),
                            _ => continue,
                        };
                        writer.mouse(
                            now,
                            i32::from(mouse.column),
                            i32::from(mouse.row),
                            kind,
                            mods_to_wire(mouse.modifiers),
                            buttons,
                            0,
                            wheel_y,
                        );
                    }
                    Some(Ok(Event::Resize(cols, rows))) => {
                        writer.resize(now, cols, rows);
                    }
                    Some(Ok(Event::Paste(text))) => {
                        writer.paste(now, &text);
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(_)) | None => {
                        let _ = tx.send(Vec::new());
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                let now = epoch.elapsed().as_millis() as u64;
                writer.tick(now, Some(TICK_MS as u32));
            }
        }
        if !writer.is_empty() && tx.send(writer.finish()).is_err() {
            break;
        }
    }
}

fn button_bit(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => 1,
        MouseButton::Right => 2,
        MouseButton::Middle => 4,
    }
}

#[async_trait]
impl RuntimeBackend for TermBackend {
    async fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        terminal::enable_raw_mode()?;
        execute!(
            self.out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture
        )?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.batch_tx = Some(tx.clone());
        self.batch_rx = Some(rx);
        self.reader = Some(tokio::spawn(reader_loop(tx, Instant::now())));
        self.started = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        execute!(
            self.out,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        self.started = false;
        Ok(())
    }

    fn dispose(&mut self) {
        self.batch_rx = None;
        self.batch_tx = None;
    }

    async fn request_frame(&mut self, bytes: &[u8]) -> Result<()> {
        let ops = DrawlistReader::decode(bytes).map_err(RuntimeError::from)?;
        self.apply_ops(&ops);
        self.flush_grid()
    }

    async fn poll_events(&mut self) -> Result<Vec<u8>> {
        match &mut self.batch_rx {
            Some(rx) => Ok(rx.recv().await.unwrap_or_default()),
            None => Err(RuntimeError::internal("backend not started")),
        }
    }

    fn post_user_event(&self, batch: Vec<u8>) {
        if let Some(tx) = &self.batch_tx {
            let _ = tx.send(batch);
        }
    }

    async fn caps(&self) -> Result<TerminalCaps> {
        Ok(TerminalCaps {
            pins: RUNTIME_PINS,
            cols: self.cols,
            rows: self.rows,
            max_event_bytes: TERM_MAX_EVENT_BYTES,
            fps_cap: TERM_FPS_CAP,
        })
    }

    async fn terminal_profile(&self) -> Result<TerminalProfile> {
        Ok(TerminalProfile {
            name: std::env::var("TERM").unwrap_or_default(),
            truecolor: std::env::var("COLORTERM")
                .map(|v| v.contains("truecolor") || v.contains("24bit"))
                .unwrap_or(false),
        })
    }
}
