//! Typed actions published to the host application.
//!
//! Views stay free of behavior capture: widgets never hold callbacks.
//! The router turns raw engine events into these actions and the host
//! maps them onto state updates in its `update` function.

use crate::props::SortDir;

/// An event published to the application. Most variants are widget
/// actions; `Resized` is an engine notice and `Fatal` stops the app.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// A pressable fired (mouse up over the pressed id, or Enter/Space).
    Press { id: String, mods: u8 },
    /// A collection row was activated.
    RowPress { id: String, row: usize, key: String },
    /// A sortable table column header was activated.
    Sort { id: String, key: String, dir: SortDir },
    /// Selection index changed (select, radio group, dropdown, list).
    Select { id: String, index: usize },
    /// Checkbox toggled.
    Toggle { id: String, checked: bool },
    /// Input editor value changed.
    InputChanged { id: String, value: String },
    /// Input submitted with Enter.
    InputSubmitted { id: String, value: String },
    /// A scroll container moved; `range` is the visible item span.
    Scrolled {
        id: String,
        scroll_top: i32,
        range: (usize, usize),
    },
    TreeExpanded { id: String, key: String },
    TreeCollapsed { id: String, key: String },
    TreeActivated { id: String, key: String },
    /// A lazy tree node needs children; `token` sequences the load so a
    /// newer request supersedes this one.
    TreeLoadChildren { id: String, key: String, token: u64 },
    /// Command palette query text changed.
    PaletteQuery { id: String, query: String },
    /// Command palette selection moved.
    PaletteMoved { id: String, index: usize },
    /// Tab cycled the palette's source prefix.
    PaletteSource { id: String, index: usize },
    /// Enter chose the selected palette item.
    PaletteSelected { id: String, item_id: String },
    PaletteClosed { id: String },
    /// A file picker entry was opened.
    FileOpened { id: String, path: String },
    /// A tool approval dialog resolved.
    Approval { id: String, approved: bool },
    /// A layer was closed (ESC or backdrop click).
    LayerClosed { id: String },
    /// A chord keybinding fired.
    Command { tag: String },
    /// Focus moved; published so hosts can follow along.
    FocusChanged { id: Option<String> },
    /// Engine notice: the terminal was resized.
    Resized { cols: u16, rows: u16 },
    /// Paste routed into a focused input.
    Pasted { id: String, text: String },
    /// Fatal condition; the scheduler stops after publishing this.
    Fatal { code: String, detail: String },
}

/// What one routing step produced.
#[derive(Debug, Default)]
pub struct RouteOutcome {
    pub needs_render: bool,
    pub action: Option<Action>,
}

impl RouteOutcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn render() -> Self {
        Self {
            needs_render: true,
            action: None,
        }
    }

    pub fn action(action: Action) -> Self {
        Self {
            needs_render: true,
            action: Some(action),
        }
    }
}
