//! Prop structs for every node kind.
//!
//! Props are plain data with `Default` impls; large payloads (item lists,
//! table rows, tree nodes) sit behind `Arc` so cloned frames share them
//! and local-store caches can invariant-check identity with
//! `Arc::ptr_eq`.

use std::sync::Arc;

use tstyle::{ColorRef, TriAttrs};

use crate::vnode::VNode;

/// A sizing dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Dim {
    /// Use the intrinsic size.
    #[default]
    Auto,
    /// Fixed number of cells.
    Cells(i32),
    /// Percentage of the parent's content extent.
    Percent(f32),
    /// Fill the parent's content extent.
    Full,
}

/// Main-axis distribution of free space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Justify {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
    SpaceAround,
}

/// Cross-axis alignment of children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
    Stretch,
}

/// Flow participation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Position {
    #[default]
    Flow,
    Absolute,
}

/// Container overflow policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
}

/// Layout axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    #[default]
    Vertical,
}

/// Padding/border insets, in cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Insets {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Insets {
    pub fn all(v: i32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn xy(x: i32, y: i32) -> Self {
        Self {
            top: y,
            right: x,
            bottom: y,
            left: x,
        }
    }

    /// Builds insets from fractional cell values. Fractions truncate to
    /// whole cells before any measurement sees them.
    pub fn from_f32(x: f32, y: f32) -> Self {
        Self::xy(x.trunc() as i32, y.trunc() as i32)
    }

    pub fn horizontal(&self) -> i32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> i32 {
        self.top + self.bottom
    }
}

/// Style fragment carried on props; colors are theme references resolved
/// at render time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleProps {
    pub fg: Option<ColorRef>,
    pub bg: Option<ColorRef>,
    pub attrs: TriAttrs,
}

impl StyleProps {
    pub fn is_empty(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.attrs.is_empty()
    }
}

/// Layout fields shared by every node kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Common {
    pub key: Option<String>,
    pub width: Dim,
    pub height: Dim,
    pub flex: Option<f32>,
    pub position: Position,
    pub top: Option<i32>,
    pub right: Option<i32>,
    pub bottom: Option<i32>,
    pub left: Option<i32>,
}

impl Common {
    pub fn keyed(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct ContainerProps {
    pub common: Common,
    pub max_width: Option<i32>,
    pub max_height: Option<i32>,
    pub padding: Insets,
    pub border: bool,
    pub gap: i32,
    pub justify: Justify,
    pub align: Align,
    pub overflow: Overflow,
    pub scroll_x: i32,
    pub scroll_y: i32,
    pub style: StyleProps,
    pub opacity: Option<f32>,
    pub children: Vec<VNode>,
}

// ---------------------------------------------------------------------------
// Basic widgets
// ---------------------------------------------------------------------------

/// Horizontal overflow behavior for a text node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextOverflow {
    #[default]
    Visible,
    Clip,
}

#[derive(Clone, Debug, Default)]
pub struct TextProps {
    pub common: Common,
    pub text: String,
    pub style: StyleProps,
    pub text_overflow: TextOverflow,
    pub max_width: Option<i32>,
}

/// One styled run inside a rich text node.
#[derive(Clone, Debug, Default)]
pub struct TextSpan {
    pub text: String,
    pub style: StyleProps,
}

#[derive(Clone, Debug, Default)]
pub struct RichTextProps {
    pub common: Common,
    pub spans: Arc<Vec<TextSpan>>,
}

#[derive(Clone, Debug, Default)]
pub struct SpacerProps {
    pub common: Common,
    /// Fixed size along the parent axis; `None` makes the spacer flexible.
    pub size: Option<i32>,
}

#[derive(Clone, Debug, Default)]
pub struct BadgeProps {
    pub common: Common,
    pub text: String,
    pub style: StyleProps,
}

#[derive(Clone, Debug, Default)]
pub struct SpinnerProps {
    pub common: Common,
    pub label: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ProgressProps {
    pub common: Common,
    /// Completion in `[0, 1]`.
    pub value: f32,
    /// Indeterminate progress animates and keeps tick frames flowing.
    pub indeterminate: bool,
    pub label: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SkeletonProps {
    pub common: Common,
    pub lines: i32,
}

impl Default for SkeletonProps {
    fn default() -> Self {
        Self {
            common: Common::default(),
            lines: 1,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct IconProps {
    pub common: Common,
    pub name: String,
    pub style: StyleProps,
}

#[derive(Clone, Debug, Default)]
pub struct KbdProps {
    pub common: Common,
    /// Chord text, e.g. `ctrl+k`.
    pub keys: String,
}

/// Severity level shared by status, callout, and toast nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, Default)]
pub struct StatusProps {
    pub common: Common,
    pub level: Severity,
    pub text: String,
}

#[derive(Clone, Debug, Default)]
pub struct TagProps {
    pub common: Common,
    pub text: String,
    pub style: StyleProps,
}

#[derive(Clone, Debug, Default)]
pub struct GaugeProps {
    pub common: Common,
    /// Fill in `[0, 1]`.
    pub value: f32,
    pub label: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ErrorDisplayProps {
    pub common: Common,
    pub title: String,
    pub detail: Option<String>,
    /// When set, a retry button with this id is rendered and focusable.
    pub retry_id: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct CalloutProps {
    pub common: Common,
    pub level: Severity,
    pub title: String,
    pub body: String,
}

#[derive(Clone, Debug, Default)]
pub struct DividerProps {
    pub common: Common,
    pub vertical: bool,
    pub label: Option<String>,
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct SparklineProps {
    pub common: Common,
    pub values: Arc<Vec<f64>>,
    pub style: StyleProps,
}

#[derive(Clone, Debug, Default)]
pub struct BarChartProps {
    pub common: Common,
    /// `(label, value)` pairs.
    pub values: Arc<Vec<(String, f64)>>,
    pub style: StyleProps,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MiniChartKind {
    #[default]
    Line,
    Bars,
}

#[derive(Clone, Debug, Default)]
pub struct MiniChartProps {
    pub common: Common,
    pub values: Arc<Vec<f64>>,
    pub chart: MiniChartKind,
    pub style: StyleProps,
}

// ---------------------------------------------------------------------------
// Interactive widgets
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct ButtonProps {
    pub common: Common,
    pub id: String,
    pub label: String,
    pub disabled: bool,
    pub style: StyleProps,
}

#[derive(Clone, Debug, Default)]
pub struct InputProps {
    pub common: Common,
    pub id: String,
    pub value: String,
    pub placeholder: Option<String>,
    pub disabled: bool,
    /// Render value as mask characters (password entry).
    pub masked: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SelectProps {
    pub common: Common,
    pub id: String,
    pub options: Arc<Vec<String>>,
    pub selected: usize,
    pub disabled: bool,
}

#[derive(Clone, Debug, Default)]
pub struct CheckboxProps {
    pub common: Common,
    pub id: String,
    pub label: String,
    pub checked: bool,
    pub disabled: bool,
}

#[derive(Clone, Debug, Default)]
pub struct RadioGroupProps {
    pub common: Common,
    pub id: String,
    pub options: Arc<Vec<String>>,
    pub selected: usize,
    pub disabled: bool,
}

#[derive(Clone, Debug, Default)]
pub struct FieldProps {
    pub common: Common,
    pub label: String,
    pub hint: Option<String>,
    pub children: Vec<VNode>,
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct VirtualListProps {
    pub common: Common,
    pub id: String,
    pub items: Arc<Vec<String>>,
    pub item_height: i32,
    pub overscan: i32,
}

impl Default for VirtualListProps {
    fn default() -> Self {
        Self {
            common: Common::default(),
            id: String::new(),
            items: Arc::new(Vec::new()),
            item_height: 1,
            overscan: 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Clone, Debug, Default)]
pub struct TableColumn {
    pub key: String,
    pub title: String,
    pub width: Option<i32>,
    pub sortable: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TableRow {
    pub key: String,
    pub cells: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct TableProps {
    pub common: Common,
    pub id: String,
    pub columns: Arc<Vec<TableColumn>>,
    pub rows: Arc<Vec<TableRow>>,
    pub show_header: bool,
    pub sort: Option<(String, SortDir)>,
}

impl Default for TableProps {
    fn default() -> Self {
        Self {
            common: Common::default(),
            id: String::new(),
            columns: Arc::new(Vec::new()),
            rows: Arc::new(Vec::new()),
            show_header: true,
            sort: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TreeNodeData {
    pub key: String,
    pub label: String,
    pub children: Vec<TreeNodeData>,
    /// Advertises children that have not been loaded yet (lazy nodes).
    pub has_children: bool,
    pub loaded: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TreeProps {
    pub common: Common,
    pub id: String,
    pub nodes: Arc<Vec<TreeNodeData>>,
    pub lazy: bool,
}

#[derive(Clone, Debug, Default)]
pub struct FileEntry {
    pub path: String,
    pub is_dir: bool,
}

#[derive(Clone, Debug, Default)]
pub struct FilePickerProps {
    pub common: Common,
    pub id: String,
    pub entries: Arc<Vec<FileEntry>>,
    pub query: String,
}

#[derive(Clone, Debug, Default)]
pub struct FileTreeExplorerProps {
    pub common: Common,
    pub id: String,
    pub nodes: Arc<Vec<TreeNodeData>>,
    pub show_icons: bool,
}

#[derive(Clone, Debug, Default)]
pub struct DropdownProps {
    pub common: Common,
    pub id: String,
    pub items: Arc<Vec<String>>,
    pub open: bool,
    pub selected: usize,
    pub disabled: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PaletteItem {
    pub id: String,
    pub label: String,
    pub source: String,
}

#[derive(Clone, Debug, Default)]
pub struct CommandPaletteProps {
    pub common: Common,
    pub id: String,
    pub open: bool,
    pub query: String,
    pub items: Arc<Vec<PaletteItem>>,
    pub selected: usize,
    /// Source prefixes cycled with Tab.
    pub sources: Arc<Vec<String>>,
    pub active_source: usize,
}

#[derive(Clone, Debug, Default)]
pub struct LogsConsoleProps {
    pub common: Common,
    pub id: String,
    pub lines: Arc<Vec<String>>,
    /// Stick to the tail as new lines arrive.
    pub follow: bool,
}

// ---------------------------------------------------------------------------
// Editors
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct CodeEditorProps {
    pub common: Common,
    pub id: String,
    pub lines: Arc<Vec<String>>,
    pub language: Option<String>,
    pub read_only: bool,
    pub show_gutter: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiffKind {
    #[default]
    Context,
    Add,
    Remove,
    Header,
}

#[derive(Clone, Debug, Default)]
pub struct DiffLine {
    pub kind: DiffKind,
    pub text: String,
}

#[derive(Clone, Debug, Default)]
pub struct DiffViewerProps {
    pub common: Common,
    pub id: String,
    pub lines: Arc<Vec<DiffLine>>,
}

// ---------------------------------------------------------------------------
// Overlays and layers
// ---------------------------------------------------------------------------

/// Backdrop treatment behind an overlay layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backdrop {
    #[default]
    None,
    Dim,
    Opaque,
}

#[derive(Clone, Debug)]
pub struct ModalProps {
    pub common: Common,
    pub id: String,
    pub title: Option<String>,
    pub close_on_escape: bool,
    pub backdrop: Backdrop,
    pub children: Vec<VNode>,
}

impl Default for ModalProps {
    fn default() -> Self {
        Self {
            common: Common::default(),
            id: String::new(),
            title: None,
            close_on_escape: true,
            backdrop: Backdrop::Dim,
            children: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ToolApprovalDialogProps {
    pub common: Common,
    pub id: String,
    pub tool: String,
    pub description: String,
    pub approve_label: String,
    pub deny_label: String,
}

#[derive(Clone, Debug, Default)]
pub struct Toast {
    pub id: String,
    pub level: Severity,
    pub text: String,
    pub action_label: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ToastContainerProps {
    pub common: Common,
    pub toasts: Arc<Vec<Toast>>,
}

#[derive(Clone, Debug, Default)]
pub struct LayersProps {
    pub common: Common,
    pub children: Vec<VNode>,
}

#[derive(Clone, Debug, Default)]
pub struct LayerProps {
    pub common: Common,
    pub id: String,
    pub z_index: i32,
    pub modal: bool,
    pub backdrop: Backdrop,
    pub close_on_escape: bool,
    pub children: Vec<VNode>,
}

// ---------------------------------------------------------------------------
// Focus containers
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct FocusZoneProps {
    pub common: Common,
    pub id: String,
    /// Tab-navigation ordering across zones; lower first.
    pub tab_index: i32,
    pub children: Vec<VNode>,
}

#[derive(Clone, Debug, Default)]
pub struct FocusTrapProps {
    pub common: Common,
    pub id: String,
    pub active: bool,
    pub children: Vec<VNode>,
}

// ---------------------------------------------------------------------------
// Panels
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct PanelGroupProps {
    pub common: Common,
    pub axis: Axis,
    pub children: Vec<VNode>,
}

#[derive(Clone, Debug)]
pub struct ResizablePanelProps {
    pub common: Common,
    /// Share of the group's main axis in `[0, 1]`.
    pub ratio: f32,
    pub min_size: i32,
    pub children: Vec<VNode>,
}

impl Default for ResizablePanelProps {
    fn default() -> Self {
        Self {
            common: Common::default(),
            ratio: 0.5,
            min_size: 1,
            children: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SplitPaneProps {
    pub common: Common,
    pub axis: Axis,
    /// Share given to the first child in `[0, 1]`.
    pub ratio: f32,
    pub children: Vec<VNode>,
}

impl Default for SplitPaneProps {
    fn default() -> Self {
        Self {
            common: Common::default(),
            axis: Axis::Horizontal,
            ratio: 0.5,
            children: Vec::new(),
        }
    }
}
