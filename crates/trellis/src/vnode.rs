//! The immutable declarative node tree.
//!
//! A [`VNode`] is a value: cloned freely, shared across frames, never
//! mutated after construction. Every widget kind is a tagged variant so
//! layout, commit, and rendering dispatch exhaustively.

use std::fmt;
use std::rc::Rc;

use crate::hooks::HookCx;
use crate::props::*;

/// Discriminant of a [`VNode`], used for instance identity and dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Row,
    Column,
    Box,
    Text,
    Button,
    Input,
    Select,
    Checkbox,
    RadioGroup,
    Field,
    Spacer,
    RichText,
    Badge,
    Spinner,
    Progress,
    Skeleton,
    Icon,
    Kbd,
    Status,
    Tag,
    Gauge,
    Empty,
    ErrorDisplay,
    Callout,
    Sparkline,
    BarChart,
    MiniChart,
    VirtualList,
    Table,
    Tree,
    FilePicker,
    FileTreeExplorer,
    Dropdown,
    CommandPalette,
    ToolApprovalDialog,
    ToastContainer,
    CodeEditor,
    DiffViewer,
    LogsConsole,
    Modal,
    FocusZone,
    FocusTrap,
    Layers,
    Layer,
    PanelGroup,
    ResizablePanel,
    SplitPane,
    Divider,
    Composite,
}

/// A composite node: a render function over hook state, producing a
/// subtree on commit.
#[derive(Clone)]
pub struct CompositeProps {
    pub key: Option<String>,
    pub render: Rc<dyn Fn(&mut HookCx<'_>) -> VNode>,
}

impl fmt::Debug for CompositeProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeProps")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// An immutable UI node.
#[derive(Clone, Debug)]
pub enum VNode {
    Row(ContainerProps),
    Column(ContainerProps),
    Box(ContainerProps),
    Text(TextProps),
    Button(ButtonProps),
    Input(InputProps),
    Select(SelectProps),
    Checkbox(CheckboxProps),
    RadioGroup(RadioGroupProps),
    Field(FieldProps),
    Spacer(SpacerProps),
    RichText(RichTextProps),
    Badge(BadgeProps),
    Spinner(SpinnerProps),
    Progress(ProgressProps),
    Skeleton(SkeletonProps),
    Icon(IconProps),
    Kbd(KbdProps),
    Status(StatusProps),
    Tag(TagProps),
    Gauge(GaugeProps),
    Empty,
    ErrorDisplay(ErrorDisplayProps),
    Callout(CalloutProps),
    Sparkline(SparklineProps),
    BarChart(BarChartProps),
    MiniChart(MiniChartProps),
    VirtualList(VirtualListProps),
    Table(TableProps),
    Tree(TreeProps),
    FilePicker(FilePickerProps),
    FileTreeExplorer(FileTreeExplorerProps),
    Dropdown(DropdownProps),
    CommandPalette(CommandPaletteProps),
    ToolApprovalDialog(ToolApprovalDialogProps),
    ToastContainer(ToastContainerProps),
    CodeEditor(CodeEditorProps),
    DiffViewer(DiffViewerProps),
    LogsConsole(LogsConsoleProps),
    Modal(ModalProps),
    FocusZone(FocusZoneProps),
    FocusTrap(FocusTrapProps),
    Layers(LayersProps),
    Layer(LayerProps),
    PanelGroup(PanelGroupProps),
    ResizablePanel(ResizablePanelProps),
    SplitPane(SplitPaneProps),
    Divider(DividerProps),
    Composite(CompositeProps),
}

impl VNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            VNode::Row(_) => NodeKind::Row,
            VNode::Column(_) => NodeKind::Column,
            VNode::Box(_) => NodeKind::Box,
            VNode::Text(_) => NodeKind::Text,
            VNode::Button(_) => NodeKind::Button,
            VNode::Input(_) => NodeKind::Input,
            VNode::Select(_) => NodeKind::Select,
            VNode::Checkbox(_) => NodeKind::Checkbox,
            VNode::RadioGroup(_) => NodeKind::RadioGroup,
            VNode::Field(_) => NodeKind::Field,
            VNode::Spacer(_) => NodeKind::Spacer,
            VNode::RichText(_) => NodeKind::RichText,
            VNode::Badge(_) => NodeKind::Badge,
            VNode::Spinner(_) => NodeKind::Spinner,
            VNode::Progress(_) => NodeKind::Progress,
            VNode::Skeleton(_) => NodeKind::Skeleton,
            VNode::Icon(_) => NodeKind::Icon,
            VNode::Kbd(_) => NodeKind::Kbd,
            VNode::Status(_) => NodeKind::Status,
            VNode::Tag(_) => NodeKind::Tag,
            VNode::Gauge(_) => NodeKind::Gauge,
            VNode::Empty => NodeKind::Empty,
            VNode::ErrorDisplay(_) => NodeKind::ErrorDisplay,
            VNode::Callout(_) => NodeKind::Callout,
            VNode::Sparkline(_) => NodeKind::Sparkline,
            VNode::BarChart(_) => NodeKind::BarChart,
            VNode::MiniChart(_) => NodeKind::MiniChart,
            VNode::VirtualList(_) => NodeKind::VirtualList,
            VNode::Table(_) => NodeKind::Table,
            VNode::Tree(_) => NodeKind::Tree,
            VNode::FilePicker(_) => NodeKind::FilePicker,
            VNode::FileTreeExplorer(_) => NodeKind::FileTreeExplorer,
            VNode::Dropdown(_) => NodeKind::Dropdown,
            VNode::CommandPalette(_) => NodeKind::CommandPalette,
            VNode::ToolApprovalDialog(_) => NodeKind::ToolApprovalDialog,
            VNode::ToastContainer(_) => NodeKind::ToastContainer,
            VNode::CodeEditor(_) => NodeKind::CodeEditor,
            VNode::DiffViewer(_) => NodeKind::DiffViewer,
            VNode::LogsConsole(_) => NodeKind::LogsConsole,
            VNode::Modal(_) => NodeKind::Modal,
            VNode::FocusZone(_) => NodeKind::FocusZone,
            VNode::FocusTrap(_) => NodeKind::FocusTrap,
            VNode::Layers(_) => NodeKind::Layers,
            VNode::Layer(_) => NodeKind::Layer,
            VNode::PanelGroup(_) => NodeKind::PanelGroup,
            VNode::ResizablePanel(_) => NodeKind::ResizablePanel,
            VNode::SplitPane(_) => NodeKind::SplitPane,
            VNode::Divider(_) => NodeKind::Divider,
            VNode::Composite(_) => NodeKind::Composite,
        }
    }

    /// The explicit reconciliation key, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            VNode::Row(p) | VNode::Column(p) | VNode::Box(p) => p.common.key.as_deref(),
            VNode::Text(p) => p.common.key.as_deref(),
            VNode::Button(p) => p.common.key.as_deref(),
            VNode::Input(p) => p.common.key.as_deref(),
            VNode::Select(p) => p.common.key.as_deref(),
            VNode::Checkbox(p) => p.common.key.as_deref(),
            VNode::RadioGroup(p) => p.common.key.as_deref(),
            VNode::Field(p) => p.common.key.as_deref(),
            VNode::Spacer(p) => p.common.key.as_deref(),
            VNode::RichText(p) => p.common.key.as_deref(),
            VNode::Badge(p) => p.common.key.as_deref(),
            VNode::Spinner(p) => p.common.key.as_deref(),
            VNode::Progress(p) => p.common.key.as_deref(),
            VNode::Skeleton(p) => p.common.key.as_deref(),
            VNode::Icon(p) => p.common.key.as_deref(),
            VNode::Kbd(p) => p.common.key.as_deref(),
            VNode::Status(p) => p.common.key.as_deref(),
            VNode::Tag(p) => p.common.key.as_deref(),
            VNode::Gauge(p) => p.common.key.as_deref(),
            VNode::Empty => None,
            VNode::ErrorDisplay(p) => p.common.key.as_deref(),
            VNode::Callout(p) => p.common.key.as_deref(),
            VNode::Sparkline(p) => p.common.key.as_deref(),
            VNode::BarChart(p) => p.common.key.as_deref(),
            VNode::MiniChart(p) => p.common.key.as_deref(),
            VNode::VirtualList(p) => p.common.key.as_deref(),
            VNode::Table(p) => p.common.key.as_deref(),
            VNode::Tree(p) => p.common.key.as_deref(),
            VNode::FilePicker(p) => p.common.key.as_deref(),
            VNode::FileTreeExplorer(p) => p.common.key.as_deref(),
            VNode::Dropdown(p) => p.common.key.as_deref(),
            VNode::CommandPalette(p) => p.common.key.as_deref(),
            VNode::ToolApprovalDialog(p) => p.common.key.as_deref(),
            VNode::ToastContainer(p) => p.common.key.as_deref(),
            VNode::CodeEditor(p) => p.common.key.as_deref(),
            VNode::DiffViewer(p) => p.common.key.as_deref(),
            VNode::LogsConsole(p) => p.common.key.as_deref(),
            VNode::Modal(p) => p.common.key.as_deref(),
            VNode::FocusZone(p) => p.common.key.as_deref(),
            VNode::FocusTrap(p) => p.common.key.as_deref(),
            VNode::Layers(p) => p.common.key.as_deref(),
            VNode::Layer(p) => p.common.key.as_deref(),
            VNode::PanelGroup(p) => p.common.key.as_deref(),
            VNode::ResizablePanel(p) => p.common.key.as_deref(),
            VNode::SplitPane(p) => p.common.key.as_deref(),
            VNode::Divider(p) => p.common.key.as_deref(),
            VNode::Composite(p) => p.key.as_deref(),
        }
    }

    /// Shared layout fields. `None` for `Empty` and `Composite`, which do
    /// not occupy layout space themselves.
    pub fn common(&self) -> Option<&Common> {
        match self {
            VNode::Row(p) | VNode::Column(p) | VNode::Box(p) => Some(&p.common),
            VNode::Text(p) => Some(&p.common),
            VNode::Button(p) => Some(&p.common),
            VNode::Input(p) => Some(&p.common),
            VNode::Select(p) => Some(&p.common),
            VNode::Checkbox(p) => Some(&p.common),
            VNode::RadioGroup(p) => Some(&p.common),
            VNode::Field(p) => Some(&p.common),
            VNode::Spacer(p) => Some(&p.common),
            VNode::RichText(p) => Some(&p.common),
            VNode::Badge(p) => Some(&p.common),
            VNode::Spinner(p) => Some(&p.common),
            VNode::Progress(p) => Some(&p.common),
            VNode::Skeleton(p) => Some(&p.common),
            VNode::Icon(p) => Some(&p.common),
            VNode::Kbd(p) => Some(&p.common),
            VNode::Status(p) => Some(&p.common),
            VNode::Tag(p) => Some(&p.common),
            VNode::Gauge(p) => Some(&p.common),
            VNode::Empty => None,
            VNode::ErrorDisplay(p) => Some(&p.common),
            VNode::Callout(p) => Some(&p.common),
            VNode::Sparkline(p) => Some(&p.common),
            VNode::BarChart(p) => Some(&p.common),
            VNode::MiniChart(p) => Some(&p.common),
            VNode::VirtualList(p) => Some(&p.common),
            VNode::Table(p) => Some(&p.common),
            VNode::Tree(p) => Some(&p.common),
            VNode::FilePicker(p) => Some(&p.common),
            VNode::FileTreeExplorer(p) => Some(&p.common),
            VNode::Dropdown(p) => Some(&p.common),
            VNode::CommandPalette(p) => Some(&p.common),
            VNode::ToolApprovalDialog(p) => Some(&p.common),
            VNode::ToastContainer(p) => Some(&p.common),
            VNode::CodeEditor(p) => Some(&p.common),
            VNode::DiffViewer(p) => Some(&p.common),
            VNode::LogsConsole(p) => Some(&p.common),
            VNode::Modal(p) => Some(&p.common),
            VNode::FocusZone(p) => Some(&p.common),
            VNode::FocusTrap(p) => Some(&p.common),
            VNode::Layers(p) => Some(&p.common),
            VNode::Layer(p) => Some(&p.common),
            VNode::PanelGroup(p) => Some(&p.common),
            VNode::ResizablePanel(p) => Some(&p.common),
            VNode::SplitPane(p) => Some(&p.common),
            VNode::Divider(p) => Some(&p.common),
            VNode::Composite(_) => None,
        }
    }

    /// The widget id used for focus, routing, and local stores.
    pub fn widget_id(&self) -> Option<&str> {
        match self {
            VNode::Button(p) => Some(&p.id),
            VNode::Input(p) => Some(&p.id),
            VNode::Select(p) => Some(&p.id),
            VNode::Checkbox(p) => Some(&p.id),
            VNode::RadioGroup(p) => Some(&p.id),
            VNode::VirtualList(p) => Some(&p.id),
            VNode::Table(p) => Some(&p.id),
            VNode::Tree(p) => Some(&p.id),
            VNode::FilePicker(p) => Some(&p.id),
            VNode::FileTreeExplorer(p) => Some(&p.id),
            VNode::Dropdown(p) => Some(&p.id),
            VNode::CommandPalette(p) => Some(&p.id),
            VNode::ToolApprovalDialog(p) => Some(&p.id),
            VNode::CodeEditor(p) => Some(&p.id),
            VNode::DiffViewer(p) => Some(&p.id),
            VNode::LogsConsole(p) => Some(&p.id),
            VNode::Modal(p) => Some(&p.id),
            VNode::Layer(p) => Some(&p.id),
            VNode::FocusZone(p) => Some(&p.id),
            VNode::FocusTrap(p) => Some(&p.id),
            VNode::ErrorDisplay(p) => p.retry_id.as_deref(),
            _ => None,
        }
    }

    /// Whether this kind can take keyboard focus at all.
    pub fn is_focusable_kind(&self) -> bool {
        matches!(
            self.kind(),
            NodeKind::Button
                | NodeKind::Input
                | NodeKind::Select
                | NodeKind::Checkbox
                | NodeKind::RadioGroup
                | NodeKind::VirtualList
                | NodeKind::Table
                | NodeKind::Tree
                | NodeKind::FilePicker
                | NodeKind::FileTreeExplorer
                | NodeKind::Dropdown
                | NodeKind::CommandPalette
                | NodeKind::ToolApprovalDialog
                | NodeKind::CodeEditor
                | NodeKind::DiffViewer
                | NodeKind::LogsConsole
        )
    }

    pub fn is_disabled(&self) -> bool {
        match self {
            VNode::Button(p) => p.disabled,
            VNode::Input(p) => p.disabled,
            VNode::Select(p) => p.disabled,
            VNode::Checkbox(p) => p.disabled,
            VNode::RadioGroup(p) => p.disabled,
            VNode::Dropdown(p) => p.disabled,
            _ => false,
        }
    }

    /// Declared children, for kinds that have any.
    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Row(p) | VNode::Column(p) | VNode::Box(p) => &p.children,
            VNode::Field(p) => &p.children,
            VNode::Modal(p) => &p.children,
            VNode::FocusZone(p) => &p.children,
            VNode::FocusTrap(p) => &p.children,
            VNode::Layers(p) => &p.children,
            VNode::Layer(p) => &p.children,
            VNode::PanelGroup(p) => &p.children,
            VNode::ResizablePanel(p) => &p.children,
            VNode::SplitPane(p) => &p.children,
            _ => &[],
        }
    }

    /// True for nodes that contribute neither size nor content, and must
    /// not consume gap or justify slots.
    pub fn is_sparse(&self) -> bool {
        matches!(self, VNode::Empty)
    }

    /// True when the node animates on ticks while in the tree.
    pub fn is_animated(&self) -> bool {
        match self {
            VNode::Spinner(_) => true,
            VNode::Progress(p) => p.indeterminate,
            VNode::Skeleton(_) => true,
            _ => false,
        }
    }

    // -- convenience constructors used widely by hosts and tests --

    pub fn row(children: Vec<VNode>) -> Self {
        VNode::Row(ContainerProps {
            children,
            ..Default::default()
        })
    }

    pub fn column(children: Vec<VNode>) -> Self {
        VNode::Column(ContainerProps {
            children,
            ..Default::default()
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        VNode::Text(TextProps {
            text: text.into(),
            ..Default::default()
        })
    }

    pub fn button(id: impl Into<String>, label: impl Into<String>) -> Self {
        VNode::Button(ButtonProps {
            id: id.into(),
            label: label.into(),
            ..Default::default()
        })
    }

    pub fn composite<F>(key: Option<&str>, render: F) -> Self
    where
        F: Fn(&mut HookCx<'_>) -> VNode + 'static,
    {
        VNode::Composite(CompositeProps {
            key: key.map(String::from),
            render: Rc::new(render),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_key() {
        let node = VNode::Row(ContainerProps {
            common: Common::keyed("top"),
            ..Default::default()
        });
        assert_eq!(node.kind(), NodeKind::Row);
        assert_eq!(node.key(), Some("top"));
        assert_eq!(VNode::Empty.key(), None);
    }

    #[test]
    fn test_focusable_kinds() {
        assert!(VNode::button("b", "Go").is_focusable_kind());
        assert!(!VNode::text("hi").is_focusable_kind());
        assert!(!VNode::Empty.is_focusable_kind());
    }

    #[test]
    fn test_sparse_and_animated() {
        assert!(VNode::Empty.is_sparse());
        assert!(!VNode::text("x").is_sparse());
        assert!(VNode::Spinner(SpinnerProps::default()).is_animated());
        assert!(!VNode::Progress(ProgressProps::default()).is_animated());
        assert!(
            VNode::Progress(ProgressProps {
                indeterminate: true,
                ..Default::default()
            })
            .is_animated()
        );
    }
}
