//! Rasterized frame snapshots for representative screens.

use std::sync::Arc;

use trellis::props::*;
use trellis::testing::{rasterize, render_view};
use trellis::{Size, VNode};

fn raster_text(view: &VNode, cols: u16, rows: u16) -> String {
    let bytes = render_view(view, Size::new(cols, rows)).unwrap();
    rasterize(&bytes).unwrap().to_text()
}

#[test]
fn test_simple_screen() {
    let view = VNode::column(vec![VNode::text("hello"), VNode::button("go", "Go")]);
    insta::assert_snapshot!(raster_text(&view, 12, 2), @r###"
    hello
    [ Go ]
    "###);
}

#[test]
fn test_bordered_box_with_gap() {
    let view = VNode::Box(ContainerProps {
        border: true,
        gap: 1,
        children: vec![VNode::text("first"), VNode::text("second")],
        ..Default::default()
    });
    insta::assert_snapshot!(raster_text(&view, 10, 5), @r###"
    ┌──────┐
    │first │
    │      │
    │second│
    └──────┘
    "###);
}

#[test]
fn test_checkbox_and_progress_row() {
    let view = VNode::column(vec![
        VNode::Checkbox(CheckboxProps {
            id: "opt".into(),
            label: "enable".into(),
            checked: true,
            ..Default::default()
        }),
        VNode::Progress(ProgressProps {
            value: 0.5,
            common: Common {
                width: Dim::Cells(10),
                ..Default::default()
            },
            ..Default::default()
        }),
    ]);
    insta::assert_snapshot!(raster_text(&view, 12, 2), @r###"
    [x] enable
    █████░░░░░
    "###);
}

#[test]
fn test_table_header_and_rows() {
    let view = VNode::Table(TableProps {
        id: "t".into(),
        columns: Arc::new(vec![
            TableColumn {
                key: "name".into(),
                title: "Name".into(),
                width: Some(6),
                ..Default::default()
            },
            TableColumn {
                key: "size".into(),
                title: "Size".into(),
                width: Some(4),
                ..Default::default()
            },
        ]),
        rows: Arc::new(vec![
            TableRow {
                key: "a".into(),
                cells: vec!["a.txt".into(), "12".into()],
            },
            TableRow {
                key: "b".into(),
                cells: vec!["b.txt".into(), "34".into()],
            },
        ]),
        ..Default::default()
    });
    insta::assert_snapshot!(raster_text(&view, 14, 3), @r###"
    Name   Size
    a.txt  12
    b.txt  34
    "###);
}

#[test]
fn test_render_is_stable_across_fresh_trees() {
    let build = || {
        VNode::column(vec![
            VNode::Status(StatusProps {
                level: Severity::Success,
                text: "ready".into(),
                ..Default::default()
            }),
            VNode::Sparkline(SparklineProps {
                values: Arc::new(vec![1.0, 3.0, 2.0, 8.0, 5.0]),
                ..Default::default()
            }),
        ])
    };
    let a = render_view(&build(), Size::new(20, 3)).unwrap();
    let b = render_view(&build(), Size::new(20, 3)).unwrap();
    assert_eq!(a, b);
}
