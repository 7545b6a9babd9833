//! Table keyboard routing: header/body navigation and sort toggling.
//!
//! Row index `-1` addresses the header when `show_header` is on.
//! Left/Right move the focused column; Enter/Space on a sortable header
//! column toggles sort, in a body row it fires `RowPress`.

use std::sync::Arc;

use twire::keys;

use crate::action::{Action, RouteOutcome};
use crate::props::{SortDir, TableProps};

/// Store entry for one table widget.
#[derive(Clone, Debug, Default)]
pub struct TableState {
    pub focused_row: i32,
    pub focused_col: usize,
    pub scroll_top: i32,
    pub last_clicked_key: Option<String>,
    rows_ptr: usize,
}

impl TableState {
    /// Invariant-checks against the owning props identity.
    pub fn ensure(&mut self, props: &TableProps) {
        let ptr = Arc::as_ptr(&props.rows) as usize;
        if self.rows_ptr != ptr {
            self.rows_ptr = ptr;
            let last = props.rows.len() as i32 - 1;
            self.focused_row = self.focused_row.clamp(self.min_row(props), last.max(0));
            self.focused_col = self
                .focused_col
                .min(props.columns.len().saturating_sub(1));
        }
    }

    fn min_row(&self, props: &TableProps) -> i32 {
        if props.show_header { -1 } else { 0 }
    }

    fn keep_row_visible(&mut self, viewport_rows: i32) {
        if self.focused_row < 0 {
            self.scroll_top = 0;
            return;
        }
        if self.focused_row < self.scroll_top {
            self.scroll_top = self.focused_row;
        } else if self.focused_row >= self.scroll_top + viewport_rows {
            self.scroll_top = self.focused_row - viewport_rows + 1;
        }
        self.scroll_top = self.scroll_top.max(0);
    }
}

/// Routes a key-down into a focused table.
pub fn route_table_key(
    state: &mut TableState,
    props: &TableProps,
    viewport_rows: i32,
    key: u16,
) -> RouteOutcome {
    state.ensure(props);
    let last_row = props.rows.len() as i32 - 1;
    let last_col = props.columns.len().saturating_sub(1);
    let min_row = state.min_row(props);

    match key {
        keys::UP => {
            let next = (state.focused_row - 1).max(min_row);
            if next == state.focused_row {
                return RouteOutcome::none();
            }
            state.focused_row = next;
        }
        keys::DOWN => {
            let next = (state.focused_row + 1).min(last_row.max(min_row));
            if next == state.focused_row {
                return RouteOutcome::none();
            }
            state.focused_row = next;
        }
        keys::LEFT => {
            if state.focused_col == 0 {
                return RouteOutcome::none();
            }
            state.focused_col -= 1;
        }
        keys::RIGHT => {
            if state.focused_col >= last_col {
                return RouteOutcome::none();
            }
            state.focused_col += 1;
        }
        keys::HOME => state.focused_row = min_row,
        keys::END => state.focused_row = last_row.max(min_row),
        keys::ENTER | keys::SPACE => {
            if state.focused_row < 0 {
                // Header: toggle sort on a sortable column.
                let Some(col) = props.columns.get(state.focused_col) else {
                    return RouteOutcome::none();
                };
                if !col.sortable {
                    return RouteOutcome::none();
                }
                let dir = match &props.sort {
                    Some((key, SortDir::Asc)) if *key == col.key => SortDir::Desc,
                    _ => SortDir::Asc,
                };
                return RouteOutcome::action(Action::Sort {
                    id: props.id.clone(),
                    key: col.key.clone(),
                    dir,
                });
            }
            let Some(row) = props.rows.get(state.focused_row as usize) else {
                return RouteOutcome::none();
            };
            return RouteOutcome::action(Action::RowPress {
                id: props.id.clone(),
                row: state.focused_row as usize,
                key: row.key.clone(),
            });
        }
        _ => return RouteOutcome::none(),
    }

    state.keep_row_visible(viewport_rows);
    RouteOutcome::render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::{TableColumn, TableRow};

    fn props(rows: usize) -> TableProps {
        TableProps {
            id: "tbl".into(),
            columns: Arc::new(vec![
                TableColumn {
                    key: "name".into(),
                    title: "Name".into(),
                    sortable: true,
                    ..Default::default()
                },
                TableColumn {
                    key: "size".into(),
                    title: "Size".into(),
                    sortable: false,
                    ..Default::default()
                },
            ]),
            rows: Arc::new(
                (0..rows)
                    .map(|i| TableRow {
                        key: format!("r{i}"),
                        cells: vec![format!("row {i}"), format!("{i}")],
                    })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn test_header_reachable_when_shown() {
        let mut state = TableState::default();
        let p = props(3);
        route_table_key(&mut state, &p, 10, keys::UP);
        assert_eq!(state.focused_row, -1);
        // No header: UP from row 0 stays.
        let mut state = TableState::default();
        let p2 = TableProps {
            show_header: false,
            ..props(3)
        };
        let out = route_table_key(&mut state, &p2, 10, keys::UP);
        assert!(!out.needs_render);
        assert_eq!(state.focused_row, 0);
    }

    #[test]
    fn test_sort_toggles_on_sortable_header() {
        let mut state = TableState::default();
        let p = props(3);
        route_table_key(&mut state, &p, 10, keys::UP);
        let out = route_table_key(&mut state, &p, 10, keys::ENTER);
        assert_eq!(
            out.action,
            Some(Action::Sort {
                id: "tbl".into(),
                key: "name".into(),
                dir: SortDir::Asc
            })
        );
        // Already ascending by name: toggles to descending.
        let sorted = TableProps {
            sort: Some(("name".into(), SortDir::Asc)),
            ..props(3)
        };
        let out = route_table_key(&mut state, &sorted, 10, keys::SPACE);
        assert!(matches!(out.action, Some(Action::Sort { dir: SortDir::Desc, .. })));
    }

    #[test]
    fn test_unsortable_header_column_ignored() {
        let mut state = TableState::default();
        let p = props(3);
        route_table_key(&mut state, &p, 10, keys::UP);
        route_table_key(&mut state, &p, 10, keys::RIGHT);
        let out = route_table_key(&mut state, &p, 10, keys::ENTER);
        assert!(out.action.is_none());
    }

    #[test]
    fn test_body_enter_fires_row_press() {
        let mut state = TableState::default();
        let p = props(3);
        route_table_key(&mut state, &p, 10, keys::DOWN);
        let out = route_table_key(&mut state, &p, 10, keys::ENTER);
        assert_eq!(
            out.action,
            Some(Action::RowPress {
                id: "tbl".into(),
                row: 1,
                key: "r1".into()
            })
        );
    }

    #[test]
    fn test_scroll_follows_focus() {
        let mut state = TableState::default();
        let p = props(30);
        route_table_key(&mut state, &p, 5, keys::END);
        assert_eq!(state.focused_row, 29);
        assert_eq!(state.scroll_top, 25);
        route_table_key(&mut state, &p, 5, keys::HOME);
        assert_eq!(state.scroll_top, 0);
    }

    #[test]
    fn test_new_rows_identity_clamps_focus() {
        let mut state = TableState::default();
        let p = props(30);
        route_table_key(&mut state, &p, 5, keys::END);
        let p2 = props(3);
        state.ensure(&p2);
        assert_eq!(state.focused_row, 2);
    }
}
