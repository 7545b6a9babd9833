//! Command palette routing: query editing, source cycling, selection.
//!
//! The palette is host-controlled state (open flag, query, selection all
//! live in props); routing emits actions describing the transition the
//! host should apply. Items are filtered by a subsequence match against
//! the query, scoped to the active source prefix.

use twire::keys;

use crate::action::{Action, RouteOutcome};
use crate::props::{CommandPaletteProps, PaletteItem};

/// Subsequence match: every query char must appear in order. Earlier and
/// denser matches score higher; `None` means no match.
pub fn fuzzy_score(query: &str, candidate: &str) -> Option<i32> {
    if query.is_empty() {
        return Some(0);
    }
    let lower_candidate = candidate.to_lowercase();
    let mut score = 0i32;
    let mut last_hit: Option<usize> = None;
    let mut from = 0usize;
    for qc in query.to_lowercase().chars() {
        let found = lower_candidate[from..].char_indices().find(|(_, c)| *c == qc)?;
        let at = from + found.0;
        score += match last_hit {
            Some(prev) if at == prev + 1 => 3, // contiguous run
            _ => 1,
        };
        // Earlier first-hit is better.
        if last_hit.is_none() {
            score -= at as i32 / 4;
        }
        last_hit = Some(at);
        from = at + qc.len_utf8();
    }
    Some(score)
}

/// The items visible for the current query and active source, best
/// matches first with stable order for ties.
pub fn filtered_items<'a>(props: &'a CommandPaletteProps) -> Vec<&'a PaletteItem> {
    let source = props
        .sources
        .get(props.active_source)
        .map(String::as_str)
        .unwrap_or("");
    let mut scored: Vec<(i32, usize, &PaletteItem)> = props
        .items
        .iter()
        .enumerate()
        .filter(|(_, item)| source.is_empty() || item.source == source)
        .filter_map(|(i, item)| fuzzy_score(&props.query, &item.label).map(|s| (s, i, item)))
        .collect();
    scored.sort_by_key(|(score, index, _)| (-score, *index));
    scored.into_iter().map(|(_, _, item)| item).collect()
}

/// Routes a key-down into a focused, open palette.
pub fn route_palette_key(props: &CommandPaletteProps, key: u16) -> RouteOutcome {
    if !props.open {
        return RouteOutcome::none();
    }
    let visible = filtered_items(props);
    match key {
        keys::UP => {
            let next = props.selected.saturating_sub(1);
            if next == props.selected {
                return RouteOutcome::none();
            }
            RouteOutcome::action(Action::PaletteMoved {
                id: props.id.clone(),
                index: next,
            })
        }
        keys::DOWN => {
            let last = visible.len().saturating_sub(1);
            let next = (props.selected + 1).min(last);
            if next == props.selected {
                return RouteOutcome::none();
            }
            RouteOutcome::action(Action::PaletteMoved {
                id: props.id.clone(),
                index: next,
            })
        }
        keys::TAB => {
            if props.sources.is_empty() {
                return RouteOutcome::none();
            }
            let next = (props.active_source + 1) % props.sources.len();
            RouteOutcome::action(Action::PaletteSource {
                id: props.id.clone(),
                index: next,
            })
        }
        keys::ENTER => match visible.get(props.selected) {
            Some(item) => RouteOutcome::action(Action::PaletteSelected {
                id: props.id.clone(),
                item_id: item.id.clone(),
            }),
            None => RouteOutcome::none(),
        },
        keys::ESCAPE => RouteOutcome::action(Action::PaletteClosed {
            id: props.id.clone(),
        }),
        keys::BACKSPACE => {
            if props.query.is_empty() {
                return RouteOutcome::none();
            }
            let mut query = props.query.clone();
            query.pop();
            RouteOutcome::action(Action::PaletteQuery {
                id: props.id.clone(),
                query,
            })
        }
        _ => RouteOutcome::none(),
    }
}

/// Routes a text event into the palette query.
pub fn route_palette_text(props: &CommandPaletteProps, ch: char) -> RouteOutcome {
    if !props.open {
        return RouteOutcome::none();
    }
    let mut query = props.query.clone();
    query.push(ch);
    RouteOutcome::action(Action::PaletteQuery {
        id: props.id.clone(),
        query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn props(query: &str, selected: usize) -> CommandPaletteProps {
        CommandPaletteProps {
            id: "palette".into(),
            open: true,
            query: query.into(),
            selected,
            items: Arc::new(vec![
                PaletteItem {
                    id: "file:/src/app.ts".into(),
                    label: "src/app.ts".into(),
                    source: "files".into(),
                },
                PaletteItem {
                    id: "file:/README.md".into(),
                    label: "README.md".into(),
                    source: "files".into(),
                },
                PaletteItem {
                    id: "cmd:quit".into(),
                    label: "Quit".into(),
                    source: "commands".into(),
                },
            ]),
            sources: Arc::new(vec!["files".into(), "commands".into()]),
            active_source: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_fuzzy_subsequence() {
        assert!(fuzzy_score("app", "src/app.ts").is_some());
        assert!(fuzzy_score("zz", "src/app.ts").is_none());
        // Contiguous match beats scattered.
        assert!(fuzzy_score("app", "app.ts").unwrap() > fuzzy_score("app", "a_p_p").unwrap());
    }

    #[test]
    fn test_filter_by_query_and_source() {
        let p = props("app", 0);
        let visible = filtered_items(&p);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "file:/src/app.ts");
        // Commands source hides file entries.
        let p = CommandPaletteProps {
            active_source: 1,
            query: String::new(),
            ..props("", 0)
        };
        let visible = filtered_items(&p);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "cmd:quit");
    }

    #[test]
    fn test_text_grows_query() {
        let p = props("ap", 0);
        let out = route_palette_text(&p, 'p');
        assert_eq!(
            out.action,
            Some(Action::PaletteQuery {
                id: "palette".into(),
                query: "app".into()
            })
        );
    }

    #[test]
    fn test_enter_selects_current_item() {
        let p = props("app", 0);
        let out = route_palette_key(&p, keys::ENTER);
        assert_eq!(
            out.action,
            Some(Action::PaletteSelected {
                id: "palette".into(),
                item_id: "file:/src/app.ts".into()
            })
        );
    }

    #[test]
    fn test_tab_cycles_sources() {
        let p = props("", 0);
        let out = route_palette_key(&p, keys::TAB);
        assert_eq!(
            out.action,
            Some(Action::PaletteSource {
                id: "palette".into(),
                index: 1
            })
        );
    }

    #[test]
    fn test_escape_closes() {
        let p = props("", 0);
        let out = route_palette_key(&p, keys::ESCAPE);
        assert_eq!(out.action, Some(Action::PaletteClosed { id: "palette".into() }));
    }

    #[test]
    fn test_closed_palette_ignores_keys() {
        let p = CommandPaletteProps {
            open: false,
            ..props("", 0)
        };
        assert!(route_palette_key(&p, keys::ENTER).action.is_none());
        assert!(route_palette_text(&p, 'a').action.is_none());
    }
}
