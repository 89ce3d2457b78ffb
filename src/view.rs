//! Selection & scroll view (C6): a stateless projection from terminal state
//! plus a scroll offset and viewport size to a sequence of styled rows and a
//! cursor position, for an external renderer to paint.
//!
//! Grounded in `examples/original_source/terminal_renderer.h`'s
//! `m_scrollOffset`/`GetScrollOffset`/`SetScrollOffset` and in the teacher's
//! `Grid::visible_offset`/`visible_row` — redesigned as a pure read-only
//! function rather than a stateful field on the grid, per spec §4.6
//! ("the view does not copy rows; it hands back borrowed references").

use crate::terminal::{Row, TerminalState};

/// A read-only projection of terminal state for one paint.
pub struct ScrollView<'a> {
    /// Visible rows, top to bottom, borrowed from scrollback and/or the
    /// active grid.
    pub rows: Vec<&'a Row>,
    /// `(col, row)` of the cursor within the viewport, or `None` when the
    /// cursor's line does not intersect the viewport.
    pub cursor: Option<(usize, usize)>,
}

/// Projects `state` through `scroll_offset` (0 = bottom, clamped) into a
/// `viewport_rows` x `viewport_cols` view, per spec §4.6.
pub fn scroll_view(
    state: &TerminalState,
    scroll_offset: usize,
    viewport_rows: usize,
    viewport_cols: usize,
) -> ScrollView<'_> {
    if state.using_alternate {
        return alternate_view(state, viewport_rows, viewport_cols);
    }
    primary_view(state, scroll_offset, viewport_rows)
}

fn alternate_view(state: &TerminalState, viewport_rows: usize, _viewport_cols: usize) -> ScrollView<'_> {
    let screen = &state.alternate;
    let mut rows = Vec::with_capacity(viewport_rows.min(screen.grid.height()));
    for i in 0..viewport_rows {
        if let Some(row) = screen.grid.row(i) {
            rows.push(row);
        }
    }
    let cursor = (screen.cursor_y < viewport_rows).then_some((screen.cursor_x, screen.cursor_y));
    ScrollView { rows, cursor }
}

fn primary_view(state: &TerminalState, scroll_offset: usize, viewport_rows: usize) -> ScrollView<'_> {
    let screen = &state.primary;
    let scrollback_len = state.scrollback.len();
    let total_lines = scrollback_len + screen.grid.height();
    let max_offset = total_lines.saturating_sub(viewport_rows);
    let offset = scroll_offset.min(max_offset);
    let start = total_lines.saturating_sub(viewport_rows + offset);

    let mut rows = Vec::with_capacity(viewport_rows);
    for i in 0..viewport_rows {
        let global = start + i;
        if global >= total_lines {
            break;
        }
        let row = if global < scrollback_len {
            &state.scrollback[global]
        } else {
            screen.grid.row(global - scrollback_len).expect("global index within primary grid bounds")
        };
        rows.push(row);
    }

    let cursor_global = scrollback_len + screen.cursor_y;
    let cursor = (cursor_global >= start && cursor_global < start + viewport_rows)
        .then_some((screen.cursor_x, cursor_global - start));

    ScrollView { rows, cursor }
}

/// Clamps a requested scroll offset (in lines, 0 = bottom) to the valid
/// range for `state` and `viewport_rows`, per spec §4.6.
pub fn clamp_scroll_offset(state: &TerminalState, requested: i64, viewport_rows: usize) -> usize {
    if state.using_alternate {
        return 0;
    }
    let total_lines = state.scrollback.len() + state.primary.grid.height();
    let max_offset = total_lines.saturating_sub(viewport_rows) as i64;
    requested.clamp(0, max_offset) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerminalConfig;

    fn state_with_lines(rows: usize, cols: usize, lines: usize) -> TerminalState {
        let mut state = TerminalState::new(&TerminalConfig { initial_rows: rows, initial_cols: cols, ..Default::default() });
        for i in 0..lines {
            let c = char::from_u32('a' as u32 + (i % 26) as u32).unwrap();
            state.put_codepoints(&[c]);
            state.line_feed();
            state.carriage_return();
        }
        state
    }

    #[test]
    fn bottom_view_shows_most_recent_lines() {
        let state = state_with_lines(5, 10, 12);
        let view = scroll_view(&state, 0, 5, 10);
        assert_eq!(view.rows.len(), 5);
        let texts: Vec<String> = view.rows.iter().map(|r| r.text.iter().collect()).collect();
        // 12 lines 'a'..'l' on a 5-row screen: the last 5 live rows are i,j,k,l,(blank cursor row)
        assert_eq!(texts[0], "i");
        assert_eq!(texts[3], "l");
    }

    #[test]
    fn scroll_offset_clamped_to_history_start() {
        let state = state_with_lines(5, 10, 12);
        let clamped = clamp_scroll_offset(&state, 1_000_000, 5);
        let view = scroll_view(&state, clamped, 5, 10);
        assert_eq!(view.rows.len(), 5);
        let first: String = view.rows[0].text.iter().collect();
        assert_eq!(first, "a");
    }

    #[test]
    fn alternate_screen_forces_offset_zero() {
        let mut state = state_with_lines(5, 10, 3);
        state.switch_to_alternate();
        assert_eq!(clamp_scroll_offset(&state, 50, 5), 0);
        let view = scroll_view(&state, 50, 5, 10);
        assert_eq!(view.rows.len(), 5);
    }
}
