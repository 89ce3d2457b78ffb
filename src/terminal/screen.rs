//! Screen model (C4): two grids (primary + alternate), cursor state, an
//! unbounded scrollback, and the current SGR attribute triple.
//!
//! Grounded in `examples/original_source/terminal_renderer.h`'s
//! `Screen{lines,cursorX,cursorY,savedCursorX,savedCursorY}` duplicated for
//! `m_mainScreen`/`m_alternativeScreen`, and in the teacher's
//! `terminal/state.rs` cursor-motion/erase/scroll helper methods — adapted
//! onto the fragment-based [`Row`]/[`Grid`] of C2 instead of the teacher's
//! per-cell `Cell` array, per Design Note 4 ("duplicated buffers ->
//! two-element array indexed by an active-screen enum").

use std::collections::VecDeque;

use super::color::{Color, Palette};
use super::grid::Grid;
use super::line::Row;
use crate::config::TerminalConfig;

/// Current SGR attribute state (spec §4.4: "the model owns the current
/// attributes triple `(fg,bg,ul)` plus a boolean `ul_on`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attrs {
    pub fg: Color,
    pub bg: Color,
    pub ul: Color,
    pub ul_on: bool,
}

impl Default for Attrs {
    fn default() -> Self {
        Attrs { fg: Color::None, bg: Color::None, ul: Color::None, ul_on: false }
    }
}

impl Attrs {
    /// The color actually written into a fragment's underline channel:
    /// `ul` when underline is on, `NONE` (don't draw) otherwise.
    fn effective_ul(&self) -> Color {
        if self.ul_on { self.ul } else { Color::None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseMode {
    /// CSI J / K mode 0.
    ToEnd,
    /// CSI J / K mode 1.
    ToStart,
    /// CSI J / K mode 2.
    All,
}

#[derive(Debug, Clone)]
pub struct Screen {
    pub grid: Grid,
    pub cursor_x: usize,
    pub cursor_y: usize,
    pub saved_cursor_x: usize,
    pub saved_cursor_y: usize,
}

impl Screen {
    fn new(rows: usize, cols: usize) -> Self {
        Screen { grid: Grid::new(rows, cols), cursor_x: 0, cursor_y: 0, saved_cursor_x: 0, saved_cursor_y: 0 }
    }

    fn save_cursor(&mut self) {
        self.saved_cursor_x = self.cursor_x;
        self.saved_cursor_y = self.cursor_y;
    }

    fn restore_cursor(&mut self) {
        self.cursor_x = self.saved_cursor_x;
        self.cursor_y = self.saved_cursor_y;
    }
}

pub struct TerminalState {
    pub primary: Screen,
    pub alternate: Screen,
    pub using_alternate: bool,
    pub scrollback: VecDeque<Row>,
    pub scrollback_cap: usize,
    pub attrs: Attrs,
    pub rows: usize,
    pub cols: usize,
    pub tab_width: usize,
    /// The base/bright SGR palette, fixed for this terminal's lifetime
    /// (spec §9 Design Note 6).
    pub palette: Palette,
    /// The configured default fg/bg (spec §6), restored by SGR `0`/`39`/`49`
    /// and by a full reset — not the `NONE` sentinel, which per §3 only means
    /// "do not draw this channel" (transparent underline/background).
    pub default_fg: Color,
    pub default_bg: Color,
    /// Scratch text accumulator for consecutive printable codepoints,
    /// flushed to `put_codepoints` on the next control action or end of
    /// input chunk (spec §4.5's "short text accumulator").
    pub print_buffer: Vec<char>,
}

impl TerminalState {
    pub fn new(config: &TerminalConfig) -> Self {
        TerminalState {
            primary: Screen::new(config.initial_rows, config.initial_cols),
            alternate: Screen::new(config.initial_rows, config.initial_cols),
            using_alternate: false,
            scrollback: VecDeque::new(),
            scrollback_cap: config.scrollback_cap,
            attrs: Attrs { fg: config.default_fg, bg: config.default_bg, ul: Color::None, ul_on: false },
            rows: config.initial_rows,
            cols: config.initial_cols,
            tab_width: config.tab_width,
            palette: config.palette,
            default_fg: config.default_fg,
            default_bg: config.default_bg,
            print_buffer: Vec::new(),
        }
    }

    /// The attribute set SGR `0` and a full reset restore (spec §6's
    /// `default_fg`/`default_bg`, not the bare `NONE` sentinel `Attrs`
    /// carries before construction applies the config).
    pub fn default_attrs(&self) -> Attrs {
        Attrs { fg: self.default_fg, bg: self.default_bg, ul: Color::None, ul_on: false }
    }

    pub fn active(&self) -> &Screen {
        if self.using_alternate { &self.alternate } else { &self.primary }
    }

    pub fn active_mut(&mut self) -> &mut Screen {
        if self.using_alternate { &mut self.alternate } else { &mut self.primary }
    }

    /// Inserts `cps` at the cursor, per spec §4.4's wrapping rules: the
    /// primary screen may grow a row past `cols` (clipped only by the
    /// scroll view at paint time); the alternate screen truncates writes
    /// that would pass `cols - 1`.
    pub fn put_codepoints(&mut self, cps: &[char]) {
        if cps.is_empty() {
            return;
        }
        let cols = self.cols;
        let using_alternate = self.using_alternate;
        let attrs = self.attrs;
        let x0 = self.active().cursor_x;
        let y = self.active().cursor_y;

        let cps: &[char] = if using_alternate && x0 < cols {
            let avail = cols - x0;
            if cps.len() > avail { &cps[..avail] } else { cps }
        } else if using_alternate {
            &[]
        } else {
            cps
        };
        if cps.is_empty() {
            return;
        }

        let ul = attrs.effective_ul();
        let screen = self.active_mut();
        if let Some(row) = screen.grid.row_mut(y) {
            row.set_text(x0, cps);
            row.set_color(x0, x0 + cps.len() - 1, attrs.fg, ul, attrs.bg);
        }
        screen.cursor_x = x0 + cps.len();
        if using_alternate {
            screen.cursor_x = screen.cursor_x.min(cols);
        }
    }

    pub fn line_feed(&mut self) {
        let bottom = self.rows - 1;
        if self.active().cursor_y == bottom {
            self.scroll_up();
        } else {
            self.active_mut().cursor_y += 1;
        }
    }

    pub fn carriage_return(&mut self) {
        self.active_mut().cursor_x = 0;
    }

    /// Cursor-only move, per spec §9's resolved Open Question (`BS` does not
    /// delete the character under the cursor).
    pub fn backspace(&mut self) {
        let screen = self.active_mut();
        screen.cursor_x = screen.cursor_x.saturating_sub(1);
    }

    pub fn tab(&mut self) {
        let width = self.tab_width.max(1);
        let cols = self.cols;
        let using_alternate = self.using_alternate;
        let screen = self.active_mut();
        let next = (screen.cursor_x / width + 1) * width;
        screen.cursor_x = if using_alternate { next.min(cols.saturating_sub(1)) } else { next };
    }

    pub fn move_cursor_abs(&mut self, row: i64, col: i64) {
        let rows = self.rows as i64;
        let y = row.clamp(0, rows - 1) as usize;
        let x = if self.using_alternate {
            col.clamp(0, self.cols as i64 - 1).max(0) as usize
        } else {
            col.max(0) as usize
        };
        let screen = self.active_mut();
        screen.cursor_y = y;
        screen.cursor_x = x;
    }

    pub fn move_cursor_rel(&mut self, drow: i64, dcol: i64) {
        let (y, x) = {
            let s = self.active();
            (s.cursor_y as i64, s.cursor_x as i64)
        };
        self.move_cursor_abs(y + drow, x + dcol);
    }

    /// Physically removes `n` cells at the cursor and shifts the remainder
    /// of the row left.
    pub fn delete_chars(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let (x, y) = (self.active().cursor_x, self.active().cursor_y);
        if let Some(row) = self.active_mut().grid.row_mut(y) {
            if x < row.len() {
                row.erase(x, x + n - 1);
            }
        }
    }

    /// Overwrites `n` cells at the cursor with spaces in the current
    /// attributes, keeping row length.
    pub fn erase_chars(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let (x, y) = (self.active().cursor_x, self.active().cursor_y);
        let attrs = self.attrs;
        let ul = attrs.effective_ul();
        if let Some(row) = self.active_mut().grid.row_mut(y) {
            let end = x + n - 1;
            row.set_spaces(x, end);
            row.set_color(x, end, attrs.fg, ul, attrs.bg);
        }
    }

    /// Inserts `n` blank lines above the cursor. On the primary screen, rows
    /// pushed off the bottom are evicted to scrollback; on the alternate
    /// screen they are dropped.
    pub fn insert_lines(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let y = self.active().cursor_y;
        let using_alternate = self.using_alternate;
        let pushed_off = self.active_mut().grid.insert_blank_rows(y, n);
        if !using_alternate {
            self.push_scrollback_many(pushed_off);
        }
    }

    /// Removes `n` lines from the cursor downward, padding the bottom with
    /// blank rows.
    pub fn delete_lines(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let y = self.active().cursor_y;
        self.active_mut().grid.delete_rows(y, n);
    }

    pub fn clear_screen(&mut self, mode: EraseMode) {
        let (x, y) = (self.active().cursor_x, self.active().cursor_y);
        let attrs = self.attrs;
        let ul = attrs.effective_ul();
        let cols = self.cols;
        let screen = self.active_mut();
        match mode {
            EraseMode::All => screen.grid.clear_all(),
            EraseMode::ToEnd => {
                Self::clear_row_range(screen.grid.row_mut(y), x, None, attrs, ul, cols);
                for r in y + 1..screen.grid.height() {
                    *screen.grid.row_mut(r).unwrap() = Row::new();
                }
            }
            EraseMode::ToStart => {
                for r in 0..y {
                    *screen.grid.row_mut(r).unwrap() = Row::new();
                }
                Self::clear_row_range(screen.grid.row_mut(y), 0, Some(x), attrs, ul, cols);
            }
        }
    }

    pub fn clear_line(&mut self, mode: EraseMode) {
        let (x, y) = (self.active().cursor_x, self.active().cursor_y);
        let attrs = self.attrs;
        let ul = attrs.effective_ul();
        let cols = self.cols;
        let screen = self.active_mut();
        match mode {
            EraseMode::ToEnd => Self::clear_row_range(screen.grid.row_mut(y), x, None, attrs, ul, cols),
            EraseMode::ToStart => Self::clear_row_range(screen.grid.row_mut(y), 0, Some(x), attrs, ul, cols),
            // Whole-line erase empties the row outright rather than padding
            // it with spaces out to the screen width (matches the original's
            // `ClearLine` case 2, `glyphs.clear()`).
            EraseMode::All => {
                if let Some(row) = screen.grid.row_mut(y) {
                    *row = Row::new();
                }
            }
        }
    }

    /// Clears `[start, end]` of `row` (end defaulting to the wider of the
    /// row's current length and the screen width, so clearing to end-of-line
    /// pads short rows out to the full screen width, matching conventional
    /// VT erase-to-EOL behavior) with spaces in `attrs`.
    fn clear_row_range(row: Option<&mut Row>, start: usize, end: Option<usize>, attrs: Attrs, ul: Color, cols: usize) {
        let Some(row) = row else { return };
        let end = end.unwrap_or_else(|| cols.max(row.len()).saturating_sub(1));
        if start > end {
            return;
        }
        row.set_spaces(start, end);
        row.set_color(start, end, attrs.fg, ul, attrs.bg);
    }

    pub fn save_cursor(&mut self) {
        self.active_mut().save_cursor();
    }

    pub fn restore_cursor(&mut self) {
        self.active_mut().restore_cursor();
    }

    /// Evicts the top row of the primary screen to scrollback (capped at
    /// `scrollback_cap`) and appends a blank row at the bottom. On the
    /// alternate screen, rotates in place without touching scrollback.
    pub fn scroll_up(&mut self) {
        if self.using_alternate {
            self.alternate.grid.scroll_up_no_scrollback();
        } else if let Some(evicted) = self.primary.grid.scroll_up_evict() {
            self.push_scrollback(evicted);
        }
    }

    fn push_scrollback(&mut self, row: Row) {
        self.scrollback.push_back(row);
        while self.scrollback.len() > self.scrollback_cap {
            self.scrollback.pop_front();
        }
    }

    fn push_scrollback_many(&mut self, rows: Vec<Row>) {
        for row in rows {
            self.push_scrollback(row);
        }
    }

    /// Activates the alternate screen, clearing it (spec §4.4: "switching
    /// to alternate clears it"). Cursor save/restore around DEC private
    /// mode 1047/1049 is the caller's (parser's) responsibility.
    pub fn switch_to_alternate(&mut self) {
        self.alternate.grid.clear_all();
        self.alternate.cursor_x = 0;
        self.alternate.cursor_y = 0;
        self.using_alternate = true;
    }

    pub fn switch_to_primary(&mut self) {
        self.using_alternate = false;
    }

    pub fn reset(&mut self) {
        let rows = self.rows;
        let cols = self.cols;
        self.primary = Screen::new(rows, cols);
        self.alternate = Screen::new(rows, cols);
        self.using_alternate = false;
        self.attrs = self.default_attrs();
        self.print_buffer.clear();
    }

    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
        self.primary.grid.resize_discard(rows, cols);
        self.alternate.grid.resize_discard(rows, cols);
        self.primary.cursor_y = self.primary.cursor_y.min(rows.saturating_sub(1));
        self.alternate.cursor_y = self.alternate.cursor_y.min(rows.saturating_sub(1));
        self.alternate.cursor_x = self.alternate.cursor_x.min(cols.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> TerminalState {
        TerminalState::new(&TerminalConfig { initial_rows: 3, initial_cols: 10, ..TerminalConfig::default() })
    }

    #[test]
    fn scroll_discipline_moves_rows_to_scrollback_in_order() {
        let mut s = state();
        for i in 0..5u8 {
            s.put_codepoints(&[('a' as u8 + i) as char]);
            s.line_feed();
            s.carriage_return();
        }
        assert_eq!(s.scrollback.len(), 3);
        assert_eq!(s.scrollback[0].text, vec!['a']);
        assert_eq!(s.scrollback[2].text, vec!['c']);
        assert_eq!(s.active().cursor_y, 2);
    }

    #[test]
    fn alternate_screen_isolation() {
        let mut s = state();
        s.put_codepoints(&['X']);
        let before = s.primary.grid.row(0).unwrap().text.clone();
        let before_cursor = (s.primary.cursor_x, s.primary.cursor_y);

        s.save_cursor();
        s.switch_to_alternate();
        s.put_codepoints(&['Y']);
        s.line_feed();
        s.switch_to_primary();
        s.restore_cursor();

        assert_eq!(s.primary.grid.row(0).unwrap().text, before);
        assert_eq!((s.primary.cursor_x, s.primary.cursor_y), before_cursor);
        assert_eq!(s.scrollback.len(), 0);
    }

    #[test]
    fn delete_chars_shifts_left() {
        let mut s = state();
        s.put_codepoints(&['A', 'B', 'C', 'D']);
        s.move_cursor_abs(0, 1);
        s.delete_chars(2);
        assert_eq!(s.active().grid.row(0).unwrap().text, vec!['A', 'D']);
    }

    #[test]
    fn erase_chars_keeps_length() {
        let mut s = state();
        s.put_codepoints(&['A', 'B', 'C']);
        s.move_cursor_abs(0, 1);
        s.erase_chars(1);
        assert_eq!(s.active().grid.row(0).unwrap().text, vec!['A', ' ', 'C']);
    }

    #[test]
    fn clear_line_all_empties_the_row_rather_than_padding_it() {
        let mut s = state();
        s.put_codepoints(&['A', 'B', 'C']);
        s.clear_line(EraseMode::All);
        assert!(s.active().grid.row(0).unwrap().is_empty());
    }

    #[test]
    fn sgr_0_restores_configured_default_fg_not_none() {
        let white = Color::rgb(0xff, 0xff, 0xff);
        let mut s = TerminalState::new(&TerminalConfig {
            initial_rows: 3,
            initial_cols: 10,
            default_fg: white,
            ..TerminalConfig::default()
        });
        s.attrs.fg = Color::rgb(1, 2, 3);
        s.attrs = s.default_attrs();
        assert_eq!(s.attrs.fg, white);
    }

    #[test]
    fn put_codepoints_truncates_on_alternate_screen() {
        let mut s = state();
        s.switch_to_alternate();
        s.move_cursor_abs(0, 8);
        s.put_codepoints(&['1', '2', '3', '4']);
        assert_eq!(s.active().grid.row(0).unwrap().text.len(), 10);
        assert_eq!(s.active().cursor_x, 10);
    }
}
