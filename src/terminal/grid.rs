//! The grid (C4 building block): an ordered, bounded sequence of [`Row`]s.
//!
//! Grounded in the teacher's `terminal/grid.rs` `Grid { rows: VecDeque<Row>,
//! .. }` shape and in `examples/original_source/terminal_renderer.h`'s
//! `Screen { lines: Vec<TextLine>, .. }` duplicated per primary/alternate
//! screen. The per-cell `Cell`/`CellFlags` representation of the teacher is
//! not carried over — rows here are the fragment-based [`Row`] of C2.

use std::collections::VecDeque;

use super::line::Row;

#[derive(Debug, Clone)]
pub struct Grid {
    pub rows: VecDeque<Row>,
    pub cols: usize,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        let mut deque = VecDeque::with_capacity(rows);
        for _ in 0..rows {
            deque.push_back(Row::new());
        }
        Grid { rows: deque, cols }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }

    /// Clears every row in place (used entering the alternate screen and on
    /// full reset), keeping the grid's row count.
    pub fn clear_all(&mut self) {
        for r in self.rows.iter_mut() {
            *r = Row::new();
        }
    }

    /// Scrolls the whole grid up by one: the top row is removed and returned
    /// (for eviction to scrollback on the primary screen), and a blank row
    /// is appended at the bottom.
    pub fn scroll_up_evict(&mut self) -> Option<Row> {
        let evicted = self.rows.pop_front();
        self.rows.push_back(Row::new());
        evicted
    }

    /// Same as [`Self::scroll_up_evict`] but the evicted row is dropped, not
    /// returned — used on the alternate screen, which never feeds
    /// scrollback (spec §4.4).
    pub fn scroll_up_no_scrollback(&mut self) {
        self.rows.pop_front();
        self.rows.push_back(Row::new());
    }

    /// Inserts `n` blank rows at `index`, shifting rows at and below `index`
    /// down. Rows pushed off the bottom are removed from the grid and
    /// returned in top-to-bottom order, for the caller to evict to
    /// scrollback (primary screen) or drop (alternate screen), per spec
    /// §4.4's `insert_lines`.
    pub fn insert_blank_rows(&mut self, index: usize, n: usize) -> Vec<Row> {
        let index = index.min(self.rows.len());
        let height = self.rows.len();
        for _ in 0..n {
            self.rows.insert(index, Row::new());
        }
        let mut pushed_off = Vec::new();
        while self.rows.len() > height {
            if let Some(row) = self.rows.pop_back() {
                pushed_off.push(row);
            }
        }
        pushed_off.reverse();
        pushed_off
    }

    /// Removes `n` rows starting at `index`, shifting rows below up, and
    /// appends blank rows at the bottom to keep the grid's height, per spec
    /// §4.4's `delete_lines`.
    pub fn delete_rows(&mut self, index: usize, n: usize) {
        let height = self.rows.len();
        let end = (index + n).min(height);
        if index >= end {
            return;
        }
        for _ in index..end {
            self.rows.remove(index);
        }
        while self.rows.len() < height {
            self.rows.push_back(Row::new());
        }
    }

    /// Resizes the grid's row count, padding with blank rows at the bottom
    /// when growing and truncating from the bottom when shrinking. Used by
    /// the alternate screen (content discarded on resize, per xterm/
    /// Alacritty convention) and is also the building block the primary
    /// screen wraps with scrollback eviction.
    pub fn resize_discard(&mut self, rows: usize, cols: usize) {
        self.cols = cols;
        self.rows.truncate(rows);
        while self.rows.len() < rows {
            self.rows.push_back(Row::new());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_up_evicts_top_row() {
        let mut grid = Grid::new(3, 10);
        grid.row_mut(0).unwrap().append_text(&['a']);
        grid.row_mut(1).unwrap().append_text(&['b']);
        let evicted = grid.scroll_up_evict().unwrap();
        assert_eq!(evicted.text, vec!['a']);
        assert_eq!(grid.row(0).unwrap().text, vec!['b']);
        assert_eq!(grid.height(), 3);
        assert!(grid.row(2).unwrap().is_empty());
    }

    #[test]
    fn insert_blank_rows_pushes_bottom_off() {
        let mut grid = Grid::new(3, 10);
        grid.row_mut(2).unwrap().append_text(&['z']);
        let pushed = grid.insert_blank_rows(0, 1);
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].text, vec!['z']);
        assert_eq!(grid.height(), 3);
        assert!(grid.row(0).unwrap().is_empty());
    }

    #[test]
    fn delete_rows_pads_bottom_with_blanks() {
        let mut grid = Grid::new(3, 10);
        grid.row_mut(0).unwrap().append_text(&['a']);
        grid.row_mut(1).unwrap().append_text(&['b']);
        grid.delete_rows(0, 1);
        assert_eq!(grid.row(0).unwrap().text, vec!['b']);
        assert!(grid.row(2).unwrap().is_empty());
        assert_eq!(grid.height(), 3);
    }
}
