//! Cursor state: position, pending-wrap flag, pen attributes, scroll
//! region, and tab stops.

use crate::cell::SgrAttrs;

/// Default tab stop interval.
const TAB_INTERVAL: u16 = 8;

/// Cursor and per-cursor writing state.
///
/// `row`/`col` are always within grid bounds. The autowrap model is
/// deferred: writing into the last column leaves the cursor on it and sets
/// `pending_wrap`; the wrap happens when the next printable character
/// arrives. Any explicit cursor movement clears the flag.
#[derive(Debug, Clone)]
pub struct Cursor {
    /// Current row (0-indexed, absolute, not origin-relative).
    pub row: u16,
    /// Current column (0-indexed).
    pub col: u16,
    /// Deferred autowrap is armed.
    pub pending_wrap: bool,
    /// Current pen attributes applied to printed cells.
    pub attrs: SgrAttrs,
    /// Scroll region top (0-indexed, inclusive).
    scroll_top: u16,
    /// Scroll region bottom (0-indexed, exclusive).
    scroll_bottom: u16,
    /// Columns with a tab stop set.
    tab_stops: Vec<bool>,
}

impl Cursor {
    /// Create a cursor at the origin with a full-height scroll region and
    /// default tab stops every 8 columns.
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            row: 0,
            col: 0,
            pending_wrap: false,
            attrs: SgrAttrs::default(),
            scroll_top: 0,
            scroll_bottom: rows,
            tab_stops: default_tab_stops(cols),
        }
    }

    /// Scroll region top (inclusive).
    #[must_use]
    pub fn scroll_top(&self) -> u16 {
        self.scroll_top
    }

    /// Scroll region bottom (exclusive).
    #[must_use]
    pub fn scroll_bottom(&self) -> u16 {
        self.scroll_bottom
    }

    /// Move to an absolute position, clamped to the grid. Clears the
    /// pending-wrap flag.
    pub fn move_to(&mut self, row: u16, col: u16, rows: u16, cols: u16) {
        self.row = row.min(rows.saturating_sub(1));
        self.col = col.min(cols.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// CR: return to column 0.
    pub fn carriage_return(&mut self) {
        self.col = 0;
        self.pending_wrap = false;
    }

    /// Move up, stopping at the top edge.
    pub fn move_up(&mut self, count: u16) {
        self.row = self.row.saturating_sub(count);
        self.pending_wrap = false;
    }

    /// Move down, stopping at the bottom edge.
    pub fn move_down(&mut self, count: u16, rows: u16) {
        self.row = self
            .row
            .saturating_add(count)
            .min(rows.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// Move right, stopping at the right margin.
    pub fn move_right(&mut self, count: u16, cols: u16) {
        self.col = self
            .col
            .saturating_add(count)
            .min(cols.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// Move left, stopping at column 0.
    pub fn move_left(&mut self, count: u16) {
        self.col = self.col.saturating_sub(count);
        self.pending_wrap = false;
    }

    /// Set the scroll region. `top` is inclusive, `bottom` exclusive.
    /// Bounds validation (and the DECSTBM cursor home) is the dispatcher's
    /// job; this only records the region.
    pub fn set_scroll_region(&mut self, top: u16, bottom: u16) {
        self.scroll_top = top;
        self.scroll_bottom = bottom;
    }

    /// Reset the scroll region to full height without moving the cursor.
    /// Used on resize.
    pub fn reset_scroll_region(&mut self, rows: u16) {
        self.scroll_top = 0;
        self.scroll_bottom = rows;
    }

    /// Next tab stop strictly right of the cursor, or the last column.
    #[must_use]
    pub fn next_tab_stop(&self, cols: u16) -> u16 {
        let last = cols.saturating_sub(1);
        for col in self.col + 1..cols {
            if self.tab_stops.get(col as usize).copied().unwrap_or(false) {
                return col;
            }
        }
        last
    }

    /// Previous tab stop strictly left of the cursor, or column 0.
    #[must_use]
    pub fn prev_tab_stop(&self) -> u16 {
        for col in (0..self.col).rev() {
            if self.tab_stops.get(col as usize).copied().unwrap_or(false) {
                return col;
            }
        }
        0
    }

    /// Set a tab stop at the current column.
    pub fn set_tab_stop(&mut self) {
        let idx = self.col as usize;
        if idx < self.tab_stops.len() {
            self.tab_stops[idx] = true;
        }
    }

    /// Clear the tab stop at the current column.
    pub fn clear_tab_stop(&mut self) {
        let idx = self.col as usize;
        if idx < self.tab_stops.len() {
            self.tab_stops[idx] = false;
        }
    }

    /// Clear every tab stop.
    pub fn clear_all_tab_stops(&mut self) {
        self.tab_stops.fill(false);
    }

    /// Adjust region and tab stops after a grid resize. Position clamping
    /// is the caller's responsibility (it depends on reflow).
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.reset_scroll_region(rows);
        self.tab_stops = default_tab_stops(cols);
        self.pending_wrap = false;
    }
}

fn default_tab_stops(cols: u16) -> Vec<bool> {
    (0..cols).map(|c| c % TAB_INTERVAL == 0 && c != 0).collect()
}

/// Cursor state captured by DECSC and reapplied by DECRC.
#[derive(Debug, Clone)]
pub struct SavedCursor {
    row: u16,
    col: u16,
    attrs: SgrAttrs,
    origin_mode: bool,
}

impl SavedCursor {
    /// Snapshot the cursor position, pen, and origin mode.
    #[must_use]
    pub fn save(cursor: &Cursor, origin_mode: bool) -> Self {
        Self {
            row: cursor.row,
            col: cursor.col,
            attrs: cursor.attrs,
            origin_mode,
        }
    }

    /// Reapply the snapshot, clamping the position to current bounds.
    /// Returns the saved origin-mode flag for the caller to restore.
    pub fn restore(&self, cursor: &mut Cursor, rows: u16, cols: u16) -> bool {
        cursor.move_to(self.row, self.col, rows, cols);
        cursor.attrs = self.attrs;
        self.origin_mode
    }
}
