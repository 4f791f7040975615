//! Terminal engine: parses fed bytes and applies the resulting actions to
//! the grid, cursor, modes, and scrollback, strictly in stream order.

use crate::cell::{Cell, SgrAttrs};
use crate::cursor::{Cursor, SavedCursor};
use crate::grid::Grid;
use crate::modes::Modes;
use crate::parser::{Action, Parser};
use crate::scrollback::Scrollback;
use crate::viewport;

/// Default scrollback capacity in lines.
pub const DEFAULT_SCROLLBACK: usize = 1000;

/// A complete terminal instance.
///
/// The engine is a pure synchronous state machine: `feed` consumes bytes,
/// everything else queries or adjusts the resulting state. It never performs
/// I/O and never fails on malformed input.
#[derive(Debug)]
pub struct Terminal {
    parser: Parser,
    grid: Grid,
    cursor: Cursor,
    saved_cursor: Option<SavedCursor>,
    scrollback: Scrollback,
    modes: Modes,
    /// Viewport scroll offset: 0 pins to the live grid, n shows n lines of
    /// history. Re-clamped on every query since scrollback moves underneath.
    viewport_offset: usize,
    title: String,
    cols: u16,
    rows: u16,
}

impl Terminal {
    /// Create a terminal with the default scrollback capacity.
    ///
    /// Dimensions are clamped to at least 1x1; the embedding layer rejects
    /// zero dimensions before they reach the engine.
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self::with_scrollback(cols, rows, DEFAULT_SCROLLBACK)
    }

    /// Create a terminal with an explicit scrollback capacity (0 disables).
    #[must_use]
    pub fn with_scrollback(cols: u16, rows: u16, scrollback_lines: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            parser: Parser::new(),
            grid: Grid::new(cols, rows),
            cursor: Cursor::new(cols, rows),
            saved_cursor: None,
            scrollback: Scrollback::new(scrollback_lines),
            modes: Modes::new(),
            viewport_offset: 0,
            title: String::new(),
            cols,
            rows,
        }
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// The visible grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The scrollback buffer.
    #[must_use]
    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    /// Cursor position as `(col, row)` in live-grid coordinates, independent
    /// of the viewport offset.
    #[must_use]
    pub fn cursor_position(&self) -> (u16, u16) {
        (self.cursor.col, self.cursor.row)
    }

    /// Whether the cursor is visible (DECTCEM).
    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        self.modes.cursor_visible()
    }

    /// The terminal title set via OSC 0/2.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Count of malformed/unrecognized sequences discarded by the parser.
    #[must_use]
    pub fn dropped_sequences(&self) -> u64 {
        self.parser.dropped_sequences()
    }

    /// Feed a chunk of terminal output bytes.
    ///
    /// The stream may be split at any byte boundary across calls, including
    /// mid-escape and mid-UTF-8; parsing is identical to the unsplit stream.
    pub fn feed(&mut self, bytes: &[u8]) {
        let mut actions = Vec::new();
        for &b in bytes {
            self.parser.advance(b, &mut actions);
            for action in actions.drain(..) {
                self.apply_action(action);
            }
        }
    }

    /// Scroll the viewport by `delta` lines: positive toward history,
    /// negative toward the live grid. Returns the clamped offset.
    pub fn scroll_viewport(&mut self, delta: i32) -> usize {
        let current = viewport::clamp_offset(self.viewport_offset, &self.scrollback) as i64;
        let limit = self.scrollback.len() as i64;
        self.viewport_offset = (current + i64::from(delta)).clamp(0, limit) as usize;
        self.viewport_offset
    }

    /// Current viewport offset, clamped against the live scrollback length.
    #[must_use]
    pub fn viewport_offset(&self) -> usize {
        viewport::clamp_offset(self.viewport_offset, &self.scrollback)
    }

    /// Render the viewport as text (see [`viewport::dump`]).
    #[must_use]
    pub fn dump_viewport(&self) -> String {
        viewport::dump(&self.grid, &self.scrollback, self.viewport_offset)
    }

    /// Resize to new dimensions, reflowing the visible grid.
    ///
    /// Soft-wrapped logical lines re-break at the new width; scrollback is
    /// preserved verbatim; excess rows on a shrink are evicted to scrollback;
    /// the scroll region resets to full height. Zero dimensions are clamped
    /// to 1.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let cols = cols.max(1);
        let rows = rows.max(1);
        if cols == self.cols && rows == self.rows {
            return;
        }
        tracing::debug!(
            from_cols = self.cols,
            from_rows = self.rows,
            cols,
            rows,
            "resizing terminal"
        );
        let (row, col) = self.grid.resize_reflow(
            cols,
            rows,
            self.cursor.row,
            self.cursor.col,
            &mut self.scrollback,
        );
        self.cols = cols;
        self.rows = rows;
        self.cursor.resize(cols, rows);
        self.cursor.row = row;
        self.cursor.col = col;
        self.viewport_offset = viewport::clamp_offset(self.viewport_offset, &self.scrollback);
    }

    // ── Action dispatch ─────────────────────────────────────────────

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::Print(ch) => self.apply_print(ch),
            Action::Newline => self.apply_newline(),
            Action::CarriageReturn => self.cursor.carriage_return(),
            Action::Tab => {
                self.cursor.col = self.cursor.next_tab_stop(self.cols);
                self.cursor.pending_wrap = false;
            }
            Action::Backspace => self.cursor.move_left(1),
            Action::Bell => {}
            Action::CursorUp(count) => self.cursor.move_up(count),
            Action::CursorDown(count) => self.cursor.move_down(count, self.rows),
            Action::CursorRight(count) => self.cursor.move_right(count, self.cols),
            Action::CursorLeft(count) => self.cursor.move_left(count),
            Action::CursorNextLine(count) => {
                self.cursor.move_down(count, self.rows);
                self.cursor.carriage_return();
            }
            Action::CursorPrevLine(count) => {
                self.cursor.move_up(count);
                self.cursor.carriage_return();
            }
            Action::CursorColumn(col) => {
                self.cursor
                    .move_to(self.cursor.row, col, self.rows, self.cols);
            }
            Action::CursorRow(row) => self.move_cursor_absolute(row, self.cursor.col),
            Action::CursorPosition { row, col } => self.move_cursor_absolute(row, col),
            Action::EraseInDisplay(mode) => {
                let bg = self.cursor.attrs.bg;
                match mode {
                    0 => self.grid.erase_below(self.cursor.row, self.cursor.col, bg),
                    1 => self.grid.erase_above(self.cursor.row, self.cursor.col, bg),
                    _ => self.grid.erase_all(bg),
                }
            }
            Action::EraseInLine(mode) => {
                let bg = self.cursor.attrs.bg;
                match mode {
                    0 => self
                        .grid
                        .erase_line_right(self.cursor.row, self.cursor.col, bg),
                    1 => self
                        .grid
                        .erase_line_left(self.cursor.row, self.cursor.col, bg),
                    _ => self.grid.erase_line(self.cursor.row, bg),
                }
            }
            Action::EraseChars(count) => {
                self.grid
                    .erase_chars(self.cursor.row, self.cursor.col, count, self.cursor.attrs.bg);
            }
            Action::InsertChars(count) => {
                self.grid
                    .insert_chars(self.cursor.row, self.cursor.col, count, self.cursor.attrs.bg);
                self.cursor.pending_wrap = false;
            }
            Action::DeleteChars(count) => {
                self.grid
                    .delete_chars(self.cursor.row, self.cursor.col, count, self.cursor.attrs.bg);
                self.cursor.pending_wrap = false;
            }
            Action::InsertLines(count) => {
                self.grid.insert_lines(
                    self.cursor.row,
                    count,
                    self.cursor.scroll_top(),
                    self.cursor.scroll_bottom(),
                    self.cursor.attrs.bg,
                );
                self.cursor.pending_wrap = false;
            }
            Action::DeleteLines(count) => {
                self.grid.delete_lines(
                    self.cursor.row,
                    count,
                    self.cursor.scroll_top(),
                    self.cursor.scroll_bottom(),
                    self.cursor.attrs.bg,
                );
                self.cursor.pending_wrap = false;
            }
            Action::ScrollUp(count) => self.scroll_region_up(count),
            Action::ScrollDown(count) => self.grid.scroll_down(
                self.cursor.scroll_top(),
                self.cursor.scroll_bottom(),
                count,
                self.cursor.attrs.bg,
            ),
            Action::SetScrollRegion { top, bottom } => {
                let bottom = if bottom == 0 { self.rows } else { bottom };
                if top + 1 < bottom && bottom <= self.rows {
                    self.cursor.set_scroll_region(top, bottom);
                    // DECSTBM homes the cursor (to the region top under
                    // origin mode, the grid origin otherwise).
                    if self.modes.origin_mode() {
                        self.cursor.row = self.cursor.scroll_top();
                        self.cursor.col = 0;
                        self.cursor.pending_wrap = false;
                    } else {
                        self.cursor.move_to(0, 0, self.rows, self.cols);
                    }
                } else {
                    tracing::debug!(top, bottom, "ignoring scroll region with invalid bounds");
                }
            }
            Action::Sgr(params) => self.cursor.attrs.apply_sgr_params(&params),
            Action::DecSet(params) => {
                for &p in &params {
                    self.modes.set_dec_mode(p, true);
                }
            }
            Action::DecRst(params) => {
                for &p in &params {
                    self.modes.set_dec_mode(p, false);
                }
            }
            Action::AnsiSet(params) => {
                for &p in &params {
                    self.modes.set_ansi_mode(p, true);
                }
            }
            Action::AnsiRst(params) => {
                for &p in &params {
                    self.modes.set_ansi_mode(p, false);
                }
            }
            Action::SaveCursor => {
                self.saved_cursor = Some(SavedCursor::save(&self.cursor, self.modes.origin_mode()));
            }
            Action::RestoreCursor => match &self.saved_cursor {
                Some(saved) => {
                    let origin = saved.restore(&mut self.cursor, self.rows, self.cols);
                    self.modes.set_origin_mode(origin);
                }
                // DECRC without a prior DECSC restores the defaults.
                None => {
                    self.cursor.move_to(0, 0, self.rows, self.cols);
                    self.cursor.attrs = SgrAttrs::default();
                    self.modes.set_origin_mode(false);
                }
            },
            Action::Index => self.apply_index(),
            Action::ReverseIndex => {
                if self.cursor.row == self.cursor.scroll_top() {
                    self.grid.scroll_down(
                        self.cursor.scroll_top(),
                        self.cursor.scroll_bottom(),
                        1,
                        self.cursor.attrs.bg,
                    );
                } else {
                    self.cursor.move_up(1);
                }
                self.cursor.pending_wrap = false;
            }
            Action::NextLine => {
                self.cursor.carriage_return();
                self.apply_index();
            }
            Action::FullReset => {
                let capacity = self.scrollback.capacity();
                self.grid = Grid::new(self.cols, self.rows);
                self.cursor = Cursor::new(self.cols, self.rows);
                self.saved_cursor = None;
                self.scrollback = Scrollback::new(capacity);
                self.modes = Modes::new();
                self.viewport_offset = 0;
                self.title.clear();
            }
            Action::SetTitle(title) => self.title = title,
            Action::SetTabStop => self.cursor.set_tab_stop(),
            Action::ClearTabStop(mode) => match mode {
                0 => self.cursor.clear_tab_stop(),
                3 => self.cursor.clear_all_tab_stops(),
                _ => {}
            },
            Action::BackTab(count) => {
                for _ in 0..count {
                    self.cursor.col = self.cursor.prev_tab_stop();
                }
                self.cursor.pending_wrap = false;
            }
            // Keypad modes affect input encoding, which the engine does not
            // produce; accepted so well-behaved apps do not trip the drop
            // counter.
            Action::ApplicationKeypad | Action::NormalKeypad => {}
        }
    }

    /// CUP/VPA-style absolute positioning, honoring DECOM.
    fn move_cursor_absolute(&mut self, row: u16, col: u16) {
        if self.modes.origin_mode() {
            let abs = row.saturating_add(self.cursor.scroll_top());
            self.cursor.row = abs.min(self.cursor.scroll_bottom().saturating_sub(1));
            self.cursor.col = col.min(self.cols.saturating_sub(1));
            self.cursor.pending_wrap = false;
        } else {
            self.cursor.move_to(row, col, self.rows, self.cols);
        }
    }

    fn apply_print(&mut self, ch: char) {
        if self.cursor.pending_wrap {
            if self.modes.autowrap() {
                self.wrap_to_next_line();
            } else {
                // DECAWM off: keep overwriting the last column.
                self.cursor.pending_wrap = false;
            }
        }

        let width = Cell::display_width(ch);
        if width == 0 {
            // Non-spacing scalars (combining marks, ZWJ, variation
            // selectors): deterministic no-op.
            return;
        }

        // A wide char that does not fit before the margin wraps first.
        if width == 2 && self.cursor.col + 1 >= self.cols {
            if self.modes.autowrap() {
                self.wrap_to_next_line();
            } else {
                self.cursor.pending_wrap = false;
                return;
            }
        }

        // IRM: shift the rest of the row right before writing.
        if self.modes.insert_mode() {
            self.grid.insert_chars(
                self.cursor.row,
                self.cursor.col,
                u16::from(width),
                self.cursor.attrs.bg,
            );
        }

        let written =
            self.grid
                .write_printable(self.cursor.row, self.cursor.col, ch, self.cursor.attrs);
        if written == 0 {
            return;
        }

        if self.cursor.col + u16::from(written) >= self.cols {
            // Deferred autowrap: the cursor stays on the written cell (the
            // head cell for a wide char) with the flag armed.
            self.cursor.pending_wrap = true;
        } else {
            self.cursor.col += u16::from(written);
            self.cursor.pending_wrap = false;
        }
    }

    fn apply_newline(&mut self) {
        if self.modes.linefeed_mode() {
            self.cursor.col = 0;
        }
        self.apply_index();
    }

    /// Cursor down one line, scrolling the region when at its bottom.
    fn apply_index(&mut self) {
        if self.cursor.row + 1 >= self.cursor.scroll_bottom() {
            self.scroll_region_up(1);
        } else if self.cursor.row + 1 < self.rows {
            self.cursor.row += 1;
        }
        self.cursor.pending_wrap = false;
    }

    /// Scroll the region up, feeding scrollback only when the region spans
    /// the whole grid. An inner region discards its evicted rows.
    fn scroll_region_up(&mut self, count: u16) {
        let top = self.cursor.scroll_top();
        let bottom = self.cursor.scroll_bottom();
        let bg = self.cursor.attrs.bg;
        if top == 0 && bottom == self.rows {
            self.grid
                .scroll_up_into(top, bottom, count, &mut self.scrollback, bg);
        } else {
            self.grid.scroll_up(top, bottom, count, bg);
        }
    }

    fn wrap_to_next_line(&mut self) {
        // The line continues onto the next row: record the soft break so
        // reflow can rejoin it later.
        self.grid.set_row_wrapped(self.cursor.row, true);
        self.cursor.col = 0;
        self.apply_index();
    }
}
