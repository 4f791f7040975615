//! Terminal grid: the visible 2D cell matrix.
//!
//! The grid owns one [`Row`] per screen line and provides the operations the
//! action dispatcher needs (write, erase, shift, scroll, resize). Each row
//! carries a `wrapped` flag marking soft line breaks, which is what makes
//! reflow on resize possible: consecutive rows whose predecessors are marked
//! wrapped form one logical line.
//!
//! The wide-character invariant is enforced here, in the write and erase
//! paths: a two-column character always occupies a head cell immediately
//! followed by its continuation cell, and any operation that would split
//! the pair blanks both halves.

use crate::cell::{Cell, Color, SgrAttrs};
use crate::scrollback::Scrollback;

/// One screen line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Exactly `cols` cells; continuation cells occupy their own slot.
    pub cells: Vec<Cell>,
    /// True if this line soft-wrapped into the next row (no hard newline).
    pub wrapped: bool,
}

impl Row {
    /// A blank, unwrapped row of the given width.
    #[must_use]
    pub fn blank(cols: u16) -> Self {
        Self {
            cells: vec![Cell::default(); cols as usize],
            wrapped: false,
        }
    }

    /// Erase every cell with the given background and drop the wrap flag.
    pub fn erase_all(&mut self, bg: Color) {
        for cell in &mut self.cells {
            cell.erase(bg);
        }
        self.wrapped = false;
    }
}

/// 2D terminal cell grid.
///
/// The grid does not own scrollback — see [`Scrollback`](crate::Scrollback).
/// Scroll operations that feed it take the buffer as a parameter.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: Vec<Row>,
    cols: u16,
}

impl Grid {
    /// Create a new grid filled with blank cells.
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            rows: (0..rows).map(|_| Row::blank(cols)).collect(),
            cols,
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
        self.rows.len() as u16
    }

    /// The cell at `(row, col)`, or `None` if out of bounds.
    #[must_use]
    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        self.rows.get(row as usize)?.cells.get(col as usize)
    }

    /// Mutable access to the cell at `(row, col)`.
    pub fn cell_mut(&mut self, row: u16, col: u16) -> Option<&mut Cell> {
        self.rows.get_mut(row as usize)?.cells.get_mut(col as usize)
    }

    /// The cells of the given row.
    #[must_use]
    pub fn row_cells(&self, row: u16) -> Option<&[Cell]> {
        self.rows.get(row as usize).map(|r| r.cells.as_slice())
    }

    /// The row structure at the given index.
    #[must_use]
    pub fn row(&self, row: u16) -> Option<&Row> {
        self.rows.get(row as usize)
    }

    /// Whether the given row soft-wraps into the next.
    #[must_use]
    pub fn row_wrapped(&self, row: u16) -> bool {
        self.rows.get(row as usize).is_some_and(|r| r.wrapped)
    }

    /// Mark or unmark the given row as soft-wrapped.
    pub fn set_row_wrapped(&mut self, row: u16, wrapped: bool) {
        if let Some(r) = self.rows.get_mut(row as usize) {
            r.wrapped = wrapped;
        }
    }

    // ── Erase operations ────────────────────────────────────────────

    /// ED 0: erase from the cursor to the end of the display.
    pub fn erase_below(&mut self, row: u16, col: u16, bg: Color) {
        if row as usize >= self.rows.len() {
            return;
        }
        self.erase_span(row, col, self.cols, bg);
        // A row erased to its end no longer continues onto the next.
        self.set_row_wrapped(row, false);
        for r in row + 1..self.rows() {
            self.rows[r as usize].erase_all(bg);
        }
    }

    /// ED 1: erase from the start of the display through the cursor.
    pub fn erase_above(&mut self, row: u16, col: u16, bg: Color) {
        if row as usize >= self.rows.len() {
            return;
        }
        for r in 0..row {
            self.rows[r as usize].erase_all(bg);
        }
        self.erase_span(row, 0, (col + 1).min(self.cols), bg);
    }

    /// ED 2: erase the entire display.
    pub fn erase_all(&mut self, bg: Color) {
        for row in &mut self.rows {
            row.erase_all(bg);
        }
    }

    /// EL 0: erase from the cursor to the end of the line.
    pub fn erase_line_right(&mut self, row: u16, col: u16, bg: Color) {
        self.erase_span(row, col, self.cols, bg);
        self.set_row_wrapped(row, false);
    }

    /// EL 1: erase from the start of the line through the cursor.
    pub fn erase_line_left(&mut self, row: u16, col: u16, bg: Color) {
        self.erase_span(row, 0, (col + 1).min(self.cols), bg);
    }

    /// EL 2: erase the entire line.
    pub fn erase_line(&mut self, row: u16, bg: Color) {
        if let Some(r) = self.rows.get_mut(row as usize) {
            r.erase_all(bg);
        }
    }

    /// ECH: erase `count` cells starting at `(row, col)` without shifting.
    pub fn erase_chars(&mut self, row: u16, col: u16, count: u16, bg: Color) {
        if col >= self.cols {
            return;
        }
        let end = col.saturating_add(count).min(self.cols);
        self.erase_span(row, col, end, bg);
    }

    /// Erase `[start_col, end_col)` of one row, fixing up any wide pair
    /// split at either boundary.
    fn erase_span(&mut self, row: u16, start_col: u16, end_col: u16, bg: Color) {
        let cols = self.cols as usize;
        let Some(r) = self.rows.get_mut(row as usize) else {
            return;
        };
        let sc = (start_col as usize).min(cols);
        let ec = (end_col as usize).min(cols);
        if sc >= ec {
            return;
        }

        // Left fixup: erasing a continuation orphans its head just outside
        // the span.
        if sc > 0 && r.cells[sc].is_wide_continuation() {
            r.cells[sc - 1].erase(bg);
        }
        // Right fixup: the cell just past the span is a continuation whose
        // head is being erased.
        if ec < cols && r.cells[ec].is_wide_continuation() {
            r.cells[ec].erase(bg);
        }
        for cell in &mut r.cells[sc..ec] {
            cell.erase(bg);
        }
    }

    // ── Insert / delete characters ──────────────────────────────────

    /// ICH: insert `count` blank cells at `(row, col)`, shifting the rest of
    /// the row right. Cells pushed past the right margin are lost.
    pub fn insert_chars(&mut self, row: u16, col: u16, count: u16, bg: Color) {
        let cols = self.cols as usize;
        let c = col as usize;
        if count == 0 || c >= cols {
            return;
        }
        let Some(r) = self.rows.get_mut(row as usize) else {
            return;
        };
        let n = (count as usize).min(cols - c);

        // Inserting at a continuation cell orphans the head at col-1.
        if c > 0 && r.cells[c].is_wide_continuation() {
            r.cells[c - 1].erase(bg);
        }

        r.cells[c..].rotate_right(n);
        for cell in &mut r.cells[c..c + n] {
            cell.erase(bg);
        }

        // The shift may have left an orphaned continuation right after the
        // inserted blanks, or pushed a wide head into the last column.
        if c + n < cols && r.cells[c + n].is_wide_continuation() {
            r.cells[c + n].erase(bg);
        }
        if r.cells[cols - 1].is_wide() {
            r.cells[cols - 1].erase(bg);
        }
    }

    /// DCH: delete `count` cells at `(row, col)`, shifting the rest of the
    /// row left and blanking the vacated cells at the right margin.
    pub fn delete_chars(&mut self, row: u16, col: u16, count: u16, bg: Color) {
        let cols = self.cols as usize;
        let c = col as usize;
        if count == 0 || c >= cols {
            return;
        }
        let Some(r) = self.rows.get_mut(row as usize) else {
            return;
        };
        let n = (count as usize).min(cols - c);

        // Deleting a continuation orphans the head at col-1.
        if c > 0 && r.cells[c].is_wide_continuation() {
            r.cells[c - 1].erase(bg);
        }

        r.cells[c..].rotate_left(n);
        for cell in &mut r.cells[cols - n..] {
            cell.erase(bg);
        }

        // The cell shifted into col may be a continuation whose head was
        // deleted.
        if r.cells[c].is_wide_continuation() {
            r.cells[c].erase(bg);
        }
    }

    // ── Scroll operations ───────────────────────────────────────────

    /// Scroll rows up within `[top, bottom)`: the top `count` rows are
    /// discarded and blank rows appear at the bottom of the region.
    pub fn scroll_up(&mut self, top: u16, bottom: u16, count: u16, bg: Color) {
        let top = (top as usize).min(self.rows.len());
        let bottom = (bottom as usize).min(self.rows.len());
        if top >= bottom || count == 0 {
            return;
        }
        let count = (count as usize).min(bottom - top);
        self.rows[top..bottom].rotate_left(count);
        for row in &mut self.rows[bottom - count..bottom] {
            row.erase_all(bg);
        }
    }

    /// Scroll rows down within `[top, bottom)`: blank rows appear at the top
    /// of the region and rows falling past the bottom are discarded.
    pub fn scroll_down(&mut self, top: u16, bottom: u16, count: u16, bg: Color) {
        let top = (top as usize).min(self.rows.len());
        let bottom = (bottom as usize).min(self.rows.len());
        if top >= bottom || count == 0 {
            return;
        }
        let count = (count as usize).min(bottom - top);
        self.rows[top..bottom].rotate_right(count);
        for row in &mut self.rows[top..top + count] {
            row.erase_all(bg);
        }
    }

    /// Scroll up, pushing the evicted top rows into scrollback.
    ///
    /// This is the normal "content moves up" path used when a newline at the
    /// bottom of a full-height scroll region makes room. Evicted rows keep
    /// their wrap flags so reflowed history stays coherent.
    pub fn scroll_up_into(
        &mut self,
        top: u16,
        bottom: u16,
        count: u16,
        scrollback: &mut Scrollback,
        bg: Color,
    ) {
        let t = (top as usize).min(self.rows.len());
        let b = (bottom as usize).min(self.rows.len());
        if t >= b || count == 0 {
            return;
        }
        let n = (count as usize).min(b - t);
        for row in &self.rows[t..t + n] {
            scrollback.push_row(&row.cells, row.wrapped);
        }
        self.scroll_up(top, bottom, count, bg);
    }

    /// IL: insert `count` blank lines at `row` within `[top, bottom)`.
    pub fn insert_lines(&mut self, row: u16, count: u16, top: u16, bottom: u16, bg: Color) {
        if row < top || row >= bottom {
            return;
        }
        self.scroll_down(row, bottom, count, bg);
    }

    /// DL: delete `count` lines at `row` within `[top, bottom)`.
    pub fn delete_lines(&mut self, row: u16, count: u16, top: u16, bottom: u16, bg: Color) {
        if row < top || row >= bottom {
            return;
        }
        self.scroll_up(row, bottom, count, bg);
    }

    // ── Writing ─────────────────────────────────────────────────────

    /// Write a wide (2-column) character at `(row, col)`, fixing up any
    /// wide pair the write partially overlaps. No-op if the continuation
    /// would fall past the right margin.
    pub fn write_wide_char(&mut self, row: u16, col: u16, ch: char, attrs: SgrAttrs) {
        let cols = self.cols as usize;
        let c = col as usize;
        if c + 1 >= cols {
            return;
        }
        let Some(r) = self.rows.get_mut(row as usize) else {
            return;
        };

        // Overwriting a continuation at col orphans the head at col-1.
        if c > 0 && r.cells[c].is_wide_continuation() {
            r.cells[c - 1].clear();
        }
        // Overwriting a head at col+1 orphans its continuation at col+2.
        if r.cells[c + 1].is_wide() && c + 2 < cols {
            r.cells[c + 2].clear();
        }

        let (lead, cont) = Cell::wide(ch, attrs);
        r.cells[c] = lead;
        r.cells[c + 1] = cont;
    }

    /// Write one printable scalar with terminal-width semantics.
    ///
    /// Returns the written display width:
    /// - `0` for zero-width scalars (ignored) or a wide char that does not
    ///   fit at `col`
    /// - `1` for narrow cells
    /// - `2` for wide cells
    ///
    /// Wrap policy is the caller's concern; this only writes.
    pub fn write_printable(&mut self, row: u16, col: u16, ch: char, attrs: SgrAttrs) -> u8 {
        let cols = self.cols as usize;
        let c = col as usize;
        if row as usize >= self.rows.len() || c >= cols {
            return 0;
        }

        match Cell::display_width(ch) {
            0 => 0,
            1 => {
                let r = &mut self.rows[row as usize];
                if c > 0 && r.cells[c].is_wide_continuation() {
                    r.cells[c - 1].clear();
                }
                if r.cells[c].is_wide() && c + 1 < cols {
                    r.cells[c + 1].clear();
                }
                r.cells[c].set_content(ch, 1);
                r.cells[c].attrs = attrs;
                1
            }
            _ => {
                if c + 1 >= cols {
                    return 0;
                }
                self.write_wide_char(row, col, ch, attrs);
                2
            }
        }
    }

    // ── Resize with reflow ──────────────────────────────────────────

    /// Resize the visible grid to new dimensions, reflowing soft-wrapped
    /// lines to the new width.
    ///
    /// Reflow is scoped to the visible grid: rows already in scrollback are
    /// never re-wrapped. On a width change, logical lines (runs of rows
    /// joined by wrap flags) are re-broken at the new width. On a height
    /// shrink, excess rows above the cursor are evicted to scrollback; on a
    /// height grow, blank rows are appended at the bottom.
    ///
    /// Returns the cursor's new `(row, col)`.
    pub fn resize_reflow(
        &mut self,
        new_cols: u16,
        new_rows: u16,
        cursor_row: u16,
        cursor_col: u16,
        scrollback: &mut Scrollback,
    ) -> (u16, u16) {
        let (mut cur_row, mut cur_col) = (cursor_row, cursor_col);

        if new_cols != self.cols && new_cols > 0 {
            (cur_row, cur_col) = self.rewrap(new_cols, cur_row, cur_col);
            self.cols = new_cols;
        }

        let have = self.rows.len();
        let want = new_rows as usize;
        if have > want {
            // Evict from the top, but never past the cursor row.
            let excess = have - want;
            let evict = excess.min(cur_row as usize);
            for row in self.rows.drain(..evict) {
                scrollback.push_row(&row.cells, row.wrapped);
            }
            cur_row -= evict as u16;
            // Anything still over the limit is dropped from the bottom.
            self.rows.truncate(want);
        } else {
            for _ in have..want {
                self.rows.push(Row::blank(self.cols));
            }
        }

        (
            cur_row.min(new_rows.saturating_sub(1)),
            cur_col.min(new_cols.saturating_sub(1)),
        )
    }

    /// Re-break the grid's logical lines at a new width. Returns the
    /// remapped cursor position; the row count may change.
    fn rewrap(&mut self, new_cols: u16, cursor_row: u16, cursor_col: u16) -> (u16, u16) {
        let old_rows = std::mem::take(&mut self.rows);
        let mut new_rows: Vec<Row> = Vec::with_capacity(old_rows.len());
        let mut cursor_pos: Option<(usize, usize)> = None;

        // Column offset of the cursor within its logical line, filled in
        // while gathering the line that contains it.
        let mut line: Vec<Cell> = Vec::new();
        let mut line_cursor: Option<usize> = None;

        for (r, row) in old_rows.iter().enumerate() {
            if r as u16 == cursor_row {
                line_cursor = Some(line.len() + cursor_col as usize);
            }
            line.extend_from_slice(&row.cells);
            if !row.wrapped {
                let pos = Self::rewrap_line(&line, new_cols, line_cursor, &mut new_rows);
                cursor_pos = cursor_pos.or(pos);
                line.clear();
                line_cursor = None;
            }
        }
        // A trailing run with a dangling wrap flag is still a logical line.
        if !line.is_empty() {
            let pos = Self::rewrap_line(&line, new_cols, line_cursor, &mut new_rows);
            cursor_pos = cursor_pos.or(pos);
        }
        if new_rows.is_empty() {
            new_rows.push(Row::blank(new_cols));
        }

        let (row, col) = cursor_pos.unwrap_or((new_rows.len() - 1, 0));
        self.rows = new_rows;
        (row as u16, (col as u16).min(new_cols.saturating_sub(1)))
    }

    /// Re-break one logical line into rows of `new_cols` columns, appending
    /// them to `out`. `cursor_off` is the cursor's column offset within the
    /// line, if the cursor sits on it; the remapped `(row, col)` is returned
    /// with `row` indexed into `out`.
    fn rewrap_line(
        cells: &[Cell],
        new_cols: u16,
        cursor_off: Option<usize>,
        out: &mut Vec<Row>,
    ) -> Option<(usize, usize)> {
        let width = new_cols as usize;
        // Trailing blank cells are padding from the old width, not content.
        let content_len = cells
            .iter()
            .rposition(|c| *c != Cell::default())
            .map_or(0, |i| i + 1);

        let mut cur: Vec<Cell> = Vec::with_capacity(width);
        let mut consumed = 0usize;
        let mut pos: Option<(usize, usize)> = None;

        for cell in &cells[..content_len] {
            if cell.is_wide_continuation() {
                consumed += 1;
                continue;
            }
            let w = if cell.is_wide() { 2 } else { 1 };
            if w > width {
                // A wide char cannot fit on a one-column grid at all.
                consumed += w;
                continue;
            }
            if cur.len() + w > width {
                cur.resize(width, Cell::default());
                out.push(Row {
                    cells: std::mem::replace(&mut cur, Vec::with_capacity(width)),
                    wrapped: true,
                });
            }
            if cursor_off.is_some_and(|off| off <= consumed) && pos.is_none() {
                pos = Some((out.len(), cur.len()));
            }
            if cell.is_wide() {
                let (lead, cont) = Cell::wide(cell.content(), cell.attrs);
                cur.push(lead);
                cur.push(cont);
            } else {
                cur.push(*cell);
            }
            consumed += w;
        }

        // Cursor past the line's content (sitting in trailing blanks).
        if let Some(off) = cursor_off
            && pos.is_none()
        {
            let over = (off - consumed).min(width.saturating_sub(1) - cur.len().min(width - 1));
            pos = Some((out.len(), (cur.len() + over).min(width - 1)));
        }

        cur.resize(width, Cell::default());
        out.push(Row {
            cells: cur,
            wrapped: false,
        });
        pos
    }
}
