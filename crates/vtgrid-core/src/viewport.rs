//! Viewport: the window the host sees, composed from scrollback + grid.
//!
//! The viewport is a pure function of the scrollback buffer, the grid, and a
//! scroll offset. Offset 0 is the live view (the grid itself); offset N shows
//! the view as if scrolled back N lines, with scrollback lines entering from
//! the top. No cells are copied to maintain it.

use crate::cell::Cell;
use crate::grid::Grid;
use crate::scrollback::Scrollback;

/// Clamp a requested scroll offset to `[0, scrollback.len()]`.
#[must_use]
pub fn clamp_offset(requested: usize, scrollback: &Scrollback) -> usize {
    requested.min(scrollback.len())
}

/// The cells of viewport row `index` at the given offset.
///
/// Rows above the grid come from scrollback; a scrollback line narrower than
/// the grid is reported as-is (it was stored verbatim).
#[must_use]
pub fn row<'a>(
    grid: &'a Grid,
    scrollback: &'a Scrollback,
    offset: usize,
    index: u16,
) -> Option<&'a [Cell]> {
    let offset = clamp_offset(offset, scrollback);
    if index >= grid.rows() {
        return None;
    }
    let absolute = scrollback.len() - offset + index as usize;
    if absolute < scrollback.len() {
        scrollback.get(absolute).map(|l| l.cells.as_slice())
    } else {
        grid.row_cells((absolute - scrollback.len()) as u16)
    }
}

/// Render the full viewport as plain text.
///
/// Each row is rendered with trailing blanks trimmed; rows are joined with
/// `\n` and there is no trailing newline. A fully blank viewport therefore
/// renders as a sequence of empty lines.
#[must_use]
pub fn dump(grid: &Grid, scrollback: &Scrollback, offset: usize) -> String {
    let mut lines = Vec::with_capacity(grid.rows() as usize);
    for index in 0..grid.rows() {
        let cells = row(grid, scrollback, offset, index).unwrap_or(&[]);
        lines.push(render_line(cells));
    }
    lines.join("\n")
}

/// One row as text: continuation cells are skipped (the head character
/// already covers both columns) and trailing spaces are trimmed.
fn render_line(cells: &[Cell]) -> String {
    let line: String = cells
        .iter()
        .filter(|c| !c.is_wide_continuation())
        .map(Cell::content)
        .collect();
    line.trim_end_matches(' ').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::SgrAttrs;

    fn write_str(g: &mut Grid, row: u16, text: &str) {
        let mut col = 0;
        for ch in text.chars() {
            col += u16::from(g.write_printable(row, col, ch, SgrAttrs::default()));
        }
    }

    #[test]
    fn blank_grid_dumps_empty_lines() {
        let g = Grid::new(10, 3);
        let sb = Scrollback::new(100);
        assert_eq!(dump(&g, &sb, 0), "\n\n");
    }

    #[test]
    fn dump_trims_trailing_blanks_and_joins_rows() {
        let mut g = Grid::new(10, 3);
        write_str(&mut g, 0, "hello");
        write_str(&mut g, 1, "world");
        let sb = Scrollback::new(100);
        assert_eq!(dump(&g, &sb, 0), "hello\nworld\n");
    }

    #[test]
    fn dump_preserves_interior_spaces() {
        let mut g = Grid::new(10, 1);
        write_str(&mut g, 0, "a  b");
        let sb = Scrollback::new(100);
        assert_eq!(dump(&g, &sb, 0), "a  b");
    }

    #[test]
    fn wide_char_renders_once() {
        let mut g = Grid::new(6, 1);
        write_str(&mut g, 0, "a中b");
        let sb = Scrollback::new(100);
        assert_eq!(dump(&g, &sb, 0), "a中b");
    }

    #[test]
    fn offset_pulls_scrollback_lines_in_from_top() {
        let mut g = Grid::new(3, 2);
        write_str(&mut g, 0, "CC");
        write_str(&mut g, 1, "DD");
        let mut sb = Scrollback::new(100);
        sb.push_row(&[Cell::new('A'); 3], false);
        sb.push_row(&[Cell::new('B'); 3], false);

        assert_eq!(dump(&g, &sb, 0), "CC\nDD");
        assert_eq!(dump(&g, &sb, 1), "BBB\nCC");
        assert_eq!(dump(&g, &sb, 2), "AAA\nBBB");
    }

    #[test]
    fn offset_clamps_to_scrollback_len() {
        let mut g = Grid::new(3, 2);
        write_str(&mut g, 0, "CC");
        let mut sb = Scrollback::new(100);
        sb.push_row(&[Cell::new('A'); 3], false);

        assert_eq!(clamp_offset(999, &sb), 1);
        assert_eq!(dump(&g, &sb, 999), dump(&g, &sb, 1));
    }

    #[test]
    fn offset_with_empty_scrollback_is_live_view() {
        let mut g = Grid::new(3, 1);
        write_str(&mut g, 0, "X");
        let sb = Scrollback::new(100);
        assert_eq!(clamp_offset(5, &sb), 0);
        assert_eq!(dump(&g, &sb, 5), "X");
    }

    #[test]
    fn narrow_scrollback_line_is_reported_verbatim() {
        let mut g = Grid::new(5, 1);
        write_str(&mut g, 0, "LIVE");
        let mut sb = Scrollback::new(100);
        sb.push_row(&[Cell::new('Z'); 2], false);
        assert_eq!(row(&g, &sb, 1, 0).unwrap().len(), 2);
        assert_eq!(dump(&g, &sb, 1), "ZZ");
    }

    #[test]
    fn row_out_of_bounds_is_none() {
        let g = Grid::new(3, 2);
        let sb = Scrollback::new(100);
        assert!(row(&g, &sb, 0, 2).is_none());
    }
}
