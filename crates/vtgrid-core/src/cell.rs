//! Terminal cell: the fundamental unit of the grid.
//!
//! Each cell stores one character plus its SGR attributes. Wide (two-column)
//! characters occupy a head cell and a continuation placeholder; the pairing
//! invariant is maintained by the grid's write path, so everything above it
//! can assume a continuation cell always sits directly after its head.

use bitflags::bitflags;
use unicode_width::UnicodeWidthChar;

bitflags! {
    /// SGR text attribute flags.
    ///
    /// Maps directly to the ECMA-48 / VT100 SGR parameter values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SgrFlags: u16 {
        const BOLD          = 1 << 0;
        const DIM           = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const BLINK         = 1 << 4;
        const INVERSE       = 1 << 5;
        const HIDDEN        = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
    }
}

bitflags! {
    /// Cell-level flags that are orthogonal to SGR attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u8 {
        /// This cell is the leading (left) cell of a wide (2-column) character.
        const WIDE_CHAR = 1 << 0;
        /// This cell is the trailing (right) continuation of a wide character.
        /// Its content is meaningless; rendering uses the leading cell.
        const WIDE_CONTINUATION = 1 << 1;
    }
}

/// Color representation for terminal cells.
///
/// Supports the standard terminal color model hierarchy:
/// default → 16 named → 256 indexed → 24-bit RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Terminal default (SGR 39 / SGR 49).
    #[default]
    Default,
    /// Named color index (0-15): standard 8 + bright 8.
    Named(u8),
    /// 256-color palette index (0-255).
    Indexed(u8),
    /// 24-bit true color.
    Rgb(u8, u8, u8),
}

/// SGR attributes for a cell: flags + foreground/background colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SgrAttrs {
    pub flags: SgrFlags,
    pub fg: Color,
    pub bg: Color,
}

impl SgrAttrs {
    /// Reset all attributes to default (SGR 0).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply a parsed SGR parameter list to this attribute set.
    ///
    /// SGR is stateful: parameters are deltas against the current attributes.
    /// An empty parameter list is equivalent to SGR 0 (full reset). Unknown
    /// parameters are skipped so a partially understood sequence still applies
    /// the parts we do understand.
    pub fn apply_sgr_params(&mut self, params: &[u16]) {
        if params.is_empty() {
            self.reset();
            return;
        }

        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => self.reset(),
                1 => self.flags.insert(SgrFlags::BOLD),
                2 => self.flags.insert(SgrFlags::DIM),
                3 => self.flags.insert(SgrFlags::ITALIC),
                4 => self.flags.insert(SgrFlags::UNDERLINE),
                5 | 6 => self.flags.insert(SgrFlags::BLINK),
                7 => self.flags.insert(SgrFlags::INVERSE),
                8 => self.flags.insert(SgrFlags::HIDDEN),
                9 => self.flags.insert(SgrFlags::STRIKETHROUGH),
                // Double underline; rendered as plain underline.
                21 => self.flags.insert(SgrFlags::UNDERLINE),
                22 => self.flags.remove(SgrFlags::BOLD | SgrFlags::DIM),
                23 => self.flags.remove(SgrFlags::ITALIC),
                24 => self.flags.remove(SgrFlags::UNDERLINE),
                25 => self.flags.remove(SgrFlags::BLINK),
                27 => self.flags.remove(SgrFlags::INVERSE),
                28 => self.flags.remove(SgrFlags::HIDDEN),
                29 => self.flags.remove(SgrFlags::STRIKETHROUGH),
                n @ 30..=37 => self.fg = Color::Named((n - 30) as u8),
                38 => {
                    let (color, consumed) = Self::parse_extended_color(&params[i + 1..]);
                    if let Some(color) = color {
                        self.fg = color;
                    }
                    i += consumed;
                }
                39 => self.fg = Color::Default,
                n @ 40..=47 => self.bg = Color::Named((n - 40) as u8),
                48 => {
                    let (color, consumed) = Self::parse_extended_color(&params[i + 1..]);
                    if let Some(color) = color {
                        self.bg = color;
                    }
                    i += consumed;
                }
                49 => self.bg = Color::Default,
                n @ 90..=97 => self.fg = Color::Named((n - 90 + 8) as u8),
                n @ 100..=107 => self.bg = Color::Named((n - 100 + 8) as u8),
                _ => {}
            }
            i += 1;
        }
    }

    /// Parse the tail of an SGR 38/48 extended color: `5;n` or `2;r;g;b`.
    ///
    /// Returns the color (if well-formed) and how many parameters were
    /// consumed beyond the 38/48 introducer.
    fn parse_extended_color(rest: &[u16]) -> (Option<Color>, usize) {
        match rest.first() {
            Some(5) => match rest.get(1) {
                Some(&n) if n <= 255 => (Some(Color::Indexed(n as u8)), 2),
                _ => (None, rest.len().min(2)),
            },
            Some(2) => {
                if let (Some(&r), Some(&g), Some(&b)) = (rest.get(1), rest.get(2), rest.get(3)) {
                    if r <= 255 && g <= 255 && b <= 255 {
                        return (Some(Color::Rgb(r as u8, g as u8, b as u8)), 4);
                    }
                }
                (None, rest.len().min(4))
            }
            _ => (None, 0),
        }
    }
}

/// A single cell in the terminal grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// The character content. A space for empty/erased cells.
    content: char,
    /// Display width of the content in terminal columns (1 or 2 for wide chars).
    width: u8,
    /// Cell-level flags (wide char, continuation).
    pub flags: CellFlags,
    /// SGR text attributes.
    pub attrs: SgrAttrs,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            content: ' ',
            width: 1,
            flags: CellFlags::empty(),
            attrs: SgrAttrs::default(),
        }
    }
}

impl Cell {
    /// Create a new cell with the given character and default attributes.
    pub fn new(ch: char) -> Self {
        Self {
            content: ch,
            width: 1,
            flags: CellFlags::empty(),
            attrs: SgrAttrs::default(),
        }
    }

    /// Create a wide (2-column) character cell.
    ///
    /// Returns `(leading, continuation)` pair. The leading cell holds the
    /// character; the continuation cell is a placeholder.
    pub fn wide(ch: char, attrs: SgrAttrs) -> (Self, Self) {
        let leading = Self {
            content: ch,
            width: 2,
            flags: CellFlags::WIDE_CHAR,
            attrs,
        };
        let continuation = Self {
            content: ' ',
            width: 0,
            flags: CellFlags::WIDE_CONTINUATION,
            attrs,
        };
        (leading, continuation)
    }

    /// Terminal display width of a Unicode scalar: 0, 1, or 2 columns.
    ///
    /// Non-spacing marks, format controls, and other zero-width scalars
    /// return 0; the print path leaves the grid unchanged for them.
    pub fn display_width(ch: char) -> u8 {
        UnicodeWidthChar::width(ch).unwrap_or(0).min(2) as u8
    }

    /// The character content of this cell.
    pub fn content(&self) -> char {
        self.content
    }

    /// The display width in terminal columns.
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Whether this cell is the leading half of a wide character.
    pub fn is_wide(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_CHAR)
    }

    /// Whether this cell is a continuation (trailing half) of a wide character.
    pub fn is_wide_continuation(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_CONTINUATION)
    }

    /// Whether this cell renders as blank with default background.
    ///
    /// Used by the viewport dump to trim trailing blanks.
    pub fn is_blank(&self) -> bool {
        self.content == ' ' && !self.is_wide_continuation() && self.attrs.bg == Color::Default
    }

    /// Set the character content and display width.
    pub fn set_content(&mut self, ch: char, width: u8) {
        self.content = ch;
        self.width = width;
        // Clear wide flags when replacing content.
        self.flags
            .remove(CellFlags::WIDE_CHAR | CellFlags::WIDE_CONTINUATION);
    }

    /// Reset this cell to a blank space with the given background attributes.
    ///
    /// Used by erase operations (ED, EL, ECH) which fill with the current
    /// background color but reset all other attributes.
    pub fn erase(&mut self, bg: Color) {
        self.content = ' ';
        self.width = 1;
        self.flags = CellFlags::empty();
        self.attrs = SgrAttrs {
            bg,
            ..SgrAttrs::default()
        };
    }

    /// Reset this cell to a blank space with default attributes.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cell_is_space() {
        let cell = Cell::default();
        assert_eq!(cell.content(), ' ');
        assert_eq!(cell.width(), 1);
        assert_eq!(cell.attrs, SgrAttrs::default());
        assert!(!cell.is_wide());
        assert!(!cell.is_wide_continuation());
        assert!(cell.is_blank());
    }

    #[test]
    fn cell_erase_clears_content_and_attrs() {
        let mut cell = Cell::new('X');
        cell.attrs = SgrAttrs {
            flags: SgrFlags::BOLD | SgrFlags::ITALIC,
            fg: Color::Named(1),
            bg: Color::Named(4),
        };
        cell.erase(Color::Named(2));
        assert_eq!(cell.content(), ' ');
        assert_eq!(cell.attrs.flags, SgrFlags::empty());
        assert_eq!(cell.attrs.fg, Color::Default);
        assert_eq!(cell.attrs.bg, Color::Named(2));
        assert!(!cell.is_blank());
    }

    #[test]
    fn wide_char_pair() {
        let attrs = SgrAttrs {
            flags: SgrFlags::BOLD,
            ..SgrAttrs::default()
        };
        let (lead, cont) = Cell::wide('中', attrs);
        assert!(lead.is_wide());
        assert!(!lead.is_wide_continuation());
        assert_eq!(lead.width(), 2);
        assert_eq!(lead.content(), '中');

        assert!(!cont.is_wide());
        assert!(cont.is_wide_continuation());
        assert_eq!(cont.width(), 0);
    }

    #[test]
    fn set_content_clears_wide_flags() {
        let (mut lead, _) = Cell::wide('中', SgrAttrs::default());
        assert!(lead.is_wide());
        lead.set_content('A', 1);
        assert!(!lead.is_wide());
        assert!(!lead.is_wide_continuation());
    }

    #[test]
    fn display_width_classes() {
        assert_eq!(Cell::display_width('A'), 1);
        assert_eq!(Cell::display_width('é'), 1);
        assert_eq!(Cell::display_width('中'), 2);
        assert_eq!(Cell::display_width('\u{0301}'), 0); // combining acute
    }

    #[test]
    fn sgr_reset_on_empty_params() {
        let mut attrs = SgrAttrs {
            flags: SgrFlags::BOLD,
            fg: Color::Rgb(255, 0, 0),
            bg: Color::Indexed(42),
        };
        attrs.apply_sgr_params(&[]);
        assert_eq!(attrs, SgrAttrs::default());
    }

    #[test]
    fn sgr_basic_colors_and_flags() {
        let mut attrs = SgrAttrs::default();
        attrs.apply_sgr_params(&[1, 31, 44]);
        assert!(attrs.flags.contains(SgrFlags::BOLD));
        assert_eq!(attrs.fg, Color::Named(1));
        assert_eq!(attrs.bg, Color::Named(4));

        attrs.apply_sgr_params(&[22, 39, 49]);
        assert!(!attrs.flags.contains(SgrFlags::BOLD));
        assert_eq!(attrs.fg, Color::Default);
        assert_eq!(attrs.bg, Color::Default);
    }

    #[test]
    fn sgr_bright_colors() {
        let mut attrs = SgrAttrs::default();
        attrs.apply_sgr_params(&[91, 102]);
        assert_eq!(attrs.fg, Color::Named(9));
        assert_eq!(attrs.bg, Color::Named(10));
    }

    #[test]
    fn sgr_extended_256_and_rgb() {
        let mut attrs = SgrAttrs::default();
        attrs.apply_sgr_params(&[38, 5, 123]);
        assert_eq!(attrs.fg, Color::Indexed(123));

        attrs.apply_sgr_params(&[48, 2, 10, 20, 30]);
        assert_eq!(attrs.bg, Color::Rgb(10, 20, 30));
    }

    #[test]
    fn sgr_extended_color_then_more_params() {
        let mut attrs = SgrAttrs::default();
        // 38;5;196 followed by bold: the color sub-params must not be
        // misread as free-standing SGR codes.
        attrs.apply_sgr_params(&[38, 5, 196, 1]);
        assert_eq!(attrs.fg, Color::Indexed(196));
        assert!(attrs.flags.contains(SgrFlags::BOLD));
    }

    #[test]
    fn sgr_malformed_extended_color_is_skipped() {
        let mut attrs = SgrAttrs::default();
        attrs.apply_sgr_params(&[38, 9]); // 9 is not a valid color space
        assert_eq!(attrs.fg, Color::Default);
    }

    #[test]
    fn sgr_double_underline_maps_to_underline() {
        let mut attrs = SgrAttrs::default();
        attrs.apply_sgr_params(&[21]);
        assert!(attrs.flags.contains(SgrFlags::UNDERLINE));
        attrs.apply_sgr_params(&[24]);
        assert!(!attrs.flags.contains(SgrFlags::UNDERLINE));
    }

    #[test]
    fn sgr_unknown_params_are_ignored() {
        let mut attrs = SgrAttrs::default();
        attrs.apply_sgr_params(&[1, 73, 31]);
        assert!(attrs.flags.contains(SgrFlags::BOLD));
        assert_eq!(attrs.fg, Color::Named(1));
    }
}
