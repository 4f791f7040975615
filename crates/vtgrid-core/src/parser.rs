//! VT/ANSI parser.
//!
//! A deterministic state machine that converts a terminal output byte stream
//! into a sequence of actions for the engine. It covers:
//!
//! - printable characters (ASCII + full UTF-8) -> `Action::Print`
//! - C0 controls -> dedicated actions
//! - CSI sequences (cursor, erase, scroll, SGR, mode set/reset)
//! - OSC sequences (title)
//! - ESC-level sequences (cursor save/restore, index, reset, keypad)
//! - DCS/SOS/PM/APC strings, consumed and discarded
//!
//! Every byte has exactly one defined transition in every state. Malformed or
//! unrecognized sequences are discarded wholesale (no partial application),
//! counted, and traced; the parser always returns to ground. Parser state
//! persists across `feed` calls, so a stream split at any byte boundary —
//! including mid-UTF-8 and mid-escape — parses identically to the unsplit
//! stream.

/// Maximum number of CSI parameters collected before the sequence is
/// discarded as malformed.
const MAX_CSI_PARAMS: usize = 32;

/// Maximum number of CSI intermediate bytes collected.
const MAX_CSI_INTERMEDIATES: usize = 2;

/// Maximum OSC string payload length; longer strings are discarded.
const MAX_OSC_LEN: usize = 1024;

/// Parser output actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print a single character (ASCII or multi-byte UTF-8).
    Print(char),
    /// Line feed / newline (`\n`).
    Newline,
    /// Carriage return (`\r`).
    CarriageReturn,
    /// Horizontal tab (`\t`).
    Tab,
    /// Backspace (`\x08`).
    Backspace,
    /// Bell (`\x07`).
    Bell,
    /// CUU (`CSI Ps A`): move cursor up by count (default 1).
    CursorUp(u16),
    /// CUD (`CSI Ps B`): move cursor down by count (default 1).
    CursorDown(u16),
    /// CUF (`CSI Ps C`): move cursor right by count (default 1).
    CursorRight(u16),
    /// CUB (`CSI Ps D`): move cursor left by count (default 1).
    CursorLeft(u16),
    /// CNL (`CSI Ps E`): move cursor down by count and to column 0.
    CursorNextLine(u16),
    /// CPL (`CSI Ps F`): move cursor up by count and to column 0.
    CursorPrevLine(u16),
    /// CHA (`CSI Ps G`): move cursor to absolute column (0-indexed).
    CursorColumn(u16),
    /// VPA (`CSI Ps d`): move cursor to absolute row (0-indexed).
    CursorRow(u16),
    /// CUP/HVP: move cursor to absolute 0-indexed row/col.
    CursorPosition { row: u16, col: u16 },
    /// ED mode (`CSI Ps J`): 0, 1, or 2.
    EraseInDisplay(u8),
    /// EL mode (`CSI Ps K`): 0, 1, or 2.
    EraseInLine(u8),
    /// ECH (`CSI Ps X`): erase characters at cursor position.
    EraseChars(u16),
    /// ICH (`CSI Ps @`): insert blank cells at cursor column.
    InsertChars(u16),
    /// DCH (`CSI Ps P`): delete cells at cursor column.
    DeleteChars(u16),
    /// IL (`CSI Ps L`): insert blank lines at cursor row within scroll region.
    InsertLines(u16),
    /// DL (`CSI Ps M`): delete lines at cursor row within scroll region.
    DeleteLines(u16),
    /// SU (`CSI Ps S`): scroll the scroll region up by count (default 1).
    ScrollUp(u16),
    /// SD (`CSI Ps T`): scroll the scroll region down by count (default 1).
    ScrollDown(u16),
    /// DECSTBM (`CSI Pt ; Pb r`): set scrolling region. `bottom == 0` means
    /// "use full height" (default), since the parser does not know the grid
    /// size. `top` is 0-indexed inclusive; `bottom` is 0-indexed exclusive
    /// when non-zero.
    SetScrollRegion { top: u16, bottom: u16 },
    /// SGR (`CSI ... m`): set graphics rendition parameters.
    ///
    /// Parameters are returned as parsed numeric values; interpretation is
    /// performed by the engine (they are stateful/delta-based).
    Sgr(Vec<u16>),
    /// DECSET (`CSI ? Pm h`): enable DEC private mode(s).
    DecSet(Vec<u16>),
    /// DECRST (`CSI ? Pm l`): disable DEC private mode(s).
    DecRst(Vec<u16>),
    /// SM (`CSI Pm h`): enable ANSI standard mode(s).
    AnsiSet(Vec<u16>),
    /// RM (`CSI Pm l`): disable ANSI standard mode(s).
    AnsiRst(Vec<u16>),
    /// DECSC (`ESC 7`): save cursor state.
    SaveCursor,
    /// DECRC (`ESC 8`): restore cursor state.
    RestoreCursor,
    /// IND (`ESC D`): index — cursor down one line, scrolling at bottom.
    Index,
    /// RI (`ESC M`): reverse index — cursor up one line, scrolling at top.
    ReverseIndex,
    /// NEL (`ESC E`): next line — cursor to start of next line.
    NextLine,
    /// RIS (`ESC c`): full reset to initial state.
    FullReset,
    /// OSC 0/2: set terminal title.
    SetTitle(String),
    /// HTS (`ESC H`): set a tab stop at the current cursor column.
    SetTabStop,
    /// TBC (`CSI Ps g`): tab clear. 0 = at cursor, 3 = all tab stops.
    ClearTabStop(u16),
    /// CBT (`CSI Ps Z`): cursor backward tabulation by count (default 1).
    BackTab(u16),
    /// DECKPAM (`ESC =`): application keypad mode.
    ApplicationKeypad,
    /// DECKPNM (`ESC >`): normal keypad mode.
    NormalKeypad,
}

/// Which terminator class ends the current string sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringKind {
    /// OSC: buffered, terminated by BEL or ST.
    Osc,
    /// DCS/SOS/PM/APC: discarded, terminated by ST only.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    /// Saw ESC; deciding which sequence family follows.
    Escape,
    /// Collecting ESC intermediate bytes (e.g. charset designation `ESC ( B`).
    EscapeIntermediate,
    /// Saw `ESC [`; no parameter bytes consumed yet.
    CsiEntry,
    /// Collecting CSI numeric parameters.
    CsiParam,
    /// Collecting CSI intermediate bytes after parameters.
    CsiIntermediate,
    /// Malformed CSI: consuming bytes until the final byte, then discarding.
    CsiIgnore,
    /// Collecting an OSC/DCS/SOS/PM/APC string body.
    String(StringKind),
    /// Saw ESC inside a string body; `\` completes the ST terminator.
    StringEsc(StringKind),
    /// Accumulating a multi-byte UTF-8 character.
    /// `remaining` counts how many continuation bytes are still expected.
    Utf8 { remaining: u8 },
}

/// VT/ANSI parser state.
///
/// The parser is a pure byte-at-a-time machine; it never inspects grid state
/// and never fails. All accumulation buffers are bounded.
#[derive(Debug, Clone)]
pub struct Parser {
    state: State,
    /// Completed CSI parameters.
    params: Vec<u16>,
    /// Value of the parameter currently being accumulated.
    param: u16,
    /// Whether any parameter byte (digit or `;`) has been seen.
    has_params: bool,
    /// CSI private marker (`?`, `<`, `=`, `>`), if any.
    private_marker: Option<u8>,
    /// CSI intermediate bytes (0x20..=0x2F).
    intermediates: Vec<u8>,
    /// OSC string payload.
    osc_buf: Vec<u8>,
    /// Accumulator for multi-byte UTF-8 character assembly.
    utf8_buf: [u8; 4],
    /// Number of bytes accumulated so far in `utf8_buf`.
    utf8_len: u8,
    /// Count of malformed or unrecognized sequences discarded since creation.
    dropped: u64,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser in ground state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            params: Vec::new(),
            param: 0,
            has_params: false,
            private_marker: None,
            intermediates: Vec::new(),
            osc_buf: Vec::new(),
            utf8_buf: [0; 4],
            utf8_len: 0,
            dropped: 0,
        }
    }

    /// Number of malformed/unrecognized sequences discarded so far.
    ///
    /// Exposed as a metric; dropped sequences are never surfaced as errors.
    #[must_use]
    pub fn dropped_sequences(&self) -> u64 {
        self.dropped
    }

    /// Feed a chunk of bytes and return parsed actions.
    #[must_use]
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Action> {
        let mut out = Vec::new();
        for &b in bytes {
            self.advance(b, &mut out);
        }
        out
    }

    /// Advance the parser by one byte, appending any completed actions.
    ///
    /// A single byte can complete more than one action (e.g. a byte that
    /// aborts a UTF-8 sequence emits the replacement character and is then
    /// reprocessed in ground state), so output goes through a Vec.
    pub fn advance(&mut self, b: u8, out: &mut Vec<Action>) {
        match self.state {
            State::Ground => self.advance_ground(b, out),
            State::Escape => self.advance_escape(b, out),
            State::EscapeIntermediate => self.advance_escape_intermediate(b),
            State::CsiEntry => self.advance_csi_entry(b, out),
            State::CsiParam => self.advance_csi_param(b, out),
            State::CsiIntermediate => self.advance_csi_intermediate(b, out),
            State::CsiIgnore => self.advance_csi_ignore(b),
            State::String(kind) => self.advance_string(kind, b, out),
            State::StringEsc(kind) => self.advance_string_esc(kind, b, out),
            State::Utf8 { remaining } => self.advance_utf8(b, remaining, out),
        }
    }

    fn advance_ground(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            b'\n' | 0x0B | 0x0C => out.push(Action::Newline), // LF, VT, FF
            b'\r' => out.push(Action::CarriageReturn),
            b'\t' => out.push(Action::Tab),
            0x08 => out.push(Action::Backspace),
            0x07 => out.push(Action::Bell),
            0x1B => self.state = State::Escape,
            0x20..=0x7E => out.push(Action::Print(b as char)),
            // Remaining C0 controls (NUL, SO/SI, DEL, ...) have no effect.
            0x00..=0x1F | 0x7F => {}
            // UTF-8 leading bytes. 0xC0/0xC1 are always-overlong and 0xF5..
            // are outside the Unicode range: malformed, replaced.
            0xC2..=0xDF => self.begin_utf8(b, 1),
            0xE0..=0xEF => self.begin_utf8(b, 2),
            0xF0..=0xF4 => self.begin_utf8(b, 3),
            0x80..=0xBF | 0xC0 | 0xC1 | 0xF5..=0xFF => {
                out.push(Action::Print(char::REPLACEMENT_CHARACTER));
            }
        }
    }

    fn begin_utf8(&mut self, b: u8, remaining: u8) {
        self.utf8_buf[0] = b;
        self.utf8_len = 1;
        self.state = State::Utf8 { remaining };
    }

    fn advance_utf8(&mut self, b: u8, remaining: u8, out: &mut Vec<Action>) {
        if !(0x80..=0xBF).contains(&b) {
            // Invalid continuation byte: the partial sequence decodes to the
            // replacement character and the byte is reprocessed in ground
            // state, so no input is ever silently lost.
            self.utf8_len = 0;
            self.state = State::Ground;
            out.push(Action::Print(char::REPLACEMENT_CHARACTER));
            self.advance_ground(b, out);
            return;
        }

        let idx = self.utf8_len as usize;
        if idx < 4 {
            self.utf8_buf[idx] = b;
            self.utf8_len += 1;
        }
        if remaining > 1 {
            self.state = State::Utf8 {
                remaining: remaining - 1,
            };
            return;
        }

        // Sequence complete. Overlong encodings and surrogate halves still
        // fail validation here and decode to the replacement character.
        self.state = State::Ground;
        let len = self.utf8_len as usize;
        self.utf8_len = 0;
        let ch = core::str::from_utf8(&self.utf8_buf[..len])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        out.push(Action::Print(ch));
    }

    fn advance_escape(&mut self, b: u8, out: &mut Vec<Action>) {
        self.state = State::Ground;
        match b {
            b'[' => {
                self.reset_csi();
                self.state = State::CsiEntry;
            }
            b']' => {
                self.osc_buf.clear();
                self.state = State::String(StringKind::Osc);
            }
            // DCS, SOS, PM, APC: string bodies we consume and discard.
            b'P' | b'X' | b'^' | b'_' => self.state = State::String(StringKind::Ignored),
            b'7' => out.push(Action::SaveCursor),
            b'8' => out.push(Action::RestoreCursor),
            b'D' => out.push(Action::Index),
            b'M' => out.push(Action::ReverseIndex),
            b'E' => out.push(Action::NextLine),
            b'c' => out.push(Action::FullReset),
            b'H' => out.push(Action::SetTabStop),
            b'=' => out.push(Action::ApplicationKeypad),
            b'>' => out.push(Action::NormalKeypad),
            0x1B => self.state = State::Escape,
            // Intermediates: charset designation (ESC ( B) and friends.
            0x20..=0x2F => self.state = State::EscapeIntermediate,
            _ => self.drop_sequence("unrecognized ESC final"),
        }
    }

    fn advance_escape_intermediate(&mut self, b: u8) {
        match b {
            0x20..=0x2F => {}
            0x1B => self.state = State::Escape,
            _ => {
                // Final byte of an ESC sequence we do not implement
                // (charset designation etc.): discard the whole sequence.
                self.state = State::Ground;
                self.drop_sequence("unsupported ESC intermediate sequence");
            }
        }
    }

    fn reset_csi(&mut self) {
        self.params.clear();
        self.param = 0;
        self.has_params = false;
        self.private_marker = None;
        self.intermediates.clear();
    }

    fn advance_csi_entry(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            b'?' | b'<' | b'=' | b'>' => {
                self.private_marker = Some(b);
                self.state = State::CsiParam;
            }
            b'0'..=b'9' | b';' => {
                self.state = State::CsiParam;
                self.advance_csi_param(b, out);
            }
            0x20..=0x2F => {
                self.intermediates.push(b);
                self.state = State::CsiIntermediate;
            }
            0x40..=0x7E => self.dispatch_csi(b, out),
            _ => self.abort_csi(b, out),
        }
    }

    fn advance_csi_param(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            b'0'..=b'9' => {
                self.has_params = true;
                self.param = self
                    .param
                    .saturating_mul(10)
                    .saturating_add(u16::from(b - b'0'));
            }
            b';' => {
                self.has_params = true;
                if self.params.len() >= MAX_CSI_PARAMS {
                    self.state = State::CsiIgnore;
                    return;
                }
                self.params.push(self.param);
                self.param = 0;
            }
            0x20..=0x2F => {
                if self.intermediates.len() >= MAX_CSI_INTERMEDIATES {
                    self.state = State::CsiIgnore;
                    return;
                }
                self.intermediates.push(b);
                self.state = State::CsiIntermediate;
            }
            0x40..=0x7E => self.dispatch_csi(b, out),
            _ => self.abort_csi(b, out),
        }
    }

    fn advance_csi_intermediate(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            0x20..=0x2F => {
                if self.intermediates.len() >= MAX_CSI_INTERMEDIATES {
                    self.state = State::CsiIgnore;
                }
                // Intermediates beyond the cap are not recorded; the
                // sequence is already headed for the ignore path.
            }
            // Parameter bytes after intermediates are malformed per ECMA-48.
            b'0'..=b'9' | b';' => self.state = State::CsiIgnore,
            0x40..=0x7E => self.dispatch_csi(b, out),
            _ => self.abort_csi(b, out),
        }
    }

    fn advance_csi_ignore(&mut self, b: u8) {
        match b {
            0x40..=0x7E => {
                self.state = State::Ground;
                self.drop_sequence("CSI exceeded parameter/intermediate limits");
            }
            0x1B => {
                self.state = State::Escape;
                self.drop_sequence("CSI aborted by ESC");
            }
            _ => {}
        }
    }

    /// A byte that can never occur inside a CSI sequence: the sequence is
    /// discarded wholesale and the byte reprocessed in ground state.
    fn abort_csi(&mut self, b: u8, out: &mut Vec<Action>) {
        self.state = State::Ground;
        match b {
            // CAN and SUB abort the sequence and are themselves consumed.
            0x18 | 0x1A => self.drop_sequence("CSI aborted by CAN/SUB"),
            0x1B => {
                self.drop_sequence("CSI aborted by ESC");
                self.state = State::Escape;
            }
            _ => {
                self.drop_sequence("invalid byte inside CSI");
                self.advance_ground(b, out);
            }
        }
    }

    fn advance_string(&mut self, kind: StringKind, b: u8, out: &mut Vec<Action>) {
        match b {
            0x07 if kind == StringKind::Osc => {
                self.state = State::Ground;
                self.dispatch_osc(out);
            }
            0x1B => self.state = State::StringEsc(kind),
            _ => {
                if kind == StringKind::Osc {
                    if self.osc_buf.len() >= MAX_OSC_LEN {
                        // Over-long OSC: discard everything, resync at ground.
                        self.osc_buf.clear();
                        self.state = State::Ground;
                        self.drop_sequence("OSC exceeded length cap");
                    } else {
                        self.osc_buf.push(b);
                    }
                }
            }
        }
    }

    fn advance_string_esc(&mut self, kind: StringKind, b: u8, out: &mut Vec<Action>) {
        if b == b'\\' {
            // ST terminator.
            self.state = State::Ground;
            match kind {
                StringKind::Osc => self.dispatch_osc(out),
                StringKind::Ignored => {}
            }
            return;
        }
        // A lone ESC inside the string body: stay in the string. The ESC
        // itself carries no meaning for the buffered content.
        self.state = State::String(kind);
        self.advance_string(kind, b, out);
    }

    // ── Dispatch ────────────────────────────────────────────────────

    fn dispatch_csi(&mut self, final_byte: u8, out: &mut Vec<Action>) {
        self.state = State::Ground;
        if self.has_params {
            // The trailing parameter counts against the cap too.
            if self.params.len() >= MAX_CSI_PARAMS {
                self.drop_sequence("CSI exceeded parameter/intermediate limits");
                return;
            }
            self.params.push(self.param);
        }
        let params = core::mem::take(&mut self.params);

        if !self.intermediates.is_empty() {
            self.drop_sequence("CSI with unsupported intermediates");
            return;
        }

        let action = match self.private_marker {
            Some(b'?') => match final_byte {
                b'h' => Some(Action::DecSet(params)),
                b'l' => Some(Action::DecRst(params)),
                _ => None,
            },
            Some(_) => None,
            None => Self::decode_csi(final_byte, params),
        };

        match action {
            Some(action) => out.push(action),
            None => self.drop_sequence("unrecognized CSI final byte"),
        }
    }

    fn decode_csi(final_byte: u8, params: Vec<u16>) -> Option<Action> {
        let count = || params.first().copied().unwrap_or(1).max(1);
        match final_byte {
            b'A' => Some(Action::CursorUp(count())),
            b'B' => Some(Action::CursorDown(count())),
            b'C' => Some(Action::CursorRight(count())),
            b'D' => Some(Action::CursorLeft(count())),
            b'E' => Some(Action::CursorNextLine(count())),
            b'F' => Some(Action::CursorPrevLine(count())),
            b'G' => Some(Action::CursorColumn(count().saturating_sub(1))),
            b'd' => Some(Action::CursorRow(count().saturating_sub(1))),
            b'H' | b'f' => {
                // CUP/HVP use 1-indexed coordinates; 0 is treated as 1.
                let row = params.first().copied().unwrap_or(1).max(1) - 1;
                let col = params.get(1).copied().unwrap_or(1).max(1) - 1;
                Some(Action::CursorPosition { row, col })
            }
            b'J' => {
                let mode = params.first().copied().unwrap_or(0);
                (mode <= 2).then(|| Action::EraseInDisplay(mode as u8))
            }
            b'K' => {
                let mode = params.first().copied().unwrap_or(0);
                (mode <= 2).then(|| Action::EraseInLine(mode as u8))
            }
            b'X' => Some(Action::EraseChars(count())),
            b'@' => Some(Action::InsertChars(count())),
            b'P' => Some(Action::DeleteChars(count())),
            b'L' => Some(Action::InsertLines(count())),
            b'M' => Some(Action::DeleteLines(count())),
            b'S' => Some(Action::ScrollUp(count())),
            b'T' => Some(Action::ScrollDown(count())),
            b'r' => {
                let top = params.first().copied().unwrap_or(0).max(1) - 1;
                let bottom = params.get(1).copied().unwrap_or(0);
                Some(Action::SetScrollRegion { top, bottom })
            }
            b'm' => Some(Action::Sgr(params)),
            b'h' => Some(Action::AnsiSet(params)),
            b'l' => Some(Action::AnsiRst(params)),
            b'g' => Some(Action::ClearTabStop(
                params.first().copied().unwrap_or(0),
            )),
            b'Z' => Some(Action::BackTab(count())),
            _ => None,
        }
    }

    fn dispatch_osc(&mut self, out: &mut Vec<Action>) {
        let content = core::mem::take(&mut self.osc_buf);
        let Some(semi) = content.iter().position(|&b| b == b';') else {
            self.drop_sequence("OSC without command separator");
            return;
        };
        let cmd = core::str::from_utf8(&content[..semi])
            .ok()
            .and_then(|s| s.parse::<u16>().ok());
        match cmd {
            Some(0 | 2) => {
                let title = String::from_utf8_lossy(&content[semi + 1..]).into_owned();
                out.push(Action::SetTitle(title));
            }
            _ => self.drop_sequence("unrecognized OSC command"),
        }
    }

    fn drop_sequence(&mut self, reason: &'static str) {
        self.dropped += 1;
        tracing::trace!(reason, total = self.dropped, "discarded escape sequence");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── ASCII / Ground ─────────────────────────────────────────────

    #[test]
    fn printable_ascii_emits_print() {
        let mut p = Parser::new();
        let actions = p.feed(b"hi");
        assert_eq!(actions, vec![Action::Print('h'), Action::Print('i')]);
    }

    #[test]
    fn c0_controls_emit_actions() {
        let mut p = Parser::new();
        let actions = p.feed(b"\t\r\n");
        assert_eq!(
            actions,
            vec![Action::Tab, Action::CarriageReturn, Action::Newline]
        );
    }

    #[test]
    fn vt_and_ff_treated_as_newline() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"\x0b"), vec![Action::Newline]);
        assert_eq!(p.feed(b"\x0c"), vec![Action::Newline]);
    }

    #[test]
    fn nul_and_del_are_ignored() {
        let mut p = Parser::new();
        assert!(p.feed(b"\x00\x7f").is_empty());
    }

    // ── UTF-8 multi-byte characters ────────────────────────────────

    #[test]
    fn utf8_two_byte_character() {
        let mut p = Parser::new();
        assert_eq!(p.feed("é".as_bytes()), vec![Action::Print('é')]);
    }

    #[test]
    fn utf8_three_byte_character() {
        let mut p = Parser::new();
        assert_eq!(p.feed("中".as_bytes()), vec![Action::Print('中')]);
    }

    #[test]
    fn utf8_four_byte_character() {
        let mut p = Parser::new();
        assert_eq!(p.feed("🎉".as_bytes()), vec![Action::Print('🎉')]);
    }

    #[test]
    fn utf8_split_across_feeds() {
        let mut p = Parser::new();
        assert_eq!(p.feed(&[0xC3]), Vec::<Action>::new());
        assert_eq!(p.feed(&[0xA9]), vec![Action::Print('é')]);
    }

    #[test]
    fn utf8_split_four_byte_across_feeds() {
        let mut p = Parser::new();
        // 🎉 = 0xF0 0x9F 0x8E 0x89
        assert!(p.feed(&[0xF0]).is_empty());
        assert!(p.feed(&[0x9F]).is_empty());
        assert!(p.feed(&[0x8E]).is_empty());
        assert_eq!(p.feed(&[0x89]), vec![Action::Print('🎉')]);
    }

    #[test]
    fn utf8_invalid_continuation_emits_replacement_and_reprocesses() {
        let mut p = Parser::new();
        // Start a 2-byte sequence then send ASCII 'a' instead of the
        // continuation: replacement char, then 'a' is not lost.
        let actions = p.feed(&[0xC3, b'a']);
        assert_eq!(
            actions,
            vec![
                Action::Print(char::REPLACEMENT_CHARACTER),
                Action::Print('a')
            ]
        );
    }

    #[test]
    fn utf8_invalid_leading_bytes_emit_replacement() {
        let mut p = Parser::new();
        // Stray continuation, always-overlong lead, out-of-range lead.
        let actions = p.feed(&[0x80, 0xC0, 0xFF]);
        assert_eq!(
            actions,
            vec![Action::Print(char::REPLACEMENT_CHARACTER); 3]
        );
    }

    #[test]
    fn utf8_overlong_encoding_decodes_to_replacement() {
        let mut p = Parser::new();
        // 0xE0 0x80 0x80 is an overlong encoding of NUL.
        let actions = p.feed(&[0xE0, 0x80, 0x80]);
        assert_eq!(actions, vec![Action::Print(char::REPLACEMENT_CHARACTER)]);
    }

    #[test]
    fn utf8_interrupted_by_escape() {
        let mut p = Parser::new();
        // 0x1B is not a valid continuation: replacement, then ESC c parses.
        let actions = p.feed(&[0xC3, 0x1B, b'c']);
        assert_eq!(
            actions,
            vec![Action::Print(char::REPLACEMENT_CHARACTER), Action::FullReset]
        );
    }

    #[test]
    fn utf8_mixed_with_ascii() {
        let mut p = Parser::new();
        let actions = p.feed("aé中🎉b".as_bytes());
        assert_eq!(
            actions,
            vec![
                Action::Print('a'),
                Action::Print('é'),
                Action::Print('中'),
                Action::Print('🎉'),
                Action::Print('b'),
            ]
        );
    }

    // ── CSI ────────────────────────────────────────────────────────

    #[test]
    fn csi_cup_is_decoded_to_cursor_position() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b[5;10H"),
            vec![Action::CursorPosition { row: 4, col: 9 }]
        );
        assert_eq!(
            p.feed(b"\x1b[0;0H"),
            vec![Action::CursorPosition { row: 0, col: 0 }],
            "CUP zero params should default to 1;1"
        );
        assert_eq!(
            p.feed(b"\x1b[H"),
            vec![Action::CursorPosition { row: 0, col: 0 }]
        );
    }

    #[test]
    fn csi_cursor_relative_moves_are_decoded() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b[2A\x1b[B\x1b[3C\x1b[0D"),
            vec![
                Action::CursorUp(2),
                Action::CursorDown(1),
                Action::CursorRight(3),
                Action::CursorLeft(1),
            ]
        );
    }

    #[test]
    fn csi_ed_and_el_are_decoded() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"\x1b[2J"), vec![Action::EraseInDisplay(2)]);
        assert_eq!(p.feed(b"\x1b[K"), vec![Action::EraseInLine(0)]);
        assert_eq!(p.feed(b"\x1b[1K"), vec![Action::EraseInLine(1)]);
    }

    #[test]
    fn csi_ed_out_of_range_mode_is_dropped() {
        let mut p = Parser::new();
        let before = p.dropped_sequences();
        assert!(p.feed(b"\x1b[7J").is_empty());
        assert_eq!(p.dropped_sequences(), before + 1);
    }

    #[test]
    fn csi_sgr_is_decoded() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"\x1b[31m"), vec![Action::Sgr(vec![31])]);
        assert_eq!(p.feed(b"\x1b[m"), vec![Action::Sgr(vec![])]);
        assert_eq!(
            p.feed(b"\x1b[1;38;5;42m"),
            vec![Action::Sgr(vec![1, 38, 5, 42])]
        );
    }

    #[test]
    fn csi_empty_params_default_to_zero() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"\x1b[;5H"), vec![Action::CursorPosition {
            row: 0,
            col: 4
        }]);
        assert_eq!(p.feed(b"\x1b[1;m"), vec![Action::Sgr(vec![1, 0])]);
    }

    #[test]
    fn csi_scroll_region_and_insert_delete_are_decoded() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b[2;4r\x1b[r\x1b[2S\x1b[T\x1b[3L\x1b[M\x1b[4@\x1b[P"),
            vec![
                Action::SetScrollRegion { top: 1, bottom: 4 },
                Action::SetScrollRegion { top: 0, bottom: 0 },
                Action::ScrollUp(2),
                Action::ScrollDown(1),
                Action::InsertLines(3),
                Action::DeleteLines(1),
                Action::InsertChars(4),
                Action::DeleteChars(1),
            ]
        );
    }

    #[test]
    fn csi_split_across_feeds() {
        let mut p = Parser::new();
        assert!(p.feed(b"\x1b").is_empty());
        assert!(p.feed(b"[5;1").is_empty());
        assert_eq!(
            p.feed(b"0H"),
            vec![Action::CursorPosition { row: 4, col: 9 }]
        );
    }

    #[test]
    fn decset_and_decrst() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"\x1b[?25l"), vec![Action::DecRst(vec![25])]);
        assert_eq!(p.feed(b"\x1b[?25h"), vec![Action::DecSet(vec![25])]);
        assert_eq!(
            p.feed(b"\x1b[?1049;2004h"),
            vec![Action::DecSet(vec![1049, 2004])]
        );
    }

    #[test]
    fn ansi_set_and_reset_modes() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"\x1b[4h"), vec![Action::AnsiSet(vec![4])]);
        assert_eq!(p.feed(b"\x1b[20l"), vec![Action::AnsiRst(vec![20])]);
    }

    #[test]
    fn unrecognized_csi_final_is_dropped_wholesale() {
        let mut p = Parser::new();
        let before = p.dropped_sequences();
        // 'y' is not a recognized final byte; following text must print
        // normally with no bytes misattributed.
        let actions = p.feed(b"\x1b[12yab");
        assert_eq!(actions, vec![Action::Print('a'), Action::Print('b')]);
        assert_eq!(p.dropped_sequences(), before + 1);
    }

    #[test]
    fn unrecognized_private_marker_sequence_is_dropped() {
        let mut p = Parser::new();
        assert!(p.feed(b"\x1b[>0c").is_empty());
        assert_eq!(p.dropped_sequences(), 1);
    }

    #[test]
    fn csi_with_too_many_params_is_dropped() {
        let mut p = Parser::new();
        let mut seq = b"\x1b[".to_vec();
        for _ in 0..64 {
            seq.extend_from_slice(b"1;");
        }
        seq.push(b'm');
        seq.extend_from_slice(b"ok");
        let actions = p.feed(&seq);
        assert_eq!(actions, vec![Action::Print('o'), Action::Print('k')]);
        assert_eq!(p.dropped_sequences(), 1);
    }

    #[test]
    fn csi_param_cap_counts_the_trailing_param() {
        // 32 separators leave 32 stored params; the trailing one would make
        // 33, so the sequence is dropped whole.
        let mut p = Parser::new();
        let mut seq = b"\x1b[".to_vec();
        for _ in 0..32 {
            seq.extend_from_slice(b"1;");
        }
        seq.push(b'm');
        assert!(p.feed(&seq).is_empty());
        assert_eq!(p.dropped_sequences(), 1);

        // 31 separators plus the trailing param sit exactly at the cap.
        let mut p = Parser::new();
        let mut seq = b"\x1b[".to_vec();
        for _ in 0..31 {
            seq.extend_from_slice(b"1;");
        }
        seq.extend_from_slice(b"1m");
        assert_eq!(p.feed(&seq), vec![Action::Sgr(vec![1; 32])]);
        assert_eq!(p.dropped_sequences(), 0);
    }

    #[test]
    fn csi_param_overflow_saturates() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b[99999999999A"),
            vec![Action::CursorUp(u16::MAX)]
        );
    }

    #[test]
    fn csi_aborted_by_can_discards_sequence() {
        let mut p = Parser::new();
        let actions = p.feed(b"\x1b[12\x18x");
        assert_eq!(actions, vec![Action::Print('x')]);
        assert_eq!(p.dropped_sequences(), 1);
    }

    #[test]
    fn csi_interrupted_by_esc_restarts_cleanly() {
        let mut p = Parser::new();
        let actions = p.feed(b"\x1b[12\x1b[2J");
        assert_eq!(actions, vec![Action::EraseInDisplay(2)]);
        assert_eq!(p.dropped_sequences(), 1);
    }

    #[test]
    fn csi_with_intermediates_is_dropped() {
        let mut p = Parser::new();
        // DECSCUSR-style sequence with a space intermediate.
        assert!(p.feed(b"\x1b[2 q").is_empty());
        assert_eq!(p.dropped_sequences(), 1);
    }

    // ── ESC-level ──────────────────────────────────────────────────

    #[test]
    fn esc_level_sequences() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"\x1b7"), vec![Action::SaveCursor]);
        assert_eq!(p.feed(b"\x1b8"), vec![Action::RestoreCursor]);
        assert_eq!(p.feed(b"\x1bD"), vec![Action::Index]);
        assert_eq!(p.feed(b"\x1bM"), vec![Action::ReverseIndex]);
        assert_eq!(p.feed(b"\x1bE"), vec![Action::NextLine]);
        assert_eq!(p.feed(b"\x1bc"), vec![Action::FullReset]);
        assert_eq!(p.feed(b"\x1bH"), vec![Action::SetTabStop]);
        assert_eq!(p.feed(b"\x1b="), vec![Action::ApplicationKeypad]);
        assert_eq!(p.feed(b"\x1b>"), vec![Action::NormalKeypad]);
    }

    #[test]
    fn charset_designation_is_consumed_silently() {
        let mut p = Parser::new();
        let actions = p.feed(b"\x1b(Bhello");
        assert_eq!(
            actions,
            vec![
                Action::Print('h'),
                Action::Print('e'),
                Action::Print('l'),
                Action::Print('l'),
                Action::Print('o'),
            ]
        );
    }

    // ── OSC / DCS ──────────────────────────────────────────────────

    #[test]
    fn osc_title_bel_and_st_terminated() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b]0;title\x07"),
            vec![Action::SetTitle("title".to_string())]
        );
        assert_eq!(
            p.feed(b"\x1b]2;hi\x1b\\"),
            vec![Action::SetTitle("hi".to_string())]
        );
    }

    #[test]
    fn osc_split_across_feeds() {
        let mut p = Parser::new();
        assert!(p.feed(b"\x1b]0;he").is_empty());
        assert!(p.feed(b"llo").is_empty());
        assert_eq!(
            p.feed(b"\x07"),
            vec![Action::SetTitle("hello".to_string())]
        );
    }

    #[test]
    fn unrecognized_osc_command_is_dropped() {
        let mut p = Parser::new();
        assert!(p.feed(b"\x1b]52;c;Zm9v\x07").is_empty());
        assert_eq!(p.dropped_sequences(), 1);
    }

    #[test]
    fn overlong_osc_is_discarded() {
        let mut p = Parser::new();
        let mut seq = b"\x1b]0;".to_vec();
        seq.extend(std::iter::repeat_n(b'x', 4096));
        let actions = p.feed(&seq);
        assert_eq!(p.dropped_sequences(), 1);
        // The cap fires mid-payload and resyncs at ground, so the rest of
        // the payload prints as ordinary text.
        assert!(!actions.is_empty());
        assert!(actions.iter().all(|a| *a == Action::Print('x')));
        let tail = p.feed(b"ok");
        assert_eq!(tail, vec![Action::Print('o'), Action::Print('k')]);
    }

    #[test]
    fn dcs_body_is_consumed_without_actions() {
        let mut p = Parser::new();
        let actions = p.feed(b"\x1bPq#0;1;2\x1b\\after");
        assert_eq!(
            actions,
            vec![
                Action::Print('a'),
                Action::Print('f'),
                Action::Print('t'),
                Action::Print('e'),
                Action::Print('r'),
            ]
        );
    }

    // ── Integration ────────────────────────────────────────────────

    #[test]
    fn mixed_utf8_csi_osc_sequence() {
        let mut p = Parser::new();
        let mut input = Vec::new();
        input.extend_from_slice("日本語".as_bytes());
        input.extend_from_slice(b"\x1b[31m");
        input.extend_from_slice(b"\x1b[5;1H");
        let actions = p.feed(&input);
        assert_eq!(
            actions,
            vec![
                Action::Print('日'),
                Action::Print('本'),
                Action::Print('語'),
                Action::Sgr(vec![31]),
                Action::CursorPosition { row: 4, col: 0 },
            ]
        );
    }

    #[test]
    fn typical_terminal_setup_sequence() {
        let mut p = Parser::new();
        let actions = p.feed(b"\x1b[?1049h\x1b[?2004h\x1b[?25l");
        assert_eq!(
            actions,
            vec![
                Action::DecSet(vec![1049]),
                Action::DecSet(vec![2004]),
                Action::DecRst(vec![25]),
            ]
        );
    }

    #[test]
    fn split_feed_equivalence_over_every_split_point() {
        let stream: &[u8] = b"a\x1b[1;31mb\x1b]0;t\x07\x1b[2J\xe4\xb8\xad\x1b[5;10Hz";
        let mut whole = Parser::new();
        let expected = whole.feed(stream);
        for k in 0..=stream.len() {
            let mut p = Parser::new();
            let mut actions = p.feed(&stream[..k]);
            actions.extend(p.feed(&stream[k..]));
            assert_eq!(actions, expected, "split at byte {k}");
        }
    }
}
