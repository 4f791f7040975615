//! Terminal mode flags (DECSET/DECRST and ANSI SM/RM).

/// Mode flags the engine tracks.
///
/// Unknown mode numbers are ignored (and traced); setting or resetting a
/// mode the engine does not implement never corrupts state.
#[derive(Debug, Clone)]
pub struct Modes {
    /// DECAWM (?7): autowrap at the right margin. Default on.
    autowrap: bool,
    /// DECTCEM (?25): cursor visible. Default on.
    cursor_visible: bool,
    /// DECOM (?6): cursor addressing relative to the scroll region.
    origin_mode: bool,
    /// IRM (4): printed characters insert rather than overwrite.
    insert_mode: bool,
    /// LNM (20): LF implies CR.
    linefeed_mode: bool,
}

impl Default for Modes {
    fn default() -> Self {
        Self::new()
    }
}

impl Modes {
    #[must_use]
    pub fn new() -> Self {
        Self {
            autowrap: true,
            cursor_visible: true,
            origin_mode: false,
            insert_mode: false,
            linefeed_mode: false,
        }
    }

    #[must_use]
    pub fn autowrap(&self) -> bool {
        self.autowrap
    }

    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    #[must_use]
    pub fn origin_mode(&self) -> bool {
        self.origin_mode
    }

    pub fn set_origin_mode(&mut self, value: bool) {
        self.origin_mode = value;
    }

    #[must_use]
    pub fn insert_mode(&self) -> bool {
        self.insert_mode
    }

    #[must_use]
    pub fn linefeed_mode(&self) -> bool {
        self.linefeed_mode
    }

    /// Apply a DEC private mode (DECSET/DECRST). Returns whether the mode
    /// was recognized.
    pub fn set_dec_mode(&mut self, mode: u16, value: bool) -> bool {
        match mode {
            6 => self.origin_mode = value,
            7 => self.autowrap = value,
            25 => self.cursor_visible = value,
            _ => {
                tracing::trace!(mode, value, "ignoring unsupported DEC private mode");
                return false;
            }
        }
        true
    }

    /// Apply an ANSI standard mode (SM/RM). Returns whether the mode was
    /// recognized.
    pub fn set_ansi_mode(&mut self, mode: u16, value: bool) -> bool {
        match mode {
            4 => self.insert_mode = value,
            20 => self.linefeed_mode = value,
            _ => {
                tracing::trace!(mode, value, "ignoring unsupported ANSI mode");
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let m = Modes::new();
        assert!(m.autowrap());
        assert!(m.cursor_visible());
        assert!(!m.origin_mode());
        assert!(!m.insert_mode());
        assert!(!m.linefeed_mode());
    }

    #[test]
    fn dec_modes_toggle() {
        let mut m = Modes::new();
        assert!(m.set_dec_mode(7, false));
        assert!(!m.autowrap());
        assert!(m.set_dec_mode(25, false));
        assert!(!m.cursor_visible());
        assert!(m.set_dec_mode(6, true));
        assert!(m.origin_mode());
    }

    #[test]
    fn ansi_modes_toggle() {
        let mut m = Modes::new();
        assert!(m.set_ansi_mode(4, true));
        assert!(m.insert_mode());
        assert!(m.set_ansi_mode(20, true));
        assert!(m.linefeed_mode());
    }

    #[test]
    fn unknown_modes_are_ignored() {
        let mut m = Modes::new();
        assert!(!m.set_dec_mode(12345, true));
        assert!(!m.set_ansi_mode(99, true));
        // No observable state changed.
        assert!(m.autowrap());
        assert!(!m.insert_mode());
    }
}
