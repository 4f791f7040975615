//! Generational-index registry of terminal instances.

use thiserror::Error;
use vtgrid_core::Terminal;

/// Upper bound on either grid dimension accepted by [`TerminalRegistry`].
///
/// Large enough for any real display, small enough that a corrupted host
/// value cannot request a multi-gigabyte grid.
pub const MAX_DIMENSION: u16 = 10_000;

/// Opaque reference to a terminal owned by a [`TerminalRegistry`].
///
/// Handles are `Copy` and cheap to pass across an embedding boundary. A
/// handle is only valid against the registry that issued it, and only until
/// the corresponding [`TerminalRegistry::free`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TerminalHandle {
    index: u32,
    generation: u32,
}

/// Why [`TerminalRegistry::create`] refused to build an instance.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreateError {
    /// Dimensions were zero or above [`MAX_DIMENSION`].
    #[error("invalid terminal dimensions: {cols}x{rows}")]
    InvalidDimensions { cols: u16, rows: u16 },
}

/// Outcome of [`TerminalRegistry::feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// All bytes were processed.
    Ok,
    /// The handle does not name a live terminal.
    InvalidHandle,
    /// The input slice was empty; nothing to do.
    EmptyInput,
}

/// Outcome of [`TerminalRegistry::resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeStatus {
    /// The terminal now has the requested dimensions.
    Ok,
    /// The handle does not name a live terminal.
    InvalidHandle,
    /// Dimensions were zero or above [`MAX_DIMENSION`]; state unchanged.
    InvalidDimensions,
}

/// Outcome of [`TerminalRegistry::scroll_viewport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStatus {
    /// The viewport moved (possibly clamped); `offset` is the resulting
    /// offset in lines above the live grid.
    Ok { offset: usize },
    /// The handle does not name a live terminal.
    InvalidHandle,
}

/// Cursor position as reported across the embedding boundary.
///
/// `col`/`row` are 0-indexed. When `valid` is false (invalid handle) both
/// coordinates are zero and carry no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorReport {
    pub col: u16,
    pub row: u16,
    pub valid: bool,
}

impl CursorReport {
    const INVALID: Self = Self {
        col: 0,
        row: 0,
        valid: false,
    };
}

struct Slot {
    terminal: Option<Terminal>,
    generation: u32,
}

/// Owner of terminal instances, addressed by [`TerminalHandle`].
///
/// Freed slots are recycled with a bumped generation, so the registry never
/// grows beyond its peak live count and stale handles stay invalid forever.
#[derive(Default)]
pub struct TerminalRegistry {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
}

impl TerminalRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live terminals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a terminal and return its handle.
    pub fn create(&mut self, cols: u16, rows: u16) -> Result<TerminalHandle, CreateError> {
        if !valid_dimensions(cols, rows) {
            return Err(CreateError::InvalidDimensions { cols, rows });
        }
        let terminal = Terminal::new(cols, rows);
        let handle = match self.free_list.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.terminal = Some(terminal);
                TerminalHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    terminal: Some(terminal),
                    generation: 0,
                });
                TerminalHandle {
                    index,
                    generation: 0,
                }
            }
        };
        tracing::debug!(index = handle.index, cols, rows, "terminal created");
        Ok(handle)
    }

    /// Process a byte stream on the addressed terminal.
    pub fn feed(&mut self, handle: TerminalHandle, bytes: &[u8]) -> FeedStatus {
        let Some(terminal) = self.get_mut(handle) else {
            return FeedStatus::InvalidHandle;
        };
        if bytes.is_empty() {
            return FeedStatus::EmptyInput;
        }
        terminal.feed(bytes);
        FeedStatus::Ok
    }

    /// Resize the addressed terminal, reflowing its contents.
    pub fn resize(&mut self, handle: TerminalHandle, cols: u16, rows: u16) -> ResizeStatus {
        if !valid_dimensions(cols, rows) {
            return ResizeStatus::InvalidDimensions;
        }
        let Some(terminal) = self.get_mut(handle) else {
            return ResizeStatus::InvalidHandle;
        };
        terminal.resize(cols, rows);
        ResizeStatus::Ok
    }

    /// Move the viewport by `delta` lines (positive = older history).
    pub fn scroll_viewport(&mut self, handle: TerminalHandle, delta: i32) -> ScrollStatus {
        let Some(terminal) = self.get_mut(handle) else {
            return ScrollStatus::InvalidHandle;
        };
        let offset = terminal.scroll_viewport(delta);
        ScrollStatus::Ok { offset }
    }

    /// Render the addressed terminal's viewport as text.
    ///
    /// Returns the empty string for an invalid handle; a live single-row
    /// blank terminal also dumps as `""`, so hosts that need the distinction
    /// should check [`Self::cursor_position`] first.
    #[must_use]
    pub fn dump_viewport(&self, handle: TerminalHandle) -> String {
        match self.get(handle) {
            Some(terminal) => terminal.dump_viewport(),
            None => String::new(),
        }
    }

    /// Report the cursor position of the addressed terminal.
    #[must_use]
    pub fn cursor_position(&self, handle: TerminalHandle) -> CursorReport {
        let Some(terminal) = self.get(handle) else {
            return CursorReport::INVALID;
        };
        let (col, row) = terminal.cursor_position();
        CursorReport {
            col,
            row,
            valid: true,
        }
    }

    /// Destroy the addressed terminal. Freeing an already-freed or invalid
    /// handle is a no-op.
    pub fn free(&mut self, handle: TerminalHandle) {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return;
        };
        if slot.generation != handle.generation || slot.terminal.is_none() {
            return;
        }
        slot.terminal = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        tracing::debug!(index = handle.index, "terminal freed");
    }

    fn get(&self, handle: TerminalHandle) -> Option<&Terminal> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.terminal.as_ref())
    }

    fn get_mut(&mut self, handle: TerminalHandle) -> Option<&mut Terminal> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.terminal.as_mut())
    }
}

fn valid_dimensions(cols: u16, rows: u16) -> bool {
    (1..=MAX_DIMENSION).contains(&cols) && (1..=MAX_DIMENSION).contains(&rows)
}
