#![forbid(unsafe_code)]

//! Host-agnostic VT/ANSI terminal engine.
//!
//! `vtgrid-core` consumes a raw terminal byte stream (UTF-8 text plus
//! VT100/xterm escape sequences) and maintains an authoritative model of the
//! screen: a grid of styled cells, a cursor, a scrollback history, and a
//! viewport into that history.
//!
//! # Primary responsibilities
//!
//! - **Parser**: VT/ANSI state machine with incremental UTF-8 decoding;
//!   input may be split at any byte boundary across `feed` calls.
//! - **Cell / Grid**: styled cells with wide-character pairing, row-level
//!   soft-wrap tracking for reflow.
//! - **Cursor / Modes**: position, pen, scroll region, tab stops, and the
//!   DEC/ANSI mode flags that alter dispatch.
//! - **Scrollback / Viewport**: bounded history plus a pure scroll-offset
//!   view over (history + live grid).
//! - **Terminal**: the engine tying it together; applies parsed actions in
//!   stream order and handles resize with visible-grid reflow.
//!
//! # Design principles
//!
//! - **No I/O**: pure data + logic; the host supplies bytes.
//! - **Deterministic**: identical byte sequences always produce identical
//!   state; malformed input is dropped and counted, never an error.
//! - **`#![forbid(unsafe_code)]`**: safety enforced at compile time.

pub mod cell;
pub mod cursor;
pub mod grid;
pub mod modes;
pub mod parser;
pub mod scrollback;
pub mod term;
pub mod viewport;

pub use cell::{Cell, CellFlags, Color, SgrAttrs, SgrFlags};
pub use cursor::{Cursor, SavedCursor};
pub use grid::{Grid, Row};
pub use modes::Modes;
pub use parser::{Action, Parser};
pub use scrollback::{Scrollback, ScrollbackLine};
pub use term::{DEFAULT_SCROLLBACK, Terminal};
