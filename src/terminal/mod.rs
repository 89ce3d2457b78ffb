//! Terminal core: C2 (styled line buffer), C4 (screen model), and C5
//! (escape/ANSI state machine).

pub mod color;
pub mod grid;
pub mod line;
mod parser;
pub mod screen;

pub use color::{Color, Palette};
pub use grid::Grid;
pub use line::{Fragment, Row};
pub use screen::{Attrs, EraseMode, Screen, TerminalState};
