pub mod console;
pub mod tui;
