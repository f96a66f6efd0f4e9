//! Colored status lines for the CLI subcommands.

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use std::io::{Write, stdout};

fn line(color: Color, text: &str) {
    let mut out = stdout();
    let _ = out.execute(SetForegroundColor(color));
    let _ = out.execute(Print(text));
    let _ = out.execute(ResetColor);
    let _ = out.execute(Print("\n"));
    let _ = out.flush();
}

pub fn heading(text: &str) {
    line(Color::Cyan, &format!("\n{}\n{}", text, "=".repeat(40)));
}

pub fn success(text: &str) {
    line(Color::Green, &format!("✅ {}", text));
}

pub fn failure(text: &str) {
    line(Color::Red, &format!("❌ {}", text));
}

pub fn warning(text: &str) {
    line(Color::Yellow, &format!("⚠️  {}", text));
}

pub fn info(text: &str) {
    line(Color::Reset, text);
}
