//! Front-desk console messages.
//!
//! Colors are dropped when `NO_COLOR` is set or stdout is not a terminal,
//! so piped output and test captures stay plain.

use std::fmt;
use std::io::IsTerminal;
use std::sync::LazyLock;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

const FG_BLUE: &str = "\x1b[34m";
const FG_GREEN: &str = "\x1b[32m";
const FG_YELLOW: &str = "\x1b[33m";
const FG_RED: &str = "\x1b[31m";

static USE_COLOR: LazyLock<bool> =
    LazyLock::new(|| std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal());

fn tag(color: &str, icon: &str) -> String {
    if *USE_COLOR {
        format!("{color}{BOLD}{icon}{RESET}")
    } else {
        icon.to_string()
    }
}

pub fn info<T: fmt::Display>(msg: T) {
    println!("{} {}", tag(FG_BLUE, "ℹ️"), msg);
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{} {}", tag(FG_GREEN, "✅"), msg);
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{} {}", tag(FG_YELLOW, "⚠️"), msg);
}

pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{} {}", tag(FG_RED, "❌"), msg);
}

/// Section title, e.g. above a table.
pub fn header<T: fmt::Display>(msg: T) {
    let line = format!("── {msg} ──");
    if *USE_COLOR {
        println!("\n{FG_BLUE}{BOLD}{line}{RESET}");
    } else {
        println!("\n{line}");
    }
}

/// `label: value` pair inside a detail block.
pub fn field<L: fmt::Display, V: fmt::Display>(label: L, value: V) {
    println!("  {:<18} {}", format!("{label}:"), value);
}
