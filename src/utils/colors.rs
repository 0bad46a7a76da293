/// ANSI color codes for terminal output.
pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

/// "Active" in green, "Offline" in grey.
pub fn colorize_status(is_checked_in: bool) -> String {
    if is_checked_in {
        format!("{GREEN}Active{RESET}")
    } else {
        format!("{GREY}Offline{RESET}")
    }
}

/// Grey for empty or "Not specified" values.
pub fn colorize_optional(value: &str) -> String {
    let v = value.trim();
    if v.is_empty() || v == "Not specified" || v == "-" {
        format!("{GREY}{}{RESET}", if v.is_empty() { "-" } else { v })
    } else {
        value.to_string()
    }
}

/// Waiver column: green when signed, yellow while pending.
pub fn colorize_waiver(signed: bool) -> String {
    if signed {
        format!("{GREEN}signed{RESET}")
    } else {
        format!("{YELLOW}pending{RESET}")
    }
}
