//! Terminal styling utilities

use console::{style, Emoji};

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");

const CARD_WIDTH: usize = 56;

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("credscore").cyan().bold(),
        style(format!("v{}", version)).dim()
    );
    println!(
        "    {}",
        style("Deterministic feature pipeline for credit decisioning").dim()
    );
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print a configuration card of `(label, value)` rows
pub fn print_config(title: &str, rows: &[(&str, String)]) {
    let line = "─".repeat(CARD_WIDTH - 2);
    let label_width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let value_width = CARD_WIDTH.saturating_sub(label_width + 7);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}{}│",
        GEAR,
        style(title).cyan().bold(),
        " ".repeat(CARD_WIDTH.saturating_sub(title.chars().count() + 6))
    );
    println!("    ├{}┤", line);
    for (label, value) in rows {
        println!(
            "    │  {:<lw$}  {:<vw$} │",
            label,
            truncate_string(value, value_width),
            lw = label_width,
            vw = value_width
        );
    }
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("    {} {}", WARN, style(message).yellow());
}

/// Print where an output file was written
pub fn print_saved(description: &str, path: &std::path::Path) {
    println!(
        "    {} {} {}",
        SAVE,
        description,
        style(path.display()).cyan()
    );
}

/// Print the final completion message
pub fn print_completion(message: &str) {
    println!();
    println!("    {} {}", ROCKET, style(message).green().bold());
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, threshold_info: Option<&str>) {
    if let Some(info) = threshold_info {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!(
            "      Found {} {}",
            style(count).yellow().bold(),
            description
        );
    }
}

/// Shorten from the left so the end of a path stays visible
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len || max_len <= 3 {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(len - (max_len - 3)).collect();
        format!("...{}", tail)
    }
}
