//! Terminal rendering of the exploratory summary

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{EdaSummary, DEFAULT_SKEW_THRESHOLD, HIGH_MISSING_RATIO};

/// Correlations above this are listed under the matrix summary
const STRONG_CORRELATION: f64 = 0.7;

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string())
}

fn section(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn print_table(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

pub fn display_eda_summary(summary: &EdaSummary) {
    section("📊", "DATASET");
    println!(
        "      {} rows x {} columns",
        style(summary.rows).yellow().bold(),
        style(summary.columns).yellow().bold()
    );

    section("🕳️", "MISSING & UNIQUE VALUES");
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("Missing").add_attribute(Attribute::Bold),
        Cell::new("Missing %").add_attribute(Attribute::Bold),
        Cell::new("Unique").add_attribute(Attribute::Bold),
    ]);
    for (missing, (_, unique)) in summary.missing.iter().zip(&summary.unique) {
        table.add_row(vec![
            Cell::new(&missing.column),
            Cell::new(missing.missing).fg(if missing.missing == 0 {
                Color::White
            } else {
                Color::Yellow
            }),
            Cell::new(format!("{:.1}%", missing.ratio * 100.0)),
            Cell::new(unique),
        ]);
    }
    print_table(&table);
    if !summary.high_missing.is_empty() {
        println!();
        println!(
            "      {} More than {:.0}% missing: {}",
            style("⚠").yellow(),
            HIGH_MISSING_RATIO * 100.0,
            style(summary.high_missing.join(", ")).yellow()
        );
    }

    section("📐", "NUMERIC COLUMNS");
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        ["Column", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max", "Skew", "Kurtosis"]
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    for s in &summary.numeric {
        let skew_color = match s.skewness {
            Some(k) if k.abs() >= DEFAULT_SKEW_THRESHOLD => Color::Red,
            _ => Color::White,
        };
        table.add_row(vec![
            Cell::new(&s.column),
            Cell::new(s.count),
            Cell::new(fmt_opt(s.mean)),
            Cell::new(fmt_opt(s.std)),
            Cell::new(fmt_opt(s.min)),
            Cell::new(fmt_opt(s.p25)),
            Cell::new(fmt_opt(s.median)),
            Cell::new(fmt_opt(s.p75)),
            Cell::new(fmt_opt(s.max)),
            Cell::new(fmt_opt(s.skewness)).fg(skew_color),
            Cell::new(fmt_opt(s.kurtosis)),
        ]);
    }
    print_table(&table);

    if let Some(dist) = &summary.target_distribution {
        section("🎯", "TARGET DISTRIBUTION");
        for (value, share) in dist {
            println!(
                "      {} {:<12} {}",
                style("•").dim(),
                value,
                style(format!("{:.2}%", share * 100.0)).yellow()
            );
        }
    }

    let strong = summary.correlation.pairs_above(STRONG_CORRELATION);
    section("🔗", "STRONG CORRELATIONS");
    if strong.is_empty() {
        println!(
            "      {}",
            style(format!("No numeric pairs with |r| > {:.1}", STRONG_CORRELATION)).dim()
        );
    }
    for pair in strong {
        println!(
            "      {} {} ~ {}: {}",
            style("•").dim(),
            pair.feature1,
            pair.feature2,
            style(format!("{:+.3}", pair.correlation)).yellow()
        );
    }
}
