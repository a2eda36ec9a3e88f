//! Scoring summary report generation

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::service::BatchResponse;

/// Counts from one batch scoring run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScoringSummary {
    pub total_rows: usize,
    pub scored: usize,
    pub failed: usize,
    /// Scored rows that had at least one transform skipped
    pub flagged: usize,
    pub positives: usize,
    pub mean_score: Option<f64>,
}

impl ScoringSummary {
    pub fn from_response(response: &BatchResponse) -> Self {
        let scores: Vec<f64> = response.predictions.iter().filter_map(|p| p.score).collect();
        Self {
            total_rows: response.total_rows(),
            scored: response.predictions.len(),
            failed: response.errors.len(),
            flagged: response
                .predictions
                .iter()
                .filter(|p| !p.warnings.is_empty())
                .count(),
            positives: response.predictions.iter().filter(|p| p.label == 1).count(),
            mean_score: if scores.is_empty() {
                None
            } else {
                Some(scores.iter().sum::<f64>() / scores.len() as f64)
            },
        }
    }

    /// Share of scored rows predicted positive
    pub fn positive_rate(&self) -> f64 {
        if self.scored == 0 {
            0.0
        } else {
            self.positives as f64 / self.scored as f64
        }
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("SCORING SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("📁 Input Rows"), Cell::new(self.total_rows)]);
        table.add_row(vec![
            Cell::new("✅ Scored"),
            Cell::new(self.scored)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("❌ Failed"),
            Cell::new(self.failed).fg(if self.failed == 0 {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("⚠️  Flagged"),
            Cell::new(self.flagged).fg(if self.flagged == 0 {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);
        table.add_row(vec![
            Cell::new("🎯 Predicted Positive"),
            Cell::new(format!("{} ({:.1}%)", self.positives, self.positive_rate() * 100.0)),
        ]);
        if let Some(mean) = self.mean_score {
            table.add_row(vec![
                Cell::new("📈 Mean Score"),
                Cell::new(format!("{:.4}", mean)).fg(Color::Cyan),
            ]);
        }

        for line in table.to_string().lines() {
            println!("    {}", line);
        }
    }
}
