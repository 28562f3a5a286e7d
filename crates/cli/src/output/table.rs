//! Table formatting utilities

use super::Formattable;
use anyhow::Result;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, *};
use exam_bench_application::{Leaderboard, LeaderboardExport};

/// Table formatter
pub struct TableFormatter;

impl TableFormatter {
    /// Create a new table with default styling
    pub fn new() -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table
    }

    /// Create a simple table with headers and rows
    pub fn simple(headers: Vec<&str>, rows: Vec<Vec<String>>) -> Result<String> {
        let mut table = Self::new();
        table.set_header(headers);

        for row in rows {
            table.add_row(row);
        }

        Ok(table.to_string())
    }

    /// Create a key-value table
    pub fn key_value(items: Vec<(&str, String)>) -> Result<String> {
        let mut table = Self::new();

        for (key, value) in items {
            table.add_row(vec![key, &value]);
        }

        Ok(table.to_string())
    }
}

impl Formattable for Leaderboard {
    fn format_table(&self) -> Result<String> {
        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                vec![
                    (index + 1).to_string(),
                    row.model_name.clone(),
                    format!("{:.2}", row.accuracy),
                    format!("{:.2}", row.score_rate),
                    format!("{}/{}", row.total_score, row.max_score),
                    format!("{}/{}", row.correct_answers, row.total_questions),
                    format!("{:.2}", row.avg_time),
                    row.exams_count.to_string(),
                ]
            })
            .collect();

        let table = TableFormatter::simple(
            vec![
                "Rank",
                "Model",
                "Accuracy (%)",
                "Score rate (%)",
                "Score",
                "Correct",
                "Avg time (s)",
                "Exams",
            ],
            rows,
        )?;
        Ok(format!("{}\n{}", self.title.bold(), table))
    }
}

impl Formattable for LeaderboardExport {
    fn format_table(&self) -> Result<String> {
        let mut sections = vec![TableFormatter::key_value(vec![
            ("Exams", self.statistics.exams.to_string()),
            ("Models", self.statistics.models.to_string()),
            ("Runs", self.statistics.runs.to_string()),
        ])?];

        sections.push(self.overall.format_table()?);
        for board in self.subjects.iter().chain(&self.exams) {
            sections.push(board.format_table()?);
        }

        Ok(sections.join("\n\n"))
    }
}
