// SPDX-License-Identifier: MIT

//! Plain-text and JSON rendering shared by every subcommand.

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Prints a value as pretty JSON, or hands it to `render` for the text path.
pub fn print<T: Serialize>(value: &T, format: OutputFormat, render: impl FnOnce(&T)) {
    match format {
        OutputFormat::Json => {
            if let Ok(text) = serde_json::to_string_pretty(value) {
                println!("{text}");
            }
        }
        OutputFormat::Text => render(value),
    }
}

/// A minimal left-aligned column table; good enough for operator output
/// without pulling in a dedicated table-drawing dependency.
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<&'static str>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn print(&self) {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }
        print_row(&self.headers.iter().map(|h| h.to_string()).collect::<Vec<_>>(), &widths);
        for row in &self.rows {
            print_row(row, &widths);
        }
    }
}

fn print_row(cells: &[String], widths: &[usize]) {
    let line: Vec<String> =
        cells.iter().zip(widths).map(|(cell, width)| format!("{cell:<width$}")).collect();
    println!("{}", line.join("  ").trim_end());
}
