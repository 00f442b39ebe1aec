// src/system/format.rs

use crate::{constants::DEFAULT_TERMINAL_WIDTH, core::environment::Environment};
use colored::Colorize;
use std::io::{self, Write};

/// Renders human-facing listings (titles, columns, tables) sized to the
/// terminal. Everything here goes to the diagnostics stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Formatter {
    width: usize,
}

impl Formatter {
    /// Uses `$COLUMNS` when it holds a positive number, else the default width.
    pub fn from_env(env: &Environment) -> Self {
        let width = env
            .get("COLUMNS")
            .and_then(|c| c.trim().parse::<usize>().ok())
            .filter(|w| *w > 0)
            .unwrap_or(DEFAULT_TERMINAL_WIDTH);
        Self::with_width(width)
    }

    /// A formatter for a fixed width.
    pub fn with_width(width: usize) -> Self {
        Self { width }
    }

    /// Writes `title` centred in a line of `=` followed by a blank line.
    pub fn title(&self, out: &mut dyn Write, title: &str) -> io::Result<()> {
        let padded = format!(" {} ", title);
        let fill = self.width.saturating_sub(char_len(&padded));
        let left = fill / 2;
        let right = fill - left;
        writeln!(
            out,
            "{}{}{}\n",
            "=".repeat(left),
            padded.bold(),
            "=".repeat(right)
        )
    }

    /// Writes `items` in as many columns as fit, filled top to bottom and
    /// centred. Nothing is written for an empty list.
    pub fn columns(&self, out: &mut dyn Write, items: &[String]) -> io::Result<()> {
        let Some(longest) = items.iter().map(|s| char_len(s)).max() else {
            return Ok(());
        };
        let cell = longest + 1;
        let ncols = (self.width / cell).clamp(1, items.len());
        let nrows = items.len().div_ceil(ncols);
        let margin = " ".repeat(self.width.saturating_sub(cell * ncols) / 2);

        for row in 0..nrows {
            let mut line = margin.clone();
            for col in 0..ncols {
                if let Some(item) = items.get(col * nrows + row) {
                    line.push_str(&pad(item, cell));
                }
            }
            writeln!(out, "{}", line.trim_end())?;
        }
        writeln!(out)
    }

    /// Writes a three-column table. When the rows are too wide for the
    /// terminal, the widest column is shortened by eliding the middle of its
    /// cells.
    pub fn table(&self, out: &mut dyn Write, rows: &[[String; 3]]) -> io::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut sizes = [0usize; 3];
        for row in rows {
            for (size, cell) in sizes.iter_mut().zip(row.iter()) {
                *size = (*size).max(char_len(cell) + 1);
            }
        }

        let total: usize = sizes.iter().sum();
        let mut trimmed_col = None;
        if total > self.width {
            if let Some((col, widest)) = sizes.iter_mut().enumerate().max_by_key(|(_, s)| **s) {
                *widest = widest.saturating_sub(total - self.width).max(5);
                trimmed_col = Some(col);
            }
        }
        let margin = " ".repeat(self.width.saturating_sub(sizes.iter().sum()) / 2);

        for row in rows {
            let mut line = margin.clone();
            for (col, (cell, size)) in row.iter().zip(sizes.iter()).enumerate() {
                let len = char_len(cell);
                let text = if trimmed_col == Some(col) && len > *size {
                    trim_middle(cell, len - size)
                } else {
                    cell.clone()
                };
                line.push_str(&pad(&text, *size));
            }
            writeln!(out, "{}", line.trim_end())?;
        }
        writeln!(out)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn pad(s: &str, width: usize) -> String {
    format!("{}{}", s, " ".repeat(width.saturating_sub(char_len(s))))
}

/// Shortens `s` by `amount` characters, replacing its middle with `...`.
pub fn trim_middle(s: &str, amount: usize) -> String {
    if amount == 0 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let remaining = len.saturating_sub(amount);
    if remaining > 5 {
        let keep = (remaining - 3) / 2;
        let head: String = chars.iter().take(keep).collect();
        let tail: String = chars.iter().skip(len - keep).collect();
        format!("{}...{}", head, tail)
    } else {
        let head = chars.first().map(|c| c.to_string()).unwrap_or_default();
        let tail = chars.last().map(|c| c.to_string()).unwrap_or_default();
        format!("{}...{}", head, tail)
    }
}
