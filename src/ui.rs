//! Terminal table for `cf plan` output.

use std::cmp;

use colored::Colorize;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn print(&self) {
        if self.headers.is_empty() {
            return;
        }

        let (_, term_width) = console::Term::stdout().size();
        let max_width = term_width as usize;

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = cmp::max(widths[i], cell.chars().count());
            }
        }

        // Shrink the widest columns until the table fits the terminal.
        let overhead = 3 * self.headers.len() + 1;
        while widths.iter().sum::<usize>() + overhead > max_width {
            let Some((widest, _)) = widths
                .iter()
                .enumerate()
                .max_by_key(|(_, w)| **w)
                .filter(|(_, w)| **w > 8)
            else {
                break;
            };
            widths[widest] -= 1;
        }

        let separator = |left: &str, mid: &str, right: &str| {
            let mut line = String::from(left);
            for (i, width) in widths.iter().enumerate() {
                line.push_str(&"─".repeat(width + 2));
                line.push_str(if i + 1 < widths.len() { mid } else { right });
            }
            line
        };

        println!("{}", separator("┌", "┬", "┐"));
        print!("│");
        for (header, width) in self.headers.iter().zip(&widths) {
            print!(" {} │", pad(&header.bold().to_string(), header, *width));
        }
        println!();
        println!("{}", separator("├", "┼", "┤"));
        for row in &self.rows {
            print!("│");
            for (cell, width) in row.iter().zip(&widths) {
                let shown = truncate(cell, *width);
                print!(" {} │", pad(&shown, &shown, *width));
            }
            println!();
        }
        println!("{}", separator("└", "┴", "┘"));
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut shown: String = text.chars().take(width.saturating_sub(3)).collect();
    shown.push_str("...");
    shown
}

fn pad(styled: &str, visible: &str, width: usize) -> String {
    let padding = width.saturating_sub(visible.chars().count());
    format!("{styled}{}", " ".repeat(padding))
}
