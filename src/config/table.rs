//! Box-drawn tables for terminal help output
//!
//! Cells longer than a column's width limit wrap onto continuation lines,
//! so long field descriptions stay readable.

/// A rendered-on-demand table with optional per-column width limits
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    limits: Vec<Option<usize>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            limits: vec![None; headers.len()],
        }
    }

    /// Wrap a column at `width` characters
    pub fn limit(mut self, column: usize, width: usize) -> Self {
        if let Some(slot) = self.limits.get_mut(column) {
            *slot = Some(width.max(8));
        }
        self
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn render(&self) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let widths = self.column_widths();
        let mut out = String::new();
        out.push_str(&border(&widths, '┌', '┬', '┐'));
        out.push_str(&self.render_row(&self.headers, &widths));
        out.push_str(&border(&widths, '├', '┼', '┤'));
        for row in &self.rows {
            out.push_str(&self.render_row(row, &widths));
        }
        out.push_str(&border(&widths, '└', '┴', '┘'));
        out
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
        for (width, limit) in widths.iter_mut().zip(&self.limits) {
            if let Some(limit) = limit {
                *width = (*width).min(*limit);
            }
        }
        widths
    }

    fn render_row(&self, cells: &[String], widths: &[usize]) -> String {
        let wrapped: Vec<Vec<String>> = widths
            .iter()
            .enumerate()
            .map(|(i, &w)| wrap(cells.get(i).map(String::as_str).unwrap_or(""), w))
            .collect();
        let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);

        let mut out = String::new();
        for line in 0..height {
            out.push('│');
            for (i, column) in wrapped.iter().enumerate() {
                let text = column.get(line).map(String::as_str).unwrap_or("");
                out.push_str(&format!(" {:width$} ", text, width = widths[i]));
                out.push('│');
            }
            out.push('\n');
        }
        out
    }
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{left}{}{right}\n", segments.join(&mid.to_string()))
}

/// Greedy word wrap; words longer than `width` are split
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
