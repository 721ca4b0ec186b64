//! A fixed-size grid of characters.

use std::fmt;

use super::charset::{Arms, CharSet};

/// Inclusive character-cell rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl CellRect {
    /// Columns strictly between the left and right border.
    pub fn inner_width(&self) -> usize {
        self.right.saturating_sub(self.left + 1)
    }

    pub fn middle_row(&self) -> usize {
        (self.top + self.bottom) / 2
    }
}

/// Drawing surface. Writes outside the grid are ignored.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: usize,
    height: usize,
    charset: CharSet,
    cells: Vec<Vec<char>>,
}

impl Canvas {
    pub fn new(width: usize, height: usize, charset: CharSet) -> Self {
        Self {
            width,
            height,
            charset,
            cells: vec![vec![' '; width]; height],
        }
    }

    pub fn charset(&self) -> CharSet {
        self.charset
    }

    pub fn get(&self, column: usize, row: usize) -> char {
        self.cells
            .get(row)
            .and_then(|line| line.get(column))
            .copied()
            .unwrap_or(' ')
    }

    pub fn set(&mut self, column: usize, row: usize, c: char) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|line| line.get_mut(column)) {
            *cell = c;
        }
    }

    /// Sets a cell, joining line characters into a junction.
    pub fn set_merge(&mut self, column: usize, row: usize, c: char) {
        let existing = self.get(column, row);
        let merged = match (Arms::from_char(existing), Arms::from_char(c)) {
            (Some(old), Some(new)) => old.merge(new).to_char(self.charset),
            _ => c,
        };
        self.set(column, row, merged);
    }

    /// Horizontal line between two columns, both ends included.
    pub fn hline(&mut self, row: usize, from: usize, to: usize) {
        let c = self.charset.chars().horizontal;
        for column in from.min(to)..=from.max(to) {
            self.set_merge(column, row, c);
        }
    }

    /// Vertical line between two rows, both ends included.
    pub fn vline(&mut self, column: usize, from: usize, to: usize) {
        let c = self.charset.chars().vertical;
        for row in from.min(to)..=from.max(to) {
            self.set_merge(column, row, c);
        }
    }

    /// Box outline. Overwrites whatever lies under the border and clears
    /// the interior.
    pub fn draw_box(&mut self, rect: CellRect) {
        if rect.right <= rect.left || rect.bottom <= rect.top {
            return;
        }
        let chars = self.charset.chars();
        for row in rect.top..=rect.bottom {
            for column in rect.left..=rect.right {
                let c = match (row, column) {
                    (r, c) if r == rect.top && c == rect.left => chars.top_left,
                    (r, c) if r == rect.top && c == rect.right => chars.top_right,
                    (r, c) if r == rect.bottom && c == rect.left => chars.bottom_left,
                    (r, c) if r == rect.bottom && c == rect.right => chars.bottom_right,
                    (r, _) if r == rect.top || r == rect.bottom => chars.horizontal,
                    (_, c) if c == rect.left || c == rect.right => chars.vertical,
                    _ => ' ',
                };
                self.set(column, row, c);
            }
        }
    }

    /// Writes `text` from `column`, cutting it at `max_len` characters.
    pub fn write_str(&mut self, column: usize, row: usize, text: &str, max_len: usize) {
        for (offset, c) in text.chars().take(max_len).enumerate() {
            self.set(column + offset, row, c);
        }
    }

    /// Writes `text` only if every cell it covers is blank.
    pub fn write_if_blank(&mut self, column: usize, row: usize, text: &str) -> bool {
        let len = text.chars().count();
        let fits = column + len <= self.width
            && row < self.height
            && (column..column + len).all(|c| self.get(c, row) == ' ');
        if fits {
            self.write_str(column, row, text, len);
        }
        fits
    }

    /// The grid as text, without trailing blanks or blank trailing lines.
    pub fn render_to_string(&self) -> String {
        let mut lines: Vec<String> = self
            .cells
            .iter()
            .map(|line| line.iter().collect::<String>().trim_end().to_string())
            .collect();
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_to_string())
    }
}
